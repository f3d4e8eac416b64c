use std::net::SocketAddr;

pub mod echo;
pub mod hello;

pub use echo::EchoService;
pub use hello::{HelloRequest, HelloResponse, HelloService};

/// Returns the server address from PORT env var, defaulting to 3000.
///
/// # Example
///
/// ```ignore
/// let addr = protorpc_axum_examples::server_addr()?;
/// let listener = tokio::net::TcpListener::bind(addr).await?;
/// ```
pub fn server_addr() -> anyhow::Result<SocketAddr> {
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".into());
    Ok(format!("0.0.0.0:{port}").parse()?)
}
