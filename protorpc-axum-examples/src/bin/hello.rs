//! Hello service
//!
//! A single typed method mapped under `/hello`.
//!
//! Run with: cargo run --bin hello
//! Test with:
//!   curl -X POST http://localhost:3000/hello.hello \
//!     -H 'Content-Type: application/json' -d '{"my_name": "Alice"}'

use std::net::SocketAddr;

use protorpc_axum::ServiceMapping;
use protorpc_axum_examples::{HelloService, server_addr};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let app = ServiceMapping::<HelloService>::from_default()
        .service_path("/hello")
        .into_router();

    let addr = server_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "hello service listening");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}
