//! Echo service
//!
//! Echoes a message holding every field kind, next to the hello service
//! in the same router.
//!
//! Run with: cargo run --bin echo
//! Test with:
//!   curl -X POST http://localhost:3000/echo.echo \
//!     -H 'Content-Type: application/json' \
//!     -d '{"required": "RED", "strings": ["a", "b"], "want_time": true}'

use std::net::SocketAddr;

use protorpc_axum::{MakeServiceBuilder, ServiceMapping};
use protorpc_axum_examples::{EchoService, HelloService, server_addr};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let app = MakeServiceBuilder::new()
        .add_mapping(ServiceMapping::<EchoService>::from_default().service_path("/echo"))
        .add_mapping(ServiceMapping::<HelloService>::from_default().service_path("/hello"))
        .build();

    let addr = server_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "echo service listening");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}
