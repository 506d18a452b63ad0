#![deny(unused_crate_dependencies)]
mod api;
mod config;
mod dispatch;
mod errors;
mod rpc;
mod setup;

use std::sync::Arc;

use api::launch_api_server;
use dispatch::Dispatcher;
use errors::Result;
use metrics::prometheus::Registry;
use setup::{build_router, setup_logger, shut_down, spawn_rpc_server};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<()> {
    setup_logger();

    let config = config::parse()?;
    config.validate()?;

    let cancel_token = CancellationToken::new();
    let metrics_registry = Registry::default();

    let router = Arc::new(build_router(&config, &metrics_registry).await?);
    let dispatcher = Arc::new(Dispatcher::new(
        Arc::clone(&router),
        config.app.request_timeout,
    ));

    let rpc_handle =
        spawn_rpc_server(&config, Arc::clone(&dispatcher), cancel_token.clone()).await?;

    launch_api_server(&config, metrics_registry, dispatcher).await?;

    shut_down(cancel_token, &router, rpc_handle).await
}

