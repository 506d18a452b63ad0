use std::{net::SocketAddr, sync::Arc};

use anytrust::{RestReader, RpcWriter, SigningWriter};
use beacon::BeaconClient;
use celestia::DaProxyClient;
use clock::SystemClock;
use eigenda::DisperserGrpc;
use metrics::{RegistersMetrics, prometheus::Registry};
use nearda::SidecarClient;
use services::{
    Adapters, ConfirmationPoller, DispatchRouter, anytrust::AnyTrustService,
    celestia::CelestiaService, eigenda::EigenDaService, eip4844::Eip4844Service,
    nearda::NearDaService,
};
use tokio::{net::TcpListener, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{
    config::{self, Config},
    dispatch::Dispatcher,
    errors::{Error, Result, WithContext},
    rpc,
};

pub fn setup_logger() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_level(true)
        .with_line_number(true)
        .json()
        .init();
}

/// Wires the configured backends into a started router.
pub async fn build_router(config: &Config, registry: &Registry) -> Result<DispatchRouter> {
    let mut adapters = Adapters::new();

    if let Some(eth) = &config.eth {
        let l1 = create_l1_adapter(eth, registry).await?;

        if let Some(eip4844) = &config.eip4844 {
            adapters = adapters.with_eip4844(Eip4844Service::new(
                l1.clone(),
                BeaconClient::new(eip4844.beacon.clone()),
                eth.data_source(),
                eip4844.carrier(),
            ));
        }

        if let Some(celestia) = &config.celestia {
            let da = DaProxyClient::new(
                celestia.rpc.clone(),
                &celestia.auth_token,
                &celestia.namespace,
            )?;
            adapters = adapters.with_celestia(
                CelestiaService::new(
                    l1,
                    da,
                    eth.data_source(),
                    celestia.eth_fallback_disabled,
                    celestia.block_time,
                )
                .within_request_timeout(config.app.request_timeout, eth.send_tx_request_timeout),
            );
        }
    }

    if let Some(eigenda) = &config.eigenda {
        let disperser = DisperserGrpc::new(&eigenda.rpc)?;
        let poller = ConfirmationPoller::new(
            eigenda.status_query_retry_interval,
            eigenda.status_query_timeout,
        )?;
        adapters = adapters.with_eigenda(EigenDaService::new(disperser, poller));
    }

    if let Some(anytrust) = &config.anytrust {
        adapters = add_anytrust(adapters, anytrust).await?;
    }

    if let Some(nearda) = &config.nearda {
        adapters = adapters.with_nearda(NearDaService::new(SidecarClient::new(
            nearda.sidecar.clone(),
        )));
    }

    let router = DispatchRouter::new(adapters);
    router.register_metrics(registry);
    router.start()?;
    info!("dispatching to {:?}", router.configured());

    Ok(router)
}

async fn create_l1_adapter(eth: &config::Eth, registry: &Registry) -> Result<eth::HttpClient> {
    let signer = signers::eth::Signer::from_key_source(&eth.key, eth.chain_id).await?;

    let l1 = eth::HttpClient::connect(
        eth.rpc.clone(),
        signer,
        eth.chain_id,
        eth.send_tx_request_timeout,
    )
    .await
    .map_err(Error::from)
    .with_context(|| format!("connecting to the l1 node at {}", eth.rpc))?;

    l1.register_metrics(registry);

    Ok(l1)
}

async fn add_anytrust(adapters: Adapters, anytrust: &config::AnyTrust) -> Result<Adapters> {
    let writer = RpcWriter::new(anytrust.rpc.clone());
    let reader = RestReader::new(anytrust.rest.clone());

    let adapters = match &anytrust.signing_key {
        Some(key) => {
            let signer = signers::das::Signer::from_key_source(key).await?;
            adapters.with_anytrust(AnyTrustService::new(
                SigningWriter::new(writer, signer),
                reader,
                SystemClock,
                anytrust.data_retention,
            ))
        }
        None => {
            warn!("no anytrust signing key configured, store requests go out unsigned");
            adapters.with_anytrust(AnyTrustService::new(
                writer,
                reader,
                SystemClock,
                anytrust.data_retention,
            ))
        }
    };

    Ok(adapters)
}

pub async fn spawn_rpc_server(
    config: &Config,
    dispatcher: Arc<Dispatcher>,
    cancel_token: CancellationToken,
) -> Result<Option<JoinHandle<()>>> {
    let Some(port) = config.app.rpc_port else {
        return Ok(None);
    };

    let addr = SocketAddr::from((config.app.host, port));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(Error::from)
        .with_context(|| format!("binding the rpc server to {addr}"))?;
    info!("rpc server listening on {addr}");

    Ok(Some(tokio::spawn(rpc::serve(
        listener,
        dispatcher,
        cancel_token,
    ))))
}

pub async fn shut_down(
    cancel_token: CancellationToken,
    router: &DispatchRouter,
    rpc_handle: Option<JoinHandle<()>>,
) -> Result<()> {
    cancel_token.cancel();
    router.stop()?;

    if let Some(handle) = rpc_handle {
        handle.await?;
    }

    info!("gateway stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{io::Write, time::Duration};

    use services::{State, types::BackendType};

    use super::*;

    fn load_config(toml: &str) -> Config {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(toml.as_bytes()).unwrap();

        ::config::Config::builder()
            .add_source(::config::File::from(file.path()))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[tokio::test]
    async fn offline_backends_are_wired_without_network() {
        // given
        let config = load_config(
            r#"
            [app]
            host = "127.0.0.1"
            port = 0

            [eigenda]
            rpc = "http://127.0.0.1:1"

            [anytrust]
            rpc = "http://127.0.0.1:1"
            rest = "http://127.0.0.1:1"
            signing_key = "Private(0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80)"

            [nearda]
            sidecar = "http://127.0.0.1:1"
            "#,
        );
        let registry = Registry::default();

        // when
        let router = build_router(&config, &registry).await.unwrap();

        // then
        assert_eq!(router.state(), State::Running);
        assert_eq!(
            router.configured(),
            vec![BackendType::AnyTrust, BackendType::EigenDA, BackendType::NearDA]
        );
    }

    #[tokio::test]
    async fn shutdown_stops_router_and_rpc_server() {
        // given
        let config = load_config(
            r#"
            [app]
            host = "127.0.0.1"
            port = 0
            rpc_port = 0

            [nearda]
            sidecar = "http://127.0.0.1:1"
            "#,
        );
        let router = Arc::new(build_router(&config, &Registry::default()).await.unwrap());
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&router),
            Duration::from_secs(1),
        ));
        let cancel_token = CancellationToken::new();
        let handle = spawn_rpc_server(&config, dispatcher, cancel_token.clone())
            .await
            .unwrap();

        // when
        shut_down(cancel_token, &router, handle).await.unwrap();

        // then
        assert_eq!(router.state(), State::Stopped);
    }

    #[tokio::test]
    async fn rpc_server_is_optional() {
        let config = load_config(
            r#"
            [app]
            host = "127.0.0.1"
            port = 0

            [nearda]
            sidecar = "http://127.0.0.1:1"
            "#,
        );
        let router = Arc::new(build_router(&config, &Registry::default()).await.unwrap());
        let dispatcher = Arc::new(Dispatcher::new(router, Duration::from_secs(1)));

        let handle = spawn_rpc_server(&config, dispatcher, CancellationToken::new())
            .await
            .unwrap();

        assert!(handle.is_none());
    }
}
