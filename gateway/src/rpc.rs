use std::{net::SocketAddr, sync::Arc};

use da_gateway_client::protocol::{self, Request, Response};
use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::{codec::Framed, sync::CancellationToken};
use tracing::{debug, error, info, warn};

use crate::{dispatch::Dispatcher, errors::Result};

/// Accepts connections until `cancel_token` fires. Every connection gets its
/// own task and is answered in request order.
pub async fn serve(
    listener: TcpListener,
    dispatcher: Arc<Dispatcher>,
    cancel_token: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    let dispatcher = Arc::clone(&dispatcher);
                    let cancel_token = cancel_token.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, peer, dispatcher, cancel_token).await {
                            warn!("rpc connection from {peer} failed: {e}");
                        }
                    });
                }
                Err(e) => error!("failed to accept rpc connection: {e}"),
            }
        }
    }

    info!("rpc server stopped");
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    dispatcher: Arc<Dispatcher>,
    cancel_token: CancellationToken,
) -> Result<()> {
    stream.set_nodelay(true)?;
    let mut framed = Framed::new(stream, protocol::codec());
    debug!("rpc connection from {peer}");

    loop {
        let frame = tokio::select! {
            biased;
            _ = cancel_token.cancelled() => break,
            frame = framed.next() => match frame {
                Some(frame) => frame?,
                None => break,
            },
        };

        let response = match protocol::decode::<Request>(&frame) {
            Ok(request) => answer(&dispatcher, request).await,
            Err(e) => Response::error(&services::Error::InvalidInput(format!(
                "malformed request: {e}"
            ))),
        };

        framed.send(protocol::encode(&response)?).await?;
    }

    debug!("rpc connection from {peer} closed");
    Ok(())
}

async fn answer(dispatcher: &Dispatcher, request: Request) -> Response {
    let result = match request {
        Request::Submit { da_type, data } => dispatcher
            .submit(da_type, &data)
            .await
            .map(Response::Submitted),
        Request::Retrieve { da_type, reference } => dispatcher
            .retrieve(da_type, reference)
            .await
            .map(|data| Response::Retrieved { data }),
    };

    result.unwrap_or_else(|e| Response::error(&e))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use da_gateway_client::{Client, Error};
    use pretty_assertions::assert_eq;
    use services::{ErrorKind, eip4844::Carrier, types::BackendType};
    use test_helpers::Backends;
    use tokio::{io::AsyncWriteExt, task::JoinHandle};
    use tokio_util::codec::Decoder;

    use super::*;

    async fn start_server(
        backends: &Backends,
        cancel_token: CancellationToken,
    ) -> (SocketAddr, JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::new(backends.router(Carrier::Blobs)),
            Duration::from_secs(5),
        ));

        let handle = tokio::spawn(serve(listener, dispatcher, cancel_token));

        (addr, handle)
    }

    #[tokio::test]
    async fn client_round_trips_through_every_backend() {
        // given
        let backends = Backends::default();
        let (addr, _server) = start_server(&backends, CancellationToken::new()).await;
        let mut client = Client::connect(addr).await.unwrap();

        for backend in BackendType::ALL {
            let payload = test_helpers::random_data(256);

            // when
            let submission = client.submit(backend, &payload).await.unwrap();
            let retrieved = client
                .retrieve(backend, &submission.reference)
                .await
                .unwrap();

            // then
            assert_eq!(submission.backend, backend);
            assert_eq!(retrieved, payload);
        }
    }

    #[tokio::test]
    async fn errors_carry_the_server_kind() {
        // given
        let backends = Backends::default();
        let (addr, _server) = start_server(&backends, CancellationToken::new()).await;
        let mut client = Client::connect(addr).await.unwrap();

        // when
        let unknown = client.submit_raw(42, b"payload").await.unwrap_err();
        let empty = client.submit(BackendType::NearDA, b"").await.unwrap_err();

        // then
        assert_eq!(unknown.kind(), Some(ErrorKind::UnknownBackendType));
        assert_eq!(empty.kind(), Some(ErrorKind::InvalidInput));
    }

    #[tokio::test]
    async fn malformed_frame_is_answered_and_connection_survives() {
        // given
        let backends = Backends::default();
        let (addr, _server) = start_server(&backends, CancellationToken::new()).await;
        let mut stream = TcpStream::connect(addr).await.unwrap();

        // when
        stream.write_all(&[0, 0, 0, 2, b'{', b'}']).await.unwrap();
        let mut framed = Framed::new(stream, protocol::codec());
        let frame = framed.next().await.unwrap().unwrap();

        // then
        let response: Response = protocol::decode(&frame).unwrap();
        let Response::Error { kind, .. } = response else {
            panic!("expected an error response, got {response:?}");
        };
        assert_eq!(kind, ErrorKind::InvalidInput);

        let request = Request::Submit {
            da_type: BackendType::NearDA.into(),
            data: "AAEC".to_string(),
        };
        framed
            .send(protocol::encode(&request).unwrap())
            .await
            .unwrap();
        let frame = framed.next().await.unwrap().unwrap();
        assert!(matches!(
            protocol::decode::<Response>(&frame).unwrap(),
            Response::Submitted(_)
        ));
    }

    #[tokio::test]
    async fn cancellation_stops_the_server_and_its_connections() {
        // given
        let backends = Backends::default();
        let cancel_token = CancellationToken::new();
        let (addr, server) = start_server(&backends, cancel_token.clone()).await;
        let mut client = Client::connect(addr).await.unwrap();
        client.submit(BackendType::NearDA, b"before").await.unwrap();

        // when
        cancel_token.cancel();
        server.await.unwrap();

        // then
        let err = client
            .submit(BackendType::NearDA, b"after")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ConnectionClosed | Error::Io(_)));
    }

    #[test]
    fn codec_frames_are_length_prefixed() {
        let mut buf = tokio_util::bytes::BytesMut::from(&[0, 0, 0, 3, 1, 2, 3][..]);

        let frame = protocol::codec().decode(&mut buf).unwrap().unwrap();

        assert_eq!(&frame[..], &[1, 2, 3]);
    }
}
