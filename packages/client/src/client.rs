use da_gateway_encoding::reference;
use futures::{SinkExt, StreamExt};
use services::types::{BackendType, DaReference, Submission};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio_util::codec::{Framed, LengthDelimitedCodec};
use tracing::debug;

use crate::{
    error::{Error, Result},
    protocol::{self, Request, Response},
};

/// One connection to the gateway. Requests on a connection are answered in
/// order.
pub struct Client {
    framed: Framed<TcpStream, LengthDelimitedCodec>,
}

impl Client {
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;

        Ok(Self {
            framed: Framed::new(stream, protocol::codec()),
        })
    }

    pub async fn submit(&mut self, backend: BackendType, payload: &[u8]) -> Result<Submission> {
        self.submit_raw(backend.into(), payload).await
    }

    /// Like [`Client::submit`] but takes the raw tag, letting the gateway
    /// decide whether it names a backend.
    pub async fn submit_raw(&mut self, da_type: i64, payload: &[u8]) -> Result<Submission> {
        let request = Request::Submit {
            da_type,
            data: reference::to_base64(payload),
        };

        match self.call(&request).await? {
            Response::Submitted(submission) => Ok(submission),
            other => Err(unexpected(other)),
        }
    }

    pub async fn retrieve(
        &mut self,
        backend: BackendType,
        da_reference: &DaReference,
    ) -> Result<Vec<u8>> {
        let request = Request::Retrieve {
            da_type: backend.into(),
            reference: da_reference.as_str().to_owned(),
        };

        match self.call(&request).await? {
            Response::Retrieved { data } => reference::from_base64(&data)
                .map_err(|e| Error::UnexpectedResponse(format!("retrieved data: {e}"))),
            other => Err(unexpected(other)),
        }
    }

    async fn call(&mut self, request: &Request) -> Result<Response> {
        self.framed.send(protocol::encode(request)?).await?;

        let frame = self.framed.next().await.ok_or(Error::ConnectionClosed)??;
        let response: Response = protocol::decode(&frame)?;
        debug!("gateway answered with {} bytes", frame.len());

        match response {
            Response::Error { kind, message } => Err(Error::Server { kind, message }),
            response => Ok(response),
        }
    }
}

fn unexpected(response: Response) -> Error {
    Error::UnexpectedResponse(format!("{response:?}"))
}
