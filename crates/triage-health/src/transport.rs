//! Minimal HTTP/1.1 GET over an already-connected stream.

use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Empty};
use hyper_util::rt::TokioIo;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

/// Issue `GET path` on `stream` and collect the full response body.
pub(crate) async fn get<S>(
    stream: S,
    host: &str,
    path: &str,
) -> Result<(StatusCode, Bytes), GetError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let io = TokioIo::new(stream);
    let (mut sender, conn) = hyper::client::conn::http1::handshake(io).await?;

    // Drive the connection in the background.
    tokio::spawn(async move {
        if let Err(e) = conn.await {
            debug!(error = %e, "http connection closed with error");
        }
    });

    let req = http::Request::builder()
        .method("GET")
        .uri(path)
        .header("host", host)
        .header("user-agent", "triage/0.1")
        .body(Empty::<Bytes>::new())?;

    let resp = sender.send_request(req).await?;
    let status = resp.status();
    let body = resp.into_body().collect().await?.to_bytes();
    Ok((status, body))
}

/// Either half of a failed GET.
pub(crate) enum GetError {
    Request(http::Error),
    Http(hyper::Error),
}

impl From<http::Error> for GetError {
    fn from(e: http::Error) -> Self {
        Self::Request(e)
    }
}

impl From<hyper::Error> for GetError {
    fn from(e: hyper::Error) -> Self {
        Self::Http(e)
    }
}

impl From<GetError> for crate::ProbeError {
    fn from(e: GetError) -> Self {
        match e {
            GetError::Request(e) => Self::Request(e),
            GetError::Http(e) => Self::Http(e),
        }
    }
}

impl From<GetError> for crate::ControlError {
    fn from(e: GetError) -> Self {
        match e {
            GetError::Request(e) => Self::Request(e),
            GetError::Http(e) => Self::Http(e),
        }
    }
}
