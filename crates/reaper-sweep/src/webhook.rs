//! Webhook delete adapter — forwards delete operations over HTTP.
//!
//! The engine stays agnostic behind [`DeleteFn`]; this adapter is the stock
//! way to wire a catalog entry to a provider's resource-management endpoint.
//! Each call POSTs the record's kwargs as a JSON body and maps the response
//! status onto the delete outcome.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use http_body_util::BodyExt;
use hyper_util::rt::TokioIo;
use tracing::debug;

use crate::catalog::{DeleteArgs, DeleteFn};

/// Per-call timeout used when configuration does not set one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Build a [`DeleteFn`] that POSTs a record's kwargs as JSON to `endpoint`.
///
/// The endpoint must be a full `http://host[:port]/path` URL. A 2xx
/// response completes the delete; any other status, a connection failure,
/// or the timeout elapsing surfaces as an error to the sweeper.
pub fn webhook_delete(endpoint: &str, timeout: Duration) -> anyhow::Result<DeleteFn> {
    let uri: http::Uri = endpoint
        .parse()
        .with_context(|| format!("invalid webhook endpoint: {endpoint}"))?;
    if uri.scheme_str() != Some("http") {
        bail!("webhook endpoint must be http://, got: {endpoint}");
    }
    let host = uri
        .host()
        .ok_or_else(|| anyhow!("webhook endpoint has no host: {endpoint}"))?;
    let address = format!("{host}:{}", uri.port_u16().unwrap_or(80));
    let endpoint = endpoint.to_string();

    Ok(Arc::new(move |args| {
        let endpoint = endpoint.clone();
        let address = address.clone();
        Box::pin(async move { post_kwargs(&endpoint, &address, args, timeout).await })
    }))
}

/// POST the kwargs and map the response onto the delete outcome.
async fn post_kwargs(
    endpoint: &str,
    address: &str,
    args: DeleteArgs,
    timeout: Duration,
) -> anyhow::Result<()> {
    let body = serde_json::to_vec(&args)?;

    let outcome = tokio::time::timeout(timeout, send(endpoint, address, body)).await;
    let (status, reply) = match outcome {
        Ok(result) => result?,
        Err(_) => bail!(
            "webhook {endpoint} timed out after {}ms",
            timeout.as_millis()
        ),
    };

    if status.is_success() {
        debug!(%endpoint, %status, "webhook delete acknowledged");
        Ok(())
    } else {
        bail!("webhook {endpoint} returned {status}: {}", excerpt(&reply));
    }
}

async fn send(
    endpoint: &str,
    address: &str,
    body: Vec<u8>,
) -> anyhow::Result<(http::StatusCode, bytes::Bytes)> {
    let stream = tokio::net::TcpStream::connect(address)
        .await
        .with_context(|| format!("connecting to {address}"))?;

    let io = TokioIo::new(stream);
    let (mut sender, conn) = hyper::client::conn::http1::handshake(io).await?;

    // Drive the connection in the background.
    tokio::spawn(async move {
        let _ = conn.await;
    });

    let req = http::Request::builder()
        .method("POST")
        .uri(endpoint)
        .header("host", address)
        .header("content-type", "application/json")
        .header("user-agent", "reaper-sweep/0.1")
        .body(http_body_util::Full::new(bytes::Bytes::from(body)))?;

    let resp = sender.send_request(req).await?;
    let status = resp.status();
    let reply = resp.into_body().collect().await?.to_bytes();
    Ok((status, reply))
}

/// First line of the reply body, bounded, for error messages.
fn excerpt(reply: &bytes::Bytes) -> String {
    String::from_utf8_lossy(reply)
        .lines()
        .next()
        .unwrap_or("")
        .chars()
        .take(120)
        .collect()
}
