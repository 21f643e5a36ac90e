//! Line-based TCP endpoint
//!
//! One request = connect, write the request plus `\n`, read one line back.
//! Every step races the call context, so an abandoned attempt stops as soon
//! as its deadline passes or the retrier moves on.

use async_trait::async_trait;
use dispatch_balancer::{BoxError, CallContext, Endpoint, Releaser, Resolved, SharedEndpoint};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::debug;

/// Endpoint speaking newline-delimited text to one `host:port`
#[derive(Debug, Clone)]
pub struct TcpLineEndpoint {
    addr: String,
}

impl TcpLineEndpoint {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }

    async fn exchange(&self, request: &str) -> Result<String, BoxError> {
        let mut stream = TcpStream::connect(&self.addr).await?;
        let (reader, mut writer) = stream.split();

        writer.write_all(request.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;

        let mut line = String::new();
        let read = BufReader::new(reader).read_line(&mut line).await?;
        if read == 0 {
            return Err(format!("{} closed the connection without a response", self.addr).into());
        }

        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

#[async_trait]
impl Endpoint<String, String> for TcpLineEndpoint {
    async fn call(&self, ctx: CallContext, request: String) -> Result<String, BoxError> {
        tokio::select! {
            reason = ctx.done() => Err(Box::new(reason)),
            response = self.exchange(&request) => response,
        }
    }
}

/// Split `host:port`, rejecting a missing host or a bad port.
pub fn parse_address(instance: &str) -> Result<(&str, u16), BoxError> {
    let (host, port) = instance
        .rsplit_once(':')
        .ok_or_else(|| format!("instance '{}' is not host:port", instance))?;
    if host.is_empty() {
        return Err(format!("instance '{}' has no host", instance).into());
    }
    let port = port
        .parse::<u16>()
        .map_err(|e| format!("instance '{}' has an invalid port: {}", instance, e))?;
    Ok((host, port))
}

/// Factory resolving `host:port` instances into [`TcpLineEndpoint`]s.
///
/// Connections are per call, so the releaser only records the removal.
pub fn tcp_factory(instance: &str) -> Result<Resolved<String, String>, BoxError> {
    parse_address(instance)?;

    let endpoint: SharedEndpoint<String, String> = Arc::new(TcpLineEndpoint::new(instance));
    let addr = instance.to_string();
    let releaser: Box<dyn Releaser> = Box::new(move || -> Result<(), BoxError> {
        debug!(instance = %addr, "TCP endpoint released");
        Ok(())
    });

    debug!(instance, "TCP endpoint created");
    Ok((endpoint, Some(releaser)))
}
