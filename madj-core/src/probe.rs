// madj-core/src/probe.rs
use std::time::Duration;

use async_trait::async_trait;
use madj_common::config::LOOPBACK_HOST;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::trace;

/// Is something accepting TCP connections on the loopback port? The port is the only liveness
/// signal; pids are never consulted.
#[async_trait]
pub trait PortProbe: Send + Sync {
    async fn is_open(&self, port: u16) -> bool;
}

#[derive(Debug, Clone, Copy)]
pub struct TcpPortProbe {
    connect_timeout: Duration,
}

impl TcpPortProbe {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

#[async_trait]
impl PortProbe for TcpPortProbe {
    async fn is_open(&self, port: u16) -> bool {
        let open = matches!(
            timeout(self.connect_timeout, TcpStream::connect((LOOPBACK_HOST, port))).await,
            Ok(Ok(_))
        );
        trace!("Probe {}:{} -> {}", LOOPBACK_HOST, port, if open { "open" } else { "closed" });
        open
    }
}
