//! Status datagrams in, state machine triggers out.

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::{net::UdpSocket, sync::watch, time::timeout};
use tracing::{debug, info, warn};

use crate::status::{StatusMapper, StatusSnapshot};

const MAX_DATAGRAM: usize = 64 * 1024;

pub struct StatusReceiver {
    socket: UdpSocket,
    buf: Vec<u8>,
}

impl StatusReceiver {
    pub async fn bind(addr: &str) -> Result<StatusReceiver> {
        let socket = UdpSocket::bind(addr)
            .await
            .with_context(|| format!("binding status socket on {addr}"))?;
        let receiver = StatusReceiver {
            socket,
            buf: vec![0; MAX_DATAGRAM],
        };
        info!(addr = %receiver.local_addr()?, "listening for status");

        Ok(receiver)
    }

    pub fn local_addr(&self) -> Result<std::net::SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Waits up to `wait` for one snapshot.
    ///
    /// `None` means nothing usable arrived: either the wait ran out or the
    /// datagram was not a snapshot.
    pub async fn recv(&mut self, wait: Duration) -> Result<Option<StatusSnapshot>> {
        let (len, from) = match timeout(wait, self.socket.recv_from(&mut self.buf)).await {
            Ok(received) => received.context("receiving status datagram")?,
            Err(_elapsed) => return Ok(None),
        };

        match serde_json::from_slice(&self.buf[..len]) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(e) => {
                warn!(%from, "ignoring malformed status datagram: {e}");
                Ok(None)
            }
        }
    }
}

/// Feeds every received snapshot to `mapper` until `stop` flips to true.
///
/// Mapping and transition errors are logged and polling carries on.
pub async fn run_status_loop(
    mut receiver: StatusReceiver,
    mut mapper: StatusMapper,
    wait: Duration,
    stop: watch::Receiver<bool>,
) -> Result<()> {
    loop {
        let stopped = *stop.borrow();
        if stopped {
            break;
        }

        let Some(snapshot) = receiver.recv(wait).await? else {
            continue;
        };

        match mapper.observe(snapshot) {
            Ok(Some(state)) => debug!(%state, "status applied"),
            Ok(None) => {}
            Err(e) => warn!("status not applied: {e}"),
        }
    }

    info!(state = %mapper.state(), "status loop stopped");
    Ok(())
}
