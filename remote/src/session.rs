//! One TCP transfer session, modelled as a typestate machine.
//!
//! `Listening -> Connected -> Closed`, one forward transition per state. A receiver
//! starts in [`Listening`] and gets a [`Connected`] from exactly one accept; a sender
//! dials straight into [`Connected`]. The listener is consumed by the accept, so it is
//! torn down as soon as the single connection is established.

use common::{Diagnostics, SessionState};
use tokio::io::AsyncWriteExt;
use tracing::instrument;

use crate::endpoint::Endpoint;

/// A bound listener waiting for its single inbound connection.
#[derive(Debug)]
pub struct Listening {
    listener: tokio::net::TcpListener,
    endpoint: Endpoint,
    local_addr: std::net::SocketAddr,
}

impl Listening {
    /// Resolves `endpoint` and binds the first address that accepts the bind.
    #[instrument(skip(diagnostics))]
    pub async fn bind(
        endpoint: &Endpoint,
        diagnostics: &dyn Diagnostics,
    ) -> Result<Self, common::Error> {
        let bind_error = |source| common::Error::Bind {
            endpoint: endpoint.to_string(),
            source,
        };
        let addrs = endpoint.resolve().await.map_err(bind_error)?;
        let mut last_error = None;
        for addr in addrs {
            match tokio::net::TcpListener::bind(addr).await {
                Ok(listener) => {
                    let local_addr = listener.local_addr().map_err(bind_error)?;
                    diagnostics.state_changed(SessionState::Listening);
                    diagnostics.listening(local_addr);
                    return Ok(Self {
                        listener,
                        endpoint: endpoint.clone(),
                        local_addr,
                    });
                }
                Err(err) => {
                    tracing::debug!("failed to bind {}: {}", addr, err);
                    last_error = Some(err);
                }
            }
        }
        Err(bind_error(last_error.unwrap_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::AddrNotAvailable,
                "no address to bind",
            )
        })))
    }

    #[must_use]
    pub fn local_addr(&self) -> std::net::SocketAddr {
        self.local_addr
    }

    /// Blocks until one connection arrives, then drops the listener.
    #[instrument(skip(self, diagnostics), fields(local_addr = %self.local_addr))]
    pub async fn accept(self, diagnostics: &dyn Diagnostics) -> Result<Connected, common::Error> {
        let res = self.listener.accept().await;
        drop(self.listener);
        match res {
            Ok((stream, peer)) => {
                diagnostics.state_changed(SessionState::Connected);
                diagnostics.connected(peer);
                Ok(Connected { stream, peer })
            }
            Err(source) => {
                diagnostics.state_changed(SessionState::Closed);
                Err(common::Error::Accept {
                    endpoint: self.endpoint.to_string(),
                    source,
                })
            }
        }
    }
}

/// An established connection, exclusively owned by one transfer.
#[derive(Debug)]
pub struct Connected {
    stream: tokio::net::TcpStream,
    peer: std::net::SocketAddr,
}

impl Connected {
    /// Connects to the first reachable address of `endpoint`; there is no retry.
    #[instrument(skip(diagnostics))]
    pub async fn dial(
        endpoint: &Endpoint,
        diagnostics: &dyn Diagnostics,
    ) -> Result<Self, common::Error> {
        let connect_error = |source| common::Error::Connect {
            endpoint: endpoint.to_string(),
            source,
        };
        diagnostics.connecting(&endpoint.to_string());
        let addrs = endpoint.resolve().await.map_err(connect_error)?;
        let mut last_error = None;
        for addr in addrs {
            match tokio::net::TcpStream::connect(addr).await {
                Ok(stream) => {
                    diagnostics.state_changed(SessionState::Connected);
                    diagnostics.connected(addr);
                    return Ok(Self { stream, peer: addr });
                }
                Err(err) => {
                    tracing::debug!("failed to connect to {}: {}", addr, err);
                    last_error = Some(err);
                }
            }
        }
        Err(connect_error(last_error.unwrap_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::AddrNotAvailable,
                "no address to connect to",
            )
        })))
    }

    #[must_use]
    pub fn peer_addr(&self) -> std::net::SocketAddr {
        self.peer
    }

    pub fn stream_mut(&mut self) -> &mut tokio::net::TcpStream {
        &mut self.stream
    }

    /// Shuts down the write side so the peer observes end-of-stream, then drops the socket.
    pub async fn close(self, diagnostics: &dyn Diagnostics) -> Closed {
        self.shutdown(diagnostics, true).await
    }

    /// Like [`Connected::close`], for a session that ends before any data was moved.
    pub async fn close_unused(self, diagnostics: &dyn Diagnostics) -> Closed {
        self.shutdown(diagnostics, false).await
    }

    async fn shutdown(mut self, diagnostics: &dyn Diagnostics, completed: bool) -> Closed {
        if let Err(err) = self.stream.shutdown().await {
            // the peer may already be gone, nothing left to signal
            tracing::debug!("shutdown of connection to {} failed: {}", self.peer, err);
        }
        drop(self.stream);
        diagnostics.state_changed(SessionState::Closed);
        Closed { completed }
    }

    /// Drops the connection without consuming any of the peer's data.
    pub fn abandon(self, diagnostics: &dyn Diagnostics) -> Closed {
        tracing::debug!("abandoning connection from {}", self.peer);
        drop(self.stream);
        diagnostics.state_changed(SessionState::Closed);
        Closed { completed: false }
    }
}

/// Terminal state. `completed` is false when the session ended before any data moved,
/// whether abandoned or closed unused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Closed {
    pub completed: bool,
}
