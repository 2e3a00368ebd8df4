//! Diagnostics collaborator passed explicitly into the transfer operations.
//!
//! The bind/accept/dial/copy steps report what they are doing through a [`Diagnostics`]
//! implementation instead of writing to a process-wide logger directly. Production code
//! uses [`TracingDiagnostics`]; tests can record events and observe the bound address.

use crate::error::Error;

/// Lifecycle of one transfer session.
///
/// Transitions only move forward: `Listening -> Connected -> Closed`. A sender starts
/// directly in `Connected`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SessionState {
    Listening,
    Connected,
    Closed,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let name = match self {
            SessionState::Listening => "listening",
            SessionState::Connected => "connected",
            SessionState::Closed => "closed",
        };
        write!(f, "{name}")
    }
}

/// Which side of the transfer this process plays.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Role {
    Send,
    Receive,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Role::Send => write!(f, "send"),
            Role::Receive => write!(f, "recv"),
        }
    }
}

/// Hooks invoked by the core operations. All methods default to no-ops.
pub trait Diagnostics: Send + Sync {
    fn listening(&self, _local: std::net::SocketAddr) {}
    fn connecting(&self, _endpoint: &str) {}
    fn connected(&self, _peer: std::net::SocketAddr) {}
    fn state_changed(&self, _state: SessionState) {}
    /// A source or sink was opened; `name` is a path or `<stdin>`/`<stdout>`.
    fn stream_opened(&self, _name: &str) {}
    fn transferred(&self, _bytes: u64) {}
    fn failed(&self, _error: &Error) {}
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDiagnostics;

impl Diagnostics for NoDiagnostics {}

/// Emits `tracing` events prefixed with the role and process id, e.g. `recv(4242)`.
#[derive(Debug, Clone)]
pub struct TracingDiagnostics {
    prefix: String,
}

impl TracingDiagnostics {
    #[must_use]
    pub fn new(role: Role) -> Self {
        Self {
            prefix: format!("{}({})", role, std::process::id()),
        }
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl Diagnostics for TracingDiagnostics {
    fn listening(&self, local: std::net::SocketAddr) {
        tracing::info!("{} listening on {}", self.prefix, local);
    }

    fn connecting(&self, endpoint: &str) {
        tracing::info!("{} sending to {}", self.prefix, endpoint);
    }

    fn connected(&self, peer: std::net::SocketAddr) {
        tracing::info!("{} connected to {}", self.prefix, peer);
    }

    fn state_changed(&self, state: SessionState) {
        tracing::debug!("{} session {}", self.prefix, state);
    }

    fn stream_opened(&self, name: &str) {
        tracing::info!("{} using {}", self.prefix, name);
    }

    fn transferred(&self, bytes: u64) {
        tracing::info!("{} transferred {} bytes", self.prefix, bytes);
    }

    fn failed(&self, error: &Error) {
        tracing::error!("{} {:#}", self.prefix, error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn prefix_carries_role_and_pid() {
        let diagnostics = TracingDiagnostics::new(Role::Receive);
        assert_eq!(
            diagnostics.prefix(),
            format!("recv({})", std::process::id())
        );
        let diagnostics = TracingDiagnostics::new(Role::Send);
        assert!(diagnostics.prefix().starts_with("send("));
    }

    #[test]
    #[traced_test]
    fn tracing_diagnostics_logs_events() {
        let diagnostics = TracingDiagnostics::new(Role::Receive);
        diagnostics.listening("127.0.0.1:4200".parse().unwrap());
        diagnostics.transferred(42);
        diagnostics.failed(&Error::AlreadyExists {
            path: "/tmp/x".into(),
        });
        assert!(logs_contain("listening on 127.0.0.1:4200"));
        assert!(logs_contain("transferred 42 bytes"));
        assert!(logs_contain("already exists"));
    }

    #[test]
    fn session_state_display() {
        assert_eq!(SessionState::Listening.to_string(), "listening");
        assert_eq!(SessionState::Closed.to_string(), "closed");
    }
}
