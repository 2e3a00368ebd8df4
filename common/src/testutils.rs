//! Helpers for tests of crates built on top of `common`.

use crate::diagnostics::{Diagnostics, SessionState};
use crate::error::Error;

/// Records every diagnostics event and hands out the bound listener address.
///
/// Lets a test bind a receiver on port 0 and learn the real port without sleeping.
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    states: std::sync::Mutex<Vec<SessionState>>,
    streams: std::sync::Mutex<Vec<String>>,
    transferred: std::sync::Mutex<Option<u64>>,
    failures: std::sync::Mutex<Vec<String>>,
    listening_tx: std::sync::Mutex<Option<tokio::sync::oneshot::Sender<std::net::SocketAddr>>>,
}

impl RecordingDiagnostics {
    /// Returns the recorder and a receiver resolved once the listener is bound.
    #[must_use]
    pub fn with_listening_channel() -> (Self, tokio::sync::oneshot::Receiver<std::net::SocketAddr>) {
        let (tx, rx) = tokio::sync::oneshot::channel();
        let recorder = Self {
            listening_tx: std::sync::Mutex::new(Some(tx)),
            ..Default::default()
        };
        (recorder, rx)
    }

    #[must_use]
    pub fn states(&self) -> Vec<SessionState> {
        self.states.lock().unwrap().clone()
    }

    #[must_use]
    pub fn streams(&self) -> Vec<String> {
        self.streams.lock().unwrap().clone()
    }

    #[must_use]
    pub fn transferred(&self) -> Option<u64> {
        *self.transferred.lock().unwrap()
    }

    #[must_use]
    pub fn failures(&self) -> Vec<String> {
        self.failures.lock().unwrap().clone()
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn listening(&self, local: std::net::SocketAddr) {
        if let Some(tx) = self.listening_tx.lock().unwrap().take() {
            // the test may have stopped waiting
            let _ = tx.send(local);
        }
    }

    fn state_changed(&self, state: SessionState) {
        self.states.lock().unwrap().push(state);
    }

    fn stream_opened(&self, name: &str) {
        self.streams.lock().unwrap().push(name.to_string());
    }

    fn transferred(&self, bytes: u64) {
        *self.transferred.lock().unwrap() = Some(bytes);
    }

    fn failed(&self, error: &Error) {
        self.failures.lock().unwrap().push(error.to_string());
    }
}

/// Creates a file with `contents` inside `dir` and returns its path.
pub fn write_file(dir: &std::path::Path, name: &str, contents: &[u8]) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}
