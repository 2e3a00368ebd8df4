//! Point-to-point file transfer over a raw TCP stream - `nw send` / `nw receive`
//!
//! One process listens and writes whatever it receives to a file (or stdout); another
//! connects and streams a file (or stdin) to it. There is no protocol on top of TCP: no
//! header, no framing, no checksum. The stream ends when the sender shuts down its side
//! of the connection.
//!
//! # Usage
//!
//! ```bash
//! # on the receiving host, write to out.bin (fails if it already exists)
//! nw --host 0.0.0.0 --port 4200 receive out.bin
//!
//! # on the sending host
//! nw --host receiver.example.com --port 4200 send in.bin
//!
//! # pipes work too
//! nw receive | tar x
//! tar c dir | nw send
//! ```
//!
//! The receiver must be listening before the sender dials; there is no retry.
//!
//! # Semantics
//!
//! - The receiver accepts exactly one connection, then closes its listener.
//! - An existing destination is never touched unless `--overwrite` is given.
//! - Both sides report the number of bytes moved. On a mid-stream failure the error
//!   carries the number of bytes written so far (see [`common::Error::bytes`]).
//! - Every socket and file handle is released on every exit path.
//!
//! # Exit codes
//!
//! | code | meaning                 |
//! |------|-------------------------|
//! | 0    | success                 |
//! | 1    | no mode given           |
//! | 2    | invalid mode or option  |
//! | 3    | the transfer failed     |

pub mod receiver;
pub mod sender;

pub use receiver::{ReceiveSettings, receive};
pub use sender::{SendSettings, send};

/// Outcome of a successful transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub bytes: u64,
    pub elapsed: std::time::Duration,
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let elapsed = std::time::Duration::from_millis(self.elapsed.as_millis() as u64);
        writeln!(
            f,
            "bytes transferred: {} ({} bytes)",
            bytesize::ByteSize(self.bytes),
            self.bytes
        )?;
        write!(f, "elapsed: {}", humantime::format_duration(elapsed))?;
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            let rate = (self.bytes as f64 / secs) as u64;
            write!(f, "\nthroughput: {}/s", bytesize::ByteSize(rate))?;
        }
        Ok(())
    }
}

/// Treats an empty path the same as no path: use the standard stream.
fn non_empty(path: Option<&std::path::Path>) -> Option<&std::path::Path> {
    path.filter(|path| !path.as_os_str().is_empty())
}
