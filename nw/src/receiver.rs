use common::{Diagnostics, Error};
use remote::streams::BoxedWrite;
use remote::{Endpoint, Listening};
use tracing::instrument;

use crate::Summary;

#[derive(Debug, Clone, Copy)]
pub struct ReceiveSettings {
    /// Replace an existing destination file
    pub overwrite: bool,
    /// Size of the copy buffer in bytes
    pub buffer_size: usize,
}

impl Default for ReceiveSettings {
    fn default() -> Self {
        Self {
            overwrite: false,
            buffer_size: remote::streams::DEFAULT_BUFFER_SIZE,
        }
    }
}

struct Sink {
    name: String,
    writer: BoxedWrite,
}

/// Opens the destination: stdout when `destination` is `None`, otherwise a file.
///
/// An existing file is only truncated when `overwrite` is set. Without it the file is
/// created with `create_new`, so losing a race against another creator still reports
/// [`Error::AlreadyExists`] instead of clobbering.
#[instrument]
async fn open_sink(destination: Option<&std::path::Path>, overwrite: bool) -> Result<Sink, Error> {
    let Some(path) = destination else {
        return Ok(Sink {
            name: "<stdout>".to_string(),
            writer: Box::new(tokio::io::stdout()),
        });
    };
    match tokio::fs::metadata(path).await {
        Ok(_) if !overwrite => {
            return Err(Error::AlreadyExists {
                path: path.to_path_buf(),
            });
        }
        Ok(_) => tracing::debug!("{:?} exists, overwriting", path),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(Error::UnknownIo {
                path: path.to_path_buf(),
                source: err,
            });
        }
    }
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true);
    if overwrite {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }
    let file = options
        .open(path)
        .await
        .map_err(|err| Error::from_io(path, err))?;
    Ok(Sink {
        name: path.display().to_string(),
        writer: Box::new(file),
    })
}

async fn receive_session(
    endpoint: &Endpoint,
    destination: Option<&std::path::Path>,
    settings: &ReceiveSettings,
    diagnostics: &dyn Diagnostics,
) -> Result<Summary, Error> {
    let listening = Listening::bind(endpoint, diagnostics).await?;
    let mut connected = listening.accept(diagnostics).await?;
    let mut sink = match open_sink(crate::non_empty(destination), settings.overwrite).await {
        Ok(sink) => sink,
        Err(error) => {
            // close right away so the sender's writes fail instead of vanishing
            connected.abandon(diagnostics);
            return Err(error);
        }
    };
    diagnostics.stream_opened(&sink.name);
    let start = std::time::Instant::now();
    let res = remote::streams::copy_counted(
        connected.stream_mut(),
        &mut sink.writer,
        settings.buffer_size,
    )
    .await;
    // release in reverse order of acquisition: sink, then connection
    drop(sink);
    connected.close(diagnostics).await;
    Ok(Summary {
        bytes: res?,
        elapsed: start.elapsed(),
    })
}

/// Listens on `endpoint`, accepts one connection and writes everything it sends to
/// `destination` (stdout if `None` or empty).
///
/// Returns once the peer closes its side of the connection. On failure the error's
/// [`Error::bytes`] tells how much was written.
#[instrument(skip(diagnostics))]
pub async fn receive(
    endpoint: &Endpoint,
    destination: Option<&std::path::Path>,
    settings: &ReceiveSettings,
    diagnostics: &dyn Diagnostics,
) -> Result<Summary, Error> {
    let res = receive_session(endpoint, destination, settings, diagnostics).await;
    match &res {
        Ok(summary) => diagnostics.transferred(summary.bytes),
        Err(error) => diagnostics.failed(error),
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;
    use tracing_test::traced_test;

    #[tokio::test]
    #[traced_test]
    async fn existing_file_is_untouched_without_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = common::testutils::write_file(dir.path(), "out.bin", b"precious");
        let error = open_sink(Some(&path), false).await.err().unwrap();
        assert!(matches!(error, Error::AlreadyExists { .. }));
        assert_eq!(std::fs::read(&path).unwrap(), b"precious");
    }

    #[tokio::test]
    async fn existing_file_is_truncated_with_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = common::testutils::write_file(dir.path(), "out.bin", b"old contents");
        let mut sink = open_sink(Some(&path), true).await.unwrap();
        sink.writer.write_all(b"new").await.unwrap();
        sink.writer.flush().await.unwrap();
        drop(sink);
        assert_eq!(std::fs::read(&path).unwrap(), b"new");
    }

    #[tokio::test]
    async fn new_file_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fresh.bin");
        let sink = open_sink(Some(&path), false).await.unwrap();
        assert_eq!(sink.name, path.display().to_string());
        assert!(path.exists());
    }

    #[tokio::test]
    async fn missing_parent_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no").join("such").join("dir");
        for overwrite in [false, true] {
            let error = open_sink(Some(&path), overwrite).await.err().unwrap();
            assert!(matches!(error, Error::NotFound { .. }), "{error:?}");
        }
    }

    #[tokio::test]
    async fn directory_destination_is_unknown_io() {
        let dir = tempfile::tempdir().unwrap();
        let error = open_sink(Some(dir.path()), true).await.err().unwrap();
        assert!(matches!(error, Error::UnknownIo { .. }), "{error:?}");
    }

    #[tokio::test]
    async fn no_destination_is_stdout() {
        let sink = open_sink(None, false).await.unwrap();
        assert_eq!(sink.name, "<stdout>");
    }
}
