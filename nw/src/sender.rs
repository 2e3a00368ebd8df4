use common::{Diagnostics, Error};
use remote::streams::BoxedRead;
use remote::{Connected, Endpoint};
use tracing::instrument;

use crate::Summary;

#[derive(Debug, Clone, Copy)]
pub struct SendSettings {
    /// Size of the copy buffer in bytes
    pub buffer_size: usize,
}

impl Default for SendSettings {
    fn default() -> Self {
        Self {
            buffer_size: remote::streams::DEFAULT_BUFFER_SIZE,
        }
    }
}

struct Source {
    name: String,
    reader: BoxedRead,
}

#[instrument]
async fn open_source(source: Option<&std::path::Path>) -> Result<Source, Error> {
    match source {
        None => Ok(Source {
            name: "<stdin>".to_string(),
            reader: Box::new(tokio::io::stdin()),
        }),
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .map_err(|err| Error::from_io(path, err))?;
            Ok(Source {
                name: path.display().to_string(),
                reader: Box::new(file),
            })
        }
    }
}

async fn send_session(
    endpoint: &Endpoint,
    source: Option<&std::path::Path>,
    settings: &SendSettings,
    diagnostics: &dyn Diagnostics,
) -> Result<Summary, Error> {
    let mut connected = Connected::dial(endpoint, diagnostics).await?;
    let mut source = match open_source(crate::non_empty(source)).await {
        Ok(source) => source,
        Err(error) => {
            connected.close_unused(diagnostics).await;
            return Err(error);
        }
    };
    diagnostics.stream_opened(&source.name);
    let start = std::time::Instant::now();
    let res = remote::streams::copy_counted(
        &mut source.reader,
        connected.stream_mut(),
        settings.buffer_size,
    )
    .await;
    drop(source);
    // closing is what tells the receiver the stream is over, so it happens on error too
    connected.close(diagnostics).await;
    Ok(Summary {
        bytes: res?,
        elapsed: start.elapsed(),
    })
}

/// Connects to `endpoint` and streams `source` (stdin if `None` or empty) to it.
///
/// Returns after the whole source has been written and the connection shut down. On
/// failure the error's [`Error::bytes`] tells how much was sent.
#[instrument(skip(diagnostics))]
pub async fn send(
    endpoint: &Endpoint,
    source: Option<&std::path::Path>,
    settings: &SendSettings,
    diagnostics: &dyn Diagnostics,
) -> Result<Summary, Error> {
    let res = send_session(endpoint, source, settings, diagnostics).await;
    match &res {
        Ok(summary) => diagnostics.transferred(summary.bytes),
        Err(error) => diagnostics.failed(error),
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn missing_source_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let error = open_source(Some(&dir.path().join("missing.bin")))
            .await
            .err()
            .unwrap();
        assert!(matches!(error, Error::NotFound { .. }), "{error:?}");
    }

    #[tokio::test]
    async fn file_source_reads_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = common::testutils::write_file(dir.path(), "in.bin", b"payload");
        let mut source = open_source(Some(&path)).await.unwrap();
        let mut contents = Vec::new();
        source.reader.read_to_end(&mut contents).await.unwrap();
        assert_eq!(contents, b"payload");
        assert_eq!(source.name, path.display().to_string());
    }

    #[tokio::test]
    async fn no_source_is_stdin() {
        let source = open_source(None).await.unwrap();
        assert_eq!(source.name, "<stdin>");
    }

    #[tokio::test]
    async fn unreadable_source_is_unknown_io() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let path = common::testutils::write_file(dir.path(), "locked.bin", b"secret");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o000)).unwrap();
        let res = open_source(Some(&path)).await;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600)).unwrap();
        match res {
            // root ignores permission bits
            Ok(_) => {}
            Err(error) => assert!(matches!(error, Error::UnknownIo { .. }), "{error:?}"),
        }
    }
}
