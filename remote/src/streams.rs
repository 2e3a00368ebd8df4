use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::instrument;

/// Type alias for boxed write stream (file, stdout or TCP)
pub type BoxedWrite = Box<dyn AsyncWrite + Unpin + Send>;
/// Type alias for boxed read stream (file, stdin or TCP)
pub type BoxedRead = Box<dyn AsyncRead + Unpin + Send>;

/// Default size of the copy buffer.
pub const DEFAULT_BUFFER_SIZE: usize = 128 * 1024;

/// Copies everything from `reader` to `writer` until `reader` reports end-of-stream.
///
/// Unlike `tokio::io::copy`, a failure keeps the number of bytes already written: any
/// error other than `Interrupted` is returned as [`common::Error::Transfer`] carrying
/// that count. The writer is flushed once the reader is exhausted.
#[instrument(level = "trace", skip(reader, writer))]
pub async fn copy_counted<R, W>(
    reader: &mut R,
    writer: &mut W,
    buffer_size: usize,
) -> Result<u64, common::Error>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut buf = vec![0u8; buffer_size.max(1)];
    let mut written: u64 = 0;
    let transfer_error = |bytes, source| common::Error::Transfer { bytes, source };
    loop {
        let n = match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(transfer_error(written, err)),
        };
        // count every accepted write, a chunk may fail after a short write
        let mut offset = 0;
        while offset < n {
            match writer.write(&buf[offset..n]).await {
                Ok(0) => {
                    return Err(transfer_error(
                        written,
                        std::io::Error::from(std::io::ErrorKind::WriteZero),
                    ));
                }
                Ok(k) => {
                    offset += k;
                    written += k as u64;
                }
                Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(transfer_error(written, err)),
            }
        }
        tracing::trace!("copied {} bytes, {} total", n, written);
    }
    writer
        .flush()
        .await
        .map_err(|err| transfer_error(written, err))?;
    Ok(written)
}
