//! `Content-Length` framing for JSON-RPC over a byte stream.
//!
//! Each message is `Content-Length: N\r\n\r\n` followed by `N` bytes of
//! JSON. Other headers are accepted and ignored.

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// Upper bound on a single frame body (4 MiB).
pub const MAX_FRAME_BYTES: usize = 4 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("I/O error while {action}: {source}")]
    Io {
        action: &'static str,
        source: std::io::Error,
    },
    #[error("unexpected EOF while reading headers")]
    TruncatedHeaders,
    #[error("missing Content-Length header")]
    MissingContentLength,
    #[error("invalid Content-Length value '{0}'")]
    InvalidContentLength(String),
    #[error("Content-Length {0} exceeds maximum {MAX_FRAME_BYTES}")]
    TooLarge(usize),
    /// The frame was read completely but its body is not JSON. The stream is
    /// still in sync.
    #[error("frame body is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error("failed to serialize frame: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl FrameError {
    /// Whether the next frame can still be read after this error.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::InvalidJson(_))
    }
}

fn io(action: &'static str) -> impl FnOnce(std::io::Error) -> FrameError {
    move |source| FrameError::Io { action, source }
}

pub struct FrameReader<R> {
    reader: BufReader<R>,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
        }
    }

    /// Read the next frame. `Ok(None)` means the peer closed the stream
    /// between frames.
    pub async fn read_frame(&mut self) -> Result<Option<serde_json::Value>, FrameError> {
        let Some(content_length) = self.read_headers().await? else {
            return Ok(None);
        };
        if content_length > MAX_FRAME_BYTES {
            return Err(FrameError::TooLarge(content_length));
        }

        let mut body = vec![0u8; content_length];
        self.reader
            .read_exact(&mut body)
            .await
            .map_err(io("reading frame body"))?;

        serde_json::from_slice(&body)
            .map(Some)
            .map_err(FrameError::InvalidJson)
    }

    async fn read_headers(&mut self) -> Result<Option<usize>, FrameError> {
        let mut content_length = None;
        let mut line = String::new();
        let mut started = false;

        loop {
            line.clear();
            let read = self
                .reader
                .read_line(&mut line)
                .await
                .map_err(io("reading header line"))?;

            if read == 0 {
                if started {
                    return Err(FrameError::TruncatedHeaders);
                }
                return Ok(None);
            }
            started = true;

            let trimmed = line.trim();
            if trimmed.is_empty() {
                break;
            }

            let Some((name, value)) = trimmed.split_once(':') else {
                continue;
            };
            if name.trim().eq_ignore_ascii_case("Content-Length") {
                let value = value.trim();
                content_length = Some(
                    value
                        .parse()
                        .map_err(|_| FrameError::InvalidContentLength(value.to_string()))?,
                );
            }
        }

        content_length
            .map(Some)
            .ok_or(FrameError::MissingContentLength)
    }
}

pub struct FrameWriter<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub async fn write_frame(&mut self, message: &serde_json::Value) -> Result<(), FrameError> {
        let body = serde_json::to_vec(message).map_err(FrameError::Serialize)?;
        let header = format!("Content-Length: {}\r\n\r\n", body.len());

        self.writer
            .write_all(header.as_bytes())
            .await
            .map_err(io("writing frame header"))?;
        self.writer
            .write_all(&body)
            .await
            .map_err(io("writing frame body"))?;
        self.writer.flush().await.map_err(io("flushing frame"))?;
        Ok(())
    }
}
