//! Input and output payload types.

use std::fmt;
use std::io;
use std::path::Path;
use std::pin::Pin;

use bytes::{Bytes, BytesMut};
use futures::stream::{self, BoxStream, Stream, StreamExt, TryStreamExt};
use tokio::io::AsyncReadExt;

use super::error::ConversionError;

/// File name sent when the input has no name of its own.
pub const DEFAULT_FILE_NAME: &str = "default.dat";

const FILE_CHUNK_SIZE: usize = 64 * 1024;

/// Converted content, delivered in chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, ConversionError>> + Send>>;

enum InputBody {
    Bytes(Bytes),
    Stream {
        stream: BoxStream<'static, io::Result<Bytes>>,
        length: Option<u64>,
    },
}

/// Content to convert, with an optional file name.
pub struct RenditionInput {
    file_name: Option<String>,
    body: InputBody,
}

impl RenditionInput {
    /// Input backed by an in-memory buffer.
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        Self {
            file_name: None,
            body: InputBody::Bytes(data.into()),
        }
    }

    /// Input backed by a stream of chunks of unknown length.
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = io::Result<Bytes>> + Send + 'static,
    {
        Self {
            file_name: None,
            body: InputBody::Stream {
                stream: stream.boxed(),
                length: None,
            },
        }
    }

    /// Input streamed from a file. The file name is taken from the path.
    pub async fn from_file(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let file = tokio::fs::File::open(path).await?;
        let length = file.metadata().await?.len();

        let chunks = stream::try_unfold(file, |mut file| async move {
            let mut buf = vec![0u8; FILE_CHUNK_SIZE];
            let n = file.read(&mut buf).await?;
            if n == 0 {
                return Ok::<_, io::Error>(None);
            }
            buf.truncate(n);
            Ok(Some((Bytes::from(buf), file)))
        });

        Ok(Self {
            file_name: path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned()),
            body: InputBody::Stream {
                stream: chunks.boxed(),
                length: Some(length),
            },
        })
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// The file name to send, falling back to [`DEFAULT_FILE_NAME`].
    pub fn file_name_or_default(&self) -> &str {
        self.file_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_FILE_NAME)
    }

    /// Payload length, when known up front.
    pub fn length(&self) -> Option<u64> {
        match &self.body {
            InputBody::Bytes(bytes) => Some(bytes.len() as u64),
            InputBody::Stream { length, .. } => *length,
        }
    }

    /// Converts the payload into an HTTP request body.
    pub(crate) fn into_body(self) -> reqwest::Body {
        match self.body {
            InputBody::Bytes(bytes) => reqwest::Body::from(bytes),
            InputBody::Stream { stream, .. } => reqwest::Body::wrap_stream(stream),
        }
    }

    /// Reads the whole payload into memory.
    pub async fn into_bytes(self) -> io::Result<Bytes> {
        match self.body {
            InputBody::Bytes(bytes) => Ok(bytes),
            InputBody::Stream { stream, .. } => {
                let buf = stream
                    .try_fold(BytesMut::new(), |mut acc, chunk| async move {
                        acc.extend_from_slice(&chunk);
                        Ok(acc)
                    })
                    .await?;
                Ok(buf.freeze())
            }
        }
    }
}

impl fmt::Debug for RenditionInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenditionInput")
            .field("file_name", &self.file_name)
            .field("length", &self.length())
            .finish()
    }
}

/// Drains a [`ByteStream`] into a single buffer.
pub async fn collect_bytes(mut stream: ByteStream) -> Result<Bytes, ConversionError> {
    let mut buf = BytesMut::new();
    while let Some(chunk) = stream.try_next().await? {
        buf.extend_from_slice(&chunk);
    }
    Ok(buf.freeze())
}
