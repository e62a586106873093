//! Where chunk bytes come from.

use std::io::SeekFrom;

use coursemart_transfer::Chunk;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

/// Payload a job reads its chunks from, one chunk at a time.
pub(crate) enum ChunkSource<'a> {
    /// Payload already in memory; chunks are borrowed slices.
    Bytes(&'a [u8]),
    /// Open file; each chunk is read into a reused buffer.
    File { file: File, buf: Vec<u8> },
}

impl ChunkSource<'_> {
    pub(crate) fn file(file: File) -> Self {
        Self::File {
            file,
            buf: Vec::new(),
        }
    }

    /// Returns the bytes of `chunk`.
    ///
    /// A file that shrank since the job was planned surfaces as
    /// `UnexpectedEof`.
    pub(crate) async fn read(&mut self, chunk: &Chunk) -> std::io::Result<&[u8]> {
        match self {
            Self::Bytes(payload) => Ok(chunk.slice(*payload)),
            Self::File { file, buf } => {
                file.seek(SeekFrom::Start(chunk.offset)).await?;
                buf.resize(chunk.len, 0);
                file.read_exact(buf).await?;
                Ok(buf.as_slice())
            }
        }
    }
}
