//! Archive data sources.
//!
//! An archive can live on the local filesystem, in memory, or behind an
//! HTTP server that honors Range requests. Everything above this module
//! works against the [`ReadAt`] trait and never cares which one it got.

mod buffer;
mod http;
mod local;

pub use buffer::BufferSource;
pub use http::HttpRangeSource;
pub use local::FileSource;

use anyhow::Result;
use async_trait::async_trait;

/// Random-access reads over an archive source of known size.
#[async_trait]
pub trait ReadAt: Send + Sync {
    /// Read data at the given offset into the buffer, returning the number
    /// of bytes read.
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize>;

    /// Total size of the source in bytes.
    fn size(&self) -> u64;
}
