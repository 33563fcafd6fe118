//! # zipkit
//!
//! ZIP archive reading with a libzip-style platform capability table.
//!
//! The crate has two halves:
//!
//! - A read-side ZIP engine that lists and extracts archives from local
//!   files, in-memory buffers, or HTTP servers via Range requests. Remote
//!   archives only transfer the byte ranges the parser needs, so listing
//!   a large remote archive stays cheap.
//! - A build-time platform capability table mirroring the configuration
//!   contract of the libzip C library: per-platform presence flags and
//!   primitive type widths, resolved once from a platform discriminant.
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use zipkit::ZipArchive;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let archive = ZipArchive::open(Path::new("archive.zip"))?;
//!
//!     for entry in archive.entries().await? {
//!         println!("{}", entry.file_name);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod io;
pub mod zip;

pub use cli::Cli;
pub use config::{CapabilitySet, ConfigError, Platform};
pub use io::{BufferSource, FileSource, HttpRangeSource, ReadAt};
pub use zip::{ZipArchive, ZipExtractor, ZipFileEntry};

/// Capability table for the platform this crate was compiled for.
pub fn capabilities() -> CapabilitySet {
    CapabilitySet::resolve(Platform::current())
}
