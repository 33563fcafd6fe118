//! ZIP archive parsing and extraction.
//!
//! Reads standard ZIP archives and ZIP64 extensions from any random-access
//! source.
//!
//! ## Architecture
//!
//! - [`structures`]: Data structures for ZIP format elements (EOCD, file
//!   headers, method and attribute vocabularies)
//! - [`parser`]: Low-level parsing of ZIP structures from raw bytes
//! - [`extractor`]: Decompression and extraction of single entries
//! - [`archive`]: High-level archive API (entry lookup, comment,
//!   extract-all)
//!
//! ## ZIP Format Overview
//!
//! A ZIP file consists of:
//! 1. Local file headers and compressed data for each file
//! 2. Central Directory with metadata for all files
//! 3. End of Central Directory (EOCD) record at the end
//!
//! Reading starts from the EOCD at the end of the file, so listing an
//! archive never touches the file data itself.
//!
//! ## Supported Features
//!
//! - Standard ZIP format (PKZIP APPNOTE 6.3.x compatible)
//! - ZIP64 extensions for files > 4GB
//! - STORED (no compression) and DEFLATE methods, with CRC verification
//! - Entry metadata: DOS timestamps, POSIX permissions, symlink and
//!   directory detection, encryption method reporting
//! - Archive comments
//!
//! ## Limitations
//!
//! - No decryption (encrypted entries are listed but refuse extraction)
//! - No multi-disk archive support
//! - No BZIP2, DEFLATE64 or LZMA decoding

mod archive;
mod extractor;
mod parser;
mod structures;

pub use archive::ZipArchive;
pub use extractor::ZipExtractor;
pub use parser::ZipParser;
pub use structures::*;
