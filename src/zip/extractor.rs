use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::config::CapabilitySet;
use crate::io::ReadAt;
use anyhow::{bail, Context, Result};
use flate2::read::DeflateDecoder;
use flate2::Crc;

use super::parser::ZipParser;
use super::structures::{CompressionMethod, ZipFileEntry};

/// ZIP file extractor
pub struct ZipExtractor<R: ReadAt> {
    parser: ZipParser<R>,
    /// Capability table of this build, consulted for optional codecs.
    caps: CapabilitySet,
}

impl<R: ReadAt> ZipExtractor<R> {
    pub fn new(reader: Arc<R>) -> Self {
        Self {
            parser: ZipParser::new(reader),
            caps: crate::capabilities(),
        }
    }

    /// List all files in the archive
    pub async fn list_files(&self) -> Result<Vec<ZipFileEntry>> {
        self.parser.list_files().await
    }

    /// The archive comment, if one is set.
    pub async fn comment(&self) -> Result<Option<String>> {
        self.parser.read_comment().await
    }

    /// Extract file data to memory, decompressing and verifying the CRC.
    pub async fn extract_to_memory(&self, entry: &ZipFileEntry) -> Result<Vec<u8>> {
        if entry.is_encrypted() {
            bail!(
                "Entry {} is encrypted ({}); this build has no decryption support",
                entry.file_name,
                entry.encryption_method.name()
            );
        }

        if !entry.compression_method.is_supported(&self.caps) {
            bail!(
                "Unsupported compression method {} ({})",
                entry.compression_method.name(),
                entry.compression_method.as_u16()
            );
        }

        let data_offset = self.parser.get_data_offset(entry).await?;

        let mut raw = vec![0u8; entry.compressed_size as usize];
        let read = self.parser.reader().read_at(data_offset, &mut raw).await?;
        if (read as u64) < entry.compressed_size {
            bail!(
                "Truncated archive: {} wants {} bytes, source provided {}",
                entry.file_name,
                entry.compressed_size,
                read
            );
        }

        let data = match entry.compression_method {
            CompressionMethod::Stored => raw,
            CompressionMethod::Deflate => {
                let mut decoded = Vec::with_capacity(entry.uncompressed_size as usize);
                let mut decoder = DeflateDecoder::new(raw.as_slice());
                decoder
                    .read_to_end(&mut decoded)
                    .with_context(|| format!("Failed to inflate {}", entry.file_name))?;
                decoded
            }
            // Methods the capability table admits but this reader has no
            // decoder for (bzip2 on the Apple branch).
            other => bail!(
                "No decoder for compression method {} ({})",
                other.name(),
                other.as_u16()
            ),
        };

        if data.len() as u64 != entry.uncompressed_size {
            bail!(
                "Size mismatch for {}: expected {} bytes, got {}",
                entry.file_name,
                entry.uncompressed_size,
                data.len()
            );
        }

        let mut crc = Crc::new();
        crc.update(&data);
        if crc.sum() != entry.crc32 {
            bail!(
                "CRC mismatch for {}: expected {:08x}, got {:08x}",
                entry.file_name,
                entry.crc32,
                crc.sum()
            );
        }

        Ok(data)
    }

    /// Extract file to disk, restoring POSIX permissions when the entry
    /// recorded them.
    pub async fn extract_to_file(&self, entry: &ZipFileEntry, output_path: &Path) -> Result<()> {
        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let data = self.extract_to_memory(entry).await?;

        let mut file = fs::File::create(output_path).await?;
        file.write_all(&data).await?;

        #[cfg(unix)]
        if let Some(permissions) = entry.posix_permissions() {
            use std::fs::Permissions;
            use std::os::unix::fs::PermissionsExt;
            if permissions != 0 {
                fs::set_permissions(output_path, Permissions::from_mode(permissions)).await?;
            }
        }

        Ok(())
    }

    /// Extract file to stdout
    pub async fn extract_to_stdout(&self, entry: &ZipFileEntry) -> Result<()> {
        let data = self.extract_to_memory(entry).await?;

        let mut stdout = tokio::io::stdout();
        stdout.write_all(&data).await?;

        Ok(())
    }
}
