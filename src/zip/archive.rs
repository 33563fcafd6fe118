use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Result};
use tokio::fs;

use crate::io::{FileSource, ReadAt};

use super::extractor::ZipExtractor;
use super::structures::ZipFileEntry;

/// High-level read access to a ZIP archive.
///
/// Wraps the extractor with entry lookup by name, archive comment access
/// and whole-archive extraction. Obtain one from a local path with
/// [`ZipArchive::open`] or from any source with
/// [`ZipArchive::from_source`].
pub struct ZipArchive<R: ReadAt> {
    extractor: ZipExtractor<R>,
}

impl ZipArchive<FileSource> {
    /// Open an archive on the local filesystem.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            bail!("Zip file does not exist: {}", path.display());
        }
        Ok(Self::from_source(Arc::new(FileSource::open(path)?)))
    }

    /// Sniff the magic bytes to decide whether a file looks like a ZIP
    /// archive (standard, empty or spanning).
    pub fn is_zip_archive(path: &Path) -> Result<bool> {
        use std::io::Read;

        let mut file = std::fs::File::open(path)?;
        let mut magic = [0u8; 4];
        let n = file.read(&mut magic)?;
        if n < 4 || magic[0] != 0x50 || magic[1] != 0x4B {
            return Ok(false);
        }
        Ok(matches!(
            (magic[2], magic[3]),
            (0x03, 0x04) | (0x05, 0x06) | (0x07, 0x08)
        ))
    }
}

impl<R: ReadAt> ZipArchive<R> {
    pub fn from_source(reader: Arc<R>) -> Self {
        Self {
            extractor: ZipExtractor::new(reader),
        }
    }

    /// All entries in central-directory order.
    pub async fn entries(&self) -> Result<Vec<ZipFileEntry>> {
        self.extractor.list_files().await
    }

    /// Look up one entry by name.
    ///
    /// Case-insensitive lookup mirrors libzip's name-locate behavior with
    /// the nocase flag.
    pub async fn entry_by_name(
        &self,
        name: &str,
        case_sensitive: bool,
    ) -> Result<Option<ZipFileEntry>> {
        if name.is_empty() {
            return Ok(None);
        }
        let entries = self.entries().await?;
        Ok(entries.into_iter().find(|e| {
            if case_sensitive {
                e.file_name == name
            } else {
                e.file_name.eq_ignore_ascii_case(name)
            }
        }))
    }

    pub async fn contains_entry(&self, name: &str, case_sensitive: bool) -> Result<bool> {
        Ok(self.entry_by_name(name, case_sensitive).await?.is_some())
    }

    /// The archive comment, if one is set.
    pub async fn comment(&self) -> Result<Option<String>> {
        self.extractor.comment().await
    }

    /// Extract one entry into memory.
    pub async fn read_entry(&self, entry: &ZipFileEntry) -> Result<Vec<u8>> {
        self.extractor.extract_to_memory(entry).await
    }

    /// Extract one entry to the given path.
    pub async fn extract_entry(&self, entry: &ZipFileEntry, output_path: &Path) -> Result<()> {
        self.extractor.extract_to_file(entry, output_path).await
    }

    /// Extract every entry under `dir`, creating directories as needed.
    ///
    /// Existing files are skipped unless `overwrite` is set. Returns the
    /// number of file entries written.
    pub async fn extract_all(&self, dir: &Path, overwrite: bool) -> Result<usize> {
        let entries = self.entries().await?;
        let mut written = 0;

        for entry in &entries {
            let relative = sanitized_path(&entry.file_name)?;

            let target = dir.join(relative);
            if entry.is_directory {
                fs::create_dir_all(&target).await?;
                continue;
            }

            if target.exists() && !overwrite {
                continue;
            }
            self.extractor.extract_to_file(entry, &target).await?;
            written += 1;
        }

        Ok(written)
    }

    /// Extract one entry to stdout.
    pub async fn extract_to_stdout(&self, entry: &ZipFileEntry) -> Result<()> {
        self.extractor.extract_to_stdout(entry).await
    }
}

/// Reduce an entry name to a safe relative path.
///
/// Drops root markers and rejects parent-directory components so an
/// archive cannot write outside the extraction directory.
fn sanitized_path(name: &str) -> Result<PathBuf> {
    let mut out = PathBuf::new();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
            Component::ParentDir => bail!("Entry name escapes extraction directory: {name}"),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitized_path_strips_roots_and_rejects_parents() {
        assert_eq!(
            sanitized_path("/abs/path.txt").unwrap(),
            PathBuf::from("abs/path.txt")
        );
        assert_eq!(sanitized_path("./a/b").unwrap(), PathBuf::from("a/b"));
        assert!(sanitized_path("../escape").is_err());
        assert!(sanitized_path("a/../../b").is_err());
    }
}
