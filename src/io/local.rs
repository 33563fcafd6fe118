use super::ReadAt;
use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

/// Local file archive source with random access.
pub struct FileSource {
    file: std::fs::File,
    #[cfg(not(unix))]
    lock: std::sync::Mutex<()>,
    size: u64,
}

impl FileSource {
    pub fn open(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let size = file.metadata()?.len();
        Ok(Self {
            file,
            #[cfg(not(unix))]
            lock: std::sync::Mutex::new(()),
            size,
        })
    }
}

#[async_trait]
impl ReadAt for FileSource {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::FileExt;
            Ok(self.file.read_at(buf, offset)?)
        }

        #[cfg(not(unix))]
        {
            use std::io::{Read, Seek, SeekFrom};
            // No pread: serialize seek+read on the shared handle.
            let _guard = self
                .lock
                .lock()
                .map_err(|_| anyhow::anyhow!("file source lock poisoned"))?;
            let mut file = &self.file;
            file.seek(SeekFrom::Start(offset))?;
            Ok(file.read(buf)?)
        }
    }

    fn size(&self) -> u64 {
        self.size
    }
}
