use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

use anyhow::{bail, Result};

use crate::config::CapabilitySet;

/// ZIP compression methods.
///
/// The full vocabulary libzip's configuration knows about; this build only
/// decodes [`Stored`](CompressionMethod::Stored) and
/// [`Deflate`](CompressionMethod::Deflate).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Deflate,
    Deflate64,
    Bzip2,
    Unknown(u16),
}

impl CompressionMethod {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflate,
            9 => CompressionMethod::Deflate64,
            12 => CompressionMethod::Bzip2,
            _ => CompressionMethod::Unknown(value),
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            CompressionMethod::Stored => 0,
            CompressionMethod::Deflate => 8,
            CompressionMethod::Deflate64 => 9,
            CompressionMethod::Bzip2 => 12,
            CompressionMethod::Unknown(v) => *v,
        }
    }

    /// Whether this build can decode the method.
    ///
    /// Stored and deflate are always decodable. Bzip2 is an optional
    /// backend gated by the capability table's `HAVE_LIBBZ2` flag, so
    /// only the Apple branch reports it. Everything else is unsupported.
    pub fn is_supported(&self, caps: &CapabilitySet) -> bool {
        match self {
            CompressionMethod::Stored | CompressionMethod::Deflate => true,
            CompressionMethod::Bzip2 => caps.has("HAVE_LIBBZ2"),
            CompressionMethod::Deflate64 | CompressionMethod::Unknown(_) => false,
        }
    }

    pub fn name(&self) -> String {
        match self {
            CompressionMethod::Stored => "stored".to_string(),
            CompressionMethod::Deflate => "deflate".to_string(),
            CompressionMethod::Deflate64 => "deflate64".to_string(),
            CompressionMethod::Bzip2 => "bzip2".to_string(),
            CompressionMethod::Unknown(v) => format!("unknown({v})"),
        }
    }
}

/// How an entry is encrypted, if at all.
///
/// Traditional PKWARE encryption is signaled by a general-purpose flag
/// bit; WinZip AES replaces the compression method with 99 and records the
/// key strength in an extra field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncryptionMethod {
    None,
    TradPkware,
    Aes128,
    Aes192,
    Aes256,
    Unknown,
}

impl EncryptionMethod {
    pub fn is_encrypted(&self) -> bool {
        !matches!(self, EncryptionMethod::None)
    }

    pub fn name(&self) -> &'static str {
        match self {
            EncryptionMethod::None => "none",
            EncryptionMethod::TradPkware => "pkware",
            EncryptionMethod::Aes128 => "aes-128",
            EncryptionMethod::Aes192 => "aes-192",
            EncryptionMethod::Aes256 => "aes-256",
            EncryptionMethod::Unknown => "unknown",
        }
    }
}

/// Operating system recorded in the version-made-by field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MadeByOs {
    Dos,
    Unix,
    Os2,
    Macintosh,
    WindowsNtfs,
    Osx,
    Unknown(u8),
}

impl MadeByOs {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0x00 => MadeByOs::Dos,
            0x03 => MadeByOs::Unix,
            0x06 => MadeByOs::Os2,
            0x07 => MadeByOs::Macintosh,
            0x0a => MadeByOs::WindowsNtfs,
            0x13 => MadeByOs::Osx,
            other => MadeByOs::Unknown(other),
        }
    }

    /// Whether external attributes from this OS carry a POSIX mode in
    /// their high 16 bits.
    pub fn uses_posix_attributes(&self) -> bool {
        matches!(self, MadeByOs::Unix | MadeByOs::Macintosh | MadeByOs::Osx)
    }
}

/// End of Central Directory (EOCD) - 22 bytes minimum
pub struct EndOfCentralDirectory {
    pub disk_number: u16,
    pub disk_with_cd: u16,
    pub disk_entries: u16,
    pub total_entries: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
    pub comment_len: u16,
}

impl EndOfCentralDirectory {
    pub const SIGNATURE: &'static [u8] = b"PK\x05\x06";
    pub const SIZE: usize = 22;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE || &data[0..4] != Self::SIGNATURE {
            bail!("Invalid End of Central Directory");
        }

        let mut cursor = Cursor::new(&data[4..]);

        Ok(Self {
            disk_number: cursor.read_u16::<LittleEndian>()?,
            disk_with_cd: cursor.read_u16::<LittleEndian>()?,
            disk_entries: cursor.read_u16::<LittleEndian>()?,
            total_entries: cursor.read_u16::<LittleEndian>()?,
            cd_size: cursor.read_u32::<LittleEndian>()?,
            cd_offset: cursor.read_u32::<LittleEndian>()?,
            comment_len: cursor.read_u16::<LittleEndian>()?,
        })
    }

    pub fn is_zip64(&self) -> bool {
        self.disk_entries == 0xFFFF
            || self.total_entries == 0xFFFF
            || self.cd_size == 0xFFFFFFFF
            || self.cd_offset == 0xFFFFFFFF
    }
}

/// ZIP64 End of Central Directory Locator - 20 bytes
pub struct Zip64EOCDLocator {
    pub disk_with_eocd64: u32,
    pub eocd64_offset: u64,
    pub total_disks: u32,
}

impl Zip64EOCDLocator {
    pub const SIGNATURE: &'static [u8] = b"PK\x06\x07";
    pub const SIZE: usize = 20;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE || &data[0..4] != Self::SIGNATURE {
            bail!("Invalid ZIP64 format");
        }

        let mut cursor = Cursor::new(&data[4..]);

        Ok(Self {
            disk_with_eocd64: cursor.read_u32::<LittleEndian>()?,
            eocd64_offset: cursor.read_u64::<LittleEndian>()?,
            total_disks: cursor.read_u32::<LittleEndian>()?,
        })
    }
}

/// ZIP64 End of Central Directory - 56 bytes minimum
pub struct Zip64EOCD {
    pub eocd64_size: u64,
    pub version_made_by: u16,
    pub version_needed: u16,
    pub disk_number: u32,
    pub disk_with_cd: u32,
    pub disk_entries: u64,
    pub total_entries: u64,
    pub cd_size: u64,
    pub cd_offset: u64,
}

impl Zip64EOCD {
    pub const SIGNATURE: &'static [u8] = b"PK\x06\x06";
    pub const MIN_SIZE: usize = 56;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::MIN_SIZE || &data[0..4] != Self::SIGNATURE {
            bail!("Invalid ZIP64 format");
        }

        let mut cursor = Cursor::new(&data[4..]);

        Ok(Self {
            eocd64_size: cursor.read_u64::<LittleEndian>()?,
            version_made_by: cursor.read_u16::<LittleEndian>()?,
            version_needed: cursor.read_u16::<LittleEndian>()?,
            disk_number: cursor.read_u32::<LittleEndian>()?,
            disk_with_cd: cursor.read_u32::<LittleEndian>()?,
            disk_entries: cursor.read_u64::<LittleEndian>()?,
            total_entries: cursor.read_u64::<LittleEndian>()?,
            cd_size: cursor.read_u64::<LittleEndian>()?,
            cd_offset: cursor.read_u64::<LittleEndian>()?,
        })
    }
}

/// Central Directory File Header (CDFH) - 46 bytes minimum
pub const CDFH_SIGNATURE: &[u8] = b"PK\x01\x02";
pub const CDFH_MIN_SIZE: usize = 46;

/// Local File Header (LFH) - 30 bytes
pub const LFH_SIGNATURE: &[u8] = b"PK\x03\x04";
pub const LFH_SIZE: usize = 30;

/// General-purpose flag bit 0: the entry is encrypted.
pub const FLAG_ENCRYPTED: u16 = 0x0001;

/// Parsed ZIP file entry information
#[derive(Debug, Clone)]
pub struct ZipFileEntry {
    pub file_name: String,
    pub compression_method: CompressionMethod,
    pub encryption_method: EncryptionMethod,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub crc32: u32,
    pub lfh_offset: u64,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
    pub made_by_os: MadeByOs,
    pub external_attrs: u32,
    pub is_directory: bool,
}

impl ZipFileEntry {
    /// Parse modification date to (year, month, day)
    pub fn mod_date(&self) -> (u16, u8, u8) {
        let day = (self.last_mod_date & 0x1F) as u8;
        let month = ((self.last_mod_date >> 5) & 0x0F) as u8;
        let year = ((self.last_mod_date >> 9) & 0x7F) + 1980;
        (year, month, day)
    }

    /// Parse modification time to (hour, minute, second)
    pub fn mod_time(&self) -> (u8, u8, u8) {
        let second = ((self.last_mod_time & 0x1F) * 2) as u8;
        let minute = ((self.last_mod_time >> 5) & 0x3F) as u8;
        let hour = ((self.last_mod_time >> 11) & 0x1F) as u8;
        (hour, minute, second)
    }

    pub fn is_encrypted(&self) -> bool {
        self.encryption_method.is_encrypted()
    }

    /// POSIX mode bits from the external attributes, when the entry was
    /// made by an OS that records them there.
    pub fn unix_mode(&self) -> Option<u32> {
        if self.made_by_os.uses_posix_attributes() {
            Some(self.external_attrs >> 16)
        } else {
            None
        }
    }

    /// Permission bits only (rwx for user/group/other).
    pub fn posix_permissions(&self) -> Option<u32> {
        self.unix_mode().map(|mode| mode & 0o777)
    }

    pub fn is_symlink(&self) -> bool {
        self.unix_mode()
            .is_some_and(|mode| mode & 0o170000 == 0o120000)
    }

    /// Directory detection following libzip: trust the attribute bits when
    /// present (DOS directory bit for DOS/NTFS entries, file type bits for
    /// POSIX entries), otherwise fall back to the trailing slash.
    pub(crate) fn detect_directory(
        file_name: &str,
        made_by_os: MadeByOs,
        external_attrs: u32,
    ) -> bool {
        if external_attrs == 0 {
            return file_name.ends_with('/');
        }
        match made_by_os {
            MadeByOs::Dos | MadeByOs::WindowsNtfs => external_attrs & 0x10 != 0,
            _ if made_by_os.uses_posix_attributes() => {
                (external_attrs >> 16) & 0o170000 == 0o040000
            }
            _ => file_name.ends_with('/'),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Platform;

    fn entry(made_by_os: MadeByOs, external_attrs: u32, name: &str) -> ZipFileEntry {
        ZipFileEntry {
            file_name: name.to_string(),
            compression_method: CompressionMethod::Stored,
            encryption_method: EncryptionMethod::None,
            compressed_size: 0,
            uncompressed_size: 0,
            crc32: 0,
            lfh_offset: 0,
            last_mod_time: 0,
            last_mod_date: 0,
            made_by_os,
            external_attrs,
            is_directory: false,
        }
    }

    #[test]
    fn compression_method_round_trips_known_codes() {
        assert_eq!(CompressionMethod::from_u16(0), CompressionMethod::Stored);
        assert_eq!(CompressionMethod::from_u16(8), CompressionMethod::Deflate);
        assert_eq!(CompressionMethod::from_u16(12), CompressionMethod::Bzip2);
        assert_eq!(
            CompressionMethod::from_u16(97),
            CompressionMethod::Unknown(97)
        );
        assert_eq!(CompressionMethod::Deflate64.as_u16(), 9);
    }

    #[test]
    fn method_support_follows_the_capability_table() {
        let apple = CapabilitySet::resolve(Platform::Apple);
        let posix = CapabilitySet::resolve(Platform::Posix);
        for caps in [&apple, &posix] {
            assert!(CompressionMethod::Stored.is_supported(caps));
            assert!(CompressionMethod::Deflate.is_supported(caps));
            assert!(!CompressionMethod::Deflate64.is_supported(caps));
            assert!(!CompressionMethod::Unknown(97).is_supported(caps));
        }
        // bzip2 rides on the branch's HAVE_LIBBZ2 flag.
        assert!(CompressionMethod::Bzip2.is_supported(&apple));
        assert!(!CompressionMethod::Bzip2.is_supported(&posix));
    }

    #[test]
    fn unix_mode_only_for_posix_authors() {
        let unix = entry(MadeByOs::Unix, 0o100644 << 16, "a.txt");
        assert_eq!(unix.unix_mode(), Some(0o100644));
        assert_eq!(unix.posix_permissions(), Some(0o644));
        assert!(!unix.is_symlink());

        let dos = entry(MadeByOs::Dos, 0o100644 << 16, "a.txt");
        assert_eq!(dos.unix_mode(), None);
    }

    #[test]
    fn symlink_detection_uses_file_type_bits() {
        let link = entry(MadeByOs::Unix, 0o120777 << 16, "link");
        assert!(link.is_symlink());
        let osx = entry(MadeByOs::Osx, 0o120755 << 16, "link");
        assert!(osx.is_symlink());
    }

    #[test]
    fn directory_detection_prefers_attributes() {
        assert!(ZipFileEntry::detect_directory("dir", MadeByOs::Dos, 0x10));
        assert!(!ZipFileEntry::detect_directory("file", MadeByOs::Dos, 0x20));
        assert!(ZipFileEntry::detect_directory(
            "dir",
            MadeByOs::Unix,
            0o040755 << 16
        ));
        // No attributes recorded: trailing slash decides.
        assert!(ZipFileEntry::detect_directory("dir/", MadeByOs::Dos, 0));
        assert!(!ZipFileEntry::detect_directory("file", MadeByOs::Unix, 0));
    }

    #[test]
    fn dos_timestamp_splits() {
        // 2019-11-22 13:30:10 in DOS packing.
        let date: u16 = ((2019 - 1980) << 9) | (11 << 5) | 22;
        let time: u16 = (13 << 11) | (30 << 5) | (10 / 2);
        let mut e = entry(MadeByOs::Unix, 0, "t");
        e.last_mod_date = date;
        e.last_mod_time = time;
        assert_eq!(e.mod_date(), (2019, 11, 22));
        assert_eq!(e.mod_time(), (13, 30, 10));
    }

    #[test]
    fn eocd_rejects_bad_signature() {
        let data = [0u8; EndOfCentralDirectory::SIZE];
        assert!(EndOfCentralDirectory::from_bytes(&data).is_err());
    }
}
