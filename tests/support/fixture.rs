// Hand-assembled ZIP fixtures shared by the integration tests.
#![allow(dead_code)]

use std::io::Write;

use flate2::write::DeflateEncoder;
use flate2::{Compression, Crc};

pub const OS_UNIX: u8 = 3;

// 2019-11-22 13:30:10 in DOS packing.
pub const DOS_DATE: u16 = ((2019 - 1980) << 9) | (11 << 5) | 22;
pub const DOS_TIME: u16 = (13 << 11) | (30 << 5) | (10 / 2);

pub struct TestEntry {
    pub name: &'static str,
    pub data: Vec<u8>,
    pub deflate: bool,
    pub made_by_os: u8,
    pub external_attrs: u32,
    pub encrypted: bool,
    pub corrupt_crc: bool,
    /// Record this method code instead of the real one, keeping the data
    /// uncompressed. For entries whose codec the reader cannot decode.
    pub method_override: Option<u16>,
    /// Record this compressed size in the headers regardless of the real
    /// payload length. For truncation scenarios.
    pub declared_compressed: Option<u32>,
}

impl TestEntry {
    pub fn stored(name: &'static str, data: &[u8]) -> Self {
        Self {
            name,
            data: data.to_vec(),
            deflate: false,
            made_by_os: OS_UNIX,
            external_attrs: 0o100644 << 16,
            encrypted: false,
            corrupt_crc: false,
            method_override: None,
            declared_compressed: None,
        }
    }

    pub fn deflated(name: &'static str, data: &[u8]) -> Self {
        Self {
            deflate: true,
            ..Self::stored(name, data)
        }
    }

    pub fn directory(name: &'static str) -> Self {
        Self {
            external_attrs: 0o040755 << 16,
            ..Self::stored(name, b"")
        }
    }
}

pub fn put_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

pub fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

pub fn put_u64(out: &mut Vec<u8>, value: u64) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn entry_crc(entry: &TestEntry) -> u32 {
    let mut crc = Crc::new();
    crc.update(&entry.data);
    let sum = crc.sum();
    if entry.corrupt_crc { sum ^ 0xDEADBEEF } else { sum }
}

fn compressed_payload(entry: &TestEntry) -> (u16, Vec<u8>) {
    if let Some(method) = entry.method_override {
        (method, entry.data.clone())
    } else if entry.deflate {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&entry.data).unwrap();
        (8, encoder.finish().unwrap())
    } else {
        (0, entry.data.clone())
    }
}

/// Assemble a single-disk ZIP archive byte-for-byte.
pub fn build_zip(entries: &[TestEntry], comment: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut records = Vec::new();

    for entry in entries {
        let lfh_offset = out.len() as u32;
        let (method, payload) = compressed_payload(entry);
        let declared = entry.declared_compressed.unwrap_or(payload.len() as u32);
        let crc = entry_crc(entry);
        let flags: u16 = if entry.encrypted { 1 } else { 0 };

        out.extend_from_slice(b"PK\x03\x04");
        put_u16(&mut out, 20); // version needed
        put_u16(&mut out, flags);
        put_u16(&mut out, method);
        put_u16(&mut out, DOS_TIME);
        put_u16(&mut out, DOS_DATE);
        put_u32(&mut out, crc);
        put_u32(&mut out, declared);
        put_u32(&mut out, entry.data.len() as u32);
        put_u16(&mut out, entry.name.len() as u16);
        put_u16(&mut out, 0); // extra field
        out.extend_from_slice(entry.name.as_bytes());
        out.extend_from_slice(&payload);

        records.push((entry, lfh_offset, declared, crc, method, flags));
    }

    let cd_offset = out.len() as u32;
    for (entry, lfh_offset, declared, crc, method, flags) in records {
        out.extend_from_slice(b"PK\x01\x02");
        put_u16(&mut out, ((entry.made_by_os as u16) << 8) | 20);
        put_u16(&mut out, 20);
        put_u16(&mut out, flags);
        put_u16(&mut out, method);
        put_u16(&mut out, DOS_TIME);
        put_u16(&mut out, DOS_DATE);
        put_u32(&mut out, crc);
        put_u32(&mut out, declared);
        put_u32(&mut out, entry.data.len() as u32);
        put_u16(&mut out, entry.name.len() as u16);
        put_u16(&mut out, 0); // extra field
        put_u16(&mut out, 0); // entry comment
        put_u16(&mut out, 0); // disk number start
        put_u16(&mut out, 0); // internal attributes
        put_u32(&mut out, entry.external_attrs);
        put_u32(&mut out, lfh_offset);
        out.extend_from_slice(entry.name.as_bytes());
    }
    let cd_size = out.len() as u32 - cd_offset;

    out.extend_from_slice(b"PK\x05\x06");
    put_u16(&mut out, 0);
    put_u16(&mut out, 0);
    put_u16(&mut out, entries.len() as u16);
    put_u16(&mut out, entries.len() as u16);
    put_u32(&mut out, cd_size);
    put_u32(&mut out, cd_offset);
    put_u16(&mut out, comment.len() as u16);
    out.extend_from_slice(comment);
    out
}

/// Same as [`build_zip`] but with the ZIP64 EOCD chain and a saturated
/// regular EOCD, the way large archives are written.
pub fn build_zip64(entries: &[TestEntry]) -> Vec<u8> {
    let mut out = build_zip(entries, b"");
    // Drop the regular EOCD; re-derive the directory geometry from it.
    let eocd_start = out.len() - 22;
    let cd_size = u32::from_le_bytes(out[eocd_start + 12..eocd_start + 16].try_into().unwrap());
    let cd_offset = u32::from_le_bytes(out[eocd_start + 16..eocd_start + 20].try_into().unwrap());
    out.truncate(eocd_start);

    let eocd64_offset = out.len() as u64;
    out.extend_from_slice(b"PK\x06\x06");
    put_u64(&mut out, 44); // size of remaining record
    put_u16(&mut out, 45); // version made by
    put_u16(&mut out, 45); // version needed
    put_u32(&mut out, 0); // disk number
    put_u32(&mut out, 0); // disk with cd
    put_u64(&mut out, entries.len() as u64);
    put_u64(&mut out, entries.len() as u64);
    put_u64(&mut out, cd_size as u64);
    put_u64(&mut out, cd_offset as u64);

    out.extend_from_slice(b"PK\x06\x07");
    put_u32(&mut out, 0);
    put_u64(&mut out, eocd64_offset);
    put_u32(&mut out, 1);

    out.extend_from_slice(b"PK\x05\x06");
    put_u16(&mut out, 0);
    put_u16(&mut out, 0);
    put_u16(&mut out, 0xFFFF);
    put_u16(&mut out, 0xFFFF);
    put_u32(&mut out, 0xFFFFFFFF);
    put_u32(&mut out, 0xFFFFFFFF);
    put_u16(&mut out, 0);
    out
}
