//! Store-only ZIP archive writer.
//!
//! Entries are copied verbatim (compression method 0). Every field that
//! would normally carry a timestamp or attribute is written as zero, so the
//! output is byte-for-byte deterministic for a given entry list.
//!
//! # Layout
//!
//! ```text
//! [local header + data] x N
//! [central directory record] x N
//! end of central directory record
//! ```
//!
//! All integers are little-endian.

use crate::crc32::crc32;
use log::debug;
use thiserror::Error;

const LOCAL_HEADER_SIGNATURE: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];
const CENTRAL_HEADER_SIGNATURE: [u8; 4] = [0x50, 0x4B, 0x01, 0x02];
const END_OF_CENTRAL_DIR_SIGNATURE: [u8; 4] = [0x50, 0x4B, 0x05, 0x06];

/// Version 2.0: the minimum for a stored entry.
const VERSION: u16 = 20;
const METHOD_STORE: u16 = 0;

/// Fixed size of a local file header, excluding name and extra field.
pub const LOCAL_HEADER_LEN: usize = 30;
/// Fixed size of a central directory record, excluding variable fields.
pub const CENTRAL_HEADER_LEN: usize = 46;
/// Size of the end of central directory record without a comment.
pub const END_OF_CENTRAL_DIR_LEN: usize = 22;

/// Errors raised when an entry cannot be represented in the classic format.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArchiveError {
    /// Entry name longer than the 16-bit name length field.
    #[error("Entry name is {len} bytes, the limit is 65535")]
    NameTooLong { len: usize },

    /// Entry data larger than the 32-bit size fields.
    #[error("Entry '{name}' is {len} bytes, the limit is 4294967295")]
    EntryTooLarge { name: String, len: usize },

    /// More entries than the 16-bit entry count allows.
    #[error("Archive already holds 65535 entries")]
    TooManyEntries,

    /// A header offset would not fit in 32 bits.
    #[error("Archive exceeds 4 GiB, offset {offset} cannot be stored")]
    OffsetOverflow { offset: usize },
}

#[inline]
fn push_u16(buf: &mut Vec<u8>, value: u16) {
    buf.extend_from_slice(&value.to_le_bytes());
}

#[inline]
fn push_u32(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

/// Incremental archive builder.
///
/// Local headers and data go straight into one growable buffer; central
/// directory records accumulate in a second buffer and are appended by
/// [`ArchiveWriter::finish`]. The write offset is the length of the main
/// buffer, so header offsets are always exact.
#[derive(Debug, Default)]
pub struct ArchiveWriter {
    body: Vec<u8>,
    central: Vec<u8>,
    entries: u16,
}

impl ArchiveWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries written so far.
    pub fn len(&self) -> usize {
        self.entries as usize
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    /// Bytes written so far, not counting the pending central directory.
    pub fn offset(&self) -> usize {
        self.body.len()
    }

    /// Append one stored entry.
    ///
    /// On error nothing is written and the writer is left unchanged.
    pub fn add_entry(&mut self, name: &str, data: &[u8]) -> Result<(), ArchiveError> {
        let name_bytes = name.as_bytes();
        let name_len =
            u16::try_from(name_bytes.len()).map_err(|_| ArchiveError::NameTooLong {
                len: name_bytes.len(),
            })?;
        let size = u32::try_from(data.len()).map_err(|_| ArchiveError::EntryTooLarge {
            name: name.to_string(),
            len: data.len(),
        })?;
        if self.entries == u16::MAX {
            return Err(ArchiveError::TooManyEntries);
        }
        let end = self.body.len() + LOCAL_HEADER_LEN + name_bytes.len() + data.len();
        if u32::try_from(end).is_err() {
            return Err(ArchiveError::OffsetOverflow { offset: end });
        }

        let crc = crc32(data);

        // Local file header
        let body = &mut self.body;
        body.reserve(LOCAL_HEADER_LEN + name_bytes.len() + data.len());
        body.extend_from_slice(&LOCAL_HEADER_SIGNATURE);
        push_u16(body, VERSION);
        push_u16(body, 0); // flags
        push_u16(body, METHOD_STORE);
        push_u16(body, 0); // time
        push_u16(body, 0); // date
        push_u32(body, crc);
        push_u32(body, size); // compressed
        push_u32(body, size); // uncompressed
        push_u16(body, name_len);
        push_u16(body, 0); // extra length
        body.extend_from_slice(name_bytes);
        body.extend_from_slice(data);

        // Offset of this entry's local header, measured back from its end.
        let local_offset = (body.len() - data.len() - LOCAL_HEADER_LEN - name_bytes.len()) as u32;

        // Central directory record
        let central = &mut self.central;
        central.extend_from_slice(&CENTRAL_HEADER_SIGNATURE);
        push_u16(central, VERSION); // made by
        push_u16(central, VERSION); // needed
        push_u16(central, 0); // flags
        push_u16(central, METHOD_STORE);
        push_u16(central, 0); // time
        push_u16(central, 0); // date
        push_u32(central, crc);
        push_u32(central, size);
        push_u32(central, size);
        push_u16(central, name_len);
        push_u16(central, 0); // extra length
        push_u16(central, 0); // comment length
        push_u16(central, 0); // disk number start
        push_u16(central, 0); // internal attributes
        push_u32(central, 0); // external attributes
        push_u32(central, local_offset);
        central.extend_from_slice(name_bytes);

        self.entries += 1;
        debug!("archive: stored '{name}' ({size} bytes, crc {crc:08x}) at offset {local_offset}");
        Ok(())
    }

    /// Append the central directory and end record, returning the archive.
    pub fn finish(self) -> Result<Vec<u8>, ArchiveError> {
        let Self {
            mut body,
            central,
            entries,
        } = self;

        let cd_offset = u32::try_from(body.len())
            .map_err(|_| ArchiveError::OffsetOverflow { offset: body.len() })?;
        let cd_size = u32::try_from(central.len()).map_err(|_| ArchiveError::OffsetOverflow {
            offset: body.len() + central.len(),
        })?;

        body.reserve(central.len() + END_OF_CENTRAL_DIR_LEN);
        body.extend_from_slice(&central);

        body.extend_from_slice(&END_OF_CENTRAL_DIR_SIGNATURE);
        push_u16(&mut body, 0); // this disk
        push_u16(&mut body, 0); // disk with central directory
        push_u16(&mut body, entries); // entries on this disk
        push_u16(&mut body, entries); // total entries
        push_u32(&mut body, cd_size);
        push_u32(&mut body, cd_offset);
        push_u16(&mut body, 0); // comment length

        debug!(
            "archive: finished {entries} entries, central directory {cd_size} bytes at {cd_offset}"
        );
        Ok(body)
    }
}

/// Package `(name, bytes)` pairs into a store-only archive, in order.
pub fn package_archive<N, D>(entries: &[(N, D)]) -> Result<Vec<u8>, ArchiveError>
where
    N: AsRef<str>,
    D: AsRef<[u8]>,
{
    let mut writer = ArchiveWriter::new();
    for (name, data) in entries {
        writer.add_entry(name.as_ref(), data.as_ref())?;
    }
    writer.finish()
}

#[cfg(test)]
pub(crate) mod reader {
    //! Minimal store-only reader used to check archives in tests.

    use crate::crc32::crc32;

    #[derive(Debug, PartialEq, Eq)]
    pub struct Entry {
        pub name: String,
        pub crc: u32,
        pub data: Vec<u8>,
    }

    fn u16_at(buf: &[u8], at: usize) -> usize {
        u16::from_le_bytes([buf[at], buf[at + 1]]) as usize
    }

    fn u32_at(buf: &[u8], at: usize) -> u32 {
        u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
    }

    /// Walk the central directory from the end record, the way unzip does,
    /// and check every local header against its central record.
    pub fn read_all(archive: &[u8]) -> Vec<Entry> {
        let eocd = archive.len() - 22;
        assert_eq!(&archive[eocd..eocd + 4], &[0x50, 0x4B, 0x05, 0x06]);
        let count = u16_at(archive, eocd + 10);
        assert_eq!(count, u16_at(archive, eocd + 8));
        let cd_size = u32_at(archive, eocd + 12) as usize;
        let cd_offset = u32_at(archive, eocd + 16) as usize;
        assert_eq!(cd_offset + cd_size, eocd);

        let mut entries = Vec::with_capacity(count);
        let mut at = cd_offset;
        for _ in 0..count {
            assert_eq!(&archive[at..at + 4], &[0x50, 0x4B, 0x01, 0x02]);
            assert_eq!(u16_at(archive, at + 10), 0, "method must be store");
            let crc = u32_at(archive, at + 16);
            let size = u32_at(archive, at + 20) as usize;
            assert_eq!(size, u32_at(archive, at + 24) as usize);
            let name_len = u16_at(archive, at + 28);
            let extra_len = u16_at(archive, at + 30);
            let comment_len = u16_at(archive, at + 32);
            let local = u32_at(archive, at + 42) as usize;
            let name = String::from_utf8(archive[at + 46..at + 46 + name_len].to_vec()).unwrap();

            assert_eq!(&archive[local..local + 4], &[0x50, 0x4B, 0x03, 0x04]);
            assert_eq!(u32_at(archive, local + 14), crc);
            let local_name_len = u16_at(archive, local + 26);
            let local_extra_len = u16_at(archive, local + 28);
            let data_start = local + 30 + local_name_len + local_extra_len;
            let data = archive[data_start..data_start + size].to_vec();
            assert_eq!(crc32(&data), crc, "crc mismatch for {name}");

            entries.push(Entry { name, crc, data });
            at += 46 + name_len + extra_len + comment_len;
        }
        assert_eq!(at, eocd);
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::reader::read_all;
    use super::*;

    fn sample() -> Vec<(&'static str, Vec<u8>)> {
        vec![("a.txt", vec![0x61]), ("b.txt", vec![0x62, 0x62])]
    }

    #[test]
    fn test_archive_reads_with_zip_crate() {
        use std::io::{Cursor, Read};

        let bytes = package_archive(&sample()).unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 2);

        for (i, (name, data)) in sample().into_iter().enumerate() {
            let mut file = archive.by_index(i).unwrap();
            assert_eq!(file.name(), name);
            assert_eq!(file.compression(), zip::CompressionMethod::Stored);
            assert_eq!(file.size(), data.len() as u64);
            assert_eq!(file.crc32(), crate::crc32(&data));

            // Reading to the end also checks the stored CRC
            let mut contents = Vec::new();
            file.read_to_end(&mut contents).unwrap();
            assert_eq!(contents, data);
        }
    }

    #[test]
    fn test_packaging_is_deterministic() {
        let first = package_archive(&sample()).unwrap();
        let second = package_archive(&sample()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_exact_layout() {
        let archive = package_archive(&sample()).unwrap();

        let local_a = LOCAL_HEADER_LEN + 5 + 1;
        let local_b = LOCAL_HEADER_LEN + 5 + 2;
        let central = 2 * (CENTRAL_HEADER_LEN + 5);
        assert_eq!(archive.len(), local_a + local_b + central + END_OF_CENTRAL_DIR_LEN);

        #[rustfmt::skip]
        let expected_local_a: Vec<u8> = vec![
            0x50, 0x4B, 0x03, 0x04,
            20, 0, 0, 0, 0, 0, 0, 0, 0, 0,
            0x43, 0xBE, 0xB7, 0xE8,
            1, 0, 0, 0,
            1, 0, 0, 0,
            5, 0, 0, 0,
            b'a', b'.', b't', b'x', b't',
            0x61,
        ];
        assert_eq!(&archive[..local_a], expected_local_a.as_slice());

        let eocd = &archive[archive.len() - END_OF_CENTRAL_DIR_LEN..];
        #[rustfmt::skip]
        let expected_eocd: Vec<u8> = vec![
            0x50, 0x4B, 0x05, 0x06,
            0, 0, 0, 0,
            2, 0, 2, 0,
            central as u8, 0, 0, 0,
            (local_a + local_b) as u8, 0, 0, 0,
            0, 0,
        ];
        assert_eq!(eocd, expected_eocd.as_slice());
    }

    #[test]
    fn test_central_offsets_point_to_local_headers() {
        let archive = package_archive(&sample()).unwrap();
        let cd_start = LOCAL_HEADER_LEN * 2 + 5 * 2 + 3;

        let first_offset = u32::from_le_bytes(archive[cd_start + 42..cd_start + 46].try_into().unwrap());
        assert_eq!(first_offset, 0);

        let second = cd_start + CENTRAL_HEADER_LEN + 5;
        let second_offset = u32::from_le_bytes(archive[second + 42..second + 46].try_into().unwrap());
        assert_eq!(second_offset as usize, LOCAL_HEADER_LEN + 5 + 1);
    }

    #[test]
    fn test_round_trip() {
        let archive = package_archive(&sample()).unwrap();
        let entries = read_all(&archive);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "a.txt");
        assert_eq!(entries[0].data, vec![0x61]);
        assert_eq!(entries[0].crc, 0xE8B7_BE43);
        assert_eq!(entries[1].name, "b.txt");
        assert_eq!(entries[1].data, vec![0x62, 0x62]);
    }

    #[test]
    fn test_empty_archive() {
        let archive = package_archive::<&str, &[u8]>(&[]).unwrap();
        assert_eq!(
            archive,
            vec![0x50, 0x4B, 0x05, 0x06, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn test_empty_entry() {
        let archive = package_archive(&[("empty.bin", Vec::<u8>::new())]).unwrap();
        let entries = read_all(&archive);
        assert_eq!(entries[0].name, "empty.bin");
        assert!(entries[0].data.is_empty());
        assert_eq!(entries[0].crc, 0);
    }

    #[test]
    fn test_utf8_names_are_stored_as_bytes() {
        let archive = package_archive(&[("café.png", vec![1u8, 2, 3])]).unwrap();
        let entries = read_all(&archive);
        assert_eq!(entries[0].name, "café.png");
        // name length field counts bytes, not chars
        assert_eq!(u16::from_le_bytes([archive[26], archive[27]]), 9);
    }

    #[test]
    fn test_name_too_long_is_rejected() {
        let name = "x".repeat(70_000);
        let mut writer = ArchiveWriter::new();
        let err = writer.add_entry(&name, &[1]).unwrap_err();
        assert_eq!(err, ArchiveError::NameTooLong { len: 70_000 });
        assert!(writer.is_empty());
        assert_eq!(writer.offset(), 0);
    }

    #[test]
    fn test_writer_tracks_offset() {
        let mut writer = ArchiveWriter::new();
        writer.add_entry("a", &[1, 2, 3]).unwrap();
        assert_eq!(writer.offset(), LOCAL_HEADER_LEN + 1 + 3);
        assert_eq!(writer.len(), 1);
    }
}
