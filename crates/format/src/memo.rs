//! Memo sidecar formats
//!
//! Memo, general and picture fields store a block number; the payload lives
//! in a sidecar file made of fixed-size blocks. Three layouts exist:
//!
//! | Format | Header | Block layout |
//! |--------|--------|--------------|
//! | dBase III `.dbt` | next free block (u32 LE), 512-byte blocks | text ended by `0x1A 0x1A` |
//! | dBase IV `.dbt` | next free block (u32 LE), block size at 20 (u16 LE) | `FF FF 08 00`, length (u32 LE, includes 8-byte prefix), data |
//! | FoxPro `.fpt` | next free block (u32 BE), block size at 6 (u16 BE) | type (u32 BE), length (u32 BE), data |
//!
//! Block 0 always holds the header, so pointer 0 means "no memo".

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use xbase_core::{Error, Result};

/// dBase III end-of-memo marker
pub const DBASE3_MEMO_TERMINATOR: [u8; 2] = [0x1A, 0x1A];

/// dBase IV block signature
pub const DBASE4_BLOCK_SIGNATURE: [u8; 4] = [0xFF, 0xFF, 0x08, 0x00];

/// Header size of every memo layout
pub const MEMO_HEADER_SIZE: usize = 512;

/// Block size used by dBase sidecars
pub const DBASE_BLOCK_SIZE: usize = 512;

/// Block size written for new FoxPro sidecars
pub const FOXPRO_BLOCK_SIZE: usize = 64;

const FOXPRO_TYPE_PICTURE: u32 = 0;
const FOXPRO_TYPE_TEXT: u32 = 1;

/// Sidecar layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoFormat {
    /// dBase III `.dbt`
    DBase3,
    /// dBase IV `.dbt`
    DBase4,
    /// FoxPro / Visual FoxPro `.fpt`
    FoxPro,
}

impl MemoFormat {
    /// Canonical lower-case sidecar extension
    pub fn extension(&self) -> &'static str {
        match self {
            MemoFormat::DBase3 | MemoFormat::DBase4 => "dbt",
            MemoFormat::FoxPro => "fpt",
        }
    }
}

/// Payload classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoKind {
    /// Text memo
    Text,
    /// Binary (general, picture, object)
    Binary,
}

/// One resolved memo block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoPayload<'a> {
    /// Payload classification (dBase blocks are always text)
    pub kind: MemoKind,
    /// Payload bytes without block framing
    pub data: &'a [u8],
}

// ============================================================================
// Reading
// ============================================================================

/// Read-only view over a memo sidecar's bytes.
///
/// The store borrows the buffer: the caller owns the sidecar bytes and keeps
/// them alive for as long as records are decoded against it.
#[derive(Debug, Clone, Copy)]
pub struct MemoStore<'a> {
    format: MemoFormat,
    block_size: usize,
    data: &'a [u8],
}

impl<'a> MemoStore<'a> {
    /// Parse the sidecar header
    pub fn new(data: &'a [u8], format: MemoFormat) -> Result<Self> {
        let block_size = match format {
            MemoFormat::DBase3 => {
                if data.len() < 4 {
                    return Err(Error::memo("dBase III header shorter than 4 bytes"));
                }
                DBASE_BLOCK_SIZE
            }
            MemoFormat::DBase4 => {
                if data.len() < 22 {
                    return Err(Error::memo("dBase IV header shorter than 22 bytes"));
                }
                match LittleEndian::read_u16(&data[20..22]) {
                    0 => DBASE_BLOCK_SIZE,
                    n => n as usize,
                }
            }
            MemoFormat::FoxPro => {
                if data.len() < 8 {
                    return Err(Error::memo("FoxPro header shorter than 8 bytes"));
                }
                match BigEndian::read_u16(&data[6..8]) {
                    0 => return Err(Error::memo("FoxPro block size is zero")),
                    n => n as usize,
                }
            }
        };

        Ok(Self {
            format,
            block_size,
            data,
        })
    }

    /// Sidecar layout
    pub fn format(&self) -> MemoFormat {
        self.format
    }

    /// Block size in bytes
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Next free block recorded in the header
    pub fn next_free_block(&self) -> u32 {
        match self.format {
            MemoFormat::FoxPro => BigEndian::read_u32(&self.data[0..4]),
            MemoFormat::DBase3 | MemoFormat::DBase4 => LittleEndian::read_u32(&self.data[0..4]),
        }
    }

    /// Resolve a block pointer.
    ///
    /// Returns `Ok(None)` for pointer 0 and for pointers past the end of the
    /// sidecar; malformed block framing is an error.
    pub fn block(&self, pointer: u32) -> Result<Option<MemoPayload<'a>>> {
        if pointer == 0 {
            return Ok(None);
        }
        let offset = match (pointer as usize).checked_mul(self.block_size) {
            Some(offset) if offset < self.data.len() => offset,
            _ => return Ok(None),
        };
        let block = &self.data[offset..];

        match self.format {
            MemoFormat::DBase3 => Ok(Some(MemoPayload {
                kind: MemoKind::Text,
                data: until_terminator(block),
            })),
            MemoFormat::DBase4 => {
                if block.len() >= 8 && block[..4] == DBASE4_BLOCK_SIGNATURE {
                    let length = LittleEndian::read_u32(&block[4..8]) as usize;
                    let end = length
                        .checked_sub(8)
                        .map(|n| 8 + n)
                        .filter(|&end| end <= block.len())
                        .ok_or_else(|| {
                            Error::memo(format!("block {} length {} out of bounds", pointer, length))
                        })?;
                    Ok(Some(MemoPayload {
                        kind: MemoKind::Text,
                        data: &block[8..end],
                    }))
                } else {
                    // Some dBase IV writers fall back to the dBase III framing.
                    Ok(Some(MemoPayload {
                        kind: MemoKind::Text,
                        data: until_terminator(block),
                    }))
                }
            }
            MemoFormat::FoxPro => {
                if block.len() < 8 {
                    return Err(Error::memo(format!("block {} header truncated", pointer)));
                }
                let kind = match BigEndian::read_u32(&block[0..4]) {
                    FOXPRO_TYPE_TEXT => MemoKind::Text,
                    _ => MemoKind::Binary,
                };
                let length = BigEndian::read_u32(&block[4..8]) as usize;
                if 8 + length > block.len() {
                    return Err(Error::memo(format!(
                        "block {} length {} out of bounds",
                        pointer, length
                    )));
                }
                Ok(Some(MemoPayload {
                    kind,
                    data: &block[8..8 + length],
                }))
            }
        }
    }
}

fn until_terminator(block: &[u8]) -> &[u8] {
    let end = block
        .windows(2)
        .position(|w| w == DBASE3_MEMO_TERMINATOR)
        .or_else(|| block.iter().position(|&b| b == 0x1A))
        .unwrap_or(block.len());
    &block[..end]
}

// ============================================================================
// Writing
// ============================================================================

/// Builds a memo sidecar in memory, one block chain per payload
#[derive(Debug, Clone)]
pub struct MemoWriter {
    format: MemoFormat,
    block_size: usize,
    buf: Vec<u8>,
    blocks_written: usize,
}

impl MemoWriter {
    /// Start a sidecar with an empty header
    pub fn new(format: MemoFormat) -> Self {
        let block_size = match format {
            MemoFormat::DBase3 | MemoFormat::DBase4 => DBASE_BLOCK_SIZE,
            MemoFormat::FoxPro => FOXPRO_BLOCK_SIZE,
        };
        let mut buf = vec![0u8; MEMO_HEADER_SIZE];
        match format {
            MemoFormat::DBase3 => buf[16] = 0x03,
            MemoFormat::DBase4 => LittleEndian::write_u16(&mut buf[20..22], block_size as u16),
            MemoFormat::FoxPro => BigEndian::write_u16(&mut buf[6..8], block_size as u16),
        }
        let mut writer = Self {
            format,
            block_size,
            buf,
            blocks_written: 0,
        };
        writer.write_next_free();
        writer
    }

    /// Sidecar layout
    pub fn format(&self) -> MemoFormat {
        self.format
    }

    /// Check if no payload has been appended
    pub fn is_empty(&self) -> bool {
        self.blocks_written == 0
    }

    /// Append a payload and return its block pointer
    pub fn append(&mut self, kind: MemoKind, data: &[u8]) -> Result<u32> {
        let pointer = u32::try_from(self.buf.len() / self.block_size)
            .map_err(|_| Error::memo("sidecar exceeds addressable blocks"))?;
        let length = u32::try_from(data.len())
            .map_err(|_| Error::memo(format!("payload of {} bytes too large", data.len())))?;

        match self.format {
            MemoFormat::DBase3 => {
                // Readers stop at the first 0x1A, so no payload byte may be one
                if data.contains(&0x1A) {
                    return Err(Error::memo("dBase III memo payload contains a 0x1A byte"));
                }
                self.buf.extend_from_slice(data);
                self.buf.extend_from_slice(&DBASE3_MEMO_TERMINATOR);
            }
            MemoFormat::DBase4 => {
                let total = length
                    .checked_add(8)
                    .ok_or_else(|| Error::memo("payload too large"))?;
                self.buf.extend_from_slice(&DBASE4_BLOCK_SIGNATURE);
                let mut len = [0u8; 4];
                LittleEndian::write_u32(&mut len, total);
                self.buf.extend_from_slice(&len);
                self.buf.extend_from_slice(data);
            }
            MemoFormat::FoxPro => {
                let mut prefix = [0u8; 8];
                let block_type = match kind {
                    MemoKind::Text => FOXPRO_TYPE_TEXT,
                    MemoKind::Binary => FOXPRO_TYPE_PICTURE,
                };
                BigEndian::write_u32(&mut prefix[0..4], block_type);
                BigEndian::write_u32(&mut prefix[4..8], length);
                self.buf.extend_from_slice(&prefix);
                self.buf.extend_from_slice(data);
            }
        }

        let padded = self.buf.len().div_ceil(self.block_size) * self.block_size;
        self.buf.resize(padded, 0);
        self.blocks_written += 1;
        self.write_next_free();
        Ok(pointer)
    }

    /// Finished sidecar bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    fn write_next_free(&mut self) {
        let next = (self.buf.len() / self.block_size) as u32;
        match self.format {
            MemoFormat::FoxPro => BigEndian::write_u32(&mut self.buf[0..4], next),
            MemoFormat::DBase3 | MemoFormat::DBase4 => {
                LittleEndian::write_u32(&mut self.buf[0..4], next)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(format: MemoFormat) {
        let mut writer = MemoWriter::new(format);
        assert!(writer.is_empty());
        let first = writer.append(MemoKind::Text, b"first memo").unwrap();
        let second = writer.append(MemoKind::Text, &vec![b'x'; 700]).unwrap();
        assert!(!writer.is_empty());
        assert!(second > first);
        let bytes = writer.into_bytes();

        let store = MemoStore::new(&bytes, format).unwrap();
        assert_eq!(store.next_free_block() as usize, bytes.len() / store.block_size());
        assert_eq!(store.block(first).unwrap().unwrap().data, b"first memo");
        assert_eq!(store.block(second).unwrap().unwrap().data.len(), 700);
    }

    #[test]
    fn test_dbase3_roundtrip() {
        roundtrip(MemoFormat::DBase3);
    }

    #[test]
    fn test_dbase4_roundtrip() {
        roundtrip(MemoFormat::DBase4);
    }

    #[test]
    fn test_foxpro_roundtrip() {
        roundtrip(MemoFormat::FoxPro);
    }

    #[test]
    fn test_first_block_follows_header() {
        let mut writer = MemoWriter::new(MemoFormat::DBase3);
        assert_eq!(writer.append(MemoKind::Text, b"a").unwrap(), 1);

        let mut writer = MemoWriter::new(MemoFormat::FoxPro);
        assert_eq!(writer.append(MemoKind::Text, b"a").unwrap(), 8);
    }

    #[test]
    fn test_foxpro_binary_kind() {
        let mut writer = MemoWriter::new(MemoFormat::FoxPro);
        let ptr = writer.append(MemoKind::Binary, &[0, 1, 2]).unwrap();
        let bytes = writer.into_bytes();
        let store = MemoStore::new(&bytes, MemoFormat::FoxPro).unwrap();
        let payload = store.block(ptr).unwrap().unwrap();
        assert_eq!(payload.kind, MemoKind::Binary);
        assert_eq!(payload.data, &[0, 1, 2]);
    }

    #[test]
    fn test_pointer_zero_and_out_of_range() {
        let bytes = MemoWriter::new(MemoFormat::DBase3).into_bytes();
        let store = MemoStore::new(&bytes, MemoFormat::DBase3).unwrap();
        assert!(store.block(0).unwrap().is_none());
        assert!(store.block(99).unwrap().is_none());
    }

    #[test]
    fn test_foxpro_length_out_of_bounds() {
        let mut writer = MemoWriter::new(MemoFormat::FoxPro);
        let ptr = writer.append(MemoKind::Text, b"abc").unwrap();
        let mut bytes = writer.into_bytes();
        let offset = ptr as usize * FOXPRO_BLOCK_SIZE;
        BigEndian::write_u32(&mut bytes[offset + 4..offset + 8], 10_000);
        let store = MemoStore::new(&bytes, MemoFormat::FoxPro).unwrap();
        assert!(matches!(store.block(ptr), Err(Error::Memo(_))));
    }

    #[test]
    fn test_dbase3_rejects_embedded_terminator() {
        let mut writer = MemoWriter::new(MemoFormat::DBase3);
        assert!(writer.append(MemoKind::Text, &[b'a', 0x1A, 0x1A]).is_err());
        assert!(writer.append(MemoKind::Text, b"abc\x1A").is_err());
        assert!(writer.append(MemoKind::Text, b"a\x1Ab").is_err());

        let pointer = writer.append(MemoKind::Text, b"abc").unwrap();
        let bytes = writer.into_bytes();
        let store = MemoStore::new(&bytes, MemoFormat::DBase3).unwrap();
        assert_eq!(store.block(pointer).unwrap().unwrap().data, b"abc");
    }

    #[test]
    fn test_short_header_rejected() {
        assert!(MemoStore::new(&[0u8; 3], MemoFormat::DBase3).is_err());
        assert!(MemoStore::new(&[0u8; 8], MemoFormat::FoxPro).is_err());
    }
}
