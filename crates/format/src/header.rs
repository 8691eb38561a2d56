//! Table header format
//!
//! The first 32 bytes of every table (little-endian):
//!
//! ```text
//! 0       version byte (selects the Version variant)
//! 1..4    last update: YY (years since 1900), MM, DD
//! 4..8    record count (u32)
//! 8..10   header length (u16): offset of the first record
//! 10..12  record length (u16): deletion flag + sum of field lengths
//! 14      incomplete transaction flag (dBase IV)
//! 15      encryption flag (dBase IV)
//! 28      MDX flag (dBase IV) or table flags (FoxPro)
//! 29      language driver
//! ```
//!
//! Everything else is reserved and written as zero. Visual FoxPro tables
//! carry a 263-byte backlink after the field terminator, which is why the
//! header length and the end of the descriptor table need not coincide.

use crate::descriptor::{DESCRIPTOR_SIZE, FIELD_TERMINATOR};
use crate::memo::MemoFormat;
use crate::schema::Schema;
use byteorder::{ByteOrder, LittleEndian};
use chrono::{Datelike, NaiveDate};
use std::io::Read;
use xbase_core::{Error, Result};

/// Size of the fixed header
pub const HEADER_SIZE: usize = 32;

/// Size of the Visual FoxPro database container backlink
pub const BACKLINK_SIZE: usize = 263;

/// FoxPro table flag: structural `.cdx` present
pub const TABLE_FLAG_CDX: u8 = 0x01;
/// FoxPro table flag: memo sidecar present
pub const TABLE_FLAG_MEMO: u8 = 0x02;
/// FoxPro table flag: table belongs to a database container
pub const TABLE_FLAG_DATABASE: u8 = 0x04;

// ============================================================================
// Version
// ============================================================================

/// Known table versions, one per version byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Version {
    /// 0x02 FoxBASE
    FoxBase,
    /// 0x03 dBase III / FoxPro without memo
    DBase3,
    /// 0x30 Visual FoxPro
    VisualFoxPro,
    /// 0x31 Visual FoxPro with autoincrement fields
    VisualFoxProAutoIncrement,
    /// 0x83 dBase III with `.dbt` memo
    DBase3Memo,
    /// 0x8B dBase IV with `.dbt` memo
    DBase4Memo,
    /// 0xF5 FoxPro 2.x with `.fpt` memo
    FoxPro2Memo,
}

/// Which optional header bytes a version gives meaning to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderFamily {
    /// Bytes 12..32 reserved
    DBase3,
    /// Transaction/encryption/MDX flags and language driver
    DBase4,
    /// Table flags and language driver
    FoxPro,
    /// Table flags, language driver and the 263-byte backlink
    VisualFoxPro,
}

impl Version {
    /// Every known version
    pub const ALL: [Version; 7] = [
        Version::FoxBase,
        Version::DBase3,
        Version::VisualFoxPro,
        Version::VisualFoxProAutoIncrement,
        Version::DBase3Memo,
        Version::DBase4Memo,
        Version::FoxPro2Memo,
    ];

    /// Select the variant for a version byte
    pub fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            0x02 => Ok(Version::FoxBase),
            0x03 => Ok(Version::DBase3),
            0x30 => Ok(Version::VisualFoxPro),
            0x31 => Ok(Version::VisualFoxProAutoIncrement),
            0x83 => Ok(Version::DBase3Memo),
            0x8B => Ok(Version::DBase4Memo),
            0xF5 => Ok(Version::FoxPro2Memo),
            other => Err(Error::format(
                "header",
                format!("unknown version byte 0x{:02X}", other),
            )),
        }
    }

    /// Version byte
    pub fn byte(&self) -> u8 {
        match self {
            Version::FoxBase => 0x02,
            Version::DBase3 => 0x03,
            Version::VisualFoxPro => 0x30,
            Version::VisualFoxProAutoIncrement => 0x31,
            Version::DBase3Memo => 0x83,
            Version::DBase4Memo => 0x8B,
            Version::FoxPro2Memo => 0xF5,
        }
    }

    /// Human readable name
    pub fn name(&self) -> &'static str {
        match self {
            Version::FoxBase => "FoxBASE",
            Version::DBase3 => "dBase III",
            Version::VisualFoxPro => "Visual FoxPro",
            Version::VisualFoxProAutoIncrement => "Visual FoxPro (autoincrement)",
            Version::DBase3Memo => "dBase III with memo",
            Version::DBase4Memo => "dBase IV with memo",
            Version::FoxPro2Memo => "FoxPro 2 with memo",
        }
    }

    /// Header byte interpretation
    pub fn family(&self) -> HeaderFamily {
        match self {
            Version::FoxBase | Version::DBase3 | Version::DBase3Memo => HeaderFamily::DBase3,
            Version::DBase4Memo => HeaderFamily::DBase4,
            Version::FoxPro2Memo => HeaderFamily::FoxPro,
            Version::VisualFoxPro | Version::VisualFoxProAutoIncrement => {
                HeaderFamily::VisualFoxPro
            }
        }
    }

    /// Sidecar layout used when this version has memo fields
    pub fn memo_format(&self) -> Option<MemoFormat> {
        match self {
            Version::FoxBase | Version::DBase3 => None,
            Version::DBase3Memo => Some(MemoFormat::DBase3),
            Version::DBase4Memo => Some(MemoFormat::DBase4),
            Version::FoxPro2Memo | Version::VisualFoxPro | Version::VisualFoxProAutoIncrement => {
                Some(MemoFormat::FoxPro)
            }
        }
    }

    /// Version to write when the schema has memo fields.
    ///
    /// dBase III is promoted to its memo variant; versions that already
    /// support memos are unchanged; FoxBASE has no memo variant.
    pub fn with_memo(&self) -> Result<Self> {
        match self {
            Version::DBase3 => Ok(Version::DBase3Memo),
            Version::FoxBase => Err(Error::UnsupportedFeature {
                version: self.name().to_string(),
                feature: "memo fields",
            }),
            other => Ok(*other),
        }
    }

    /// Check if a 263-byte backlink follows the field terminator
    pub fn has_backlink(&self) -> bool {
        self.family() == HeaderFamily::VisualFoxPro
    }

    /// Check if descriptors carry Visual FoxPro displacement and flags
    pub fn is_visual_foxpro(&self) -> bool {
        self.family() == HeaderFamily::VisualFoxPro
    }

    /// Header length for `field_count` descriptors
    pub fn header_length(&self, field_count: usize) -> usize {
        let backlink = if self.has_backlink() { BACKLINK_SIZE } else { 0 };
        HEADER_SIZE + DESCRIPTOR_SIZE * field_count + 1 + backlink
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (0x{:02X})", self.name(), self.byte())
    }
}

// ============================================================================
// Header
// ============================================================================

/// Decoded table header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Version variant
    pub version: Version,
    /// Last update date; `None` when the stored bytes are not a valid date
    pub last_update: Option<NaiveDate>,
    /// Records stored in the file
    pub record_count: u32,
    /// Offset of the first record
    pub header_length: u16,
    /// Bytes per record including the deletion flag
    pub record_length: u16,
    /// dBase IV incomplete transaction flag
    pub incomplete_transaction: bool,
    /// dBase IV encryption flag
    pub encrypted: bool,
    /// Byte 28: MDX flag (dBase IV) or table flags (FoxPro)
    pub table_flags: u8,
    /// Code page marker
    pub language_driver: u8,
    /// Visual FoxPro database container path, NUL padded
    pub backlink: Option<Vec<u8>>,
}

impl Header {
    /// Empty header for a version
    pub fn new(version: Version) -> Self {
        Self {
            version,
            last_update: None,
            record_count: 0,
            header_length: version.header_length(0) as u16,
            record_length: 1,
            incomplete_transaction: false,
            encrypted: false,
            table_flags: 0,
            language_driver: 0,
            backlink: None,
        }
    }

    /// Read and decode the fixed 32-byte header
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut buf = [0u8; HEADER_SIZE];
        reader
            .read_exact(&mut buf)
            .map_err(|_| Error::format("header", "shorter than 32 bytes"))?;
        Self::from_bytes(&buf)
    }

    /// Decode the fixed 32-byte header
    pub fn from_bytes(buf: &[u8; HEADER_SIZE]) -> Result<Self> {
        let version = Version::from_byte(buf[0])?;
        let family = version.family();

        let header_length = LittleEndian::read_u16(&buf[8..10]);
        let record_length = LittleEndian::read_u16(&buf[10..12]);
        if (header_length as usize) < HEADER_SIZE + 1 {
            return Err(Error::format(
                "header",
                format!("header length {} too small", header_length),
            ));
        }
        if record_length == 0 {
            return Err(Error::format("header", "record length is zero"));
        }

        let (incomplete_transaction, encrypted) = match family {
            HeaderFamily::DBase4 => (buf[14] != 0, buf[15] != 0),
            _ => (false, false),
        };
        let (table_flags, language_driver) = match family {
            HeaderFamily::DBase3 => (0, buf[29]),
            _ => (buf[28], buf[29]),
        };

        Ok(Self {
            version,
            last_update: decode_last_update(&buf[1..4]),
            record_count: LittleEndian::read_u32(&buf[4..8]),
            header_length,
            record_length,
            incomplete_transaction,
            encrypted,
            table_flags,
            language_driver,
            backlink: None,
        })
    }

    /// Encode the fixed 32-byte header
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0] = self.version.byte();
        buf[1..4].copy_from_slice(&encode_last_update(self.last_update));
        LittleEndian::write_u32(&mut buf[4..8], self.record_count);
        LittleEndian::write_u16(&mut buf[8..10], self.header_length);
        LittleEndian::write_u16(&mut buf[10..12], self.record_length);

        match self.version.family() {
            HeaderFamily::DBase3 => {
                buf[29] = self.language_driver;
            }
            HeaderFamily::DBase4 => {
                buf[14] = self.incomplete_transaction as u8;
                buf[15] = self.encrypted as u8;
                buf[28] = self.table_flags;
                buf[29] = self.language_driver;
            }
            HeaderFamily::FoxPro | HeaderFamily::VisualFoxPro => {
                buf[28] = self.table_flags;
                buf[29] = self.language_driver;
            }
        }
        buf
    }

    /// Rebuild the header for serialization.
    ///
    /// Counts and lengths are always recomputed from `schema` and
    /// `record_count`; nothing cached in `self` is trusted. Switching to a
    /// different version keeps only the date and language driver.
    pub fn for_write(
        &self,
        version: Version,
        schema: &Schema,
        record_count: usize,
        last_update: Option<NaiveDate>,
    ) -> Result<Self> {
        let record_count = u32::try_from(record_count).map_err(|_| {
            Error::SchemaConsistency(format!("{} records exceed u32", record_count))
        })?;
        let header_length = u16::try_from(version.header_length(schema.len())).map_err(|_| {
            Error::SchemaConsistency(format!("{} fields exceed the header size", schema.len()))
        })?;
        let record_length = u16::try_from(schema.record_length()).map_err(|_| {
            Error::SchemaConsistency(format!("record length {} exceeds u16", schema.record_length()))
        })?;

        let mut header = if version == self.version {
            self.clone()
        } else {
            let mut swapped = Header::new(version);
            swapped.language_driver = self.language_driver;
            swapped
        };

        header.last_update = last_update.or(self.last_update);
        header.record_count = record_count;
        header.header_length = header_length;
        header.record_length = record_length;

        match version.family() {
            HeaderFamily::FoxPro | HeaderFamily::VisualFoxPro => {
                // Rewritten records invalidate any structural .cdx
                header.table_flags &= !TABLE_FLAG_CDX;
                if schema.has_memo_fields() {
                    header.table_flags |= TABLE_FLAG_MEMO;
                } else {
                    header.table_flags &= !TABLE_FLAG_MEMO;
                }
            }
            HeaderFamily::DBase4 => {
                // No index support: never claim a production MDX.
                header.table_flags = 0;
            }
            HeaderFamily::DBase3 => {}
        }

        if version.has_backlink() {
            if header.backlink.is_none() {
                header.backlink = Some(vec![0u8; BACKLINK_SIZE]);
            }
        } else {
            header.backlink = None;
        }

        Ok(header)
    }

    /// Check the header's lengths against a schema read from the same file.
    ///
    /// A record length longer than the fields need is padding and is
    /// accepted; readers step by the header's record length.
    pub fn validate_against(&self, schema: &Schema) -> Result<()> {
        if (self.record_length as usize) < schema.record_length() {
            return Err(Error::format(
                "header",
                format!(
                    "record length {} shorter than field lengths (expected {})",
                    self.record_length,
                    schema.record_length()
                ),
            ));
        }
        let minimum = HEADER_SIZE + DESCRIPTOR_SIZE * schema.len() + 1;
        if (self.header_length as usize) < minimum {
            return Err(Error::format(
                "header",
                format!(
                    "header length {} shorter than {} descriptors",
                    self.header_length,
                    schema.len()
                ),
            ));
        }
        Ok(())
    }

    /// Upper bound on descriptors that fit before `header_length`
    pub fn max_fields(&self) -> usize {
        (self.header_length as usize).saturating_sub(HEADER_SIZE + 1) / DESCRIPTOR_SIZE
    }

    /// Serialize header, descriptors, terminator and backlink
    pub fn write_table_header(&self, schema: &Schema, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_bytes());
        let visual_foxpro = self.version.is_visual_foxpro();
        for (position, field) in schema.fields().iter().enumerate() {
            let displacement = if visual_foxpro {
                schema.offset(position).map(|o| o as u32)
            } else {
                None
            };
            out.extend_from_slice(&field.to_bytes(displacement));
        }
        out.push(FIELD_TERMINATOR);
        if let Some(backlink) = &self.backlink {
            let mut padded = backlink.clone();
            padded.resize(BACKLINK_SIZE, 0);
            out.extend_from_slice(&padded);
        }
    }
}

fn decode_last_update(bytes: &[u8]) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1900 + bytes[0] as i32, bytes[1] as u32, bytes[2] as u32)
}

fn encode_last_update(date: Option<NaiveDate>) -> [u8; 3] {
    match date {
        Some(d) => {
            let year = (d.year() - 1900).clamp(0, u8::MAX as i32) as u8;
            [year, d.month() as u8, d.day() as u8]
        }
        None => [0, 0, 0],
    }
}
