//! Field descriptor format
//!
//! Each column is described by a fixed 32-byte entry:
//!
//! ```text
//! 0..11   name, NUL padded (at most 10 significant bytes)
//! 11      type tag
//! 12..16  displacement of the field in the record (Visual FoxPro, u32 LE)
//! 16      length
//! 17      decimal count
//! 18      field flags (Visual FoxPro)
//! 19..23  autoincrement next value (Visual FoxPro, u32 LE)
//! 23      autoincrement step (Visual FoxPro)
//! 24..32  reserved
//! ```
//!
//! The descriptor table ends with a single 0x0D byte.

use byteorder::{ByteOrder, LittleEndian};
use std::io::Read;
use xbase_core::{Error, FieldType, Result, TextEncoding};

/// Size of one descriptor entry
pub const DESCRIPTOR_SIZE: usize = 32;

/// Byte ending the descriptor table
pub const FIELD_TERMINATOR: u8 = 0x0D;

/// Maximum significant bytes in a field name
pub const MAX_NAME_LEN: usize = 10;

/// Visual FoxPro field flag: hidden system column
pub const FLAG_SYSTEM: u8 = 0x01;
/// Visual FoxPro field flag: column accepts NULL
pub const FLAG_NULLABLE: u8 = 0x02;
/// Visual FoxPro field flag: binary (no code page translation)
pub const FLAG_BINARY: u8 = 0x04;
/// Visual FoxPro field flag: autoincrementing column
pub const FLAG_AUTOINCREMENT: u8 = 0x0C;

/// Schema entry for one column
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FieldDescriptor {
    name: String,
    field_type: FieldType,
    length: usize,
    decimal_count: usize,
    flags: u8,
    autoincrement_next: u32,
    autoincrement_step: u8,
}

impl FieldDescriptor {
    /// Create a descriptor, validating name, length and decimal count
    pub fn new(
        name: impl Into<String>,
        field_type: FieldType,
        length: usize,
        decimal_count: usize,
    ) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;

        if !field_type.is_valid_length(length) {
            return Err(Error::InvalidFieldLength {
                field: name,
                field_type: field_type.name(),
                length,
            });
        }

        let decimals_allowed = matches!(field_type, FieldType::Numeric | FieldType::Float);
        if decimal_count > 0 && (!decimals_allowed || decimal_count + 2 > length) {
            return Err(Error::InvalidFieldLength {
                field: name,
                field_type: field_type.name(),
                length,
            });
        }

        Ok(Self {
            name,
            field_type,
            length,
            decimal_count,
            flags: 0,
            autoincrement_next: 0,
            autoincrement_step: 0,
        })
    }

    /// Create a descriptor using the type's fixed length
    pub fn of_type(name: impl Into<String>, field_type: FieldType) -> Result<Self> {
        let name = name.into();
        match field_type.default_length() {
            Some(length) => Self::new(name, field_type, length, 0),
            None => Err(Error::InvalidFieldLength {
                field: name,
                field_type: field_type.name(),
                length: 0,
            }),
        }
    }

    /// `C` field of `length` bytes
    pub fn character(name: impl Into<String>, length: usize) -> Result<Self> {
        Self::new(name, FieldType::Character, length, 0)
    }

    /// `N` field with `decimal_count` digits after the point
    pub fn numeric(name: impl Into<String>, length: usize, decimal_count: usize) -> Result<Self> {
        Self::new(name, FieldType::Numeric, length, decimal_count)
    }

    /// `I` field (4-byte binary integer)
    pub fn integer(name: impl Into<String>) -> Result<Self> {
        Self::of_type(name, FieldType::Integer)
    }

    /// `D` field
    pub fn date(name: impl Into<String>) -> Result<Self> {
        Self::of_type(name, FieldType::Date)
    }

    /// `L` field
    pub fn logical(name: impl Into<String>) -> Result<Self> {
        Self::of_type(name, FieldType::Logical)
    }

    /// `M` field with a 10-byte ASCII block pointer
    pub fn memo(name: impl Into<String>) -> Result<Self> {
        Self::of_type(name, FieldType::Memo)
    }

    /// Set Visual FoxPro field flags
    pub fn with_flags(mut self, flags: u8) -> Self {
        self.flags = flags;
        self
    }

    /// Set Visual FoxPro autoincrement state
    pub fn with_autoincrement(mut self, next: u32, step: u8) -> Self {
        self.flags |= FLAG_AUTOINCREMENT;
        self.autoincrement_next = next;
        self.autoincrement_step = step;
        self
    }

    /// Field name as stored
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Column type
    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    /// Stored width in bytes
    pub fn length(&self) -> usize {
        self.length
    }

    /// Digits after the decimal point (numeric types)
    pub fn decimal_count(&self) -> usize {
        self.decimal_count
    }

    /// Visual FoxPro field flags
    pub fn flags(&self) -> u8 {
        self.flags
    }

    /// Visual FoxPro autoincrement next value
    pub fn autoincrement_next(&self) -> u32 {
        self.autoincrement_next
    }

    /// Visual FoxPro autoincrement step
    pub fn autoincrement_step(&self) -> u8 {
        self.autoincrement_step
    }

    /// Case-insensitive name comparison
    pub fn name_matches(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }

    /// Parse one 32-byte descriptor entry.
    ///
    /// Bytes 18..24 are only interpreted for Visual FoxPro tables; other
    /// producers use them for multi-user bookkeeping.
    pub fn from_bytes(bytes: &[u8; DESCRIPTOR_SIZE], visual_foxpro: bool) -> Result<Self> {
        let name_end = bytes[..11].iter().position(|&b| b == 0).unwrap_or(11);
        let name = TextEncoding::Latin1
            .decode(&bytes[..name_end])
            .unwrap_or_default()
            .trim_end()
            .to_string();

        let field_type = FieldType::from_tag(bytes[11])?;
        let mut descriptor = Self::new(name, field_type, bytes[16] as usize, bytes[17] as usize)
            .map_err(|e| match e {
                Error::UnknownFieldType(_) => e,
                other => Error::format("field descriptor", other.to_string()),
            })?;
        if visual_foxpro {
            descriptor.flags = bytes[18];
            descriptor.autoincrement_next = LittleEndian::read_u32(&bytes[19..23]);
            descriptor.autoincrement_step = bytes[23];
        }
        Ok(descriptor)
    }

    /// Serialize to one 32-byte descriptor entry.
    ///
    /// `displacement` is the field's byte offset in the record and is only
    /// given for Visual FoxPro tables; without it bytes 12..16 and the
    /// FoxPro extras (18..24) are written as zero.
    pub fn to_bytes(&self, displacement: Option<u32>) -> [u8; DESCRIPTOR_SIZE] {
        let mut out = [0u8; DESCRIPTOR_SIZE];
        // Names were validated as Latin-1 when the descriptor was built.
        let name = TextEncoding::Latin1
            .encode(&self.name)
            .unwrap_or_else(|| self.name.as_bytes().to_vec());
        let n = name.len().min(MAX_NAME_LEN);
        out[..n].copy_from_slice(&name[..n]);
        out[11] = self.field_type.tag();
        out[16] = self.length as u8;
        out[17] = self.decimal_count as u8;
        if let Some(displacement) = displacement {
            LittleEndian::write_u32(&mut out[12..16], displacement);
            out[18] = self.flags;
            LittleEndian::write_u32(&mut out[19..23], self.autoincrement_next);
            out[23] = self.autoincrement_step;
        }
        out
    }
}

fn validate_name(name: &str) -> Result<()> {
    let encoded = match TextEncoding::Latin1.encode(name) {
        Some(bytes) => bytes,
        None => return Err(Error::InvalidFieldName(name.to_string())),
    };
    if encoded.is_empty() || encoded.len() > MAX_NAME_LEN || encoded.contains(&0) {
        return Err(Error::InvalidFieldName(name.to_string()));
    }
    Ok(())
}

/// Read descriptors until the 0x0D terminator, which is consumed.
///
/// `max_fields` bounds the loop by what the header length allows, so a
/// missing terminator surfaces as a format error instead of reading records
/// as descriptors.
pub fn read_descriptors<R: Read>(
    reader: &mut R,
    max_fields: usize,
    visual_foxpro: bool,
) -> Result<Vec<FieldDescriptor>> {
    let mut fields = Vec::new();

    loop {
        let mut entry = [0u8; DESCRIPTOR_SIZE];
        reader
            .read_exact(&mut entry[..1])
            .map_err(|_| Error::format("field descriptors", "missing 0x0D terminator"))?;

        if entry[0] == FIELD_TERMINATOR {
            return Ok(fields);
        }

        if fields.len() == max_fields {
            return Err(Error::format(
                "field descriptors",
                format!("more than {} descriptors before terminator", max_fields),
            ));
        }

        reader.read_exact(&mut entry[1..]).map_err(|_| {
            Error::format(
                "field descriptors",
                format!("descriptor {} truncated", fields.len()),
            )
        })?;
        fields.push(FieldDescriptor::from_bytes(&entry, visual_foxpro)?);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_layout() {
        let field = FieldDescriptor::numeric("PRICE", 10, 2).unwrap();
        let bytes = field.to_bytes(None);

        assert_eq!(&bytes[..5], b"PRICE");
        assert!(bytes[5..11].iter().all(|&b| b == 0));
        assert_eq!(bytes[11], b'N');
        assert_eq!(bytes[16], 10);
        assert_eq!(bytes[17], 2);

        let back = FieldDescriptor::from_bytes(&bytes, false).unwrap();
        assert_eq!(back, field);
    }

    #[test]
    fn test_visual_foxpro_extras_survive() {
        let field = FieldDescriptor::integer("ID")
            .unwrap()
            .with_autoincrement(42, 1);
        let bytes = field.to_bytes(Some(1));
        assert_eq!(LittleEndian::read_u32(&bytes[12..16]), 1);

        let back = FieldDescriptor::from_bytes(&bytes, true).unwrap();
        assert_eq!(back.flags(), FLAG_AUTOINCREMENT);
        assert_eq!(back.autoincrement_next(), 42);
        assert_eq!(back.autoincrement_step(), 1);
    }

    #[test]
    fn test_name_rules() {
        assert!(FieldDescriptor::character("ABCDEFGHIJ", 1).is_ok());
        assert!(matches!(
            FieldDescriptor::character("ABCDEFGHIJK", 1),
            Err(Error::InvalidFieldName(_))
        ));
        assert!(matches!(
            FieldDescriptor::character("", 1),
            Err(Error::InvalidFieldName(_))
        ));
        assert!(matches!(
            FieldDescriptor::character("名前", 1),
            Err(Error::InvalidFieldName(_))
        ));
    }

    #[test]
    fn test_length_rules() {
        assert!(matches!(
            FieldDescriptor::new("D", FieldType::Date, 6, 0),
            Err(Error::InvalidFieldLength { .. })
        ));
        assert!(matches!(
            FieldDescriptor::numeric("N", 3, 2),
            Err(Error::InvalidFieldLength { .. })
        ));
        assert!(matches!(
            FieldDescriptor::new("C", FieldType::Character, 10, 2),
            Err(Error::InvalidFieldLength { .. })
        ));
        assert!(FieldDescriptor::numeric("N", 4, 2).is_ok());
    }

    #[test]
    fn test_foxpro_extras_ignored_for_dbase() {
        let field = FieldDescriptor::integer("ID")
            .unwrap()
            .with_autoincrement(42, 1);
        let bytes = field.to_bytes(Some(0));
        let back = FieldDescriptor::from_bytes(&bytes, false).unwrap();
        assert_eq!(back.flags(), 0);
        assert_eq!(back.autoincrement_next(), 0);
    }

    #[test]
    fn test_unknown_tag_is_fatal() {
        let mut bytes = FieldDescriptor::character("NAME", 5).unwrap().to_bytes(None);
        bytes[11] = b'Q';
        assert!(matches!(
            FieldDescriptor::from_bytes(&bytes, false),
            Err(Error::UnknownFieldType(b'Q'))
        ));
    }

    #[test]
    fn test_case_insensitive_match() {
        let field = FieldDescriptor::character("FULLNAME", 50).unwrap();
        assert!(field.name_matches("fullname"));
        assert!(field.name_matches("FullName"));
        assert!(!field.name_matches("NAME"));
    }

    #[test]
    fn test_read_descriptors_consumes_terminator() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&FieldDescriptor::character("A", 3).unwrap().to_bytes(None));
        buf.extend_from_slice(&FieldDescriptor::logical("B").unwrap().to_bytes(None));
        buf.push(FIELD_TERMINATOR);
        buf.push(0xAA);

        let mut cursor = std::io::Cursor::new(buf);
        let fields = read_descriptors(&mut cursor, 8, false).unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[1].field_type(), FieldType::Logical);
        assert_eq!(cursor.position(), 65);
    }

    #[test]
    fn test_read_descriptors_without_terminator() {
        let buf = FieldDescriptor::character("A", 3).unwrap().to_bytes(None).to_vec();
        let err = read_descriptors(&mut std::io::Cursor::new(buf), 8, false).unwrap_err();
        assert!(err.is_format());
    }
}
