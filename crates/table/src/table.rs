//! In-memory table: header, schema and records
//!
//! ## Read
//!
//! ```text
//! header (32 bytes) -> version dispatch
//!   -> field descriptors until 0x0D
//!   -> (backlink) -> seek to header length
//!   -> records until 0x1A, end of input, or a short trailing record
//! ```
//!
//! The way reading stopped is reported in [`ReadSummary`] rather than
//! treated as an error; a trailing partial record is dropped.
//!
//! ## Write
//!
//! The complete file image (and the memo sidecar image) is built in memory
//! before anything reaches the target, so a failing encode leaves the
//! target empty. The header is recomputed from the schema and the current
//! records on every write.

use crate::options::{ReadOptions, WriteOptions};
use crate::sidecar::find_memo_sidecar;
use chrono::Utc;
use std::fs::{self, File};
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use xbase_core::{Error, Result, TextEncoding};
use xbase_format::descriptor::{read_descriptors, DESCRIPTOR_SIZE};
use xbase_format::header::{BACKLINK_SIZE, HEADER_SIZE};
use xbase_format::{
    DecodeContext, EncodeContext, FieldDescriptor, Header, MemoFormat, MemoStore, MemoWriter,
    Record, Schema, Version,
};

/// Marker written after the last record
pub const EOF_MARKER: u8 = 0x1A;

// The header's record count is untrusted input.
const MAX_PREALLOCATED_RECORDS: usize = 1 << 16;

// ============================================================================
// Read Summary
// ============================================================================

/// Why record reading stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStop {
    /// Found the 0x1A end-of-file marker
    Terminator,
    /// Input ended on a record boundary without a marker
    EndOfInput,
    /// Input ended inside a record; the partial record was dropped
    TruncatedRecord {
        /// Bytes per record
        expected: usize,
        /// Bytes present
        available: usize,
    },
}

/// Outcome of a table read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadSummary {
    /// Records decoded, including skipped deleted ones
    pub records: usize,
    /// Deleted records encountered
    pub deleted: usize,
    /// How reading stopped
    pub stop: ReadStop,
}

impl ReadSummary {
    /// Check if reading ended on the end-of-file marker or a record boundary
    pub fn is_clean(&self) -> bool {
        !matches!(self.stop, ReadStop::TruncatedRecord { .. })
    }
}

// ============================================================================
// Table Image
// ============================================================================

/// Serialized table and its memo sidecar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableImage {
    /// `.dbf` bytes
    pub table: Vec<u8>,
    /// Sidecar bytes, present when the schema has memo fields
    pub memo: Option<Vec<u8>>,
    /// Sidecar layout of `memo`
    pub memo_format: Option<MemoFormat>,
}

// ============================================================================
// Table
// ============================================================================

/// A dBase/FoxPro table held in memory
#[derive(Debug, Clone)]
pub struct Table {
    header: Header,
    schema: Arc<Schema>,
    records: Vec<Record>,
    encoding: TextEncoding,
}

impl Table {
    pub(crate) fn from_parts(header: Header, schema: Schema, encoding: TextEncoding) -> Self {
        Self {
            header,
            schema: Arc::new(schema),
            records: Vec::new(),
            encoding,
        }
    }

    /// Start building an empty table
    pub fn builder() -> crate::TableBuilder {
        crate::TableBuilder::new()
    }

    /// Open a table file, loading its memo sidecar when one exists
    pub fn open(path: impl AsRef<Path>, options: &ReadOptions) -> Result<Self> {
        Self::open_with_summary(path, options).map(|(table, _)| table)
    }

    /// Open a table file and report how reading stopped
    pub fn open_with_summary(
        path: impl AsRef<Path>,
        options: &ReadOptions,
    ) -> Result<(Self, ReadSummary)> {
        let path = path.as_ref();
        info!("Opening table {}", path.display());

        let memo = if options.load_memo {
            find_memo_sidecar(path).map(fs::read).transpose()?
        } else {
            None
        };

        let mut reader = BufReader::new(File::open(path)?);
        let (table, summary) = Self::read_with_summary(&mut reader, memo.as_deref(), options)?;

        info!(
            "Opened table {}: {} fields, {} records ({} deleted)",
            path.display(),
            table.schema.len(),
            table.records.len(),
            summary.deleted
        );
        Ok((table, summary))
    }

    /// Read a table from a stream, with an optional memo sidecar image
    pub fn read<R: Read + Seek>(
        reader: &mut R,
        memo: Option<&[u8]>,
        options: &ReadOptions,
    ) -> Result<Self> {
        Self::read_with_summary(reader, memo, options).map(|(table, _)| table)
    }

    /// Read a table and report how reading stopped
    pub fn read_with_summary<R: Read + Seek>(
        reader: &mut R,
        memo: Option<&[u8]>,
        options: &ReadOptions,
    ) -> Result<(Self, ReadSummary)> {
        let mut header = Header::read_from(reader)?;
        debug!(
            "Header: {}, {} records of {} bytes, header length {}",
            header.version, header.record_count, header.record_length, header.header_length
        );
        if header.encrypted {
            return Err(Error::UnsupportedFeature {
                version: header.version.name().to_string(),
                feature: "encrypted tables",
            });
        }

        let version = header.version;
        let fields = read_descriptors(reader, header.max_fields(), version.is_visual_foxpro())?;
        debug!("Read {} field descriptors", fields.len());
        let schema = Arc::new(Schema::new(fields)?);
        header.validate_against(&schema)?;

        let fields_end = HEADER_SIZE + DESCRIPTOR_SIZE * schema.len() + 1;
        if version.has_backlink() && header.header_length as usize >= fields_end + BACKLINK_SIZE {
            let mut backlink = vec![0u8; BACKLINK_SIZE];
            reader.read_exact(&mut backlink)?;
            header.backlink = Some(backlink);
        }

        debug!("Seeking to first record at {}", header.header_length);
        reader.seek(SeekFrom::Start(header.header_length as u64))?;

        let encoding = options
            .encoding
            .unwrap_or_else(|| TextEncoding::from_language_driver(header.language_driver));

        let store = match (memo, version.memo_format()) {
            (Some(bytes), Some(format)) if options.load_memo => {
                debug!("Loading {} byte {:?} memo sidecar", bytes.len(), format);
                Some(MemoStore::new(bytes, format)?)
            }
            _ => None,
        };
        let mut ctx = DecodeContext::new(encoding);
        if let Some(store) = &store {
            ctx = ctx.with_memo(store);
        }

        let record_length = header.record_length as usize;
        if record_length > schema.record_length() {
            debug!(
                "Records padded to {} bytes; fields use {}",
                record_length,
                schema.record_length()
            );
        }
        let mut buf = vec![0u8; record_length];
        let mut records =
            Vec::with_capacity((header.record_count as usize).min(MAX_PREALLOCATED_RECORDS));
        let mut decoded = 0usize;
        let mut deleted = 0usize;

        let stop = loop {
            let available = read_up_to(reader, &mut buf)?;
            if available == 0 {
                break ReadStop::EndOfInput;
            }
            if buf[0] == EOF_MARKER {
                break ReadStop::Terminator;
            }
            if available < record_length {
                warn!(
                    "Dropping truncated trailing record: {} of {} bytes",
                    available, record_length
                );
                break ReadStop::TruncatedRecord {
                    expected: record_length,
                    available,
                };
            }

            let record = Record::decode(&buf, &schema, &ctx)?;
            decoded += 1;
            if record.is_deleted() {
                deleted += 1;
                if options.skip_deleted {
                    continue;
                }
            }
            records.push(record);
        };

        if decoded != header.record_count as usize {
            warn!(
                "Header claims {} records but {} were read",
                header.record_count, decoded
            );
        }

        let summary = ReadSummary {
            records: decoded,
            deleted,
            stop,
        };
        let table = Self {
            header,
            schema,
            records,
            encoding,
        };
        Ok((table, summary))
    }

    /// Serialize the table and its memo sidecar
    pub fn to_image(&self, options: &WriteOptions) -> Result<TableImage> {
        self.build_image(options, true)
    }

    /// Write the table to `target`.
    ///
    /// Fails with [`Error::MemoTargetRequired`] if any record holds a memo
    /// payload, since it would have nowhere to go.
    pub fn write<W: Write>(&self, target: &mut W, options: &WriteOptions) -> Result<()> {
        let image = self.build_image(options, false)?;
        target.write_all(&image.table)?;
        target.flush()?;
        Ok(())
    }

    /// Write the table to `target` and its memo sidecar to `memo`
    pub fn write_with_memo<W: Write, M: Write>(
        &self,
        target: &mut W,
        memo: &mut M,
        options: &WriteOptions,
    ) -> Result<()> {
        let image = self.build_image(options, true)?;
        target.write_all(&image.table)?;
        target.flush()?;
        if let Some(bytes) = &image.memo {
            memo.write_all(bytes)?;
            memo.flush()?;
        }
        Ok(())
    }

    /// Write the table file, and its sidecar next to it when the schema
    /// has memo fields. Returns the sidecar path, if one was written.
    pub fn save(&self, path: impl AsRef<Path>, options: &WriteOptions) -> Result<Option<PathBuf>> {
        let path = path.as_ref();
        let image = self.build_image(options, true)?;

        fs::write(path, &image.table)?;
        let sidecar = match (&image.memo, image.memo_format) {
            (Some(bytes), Some(format)) => {
                let sidecar = path.with_extension(format.extension());
                fs::write(&sidecar, bytes)?;
                Some(sidecar)
            }
            _ => None,
        };

        info!(
            "Saved table {}: {} records, {} bytes",
            path.display(),
            self.records.len(),
            image.table.len()
        );
        Ok(sidecar)
    }

    fn build_image(&self, options: &WriteOptions, collect_memo: bool) -> Result<TableImage> {
        let mut version = options.version.unwrap_or(self.header.version);
        if self.schema.has_memo_fields() {
            let promoted = version.with_memo()?;
            if promoted != version {
                debug!("Promoting {} to {} for memo fields", version, promoted);
            }
            version = promoted;
        }
        let encoding = options.encoding.unwrap_or(self.encoding);
        let last_update = options.touch_last_update.then(|| Utc::now().date_naive());

        let mut header =
            self.header
                .for_write(version, &self.schema, self.records.len(), last_update)?;
        if options.encoding.is_some() {
            header.language_driver = encoding.language_driver();
        }

        let memo_format = if self.schema.has_memo_fields() {
            version.memo_format()
        } else {
            None
        };
        let mut writer = memo_format.filter(|_| collect_memo).map(MemoWriter::new);

        let mut table = Vec::with_capacity(
            header.header_length as usize + self.records.len() * self.schema.record_length() + 1,
        );
        header.write_table_header(&self.schema, &mut table);
        debug_assert_eq!(table.len(), header.header_length as usize);

        for record in &self.records {
            let mut ctx = EncodeContext::new(encoding);
            if let Some(writer) = writer.as_mut() {
                ctx = ctx.with_memo(writer);
            }
            table.extend_from_slice(&record.encode(&mut ctx)?);
        }
        table.push(EOF_MARKER);

        Ok(TableImage {
            table,
            memo: writer.map(MemoWriter::into_bytes),
            memo_format,
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Header as last read or built; lengths are refreshed on write
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Table version
    pub fn version(&self) -> Version {
        self.header.version
    }

    /// Text encoding for character and memo fields
    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    /// Shared schema
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Field descriptors in schema order
    pub fn fields(&self) -> &[FieldDescriptor] {
        self.schema.fields()
    }

    /// Records in file order
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Mutable records; the set of records is changed with `push`/`remove`
    pub fn records_mut(&mut self) -> &mut [Record] {
        &mut self.records
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the table has no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Empty record bound to this table's schema
    pub fn new_record(&self) -> Record {
        Record::new(Arc::clone(&self.schema))
    }

    /// Append a record; it must share this table's schema
    pub fn push(&mut self, record: Record) -> Result<()> {
        if !Arc::ptr_eq(record.schema(), &self.schema) && **record.schema() != *self.schema {
            return Err(Error::SchemaConsistency(
                "record schema differs from table schema".to_string(),
            ));
        }
        self.records.push(record);
        Ok(())
    }

    /// Remove and return the record at `position`
    pub fn remove(&mut self, position: usize) -> Option<Record> {
        (position < self.records.len()).then(|| self.records.remove(position))
    }
}

/// Fill `buf` from `reader`, stopping early only at end of input
fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}
