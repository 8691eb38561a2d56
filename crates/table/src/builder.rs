//! Builder for new tables

use crate::table::Table;
use chrono::Utc;
use xbase_core::{Result, TextEncoding};
use xbase_format::{FieldDescriptor, Header, Schema, Version};

/// Builder for an empty [`Table`]
///
/// # Example
///
/// ```ignore
/// let table = Table::builder()
///     .version(Version::VisualFoxPro)
///     .encoding(TextEncoding::Latin1)
///     .field(FieldDescriptor::integer("ID")?)
///     .field(FieldDescriptor::character("NAME", 40)?)
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct TableBuilder {
    version: Version,
    encoding: TextEncoding,
    fields: Vec<FieldDescriptor>,
}

impl TableBuilder {
    /// dBase III, UTF-8, no fields
    pub fn new() -> Self {
        Self {
            version: Version::DBase3,
            encoding: TextEncoding::default(),
            fields: Vec::new(),
        }
    }

    /// Set the version.
    ///
    /// Memo fields promote dBase III to its memo variant at build time.
    pub fn version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    /// Set the text encoding (also stored as the language driver)
    pub fn encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Append a field
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Append several fields
    pub fn fields(mut self, fields: impl IntoIterator<Item = FieldDescriptor>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Validate the field list and build the table
    pub fn build(self) -> Result<Table> {
        let schema = Schema::new(self.fields)?;
        let version = if schema.has_memo_fields() {
            self.version.with_memo()?
        } else {
            self.version
        };

        let mut header = Header::new(version).for_write(
            version,
            &schema,
            0,
            Some(Utc::now().date_naive()),
        )?;
        header.language_driver = self.encoding.language_driver();

        Ok(Table::from_parts(header, schema, self.encoding))
    }
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}
