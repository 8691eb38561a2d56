//! Read and write configuration

use xbase_core::TextEncoding;
use xbase_format::Version;

// ============================================================================
// Read Options
// ============================================================================

/// Table read options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOptions {
    /// Text encoding; `None` derives it from the header's language driver
    pub encoding: Option<TextEncoding>,
    /// Whether to resolve memo pointers against a sidecar
    pub load_memo: bool,
    /// Whether to drop soft-deleted records while reading
    pub skip_deleted: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        ReadOptions {
            encoding: None,
            load_memo: true,
            skip_deleted: false,
        }
    }
}

impl ReadOptions {
    /// Ignore any memo sidecar; memo fields decode to `Null`
    pub fn without_memo() -> Self {
        ReadOptions {
            load_memo: false,
            ..Default::default()
        }
    }

    /// Live records only
    pub fn live_only() -> Self {
        ReadOptions {
            skip_deleted: true,
            ..Default::default()
        }
    }

    /// Override the text encoding
    pub fn with_encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = Some(encoding);
        self
    }
}

// ============================================================================
// Write Options
// ============================================================================

/// Table write options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOptions {
    /// Version to write; `None` keeps the table's version
    pub version: Option<Version>,
    /// Text encoding; `None` keeps the table's encoding
    pub encoding: Option<TextEncoding>,
    /// Whether to stamp today's date as the last update
    pub touch_last_update: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        WriteOptions {
            version: None,
            encoding: None,
            touch_last_update: true,
        }
    }
}

impl WriteOptions {
    /// Write under a different version; records are unchanged
    pub fn to_version(version: Version) -> Self {
        WriteOptions {
            version: Some(version),
            ..Default::default()
        }
    }

    /// Keep the stored last-update date, for byte-stable output
    pub fn preserve_last_update() -> Self {
        WriteOptions {
            touch_last_update: false,
            ..Default::default()
        }
    }

    /// Override the text encoding
    pub fn with_encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = Some(encoding);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_presets() {
        assert!(ReadOptions::default().load_memo);
        assert!(!ReadOptions::without_memo().load_memo);
        assert!(ReadOptions::live_only().skip_deleted);
    }

    #[test]
    fn test_write_presets() {
        let options = WriteOptions::to_version(Version::VisualFoxPro);
        assert_eq!(options.version, Some(Version::VisualFoxPro));
        assert!(options.touch_last_update);
        assert!(!WriteOptions::preserve_last_update().touch_last_update);
    }
}
