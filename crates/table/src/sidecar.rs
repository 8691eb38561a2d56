//! Memo sidecar discovery

use std::path::{Path, PathBuf};
use tracing::debug;

/// Extensions tried, in order, when looking for a memo sidecar
pub const SIDECAR_EXTENSIONS: [&str; 4] = ["fpt", "FPT", "dbt", "DBT"];

/// Find the memo sidecar of a table file.
///
/// Replaces the table's extension with each of [`SIDECAR_EXTENSIONS`] and
/// returns the first file that exists. A missing sidecar is not an error.
pub fn find_memo_sidecar(path: impl AsRef<Path>) -> Option<PathBuf> {
    let path = path.as_ref();
    let found = SIDECAR_EXTENSIONS
        .iter()
        .map(|ext| path.with_extension(ext))
        .find(|candidate| candidate.is_file());

    match &found {
        Some(sidecar) => debug!("Found memo sidecar {}", sidecar.display()),
        None => debug!("No memo sidecar next to {}", path.display()),
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_absent_sidecar() {
        let dir = TempDir::new().unwrap();
        assert_eq!(find_memo_sidecar(dir.path().join("people.dbf")), None);
    }

    #[test]
    fn test_fpt_preferred_over_dbt() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("people.dbt"), b"").unwrap();
        fs::write(dir.path().join("people.fpt"), b"").unwrap();
        assert_eq!(
            find_memo_sidecar(dir.path().join("people.dbf")),
            Some(dir.path().join("people.fpt"))
        );
    }

    #[test]
    fn test_upper_case_extension() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("PEOPLE.DBT"), b"").unwrap();
        assert_eq!(
            find_memo_sidecar(dir.path().join("PEOPLE.DBF")),
            Some(dir.path().join("PEOPLE.DBT"))
        );
    }
}
