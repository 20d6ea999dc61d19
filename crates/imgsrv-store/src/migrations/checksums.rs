//! Migration checksums
//!
//! A migration's checksum is recorded when it is applied and compared on
//! every later open, so an edited migration file is refused instead of
//! silently diverging from databases that already ran the old text.

use sha2::{Digest, Sha256};

/// Hex SHA-256 of migration SQL
///
/// Line endings are normalised first, so a checkout with CRLF endings
/// produces the same checksum as one with LF.
pub fn compute_checksum(sql: &str) -> String {
    let normalised = sql.replace("\r\n", "\n");
    hex::encode(Sha256::digest(normalised.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_endings_do_not_change_checksum() {
        let lf = "CREATE TABLE t (k TEXT);\nCREATE INDEX i ON t (k);\n";
        let crlf = "CREATE TABLE t (k TEXT);\r\nCREATE INDEX i ON t (k);\r\n";
        assert_eq!(compute_checksum(lf), compute_checksum(crlf));
    }

    #[test]
    fn test_edited_sql_changes_checksum() {
        let original = compute_checksum("CREATE TABLE t (k TEXT);");
        let edited = compute_checksum("CREATE TABLE t (k TEXT NOT NULL);");
        assert_ne!(original, edited);
        assert_eq!(original.len(), 64);
        assert!(original.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
