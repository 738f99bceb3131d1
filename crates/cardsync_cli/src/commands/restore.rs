//! Restore command implementation.

use cardsync_engine::RESOURCE;
use std::io::Write;
use std::path::Path;

/// Runs the restore command.
pub fn run(
    backup: &Path,
    target: &Path,
    out: &mut impl Write,
) -> Result<(), Box<dyn std::error::Error>> {
    if !backup.exists() {
        return Err(format!("No backup found at {}", backup.display()).into());
    }

    let count = cardsync_server::restore(backup, target, RESOURCE)?;
    writeln!(out, "Database restored! ({count} cards)")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn restores_backup() {
        let dir = tempdir().unwrap();
        let backup = dir.path().join("db-backup.json");
        let target = dir.path().join("db.json");
        fs::write(&backup, r#"{ "flash-cards": [] }"#).unwrap();

        let mut out = Vec::new();
        run(&backup, &target, &mut out).unwrap();

        assert!(target.exists());
        assert_eq!(String::from_utf8(out).unwrap(), "Database restored! (0 cards)\n");
    }

    #[test]
    fn missing_backup_fails() {
        let dir = tempdir().unwrap();
        let mut out = Vec::new();
        let result = run(&dir.path().join("none.json"), &dir.path().join("db.json"), &mut out);
        assert!(result.is_err());
    }
}
