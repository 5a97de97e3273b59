//! Dated JSON artifact on disk.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::error::FetchResult;
use crate::record::SnapshotRecord;

/// `<dir>/<prefix>_<YYYY-MM-DD>.json`, made absolute against the current
/// working directory when `dir` is relative.
pub fn output_path(dir: &Path, prefix: &str, date: NaiveDate) -> PathBuf {
    let file = format!("{prefix}_{}.json", date.format("%Y-%m-%d"));
    let path = dir.join(file);
    if path.is_absolute() {
        return path;
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path,
    }
}

/// Write a record, creating the parent directory first. Overwrites any
/// file already at `path`.
pub fn write_record(path: &Path, record: &SnapshotRecord) -> FetchResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let json = record.to_json_pretty()?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Read a record back.
pub fn read_record(path: &Path) -> FetchResult<SnapshotRecord> {
    let bytes = std::fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Outcome;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn path_encodes_prefix_and_date() {
        let dir = tempfile::tempdir().unwrap();
        let p = output_path(dir.path(), "browser_trends", date(2026, 3, 7));
        assert_eq!(p, dir.path().join("browser_trends_2026-03-07.json"));
    }

    #[test]
    fn same_date_same_path() {
        let dir = tempfile::tempdir().unwrap();
        let a = output_path(dir.path(), "t", date(2026, 1, 1));
        let b = output_path(dir.path(), "t", date(2026, 1, 1));
        let c = output_path(dir.path(), "t", date(2026, 1, 2));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn relative_dir_becomes_absolute() {
        let p = output_path(Path::new("outputs"), "t", date(2026, 1, 1));
        assert!(p.is_absolute());
        assert!(p.ends_with("outputs/t_2026-01-01.json"));
    }

    #[test]
    fn write_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/t_2026-01-01.json");
        let rec = SnapshotRecord::from(Outcome::Success(vec!["Topic A".into()]));
        write_record(&path, &rec).unwrap();
        assert_eq!(read_record(&path).unwrap(), rec);
    }

    #[test]
    fn second_write_replaces_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t_2026-01-01.json");

        let long = SnapshotRecord::from(Outcome::Success(
            (0..20).map(|i| format!("long topic {i}")).collect(),
        ));
        write_record(&path, &long).unwrap();

        let short = SnapshotRecord::from(Outcome::Success(vec!["only".into()]));
        write_record(&path, &short).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(!text.contains("long topic"));
        assert_eq!(read_record(&path).unwrap(), short);
    }

    #[test]
    fn write_into_a_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();
        let rec = SnapshotRecord::from(Outcome::Success(vec![]));
        assert!(write_record(&blocker.join("t.json"), &rec).is_err());
    }
}
