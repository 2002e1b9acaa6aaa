use crate::ingest::SourceFile;
use anyhow::{Context, Result, bail};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const EXPORT_EXTENSION: &str = "json";

/// Expands the given paths into export files, in submission order.
///
/// Directories contribute every `.json` file beneath them, sorted by path.
/// Plain files are taken as given, whatever their extension.
pub fn resolve_paths(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let found = scan_export_dir(path)?;
            if found.is_empty() {
                bail!("no .json files found in {}", path.display());
            }
            files.extend(found);
        } else {
            files.push(path.clone());
        }
    }
    Ok(files)
}

/// Every `.json` file under `root`, sorted by path. Any entry the walk cannot
/// read fails the scan, so a directory is never loaded in part.
pub fn scan_export_dir(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry.with_context(|| format!("failed to scan {}", root.display()))?;
        if entry.file_type().is_file() && is_export(entry.path()) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Reads every file up front so that a read failure rejects the whole batch
/// before any of it is ingested.
pub fn read_sources(paths: &[PathBuf]) -> Result<Vec<SourceFile>> {
    resolve_paths(paths)?
        .into_iter()
        .map(|path| {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            Ok(SourceFile::new(path.display().to_string(), contents))
        })
        .collect()
}

fn is_export(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| ext.eq_ignore_ascii_case(EXPORT_EXTENSION))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn directories_contribute_sorted_json_files() {
        let dir = tempdir().expect("tempdir");
        let nested = dir.path().join("nested");
        fs::create_dir(&nested).expect("mkdir");
        fs::write(dir.path().join("b.json"), "[]").expect("write b");
        fs::write(dir.path().join("a.JSON"), "[]").expect("write a");
        fs::write(nested.join("c.json"), "[]").expect("write c");
        fs::write(dir.path().join("notes.txt"), "x").expect("write txt");

        let files = resolve_paths(&[dir.path().to_path_buf()]).expect("resolve");

        let names: Vec<String> = files
            .iter()
            .map(|path| {
                path.strip_prefix(dir.path())
                    .expect("inside dir")
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect();
        assert_eq!(names, vec!["a.JSON", "b.json", "nested/c.json"]);
    }

    #[test]
    fn explicit_files_keep_submission_order() {
        let dir = tempdir().expect("tempdir");
        let second = dir.path().join("z.json");
        let first = dir.path().join("history.txt");
        fs::write(&second, "[]").expect("write");
        fs::write(&first, "[]").expect("write");

        let files = resolve_paths(&[second.clone(), first.clone()]).expect("resolve");
        assert_eq!(files, vec![second, first]);
    }

    #[test]
    fn empty_directory_is_rejected() {
        let dir = tempdir().expect("tempdir");
        assert!(resolve_paths(&[dir.path().to_path_buf()]).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn broken_entry_in_directory_fails_the_scan() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("a.json"), "[]").expect("write");
        std::os::unix::fs::symlink(dir.path().join("gone.json"), dir.path().join("b.json"))
            .expect("symlink");

        assert!(scan_export_dir(dir.path()).is_err());
        let err = read_sources(&[dir.path().to_path_buf()]).expect_err("must fail");
        assert!(format!("{err:#}").contains("failed to scan"));
    }

    #[test]
    fn unreadable_file_fails_the_batch() {
        let dir = tempdir().expect("tempdir");
        let present = dir.path().join("present.json");
        fs::write(&present, "[]").expect("write");
        let missing = dir.path().join("missing.json");

        let err = read_sources(&[present, missing]).expect_err("must fail");
        assert!(format!("{err:#}").contains("missing.json"));
    }
}
