//! Atomic file replacement: write to a sibling temp file, then rename over
//! the canonical path. Used for the context log, the hint panel, and the
//! tip result file, all of which have concurrent external readers.

use std::io::Write;
use std::path::Path;

/// Replace `path` with `contents` atomically.
///
/// A reader always sees either the previous complete file or the new
/// complete file, never a partial write. The parent directory is created
/// if missing.
pub fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let tmp = tmp_path(path);
    {
        let mut file = std::fs::File::create(&tmp)?;
        file.write_all(contents.as_bytes())?;
        file.flush()?;
    }
    std::fs::rename(&tmp, path)
}

fn tmp_path(path: &Path) -> std::path::PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| ".atomic".into());
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_and_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        write_atomic(&path, "first").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first");
        write_atomic(&path, "second").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
        // temp file cleaned up by the rename
        assert!(!dir.path().join("out.txt.tmp").exists());
    }

    #[test]
    fn creates_missing_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/out.txt");
        write_atomic(&path, "x").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "x");
    }

    #[test]
    fn concurrent_reader_never_sees_partial_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let old = "A".repeat(4096);
        let new = "B".repeat(4096);
        write_atomic(&path, &old).unwrap();

        let reader_path = path.clone();
        let (old_r, new_r) = (old.clone(), new.clone());
        let reader = std::thread::spawn(move || {
            for _ in 0..500 {
                let seen = std::fs::read_to_string(&reader_path).unwrap();
                assert!(
                    seen == old_r || seen == new_r,
                    "observed a torn write ({} bytes)",
                    seen.len()
                );
            }
        });

        for i in 0..200 {
            let contents = if i % 2 == 0 { &new } else { &old };
            write_atomic(&path, contents).unwrap();
        }
        reader.join().unwrap();
    }
}
