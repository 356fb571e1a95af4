use std::fs;
use std::io;
use std::path::Path;

/// Filesystem seam used for directory creation and atomic publication.
///
/// The engine never writes the final destination path directly: the only
/// write to it is `move_file` from a fully verified sibling, so readers
/// either see nothing or the complete file.
pub trait FileProcessor: Send + Sync {
    /// Create `dir` and any missing parents, tolerating concurrent
    /// creators.
    fn mkdirs(&self, dir: &Path) -> io::Result<()>;

    /// Move `from` to `to`, atomically when both live on one filesystem.
    fn move_file(&self, from: &Path, to: &Path) -> io::Result<()>;
}

/// Default implementation backed by `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultFileProcessor;

impl FileProcessor for DefaultFileProcessor {
    fn mkdirs(&self, dir: &Path) -> io::Result<()> {
        if dir.is_dir() {
            return Ok(());
        }
        match fs::create_dir_all(dir) {
            Ok(()) => Ok(()),
            // a sibling worker may have created it between the check and
            // the create; re-check before giving up
            Err(err) => {
                if dir.is_dir() {
                    Ok(())
                } else {
                    Err(err)
                }
            }
        }
    }

    fn move_file(&self, from: &Path, to: &Path) -> io::Result<()> {
        match fs::rename(from, to) {
            Ok(()) => Ok(()),
            Err(_) => {
                // rename across filesystems fails; fall back to
                // copy + fsync + remove
                fs::copy(from, to)?;
                fs::File::open(to)?.sync_all()?;
                fs::remove_file(from)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn mkdirs_creates_missing_chain() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("a/b/c");

        DefaultFileProcessor.mkdirs(&target).unwrap();
        assert!(target.is_dir());

        // second call is a no-op
        DefaultFileProcessor.mkdirs(&target).unwrap();
    }

    #[test]
    fn mkdirs_tolerates_concurrent_creation() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("shared/deep/path");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let target = target.clone();
                std::thread::spawn(move || DefaultFileProcessor.mkdirs(&target))
            })
            .collect();

        for handle in handles {
            handle.join().unwrap().unwrap();
        }
        assert!(target.is_dir());
    }

    #[test]
    fn move_file_replaces_destination_content() {
        let dir = tempdir().unwrap();
        let from = dir.path().join("payload.part");
        let to = dir.path().join("payload.jar");
        fs::write(&from, b"DATA").unwrap();

        DefaultFileProcessor.move_file(&from, &to).unwrap();

        assert!(!from.exists());
        assert_eq!(fs::read(&to).unwrap(), b"DATA");
    }
}
