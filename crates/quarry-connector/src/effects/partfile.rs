use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use fs2::FileExt;
use tracing::debug;
use uuid::Uuid;

/// Per-process table of in-flight partial files.
///
/// A download never writes its destination directly; it writes a sibling
/// `<dest>.part-<16 hex>` and renames on success. The registry hands out
/// those partial paths, resuming an abandoned one when its companion
/// `.lock` file can be locked, and guarantees that no two workers in this
/// process claim the same partial. The OS advisory lock covers workers in
/// other processes.
pub(crate) struct PartRegistry {
    resume_enabled: bool,
    active: Mutex<HashSet<PathBuf>>,
    next_owner: AtomicU64,
}

/// One claimed partial file, held from claim until commit or cleanup.
pub(crate) struct PartClaim {
    partial: PathBuf,
    lock_path: PathBuf,
    lock: Option<File>,
    /// Bytes already present from an earlier, interrupted download.
    len: u64,
    owner: u64,
}

impl PartClaim {
    pub fn partial(&self) -> &Path {
        &self.partial
    }

    pub fn len(&self) -> u64 {
        self.len
    }
}

impl PartRegistry {
    pub fn new(disable_resume: bool) -> Self {
        Self {
            resume_enabled: !disable_resume,
            active: Mutex::new(HashSet::new()),
            next_owner: AtomicU64::new(1),
        }
    }

    /// Claim a partial file for a download of `dest`.
    ///
    /// With resume enabled and allowed, scans the destination's directory
    /// for non-empty `<dest>.part-*` siblings and takes over the first one
    /// whose lock file can be acquired; otherwise mints a fresh name.
    pub fn claim(&self, dest: &Path, resume_allowed: bool) -> io::Result<PartClaim> {
        // the lock file lives next to the partial, so the directory chain
        // must exist before anything can be locked
        if let Some(parent) = dest.parent()
            && !parent.is_dir()
            && let Err(err) = fs::create_dir_all(parent)
            && !parent.is_dir()
        {
            return Err(err);
        }

        let owner = self.next_owner.fetch_add(1, Ordering::Relaxed);
        let mut active = self.active.lock().unwrap();

        if self.resume_enabled && resume_allowed {
            for candidate in resume_candidates(dest)? {
                if active.contains(&candidate) {
                    continue;
                }
                if let Some((lock_path, lock)) = try_lock(&candidate) {
                    let len = fs::metadata(&candidate).map(|m| m.len()).unwrap_or(0);
                    debug!(partial = %candidate.display(), len, owner, "resuming incomplete download");
                    active.insert(candidate.clone());
                    return Ok(PartClaim {
                        partial: candidate,
                        lock_path,
                        lock: Some(lock),
                        len,
                        owner,
                    });
                }
            }
        }

        let partial = mint_partial(dest);
        let (lock_path, lock) = match try_lock(&partial) {
            Some(pair) => pair,
            None => {
                return Err(io::Error::other(format!(
                    "unable to lock fresh partial {}",
                    partial.display()
                )));
            }
        };
        active.insert(partial.clone());
        Ok(PartClaim {
            partial,
            lock_path,
            lock: Some(lock),
            len: 0,
            owner,
        })
    }

    /// Release a claim: drop the OS lock, remove the `.lock` companion and
    /// forget the in-process entry. When `delete_partial` is set the
    /// partial itself is removed (failure cleanup); after a successful
    /// commit the partial has already been renamed away.
    pub fn release(&self, claim: PartClaim, delete_partial: bool) {
        let mut active = self.active.lock().unwrap();
        active.remove(&claim.partial);

        if delete_partial {
            let _ = fs::remove_file(&claim.partial);
        }
        if let Some(lock) = claim.lock {
            let _ = fs2::FileExt::unlock(&lock);
        }
        if let Err(err) = fs::remove_file(&claim.lock_path) {
            debug!(lock = %claim.lock_path.display(), owner = claim.owner, %err, "lock file cleanup failed");
        }
    }
}

/// Non-empty `<dest>.part-*` siblings, oldest-first not guaranteed.
fn resume_candidates(dest: &Path) -> io::Result<Vec<PathBuf>> {
    let Some(parent) = dest.parent() else {
        return Ok(Vec::new());
    };
    let Some(file_name) = dest.file_name().and_then(|n| n.to_str()) else {
        return Ok(Vec::new());
    };
    if !parent.is_dir() {
        return Ok(Vec::new());
    }

    let prefix = format!("{file_name}.part-");
    let mut candidates = Vec::new();
    for entry in fs::read_dir(parent)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if name.starts_with(&prefix)
            && entry.metadata().map(|m| m.is_file() && m.len() > 0).unwrap_or(false)
        {
            candidates.push(entry.path());
        }
    }
    Ok(candidates)
}

/// Take the advisory lock on `<partial>.lock`; `None` when another holder
/// (in any process) already has it.
fn try_lock(partial: &Path) -> Option<(PathBuf, File)> {
    let lock_path = lock_path_for(partial);
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)
        .ok()?;
    match file.try_lock_exclusive() {
        Ok(()) => Some((lock_path, file)),
        Err(_) => None,
    }
}

fn lock_path_for(partial: &Path) -> PathBuf {
    let mut name = partial.as_os_str().to_os_string();
    name.push(".lock");
    PathBuf::from(name)
}

/// Mint `<dest>.part-<16 hex>`, retrying until the name is unused.
fn mint_partial(dest: &Path) -> PathBuf {
    loop {
        let suffix = Uuid::new_v4().simple().to_string();
        let mut name = dest.as_os_str().to_os_string();
        name.push(format!(".part-{}", &suffix[..16]));
        let path = PathBuf::from(name);
        if !path.exists() {
            return path;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn fresh_claim_mints_partial_and_lock() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("lib.jar");
        let registry = PartRegistry::new(false);

        let claim = registry.claim(&dest, true).unwrap();
        assert_eq!(claim.len(), 0);
        let name = claim.partial().file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("lib.jar.part-"));
        assert_eq!(name.len(), "lib.jar.part-".len() + 16);

        let lock_path = lock_path_for(claim.partial());
        assert!(lock_path.exists());

        registry.release(claim, true);
        assert!(!lock_path.exists());
    }

    #[test]
    fn claims_into_missing_directory() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("a/b/lib.jar");

        let registry = PartRegistry::new(false);
        let claim = registry.claim(&dest, true).unwrap();
        assert!(claim.partial().parent().unwrap().is_dir());
        registry.release(claim, true);
    }

    #[test]
    fn resumes_nonempty_sibling() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("lib.jar");
        let partial = dir.path().join("lib.jar.part-0123456789abcdef");
        fs::write(&partial, b"HEL").unwrap();

        let registry = PartRegistry::new(false);
        let claim = registry.claim(&dest, true).unwrap();

        assert_eq!(claim.partial(), partial.as_path());
        assert_eq!(claim.len(), 3);
        registry.release(claim, true);
        assert!(!partial.exists());
    }

    #[test]
    fn ignores_empty_sibling() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("lib.jar");
        fs::write(dir.path().join("lib.jar.part-0123456789abcdef"), b"").unwrap();

        let registry = PartRegistry::new(false);
        let claim = registry.claim(&dest, true).unwrap();
        assert_eq!(claim.len(), 0);
        registry.release(claim, true);
    }

    #[test]
    fn second_claim_gets_a_fresh_partial() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("lib.jar");
        let partial = dir.path().join("lib.jar.part-0123456789abcdef");
        fs::write(&partial, b"HEL").unwrap();

        let registry = PartRegistry::new(false);
        let first = registry.claim(&dest, true).unwrap();
        let second = registry.claim(&dest, true).unwrap();

        assert_eq!(first.partial(), partial.as_path());
        assert_ne!(second.partial(), first.partial());
        assert_eq!(second.len(), 0);

        registry.release(second, true);
        registry.release(first, true);
    }

    #[test]
    fn resume_disabled_never_scans() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("lib.jar");
        fs::write(dir.path().join("lib.jar.part-0123456789abcdef"), b"HEL").unwrap();

        let registry = PartRegistry::new(true);
        let claim = registry.claim(&dest, true).unwrap();
        assert_eq!(claim.len(), 0);
        registry.release(claim, true);
    }

    #[test]
    fn resume_disallowed_for_descriptor_never_scans() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("maven-metadata.xml");
        fs::write(dir.path().join("maven-metadata.xml.part-0123456789abcdef"), b"X").unwrap();

        let registry = PartRegistry::new(false);
        let claim = registry.claim(&dest, false).unwrap();
        assert_eq!(claim.len(), 0);
        registry.release(claim, true);
    }
}
