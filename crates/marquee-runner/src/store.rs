//! File-backed identity store.

use std::fs;
use std::io;
use std::path::PathBuf;

use marquee_client::IdentityStore;
use tracing::{debug, warn};

/// Persists each key as a small file under a state directory.
///
/// Storage failures are logged and absorbed: a failed read looks like an
/// absent key and a failed write reports zero bytes persisted, so the
/// client falls back to behaving like a fresh device.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: PathBuf) -> Self {
        FileStore { dir }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl IdentityStore for FileStore {
    fn get(&self, key: &str, max_len: usize) -> Option<Vec<u8>> {
        let path = self.path_for(key);
        match fs::read(&path) {
            Ok(mut value) => {
                if value.len() > max_len {
                    warn!(
                        "{} holds {} bytes; truncating to {}",
                        path.display(),
                        value.len(),
                        max_len
                    );
                    value.truncate(max_len);
                }
                Some(value)
            }
            Err(ref error) if error.kind() == io::ErrorKind::NotFound => None,
            Err(error) => {
                warn!("failed to read {}: {}", path.display(), error);
                None
            }
        }
    }

    fn put(&mut self, key: &str, value: &[u8]) -> usize {
        if let Err(error) = fs::create_dir_all(&self.dir) {
            warn!("failed to create {}: {}", self.dir.display(), error);
            return 0;
        }
        let path = self.path_for(key);
        match fs::write(&path, value) {
            Ok(()) => {
                debug!("stored {} bytes at {}", value.len(), path.display());
                value.len()
            }
            Err(error) => {
                warn!("failed to write {}: {}", path.display(), error);
                0
            }
        }
    }

    fn remove(&mut self, key: &str) {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => debug!("removed {}", path.display()),
            Err(ref error) if error.kind() == io::ErrorKind::NotFound => {}
            Err(error) => warn!("failed to remove {}: {}", path.display(), error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marquee_client::IDENTITY_KEY;

    #[test]
    fn test_round_trip_on_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = FileStore::new(dir.path().to_path_buf());

        assert!(!store.has(IDENTITY_KEY));
        assert_eq!(store.put(IDENTITY_KEY, b"dev-42"), 6);
        assert_eq!(store.get(IDENTITY_KEY, 36), Some(b"dev-42".to_vec()));
        assert_eq!(store.get(IDENTITY_KEY, 3), Some(b"dev".to_vec()));

        store.remove(IDENTITY_KEY);
        assert!(!store.has(IDENTITY_KEY));
        // Removing an absent key is quiet.
        store.remove(IDENTITY_KEY);
    }

    #[test]
    fn test_put_creates_the_state_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("state").join("marquee");
        let mut store = FileStore::new(nested.clone());

        assert_eq!(store.put(IDENTITY_KEY, b"abc"), 3);
        assert!(nested.join(IDENTITY_KEY).is_file());
    }
}
