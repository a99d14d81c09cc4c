// src/watch/hash.rs

//! Content hashing used to skip files whose bytes did not actually change.
//!
//! Editors and formatters often touch a file (or rewrite identical bytes)
//! without changing it. With `skip_unchanged = true` the monitor hashes each
//! settled file and only forwards it when the hash differs from the one seen
//! the last time the file was forwarded. Hashes live in memory only.

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use blake3::Hasher;
use tracing::debug;

use crate::fs::FileSystem;

/// Compute the blake3 hash of a single file, hex encoded.
pub fn compute_file_hash(fs: &dyn FileSystem, path: &Path) -> Result<String> {
    let mut hasher = Hasher::new();
    let mut file = fs
        .open_read(path)
        .with_context(|| format!("opening file for hashing: {:?}", path))?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// Last forwarded hash per path.
#[derive(Debug, Default)]
pub struct MemoryHashStore {
    hashes: HashMap<PathBuf, String>,
}

impl MemoryHashStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash `path` and report whether its content differs from the last
    /// recorded hash. The new hash is stored when it differs.
    ///
    /// Files that cannot be hashed count as changed.
    pub fn content_changed(&mut self, fs: &dyn FileSystem, path: &Path) -> bool {
        let hash = match compute_file_hash(fs, path) {
            Ok(h) => h,
            Err(err) => {
                debug!(?path, error = %err, "could not hash file; treating as changed");
                return true;
            }
        };

        match self.hashes.get(path) {
            Some(previous) if *previous == hash => {
                debug!(?path, "content unchanged since last analysis");
                false
            }
            _ => {
                self.hashes.insert(path.to_path_buf(), hash);
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}
