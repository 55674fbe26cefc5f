//! Bounded most-recently-used list of paths for one destination.

use std::time::SystemTime;

use crate::error::{Error, Result};
use crate::path::{Fingerprint, Path};

/// Paths ordered by recency of use, most recent first.
///
/// No two entries share a fingerprint. Not synchronized; the owner must
/// serialize access.
#[derive(Debug, Clone, Default)]
pub struct PathsMru(Vec<Path>);

impl PathsMru {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from paths in recency order. Later duplicates are dropped.
    pub fn from_paths(paths: Vec<Path>) -> Self {
        let mut unique: Vec<Path> = Vec::with_capacity(paths.len());
        for path in paths {
            if !unique.iter().any(|p| p.fingerprint == path.fingerprint) {
                unique.push(path);
            }
        }
        Self(unique)
    }

    /// Move `path` to the front, replacing any entry with the same fingerprint.
    ///
    /// The incoming value replaces the stored one so its fresher metadata is
    /// kept. Entries beyond `max_size` are dropped from the tail and returned.
    pub fn insert(&mut self, path: Path, max_size: usize) -> Result<Vec<Path>> {
        if max_size == 0 {
            return Err(Error::InvalidArgument("MRU max size must be positive".into()));
        }

        if let Some(i) = self.position(&path.fingerprint) {
            self.0.remove(i);
        }
        self.0.insert(0, path);

        if self.0.len() > max_size {
            Ok(self.0.split_off(max_size))
        } else {
            Ok(Vec::new())
        }
    }

    /// Replace stored entries with fresher values without reordering.
    pub fn refresh<'a>(&mut self, fresh: impl IntoIterator<Item = &'a Path>) {
        for path in fresh {
            if let Some(i) = self.position(&path.fingerprint) {
                self.0[i] = path.clone();
            }
        }
    }

    /// Remove the entry with `fingerprint`, if present.
    pub fn remove(&mut self, fingerprint: &Fingerprint) -> Option<Path> {
        self.position(fingerprint).map(|i| self.0.remove(i))
    }

    /// Drop expired entries, keeping order. Returns how many were dropped.
    pub fn retain_unexpired(&mut self, now: SystemTime) -> usize {
        let before = self.0.len();
        self.0.retain(|p| !p.is_expired(now));
        before - self.0.len()
    }

    pub fn first(&self) -> Option<&Path> {
        self.0.first()
    }

    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.position(fingerprint).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn paths(&self) -> &[Path] {
        &self.0
    }

    fn position(&self, fingerprint: &Fingerprint) -> Option<usize> {
        self.0.iter().position(|p| &p.fingerprint == fingerprint)
    }
}
