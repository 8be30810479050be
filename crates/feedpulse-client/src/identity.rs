//! Durable visitor identity.
//!
//! The visitor id survives restarts by living in a small file, so the
//! same installation keeps aggregating under one uuid. An id can also
//! be seeded externally (e.g. from a share link); seeded values are
//! validated before they replace the stored one.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use uuid::{Uuid, Variant};

use crate::error::TrackerError;

pub struct IdentityStore {
    path: PathBuf,
}

impl IdentityStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Return the stored visitor id, minting and persisting a fresh v4
    /// uuid when the file is missing or holds an invalid value.
    pub fn get_or_create(&self) -> Result<Uuid, TrackerError> {
        if let Ok(contents) = fs::read_to_string(&self.path)
            && let Some(existing) = parse_visitor_id(contents.trim())
        {
            return Ok(existing);
        }

        let minted = Uuid::new_v4();
        self.persist(minted)?;
        Ok(minted)
    }

    /// Adopt an externally supplied visitor id. Returns `None` without
    /// touching the store when the candidate fails validation.
    pub fn seed(&self, candidate: &str) -> Result<Option<Uuid>, TrackerError> {
        let Some(seeded) = parse_visitor_id(candidate.trim()) else {
            debug!(candidate, "rejected seeded visitor id");
            return Ok(None);
        };
        self.persist(seeded)?;
        Ok(Some(seeded))
    }

    fn persist(&self, id: Uuid) -> Result<(), TrackerError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(TrackerError::Identity)?;
        }
        fs::write(&self.path, id.to_string()).map_err(TrackerError::Identity)
    }
}

/// Accept only canonical uuids with a version nibble of 1-5 and an
/// RFC 4122 variant; anything else is treated as absent.
fn parse_visitor_id(value: &str) -> Option<Uuid> {
    let parsed = Uuid::try_parse(value).ok()?;
    if !(1..=5).contains(&parsed.get_version_num()) {
        return None;
    }
    if parsed.get_variant() != Variant::RFC4122 {
        return None;
    }
    Some(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_only_rfc4122_uuids() {
        let valid = Uuid::new_v4();
        assert_eq!(parse_visitor_id(&valid.to_string()), Some(valid));

        assert!(parse_visitor_id("not-a-uuid").is_none());
        // Nil uuid has version 0.
        assert!(parse_visitor_id("00000000-0000-0000-0000-000000000000").is_none());
    }

    #[test]
    fn creates_and_reuses_a_stored_id() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = IdentityStore::new(dir.path().join("visitor-id"));

        let first = store.get_or_create().expect("first id");
        let second = store.get_or_create().expect("second id");
        assert_eq!(first, second);
    }

    #[test]
    fn seeding_replaces_the_stored_id() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = IdentityStore::new(dir.path().join("visitor-id"));
        let original = store.get_or_create().expect("original id");

        let seeded = Uuid::new_v4();
        let adopted = store
            .seed(&seeded.to_string())
            .expect("seed")
            .expect("valid seed");
        assert_eq!(adopted, seeded);
        assert_ne!(adopted, original);
        assert_eq!(store.get_or_create().expect("reload"), seeded);
    }

    #[test]
    fn invalid_seed_is_ignored() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = IdentityStore::new(dir.path().join("visitor-id"));
        let original = store.get_or_create().expect("original id");

        assert!(store.seed("garbage").expect("seed").is_none());
        assert_eq!(store.get_or_create().expect("reload"), original);
    }
}
