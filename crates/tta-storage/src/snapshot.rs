use crate::{AllocationStore, StorageError};
use std::fs;
use std::path::{Path, PathBuf};

/// Full-state snapshot on disk: one JSON document with one record array per
/// entity kind. Writes are atomic (temp file then rename) and optionally
/// capped by a byte quota; a quota failure leaves the previous snapshot
/// untouched and is surfaced without retry.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
    quota_bytes: Option<usize>,
}

impl SnapshotFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            quota_bytes: None,
        }
    }

    pub fn with_quota(path: impl AsRef<Path>, quota_bytes: usize) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            quota_bytes: Some(quota_bytes),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the snapshot; a missing file is an empty store, not an error.
    pub fn load(&self) -> Result<AllocationStore, StorageError> {
        if !self.path.exists() {
            return Ok(AllocationStore::new());
        }
        let text = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn save(&self, store: &AllocationStore) -> Result<(), StorageError> {
        let body = serde_json::to_vec_pretty(store)?;
        if let Some(quota) = self.quota_bytes {
            if body.len() > quota {
                return Err(StorageError::QuotaExceeded {
                    size: body.len(),
                    quota,
                });
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, &body)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeMap;
    use tta_core::{LevelRule, Member, Task};
    use tta_import::skill_definition_from_column;

    fn sample_store() -> AllocationStore {
        let mut store = AllocationStore::new();
        store
            .add_skill(skill_definition_from_column("Tech skill"))
            .expect("add skill");
        let skill_id = store
            .schema()
            .by_column("Tech skill")
            .expect("skill")
            .id
            .clone();

        let now = Utc::now();
        store.add_member(Member {
            id: "m1".to_string(),
            name: "Alice".to_string(),
            level_name: "Senior".to_string(),
            last_review_date: "June 1, 2026".to_string(),
            skills: BTreeMap::from([(skill_id.clone(), 4)]),
            created_at: now,
            updated_at: now,
        });
        store.add_task(Task {
            id: "t1".to_string(),
            name: "Checkout flow".to_string(),
            link: "XCOR-18024".to_string(),
            story_points: 5.0,
            assignee_name: "Alice".to_string(),
            complexity: BTreeMap::from([(skill_id, 3)]),
            completed: false,
            manual_reviewer: Some("Bob".to_string()),
            created_at: now,
            updated_at: now,
        });
        store.set_level_rules(vec![LevelRule {
            level_id: 1,
            level_name: "Senior".to_string(),
            max_self_approved_complexity: 5.0,
            review_authority: 5.0,
        }]);
        store
    }

    #[test]
    fn snapshot_round_trips_every_field() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = SnapshotFile::new(dir.path().join("state.json"));

        let store = sample_store();
        file.save(&store).expect("save");
        let loaded = file.load().expect("load");
        assert_eq!(loaded, store);
    }

    #[test]
    fn missing_snapshot_loads_empty_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = SnapshotFile::new(dir.path().join("absent.json"));
        let loaded = file.load().expect("load");
        assert_eq!(loaded, AllocationStore::new());
    }

    #[test]
    fn quota_failure_keeps_previous_snapshot() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("state.json");

        let empty = AllocationStore::new();
        SnapshotFile::new(&path).save(&empty).expect("first save");

        let capped = SnapshotFile::with_quota(&path, 16);
        let err = capped.save(&sample_store()).unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { .. }));

        let loaded = capped.load().expect("load");
        assert_eq!(loaded, empty);
    }
}
