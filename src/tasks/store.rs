use std::{collections::HashMap, sync::Arc};

use chrono::Utc;
use parking_lot::RwLock;

use crate::domain::{Snapshot, Target};

/// Last-known snapshot per target. Written only by the monitoring task,
/// readable from any observer. Locks are held for a single map access.
#[derive(Debug, Clone, Default)]
pub struct StateStore {
    inner: Arc<RwLock<HashMap<Target, Snapshot>>>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, target: &Target) -> Option<Snapshot> {
        self.inner.read().get(target).cloned()
    }

    pub fn upsert(&self, target: &Target, fingerprint: String, content: String) {
        let snapshot = Snapshot {
            fingerprint,
            content,
            observed_at: Utc::now(),
        };
        self.inner.write().insert(target.clone(), snapshot);
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn entries(&self) -> Vec<(Target, Snapshot)> {
        let mut entries: Vec<_> = self
            .inner
            .read()
            .iter()
            .map(|(target, snapshot)| (target.clone(), snapshot.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}
