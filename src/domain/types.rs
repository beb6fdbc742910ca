use chrono::{DateTime, Utc};

/// Last captured state of a target. One per target, no history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub fingerprint: String,
    pub content: String,
    pub observed_at: DateTime<Utc>,
}

/// Normalized text of a fetched page together with its fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub fingerprint: String,
    pub content: String,
}
