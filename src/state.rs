//! Dedup state store: one `AlertRecord` per posting identity ever seen.
//!
//! Records are created on first encounter and updated forever after —
//! never deleted — so the history doubles as a permanent suppression
//! record. The engine never mutates the store directly: it proposes
//! `MergePatch`es, and the run loop applies them after all decisions for
//! the batch are computed, then replaces the snapshot file atomically
//! (write-temp-then-rename). The merge is idempotent (set-union on
//! channels, max on tier/score), so overlapping runs and re-applied
//! patches converge to the same record without locking.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StateError;
use crate::posting::PostingIdentity;
use crate::tier::{Channel, Tier};

/// Persisted alert state for one posting identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub identity: PostingIdentity,
    pub first_seen_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    pub last_score: u8,
    pub last_tier: Tier,
    #[serde(default)]
    pub alerted_channels: BTreeSet<Channel>,
}

/// A proposed, idempotent update for one identity. Pure data; applying it
/// is the only mutation path into the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergePatch {
    pub identity: PostingIdentity,
    pub score: u8,
    pub tier: Tier,
    /// Channel that fired this run, if any. `None` still refreshes
    /// `last_seen_at` and score/tier maxima.
    pub channel: Option<Channel>,
    pub seen_at: DateTime<Utc>,
}

/// Suppression rule: fire the tier's channel only when the identity is
/// unseen, the channel has never fired for it, or the tier escalated past
/// what we last alerted on. This is the anti-duplicate-alert policy and
/// the reason records are retained forever.
pub fn should_alert(existing: Option<&AlertRecord>, tier: Tier, channel: Channel) -> bool {
    match existing {
        None => true,
        Some(rec) => !rec.alerted_channels.contains(&channel) || tier > rec.last_tier,
    }
}

/// Full persisted snapshot: identity string → record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateSnapshot {
    records: BTreeMap<String, AlertRecord>,
}

impl StateSnapshot {
    pub fn lookup(&self, identity: &PostingIdentity) -> Option<&AlertRecord> {
        self.records.get(identity.as_str())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Merge one patch into the snapshot. Idempotent: applying the same
    /// patch twice yields the same record as applying it once.
    pub fn apply(&mut self, patch: &MergePatch) -> &AlertRecord {
        let key = patch.identity.as_str().to_string();
        let merged = merge(self.records.get(&key), patch);
        self.records.insert(key.clone(), merged);
        &self.records[&key]
    }
}

/// The merge itself, as a pure function: set-union on channels, max on
/// tier/score/last-seen, min on first-seen. Commutative over application
/// order, which is what makes overlapping runs safe without a lock.
pub fn merge(existing: Option<&AlertRecord>, patch: &MergePatch) -> AlertRecord {
    match existing {
        None => AlertRecord {
            identity: patch.identity.clone(),
            first_seen_at: patch.seen_at,
            last_seen_at: patch.seen_at,
            last_score: patch.score,
            last_tier: patch.tier,
            alerted_channels: patch.channel.into_iter().collect(),
        },
        Some(rec) => {
            let mut merged = rec.clone();
            merged.first_seen_at = merged.first_seen_at.min(patch.seen_at);
            merged.last_seen_at = merged.last_seen_at.max(patch.seen_at);
            merged.last_score = merged.last_score.max(patch.score);
            merged.last_tier = merged.last_tier.max(patch.tier);
            if let Some(ch) = patch.channel {
                merged.alerted_channels.insert(ch);
            }
            merged
        }
    }
}

/// Load a snapshot. A missing file is a normal first run (empty snapshot);
/// anything unparseable is fatal — proceeding with an assumed-empty state
/// would re-alert the entire history.
pub fn load(path: &Path) -> Result<StateSnapshot, StateError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(StateSnapshot::default())
        }
        Err(e) => {
            return Err(StateError::Read {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };
    serde_json::from_str(&raw).map_err(|e| StateError::Corrupt {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Atomically replace the snapshot on disk: write a sibling temp file,
/// then rename over the target. A crash mid-run leaves the previous
/// snapshot fully intact. The temp name is unique per writer so
/// overlapping runs never truncate each other's in-progress file; the
/// last rename wins with a complete snapshot either way.
pub async fn save_atomic(path: &Path, snapshot: &StateSnapshot) -> Result<(), StateError> {
    let bytes = serde_json::to_vec_pretty(snapshot).map_err(|e| StateError::Write {
        path: path.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
    })?;

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| StateError::Write {
                path: path.to_path_buf(),
                source: e,
            })?;
    }

    static TMP_SEQ: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(0);
    let seq = TMP_SEQ.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(format!(".{}.{}.tmp", std::process::id(), seq));
    let tmp = std::path::PathBuf::from(tmp);

    if let Err(e) = tokio::fs::write(&tmp, &bytes).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(StateError::Write {
            path: path.to_path_buf(),
            source: e,
        });
    }
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| StateError::Write {
            path: path.to_path_buf(),
            source: e,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn id(n: u32) -> PostingIdentity {
        PostingIdentity::derive("Acme", &format!("https://acme.example/jobs/{n}")).unwrap()
    }

    fn ts(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 30, h, 0, 0).unwrap()
    }

    fn patch(n: u32, score: u8, tier: Tier, channel: Option<Channel>) -> MergePatch {
        MergePatch {
            identity: id(n),
            score,
            tier,
            channel,
            seen_at: ts(9),
        }
    }

    #[test]
    fn apply_creates_then_merges() {
        let mut snap = StateSnapshot::default();
        snap.apply(&patch(1, 55, Tier::Medium, Some(Channel::Digest)));
        let rec = snap.lookup(&id(1)).unwrap();
        assert_eq!(rec.first_seen_at, ts(9));
        assert_eq!(rec.last_score, 55);
        assert!(rec.alerted_channels.contains(&Channel::Digest));

        // Later escalation: score/tier move up, channel set grows,
        // first_seen_at stays put.
        let mut p2 = patch(1, 85, Tier::Urgent, Some(Channel::Push));
        p2.seen_at = ts(12);
        snap.apply(&p2);
        let rec = snap.lookup(&id(1)).unwrap();
        assert_eq!(rec.first_seen_at, ts(9));
        assert_eq!(rec.last_seen_at, ts(12));
        assert_eq!(rec.last_score, 85);
        assert_eq!(rec.last_tier, Tier::Urgent);
        assert!(rec.alerted_channels.contains(&Channel::Digest));
        assert!(rec.alerted_channels.contains(&Channel::Push));
    }

    #[test]
    fn apply_is_idempotent() {
        let p = patch(2, 70, Tier::High, Some(Channel::Digest));
        let mut once = StateSnapshot::default();
        once.apply(&p);
        let mut twice = once.clone();
        twice.apply(&p);
        assert_eq!(once, twice);
    }

    #[test]
    fn merge_never_downgrades() {
        let mut snap = StateSnapshot::default();
        snap.apply(&patch(3, 85, Tier::Urgent, Some(Channel::Push)));
        snap.apply(&patch(3, 45, Tier::Medium, None));
        let rec = snap.lookup(&id(3)).unwrap();
        assert_eq!(rec.last_score, 85);
        assert_eq!(rec.last_tier, Tier::Urgent);
    }

    #[test]
    fn apply_order_does_not_matter() {
        let a = patch(4, 45, Tier::Medium, Some(Channel::Digest));
        let b = patch(4, 85, Tier::Urgent, Some(Channel::Push));
        let mut ab = StateSnapshot::default();
        ab.apply(&a);
        ab.apply(&b);
        let mut ba = StateSnapshot::default();
        ba.apply(&b);
        ba.apply(&a);
        assert_eq!(ab, ba);
    }

    #[test]
    fn suppression_rule() {
        let mut snap = StateSnapshot::default();
        assert!(should_alert(None, Tier::Medium, Channel::Digest));

        snap.apply(&patch(5, 45, Tier::Medium, Some(Channel::Digest)));
        let rec = snap.lookup(&id(5));
        // Same tier, channel already fired → suppressed.
        assert!(!should_alert(rec, Tier::Medium, Channel::Digest));
        // Different channel never fired → allowed.
        assert!(should_alert(rec, Tier::Urgent, Channel::Push));
        // Escalation re-alerts even an already-fired channel.
        assert!(should_alert(rec, Tier::High, Channel::Digest));
    }

    #[test]
    fn missing_file_is_empty_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let snap = load(&dir.path().join("nope.json")).unwrap();
        assert!(snap.is_empty());
    }

    #[test]
    fn corrupt_file_is_fatal_not_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{not json").unwrap();
        match load(&path) {
            Err(StateError::Corrupt { .. }) => {}
            other => panic!("expected Corrupt, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn roundtrip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut snap = StateSnapshot::default();
        for n in 0..10 {
            snap.apply(&patch(n, 40 + n as u8, Tier::Medium, Some(Channel::Digest)));
        }
        save_atomic(&path, &snap).await.unwrap();
        let back = load(&path).unwrap();
        assert_eq!(snap, back);
        // temp files must not linger
        let leftovers = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);
    }
}
