//! Annotation domain model
//!
//! Annotations are timestamped notes attached to an audio source. Only root
//! annotations (no parent) appear on the timeline; replies stay in the panel
//! thread. The engine treats the set as a read-mostly snapshot owned by the
//! annotation store; changes arrive as [`AnnotationEvent`] deltas.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable annotation identifier, unique within one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationId(pub u64);

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What an annotation marks on the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationKind {
    Comment,
    Marker,
    Voice,
    Section,
    Issue,
    Approval,
}

impl AnnotationKind {
    /// All kinds in display order
    pub const ALL: [AnnotationKind; 6] = [
        AnnotationKind::Comment,
        AnnotationKind::Marker,
        AnnotationKind::Voice,
        AnnotationKind::Section,
        AnnotationKind::Issue,
        AnnotationKind::Approval,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            AnnotationKind::Comment => "Comment",
            AnnotationKind::Marker => "Marker",
            AnnotationKind::Voice => "Voice",
            AnnotationKind::Section => "Section",
            AnnotationKind::Issue => "Issue",
            AnnotationKind::Approval => "Approval",
        }
    }
}

impl fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Critical,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
            Priority::Critical => "Critical",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Review state of an annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Pending,
    InProgress,
    Resolved,
    Approved,
}

impl Status {
    pub const ALL: [Status; 4] = [
        Status::Pending,
        Status::InProgress,
        Status::Resolved,
        Status::Approved,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Status::Pending => "Pending",
            Status::InProgress => "In progress",
            Status::Resolved => "Resolved",
            Status::Approved => "Approved",
        }
    }

    /// Next state in the review cycle (for the panel's one-click advance)
    pub fn advance(self) -> Status {
        match self {
            Status::Pending => Status::InProgress,
            Status::InProgress => Status::Resolved,
            Status::Resolved => Status::Approved,
            Status::Approved => Status::Pending,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single timestamped annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: AnnotationId,
    pub timestamp_seconds: f64,
    pub text: String,
    pub kind: AnnotationKind,
    pub priority: Priority,
    pub status: Status,
    /// Present on threaded replies; replies never appear on the timeline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<AnnotationId>,
}

impl Annotation {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// The full annotation set for one source, as loaded from the store.
///
/// Doubles as the export surface: encoders consume this snapshot plus the
/// source name and never reach into the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationSnapshot {
    #[serde(default)]
    pub source_name: String,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl AnnotationSnapshot {
    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    /// Root annotations only (the set that projects onto the timeline)
    pub fn roots(&self) -> impl Iterator<Item = &Annotation> {
        self.annotations.iter().filter(|a| a.is_root())
    }

    pub fn find(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == id)
    }

    /// Number of replies threaded under a root annotation
    pub fn reply_count(&self, id: AnnotationId) -> usize {
        self.annotations
            .iter()
            .filter(|a| a.parent_id == Some(id))
            .count()
    }

    /// Smallest id not yet taken
    pub fn next_id(&self) -> AnnotationId {
        AnnotationId(
            self.annotations
                .iter()
                .map(|a| a.id.0)
                .max()
                .map_or(1, |max| max + 1),
        )
    }

    /// Insert or replace by id
    pub fn upsert(&mut self, annotation: Annotation) {
        match self.annotations.iter_mut().find(|a| a.id == annotation.id) {
            Some(slot) => *slot = annotation,
            None => self.annotations.push(annotation),
        }
    }

    /// Remove an annotation and any replies threaded under it
    pub fn remove(&mut self, id: AnnotationId) -> bool {
        let before = self.annotations.len();
        self.annotations
            .retain(|a| a.id != id && a.parent_id != Some(id));
        before != self.annotations.len()
    }
}

/// Incremental change to the annotation set, in store order.
#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationEvent {
    Created(Annotation),
    Updated(Annotation),
    Deleted(AnnotationId),
}

/// Compute the deltas that turn `old` into `new`.
///
/// Used when the sidecar file changes on disk: the watcher reloads the
/// snapshot and the app applies the resulting events.
pub fn diff_snapshots(old: &AnnotationSnapshot, new: &AnnotationSnapshot) -> Vec<AnnotationEvent> {
    let old_by_id: HashMap<AnnotationId, &Annotation> =
        old.annotations.iter().map(|a| (a.id, a)).collect();
    let new_ids: HashSet<AnnotationId> = new.annotations.iter().map(|a| a.id).collect();

    let mut events = Vec::new();
    for annotation in &new.annotations {
        match old_by_id.get(&annotation.id) {
            None => events.push(AnnotationEvent::Created(annotation.clone())),
            Some(prev) if **prev != *annotation => {
                events.push(AnnotationEvent::Updated(annotation.clone()))
            }
            Some(_) => {}
        }
    }
    for annotation in &old.annotations {
        if !new_ids.contains(&annotation.id) {
            events.push(AnnotationEvent::Deleted(annotation.id));
        }
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annotation(id: u64, t: f64) -> Annotation {
        Annotation {
            id: AnnotationId(id),
            timestamp_seconds: t,
            text: format!("note {}", id),
            kind: AnnotationKind::Comment,
            priority: Priority::Medium,
            status: Status::Pending,
            parent_id: None,
        }
    }

    #[test]
    fn roots_exclude_threaded_replies() {
        let mut snapshot = AnnotationSnapshot::default();
        snapshot.upsert(annotation(1, 10.0));
        let mut reply = annotation(2, 10.0);
        reply.parent_id = Some(AnnotationId(1));
        snapshot.upsert(reply);

        let roots: Vec<_> = snapshot.roots().collect();
        assert_eq!(roots.len(), 1, "only the parent should project");
        assert_eq!(roots[0].id, AnnotationId(1));
        assert_eq!(snapshot.reply_count(AnnotationId(1)), 1);
    }

    #[test]
    fn remove_takes_replies_with_the_root() {
        let mut snapshot = AnnotationSnapshot::default();
        snapshot.upsert(annotation(1, 5.0));
        let mut reply = annotation(2, 5.0);
        reply.parent_id = Some(AnnotationId(1));
        snapshot.upsert(reply);
        snapshot.upsert(annotation(3, 9.0));

        assert!(snapshot.remove(AnnotationId(1)));
        assert_eq!(snapshot.len(), 1, "root and its reply should both go");
        assert!(snapshot.find(AnnotationId(3)).is_some());
    }

    #[test]
    fn next_id_is_monotonic() {
        let mut snapshot = AnnotationSnapshot::default();
        assert_eq!(snapshot.next_id(), AnnotationId(1));
        snapshot.upsert(annotation(7, 1.0));
        assert_eq!(snapshot.next_id(), AnnotationId(8));
    }

    #[test]
    fn diff_reports_created_updated_deleted() {
        let mut old = AnnotationSnapshot::default();
        old.upsert(annotation(1, 1.0));
        old.upsert(annotation(2, 2.0));

        let mut new = AnnotationSnapshot::default();
        let mut changed = annotation(1, 1.0);
        changed.text = "edited".to_string();
        new.upsert(changed.clone());
        new.upsert(annotation(3, 3.0));

        let events = diff_snapshots(&old, &new);
        assert_eq!(events.len(), 3);
        assert!(events.contains(&AnnotationEvent::Updated(changed)));
        assert!(events.contains(&AnnotationEvent::Created(annotation(3, 3.0))));
        assert!(events.contains(&AnnotationEvent::Deleted(AnnotationId(2))));
    }

    #[test]
    fn diff_of_identical_snapshots_is_empty() {
        let mut snapshot = AnnotationSnapshot::default();
        snapshot.upsert(annotation(1, 1.0));
        assert!(diff_snapshots(&snapshot, &snapshot.clone()).is_empty());
    }

    #[test]
    fn status_serializes_kebab_case() {
        let json = serde_json::to_string(&Status::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
        let back: Status = serde_json::from_str("\"in-progress\"").unwrap();
        assert_eq!(back, Status::InProgress);
    }

    #[test]
    fn snapshot_json_round_trip() {
        let mut snapshot = AnnotationSnapshot {
            source_name: "mix-v3.wav".to_string(),
            annotations: Vec::new(),
        };
        let mut a = annotation(1, 42.5);
        a.kind = AnnotationKind::Issue;
        a.priority = Priority::Critical;
        snapshot.upsert(a);

        let json = serde_json::to_string_pretty(&snapshot).unwrap();
        let back: AnnotationSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
        assert!(
            !json.contains("parent_id"),
            "absent parents should not serialize"
        );
    }
}
