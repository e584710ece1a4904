//! Sidecar annotation store.
//!
//! Annotations live next to the audio source as
//! `<source>.annotations.json` so they travel with the file. A notify
//! watcher on the containing directory picks up external edits; the app
//! reloads and diffs against its in-memory snapshot, so the store's own
//! writes diff to nothing and need no suppression.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use wavenote_core::{diff_snapshots, Annotation, AnnotationEvent, AnnotationId, AnnotationSnapshot};

/// Marker sent by the watcher when the sidecar changes on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SidecarChanged;

/// Sidecar path for an audio source: `track.wav` gets
/// `track.wav.annotations.json` in the same directory.
pub fn sidecar_path(source: &Path) -> PathBuf {
    let mut name = source
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".annotations.json");
    source.with_file_name(name)
}

pub struct SidecarStore {
    sidecar_path: PathBuf,
    snapshot: AnnotationSnapshot,
    watch_rx: Arc<Mutex<Receiver<SidecarChanged>>>,
    // Dropping the watcher stops the watch.
    _watcher: Option<RecommendedWatcher>,
}

impl SidecarStore {
    /// Open (or initialize) the sidecar for `source` and start watching it
    /// for external edits.
    pub fn open(source: &Path) -> Result<Self> {
        let sidecar_path = sidecar_path(source);
        let source_name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut snapshot = if sidecar_path.exists() {
            load_snapshot(&sidecar_path)?
        } else {
            AnnotationSnapshot::default()
        };
        if snapshot.source_name.is_empty() {
            snapshot.source_name = source_name;
        }

        log::info!(
            "SidecarStore: {} annotations from {:?}",
            snapshot.len(),
            sidecar_path
        );

        let (tx, rx) = channel();
        let watcher = spawn_watcher(&sidecar_path, tx);

        Ok(Self {
            sidecar_path,
            snapshot,
            watch_rx: Arc::new(Mutex::new(rx)),
            _watcher: watcher,
        })
    }

    pub fn snapshot(&self) -> &AnnotationSnapshot {
        &self.snapshot
    }

    pub fn annotations(&self) -> Vec<Annotation> {
        self.snapshot.annotations.clone()
    }

    pub fn next_id(&self) -> AnnotationId {
        self.snapshot.next_id()
    }

    pub fn find(&self, id: AnnotationId) -> Option<&Annotation> {
        self.snapshot.find(id)
    }

    /// Receiver for the subscription bridge. Identity follows the channel,
    /// so opening a new store swaps the subscription automatically.
    pub fn watch_receiver(&self) -> Arc<Mutex<Receiver<SidecarChanged>>> {
        Arc::clone(&self.watch_rx)
    }

    /// Insert or replace an annotation and persist immediately.
    pub fn upsert(&mut self, annotation: Annotation) -> Result<()> {
        self.snapshot.upsert(annotation);
        self.save()
    }

    /// Remove an annotation (and its replies) and persist. Returns whether
    /// anything was removed.
    pub fn remove(&mut self, id: AnnotationId) -> Result<bool> {
        let removed = self.snapshot.remove(id);
        if removed {
            self.save()?;
        }
        Ok(removed)
    }

    /// Reload from disk after an external change and return the deltas
    /// against the previous in-memory snapshot. A deleted sidecar reads as
    /// an empty snapshot, so its annotations come back as deletions.
    pub fn reload(&mut self) -> Result<Vec<AnnotationEvent>> {
        let new_snapshot = if self.sidecar_path.exists() {
            load_snapshot(&self.sidecar_path)?
        } else {
            AnnotationSnapshot {
                source_name: self.snapshot.source_name.clone(),
                annotations: Vec::new(),
            }
        };
        let events = diff_snapshots(&self.snapshot, &new_snapshot);
        if !events.is_empty() {
            log::info!("Sidecar reloaded: {} external changes", events.len());
        }
        self.snapshot = new_snapshot;
        Ok(events)
    }

    fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.snapshot)
            .context("Failed to serialize annotations")?;
        std::fs::write(&self.sidecar_path, json)
            .with_context(|| format!("Failed to write sidecar {:?}", self.sidecar_path))?;
        Ok(())
    }
}

/// Read and parse a sidecar. A file that fails to parse is moved aside to
/// `.bak` rather than silently clobbered by the next save.
fn load_snapshot(path: &Path) -> Result<AnnotationSnapshot> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read sidecar {:?}", path))?;
    match serde_json::from_str(&contents) {
        Ok(snapshot) => Ok(snapshot),
        Err(e) => {
            let backup = path.with_extension("json.bak");
            log::warn!(
                "Sidecar {:?} is not valid JSON ({}); moving aside to {:?}",
                path,
                e,
                backup
            );
            std::fs::rename(path, &backup)
                .with_context(|| format!("Failed to move corrupt sidecar {:?}", path))?;
            Ok(AnnotationSnapshot::default())
        }
    }
}

/// Watch the sidecar's directory (non-recursive) and forward events that
/// touch the sidecar itself. Watching the directory instead of the file
/// survives editors that replace the file, and works before the sidecar
/// exists. A failed watcher degrades to no live reload, not an error.
fn spawn_watcher(sidecar: &Path, tx: Sender<SidecarChanged>) -> Option<RecommendedWatcher> {
    let target_name = sidecar.file_name()?.to_os_string();
    let dir = sidecar.parent()?.to_path_buf();

    let mut watcher =
        match notify::recommended_watcher(move |res: notify::Result<notify::Event>| match res {
            Ok(event) => {
                let relevant = matches!(
                    event.kind,
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                ) && event
                    .paths
                    .iter()
                    .any(|p| p.file_name() == Some(target_name.as_os_str()));
                if relevant {
                    let _ = tx.send(SidecarChanged);
                }
            }
            Err(e) => log::warn!("Sidecar watch error: {}", e),
        }) {
            Ok(w) => w,
            Err(e) => {
                log::warn!("Sidecar watcher unavailable: {}", e);
                return None;
            }
        };

    if let Err(e) = watcher.watch(&dir, RecursiveMode::NonRecursive) {
        log::warn!("Failed to watch {:?}: {}", dir, e);
        return None;
    }
    Some(watcher)
}
