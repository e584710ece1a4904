//! Annotation CRUD through the sidecar store, plus live reload of
//! external edits.

use iced::Task;

use wavenote_core::{Annotation, AnnotationEvent, AnnotationId, Status};

use crate::ui::app::{Message, WavenoteApp};
use crate::ui::panel::AnnotationDraft;

impl WavenoteApp {
    pub(crate) fn handle_select_annotation(&mut self, id: AnnotationId) -> Task<Message> {
        self.timeline.select(Some(id));
        let timestamp = self
            .store
            .as_ref()
            .and_then(|s| s.find(id))
            .map(|a| a.timestamp_seconds);
        if let Some(t) = timestamp {
            self.seek_to(t);
        }
        Task::none()
    }

    pub(crate) fn handle_begin_draft(&mut self, parent_id: Option<AnnotationId>) -> Task<Message> {
        if self.store.is_none() {
            self.status = String::from("No annotation store for this source");
            return Task::none();
        }
        // Replies inherit the parent's timestamp; new roots attach at the
        // last committed cursor position.
        let timestamp_seconds = parent_id
            .and_then(|p| self.store.as_ref().and_then(|s| s.find(p)))
            .map(|a| a.timestamp_seconds)
            .unwrap_or_else(|| match &self.clock {
                Some(clock) => clock.last_cursor_position(),
                None => self.timeline.current_time(),
            });
        self.draft = Some(AnnotationDraft::new(parent_id, timestamp_seconds));
        Task::none()
    }

    pub(crate) fn handle_edit_annotation(&mut self, id: AnnotationId) -> Task<Message> {
        if let Some(annotation) = self.store.as_ref().and_then(|s| s.find(id)) {
            self.draft = Some(AnnotationDraft::from_existing(annotation));
            self.timeline.select(Some(id));
        }
        Task::none()
    }

    pub(crate) fn handle_submit_draft(&mut self) -> Task<Message> {
        let Some(draft) = self.draft.take() else {
            return Task::none();
        };
        if draft.text.trim().is_empty() {
            self.status = String::from("Annotation text is empty");
            self.draft = Some(draft);
            return Task::none();
        }
        let Some(store) = &mut self.store else {
            self.status = String::from("No annotation store for this source");
            self.draft = Some(draft);
            return Task::none();
        };

        let id = draft.editing.unwrap_or_else(|| store.next_id());
        // Edits keep the existing workflow status; new annotations start
        // pending.
        let status = draft
            .editing
            .and_then(|id| store.find(id))
            .map(|a| a.status)
            .unwrap_or(Status::Pending);

        let annotation = Annotation {
            id,
            timestamp_seconds: draft.timestamp_seconds,
            text: draft.text.trim().to_string(),
            kind: draft.kind,
            priority: draft.priority,
            status,
            parent_id: draft.parent_id,
        };

        match store.upsert(annotation) {
            Ok(()) => {
                self.timeline.set_annotations(store.annotations());
                self.timeline.select(Some(id));
            }
            Err(e) => {
                log::warn!("Failed to save annotation: {:#}", e);
                self.status = format!("Save failed: {}", e);
            }
        }
        Task::none()
    }

    pub(crate) fn handle_delete_annotation(&mut self, id: AnnotationId) -> Task<Message> {
        let Some(store) = &mut self.store else {
            return Task::none();
        };
        match store.remove(id) {
            Ok(true) => self.timeline.set_annotations(store.annotations()),
            Ok(false) => {}
            Err(e) => {
                log::warn!("Failed to delete annotation: {:#}", e);
                self.status = format!("Delete failed: {}", e);
            }
        }
        Task::none()
    }

    pub(crate) fn handle_advance_status(&mut self, id: AnnotationId) -> Task<Message> {
        let Some(store) = &mut self.store else {
            return Task::none();
        };
        let Some(mut annotation) = store.find(id).cloned() else {
            return Task::none();
        };
        annotation.status = annotation.status.advance();
        match store.upsert(annotation) {
            Ok(()) => self.timeline.set_annotations(store.annotations()),
            Err(e) => {
                log::warn!("Failed to update status: {:#}", e);
                self.status = format!("Save failed: {}", e);
            }
        }
        Task::none()
    }

    /// The sidecar changed on disk. Reload, log the deltas, and refresh
    /// the timeline. Our own saves diff to nothing.
    pub(crate) fn handle_sidecar_changed(&mut self) -> Task<Message> {
        let Some(store) = &mut self.store else {
            return Task::none();
        };
        match store.reload() {
            Ok(events) if !events.is_empty() => {
                for event in &events {
                    match event {
                        AnnotationEvent::Created(a) => {
                            log::debug!("External annotation created: {:?}", a.id)
                        }
                        AnnotationEvent::Updated(a) => {
                            log::debug!("External annotation updated: {:?}", a.id)
                        }
                        AnnotationEvent::Deleted(id) => {
                            log::debug!("External annotation deleted: {:?}", id)
                        }
                    }
                }
                self.status = format!("Annotations updated ({} changes)", events.len());
                self.timeline.set_annotations(store.annotations());
            }
            Ok(_) => {}
            Err(e) => log::warn!("Failed to reload sidecar: {:#}", e),
        }
        Task::none()
    }
}
