//! Annotation panel: threaded list below the timeline, plus the draft
//! editor for creating, replying to, and editing annotations.

use iced::widget::{button, column, pick_list, row, scrollable, text, text_input, Space};
use iced::{Alignment, Element, Length};

use wavenote_core::{
    Annotation, AnnotationId, AnnotationKind, AnnotationSnapshot, Priority,
};

use crate::store::SidecarStore;
use crate::ui::app::Message;

/// In-progress annotation edit. `editing` is set when changing an existing
/// annotation, otherwise a new one is created on submit.
#[derive(Debug, Clone)]
pub struct AnnotationDraft {
    pub editing: Option<AnnotationId>,
    pub parent_id: Option<AnnotationId>,
    pub timestamp_seconds: f64,
    pub text: String,
    pub kind: AnnotationKind,
    pub priority: Priority,
}

impl AnnotationDraft {
    pub fn new(parent_id: Option<AnnotationId>, timestamp_seconds: f64) -> Self {
        Self {
            editing: None,
            parent_id,
            timestamp_seconds,
            text: String::new(),
            kind: AnnotationKind::Comment,
            priority: Priority::Medium,
        }
    }

    pub fn from_existing(annotation: &Annotation) -> Self {
        Self {
            editing: Some(annotation.id),
            parent_id: annotation.parent_id,
            timestamp_seconds: annotation.timestamp_seconds,
            text: annotation.text.clone(),
            kind: annotation.kind,
            priority: annotation.priority,
        }
    }
}

/// `m:ss.d`, e.g. `1:07.3`. Matches the timeline tooltip format.
pub fn format_clock(t: f64) -> String {
    let t = t.max(0.0);
    let minutes = (t / 60.0).floor() as u64;
    let seconds = t - minutes as f64 * 60.0;
    format!("{}:{:04.1}", minutes, seconds)
}

pub fn view<'a>(
    store: Option<&'a SidecarStore>,
    selected: Option<AnnotationId>,
    draft: Option<&'a AnnotationDraft>,
) -> Element<'a, Message> {
    let Some(store) = store else {
        return text("No annotation store for this source").size(13).into();
    };
    let snapshot = store.snapshot();

    let header = row![
        text(format!("Annotations ({})", snapshot.roots().count())).size(15),
        Space::new().width(Length::Fill),
        button(text("Add at playhead").size(12))
            .on_press(Message::BeginDraft { parent_id: None })
            .style(button::primary),
    ]
    .align_y(Alignment::Center);

    let list: Element<'a, Message> = if snapshot.is_empty() {
        text("No annotations yet").size(12).into()
    } else {
        scrollable(annotation_list(snapshot, selected))
            .height(Length::Fill)
            .into()
    };

    let mut panel = column![header, list].spacing(8);
    if let Some(draft) = draft {
        panel = panel.push(draft_editor(draft));
    }
    panel.into()
}

fn annotation_list(
    snapshot: &AnnotationSnapshot,
    selected: Option<AnnotationId>,
) -> Element<'_, Message> {
    let mut roots: Vec<&Annotation> = snapshot.roots().collect();
    roots.sort_by(|a, b| a.timestamp_seconds.total_cmp(&b.timestamp_seconds));

    let mut list = column![].spacing(6);
    for root in roots {
        list = list.push(annotation_row(root, selected, false));
        let mut replies: Vec<&Annotation> = snapshot
            .annotations
            .iter()
            .filter(|a| a.parent_id == Some(root.id))
            .collect();
        replies.sort_by(|a, b| a.timestamp_seconds.total_cmp(&b.timestamp_seconds));
        for reply in replies {
            list = list.push(annotation_row(reply, selected, true));
        }
    }
    list.into()
}

fn annotation_row(
    annotation: &Annotation,
    selected: Option<AnnotationId>,
    is_reply: bool,
) -> Element<'_, Message> {
    let meta = text(format!(
        "{}  {} · {}",
        format_clock(annotation.timestamp_seconds),
        annotation.kind.label(),
        annotation.priority.label(),
    ))
    .size(11);

    let body = text(&annotation.text).size(13);

    let select = button(column![meta, body].spacing(2))
        .on_press(Message::SelectAnnotation(annotation.id))
        .style(if selected == Some(annotation.id) {
            button::primary
        } else {
            button::text
        })
        .width(Length::Fill);

    let mut controls = row![
        button(text(annotation.status.label()).size(11))
            .on_press(Message::AdvanceStatus(annotation.id))
            .style(button::secondary),
    ]
    .spacing(4)
    .align_y(Alignment::Center);

    if !is_reply {
        controls = controls.push(
            button(text("Reply").size(11))
                .on_press(Message::BeginDraft {
                    parent_id: Some(annotation.id),
                })
                .style(button::secondary),
        );
    }
    controls = controls
        .push(
            button(text("Edit").size(11))
                .on_press(Message::EditAnnotation(annotation.id))
                .style(button::secondary),
        )
        .push(
            button(text("Delete").size(11))
                .on_press(Message::DeleteAnnotation(annotation.id))
                .style(button::danger),
        );

    let indent = if is_reply { 24 } else { 0 };
    row![Space::new().width(indent), select, controls]
        .spacing(8)
        .align_y(Alignment::Center)
        .into()
}

fn draft_editor(draft: &AnnotationDraft) -> Element<'_, Message> {
    let title = if draft.editing.is_some() {
        "Edit annotation"
    } else if draft.parent_id.is_some() {
        "Reply"
    } else {
        "New annotation"
    };

    let input = text_input("What happens here?", &draft.text)
        .on_input(Message::DraftTextChanged)
        .on_submit(Message::SubmitDraft)
        .size(13);

    let kind_picker = pick_list(
        &AnnotationKind::ALL[..],
        Some(draft.kind),
        Message::DraftKindSelected,
    )
    .text_size(12);

    let priority_picker = pick_list(
        &Priority::ALL[..],
        Some(draft.priority),
        Message::DraftPrioritySelected,
    )
    .text_size(12);

    column![
        text(format!("{} at {}", title, format_clock(draft.timestamp_seconds))).size(12),
        input,
        row![
            kind_picker,
            priority_picker,
            Space::new().width(Length::Fill),
            button(text("Cancel").size(12))
                .on_press(Message::CancelDraft)
                .style(button::secondary),
            button(text("Save").size(12))
                .on_press(Message::SubmitDraft)
                .style(button::primary),
        ]
        .spacing(6)
        .align_y(Alignment::Center),
    ]
    .spacing(6)
    .into()
}
