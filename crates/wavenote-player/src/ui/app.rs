//! Application state and the iced update/view/subscription surface.
//!
//! Handlers for each message family live in `ui/handlers/`; this module
//! owns the state struct, the message enum, and the top-level layout.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::{Duration, Instant};

use iced::widget::{button, column, container, row, slider, text, Canvas, Space};
use iced::{keyboard, time, window, Element, Length, Subscription, Task, Theme};

use wavenote_core::{
    AnnotationId, AnnotationKind, PlaybackClock, PlaybackEvent, PlaybackSession, Priority, TapTempo,
};
use wavenote_widgets::{mpsc_subscription, TimelineCanvas, TimelineEvent, TimelineState};

use crate::audio::RodioTransport;
use crate::config::{self, PlayerConfig};
use crate::loader::{LoadResult, WaveformLoader};
use crate::store::{SidecarChanged, SidecarStore};
use crate::ui::panel::{self, AnnotationDraft};

/// Frame pacing for playhead motion and inertia (about 30 fps).
const TICK_INTERVAL_MS: u64 = 33;

#[derive(Debug, Clone)]
pub enum Message {
    Tick,
    Timeline(TimelineEvent),
    SourceLoaded(LoadResult),
    SidecarChanged(SidecarChanged),
    SourceDropped(PathBuf),
    RetryLoad,
    KeyPressed(keyboard::Key, keyboard::Modifiers),
    PlayPause,
    VolumeChanged(f32),
    MuteToggled,
    FollowToggled(bool),
    PersistConfig,
    TapTempo,
    BpmInputChanged(String),
    BpmSubmitted,
    CycleGridMode,
    AlignGrid,
    SelectAnnotation(AnnotationId),
    BeginDraft { parent_id: Option<AnnotationId> },
    EditAnnotation(AnnotationId),
    DeleteAnnotation(AnnotationId),
    AdvanceStatus(AnnotationId),
    DraftTextChanged(String),
    DraftKindSelected(AnnotationKind),
    DraftPrioritySelected(Priority),
    SubmitDraft,
    CancelDraft,
}

pub struct WavenoteApp {
    pub(crate) config: PlayerConfig,
    pub(crate) config_path: PathBuf,
    pub(crate) timeline: TimelineState,
    /// Playback clock over the rodio transport. None until a source is
    /// fully loaded, or when no output device could be acquired.
    pub(crate) clock: Option<PlaybackClock<RodioTransport>>,
    /// Transport opened during load, promoted into the clock once the
    /// waveform result arrives and the final duration is known.
    pub(crate) pending_transport: Option<RodioTransport>,
    /// Events pushed by the clock's listener, drained after each batch of
    /// clock calls on the update thread.
    pub(crate) clock_events: Rc<RefCell<Vec<PlaybackEvent>>>,
    pub(crate) loader: WaveformLoader,
    /// Bumped per load; stale loader results are dropped on arrival.
    pub(crate) generation: u64,
    pub(crate) source_path: Option<PathBuf>,
    pub(crate) store: Option<SidecarStore>,
    pub(crate) tap: TapTempo,
    pub(crate) started_at: Instant,
    pub(crate) bpm_input: String,
    pub(crate) draft: Option<AnnotationDraft>,
    pub(crate) status: String,
}

impl WavenoteApp {
    pub fn new(
        config: PlayerConfig,
        config_path: PathBuf,
        initial_source: Option<PathBuf>,
    ) -> (Self, Task<Message>) {
        let mut timeline = TimelineState::new();
        timeline.set_follow_playhead(config.display.follow_playhead);
        timeline.set_double_tap_zoom_level(config.display.double_tap_zoom);
        timeline.set_tempo(config.tempo);

        let bpm_input = format!("{:.0}", config.tempo.bpm);

        let app = Self {
            config,
            config_path,
            timeline,
            clock: None,
            pending_transport: None,
            clock_events: Rc::new(RefCell::new(Vec::new())),
            loader: WaveformLoader::spawn(),
            generation: 0,
            source_path: None,
            store: None,
            tap: TapTempo::new(),
            started_at: Instant::now(),
            bpm_input,
            draft: None,
            status: String::from("Drop an audio file to begin"),
        };

        let task = match initial_source {
            Some(path) => Task::done(Message::SourceDropped(path)),
            None => Task::none(),
        };
        (app, task)
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Tick => self.handle_tick(),
            Message::Timeline(event) => self.handle_timeline_event(event),
            Message::SourceLoaded(result) => self.handle_source_loaded(result),
            Message::SidecarChanged(_) => self.handle_sidecar_changed(),
            Message::SourceDropped(path) => self.handle_source_dropped(path),
            Message::RetryLoad => self.handle_retry_load(),
            Message::KeyPressed(key, modifiers) => self.handle_key_pressed(key, modifiers),
            Message::PlayPause => {
                self.toggle_playback();
                Task::none()
            }
            Message::VolumeChanged(volume) => {
                self.config.playback.volume = volume;
                if let Some(clock) = &mut self.clock {
                    clock.set_volume(volume);
                }
                self.drain_clock_events();
                Task::none()
            }
            Message::MuteToggled => {
                self.config.playback.muted = !self.config.playback.muted;
                if let Some(clock) = &mut self.clock {
                    clock.toggle_mute();
                }
                self.save_config();
                self.drain_clock_events();
                Task::none()
            }
            Message::FollowToggled(follow) => {
                self.config.display.follow_playhead = follow;
                self.timeline.set_follow_playhead(follow);
                self.save_config();
                Task::none()
            }
            Message::PersistConfig => {
                self.save_config();
                Task::none()
            }
            Message::TapTempo => self.handle_tap_tempo(),
            Message::BpmInputChanged(value) => {
                self.bpm_input = value;
                Task::none()
            }
            Message::BpmSubmitted => self.handle_bpm_submitted(),
            Message::CycleGridMode => self.handle_cycle_grid_mode(),
            Message::AlignGrid => self.handle_align_grid(),
            Message::SelectAnnotation(id) => self.handle_select_annotation(id),
            Message::BeginDraft { parent_id } => self.handle_begin_draft(parent_id),
            Message::EditAnnotation(id) => self.handle_edit_annotation(id),
            Message::DeleteAnnotation(id) => self.handle_delete_annotation(id),
            Message::AdvanceStatus(id) => self.handle_advance_status(id),
            Message::DraftTextChanged(value) => {
                if let Some(draft) = &mut self.draft {
                    draft.text = value;
                }
                Task::none()
            }
            Message::DraftKindSelected(kind) => {
                if let Some(draft) = &mut self.draft {
                    draft.kind = kind;
                }
                Task::none()
            }
            Message::DraftPrioritySelected(priority) => {
                if let Some(draft) = &mut self.draft {
                    draft.priority = priority;
                }
                Task::none()
            }
            Message::SubmitDraft => self.handle_submit_draft(),
            Message::CancelDraft => {
                self.draft = None;
                Task::none()
            }
        }
    }

    pub fn view(&self) -> Element<'_, Message> {
        let timeline = Canvas::new(TimelineCanvas {
            state: &self.timeline,
            on_event: Message::Timeline,
        })
        .width(Length::Fill)
        .height(Length::FillPortion(3));

        let panel = container(panel::view(
            self.store.as_ref(),
            self.timeline.selected(),
            self.draft.as_ref(),
        ))
        .height(Length::FillPortion(2));

        column![
            self.view_header(),
            self.view_transport(),
            timeline,
            panel
        ]
        .spacing(10)
        .padding(10)
        .into()
    }

    pub fn subscription(&self) -> Subscription<Message> {
        let mut subscriptions = vec![
            mpsc_subscription(self.loader.result_receiver()).map(Message::SourceLoaded),
            keyboard::listen().filter_map(|event| match event {
                keyboard::Event::KeyPressed { key, modifiers, .. } => {
                    Some(Message::KeyPressed(key, modifiers))
                }
                _ => None,
            }),
            iced::event::listen_with(|event, _status, _window| match event {
                iced::Event::Window(window::Event::FileDropped(path)) => {
                    Some(Message::SourceDropped(path))
                }
                _ => None,
            }),
        ];

        if let Some(store) = &self.store {
            subscriptions.push(mpsc_subscription(store.watch_receiver()).map(Message::SidecarChanged));
        }

        // Only burn frames while something is actually moving.
        if self.is_animating() {
            subscriptions
                .push(time::every(Duration::from_millis(TICK_INTERVAL_MS)).map(|_| Message::Tick));
        }

        Subscription::batch(subscriptions)
    }

    pub fn theme(&self) -> Theme {
        Theme::Dark
    }

    pub fn title(&self) -> String {
        match self.source_file_name() {
            Some(name) => format!("{} - wavenote", name),
            None => String::from("wavenote"),
        }
    }

    // -------------------------------------------------------------------
    // Shared helpers
    // -------------------------------------------------------------------

    pub(crate) fn source_file_name(&self) -> Option<String> {
        self.source_path
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
    }

    pub(crate) fn save_config(&self) {
        if let Err(e) = config::save_config(&self.config, &self.config_path) {
            log::warn!("Failed to save config: {:#}", e);
        }
    }

    /// Drain listener events accumulated by clock calls and push the
    /// resulting session into the timeline.
    pub(crate) fn drain_clock_events(&mut self) {
        let events: Vec<PlaybackEvent> = self.clock_events.borrow_mut().drain(..).collect();
        for event in events {
            match event {
                PlaybackEvent::Error(message) => {
                    log::warn!("Playback error: {}", message);
                    self.status = message;
                }
                PlaybackEvent::LoadComplete(duration) => {
                    log::info!("Source ready ({:.1}s)", duration);
                }
                PlaybackEvent::PlayStateChange(_) | PlaybackEvent::TimeUpdate(_) => {}
            }
        }
        if let Some(clock) = &self.clock {
            self.timeline.apply_session(&clock.session());
        }
    }

    /// Session for timeline ticks when no clock exists (e.g. inertia with
    /// audio unavailable).
    pub(crate) fn fallback_session(&self) -> PlaybackSession {
        PlaybackSession {
            duration_seconds: self.timeline.viewport().duration(),
            current_time_seconds: self.timeline.current_time(),
            is_playing: false,
            volume: self.config.playback.volume,
            is_muted: self.config.playback.muted,
        }
    }

    fn is_animating(&self) -> bool {
        self.clock.as_ref().is_some_and(|c| c.is_playing()) || self.timeline.is_inertia_active()
    }

    pub(crate) fn toggle_playback(&mut self) {
        self.ensure_clock();
        if let Some(clock) = &mut self.clock {
            match clock.toggle() {
                Ok(()) => self.timeline.set_awaiting_user_gesture(false),
                Err(e) => {
                    self.timeline.set_awaiting_user_gesture(true);
                    self.status = e.to_string();
                }
            }
        }
        self.drain_clock_events();
    }

    pub(crate) fn resume_playback(&mut self) {
        self.ensure_clock();
        if let Some(clock) = &mut self.clock {
            match clock.resume_from_cursor() {
                Ok(()) => self.timeline.set_awaiting_user_gesture(false),
                Err(e) => {
                    self.timeline.set_awaiting_user_gesture(true);
                    self.status = e.to_string();
                }
            }
        }
        self.drain_clock_events();
    }

    fn handle_key_pressed(
        &mut self,
        key: keyboard::Key,
        _modifiers: keyboard::Modifiers,
    ) -> Task<Message> {
        // Typing in the draft editor must not drive the transport.
        if self.draft.is_some() {
            return Task::none();
        }
        match key.as_ref() {
            keyboard::Key::Named(keyboard::key::Named::Space) => self.toggle_playback(),
            keyboard::Key::Named(keyboard::key::Named::Enter) => self.resume_playback(),
            keyboard::Key::Character("m") => return self.update(Message::MuteToggled),
            keyboard::Key::Character("g") => return self.handle_cycle_grid_mode(),
            keyboard::Key::Character("t") => return self.handle_tap_tempo(),
            _ => {}
        }
        Task::none()
    }

    // -------------------------------------------------------------------
    // Layout pieces
    // -------------------------------------------------------------------

    fn view_header(&self) -> Element<'_, Message> {
        let title = text("wavenote").size(20);
        let source = text(self.source_file_name().unwrap_or_else(|| String::from("no source")))
            .size(14);
        let status = text(&self.status).size(12);

        let mut header = row![title, source, status]
            .spacing(16)
            .align_y(iced::Alignment::Center);

        if self.timeline.error().is_some() {
            header = header.push(Space::new().width(Length::Fill)).push(
                button(text("Retry").size(12))
                    .on_press(Message::RetryLoad)
                    .style(button::danger),
            );
        }
        header.into()
    }

    fn view_transport(&self) -> Element<'_, Message> {
        let playing = self.clock.as_ref().is_some_and(|c| c.is_playing());
        let duration = self
            .clock
            .as_ref()
            .map(|c| c.duration())
            .unwrap_or_else(|| self.timeline.viewport().duration());

        let play_button = button(text(if playing { "Pause" } else { "Play" }).size(13))
            .on_press(Message::PlayPause)
            .style(button::primary);

        let position = text(format!(
            "{} / {}",
            panel::format_clock(self.timeline.current_time()),
            panel::format_clock(duration)
        ))
        .size(13);

        let follow = iced::widget::checkbox(self.config.display.follow_playhead)
            .label("Follow")
            .on_toggle(Message::FollowToggled)
            .size(14);

        let mute_label = if self.config.playback.muted { "Unmute" } else { "Mute" };
        let mute = button(text(mute_label).size(12))
            .on_press(Message::MuteToggled)
            .style(button::secondary);

        let volume = slider(0.0..=1.0, self.config.playback.volume, Message::VolumeChanged)
            .step(0.01)
            .on_release(Message::PersistConfig)
            .width(Length::Fixed(120.0));

        let bpm_input = iced::widget::text_input("120", &self.bpm_input)
            .on_input(Message::BpmInputChanged)
            .on_submit(Message::BpmSubmitted)
            .size(12)
            .width(Length::Fixed(56.0));

        let tap = button(text("Tap").size(12))
            .on_press(Message::TapTempo)
            .style(button::secondary);

        let grid = button(text(self.timeline.tempo().mode.label()).size(12))
            .on_press(Message::CycleGridMode)
            .style(button::secondary);

        let align = button(text("Align").size(12))
            .on_press(Message::AlignGrid)
            .style(button::secondary);

        row![
            play_button,
            position,
            Space::new().width(Length::Fill),
            text("BPM").size(12),
            bpm_input,
            tap,
            grid,
            align,
            Space::new().width(16),
            follow,
            mute,
            volume
        ]
        .spacing(8)
        .align_y(iced::Alignment::Center)
        .into()
    }
}
