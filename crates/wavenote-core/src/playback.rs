//! Playback session state and the clock that drives it
//!
//! [`PlaybackClock`] is the single source of truth for "current time". It
//! wraps the audio transport behind a trait so the resume and clamping
//! contracts stay testable without an output device, and it owns an explicit
//! listener list: one clock exists per loaded source, so dropping the clock
//! on a source change tears every subscription down with it.
//!
//! ## Resume-from-cursor
//!
//! Manual seeks remember where the user pointed (`last_cursor_position`) and
//! arm `should_resume_from_cursor`. Natural time advance while playing moves
//! the cursor along continuously. On resume, an armed cursor that materially
//! differs from the transport position re-seeks the transport first, so
//! play always starts from the last point the user chose.

use crate::error::{TransportError, TransportResult};

/// Transport positions closer than this to the armed cursor skip the
/// re-seek on resume
const RESUME_TOLERANCE_SECONDS: f64 = 0.05;

/// Live playback state for the loaded source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackSession {
    pub duration_seconds: f64,
    pub current_time_seconds: f64,
    pub is_playing: bool,
    pub volume: f32,
    pub is_muted: bool,
}

/// Seam to the audio output. The production implementation wraps a sink;
/// tests use a scripted fake.
pub trait Transport {
    fn play(&mut self) -> TransportResult<()>;
    fn pause(&mut self);
    fn seek(&mut self, seconds: f64) -> TransportResult<()>;
    /// Current transport position in seconds
    fn position_seconds(&self) -> f64;
    /// Applied volume (already mute-adjusted by the clock)
    fn set_volume(&mut self, volume: f32);
    /// True once the source has played to its end
    fn is_finished(&self) -> bool;
}

/// Transition notifications fired by the clock.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    TimeUpdate(f64),
    LoadComplete(f64),
    PlayStateChange(bool),
    Error(String),
}

type Listener = Box<dyn FnMut(&PlaybackEvent)>;

pub struct PlaybackClock<T: Transport> {
    transport: T,
    session: PlaybackSession,
    last_cursor_position: f64,
    should_resume_from_cursor: bool,
    listeners: Vec<Listener>,
}

impl<T: Transport> PlaybackClock<T> {
    pub fn new(transport: T, duration_seconds: f64, volume: f32, is_muted: bool) -> Self {
        let mut clock = Self {
            transport,
            session: PlaybackSession {
                duration_seconds: duration_seconds.max(0.0),
                current_time_seconds: 0.0,
                is_playing: false,
                volume: volume.clamp(0.0, 1.0),
                is_muted,
            },
            last_cursor_position: 0.0,
            should_resume_from_cursor: false,
            listeners: Vec::new(),
        };
        clock.apply_volume();
        clock
    }

    /// Register a listener for clock transitions. Listeners live exactly as
    /// long as the clock; there is no unsubscribe, the whole list goes away
    /// when the source changes.
    pub fn subscribe(&mut self, listener: Listener) {
        self.listeners.push(listener);
    }

    /// Announce that the source finished loading. Called once, after the
    /// host has subscribed its listeners.
    pub fn announce_loaded(&mut self) {
        let duration = self.session.duration_seconds;
        self.emit(PlaybackEvent::LoadComplete(duration));
    }

    pub fn session(&self) -> PlaybackSession {
        self.session
    }

    pub fn is_playing(&self) -> bool {
        self.session.is_playing
    }

    pub fn current_time(&self) -> f64 {
        self.session.current_time_seconds
    }

    pub fn duration(&self) -> f64 {
        self.session.duration_seconds
    }

    pub fn last_cursor_position(&self) -> f64 {
        self.last_cursor_position
    }

    /// Start or resume playback. Device refusal is non-fatal: the error is
    /// emitted and returned, state stays paused, and the caller may retry on
    /// the next user gesture.
    pub fn play(&mut self) -> TransportResult<()> {
        if self.session.is_playing {
            return Ok(());
        }

        if self.should_resume_from_cursor
            && (self.transport.position_seconds() - self.last_cursor_position).abs()
                > RESUME_TOLERANCE_SECONDS
        {
            self.transport.seek(self.last_cursor_position)?;
            self.session.current_time_seconds = self.last_cursor_position;
        }

        if let Err(e) = self.transport.play() {
            let message = e.to_string();
            log::warn!("Playback start refused: {}", message);
            self.emit(PlaybackEvent::Error(message));
            return Err(e);
        }

        self.should_resume_from_cursor = false;
        self.session.is_playing = true;
        self.emit(PlaybackEvent::PlayStateChange(true));
        Ok(())
    }

    pub fn pause(&mut self) {
        if !self.session.is_playing {
            return;
        }
        self.transport.pause();
        self.session.is_playing = false;
        self.emit(PlaybackEvent::PlayStateChange(false));
    }

    pub fn toggle(&mut self) -> TransportResult<()> {
        if self.session.is_playing {
            self.pause();
            Ok(())
        } else {
            self.play()
        }
    }

    /// Seek to `seconds`, clamped to `[0, duration]`. Arms the
    /// resume-from-cursor contract. While paused the session time updates
    /// immediately, since no natural tick will fire to pull it.
    pub fn seek(&mut self, seconds: f64) -> TransportResult<()> {
        let target = seconds.clamp(0.0, self.session.duration_seconds);
        self.transport.seek(target)?;
        self.last_cursor_position = target;
        self.should_resume_from_cursor = true;
        if !self.session.is_playing {
            self.session.current_time_seconds = target;
            self.emit(PlaybackEvent::TimeUpdate(target));
        }
        Ok(())
    }

    /// Seek to the last manual cursor position and start playing from it.
    pub fn resume_from_cursor(&mut self) -> TransportResult<()> {
        let cursor = self.last_cursor_position;
        self.seek(cursor)?;
        self.play()
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.session.volume = volume.clamp(0.0, 1.0);
        self.apply_volume();
    }

    pub fn toggle_mute(&mut self) {
        self.session.is_muted = !self.session.is_muted;
        self.apply_volume();
    }

    fn apply_volume(&mut self) {
        let effective = if self.session.is_muted {
            0.0
        } else {
            self.session.volume
        };
        self.transport.set_volume(effective);
    }

    /// Pull the transport position into the session. Called once per frame
    /// tick while playing; a no-op otherwise. Natural advance moves the
    /// cursor along with the playhead and disarms any pending resume.
    pub fn sync(&mut self) {
        if !self.session.is_playing {
            return;
        }

        let position = self
            .transport
            .position_seconds()
            .clamp(0.0, self.session.duration_seconds);
        self.session.current_time_seconds = position;
        self.last_cursor_position = position;
        self.should_resume_from_cursor = false;
        self.emit(PlaybackEvent::TimeUpdate(position));

        if self.transport.is_finished() {
            self.session.is_playing = false;
            self.session.current_time_seconds = self.session.duration_seconds;
            self.emit(PlaybackEvent::PlayStateChange(false));
        }
    }

    fn emit(&mut self, event: PlaybackEvent) {
        for listener in &mut self.listeners {
            listener(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Scripted transport: records calls, holds a settable position.
    #[derive(Default)]
    struct FakeTransport {
        position: f64,
        playing: bool,
        finished: bool,
        refuse_play: bool,
        volume: f32,
        seeks: Vec<f64>,
    }

    impl Transport for FakeTransport {
        fn play(&mut self) -> TransportResult<()> {
            if self.refuse_play {
                return Err(TransportError::DeviceUnavailable("scripted".into()));
            }
            self.playing = true;
            Ok(())
        }

        fn pause(&mut self) {
            self.playing = false;
        }

        fn seek(&mut self, seconds: f64) -> TransportResult<()> {
            self.position = seconds;
            self.seeks.push(seconds);
            Ok(())
        }

        fn position_seconds(&self) -> f64 {
            self.position
        }

        fn set_volume(&mut self, volume: f32) {
            self.volume = volume;
        }

        fn is_finished(&self) -> bool {
            self.finished
        }
    }

    fn clock() -> PlaybackClock<FakeTransport> {
        PlaybackClock::new(FakeTransport::default(), 120.0, 0.8, false)
    }

    #[test]
    fn seek_clamps_into_the_source() {
        let mut clock = clock();
        clock.seek(500.0).unwrap();
        assert_eq!(clock.current_time(), 120.0, "over-length seek hits the end");
        clock.seek(-3.0).unwrap();
        assert_eq!(clock.current_time(), 0.0, "negative seek hits the start");
    }

    #[test]
    fn paused_seek_updates_time_immediately() {
        let mut clock = clock();
        clock.seek(42.0).unwrap();
        assert_eq!(
            clock.current_time(),
            42.0,
            "no tick will fire while paused, the session must move now"
        );
    }

    #[test]
    fn playing_resumes_from_the_armed_cursor() {
        let mut clock = clock();
        clock.seek(30.0).unwrap();
        // Transport drifted away from the chosen point
        clock.transport.position = 55.0;

        clock.play().unwrap();
        assert_eq!(
            clock.transport.seeks.last(),
            Some(&30.0),
            "resume must re-seek to the manual cursor"
        );
        assert!(clock.is_playing());
    }

    #[test]
    fn plain_pause_resume_does_not_re_seek() {
        let mut clock = clock();
        clock.play().unwrap();
        clock.transport.position = 10.0;
        clock.sync();
        clock.pause();

        let seeks_before = clock.transport.seeks.len();
        clock.play().unwrap();
        assert_eq!(
            clock.transport.seeks.len(),
            seeks_before,
            "natural advance disarms the cursor, playback continues in place"
        );
    }

    #[test]
    fn natural_advance_moves_the_cursor_along() {
        let mut clock = clock();
        clock.play().unwrap();
        clock.transport.position = 17.5;
        clock.sync();
        assert_eq!(clock.last_cursor_position(), 17.5);
        assert_eq!(clock.current_time(), 17.5);
    }

    #[test]
    fn refused_play_is_non_fatal_and_emits_error() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);

        let transport = FakeTransport {
            refuse_play: true,
            ..FakeTransport::default()
        };
        let mut clock = PlaybackClock::new(transport, 60.0, 1.0, false);
        clock.subscribe(Box::new(move |e| sink.borrow_mut().push(e.clone())));

        assert!(clock.play().is_err());
        assert!(!clock.is_playing(), "state stays paused after refusal");
        assert!(
            matches!(events.borrow().last(), Some(PlaybackEvent::Error(_))),
            "refusal reaches listeners"
        );

        // A later qualifying gesture succeeds
        clock.transport.refuse_play = false;
        assert!(clock.play().is_ok());
        assert!(clock.is_playing());
    }

    #[test]
    fn mute_zeroes_the_transport_and_restores_on_unmute() {
        let mut clock = clock();
        clock.set_volume(0.6);
        assert_eq!(clock.transport.volume, 0.6);
        clock.toggle_mute();
        assert_eq!(clock.transport.volume, 0.0);
        assert_eq!(clock.session().volume, 0.6, "session keeps the set level");
        clock.toggle_mute();
        assert_eq!(clock.transport.volume, 0.6);
    }

    #[test]
    fn listeners_see_state_changes_in_order() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);

        let mut clock = clock();
        clock.subscribe(Box::new(move |e| sink.borrow_mut().push(e.clone())));
        clock.announce_loaded();
        clock.play().unwrap();
        clock.pause();

        let seen = events.borrow();
        assert_eq!(
            *seen,
            vec![
                PlaybackEvent::LoadComplete(120.0),
                PlaybackEvent::PlayStateChange(true),
                PlaybackEvent::PlayStateChange(false),
            ]
        );
    }

    #[test]
    fn finished_transport_flips_to_paused_at_the_end() {
        let mut clock = clock();
        clock.play().unwrap();
        clock.transport.position = 120.0;
        clock.transport.finished = true;
        clock.sync();
        assert!(!clock.is_playing());
        assert_eq!(clock.current_time(), 120.0);
    }

    #[test]
    fn resume_from_cursor_seeks_then_plays() {
        let mut clock = clock();
        clock.seek(25.0).unwrap();
        clock.play().unwrap();
        clock.transport.position = 80.0;
        clock.sync();
        clock.pause();

        // The armed cursor was consumed by natural advance; arm it again
        clock.seek(25.0).unwrap();
        clock.pause();
        clock.resume_from_cursor().unwrap();
        assert!(clock.is_playing());
        assert_eq!(clock.transport.position, 25.0);
    }
}
