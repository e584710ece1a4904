//! Frame tick: reconcile the clock with the audio engine and advance
//! timeline animation (playhead, inertia, auto-follow).

use iced::Task;

use crate::ui::app::{Message, WavenoteApp};

impl WavenoteApp {
    pub(crate) fn handle_tick(&mut self) -> Task<Message> {
        if let Some(clock) = &mut self.clock {
            clock.sync();
        }
        self.drain_clock_events();

        let session = match &self.clock {
            Some(clock) => clock.session(),
            None => self.fallback_session(),
        };
        self.timeline.tick(&session);
        Task::none()
    }
}
