//! Tempo grid controls: tap tempo, BPM entry, grid mode, and downbeat
//! alignment. Grid settings persist to the config on every change.

use iced::Task;

use crate::ui::app::{Message, WavenoteApp};

impl WavenoteApp {
    pub(crate) fn handle_tap_tempo(&mut self) -> Task<Message> {
        let at = self.started_at.elapsed().as_secs_f64();
        if let Some(bpm) = self.tap.tap(at) {
            self.timeline.set_bpm(bpm);
            self.bpm_input = format!("{:.0}", bpm);
            self.persist_tempo();
        } else {
            self.status = format!("Tap {}...", self.tap.tap_count());
        }
        Task::none()
    }

    pub(crate) fn handle_bpm_submitted(&mut self) -> Task<Message> {
        match self.bpm_input.trim().parse::<f64>() {
            Ok(bpm) if bpm > 0.0 => {
                self.timeline.set_bpm(bpm);
                // set_bpm clamps; reflect the value actually applied.
                self.bpm_input = format!("{:.0}", self.timeline.tempo().bpm);
                self.tap.reset();
                self.persist_tempo();
            }
            _ => {
                self.status = format!("Not a BPM: {}", self.bpm_input);
                self.bpm_input = format!("{:.0}", self.timeline.tempo().bpm);
            }
        }
        Task::none()
    }

    pub(crate) fn handle_cycle_grid_mode(&mut self) -> Task<Message> {
        self.timeline.cycle_grid_mode();
        self.persist_tempo();
        Task::none()
    }

    /// Align the grid downbeat to the current playhead.
    pub(crate) fn handle_align_grid(&mut self) -> Task<Message> {
        let at = match &self.clock {
            Some(clock) => clock.current_time(),
            None => self.timeline.current_time(),
        };
        self.timeline.align_grid_to(at);
        self.persist_tempo();
        Task::none()
    }

    fn persist_tempo(&mut self) {
        self.config.tempo = *self.timeline.tempo();
        self.save_config();
    }
}
