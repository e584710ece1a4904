//! wavenote - waveform annotation player
//!
//! Entry point for the GUI application. It:
//! 1. Loads the YAML config (volume, display, tempo grid)
//! 2. Launches the iced application
//! 3. Optionally opens an audio file passed on the command line
//!
//! Annotations live in a JSON sidecar next to each audio file and reload
//! live when edited externally.

mod audio;
mod config;
mod loader;
mod store;
mod ui;

use std::path::PathBuf;

use iced::{Size, Subscription, Task};

use ui::{Message, WavenoteApp};

fn main() -> iced::Result {
    // Initialize logger - set RUST_LOG=debug for verbose output
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    log::info!("wavenote starting up");

    let config_path = config::default_config_path();
    let player_config = config::load_config(&config_path);

    let initial_source: Option<PathBuf> = std::env::args().nth(1).map(PathBuf::from);
    if let Some(path) = &initial_source {
        log::info!("Opening {:?} from the command line", path);
    }

    // The boot closure must be Fn; it only runs once, so cloning the
    // captured values per call is fine.
    let boot = move || WavenoteApp::new(player_config.clone(), config_path.clone(), initial_source.clone());

    iced::application(boot, update, view)
        .subscription(subscription)
        .theme(theme)
        .title(title)
        .window_size(Size::new(1100.0, 760.0))
        .run()
}

fn update(app: &mut WavenoteApp, message: Message) -> Task<Message> {
    app.update(message)
}

fn view(app: &WavenoteApp) -> iced::Element<'_, Message> {
    app.view()
}

fn subscription(app: &WavenoteApp) -> Subscription<Message> {
    app.subscription()
}

fn theme(app: &WavenoteApp) -> iced::Theme {
    app.theme()
}

fn title(app: &WavenoteApp) -> String {
    app.title()
}
