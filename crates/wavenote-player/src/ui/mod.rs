//! User interface: application state, layout, and message handlers.

pub mod app;
pub mod handlers;
pub mod panel;

pub use app::{Message, WavenoteApp};
