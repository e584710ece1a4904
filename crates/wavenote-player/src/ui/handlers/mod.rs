//! Message handlers, grouped by domain. Each module adds `impl WavenoteApp`
//! blocks; `update` in `ui/app.rs` dispatches into them.

pub mod annotation;
pub mod source;
pub mod tempo;
pub mod tick;
pub mod timeline;
