pub mod bulk;
pub mod drag;
pub mod events;
pub mod file;
pub mod listing;
pub mod logging;
pub mod progress;
pub mod selection;
