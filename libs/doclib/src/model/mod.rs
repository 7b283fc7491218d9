pub mod api;
pub mod compliance;
pub mod core_config;
pub mod drag;
pub mod entry;
pub mod errors;
pub mod path_ops;
pub mod store;
