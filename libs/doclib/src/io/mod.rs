//! Members of this module interact with the outside world.

pub mod network;
