//! Process-level helpers shared by the server and the dashboard

pub mod signals;

pub use signals::shutdown_signal;
