//! Full-screen ratatui front end bound to the session controller.

pub mod action;
pub mod app;
pub mod chat;
pub mod event;
pub mod sidebar;
pub mod theme;

#[cfg(test)]
pub(crate) mod test_gateway;

pub use event::run_tui;
