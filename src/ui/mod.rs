//! Terminal dashboard: event loop, layout, and display formatting

pub mod layout;
pub mod renderer;
pub mod terminal;

pub use terminal::run_ui;
