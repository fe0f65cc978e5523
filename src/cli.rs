//! Command line front end: argument definitions, event rendering and the
//! commands themselves.

pub mod args;
pub mod commands;
pub mod render;

pub use args::{ArchiveArgs, Cli, Command, PageArgs, PrefsArgs};
pub use commands::execute;
pub use render::render_event;
