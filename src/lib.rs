pub mod app;
pub mod cli;
pub mod config;
pub mod editor;
pub mod events;
pub mod grouping;
pub mod list;
pub mod selection;
pub mod source;
pub mod toast;
pub mod ui;

pub use config::{AppConfig, ConfigLoader, ConfigPaths};
pub use list::{ListType, VirtualList};
pub use source::{JsonLibrary, NoteSource};
