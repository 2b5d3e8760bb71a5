//! Infinite canvas for a content studio: typed items, undo history, a
//! pan/zoom viewport, pointer interactions and browser persistence.

pub mod app;
pub mod canvas;
pub mod components;
pub mod config;
pub mod content;
pub mod error;
pub mod export;
pub mod generation;
pub mod history;
pub mod interaction;
pub mod item;
pub mod persistence;
pub mod store;
pub mod viewport;

pub use config::CanvasConfig;
pub use error::{CanvasError, GenerationError, StorageError};
pub use item::{CanvasItem, ItemKind, ItemPatch, ItemType};
pub use store::{CanvasStore, ItemOverrides};
pub use viewport::{Point, Viewport};
