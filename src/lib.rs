pub mod animation;
pub mod camera;
pub mod changes;
pub mod config;
pub mod editor;
pub mod error;
pub mod math;
pub mod pose;
pub mod project;
pub mod scene;
pub mod selection_set;
pub mod undo;
pub mod view;

pub use editor::{ActiveView, Editor};
pub use error::{EngineError, Result};
