//! # Slides
//!
//! The slideshow's working set: image items with their per-slide settings,
//! the ordered list that edits them, the loader that fits images onto the
//! canvas, and the project file that saves it all.

pub mod item;
pub mod list;
pub mod loader;
pub mod project;

pub use item::ImageItem;
pub use list::SlideList;
pub use loader::{fit_within, ImageLoader, SUPPORTED_EXTENSIONS};
pub use project::Project;
