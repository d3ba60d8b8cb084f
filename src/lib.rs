//! PixelSmith pixel-art editing engine.
//!
//! [`editor::EditorState`] owns the pixel grid, undo history, selection and
//! tool settings; hosts feed it pointer events in grid coordinates.

pub mod logger;

pub mod canvas;
pub mod cli;
pub mod components;
pub mod editor;
pub mod io;
pub mod ops;
pub mod settings;
pub mod viewport;

pub use canvas::{Color, GridSize, PixelBuffer, Point, Rect, SelectionMask};
pub use editor::EditorState;
