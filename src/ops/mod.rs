pub mod brush;
pub mod canvas_ops;
pub mod clipboard;
pub mod fill;
pub mod geometry;
pub mod selection;
pub mod shapes;
pub mod transform;
