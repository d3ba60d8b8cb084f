pub mod colors;
pub mod history;
pub mod palette;
pub mod tools;
