//! Rendering of results and the surfaces they are shown on.

pub mod console;
pub mod document;
pub mod render;
pub mod terminal;
