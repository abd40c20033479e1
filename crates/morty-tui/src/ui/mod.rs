//! Terminal UI module using ratatui.
//!
//! - `render`: frame layout, title and status bars, overlays
//! - `input`: keyboard event handling
//! - `styles`: dark and light palettes
//! - `pages`: the characters list and the character details page

pub mod input;
pub mod pages;
pub mod render;
pub mod styles;
