//! Terminal front-end: row display and keyboard control.

pub mod cell_format;
pub mod input;
pub mod terminal;
