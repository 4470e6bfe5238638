//! Report generation module.
//!
//! JSON exports and Markdown/text chart rendering.

pub mod generator;

pub use generator::*;
