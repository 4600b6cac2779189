//! Media library presentation engine.
//!
//! A library snapshot is rendered by one of three presentations sharing the
//! [`library::Presentation`] contract: a searchable flat list, a path-derived
//! tree with folder aggregates and sorting, and a poster grid with staged,
//! viewport-driven image loading.

pub mod config;
pub mod error;
pub mod host;
pub mod images;
pub mod library;
pub mod logging;
pub mod model;
pub mod snapshot;

pub use error::{Result, ViewError};
