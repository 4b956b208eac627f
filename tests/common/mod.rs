//! Shared test utilities for pagesnap
//!
//! - HTML and document fixtures
//! - Recording controller, sink and UI doubles

#![allow(dead_code)]

pub mod fixtures;
pub mod recording;
