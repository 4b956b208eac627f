//! Integration tests for pagesnap
//!
//! These tests verify that multiple components work together correctly.

#[path = "../common/mod.rs"]
pub mod common;

pub mod capture_flow;
pub mod cli;
