//! Cross-module tests for the selection engine.
//!
//! These tests drive several modules together (producer, selection,
//! compositor, export, blink) the way an interactive front end would.

mod pipeline_tests;
mod scenario_tests;
