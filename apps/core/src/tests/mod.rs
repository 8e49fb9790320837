//! Test Module
//!
//! Cross-module suites for the companion core.
//!
//! ## Test Categories
//! - `companion_tests`: turn pipeline, streak, journal and registry behavior over stub models
//! - `integration_tests`: full workflows over JSON artifacts loaded from disk

pub mod integration_tests;
