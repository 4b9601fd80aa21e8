//! Mock device implementations for testing and development.
//!
//! This module provides simulated tags that can be controlled
//! programmatically without requiring physical hardware.

pub mod t2_tag;

pub use t2_tag::{MOCK_ATR, MOCK_CC, MOCK_UID, MockPresence, MockT2Tag};
