//! Test module for edgelaunch-core
//!
//! This module contains tests for:
//! - The overlay lifecycle (arm, present, finish, pause) and failure handling
//! - Touch routing into launcher coordinates
//! - Concurrent triggers against one controller
//! - Broadcast receivers wired through the event bus
//! - File-backed settings, policy and entries

// Test modules use exact float comparisons
#![allow(clippy::float_cmp)]

mod fixtures;
