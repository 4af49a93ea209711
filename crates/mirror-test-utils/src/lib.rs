//! Shared test utilities for the drive-mirror workspace.
//!
//! This crate provides standardised fixtures so crate test suites do not
//! each rebuild a fake drive. It is a dev-dependency only: never published.
//!
//! # Modules
//!
//! - [`mirror`]: [`TestMirror`](mirror::TestMirror): a temporary source mount and mirror root
//! - [`source`]: [`MemorySource`](source::MemorySource): a scripted remote listing

pub mod mirror;
pub mod source;
