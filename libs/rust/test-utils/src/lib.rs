//! Shared test utilities for token-core.
//!
//! This crate provides:
//! - Proptest generators for claims and lifetimes
//! - Key fixtures generated with OpenSSL

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

pub use generators::*;
