//! Utils module - Shared utilities and helpers
//!
//! This module provides utility functions and helpers that are used across
//! multiple layers of the application architecture.

/// Error conversion helpers for reqwest/serde/io errors
pub mod error_helpers;

/// Logger setup and verbose output
pub mod logging;

/// Text sanitizing, masking and truncation
pub mod text;

/// API key, URL and parameter validation
pub mod validation;
