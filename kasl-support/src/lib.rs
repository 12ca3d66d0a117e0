//! # Kasl Support
//!
//! Shared utilities for the Kasl DI framework.
//!
//! This crate provides:
//! - The reserved service names and name casing (used by both the
//!   container at runtime and the derive macro at compile time)
//! - Text rendering for error messages

pub mod naming;
pub mod rendering;
