//! Derive macros for Kasl, re-exported from `kasl-macros`.

pub use kasl_macros::*;
