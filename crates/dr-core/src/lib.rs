//! dr-core: Shared types, traits, and utilities for deep-reverb
//!
//! This crate provides the foundational types used by the DSP crate:
//! the [`Sample`] trait with its per-type vector kernels, error types,
//! processing specs and the serde configuration of the reverb.

mod config;
mod denormal;
mod error;
mod sample;

pub use config::*;
pub use denormal::*;
pub use error::*;
pub use sample::*;
