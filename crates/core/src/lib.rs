//! param_sync_core - Pure no_std parameter types for the param_sync engine
//!
//! This crate contains the platform-agnostic value model for cached device
//! parameters. It has no locking, no I/O and no logging, so it can be tested
//! on host without any feature flags.
//!
//! # Design Principles
//!
//! - **Zero cfg**: No `#[cfg(feature = ...)]` directives allowed
//! - **Pure no_std**: Only `core` and `alloc`
//! - **Explicit kinds**: Every value carries a kind tag with its own coercion
//!
//! # Modules
//!
//! - [`parameters`]: Value kinds, coercion and the `Parameter` holder

#![no_std]

extern crate alloc;

pub mod parameters;
