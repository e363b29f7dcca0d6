//! Core types and trait definitions for the olympiad enrollment workflow.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! The consensus and area-cap rules live here as pure functions so every
//! backend applies them identically.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod call;
pub mod cap;
pub mod catalog;
pub mod consensus;
pub mod enrollment;
pub mod error;
pub mod identity;
pub mod notification;
pub mod store;

pub use error::{Error, Result};
