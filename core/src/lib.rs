//! # Sweepr Core
//!
//! The scan engine. Everything that touches the network or interprets what came back
//! lives here:
//!
//! * **[`network`]**: the per-port TCP connect probe.
//! * **[`classify`]**: banner and port based service detection plus the OS heuristic.
//! * **[`scanner`]**: the bounded-concurrency scheduler and its DNS collaborator.
//! * **[`summary`]** and **[`export`]**: read-only folds over finished results.

pub mod classify;
pub mod export;
pub mod network;
pub mod scanner;
pub mod summary;
