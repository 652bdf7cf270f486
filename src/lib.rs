// SPDX-License-Identifier: MIT

//! GrowLog client sync core.
//!
//! This crate owns the profile synchronization policy of the GrowLog
//! volunteer app: how the authoritative remote profile, the on-device
//! mirror and the in-memory state handed to the UI are kept consistent
//! across restarts, edits, sign-outs and account deletion, plus the
//! live post-feed subscription. Presentation is out of scope; screens
//! call into [`services::ProfileSync`] and [`services::PostFeed`] and
//! render what comes back.

pub mod config;
pub mod error;
pub mod mirror;
pub mod models;
pub mod services;
pub mod store;

pub use error::{AppError, Result};
