// SPDX-License-Identifier: MIT

//! Data models for the application.

pub mod post;
pub mod session;
pub mod user;

pub use post::{Post, PostDraft};
pub use session::Session;
pub use user::{ProfileUpdate, UserProfile};
