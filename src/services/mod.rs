// SPDX-License-Identifier: MIT

//! Services module - sync policy and remote collaborators.

pub mod blobs;
pub mod identity;
pub mod posts;
pub mod sync;

pub use blobs::{BlobStore, FirebaseStorage, MemoryBlobs};
pub use identity::{FirebaseAuth, IdentityProvider, MemoryIdentity};
pub use posts::{PostFeed, PostSubscription};
pub use sync::{DeleteStep, DeletionReport, ProfileSync};
