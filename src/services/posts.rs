// SPDX-License-Identifier: MIT

//! Live post feed.
//!
//! Replaces the callback-style collection listener with a cancellable,
//! pull-based subscription: the consumer asks for the next snapshot,
//! and dropping the subscription releases it. A subscription cannot
//! outlive its feed (it borrows it), so a torn-down screen cannot leak
//! a live listener.

use std::collections::HashMap;

use tokio::sync::watch;

use crate::error::{AppError, Result};
use crate::models::{Post, PostDraft};
use crate::store::PostStore;

/// Post feed over a [`PostStore`].
pub struct PostFeed<P> {
    store: P,
}

impl<P: PostStore> PostFeed<P> {
    pub fn new(store: P) -> Self {
        Self { store }
    }

    /// Open a snapshot subscription. The first `recv` resolves
    /// immediately with the current list; later calls wait for change.
    pub fn subscribe(&self) -> PostSubscription<'_, P> {
        PostSubscription {
            store: &self.store,
            changes: self.store.changes(),
            last: None,
            primed: false,
        }
    }

    /// Submit a new post. Empty or whitespace-only text is rejected.
    /// The stored post initially carries the client wall clock; the
    /// authoritative server instant arrives with the next snapshot.
    pub async fn submit(&self, text: &str) -> Result<Post> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::BadRequest("post text is empty".to_string()));
        }
        let post = self.store.add_post(&PostDraft::new(text)).await?;
        tracing::debug!(post_id = %post.id, "Post submitted");
        Ok(post)
    }
}

/// A live snapshot subscription.
///
/// Each delivered snapshot is the full current post list reconciled by
/// post id; identical consecutive snapshots are suppressed, so a
/// duplicate delivery from the store never reaches the UI twice.
pub struct PostSubscription<'a, P: PostStore> {
    store: &'a P,
    changes: watch::Receiver<u64>,
    last: Option<Vec<Post>>,
    primed: bool,
}

impl<P: PostStore> PostSubscription<'_, P> {
    /// Next snapshot, or `None` once the feed's change signal is gone.
    pub async fn recv(&mut self) -> Result<Option<Vec<Post>>> {
        loop {
            if self.primed {
                if self.changes.changed().await.is_err() {
                    return Ok(None);
                }
            } else {
                self.primed = true;
            }

            let snapshot = reconcile_by_id(self.store.list_posts().await?);
            if self.last.as_ref() != Some(&snapshot) {
                self.last = Some(snapshot.clone());
                return Ok(Some(snapshot));
            }
        }
    }
}

/// Collapse duplicate post ids to one logical entry, keeping the
/// position of the first occurrence and the content of the last.
/// Posts without an id (not yet assigned by the store) pass through.
fn reconcile_by_id(posts: Vec<Post>) -> Vec<Post> {
    let mut by_id: HashMap<String, usize> = HashMap::new();
    let mut result: Vec<Post> = Vec::with_capacity(posts.len());

    for post in posts {
        if post.id.is_empty() {
            result.push(post);
            continue;
        }
        match by_id.get(&post.id) {
            Some(&index) => result[index] = post,
            None => {
                by_id.insert(post.id.clone(), result.len());
                result.push(post);
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(id: &str, text: &str) -> Post {
        Post {
            id: id.to_string(),
            text: text.to_string(),
            timestamp: None,
        }
    }

    #[test]
    fn reconcile_collapses_duplicate_ids() {
        let posts = vec![post("a", "one"), post("b", "two"), post("a", "one v2")];
        let reconciled = reconcile_by_id(posts);

        assert_eq!(reconciled.len(), 2);
        assert_eq!(reconciled[0].id, "a");
        assert_eq!(reconciled[0].text, "one v2");
        assert_eq!(reconciled[1].id, "b");
    }

    #[test]
    fn reconcile_keeps_unkeyed_posts() {
        let posts = vec![post("", "local draft"), post("", "another")];
        assert_eq!(reconcile_by_id(posts).len(), 2);
    }

    #[test]
    fn reconcile_preserves_insertion_order() {
        let posts = vec![post("x", "1"), post("y", "2"), post("z", "3")];
        let ids: Vec<_> = reconcile_by_id(posts).into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["x", "y", "z"]);
    }
}
