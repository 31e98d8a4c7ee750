// src/feed.rs

//! Locally held copies of posts and comments.
//!
//! Mutations are applied provisionally for snappy display, then overwritten
//! with whatever the server returns. Nothing here merges: the last canonical
//! response for an entity wins, toggles still in flight are replayed on top
//! of it, and responses to superseded like toggles are dropped.

use std::collections::{BTreeSet, HashMap};

use crate::{
    models::{
        comment::Comment,
        post::{LikeStatus, Post},
    },
    utils::ranking::{Ranked, rank},
};

/// An entity carrying a like toggle.
pub trait Likeable: Ranked {
    fn id(&self) -> i64;
    fn liked(&self) -> bool;
    fn set_like(&mut self, liked: bool, likes_count: u32);

    /// Flips the like locally; the count never drops below zero.
    fn toggle_provisionally(&mut self) {
        let liked = !self.liked();
        let count = if liked {
            self.likes_count().saturating_add(1)
        } else {
            self.likes_count().saturating_sub(1)
        };
        self.set_like(liked, count);
    }
}

impl Likeable for Post {
    fn id(&self) -> i64 {
        self.id
    }

    fn liked(&self) -> bool {
        self.liked_by_user
    }

    fn set_like(&mut self, liked: bool, likes_count: u32) {
        self.liked_by_user = liked;
        self.likes_count = likes_count;
    }
}

impl Likeable for Comment {
    fn id(&self) -> i64 {
        self.id
    }

    fn liked(&self) -> bool {
        self.liked_by_user
    }

    fn set_like(&mut self, liked: bool, likes_count: u32) {
        self.liked_by_user = liked;
        self.likes_count = likes_count;
    }
}

/// Handle for one in-flight like toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeTicket {
    pub id: i64,
    seq: u64,
}

/// Tracks in-flight like toggles per entity so a late response cannot undo a
/// newer one. Only unresolved tickets are held.
#[derive(Debug, Default)]
struct LikeLedger {
    next_seq: u64,
    pending: HashMap<i64, BTreeSet<u64>>,
}

impl LikeLedger {
    fn issue(&mut self, id: i64) -> LikeTicket {
        self.next_seq += 1;
        self.pending.entry(id).or_default().insert(self.next_seq);
        LikeTicket {
            id,
            seq: self.next_seq,
        }
    }

    /// Resolves a ticket with a canonical result. Returns how many newer
    /// toggles are still in flight, or `None` if the response is stale.
    /// Older tickets are dropped: the canonical state already covers them.
    fn settle(&mut self, ticket: LikeTicket) -> Option<usize> {
        let Some(pending) = self.pending.get_mut(&ticket.id) else {
            tracing::debug!("Ignoring stale like response for {}", ticket.id);
            return None;
        };
        if !pending.contains(&ticket.seq) {
            tracing::debug!("Ignoring stale like response for {}", ticket.id);
            return None;
        }
        pending.retain(|seq| *seq > ticket.seq);
        let newer = pending.len();
        if newer == 0 {
            self.pending.remove(&ticket.id);
        }
        Some(newer)
    }

    /// Resolves a failed ticket. True if its provisional toggle must be reverted.
    fn abandon(&mut self, ticket: LikeTicket) -> bool {
        let Some(pending) = self.pending.get_mut(&ticket.id) else {
            return false;
        };
        let reverted = pending.remove(&ticket.seq);
        if pending.is_empty() {
            self.pending.remove(&ticket.id);
        }
        reverted
    }

    fn forget(&mut self, id: i64) {
        self.pending.remove(&id);
    }

    fn clear(&mut self) {
        self.pending.clear();
    }
}

/// A ranked list of posts or comments.
#[derive(Debug)]
pub struct Feed<T> {
    items: Vec<T>,
    likes: LikeLedger,
}

impl<T> Default for Feed<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            likes: LikeLedger::default(),
        }
    }
}

impl<T: Likeable> Feed<T> {
    pub fn new(items: Vec<T>) -> Self {
        let mut feed = Self::default();
        feed.replace_all(items);
        feed
    }

    /// Items in display order.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: i64) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Swaps in a freshly fetched list. Toggles still in flight are dropped.
    pub fn replace_all(&mut self, items: Vec<T>) {
        self.likes.clear();
        self.items = items;
        rank(&mut self.items);
    }

    /// Overwrites the local copy with the canonical entity, inserting it if new.
    /// Returns true if the entity was not present before.
    pub fn upsert(&mut self, item: T) -> bool {
        let index = self.items.iter().position(|existing| existing.id() == item.id());
        let inserted = match index {
            Some(index) => {
                self.likes.forget(item.id());
                self.items[index] = item;
                false
            }
            None => {
                self.items.push(item);
                true
            }
        };
        rank(&mut self.items);
        inserted
    }

    pub fn remove(&mut self, id: i64) -> Option<T> {
        let index = self.items.iter().position(|item| item.id() == id)?;
        self.likes.forget(id);
        Some(self.items.remove(index))
    }

    /// Applies a provisional like toggle. `None` if the entity is not held locally.
    pub fn begin_like(&mut self, id: i64) -> Option<LikeTicket> {
        let item = self.items.iter_mut().find(|item| item.id() == id)?;
        item.toggle_provisionally();
        let ticket = self.likes.issue(id);
        rank(&mut self.items);
        Some(ticket)
    }

    /// Writes the server's like state, replaying any newer toggles still in
    /// flight. Returns false when the response was stale or the entity is gone.
    pub fn settle_like(&mut self, ticket: LikeTicket, status: LikeStatus) -> bool {
        let Some(index) = self.items.iter().position(|item| item.id() == ticket.id) else {
            return false;
        };
        let Some(newer) = self.likes.settle(ticket) else {
            return false;
        };
        let item = &mut self.items[index];
        item.set_like(status.liked, status.likes_count);
        for _ in 0..newer {
            item.toggle_provisionally();
        }
        rank(&mut self.items);
        true
    }

    /// Rolls back a provisional toggle whose request failed. Nothing happens
    /// if a newer toggle has already settled.
    pub fn abandon_like(&mut self, ticket: LikeTicket) -> bool {
        let Some(index) = self.items.iter().position(|item| item.id() == ticket.id) else {
            return false;
        };
        if !self.likes.abandon(ticket) {
            return false;
        }
        self.items[index].toggle_provisionally();
        rank(&mut self.items);
        true
    }
}

/// A post opened in detail view together with its comments.
#[derive(Debug)]
pub struct CommentThread {
    post: Post,
    comments: Feed<Comment>,
    post_likes: LikeLedger,
}

impl CommentThread {
    pub fn new(post: Post) -> Self {
        Self {
            post,
            comments: Feed::default(),
            post_likes: LikeLedger::default(),
        }
    }

    pub fn post(&self) -> &Post {
        &self.post
    }

    pub fn comments(&self) -> &[Comment] {
        self.comments.items()
    }

    /// Overwrites the post with its canonical copy (after get or edit).
    pub fn replace_post(&mut self, post: Post) {
        self.post_likes.clear();
        self.post = post;
    }

    /// Installs the full comment list; the post's count follows it.
    pub fn load_comments(&mut self, comments: Vec<Comment>) {
        self.comments.replace_all(comments);
        self.post.comments_count = self.comments.len() as u32;
    }

    /// Adds a comment the server just created. Returns true if it was new to
    /// the thread; comments on other posts are ignored.
    pub fn add_comment(&mut self, comment: Comment) -> bool {
        if comment.post_id != self.post.id {
            tracing::warn!(
                "Ignoring comment {} for post {} in thread of post {}",
                comment.id,
                comment.post_id,
                self.post.id
            );
            return false;
        }
        let inserted = self.comments.upsert(comment);
        if inserted {
            self.post.comments_count = self.post.comments_count.saturating_add(1);
        }
        inserted
    }

    /// Drops a comment the server just deleted.
    pub fn remove_comment(&mut self, comment_id: i64) -> Option<Comment> {
        let removed = self.comments.remove(comment_id)?;
        self.post.comments_count = self.post.comments_count.saturating_sub(1);
        Some(removed)
    }

    pub fn begin_post_like(&mut self) -> LikeTicket {
        self.post.toggle_provisionally();
        self.post_likes.issue(self.post.id)
    }

    pub fn settle_post_like(&mut self, ticket: LikeTicket, status: LikeStatus) -> bool {
        if ticket.id != self.post.id {
            return false;
        }
        let Some(newer) = self.post_likes.settle(ticket) else {
            return false;
        };
        self.post.set_like(status.liked, status.likes_count);
        for _ in 0..newer {
            self.post.toggle_provisionally();
        }
        true
    }

    pub fn abandon_post_like(&mut self, ticket: LikeTicket) -> bool {
        if ticket.id != self.post.id || !self.post_likes.abandon(ticket) {
            return false;
        }
        self.post.toggle_provisionally();
        true
    }

    pub fn begin_comment_like(&mut self, comment_id: i64) -> Option<LikeTicket> {
        self.comments.begin_like(comment_id)
    }

    pub fn settle_comment_like(&mut self, ticket: LikeTicket, status: LikeStatus) -> bool {
        self.comments.settle_like(ticket, status)
    }

    pub fn abandon_comment_like(&mut self, ticket: LikeTicket) -> bool {
        self.comments.abandon_like(ticket)
    }
}
