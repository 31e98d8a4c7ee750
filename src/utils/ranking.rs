// src/utils/ranking.rs

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::models::{comment::Comment, post::Post};

/// Anything shown in a popularity-ranked list.
pub trait Ranked {
    fn likes_count(&self) -> u32;
    fn created_at(&self) -> Option<DateTime<Utc>>;
}

impl Ranked for Post {
    fn likes_count(&self) -> u32 {
        self.likes_count
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }
}

impl Ranked for Comment {
    fn likes_count(&self) -> u32 {
        self.likes_count
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }
}

/// Display order: most likes first, then most recent first.
/// Entries without a timestamp sort after dated ones with the same likes.
pub fn compare<T: Ranked>(a: &T, b: &T) -> Ordering {
    b.likes_count()
        .cmp(&a.likes_count())
        .then_with(|| b.created_at().cmp(&a.created_at()))
}

/// Sorts in place. `sort_by` is stable, so full ties keep their relative order.
pub fn rank<T: Ranked>(items: &mut [T]) {
    items.sort_by(compare);
}
