use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A comment under a post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub content: String,
    pub username: String,
    #[serde(default)]
    pub user_id: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub likes_count: u32,
    #[serde(default)]
    pub liked_by_user: bool,
}

/// DTO for creating a new comment.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct CommentDraft {
    #[validate(length(min = 1, message = "Comment must not be empty"))]
    pub content: String,
}

impl CommentDraft {
    pub fn new(content: &str) -> Self {
        Self {
            content: content.trim().to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum CommentList {
    Wrapped { comments: Vec<Comment> },
    Bare(Vec<Comment>),
}

impl From<CommentList> for Vec<Comment> {
    fn from(list: CommentList) -> Self {
        match list {
            CommentList::Wrapped { comments } => comments,
            CommentList::Bare(comments) => comments,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum CommentBody {
    Wrapped { comment: Comment },
    Bare(Comment),
}

impl From<CommentBody> for Comment {
    fn from(body: CommentBody) -> Self {
        match body {
            CommentBody::Wrapped { comment } => comment,
            CommentBody::Bare(comment) => comment,
        }
    }
}
