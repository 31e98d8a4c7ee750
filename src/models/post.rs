use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A forum post as the backend returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    /// Markdown source; rendering is up to the caller.
    pub content: String,
    pub username: String,
    pub user_id: i64,

    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_modified_at: Option<DateTime<Utc>>,

    pub likes_count: u32,
    /// Whether the current session has liked this post.
    #[serde(default)]
    pub liked_by_user: bool,
    #[serde(default)]
    pub comments_count: u32,
}

impl Post {
    /// True once the post has been edited after creation.
    pub fn is_edited(&self) -> bool {
        match (self.created_at, self.last_modified_at) {
            (Some(created), Some(modified)) => created != modified,
            _ => false,
        }
    }
}

/// DTO for creating or editing a post. Fields are trimmed on construction.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct PostDraft {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Title length must be between 1 and 100 chars"
    ))]
    pub title: String,

    #[validate(length(
        min = 1,
        max = 5000,
        message = "Content length must be between 1 and 5000 chars"
    ))]
    pub content: String,
}

impl PostDraft {
    pub fn new(title: &str, content: &str) -> Self {
        Self {
            title: title.trim().to_string(),
            content: content.trim().to_string(),
        }
    }
}

/// Result of a like toggle on a post or a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeStatus {
    pub liked: bool,
    pub likes_count: u32,
}

/// `GET /api/posts` wraps the list; older deployments return a bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum PostList {
    Wrapped { posts: Vec<Post> },
    Bare(Vec<Post>),
}

impl From<PostList> for Vec<Post> {
    fn from(list: PostList) -> Self {
        match list {
            PostList::Wrapped { posts } => posts,
            PostList::Bare(posts) => posts,
        }
    }
}

/// Single-post endpoints answer with either `{"post": {...}}` or the bare post.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum PostBody {
    Wrapped { post: Post },
    Bare(Post),
}

impl From<PostBody> for Post {
    fn from(body: PostBody) -> Self {
        match body {
            PostBody::Wrapped { post } => post,
            PostBody::Bare(post) => post,
        }
    }
}
