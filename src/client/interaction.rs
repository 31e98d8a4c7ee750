use reqwest::Method;
use validator::Validate;

use super::SyncClient;
use crate::{
    error::AppError,
    models::{
        comment::{Comment, CommentBody, CommentDraft, CommentList},
        post::LikeStatus,
    },
};

impl SyncClient {
    /// List all comments for a post.
    pub async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>, AppError> {
        let list: CommentList = self
            .get(&format!("/api/posts/{}/comments", post_id))
            .await?
            .into_json("comment list")?;
        Ok(list.into())
    }

    /// Create a new comment. Blank content never reaches the backend.
    pub async fn create_comment(&self, post_id: i64, content: &str) -> Result<Comment, AppError> {
        let draft = CommentDraft::new(content);
        draft.validate()?;

        let body: CommentBody = self
            .send(
                Method::POST,
                &format!("/api/posts/{}/comments", post_id),
                Some(&draft),
            )
            .await?
            .into_json("created comment")?;
        Ok(body.into())
    }

    /// Toggle Like on a comment.
    pub async fn toggle_comment_like(&self, comment_id: i64) -> Result<LikeStatus, AppError> {
        self.send::<()>(
            Method::POST,
            &format!("/api/comments/{}/like", comment_id),
            None,
        )
        .await?
        .into_json("like status")
    }

    /// Delete a comment. Admin only.
    pub async fn delete_comment(&self, comment_id: i64) -> Result<(), AppError> {
        self.require_admin("delete comments")?;
        self.send::<()>(
            Method::DELETE,
            &format!("/api/comments/{}", comment_id),
            None,
        )
        .await?;

        tracing::info!("Deleted comment {}", comment_id);
        Ok(())
    }
}
