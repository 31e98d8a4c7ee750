use reqwest::Method;
use validator::Validate;

use super::SyncClient;
use crate::{
    error::AppError,
    models::post::{LikeStatus, Post, PostBody, PostDraft, PostList},
};

impl SyncClient {
    /// List posts in server order. Ranking is the caller's job.
    pub async fn list_posts(&self) -> Result<Vec<Post>, AppError> {
        let list: PostList = self.get("/api/posts").await?.into_json("post list")?;
        Ok(list.into())
    }

    /// Get a single post by ID.
    pub async fn get_post(&self, post_id: i64) -> Result<Post, AppError> {
        let body: PostBody = self
            .get(&format!("/api/posts/{}", post_id))
            .await?
            .into_json("post")?;
        Ok(body.into())
    }

    /// Create a new post. Title and content are trimmed and length-checked
    /// before anything is sent.
    pub async fn create_post(&self, title: &str, content: &str) -> Result<Post, AppError> {
        let draft = PostDraft::new(title, content);
        draft.validate()?;

        let body: PostBody = self
            .send(Method::POST, "/api/posts", Some(&draft))
            .await?
            .into_json("created post")?;
        let post: Post = body.into();

        tracing::info!("Created post {}", post.id);
        Ok(post)
    }

    /// Edit a post. The backend only allows the author to do this.
    pub async fn update_post(
        &self,
        post_id: i64,
        title: &str,
        content: &str,
    ) -> Result<Post, AppError> {
        let draft = PostDraft::new(title, content);
        draft.validate()?;

        let body: PostBody = self
            .send(
                Method::PUT,
                &format!("/api/posts/{}", post_id),
                Some(&draft),
            )
            .await?
            .into_json("updated post")?;
        Ok(body.into())
    }

    /// Delete a post. Admin only.
    pub async fn delete_post(&self, post_id: i64) -> Result<(), AppError> {
        self.require_admin("delete posts")?;
        self.send::<()>(Method::DELETE, &format!("/api/posts/{}", post_id), None)
            .await?;

        tracing::info!("Deleted post {}", post_id);
        Ok(())
    }

    /// Toggle the current session's like on a post.
    pub async fn toggle_post_like(&self, post_id: i64) -> Result<LikeStatus, AppError> {
        self.send::<()>(Method::POST, &format!("/api/posts/{}/like", post_id), None)
            .await?
            .into_json("like status")
    }
}
