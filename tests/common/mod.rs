// tests/common/mod.rs
//
// In-memory stand-in for the forum backend, served by axum on a random port.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json, Router,
    extract::{Path, Request, State},
    http::{StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use forum_sync::{
    SyncClient,
    http::ApiTransport,
    session::{MemoryStore, SessionManager},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub type Shared = Arc<Mutex<Backend>>;

const SECRET: &str = "test_secret_for_integration_tests";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Claims {
    pub id: i64,
    pub username: String,
    pub role: String,
    pub exp: usize,
}

pub fn sign_jwt(id: i64, username: &str, role: &str) -> String {
    let claims = Claims {
        id,
        username: username.to_string(),
        role: role.to_string(),
        exp: 4_102_444_800, // 2100-01-01
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

struct UserRow {
    id: i64,
    username: String,
    password: String,
    role: String,
}

struct PostRow {
    id: i64,
    user_id: i64,
    title: String,
    content: String,
    created_at: DateTime<Utc>,
    last_modified_at: DateTime<Utc>,
    likes: HashSet<i64>,
    comments_count: u32,
}

struct CommentRow {
    id: i64,
    post_id: i64,
    user_id: i64,
    content: String,
    created_at: DateTime<Utc>,
    likes: HashSet<i64>,
}

/// A canned response returned once, ahead of routing.
pub struct Forced {
    pub status: StatusCode,
    pub content_type: Option<&'static str>,
    pub body: String,
}

#[derive(Default)]
pub struct Backend {
    users: Vec<UserRow>,
    invite_codes: HashSet<String>,
    posts: BTreeMap<i64, PostRow>,
    comments: BTreeMap<i64, CommentRow>,
    next_id: i64,
    ticks: i64,
    pub forced: Option<Forced>,
    /// When set, login hands out a token that is not a JWT.
    pub issue_garbage_tokens: bool,
    /// Every Authorization header seen, in order (None for anonymous requests).
    pub seen_auth: Vec<Option<String>>,
}

impl Backend {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    /// Strictly increasing timestamps so creation order is unambiguous.
    fn now(&mut self) -> DateTime<Utc> {
        self.ticks += 1;
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(self.ticks)
    }

    pub fn add_user(&mut self, username: &str, password: &str, role: &str) -> i64 {
        let id = self.next_id();
        self.users.push(UserRow {
            id,
            username: username.to_string(),
            password: password.to_string(),
            role: role.to_string(),
        });
        id
    }

    pub fn add_invite(&mut self, code: &str) {
        self.invite_codes.insert(code.to_string());
    }

    pub fn add_post(&mut self, user_id: i64, title: &str, content: &str) -> i64 {
        let id = self.next_id();
        let now = self.now();
        self.posts.insert(
            id,
            PostRow {
                id,
                user_id,
                title: title.to_string(),
                content: content.to_string(),
                created_at: now,
                last_modified_at: now,
                likes: HashSet::new(),
                comments_count: 0,
            },
        );
        id
    }

    pub fn like_post_as(&mut self, post_id: i64, user_id: i64) {
        if let Some(post) = self.posts.get_mut(&post_id) {
            post.likes.insert(user_id);
        }
    }

    pub fn post_likes(&self, post_id: i64) -> usize {
        self.posts.get(&post_id).map_or(0, |p| p.likes.len())
    }

    pub fn comments_count(&self, post_id: i64) -> u32 {
        self.posts.get(&post_id).map_or(0, |p| p.comments_count)
    }

    fn username(&self, user_id: i64) -> String {
        self.users
            .iter()
            .find(|u| u.id == user_id)
            .map(|u| u.username.clone())
            .unwrap_or_default()
    }

    fn post_json(&self, post: &PostRow, viewer: i64) -> Value {
        json!({
            "id": post.id,
            "title": post.title,
            "content": post.content,
            "username": self.username(post.user_id),
            "user_id": post.user_id,
            "created_at": post.created_at,
            "last_modified_at": post.last_modified_at,
            "likes_count": post.likes.len(),
            "liked_by_user": post.likes.contains(&viewer),
            "comments_count": post.comments_count,
        })
    }

    fn comment_json(&self, comment: &CommentRow, viewer: i64) -> Value {
        json!({
            "id": comment.id,
            "post_id": comment.post_id,
            "content": comment.content,
            "username": self.username(comment.user_id),
            "user_id": comment.user_id,
            "created_at": comment.created_at,
            "likes_count": comment.likes.len(),
            "liked_by_user": comment.likes.contains(&viewer),
        })
    }
}

/// Error body in the backend's `{"error": ...}` shape.
struct ApiError(StatusCode, &'static str);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(json!({ "error": self.1 }))).into_response()
    }
}

type Reply = Result<Response, ApiError>;

#[derive(Deserialize)]
struct Credentials {
    username: String,
    password: String,
}

#[derive(Deserialize)]
struct Registration {
    username: String,
    password: String,
    invite_code: String,
}

#[derive(Deserialize)]
struct Draft {
    title: String,
    content: String,
}

#[derive(Deserialize)]
struct CommentDraft {
    content: String,
}

async fn forced_response(State(state): State<Shared>, req: Request, next: Next) -> Response {
    let forced = {
        let mut backend = state.lock().unwrap();
        let auth = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        backend.seen_auth.push(auth);
        backend.forced.take()
    };

    match forced {
        Some(forced) => {
            let mut response = (forced.status, forced.body).into_response();
            response.headers_mut().remove(header::CONTENT_TYPE);
            if let Some(content_type) = forced.content_type {
                response
                    .headers_mut()
                    .insert(header::CONTENT_TYPE, content_type.parse().unwrap());
            }
            response
        }
        None => next.run(req).await,
    }
}

async fn auth_middleware(mut req: Request, next: Next) -> Reply {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(ApiError(StatusCode::UNAUTHORIZED, "Missing token"))?;

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(SECRET.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError(StatusCode::UNAUTHORIZED, "Invalid token"))?
    .claims;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

fn issue_token(backend: &Backend, id: i64, username: &str, role: &str) -> Response {
    let token = if backend.issue_garbage_tokens {
        "definitely-not-a-jwt".to_string()
    } else {
        sign_jwt(id, username, role)
    };
    Json(json!({ "token": token, "type": "Bearer" })).into_response()
}

async fn login(State(state): State<Shared>, Json(payload): Json<Credentials>) -> Reply {
    let backend = state.lock().unwrap();
    let user = backend
        .users
        .iter()
        .find(|u| u.username == payload.username && u.password == payload.password)
        .ok_or(ApiError(StatusCode::UNAUTHORIZED, "Invalid username or password"))?;
    Ok(issue_token(&backend, user.id, &user.username, &user.role))
}

async fn admin_login(State(state): State<Shared>, Json(payload): Json<Credentials>) -> Reply {
    let backend = state.lock().unwrap();
    let user = backend
        .users
        .iter()
        .find(|u| {
            u.username == payload.username && u.password == payload.password && u.role == "admin"
        })
        .ok_or(ApiError(StatusCode::UNAUTHORIZED, "Invalid admin credentials"))?;
    Ok(issue_token(&backend, user.id, &user.username, &user.role))
}

async fn register(State(state): State<Shared>, Json(payload): Json<Registration>) -> Reply {
    let mut backend = state.lock().unwrap();
    if !backend.invite_codes.remove(&payload.invite_code) {
        return Err(ApiError(StatusCode::BAD_REQUEST, "Invalid or used invite code"));
    }
    if backend.users.iter().any(|u| u.username == payload.username) {
        backend.invite_codes.insert(payload.invite_code);
        return Err(ApiError(StatusCode::CONFLICT, "Username already exists"));
    }
    let id = backend.add_user(&payload.username, &payload.password, "user");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "id": id, "username": payload.username, "role": "user" })),
    )
        .into_response())
}

async fn me(State(state): State<Shared>, Extension(claims): Extension<Claims>) -> Reply {
    let backend = state.lock().unwrap();
    let user = backend
        .users
        .iter()
        .find(|u| u.id == claims.id)
        .ok_or(ApiError(StatusCode::NOT_FOUND, "User not found"))?;
    Ok(Json(json!({ "id": user.id, "username": user.username, "role": user.role })).into_response())
}

fn check_draft(draft: &Draft) -> Result<(), ApiError> {
    let title = draft.title.trim().chars().count();
    let content = draft.content.trim().chars().count();
    if !(1..=100).contains(&title) || !(1..=5000).contains(&content) {
        return Err(ApiError(StatusCode::BAD_REQUEST, "Title or content length invalid"));
    }
    Ok(())
}

async fn list_posts(State(state): State<Shared>, Extension(claims): Extension<Claims>) -> Reply {
    let backend = state.lock().unwrap();
    let mut posts: Vec<&PostRow> = backend.posts.values().collect();
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    let posts: Vec<Value> = posts
        .into_iter()
        .map(|p| backend.post_json(p, claims.id))
        .collect();
    Ok(Json(json!({ "posts": posts })).into_response())
}

async fn get_post(
    State(state): State<Shared>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Reply {
    let backend = state.lock().unwrap();
    let post = backend
        .posts
        .get(&id)
        .ok_or(ApiError(StatusCode::NOT_FOUND, "Post not found"))?;
    Ok(Json(backend.post_json(post, claims.id)).into_response())
}

async fn create_post(
    State(state): State<Shared>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<Draft>,
) -> Reply {
    check_draft(&payload)?;
    let mut backend = state.lock().unwrap();
    let id = backend.add_post(claims.id, &payload.title, &payload.content);
    let body = backend.post_json(&backend.posts[&id], claims.id);
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

async fn update_post(
    State(state): State<Shared>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<Draft>,
) -> Reply {
    check_draft(&payload)?;
    let mut backend = state.lock().unwrap();
    let now = backend.now();
    let post = backend
        .posts
        .get_mut(&id)
        .ok_or(ApiError(StatusCode::NOT_FOUND, "Post not found"))?;
    if post.user_id != claims.id {
        return Err(ApiError(StatusCode::FORBIDDEN, "Only the author can edit this post"));
    }
    post.title = payload.title;
    post.content = payload.content;
    post.last_modified_at = now;
    let body = backend.post_json(&backend.posts[&id], claims.id);
    Ok(Json(json!({ "post": body })).into_response())
}

async fn delete_post(
    State(state): State<Shared>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Reply {
    if claims.role != "admin" {
        return Err(ApiError(StatusCode::FORBIDDEN, "Admin only"));
    }
    let mut backend = state.lock().unwrap();
    backend
        .posts
        .remove(&id)
        .ok_or(ApiError(StatusCode::NOT_FOUND, "Post not found"))?;
    backend.comments.retain(|_, c| c.post_id != id);
    Ok(StatusCode::NO_CONTENT.into_response())
}

fn toggle(likes: &mut HashSet<i64>, user_id: i64) -> Value {
    let liked = if likes.remove(&user_id) {
        false
    } else {
        likes.insert(user_id);
        true
    };
    json!({ "liked": liked, "likes_count": likes.len() })
}

async fn toggle_post_like(
    State(state): State<Shared>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Reply {
    let mut backend = state.lock().unwrap();
    let post = backend
        .posts
        .get_mut(&id)
        .ok_or(ApiError(StatusCode::NOT_FOUND, "Post not found"))?;
    Ok(Json(toggle(&mut post.likes, claims.id)).into_response())
}

async fn list_comments(
    State(state): State<Shared>,
    Extension(claims): Extension<Claims>,
    Path(post_id): Path<i64>,
) -> Reply {
    let backend = state.lock().unwrap();
    if !backend.posts.contains_key(&post_id) {
        return Err(ApiError(StatusCode::NOT_FOUND, "Post not found"));
    }
    let comments: Vec<Value> = backend
        .comments
        .values()
        .filter(|c| c.post_id == post_id)
        .map(|c| backend.comment_json(c, claims.id))
        .collect();
    Ok(Json(json!({ "comments": comments })).into_response())
}

async fn create_comment(
    State(state): State<Shared>,
    Extension(claims): Extension<Claims>,
    Path(post_id): Path<i64>,
    Json(payload): Json<CommentDraft>,
) -> Reply {
    if payload.content.trim().is_empty() {
        return Err(ApiError(StatusCode::BAD_REQUEST, "Comment must not be empty"));
    }
    let mut backend = state.lock().unwrap();
    if !backend.posts.contains_key(&post_id) {
        return Err(ApiError(StatusCode::NOT_FOUND, "Post not found"));
    }
    let id = backend.next_id();
    let now = backend.now();
    backend.comments.insert(
        id,
        CommentRow {
            id,
            post_id,
            user_id: claims.id,
            content: payload.content,
            created_at: now,
            likes: HashSet::new(),
        },
    );
    if let Some(post) = backend.posts.get_mut(&post_id) {
        post.comments_count += 1;
    }
    let body = backend.comment_json(&backend.comments[&id], claims.id);
    Ok((StatusCode::CREATED, Json(json!({ "comment": body }))).into_response())
}

async fn toggle_comment_like(
    State(state): State<Shared>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Reply {
    let mut backend = state.lock().unwrap();
    let comment = backend
        .comments
        .get_mut(&id)
        .ok_or(ApiError(StatusCode::NOT_FOUND, "Comment not found"))?;
    Ok(Json(toggle(&mut comment.likes, claims.id)).into_response())
}

async fn delete_comment(
    State(state): State<Shared>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Reply {
    if claims.role != "admin" {
        return Err(ApiError(StatusCode::FORBIDDEN, "Admin only"));
    }
    let mut backend = state.lock().unwrap();
    let comment = backend
        .comments
        .remove(&id)
        .ok_or(ApiError(StatusCode::NOT_FOUND, "Comment not found"))?;
    if let Some(post) = backend.posts.get_mut(&comment.post_id) {
        post.comments_count = post.comments_count.saturating_sub(1);
    }
    Ok(StatusCode::NO_CONTENT.into_response())
}

fn create_router(state: Shared) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/admin/login", post(admin_login))
        .merge(
            Router::new()
                .route("/me", get(me))
                .layer(middleware::from_fn(auth_middleware)),
        );

    let forum_routes = Router::new()
        .route("/api/posts", get(list_posts).post(create_post))
        .route(
            "/api/posts/{id}",
            get(get_post).put(update_post).delete(delete_post),
        )
        .route("/api/posts/{id}/like", post(toggle_post_like))
        .route(
            "/api/posts/{id}/comments",
            get(list_comments).post(create_comment),
        )
        .route("/api/comments/{id}", delete(delete_comment))
        .route("/api/comments/{id}/like", post(toggle_comment_like))
        .layer(middleware::from_fn(auth_middleware));

    Router::new()
        .nest("/api/auth", auth_routes)
        .merge(forum_routes)
        .layer(middleware::from_fn_with_state(state.clone(), forced_response))
        .with_state(state)
}

pub struct TestApp {
    pub address: String,
    pub state: Shared,
}

impl TestApp {
    pub fn backend(&self) -> std::sync::MutexGuard<'_, Backend> {
        self.state.lock().unwrap()
    }

    /// A fresh client with its own empty session slot.
    pub fn client(&self) -> SyncClient {
        let transport = ApiTransport::new(&self.address);
        SyncClient::new(SessionManager::new(transport, MemoryStore::new()))
    }

    /// A client whose slot already holds a token, bypassing login.
    pub fn client_with_token(&self, token: String) -> SyncClient {
        let transport = ApiTransport::new(&self.address);
        SyncClient::new(SessionManager::new(transport, MemoryStore::with_token(token)))
    }

    /// Seeds a user and returns a client logged in as them.
    pub async fn logged_in(&self, username: &str, role: &str) -> (i64, SyncClient) {
        let id = self.backend().add_user(username, "pw", role);
        let client = self.client();
        client.session().login(username, "pw").await.unwrap();
        (id, client)
    }

    pub fn force_next(&self, status: StatusCode, content_type: Option<&'static str>, body: &str) {
        self.backend().forced = Some(Forced {
            status,
            content_type,
            body: body.to_string(),
        });
    }
}

/// Spawns the fake backend on a random port.
pub async fn spawn_app() -> TestApp {
    let state: Shared = Arc::new(Mutex::new(Backend::default()));
    let app = create_router(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp { address, state }
}
