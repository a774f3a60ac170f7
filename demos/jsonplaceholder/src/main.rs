//! JSONPlaceholder demo.
//!
//! Declares a small slice of <https://jsonplaceholder.typicode.com> and calls it.
//! Run with `RUST_LOG=fastclient=debug` to see every round trip.

#![allow(missing_docs)]
#![allow(clippy::print_stdout)]

use fastclient::prelude::*;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

// ============================================================================
// Data Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Model)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub user_id: u32,
    pub id: u32,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Model)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub user_id: u32,
    pub title: String,
    pub body: String,
}

// ============================================================================
// Declarative API
// ============================================================================

/// The JSONPlaceholder fake REST API.
#[fastclient(url = "https://jsonplaceholder.typicode.com", user_agent = "jsonplaceholder-demo/0.1.0")]
pub trait JsonPlaceholder {
    /// A single post.
    #[get("/posts/{id}")]
    fn post(&self, #[path(gt = 0)] id: u32) -> fastclient::Result<Post>;

    /// Comments of a post, as raw JSON.
    #[get("/posts/{post_id}/comments")]
    fn comments(&self, #[path(gt = 0)] post_id: u32) -> fastclient::Result<Value>;

    /// Posts of a user, filtered server-side.
    #[get("/posts")]
    fn posts_of(&self, #[query("userId")] user_id: u32) -> fastclient::Result<Value>;

    /// Create a post. The service echoes it back with a new id.
    #[post("/posts")]
    fn create(&self, #[body(embed = false)] post: &NewPost) -> fastclient::Result<Post>;

    /// Update only the title.
    #[patch("/posts/{id}")]
    fn retitle(&self, #[path] id: u32, #[body(min_length = 1)] title: &str) -> fastclient::Result<JsonMap>;

    #[delete("/posts/{id}")]
    fn delete(&self, #[path] id: u32) -> fastclient::Result<Response<Bytes>>;
}

fn main() -> fastclient::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let transport = HyperTransport::builder().with_logging().build()?;
    let api = JsonPlaceholderClient::with_transport(transport)?;
    println!("Base URL: {}", api.base_url());

    let post = api.post(1)?;
    println!("Post #{}: {}", post.id, post.title);

    let comments = api.comments(post.id)?;
    let count = comments.as_array().map_or(0, Vec::len);
    println!("{count} comments on post #{}", post.id);

    let posts = api.posts_of(post.user_id)?;
    println!("User #{} wrote {} posts", post.user_id, posts.as_array().map_or(0, Vec::len));

    let created = api.create(&NewPost {
        user_id: post.user_id,
        title: "Declarative clients".to_string(),
        body: "Bindings, not boilerplate.".to_string(),
    })?;
    println!("Created post #{}", created.id);

    let updated = api.retitle(post.id, "A better title")?;
    println!("Updated title: {}", updated.get("title").unwrap_or(&Value::Null));

    let response = api.delete(post.id)?;
    println!("Delete returned {}", response.status());

    // rejected before anything is sent
    if let Err(err) = api.post(0) {
        println!("Invalid call: {err}");
    }

    match api.post(9999) {
        Ok(post) => println!("Unexpected post: {post:?}"),
        Err(err) if err.status() == Some(404) => println!("Post #9999 does not exist"),
        Err(err) => return Err(err),
    }

    Ok(())
}
