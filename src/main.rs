// src/main.rs

use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use forum_sync::{
    SyncClient,
    config::Config,
    feed::{CommentThread, Feed},
    http::ApiTransport,
    models::{comment::Comment, post::Post},
    session::{FileStore, SessionManager},
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "forum", version, about = "Command-line client for the discussion forum")]
struct Cli {
    /// Base URL of the forum API (overrides FORUM_API_BASE_URL).
    #[arg(long, global = true)]
    api: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and remember the session
    Login { username: String, password: String },
    /// Log in through the admin endpoint
    AdminLogin { username: String, password: String },
    /// Register with an invite code, then log in
    Register {
        username: String,
        password: String,
        invite_code: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the stored session and what the server thinks of it
    Whoami,
    /// List posts, most liked first
    Posts,
    /// Show a post with its comments
    Show { post_id: i64 },
    /// Publish a new post
    Post { title: String, content: String },
    /// Edit one of your posts
    Edit {
        post_id: i64,
        title: String,
        content: String,
    },
    /// Delete a post (admin)
    Delete { post_id: i64 },
    /// Toggle your like on a post
    Like { post_id: i64 },
    /// Comment on a post
    Comment { post_id: i64, content: String },
    /// Toggle your like on a comment
    LikeComment { comment_id: i64 },
    /// Delete a comment (admin)
    DeleteComment { comment_id: i64 },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file (if present) before clap reads the environment
    dotenv().ok();
    let cli = Cli::parse();

    let config = Config::from_env_with(cli.api.as_deref())?;

    let _guard = init_tracing(&config);

    let transport = ApiTransport::new(&config.api_base_url);
    let session = SessionManager::new(transport, FileStore::new(&config.session_dir));
    let client = SyncClient::new(session);

    run(&client, cli.command).await
}

/// Stderr always; a daily-rolling file too when a log directory is configured.
fn init_tracing(config: &Config) -> Option<WorkerGuard> {
    let env_filter = EnvFilter::new(&config.rust_log);
    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::daily(dir, "forum.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer().with_writer(non_blocking).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    guard
}

async fn run(client: &SyncClient, command: Command) -> anyhow::Result<()> {
    let session = client.session();

    match command {
        Command::Login { username, password } => {
            let s = session.login(&username, &password).await?;
            println!("Logged in as {} ({})", s.username, s.role.as_str());
        }
        Command::AdminLogin { username, password } => {
            let s = session.admin_login(&username, &password).await?;
            println!("Logged in as {} ({})", s.username, s.role.as_str());
        }
        Command::Register {
            username,
            password,
            invite_code,
        } => {
            session.register(&username, &password, &invite_code).await?;
            let s = session.login(&username, &password).await?;
            println!("Registered and logged in as {}", s.username);
        }
        Command::Logout => {
            session.logout()?;
            println!("Logged out");
        }
        Command::Whoami => match session.current_session() {
            Some(s) => {
                let me = session.current_user().await?;
                println!(
                    "{} (id {}, {}); server confirms {}",
                    s.username,
                    s.user_id,
                    s.role.as_str(),
                    me.username
                );
            }
            None => println!("Not logged in"),
        },
        Command::Posts => {
            let feed = Feed::new(client.list_posts().await?);
            if feed.is_empty() {
                println!("No posts yet");
            }
            for post in feed.items() {
                print_post_line(post);
            }
        }
        Command::Show { post_id } => {
            let mut thread = CommentThread::new(client.get_post(post_id).await?);
            thread.load_comments(client.list_comments(post_id).await?);
            print_thread(&thread);
        }
        Command::Post { title, content } => {
            let post = client.create_post(&title, &content).await?;
            println!("Published #{}: {}", post.id, post.title);
        }
        Command::Edit {
            post_id,
            title,
            content,
        } => {
            let post = client.update_post(post_id, &title, &content).await?;
            println!("Updated #{}: {}", post.id, post.title);
        }
        Command::Delete { post_id } => {
            client.delete_post(post_id).await?;
            println!("Deleted post #{}", post_id);
        }
        Command::Like { post_id } => {
            let mut thread = CommentThread::new(client.get_post(post_id).await?);
            let ticket = thread.begin_post_like();
            match client.toggle_post_like(post_id).await {
                Ok(status) => {
                    thread.settle_post_like(ticket, status);
                }
                Err(e) => {
                    thread.abandon_post_like(ticket);
                    return Err(e.into());
                }
            }
            let post = thread.post();
            let verb = if post.liked_by_user { "Liked" } else { "Unliked" };
            println!("{} #{} ({} likes)", verb, post.id, post.likes_count);
        }
        Command::Comment { post_id, content } => {
            let comment = client.create_comment(post_id, &content).await?;
            println!("Commented #{} on post #{}", comment.id, comment.post_id);
        }
        Command::LikeComment { comment_id } => {
            let status = client.toggle_comment_like(comment_id).await?;
            let verb = if status.liked { "Liked" } else { "Unliked" };
            println!("{} comment #{} ({} likes)", verb, comment_id, status.likes_count);
        }
        Command::DeleteComment { comment_id } => {
            client.delete_comment(comment_id).await?;
            println!("Deleted comment #{}", comment_id);
        }
    }

    Ok(())
}

fn format_time(time: Option<chrono::DateTime<chrono::Utc>>) -> String {
    time.map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

fn print_post_line(post: &Post) {
    let heart = if post.liked_by_user { "♥" } else { "♡" };
    println!(
        "#{:<5} {} {:<4} 💬 {:<4} {}  by {} on {}",
        post.id,
        heart,
        post.likes_count,
        post.comments_count,
        post.title,
        post.username,
        format_time(post.created_at)
    );
}

fn print_comment(comment: &Comment) {
    let heart = if comment.liked_by_user { "♥" } else { "♡" };
    println!(
        "  #{:<5} {} {:<4} {} ({})",
        comment.id,
        heart,
        comment.likes_count,
        comment.username,
        format_time(comment.created_at)
    );
    for line in comment.content.lines() {
        println!("      {}", line);
    }
}

fn print_thread(thread: &CommentThread) {
    let post = thread.post();
    print_post_line(post);
    if post.is_edited() {
        println!("        edited {}", format_time(post.last_modified_at));
    }
    println!();
    println!("{}", post.content);
    println!();
    println!("{} comments", post.comments_count);
    for comment in thread.comments() {
        print_comment(comment);
    }
}
