use anyhow::Result;
use clap::{Parser, Subcommand};
use inkpress::app::App;
use inkpress::content::ImageSource;
use inkpress::models::{Post, PostStatus};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "inkpress")]
#[command(about = "Publish and manage blog posts on a hosted backend")]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create an account and log straight in.
    Register {
        email: String,
        /// Display name for the new account.
        #[arg(long)]
        name: String,
        #[arg(long)]
        password: String,
    },
    /// Open a session for an existing account.
    Login {
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Invalidate all sessions for the current account.
    Logout,
    /// Print the account bound to the active session.
    Whoami,
    /// Publish a new post with a featured image.
    Publish {
        title: String,
        #[arg(long)]
        content: String,
        /// Publication status: active or inactive.
        #[arg(long, default_value = "active", value_parser = parse_status)]
        status: PostStatus,
        /// Path to the featured image file.
        #[arg(long)]
        image: PathBuf,
    },
    /// Edit an existing post; omitted options keep their stored values.
    Edit {
        slug: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long, value_parser = parse_status)]
        status: Option<PostStatus>,
        /// Replacement featured image.
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Print one post with its image link.
    Show { slug: String },
    /// List posts, published only unless --all is given.
    List {
        #[arg(long)]
        all: bool,
    },
    /// Delete a post and its featured image.
    Delete {
        slug: String,
        /// Required confirmation; deletion is permanent.
        #[arg(long)]
        yes: bool,
    },
}

fn parse_status(input: &str) -> std::result::Result<PostStatus, String> {
    input.parse().map_err(|err: inkpress::Error| err.to_string())
}

fn print_post(post: &Post) {
    println!("{}  [{}]  {}", post.slug, post.status, post.title);
}

async fn run_command(app: &App, command: Command) -> inkpress::Result<()> {
    match command {
        Command::Register {
            email,
            name,
            password,
        } => {
            let account = app.register(&email, &password, &name).await?;
            println!("Registered and logged in as {} <{}>", account.name, account.email);
        }
        Command::Login { email, password } => {
            let account = app.login(&email, &password).await?;
            println!("Logged in as {} <{}>", account.name, account.email);
        }
        Command::Logout => {
            app.logout().await;
            println!("Logged out");
        }
        Command::Whoami => match app.whoami().await? {
            Some(account) => println!("{} <{}>", account.name, account.email),
            None => println!("Not logged in"),
        },
        Command::Publish {
            title,
            content,
            status,
            image,
        } => {
            let post = app.publish_post(&title, &content, status, &image).await?;
            println!("Published {}", post.slug);
        }
        Command::Edit {
            slug,
            title,
            content,
            status,
            image,
        } => {
            let post = app
                .edit_post(
                    &slug,
                    title.as_deref(),
                    content.as_deref(),
                    status,
                    image.as_deref(),
                )
                .await?;
            println!("Updated {}", post.slug);
        }
        Command::Show { slug } => match app.show_post(&slug).await? {
            Some((post, image)) => {
                println!("{} [{}]", post.title, post.status);
                println!("by {} on {}", post.owner_id, post.created_at.format("%Y-%m-%d"));
                match image {
                    ImageSource::View(url) => println!("image: {}", url),
                    ImageSource::Download(url) => println!("image unavailable; download: {}", url),
                    ImageSource::Unavailable => println!("image unavailable"),
                    ImageSource::Missing => {}
                }
                println!();
                println!("{}", post.content);
            }
            // A missing post renders an empty state rather than an error.
            None => println!("No post with slug '{}'", slug),
        },
        Command::List { all } => {
            let posts = app.list_posts(all).await?;
            if posts.is_empty() {
                println!("No posts");
            } else {
                for post in &posts {
                    print_post(post);
                }
            }
        }
        Command::Delete { slug, yes } => {
            if !yes {
                return Err(inkpress::Error::Validation(format!(
                    "deleting '{}' is permanent; pass --yes to confirm",
                    slug
                )));
            }
            app.delete_post(&slug).await?;
            println!("Deleted {}", slug);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inkpress=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();

    match App::from_env() {
        Ok(app) => match run_command(&app, args.command).await {
            Ok(()) => {
                info!("Done");
                Ok(())
            }
            Err(e) => {
                error!("{}", e);
                std::process::exit(1);
            }
        },
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    }
}
