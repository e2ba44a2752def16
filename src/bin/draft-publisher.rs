//! Draft Publisher CLI
//!
//! Write drafts locally, publish them to a GitHub repository as Markdown posts

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use draft_publisher::{
    BatchPublishResult, ConfigLoadOptions, ConfigLoader, DraftPatch, DraftStore, GitHubFileStore,
    JsonDraftStore, MemoryFileStore, NewDraft, PublishCoordinator, PublishError, PublisherConfig,
    RemoteConfig, RemoteFileStore, SecureTokenManager,
};
use secrecy::ExposeSecret;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

/// Page served by the simulated remote
const WELCOME_PATH: &str = "hello.md";
const WELCOME_CONTENT: &str = "# Hello\n\nThis is simulated remote content. Configure \
remote.owner, remote.repo and GITHUB_TOKEN to publish to a real repository.";

/// Publish local drafts as Markdown posts to a GitHub repository
#[derive(Parser)]
#[command(name = "draft-publisher")]
#[command(version = "0.1.0")]
#[command(about = "Publish local drafts as Markdown posts to a GitHub repository", long_about = None)]
struct Cli {
    /// Project path (defaults to current directory)
    #[arg(long, global = true, value_name = "PROJECT_PATH")]
    project: Option<PathBuf>,

    #[command(flatten)]
    remote: RemoteArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Remote overrides; take precedence over config files and environment
#[derive(clap::Args)]
struct RemoteArgs {
    /// Repository owner
    #[arg(long, global = true)]
    owner: Option<String>,

    /// Repository name
    #[arg(long, global = true)]
    repo: Option<String>,

    /// Branch that receives commits
    #[arg(long, global = true)]
    branch: Option<String>,
}

impl RemoteArgs {
    /// Configuration layer for `ConfigLoadOptions::cli_args`
    fn to_config(&self) -> Option<PublisherConfig> {
        if self.owner.is_none() && self.repo.is_none() && self.branch.is_none() {
            return None;
        }

        Some(PublisherConfig {
            version: String::new(),
            remote: RemoteConfig {
                owner: self.owner.clone(),
                repo: self.repo.clone(),
                branch: self.branch.clone(),
                ..Default::default()
            },
            ..Default::default()
        })
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Manage local drafts
    Draft {
        #[command(subcommand)]
        action: DraftCommands,
    },

    /// Publish all drafts to the remote repository
    Publish {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Print a file from the remote repository
    Show {
        /// Path below the content directory
        #[arg(default_value = WELCOME_PATH)]
        path: String,
    },

    /// Validate configuration and credentials
    Check,
}

#[derive(Subcommand)]
enum DraftCommands {
    /// Create a draft
    Add {
        #[arg(short, long)]
        title: String,

        #[arg(short, long)]
        body: String,
    },

    /// List drafts
    List,

    /// Change the title or body of a draft
    Edit {
        id: String,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(short, long)]
        body: Option<String>,
    },

    /// Delete a draft
    Remove { id: String },
}

/// Configuration and stores shared by all commands
struct AppContext {
    config: PublisherConfig,
    drafts: JsonDraftStore,
}

/// Remote store plus whether it is the simulated one
struct Remote {
    store: Arc<dyn RemoteFileStore>,
    simulated: bool,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = run().await;

    match result {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("\n❌ Error");
            eprintln!("{}", SecureTokenManager::new().mask_tokens_in_string(&format!("{:#}", e)));
            process::exit(1);
        }
    }
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    let project_path = cli.project.unwrap_or_else(|| PathBuf::from("."));
    let overrides = cli.remote.to_config();

    match cli.command {
        Commands::Draft { action } => {
            let ctx = load_context(&project_path, overrides).await?;
            draft_command(&ctx, action).await
        }
        Commands::Publish { yes } => {
            let ctx = load_context(&project_path, overrides).await?;
            publish_command(&ctx, yes).await
        }
        Commands::Show { path } => {
            let ctx = load_context(&project_path, overrides).await?;
            show_command(&ctx, &path).await
        }
        Commands::Check => check_command(&project_path, overrides).await,
    }
}

async fn load_config(
    project_path: &Path,
    overrides: Option<PublisherConfig>,
) -> Result<PublisherConfig> {
    let mut options = ConfigLoadOptions::from_process_env(project_path);
    options.cli_args = overrides;

    ConfigLoader::load(options)
        .await
        .context("failed to load configuration")
}

async fn load_context(
    project_path: &Path,
    overrides: Option<PublisherConfig>,
) -> Result<AppContext> {
    let config = load_config(project_path, overrides).await?;

    let drafts_path = config.drafts.path();
    let drafts_path = if drafts_path.is_absolute() {
        drafts_path
    } else {
        project_path.join(drafts_path)
    };

    Ok(AppContext {
        config,
        drafts: JsonDraftStore::new(drafts_path),
    })
}

/// GitHub store when repository and token are configured, simulated otherwise
fn build_remote(config: &PublisherConfig) -> Result<Remote> {
    let tokens = SecureTokenManager::new();

    match (config.remote.repository(), tokens.get_token()) {
        (Some(_), Some(token)) => {
            let store = GitHubFileStore::from_config(&config.remote, token)?;
            Ok(Remote {
                store: Arc::new(store),
                simulated: false,
            })
        }
        (repository, token) => {
            let mut missing = Vec::new();
            if repository.is_none() {
                missing.push("remote.owner/remote.repo");
            }
            if token.is_none() {
                missing.push(tokens.variable());
            }
            println!("⚠️  Simulation mode: {} not set", missing.join(" and "));
            println!("   Nothing is written to GitHub.\n");

            let store = MemoryFileStore::new().with_file(WELCOME_PATH, WELCOME_CONTENT);
            Ok(Remote {
                store: Arc::new(store),
                simulated: true,
            })
        }
    }
}

async fn draft_command(ctx: &AppContext, action: DraftCommands) -> Result<i32> {
    match action {
        DraftCommands::Add { title, body } => {
            let draft = ctx.drafts.insert(NewDraft { title, body }).await?;
            println!("📝 Created draft {} \"{}\"", draft.id, draft.title);
            Ok(0)
        }
        DraftCommands::List => {
            let drafts = ctx.drafts.list().await?;
            if drafts.is_empty() {
                println!("📭 No drafts");
                return Ok(0);
            }

            println!("\n📝 Drafts ({})\n", drafts.len());
            for draft in &drafts {
                println!(
                    "  {}  {}  (updated {})",
                    draft.id,
                    draft.title,
                    draft.updated_at.format("%Y-%m-%d %H:%M")
                );
            }
            println!();
            Ok(0)
        }
        DraftCommands::Edit { id, title, body } => {
            let patch = DraftPatch { title, body };
            if patch.is_empty() {
                eprintln!("⚠️  Nothing to change: pass --title and/or --body");
                return Ok(1);
            }

            let draft = ctx.drafts.update(&id, patch).await?;
            println!("✏️  Updated draft {} \"{}\"", draft.id, draft.title);
            Ok(0)
        }
        DraftCommands::Remove { id } => {
            ctx.drafts.remove(&id).await?;
            println!("🗑️  Removed draft {}", id);
            Ok(0)
        }
    }
}

async fn publish_command(ctx: &AppContext, yes: bool) -> Result<i32> {
    println!("\n📦 draft-publisher\n");

    let remote = build_remote(&ctx.config)?;
    let coordinator = PublishCoordinator::new(remote.store);
    let drafts = ctx.drafts.list().await?;

    if !drafts.is_empty() && !yes && ctx.config.publish.confirm() {
        let question = format!(
            "Publish {} draft(s) to {}?",
            drafts.len(),
            coordinator.target()
        );
        if !confirm(&question).await? {
            println!("Cancelled");
            return Ok(0);
        }
    }

    match coordinator.publish_batch(&drafts).await {
        Ok(result) => {
            println!("{}", result.summary());
            remove_published(ctx, &result, remote.simulated).await;
            println!("\n✅ Publishing completed successfully!");
            Ok(0)
        }
        Err(PublishError::AggregateBatchFailure { failures, result }) => {
            println!("{}", result.summary());
            remove_published(ctx, &result, remote.simulated).await;
            println!(
                "\n❌ {} draft(s) failed and were kept for the next attempt",
                failures.len()
            );
            Ok(1)
        }
        Err(PublishError::NothingToPublish) => {
            println!("📭 No drafts to publish");
            Ok(0)
        }
        Err(e) => {
            eprintln!("\n❌ Publishing failed: {}", e);
            print_error_help(&e);
            Ok(1)
        }
    }
}

/// Error code, suggested actions and whether a later retry may help
fn error_help(error: &PublishError) -> Vec<String> {
    let mut lines = vec![format!("  Code: {}", error.code())];
    lines.extend(
        error
            .suggested_actions()
            .into_iter()
            .map(|action| format!("  - {}", action)),
    );
    if error.is_recoverable() {
        lines.push("  This may succeed if you try again later.".to_string());
    }
    lines
}

fn print_error_help(error: &PublishError) {
    for line in error_help(error) {
        eprintln!("{}", line);
    }
}

/// Drop drafts that reached the remote; failed drafts stay for a later run
async fn remove_published(ctx: &AppContext, result: &BatchPublishResult, simulated: bool) {
    if simulated {
        println!("\n(simulation) Drafts were kept locally");
        return;
    }

    for (draft_id, path, _) in result.succeeded() {
        if let Err(e) = ctx.drafts.remove(draft_id).await {
            eprintln!("⚠️  Published {} but failed to remove draft {}: {}", path, draft_id, e);
        }
    }
}

async fn confirm(question: &str) -> Result<bool> {
    print!("{} [y/N] ", question);
    std::io::stdout().flush()?;

    let mut answer = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut answer)
        .await?;

    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

async fn show_command(ctx: &AppContext, path: &str) -> Result<i32> {
    let remote = build_remote(&ctx.config)?;
    let coordinator = PublishCoordinator::new(remote.store);

    let file = match coordinator.fetch(path).await {
        Ok(Some(file)) => file,
        Ok(None) => anyhow::bail!("{} not found on {}", path, coordinator.target()),
        Err(e) => {
            eprintln!("\n❌ Failed to fetch {}: {}", path, e);
            print_error_help(&e);
            return Ok(1);
        }
    };

    println!("📄 {} ({})\n", file.path, file.version);
    println!("{}", file.content);
    Ok(0)
}

async fn check_command(project_path: &Path, overrides: Option<PublisherConfig>) -> Result<i32> {
    println!("\n🔍 Configuration Check\n");

    let config = load_config(project_path, overrides).await?;
    let validation = ConfigLoader::validate(&config);
    println!("{}", ConfigLoader::format_validation_result(&validation));

    match config.remote.repository() {
        Some((owner, repo)) => println!(
            "Target: {}/{}@{} (dir: {})",
            owner,
            repo,
            config.remote.branch(),
            config.remote.content_dir()
        ),
        None => println!("Target: not configured (simulation mode)"),
    }

    let tokens = SecureTokenManager::new();
    match tokens.require_token() {
        Ok(token) => println!(
            "Token:  {} ({})",
            tokens.mask_token(token.expose_secret()),
            tokens.variable()
        ),
        Err(e) => {
            println!("Token:  {}", e);
            print_error_help(&e);
        }
    }
    println!();

    Ok(if validation.valid { 0 } else { 1 })
}
