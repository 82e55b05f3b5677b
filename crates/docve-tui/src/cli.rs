//! One-shot subcommands. `docve` with no subcommand runs the TUI.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use docve_core::api::UploadProgress;
use docve_core::auth::{self, Credentials, LoginFlow, SignupFlow, SignupForm};
use docve_core::config::ENV_PASSWORD;
use docve_core::models::{Document, DocumentStatus, NewShelf, ShelfType, UploadRequest};
use docve_core::utils::{format_bytes, truncate_string};
use docve_core::{ApiClient, Config};

#[derive(Parser, Debug)]
#[command(name = "docve")]
#[command(version)]
#[command(about = "Terminal client for Docve document shelves")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Base URL of the Docve API (overrides config and environment)
    #[arg(long, global = true, env = "DOCVE_API_URL", value_name = "URL")]
    pub api_url: Option<String>,

    /// Print results as JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    /// Open the TUI at this path (e.g. /shelves/12) instead of the dashboard
    #[arg(long, value_name = "PATH")]
    pub open: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in and store the session token
    Login {
        /// Username (defaults to DOCVE_USERNAME or the last one used)
        #[arg(short, long)]
        username: Option<String>,
    },
    /// Forget the stored session token
    Logout,
    /// Show whether a session is stored and still accepted by the server
    Status,
    /// Create a new account
    Signup,
    /// List, create and delete shelves
    Shelves {
        #[command(subcommand)]
        command: ShelvesCommand,
    },
    /// List, search, upload and manage documents
    Docs {
        #[command(subcommand)]
        command: DocsCommand,
    },
    /// Show the admin dashboard figures
    Dashboard,
    /// Show service health
    Health,
}

#[derive(Subcommand, Debug)]
pub enum ShelvesCommand {
    /// List shelves
    List {
        /// Only shelves whose name or description matches
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Create a shelf
    Create {
        name: String,
        #[arg(short, long)]
        description: Option<String>,
        /// Create a shared shelf instead of a personal one
        #[arg(long)]
        shared: bool,
    },
    /// Delete a shelf
    Delete {
        #[arg(value_name = "SHELF_ID")]
        id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum DocsCommand {
    /// List documents, optionally for a single shelf
    List {
        #[arg(long, value_name = "SHELF_ID")]
        shelf: Option<String>,
    },
    /// Search documents by name
    Search { term: String },
    /// Upload a file to a shelf
    Upload {
        path: PathBuf,
        #[arg(long, value_name = "SHELF_ID")]
        shelf: String,
        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Set a document's processing status
    Mark {
        #[arg(value_name = "DOCUMENT_ID")]
        id: String,
        #[arg(value_enum)]
        status: MarkStatus,
    },
    /// Delete a document
    Delete {
        #[arg(value_name = "DOCUMENT_ID")]
        id: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarkStatus {
    Indexed,
    Failed,
    Removed,
}

impl From<MarkStatus> for DocumentStatus {
    fn from(status: MarkStatus) -> Self {
        match status {
            MarkStatus::Indexed => DocumentStatus::Indexed,
            MarkStatus::Failed => DocumentStatus::Failed,
            MarkStatus::Removed => DocumentStatus::Removed,
        }
    }
}

/// Run one subcommand against the configured service.
pub async fn run(command: Command, json: bool, mut config: Config) -> Result<()> {
    let store = config.session_store()?;
    let api = ApiClient::new(&config.api_base_url(), store.clone())?;
    debug!(base_url = %api.base_url(), "CLI client ready");

    match command {
        Command::Login { username } => {
            let username = match username.or_else(|| config.prefill_username()) {
                Some(u) => u,
                None => prompt("Username: ")?,
            };
            let password = match std::env::var(ENV_PASSWORD).ok().filter(|p| !p.is_empty()) {
                Some(p) => p,
                None => rpassword::prompt_password("Password: ")
                    .context("Failed to read password")?,
            };

            let flow = LoginFlow::new(api);
            flow.login(&Credentials::new(&username, &password)).await?;
            println!("Logged in as {}", username);

            config.last_username = Some(username);
            if let Err(e) = config.save() {
                warn!(error = %e, "Failed to save config");
            }
        }

        Command::Logout => {
            auth::logout(store.as_ref())?;
            println!("Logged out");
        }

        Command::Status => {
            if !auth::is_authenticated(store.as_ref()) {
                println!("Not logged in");
                return Ok(());
            }
            match api.validate_token().await {
                Ok(()) => println!("Logged in ({})", api.base_url()),
                Err(e) if e.is_unauthorized() => {
                    auth::logout(store.as_ref())?;
                    println!("Session expired; the stored token was removed");
                }
                Err(e) => {
                    return Err(e).context("Could not validate the stored session");
                }
            }
        }

        Command::Signup => {
            let form = SignupForm {
                username: prompt("Username: ")?,
                email: prompt("Email: ")?,
                password: rpassword::prompt_password("Password: ")
                    .context("Failed to read password")?,
                confirm_password: rpassword::prompt_password("Confirm password: ")
                    .context("Failed to read password")?,
            };
            match SignupFlow::new(api).register(&form).await {
                Ok(_) => println!("Account created. Run `docve login` to sign in."),
                Err(e) => {
                    if let Some(fields) = e.field_errors() {
                        for (field, message) in fields {
                            eprintln!("  {}: {}", field, message);
                        }
                    }
                    return Err(anyhow::Error::new(e).context("Signup failed"));
                }
            }
        }

        Command::Shelves { command } => run_shelves(&api, command, json).await?,
        Command::Docs { command } => run_docs(&api, command, json).await?,

        Command::Dashboard => {
            let stats = api.dashboard_stats().await?;
            if json {
                return print_json(&stats);
            }
            println!("Total users:         {}", stats.total_users);
            println!("Active users:        {}", stats.active_users);
            println!("Documents processed: {}", stats.documents_processed);
            println!("Storage used:        {}", stats.storage_used);
            if let Some(health) = &stats.health {
                println!("System health:       {}", health.status_label());
            }
        }

        Command::Health => {
            let report = api.health().await?;
            if json {
                return print_json(&report);
            }
            println!("Status:  {}", report.status_label());
            println!("Storage: {}", report.storage_display());
            if let Some(version) = &report.version {
                println!("Version: {}", version);
            }
            for (component, state) in report.components() {
                println!("  {:<20} {}", component, state);
            }
        }
    }

    Ok(())
}

async fn run_shelves(api: &ApiClient, command: ShelvesCommand, json: bool) -> Result<()> {
    match command {
        ShelvesCommand::List { search } => {
            let shelves = api.shelves(search.as_deref()).await?;
            if json {
                return print_json(&shelves);
            }
            if shelves.is_empty() {
                println!("No shelves");
            }
            for shelf in &shelves {
                println!(
                    "{:<38} {:<28} {:<9} {:>5}  {}",
                    shelf.id,
                    truncate_string(&shelf.name, 28),
                    shelf.type_label(),
                    shelf.documents_display(),
                    shelf.created_display()
                );
            }
        }
        ShelvesCommand::Create {
            name,
            description,
            shared,
        } => {
            let shelf_type = if shared {
                ShelfType::Shared
            } else {
                ShelfType::Personal
            };
            let new_shelf = NewShelf::new(&name, description.as_deref().unwrap_or(""), shelf_type);
            if let Err(message) = new_shelf.validate() {
                bail!(message);
            }
            let shelf = api.create_shelf(&new_shelf).await?;
            if json {
                return print_json(&shelf);
            }
            println!("Created shelf {} ({})", shelf.name, shelf.id);
        }
        ShelvesCommand::Delete { id } => {
            api.delete_shelf(&id).await?;
            println!("Deleted shelf {}", id);
        }
    }
    Ok(())
}

async fn run_docs(api: &ApiClient, command: DocsCommand, json: bool) -> Result<()> {
    match command {
        DocsCommand::List { shelf } => {
            let documents = match shelf {
                Some(id) => api.shelf_documents(&id).await?,
                None => api.documents().await?,
            };
            print_documents(&documents, json)?;
        }
        DocsCommand::Search { term } => {
            let documents = api.search_documents(&term).await?;
            print_documents(&documents, json)?;
        }
        DocsCommand::Upload {
            path,
            shelf,
            tags,
            description,
        } => {
            let mut request = UploadRequest::new(path, &shelf);
            if let Some(tags) = tags.as_deref() {
                request = request.with_tags(tags);
            }
            if let Some(description) = description.as_deref() {
                request = request.with_description(description);
            }

            let (tx, mut rx) = mpsc::unbounded_channel::<UploadProgress>();
            let file_name = request.file_name();
            let printer = tokio::spawn(async move {
                while let Some(progress) = rx.recv().await {
                    eprint!(
                        "\rUploading {}: {:>3}% ({} / {})",
                        file_name,
                        progress.percent,
                        format_bytes(progress.sent),
                        format_bytes(progress.total)
                    );
                }
                eprintln!();
            });

            let result = api.upload_document(&request, Some(tx)).await;
            // The sender is dropped with the request, which ends the printer
            if let Err(e) = printer.await {
                warn!(error = %e, "Upload progress printer failed");
            }

            match result? {
                Some(document) if json => print_json(&document)?,
                Some(document) => println!("Uploaded {} ({})", document.name, document.id),
                None => println!("Uploaded {}", request.file_name()),
            }
        }
        DocsCommand::Mark { id, status } => {
            let status = DocumentStatus::from(status);
            api.mark_document(&id, status).await?;
            println!("Marked {} as {}", id, status.label());
        }
        DocsCommand::Delete { id } => {
            api.delete_document(&id).await?;
            println!("Deleted document {}", id);
        }
    }
    Ok(())
}

fn print_documents(documents: &[Document], json: bool) -> Result<()> {
    if json {
        return print_json(documents);
    }
    if documents.is_empty() {
        println!("No documents");
    }
    for doc in documents {
        println!(
            "{:<38} {:<32} {:<6} {:>10}  {:<12} {}",
            doc.id,
            truncate_string(&doc.name, 32),
            doc.type_label(),
            doc.size_display(),
            doc.date_display(),
            doc.status().label()
        );
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", text);
    Ok(())
}

/// Read one trimmed line from stdin.
fn prompt(label: &str) -> Result<String> {
    eprint!("{}", label);
    io::stderr().flush().ok();
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(line.trim().to_string())
}
