//! NYA CLI - database migrations and admin management.
//!
//! # Usage
//!
//! ```bash
//! # Run admin database migrations
//! nya-cli migrate
//!
//! # Invite an admin
//! nya-cli admin invite -e priya@nya.org -n "Priya" -p blog,team
//!
//! # List admins and invites
//! nya-cli admin list
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "nya-cli")]
#[command(author, version, about = "NYA admin panel CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run admin database migrations
    Migrate,
    /// Manage admins and invites
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Invite an email address to become an admin
    Invite {
        /// Email address to invite
        #[arg(short, long)]
        email: String,

        /// Display name used if the sign-in provider reports none
        #[arg(short, long)]
        name: Option<String>,

        /// Make the admin a master admin (all sections, admin management)
        #[arg(long)]
        master: bool,

        /// Comma-separated permission keys (e.g. `blog,team,joinRequests`)
        #[arg(short, long, value_delimiter = ',')]
        permissions: Vec<String>,
    },
    /// List admins and pending invites
    List,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Invite {
                email,
                name,
                master,
                permissions,
            } => commands::admin::invite(&email, name, master, &permissions).await?,
            AdminAction::List => commands::admin::list().await?,
        },
    }
    Ok(())
}
