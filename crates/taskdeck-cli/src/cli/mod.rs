//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use taskdeck_core::config;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "taskdeck")]
#[command(version = "0.1")]
#[command(about = "Command-line client for the taskdeck task service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Log in and store the session tokens
    Login {
        /// Account username
        #[arg(short, long)]
        username: String,

        /// Account password
        #[arg(short, long, env = "TASKDECK_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Register a new account
    Register {
        /// Account username
        #[arg(short, long)]
        username: String,

        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long, env = "TASKDECK_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Log out and clear the stored session
    Logout,

    /// Show whether a session is active
    Status,

    /// Manage tasks
    Tasks {
        #[command(subcommand)]
        command: TaskCommands,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum TaskCommands {
    /// Lists all tasks
    List,
    /// Shows a single task
    Show {
        #[arg(value_name = "TASK_ID")]
        id: i64,
    },
    /// Adds a new task
    Add {
        /// Task title
        #[arg(long)]
        title: String,

        /// Task description
        #[arg(long)]
        content: String,

        /// Deadline, e.g. 2024-01-01T10:00 or 2024-01-01
        #[arg(long)]
        deadline: String,

        /// Create the task already marked done
        #[arg(long)]
        done: bool,
    },
    /// Edits fields of a task
    Edit {
        #[arg(value_name = "TASK_ID")]
        id: i64,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// New description
        #[arg(long)]
        content: Option<String>,

        /// New deadline
        #[arg(long)]
        deadline: Option<String>,

        /// Mark the task done
        #[arg(long, conflicts_with = "not_done")]
        done: bool,

        /// Mark the task not done
        #[arg(long = "not-done")]
        not_done: bool,
    },
    /// Deletes a task
    Delete {
        #[arg(value_name = "TASK_ID")]
        id: i64,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_logging();

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

async fn dispatch(cli: Cli) -> Result<()> {
    let config = config::Config::load().context("load config")?;

    match cli.command {
        Commands::Login { username, password } => {
            commands::auth::login(&config, &username, &password).await
        }
        Commands::Register {
            username,
            email,
            password,
        } => commands::auth::register(&config, &username, &email, &password).await,
        Commands::Logout => commands::auth::logout(&config).await,
        Commands::Status => commands::auth::status(),

        Commands::Tasks { command } => match command {
            TaskCommands::List => commands::tasks::list(&config).await,
            TaskCommands::Show { id } => commands::tasks::show(&config, id).await,
            TaskCommands::Add {
                title,
                content,
                deadline,
                done,
            } => commands::tasks::add(&config, title, content, &deadline, done).await,
            TaskCommands::Edit {
                id,
                title,
                content,
                deadline,
                done,
                not_done,
            } => {
                commands::tasks::edit(
                    &config,
                    id,
                    commands::tasks::EditArgs {
                        title,
                        content,
                        deadline,
                        done,
                        not_done,
                    },
                )
                .await
            }
            TaskCommands::Delete { id } => commands::tasks::delete(&config, id).await,
        },

        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
        },
    }
}
