pub mod commands;
pub mod output;

use crate::errors::Result;
use crate::utils::spinner::LogWriter;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "prstack")]
#[command(about = "prstack - stacked pull requests on top of git and the GitHub CLI")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging (prints every git/gh invocation)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Select the stack used when no stack name is given
    Use {
        /// Name of the stack
        stack: String,
    },

    /// Create a stack with one item per commit ahead of the base
    Generate {
        /// Name of the stack
        stack: String,
        /// Base reference (defaults to <remote>/<default branch>)
        base: Option<String>,
    },

    /// Show the items of a stack
    Show {
        /// Stack name (defaults to the current stack)
        stack: Option<String>,
    },

    /// Create branches and create or refresh pull requests
    Sync {
        /// Stack name (defaults to the current stack)
        stack: Option<String>,
    },

    /// Open pull requests in the browser
    Open {
        /// 1-based position (opens every item when omitted)
        num: Option<usize>,
        /// Stack name (defaults to the current stack)
        stack: Option<String>,
    },

    /// Rebase every enabled item onto its upstream and push it
    RebaseAll {
        /// 1-based position to start from
        start: Option<usize>,
        /// Stack name (defaults to the current stack)
        stack: Option<String>,
    },

    /// Include an item in pull request sync again
    Enable {
        /// 1-based position
        num: usize,
        /// Stack name (defaults to the current stack)
        stack: Option<String>,
    },

    /// Leave an item out of pull request sync
    Disable {
        /// 1-based position
        num: usize,
        /// Stack name (defaults to the current stack)
        stack: Option<String>,
    },

    /// Check out the branch of an item
    Checkout {
        /// 1-based position
        num: usize,
        /// Stack name (defaults to the current stack)
        stack: Option<String>,
    },

    /// List all stacks
    List,

    /// Extend the stack by adding a new branch on the end
    Extend {
        /// Subject of the new item
        title: String,
        /// Stack name (defaults to the current stack)
        stack: Option<String>,
    },

    /// Delete a stack file (branches and pull requests are left alone)
    Delete {
        /// Stack name (defaults to the current stack)
        stack: Option<String>,
    },

    /// Mark every enabled item's pull request as ready for review
    Submit {
        /// Stack name (defaults to the current stack)
        stack: Option<String>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Set a configuration value
    Set {
        /// Configuration key (e.g., review.concurrency)
        key: String,
        /// Configuration value
        value: String,
    },

    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },

    /// List all configuration values
    List,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        // Set up logging based on verbosity
        self.setup_logging();

        match self.command {
            Commands::Use { stack } => commands::stack::use_stack(&stack),
            Commands::Generate { stack, base } => commands::stack::generate(&stack, base),
            Commands::Show { stack } => commands::stack::show(stack.as_deref()),
            Commands::Sync { stack } => commands::stack::sync(stack.as_deref()).await,
            Commands::Open { num, stack } => commands::stack::open(num, stack.as_deref()).await,
            Commands::RebaseAll { start, stack } => {
                commands::stack::rebase_all(start.unwrap_or(1), stack.as_deref())
            }
            Commands::Enable { num, stack } => {
                commands::stack::set_enabled(num, true, stack.as_deref())
            }
            Commands::Disable { num, stack } => {
                commands::stack::set_enabled(num, false, stack.as_deref())
            }
            Commands::Checkout { num, stack } => commands::stack::checkout(num, stack.as_deref()),
            Commands::List => commands::stack::list(),
            Commands::Extend { title, stack } => commands::stack::extend(&title, stack.as_deref()),
            Commands::Delete { stack } => commands::stack::delete(stack.as_deref()),
            Commands::Submit { stack } => commands::stack::submit(stack.as_deref()).await,
            Commands::Config { action } => commands::config::run(action),
        }
    }

    fn setup_logging(&self) {
        let level = if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        };

        let subscriber = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_target(false)
            .without_time()
            .with_writer(|| LogWriter);

        if self.no_color {
            console::set_colors_enabled(false);
            subscriber.with_ansi(false).init();
        } else {
            subscriber.init();
        }
    }
}
