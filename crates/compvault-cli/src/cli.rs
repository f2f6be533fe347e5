use clap::{Args, Parser, Subcommand};

/// CLI surface definition.
#[derive(Parser, Debug)]
#[command(
    name = "compvault",
    about = "Encrypted component catalogue stored in a GitHub repository",
    version
)]
pub struct Cli {
    /// Optional subcommand; defaults to launching the TUI when absent.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Browse components in the interactive TUI (press q or Esc to exit).
    Tui,
    /// Print version and exit.
    Version,
    /// Check configuration, the encryption envelope and the remote file.
    Health,
    /// List components, optionally filtered by name, type or description.
    List {
        #[arg(long, short)]
        search: Option<String>,
    },
    /// Add a new component.
    Add(AddArgs),
    /// Edit an existing component; omitted fields keep their current value.
    Edit(EditArgs),
    /// Delete a component.
    Delete {
        id: String,
        /// Skip the confirmation prompt.
        #[arg(long, short)]
        yes: bool,
    },
    /// Store GitHub credentials and the encryption password.
    Setup(SetupArgs),
    /// Manage CLI configuration.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct AddArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long = "type")]
    pub kind: String,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long = "component-version")]
    pub version: Option<String>,
    #[arg(long)]
    pub author: Option<String>,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct EditArgs {
    pub id: String,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long = "type")]
    pub kind: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long = "component-version")]
    pub version: Option<String>,
    #[arg(long)]
    pub author: Option<String>,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct SetupArgs {
    /// GitHub account or organisation owning the repository.
    #[arg(long)]
    pub username: String,
    #[arg(long)]
    pub repo: Option<String>,
    #[arg(long, env = "COMPVAULT_GITHUB_TOKEN", hide_env_values = true)]
    pub token: String,
    #[arg(long)]
    pub branch: Option<String>,
    /// At least 8 characters. Losing it makes the stored data unreadable.
    #[arg(long, env = "COMPVAULT_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigCommand {
    /// Create a default config file if one does not exist.
    Init,
    /// Print the config file location.
    Path,
}
