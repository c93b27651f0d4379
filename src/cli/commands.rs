use clap::{Parser, Subcommand, ValueEnum};
use omnichat_widget::messages::Role;
use std::path::PathBuf;

/// `omnichat-widget` - live-chat widget controller for Dynamics 365 Omnichannel.
#[derive(Parser, Debug)]
#[command(name = "omnichat-widget")]
#[command(version)]
#[command(
    about = "Resolve widget configs, classify chat payloads and run a demo chat.",
    long_about = None
)]
pub struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve a widget configuration and print the effective settings
    Check {
        #[command(flatten)]
        source: ConfigSource,
    },

    /// Classify a message payload (reads stdin when no payload is given)
    Classify {
        payload: Option<String>,

        /// Role the payload was sent with
        #[arg(long, value_enum, default_value_t = RoleArg::Agent)]
        role: RoleArg,
    },

    /// Chat with the scripted demo agent in the terminal
    Demo {
        #[command(flatten)]
        source: ConfigSource,

        /// Pre-chat name (skips the interactive form prompt)
        #[arg(long)]
        name: Option<String>,

        /// Pre-chat email
        #[arg(long)]
        email: Option<String>,

        /// Optional first question
        #[arg(long)]
        question: Option<String>,
    },
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct ConfigSource {
    /// Config file (TOML, or JSON when the extension is .json)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Gist id holding a `config.json`, layered over the file config
    #[arg(long)]
    pub gist: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleArg {
    User,
    Agent,
    System,
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::User => Role::User,
            RoleArg::Agent => Role::Agent,
            RoleArg::System => Role::System,
        }
    }
}
