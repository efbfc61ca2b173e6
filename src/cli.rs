use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Generate manual test cases from a feature requirement
#[derive(Parser, Debug, Clone)]
#[command(name = "casegen", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,

    /// Path to config file (default: casegen.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Chat-completion endpoint: the model API itself or a relay
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// How to authenticate against the endpoint (direct, relay)
    #[arg(long, global = true)]
    pub auth_mode: Option<String>,

    /// Model identifier sent with each request
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Environment variable holding the API key
    #[arg(long, global = true)]
    pub api_key_env: Option<String>,

    /// Language for generated test case text
    #[arg(long, global = true)]
    pub language: Option<String>,

    /// Directory containing a generate-test-cases.md prompt override
    #[arg(long, global = true)]
    pub prompt_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum CliCommand {
    /// Generate test cases for one requirement and print them
    Generate {
        /// Feature requirement in free text
        requirement: String,

        /// Test categories to generate (repeatable or comma-separated)
        #[arg(short, long = "category", value_delimiter = ',')]
        categories: Vec<String>,

        /// Also write the batch to this file
        #[arg(long)]
        export: Option<PathBuf>,

        /// Export format (text, csv, json); inferred from the export path when omitted
        #[arg(long)]
        format: Option<String>,
    },

    /// Interactive session: one requirement per line
    Chat {
        /// Test categories to generate (repeatable or comma-separated)
        #[arg(short, long = "category", value_delimiter = ',')]
        categories: Vec<String>,
    },

    /// Run the key-injecting relay server
    Relay {
        /// Address to listen on
        #[arg(long)]
        bind: Option<String>,

        /// Upstream chat-completion URL to forward to
        #[arg(long)]
        upstream: Option<String>,
    },
}

impl CliCommand {
    /// Categories requested on the command line, if any.
    pub fn categories(&self) -> &[String] {
        match self {
            CliCommand::Generate { categories, .. } | CliCommand::Chat { categories } => {
                categories
            }
            CliCommand::Relay { .. } => &[],
        }
    }
}
