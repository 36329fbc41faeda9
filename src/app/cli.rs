//! Command-Line Interface

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// deskflow - Turn desktop activity into workflow summaries and automation suggestions
#[derive(Parser, Debug)]
#[command(name = "deskflow")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record a session: input events plus periodic screenshots, then analyze it
    Record {
        /// Recording duration in seconds (0 = until Ctrl-C)
        #[arg(short, long, default_value = "180")]
        duration: u64,

        /// Session id (minted from the clock if not provided)
        #[arg(short, long)]
        session: Option<String>,

        /// Delete previously recorded data first
        #[arg(long)]
        fresh: bool,

        /// Skip the LLM suggestion step
        #[arg(long)]
        no_llm: bool,
    },

    /// Re-run workflow analysis on a recorded session
    Analyze {
        /// Session id (latest if not provided)
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Generate automation suggestions for a recorded session
    Suggest {
        /// Session id (latest if not provided)
        #[arg(short, long)]
        session: Option<String>,
    },

    /// List recorded sessions
    List {
        /// Show detailed information
        #[arg(short, long)]
        detailed: bool,
    },

    /// Delete all recorded data
    Clean {
        /// Skip confirmation (without it, only reports what would be deleted)
        #[arg(short, long)]
        force: bool,
    },

    /// Initialize configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },

    /// View or modify configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "llm.model", "analysis.repeat_threshold")
        key: String,

        /// Value to set
        value: String,
    },

    /// Get a specific configuration value
    Get {
        /// Configuration key
        key: String,
    },

    /// Reset configuration to defaults
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse_record_defaults() {
        let cli = Cli::try_parse_from(["deskflow", "record"]).unwrap();
        match cli.command {
            Commands::Record {
                duration,
                session,
                fresh,
                no_llm,
            } => {
                assert_eq!(duration, 180);
                assert!(session.is_none());
                assert!(!fresh);
                assert!(!no_llm);
            }
            _ => panic!("Expected Record command"),
        }
    }

    #[test]
    fn test_cli_parse_record_all_options() {
        let cli = Cli::try_parse_from([
            "deskflow",
            "record",
            "--duration",
            "60",
            "--session",
            "20250601_120000",
            "--fresh",
            "--no-llm",
        ])
        .unwrap();
        match cli.command {
            Commands::Record {
                duration,
                session,
                fresh,
                no_llm,
            } => {
                assert_eq!(duration, 60);
                assert_eq!(session.as_deref(), Some("20250601_120000"));
                assert!(fresh);
                assert!(no_llm);
            }
            _ => panic!("Expected Record command"),
        }
    }

    #[test]
    fn test_cli_parse_analyze_and_suggest() {
        let cli = Cli::try_parse_from(["deskflow", "analyze", "-s", "s1"]).unwrap();
        match cli.command {
            Commands::Analyze { session } => assert_eq!(session.as_deref(), Some("s1")),
            _ => panic!("Expected Analyze command"),
        }

        let cli = Cli::try_parse_from(["deskflow", "suggest"]).unwrap();
        match cli.command {
            Commands::Suggest { session } => assert!(session.is_none()),
            _ => panic!("Expected Suggest command"),
        }
    }

    #[test]
    fn test_cli_parse_list() {
        let cli = Cli::try_parse_from(["deskflow", "list", "--detailed"]).unwrap();
        match cli.command {
            Commands::List { detailed } => assert!(detailed),
            _ => panic!("Expected List command"),
        }
    }

    #[test]
    fn test_cli_parse_clean() {
        let cli = Cli::try_parse_from(["deskflow", "clean"]).unwrap();
        match cli.command {
            Commands::Clean { force } => assert!(!force),
            _ => panic!("Expected Clean command"),
        }

        let cli = Cli::try_parse_from(["deskflow", "clean", "--force"]).unwrap();
        match cli.command {
            Commands::Clean { force } => assert!(force),
            _ => panic!("Expected Clean command"),
        }
    }

    #[test]
    fn test_cli_parse_config_actions() {
        let cli = Cli::try_parse_from(["deskflow", "config", "show"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigAction::Show
            }
        ));

        let cli =
            Cli::try_parse_from(["deskflow", "config", "set", "llm.model", "llama3"]).unwrap();
        match cli.command {
            Commands::Config {
                action: ConfigAction::Set { key, value },
            } => {
                assert_eq!(key, "llm.model");
                assert_eq!(value, "llama3");
            }
            _ => panic!("Expected Config Set"),
        }

        let cli = Cli::try_parse_from(["deskflow", "config", "get", "analysis.repeat_threshold"])
            .unwrap();
        match cli.command {
            Commands::Config {
                action: ConfigAction::Get { key },
            } => assert_eq!(key, "analysis.repeat_threshold"),
            _ => panic!("Expected Config Get"),
        }
    }

    #[test]
    fn test_cli_global_flags() {
        let cli = Cli::try_parse_from(["deskflow", "-v", "list"]).unwrap();
        assert!(cli.verbose);

        let cli = Cli::try_parse_from(["deskflow", "-c", "/custom/config.toml", "list"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
    }

    #[test]
    fn test_cli_invalid_command_fails() {
        assert!(Cli::try_parse_from(["deskflow", "bogus"]).is_err());
    }

    #[test]
    fn test_cli_verify_command_structure() {
        let cmd = Cli::command();
        let subcommands: Vec<_> = cmd.get_subcommands().map(|s| s.get_name()).collect();
        assert!(subcommands.contains(&"record"));
        assert!(subcommands.contains(&"analyze"));
        assert!(subcommands.contains(&"suggest"));
        assert!(subcommands.contains(&"list"));
        assert!(subcommands.contains(&"clean"));
        assert!(subcommands.contains(&"init"));
        assert!(subcommands.contains(&"config"));
    }
}
