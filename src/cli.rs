use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the configuration file (default: ~/.config/redmine-release/config.yaml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true, default_value_t = false)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Interactive configuration setup
    Config,

    /// List versions eligible as release targets
    Version,

    /// Manage release issues
    Release {
        #[command(subcommand)]
        command: ReleaseCommand,
    },

    /// Dump custom field definitions
    #[command(name = "custom_field")]
    CustomField,

    /// List project memberships
    Members,

    /// Work with regular issues
    Issue {
        #[command(subcommand)]
        command: IssueCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum ReleaseCommand {
    /// Interactive wizard creating a release issue
    Create,

    /// List release issues
    List {
        /// Include releases already in the done status
        #[arg(long, default_value_t = false)]
        all: bool,

        /// Maximum number of issues to fetch
        #[arg(short, long, default_value_t = 30)]
        limit: u32,

        /// Only releases assigned to me
        #[arg(long, default_value_t = false)]
        me: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum IssueCommand {
    /// List issues in the configured project
    List {
        /// Only issues assigned to me
        #[arg(long, default_value_t = false)]
        me: bool,

        /// Only open issues (the default)
        #[arg(long, default_value_t = false, conflicts_with = "closed")]
        open: bool,

        /// Only closed issues
        #[arg(long, default_value_t = false)]
        closed: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_list_defaults() {
        let args = Args::parse_from(["redmine-release", "release", "list"]);

        match args.command {
            Command::Release {
                command: ReleaseCommand::List { all, limit, me },
            } => {
                assert!(!all);
                assert_eq!(limit, 30);
                assert!(!me);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_release_list_flags() {
        let args =
            Args::parse_from(["redmine-release", "release", "list", "--all", "-l", "5", "--me"]);

        match args.command {
            Command::Release {
                command: ReleaseCommand::List { all, limit, me },
            } => {
                assert!(all);
                assert_eq!(limit, 5);
                assert!(me);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_issue_list_open_closed_conflict() {
        let result =
            Args::try_parse_from(["redmine-release", "issue", "list", "--open", "--closed"]);

        assert!(result.is_err());
    }

    #[test]
    fn test_custom_field_command_name() {
        let args = Args::parse_from(["redmine-release", "custom_field"]);

        assert!(matches!(args.command, Command::CustomField));
    }

    #[test]
    fn test_global_config_path() {
        let args = Args::parse_from(["redmine-release", "--config", "/tmp/alt.yaml", "version"]);

        assert_eq!(args.config.as_deref(), Some(std::path::Path::new("/tmp/alt.yaml")));
    }
}
