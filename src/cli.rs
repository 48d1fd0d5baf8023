//! Command-line interface definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// blogdex: taxonomy and listing indexes for markdown blogs
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Project root directory
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Content directory path (relative to project root)
    #[arg(short, long)]
    pub content: Option<PathBuf>,

    /// Output directory path (relative to project root)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Config file name (default: blogdex.toml)
    #[arg(short = 'C', long, default_value = "blogdex.toml")]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Index the content directory and write page JSON once
    Build {
        /// Clean output directory completely before building
        #[arg(long)]
        clean: bool,
    },

    /// Build, then rebuild whenever content or config changes
    Watch {
        /// Clean output directory completely before the first build
        #[arg(long)]
        clean: bool,
    },
}

impl Cli {
    pub const fn clean(&self) -> bool {
        match self.command {
            Commands::Build { clean } | Commands::Watch { clean } => clean,
        }
    }

    pub const fn is_watch(&self) -> bool {
        matches!(self.command, Commands::Watch { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_build() {
        let cli = Cli::try_parse_from(["blogdex", "build", "--clean"]).unwrap();
        assert!(cli.clean());
        assert!(!cli.is_watch());
        assert_eq!(cli.config, PathBuf::from("blogdex.toml"));
    }

    #[test]
    fn test_parse_global_overrides() {
        let cli = Cli::try_parse_from([
            "blogdex", "--root", "site", "-C", "conf.toml", "--output", "out", "watch",
        ])
        .unwrap();
        assert!(cli.is_watch());
        assert!(!cli.clean());
        assert_eq!(cli.root, Some(PathBuf::from("site")));
        assert_eq!(cli.config, PathBuf::from("conf.toml"));
        assert_eq!(cli.output, Some(PathBuf::from("out")));
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["blogdex"]).is_err());
    }
}
