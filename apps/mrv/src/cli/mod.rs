//! # MRV CLI Module
//!
//! ## Available Commands
//!
//! - `init` - Open the store and create its tables
//! - `concepts` - Print the key concepts
//! - `projects` - List registered projects
//! - `project add` / `project remove` - Maintain the project registry
//! - `assess` - Score six ratings, optionally save and write a report
//! - `history` - Show saved snapshots of a project
//! - `server` - Start the HTTP server

mod commands;

use crate::config::MrvConfig;
use clap::{Args, Parser, Subcommand};
use mrv_core::{MrvError, Ratings, primitives::DEFAULT_RATINGS};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// MRV Readiness - a structured clarity check for carbon projects.
///
/// Rate six dimensions from 0 to 5 and get a readiness score, a maturity
/// stage and a short narrative. This is not an audit.
#[derive(Parser, Debug)]
#[command(name = "mrv")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the score database (overrides the config file)
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Path to a TOML config file (default: ./mrv.toml if present)
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to (overrides the config file)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (overrides the config file)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Open the database, creating tables if needed
    Init,

    /// Print the key concepts behind the assessment
    Concepts,

    /// List registered projects
    Projects,

    /// Maintain the project registry
    Project {
        #[command(subcommand)]
        action: ProjectAction,
    },

    /// Score a project's MRV readiness
    Assess {
        /// Project id (default: first listed project)
        #[arg(short = 'P', long)]
        project: Option<String>,

        #[command(flatten)]
        ratings: RatingArgs,

        /// Free-text notes stored with the snapshot
        #[arg(short, long, default_value = "")]
        notes: String,

        /// Save the snapshot to the project's history
        #[arg(short, long)]
        save: bool,

        /// Write the markdown snapshot to this path
        #[arg(short, long)]
        report: Option<PathBuf>,
    },

    /// Show saved snapshots of a project, oldest first
    History {
        /// Project id
        #[arg(short = 'P', long)]
        project: String,
    },
}

/// Project registry actions.
#[derive(Subcommand, Debug)]
pub enum ProjectAction {
    /// Add or replace a project
    Add {
        #[arg(long)]
        id: String,

        #[arg(long)]
        code: Option<String>,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        status: Option<String>,
    },

    /// Remove a project; its saved scores are kept
    Remove {
        #[arg(long)]
        id: String,
    },
}

/// The six ratings, each 0-5.
#[derive(Args, Debug, Clone, Copy)]
pub struct RatingArgs {
    /// Boundary clarity
    #[arg(long, default_value_t = DEFAULT_RATINGS[0], value_parser = clap::value_parser!(u8).range(0..=5))]
    pub boundary: u8,

    /// Baseline justification
    #[arg(long, default_value_t = DEFAULT_RATINGS[1], value_parser = clap::value_parser!(u8).range(0..=5))]
    pub baseline: u8,

    /// Assumptions documented
    #[arg(long, default_value_t = DEFAULT_RATINGS[2], value_parser = clap::value_parser!(u8).range(0..=5))]
    pub assumptions: u8,

    /// EF traceability (cited)
    #[arg(long, default_value_t = DEFAULT_RATINGS[3], value_parser = clap::value_parser!(u8).range(0..=5))]
    pub ef_trace: u8,

    /// Data quality (metering/invoices)
    #[arg(long, default_value_t = DEFAULT_RATINGS[4], value_parser = clap::value_parser!(u8).range(0..=5))]
    pub data_quality: u8,

    /// Uncertainty expressed
    #[arg(long, default_value_t = DEFAULT_RATINGS[5], value_parser = clap::value_parser!(u8).range(0..=5))]
    pub uncertainty: u8,
}

impl RatingArgs {
    pub fn to_ratings(self) -> Result<Ratings, MrvError> {
        Ratings::new([
            self.boundary,
            self.baseline,
            self.assumptions,
            self.ef_trace,
            self.data_quality,
            self.uncertainty,
        ])
    }
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli, config: MrvConfig) -> Result<(), MrvError> {
    let db_path = config.database_path(cli.database.as_deref());
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server { host, port }) => cmd_server(&db_path, &config, host, port).await,
        Some(Commands::Init) => cmd_init(&db_path, json_mode),
        Some(Commands::Concepts) => cmd_concepts(json_mode),
        Some(Commands::Projects) => cmd_projects(&db_path, json_mode),
        Some(Commands::Project { action }) => match action {
            ProjectAction::Add {
                id,
                code,
                name,
                status,
            } => cmd_project_add(&db_path, json_mode, id, code, name, status),
            ProjectAction::Remove { id } => cmd_project_remove(&db_path, json_mode, &id),
        },
        Some(Commands::Assess {
            project,
            ratings,
            notes,
            save,
            report,
        }) => cmd_assess(
            &db_path,
            json_mode,
            AssessOptions {
                project,
                ratings: ratings.to_ratings()?,
                notes,
                save,
                report,
            },
        ),
        Some(Commands::History { project }) => cmd_history(&db_path, json_mode, &project),
        None => {
            // No subcommand - list projects by default
            cmd_projects(&db_path, json_mode)
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn assess_defaults_to_form_ratings() {
        let cli = Cli::try_parse_from(["mrv", "assess"]).expect("parse");
        let Some(Commands::Assess { ratings, save, .. }) = cli.command else {
            unreachable!("assess expected");
        };
        assert_eq!(ratings.to_ratings().expect("valid"), Ratings::default());
        assert!(!save);
    }

    #[test]
    fn rating_flags_use_dimension_prompts() {
        use clap::CommandFactory;
        let cli = Cli::command();
        let assess = cli.find_subcommand("assess").expect("assess subcommand");
        for dimension in mrv_core::Dimension::ALL {
            let arg = assess
                .get_arguments()
                .find(|a| a.get_id().as_str() == dimension.key())
                .expect("rating flag");
            let help = arg.get_help().map(ToString::to_string);
            assert_eq!(help.as_deref(), Some(dimension.prompt()));
        }
    }

    #[test]
    fn out_of_range_rating_rejected_by_parser() {
        assert!(Cli::try_parse_from(["mrv", "assess", "--boundary", "6"]).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["mrv", "projects", "--json-mode", "-D", "x.redb"])
            .expect("parse");
        assert!(cli.json_mode);
        assert_eq!(cli.database, Some(PathBuf::from("x.redb")));
    }
}
