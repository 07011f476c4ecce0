//! Configuration for civic-import
//!
//! CLI arguments with environment variable fallbacks, using clap.

use crate::error::Result;
use crate::identifiers::ManualOverrides;
use clap::Parser;
use std::path::PathBuf;

/// Load a civic.json node-link dataset into a fresh relational store
#[derive(Parser, Debug, Clone)]
#[command(name = "civic-import")]
#[command(about = "Reconcile a civic.json node-link dataset into a normalized SQLite store")]
pub struct Args {
    /// Path to the node-link JSON document
    #[arg(long, env = "CIVIC_DATASET", default_value = "civic.json")]
    pub dataset: PathBuf,

    /// SQLite database to write into
    #[arg(long, env = "CIVIC_DATABASE", default_value = "civic.db")]
    pub database: PathBuf,

    /// CSV table of `broken_id,substitute_id` identifier overrides
    /// [default: the bundled config/id_overrides.csv]
    #[arg(long, env = "CIVIC_ID_OVERRIDES")]
    pub overrides: Option<PathBuf>,

    /// Import without any identifier overrides
    #[arg(long, env = "CIVIC_NO_OVERRIDES", default_value = "false", conflicts_with = "overrides")]
    pub no_overrides: bool,

    /// Delete an existing database before importing
    #[arg(long, env = "CIVIC_FRESH", default_value = "false")]
    pub fresh: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Override table from `--overrides`, the bundled table when not given,
    /// or an empty one with `--no-overrides`.
    pub fn load_overrides(&self) -> Result<ManualOverrides> {
        if self.no_overrides {
            return Ok(ManualOverrides::default());
        }
        match &self.overrides {
            Some(path) => ManualOverrides::from_csv(path),
            None => ManualOverrides::bundled(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifiers::IdOverride;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["civic-import"]).unwrap();

        assert_eq!(args.dataset, PathBuf::from("civic.json"));
        assert_eq!(args.database, PathBuf::from("civic.db"));
        assert!(!args.no_overrides);
        assert_eq!(
            args.load_overrides().unwrap().rules(),
            &[
                IdOverride { broken_id: 289, substitute_id: 378 },
                IdOverride { broken_id: 541, substitute_id: 552 },
            ]
        );
    }

    #[test]
    fn test_no_overrides_opt_out() {
        let args = Args::try_parse_from(["civic-import", "--no-overrides"]).unwrap();
        assert!(args.load_overrides().unwrap().is_empty());

        let both = Args::try_parse_from([
            "civic-import",
            "--no-overrides",
            "--overrides",
            "config/id_overrides.csv",
        ]);
        assert!(both.is_err());
    }

    #[test]
    fn test_explicit_arguments() {
        let args = Args::try_parse_from([
            "civic-import",
            "--dataset",
            "data/civic.json",
            "--database",
            "/tmp/out.db",
            "--fresh",
            "--log-level",
            "debug",
        ])
        .unwrap();

        assert_eq!(args.dataset, PathBuf::from("data/civic.json"));
        assert_eq!(args.database, PathBuf::from("/tmp/out.db"));
        assert!(args.fresh);
        assert_eq!(args.log_level, "debug");
    }

    #[test]
    fn test_shipped_override_table() {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config/id_overrides.csv");
        let args = Args::try_parse_from([
            "civic-import".into(),
            "--overrides".into(),
            path.into_os_string(),
        ])
        .unwrap();

        let overrides = args.load_overrides().unwrap();
        assert_eq!(overrides.len(), 2);
        assert_eq!(overrides.rules()[0].broken_id, 289);
        assert_eq!(overrides.rules()[0].substitute_id, 378);
    }
}
