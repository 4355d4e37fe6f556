// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `clean`, `vocab`, and `init`
// and all their flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for bad values
//   - type conversion (string → usize, f64, PathBuf, enums)
//
// Reference: Rust Book §12 (Building a CLI Program)

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::application::clean_use_case::{CleanOptions, Target};
use crate::application::vocab_use_case::VocabOptions;
use crate::infra::config::DEFAULT_CONFIG_PATH;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Strip, normalise, and tokenise downloaded HTML into the corpus
    Clean(CleanArgs),

    /// Count corpus tokens and check evaluation terms
    Vocab(VocabArgs),

    /// Write a config file with every default filled in
    Init(InitArgs),
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetArg {
    All,
    Fomc,
    Speeches,
}

impl From<TargetArg> for Target {
    fn from(t: TargetArg) -> Self {
        match t {
            TargetArg::All => Target::All,
            TargetArg::Fomc => Target::Fomc,
            TargetArg::Speeches => Target::Speeches,
        }
    }
}

#[derive(Args, Debug)]
pub struct CleanArgs {
    /// Which sources to clean
    #[arg(value_enum, default_value_t = TargetArg::All)]
    pub target: TargetArg,

    /// Write every dropped line to <text_dir>/removed_lines.txt
    #[arg(long)]
    pub save_removed: bool,

    /// Fixed FOMC removal guard in [0, 1]; skips profiling
    #[arg(long, value_parser = parse_fraction)]
    pub guard: Option<f64>,
}

/// Convert CLI args into the application-layer options.
/// The application layer never sees clap types.
impl From<CleanArgs> for CleanOptions {
    fn from(a: CleanArgs) -> Self {
        CleanOptions {
            target: a.target.into(),
            save_removed: a.save_removed,
            guard: a.guard,
        }
    }
}

#[derive(Args, Debug)]
pub struct VocabArgs {
    /// Leave out tokens seen fewer times
    #[arg(long, default_value_t = 1)]
    pub min_count: usize,

    /// File of evaluation terms, one per line
    #[arg(long)]
    pub terms: Option<PathBuf>,

    /// Where to write the vocabulary (default: next to the corpus dir)
    #[arg(long)]
    pub output: Option<PathBuf>,
}

impl From<VocabArgs> for VocabOptions {
    fn from(a: VocabArgs) -> Self {
        VocabOptions {
            min_count: a.min_count,
            terms: a.terms,
            output: a.output,
        }
    }
}

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Where to write the config
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub output: PathBuf,

    /// Overwrite an existing file
    #[arg(short, long)]
    pub force: bool,
}

fn parse_fraction(s: &str) -> Result<f64, String> {
    let v: f64 = s.parse().map_err(|_| format!("'{s}' is not a number"))?;
    if (0.0..=1.0).contains(&v) {
        Ok(v)
    } else {
        Err(format!("{v} is outside [0, 1]"))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn test_clean_defaults() {
        let cli = Cli::try_parse_from(["fed-corpus", "clean"]).unwrap();
        match cli.command {
            Commands::Clean(args) => {
                let opts: CleanOptions = args.into();
                assert_eq!(opts.target, Target::All);
                assert!(!opts.save_removed);
                assert_eq!(opts.guard, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_PATH));
    }

    #[test]
    fn test_clean_with_flags() {
        let cli = Cli::try_parse_from([
            "fed-corpus", "-c", "alt.yaml", "clean", "fomc", "--save-removed", "--guard", "0.45",
        ])
        .unwrap();
        assert_eq!(cli.config, PathBuf::from("alt.yaml"));
        let Commands::Clean(args) = cli.command else {
            panic!("expected clean");
        };
        let opts: CleanOptions = args.into();
        assert_eq!(opts.target, Target::Fomc);
        assert!(opts.save_removed);
        assert_eq!(opts.guard, Some(0.45));
    }

    #[test]
    fn test_guard_out_of_range_is_rejected() {
        assert!(Cli::try_parse_from(["fed-corpus", "clean", "--guard", "1.5"]).is_err());
        assert!(Cli::try_parse_from(["fed-corpus", "clean", "--guard", "abc"]).is_err());
    }

    #[test]
    fn test_vocab_and_init_args() {
        let cli = Cli::try_parse_from([
            "fed-corpus", "vocab", "--min-count", "5", "--terms", "anchors.txt",
        ])
        .unwrap();
        let Commands::Vocab(args) = cli.command else {
            panic!("expected vocab");
        };
        let opts: VocabOptions = args.into();
        assert_eq!(opts.min_count, 5);
        assert_eq!(opts.terms, Some(PathBuf::from("anchors.txt")));
        assert_eq!(opts.output, None);

        let cli = Cli::try_parse_from(["fed-corpus", "init", "-o", "x.yaml", "-f"]).unwrap();
        let Commands::Init(args) = cli.command else {
            panic!("expected init");
        };
        assert_eq!(args.output, PathBuf::from("x.yaml"));
        assert!(args.force);
    }
}
