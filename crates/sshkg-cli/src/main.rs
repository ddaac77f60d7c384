//! sshkg: SSH key pair generator.
//!
//! Generates RSA, ED25519 and ECDSA key pairs as a private key file plus an
//! OpenSSH `authorized_keys` line. Without generation flags it opens an
//! interactive algorithm picker; with any of `-t`, `-b`, `-f`, `-C` or
//! `-force` it runs once and exits.

mod commands;
mod config;
mod tui;

use clap::Parser;
use commands::generate::GenerateArgs;
use sshkg_core::Algorithm;
use std::ffi::OsString;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{error, warn};
use tracing_subscriber::fmt::writer::BoxMakeWriter;

/// sshkg: SSH key pair generator
#[derive(Parser, Debug)]
#[command(
    name = "sshkg",
    version,
    about = "Generate SSH key pairs (RSA, ED25519, ECDSA)",
    long_about = "Generate SSH key pairs (RSA, ED25519, ECDSA).\n\n\
        Run without generation flags for the interactive picker."
)]
struct Cli {
    /// Key algorithm: rsa, ed25519 or ecdsa
    #[arg(short = 't', value_name = "ALGORITHM")]
    algorithm: Option<String>,

    /// Key size in bits (default depends on the algorithm)
    #[arg(short = 'b', value_name = "BITS")]
    bits: Option<u32>,

    /// Private key output path (public key gets a .pub suffix)
    #[arg(short = 'f', value_name = "FILE")]
    file: Option<PathBuf>,

    /// Comment appended to the public key
    #[arg(short = 'C', value_name = "COMMENT")]
    comment: Option<String>,

    /// Overwrite existing key files (also accepted as -force)
    #[arg(long)]
    force: bool,

    /// Config file path
    #[arg(long = "config", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Any generation flag selects the one-shot mode.
    fn is_interactive(&self) -> bool {
        self.algorithm.is_none()
            && self.bits.is_none()
            && self.file.is_none()
            && self.comment.is_none()
            && !self.force
    }
}

/// Accept the single-dash `-force` spelling.
fn normalize_args(args: impl IntoIterator<Item = OsString>) -> Vec<OsString> {
    args.into_iter()
        .map(|arg| {
            if arg == "-force" {
                OsString::from("--force")
            } else {
                arg
            }
        })
        .collect()
}

fn init_tracing(verbose: bool, writer: BoxMakeWriter) {
    let filter = if verbose {
        "sshkg=debug,sshkg_cli=debug,sshkg_core=debug"
    } else {
        "sshkg=warn,sshkg_cli=warn,sshkg_core=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(writer)
        .init();
}

/// Log destination. The interactive screen owns the terminal, so logs go
/// to the configured file there, or nowhere.
fn log_writer(interactive: bool, log_file: Option<&PathBuf>) -> BoxMakeWriter {
    if !interactive {
        return BoxMakeWriter::new(std::io::stderr);
    }
    match log_file {
        Some(path) => match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => BoxMakeWriter::new(Mutex::new(file)),
            Err(e) => {
                eprintln!("sshkg: cannot open log file {}: {e}", path.display());
                BoxMakeWriter::new(std::io::sink)
            }
        },
        None => BoxMakeWriter::new(std::io::sink),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse_from(normalize_args(std::env::args_os()));
    let interactive = cli.is_interactive();

    let config_path = cli.config.clone().unwrap_or_else(config::Config::default_path);
    let loaded = config::Config::load(&config_path);
    let log_file = loaded.as_ref().ok().and_then(|c| c.default.log_file.clone());
    init_tracing(cli.verbose, log_writer(interactive, log_file.as_ref()));

    let cfg = loaded.unwrap_or_else(|e| {
        warn!("{e:#}; using defaults");
        eprintln!("sshkg: {e:#}; using defaults");
        config::Config::default()
    });

    let code = if interactive {
        match commands::interactive::run(&cfg).await {
            Ok(code) => code,
            Err(e) => {
                error!("{e:#}");
                eprintln!("sshkg: {e:#}");
                1
            }
        }
    } else {
        let algorithm = match cli.algorithm.as_deref() {
            Some(name) => name.parse::<Algorithm>(),
            None => Ok(cfg.default_algorithm().unwrap_or(Algorithm::Rsa)),
        };
        match algorithm {
            Ok(algorithm) => commands::generate::run(&GenerateArgs {
                algorithm,
                bits: cli.bits,
                file: cli.file,
                comment: cli.comment.unwrap_or_else(|| cfg.default.comment.clone()),
                force: cli.force,
                directory: cfg.default.directory.clone(),
            }),
            Err(e) => {
                eprintln!("error: {e}");
                e.exit_code()
            }
        }
    };

    std::process::exit(code);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::parse_from(normalize_args(args.iter().map(OsString::from)))
    }

    #[test]
    fn no_flags_is_interactive() {
        assert!(parse(&["sshkg"]).is_interactive());
        assert!(parse(&["sshkg", "-v"]).is_interactive());
        assert!(parse(&["sshkg", "--config", "/tmp/c.toml"]).is_interactive());
    }

    #[test]
    fn generation_flags_select_one_shot_mode() {
        assert!(!parse(&["sshkg", "-t", "ed25519"]).is_interactive());
        assert!(!parse(&["sshkg", "-b", "2048"]).is_interactive());
        assert!(!parse(&["sshkg", "-f", "key"]).is_interactive());
        assert!(!parse(&["sshkg", "-C", "me"]).is_interactive());
        assert!(!parse(&["sshkg", "--force"]).is_interactive());
    }

    #[test]
    fn single_dash_force_is_accepted() {
        let cli = parse(&["sshkg", "-t", "ecdsa", "-force"]);
        assert!(cli.force);
        assert_eq!(cli.algorithm.as_deref(), Some("ecdsa"));
    }

    #[test]
    fn flag_values_are_captured() {
        let cli = parse(&["sshkg", "-t", "rsa", "-b", "3072", "-f", "out/id", "-C", "a b"]);
        assert_eq!(cli.bits, Some(3072));
        assert_eq!(cli.file, Some(PathBuf::from("out/id")));
        assert_eq!(cli.comment.as_deref(), Some("a b"));
    }
}
