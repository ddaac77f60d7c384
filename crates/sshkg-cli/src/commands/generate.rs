//! `sshkg -t <alg> [-b bits] [-f file] [-C comment] [--force]`: one-shot
//! generation without the interactive screens.
//!
//! Runs the same pipeline as the interactive mode, synchronously, and prints
//! the resulting paths and fingerprint on success.

use sshkg_core::persist::{PRIVATE_KEY_MODE, PUBLIC_KEY_MODE};
use sshkg_core::progress::describe_key;
use sshkg_core::{
    existing_files, Algorithm, FsProbe, GeneratedKeyPair, KeyRequest, KeygenError, KeygenResult,
    PathProbe, Pipeline,
};
use std::path::PathBuf;
use tracing::{debug, error, info};

/// Resolved flags for a one-shot run.
#[derive(Debug, Clone)]
pub struct GenerateArgs {
    pub algorithm: Algorithm,
    /// Key size; the algorithm's default when absent.
    pub bits: Option<u32>,
    /// Private key path; the algorithm's default name in `directory` when absent.
    pub file: Option<PathBuf>,
    pub comment: String,
    pub force: bool,
    pub directory: PathBuf,
}

impl GenerateArgs {
    fn request(&self) -> KeyRequest {
        let bits = self
            .bits
            .unwrap_or_else(|| self.algorithm.spec().default_size);
        let request = KeyRequest::new(self.algorithm, bits, self.comment.clone());
        match &self.file {
            Some(file) => request.with_private_path(file),
            None => request.in_directory(&self.directory),
        }
    }
}

/// Generate a key pair and report the outcome. Returns the process exit code.
pub fn run(args: &GenerateArgs) -> i32 {
    let request = args.request();
    match generate(request.clone(), args.force, &FsProbe) {
        Ok(summary) => {
            print_summary(&summary);
            0
        }
        Err(e) => {
            error!(error = %e, "generation failed");
            eprintln!("error: {}", error_message(&e, &request));
            e.exit_code()
        }
    }
}

/// Validate, check for existing files, then run every stage.
pub fn generate(
    request: KeyRequest,
    force: bool,
    probe: &dyn PathProbe,
) -> KeygenResult<GeneratedKeyPair> {
    let mut pipeline = Pipeline::new(request)?;
    let req = pipeline.request();

    if !force {
        if let Some(existing) = existing_files(probe, req.paths()).into_iter().next() {
            return Err(KeygenError::OverwriteRefused(existing));
        }
    }

    println!("Generating {}...", describe_key(req.algorithm, req.bits));
    info!(
        algorithm = %req.algorithm,
        bits = req.bits,
        private = %req.private_path.display(),
        "starting non-interactive generation"
    );

    pipeline.run_to_completion(|stage| {
        debug!(stage = stage.label(), index = stage.index(), "stage complete");
    })
}

fn print_summary(summary: &GeneratedKeyPair) {
    println!(
        "Private key saved to {} (permissions {PRIVATE_KEY_MODE:04o})",
        summary.private_path.display()
    );
    println!(
        "Public key saved to {} (permissions {PUBLIC_KEY_MODE:04o})",
        summary.public_path.display()
    );
    if !summary.comment.is_empty() {
        println!("Key comment: {}", summary.comment);
    }
    println!("Key fingerprint: {}", summary.fingerprint);
}

/// User-facing message; names which of the two files blocked the run.
fn error_message(e: &KeygenError, request: &KeyRequest) -> String {
    match e {
        KeygenError::OverwriteRefused(path) => {
            let role = if *path == request.private_path {
                "private"
            } else {
                "public"
            };
            format!(
                "{role} key file {} already exists (use -force to overwrite)",
                path.display()
            )
        }
        other => other.to_string(),
    }
}
