//! `sshkg` with no generation flags: the full-screen algorithm picker.

use crate::config::Config;
use crate::tui::{self, ControllerSettings, Lifecycle};
use anyhow::Result;
use tracing::info;

/// Build the session settings from config and run the interactive screens.
/// Returns the process exit code.
pub async fn run(cfg: &Config) -> Result<i32> {
    let settings = settings_from(cfg)?;
    info!(directory = %settings.directory.display(), "starting interactive session");

    let outcome = tui::run(settings).await?;
    if let Some(summary) = &outcome.result {
        info!(fingerprint = %summary.fingerprint, "interactive generation complete");
    }

    Ok(match outcome.lifecycle {
        Lifecycle::Error => 1,
        _ => 0,
    })
}

fn settings_from(cfg: &Config) -> Result<ControllerSettings> {
    Ok(ControllerSettings {
        directory: cfg.default.directory.clone(),
        comment: cfg.default.comment.clone(),
        initial: cfg.default_algorithm()?,
        tick: cfg.interactive.tick(),
        settle: cfg.interactive.settle(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sshkg_core::Algorithm;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn settings_follow_config() {
        let cfg: Config = toml::from_str(
            r#"
[default]
algorithm = "ecdsa"
comment = "me@box"
directory = "/tmp/keys"

[interactive]
tick_ms = 40
settle_ms = 500
"#,
        )
        .unwrap();

        let settings = settings_from(&cfg).unwrap();
        assert_eq!(settings.initial, Algorithm::Ecdsa);
        assert_eq!(settings.comment, "me@box");
        assert_eq!(settings.directory, PathBuf::from("/tmp/keys"));
        assert_eq!(settings.tick, Duration::from_millis(40));
        assert_eq!(settings.settle, Duration::from_millis(500));
    }
}
