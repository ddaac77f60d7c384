//! Stage → progress fraction and status text, plus the cosmetic easing
//! animation that chases the current target fraction.

use crate::catalog::Algorithm;
use crate::pipeline::Stage;

/// Status shown before the first stage completes.
pub const STARTING_STATUS: &str = "Starting key generation...";

/// Completion fraction after `stage` finished.
pub fn fraction(stage: Stage) -> f64 {
    f64::from(stage.index()) / f64::from(Stage::COUNT)
}

/// Status text describing the stage just completed and the one about to start.
pub fn status_text(stage: Stage, algorithm: Algorithm, bits: u32) -> String {
    match stage {
        Stage::GenerateKeypair => {
            let name = match algorithm {
                Algorithm::Ecdsa => format!("{algorithm} P-{bits}"),
                _ => algorithm.to_string(),
            };
            format!("{name} key generated, encoding private key...")
        }
        Stage::EncodePrivate => "Private key encoded, generating public key...".to_string(),
        Stage::EncodePublic => "Public key generated, writing private key...".to_string(),
        Stage::PersistPrivate => "Private key written, writing public key...".to_string(),
        Stage::PersistPublic => "Finalizing key generation...".to_string(),
    }
}

/// Human description of the key being generated ("4096-bit RSA key").
pub fn describe_key(algorithm: Algorithm, bits: u32) -> String {
    match algorithm {
        Algorithm::Rsa => format!("{bits}-bit {algorithm} key"),
        Algorithm::Ecdsa => format!("{algorithm} P-{bits} key"),
        Algorithm::Ed25519 => format!("{algorithm} key"),
    }
}

/// Eases a displayed fraction toward a target on every tick.
///
/// Purely cosmetic: the displayed value never decreases and never
/// overshoots the target.
#[derive(Debug, Clone, Default)]
pub struct ProgressAnimator {
    shown: f64,
    target: f64,
}

impl ProgressAnimator {
    /// Fraction of the remaining distance covered per tick.
    const EASING: f64 = 0.35;
    /// Snap to the target once this close.
    const EPSILON: f64 = 0.002;

    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the target. Lower targets are ignored.
    pub fn set_target(&mut self, target: f64) {
        self.target = self.target.max(target.clamp(0.0, 1.0));
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    /// Value to draw.
    pub fn shown(&self) -> f64 {
        self.shown
    }

    /// Advance one animation frame. Returns true while still moving.
    pub fn tick(&mut self) -> bool {
        let remaining = self.target - self.shown;
        if remaining <= Self::EPSILON {
            self.shown = self.target;
            return false;
        }
        self.shown += remaining * Self::EASING;
        true
    }

    pub fn is_settled(&self) -> bool {
        self.shown >= self.target
    }
}
