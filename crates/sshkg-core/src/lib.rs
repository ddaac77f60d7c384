//! sshkg-core: SSH key pair generation.
//!
//! Provides the algorithm catalog, key material for RSA / ED25519 / ECDSA,
//! private-key and `authorized_keys` encoders, atomic file persistence, the
//! five-stage generation pipeline and its progress mapping.

pub mod catalog;
pub mod encode;
pub mod error;
pub mod material;
pub mod persist;
pub mod pipeline;
pub mod progress;

// Re-export commonly used items at crate root.
pub use catalog::{list_algorithms, validate, Algorithm, AlgorithmSpec};
pub use encode::AuthorizedKeyLine;
pub use error::{KeygenError, KeygenResult};
pub use material::{EcdsaCurve, KeyMaterial};
pub use persist::{existing_files, write_atomic, FsProbe, PathProbe};
pub use pipeline::{Artifact, GeneratedKeyPair, KeyRequest, Pipeline, Stage, StageJob};
pub use progress::ProgressAnimator;
