//! The five-stage key generation pipeline.
//!
//! `Pipeline` owns a validated [`KeyRequest`] and the artifact produced by
//! each finished stage. A stage is handed out as an owned [`StageJob`] that
//! can run on any thread; its [`Artifact`] is fed back through
//! [`Pipeline::apply`], which refuses anything but the next stage in order.
//! The interactive front end dispatches jobs one at a time; the
//! non-interactive path calls [`Pipeline::run_to_completion`].

use crate::catalog::{self, Algorithm};
use crate::encode::{self, AuthorizedKeyLine};
use crate::error::{KeygenError, KeygenResult};
use crate::material::KeyMaterial;
use crate::persist::{self, PRIVATE_KEY_MODE, PUBLIC_KEY_MODE};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

/// One step of the pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    GenerateKeypair,
    EncodePrivate,
    EncodePublic,
    PersistPrivate,
    PersistPublic,
}

impl Stage {
    pub const COUNT: u8 = 5;

    pub const ALL: [Stage; 5] = [
        Stage::GenerateKeypair,
        Stage::EncodePrivate,
        Stage::EncodePublic,
        Stage::PersistPrivate,
        Stage::PersistPublic,
    ];

    /// 1-based position in the pipeline.
    pub fn index(self) -> u8 {
        match self {
            Stage::GenerateKeypair => 1,
            Stage::EncodePrivate => 2,
            Stage::EncodePublic => 3,
            Stage::PersistPrivate => 4,
            Stage::PersistPublic => 5,
        }
    }

    pub fn next(self) -> Option<Stage> {
        Stage::ALL.get(usize::from(self.index())).copied()
    }

    pub fn label(self) -> &'static str {
        match self {
            Stage::GenerateKeypair => "generate keypair",
            Stage::EncodePrivate => "encode private key",
            Stage::EncodePublic => "encode public key",
            Stage::PersistPrivate => "write private key",
            Stage::PersistPublic => "write public key",
        }
    }
}

/// What to generate and where to put it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRequest {
    pub algorithm: Algorithm,
    pub bits: u32,
    pub comment: String,
    pub private_path: PathBuf,
    pub public_path: PathBuf,
}

impl KeyRequest {
    /// Request with the algorithm's default file names in the current directory.
    pub fn new(algorithm: Algorithm, bits: u32, comment: impl Into<String>) -> Self {
        let private_path = PathBuf::from(algorithm.default_file_stem());
        Self {
            algorithm,
            bits,
            comment: comment.into(),
            public_path: public_path_for(&private_path),
            private_path,
        }
    }

    /// Place the default file names under `dir`.
    pub fn in_directory(self, dir: &Path) -> Self {
        let private = dir.join(self.algorithm.default_file_stem());
        self.with_private_path(private)
    }

    /// Explicit private key path; the public key goes next to it as `<path>.pub`.
    pub fn with_private_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.private_path = path.into();
        self.public_path = public_path_for(&self.private_path);
        self
    }

    /// Explicit paths for both files.
    pub fn with_paths(mut self, private: impl Into<PathBuf>, public: impl Into<PathBuf>) -> Self {
        self.private_path = private.into();
        self.public_path = public.into();
        self
    }

    /// Both target paths, private first.
    pub fn paths(&self) -> [&Path; 2] {
        [self.private_path.as_path(), self.public_path.as_path()]
    }
}

/// `<private>.pub`, appended rather than replacing any extension.
pub fn public_path_for(private: &Path) -> PathBuf {
    let mut name = private.as_os_str().to_owned();
    name.push(".pub");
    PathBuf::from(name)
}

/// Output of a finished stage.
#[derive(Debug, Clone)]
pub enum Artifact {
    KeyPair(Arc<KeyMaterial>),
    PrivatePem(Arc<Zeroizing<String>>),
    PublicLine(AuthorizedKeyLine),
    PrivateWritten,
    PublicWritten,
}

impl Artifact {
    pub fn stage(&self) -> Stage {
        match self {
            Artifact::KeyPair(_) => Stage::GenerateKeypair,
            Artifact::PrivatePem(_) => Stage::EncodePrivate,
            Artifact::PublicLine(_) => Stage::EncodePublic,
            Artifact::PrivateWritten => Stage::PersistPrivate,
            Artifact::PublicWritten => Stage::PersistPublic,
        }
    }
}

/// A self-contained unit of stage work.
#[derive(Debug, Clone)]
pub enum StageJob {
    Generate {
        algorithm: Algorithm,
        bits: u32,
    },
    EncodePrivate {
        algorithm: Algorithm,
        key: Arc<KeyMaterial>,
    },
    EncodePublic {
        algorithm: Algorithm,
        key: Arc<KeyMaterial>,
        comment: String,
    },
    PersistPrivate {
        path: PathBuf,
        pem: Arc<Zeroizing<String>>,
    },
    PersistPublic {
        path: PathBuf,
        line: String,
        /// Removed again if the public write fails.
        private_path: PathBuf,
    },
}

impl StageJob {
    pub fn stage(&self) -> Stage {
        match self {
            StageJob::Generate { .. } => Stage::GenerateKeypair,
            StageJob::EncodePrivate { .. } => Stage::EncodePrivate,
            StageJob::EncodePublic { .. } => Stage::EncodePublic,
            StageJob::PersistPrivate { .. } => Stage::PersistPrivate,
            StageJob::PersistPublic { .. } => Stage::PersistPublic,
        }
    }

    /// Execute the stage. Blocking; RSA generation may take seconds.
    pub fn run(self) -> KeygenResult<Artifact> {
        let stage = self.stage();
        debug!(stage = stage.label(), "stage started");

        let artifact = match self {
            StageJob::Generate { algorithm, bits } => {
                Artifact::KeyPair(Arc::new(KeyMaterial::generate(algorithm, bits)?))
            }
            StageJob::EncodePrivate { algorithm, key } => {
                Artifact::PrivatePem(Arc::new(encode::encode_private(&key, algorithm)?))
            }
            StageJob::EncodePublic {
                algorithm,
                key,
                comment,
            } => Artifact::PublicLine(encode::encode_public(&key, algorithm, &comment)?),
            StageJob::PersistPrivate { path, pem } => {
                persist::write_atomic(&path, pem.as_bytes(), PRIVATE_KEY_MODE)?;
                Artifact::PrivateWritten
            }
            StageJob::PersistPublic {
                path,
                line,
                private_path,
            } => {
                if let Err(e) = persist::write_atomic(&path, line.as_bytes(), PUBLIC_KEY_MODE) {
                    warn!(
                        private = %private_path.display(),
                        error = %e,
                        "public key write failed, removing private key"
                    );
                    persist::remove_best_effort(&private_path);
                    return Err(e);
                }
                Artifact::PublicWritten
            }
        };

        debug!(stage = stage.label(), "stage finished");
        Ok(artifact)
    }
}

/// Summary of a fully written key pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedKeyPair {
    pub algorithm: Algorithm,
    pub bits: u32,
    pub comment: String,
    pub private_path: PathBuf,
    pub public_path: PathBuf,
    pub key_type: String,
    pub fingerprint: String,
}

/// Validated request plus the artifacts of every finished stage.
#[derive(Debug)]
pub struct Pipeline {
    request: KeyRequest,
    key: Option<Arc<KeyMaterial>>,
    private_pem: Option<Arc<Zeroizing<String>>>,
    public_line: Option<AuthorizedKeyLine>,
    private_written: bool,
    public_written: bool,
}

impl Pipeline {
    /// Validate the request. Nothing is generated or written here.
    ///
    /// The stored request carries the effective key size (ED25519 → 256).
    pub fn new(mut request: KeyRequest) -> KeygenResult<Self> {
        request.bits = catalog::validate(request.algorithm, request.bits)?;

        if request.comment.contains(['\n', '\r']) {
            return Err(KeygenError::Validation(
                "key comment must be a single line".into(),
            ));
        }
        if request.private_path == request.public_path {
            return Err(KeygenError::Validation(format!(
                "private and public key paths are identical: {}",
                request.private_path.display()
            )));
        }

        Ok(Self {
            request,
            key: None,
            private_pem: None,
            public_line: None,
            private_written: false,
            public_written: false,
        })
    }

    pub fn request(&self) -> &KeyRequest {
        &self.request
    }

    /// Last stage whose artifact has been applied.
    pub fn completed(&self) -> Option<Stage> {
        if self.public_written {
            Some(Stage::PersistPublic)
        } else if self.private_written {
            Some(Stage::PersistPrivate)
        } else if self.public_line.is_some() {
            Some(Stage::EncodePublic)
        } else if self.private_pem.is_some() {
            Some(Stage::EncodePrivate)
        } else if self.key.is_some() {
            Some(Stage::GenerateKeypair)
        } else {
            None
        }
    }

    /// Stage that may run next, or `None` once everything is written.
    pub fn next_stage(&self) -> Option<Stage> {
        match self.completed() {
            None => Some(Stage::GenerateKeypair),
            Some(stage) => stage.next(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.public_written
    }

    pub fn key(&self) -> Option<&KeyMaterial> {
        self.key.as_deref()
    }

    pub fn public_line(&self) -> Option<&AuthorizedKeyLine> {
        self.public_line.as_ref()
    }

    /// Build the job for `stage`. Fails unless `stage` is the next one.
    pub fn job(&self, stage: Stage) -> KeygenResult<StageJob> {
        if self.next_stage() != Some(stage) {
            return Err(KeygenError::OutOfOrder(format!(
                "cannot {} after {}",
                stage.label(),
                self.completed().map_or("nothing", Stage::label)
            )));
        }

        let req = &self.request;
        let job = match stage {
            Stage::GenerateKeypair => StageJob::Generate {
                algorithm: req.algorithm,
                bits: req.bits,
            },
            Stage::EncodePrivate => StageJob::EncodePrivate {
                algorithm: req.algorithm,
                key: self.require(&self.key, stage)?,
            },
            Stage::EncodePublic => StageJob::EncodePublic {
                algorithm: req.algorithm,
                key: self.require(&self.key, stage)?,
                comment: req.comment.clone(),
            },
            Stage::PersistPrivate => StageJob::PersistPrivate {
                path: req.private_path.clone(),
                pem: self.require(&self.private_pem, stage)?,
            },
            Stage::PersistPublic => StageJob::PersistPublic {
                path: req.public_path.clone(),
                line: self.require(&self.public_line, stage)?.line,
                private_path: req.private_path.clone(),
            },
        };
        Ok(job)
    }

    /// Job for the next stage, if any remain.
    pub fn next_job(&self) -> KeygenResult<Option<StageJob>> {
        self.next_stage().map(|stage| self.job(stage)).transpose()
    }

    /// Record a finished stage's artifact. Returns the stage it completed.
    pub fn apply(&mut self, artifact: Artifact) -> KeygenResult<Stage> {
        let stage = artifact.stage();
        if self.next_stage() != Some(stage) {
            return Err(KeygenError::OutOfOrder(format!(
                "unexpected result for {} (expected {})",
                stage.label(),
                self.next_stage().map_or("nothing", Stage::label)
            )));
        }

        match artifact {
            Artifact::KeyPair(key) => {
                if key.algorithm() != self.request.algorithm {
                    return Err(KeygenError::Encoding(format!(
                        "generated {} key for a {} request",
                        key.algorithm(),
                        self.request.algorithm
                    )));
                }
                self.key = Some(key);
            }
            Artifact::PrivatePem(pem) => self.private_pem = Some(pem),
            Artifact::PublicLine(line) => self.public_line = Some(line),
            Artifact::PrivateWritten => self.private_written = true,
            Artifact::PublicWritten => self.public_written = true,
        }

        debug!(stage = stage.label(), index = stage.index(), "artifact applied");
        Ok(stage)
    }

    /// Run one stage synchronously.
    pub fn run_stage(&mut self, stage: Stage) -> KeygenResult<Stage> {
        let artifact = self.job(stage)?.run()?;
        self.apply(artifact)
    }

    /// Run every remaining stage in order, reporting each completed stage.
    pub fn run_to_completion(
        &mut self,
        mut on_stage: impl FnMut(Stage),
    ) -> KeygenResult<GeneratedKeyPair> {
        while let Some(stage) = self.next_stage() {
            self.run_stage(stage)?;
            on_stage(stage);
        }
        self.summary().ok_or_else(|| {
            KeygenError::OutOfOrder("pipeline finished without a public key".into())
        })
    }

    /// Summary of the written pair, once the last stage has completed.
    pub fn summary(&self) -> Option<GeneratedKeyPair> {
        if !self.is_complete() {
            return None;
        }
        let line = self.public_line.as_ref()?;
        let req = &self.request;
        let summary = GeneratedKeyPair {
            algorithm: req.algorithm,
            bits: req.bits,
            comment: req.comment.clone(),
            private_path: req.private_path.clone(),
            public_path: req.public_path.clone(),
            key_type: line.key_type.clone(),
            fingerprint: line.fingerprint.clone(),
        };
        info!(
            algorithm = %summary.algorithm,
            bits = summary.bits,
            fingerprint = %summary.fingerprint,
            "key pair written"
        );
        Some(summary)
    }

    fn require<T: Clone>(&self, slot: &Option<T>, stage: Stage) -> KeygenResult<T> {
        slot.clone().ok_or_else(|| {
            KeygenError::OutOfOrder(format!("missing input for {}", stage.label()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress;
    use std::fs;
    use tempfile::tempdir;

    fn file_count(dir: &Path) -> usize {
        fs::read_dir(dir).unwrap().count()
    }

    #[cfg(unix)]
    fn mode_of(path: &Path) -> u32 {
        use std::os::unix::fs::PermissionsExt;
        fs::metadata(path).unwrap().permissions().mode() & 0o777
    }

    #[test]
    fn stage_order() {
        assert_eq!(Stage::GenerateKeypair.index(), 1);
        assert_eq!(Stage::PersistPublic.index(), 5);
        assert_eq!(Stage::EncodePublic.next(), Some(Stage::PersistPrivate));
        assert_eq!(Stage::PersistPublic.next(), None);
        for pair in Stage::ALL.windows(2) {
            assert_eq!(pair[0].next(), Some(pair[1]));
        }
    }

    #[test]
    fn default_and_overridden_paths() {
        let req = KeyRequest::new(Algorithm::Ecdsa, 256, "");
        assert_eq!(req.private_path, PathBuf::from("id_ecdsa"));
        assert_eq!(req.public_path, PathBuf::from("id_ecdsa.pub"));

        let req = req.in_directory(Path::new("/keys"));
        assert_eq!(req.public_path, PathBuf::from("/keys/id_ecdsa.pub"));

        let req = req.with_private_path("deploy.key");
        assert_eq!(req.public_path, PathBuf::from("deploy.key.pub"));
    }

    #[test]
    fn ed25519_request_is_normalised_to_256() {
        let pipeline = Pipeline::new(KeyRequest::new(Algorithm::Ed25519, 4096, "")).unwrap();
        assert_eq!(pipeline.request().bits, 256);
    }

    #[test]
    fn invalid_requests_fail_before_any_work() {
        let dir = tempdir().unwrap();
        let req = KeyRequest::new(Algorithm::Ecdsa, 512, "").in_directory(dir.path());
        assert!(matches!(Pipeline::new(req), Err(KeygenError::Validation(_))));

        let req = KeyRequest::new(Algorithm::Rsa, 4096, "two\nlines").in_directory(dir.path());
        assert!(matches!(Pipeline::new(req), Err(KeygenError::Validation(_))));

        let req = KeyRequest::new(Algorithm::Rsa, 4096, "").with_paths("same", "same");
        assert!(matches!(Pipeline::new(req), Err(KeygenError::Validation(_))));

        assert_eq!(file_count(dir.path()), 0);
    }

    #[test]
    fn stages_cannot_be_skipped_or_reordered() {
        let dir = tempdir().unwrap();
        let req = KeyRequest::new(Algorithm::Ed25519, 256, "").in_directory(dir.path());
        let mut pipeline = Pipeline::new(req).unwrap();

        assert!(matches!(
            pipeline.job(Stage::EncodePrivate),
            Err(KeygenError::OutOfOrder(_))
        ));
        assert!(matches!(
            pipeline.apply(Artifact::PrivateWritten),
            Err(KeygenError::OutOfOrder(_))
        ));

        pipeline.run_stage(Stage::GenerateKeypair).unwrap();
        assert_eq!(pipeline.completed(), Some(Stage::GenerateKeypair));
        // Re-running a finished stage is refused too.
        assert!(pipeline.job(Stage::GenerateKeypair).is_err());
        assert_eq!(pipeline.next_stage(), Some(Stage::EncodePrivate));
        assert_eq!(file_count(dir.path()), 0);
    }

    #[test]
    fn foreign_key_material_is_rejected() {
        let req = KeyRequest::new(Algorithm::Ecdsa, 256, "");
        let mut pipeline = Pipeline::new(req).unwrap();
        let ed = KeyMaterial::generate(Algorithm::Ed25519, 256).unwrap();
        assert!(matches!(
            pipeline.apply(Artifact::KeyPair(Arc::new(ed))),
            Err(KeygenError::Encoding(_))
        ));
        assert_eq!(pipeline.completed(), None);
    }

    #[test]
    fn every_algorithm_writes_both_files() {
        for (algorithm, bits, token) in [
            (Algorithm::Ed25519, 256, "ssh-ed25519"),
            (Algorithm::Ecdsa, 384, "ecdsa-sha2-nistp384"),
            (Algorithm::Rsa, 2048, "ssh-rsa"),
        ] {
            let dir = tempdir().unwrap();
            let req = KeyRequest::new(algorithm, bits, "me@host").in_directory(dir.path());
            let mut pipeline = Pipeline::new(req.clone()).unwrap();

            let mut fractions = Vec::new();
            let summary = pipeline
                .run_to_completion(|stage| fractions.push(progress::fraction(stage)))
                .unwrap();

            assert_eq!(fractions, vec![0.2, 0.4, 0.6, 0.8, 1.0]);
            assert_eq!(summary.key_type, token);
            assert_eq!(summary.bits, bits);

            let public = fs::read_to_string(&req.public_path).unwrap();
            assert!(public.starts_with(&format!("{token} ")));
            assert!(public.ends_with(" me@host\n"));
            assert!(fs::read_to_string(&req.private_path)
                .unwrap()
                .starts_with("-----BEGIN "));

            #[cfg(unix)]
            {
                assert_eq!(mode_of(&req.private_path), 0o600);
                assert_eq!(mode_of(&req.public_path), 0o644);
            }
        }
    }

    #[test]
    fn jobs_can_run_off_thread() {
        let dir = tempdir().unwrap();
        let req = KeyRequest::new(Algorithm::Ecdsa, 256, "").in_directory(dir.path());
        let mut pipeline = Pipeline::new(req).unwrap();

        while let Some(job) = pipeline.next_job().unwrap() {
            let artifact = std::thread::spawn(move || job.run()).join().unwrap().unwrap();
            pipeline.apply(artifact).unwrap();
        }
        assert!(pipeline.is_complete());
        assert!(pipeline.summary().is_some());
        assert_eq!(file_count(dir.path()), 2);
    }

    #[test]
    fn public_write_failure_removes_private_key() {
        let dir = tempdir().unwrap();
        let private = dir.path().join("id_ed25519");
        let public = dir.path().join("missing-dir").join("id_ed25519.pub");
        let req = KeyRequest::new(Algorithm::Ed25519, 256, "").with_paths(&private, &public);
        let mut pipeline = Pipeline::new(req).unwrap();

        for stage in &Stage::ALL[..4] {
            pipeline.run_stage(*stage).unwrap();
        }
        assert!(private.exists());

        let err = pipeline.run_stage(Stage::PersistPublic).unwrap_err();
        assert!(matches!(err, KeygenError::Persist { .. }));
        assert!(!private.exists());
        assert!(!public.exists());
        assert!(!pipeline.is_complete());
        assert_eq!(file_count(dir.path()), 0);
    }

    #[test]
    fn rerun_replaces_both_files() {
        let dir = tempdir().unwrap();
        let req = KeyRequest::new(Algorithm::Ed25519, 256, "first").in_directory(dir.path());
        fs::write(&req.private_path, "old private").unwrap();
        fs::write(&req.public_path, "old public").unwrap();

        Pipeline::new(req.clone())
            .unwrap()
            .run_to_completion(|_| {})
            .unwrap();
        let first_public = fs::read_to_string(&req.public_path).unwrap();
        let first_private = fs::read_to_string(&req.private_path).unwrap();
        assert_ne!(first_private, "old private");

        Pipeline::new(req.clone())
            .unwrap()
            .run_to_completion(|_| {})
            .unwrap();
        assert_ne!(fs::read_to_string(&req.public_path).unwrap(), first_public);
        assert_ne!(fs::read_to_string(&req.private_path).unwrap(), first_private);
        assert_eq!(file_count(dir.path()), 2);
    }
}
