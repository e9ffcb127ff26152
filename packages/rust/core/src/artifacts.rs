//! Artifact store for one run's output directory.
//!
//! Writes each stage artifact under its fixed file name, enforces the
//! write-once rule, and records a SHA-256 per file for the run manifest.
//! Layout:
//! ```text
//! <out_dir>/
//! ├── context.md        (only when a context bundle existed)
//! ├── notes_raw.txt
//! ├── notes.json        (only when the notes parsed as a record)
//! ├── prd.md
//! ├── roi_review.md
//! ├── jira_plan.json
//! └── manifest.json
//! ```

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};

use boardroom_shared::{Artifact, ArtifactRecord, BoardroomError, Result, RunManifest};

/// File name of the run manifest inside the output directory.
pub const MANIFEST_FILE: &str = "manifest.json";

const ALL_ARTIFACTS: [Artifact; 6] = [
    Artifact::Context,
    Artifact::NotesRaw,
    Artifact::NotesStructured,
    Artifact::Prd,
    Artifact::RoiReview,
    Artifact::JiraPlan,
];

/// The output directory of a single run.
#[derive(Debug)]
pub struct ArtifactStore {
    out_dir: PathBuf,
    records: Vec<ArtifactRecord>,
}

impl ArtifactStore {
    /// Create `out_dir` if needed and clear artifacts left by an earlier run,
    /// so conditional artifacts never survive from a previous transcript.
    #[instrument(skip_all, fields(out_dir = %out_dir.as_ref().display()))]
    pub fn create(out_dir: impl AsRef<Path>) -> Result<Self> {
        let out_dir = out_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&out_dir).map_err(|e| BoardroomError::io(&out_dir, e))?;

        let stale = ALL_ARTIFACTS
            .iter()
            .map(|a| a.file_name())
            .chain(std::iter::once(MANIFEST_FILE));
        for name in stale {
            let path = out_dir.join(name);
            match std::fs::remove_file(&path) {
                Ok(()) => debug!(file = name, "removed stale artifact"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(BoardroomError::io(path, e)),
            }
        }

        Ok(Self {
            out_dir,
            records: Vec::new(),
        })
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Where `artifact` lives (whether or not it has been written yet).
    pub fn path_of(&self, artifact: Artifact) -> PathBuf {
        self.out_dir.join(artifact.file_name())
    }

    pub fn contains(&self, artifact: Artifact) -> bool {
        self.records.iter().any(|r| r.artifact == artifact)
    }

    /// Records of everything written so far, in write order.
    pub fn records(&self) -> &[ArtifactRecord] {
        &self.records
    }

    /// Write `contents` verbatim. Each artifact may be written once per run.
    #[instrument(skip_all, fields(artifact = %artifact, bytes = contents.len()))]
    pub fn persist(&mut self, artifact: Artifact, contents: &str) -> Result<PathBuf> {
        if self.contains(artifact) {
            return Err(BoardroomError::validation(format!(
                "artifact {artifact} already written in this run"
            )));
        }

        let path = self.path_of(artifact);
        std::fs::write(&path, contents).map_err(|e| BoardroomError::io(&path, e))?;

        self.records.push(ArtifactRecord {
            artifact,
            file: artifact.file_name().to_string(),
            bytes: contents.len(),
            sha256: sha256_hex(contents.as_bytes()),
        });
        info!(path = %path.display(), "artifact written");
        Ok(path)
    }

    /// Write `manifest.json` (pretty, trailing newline).
    pub fn write_manifest(&self, manifest: &RunManifest) -> Result<PathBuf> {
        let path = self.out_dir.join(MANIFEST_FILE);
        let mut json = serde_json::to_string_pretty(manifest)
            .map_err(|e| BoardroomError::parse(format!("serialize manifest: {e}")))?;
        json.push('\n');
        std::fs::write(&path, json).map_err(|e| BoardroomError::io(&path, e))?;
        debug!(path = %path.display(), "manifest written");
        Ok(path)
    }
}

/// Lower-case hex SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}
