//! Per-stage instruction texts, read from the agents directory.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use boardroom_shared::{BoardroomError, Result, Stage};

/// Instruction texts for one run.
///
/// The four always-run stages are read eagerly by [`StageInstructions::load`],
/// so a missing file fails the run before any agent call. The librarian text
/// is only read when a context bundle exists.
#[derive(Debug, Clone)]
pub struct StageInstructions {
    dir: PathBuf,
    chief_of_staff: String,
    prd_writer: String,
    cfo_critic: String,
    coo_planner: String,
}

impl StageInstructions {
    #[instrument(skip_all, fields(dir = %dir.display()))]
    pub fn load(dir: &Path) -> Result<Self> {
        let instructions = Self {
            dir: dir.to_path_buf(),
            chief_of_staff: read_instruction(dir, Stage::ChiefOfStaff)?,
            prd_writer: read_instruction(dir, Stage::PrdWriter)?,
            cfo_critic: read_instruction(dir, Stage::CfoCritic)?,
            coo_planner: read_instruction(dir, Stage::CooPlanner)?,
        };
        debug!("stage instructions loaded");
        Ok(instructions)
    }

    /// Instruction text for `stage`.
    pub fn get(&self, stage: Stage) -> Result<Cow<'_, str>> {
        Ok(match stage {
            Stage::Librarian => Cow::Owned(read_instruction(&self.dir, Stage::Librarian)?),
            Stage::ChiefOfStaff => Cow::Borrowed(&self.chief_of_staff),
            Stage::PrdWriter => Cow::Borrowed(&self.prd_writer),
            Stage::CfoCritic => Cow::Borrowed(&self.cfo_critic),
            Stage::CooPlanner => Cow::Borrowed(&self.coo_planner),
        })
    }
}

fn read_instruction(dir: &Path, stage: Stage) -> Result<String> {
    let path = dir.join(stage.instruction_file());
    match std::fs::read_to_string(&path) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(BoardroomError::config(
            format!("missing instruction file for {stage}: {}", path.display()),
        )),
        Err(e) => Err(BoardroomError::io(path, e)),
    }
}
