//! End-to-end run: context bundle → librarian → chief of staff → PRD → ROI + Jira.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{error, info, instrument, warn};

use boardroom_shared::{
    Artifact, BoardroomError, CURRENT_SCHEMA_VERSION, Result, RunManifest, Stage,
};

use crate::agent::Agent;
use crate::artifacts::ArtifactStore;
use crate::instructions::StageInstructions;
use crate::notes::{NotesParse, parse_notes};

/// Delimiter between the transcript and the condensed context pack.
pub const CONTEXT_PACK_HEADER: &str = "===== CONTEXT PACK =====";

/// Everything one run consumes besides the agent and instructions.
#[derive(Debug, Clone)]
pub struct PipelineInputs {
    /// Full meeting transcript text.
    pub transcript: String,
    /// Output of the bundler; empty when there are no context documents.
    pub context_bundle: String,
    /// Model identifier, recorded in the manifest.
    pub model: String,
    /// Tool version string, recorded in the manifest.
    pub tool_version: String,
}

/// Result of a completed run.
#[derive(Debug)]
pub struct RunReport {
    /// Stages that ran, in order.
    pub stages: Vec<Stage>,
    /// Artifacts written, in write order.
    pub artifacts: Vec<(Artifact, PathBuf)>,
    /// Whether the notes parsed into a structured record.
    pub notes_structured: bool,
    /// Path of the written `manifest.json`.
    pub manifest_path: PathBuf,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called right before a stage's agent call.
    fn stage_started(&self, stage: Stage);
    /// Called when a stage is skipped.
    fn stage_skipped(&self, stage: Stage, reason: &str);
    /// Called after an artifact is persisted.
    fn artifact_written(&self, artifact: Artifact, path: &Path);
    /// Called when the run completes.
    fn done(&self, report: &RunReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn stage_started(&self, _stage: Stage) {}
    fn stage_skipped(&self, _stage: Stage, _reason: &str) {}
    fn artifact_written(&self, _artifact: Artifact, _path: &Path) {}
    fn done(&self, _report: &RunReport) {}
}

/// Chief-of-staff input: the transcript, plus the context pack when there is one.
pub fn combine_transcript(transcript: &str, context_pack: Option<&str>) -> String {
    match context_pack {
        Some(pack) if !pack.trim().is_empty() => {
            format!("{transcript}\n\n{CONTEXT_PACK_HEADER}\n{pack}")
        }
        _ => transcript.to_string(),
    }
}

/// Run the full pipeline.
///
/// 1. Librarian: condense the context bundle (skipped when empty)
/// 2. Chief of staff: structured notes from transcript + context pack
/// 3. PRD writer: PRD from the notes
/// 4. CFO critic: ROI review of the PRD
/// 5. COO planner: Jira plan from the PRD
///
/// Each artifact is persisted as soon as its stage returns, so a failure
/// part-way leaves every earlier artifact on disk. The manifest is written
/// last, only on success.
#[instrument(skip_all, fields(
    transcript_len = inputs.transcript.len(),
    bundle_len = inputs.context_bundle.len(),
    out_dir = %store.out_dir().display(),
))]
pub fn run_pipeline(
    agent: &dyn Agent,
    inputs: &PipelineInputs,
    instructions: &StageInstructions,
    store: &mut ArtifactStore,
    progress: &dyn ProgressReporter,
) -> Result<RunReport> {
    let start = Instant::now();
    let mut run = StageRunner {
        agent,
        instructions,
        store,
        progress,
        stages: Vec::new(),
        written: Vec::new(),
    };

    info!("starting pipeline");

    // --- Stage 0: Librarian ---
    let context_pack = if inputs.context_bundle.trim().is_empty() {
        info!("no context documents, skipping librarian");
        progress.stage_skipped(Stage::Librarian, "no context documents");
        None
    } else {
        let pack = run.call(Stage::Librarian, &inputs.context_bundle)?;
        run.persist(Artifact::Context, &pack)?;
        Some(pack)
    };

    // --- Stage 1: Chief of staff ---
    let chief_input = combine_transcript(&inputs.transcript, context_pack.as_deref());
    let raw_notes = run.call(Stage::ChiefOfStaff, &chief_input)?;
    run.persist(Artifact::NotesRaw, &raw_notes)?;

    let notes = parse_notes(&raw_notes);
    match &notes {
        NotesParse::Structured(record) => {
            let pretty = serde_json::to_string_pretty(record)
                .map_err(|e| BoardroomError::parse(format!("serialize notes: {e}")))?;
            run.persist(Artifact::NotesStructured, &pretty)?;
        }
        NotesParse::Unparsed { reason } => {
            warn!(%reason, "notes are not a JSON record, continuing with raw text");
        }
    }

    // --- Stage 2: PRD ---
    let prd = run.call(Stage::PrdWriter, &notes.prd_payload(&raw_notes))?;
    run.persist(Artifact::Prd, &prd)?;

    // --- Stage 3: ROI review ---
    let roi = run.call(Stage::CfoCritic, &prd)?;
    run.persist(Artifact::RoiReview, &roi)?;

    // --- Stage 4: Jira plan ---
    let jira = run.call(Stage::CooPlanner, &prd)?;
    if serde_json::from_str::<serde_json::Value>(&jira).is_err() {
        warn!("jira plan is not valid JSON, writing it verbatim");
    }
    run.persist(Artifact::JiraPlan, &jira)?;

    // --- Manifest ---
    let manifest = RunManifest {
        schema_version: CURRENT_SCHEMA_VERSION,
        tool_version: inputs.tool_version.clone(),
        model: inputs.model.clone(),
        stages: run.stages.clone(),
        notes_structured: notes.is_structured(),
        artifacts: run.store.records().to_vec(),
    };
    let manifest_path = run.store.write_manifest(&manifest)?;

    let report = RunReport {
        stages: run.stages,
        artifacts: run.written,
        notes_structured: manifest.notes_structured,
        manifest_path,
        elapsed: start.elapsed(),
    };

    info!(
        stages = report.stages.len(),
        artifacts = report.artifacts.len(),
        notes_structured = report.notes_structured,
        elapsed_ms = report.elapsed.as_millis(),
        "pipeline complete"
    );
    progress.done(&report);

    Ok(report)
}

/// Per-run bookkeeping shared by every stage call.
struct StageRunner<'a> {
    agent: &'a dyn Agent,
    instructions: &'a StageInstructions,
    store: &'a mut ArtifactStore,
    progress: &'a dyn ProgressReporter,
    stages: Vec<Stage>,
    written: Vec<(Artifact, PathBuf)>,
}

impl StageRunner<'_> {
    fn call(&mut self, stage: Stage, payload: &str) -> Result<String> {
        let instruction = self.instructions.get(stage)?;
        self.progress.stage_started(stage);

        let started = Instant::now();
        let output = self.agent.invoke(&instruction, payload).inspect_err(|e| {
            error!(stage = %stage, error = %e, "stage failed");
        })?;

        info!(
            stage = %stage,
            input_len = payload.len(),
            output_len = output.len(),
            elapsed_ms = started.elapsed().as_millis(),
            "stage complete"
        );
        self.stages.push(stage);
        Ok(output)
    }

    fn persist(&mut self, artifact: Artifact, contents: &str) -> Result<()> {
        let path = self.store.persist(artifact, contents)?;
        self.progress.artifact_written(artifact, &path);
        self.written.push((artifact, path));
        Ok(())
    }
}
