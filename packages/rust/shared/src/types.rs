//! Core domain types shared by the ingest and pipeline crates.

use serde::{Deserialize, Serialize};

/// Current schema version for the run manifest format.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// One discrete text-generation step of the fixed pipeline, in run order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Librarian,
    ChiefOfStaff,
    PrdWriter,
    CfoCritic,
    CooPlanner,
}

impl Stage {
    /// All stages in execution order.
    pub const ALL: [Stage; 5] = [
        Self::Librarian,
        Self::ChiefOfStaff,
        Self::PrdWriter,
        Self::CfoCritic,
        Self::CooPlanner,
    ];

    /// Stable identifier used in logs and the manifest.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Librarian => "librarian",
            Self::ChiefOfStaff => "chief_of_staff",
            Self::PrdWriter => "prd_writer",
            Self::CfoCritic => "cfo_critic",
            Self::CooPlanner => "coo_planner",
        }
    }

    /// File name of this stage's instruction text inside the agents directory.
    pub fn instruction_file(&self) -> &'static str {
        match self {
            Self::Librarian => "librarian.txt",
            Self::ChiefOfStaff => "chief_of_staff.txt",
            Self::PrdWriter => "prd_writer.txt",
            Self::CfoCritic => "cfo_critic.txt",
            Self::CooPlanner => "coo_jira.txt",
        }
    }

    /// Human-readable label for progress output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Librarian => "Librarian: building context pack",
            Self::ChiefOfStaff => "Chief of Staff: writing meeting notes",
            Self::PrdWriter => "PRD Writer: drafting requirements",
            Self::CfoCritic => "CFO Critic: reviewing ROI",
            Self::CooPlanner => "COO Planner: planning backlog",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Artifact
// ---------------------------------------------------------------------------

/// A named output payload persisted to the run's output directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Artifact {
    Context,
    NotesRaw,
    NotesStructured,
    Prd,
    RoiReview,
    JiraPlan,
}

impl Artifact {
    /// Stable artifact name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Context => "context",
            Self::NotesRaw => "notes_raw",
            Self::NotesStructured => "notes_structured",
            Self::Prd => "prd",
            Self::RoiReview => "roi_review",
            Self::JiraPlan => "jira_plan",
        }
    }

    /// File name inside the output directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Context => "context.md",
            Self::NotesRaw => "notes_raw.txt",
            Self::NotesStructured => "notes.json",
            Self::Prd => "prd.md",
            Self::RoiReview => "roi_review.md",
            Self::JiraPlan => "jira_plan.json",
        }
    }

    /// The stage whose output this artifact holds.
    pub fn producer(&self) -> Stage {
        match self {
            Self::Context => Stage::Librarian,
            Self::NotesRaw | Self::NotesStructured => Stage::ChiefOfStaff,
            Self::Prd => Stage::PrdWriter,
            Self::RoiReview => Stage::CfoCritic,
            Self::JiraPlan => Stage::CooPlanner,
        }
    }
}

impl std::fmt::Display for Artifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// RunManifest
// ---------------------------------------------------------------------------

/// The `manifest.json` written at the end of a successful run.
///
/// Deliberately free of timestamps and ids: two runs over identical inputs
/// with identical agent output produce identical manifests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    /// Schema version for forward compatibility.
    pub schema_version: u32,
    /// Tool version that produced the run.
    pub tool_version: String,
    /// Model identifier the agent was configured with.
    pub model: String,
    /// Stages that ran, in order.
    pub stages: Vec<Stage>,
    /// Whether the chief-of-staff output parsed into a structured record.
    pub notes_structured: bool,
    /// Persisted artifacts, in write order.
    pub artifacts: Vec<ArtifactRecord>,
}

/// One persisted artifact as recorded in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    /// Artifact name.
    pub artifact: Artifact,
    /// File name inside the output directory.
    pub file: String,
    /// Content length in bytes.
    pub bytes: usize,
    /// SHA-256 of the content, lowercase hex.
    pub sha256: String,
}
