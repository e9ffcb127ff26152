//! CLI definition, tracing setup, and the run command.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use boardroom_core::agent::{Agent, EchoAgent, OpenAiAgent};
use boardroom_core::artifacts::ArtifactStore;
use boardroom_core::instructions::StageInstructions;
use boardroom_core::pipeline::{PipelineInputs, ProgressReporter, RunReport, run_pipeline};
use boardroom_core::retry::{RetryPolicy, RetryingAgent};
use boardroom_ingest::{Capabilities, collect_chunks, render_bundle};
use boardroom_shared::{
    AppConfig, Artifact, Stage, load_config, load_config_from, resolve_api_key,
};
use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Boardroom: meeting transcript in, product plan out.
#[derive(Parser, Debug)]
#[command(
    name = "boardroom",
    version,
    about = "Turn a meeting transcript into notes, a PRD, an ROI review and a Jira plan.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Meeting transcript file.
    pub transcript: Option<PathBuf>,

    /// Folder of supporting documents (defaults to `context`).
    #[arg(long)]
    pub context: Option<PathBuf>,

    /// Folder of stage instruction files (defaults to `agents`).
    #[arg(long)]
    pub agents: Option<PathBuf>,

    /// Output folder (defaults to `out`).
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Config file (defaults to ~/.boardroom/boardroom.toml).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Model identifier, overriding the config file.
    #[arg(short, long)]
    pub model: Option<String>,

    /// Run every stage with an offline echo agent instead of the API.
    #[arg(long)]
    pub dry_run: bool,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text")]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr; stdout carries
/// the user-facing messages.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "boardroom=warn",
        1 => "boardroom=info",
        2 => "boardroom=debug",
        _ => "boardroom=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// How a run ended, short of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    Completed,
    Usage,
    MissingTranscript,
}

impl Outcome {
    fn exit_code(self) -> ExitCode {
        match self {
            Self::Completed => ExitCode::SUCCESS,
            Self::Usage | Self::MissingTranscript => ExitCode::from(1),
        }
    }
}

/// Directories and config for one run, after applying CLI overrides.
#[derive(Debug, Clone)]
pub(crate) struct RunSettings {
    pub context_dir: PathBuf,
    pub agents_dir: PathBuf,
    pub out_dir: PathBuf,
    pub config: AppConfig,
}

impl RunSettings {
    /// CLI flags win over the config file, which wins over defaults.
    pub(crate) fn resolve(cli: &Cli, mut config: AppConfig) -> Self {
        if let Some(model) = &cli.model {
            config.agent.model = model.clone();
        }
        Self {
            context_dir: cli
                .context
                .clone()
                .unwrap_or_else(|| PathBuf::from(&config.paths.context_dir)),
            agents_dir: cli
                .agents
                .clone()
                .unwrap_or_else(|| PathBuf::from(&config.paths.agents_dir)),
            out_dir: cli
                .out
                .clone()
                .unwrap_or_else(|| PathBuf::from(&config.paths.out_dir)),
            config,
        }
    }
}

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<ExitCode> {
    let transcript = match locate_transcript(cli.transcript.as_deref()) {
        Ok(path) => path.to_path_buf(),
        Err(outcome) => return Ok(outcome.exit_code()),
    };

    let config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    let settings = RunSettings::resolve(&cli, config);

    let outcome = execute(&transcript, &settings, cli.dry_run)?;
    Ok(outcome.exit_code())
}

/// Check the transcript argument before anything else happens.
pub(crate) fn locate_transcript(arg: Option<&Path>) -> std::result::Result<&Path, Outcome> {
    let Some(path) = arg else {
        println!("Usage: boardroom <transcript-file>");
        return Err(Outcome::Usage);
    };
    if !path.exists() {
        println!("ERROR: Transcript file not found: {}", path.display());
        return Err(Outcome::MissingTranscript);
    }
    Ok(path)
}

/// Everything after argument checks. Configuration problems surface before
/// the output directory is touched.
pub(crate) fn execute(
    transcript_path: &Path,
    settings: &RunSettings,
    dry_run: bool,
) -> Result<Outcome> {
    let bytes = std::fs::read(transcript_path)
        .wrap_err_with(|| format!("failed to read transcript {}", transcript_path.display()))?;
    let transcript = String::from_utf8_lossy(&bytes).into_owned();

    let instructions = StageInstructions::load(&settings.agents_dir)?;
    let agent = build_agent(&settings.config, dry_run)?;

    let caps = Capabilities::detect();
    let chunks = collect_chunks(&settings.context_dir, &caps);
    for chunk in &chunks {
        debug!(file = %chunk.file_name, preview_len = chunk.body.len(), "context chunk");
    }
    let context_bundle = render_bundle(&chunks);
    info!(
        transcript = %transcript_path.display(),
        bundle_len = context_bundle.len(),
        dry_run,
        "inputs ready"
    );

    let inputs = PipelineInputs {
        transcript,
        context_bundle,
        model: settings.config.agent.model.clone(),
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
    };

    let mut store = ArtifactStore::create(&settings.out_dir)?;
    let reporter = CliProgress::new();
    let report = run_pipeline(agent.as_ref(), &inputs, &instructions, &mut store, &reporter)?;

    print_summary(&report);
    Ok(Outcome::Completed)
}

fn build_agent(config: &AppConfig, dry_run: bool) -> Result<Box<dyn Agent>> {
    if dry_run {
        info!("dry run, using the echo agent");
        return Ok(Box::new(EchoAgent));
    }
    let api_key = resolve_api_key(config)?;
    let client = OpenAiAgent::new(&config.agent, api_key)?;
    let model = client.model().to_string();
    let agent = RetryingAgent::new(client, RetryPolicy::from(&config.retry));
    info!(%model, max_attempts = agent.policy().max_attempts, "agent ready");
    Ok(Box::new(agent))
}

fn print_summary(report: &RunReport) {
    println!();
    println!("  Done in {:.1}s", report.elapsed.as_secs_f64());
    println!("  Generated:");
    for (_, path) in &report.artifacts {
        println!("  - {}", path.display());
    }
    println!("  - {}", report.manifest_path.display());
    if !report.notes_structured {
        println!("  (notes were not valid JSON; later stages used the raw text)");
    }
    println!();
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .map(|s| s.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]))
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn stage_started(&self, stage: Stage) {
        self.spinner.set_message(stage.label());
    }

    fn stage_skipped(&self, stage: Stage, reason: &str) {
        self.spinner.println(format!("  skipped {stage}: {reason}"));
    }

    fn artifact_written(&self, artifact: Artifact, path: &Path) {
        self.spinner
            .println(format!("  wrote {artifact} -> {}", path.display()));
    }

    fn done(&self, _report: &RunReport) {
        self.spinner.finish_and_clear();
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        // A failed stage never reaches `done`.
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(prefix: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("{prefix}-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn workspace() -> PathBuf {
        let root = temp_dir("boardroom-cli");
        let agents = root.join("agents");
        std::fs::create_dir_all(&agents).unwrap();
        for file in [
            "librarian.txt",
            "chief_of_staff.txt",
            "prd_writer.txt",
            "cfo_critic.txt",
            "coo_jira.txt",
        ] {
            std::fs::write(agents.join(file), format!("Instruction for {file}")).unwrap();
        }
        std::fs::write(root.join("meeting.txt"), "Bob: budget approved.").unwrap();
        root
    }

    fn settings(root: &Path) -> RunSettings {
        let cli = Cli::try_parse_from([
            "boardroom",
            "meeting.txt",
            "--context",
            root.join("context").to_str().unwrap(),
            "--agents",
            root.join("agents").to_str().unwrap(),
            "--out",
            root.join("out").to_str().unwrap(),
        ])
        .unwrap();
        RunSettings::resolve(&cli, AppConfig::default())
    }

    #[test]
    fn parses_flags() {
        let cli = Cli::try_parse_from([
            "boardroom",
            "t.txt",
            "--out",
            "build",
            "--model",
            "gpt-4.1",
            "--dry-run",
            "-vv",
            "--log-format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.transcript.as_deref(), Some(Path::new("t.txt")));
        assert_eq!(cli.verbose, 2);
        assert!(cli.dry_run);
        assert!(matches!(cli.log_format, LogFormat::Json));
    }

    #[test]
    fn flags_override_config_and_defaults_apply() {
        let cli = Cli::try_parse_from(["boardroom", "t.txt", "--model", "gpt-4.1", "--out", "x"])
            .unwrap();
        let settings = RunSettings::resolve(&cli, AppConfig::default());
        assert_eq!(settings.config.agent.model, "gpt-4.1");
        assert_eq!(settings.out_dir, PathBuf::from("x"));
        assert_eq!(settings.agents_dir, PathBuf::from("agents"));
        assert_eq!(settings.context_dir, PathBuf::from("context"));
    }

    #[test]
    fn missing_argument_is_usage() {
        assert_eq!(locate_transcript(None), Err(Outcome::Usage));
    }

    #[test]
    fn missing_transcript_writes_nothing() {
        let root = temp_dir("boardroom-cli");
        let missing = root.join("nope.txt");
        assert_eq!(
            locate_transcript(Some(missing.as_path())),
            Err(Outcome::MissingTranscript)
        );
        assert_eq!(std::fs::read_dir(&root).unwrap().count(), 0);
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn dry_run_without_context_skips_librarian() {
        let root = workspace();
        let settings = settings(&root);

        let outcome = execute(&root.join("meeting.txt"), &settings, true).unwrap();
        assert_eq!(outcome, Outcome::Completed);

        let out = root.join("out");
        assert!(!out.join("context.md").exists());
        assert!(out.join("notes_raw.txt").exists());
        assert!(!out.join("notes.json").exists());
        assert!(out.join("prd.md").exists());
        assert!(out.join("roi_review.md").exists());
        assert!(out.join("jira_plan.json").exists());
        assert!(out.join("manifest.json").exists());

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn transcript_with_invalid_utf8_still_runs() {
        let root = workspace();
        std::fs::write(root.join("meeting.txt"), b"caf\xe9 meeting").unwrap();
        let settings = settings(&root);

        let outcome = execute(&root.join("meeting.txt"), &settings, true).unwrap();
        assert_eq!(outcome, Outcome::Completed);
        assert!(root.join("out").join("notes_raw.txt").exists());

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn build_agent_needs_key_unless_dry_run() {
        let mut config = AppConfig::default();
        config.agent.api_key_env = "BOARDROOM_TEST_KEY_UNSET".into();
        assert!(build_agent(&config, false).is_err());
        assert!(build_agent(&config, true).is_ok());
    }

    #[test]
    fn dry_run_with_context_writes_context_pack() {
        let root = workspace();
        std::fs::create_dir_all(root.join("context")).unwrap();
        std::fs::write(root.join("context").join("brief.md"), "# Launch brief").unwrap();
        let settings = settings(&root);

        execute(&root.join("meeting.txt"), &settings, true).unwrap();

        let context = std::fs::read_to_string(root.join("out").join("context.md")).unwrap();
        assert!(context.contains("Instruction for librarian.txt"));

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn missing_instruction_fails_before_output_dir_exists() {
        let root = workspace();
        std::fs::remove_file(root.join("agents").join("prd_writer.txt")).unwrap();
        let settings = settings(&root);

        let err = execute(&root.join("meeting.txt"), &settings, true).unwrap_err();
        assert!(err.to_string().contains("prd_writer.txt"));
        assert!(!root.join("out").exists());

        let _ = std::fs::remove_dir_all(&root);
    }
}
