//! Ideaflow - guided ideation-to-prototype workshop in your terminal.
//!
//! Every subcommand loads the participant's project, runs one workshop
//! step and writes the result back to storage.

#![allow(clippy::single_match_else)]

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ideaflow::ai::{DisabledClient, GenerationClient};
use ideaflow::core::{
    AiExperience, AudioClip, Config, FeedbackInput, IdeaBrief, ImageSlot, Language, Message,
    ProfilePatch, ProjectState, ProjectType, SketchStyle, StitchPromptOptions, StorageBackend,
    VariantMap,
};
use ideaflow::flow::{Day1Stage, FlowError, ProgressEvent, WorkshopFlow};
use ideaflow::pipeline::{Artifact, PipelineReport};
use ideaflow::store::{
    BlobStore, DocumentStore, FileBlobStore, FileDocumentStore, Identity, MemoryBlobStore,
    MemoryDocumentStore, NoticeKind, ProjectStore,
};

/// Guided ideation-to-prototype workshop
#[derive(Parser)]
#[command(name = "ideaflow")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Participant id (overrides the configured user)
    #[arg(short, long, global = true, env = "IDEAFLOW_USER")]
    user: Option<String>,

    /// Workshop language (en, ko, am)
    #[arg(short, long, global = true)]
    lang: Option<Language>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in, creating a participant id if needed
    Login {
        /// Participant id to use
        uid: Option<String>,
    },

    /// Forget the configured participant
    Logout,

    /// Manage the participant profile
    Profile {
        #[command(subcommand)]
        operation: ProfileOperation,
    },

    /// Generate business ideas with sketches
    Ideas {
        /// Your skills and experience
        #[arg(long, default_value = "")]
        skills: String,

        /// Your target customers
        #[arg(long, default_value = "")]
        target: String,

        /// Needs in your environment
        #[arg(long, default_value = "")]
        needs: String,

        /// Sketch style
        #[arg(long, value_enum, default_value = "simple")]
        style: StyleArg,

        /// Don't confirm before replacing existing ideas
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Select an idea by its number
    SelectIdea {
        /// Idea number as shown by `status`
        number: usize,
    },

    /// Edit the selected idea
    EditIdea {
        #[arg(long)]
        title: String,

        #[arg(long)]
        description: String,
    },

    /// Generate 3-step sketches for the selected idea
    Sketch {
        /// Sketch style
        #[arg(long, value_enum, default_value = "simple")]
        style: StyleArg,

        /// Don't confirm before replacing existing sketches
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Select a sketch variation (v0, v1, ...)
    SelectSketch { key: String },

    /// Generate storyboards for the selected sketch
    Storyboard {
        /// Describe the user flow yourself instead of using the sketch
        #[arg(short, long)]
        description: Option<String>,

        /// Don't confirm before replacing existing storyboards
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Select a storyboard variation (v0, v1, ...)
    SelectStoryboard { key: String },

    /// Generate images still missing after an interrupted run
    Resume {
        #[arg(value_enum)]
        artifact: ArtifactArg,
    },

    /// Generate user-interview questions for the selected idea
    Questions,

    /// Analyze interview transcripts or recordings
    Analyze {
        /// Text transcript files
        #[arg(long, conflicts_with = "audio")]
        transcript: Vec<PathBuf>,

        /// Audio recording files
        #[arg(long)]
        audio: Vec<PathBuf>,
    },

    /// Generate a prompt for a generative web-design tool
    Prompt {
        /// Problem the site solves
        #[arg(long)]
        problem: Option<String>,

        /// Proposed solution
        #[arg(long)]
        solution: Option<String>,

        /// Kind of site
        #[arg(long, value_enum)]
        project_type: Option<ProjectTypeArg>,

        /// Number of pages (at most 6)
        #[arg(long)]
        pages: Option<usize>,

        /// Additional requirements
        #[arg(long)]
        requirements: Option<String>,
    },

    /// Show the project state
    Status {
        /// Print the raw project as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show configuration
    Config {
        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

#[derive(Subcommand)]
enum ProfileOperation {
    /// Create the profile
    Create {
        #[arg(long)]
        name: String,

        #[arg(long, default_value = "")]
        affiliation: String,

        #[arg(long, value_enum, default_value = "beginner")]
        experience: ExperienceArg,
    },

    /// Update profile fields
    Update {
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        affiliation: Option<String>,

        #[arg(long, value_enum)]
        experience: Option<ExperienceArg>,
    },

    /// Show the profile
    Show,
}

#[derive(Clone, Copy, ValueEnum)]
enum StyleArg {
    Simple,
    Professional,
}

impl From<StyleArg> for SketchStyle {
    fn from(arg: StyleArg) -> Self {
        match arg {
            StyleArg::Simple => Self::Simple,
            StyleArg::Professional => Self::Professional,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ExperienceArg {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl From<ExperienceArg> for AiExperience {
    fn from(arg: ExperienceArg) -> Self {
        match arg {
            ExperienceArg::Beginner => Self::Beginner,
            ExperienceArg::Intermediate => Self::Intermediate,
            ExperienceArg::Advanced => Self::Advanced,
            ExperienceArg::Expert => Self::Expert,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ArtifactArg {
    Ideas,
    Sketches,
    Storyboards,
}

impl From<ArtifactArg> for Artifact {
    fn from(arg: ArtifactArg) -> Self {
        match arg {
            ArtifactArg::Ideas => Self::Ideas,
            ArtifactArg::Sketches => Self::Sketches,
            ArtifactArg::Storyboards => Self::Storyboards,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ProjectTypeArg {
    LandingPage,
    WebApp,
    Ecommerce,
    Portfolio,
}

impl From<ProjectTypeArg> for ProjectType {
    fn from(arg: ProjectTypeArg) -> Self {
        match arg {
            ProjectTypeArg::LandingPage => Self::LandingPage,
            ProjectTypeArg::WebApp => Self::WebApp,
            ProjectTypeArg::Ecommerce => Self::Ecommerce,
            ProjectTypeArg::Portfolio => Self::Portfolio,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose { EnvFilter::new("debug") } else { EnvFilter::new("warn") };

    tracing_subscriber::registry().with(fmt::layer().with_target(false)).with(filter).init();

    dotenvy::dotenv().ok();

    let mut config = Config::load()?;
    if let Some(lang) = cli.lang {
        config.general.language = lang;
    }

    match cli.command {
        Commands::Login { uid } => return cmd_login(config, uid),
        Commands::Logout => return cmd_logout(config),
        Commands::Config { path } => return cmd_config(&config, path),
        _ => {}
    }

    let uid = cli.user.or_else(|| config.general.user.clone());
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(cli.command, config, uid))
}

async fn run(command: Commands, config: Config, uid: Option<String>) -> Result<()> {
    let lang = config.general.language;
    let (documents, blobs) = open_storage(&config)?;
    let store = Arc::new(ProjectStore::new(documents, lang));
    if let Some(uid) = uid {
        store.set_identity(Some(Identity::new(uid))).await?;
    }

    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let printer = tokio::spawn(print_progress(rx));
    let flow = WorkshopFlow::new(Arc::clone(&store), build_client(&config), blobs, config.pipeline)
        .with_progress(tx);

    let result = dispatch(&flow, command, lang).await;

    drop(flow);
    printer.await.ok();
    print_notices(&store, lang);
    result
}

async fn dispatch(flow: &WorkshopFlow, command: Commands, lang: Language) -> Result<()> {
    let store = flow.store();
    match command {
        Commands::Profile { operation } => cmd_profile(store, operation, lang).await,

        Commands::Ideas { skills, target, needs, style, yes } => {
            let brief = IdeaBrief { skills, target, needs };
            let report = if store.with_state(|s| s.business_ideas.is_empty()) {
                flow.generate_ideas(&brief, style.into()).await
            } else if confirm(Message::ConfirmRegenerateIdeas, lang, yes)? {
                flow.regenerate_ideas(&brief, style.into()).await
            } else {
                return Ok(());
            };
            let report = report.map_err(|e| flow_error(&e, lang))?;
            print_report("Ideas", &report);
            print_ideas(&store.state());
            Ok(())
        }

        Commands::SelectIdea { number } => {
            let index = number.checked_sub(1).context("Idea numbers start at 1")?;
            flow.select_idea(index).await.map_err(|e| flow_error(&e, lang))?;
            Ok(())
        }

        Commands::EditIdea { title, description } => {
            flow.edit_selected_idea(&title, &description).await.map_err(|e| flow_error(&e, lang))?;
            Ok(())
        }

        Commands::Sketch { style, yes } => {
            let report = if store.with_state(|s| s.three_step_sketches.is_none()) {
                flow.generate_sketches(style.into()).await
            } else if confirm(Message::ConfirmRegenerateSketches, lang, yes)? {
                flow.regenerate_sketches(style.into()).await
            } else {
                return Ok(());
            };
            let report = report.map_err(|e| flow_error(&e, lang))?;
            print_report("Sketch images", &report);
            if let Some(sketches) = store.state().three_step_sketches {
                print_variants(&sketches, |s| (&s.title, &s.image));
            }
            Ok(())
        }

        Commands::SelectSketch { key } => {
            flow.select_sketch(&key).await.map_err(|e| flow_error(&e, lang))?;
            Ok(())
        }

        Commands::Storyboard { description, yes } => {
            let description = description.as_deref();
            let report = if store.with_state(|s| s.storyboards.is_none()) {
                flow.generate_storyboards(description).await
            } else if confirm(Message::ConfirmRegenerateStoryboards, lang, yes)? {
                flow.regenerate_storyboards(description).await
            } else {
                return Ok(());
            };
            let report = report.map_err(|e| flow_error(&e, lang))?;
            print_report("Storyboard images", &report);
            if let Some(storyboards) = store.state().storyboards {
                print_variants(&storyboards, |p| (&p.title, &p.image));
            }
            Ok(())
        }

        Commands::SelectStoryboard { key } => {
            flow.select_storyboard(&key).await.map_err(|e| flow_error(&e, lang))?;
            Ok(())
        }

        Commands::Resume { artifact } => {
            let report =
                flow.resume_images(artifact.into()).await.map_err(|e| flow_error(&e, lang))?;
            print_report("Images", &report);
            Ok(())
        }

        Commands::Questions => {
            let questions =
                flow.generate_interview_questions().await.map_err(|e| flow_error(&e, lang))?;
            for (i, q) in questions.iter().enumerate() {
                println!("{}. [{}] {}", i + 1, q.category, q.question);
                println!("   Intent: {}", q.intent);
                for follow_up in &q.follow_up {
                    println!("   - {follow_up}");
                }
            }
            Ok(())
        }

        Commands::Analyze { transcript, audio } => {
            let input = read_feedback(&transcript, &audio)?;
            let analysis = flow.analyze_feedback(&input).await.map_err(|e| flow_error(&e, lang))?;
            println!("{}\n", analysis.summary);
            for pattern in &analysis.key_patterns {
                println!("  {} ({}): {}", pattern.pattern, pattern.count, pattern.description);
            }
            for insight in &analysis.insights {
                println!("  * {insight}");
            }
            for item in &analysis.action_items {
                println!("  [{:?}] {} ({})", item.priority, item.item, item.category);
            }
            Ok(())
        }

        Commands::Prompt { problem, solution, project_type, pages, requirements } => {
            let mut options: StitchPromptOptions = flow.stitch_options();
            if let Some(problem) = problem {
                options.problem = problem;
            }
            if let Some(solution) = solution {
                options.solution = solution;
            }
            if let Some(project_type) = project_type {
                options.project_type = project_type.into();
            }
            if let Some(pages) = pages {
                options.set_page_count(pages);
            }
            if let Some(requirements) = requirements {
                options.additional_requirements = requirements;
            }

            let prompt =
                flow.generate_stitch_prompt(&options).await.map_err(|e| flow_error(&e, lang))?;
            println!("{}\n{}\n\n{}", prompt.title, prompt.description, prompt.optimized_prompt);
            Ok(())
        }

        Commands::Status { json } => {
            let state = store.state();
            if json {
                println!("{}", serde_json::to_string_pretty(&state)?);
                return Ok(());
            }
            match (store.identity(), store.profile()) {
                (Some(identity), Some(profile)) => {
                    println!("Participant: {} ({})", profile.name, identity.uid);
                }
                (Some(identity), None) => println!("Participant: {} (no profile)", identity.uid),
                (None, _) => println!("Participant: signed out"),
            }
            println!("Stage: {}", Day1Stage::of(&state));
            if let Some(saved) = store.save_status(Utc::now()) {
                println!("Saved: {saved}");
            }
            print_ideas(&state);
            if let Some(ref sketches) = state.three_step_sketches {
                println!("Sketches:");
                print_variants(sketches, |s| (&s.title, &s.image));
            }
            if let Some(ref storyboards) = state.storyboards {
                println!("Storyboards:");
                print_variants(storyboards, |p| (&p.title, &p.image));
            }
            println!("Interview questions: {}", state.interview_questions.len());
            let analyzed = if state.feedback_analysis.is_some() { "yes" } else { "no" };
            println!("Feedback analysis: {analyzed}");
            if let Some(ref prompt) = state.stitch_prompt {
                println!("Design prompt: {}", prompt.title);
            }
            Ok(())
        }

        Commands::Login { .. } | Commands::Logout | Commands::Config { .. } => Ok(()),
    }
}

/// Handle profile commands.
async fn cmd_profile(
    store: &ProjectStore,
    operation: ProfileOperation,
    lang: Language,
) -> Result<()> {
    match operation {
        ProfileOperation::Create { name, affiliation, experience } => {
            store
                .create_profile(&name, &affiliation, experience.into())
                .await
                .map_err(|e| anyhow::anyhow!(e.message().text(lang)))?;
        }
        ProfileOperation::Update { name, affiliation, experience } => {
            let patch =
                ProfilePatch { name, affiliation, ai_experience: experience.map(Into::into) };
            store.update_profile(patch).await.map_err(|e| anyhow::anyhow!(e.message().text(lang)))?;
        }
        ProfileOperation::Show => match store.profile() {
            Some(profile) => {
                println!("Name: {}", profile.name);
                println!("Affiliation: {}", profile.affiliation);
                println!("AI experience: {:?}", profile.ai_experience);
            }
            None => println!("No profile yet. Create one with `ideaflow profile create`."),
        },
    }
    Ok(())
}

/// Sign in and remember the participant id.
fn cmd_login(mut config: Config, uid: Option<String>) -> Result<()> {
    let uid = uid
        .or_else(|| config.general.user.clone())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    config.general.user = Some(uid.clone());
    config.save()?;
    println!("Signed in as {uid}");
    Ok(())
}

fn cmd_logout(mut config: Config) -> Result<()> {
    config.general.user = None;
    config.save()?;
    println!("Signed out");
    Ok(())
}

/// Show configuration.
fn cmd_config(config: &Config, show_path: bool) -> Result<()> {
    if show_path {
        if let Some(path) = Config::config_dir() {
            println!("{}", path.display());
        }
        return Ok(());
    }

    let toml = toml::to_string_pretty(config)?;
    println!("{toml}");

    Ok(())
}

fn open_storage(config: &Config) -> Result<(Arc<dyn DocumentStore>, Arc<dyn BlobStore>)> {
    match config.storage.backend {
        StorageBackend::File => {
            let dir = config.data_dir().context("Could not determine data directory")?;
            tracing::debug!(dir = %dir.display(), "Using file storage");
            Ok((Arc::new(FileDocumentStore::new(&dir)), Arc::new(FileBlobStore::new(&dir))))
        }
        StorageBackend::Memory => {
            Ok((Arc::new(MemoryDocumentStore::new()), Arc::new(MemoryBlobStore::new())))
        }
    }
}

#[cfg(feature = "ai")]
fn build_client(config: &Config) -> Arc<dyn GenerationClient> {
    if !config.ai.enabled {
        return Arc::new(DisabledClient::new("generation is disabled in the configuration"));
    }
    match ideaflow::GeminiClient::from_config(&config.ai) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            tracing::debug!(error = %e, "Generation client unavailable");
            let reason = format!("set {} to enable generation", config.ai.api_key_env);
            Arc::new(DisabledClient::new(reason))
        }
    }
}

#[cfg(not(feature = "ai"))]
fn build_client(_config: &Config) -> Arc<dyn GenerationClient> {
    Arc::new(DisabledClient::new("built without the `ai` feature"))
}

/// Ask a yes/no question unless `yes` was given.
fn confirm(message: Message, lang: Language, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    print!("{} [y/N] ", message.text(lang));
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    if !input.trim().eq_ignore_ascii_case("y") {
        println!("Cancelled");
        return Ok(false);
    }
    Ok(true)
}

fn flow_error(e: &FlowError, lang: Language) -> anyhow::Error {
    tracing::debug!(error = %e, "Flow operation failed");
    anyhow::anyhow!(e.localized(lang))
}

fn read_feedback(transcripts: &[PathBuf], audio: &[PathBuf]) -> Result<FeedbackInput> {
    if !audio.is_empty() {
        let clips = audio
            .iter()
            .map(|path| {
                let bytes = std::fs::read(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                Ok(AudioClip { mime_type: audio_mime_type(path).to_string(), bytes })
            })
            .collect::<Result<Vec<_>>>()?;
        return Ok(FeedbackInput::Audio(clips));
    }

    let texts = transcripts
        .iter()
        .map(|path| {
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(FeedbackInput::Transcripts(texts))
}

fn audio_mime_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("m4a") => "audio/mp4",
        Some("ogg") => "audio/ogg",
        _ => "audio/webm",
    }
}

async fn print_progress(mut rx: tokio::sync::mpsc::UnboundedReceiver<ProgressEvent>) {
    while let Some(event) = rx.recv().await {
        eprintln!("  {} images {}/{}", event.artifact, event.completed, event.total);
    }
}

fn print_notices(store: &ProjectStore, lang: Language) {
    for notice in store.drain_notices() {
        match notice.kind {
            NoticeKind::Success => println!("{}", notice.text(lang)),
            NoticeKind::Error => eprintln!("{}", notice.text(lang)),
        }
    }
    if let Some(error) = store.last_error() {
        tracing::debug!(%error, "Last save error");
    }
}

fn print_report(label: &str, report: &PipelineReport) {
    if report.total == 0 {
        return;
    }
    println!("{label}: {}/{} ready, {} failed", report.succeeded, report.total, report.failed);
}

fn print_ideas(state: &ProjectState) {
    if state.business_ideas.is_empty() {
        return;
    }
    println!("Ideas:");
    for (i, idea) in state.business_ideas.iter().enumerate() {
        let marker = if state.selected_idea == Some(i) { "*" } else { " " };
        println!("{marker}[{}] {} ({})", i + 1, idea.title, slot_label(&idea.sketch));
    }
}

fn print_variants<T>(variants: &VariantMap<T>, item: impl Fn(&T) -> (&String, &ImageSlot)) {
    for (key, items) in variants {
        println!("  {key}:");
        for (i, entry) in items.iter().enumerate() {
            let (title, image) = item(entry);
            println!("    {}. {} ({})", i + 1, title, slot_label(image));
        }
    }
}

fn slot_label(slot: &ImageSlot) -> &str {
    match slot {
        ImageSlot::Pending => "image pending",
        ImageSlot::Ready { url } => url,
        ImageSlot::Failed => "image failed",
    }
}
