use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::export::{ExportFormat, ExportMode};
use crate::model::{AssetKind, CitationStyle, ReportType};
use crate::service::ai::EnhancementType;

#[derive(Parser, Debug)]
#[command(
    name = "reportsmith",
    version,
    about = "Markdown report drafting, extraction, citation and export tooling"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse markdown into typed blocks.
    Parse(ParseArgs),
    /// Extract typed entities (emails, dates, citations, ...) from text.
    Extract(ExtractArgs),
    /// Content statistics for a text file.
    Stats(StatsArgs),
    /// Read BibTeX and print citations as JSON, BibTeX or a bibliography.
    Bibtex(BibtexArgs),
    /// Export markdown to DOCX, PDF or LaTeX.
    Export(ExportArgs),
    /// Draft a report with the AI service.
    Generate(GenerateArgs),
    /// Rewrite a passage with the AI service.
    Enhance(EnhanceArgs),
    /// Extract text from source documents.
    Ingest(IngestArgs),
    Report(ReportArgs),
    Citation(CitationArgs),
    Template(TemplateArgs),
    Profile(ProfileArgs),
}

#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    #[arg(long, env = "REPORTSMITH_DB", default_value = ".reportsmith/reports.sqlite")]
    pub db_path: PathBuf,

    #[arg(long, env = "REPORTSMITH_USER", default_value = "local")]
    pub user: String,
}

#[derive(Args, Debug, Clone)]
pub struct AiArgs {
    #[arg(long, env = "REPORTSMITH_AI_URL")]
    pub ai_url: Option<String>,

    #[arg(long, env = "REPORTSMITH_AI_KEY", hide_env_values = true)]
    pub ai_key: Option<String>,

    #[arg(long, default_value_t = 120)]
    pub ai_timeout_secs: u64,
}

#[derive(Args, Debug, Clone)]
pub struct ExtractorArgs {
    #[arg(long, env = "REPORTSMITH_EXTRACT_URL")]
    pub extract_url: Option<String>,

    #[arg(long, env = "REPORTSMITH_EXTRACT_KEY", hide_env_values = true)]
    pub extract_key: Option<String>,

    #[arg(long, default_value_t = 60)]
    pub extract_timeout_secs: u64,
}

#[derive(Args, Debug, Clone)]
pub struct ParseArgs {
    pub input: PathBuf,

    /// Also split paragraph and heading text into bold/italic runs.
    #[arg(long, default_value_t = false)]
    pub inline_runs: bool,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum ExtractMode {
    /// Unique (type, value) pairs.
    Simple,
    /// Every occurrence with byte offsets.
    Positions,
}

#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    pub input: PathBuf,

    #[arg(long, value_enum, default_value_t = ExtractMode::Simple)]
    pub mode: ExtractMode,

    /// Include citation, cross-reference, DOI and ISBN patterns.
    #[arg(long, default_value_t = false)]
    pub academic: bool,

    /// Print per-type counts instead of the matches.
    #[arg(long, default_value_t = false)]
    pub summary: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StatsArgs {
    pub input: PathBuf,

    #[arg(long, default_value_t = 10)]
    pub keywords: usize,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum BibtexOutput {
    Json,
    Bibtex,
    Bibliography,
}

#[derive(Args, Debug, Clone)]
pub struct BibtexArgs {
    pub input: PathBuf,

    #[arg(long, value_enum, default_value_t = BibtexOutput::Json)]
    pub output: BibtexOutput,

    #[arg(long, value_enum, default_value_t = CitationStyle::Apa)]
    pub style: CitationStyle,
}

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    /// Markdown file to export. Use --report-id to export a stored report.
    #[arg(required_unless_present = "report_id")]
    pub input: Option<PathBuf>,

    #[arg(long, conflicts_with = "input")]
    pub report_id: Option<String>,

    /// Document title; defaults to the stored title or the file stem.
    #[arg(long)]
    pub title: Option<String>,

    #[arg(long, value_enum, default_value_t = ExportMode::Standard)]
    pub mode: ExportMode,

    /// Formats to write; every format available for the mode when omitted.
    #[arg(long = "format", value_enum)]
    pub formats: Vec<ExportFormat>,

    #[arg(long)]
    pub template: Option<String>,

    /// AcademicReportConfig JSON file.
    #[arg(long, conflicts_with = "profile")]
    pub academic_config: Option<PathBuf>,

    /// Stored academic profile name.
    #[arg(long)]
    pub profile: Option<String>,

    #[arg(long, default_value = "exports")]
    pub out_dir: PathBuf,

    #[command(flatten)]
    pub store: StoreArgs,
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    #[arg(long)]
    pub title: String,

    #[arg(long, default_value = "standard")]
    pub template: String,

    /// Draft an academic report of this type instead of a templated one.
    #[arg(long, value_enum)]
    pub report_type: Option<ReportType>,

    /// AcademicReportConfig JSON file supplying author and structure details.
    #[arg(long)]
    pub academic_config: Option<PathBuf>,

    #[arg(long = "source")]
    pub sources: Vec<PathBuf>,

    #[arg(long, default_value = "")]
    pub instructions: String,

    /// Write the markdown here instead of stdout.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Save the draft as a stored report.
    #[arg(long, default_value_t = false)]
    pub save: bool,

    #[command(flatten)]
    pub ai: AiArgs,

    #[command(flatten)]
    pub extractor: ExtractorArgs,

    #[command(flatten)]
    pub store: StoreArgs,
}

#[derive(Args, Debug, Clone)]
pub struct EnhanceArgs {
    /// File holding the passage to rewrite.
    pub input: PathBuf,

    #[arg(long, value_enum)]
    pub kind: EnhancementType,

    #[arg(long, default_value = "professional")]
    pub tone: String,

    #[arg(long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub ai: AiArgs,
}

#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Declared MIME type, applied to every file.
    #[arg(long)]
    pub mime: Option<String>,

    /// Write the ingested documents as JSON here instead of stdout.
    #[arg(long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub extractor: ExtractorArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ReportArgs {
    #[command(subcommand)]
    pub command: ReportCommand,

    #[command(flatten)]
    pub store: StoreArgs,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ReportCommand {
    Create {
        #[arg(long)]
        title: String,
        /// Markdown content file.
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long, default_value = "standard")]
        template: String,
        /// Store extracted entities alongside the content.
        #[arg(long, default_value_t = false)]
        extract: bool,
    },
    List,
    Show {
        id: String,
    },
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        template: Option<String>,
    },
    Delete {
        id: String,
    },
    AddAsset {
        id: String,
        #[arg(long, value_enum)]
        kind: AssetKind,
        #[arg(long, default_value = "")]
        caption: String,
        /// Image URL for figures, CSV file path for tables.
        #[arg(long)]
        payload: String,
    },
    Assets {
        id: String,
    },
}

#[derive(Args, Debug, Clone)]
pub struct CitationArgs {
    #[command(subcommand)]
    pub command: CitationCommand,

    /// Work on this report's citation list instead of the unattached library.
    #[arg(long, global = true)]
    pub report_id: Option<String>,

    #[command(flatten)]
    pub store: StoreArgs,
}

#[derive(Subcommand, Debug, Clone)]
pub enum CitationCommand {
    Import {
        input: PathBuf,
    },
    Add {
        #[arg(long)]
        title: String,
        /// "Last, First"; repeat for each author.
        #[arg(long = "author")]
        authors: Vec<String>,
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        journal: Option<String>,
        #[arg(long)]
        doi: Option<String>,
        #[arg(long)]
        url: Option<String>,
    },
    List,
    Delete {
        id: String,
    },
    /// Move a citation (1-based positions). With `--report-id`, the report's
    /// `[n]` markers are renumbered too.
    Move {
        from: usize,
        to: usize,
    },
    Format {
        #[arg(long, value_enum, default_value_t = CitationStyle::Apa)]
        style: CitationStyle,
        /// Print BibTeX instead of a formatted bibliography.
        #[arg(long, default_value_t = false)]
        bibtex: bool,
    },
}

#[derive(Args, Debug, Clone)]
pub struct TemplateArgs {
    #[command(subcommand)]
    pub command: TemplateCommand,

    #[command(flatten)]
    pub store: StoreArgs,
}

#[derive(Subcommand, Debug, Clone)]
pub enum TemplateCommand {
    List,
    Show { id: String },
    /// Save a template definition JSON file.
    Save { input: PathBuf },
}

#[derive(Args, Debug, Clone)]
pub struct ProfileArgs {
    #[command(subcommand)]
    pub command: ProfileCommand,

    #[command(flatten)]
    pub store: StoreArgs,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ProfileCommand {
    List,
    Show { name: String },
    /// Save an AcademicReportConfig JSON file under a name.
    Save { name: String, input: PathBuf },
}
