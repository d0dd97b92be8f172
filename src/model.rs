use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// One typed unit of parsed markdown, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    Heading { level: u8, text: String },
    Paragraph { text: String },
    ListItem { text: String },
    OrderedListItem { text: String },
    Table { rows: Vec<Vec<String>> },
    Code { text: String },
    Blank,
}

impl Block {
    pub fn kind(&self) -> &'static str {
        match self {
            Block::Heading { .. } => "heading",
            Block::Paragraph { .. } => "paragraph",
            Block::ListItem { .. } => "list_item",
            Block::OrderedListItem { .. } => "ordered_list_item",
            Block::Table { .. } => "table",
            Block::Code { .. } => "code",
            Block::Blank => "blank",
        }
    }

    /// Character weight of the block, used by page estimation.
    pub fn char_len(&self) -> usize {
        match self {
            Block::Heading { text, .. }
            | Block::Paragraph { text }
            | Block::ListItem { text }
            | Block::OrderedListItem { text }
            | Block::Code { text } => text.chars().count(),
            Block::Table { rows } => rows
                .iter()
                .flat_map(|row| row.iter())
                .map(|cell| cell.chars().count())
                .sum(),
            Block::Blank => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExtractedMatch {
    #[serde(rename = "type")]
    pub match_type: String,
    pub value: String,
    pub pattern_description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_offset: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_offset: Option<usize>,
}

/// A bibliography record. `id` is assigned by the store; parsed or
/// hand-entered citations carry `None` until persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citation_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bibtex_raw: Option<String>,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CitationStyle {
    #[default]
    Apa,
    Ieee,
    Harvard,
    Mla,
    Chicago,
    None,
}

impl CitationStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Apa => "apa",
            Self::Ieee => "ieee",
            Self::Harvard => "harvard",
            Self::Mla => "mla",
            Self::Chicago => "chicago",
            Self::None => "none",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Apa => "APA",
            Self::Ieee => "IEEE",
            Self::Harvard => "Harvard",
            Self::Mla => "MLA",
            Self::Chicago => "Chicago",
            Self::None => "None",
        }
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ReportType {
    #[default]
    ResearchPaper,
    Thesis,
    Dissertation,
    LabReport,
    LiteratureReview,
    CaseStudy,
    Essay,
    ProjectReport,
}

impl ReportType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ResearchPaper => "research-paper",
            Self::Thesis => "thesis",
            Self::Dissertation => "dissertation",
            Self::LabReport => "lab-report",
            Self::LiteratureReview => "literature-review",
            Self::CaseStudy => "case-study",
            Self::Essay => "essay",
            Self::ProjectReport => "project-report",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::ResearchPaper => "Research Paper",
            Self::Thesis => "Thesis",
            Self::Dissertation => "Dissertation",
            Self::LabReport => "Lab Report",
            Self::LiteratureReview => "Literature Review",
            Self::CaseStudy => "Case Study",
            Self::Essay => "Essay",
            Self::ProjectReport => "Project Report",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcademicDetails {
    pub author_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    pub institution: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supervisor_name: Option<String>,
    pub submission_date: String,
}

impl AcademicDetails {
    /// `2024-05-03` renders as `May 3, 2024`; anything else is shown as given.
    pub fn formatted_submission_date(&self) -> Option<String> {
        let raw = self.submission_date.trim();
        if raw.is_empty() {
            return None;
        }

        match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(date) => Some(date.format("%B %-d, %Y").to_string()),
            Err(_) => Some(raw.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportStructure {
    #[serde(default = "default_true")]
    pub include_toc: bool,
    #[serde(default = "default_true")]
    pub include_abstract: bool,
    #[serde(default = "default_true")]
    pub include_cover_page: bool,
    #[serde(default = "default_true")]
    pub include_references: bool,
    #[serde(default)]
    pub citation_style: CitationStyle,
}

impl Default for ReportStructure {
    fn default() -> Self {
        Self {
            include_toc: true,
            include_abstract: true,
            include_cover_page: true,
            include_references: true,
            citation_style: CitationStyle::Apa,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcademicReportConfig {
    #[serde(default)]
    pub report_type: ReportType,
    pub academic_details: AcademicDetails,
    #[serde(default)]
    pub structure: ReportStructure,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub content: String,
    pub template_id: String,
    pub extracted_data: Vec<ExtractedMatch>,
    pub ai_generated: bool,
    pub content_sha256: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default)]
pub struct NewReport {
    pub title: String,
    pub content: String,
    pub template_id: String,
    pub extracted_data: Vec<ExtractedMatch>,
    pub ai_generated: bool,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Figure,
    Table,
}

impl AssetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Figure => "figure",
            Self::Table => "table",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "figure" => Some(Self::Figure),
            "table" => Some(Self::Table),
            _ => None,
        }
    }
}

/// Figure or data table attached to a report. `payload` is an image URL for
/// figures and CSV text for tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportAsset {
    pub id: String,
    pub report_id: String,
    pub kind: AssetKind,
    pub number: i64,
    pub caption: String,
    pub payload: String,
    pub created_at: String,
}
