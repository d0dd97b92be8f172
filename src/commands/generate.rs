use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tracing::info;

use crate::cli::{AiArgs, EnhanceArgs, ExtractorArgs, GenerateArgs};
use crate::commands::ingest::{extractor_client, ingest_path};
use crate::commands::{load_academic_config, open_store};
use crate::extract::extract_simple;
use crate::model::NewReport;
use crate::service::ai::{
    ContentGenerator, EnhancementRequest, GenerationRequest, GenerationSession,
    HttpContentGenerator,
};
use crate::service::ingest::{RemoteExtractor, SourceDocument, combine_sources};
use crate::util::{read_text, write_bytes};

pub fn run(args: GenerateArgs) -> Result<()> {
    if args.title.trim().is_empty() {
        bail!("generate report: title is required");
    }

    let sources = read_sources(&args.sources, &args.extractor)?;
    let academic = args
        .academic_config
        .as_deref()
        .map(load_academic_config)
        .transpose()?;

    let template_or_report_type = match (args.report_type, &academic) {
        (Some(report_type), _) => report_type.as_str().to_string(),
        (None, Some(config)) => config.report_type.as_str().to_string(),
        (None, None) => args.template.clone(),
    };
    let include_abstract = academic
        .as_ref()
        .is_some_and(|config| config.structure.include_abstract);

    let request = GenerationRequest {
        title: args.title.trim().to_string(),
        template_or_report_type,
        source_document_text: combine_sources(&sources),
        additional_instructions: args.instructions.clone(),
        academic_details: academic.map(|config| config.academic_details),
        include_abstract,
    };

    let timeout = Duration::from_secs(args.ai.ai_timeout_secs);
    let generator: Arc<dyn ContentGenerator> = Arc::new(ai_client(&args.ai)?);
    let session = GenerationSession::new(generator);
    let content = session
        .start(request)
        .wait(Some(timeout))
        .context("no content was produced")?;

    info!(
        title = %args.title,
        sources = sources.len(),
        chars = content.chars().count(),
        "generated report"
    );

    if args.save {
        let store = open_store(&args.store)?;
        let report = store.create_report(NewReport {
            title: args.title.clone(),
            extracted_data: extract_simple(&content),
            content: content.clone(),
            template_id: args.template.clone(),
            ai_generated: true,
        })?;
        info!(report_id = %report.id, "saved generated report");
    }

    emit(args.output.as_deref(), &content)
}

pub fn run_enhance(args: EnhanceArgs) -> Result<()> {
    let selected_text = read_text(&args.input)?;
    let generator = ai_client(&args.ai)?;
    let content = generator
        .enhance(&EnhancementRequest {
            selected_text,
            enhancement_type: args.kind,
            tone: args.tone.clone(),
        })
        .context("no content was produced")?;

    info!(kind = ?args.kind, chars = content.chars().count(), "enhanced passage");
    emit(args.output.as_deref(), &content)
}

fn ai_client(args: &AiArgs) -> Result<HttpContentGenerator> {
    let Some(url) = args.ai_url.as_deref() else {
        bail!("AI service url is required (--ai-url or REPORTSMITH_AI_URL)");
    };
    Ok(HttpContentGenerator::new(
        url,
        args.ai_key.clone(),
        Duration::from_secs(args.ai_timeout_secs),
    )?)
}

fn read_sources(paths: &[PathBuf], args: &ExtractorArgs) -> Result<Vec<SourceDocument>> {
    if paths.is_empty() {
        return Ok(Vec::new());
    }
    let extractor = extractor_client(args)?;
    let extractor = extractor.as_ref().map(|client| client as &dyn RemoteExtractor);
    paths
        .iter()
        .map(|path| ingest_path(path, None, extractor))
        .collect()
}

fn emit(output: Option<&Path>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            write_bytes(path, content.as_bytes())?;
            info!(path = %path.display(), "wrote markdown");
        }
        None => println!("{content}"),
    }
    Ok(())
}
