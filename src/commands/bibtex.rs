use anyhow::{Result, bail};
use tracing::info;

use crate::citation::{CitationList, bibtex};
use crate::cli::{BibtexArgs, BibtexOutput};
use crate::util::{print_json, read_text};

pub fn run(args: BibtexArgs) -> Result<()> {
    let raw = read_text(&args.input)?;
    if raw.trim().is_empty() {
        bail!("bibtex text is required: {} is empty", args.input.display());
    }

    let citations = bibtex::parse(&raw);
    info!(path = %args.input.display(), citations = citations.len(), "parsed bibtex");

    match args.output {
        BibtexOutput::Json => print_json(&citations)?,
        BibtexOutput::Bibtex => {
            let entries = citations
                .iter()
                .map(bibtex::serialize)
                .collect::<Vec<String>>();
            println!("{}", entries.join("\n\n"));
        }
        BibtexOutput::Bibliography => {
            for line in CitationList::new(citations).bibliography(args.style) {
                println!("{line}");
            }
        }
    }
    Ok(())
}
