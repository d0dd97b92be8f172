use std::collections::HashSet;

use anyhow::Result;
use tracing::info;

use crate::cli::{ExtractArgs, ExtractMode};
use crate::extract::{extract_simple, extract_with_positions, summarize};
use crate::model::ExtractedMatch;
use crate::util::{print_json, read_text};

pub fn run(args: ExtractArgs) -> Result<()> {
    let text = read_text(&args.input)?;
    let matches = match args.mode {
        ExtractMode::Simple if args.academic => {
            // Unique values across the full pattern set.
            let mut unique = extract_with_positions(&text, true)
                .into_iter()
                .map(|mut found| {
                    found.start_offset = None;
                    found.end_offset = None;
                    found
                })
                .collect::<Vec<ExtractedMatch>>();
            let mut seen = HashSet::new();
            unique.retain(|found| seen.insert((found.match_type.clone(), found.value.clone())));
            unique
        }
        ExtractMode::Simple => extract_simple(&text),
        ExtractMode::Positions => extract_with_positions(&text, args.academic),
    };

    info!(
        path = %args.input.display(),
        mode = ?args.mode,
        academic = args.academic,
        matches = matches.len(),
        "extracted entities"
    );

    if args.summary {
        print_json(&summarize(&matches))
    } else {
        print_json(&matches)
    }
}
