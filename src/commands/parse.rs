use anyhow::Result;
use serde::Serialize;
use tracing::info;

use crate::cli::ParseArgs;
use crate::markdown::{self, InlineRun, split_inline_runs};
use crate::model::Block;
use crate::util::{print_json, read_text};

#[derive(Serialize)]
struct BlockWithRuns {
    #[serde(flatten)]
    block: Block,
    #[serde(skip_serializing_if = "Option::is_none")]
    runs: Option<Vec<InlineRun>>,
}

pub fn run(args: ParseArgs) -> Result<()> {
    let raw = read_text(&args.input)?;
    let blocks = markdown::parse(&raw);
    info!(path = %args.input.display(), blocks = blocks.len(), "parsed markdown");

    if !args.inline_runs {
        return print_json(&blocks);
    }

    let annotated = blocks
        .into_iter()
        .map(|block| {
            let runs = match &block {
                Block::Heading { text, .. }
                | Block::Paragraph { text }
                | Block::ListItem { text }
                | Block::OrderedListItem { text } => Some(split_inline_runs(text)),
                _ => None,
            };
            BlockWithRuns { block, runs }
        })
        .collect::<Vec<BlockWithRuns>>();
    print_json(&annotated)
}
