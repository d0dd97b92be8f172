use anyhow::Result;
use serde::Serialize;
use tracing::info;

use crate::cli::StatsArgs;
use crate::stats::{ContentStats, KeywordCount, calculate_content_stats, top_keywords};
use crate::util::{print_json, read_text};

#[derive(Serialize)]
struct StatsReport {
    #[serde(flatten)]
    stats: ContentStats,
    keywords: Vec<KeywordCount>,
}

pub fn run(args: StatsArgs) -> Result<()> {
    let text = read_text(&args.input)?;
    let report = StatsReport {
        stats: calculate_content_stats(&text),
        keywords: top_keywords(&text, args.keywords),
    };

    info!(
        path = %args.input.display(),
        words = report.stats.word_count,
        reading_minutes = report.stats.reading_time_minutes,
        "computed content stats"
    );
    print_json(&report)
}
