//! Content statistics over raw text. Every function is total; empty input
//! yields the zero state.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

const WORDS_PER_MINUTE: usize = 225;
const SENTIMENT_CLAMP: i32 = 5;

#[allow(clippy::expect_used)]
static SENTENCE_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]+").expect("sentence split regex is valid"));

#[allow(clippy::expect_used)]
static PARAGRAPH_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n+").expect("paragraph split regex is valid"));

const POSITIVE_WORDS: &[&str] = &[
    "good", "great", "excellent", "positive", "benefit", "beneficial", "success", "successful",
    "improve", "improved", "improvement", "effective", "efficient", "strong", "significant",
    "innovative", "valuable", "advantage", "optimal", "robust", "promising", "achieve",
    "achieved", "growth", "opportunity", "reliable", "clear", "best", "better", "happy",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bad", "poor", "negative", "fail", "failed", "failure", "problem", "problems", "issue",
    "issues", "risk", "risks", "weak", "weakness", "difficult", "decline", "loss", "error",
    "errors", "limited", "limitation", "limitations", "concern", "threat", "worse", "worst",
    "ineffective", "inefficient", "unclear", "sad",
];

const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "of", "to", "in", "on", "for", "with", "at", "by",
    "from", "as", "is", "are", "was", "were", "be", "been", "being", "it", "its", "this",
    "that", "these", "those", "which", "who", "what", "not", "no", "can", "will", "would",
    "should", "could", "may", "might", "has", "have", "had", "do", "does", "did", "than",
    "then", "there", "their", "they", "them", "we", "our", "you", "your", "he", "she", "his",
    "her", "i", "so", "if", "into", "also", "such", "more", "most", "other", "some", "all",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentLabel {
    VeryNegative,
    Negative,
    Neutral,
    Positive,
    VeryPositive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Sentiment {
    pub score: i32,
    pub label: SentimentLabel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadabilityLevel {
    VeryEasy,
    Easy,
    Moderate,
    Difficult,
    VeryDifficult,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Readability {
    pub score: f64,
    pub level: ReadabilityLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentStats {
    pub word_count: usize,
    pub character_count: usize,
    pub character_count_no_spaces: usize,
    pub sentence_count: usize,
    pub paragraph_count: usize,
    pub reading_time_minutes: usize,
    pub average_words_per_sentence: f64,
    pub average_word_length: f64,
    pub sentiment: Sentiment,
    pub readability: Readability,
}

pub fn calculate_content_stats(text: &str) -> ContentStats {
    let words = words(text);
    let word_count = words.len();
    let sentence_count = sentence_count(text);
    let letters = words.iter().map(|word| word_letters(word)).sum::<usize>();

    ContentStats {
        word_count,
        character_count: text.chars().count(),
        character_count_no_spaces: text.chars().filter(|character| !character.is_whitespace()).count(),
        sentence_count,
        paragraph_count: paragraph_count(text),
        reading_time_minutes: reading_time_minutes(word_count),
        average_words_per_sentence: ratio(word_count, sentence_count),
        average_word_length: ratio(letters, word_count),
        sentiment: sentiment(text),
        readability: readability(text),
    }
}

fn words(text: &str) -> Vec<&str> {
    text.trim().split_whitespace().collect()
}

fn word_letters(word: &str) -> usize {
    word.chars().filter(|character| character.is_alphanumeric()).count()
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    numerator as f64 / denominator as f64
}

pub fn sentence_count(text: &str) -> usize {
    SENTENCE_SPLIT
        .split(text)
        .filter(|fragment| !fragment.trim().is_empty())
        .count()
}

/// Single newlines count as breaks too; markdown-ish content rarely wraps
/// paragraphs across lines.
pub fn paragraph_count(text: &str) -> usize {
    PARAGRAPH_SPLIT
        .split(text)
        .filter(|fragment| !fragment.trim().is_empty())
        .count()
}

pub fn reading_time_minutes(word_count: usize) -> usize {
    word_count.div_ceil(WORDS_PER_MINUTE)
}

fn normalized_tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace()
        .map(|token| {
            token
                .trim_matches(|character: char| !character.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|token| !token.is_empty())
}

pub fn sentiment(text: &str) -> Sentiment {
    let positive = POSITIVE_WORDS.iter().copied().collect::<HashSet<&str>>();
    let negative = NEGATIVE_WORDS.iter().copied().collect::<HashSet<&str>>();

    let raw = normalized_tokens(text).fold(0i32, |score, token| {
        if positive.contains(token.as_str()) {
            score + 1
        } else if negative.contains(token.as_str()) {
            score - 1
        } else {
            score
        }
    });
    let score = raw.clamp(-SENTIMENT_CLAMP, SENTIMENT_CLAMP);

    let label = match score {
        i32::MIN..=-3 => SentimentLabel::VeryNegative,
        -2..=-1 => SentimentLabel::Negative,
        0 => SentimentLabel::Neutral,
        1..=2 => SentimentLabel::Positive,
        _ => SentimentLabel::VeryPositive,
    };

    Sentiment { score, label }
}

/// Blend of sentence length and word length, banded into five levels.
pub fn readability(text: &str) -> Readability {
    let words = words(text);
    if words.is_empty() {
        return Readability {
            score: 0.0,
            level: ReadabilityLevel::VeryEasy,
        };
    }

    let sentences = sentence_count(text).max(1);
    let letters = words.iter().map(|word| word_letters(word)).sum::<usize>();
    let words_per_sentence = ratio(words.len(), sentences);
    let word_length = ratio(letters, words.len());
    let score = (0.4 * words_per_sentence + 1.5 * word_length) * 10.0;
    let score = score.round() / 10.0;

    let level = if score < 9.0 {
        ReadabilityLevel::VeryEasy
    } else if score < 12.0 {
        ReadabilityLevel::Easy
    } else if score < 15.0 {
        ReadabilityLevel::Moderate
    } else if score < 18.0 {
        ReadabilityLevel::Difficult
    } else {
        ReadabilityLevel::VeryDifficult
    };

    Readability { score, level }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordCount {
    pub word: String,
    pub count: usize,
}

/// Most frequent non-stop-words of three or more letters; ties broken
/// alphabetically.
pub fn top_keywords(text: &str, limit: usize) -> Vec<KeywordCount> {
    let stop_words = STOP_WORDS.iter().copied().collect::<HashSet<&str>>();
    let mut counts = HashMap::<String, usize>::new();

    for token in normalized_tokens(text) {
        if token.chars().count() < 3 || stop_words.contains(token.as_str()) {
            continue;
        }
        if token.chars().all(|character| character.is_ascii_digit()) {
            continue;
        }
        *counts.entry(token).or_insert(0) += 1;
    }

    let mut ranked = counts
        .into_iter()
        .map(|(word, count)| KeywordCount { word, count })
        .collect::<Vec<KeywordCount>>();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.word.cmp(&b.word)));
    ranked.truncate(limit);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_zero_state() {
        let stats = calculate_content_stats("");
        assert_eq!(stats.word_count, 0);
        assert_eq!(stats.character_count, 0);
        assert_eq!(stats.sentence_count, 0);
        assert_eq!(stats.paragraph_count, 0);
        assert_eq!(stats.reading_time_minutes, 0);
        assert_eq!(stats.average_words_per_sentence, 0.0);
        assert_eq!(stats.average_word_length, 0.0);
        assert_eq!(stats.sentiment.score, 0);
        assert_eq!(stats.sentiment.label, SentimentLabel::Neutral);
        assert_eq!(stats.readability.score, 0.0);
        assert!(top_keywords("", 5).is_empty());
    }

    #[test]
    fn whitespace_only_input_is_also_empty() {
        let stats = calculate_content_stats("  \n\n\t ");
        assert_eq!(stats.word_count, 0);
        assert_eq!(stats.paragraph_count, 0);
        assert_eq!(stats.sentence_count, 0);
    }

    #[test]
    fn counts_words_sentences_and_paragraphs() {
        let text = "First sentence here. Second one!\nNew paragraph? Yes...\n\nLast";
        let stats = calculate_content_stats(text);
        assert_eq!(stats.word_count, 9);
        assert_eq!(stats.sentence_count, 5);
        assert_eq!(stats.paragraph_count, 3);
        assert_eq!(stats.reading_time_minutes, 1);
    }

    #[test]
    fn reading_time_rounds_up() {
        assert_eq!(reading_time_minutes(225), 1);
        assert_eq!(reading_time_minutes(226), 2);
        assert_eq!(reading_time_minutes(1), 1);
    }

    #[test]
    fn sentiment_is_clamped_and_bucketed() {
        let glowing = "great great great excellent success success improved best better";
        let result = sentiment(glowing);
        assert_eq!(result.score, 5);
        assert_eq!(result.label, SentimentLabel::VeryPositive);

        let result = sentiment("This failed, with errors.");
        assert_eq!(result.score, -2);
        assert_eq!(result.label, SentimentLabel::Negative);

        assert_eq!(sentiment("Good.").label, SentimentLabel::Positive);
    }

    #[test]
    fn readability_bands_track_sentence_and_word_length() {
        let simple = readability("I ran. We sat. It is hot.");
        assert_eq!(simple.level, ReadabilityLevel::VeryEasy);

        let dense = readability(
            "Comprehensive institutional considerations notwithstanding, \
             interdisciplinary methodological frameworks systematically \
             underestimate organizational heterogeneity characteristics \
             throughout longitudinal implementation evaluations.",
        );
        assert_eq!(dense.level, ReadabilityLevel::VeryDifficult);
    }

    #[test]
    fn top_keywords_skip_stop_words_and_rank_by_count() {
        let keywords = top_keywords("The model and the model data. Data model!", 2);
        assert_eq!(
            keywords,
            vec![
                KeywordCount {
                    word: "model".to_string(),
                    count: 3
                },
                KeywordCount {
                    word: "data".to_string(),
                    count: 2
                },
            ]
        );
    }
}
