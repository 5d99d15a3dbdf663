//! Markup-light normalization.
//!
//! Strips break, emphasis and prosody-rate directives from request text and
//! turns them into numeric deltas for the parameter resolver. The cleaned text
//! then gets connector commas, whitespace collapsing, terminal punctuation and
//! pronunciation substitution, in that order.

mod pronunciation;
mod tokenizer;

pub use pronunciation::PronunciationReplacer;
pub use tokenizer::{ProsodyRate, Token, tokenize};

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::errors::{AppError, AppResult};

/// Noise boost contributed by every emphasis tag, open or close
pub const EMPHASIS_NOISE_BOOST: f32 = 0.05;

/// Upper bound on the pause a single break tag may add
pub const MAX_BREAK_SECONDS: f32 = 1.0;

/// Text substituted for a break tag
const BREAK_PLACEHOLDER: &str = " ... ";

const TERMINAL_PUNCTUATION: &[char] = &['.', '!', '?', '¡', '¿', '…'];

/// Punctuation that suppresses the connector comma
const FOLLOWING_PUNCTUATION: &[char] = &[',', '.', ';', ':', '!', '?', '…', ')'];

/// Discourse connectors that get a comma when followed directly by a word
const CONNECTORS: &[&str] = &[
    "sin embargo",
    "no obstante",
    "por lo tanto",
    "por consiguiente",
    "por otro lado",
    "por ejemplo",
    "es decir",
    "además",
    "en primer lugar",
    "en segundo lugar",
    "en resumen",
    "en conclusión",
    "de hecho",
    "finalmente",
    "however",
    "therefore",
    "moreover",
    "for example",
    "in addition",
    "meanwhile",
];

static CONNECTOR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    let mut phrases: Vec<&str> = CONNECTORS.to_vec();
    phrases.sort_by_key(|p| std::cmp::Reverse(p.len()));
    let alternation = phrases
        .iter()
        .map(|p| {
            p.split_whitespace()
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"\s+")
        })
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{alternation})\b")).expect("connector pattern is valid")
});

/// Numeric deltas collected while stripping markup
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MarkupAdjustment {
    pub extra_silence_seconds: f32,
    pub noise_boost: f32,
    pub rate_scale_factor: f32,
}

impl Default for MarkupAdjustment {
    fn default() -> Self {
        Self {
            extra_silence_seconds: 0.0,
            noise_boost: 0.0,
            rate_scale_factor: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedText {
    pub text: String,
    pub adjustment: MarkupAdjustment,
}

/// Normalize raw request text.
///
/// Nested prosody spans are rejected with `InvalidMarkup`. Unmatched prosody
/// tags are dropped without touching the rate factor.
pub fn normalize(
    raw: &str,
    pronunciations: Option<&PronunciationReplacer>,
) -> AppResult<NormalizedText> {
    let (stripped, adjustment) = strip_markup(raw)?;

    let text = insert_connector_commas(&stripped);
    let text = collapse_whitespace(&text);
    let text = ensure_terminal_punctuation(text);
    let text = match pronunciations {
        Some(replacer) => replacer.apply(&text),
        None => text,
    };

    Ok(NormalizedText { text, adjustment })
}

/// Remove every directive and accumulate its adjustment
pub fn strip_markup(raw: &str) -> AppResult<(String, MarkupAdjustment)> {
    let mut adjustment = MarkupAdjustment::default();
    let mut out = String::with_capacity(raw.len());
    let mut open_prosody: Option<ProsodyRate> = None;

    for token in tokenize(raw) {
        match token {
            Token::Text(text) => out.push_str(text),
            Token::Break(seconds) => {
                adjustment.extra_silence_seconds += seconds.clamp(0.0, MAX_BREAK_SECONDS);
                out.push_str(BREAK_PLACEHOLDER);
            }
            Token::EmphasisOpen | Token::EmphasisClose => {
                adjustment.noise_boost += EMPHASIS_NOISE_BOOST;
            }
            Token::ProsodyOpen(rate) => {
                if open_prosody.is_some() {
                    return Err(AppError::InvalidMarkup(
                        "nested <prosody> spans are not supported".to_string(),
                    ));
                }
                open_prosody = Some(rate);
            }
            Token::ProsodyClose => {
                if let Some(rate) = open_prosody.take() {
                    adjustment.rate_scale_factor *= rate.factor();
                }
            }
        }
    }

    Ok((out, adjustment))
}

/// Add a comma after connectors that run straight into the next word
pub fn insert_connector_commas(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut cursor = 0;

    for m in CONNECTOR_PATTERN.find_iter(text) {
        out.push_str(&text[cursor..m.end()]);
        cursor = m.end();

        let next = text[m.end()..].chars().find(|c| !c.is_whitespace());
        if let Some(c) = next {
            if !FOLLOWING_PUNCTUATION.contains(&c) {
                out.push(',');
            }
        }
    }

    out.push_str(&text[cursor..]);
    out
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Append `.` unless the text already ends in terminal punctuation
pub fn ensure_terminal_punctuation(mut text: String) -> String {
    match text.chars().last() {
        None => text,
        Some(c) if TERMINAL_PUNCTUATION.contains(&c) => text,
        Some(_) => {
            text.push('.');
            text
        }
    }
}
