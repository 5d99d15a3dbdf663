//! Single-pass tokenizer for the markup-light tag grammar.
//!
//! Recognized tags (tag and attribute names are case-insensitive):
//!
//! ```text
//! <break time="500ms">      <break time="1.5s"/>
//! <emphasis>                </emphasis>
//! <prosody rate="slow|medium|fast">   </prosody>
//! ```
//!
//! Anything else, including malformed or unknown tags, is plain text.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?ix)
        <break\s+time\s*=\s*["'](?P<amount>\d+(?:\.\d+)?)\s*(?P<unit>ms|s)["']\s*/?>
        | <(?P<emph_close>/)?emphasis\s*>
        | <prosody\s+rate\s*=\s*["'](?P<rate>slow|medium|fast)["']\s*>
        | (?P<prosody_close></prosody\s*>)
        "#,
    )
    .expect("markup tag pattern is valid")
});

/// Speaking rate named by a prosody span
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProsodyRate {
    Slow,
    Medium,
    Fast,
}

impl ProsodyRate {
    /// Multiplier applied to the rate scale factor
    pub fn factor(self) -> f32 {
        match self {
            Self::Slow => 0.95,
            Self::Medium => 1.0,
            Self::Fast => 1.05,
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "slow" => Some(Self::Slow),
            "medium" => Some(Self::Medium),
            "fast" => Some(Self::Fast),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token<'a> {
    Text(&'a str),
    /// Requested pause in seconds, before any capping
    Break(f32),
    EmphasisOpen,
    EmphasisClose,
    ProsodyOpen(ProsodyRate),
    ProsodyClose,
}

/// Split `input` into text and tag tokens in one left-to-right scan
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut cursor = 0;

    for caps in TAG_PATTERN.captures_iter(input) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        if whole.start() > cursor {
            tokens.push(Token::Text(&input[cursor..whole.start()]));
        }
        tokens.push(tag_token(&caps));
        cursor = whole.end();
    }

    if cursor < input.len() {
        tokens.push(Token::Text(&input[cursor..]));
    }

    tokens
}

fn tag_token<'a>(caps: &Captures<'_>) -> Token<'a> {
    if let Some(amount) = caps.name("amount") {
        let value: f32 = amount.as_str().parse().unwrap_or(0.0);
        let seconds = match caps.name("unit").map(|u| u.as_str().to_ascii_lowercase()) {
            Some(unit) if unit == "s" => value,
            _ => value / 1000.0,
        };
        return Token::Break(seconds);
    }

    if caps.name("rate").is_some() {
        let rate = caps
            .name("rate")
            .and_then(|r| ProsodyRate::parse(r.as_str()))
            .unwrap_or(ProsodyRate::Medium);
        return Token::ProsodyOpen(rate);
    }

    if caps.name("prosody_close").is_some() {
        return Token::ProsodyClose;
    }

    if caps.name("emph_close").is_some() {
        Token::EmphasisClose
    } else {
        Token::EmphasisOpen
    }
}
