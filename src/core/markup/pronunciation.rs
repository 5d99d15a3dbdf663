//! Whole-word pronunciation substitution.

use std::collections::{BTreeMap, HashMap};

use regex::Regex;

/// Precompiled dictionary replacer.
///
/// All keys are folded into one alternation, longest key first, and matched in
/// a single leftmost pass. Each span of text is replaced at most once and
/// replacement text is never re-scanned, so overlapping keys have a defined
/// outcome: the longest key starting at the leftmost position wins.
#[derive(Debug, Clone)]
pub struct PronunciationReplacer {
    pattern: Option<Regex>,
    replacements: HashMap<String, String>,
}

impl PronunciationReplacer {
    pub fn new(dictionary: &BTreeMap<String, String>) -> Result<Self, regex::Error> {
        let mut replacements = HashMap::new();
        for (word, replacement) in dictionary {
            let word = word.trim();
            if word.is_empty() {
                continue;
            }
            replacements.insert(word.to_lowercase(), replacement.clone());
        }

        if replacements.is_empty() {
            return Ok(Self::empty());
        }

        let mut words: Vec<&String> = replacements.keys().collect();
        words.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));

        let alternation = words
            .iter()
            .map(|word| word_pattern(word))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = Regex::new(&format!("(?i)(?:{alternation})"))?;

        Ok(Self {
            pattern: Some(pattern),
            replacements,
        })
    }

    /// Replacer that leaves text untouched
    pub fn empty() -> Self {
        Self {
            pattern: None,
            replacements: HashMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.replacements.is_empty()
    }

    pub fn apply(&self, text: &str) -> String {
        let Some(pattern) = &self.pattern else {
            return text.to_string();
        };

        pattern
            .replace_all(text, |caps: &regex::Captures<'_>| {
                let matched = &caps[0];
                self.replacements
                    .get(&matched.to_lowercase())
                    .cloned()
                    .unwrap_or_else(|| matched.to_string())
            })
            .into_owned()
    }
}

/// Escape a key and anchor it on word boundaries where the key itself
/// starts or ends with a word character
fn word_pattern(word: &str) -> String {
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let leading = if word.chars().next().is_some_and(is_word) {
        r"\b"
    } else {
        ""
    };
    let trailing = if word.chars().last().is_some_and(is_word) {
        r"\b"
    } else {
        ""
    };
    format!("{leading}{}{trailing}", regex::escape(word))
}
