//! Language classification used to pick a synthesis voice.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

/// Languages with a dedicated voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LanguageTag {
    English,
    French,
}

impl LanguageTag {
    /// ISO 639-1 code
    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageTag::English => "en",
            LanguageTag::French => "fr",
        }
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LanguageTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(LanguageTag::English),
            "fr" | "french" | "français" | "francais" => Ok(LanguageTag::French),
            other => Err(format!("Unknown language: {} (expected 'en' or 'fr')", other)),
        }
    }
}

/// Classifies a piece of text into one of the supported languages.
pub trait LanguageClassifier: Send + Sync {
    fn classify(&self, text: &str) -> LanguageTag;
}

/// Cue patterns that hint at French text.
static FRENCH_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // accented letters
        r"(?i)[éèêëàâäôöûüùïîç]",
        // pronouns
        r"(?i)\b(je|tu|il|elle|nous|vous|ils|elles)\b",
        // articles and prepositions
        r"(?i)\b(le|la|les|un|une|des|du|de|à|au|aux)\b",
        // common verbs
        r"(?i)\b(est|sont|être|avoir|fait|faire|dit|voir)\b",
        // common words
        r"(?i)\b(bonjour|merci|oui|non|s'il|voilà|très|bien)\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static French cue pattern"))
    .collect()
});

/// Number of cue families that must match before text counts as French.
const FRENCH_THRESHOLD: usize = 2;

/// Scores French cues; anything below the threshold is English.
#[derive(Debug, Default, Clone, Copy)]
pub struct PatternClassifier;

impl PatternClassifier {
    /// Number of cue families present in the text.
    pub fn french_score(&self, text: &str) -> usize {
        FRENCH_PATTERNS.iter().filter(|p| p.is_match(text)).count()
    }
}

impl LanguageClassifier for PatternClassifier {
    fn classify(&self, text: &str) -> LanguageTag {
        let score = self.french_score(text);
        let tag = if score >= FRENCH_THRESHOLD {
            LanguageTag::French
        } else {
            LanguageTag::English
        };
        log::debug!("Detected language: {} (French score {})", tag, score);
        tag
    }
}

/// Always answers the same language; used when the caller forces one.
#[derive(Debug, Clone, Copy)]
pub struct FixedClassifier(pub LanguageTag);

impl LanguageClassifier for FixedClassifier {
    fn classify(&self, _text: &str) -> LanguageTag {
        self.0
    }
}
