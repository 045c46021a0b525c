//! Coarse three-way language detection for routing prompts and messages.
//!
//! Detection runs in a fixed order of decreasing signal strength:
//! Arabic script share, French stopwords, French diacritics, then English.

use serde::{Deserialize, Serialize};

/// Language tag attached to a query and its answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "ar")]
    Arabic,
    #[serde(rename = "fr")]
    French,
    #[default]
    #[serde(rename = "en")]
    English,
}

impl Language {
    /// ISO 639-1 code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Arabic => "ar",
            Self::French => "fr",
            Self::English => "en",
        }
    }

    /// English name, used inside system prompts.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Arabic => "Arabic",
            Self::French => "French",
            Self::English => "English",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Share of non-whitespace characters that must be Arabic script.
const ARABIC_THRESHOLD: f64 = 0.30;

/// Share of tokens that must be French stopwords when fewer than two match.
const FRENCH_TOKEN_SHARE: f64 = 0.25;

const FRENCH_STOPWORDS: &[&str] = &[
    "le", "la", "les", "un", "une", "des", "du", "de", "et", "est", "sont", "que", "qui", "quoi",
    "quel", "quelle", "quels", "quelles", "comment", "pourquoi", "dans", "pour", "sur", "avec",
    "par", "ce", "cette", "ces", "je", "nous", "vous", "mon", "moi", "allah", "islam", "coran",
    "prophète",
];

const FRENCH_DIACRITICS: &[char] = &[
    'à', 'â', 'ç', 'é', 'è', 'ê', 'ë', 'î', 'ï', 'ô', 'ù', 'û', 'ü', 'ÿ', 'œ', 'æ',
];

/// Whether `c` falls in one of the Arabic Unicode blocks.
pub fn is_arabic_char(c: char) -> bool {
    matches!(
        c as u32,
        0x0600..=0x06FF | 0x0750..=0x077F | 0xFB50..=0xFDFF | 0xFE70..=0xFEFF
    )
}

/// Fraction of non-whitespace characters in `text` that are Arabic script.
pub fn arabic_ratio(text: &str) -> f64 {
    let mut total = 0usize;
    let mut arabic = 0usize;
    for c in text.chars().filter(|c| !c.is_whitespace()) {
        total += 1;
        if is_arabic_char(c) {
            arabic += 1;
        }
    }
    if total == 0 {
        return 0.0;
    }
    arabic as f64 / total as f64
}

/// Classify `text` as Arabic, French or English.
pub fn detect_language(text: &str) -> Language {
    if arabic_ratio(text) > ARABIC_THRESHOLD {
        return Language::Arabic;
    }

    let lowered = text.to_lowercase();
    let tokens: Vec<&str> = lowered
        .split(|c: char| c.is_whitespace() || c == '\'' || c == '’' || c == '-')
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|t| !t.is_empty())
        .collect();

    let matches = tokens
        .iter()
        .filter(|t| FRENCH_STOPWORDS.contains(t))
        .count();
    if matches >= 2
        || (!tokens.is_empty() && matches as f64 / tokens.len() as f64 > FRENCH_TOKEN_SHARE)
    {
        return Language::French;
    }

    if lowered.chars().any(|c| FRENCH_DIACRITICS.contains(&c)) {
        return Language::French;
    }

    Language::English
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arabic_query() {
        assert_eq!(detect_language("ما هي أركان الإسلام؟"), Language::Arabic);
    }

    #[test]
    fn test_arabic_with_latin_citation() {
        // Mostly Arabic with a transliterated reference.
        assert_eq!(
            detect_language("اذكر أسماء الله الحسنى (Asma ul Husna)"),
            Language::Arabic
        );
    }

    #[test]
    fn test_latin_with_sparse_arabic_is_not_arabic() {
        let text = "What does the word الله mean in the opening chapter of the book?";
        assert!(arabic_ratio(text) < ARABIC_THRESHOLD);
        assert_eq!(detect_language(text), Language::English);
    }

    #[test]
    fn test_french_stopwords() {
        assert_eq!(
            detect_language("Quels sont les piliers de la foi ?"),
            Language::French
        );
        assert_eq!(detect_language("Donnez-moi la liste"), Language::French);
    }

    #[test]
    fn test_single_stopword_in_short_query() {
        // One match out of three tokens is above the 25% share.
        assert_eq!(detect_language("parle du jeûne"), Language::French);
        assert_eq!(detect_language("pourquoi Ramadan"), Language::French);
    }

    #[test]
    fn test_french_diacritics_fallback() {
        assert_eq!(detect_language("Prière du vendredi expliquée"), Language::French);
        assert_eq!(detect_language("hajj à Makkah"), Language::French);
    }

    #[test]
    fn test_english_default() {
        assert_eq!(detect_language("What is Hajj?"), Language::English);
        assert_eq!(
            detect_language("Tell me about the life of the Prophet in Medina"),
            Language::English
        );
        assert_eq!(detect_language(""), Language::English);
        assert_eq!(detect_language("   "), Language::English);
    }

    #[test]
    fn test_language_codes() {
        assert_eq!(Language::Arabic.to_string(), "ar");
        assert_eq!(
            serde_json::to_string(&Language::French).unwrap(),
            "\"fr\""
        );
        assert_eq!(Language::default(), Language::English);
    }
}
