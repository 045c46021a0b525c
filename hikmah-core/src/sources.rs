//! Knowledge-source attribution shown alongside an answer.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::language::Language;

/// Broad content area a query is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Quran,
    Hadith,
    Seerah,
    General,
}

static CONTENT_PATTERNS: LazyLock<Vec<(ContentKind, Regex)>> = LazyLock::new(|| {
    [
        (
            ContentKind::Quran,
            r"(?i)\b(quran|qur'an|koran|coran|surah?|sourate|ayah?|verse|verset|tafsir)\b|القرآن|سورة|آية|تفسير",
        ),
        (
            ContentKind::Hadith,
            r"(?i)\b(hadiths?|sunnah|bukhari|muslim\s+collection|narrat\w*|rapporté)\b|حديث|السنة|البخاري",
        ),
        (
            ContentKind::Seerah,
            r"(?i)\b(seerah|sira|sîra|biography|biographie|battle\s+of|bataille|hijra|hegire|hégire|companions?|compagnons?)\b|السيرة|غزوة|الهجرة|الصحابة",
        ),
    ]
    .into_iter()
    .map(|(kind, pattern)| (kind, Regex::new(pattern).expect("invalid regex")))
    .collect()
});

impl ContentKind {
    /// First matching entry of the ordered pattern table, else `General`.
    pub fn classify(query: &str) -> Self {
        CONTENT_PATTERNS
            .iter()
            .find(|(_, pattern)| pattern.is_match(query))
            .map(|(kind, _)| *kind)
            .unwrap_or(ContentKind::General)
    }
}

/// Read-only lookup of display strings for knowledge sources.
pub trait SourceCatalog: Send + Sync {
    fn sources(&self, kind: ContentKind, language: Language) -> Vec<String>;
}

/// Catalog bundled with the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinSourceCatalog;

impl SourceCatalog for BuiltinSourceCatalog {
    fn sources(&self, kind: ContentKind, language: Language) -> Vec<String> {
        let names: &[&str] = match (kind, language) {
            (ContentKind::Quran, Language::English) => {
                &["The Noble Quran", "Tafsir Ibn Kathir"]
            }
            (ContentKind::Quran, Language::French) => {
                &["Le Noble Coran", "Tafsir d'Ibn Kathir"]
            }
            (ContentKind::Quran, Language::Arabic) => &["القرآن الكريم", "تفسير ابن كثير"],
            (ContentKind::Hadith, Language::English) => {
                &["Sahih al-Bukhari", "Sahih Muslim", "Riyad as-Salihin"]
            }
            (ContentKind::Hadith, Language::French) => {
                &["Sahih al-Bukhari", "Sahih Muslim", "Les Jardins des Vertueux"]
            }
            (ContentKind::Hadith, Language::Arabic) => {
                &["صحيح البخاري", "صحيح مسلم", "رياض الصالحين"]
            }
            (ContentKind::Seerah, Language::English) => {
                &["The Sealed Nectar (Ar-Raheeq Al-Makhtum)", "Sirat Ibn Hisham"]
            }
            (ContentKind::Seerah, Language::French) => {
                &["Le Nectar Cacheté", "La Sîra d'Ibn Hichâm"]
            }
            (ContentKind::Seerah, Language::Arabic) => {
                &["الرحيق المختوم", "السيرة النبوية لابن هشام"]
            }
            (ContentKind::General, Language::English) => {
                &["The Noble Quran", "Authentic Sunnah"]
            }
            (ContentKind::General, Language::French) => &["Le Noble Coran", "La Sunna authentique"],
            (ContentKind::General, Language::Arabic) => &["القرآن الكريم", "السنة النبوية الصحيحة"],
        };
        names.iter().map(|s| s.to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(ContentKind::classify("Explain Surah Al-Fatiha"), ContentKind::Quran);
        assert_eq!(ContentKind::classify("Que dit le Coran sur la patience ?"), ContentKind::Quran);
        assert_eq!(ContentKind::classify("A hadith about kindness"), ContentKind::Hadith);
        assert_eq!(ContentKind::classify("حديث عن الصبر"), ContentKind::Hadith);
        assert_eq!(ContentKind::classify("What happened at the battle of Badr?"), ContentKind::Seerah);
        assert_eq!(ContentKind::classify("What is Hajj?"), ContentKind::General);
    }

    #[test]
    fn test_table_order() {
        // Mentions both; Quran is checked first.
        assert_eq!(
            ContentKind::classify("hadith explaining a verse"),
            ContentKind::Quran
        );
    }

    #[test]
    fn test_builtin_catalog_covers_every_language() {
        let catalog = BuiltinSourceCatalog;
        for kind in [
            ContentKind::Quran,
            ContentKind::Hadith,
            ContentKind::Seerah,
            ContentKind::General,
        ] {
            for language in [Language::Arabic, Language::French, Language::English] {
                assert!(!catalog.sources(kind, language).is_empty());
            }
        }
        assert_eq!(
            catalog.sources(ContentKind::Hadith, Language::English)[0],
            "Sahih al-Bukhari"
        );
    }
}
