//! Exhaustive-list detection and verification.
//!
//! Models routinely truncate long enumerations. The guard recognizes queries
//! that ask for a complete list, produces a prompt directive demanding the full
//! enumeration, and afterwards counts numbered lines in the answer so the
//! orchestrator can request a targeted continuation when items are missing.
//!
//! Both classification tables are ordered and evaluated top to bottom; the
//! first matching entry wins.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// A canonical enumerable list with a fixed item count.
#[derive(Debug)]
pub struct CanonicalList {
    /// Human-readable label used in prompts
    pub label: &'static str,
    /// Agreed number of items
    pub expected_count: u32,
    /// Phrasings (English, French, Arabic) that refer to this list
    pub patterns: Vec<Regex>,
}

impl CanonicalList {
    fn new(label: &'static str, expected_count: u32, patterns: &[&str]) -> Self {
        Self {
            label,
            expected_count,
            patterns: patterns
                .iter()
                .map(|p| Regex::new(p).expect("invalid regex"))
                .collect(),
        }
    }

    /// Whether any phrasing of this list appears in `query`.
    pub fn matches(&self, query: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(query))
    }
}

static CANONICAL_LISTS: LazyLock<Vec<CanonicalList>> = LazyLock::new(|| {
    vec![
        CanonicalList::new(
            "the 99 Names of Allah",
            99,
            &[
                r"(?i)\b99\s+(beautiful\s+)?names\b",
                r"(?i)\bninety[-\s]nine\s+(beautiful\s+)?names\b",
                r"(?i)\basma['\s-]*(ul|al|u|ou)?['\s-]*h[ou]sna\b",
                r"(?i)\bbeautiful\s+names\s+of\s+allah\b",
                r"(?i)\b99\s+(beaux\s+)?noms\b",
                r"(?i)\bquatre[-\s]vingt[-\s]dix[-\s]neuf\s+noms\b",
                r"(?i)\bbeaux\s+noms\s+d['’]\s*allah\b",
                r"أسماء\s+الله\s+الحسنى",
                r"الأسماء\s+الحسنى",
                r"(99|٩٩)\s+اسم",
            ],
        ),
        CanonicalList::new(
            "the Pillars of Islam",
            5,
            &[
                r"(?i)\b(five\s+|5\s+)?pillars\s+of\s+islam\b",
                r"(?i)\b(cinq\s+|5\s+)?piliers\s+de\s+l['’]\s*islam\b",
                r"أركان\s+(الإسلام|الاسلام)",
            ],
        ),
        CanonicalList::new(
            "the Pillars of Iman (articles of faith)",
            6,
            &[
                r"(?i)\b(six\s+|6\s+)?pillars\s+of\s+(iman|imaan|faith|belief)\b",
                r"(?i)\b(six\s+|6\s+)?articles\s+of\s+faith\b",
                r"(?i)\b(six\s+|6\s+)?piliers\s+de\s+(la\s+foi|l['’]\s*iman)\b",
                r"أركان\s+(الإيمان|الايمان)",
            ],
        ),
        CanonicalList::new(
            "the ten Companions promised Paradise",
            10,
            &[
                r"(?i)\b(ten|10)\s+companions\s+promised\s+paradise\b",
                r"(?i)\bal[-\s]?ashara\s+al[-\s]?mubashshara\b",
                r"(?i)\b(dix|10)\s+compagnons\s+promis\s+au\s+paradis\b",
                r"العشرة\s+المبشرين",
            ],
        ),
        CanonicalList::new(
            "the 25 prophets named in the Quran",
            25,
            &[
                r"(?i)\b(25|twenty[-\s]five)\s+prophets\b",
                r"(?i)\bprophets\s+(named|mentioned)\s+in\s+the\s+(quran|qur'an|koran)\b",
                r"(?i)\b(25|vingt[-\s]cinq)\s+prophètes\b",
                r"(?i)\bprophètes\s+(nommés|mentionnés|cités)\s+dans\s+le\s+coran\b",
                r"الأنبياء\s+المذكورين\s+في\s+القرآن",
            ],
        ),
        CanonicalList::new(
            "the 114 surahs of the Quran",
            114,
            &[
                r"(?i)\b(all\s+)?(114|one\s+hundred\s+(and\s+)?fourteen)\s+(surahs|suras|chapters)\b",
                r"(?i)\b(toutes\s+les\s+)?114\s+sourates\b",
                r"(114|١١٤)\s+سورة",
            ],
        ),
    ]
});

static GENERIC_MARKERS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\b(list|enumerate)\b",
        r"(?i)\b(all|every|complete|full|entire|whole)\b",
        r"(?i)\b(tous|toutes|liste|complète|complet|entière|entier)\b",
        r"(?i)\bdonne[zs]?[-\s]moi\s+(tous|toutes|les)\b",
        r"(?:^|\s)(كل|جميع|قائمة|كاملة|كامل)(?:\s|$|[،؟.!])",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("invalid regex"))
    .collect()
});

// Digits are ASCII-only on purpose: see DESIGN.md (numbered-line heuristic).
static NUMBERED_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*[0-9]+[.)]\s").expect("invalid regex"));

/// Ordered table of canonical lists.
pub fn canonical_lists() -> &'static [CanonicalList] {
    &CANONICAL_LISTS
}

/// Ordered table of generic completeness-intent markers.
pub fn generic_markers() -> &'static [Regex] {
    &GENERIC_MARKERS
}

/// Result of analyzing a query for list semantics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletenessInfo {
    /// Query asks for an enumeration
    pub is_list_request: bool,
    /// Fixed count for canonical lists, `None` when unknown
    pub expected_count: Option<u32>,
    /// Canonical list label
    pub label: Option<String>,
    /// Directive appended to the system prompt (empty when not a list)
    pub prompt_augmentation: String,
}

impl CompletenessInfo {
    /// A query without list semantics.
    pub fn none() -> Self {
        Self::default()
    }

    /// Whether the answer can be mechanically verified against a count.
    pub fn has_known_count(&self) -> bool {
        self.is_list_request && self.expected_count.is_some()
    }
}

/// Outcome of counting numbered items in a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verification {
    pub item_count: usize,
    pub is_complete: bool,
}

/// Detects list requests and verifies enumerated answers.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompletenessGuard;

impl CompletenessGuard {
    pub fn new() -> Self {
        Self
    }

    /// Classify `query` against the canonical table, then the generic markers.
    pub fn analyze(&self, query: &str) -> CompletenessInfo {
        if let Some(list) = canonical_lists().iter().find(|l| l.matches(query)) {
            return CompletenessInfo {
                is_list_request: true,
                expected_count: Some(list.expected_count),
                label: Some(list.label.to_string()),
                prompt_augmentation: strict_directive(list.label, list.expected_count),
            };
        }

        if generic_markers().iter().any(|m| m.is_match(query)) {
            return CompletenessInfo {
                is_list_request: true,
                expected_count: None,
                label: None,
                prompt_augmentation: GENERIC_DIRECTIVE.to_string(),
            };
        }

        CompletenessInfo::none()
    }

    /// Count numbered lines and compare with `expected_count`.
    ///
    /// Without a target the answer is always reported complete, so no
    /// continuation is ever attempted for generic list requests.
    pub fn verify(&self, response_text: &str, expected_count: Option<u32>) -> Verification {
        let item_count = count_numbered_items(response_text);
        let is_complete = match expected_count {
            None => true,
            Some(expected) => item_count >= expected as usize,
        };
        Verification {
            item_count,
            is_complete,
        }
    }

    /// Follow-up user turn asking the model to finish an enumeration.
    pub fn build_continuation(
        &self,
        current_count: usize,
        expected_count: u32,
        label: Option<&str>,
    ) -> String {
        let label = label.unwrap_or("the list");
        let next = current_count + 1;
        format!(
            "Your previous answer listed items 1 to {current_count} of {label}, but the list has \
             {expected_count} items. Continue the numbered list starting exactly at item {next} \
             and ending at item {expected_count}. Do not repeat any of items 1 to {current_count}. \
             Keep the same format: one item per line, numbered \"{next}. ...\", with no \
             introduction."
        )
    }
}

/// Number of lines that start with a numbered-list marker (`1.` or `1)`).
pub fn count_numbered_items(text: &str) -> usize {
    NUMBERED_LINE.find_iter(text).count()
}

const GENERIC_DIRECTIVE: &str = "COMPLETENESS REQUIREMENT: The user is asking for a complete \
enumeration. List every item that belongs to the requested set. Do not truncate, summarize or \
stop early, and never end with \"etc.\" or \"and so on\". Number the items sequentially starting \
at 1, one item per line, in the form \"1. ...\". After the last item, state in one line how many \
items you listed.";

fn strict_directive(label: &str, count: u32) -> String {
    format!(
        "COMPLETENESS REQUIREMENT: The user is asking for {label}, which has exactly {count} \
         items. You MUST list all {count} items. Do not truncate, summarize, skip or merge items, \
         and never end with \"etc.\" or \"and so on\". Number every item sequentially from 1 to \
         {count}, one item per line, in the form \"1. ...\". After item {count}, confirm in one \
         line that all {count} items were listed."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn numbered(n: usize) -> String {
        (1..=n)
            .map(|i| format!("{i}. Item {i}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_99_names_variants() {
        let guard = CompletenessGuard::new();
        for query in [
            "List the 99 names of Allah",
            "What are the ninety-nine names?",
            "Tell me Asma ul Husna",
            "asma al-husna with meanings",
            "Donne-moi les 99 noms d'Allah",
            "les beaux noms d'Allah",
            "ما هي أسماء الله الحسنى",
            "اذكر 99 اسم",
        ] {
            let info = guard.analyze(query);
            assert!(info.is_list_request, "{query}");
            assert_eq!(info.expected_count, Some(99), "{query}");
            assert_eq!(info.label.as_deref(), Some("the 99 Names of Allah"));
            assert!(info.prompt_augmentation.contains("exactly 99 items"));
        }
    }

    #[test]
    fn test_pillars() {
        let guard = CompletenessGuard::new();
        assert_eq!(guard.analyze("What are the pillars of Islam?").expected_count, Some(5));
        assert_eq!(guard.analyze("Les cinq piliers de l'islam").expected_count, Some(5));
        assert_eq!(guard.analyze("ما هي أركان الإسلام").expected_count, Some(5));
        assert_eq!(guard.analyze("Explain the six pillars of iman").expected_count, Some(6));
        assert_eq!(guard.analyze("articles of faith").expected_count, Some(6));
        assert_eq!(guard.analyze("les piliers de la foi").expected_count, Some(6));
        assert_eq!(guard.analyze("أركان الإيمان").expected_count, Some(6));
    }

    #[test]
    fn test_first_match_wins() {
        // Mentions both lists; the 99 Names entry comes first in the table.
        let info = CompletenessGuard::new().analyze("the 99 names and the pillars of islam");
        assert_eq!(info.expected_count, Some(99));
    }

    #[test]
    fn test_generic_markers() {
        let guard = CompletenessGuard::new();
        for query in [
            "list all the wives of the Prophet",
            "Give me the complete story of Yusuf",
            "tous les compagnons de Badr",
            "Donnez-moi les noms des sourates mecquoises",
            "اذكر جميع الغزوات",
        ] {
            let info = guard.analyze(query);
            assert!(info.is_list_request, "{query}");
            assert_eq!(info.expected_count, None, "{query}");
            assert_eq!(info.label, None);
            assert_eq!(info.prompt_augmentation, GENERIC_DIRECTIVE);
        }
    }

    #[test]
    fn test_simple_query_is_not_list() {
        let guard = CompletenessGuard::new();
        for query in ["What is Hajj?", "Who was Khadija?", "ما هو الحج؟", "Qu'est-ce que la zakat ?"] {
            let info = guard.analyze(query);
            assert_eq!(info, CompletenessInfo::none(), "{query}");
            assert_eq!(info.prompt_augmentation, "");
            assert!(!info.has_known_count());
        }
    }

    #[test]
    fn test_arabic_marker_needs_whole_word() {
        // "مشكلة" contains "كل" but is not a completeness marker.
        let info = CompletenessGuard::new().analyze("ما هي مشكلة الربا");
        assert!(!info.is_list_request);
    }

    #[test]
    fn test_verify_complete_list() {
        let guard = CompletenessGuard::new();
        let text = numbered(99);
        assert_eq!(
            guard.verify(&text, Some(99)),
            Verification {
                item_count: 99,
                is_complete: true
            }
        );
    }

    #[test]
    fn test_verify_short_list() {
        let guard = CompletenessGuard::new();
        let result = guard.verify(&numbered(4), Some(99));
        assert_eq!(result.item_count, 4);
        assert!(!result.is_complete);
    }

    #[test]
    fn test_verify_without_target_is_complete() {
        let guard = CompletenessGuard::new();
        assert!(guard.verify("", None).is_complete);
        assert!(guard.verify(&numbered(3), None).is_complete);
    }

    #[test]
    fn test_numbered_line_formats() {
        let text = "Intro line\n1. Ar-Rahman\n  2) Ar-Rahim\n3.Al-Malik\nIn 1990. nothing\n٤. Arabic digit\n";
        // "3.Al-Malik" has no space and "In 1990." is not at line start.
        assert_eq!(count_numbered_items(text), 2);
    }

    #[test]
    fn test_continuation_prompt() {
        let prompt = CompletenessGuard::new().build_continuation(50, 99, Some("the 99 Names of Allah"));
        assert!(prompt.contains("items 1 to 50 of the 99 Names of Allah"));
        assert!(prompt.contains("starting exactly at item 51"));
        assert!(prompt.contains("ending at item 99"));
        assert!(prompt.contains("\"51. ...\""));

        let generic = CompletenessGuard::new().build_continuation(2, 5, None);
        assert!(generic.contains("of the list"));
    }

    #[test]
    fn test_tables_are_enumerable() {
        let counts: Vec<u32> = canonical_lists().iter().map(|l| l.expected_count).collect();
        assert_eq!(counts, vec![99, 5, 6, 10, 25, 114]);
        assert!(canonical_lists().iter().all(|l| !l.patterns.is_empty()));
        assert_eq!(generic_markers().len(), 5);
    }
}
