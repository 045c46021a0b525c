//! System prompt assembly.
//!
//! The prompt is an ordered list of named sections rather than one string,
//! so callers and tests can check which blocks were included. The
//! completeness directive, when present, is always the last section.

use serde::{Deserialize, Serialize};

use crate::completeness::CompletenessInfo;
use crate::language::Language;

/// How retrieved reference text was selected by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RagMode {
    /// Loosely related excerpts
    #[default]
    General,
    /// Excerpts gathered for one specific topic page
    TopicDetail,
}

/// Retrieved reference text (Quran/Hadith excerpts, articles) for grounding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RagContext {
    pub text: String,
    pub mode: RagMode,
}

impl RagContext {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            mode: RagMode::General,
        }
    }

    pub fn topic_detail(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            mode: RagMode::TopicDetail,
        }
    }

    /// Whitespace-only context counts as absent.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Whether the answer is grounded in supplied reference text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grounding {
    Grounded,
    Ungrounded,
}

/// Identifies a prompt section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Persona,
    Formatting,
    QuranQuotation,
    AntiHallucination(Grounding),
    ReferenceContext,
    Completeness,
}

/// One block of the system prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptSection {
    pub kind: SectionKind,
    pub text: String,
}

/// Ordered system prompt sections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemPrompt {
    sections: Vec<PromptSection>,
}

impl SystemPrompt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: SectionKind, text: impl Into<String>) {
        self.sections.push(PromptSection {
            kind,
            text: text.into(),
        });
    }

    pub fn sections(&self) -> &[PromptSection] {
        &self.sections
    }

    pub fn kinds(&self) -> Vec<SectionKind> {
        self.sections.iter().map(|s| s.kind).collect()
    }

    pub fn has(&self, kind: SectionKind) -> bool {
        self.sections.iter().any(|s| s.kind == kind)
    }

    pub fn section(&self, kind: SectionKind) -> Option<&PromptSection> {
        self.sections.iter().find(|s| s.kind == kind)
    }

    /// Sections joined by blank lines.
    pub fn render(&self) -> String {
        self.sections
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

fn persona(language: Language) -> String {
    format!(
        "You are a knowledgeable and humble assistant specialized in Islamic studies: the Quran, \
         Hadith, Seerah, fiqh and Islamic history. Answer with the care of a teacher, follow the \
         methodology of mainstream Sunni scholarship, mention differences of opinion between the \
         schools where they exist, and use respectful honorifics for the Prophet and his \
         Companions. Respond entirely in {}.",
        language.name()
    )
}

const FORMATTING_RULES: &str = "FORMATTING: Write plain text only. Do not use markdown: no \
asterisks or underscores for emphasis, no # headers, no horizontal rules, no tables. The only \
structure allowed is a numbered list in the form \"1. ...\", one item per line.";

const QURAN_QUOTATION_RULES: &str = "QURAN QUOTATIONS: When you quote a verse, quote it in full \
with its surah name and verse number. Never shorten a verse with \"...\" or paraphrase it while \
presenting it as a quotation.";

const GROUNDED_POLICY: &str = "ACCURACY: Base your answer primarily on the reference sources \
provided below and cite them inline as [Source N], using their numbering. If the sources do not \
cover part of the question, say so explicitly before adding general knowledge. Never invent \
citations, hadith numbers or verse references.";

const UNGROUNDED_POLICY: &str = "ACCURACY: No reference sources were provided for this question. \
State only what is well established in mainstream scholarship and say plainly when you are \
unsure or when scholars differ. Never invent hadith, chains of narration, verse numbers or \
quotations from scholars.";

/// Compose the system prompt for one call.
///
/// `rag` is `None` for continuation calls: only the completeness directive
/// carries over from the original request.
pub fn build_system_prompt(
    language: Language,
    completeness: &CompletenessInfo,
    rag: Option<&RagContext>,
) -> SystemPrompt {
    let rag = rag.filter(|r| !r.is_empty());
    let mut prompt = SystemPrompt::new();

    prompt.push(SectionKind::Persona, persona(language));
    prompt.push(SectionKind::Formatting, FORMATTING_RULES);
    prompt.push(SectionKind::QuranQuotation, QURAN_QUOTATION_RULES);

    match rag {
        Some(context) => {
            prompt.push(SectionKind::AntiHallucination(Grounding::Grounded), GROUNDED_POLICY);
            prompt.push(
                SectionKind::ReferenceContext,
                format!("REFERENCE SOURCES:\n{}", context.text.trim()),
            );
        }
        None => {
            prompt.push(SectionKind::AntiHallucination(Grounding::Ungrounded), UNGROUNDED_POLICY);
        }
    }

    if completeness.is_list_request && !completeness.prompt_augmentation.is_empty() {
        prompt.push(SectionKind::Completeness, completeness.prompt_augmentation.clone());
    }

    prompt
}
