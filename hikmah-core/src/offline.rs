//! User-facing messages shown when no answer could be generated.

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::language::Language;

/// Why the assistant is offline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfflineCause {
    /// No provider has a usable API key
    NotConfigured,
    /// A provider rejected its API key
    AuthenticationRejected,
    /// Network or provider failure
    Connectivity,
}

impl OfflineCause {
    /// Classify a failed call. `providers_configured` is false when no
    /// client reported itself available.
    pub fn classify(error: &Error, providers_configured: bool) -> Self {
        if !providers_configured || matches!(error, Error::NotConfigured) {
            Self::NotConfigured
        } else if error.is_auth_failure() {
            Self::AuthenticationRejected
        } else {
            Self::Connectivity
        }
    }
}

/// Localized explanation for the chat screen.
pub fn offline_message(language: Language, cause: OfflineCause) -> &'static str {
    match (language, cause) {
        (Language::English, OfflineCause::NotConfigured) => {
            "The assistant is not configured yet. Please add an AI provider API key in the app settings to start asking questions."
        }
        (Language::English, OfflineCause::AuthenticationRejected) => {
            "The AI provider rejected the configured API key. Please check that the key is valid and has not expired."
        }
        (Language::English, OfflineCause::Connectivity) => {
            "The assistant cannot be reached right now. Please check your internet connection and try again in a moment."
        }
        (Language::French, OfflineCause::NotConfigured) => {
            "L'assistant n'est pas encore configuré. Veuillez ajouter une clé API d'un fournisseur d'IA dans les paramètres pour poser vos questions."
        }
        (Language::French, OfflineCause::AuthenticationRejected) => {
            "Le fournisseur d'IA a refusé la clé API configurée. Veuillez vérifier qu'elle est valide et n'a pas expiré."
        }
        (Language::French, OfflineCause::Connectivity) => {
            "L'assistant est momentanément injoignable. Veuillez vérifier votre connexion internet et réessayer dans un instant."
        }
        (Language::Arabic, OfflineCause::NotConfigured) => {
            "المساعد غير مهيأ بعد. يرجى إضافة مفتاح واجهة برمجية لمزود الذكاء الاصطناعي في الإعدادات لبدء طرح الأسئلة."
        }
        (Language::Arabic, OfflineCause::AuthenticationRejected) => {
            "رفض مزود الذكاء الاصطناعي المفتاح المهيأ. يرجى التحقق من صلاحية المفتاح وعدم انتهائه."
        }
        (Language::Arabic, OfflineCause::Connectivity) => {
            "تعذر الوصول إلى المساعد حالياً. يرجى التحقق من اتصالك بالإنترنت والمحاولة مرة أخرى بعد قليل."
        }
    }
}
