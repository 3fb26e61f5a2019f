//! System prompts and few-shot transcripts
//!
//! The agent speaks exactly two languages; each gets a parallel system
//! prompt and few-shot example set so the model's output language is
//! forced by instruction plus in-context example rather than post-hoc
//! translation. The library is built once at startup and borrowed by the
//! orchestrator; nothing here mutates at runtime.

pub mod english;
pub mod spanish;

use crate::providers::Message;

/// Supported response languages (closed enumeration)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    /// English
    English,
    /// Spanish
    Spanish,
}

impl Language {
    /// Parses a caller-supplied language flag, defaulting to English
    ///
    /// Accepts ISO-style codes (`es`, `es-MX`) and spelled-out names; any
    /// unrecognized value falls back to English rather than erroring.
    ///
    /// # Examples
    ///
    /// ```
    /// use voxcrm::prompts::Language;
    ///
    /// assert_eq!(Language::parse_loose(Some("es")), Language::Spanish);
    /// assert_eq!(Language::parse_loose(Some("en-US")), Language::English);
    /// assert_eq!(Language::parse_loose(None), Language::English);
    /// ```
    pub fn parse_loose(flag: Option<&str>) -> Self {
        match flag {
            Some(raw) => {
                let lower = raw.trim().to_ascii_lowercase();
                if lower == "es" || lower.starts_with("es-") || lower == "spanish" || lower == "español" {
                    Language::Spanish
                } else {
                    Language::English
                }
            }
            None => Language::English,
        }
    }
}

/// A language's prompt material
#[derive(Debug, Clone)]
pub struct PromptSet {
    /// System prompt prepended to every transcript
    pub system_prompt: String,
    /// Few-shot example exchanges prepended after the system prompt
    pub few_shot: Vec<Message>,
    /// Complete sentence returned when the model yields no usable text
    pub fallback_response: String,
}

/// Immutable prompt material for both languages, loaded once at startup
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    english: PromptSet,
    spanish: PromptSet,
}

impl PromptLibrary {
    /// Builds the library
    pub fn new() -> Self {
        Self {
            english: english::prompt_set(),
            spanish: spanish::prompt_set(),
        }
    }

    /// Selects the prompt set for a language
    pub fn select(&self, language: Language) -> &PromptSet {
        match language {
            Language::English => &self.english,
            Language::Spanish => &self.spanish,
        }
    }
}

impl Default for PromptLibrary {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_loose_variants() {
        assert_eq!(Language::parse_loose(Some("es")), Language::Spanish);
        assert_eq!(Language::parse_loose(Some("es-AR")), Language::Spanish);
        assert_eq!(Language::parse_loose(Some("Spanish")), Language::Spanish);
        assert_eq!(Language::parse_loose(Some("en")), Language::English);
        assert_eq!(Language::parse_loose(Some("de")), Language::English);
        assert_eq!(Language::parse_loose(None), Language::English);
    }

    #[test]
    fn test_library_selects_matching_language() {
        let library = PromptLibrary::new();
        assert!(library
            .select(Language::English)
            .system_prompt
            .contains("English"));
        assert!(library
            .select(Language::Spanish)
            .system_prompt
            .contains("español"));
    }

    #[test]
    fn test_few_shot_sets_are_parallel() {
        let library = PromptLibrary::new();
        let en = library.select(Language::English);
        let es = library.select(Language::Spanish);
        // Both sets demonstrate the same exchanges
        assert_eq!(en.few_shot.len(), es.few_shot.len());
        assert!(!en.few_shot.is_empty());
    }

    #[test]
    fn test_few_shot_demonstrates_tool_call() {
        let library = PromptLibrary::new();
        let en = library.select(Language::English);
        assert!(en
            .few_shot
            .iter()
            .any(|m| m.tool_calls.as_ref().is_some_and(|c| !c.is_empty())));
        assert!(en.few_shot.iter().any(|m| m.role == "tool"));
    }

    #[test]
    fn test_fallbacks_are_complete_sentences() {
        let library = PromptLibrary::new();
        for language in [Language::English, Language::Spanish] {
            let fallback = &library.select(language).fallback_response;
            assert!(!fallback.trim().is_empty());
            assert!(fallback.len() > 10);
        }
    }
}
