//! Request validation and prompt-injection detection
//!
//! Validation failures reject the request with a 400 before any upstream
//! work. The injection scan is deliberately advisory: a hit logs a warning
//! with the matched pattern label and the request proceeds unchanged.

use crate::error::{Result, VoxcrmError};
use regex::Regex;

/// Maximum accepted session id length
const MAX_SESSION_ID_CHARS: usize = 128;

/// Validates the session id field
///
/// # Errors
///
/// Returns `VoxcrmError::Validation` when the id is missing, empty, or
/// oversized.
pub fn validate_session_id(raw: Option<&str>) -> Result<&str> {
    let session_id = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| VoxcrmError::Validation("sessionId is required".to_string()))?;

    if session_id.len() > MAX_SESSION_ID_CHARS {
        return Err(VoxcrmError::Validation("sessionId is too long".to_string()).into());
    }

    Ok(session_id)
}

/// Validates the question field
///
/// # Errors
///
/// Returns `VoxcrmError::Validation` when the question is missing, empty
/// after trimming, or longer than `max_chars`.
pub fn validate_question(raw: Option<&str>, max_chars: usize) -> Result<&str> {
    let question = raw
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| VoxcrmError::Validation("question is required".to_string()))?;

    if question.chars().count() > max_chars {
        return Err(VoxcrmError::Validation(format!(
            "question exceeds the maximum of {} characters",
            max_chars
        ))
        .into());
    }

    Ok(question)
}

/// Detector for common prompt-injection phrasings
///
/// Built once at startup; `scan` is read-only.
pub struct InjectionScanner {
    patterns: Vec<(&'static str, Regex)>,
}

impl InjectionScanner {
    /// Builds the scanner with its fixed pattern set
    pub fn new() -> Self {
        let sources: [(&'static str, &'static str); 6] = [
            ("ignore_instructions", r"(?i)ignore\s+(all\s+)?(previous|prior|above)\s+instructions"),
            ("disregard_rules", r"(?i)disregard\s+(your|the|all)\s+(rules|instructions|guidelines)"),
            ("role_override", r"(?i)you\s+are\s+now\s+(a|an|the)\s"),
            ("system_prompt_probe", r"(?i)(reveal|show|print|repeat)\b.*\bsystem\s+prompt"),
            ("jailbreak_marker", r"(?i)\b(jailbreak|developer\s+mode|dan\s+mode)\b"),
            ("prompt_leak", r"(?i)what\s+(are|were)\s+your\s+instructions"),
        ];

        let patterns = sources
            .into_iter()
            .filter_map(|(label, source)| Regex::new(source).ok().map(|re| (label, re)))
            .collect();

        Self { patterns }
    }

    /// Scans a question for injection phrasings
    ///
    /// Returns the label of the first matching pattern. Callers log the
    /// hit and continue; detection does not block the request.
    pub fn scan(&self, text: &str) -> Option<&'static str> {
        self.patterns
            .iter()
            .find(|(_, re)| re.is_match(text))
            .map(|(label, _)| *label)
    }
}

impl Default for InjectionScanner {
    fn default() -> Self {
        Self::new()
    }
}
