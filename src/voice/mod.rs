//! Confirm/cancel utterance interpretation, English and Korean.
//!
//! Matching is exact or substring containment on the lower-cased, trimmed
//! utterance. No fuzzy matching.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceCommand {
    Apply,
    Reject,
    NoMatch,
}

impl fmt::Display for VoiceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Apply => "apply",
            Self::Reject => "reject",
            Self::NoMatch => "no match",
        };
        write!(f, "{}", s)
    }
}

/// Intent phrase tables, checked in order. Apply comes first.
pub const PHRASE_TABLE: &[(VoiceCommand, &[&str])] = &[
    (
        VoiceCommand::Apply,
        &[
            "accept", "apply", "yes", "confirm", "ok", "적용", "승인", "확인", "수락", "좋아",
        ],
    ),
    (
        VoiceCommand::Reject,
        &[
            "reject", "cancel", "no", "discard", "undo", "revert", "decline", "취소", "거부",
            "되돌려", "거절", "아니",
        ],
    ),
];

#[derive(Debug, Clone, Copy)]
pub struct VoiceCommandInterpreter {
    table: &'static [(VoiceCommand, &'static [&'static str])],
}

impl Default for VoiceCommandInterpreter {
    fn default() -> Self {
        Self { table: PHRASE_TABLE }
    }
}

impl VoiceCommandInterpreter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(table: &'static [(VoiceCommand, &'static [&'static str])]) -> Self {
        Self { table }
    }

    /// Map an utterance to an intent. Always `NoMatch` when nothing is pending.
    pub fn interpret(&self, utterance: &str, has_pending: bool) -> VoiceCommand {
        if !has_pending {
            return VoiceCommand::NoMatch;
        }
        let normalized = utterance.trim().to_lowercase();
        if normalized.is_empty() {
            return VoiceCommand::NoMatch;
        }

        self.table
            .iter()
            .find(|(_, phrases)| {
                phrases
                    .iter()
                    .any(|phrase| normalized == *phrase || normalized.contains(phrase))
            })
            .map_or(VoiceCommand::NoMatch, |(command, _)| *command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interpret(utterance: &str) -> VoiceCommand {
        VoiceCommandInterpreter::new().interpret(utterance, true)
    }

    #[test]
    fn test_no_pending_is_always_no_match() {
        let interpreter = VoiceCommandInterpreter::new();
        for utterance in ["apply", "yes", "적용", "cancel", "취소", ""] {
            assert_eq!(interpreter.interpret(utterance, false), VoiceCommand::NoMatch);
        }
    }

    #[test]
    fn test_english_phrases() {
        assert_eq!(interpret("apply"), VoiceCommand::Apply);
        assert_eq!(interpret("  Yes  "), VoiceCommand::Apply);
        assert_eq!(interpret("OK, go ahead"), VoiceCommand::Apply);
        assert_eq!(interpret("cancel"), VoiceCommand::Reject);
        assert_eq!(interpret("Discard it"), VoiceCommand::Reject);
    }

    #[test]
    fn test_korean_phrases() {
        assert_eq!(interpret("네 적용해"), VoiceCommand::Apply);
        assert_eq!(interpret("승인"), VoiceCommand::Apply);
        assert_eq!(interpret("취소해줘"), VoiceCommand::Reject);
        assert_eq!(interpret("되돌려"), VoiceCommand::Reject);
    }

    #[test]
    fn test_apply_checked_before_reject() {
        // "no" and "ok" both appear; apply wins
        assert_eq!(interpret("ok no"), VoiceCommand::Apply);
    }

    #[test]
    fn test_unrelated_utterance_is_no_match() {
        assert_eq!(interpret("what time is it"), VoiceCommand::NoMatch);
        assert_eq!(interpret("   "), VoiceCommand::NoMatch);
    }

    #[test]
    fn test_custom_table() {
        const TABLE: &[(VoiceCommand, &[&str])] = &[(VoiceCommand::Reject, &["stop"])];
        let interpreter = VoiceCommandInterpreter::with_table(TABLE);
        assert_eq!(interpreter.interpret("stop that", true), VoiceCommand::Reject);
        assert_eq!(interpreter.interpret("apply", true), VoiceCommand::NoMatch);
    }
}
