//! Intent classification and language detection.
//!
//! Deliberately simple keyword membership tests. The tenant population is
//! bilingual, so every vocabulary carries Spanish terms alongside English.

use crate::session::Language;

/// What an inbound message is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Tenant is wrapping up the conversation.
    EndOfConversation,
    /// Something is broken; log it and notify the owner.
    Maintenance,
    /// Balance/ledger question; needs the transaction ledger.
    Financial,
    /// Anything else.
    General,
}

/// Stems checked as substrings so "leaking" and "flooded" still hit.
const MAINTENANCE_STEMS: &[&str] = &[
    "fix", "broken", "leak", "flood", "damage", "repair", "clog", "power", "maintenance",
    // Spanish
    "fuga", "roto", "rota", "reparar", "arregl", "inundac", "mantenimiento", "goteando",
];

/// Whole words ending a conversation; matched on token boundaries so
/// "bye" never fires inside "maybe".
const END_WORDS: &[&str] = &["bye", "goodbye", "adios", "adiós"];

/// Multi-word closers matched as phrases.
const END_PHRASES: &[&str] = &[
    "that s all",
    "that is all",
    "no more questions",
    "nothing else",
    "eso es todo",
    "nada mas",
    "nada más",
    "hasta luego",
];

/// Whole words suggesting a balance/ledger question.
const FINANCIAL_WORDS: &[&str] = &[
    "balance", "rent", "owe", "due", "payment", "pay", "paid", "ledger", "statement", "charges",
    // Spanish
    "saldo", "renta", "pago", "pagar", "debo", "deuda",
];

/// Greeting-only tokens; a message made entirely of these is not a query.
const GREETING_WORDS: &[&str] = &[
    "hi", "hello", "hey", "hiya", "morning", "afternoon", "evening", "good", "there",
    // Spanish
    "hola", "buenas", "buenos", "dias", "días", "tardes", "noches", "saludos",
];

/// Words and characters that mark a message as Spanish.
const SPANISH_MARKERS: &[&str] = &[
    "hola", "buenos", "buenas", "gracias", "necesito", "ayuda", "cuanto", "cuánto", "renta",
    "saldo", "tengo", "quiero", "donde", "dónde", "por", "favor", "problema", "fuga", "pago",
];

/// Classifies a message. End-of-conversation wins over maintenance, which
/// wins over financial; everything else is general.
#[must_use]
pub fn classify(text: &str) -> Intent {
    let folded = fold(text);
    let tokens: Vec<&str> = folded.split(' ').filter(|t| !t.is_empty()).collect();

    if END_WORDS.iter().any(|w| tokens.contains(w))
        || END_PHRASES.iter().any(|p| folded.contains(p))
    {
        return Intent::EndOfConversation;
    }
    if MAINTENANCE_STEMS.iter().any(|stem| folded.contains(stem)) {
        return Intent::Maintenance;
    }
    if FINANCIAL_WORDS.iter().any(|w| tokens.contains(w)) {
        return Intent::Financial;
    }
    Intent::General
}

/// Returns true when the message is a bare greeting with no substance.
///
/// Used to avoid re-processing "hello" as a query after identification.
#[must_use]
pub fn is_greeting_only(text: &str) -> bool {
    let folded = fold(text);
    let tokens: Vec<&str> = folded.split(' ').filter(|t| !t.is_empty()).collect();
    if tokens.is_empty() || tokens.len() > 3 {
        return false;
    }
    tokens.iter().all(|t| GREETING_WORDS.contains(t))
}

/// Detects the binary language tag from the first inbound message.
///
/// Defaults to English; any Spanish marker word or Spanish-only letter
/// flips it.
#[must_use]
pub fn detect_language(text: &str) -> Language {
    if text.chars().any(|c| "¿¡ñáéíóú".contains(c)) {
        return Language::Spanish;
    }
    let folded = fold(text);
    let tokens: Vec<&str> = folded.split(' ').filter(|t| !t.is_empty()).collect();
    if SPANISH_MARKERS.iter().any(|m| tokens.contains(m)) {
        Language::Spanish
    } else {
        Language::English
    }
}

/// Lowercases and maps punctuation to spaces.
fn fold(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
