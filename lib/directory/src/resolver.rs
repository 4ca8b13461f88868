//! Tiered identity resolution from free-text input.
//!
//! Unit numbers are short and collide with substrings of other fields, so
//! they are tried first with strict boundary and similarity rules, and only
//! when the input contains a digit. Names are free text and get permissive
//! substring matching, but never before a confident unit match. Once a tier
//! yields candidates, lower tiers are not consulted.

use crate::store::DirectorySnapshot;
use crate::tenant::TenantIdentity;
use std::collections::HashSet;

/// Default similarity threshold for the fuzzy unit tier.
pub const DEFAULT_UNIT_SIMILARITY: f64 = 0.90;

/// Outcome of resolving free-text input against a directory snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Exactly one tenant matched.
    Unique(TenantIdentity),
    /// Several tenants matched; caller should ask for more detail.
    Ambiguous(Vec<TenantIdentity>),
    /// Nothing matched.
    NoMatch,
}

impl Resolution {
    /// Returns true when exactly one tenant matched.
    #[must_use]
    pub fn is_unique(&self) -> bool {
        matches!(self, Self::Unique(_))
    }
}

/// Resolves free-text tenant input against the current roster snapshot.
#[derive(Debug, Clone)]
pub struct IdentityResolver {
    unit_similarity: f64,
}

impl Default for IdentityResolver {
    fn default() -> Self {
        Self {
            unit_similarity: DEFAULT_UNIT_SIMILARITY,
        }
    }
}

impl IdentityResolver {
    /// Creates a resolver with the default similarity threshold.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the fuzzy unit similarity threshold.
    #[must_use]
    pub fn with_unit_similarity(mut self, threshold: f64) -> Self {
        self.unit_similarity = threshold;
        self
    }

    /// Resolves input text to a tenant identity.
    #[must_use]
    pub fn resolve(&self, input: &str, snapshot: &DirectorySnapshot) -> Resolution {
        let normalized = normalize(input);
        if normalized.is_empty() {
            return Resolution::NoMatch;
        }
        let squeezed: String = normalized.chars().filter(|c| *c != ' ').collect();
        let tokens: Vec<&str> = normalized.split(' ').collect();
        let has_digit = normalized.chars().any(|c| c.is_ascii_digit());

        let mut candidates: Vec<&TenantIdentity> = Vec::new();

        if has_digit {
            for record in snapshot.records() {
                if self.unit_matches(&normalized, &squeezed, &record.identity) {
                    candidates.push(&record.identity);
                }
            }
        }

        if candidates.is_empty() {
            for record in snapshot.records() {
                if name_matches(&normalized, &tokens, &record.identity) {
                    candidates.push(&record.identity);
                }
            }
        }

        if candidates.is_empty() {
            for record in snapshot.records() {
                if combined_matches(&tokens, &record.identity) {
                    candidates.push(&record.identity);
                }
            }
        }

        // A mentioned park or city narrows the set but is never a tier of
        // its own: it cannot create candidates and never empties the set.
        let narrowed = narrow_by_park(&normalized, candidates, snapshot);

        let mut seen = HashSet::new();
        let mut identities: Vec<TenantIdentity> = narrowed
            .into_iter()
            .filter(|id| seen.insert((*id).clone()))
            .cloned()
            .collect();

        match identities.len() {
            0 => Resolution::NoMatch,
            1 => Resolution::Unique(identities.remove(0)),
            _ => {
                identities.sort_by(|a, b| a.external_id.cmp(&b.external_id));
                Resolution::Ambiguous(identities)
            }
        }
    }

    fn unit_matches(&self, normalized: &str, squeezed: &str, identity: &TenantIdentity) -> bool {
        let unit_squeezed = identity.normalized_unit();
        if unit_squeezed.is_empty() {
            return false;
        }
        if squeezed == unit_squeezed {
            return true;
        }

        // Input starts with the unit token followed by a word boundary.
        let unit_spaced = identity.spaced_unit();
        if normalized.len() > unit_spaced.len()
            && normalized.starts_with(&unit_spaced)
            && normalized.as_bytes()[unit_spaced.len()] == b' '
        {
            return true;
        }

        // The exact unit appearing anywhere as its own token(s) counts,
        // so "miguel 02" still resolves to unit 02.
        if unit_token_present(&normalized.split(' ').collect::<Vec<_>>(), &unit_squeezed) {
            return true;
        }

        strsim::normalized_levenshtein(squeezed, &unit_squeezed) >= self.unit_similarity
    }
}

fn name_matches(normalized: &str, tokens: &[&str], identity: &TenantIdentity) -> bool {
    let full = normalize(&identity.full_name());
    let first = normalize(&identity.first_name);
    let last = normalize(&identity.last_name);
    if full.is_empty() {
        return false;
    }

    if normalized == full {
        return true;
    }
    if (!first.is_empty() && normalized == first) || (!last.is_empty() && normalized == last) {
        return true;
    }
    if full.contains(normalized) {
        return true;
    }
    if !tokens.is_empty() && tokens.iter().all(|t| full.contains(*t)) {
        return true;
    }

    // First name exact plus any component of a multi-word surname.
    !first.is_empty()
        && tokens.contains(&first.as_str())
        && last.split(' ').any(|component| tokens.contains(&component))
}

/// True when the unit appears as its own token(s) in the input. The unit
/// may span several input tokens ("18 a"), so joined windows are checked
/// as well as single tokens.
fn unit_token_present(tokens: &[&str], unit_squeezed: &str) -> bool {
    (1..=3).any(|width| {
        tokens
            .windows(width)
            .any(|window| window.concat() == unit_squeezed)
    })
}

fn combined_matches(tokens: &[&str], identity: &TenantIdentity) -> bool {
    let unit_squeezed = identity.normalized_unit();
    if unit_squeezed.is_empty() {
        return false;
    }
    if !unit_token_present(tokens, &unit_squeezed) {
        return false;
    }

    let first = normalize(&identity.first_name);
    let last = normalize(&identity.last_name);
    (!first.is_empty() && tokens.contains(&first.as_str()))
        || last.split(' ').any(|component| {
            !component.is_empty() && tokens.contains(&component)
        })
}

fn narrow_by_park<'a>(
    normalized: &str,
    candidates: Vec<&'a TenantIdentity>,
    snapshot: &DirectorySnapshot,
) -> Vec<&'a TenantIdentity> {
    if candidates.is_empty() {
        return candidates;
    }

    let mut mentioned: HashSet<String> = HashSet::new();
    for record in snapshot.records() {
        for place in [&record.park.name, &record.park.city] {
            let place = normalize(place);
            if !place.is_empty() && normalized.contains(&place) {
                mentioned.insert(place);
            }
        }
    }
    if mentioned.is_empty() {
        return candidates;
    }

    let narrowed: Vec<&TenantIdentity> = candidates
        .iter()
        .copied()
        .filter(|id| {
            snapshot.get(id).is_some_and(|record| {
                mentioned.contains(&normalize(&record.park.name))
                    || mentioned.contains(&normalize(&record.park.city))
            })
        })
        .collect();

    if narrowed.is_empty() {
        candidates
    } else {
        narrowed
    }
}

/// Folds case, maps punctuation to spaces, collapses whitespace, trims.
fn normalize(input: &str) -> String {
    input
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
