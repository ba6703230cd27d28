// 🎯 Company Matcher - candidate token → canonical or free company
//
// Resolution order (first match wins):
// 1. Exact alias lookup                     "сбер"         → "сбербанк"
// 2. Alias lookup without legal form        "пао сбербанк" → "сбербанк"
// 3. Free company if the token looks valid  "ромашка ооо"  → "ромашка" (not in roster)
//
// Anything else is noise and contributes nothing.

use crate::config::MatcherConfig;
use crate::entities::AliasIndex;
use crate::error::{IngestError, Result};
use crate::normalize::{char_len, normalize};
use crate::splitter::split_mentions_opt;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// ============================================================================
// RESOLUTION RESULT
// ============================================================================

/// Which resolution step produced an identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchKind {
    /// Candidate is a roster alias
    Alias,

    /// Candidate is a roster alias once legal-entity forms are removed
    LegalFormStripped,

    /// Not in the roster, but a plausible company name
    Free,
}

/// A resolved company identity
///
/// `name` is either a canonical roster name or a free company name. Whether
/// it is "known" is decided by the alias index (canonical-name membership),
/// not by `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedIdentity {
    pub name: String,
    pub kind: MatchKind,
}

impl ResolvedIdentity {
    fn new(name: impl Into<String>, kind: MatchKind) -> Self {
        ResolvedIdentity {
            name: name.into(),
            kind,
        }
    }
}

// ============================================================================
// COMPANY MATCHER
// ============================================================================

/// Matcher with its vocabularies fixed at construction
#[derive(Debug, Clone)]
pub struct CompanyMatcher {
    /// Whole-word legal forms, optionally followed by a period
    legal_forms: Option<Regex>,

    stop_words: HashSet<String>,

    noise_tokens: HashSet<String>,
}

impl CompanyMatcher {
    pub fn new(config: &MatcherConfig) -> Result<Self> {
        let mut forms: Vec<String> = config
            .legal_forms
            .iter()
            .map(|form| normalize(form))
            .filter(|form| !form.is_empty())
            .collect();
        // Longest first so alternation never prefers a shorter overlapping form
        forms.sort_by(|a, b| char_len(b).cmp(&char_len(a)).then(a.cmp(b)));
        forms.dedup();

        let legal_forms = if forms.is_empty() {
            None
        } else {
            let alternation = forms
                .iter()
                .map(|form| regex::escape(form))
                .collect::<Vec<_>>()
                .join("|");
            let pattern = format!(r"\b(?:{})\b\.?", alternation);
            Some(Regex::new(&pattern).map_err(|e| IngestError::Config(e.to_string()))?)
        };

        Ok(CompanyMatcher {
            legal_forms,
            stop_words: config.stop_words.iter().map(|w| normalize(w)).collect(),
            noise_tokens: config.noise_tokens.iter().map(|w| normalize(w)).collect(),
        })
    }

    /// Remove every whole-word legal form and re-normalize
    ///
    /// "ооо ромашка" → "ромашка", "сбербанк пао." → "сбербанк"
    pub fn strip_legal_forms(&self, token: &str) -> String {
        match &self.legal_forms {
            Some(pattern) => normalize(&pattern.replace_all(token, "")),
            None => normalize(token),
        }
    }

    /// Whether a token can stand alone as an unregistered company name
    pub fn is_valid(&self, token: &str) -> bool {
        if token.is_empty() {
            return false;
        }

        if self.noise_tokens.contains(token) {
            return false;
        }

        if token.chars().all(|c| c.is_ascii_digit()) {
            return false;
        }

        if char_len(token) <= 2 {
            return false;
        }

        if self.stop_words.contains(token) {
            return false;
        }

        !self.strip_legal_forms(token).is_empty()
    }

    /// Resolve one normalized candidate
    pub fn resolve(&self, candidate: &str, index: &AliasIndex) -> Option<ResolvedIdentity> {
        // Step 1: exact alias
        if let Some(canonical) = index.resolve_alias(candidate) {
            return Some(ResolvedIdentity::new(canonical, MatchKind::Alias));
        }

        // Step 2: alias without legal form
        let stripped = self.strip_legal_forms(candidate);
        if !stripped.is_empty() {
            if let Some(canonical) = index.resolve_alias(&stripped) {
                return Some(ResolvedIdentity::new(canonical, MatchKind::LegalFormStripped));
            }
        }

        // Step 3: free company (the stripped form must be valid on its own too)
        if self.is_valid(candidate) && self.is_valid(&stripped) {
            return Some(ResolvedIdentity::new(stripped, MatchKind::Free));
        }

        None
    }

    /// Resolve every candidate of one annotation field
    ///
    /// Returns distinct identities in order of first resolution, so a company
    /// named twice in one post is counted once for that post.
    pub fn match_post(&self, field: Option<&str>, index: &AliasIndex) -> Vec<ResolvedIdentity> {
        let candidates = split_mentions_opt(field);

        let mut seen: HashSet<String> = HashSet::new();
        let mut identities = Vec::new();

        for candidate in &candidates {
            match self.resolve(candidate, index) {
                Some(identity) => {
                    if seen.insert(identity.name.clone()) {
                        identities.push(identity);
                    }
                }
                None => tracing::trace!("Rejected candidate '{}'", candidate),
            }
        }

        identities
    }
}

// ============================================================================
// TESTS
// ============================================================================
