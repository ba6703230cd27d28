// 📊 Mention Aggregator - per-company counts and source links
//
// One post contributes at most +1 to each distinct company it mentions.
// Records keep first-seen order; links keep first-seen order without repeats.

use crate::entities::{AliasIndex, CanonicalCompany};
use crate::matcher::ResolvedIdentity;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// MENTION RECORD
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MentionRecord {
    /// Canonical roster name or free company name
    pub name: String,

    /// Number of posts mentioning this company
    pub count: usize,

    /// Distinct source links, in first-seen order
    pub links: Vec<String>,

    /// Roster company when the name is canonical
    pub company: Option<CanonicalCompany>,
}

impl MentionRecord {
    fn new(name: String, company: Option<CanonicalCompany>) -> Self {
        MentionRecord {
            name,
            count: 0,
            links: Vec::new(),
            company,
        }
    }

    pub fn is_known(&self) -> bool {
        self.company.is_some()
    }

    /// Append a link unless blank or already present
    pub fn add_link(&mut self, link: &str) {
        let link = link.trim();
        if !link.is_empty() && !self.links.iter().any(|l| l == link) {
            self.links.push(link.to_string());
        }
    }
}

// ============================================================================
// AGGREGATOR
// ============================================================================

/// Accumulates mention records for one run
pub struct MentionAggregator<'i> {
    index: &'i AliasIndex,
    records: Vec<MentionRecord>,
    positions: HashMap<String, usize>,
    posts_seen: usize,
    posts_with_mentions: usize,
}

impl<'i> MentionAggregator<'i> {
    pub fn new(index: &'i AliasIndex) -> Self {
        MentionAggregator {
            index,
            records: Vec::new(),
            positions: HashMap::new(),
            posts_seen: 0,
            posts_with_mentions: 0,
        }
    }

    /// Record one post's distinct identities under its source link
    pub fn record_post(&mut self, link: Option<&str>, identities: &[ResolvedIdentity]) {
        self.posts_seen += 1;
        if !identities.is_empty() {
            self.posts_with_mentions += 1;
        }

        for identity in identities {
            let record = self.record_mut(&identity.name);
            record.count += 1;
            if let Some(link) = link {
                record.add_link(link);
            }
        }
    }

    /// Existing record, or a new one (roster data looked up by canonical name)
    fn record_mut(&mut self, name: &str) -> &mut MentionRecord {
        let position = match self.positions.get(name) {
            Some(&position) => position,
            None => {
                let company = self.index.record(name).cloned();
                self.records.push(MentionRecord::new(name.to_string(), company));
                self.positions.insert(name.to_string(), self.records.len() - 1);
                self.records.len() - 1
            }
        };
        &mut self.records[position]
    }

    /// Records in first-seen order
    pub fn records(&self) -> &[MentionRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<MentionRecord> {
        self.records
    }

    pub fn get(&self, name: &str) -> Option<&MentionRecord> {
        self.positions.get(name).map(|&i| &self.records[i])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn posts_seen(&self) -> usize {
        self.posts_seen
    }

    pub fn posts_with_mentions(&self) -> usize {
        self.posts_with_mentions
    }
}

// ============================================================================
// TESTS
// ============================================================================
