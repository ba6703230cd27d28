// 🏢 Company Entity - canonical roster companies + alias index
//
// "Альфа-Банк", "alfa", "АО Альфа-Банк" → one canonical identity: "альфа-банк"
//
// Identity = normalized full name. Aliases map to that identity through a
// precomputed index, so resolving a mention is a single hash lookup.

use crate::config::{MatcherConfig, WorkbookConfig};
use crate::error::Result;
use crate::normalize::{char_len, normalize};
use crate::workbook::{Sheet, SheetRow};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info, warn};

// ============================================================================
// CANONICAL COMPANY
// ============================================================================

/// One roster company
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalCompany {
    /// Identity key: normalized full name
    pub canonical_name: String,

    /// Roster id (the "#" column), if present
    pub id: Option<String>,

    /// Normalized "also known as" names (before index pruning)
    pub aliases: Vec<String>,

    /// Responsible party for events
    pub owner_events: Option<String>,

    /// Responsible party for media
    pub owner_media: Option<String>,

    /// Every non-blank roster cell, keyed by column title
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl CanonicalCompany {
    /// Create a company from a raw full name
    ///
    /// Returns `None` when the name normalizes to nothing.
    pub fn new(full_name: &str) -> Option<Self> {
        let canonical_name = normalize(full_name);
        if canonical_name.is_empty() {
            return None;
        }

        Some(CanonicalCompany {
            canonical_name,
            id: None,
            aliases: Vec::new(),
            owner_events: None,
            owner_media: None,
            fields: BTreeMap::new(),
        })
    }

    /// Add an alias (normalized; empty, duplicate and self aliases ignored)
    pub fn add_alias(&mut self, alias: &str) {
        let alias = normalize(alias);
        if !alias.is_empty() && alias != self.canonical_name && !self.aliases.contains(&alias) {
            self.aliases.push(alias);
        }
    }

    /// Add every comma-separated alias of an "also known as" cell
    pub fn add_aka_list(&mut self, aka: &str) {
        for alias in aka.split(',') {
            self.add_alias(alias);
        }
    }

    /// Canonical name followed by aliases
    pub fn all_names(&self) -> Vec<String> {
        let mut names = vec![self.canonical_name.clone()];
        names.extend(self.aliases.iter().cloned());
        names
    }

    /// Build from one roster row; `None` for rows with an empty name
    pub fn from_row(row: &SheetRow<'_>, columns: &RosterColumns) -> Option<Self> {
        let mut company = Self::new(row.cell(columns.full_name).unwrap_or_default())?;

        if let Some(aka) = row.cell(columns.aka) {
            company.add_aka_list(aka);
        }
        company.id = row.cell_opt(columns.id).map(|v| v.trim().to_string());
        company.owner_events = row.cell_opt(columns.owner_events).map(|v| v.trim().to_string());
        company.owner_media = row.cell_opt(columns.owner_media).map(|v| v.trim().to_string());
        company.fields = row
            .fields()
            .map(|(header, value)| (header.trim().to_string(), serde_json::json!(value)))
            .collect();

        Some(company)
    }
}

// ============================================================================
// ROSTER COLUMNS
// ============================================================================

/// Column positions in the roster sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RosterColumns {
    pub full_name: usize,
    pub aka: usize,
    pub id: Option<usize>,
    pub owner_events: Option<usize>,
    pub owner_media: Option<usize>,
}

impl RosterColumns {
    /// Resolve column titles; full name and AKA are required
    pub fn resolve(sheet: &Sheet, config: &WorkbookConfig) -> Result<Self> {
        Ok(RosterColumns {
            full_name: sheet.require_column(&config.full_name_column)?,
            aka: sheet.require_column(&config.aka_column)?,
            id: sheet.column_index(&config.id_column),
            owner_events: sheet.column_index(&config.owner_events_column),
            owner_media: sheet.column_index(&config.owner_media_column),
        })
    }
}

// ============================================================================
// ALIAS INDEX
// ============================================================================

/// An alias registered for two different companies (later row wins)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasCollision {
    pub alias: String,
    pub previous: String,
    pub replacement: String,
}

/// alias → canonical name, canonical name → roster company
///
/// Immutable once built; safe to share between readers.
#[derive(Debug, Clone, Default)]
pub struct AliasIndex {
    alias_to_canonical: HashMap<String, String>,
    canonical_to_record: HashMap<String, CanonicalCompany>,
    collisions: Vec<AliasCollision>,
}

impl AliasIndex {
    /// Build the index from roster companies, in roster order
    ///
    /// Registration is last-write-wins: when an alias string recurs, the later
    /// company takes it over and the collision is recorded.
    ///
    /// Pruning runs after every alias is registered:
    /// - `invalid_aliases` (punctuation, "vk", "вк") are dropped
    /// - aliases of ≤2 characters are dropped unless they are a 2-character
    ///   canonical name
    pub fn build<I>(companies: I, invalid_aliases: &[String]) -> Self
    where
        I: IntoIterator<Item = CanonicalCompany>,
    {
        let mut registered: HashMap<String, String> = HashMap::new();
        let mut canonical_to_record: HashMap<String, CanonicalCompany> = HashMap::new();
        let mut collisions = Vec::new();

        for company in companies {
            let canonical = company.canonical_name.clone();

            for alias in company.all_names() {
                if let Some(previous) = registered.insert(alias.clone(), canonical.clone()) {
                    if previous != canonical {
                        warn!(
                            "Alias '{}' reassigned from '{}' to '{}'",
                            alias, previous, canonical
                        );
                        collisions.push(AliasCollision {
                            alias,
                            previous,
                            replacement: canonical.clone(),
                        });
                    }
                }
            }

            canonical_to_record.insert(canonical, company);
        }

        let two_char_names: HashSet<&str> = canonical_to_record
            .keys()
            .filter(|name| char_len(name) == 2)
            .map(|name| name.as_str())
            .collect();

        let alias_to_canonical: HashMap<String, String> = registered
            .into_iter()
            .filter(|(alias, _)| {
                if invalid_aliases.iter().any(|invalid| invalid == alias) {
                    return false;
                }
                char_len(alias) > 2 || two_char_names.contains(alias.as_str())
            })
            .collect();

        AliasIndex {
            alias_to_canonical,
            canonical_to_record,
            collisions,
        }
    }

    /// Build from the roster sheet; rows with an empty full name are skipped
    pub fn from_roster_sheet(
        sheet: &Sheet,
        workbook: &WorkbookConfig,
        matcher: &MatcherConfig,
    ) -> Result<Self> {
        let columns = RosterColumns::resolve(sheet, workbook)?;

        let companies: Vec<CanonicalCompany> = sheet
            .iter_rows()
            .filter_map(|row| {
                let company = CanonicalCompany::from_row(&row, &columns);
                if company.is_none() {
                    debug!("Skipping roster line {}: empty full name", row.line_number);
                }
                company
            })
            .collect();

        let index = Self::build(companies, &matcher.invalid_aliases);
        info!(
            "Alias index built: {} companies, {} aliases, {} collisions",
            index.company_count(),
            index.alias_count(),
            index.collisions.len()
        );

        Ok(index)
    }

    /// Canonical name for an alias
    pub fn resolve_alias(&self, alias: &str) -> Option<&str> {
        self.alias_to_canonical.get(alias).map(|c| c.as_str())
    }

    /// Roster company for a canonical name
    pub fn record(&self, canonical_name: &str) -> Option<&CanonicalCompany> {
        self.canonical_to_record.get(canonical_name)
    }

    /// Whether a name is a canonical roster identity
    pub fn is_canonical(&self, name: &str) -> bool {
        self.canonical_to_record.contains_key(name)
    }

    pub fn alias_to_canonical(&self) -> &HashMap<String, String> {
        &self.alias_to_canonical
    }

    pub fn canonical_to_record(&self) -> &HashMap<String, CanonicalCompany> {
        &self.canonical_to_record
    }

    pub fn collisions(&self) -> &[AliasCollision] {
        &self.collisions
    }

    pub fn company_count(&self) -> usize {
        self.canonical_to_record.len()
    }

    pub fn alias_count(&self) -> usize {
        self.alias_to_canonical.len()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn company(name: &str, aka: &str) -> CanonicalCompany {
        let mut company = CanonicalCompany::new(name).unwrap();
        company.add_aka_list(aka);
        company
    }

    fn build(companies: Vec<CanonicalCompany>) -> AliasIndex {
        AliasIndex::build(companies, &MatcherConfig::default().invalid_aliases)
    }

    #[test]
    fn test_company_creation() {
        let company = CanonicalCompany::new("  «Альфа-Банк» ").unwrap();

        assert_eq!(company.canonical_name, "альфа-банк");
        assert!(company.id.is_none());
        assert!(company.aliases.is_empty());
        assert!(CanonicalCompany::new("  ").is_none());
    }

    #[test]
    fn test_company_add_alias() {
        let mut company = CanonicalCompany::new("Альфа").unwrap();
        company.add_aka_list("alfa, Альфа-Банк, ALFA, , альфа");

        // Duplicate, empty and self aliases ignored
        assert_eq!(company.aliases, vec!["alfa", "альфа-банк"]);
        assert_eq!(company.all_names(), vec!["альфа", "alfa", "альфа-банк"]);
    }

    #[test]
    fn test_canonical_name_is_own_alias() {
        let index = build(vec![company("Яндекс", "yandex")]);

        assert_eq!(index.resolve_alias("яндекс"), Some("яндекс"));
        assert_eq!(index.resolve_alias("yandex"), Some("яндекс"));
        assert!(index.is_canonical("яндекс"));
        assert!(!index.is_canonical("yandex"));
        assert_eq!(index.company_count(), 1);
        assert_eq!(index.alias_count(), 2);
    }

    #[test]
    fn test_prune_keeps_two_char_canonical_names() {
        let index = build(vec![
            company("HH", ""),
            company("МТС", "мт, m"),
            company("ВКонтакте", "вк, vk, ВКонтакте"),
            company("Сбер", "сб, -, |"),
        ]);

        // 2-character canonical name survives as its own alias
        assert_eq!(index.resolve_alias("hh"), Some("hh"));
        assert_eq!(index.resolve_alias("мтс"), Some("мтс"));

        // Noise and short aliases are dropped
        assert_eq!(index.resolve_alias("вк"), None);
        assert_eq!(index.resolve_alias("vk"), None);
        assert_eq!(index.resolve_alias("мт"), None);
        assert_eq!(index.resolve_alias("m"), None);
        assert_eq!(index.resolve_alias("сб"), None);
        assert_eq!(index.resolve_alias("-"), None);
        assert_eq!(index.resolve_alias("|"), None);

        assert_eq!(index.resolve_alias("вконтакте"), Some("вконтакте"));
        assert_eq!(index.resolve_alias("сбер"), Some("сбер"));
    }

    #[test]
    fn test_prune_short_alias_matching_another_two_char_name_survives() {
        // "hh" is an AKA of a later row but also a 2-char canonical name
        let index = build(vec![company("HH", ""), company("HeadHunter", "hh")]);

        // Last write wins, and pruning keeps it because "hh" is a canonical 2-char name
        assert_eq!(index.resolve_alias("hh"), Some("headhunter"));
        assert_eq!(index.collisions().len(), 1);
    }

    #[test]
    fn test_prune_drops_single_char_canonical_name() {
        let index = build(vec![company("Q", "")]);

        // Only exactly-2-character names are protected
        assert_eq!(index.resolve_alias("q"), None);
        assert!(index.is_canonical("q"));
    }

    #[test]
    fn test_alias_collision_last_write_wins() {
        let index = build(vec![
            company("Тинькофф", "т-банк, tinkoff"),
            company("Т-Банк", "tinkoff"),
        ]);

        assert_eq!(index.resolve_alias("tinkoff"), Some("т-банк"));
        assert_eq!(index.resolve_alias("т-банк"), Some("т-банк"));

        let collisions = index.collisions();
        assert_eq!(collisions.len(), 2);
        assert!(collisions.contains(&AliasCollision {
            alias: "tinkoff".to_string(),
            previous: "тинькофф".to_string(),
            replacement: "т-банк".to_string(),
        }));
    }

    #[test]
    fn test_same_alias_same_company_is_not_collision() {
        let index = build(vec![company("Озон", "ozon"), company("Озон", "ozon")]);

        assert!(index.collisions().is_empty());
        assert_eq!(index.company_count(), 1);
    }

    #[test]
    fn test_from_roster_sheet() {
        let sheet = Sheet::new(
            "для ВПР",
            vec![
                "#".to_string(),
                "Полное имя".to_string(),
                "Also known as (AKA)".to_string(),
                "Ответственный ДК".to_string(),
                "Ответственный Media".to_string(),
                "Сайт".to_string(),
            ],
            vec![
                vec!["1", "Альфа", "alfa, альфа-банк", "Иванов", "", "alfabank.ru"]
                    .into_iter()
                    .map(String::from)
                    .collect(),
                vec!["2", "", "ghost", "", "", ""]
                    .into_iter()
                    .map(String::from)
                    .collect(),
            ],
        );

        let index = AliasIndex::from_roster_sheet(
            &sheet,
            &WorkbookConfig::default(),
            &MatcherConfig::default(),
        )
        .unwrap();

        // Row without a name is skipped entirely
        assert_eq!(index.company_count(), 1);
        assert_eq!(index.resolve_alias("ghost"), None);

        let alfa = index.record("альфа").unwrap();
        assert_eq!(alfa.id.as_deref(), Some("1"));
        assert_eq!(alfa.owner_events.as_deref(), Some("Иванов"));
        assert_eq!(alfa.owner_media, None);
        assert_eq!(alfa.fields.get("Сайт"), Some(&serde_json::json!("alfabank.ru")));
        assert_eq!(index.resolve_alias("альфа-банк"), Some("альфа"));
    }

    #[test]
    fn test_from_roster_sheet_requires_columns() {
        let sheet = Sheet::new("для ВПР", vec!["Полное имя".to_string()], vec![]);

        let err = AliasIndex::from_roster_sheet(
            &sheet,
            &WorkbookConfig::default(),
            &MatcherConfig::default(),
        )
        .unwrap_err();

        assert!(err.to_string().contains("Also known as (AKA)"));
    }
}
