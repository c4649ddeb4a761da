//! Knowledge base of operational rules
//!
//! A [`KnowledgeBase`] is built once from an explicit rule table and is
//! read-only afterwards. Alongside the rules it keeps a polarity-pair table
//! mapping a consequent such as `Station_Closed_Expo` to the proposition that
//! asserts its opposite (`Station_Open_Expo`), used for violation attribution.

use std::collections::HashSet;
use std::path::Path;

use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::rule::{NetworkMode, Rule, RuleRecord};

/// Naming conventions from which polarity pairs are derived, checked in order.
/// Only the first matching convention applies to a consequent.
const POLARITY_CONVENTIONS: [(&str, &str); 2] = [("Closed", "Open"), ("Inactive", "Active")];

/// The serialized form of a rule table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTable {
    /// Rules in declaration order.
    pub rules: Vec<RuleRecord>,
    /// Extra `(consequent, opposite)` pairs on top of the derived ones.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub polarity_pairs: Vec<(String, String)>,
}

/// An ordered, immutable collection of [`Rule`]s.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    rules: Vec<Rule>,
    polarity_pairs: IndexMap<String, String>,
    explicit_pairs: Vec<(String, String)>,
}

impl KnowledgeBase {
    /// Builds a knowledge base from already validated rules.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateRule`] if two rules share an id.
    pub fn new(rules: Vec<Rule>) -> Result<Self> {
        Self::with_polarity_pairs(rules, Vec::new())
    }

    /// Builds a knowledge base with explicit polarity pairs in addition to the
    /// pairs derived from consequent names. Explicit pairs win on conflict.
    pub fn with_polarity_pairs(
        rules: Vec<Rule>,
        explicit_pairs: Vec<(String, String)>,
    ) -> Result<Self> {
        let mut seen = HashSet::new();
        for rule in &rules {
            if !seen.insert(rule.id()) {
                return Err(Error::DuplicateRule(rule.id().to_string()));
            }
        }

        let mut polarity_pairs = IndexMap::new();
        for rule in &rules {
            if let Some(opposite) = derive_opposite(rule.consequent()) {
                polarity_pairs.insert(rule.consequent().to_string(), opposite);
            }
        }
        for (name, opposite) in &explicit_pairs {
            if name.trim().is_empty() || opposite.trim().is_empty() {
                return Err(Error::InvalidRule(
                    "polarity pair names cannot be empty".to_string(),
                ));
            }
            polarity_pairs.insert(name.clone(), opposite.clone());
        }

        debug!(
            "Knowledge base built: {} rules, {} polarity pairs",
            rules.len(),
            polarity_pairs.len()
        );

        Ok(Self {
            rules,
            polarity_pairs,
            explicit_pairs,
        })
    }

    /// Builds a knowledge base from serialized rule records.
    pub fn from_table(table: RuleTable) -> Result<Self> {
        let rules = table
            .rules
            .into_iter()
            .map(Rule::try_from)
            .collect::<Result<Vec<_>>>()?;
        Self::with_polarity_pairs(rules, table.polarity_pairs)
    }

    /// Parses a JSON rule table.
    pub fn from_json(json: &str) -> Result<Self> {
        let table: RuleTable = serde_json::from_str(json)?;
        Self::from_table(table)
    }

    /// Reads a JSON rule table from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&json)
    }

    /// Serializes the rule table back to JSON.
    ///
    /// Explicit polarity pairs are written as they were given; derived pairs
    /// are recomputed on load.
    pub fn to_json(&self) -> Result<String> {
        let table = RuleTable {
            rules: self.rules.iter().cloned().map(RuleRecord::from).collect(),
            polarity_pairs: self.explicit_pairs.clone(),
        };
        serde_json::to_string_pretty(&table).map_err(Error::from)
    }

    /// All rules, in insertion order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Rules applicable to `mode`, in insertion order.
    pub fn rules_for_mode(&self, mode: NetworkMode) -> Vec<&Rule> {
        self.rules.iter().filter(|r| r.applies_to(mode)).collect()
    }

    /// Finds a rule by id.
    pub fn rule_by_id(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id() == id)
    }

    /// The proposition asserting the opposite of `consequent`, if known.
    pub fn opposite_of(&self, consequent: &str) -> Option<&str> {
        self.polarity_pairs.get(consequent).map(String::as_str)
    }

    /// Iterates `(consequent, opposite)` pairs.
    pub fn polarity_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.polarity_pairs
            .iter()
            .map(|(a, b)| (a.as_str(), b.as_str()))
    }

    /// Pairs that constrain a search in `mode`.
    ///
    /// A pair keyed by a rule consequent is kept only if one of the rules
    /// concluding it applies to `mode`. Explicit pairs over propositions that
    /// no rule concludes are kept in every mode.
    pub fn polarity_pairs_for_mode(
        &self,
        mode: NetworkMode,
    ) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.polarity_pairs().filter(move |&(name, _)| {
            let mut concluding = self
                .rules
                .iter()
                .filter(|r| r.consequent() == name)
                .peekable();
            concluding.peek().is_none() || concluding.any(|r| r.applies_to(mode))
        })
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rule counts per mode.
    pub fn summary(&self) -> KnowledgeBaseSummary {
        KnowledgeBaseSummary {
            total: self.rules.len(),
            today: self.rules_for_mode(NetworkMode::Today).len(),
            future: self.rules_for_mode(NetworkMode::Future).len(),
            mode_independent: self.rules.iter().filter(|r| r.mode().is_none()).count(),
        }
    }
}

/// Rule counts of a [`KnowledgeBase`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeBaseSummary {
    /// All rules.
    pub total: usize,
    /// Rules applicable in today mode.
    pub today: usize,
    /// Rules applicable in future mode.
    pub future: usize,
    /// Rules without a mode restriction.
    pub mode_independent: usize,
}

fn derive_opposite(consequent: &str) -> Option<String> {
    POLARITY_CONVENTIONS
        .iter()
        .find(|&&(marker, _)| consequent.contains(marker))
        .map(|&(marker, opposite)| consequent.replace(marker, opposite))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(id: &str, antecedent: &[&str], consequent: &str, mode: Option<NetworkMode>) -> Rule {
        Rule::new(
            id,
            format!("rule {}", id),
            antecedent.iter().map(|s| s.to_string()).collect(),
            consequent,
            mode,
        )
        .unwrap()
    }

    fn sample() -> KnowledgeBase {
        KnowledgeBase::new(vec![
            rule("R1", &["A"], "B", None),
            rule("R2", &["Integration_Work_Expo"], "Station_Closed_Expo", None),
            rule(
                "R3",
                &["Network_Mode_Future"],
                "Line_Inactive_EWL_Airport",
                Some(NetworkMode::Future),
            ),
            rule(
                "R10",
                &["Integration_Work_Active"],
                "Service_Adjustments_Required",
                Some(NetworkMode::Today),
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_rules_for_mode_partitions() {
        let kb = sample();

        let today: Vec<_> = kb
            .rules_for_mode(NetworkMode::Today)
            .iter()
            .map(|r| r.id())
            .collect();
        let future: Vec<_> = kb
            .rules_for_mode(NetworkMode::Future)
            .iter()
            .map(|r| r.id())
            .collect();

        assert_eq!(today, vec!["R1", "R2", "R10"]);
        assert_eq!(future, vec!["R1", "R2", "R3"]);
    }

    #[test]
    fn test_rule_by_id() {
        let kb = sample();
        assert_eq!(
            kb.rule_by_id("R3").unwrap().consequent(),
            "Line_Inactive_EWL_Airport"
        );
        assert!(kb.rule_by_id("R99").is_none());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let result = KnowledgeBase::new(vec![
            rule("R1", &["A"], "B", None),
            rule("R1", &["C"], "D", None),
        ]);
        assert_eq!(result.unwrap_err(), Error::DuplicateRule("R1".to_string()));
    }

    #[test]
    fn test_polarity_pairs_follow_naming_convention() {
        let kb = sample();
        assert_eq!(kb.opposite_of("Station_Closed_Expo"), Some("Station_Open_Expo"));
        assert_eq!(
            kb.opposite_of("Line_Inactive_EWL_Airport"),
            Some("Line_Active_EWL_Airport")
        );
        assert_eq!(kb.opposite_of("B"), None);
    }

    #[test]
    fn test_closed_convention_takes_precedence() {
        assert_eq!(
            derive_opposite("Line_Inactive_Closed").as_deref(),
            Some("Line_Inactive_Open")
        );
    }

    #[test]
    fn test_explicit_pairs_override() {
        let kb = KnowledgeBase::with_polarity_pairs(
            vec![rule(
                "R6",
                &["Station_Closed_Expo"],
                "Transfer_Unavailable_Expo",
                None,
            )],
            vec![(
                "Transfer_Unavailable_Expo".to_string(),
                "Transfer_Available_Expo".to_string(),
            )],
        )
        .unwrap();
        assert_eq!(
            kb.opposite_of("Transfer_Unavailable_Expo"),
            Some("Transfer_Available_Expo")
        );
    }

    #[test]
    fn test_summary() {
        let summary = sample().summary();
        assert_eq!(summary.total, 4);
        assert_eq!(summary.today, 3);
        assert_eq!(summary.future, 3);
        assert_eq!(summary.mode_independent, 2);
    }

    #[test]
    fn test_json_table_round_trip_keeps_explicit_pairs() {
        let kb = KnowledgeBase::with_polarity_pairs(
            vec![rule("R2", &["Integration_Work_Expo"], "Station_Closed_Expo", None)],
            vec![("Crowding_Risk_High".to_string(), "Crowding_Risk_Low".to_string())],
        )
        .unwrap();

        let json = kb.to_json().unwrap();
        let restored = KnowledgeBase::from_json(&json).unwrap();

        assert_eq!(restored.rules(), kb.rules());
        assert_eq!(restored.opposite_of("Crowding_Risk_High"), Some("Crowding_Risk_Low"));
        assert_eq!(restored.opposite_of("Station_Closed_Expo"), Some("Station_Open_Expo"));
        assert!(!json.contains("Station_Open_Expo"));
    }

    #[test]
    fn test_json_table_round_trip_keeps_conventional_explicit_pairs() {
        // The pair follows the Closed/Open convention but no rule concludes
        // `Station_Closed_Bugis`, so it cannot be re-derived on load.
        let kb = KnowledgeBase::with_polarity_pairs(
            vec![rule("R1", &["A"], "B", None)],
            vec![(
                "Station_Closed_Bugis".to_string(),
                "Station_Open_Bugis".to_string(),
            )],
        )
        .unwrap();

        let restored = KnowledgeBase::from_json(&kb.to_json().unwrap()).unwrap();
        assert_eq!(
            restored.opposite_of("Station_Closed_Bugis"),
            Some("Station_Open_Bugis")
        );
        assert_eq!(restored.to_json().unwrap(), kb.to_json().unwrap());
    }

    #[test]
    fn test_polarity_pairs_for_mode() {
        let kb = KnowledgeBase::with_polarity_pairs(
            vec![
                rule("R2", &["Integration_Work_Expo"], "Station_Closed_Expo", None),
                rule(
                    "R3",
                    &["Network_Mode_Future"],
                    "Line_Inactive_EWL_Airport",
                    Some(NetworkMode::Future),
                ),
            ],
            vec![("Crowding_Risk_High".to_string(), "Crowding_Risk_Low".to_string())],
        )
        .unwrap();

        let today: Vec<_> = kb.polarity_pairs_for_mode(NetworkMode::Today).collect();
        assert_eq!(
            today,
            vec![
                ("Station_Closed_Expo", "Station_Open_Expo"),
                ("Crowding_Risk_High", "Crowding_Risk_Low"),
            ]
        );
        assert_eq!(kb.polarity_pairs_for_mode(NetworkMode::Future).count(), 3);
    }

    #[test]
    fn test_invalid_table_fails_fast() {
        let json = r#"{"rules": [{"id": "R1", "antecedent": ["A"], "consequent": ""}]}"#;
        assert!(KnowledgeBase::from_json(json).is_err());
    }
}
