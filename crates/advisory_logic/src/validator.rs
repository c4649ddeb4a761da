//! Validation records and violation attribution
//!
//! Once a fact set is found inconsistent, each applicable rule is checked
//! directly against the facts under a closed-world reading of the antecedent.
//! A rule is violated when its antecedent holds and either:
//! - its consequent is asserted false, or
//! - its consequent is not mentioned but the opposite proposition from the
//!   knowledge base's polarity-pair table is asserted true.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::knowledge_base::KnowledgeBase;
use crate::proof::{Contradiction, SearchOutcome};
use crate::rule::{NetworkMode, Rule};

/// Why a rule was flagged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViolationKind {
    /// The consequent is asserted false.
    ConsequentFalse,
    /// The consequent is absent and its opposite is asserted true.
    OppositeAsserted {
        /// The opposite proposition found in the facts.
        opposite: String,
    },
}

/// A rule whose antecedent holds while its conclusion is contradicted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Id of the violated rule.
    pub rule_id: String,
    /// Description of the violated rule.
    pub description: String,
    /// How the conclusion is contradicted.
    pub kind: ViolationKind,
}

impl Violation {
    fn new(rule: &Rule, kind: ViolationKind) -> Self {
        Self {
            rule_id: rule.id().to_string(),
            description: rule.description().to_string(),
            kind,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.rule_id, self.description)
    }
}

/// Finds the rules applicable to `mode` that `facts` violate, in rule order.
///
/// Antecedent names missing from `facts` count as false. The consequent is
/// only checked as written, then through [`KnowledgeBase::opposite_of`] when
/// it is missing.
pub fn identify_violations(
    kb: &KnowledgeBase,
    facts: &IndexMap<String, bool>,
    mode: NetworkMode,
) -> Vec<Violation> {
    let mut violations = Vec::new();

    for rule in kb.rules_for_mode(mode) {
        let antecedent_holds = rule
            .antecedent()
            .iter()
            .all(|name| facts.get(name).copied().unwrap_or(false));
        if !antecedent_holds {
            continue;
        }

        match facts.get(rule.consequent()).copied() {
            Some(false) => violations.push(Violation::new(rule, ViolationKind::ConsequentFalse)),
            Some(true) => {}
            None => {
                if let Some(opposite) = kb.opposite_of(rule.consequent()) {
                    if facts.get(opposite).copied().unwrap_or(false) {
                        violations.push(Violation::new(
                            rule,
                            ViolationKind::OppositeAsserted {
                                opposite: opposite.to_string(),
                            },
                        ));
                    }
                }
            }
        }
    }

    violations
}

/// The outcome of one `validate` call.
///
/// Serializes to `{mode, facts, is_consistent, consistency_message,
/// violated_rules, search_outcome, contradiction?}`; `mode` is the lower-case
/// mode name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRecord {
    /// Mode the rules were filtered by.
    pub mode: NetworkMode,
    /// The facts as supplied.
    pub facts: IndexMap<String, bool>,
    /// `false` only when a contradiction was witnessed.
    pub is_consistent: bool,
    /// Human-readable verdict from the consistency check.
    pub consistency_message: String,
    /// Violated rules, each formatted `"<rule_id>: <description>"`.
    pub violated_rules: Vec<String>,
    /// How the consistency search ended.
    pub search_outcome: SearchOutcome,
    /// The witnessing pair, when inconsistent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contradiction: Option<Contradiction>,
}

impl ValidationRecord {
    /// Ids of the violated rules.
    pub fn violated_rule_ids(&self) -> Vec<&str> {
        self.violated_rules
            .iter()
            .map(|entry| entry.split_once(':').map_or(entry.as_str(), |(id, _)| id))
            .collect()
    }

    /// Returns `true` if the verdict did not depend on an iteration cap.
    pub fn is_definite(&self) -> bool {
        self.search_outcome.is_definite()
    }

    /// Serializes the record to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(Error::from)
    }
}
