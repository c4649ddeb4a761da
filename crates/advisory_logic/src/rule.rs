//! Rule definitions for the advisory engine
//!
//! A rule is a single implication `(A₁ ∧ … ∧ Aₙ) → C` over proposition names,
//! optionally restricted to one network mode. Rules are validated when they
//! are built and never mutated afterwards.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::clause::{Clause, Literal};
use crate::error::{Error, Result};

/// Network operation mode.
///
/// `Today` is the current topology (the EWL airport branch Tanah Merah → Expo →
/// Changi Airport); `Future` is the topology after the TEL and CRL extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkMode {
    /// Current network topology.
    #[serde(alias = "current")]
    Today,
    /// Network topology after the TEL/CRL extensions open.
    Future,
}

impl NetworkMode {
    /// All modes, in declaration order.
    pub const ALL: [NetworkMode; 2] = [NetworkMode::Today, NetworkMode::Future];

    /// The lower-case wire value, as carried in validation records.
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkMode::Today => "today",
            NetworkMode::Future => "future",
        }
    }
}

impl fmt::Display for NetworkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_uppercase())
    }
}

impl FromStr for NetworkMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "today" | "current" => Ok(NetworkMode::Today),
            "future" => Ok(NetworkMode::Future),
            other => Err(Error::UnknownMode(other.to_string())),
        }
    }
}

/// Service status of a line or station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    /// Regular scheduled service.
    Normal,
    /// Reduced frequency or capacity, e.g. during integration works.
    Reduced,
    /// Suspension or major disruption.
    Disrupted,
}

impl ServiceStatus {
    /// The proposition asserting this status for `line`, e.g.
    /// `Service_Status_Reduced_TEL`.
    pub fn proposition(&self, line: &str) -> String {
        format!("Service_Status_{}_{}", self, line)
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ServiceStatus::Normal => "Normal",
            ServiceStatus::Reduced => "Reduced",
            ServiceStatus::Disrupted => "Disrupted",
        };
        f.write_str(label)
    }
}

/// An operational rule in implication form.
///
/// The antecedent names are implicitly ANDed and asserted true; the consequent
/// is asserted true whenever they all hold. Construct through [`Rule::new`] or
/// [`Rule::builder`]; both reject empty ids, antecedents and consequents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RuleRecord", into = "RuleRecord")]
pub struct Rule {
    id: String,
    description: String,
    antecedent: Vec<String>,
    consequent: String,
    mode: Option<NetworkMode>,
}

impl Rule {
    /// Creates a validated rule.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRule`] if the id is empty, the antecedent list is
    /// empty or contains an empty name, or the consequent is empty.
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        antecedent: Vec<String>,
        consequent: impl Into<String>,
        mode: Option<NetworkMode>,
    ) -> Result<Self> {
        let rule = Self {
            id: id.into(),
            description: description.into(),
            antecedent,
            consequent: consequent.into(),
            mode,
        };
        rule.check()?;
        Ok(rule)
    }

    /// Starts a fluent builder for a rule with the given id.
    pub fn builder(id: impl Into<String>) -> RuleBuilder {
        RuleBuilder::new(id)
    }

    fn check(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::InvalidRule("rule_id cannot be empty".to_string()));
        }
        if self.antecedent.is_empty() {
            return Err(Error::InvalidRule(format!(
                "{}: antecedent cannot be empty",
                self.id
            )));
        }
        if self.antecedent.iter().any(|name| name.trim().is_empty()) {
            return Err(Error::InvalidRule(format!(
                "{}: antecedent names cannot be empty",
                self.id
            )));
        }
        if self.consequent.trim().is_empty() {
            return Err(Error::InvalidRule(format!(
                "{}: consequent cannot be empty",
                self.id
            )));
        }
        Ok(())
    }

    /// Unique identifier, e.g. `R2`.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Plain-language statement of the rule.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Antecedent proposition names, in declaration order.
    pub fn antecedent(&self) -> &[String] {
        &self.antecedent
    }

    /// Consequent proposition name.
    pub fn consequent(&self) -> &str {
        &self.consequent
    }

    /// Mode restriction, `None` when the rule applies to every mode.
    pub fn mode(&self) -> Option<NetworkMode> {
        self.mode
    }

    /// Converts the rule into its single CNF clause `¬A₁ ∨ … ∨ ¬Aₙ ∨ C`.
    pub fn to_cnf(&self) -> Clause {
        self.antecedent
            .iter()
            .map(Literal::negative)
            .chain(std::iter::once(Literal::positive(self.consequent.as_str())))
            .collect()
    }

    /// Returns `true` if the rule is unrestricted or restricted to `mode`.
    pub fn applies_to(&self, mode: NetworkMode) -> bool {
        self.mode.map_or(true, |m| m == mode)
    }

    /// All distinct proposition names the rule mentions.
    pub fn propositions(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .antecedent
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.consequent.as_str()))
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    /// Logical notation, e.g. `R3: (Network_Mode_Future) → Line_Inactive_EWL_Airport [future]`.
    pub fn formal(&self) -> String {
        let mode = self
            .mode
            .map(|m| format!(" [{}]", m.as_str()))
            .unwrap_or_default();
        format!(
            "{}: ({}) → {}{}",
            self.id,
            self.antecedent.join(" ∧ "),
            self.consequent,
            mode
        )
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.id, self.description)
    }
}

/// The serialized shape of a rule, as found in rule tables.
///
/// Converting a record into a [`Rule`] runs the same validation as [`Rule::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleRecord {
    /// Unique identifier.
    pub id: String,
    /// Plain-language statement.
    #[serde(default)]
    pub description: String,
    /// Antecedent proposition names.
    pub antecedent: Vec<String>,
    /// Consequent proposition name.
    pub consequent: String,
    /// Optional mode restriction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<NetworkMode>,
}

impl TryFrom<RuleRecord> for Rule {
    type Error = Error;

    fn try_from(record: RuleRecord) -> Result<Self> {
        Rule::new(
            record.id,
            record.description,
            record.antecedent,
            record.consequent,
            record.mode,
        )
    }
}

impl From<Rule> for RuleRecord {
    fn from(rule: Rule) -> Self {
        Self {
            id: rule.id,
            description: rule.description,
            antecedent: rule.antecedent,
            consequent: rule.consequent,
            mode: rule.mode,
        }
    }
}

/// A builder for creating `Rule`s using a fluent API.
#[derive(Debug, Clone)]
pub struct RuleBuilder {
    record: RuleRecord,
}

impl RuleBuilder {
    /// Creates a new `RuleBuilder` with a given ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            record: RuleRecord {
                id: id.into(),
                description: String::new(),
                antecedent: Vec::new(),
                consequent: String::new(),
                mode: None,
            },
        }
    }

    /// Sets the description for the rule being built.
    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.record.description = desc.into();
        self
    }

    /// Adds an antecedent proposition.
    pub fn when(mut self, proposition: impl Into<String>) -> Self {
        self.record.antecedent.push(proposition.into());
        self
    }

    /// Adds several antecedent propositions.
    pub fn when_all<I, S>(mut self, propositions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.record
            .antecedent
            .extend(propositions.into_iter().map(Into::into));
        self
    }

    /// Sets the consequent proposition.
    pub fn then(mut self, proposition: impl Into<String>) -> Self {
        self.record.consequent = proposition.into();
        self
    }

    /// Restricts the rule to one network mode.
    pub fn mode(mut self, mode: NetworkMode) -> Self {
        self.record.mode = Some(mode);
        self
    }

    /// Validates and returns the final `Rule`.
    pub fn build(self) -> Result<Rule> {
        Rule::try_from(self.record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transfer_rule() -> Rule {
        Rule::builder("R1")
            .description("If Tanah Merah is open AND TEL is active, TEL-EWL transfer is available")
            .when("Station_Open_TanahMerah")
            .when("Line_Active_TEL")
            .then("Transfer_Available_TEL_EWL")
            .build()
            .unwrap()
    }

    #[test]
    fn test_to_cnf_negates_antecedents() {
        let rule = Rule::builder("R")
            .when_all(["A", "B"])
            .then("C")
            .build()
            .unwrap();

        let expected = Clause::new([
            Literal::negative("A"),
            Literal::negative("B"),
            Literal::positive("C"),
        ]);
        assert_eq!(rule.to_cnf(), expected);
    }

    #[test]
    fn test_rule_validation_rejects_empty_parts() {
        assert!(matches!(
            Rule::builder("").when("A").then("B").build(),
            Err(Error::InvalidRule(_))
        ));
        assert!(matches!(
            Rule::builder("R").then("B").build(),
            Err(Error::InvalidRule(_))
        ));
        assert!(matches!(
            Rule::builder("R").when("A").build(),
            Err(Error::InvalidRule(_))
        ));
        assert!(matches!(
            Rule::builder("R").when("").then("B").build(),
            Err(Error::InvalidRule(_))
        ));
    }

    #[test]
    fn test_applies_to() {
        let unrestricted = transfer_rule();
        assert!(unrestricted.applies_to(NetworkMode::Today));
        assert!(unrestricted.applies_to(NetworkMode::Future));

        let future_only = Rule::builder("R3")
            .when("Network_Mode_Future")
            .then("Line_Inactive_EWL_Airport")
            .mode(NetworkMode::Future)
            .build()
            .unwrap();
        assert!(!future_only.applies_to(NetworkMode::Today));
        assert!(future_only.applies_to(NetworkMode::Future));
    }

    #[test]
    fn test_formal_and_display() {
        let rule = Rule::builder("R3")
            .description("In Future Mode, the old EWL airport branch is NOT active")
            .when("Network_Mode_Future")
            .then("Line_Inactive_EWL_Airport")
            .mode(NetworkMode::Future)
            .build()
            .unwrap();

        assert_eq!(
            rule.formal(),
            "R3: (Network_Mode_Future) → Line_Inactive_EWL_Airport [future]"
        );
        assert_eq!(
            rule.to_string(),
            "R3: In Future Mode, the old EWL airport branch is NOT active"
        );
    }

    #[test]
    fn test_propositions_are_distinct() {
        let rule = Rule::builder("R")
            .when_all(["B", "A", "B"])
            .then("A")
            .build()
            .unwrap();
        assert_eq!(rule.propositions(), vec!["A", "B"]);
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("today".parse::<NetworkMode>().unwrap(), NetworkMode::Today);
        assert_eq!("current".parse::<NetworkMode>().unwrap(), NetworkMode::Today);
        assert_eq!(" FUTURE ".parse::<NetworkMode>().unwrap(), NetworkMode::Future);
        assert!(matches!(
            "yesterday".parse::<NetworkMode>(),
            Err(Error::UnknownMode(_))
        ));
        assert_eq!(NetworkMode::Future.to_string(), "FUTURE");
    }

    #[test]
    fn test_rule_deserialization_validates() {
        let json = r#"{"id": "R9", "antecedent": [], "consequent": "X"}"#;
        assert!(serde_json::from_str::<Rule>(json).is_err());

        let json = r#"{"id": "R3", "description": "d", "antecedent": ["Network_Mode_Future"],
                       "consequent": "Line_Inactive_EWL_Airport", "mode": "future"}"#;
        let rule: Rule = serde_json::from_str(json).unwrap();
        assert_eq!(rule.mode(), Some(NetworkMode::Future));
    }

    #[test]
    fn test_service_status_display() {
        assert_eq!(ServiceStatus::Disrupted.to_string(), "Disrupted");
        let json = serde_json::to_string(&ServiceStatus::Reduced).unwrap();
        assert_eq!(json, "\"reduced\"");
    }

    #[test]
    fn test_service_status_proposition() {
        assert_eq!(
            ServiceStatus::Disrupted.proposition("EWL"),
            "Service_Status_Disrupted_EWL"
        );
        assert_eq!(
            ServiceStatus::Normal.proposition("TEL"),
            "Service_Status_Normal_TEL"
        );
    }
}
