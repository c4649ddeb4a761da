//! Refutation proofs and their verification
//!
//! Every clause in a saturation run carries a [`ClauseOrigin`]. When the empty
//! clause is reached, the engine walks those origins back from the witnessing
//! pair to produce a [`Contradiction`] (the pair plus the input clauses it
//! rests on) and a [`RefutationProof`], an ordered list of resolution steps
//! that [`ProofVerifier`] can re-check without re-running the search.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::clause::{Clause, Literal};
use crate::engine::resolve_all;
use crate::error::{Error, Result};
use crate::knowledge_base::KnowledgeBase;

/// How a saturation search ended.
///
/// `Saturated` and `IterationLimit` both map to "unprovable" / "consistent" in
/// the boolean results; this value tells them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchOutcome {
    /// The empty clause was derived.
    Contradiction,
    /// A full pass produced no new clause.
    Saturated,
    /// The iteration cap was reached first.
    IterationLimit,
}

impl SearchOutcome {
    /// Returns `true` unless the search was cut off by its iteration cap.
    pub fn is_definite(&self) -> bool {
        !matches!(self, SearchOutcome::IterationLimit)
    }
}

/// Where a clause in the working set came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClauseOrigin {
    /// CNF form of a knowledge-base rule.
    Rule {
        /// Id of the rule.
        rule_id: String,
    },
    /// `¬a ∨ ¬b` for a polarity pair, loaded when exclusive pairs are enabled.
    PolarityPair {
        /// Consequent side of the pair.
        proposition: String,
        /// Opposite side of the pair.
        opposite: String,
    },
    /// Unit clause injected from the fact map.
    Fact,
    /// Negation of the query being proved.
    NegatedQuery,
    /// Resolvent of the clauses at two earlier positions of the working set.
    Resolvent {
        /// Position of the first parent.
        left: usize,
        /// Position of the second parent.
        right: usize,
    },
}

impl ClauseOrigin {
    /// Returns `true` for every origin except [`ClauseOrigin::Resolvent`].
    pub fn is_input(&self) -> bool {
        !matches!(self, ClauseOrigin::Resolvent { .. })
    }

    /// The rule id, for rule clauses.
    pub fn rule_id(&self) -> Option<&str> {
        match self {
            ClauseOrigin::Rule { rule_id } => Some(rule_id.as_str()),
            _ => None,
        }
    }
}

/// An input clause that a derivation rests on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportingClause {
    /// The clause.
    pub clause: Clause,
    /// Its input origin.
    pub origin: ClauseOrigin,
}

/// A witnessed contradiction: two clauses whose resolvent is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contradiction {
    /// First clause of the witnessing pair.
    pub left: Clause,
    /// Second clause of the witnessing pair.
    pub right: Clause,
    /// Saturation pass in which the pair was resolved (1-based).
    pub iteration: usize,
    /// Input clauses supporting the pair, in working-set order.
    pub support: Vec<SupportingClause>,
}

impl Contradiction {
    pub(crate) fn from_derivation(
        working: &IndexMap<Clause, ClauseOrigin>,
        iteration: usize,
        left: usize,
        right: usize,
    ) -> Self {
        let clause_at = |index: usize| {
            working
                .get_index(index)
                .map(|(clause, _)| clause.clone())
                .unwrap_or_default()
        };
        let support = ancestors(working, &[left, right])
            .into_iter()
            .filter_map(|index| working.get_index(index))
            .filter(|(_, origin)| origin.is_input())
            .map(|(clause, origin)| SupportingClause {
                clause: clause.clone(),
                origin: origin.clone(),
            })
            .collect();

        Self {
            left: clause_at(left),
            right: clause_at(right),
            iteration,
            support,
        }
    }

    /// Ids of the rules among the supporting clauses, in working-set order.
    pub fn rule_ids(&self) -> Vec<&str> {
        self.support
            .iter()
            .filter_map(|s| s.origin.rule_id())
            .collect()
    }

    /// Returns `true` if `clause` is one of the supporting input clauses.
    pub fn is_supported_by(&self, clause: &Clause) -> bool {
        self.support.iter().any(|s| &s.clause == clause)
    }
}

/// What a [`RefutationProof`] establishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProofConclusion {
    /// The query follows from the clause set.
    Query {
        /// The proved literal.
        query: Literal,
    },
    /// The clause set is unsatisfiable.
    Inconsistent,
}

/// The role of a step within a refutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepType {
    /// A clause from the loaded clause set.
    Input(ClauseOrigin),
    /// A resolvent of two earlier steps.
    Resolution,
    /// The final resolution producing the empty clause.
    Contradiction,
}

/// A single clause in a refutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofStep {
    /// 1-based position in the proof.
    pub step_num: usize,
    /// The clause established at this step.
    pub clause: Clause,
    /// How the clause was obtained.
    pub step_type: StepType,
    /// Step numbers of the two parents, for resolution steps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parents: Option<(usize, usize)>,
}

/// A resolution refutation ending in the empty clause.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefutationProof {
    /// Unique identifier.
    pub id: String,
    /// What the refutation shows.
    pub conclusion: ProofConclusion,
    /// Steps in dependency order; the last one is the empty clause.
    pub steps: Vec<ProofStep>,
    /// When the proof was produced.
    pub timestamp: DateTime<Utc>,
    /// Hash over the conclusion, steps and timestamp.
    pub hash: String,
}

impl RefutationProof {
    /// Extracts the refutation of the pair at positions `left` and `right`
    /// from a saturation working set.
    ///
    /// Only the ancestors of the pair are kept. Working-set positions grow
    /// monotonically, so sorting them yields a dependency order.
    pub(crate) fn from_derivation(
        conclusion: ProofConclusion,
        working: &IndexMap<Clause, ClauseOrigin>,
        left: usize,
        right: usize,
    ) -> Self {
        let ancestors = ancestors(working, &[left, right]);

        let mut steps = Vec::with_capacity(ancestors.len() + 1);
        let mut step_of: HashMap<usize, usize> = HashMap::with_capacity(ancestors.len());
        for &index in &ancestors {
            let Some((clause, origin)) = working.get_index(index) else {
                continue;
            };
            let step_num = steps.len() + 1;
            let (step_type, parents) = match origin {
                ClauseOrigin::Resolvent { left, right } => (
                    StepType::Resolution,
                    step_of.get(left).copied().zip(step_of.get(right).copied()),
                ),
                input => (StepType::Input(input.clone()), None),
            };
            step_of.insert(index, step_num);
            steps.push(ProofStep {
                step_num,
                clause: clause.clone(),
                step_type,
                parents,
            });
        }

        steps.push(ProofStep {
            step_num: steps.len() + 1,
            clause: Clause::empty(),
            step_type: StepType::Contradiction,
            parents: step_of.get(&left).copied().zip(step_of.get(&right).copied()),
        });

        let timestamp = Utc::now();
        let mut proof = Self {
            id: generate_proof_id(&timestamp),
            conclusion,
            steps,
            timestamp,
            hash: String::new(),
        };
        proof.hash = proof.compute_hash();
        proof
    }

    fn compute_hash(&self) -> String {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        format!("{:?}", self.conclusion).hash(&mut hasher);
        for step in &self.steps {
            format!("{:?}", step).hash(&mut hasher);
        }
        self.timestamp.to_rfc3339().hash(&mut hasher);

        format!("{:016x}", hasher.finish())
    }

    /// Number of steps, including the final empty clause.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns `true` if the proof has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Ids of the rules used as inputs, sorted and deduplicated.
    pub fn rules_used(&self) -> Vec<&str> {
        let mut rules: Vec<&str> = self
            .steps
            .iter()
            .filter_map(|s| match &s.step_type {
                StepType::Input(origin) => origin.rule_id(),
                _ => None,
            })
            .collect();
        rules.sort_unstable();
        rules.dedup();
        rules
    }

    /// Input clauses the refutation starts from.
    pub fn inputs(&self) -> impl Iterator<Item = &ProofStep> {
        self.steps
            .iter()
            .filter(|s| matches!(s.step_type, StepType::Input(_)))
    }

    /// Serializes the proof to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(Error::from)
    }

    /// Parses a proof from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(Error::from)
    }
}

/// Positions of every clause the given roots were derived from, roots included,
/// in ascending order.
pub(crate) fn ancestors(
    working: &IndexMap<Clause, ClauseOrigin>,
    roots: &[usize],
) -> BTreeSet<usize> {
    let mut seen = BTreeSet::new();
    let mut stack: Vec<usize> = roots.to_vec();
    while let Some(index) = stack.pop() {
        if !seen.insert(index) {
            continue;
        }
        if let Some((_, ClauseOrigin::Resolvent { left, right })) = working.get_index(index) {
            stack.push(*left);
            stack.push(*right);
        }
    }
    seen
}

fn generate_proof_id(timestamp: &DateTime<Utc>) -> String {
    format!(
        "refutation_{:016x}",
        timestamp.timestamp_nanos_opt().unwrap_or_default()
    )
}

/// Options controlling [`ProofVerifier`].
#[derive(Debug, Clone)]
pub struct VerifyOptions {
    /// Recompute and compare the content hash.
    pub check_hash: bool,
    /// Require rule inputs to match the CNF form of the named rule.
    pub check_rules: bool,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self {
            check_hash: true,
            check_rules: true,
        }
    }
}

/// Outcome of verifying a [`RefutationProof`].
#[derive(Debug, Clone, Default)]
pub struct VerifyResult {
    /// `true` when no errors were found.
    pub is_valid: bool,
    /// Structural or logical errors.
    pub errors: Vec<String>,
    /// Findings that do not invalidate the proof.
    pub warnings: Vec<String>,
}

impl VerifyResult {
    fn new() -> Self {
        Self {
            is_valid: true,
            ..Default::default()
        }
    }

    fn error(&mut self, message: String) {
        self.is_valid = false;
        self.errors.push(message);
    }
}

/// Re-checks refutation proofs step by step.
#[derive(Debug, Default)]
pub struct ProofVerifier<'a> {
    options: VerifyOptions,
    knowledge_base: Option<&'a KnowledgeBase>,
}

impl<'a> ProofVerifier<'a> {
    /// A verifier with default options and no knowledge base.
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses the given options.
    pub fn with_options(mut self, options: VerifyOptions) -> Self {
        self.options = options;
        self
    }

    /// Checks rule inputs against `kb` when [`VerifyOptions::check_rules`] is set.
    pub fn with_knowledge_base(mut self, kb: &'a KnowledgeBase) -> Self {
        self.knowledge_base = Some(kb);
        self
    }

    /// Verifies every step of `proof`.
    pub fn verify(&self, proof: &RefutationProof) -> VerifyResult {
        let mut result = VerifyResult::new();

        if proof.steps.is_empty() {
            result.error("proof has no steps".to_string());
            return result;
        }

        if self.options.check_hash {
            if proof.hash.is_empty() {
                result.warnings.push("proof has no hash".to_string());
            } else if proof.hash != proof.compute_hash() {
                result.error("hash mismatch: proof content was modified".to_string());
            }
        }

        for (i, step) in proof.steps.iter().enumerate() {
            if step.step_num != i + 1 {
                result.error(format!(
                    "step {} is numbered {}",
                    i + 1,
                    step.step_num
                ));
                continue;
            }
            match &step.step_type {
                StepType::Input(origin) => self.verify_input(step, origin, &mut result),
                StepType::Resolution | StepType::Contradiction => {
                    verify_resolution(proof, step, &mut result)
                }
            }
        }

        if let Some(last) = proof.steps.last() {
            if !last.clause.is_empty() || last.step_type != StepType::Contradiction {
                result.error("proof does not end in the empty clause".to_string());
            }
        }
        for step in &proof.steps[..proof.steps.len() - 1] {
            if step.step_type == StepType::Contradiction {
                result.error(format!(
                    "step {}: contradiction before the final step",
                    step.step_num
                ));
            }
        }

        if let ProofConclusion::Query { query } = &proof.conclusion {
            let negated = Clause::unit(query.negate());
            let has_assumption = proof.inputs().any(|s| {
                s.step_type == StepType::Input(ClauseOrigin::NegatedQuery) && s.clause == negated
            });
            if !has_assumption {
                result
                    .warnings
                    .push(format!("refutation of {} does not use {}", query, negated));
            }
        }

        result
    }

    /// Like [`verify`](Self::verify), turning any error into [`Error::InvalidProof`].
    pub fn check(&self, proof: &RefutationProof) -> Result<()> {
        let result = self.verify(proof);
        if result.is_valid {
            Ok(())
        } else {
            Err(Error::InvalidProof(result.errors.join("; ")))
        }
    }

    fn verify_input(&self, step: &ProofStep, origin: &ClauseOrigin, result: &mut VerifyResult) {
        if step.parents.is_some() {
            result.error(format!("step {}: input step has parents", step.step_num));
        }
        match origin {
            ClauseOrigin::Resolvent { .. } => {
                result.error(format!(
                    "step {}: resolvent recorded as input",
                    step.step_num
                ));
            }
            ClauseOrigin::Fact | ClauseOrigin::NegatedQuery if !step.clause.is_unit() => {
                result.error(format!(
                    "step {}: fact clause {} is not a unit clause",
                    step.step_num, step.clause
                ));
            }
            ClauseOrigin::PolarityPair {
                proposition,
                opposite,
            } => {
                let expected = Clause::new([
                    Literal::negative(proposition.as_str()),
                    Literal::negative(opposite.as_str()),
                ]);
                if step.clause != expected {
                    result.error(format!(
                        "step {}: {} is not the exclusion clause {}",
                        step.step_num, step.clause, expected
                    ));
                }
            }
            ClauseOrigin::Rule { rule_id } if self.options.check_rules => {
                if let Some(kb) = self.knowledge_base {
                    match kb.rule_by_id(rule_id) {
                        Some(rule) if rule.to_cnf() == step.clause => {}
                        Some(_) => result.error(format!(
                            "step {}: {} is not the CNF of rule {}",
                            step.step_num, step.clause, rule_id
                        )),
                        None => result.error(format!(
                            "step {}: unknown rule {}",
                            step.step_num, rule_id
                        )),
                    }
                }
            }
            _ => {}
        }
    }
}

fn verify_resolution(proof: &RefutationProof, step: &ProofStep, result: &mut VerifyResult) {
    let Some((left, right)) = step.parents else {
        result.error(format!("step {}: resolution without parents", step.step_num));
        return;
    };
    if left >= step.step_num || right >= step.step_num || left == 0 || right == 0 {
        result.error(format!(
            "step {}: parents ({}, {}) do not precede it",
            step.step_num, left, right
        ));
        return;
    }

    let left_clause = &proof.steps[left - 1].clause;
    let right_clause = &proof.steps[right - 1].clause;
    if !resolve_all(left_clause, right_clause).contains(&step.clause) {
        result.error(format!(
            "step {}: {} does not follow from {} and {}",
            step.step_num, step.clause, left_clause, right_clause
        ));
    }
}
