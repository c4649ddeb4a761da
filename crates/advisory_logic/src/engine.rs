//! Resolution engine
//!
//! Implements propositional resolution refutation over a working clause set:
//! rules for one network mode are loaded as CNF clauses, facts are layered on
//! as unit clauses, and the set is saturated pass by pass until the empty
//! clause appears, no new clause can be derived, or the iteration cap is hit.

use std::sync::Arc;

use indexmap::IndexMap;
use log::{debug, info, trace, warn};
use serde::{Deserialize, Serialize};

use crate::clause::{Clause, Literal};
use crate::config::{EngineConfig, ResolutionStrategy};
use crate::error::Result;
use crate::knowledge_base::KnowledgeBase;
use crate::proof::{
    ClauseOrigin, Contradiction, ProofConclusion, RefutationProof, SearchOutcome,
};
use crate::rule::NetworkMode;
use crate::validator::{identify_violations, ValidationRecord};

/// Resolves `left` against `right` on their first complementary pair.
///
/// Literals of `left` are scanned in set order and the first one whose
/// complement occurs in `right` is resolved upon. Returns `None` when the
/// clauses share no complementary pair.
///
/// ```
/// # use advisory_logic::{resolve, Clause, Literal};
/// let left = Clause::new([Literal::positive("A"), Literal::positive("B")]);
/// let right = Clause::new([Literal::negative("A"), Literal::positive("C")]);
///
/// let resolvent = resolve(&left, &right).unwrap();
/// assert_eq!(resolvent, Clause::new([Literal::positive("B"), Literal::positive("C")]));
/// ```
pub fn resolve(left: &Clause, right: &Clause) -> Option<Clause> {
    left.iter().find_map(|literal| {
        let complement = literal.negate();
        right
            .contains(&complement)
            .then(|| left.merge_without(right, literal, &complement))
    })
}

/// One resolvent per complementary pair of `left` and `right`, in the order
/// the pairs are found. Duplicate resolvents are collapsed.
pub fn resolve_all(left: &Clause, right: &Clause) -> Vec<Clause> {
    let mut resolvents = Vec::new();
    for literal in left.iter() {
        let complement = literal.negate();
        if right.contains(&complement) {
            let resolvent = left.merge_without(right, literal, &complement);
            if !resolvents.contains(&resolvent) {
                resolvents.push(resolvent);
            }
        }
    }
    resolvents
}

/// A stateful resolution-refutation engine over one [`KnowledgeBase`].
///
/// The working clause set is reset by every [`load_knowledge_base`] call, so
/// [`validate`] never carries state between calls. Operations take `&mut self`;
/// concurrent validations need one engine each (the knowledge base itself is
/// shared through an [`Arc`]).
///
/// [`load_knowledge_base`]: ResolutionEngine::load_knowledge_base
/// [`validate`]: ResolutionEngine::validate
///
/// # Examples
///
/// ```
/// # use advisory_logic::{BuiltinRules, NetworkMode, ResolutionEngine};
/// # use indexmap::IndexMap;
/// let mut engine = ResolutionEngine::new(BuiltinRules::transit().unwrap());
///
/// let facts = IndexMap::from([
///     ("Integration_Work_Expo".to_string(), true),
///     ("Station_Closed_Expo".to_string(), false),
/// ]);
/// let record = engine.validate(&facts, NetworkMode::Today);
///
/// assert!(!record.is_consistent);
/// assert!(record.violated_rules.iter().any(|r| r.starts_with("R2:")));
/// ```
#[derive(Debug, Clone)]
pub struct ResolutionEngine {
    kb: Arc<KnowledgeBase>,
    config: EngineConfig,
    clauses: IndexMap<Clause, ClauseOrigin>,
    violations: Vec<String>,
    stats: EngineStats,
}

impl ResolutionEngine {
    /// Creates an engine with the default configuration.
    pub fn new(kb: impl Into<Arc<KnowledgeBase>>) -> Self {
        Self {
            kb: kb.into(),
            config: EngineConfig::default(),
            clauses: IndexMap::new(),
            violations: Vec::new(),
            stats: EngineStats::default(),
        }
    }

    /// Creates an engine with a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`](crate::Error::InvalidConfig) if the
    /// configuration allows no saturation pass.
    pub fn with_config(kb: impl Into<Arc<KnowledgeBase>>, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new(kb)
        })
    }

    /// The knowledge base rules are loaded from.
    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.kb
    }

    /// The active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Clears the working set and loads the CNF clause of every rule
    /// applicable to `mode`.
    pub fn load_knowledge_base(&mut self, mode: NetworkMode) {
        self.clauses.clear();
        self.violations.clear();

        let rules = self.kb.rules_for_mode(mode);
        for rule in &rules {
            let clause = rule.to_cnf();
            if self.config.discard_tautologies && clause.is_tautology() {
                self.stats.tautologies_discarded += 1;
                debug!("Skipping tautological rule {}: {}", rule.id(), clause);
                continue;
            }
            self.clauses
                .entry(clause)
                .or_insert_with(|| ClauseOrigin::Rule {
                    rule_id: rule.id().to_string(),
                });
        }

        if self.config.exclusive_polarity_pairs {
            for (proposition, opposite) in self.kb.polarity_pairs_for_mode(mode) {
                let exclusion = Clause::new([
                    Literal::negative(proposition),
                    Literal::negative(opposite),
                ]);
                self.clauses
                    .entry(exclusion)
                    .or_insert_with(|| ClauseOrigin::PolarityPair {
                        proposition: proposition.to_string(),
                        opposite: opposite.to_string(),
                    });
            }
        }

        debug!(
            "Loaded {} clauses from {} rules ({} mode)",
            self.clauses.len(),
            rules.len(),
            mode
        );
    }

    /// Adds one unit clause per fact, in the map's order.
    pub fn add_facts(&mut self, facts: &IndexMap<String, bool>) {
        for (name, &value) in facts {
            self.clauses
                .entry(Clause::unit(Literal::new(name.as_str(), value)))
                .or_insert(ClauseOrigin::Fact);
        }
        debug!(
            "Added {} facts, working set has {} clauses",
            facts.len(),
            self.clauses.len()
        );
    }

    /// First-complementary-pair resolution; see [`resolve`].
    pub fn resolve(&self, left: &Clause, right: &Clause) -> Option<Clause> {
        resolve(left, right)
    }

    /// Resolvents of a pair under the configured [`ResolutionStrategy`].
    pub fn resolvents(&self, left: &Clause, right: &Clause) -> Vec<Clause> {
        match self.config.strategy {
            ResolutionStrategy::FirstPair => resolve(left, right).into_iter().collect(),
            ResolutionStrategy::AllPairs => resolve_all(left, right),
        }
    }

    /// Tries to prove `query` by refutation: adds `¬query` to a copy of the
    /// working set and saturates it.
    ///
    /// `provable` is `false` both when the set saturates and when the
    /// iteration cap is reached; [`ProofResult::outcome`] tells them apart.
    pub fn prove_by_contradiction(&mut self, query: &Literal) -> ProofResult {
        self.prove_by_contradiction_with_limit(query, self.config.prove_max_iterations)
    }

    /// Like [`prove_by_contradiction`](Self::prove_by_contradiction), with an
    /// explicit cap on saturation passes instead of
    /// [`EngineConfig::prove_max_iterations`]. A cap of zero runs no pass and
    /// reports [`SearchOutcome::IterationLimit`].
    pub fn prove_by_contradiction_with_limit(
        &mut self,
        query: &Literal,
        max_iterations: usize,
    ) -> ProofResult {
        let negated = Clause::unit(query.negate());
        let mut working = self.clauses.clone();
        working
            .entry(negated.clone())
            .or_insert(ClauseOrigin::NegatedQuery);

        let mut trace = vec![
            format!("Attempting to prove: {}", query),
            format!("Added negated query: {}", negated),
            format!("Initial clauses: {}", working.len()),
        ];

        let verbose = self.config.verbose_trace;
        let saturation = self.saturate(&mut working, max_iterations, |iteration, clause| {
            if verbose {
                trace.push(format!("[Iteration {}] Derived: {}", iteration, clause));
            }
        });

        let mut proof = None;
        match saturation {
            Saturation::Contradiction {
                iteration,
                left,
                right,
            } => {
                if let (Some((l, _)), Some((r, _))) =
                    (working.get_index(left), working.get_index(right))
                {
                    trace.push(format!(
                    "[Iteration {}] ✓ Empty clause derived!",
                    iteration
                ));
                    trace.push(format!("  From: {}", l));
                    trace.push(format!("  And:  {}", r));
                }
                trace.push(format!("CONCLUSION: {} is PROVABLE (TRUE)", query));
                proof = Some(RefutationProof::from_derivation(
                    ProofConclusion::Query {
                        query: query.clone(),
                    },
                    &working,
                    left,
                    right,
                ));
            }
            Saturation::Saturated { iteration } => {
                trace.push(format!("[Iteration {}] No new clauses derived", iteration));
                trace.push(format!("CONCLUSION: {} is UNPROVABLE", query));
            }
            Saturation::IterationLimit => {
                warn!(
                    "Proof of {} stopped at the iteration cap ({})",
                    query, max_iterations
                );
                trace.push(format!("Timeout: Reached max iterations ({})", max_iterations));
                trace.push(format!("CONCLUSION: {} is UNPROVABLE (timeout)", query));
            }
        }

        ProofResult {
            query: query.clone(),
            provable: proof.is_some(),
            outcome: saturation.outcome(),
            iterations: saturation.iterations(max_iterations),
            trace,
            proof,
        }
    }

    /// Saturates a copy of the working set looking for the empty clause.
    ///
    /// `is_consistent` is `true` both when the set saturates and when the
    /// iteration cap is reached; [`ConsistencyReport::outcome`] tells them
    /// apart.
    pub fn check_consistency(&mut self) -> ConsistencyReport {
        let mut working = self.clauses.clone();
        let max_iterations = self.config.consistency_max_iterations;
        let saturation = self.saturate(&mut working, max_iterations, |_, _| {});

        let outcome = saturation.outcome();
        let iterations = saturation.iterations(max_iterations);
        match saturation {
            Saturation::Contradiction {
                iteration,
                left,
                right,
            } => {
                let contradiction =
                    Contradiction::from_derivation(&working, iteration, left, right);
                let explanation = format!(
                    "CONTRADICTION DETECTED:\n  Clause 1: {}\n  Clause 2: {}\n  Resolvent: {} (empty clause)",
                    contradiction.left,
                    contradiction.right,
                    Clause::empty()
                );
                let proof = RefutationProof::from_derivation(
                    ProofConclusion::Inconsistent,
                    &working,
                    left,
                    right,
                );
                ConsistencyReport {
                    is_consistent: false,
                    explanation,
                    outcome,
                    iterations,
                    contradiction: Some(contradiction),
                    proof: Some(proof),
                }
            }
            Saturation::Saturated { .. } => ConsistencyReport {
                is_consistent: true,
                explanation: "No contradictions detected".to_string(),
                outcome,
                iterations,
                contradiction: None,
                proof: None,
            },
            Saturation::IterationLimit => {
                warn!(
                    "Consistency check stopped at the iteration cap ({}), reporting consistent",
                    max_iterations
                );
                ConsistencyReport {
                    is_consistent: true,
                    explanation: "No contradictions detected (search limit reached)".to_string(),
                    outcome,
                    iterations,
                    contradiction: None,
                    proof: None,
                }
            }
        }
    }

    /// Loads the rules for `mode`, injects `facts`, checks consistency and,
    /// when inconsistent, attributes the contradiction to violated rules.
    ///
    /// Identical arguments always produce identical records.
    pub fn validate(
        &mut self,
        facts: &IndexMap<String, bool>,
        mode: NetworkMode,
    ) -> ValidationRecord {
        self.stats.validations += 1;
        self.load_knowledge_base(mode);
        self.add_facts(facts);

        let report = self.check_consistency();
        if !report.is_consistent {
            self.violations = identify_violations(&self.kb, facts, mode)
                .iter()
                .map(ToString::to_string)
                .collect();
        }

        info!(
            "Validated {} facts in {} mode: {} ({} violated rules)",
            facts.len(),
            mode,
            if report.is_consistent {
                "consistent"
            } else {
                "inconsistent"
            },
            self.violations.len()
        );

        ValidationRecord {
            mode,
            facts: facts.clone(),
            is_consistent: report.is_consistent,
            consistency_message: report.explanation,
            violated_rules: self.violations.clone(),
            search_outcome: report.outcome,
            contradiction: report.contradiction,
        }
    }

    /// Violations recorded by the last [`validate`](Self::validate) call.
    pub fn violated_rules(&self) -> &[String] {
        &self.violations
    }

    /// The current working clause set, in insertion order.
    pub fn clauses(&self) -> impl Iterator<Item = &Clause> {
        self.clauses.keys()
    }

    /// Number of clauses in the working set.
    pub fn clause_count(&self) -> usize {
        self.clauses.len()
    }

    /// Where a clause of the working set came from.
    pub fn origin_of(&self, clause: &Clause) -> Option<&ClauseOrigin> {
        self.clauses.get(clause)
    }

    /// A snapshot of the engine's counters.
    pub fn stats(&self) -> EngineStats {
        self.stats.clone()
    }

    /// Resets all counters.
    pub fn clear_stats(&mut self) {
        self.stats = EngineStats::default();
    }

    /// Runs saturation passes over `working` until the empty clause is
    /// derived, a pass adds nothing, or `max_iterations` passes have run.
    ///
    /// Pairs of clauses that were both present before the previous pass were
    /// already resolved then, so each pass only visits pairs involving at
    /// least one clause added by the previous pass. The visiting order is
    /// that of a full `i < j` scan with those pairs removed.
    fn saturate<F>(
        &mut self,
        working: &mut IndexMap<Clause, ClauseOrigin>,
        max_iterations: usize,
        mut on_derived: F,
    ) -> Saturation
    where
        F: FnMut(usize, &Clause),
    {
        self.stats.searches += 1;
        let mut frontier = 0;

        for iteration in 1..=max_iterations {
            self.stats.iterations += 1;
            let len = working.len();
            let mut fresh: IndexMap<Clause, ClauseOrigin> = IndexMap::new();

            for i in 0..len {
                for j in (i + 1).max(frontier)..len {
                    let (Some((left, _)), Some((right, _))) =
                        (working.get_index(i), working.get_index(j))
                    else {
                        continue;
                    };
                    self.stats.pairs_examined += 1;

                    for resolvent in self.resolvents(left, right) {
                        if resolvent.is_empty() {
                            self.stats.contradictions += 1;
                            debug!(
                                "Empty clause derived in iteration {} from {} and {}",
                                iteration, left, right
                            );
                            return Saturation::Contradiction {
                                iteration,
                                left: i,
                                right: j,
                            };
                        }
                        if self.config.discard_tautologies && resolvent.is_tautology() {
                            self.stats.tautologies_discarded += 1;
                            continue;
                        }
                        if working.contains_key(&resolvent) || fresh.contains_key(&resolvent) {
                            continue;
                        }

                        trace!("[{}] {} + {} => {}", iteration, left, right, resolvent);
                        on_derived(iteration, &resolvent);
                        fresh.insert(resolvent, ClauseOrigin::Resolvent { left: i, right: j });
                    }
                }
            }

            if fresh.is_empty() {
                return Saturation::Saturated { iteration };
            }
            self.stats.resolvents_derived += fresh.len();
            frontier = len;
            working.extend(fresh);
        }

        self.stats.iteration_limits += 1;
        Saturation::IterationLimit
    }
}

/// How one saturation run ended.
#[derive(Debug, Clone, Copy)]
enum Saturation {
    Contradiction {
        iteration: usize,
        left: usize,
        right: usize,
    },
    Saturated {
        iteration: usize,
    },
    IterationLimit,
}

impl Saturation {
    fn outcome(&self) -> SearchOutcome {
        match self {
            Saturation::Contradiction { .. } => SearchOutcome::Contradiction,
            Saturation::Saturated { .. } => SearchOutcome::Saturated,
            Saturation::IterationLimit => SearchOutcome::IterationLimit,
        }
    }

    fn iterations(&self, max_iterations: usize) -> usize {
        match self {
            Saturation::Contradiction { iteration, .. } | Saturation::Saturated { iteration } => {
                *iteration
            }
            Saturation::IterationLimit => max_iterations,
        }
    }
}

/// Counters collected by a [`ResolutionEngine`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStats {
    /// `validate` calls.
    pub validations: usize,
    /// Saturation runs (proofs and consistency checks).
    pub searches: usize,
    /// Saturation passes across all runs.
    pub iterations: usize,
    /// Clause pairs handed to the resolver.
    pub pairs_examined: usize,
    /// Resolvents added to a working set.
    pub resolvents_derived: usize,
    /// Tautological resolvents dropped.
    pub tautologies_discarded: usize,
    /// Runs that derived the empty clause.
    pub contradictions: usize,
    /// Runs cut off by an iteration cap.
    pub iteration_limits: usize,
}

/// Result of [`ResolutionEngine::prove_by_contradiction`].
#[derive(Debug, Clone)]
pub struct ProofResult {
    /// The literal that was queried.
    pub query: Literal,
    /// `true` if the empty clause was derived.
    pub provable: bool,
    /// How the search ended.
    pub outcome: SearchOutcome,
    /// Saturation passes run.
    pub iterations: usize,
    /// Human-readable account of the search.
    pub trace: Vec<String>,
    /// The refutation, when `provable`.
    pub proof: Option<RefutationProof>,
}

/// Result of [`ResolutionEngine::check_consistency`].
#[derive(Debug, Clone)]
pub struct ConsistencyReport {
    /// `false` only when a contradiction was witnessed.
    pub is_consistent: bool,
    /// Human-readable verdict.
    pub explanation: String,
    /// How the search ended.
    pub outcome: SearchOutcome,
    /// Saturation passes run.
    pub iterations: usize,
    /// The witnessing pair and its supporting input clauses.
    pub contradiction: Option<Contradiction>,
    /// The refutation of the working set.
    pub proof: Option<RefutationProof>,
}
