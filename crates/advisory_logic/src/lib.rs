//! Advisory Logic - Resolution-based consistency checking for transit advisories
//!
//! This crate decides whether a set of declared facts about a transit network
//! (stations open or closed, lines active, integration works under way) is
//! consistent with a body of operational rules, and names the rules a
//! contradicting fact set violates. Rules are propositional implications,
//! converted to CNF and checked by resolution refutation.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Advisory Logic                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                              │
//! │  ┌──────────────────────────────────────────────────────┐   │
//! │  │                Knowledge Base                         │   │
//! │  │  Rules │ Mode Filtering │ Polarity Pairs │ Tables     │   │
//! │  └──────────────────────────────────────────────────────┘   │
//! │                           │ CNF                              │
//! │  ┌──────────────────────────────────────────────────────┐   │
//! │  │                Resolution Engine                      │   │
//! │  │  Working Set │ Saturation │ Refutation │ Stats        │   │
//! │  └──────────────────────────────────────────────────────┘   │
//! │                           │                                  │
//! │  ┌──────────────────────────────────────────────────────┐   │
//! │  │                Validator                              │   │
//! │  │  Violation Attribution │ Records │ Proof Checking     │   │
//! │  └──────────────────────────────────────────────────────┘   │
//! │                                                              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use advisory_logic::{BuiltinRules, NetworkMode, ResolutionEngine};
//! use indexmap::IndexMap;
//!
//! let mut engine = ResolutionEngine::new(BuiltinRules::transit()?);
//!
//! let mut facts = IndexMap::new();
//! facts.insert("Station_Open_TanahMerah".to_string(), true);
//! facts.insert("Line_Active_TEL".to_string(), true);
//!
//! let record = engine.validate(&facts, NetworkMode::Today);
//! assert!(record.is_consistent);
//! assert!(record.violated_rules.is_empty());
//! # Ok::<(), advisory_logic::Error>(())
//! ```

pub mod builtin;
pub mod clause;
pub mod config;
pub mod engine;
pub mod error;
pub mod knowledge_base;
pub mod proof;
pub mod rule;
pub mod validator;

// Re-exports
pub use builtin::BuiltinRules;
pub use clause::{Clause, Literal};
pub use config::{EngineConfig, ResolutionStrategy};
pub use engine::{
    resolve, resolve_all, ConsistencyReport, EngineStats, ProofResult, ResolutionEngine,
};
pub use error::{Error, Result};
pub use knowledge_base::{KnowledgeBase, KnowledgeBaseSummary, RuleTable};
pub use proof::{
    ClauseOrigin, Contradiction, ProofConclusion, ProofStep, ProofVerifier, RefutationProof,
    SearchOutcome, StepType, SupportingClause, VerifyOptions, VerifyResult,
};
pub use rule::{NetworkMode, Rule, RuleBuilder, RuleRecord, ServiceStatus};
pub use validator::{identify_violations, ValidationRecord, Violation, ViolationKind};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
