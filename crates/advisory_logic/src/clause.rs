//! Literal and clause model
//!
//! A [`Literal`] is a named proposition with a polarity; a [`Clause`] is the
//! disjunction of a set of literals. Both are immutable value types with
//! structural equality and hashing, so clause sets deduplicate naturally.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// An atomic proposition together with its asserted polarity.
///
/// `Literal::positive("Station_Open_Expo")` reads "Expo station is open";
/// its negation reads "Expo station is not open".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Literal {
    /// Proposition identifier, e.g. `Station_Open_Expo`.
    pub name: String,
    /// `true` for the proposition itself, `false` for its negation.
    pub polarity: bool,
}

impl Literal {
    /// Creates a literal with an explicit polarity.
    pub fn new(name: impl Into<String>, polarity: bool) -> Self {
        Self {
            name: name.into(),
            polarity,
        }
    }

    /// Creates a positive literal.
    pub fn positive(name: impl Into<String>) -> Self {
        Self::new(name, true)
    }

    /// Creates a negative literal.
    pub fn negative(name: impl Into<String>) -> Self {
        Self::new(name, false)
    }

    /// Returns the literal with the same name and inverted polarity.
    pub fn negate(&self) -> Self {
        Self {
            name: self.name.clone(),
            polarity: !self.polarity,
        }
    }

    /// Returns `true` if `other` names the same proposition with the opposite polarity.
    pub fn is_complement_of(&self, other: &Literal) -> bool {
        self.name == other.name && self.polarity != other.polarity
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.polarity {
            write!(f, "{}", self.name)
        } else {
            write!(f, "¬{}", self.name)
        }
    }
}

/// A disjunction of literals.
///
/// Literals are held in an ordered set: duplicates collapse, order is
/// irrelevant to equality, and iteration is deterministic (by name, then
/// negative before positive). A clause holding both polarities of one name is
/// a tautology; it is kept as-is unless the caller filters with
/// [`Clause::is_tautology`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Clause {
    literals: BTreeSet<Literal>,
}

impl Clause {
    /// Creates a clause from any collection of literals.
    pub fn new(literals: impl IntoIterator<Item = Literal>) -> Self {
        Self {
            literals: literals.into_iter().collect(),
        }
    }

    /// The empty clause (□), the contradiction marker.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A unit clause asserting one literal.
    pub fn unit(literal: Literal) -> Self {
        Self::new([literal])
    }

    /// Returns `true` if the clause has no literals.
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    /// Returns `true` if the clause has exactly one literal.
    pub fn is_unit(&self) -> bool {
        self.literals.len() == 1
    }

    /// Number of distinct literals.
    pub fn len(&self) -> usize {
        self.literals.len()
    }

    /// Returns the sole literal of a unit clause.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotUnitClause`] when the clause is empty or has more
    /// than one literal.
    pub fn single_literal(&self) -> Result<&Literal> {
        match (self.literals.len(), self.literals.first()) {
            (1, Some(literal)) => Ok(literal),
            (len, _) => Err(Error::NotUnitClause {
                clause: self.to_string(),
                len,
            }),
        }
    }

    /// Returns `true` if the clause contains the given literal.
    pub fn contains(&self, literal: &Literal) -> bool {
        self.literals.contains(literal)
    }

    /// Iterates literals in their set order.
    pub fn iter(&self) -> impl Iterator<Item = &Literal> {
        self.literals.iter()
    }

    /// Returns `true` if the clause contains some proposition in both polarities.
    pub fn is_tautology(&self) -> bool {
        self.literals
            .iter()
            .any(|lit| lit.polarity && self.literals.contains(&lit.negate()))
    }

    /// Union of both clauses' literals with `left_out` and `right_out` removed.
    pub(crate) fn merge_without(
        &self,
        other: &Clause,
        left_out: &Literal,
        right_out: &Literal,
    ) -> Clause {
        Clause {
            literals: self
                .literals
                .iter()
                .chain(other.literals.iter())
                .filter(|lit| *lit != left_out && *lit != right_out)
                .cloned()
                .collect(),
        }
    }
}

impl FromIterator<Literal> for Clause {
    fn from_iter<I: IntoIterator<Item = Literal>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.literals.is_empty() {
            return write!(f, "□");
        }
        for (i, literal) in self.literals.iter().enumerate() {
            if i > 0 {
                write!(f, " ∨ ")?;
            }
            write!(f, "{}", literal)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negate_flips_polarity_only() {
        let open = Literal::positive("Station_Open_Expo");
        let closed = open.negate();

        assert_eq!(closed.name, "Station_Open_Expo");
        assert!(!closed.polarity);
        assert!(open.polarity);
        assert_eq!(closed.negate(), open);
        assert!(open.is_complement_of(&closed));
    }

    #[test]
    fn test_literal_display() {
        assert_eq!(Literal::positive("A").to_string(), "A");
        assert_eq!(Literal::negative("A").to_string(), "¬A");
    }

    #[test]
    fn test_clause_set_semantics() {
        let a = Clause::new([
            Literal::positive("A"),
            Literal::negative("B"),
            Literal::positive("A"),
        ]);
        let b = Clause::new([Literal::negative("B"), Literal::positive("A")]);

        assert_eq!(a.len(), 2);
        assert_eq!(a, b);

        let mut set = std::collections::HashSet::new();
        set.insert(a);
        set.insert(b);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_empty_and_unit() {
        let empty = Clause::empty();
        assert!(empty.is_empty());
        assert!(!empty.is_unit());
        assert_eq!(empty.to_string(), "□");

        let unit = Clause::unit(Literal::positive("Line_Active_TEL"));
        assert!(unit.is_unit());
        assert_eq!(unit.single_literal().unwrap(), &Literal::positive("Line_Active_TEL"));
    }

    #[test]
    fn test_single_literal_on_non_unit_is_usage_error() {
        let clause = Clause::new([Literal::positive("A"), Literal::positive("B")]);
        let err = clause.single_literal().unwrap_err();
        assert!(matches!(err, Error::NotUnitClause { len: 2, .. }));

        assert!(Clause::empty().single_literal().is_err());
    }

    #[test]
    fn test_tautology_detection() {
        let taut = Clause::new([
            Literal::positive("P"),
            Literal::negative("P"),
            Literal::positive("Q"),
        ]);
        assert!(taut.is_tautology());

        let plain = Clause::new([Literal::positive("P"), Literal::negative("Q")]);
        assert!(!plain.is_tautology());
    }

    #[test]
    fn test_clause_display_is_name_ordered() {
        let clause = Clause::new([
            Literal::positive("Transfer_Available"),
            Literal::negative("Line_Active_TEL"),
            Literal::negative("Station_Open_Expo"),
        ]);
        assert_eq!(
            clause.to_string(),
            "¬Line_Active_TEL ∨ ¬Station_Open_Expo ∨ Transfer_Available"
        );
    }
}
