pub mod dimacs;

use log::trace;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Display, Formatter};

/// A variable, numbered from 1 as in DIMACS.
#[derive(Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash, Debug)]
pub struct Variable(pub usize);

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Literal {
    Positive(Variable),
    Negative(Variable),
}

impl Literal {
    pub fn new(variable: Variable, positive: bool) -> Self {
        if positive {
            Literal::Positive(variable)
        } else {
            Literal::Negative(variable)
        }
    }

    /// Converts a signed DIMACS integer. `0` is the clause terminator, not a literal.
    pub fn from_dimacs(l: i64) -> Option<Self> {
        match l.cmp(&0) {
            Ordering::Greater => Some(Literal::Positive(Variable(l as usize))),
            Ordering::Less => Some(Literal::Negative(Variable(l.unsigned_abs() as usize))),
            Ordering::Equal => None,
        }
    }

    pub fn to_dimacs(&self) -> i64 {
        match self {
            Literal::Positive(Variable(x)) => *x as i64,
            Literal::Negative(Variable(x)) => -(*x as i64),
        }
    }

    pub fn variable(&self) -> &Variable {
        match self {
            Literal::Positive(v) => v,
            Literal::Negative(v) => v,
        }
    }

    pub fn is_positive(&self) -> bool {
        match self {
            Literal::Positive(_) => true,
            Literal::Negative(_) => false,
        }
    }

    pub fn idx(&self) -> usize {
        self.variable().0
    }

    pub fn negated(&self) -> Self {
        match self {
            Literal::Positive(v) => Literal::Negative(*v),
            Literal::Negative(v) => Literal::Positive(*v),
        }
    }
}

// Orders by variable first so that both polarities of a variable sit next to each other.
impl Ord for Literal {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.variable(), !self.is_positive()).cmp(&(other.variable(), !other.is_positive()))
    }
}

impl PartialOrd for Literal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.to_dimacs())
    }
}

/// A clause as supplied by the caller, before it is indexed into a [`Formula`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Clause {
    literals: Vec<Literal>,
}

impl Clause {
    pub fn new(disjuncts: impl IntoIterator<Item = Literal>) -> Self {
        Self {
            literals: disjuncts.into_iter().collect(),
        }
    }

    pub fn literals(&self) -> impl Iterator<Item = &Literal> {
        self.literals.iter()
    }

    pub fn is_tautology(&self) -> bool {
        self.literals
            .iter()
            .any(|literal| self.literals.contains(&literal.negated()))
    }

    pub fn is_satisfied_by(&self, model: &Model) -> bool {
        self.literals
            .iter()
            .any(|literal| model.value(*literal.variable()) == literal.is_positive())
    }
}

impl Display for Clause {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        for literal in &self.literals {
            write!(f, "{} ", literal)?;
        }
        f.write_str("0")
    }
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ClauseId(usize);

/// The in-progress state of a solve: live clauses indexed both by id and by the literals they
/// contain.
///
/// All mutation goes through [`Formula::add_clause`] and [`Formula::assign`], which keep the two
/// directions of the index in lockstep:
///
/// * `c` is in `occurrences[l]` exactly when `l` is in `clauses[c]`;
/// * no clause contains a literal together with its negation;
/// * no clause is stored empty, and no occurrence set is stored empty;
/// * once either polarity of a variable is assigned, neither polarity occurs any more.
///
/// `Clone` is a deep copy, so two branches of a decision never share state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Formula {
    num_variables: usize,
    next_clause: usize,
    clauses: BTreeMap<ClauseId, BTreeSet<Literal>>,
    occurrences: BTreeMap<Literal, BTreeSet<ClauseId>>,
    // Live clauses with exactly one literal.
    units: BTreeSet<ClauseId>,
    assigned: BTreeSet<Literal>,
    unsatisfiable: bool,
}

impl Formula {
    pub fn new(num_variables: usize) -> Self {
        Self {
            num_variables,
            next_clause: 0,
            clauses: BTreeMap::new(),
            occurrences: BTreeMap::new(),
            units: BTreeSet::new(),
            assigned: BTreeSet::new(),
            unsatisfiable: false,
        }
    }

    pub fn with_clauses(num_variables: usize, conjuncts: impl IntoIterator<Item = Clause>) -> Self {
        let mut formula = Self::new(num_variables);
        for clause in conjuncts {
            formula.add_clause(clause.literals().cloned());
        }
        formula
    }

    /// Indexes a new clause. Repeated literals collapse, tautologies are dropped, and an empty
    /// clause makes the formula unsatisfiable.
    ///
    /// Panics if called after the first [`Formula::assign`].
    pub fn add_clause(&mut self, literals: impl IntoIterator<Item = Literal>) {
        assert!(
            self.assigned.is_empty(),
            "clauses must be added before any assignment"
        );

        let literals = literals.into_iter().collect::<BTreeSet<_>>();
        if literals.iter().any(|l| literals.contains(&l.negated())) {
            trace!("dropping tautological clause {:?}", literals);
            return;
        }
        if literals.is_empty() {
            self.unsatisfiable = true;
            return;
        }

        let id = ClauseId(self.next_clause);
        self.next_clause += 1;

        for literal in &literals {
            self.num_variables = self.num_variables.max(literal.idx());
            self.occurrences.entry(*literal).or_default().insert(id);
        }
        if literals.len() == 1 {
            self.units.insert(id);
        }
        self.clauses.insert(id, literals);
    }

    /// Fixes `literal` to true and simplifies the index: clauses containing it are removed, and
    /// its negation is removed from every other clause. Emptying a clause marks the formula
    /// unsatisfiable.
    ///
    /// Panics if either polarity of the variable is already assigned.
    pub fn assign(&mut self, literal: Literal) {
        assert!(
            !self.is_assigned(*literal.variable()),
            "variable {} is already assigned",
            literal.idx()
        );
        trace!("assign {}", literal);

        self.assigned.insert(literal);

        // Clauses satisfied by the assignment
        for id in self.occurrences.remove(&literal).unwrap_or_default() {
            self.units.remove(&id);
            let clause = match self.clauses.remove(&id) {
                Some(clause) => clause,
                None => continue,
            };
            for other in clause.iter().filter(|l| **l != literal) {
                self.remove_occurrence(*other, id);
            }
        }

        // Clauses that just lost a way to be satisfied
        let negated = literal.negated();
        for id in self.occurrences.remove(&negated).unwrap_or_default() {
            let clause = match self.clauses.get_mut(&id) {
                Some(clause) => clause,
                None => continue,
            };
            if clause.len() == 1 {
                trace!("clause {:?} emptied by {}", id, literal);
                self.unsatisfiable = true;
                self.units.remove(&id);
                self.clauses.remove(&id);
            } else {
                clause.remove(&negated);
                if clause.len() == 1 {
                    self.units.insert(id);
                }
            }
        }
    }

    fn remove_occurrence(&mut self, literal: Literal, id: ClauseId) {
        if let Some(ids) = self.occurrences.get_mut(&literal) {
            ids.remove(&id);
            if ids.is_empty() {
                self.occurrences.remove(&literal);
            }
        }
    }

    pub fn num_variables(&self) -> usize {
        self.num_variables
    }

    /// Number of clauses that are still live (neither satisfied nor emptied).
    pub fn num_clauses(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_unsatisfiable(&self) -> bool {
        self.unsatisfiable
    }

    /// True when every clause has been satisfied without a conflict.
    pub fn is_satisfied(&self) -> bool {
        !self.unsatisfiable && self.occurrences.is_empty()
    }

    pub fn is_assigned(&self, variable: Variable) -> bool {
        self.assigned.contains(&Literal::Positive(variable))
            || self.assigned.contains(&Literal::Negative(variable))
    }

    /// The literals fixed so far, in variable order.
    pub fn assigned(&self) -> impl Iterator<Item = &Literal> {
        self.assigned.iter()
    }

    /// Number of live clauses containing `literal`.
    pub fn occurrence_count(&self, literal: Literal) -> usize {
        self.occurrences.get(&literal).map_or(0, |ids| ids.len())
    }

    /// Every literal that still occurs in a live clause, with its number of occurrences.
    pub(crate) fn occurring_literals(&self) -> impl Iterator<Item = (Literal, usize)> + '_ {
        self.occurrences.iter().map(|(l, ids)| (*l, ids.len()))
    }

    /// Literals whose negation no longer occurs anywhere.
    pub(crate) fn pure_literals(&self) -> Vec<Literal> {
        self.occurrences
            .keys()
            .filter(|l| !self.occurrences.contains_key(&l.negated()))
            .cloned()
            .collect()
    }

    /// The literal of the lowest-numbered live unit clause.
    pub(crate) fn unit_literal(&self) -> Option<Literal> {
        let id = self.units.iter().next()?;
        self.clauses.get(id)?.iter().next().cloned()
    }

    /// A total assignment built from the assigned literals. Variables that were never assigned
    /// are unconstrained and default to true.
    pub fn model(&self) -> Model {
        Model {
            values: (1..=self.num_variables)
                .map(|x| !self.assigned.contains(&Literal::Negative(Variable(x))))
                .collect(),
        }
    }

    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        for (id, clause) in &self.clauses {
            assert!(!clause.is_empty(), "clause {:?} stored empty", id);
            assert_eq!(self.units.contains(id), clause.len() == 1, "unit set out of sync for {:?}", id);
            for literal in clause {
                assert!(!clause.contains(&literal.negated()), "tautology in {:?}", id);
                assert!(self.occurrences[literal].contains(id), "{:?} missing from occurrences[{}]", id, literal);
                assert!(!self.is_assigned(*literal.variable()), "assigned {} still occurs", literal);
            }
        }
        for (literal, ids) in &self.occurrences {
            assert!(!ids.is_empty(), "occurrences[{}] stored empty", literal);
            for id in ids {
                assert!(self.clauses[id].contains(literal), "occurrences[{}] lists stale {:?}", literal, id);
            }
        }
        for id in &self.units {
            assert!(self.clauses.contains_key(id), "unit {:?} is not live", id);
        }
    }
}

/// A total assignment to variables `1..=n`.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Model {
    values: Vec<bool>,
}

impl Model {
    pub fn num_variables(&self) -> usize {
        self.values.len()
    }

    /// Panics if `variable` is outside `1..=num_variables()`.
    pub fn value(&self, variable: Variable) -> bool {
        self.values[variable.0 - 1]
    }

    /// One literal per variable, in increasing variable order.
    pub fn literals(&self) -> impl Iterator<Item = Literal> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(|(i, value)| Literal::new(Variable(i + 1), *value))
    }

    pub fn satisfies<'a>(&self, clauses: impl IntoIterator<Item = &'a Clause>) -> bool {
        clauses.into_iter().all(|clause| clause.is_satisfied_by(self))
    }
}

#[cfg(test)]
pub(crate) fn p(x: usize) -> Literal {
    Literal::Positive(Variable(x))
}

#[cfg(test)]
pub(crate) fn n(x: usize) -> Literal {
    Literal::Negative(Variable(x))
}

/// Random CNF over at most `max_vars` variables: `(num_variables, clauses)`.
#[cfg(test)]
pub(crate) fn formula_strategy(
    max_vars: usize,
    max_clauses: usize,
) -> impl proptest::strategy::Strategy<Value = (usize, Vec<Clause>)> {
    use proptest::prelude::*;

    (1..=max_vars).prop_flat_map(move |num_vars| {
        let literal = (1..=num_vars, any::<bool>()).prop_map(|(x, positive)| Literal::new(Variable(x), positive));
        let clause = proptest::collection::vec(literal, 1..=3).prop_map(|literals| Clause::new(literals));
        (Just(num_vars), proptest::collection::vec(clause, 0..=max_clauses))
    })
}
