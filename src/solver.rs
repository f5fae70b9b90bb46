use crate::formula::{Formula, Literal, Variable};
use crate::SatResult;
use log::{debug, trace};

/// Polled once per search step with the statistics so far. Returning true abandons the search
/// with [`SatResult::Unknown`].
pub trait Interrupt {
    fn should_stop(&mut self, stats: &SolverStats) -> bool;
}

/// Runs the search to completion.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoInterrupt;

impl Interrupt for NoInterrupt {
    fn should_stop(&mut self, _stats: &SolverStats) -> bool {
        false
    }
}

/// Stops the search once it has made more than a fixed number of branching decisions.
#[derive(Clone, Copy, Debug)]
pub struct DecisionBudget {
    max_decisions: usize,
}

impl DecisionBudget {
    pub fn new(max_decisions: usize) -> Self {
        Self { max_decisions }
    }
}

impl Interrupt for DecisionBudget {
    fn should_stop(&mut self, stats: &SolverStats) -> bool {
        stats.decisions > self.max_decisions
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct SolverStats {
    pub decisions: usize,
    pub propagations: usize,
    pub pure_literals: usize,
    pub conflicts: usize,
}

/// A branch still to be explored: the formula as it was at a decision, and the polarity to try.
#[derive(Debug)]
struct Backtrack {
    formula: Formula,
    literal: Literal,
}

enum Step {
    Satisfied,
    Conflict,
    Branch(Variable),
}

/// DPLL search over a private copy of a [`Formula`].
///
/// The search is depth-first, tries the positive polarity of each decision variable first, and
/// stops at the first satisfying branch. Instead of recursing, pending negative branches are kept
/// on an explicit stack; the formula is cloned only for that second branch, while the positive
/// branch keeps mutating the current copy.
pub struct Solver<I: Interrupt = NoInterrupt> {
    formula: Formula,
    interrupt: I,
    stats: SolverStats,
}

impl Solver<NoInterrupt> {
    pub fn new(formula: &Formula) -> Self {
        Self::with_interrupt(formula, NoInterrupt)
    }
}

impl<I: Interrupt> Solver<I> {
    pub fn with_interrupt(formula: &Formula, interrupt: I) -> Self {
        Self {
            formula: formula.clone(),
            interrupt,
            stats: SolverStats::default(),
        }
    }

    pub fn stats(&self) -> &SolverStats {
        &self.stats
    }

    pub fn solve(&mut self) -> SatResult {
        self.stats = SolverStats::default();

        let mut current = self.formula.clone();
        let mut stack: Vec<Backtrack> = vec![];

        let result = loop {
            if self.interrupt.should_stop(&self.stats) {
                debug!("interrupted with {} open branches", stack.len());
                break SatResult::Unknown;
            }

            match self.step(&mut current) {
                Step::Satisfied => break SatResult::Satisfiable(current.model()),
                Step::Conflict => {
                    self.stats.conflicts += 1;
                    match stack.pop() {
                        None => break SatResult::Unsatisfiable,
                        Some(Backtrack { formula, literal }) => {
                            debug!("backtrack: trying {} ({} open branches)", literal, stack.len());
                            current = formula;
                            current.assign(literal);
                        }
                    }
                }
                Step::Branch(variable) => {
                    self.stats.decisions += 1;
                    trace!("decide {} at depth {}", variable.0, stack.len());
                    stack.push(Backtrack {
                        formula: current.clone(),
                        literal: Literal::Negative(variable),
                    });
                    current.assign(Literal::Positive(variable));
                }
            }
        };

        debug!("{:?}", self.stats);
        result
    }

    /// Simplifies `formula` as far as the elimination rules allow, then reports whether it is
    /// finished or which variable to branch on.
    fn step(&mut self, formula: &mut Formula) -> Step {
        self.eliminate_pure_literals(formula);
        self.propagate_units(formula);

        if formula.is_unsatisfiable() {
            Step::Conflict
        } else {
            match choose_variable(formula) {
                None => Step::Satisfied,
                Some(variable) => Step::Branch(variable),
            }
        }
    }

    fn eliminate_pure_literals(&mut self, formula: &mut Formula) {
        loop {
            let pure = formula.pure_literals();
            if pure.is_empty() {
                return;
            }
            for literal in pure {
                // An earlier assignment in this round may have removed every clause containing it
                if formula.occurrence_count(literal) > 0 && formula.occurrence_count(literal.negated()) == 0 {
                    trace!("pure literal {}", literal);
                    formula.assign(literal);
                    self.stats.pure_literals += 1;
                }
            }
        }
    }

    fn propagate_units(&mut self, formula: &mut Formula) {
        while !formula.is_unsatisfiable() {
            match formula.unit_literal() {
                Some(literal) => {
                    formula.assign(literal);
                    self.stats.propagations += 1;
                }
                None => return,
            }
        }
    }
}

/// The variable with the largest occurrence set in either polarity; ties go to the lowest
/// variable.
fn choose_variable(formula: &Formula) -> Option<Variable> {
    let mut best: Option<(Variable, usize)> = None;
    for (literal, count) in formula.occurring_literals() {
        match best {
            Some((_, best_count)) if best_count >= count => {}
            _ => best = Some((*literal.variable(), count)),
        }
    }
    best.map(|(variable, _)| variable)
}

/// Solves `formula` without modifying it.
pub fn solve(formula: &Formula) -> SatResult {
    Solver::new(formula).solve()
}
