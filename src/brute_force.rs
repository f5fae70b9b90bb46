use crate::formula::{Clause, Literal, Variable};

// Exhaustive search, used to check the solver's answers
pub(crate) fn solve_brute_force(num_variables: usize, clauses: &[Clause]) -> bool {
    assert!(num_variables <= 15); // just for safety

    fn assignment_for(assignment: u32, x: usize) -> bool {
        assignment & (1 << (x - 1)) != 0
    }

    'search: for assignment in 0..2u32.pow(num_variables as u32) {
        'clauses: for clause in clauses {
            for literal in clause.literals() {
                if assignment_for(assignment, literal.idx()) == literal.is_positive() {
                    // this clause is satisfied, let's go to the next one
                    continue 'clauses;
                }
            }
            // if we got here, this clause was not satisfied, so this assignment is bogus
            continue 'search;
        }
        // if we got here, every clause was satisfied
        return true;
    }
    false
}

/// Standard encoding of `pigeons` pigeons into `holes` holes: variable `(i - 1) * holes + j`
/// means pigeon `i` sits in hole `j`. Unsatisfiable whenever `pigeons > holes`.
pub(crate) fn pigeonhole(pigeons: usize, holes: usize) -> (usize, Vec<Clause>) {
    let var = |i: usize, j: usize| Variable((i - 1) * holes + j);

    let mut clauses = vec![];
    for i in 1..=pigeons {
        clauses.push(Clause::new((1..=holes).map(|j| Literal::Positive(var(i, j)))));
    }
    for j in 1..=holes {
        for i in 1..=pigeons {
            for k in i + 1..=pigeons {
                clauses.push(Clause::new(vec![Literal::Negative(var(i, j)), Literal::Negative(var(k, j))]));
            }
        }
    }
    (pigeons * holes, clauses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::{n, p};

    #[test]
    fn brute_force_bcp_sat() {
        let c1 = Clause::new(vec![p(1), p(2)]);
        let c2 = Clause::new(vec![n(1)]);
        assert!(solve_brute_force(2, &[c1, c2]));
    }

    #[test]
    fn brute_force_bcp_unsat() {
        let c1 = Clause::new(vec![p(1), p(2)]);
        let c2 = Clause::new(vec![n(1)]);
        let c3 = Clause::new(vec![n(2)]);
        assert!(!solve_brute_force(2, &[c1, c2, c3]));
    }

    #[test]
    fn brute_force_empty_clause() {
        assert!(!solve_brute_force(1, &[Clause::new(Vec::<Literal>::new())]));
    }

    #[test]
    fn pigeonhole_shape() {
        let (num_variables, clauses) = pigeonhole(3, 2);
        assert_eq!(num_variables, 6);
        // 3 "somewhere" clauses plus 3 pairs per hole
        assert_eq!(clauses.len(), 3 + 2 * 3);
        assert!(!solve_brute_force(num_variables, &clauses));
        assert!(solve_brute_force(4, &pigeonhole(2, 2).1));
    }
}
