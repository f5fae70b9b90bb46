use crate::formula::{Formula, Literal};
use crate::SatResult;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;

/// Parses a DIMACS CNF problem, adding each clause to a fresh [`Formula`].
///
/// Clauses may span lines and end at `0`. A `%` token ends the input early, as in some SATLIB
/// benchmarks. The number of clauses must match the `p cnf` header exactly.
pub fn parse<R: Read>(reader: R) -> Result<Formula, DimacsParseError> {
    let reader = BufReader::new(reader);

    let mut header = None;
    let mut formula = Formula::new(0);
    let mut num_read = 0;
    let mut clause = vec![];

    'lines: for line in reader.lines() {
        let line = line?;
        let mut line = line.split_whitespace().peekable();

        match line.peek() {
            None => continue,
            Some(t) if t.starts_with('c') => continue,
            Some(&"p") => {
                if header.is_some() {
                    return Err(DimacsParseError::Format("duplicate 'p' line".into()));
                }
                let _ = line.next();

                if line.next() != Some("cnf") {
                    return Err(DimacsParseError::Format("missing 'cnf'".into()));
                }

                let num_variables = line
                    .next()
                    .and_then(|c| c.parse::<usize>().ok())
                    .ok_or_else(|| DimacsParseError::Format("invalid num_variables".into()))?;

                let num_clauses = line
                    .next()
                    .and_then(|c| c.parse::<usize>().ok())
                    .ok_or_else(|| DimacsParseError::Format("invalid num_clauses".into()))?;

                formula = Formula::new(num_variables);
                header = Some((num_variables, num_clauses));
            }
            Some(_) => {
                let (num_variables, num_clauses) =
                    header.ok_or_else(|| DimacsParseError::Format("missing 'p' line before clauses".into()))?;

                for x in line {
                    if x == "%" {
                        break 'lines;
                    }
                    match parse_literal(x, num_variables)? {
                        Some(l) => clause.push(l),
                        None => {
                            num_read += 1;
                            if num_read > num_clauses {
                                return Err(DimacsParseError::Format("too many clauses".into()));
                            }
                            formula.add_clause(clause.drain(..));
                        }
                    }
                }
            }
        }
    }

    let (_, num_clauses) = header.ok_or_else(|| DimacsParseError::Format("missing 'p' line".into()))?;
    if !clause.is_empty() {
        return Err(DimacsParseError::Format("unterminated clause".into()));
    }
    if num_read < num_clauses {
        return Err(DimacsParseError::Format("too few clauses".into()));
    }

    Ok(formula)
}

pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Formula, DimacsParseError> {
    let file = File::open(path)?;
    parse(file)
}

fn parse_literal(s: &str, num_variables: usize) -> Result<Option<Literal>, DimacsParseError> {
    let l = s
        .parse::<i64>()
        .map_err(|_| DimacsParseError::Format(format!("invalid literal '{}'", s)))?;
    match Literal::from_dimacs(l) {
        Some(literal) if literal.idx() > num_variables => Err(DimacsParseError::Format(format!(
            "literal {} exceeds declared {} variables",
            l, num_variables
        ))),
        literal => Ok(literal),
    }
}

/// Writes a result in the competition output format: `UNSAT`, or `SAT` followed by every
/// variable as a signed id and a terminating `0`.
pub fn write_result<W: Write>(mut writer: W, result: &SatResult) -> std::io::Result<()> {
    match result {
        SatResult::Unsatisfiable => writeln!(writer, "UNSAT"),
        SatResult::Unknown => writeln!(writer, "UNKNOWN"),
        SatResult::Satisfiable(model) => {
            writeln!(writer, "SAT")?;
            for literal in model.literals() {
                write!(writer, "{} ", literal)?;
            }
            writeln!(writer, "0")
        }
    }
}

#[derive(Debug)]
pub enum DimacsParseError {
    Io(std::io::Error),
    Format(String),
}

impl fmt::Display for DimacsParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DimacsParseError::Io(e) => write!(f, "I/O error: {}", e),
            DimacsParseError::Format(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for DimacsParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DimacsParseError::Io(e) => Some(e),
            DimacsParseError::Format(_) => None,
        }
    }
}

impl From<std::io::Error> for DimacsParseError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use crate::formula::{n, p, Clause, Variable};
    use crate::{SatResult, Solver};

    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn parse_err(cnf: &str) -> String {
        match parse(cnf.as_bytes()) {
            Err(DimacsParseError::Format(msg)) => msg,
            Err(e) => panic!("unexpected error {:?}", e),
            Ok(f) => panic!("expected parse failure, got {:?}", f),
        }
    }

    #[test]
    fn parse_cnf_basic() {
        let cnf = "c  simple_v3_c2.cnf
c
p cnf 3 2
1 -3 0
2 3 -1 0";
        let f = parse(cnf.as_bytes()).expect("failed to parse");
        let expected = Formula::with_clauses(
            3,
            vec![Clause::new(vec![p(1), n(3)]), Clause::new(vec![p(2), p(3), n(1)])],
        );
        assert_eq!(f, expected);
        assert_eq!(f.num_variables(), 3);
    }

    #[test]
    fn parse_multiline_clause() {
        let cnf = "p cnf 4 2
1 2
 -3 0
c comment between clauses
4 0
";
        let f = parse(cnf.as_bytes()).expect("failed to parse");
        let expected = Formula::with_clauses(
            4,
            vec![Clause::new(vec![p(1), p(2), n(3)]), Clause::new(vec![p(4)])],
        );
        assert_eq!(f, expected);
    }

    #[test]
    fn parse_stops_at_percent() {
        let cnf = "p cnf 2 1
1 -2 0
%
0
";
        let f = parse(cnf.as_bytes()).expect("failed to parse");
        assert_eq!(f.num_clauses(), 1);
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert_eq!(parse_err("1 2 0\n"), "missing 'p' line before clauses");
        assert_eq!(parse_err("p dnf 2 1\n1 2 0\n"), "missing 'cnf'");
        assert_eq!(parse_err("p cnf x 1\n"), "invalid num_variables");
        assert_eq!(parse_err("p cnf 2 1\n1 3 0\n"), "literal 3 exceeds declared 2 variables");
        assert_eq!(parse_err("p cnf 2 1\n1 -3 0\n"), "literal -3 exceeds declared 2 variables");
        assert_eq!(parse_err("p cnf 2 1\n1 two 0\n"), "invalid literal 'two'");
        assert_eq!(parse_err("p cnf 2 1\n1 0\n2 0\n"), "too many clauses");
        assert_eq!(parse_err("p cnf 2 2\n1 0\n"), "too few clauses");
        assert_eq!(parse_err("p cnf 2 1\n1 2\n"), "unterminated clause");
        assert_eq!(parse_err("c nothing here\n"), "missing 'p' line");
    }

    #[test]
    fn parse_from_file() {
        let mut file = NamedTempFile::new().expect("failed to create temp file");
        writeln!(file, "p cnf 2 2\n1 2 0\n-1 0").expect("failed to write");

        let f = parse_file(file.path()).expect("failed to parse");
        assert_eq!(f.num_clauses(), 2);
        assert!(matches!(parse_file("/nonexistent/input.cnf"), Err(DimacsParseError::Io(_))));
    }

    #[test]
    fn write_unsat() {
        let mut out = vec![];
        write_result(&mut out, &SatResult::Unsatisfiable).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "UNSAT\n");
    }

    #[test]
    fn write_sat_lists_every_variable() {
        let f = parse("p cnf 3 1\n-2 0\n".as_bytes()).expect("failed to parse");
        let result = Solver::new(&f).solve();

        let mut out = vec![];
        write_result(&mut out, &result).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "SAT\n1 -2 3 0\n");
        assert!(!result.model().unwrap().value(Variable(2)));
    }

    #[test]
    fn solve_cnf_quinn() {
        let cnf = "c  quinn.cnf
c
p cnf 16 18
  1    2  0
 -2   -4  0
  3    4  0
 -4   -5  0
  5   -6  0
  6   -7  0
  6    7  0
  7  -16  0
  8   -9  0
 -8  -14  0
  9   10  0
  9  -10  0
-10  -11  0
 10   12  0
 11   12  0
 13   14  0
 14  -15  0
 15   16  0
";

        let f = parse(cnf.as_bytes()).expect("failed to parse");

        let mut solver = Solver::new(&f);
        let r = solver.solve();

        assert!(matches!(r, SatResult::Satisfiable(_)));
    }
}
