//! Tests for row sources and the triple pattern join.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use super::*;
use crate::error::{EngineError, EngineResult};
use crate::query::{Query, QueryBuilder};
use crate::source::{InMemoryTripleSource, TripleSource, TriplesMatch};
use crate::term::Term;
use crate::triple::{Triple, TriplePattern, TripleParts};
use crate::variables::VariablesTable;

const EX: &str = "http://example.org/";

fn uri(s: &str) -> Term {
    Term::uri(format!("{}{}", EX, s))
}

fn t(s: &str, p: &str, o: &str) -> Triple {
    Triple::new(uri(s), uri(p), uri(o))
}

/// `?x` stays a variable, anything else becomes an example.org URI.
fn slot(s: &str) -> String {
    if s.starts_with('?') {
        s.to_string()
    } else {
        format!("<{}{}>", EX, s)
    }
}

fn query(patterns: &[(&str, &str, &str)]) -> Rc<Query> {
    let mut builder = QueryBuilder::new();
    for (s, p, o) in patterns {
        builder = builder.pattern(&slot(s), &slot(p), &slot(o));
    }
    Rc::new(builder.build().unwrap())
}

fn join(query: &Rc<Query>, source: Rc<dyn TripleSource>) -> Rowsource {
    let op = TriplesRowSource::for_query(Rc::clone(query), source).unwrap();
    Rowsource::new(Box::new(op)).unwrap()
}

/// Rows as `name=value` maps rendered to strings, for easy comparison.
fn bindings(rows: &[Row], query: &Query) -> Vec<Vec<(String, String)>> {
    let names = query.variable_names();
    rows.iter()
        .map(|row| {
            row.values()
                .iter()
                .enumerate()
                .filter_map(|(i, v)| {
                    v.as_ref().map(|term| {
                        (
                            names[i].clone(),
                            term.value().trim_start_matches(EX).to_string(),
                        )
                    })
                })
                .collect()
        })
        .collect()
}

fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
    items
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Counts `new_match` calls per pattern so tests can see which branches the
/// search explored.
struct CountingSource {
    inner: InMemoryTripleSource,
    calls: RefCell<Vec<TriplePattern>>,
}

impl TripleSource for CountingSource {
    fn triple_present(&self, triple: &Triple) -> bool {
        self.inner.triple_present(triple)
    }

    fn new_match(
        &self,
        query: &Query,
        pattern: &TriplePattern,
        vars: &VariablesTable,
    ) -> EngineResult<Box<dyn TriplesMatch>> {
        self.calls.borrow_mut().push(pattern.clone());
        self.inner.new_match(query, pattern, vars)
    }
}

struct FailingSource;

impl TripleSource for FailingSource {
    fn triple_present(&self, _triple: &Triple) -> bool {
        true
    }

    fn new_match(
        &self,
        _query: &Query,
        _pattern: &TriplePattern,
        _vars: &VariablesTable,
    ) -> EngineResult<Box<dyn TriplesMatch>> {
        Err(EngineError::ExecutionError("index unavailable".to_string()))
    }
}

/// Yields one candidate per term but refuses to bind the rejected ones.
struct PickySource {
    candidates: Vec<Term>,
    rejected: Vec<Term>,
}

struct PickyMatch {
    candidates: Vec<Term>,
    rejected: Vec<Term>,
    position: usize,
    subject_var: usize,
}

impl TripleSource for PickySource {
    fn triple_present(&self, _triple: &Triple) -> bool {
        false
    }

    fn new_match(
        &self,
        _query: &Query,
        pattern: &TriplePattern,
        _vars: &VariablesTable,
    ) -> EngineResult<Box<dyn TriplesMatch>> {
        Ok(Box::new(PickyMatch {
            candidates: self.candidates.clone(),
            rejected: self.rejected.clone(),
            position: 0,
            subject_var: pattern.subject.as_var().unwrap_or(0),
        }))
    }
}

impl TriplesMatch for PickyMatch {
    fn is_end(&self) -> bool {
        self.position >= self.candidates.len()
    }

    fn bind_match(&self, vars: &mut VariablesTable, parts: TripleParts) -> TripleParts {
        let candidate = &self.candidates[self.position];
        if self.rejected.contains(candidate) || !parts.contains(TripleParts::SUBJECT) {
            return TripleParts::NONE;
        }
        vars.set_value(self.subject_var, candidate.clone());
        TripleParts::SUBJECT
    }

    fn next_match(&mut self) {
        self.position += 1;
    }
}

#[test]
fn test_single_pattern_scenario() {
    let source = InMemoryTripleSource::from_triples(vec![
        t("a", "p", "b"),
        t("a", "p", "c"),
        t("x", "q", "y"),
    ]);
    let q = query(&[("?s", "p", "?o")]);
    let mut rs = join(&q, Rc::new(source));
    let mut vars = q.new_variables_table();

    let first = rs.read_row(&mut vars).unwrap().unwrap();
    let second = rs.read_row(&mut vars).unwrap().unwrap();
    assert!(rs.read_row(&mut vars).unwrap().is_none());

    assert_eq!(
        bindings(&[first, second], &q),
        vec![
            pairs(&[("s", "a"), ("o", "b")]),
            pairs(&[("s", "a"), ("o", "c")]),
        ]
    );
}

#[test]
fn test_chain_with_dead_end_backtracks() {
    let source = Rc::new(CountingSource {
        inner: InMemoryTripleSource::from_triples(vec![
            t("a", "p1", "b"),
            t("b", "p2", "c"),
            t("x", "p1", "y"),
        ]),
        calls: RefCell::new(Vec::new()),
    });
    let q = query(&[("?s", "p1", "?o1"), ("?o1", "p2", "?o2")]);
    let mut rs = join(&q, source.clone());
    let mut vars = q.new_variables_table();

    let rows = rs.read_all_rows(&mut vars).unwrap();
    assert_eq!(
        bindings(&rows, &q),
        vec![pairs(&[("s", "a"), ("o1", "b"), ("o2", "c")])]
    );

    // the second column was opened once for o1=b and once for the dead end o1=y
    let second = &q.triples()[1];
    let opened = source
        .calls
        .borrow()
        .iter()
        .filter(|p| *p == second)
        .count();
    assert_eq!(opened, 2);
}

#[test]
fn test_exact_column_gates_the_join() {
    let data = vec![t("a", "p", "b"), t("a", "p", "c"), t("k", "type", "Thing")];

    let present = query(&[("k", "type", "Thing"), ("?s", "p", "?o")]);
    let mut rs = join(&present, Rc::new(InMemoryTripleSource::from_triples(data.clone())));
    let mut vars = present.new_variables_table();
    assert_eq!(rs.read_all_rows(&mut vars).unwrap().len(), 2);

    let absent = query(&[("?s", "p", "?o"), ("k", "type", "Missing")]);
    let mut rs = join(&absent, Rc::new(InMemoryTripleSource::from_triples(data)));
    let mut vars = absent.new_variables_table();
    assert!(rs.read_row(&mut vars).unwrap().is_none());
}

#[test]
fn test_exact_only_join_yields_one_empty_row() {
    let q = query(&[("a", "p", "b")]);
    let mut rs = join(&q, Rc::new(InMemoryTripleSource::from_triples(vec![t("a", "p", "b")])));
    let mut vars = q.new_variables_table();

    let row = rs.read_row(&mut vars).unwrap().unwrap();
    assert_eq!(row.size(), 0);
    assert!(rs.read_row(&mut vars).unwrap().is_none());
}

#[test]
fn test_exhaustion_is_idempotent() {
    let q = query(&[("?s", "p", "?o")]);
    let mut rs = join(&q, Rc::new(InMemoryTripleSource::from_triples(vec![t("a", "p", "b")])));
    let mut vars = q.new_variables_table();

    assert!(rs.read_row(&mut vars).unwrap().is_some());
    for _ in 0..3 {
        assert!(rs.read_row(&mut vars).unwrap().is_none());
    }
    assert_eq!(rs.state(), RowSourceState::Exhausted);
    assert_eq!(rs.count(), 1);
}

#[test]
fn test_operator_exhaustion_without_wrapper() {
    let q = query(&[("?s", "p", "?o")]);
    let mut op = TriplesRowSource::for_query(
        Rc::clone(&q),
        Rc::new(InMemoryTripleSource::from_triples(vec![t("a", "p", "b")])),
    )
    .unwrap();
    op.init().unwrap();
    let mut vars = q.new_variables_table();

    assert!(op.read_row(&mut vars).unwrap().is_some());
    assert!(op.read_row(&mut vars).unwrap().is_none());
    assert!(op.is_exhausted());
    assert!(op.read_row(&mut vars).unwrap().is_none());
}

#[test]
fn test_offsets_increase_from_zero() {
    let data: Vec<Triple> = (0..5).map(|i| t("a", "p", &format!("o{}", i))).collect();
    let q = query(&[("?s", "p", "?o")]);
    let mut rs = join(&q, Rc::new(InMemoryTripleSource::from_triples(data)));
    let mut vars = q.new_variables_table();

    let offsets: Vec<i64> = rs
        .rows(&mut vars)
        .map(|row| row.unwrap().offset())
        .collect();
    assert_eq!(offsets, vec![0, 1, 2, 3, 4]);
}

#[test]
fn test_no_bindings_left_after_exhaustion() {
    let q = query(&[("?s", "p1", "?o1"), ("?o1", "p2", "?o2")]);
    let source = InMemoryTripleSource::from_triples(vec![
        t("a", "p1", "b"),
        t("b", "p2", "c"),
        t("x", "p1", "y"),
    ]);
    let mut rs = join(&q, Rc::new(source));
    let mut vars = q.new_variables_table();

    let row = rs.read_row(&mut vars).unwrap().unwrap();
    assert_eq!(vars.bound_count(), 3);
    assert_eq!(row.values().iter().filter(|v| v.is_some()).count(), 3);

    assert!(rs.read_row(&mut vars).unwrap().is_none());
    assert_eq!(vars.bound_count(), 0);
}

#[test]
fn test_rerun_is_independent_of_history() {
    let q = query(&[("?x", "p", "?y"), ("?y", "p", "?z")]);
    let data = vec![
        t("a", "p", "b"),
        t("b", "p", "c"),
        t("b", "p", "d"),
        t("c", "p", "a"),
    ];
    let source: Rc<dyn TripleSource> = Rc::new(InMemoryTripleSource::from_triples(data));
    let mut vars = q.new_variables_table();

    let mut first = join(&q, Rc::clone(&source));
    let first_rows = first.read_all_rows(&mut vars).unwrap();

    // same binding table, reused after the first search ran to the end
    let mut second = join(&q, source);
    let second_rows = second.read_all_rows(&mut vars).unwrap();

    assert_eq!(bindings(&first_rows, &q), bindings(&second_rows, &q));
    assert_eq!(first_rows.len(), 4);
}

#[test]
fn test_rows_stay_unchanged_after_search_moves_on() {
    let q = query(&[("?s", "p", "?o")]);
    let source = InMemoryTripleSource::from_triples(vec![t("a", "p", "b"), t("c", "p", "d")]);
    let mut rs = join(&q, Rc::new(source));
    let mut vars = q.new_variables_table();

    let first = rs.read_row(&mut vars).unwrap().unwrap();
    let kept = first.clone_shallow();
    let _second = rs.read_row(&mut vars).unwrap().unwrap();

    assert_eq!(kept.value(0), Some(&uri("a")));
    assert_eq!(kept.usage(), 2);
}

#[test]
fn test_match_failure_reports_and_ends() {
    let q = query(&[("?s", "p", "?o")]);
    let mut rs = join(&q, Rc::new(FailingSource));
    let mut vars = q.new_variables_table();

    assert!(rs.read_row(&mut vars).unwrap().is_none());
    assert!(rs.read_row(&mut vars).unwrap().is_none());
    assert_eq!(
        q.errors(),
        vec![EngineError::MatchFailed {
            column: 0,
            reason: "Execution error: index unavailable".to_string(),
        }]
    );
    assert_eq!(vars.bound_count(), 0);
}

#[test]
fn test_rejected_candidates_are_retried_past() {
    let q = query(&[("?s", "p", "o")]);
    let source = PickySource {
        candidates: vec![uri("a"), uri("b"), uri("c")],
        rejected: vec![uri("a"), uri("c")],
    };
    let mut rs = join(&q, Rc::new(source));
    let mut vars = q.new_variables_table();

    let rows = rs.read_all_rows(&mut vars).unwrap();
    assert_eq!(bindings(&rows, &q), vec![pairs(&[("s", "b")])]);
}

#[test]
fn test_check_only_column_advances() {
    // second column binds nothing: s and o are both declared in column 0
    let q = query(&[("?s", "p", "?o"), ("?s", "q", "?o")]);
    let source = InMemoryTripleSource::from_triples(vec![
        t("a", "p", "b"),
        t("c", "p", "d"),
        t("c", "q", "d"),
    ]);
    let mut rs = join(&q, Rc::new(source));
    let mut vars = q.new_variables_table();

    let rows = rs.read_all_rows(&mut vars).unwrap();
    assert_eq!(bindings(&rows, &q), vec![pairs(&[("s", "c"), ("o", "d")])]);
}

#[test]
fn test_sub_span_uses_outer_bindings() {
    let q = query(&[("?s", "p", "?o"), ("?o", "q", "?z")]);
    let source: Rc<dyn TripleSource> = Rc::new(InMemoryTripleSource::from_triples(vec![
        t("a", "p", "b"),
        t("b", "q", "c1"),
        t("b", "q", "c2"),
        t("x", "q", "nope"),
    ]));

    let mut op = TriplesRowSource::new(Rc::clone(&q), source, 1, 1).unwrap();
    op.init().unwrap();
    // o is declared in column 0, outside this span, so column 1 only binds z
    assert_eq!(op.column_meta(1).unwrap().parts(), TripleParts::OBJECT);
    assert!(op.column_meta(0).is_none());

    let mut rs = Rowsource::new(Box::new(op)).unwrap();
    let mut vars = q.new_variables_table();
    vars.set_value(q.variables().offset_of("o").unwrap(), uri("b"));

    let rows = rs.read_all_rows(&mut vars).unwrap();
    assert_eq!(
        bindings(&rows, &q),
        vec![
            pairs(&[("o", "b"), ("z", "c1")]),
            pairs(&[("o", "b"), ("z", "c2")]),
        ]
    );
    // the outer binding is untouched
    assert_eq!(vars.get_value(1), Some(&uri("b")));
}

#[test]
fn test_prebound_declared_variables_act_as_constants() {
    let q = query(&[("?s", "p", "?o")]);
    let source: Rc<dyn TripleSource> = Rc::new(InMemoryTripleSource::from_triples(vec![
        t("a", "p", "b"),
        t("a", "p", "c"),
        t("d", "p", "b"),
    ]));
    let s = q.variables().offset_of("s").unwrap();
    let o = q.variables().offset_of("o").unwrap();

    // both parts bound from outside: a pure existence check
    let mut vars = q.new_variables_table();
    vars.set_value(s, uri("a"));
    vars.set_value(o, uri("b"));
    let rows = join(&q, Rc::clone(&source)).read_all_rows(&mut vars).unwrap();
    assert_eq!(bindings(&rows, &q), vec![pairs(&[("s", "a"), ("o", "b")])]);
    assert_eq!(vars.bound_count(), 2);

    let mut vars = q.new_variables_table();
    vars.set_value(s, uri("a"));
    vars.set_value(o, uri("d"));
    assert!(join(&q, Rc::clone(&source))
        .read_all_rows(&mut vars)
        .unwrap()
        .is_empty());

    // one part bound from outside, the other still enumerated
    let mut vars = q.new_variables_table();
    vars.set_value(o, uri("b"));
    let rows = join(&q, Rc::clone(&source)).read_all_rows(&mut vars).unwrap();
    assert_eq!(
        bindings(&rows, &q),
        vec![
            pairs(&[("s", "a"), ("o", "b")]),
            pairs(&[("s", "d"), ("o", "b")]),
        ]
    );
    assert_eq!(vars.bound_count(), 1);
    assert_eq!(vars.get_value(o), Some(&uri("b")));
}

#[test]
fn test_abandon_mid_search_restores_bindings() {
    let q = query(&[("?x", "p", "?y"), ("?y", "p", "?z")]);
    let source: Rc<dyn TripleSource> = Rc::new(InMemoryTripleSource::from_triples(vec![
        t("a", "p", "b"),
        t("b", "p", "c"),
        t("b", "p", "d"),
    ]));
    let mut rs = join(&q, source);
    let mut vars = q.new_variables_table();

    assert!(rs.read_row(&mut vars).unwrap().is_some());
    assert_eq!(vars.bound_count(), 3);

    rs.abandon(&mut vars).unwrap();
    assert_eq!(vars.bound_count(), 0);
    assert_eq!(rs.state(), RowSourceState::Finished);
    assert!(rs.read_row(&mut vars).is_err());
}

#[test]
fn test_init_computes_parts_and_exactness() {
    let q = query(&[("?s", "p", "?o"), ("?o", "?p2", "?s"), ("a", "p", "b")]);
    let mut op = TriplesRowSource::for_query(
        Rc::clone(&q),
        Rc::new(InMemoryTripleSource::new()),
    )
    .unwrap();
    op.init().unwrap();

    let col0 = op.column_meta(0).unwrap();
    assert_eq!(col0.parts(), TripleParts::SUBJECT | TripleParts::OBJECT);
    assert!(!col0.is_exact());
    assert!(col0.state().is_unvisited());

    assert_eq!(op.column_meta(1).unwrap().parts(), TripleParts::PREDICATE);
    assert!(op.column_meta(2).unwrap().is_exact());
    assert!(op.column_meta(2).unwrap().parts().is_empty());
}

#[test]
fn test_columns_reset_after_exhaustion() {
    let q = query(&[("?s", "p", "?o"), ("a", "p", "b"), ("?o", "p", "?z")]);
    let source = InMemoryTripleSource::from_triples(vec![
        t("a", "p", "b"),
        t("b", "p", "c"),
    ]);
    let mut op = TriplesRowSource::for_query(Rc::clone(&q), Rc::new(source)).unwrap();
    op.init().unwrap();
    let mut vars = q.new_variables_table();

    let rows = op.read_all_rows(&mut vars).unwrap();
    assert_eq!(
        bindings(&rows, &q),
        vec![pairs(&[("s", "a"), ("o", "b"), ("z", "c")])]
    );
    for column in 0..3 {
        assert!(op.column_meta(column).unwrap().state().is_unvisited());
    }
    assert_eq!(op.new_bindings_count(), 0);
}

#[test]
fn test_new_bindings_count_tracks_current_call() {
    let q = query(&[("?s", "p", "?o")]);
    let mut op = TriplesRowSource::for_query(
        Rc::clone(&q),
        Rc::new(InMemoryTripleSource::from_triples(vec![t("a", "p", "b"), t("c", "p", "d")])),
    )
    .unwrap();
    op.init().unwrap();
    let mut vars = q.new_variables_table();

    op.read_row(&mut vars).unwrap().unwrap();
    assert_eq!(op.new_bindings_count(), 2);

    // unbinding the previous candidate is floored at zero before rebinding
    op.read_row(&mut vars).unwrap().unwrap();
    assert_eq!(op.new_bindings_count(), 2);
}

#[test]
fn test_invalid_span_rejected() {
    let q = query(&[("?s", "p", "?o")]);
    let source: Rc<dyn TripleSource> = Rc::new(InMemoryTripleSource::new());

    let err = TriplesRowSource::new(Rc::clone(&q), Rc::clone(&source), 0, 1)
        .err()
        .unwrap();
    assert_eq!(
        err,
        EngineError::InvalidColumnSpan {
            start: 0,
            end: 1,
            count: 1
        }
    );
    assert!(TriplesRowSource::new(Rc::clone(&q), Rc::clone(&source), 1, 0).is_err());

    let empty = Rc::new(QueryBuilder::new().build().unwrap());
    assert!(TriplesRowSource::for_query(empty, source).is_err());
}

#[test]
fn test_read_before_init_is_an_error() {
    let q = query(&[("?s", "p", "?o")]);
    let mut op =
        TriplesRowSource::for_query(Rc::clone(&q), Rc::new(InMemoryTripleSource::new())).unwrap();
    let mut vars = q.new_variables_table();
    assert!(matches!(
        op.read_row(&mut vars),
        Err(EngineError::InvalidState(_))
    ));
}

#[test]
fn test_rowsource_lifecycle() {
    let q = query(&[("?s", "p", "?o")]);
    let mut rs = join(&q, Rc::new(InMemoryTripleSource::from_triples(vec![t("a", "p", "b")])));
    let mut vars = q.new_variables_table();

    assert_eq!(rs.state(), RowSourceState::Created);
    assert_eq!(
        rs.sizes().unwrap(),
        RowShape {
            size: 2,
            order_size: 0
        }
    );
    assert_eq!(rs.variable_by_offset(1).unwrap().unwrap().name, "o");
    assert!(rs.variable_by_offset(2).unwrap().is_none());

    assert!(rs.read_row(&mut vars).unwrap().is_some());
    assert_eq!(rs.state(), RowSourceState::Open);

    rs.finish().unwrap();
    rs.finish().unwrap();
    assert_eq!(rs.state(), RowSourceState::Finished);
    assert!(matches!(
        rs.read_row(&mut vars),
        Err(EngineError::InvalidState(_))
    ));
    assert!(rs.read_all_rows(&mut vars).is_err());
}

#[test]
fn test_row_format_uses_variable_names() {
    let q = query(&[("?s", "p", "?o")]);
    let mut rs = join(&q, Rc::new(InMemoryTripleSource::from_triples(vec![t("a", "p", "b")])));
    let mut vars = q.new_variables_table();

    let row = rs.read_row(&mut vars).unwrap().unwrap();
    assert_eq!(
        row.format(),
        "result[s=<http://example.org/a>, o=<http://example.org/b>] offset 0"
    );
}

/// Nodes n0..n4 with two predicates, wired so that joins have branches,
/// dead ends and cycles.
fn synthetic_dataset() -> Vec<Triple> {
    let mut data = Vec::new();
    for i in 0..5 {
        for j in 0..5 {
            if (i + 2 * j) % 3 == 0 {
                data.push(t(&format!("n{}", i), "p", &format!("n{}", j)));
            }
            if (i * j + 1) % 4 == 1 && i != j {
                data.push(t(&format!("n{}", i), "q", &format!("n{}", j)));
            }
        }
    }
    data
}

/// Every variable-consistent combination of one triple per pattern.
fn brute_force(
    data: &[Triple],
    patterns: &[(&str, &str, &str)],
) -> BTreeSet<Vec<(String, String)>> {
    fn extend(
        data: &[Triple],
        patterns: &[(&str, &str, &str)],
        env: Vec<(String, String)>,
        out: &mut BTreeSet<Vec<(String, String)>>,
    ) {
        let Some(((s, p, o), rest)) = patterns.split_first() else {
            let mut env = env;
            env.sort();
            out.insert(env);
            return;
        };
        for triple in data {
            let mut next = env.clone();
            let ok = [(*s, &triple.subject), (*p, &triple.predicate), (*o, &triple.object)]
                .into_iter()
                .all(|(slot, term)| {
                    let value = term.value().trim_start_matches(EX).to_string();
                    match slot.strip_prefix('?') {
                        Some(name) => match next.iter().find(|(k, _)| k == name) {
                            Some((_, bound)) => *bound == value,
                            None => {
                                next.push((name.to_string(), value));
                                true
                            }
                        },
                        None => slot == value,
                    }
                });
            if ok {
                extend(data, rest, next, out);
            }
        }
    }

    let mut out = BTreeSet::new();
    extend(data, patterns, Vec::new(), &mut out);
    out
}

#[test]
fn test_join_matches_brute_force() {
    let data = synthetic_dataset();
    let cases: Vec<Vec<(&str, &str, &str)>> = vec![
        vec![("?x", "p", "?y")],
        vec![("?x", "p", "?y"), ("?y", "q", "?z")],
        vec![("?x", "p", "?y"), ("?y", "q", "?z"), ("?z", "p", "?x")],
        vec![("?x", "q", "?y"), ("?x", "p", "?y")],
        vec![("?x", "?r", "?y"), ("?y", "?r", "?x")],
        vec![("?x", "p", "n0"), ("n0", "p", "?y"), ("?y", "q", "?w")],
        vec![("?x", "p", "?x")],
    ];

    for patterns in cases {
        let q = query(&patterns);
        let mut rs = join(&q, Rc::new(InMemoryTripleSource::from_triples(data.clone())));
        let mut vars = q.new_variables_table();
        let rows = rs.read_all_rows(&mut vars).unwrap();

        let mut produced: Vec<Vec<(String, String)>> = bindings(&rows, &q)
            .into_iter()
            .map(|mut env| {
                env.sort();
                env
            })
            .collect();
        let count = produced.len();
        produced.sort();
        produced.dedup();
        assert_eq!(produced.len(), count, "duplicate rows for {:?}", patterns);

        let expected: Vec<_> = brute_force(&data, &patterns).into_iter().collect();
        assert_eq!(produced, expected, "join mismatch for {:?}", patterns);
        assert_eq!(vars.bound_count(), 0);
    }
}

#[test]
fn test_left_column_varies_slowest() {
    let q = query(&[("?x", "p", "?y"), ("?y", "q", "?z")]);
    let source = InMemoryTripleSource::from_triples(vec![
        t("a", "p", "m"),
        t("b", "p", "m"),
        t("m", "q", "z1"),
        t("m", "q", "z2"),
    ]);
    let mut rs = join(&q, Rc::new(source));
    let mut vars = q.new_variables_table();

    let rows = rs.read_all_rows(&mut vars).unwrap();
    let order: Vec<(String, String)> = bindings(&rows, &q)
        .into_iter()
        .map(|env| (env[0].1.clone(), env[2].1.clone()))
        .collect();
    assert_eq!(
        order,
        vec![
            ("a".to_string(), "z1".to_string()),
            ("a".to_string(), "z2".to_string()),
            ("b".to_string(), "z1".to_string()),
            ("b".to_string(), "z2".to_string()),
        ]
    );
}
