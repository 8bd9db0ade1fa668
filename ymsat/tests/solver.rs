//! End-to-end scenarios for the solver facade.
use std::time::Duration;

use proptest::prelude::*;

use ymsat::{config::SatInitParam, SolveResult, Solver};
use ymsat_dimacs::{write_dimacs, DimacsParser};
use ymsat_formula::{cnf_formula, lit, test::sat_formula, test::sgen_unsat_formula, CnfFormula, Lit};

fn solver_with(formula: &CnfFormula) -> Solver {
    let mut solver = Solver::new();
    solver.add_formula(formula).unwrap();
    solver
}

#[test]
fn simple_implication_chain() {
    let mut solver = solver_with(&cnf_formula![
        1, 2;
        -1, 3;
        -2, -3;
    ]);

    assert_eq!(solver.solve(&[]), SolveResult::Sat);

    let clauses = cnf_formula![
        1, 2;
        -1, 3;
        -2, -3;
    ];
    for clause in clauses.iter() {
        assert!(clause.iter().any(|&lit| solver.read_model(lit) == Some(true)));
    }

    // Under the assumption 1 there is exactly one model: 1, -2, 3.
    assert_eq!(solver.solve(&[lit![1]]), SolveResult::Sat);
    assert_eq!(solver.read_model(lit![1]), Some(true));
    assert_eq!(solver.read_model(lit![2]), Some(false));
    assert_eq!(solver.read_model(lit![3]), Some(true));
}

#[test]
fn empty_clause_poisons_the_solver() {
    let mut solver = Solver::new();
    let x = solver.new_variable(true);

    solver.add_clause(&[]).unwrap();

    assert_eq!(solver.solve(&[]), SolveResult::Unsat);
    assert!(!solver.sane());

    // Adding more clauses is a rejected no-op.
    assert!(solver.add_clause(&[x]).is_err());
    assert_eq!(solver.solve(&[]), SolveResult::Unsat);
    assert_eq!(solver.solve(&[x]), SolveResult::Unsat);
}

#[test]
fn single_assumption_conflict() {
    let mut solver = Solver::new();
    let x = solver.new_variable(true);

    solver.add_clause(&[x]).unwrap();

    assert_eq!(solver.solve(&[!x]), SolveResult::Unsat);
    assert_eq!(solver.conflict_literals(), Some(&[!x][..]));

    // The constraint set itself stays satisfiable.
    assert_eq!(solver.solve(&[]), SolveResult::Sat);
    assert_eq!(solver.read_model(x), Some(true));
}

#[test]
fn one_hot_selection() {
    let mut solver = Solver::new();
    let lits: Vec<Lit> = (0..3).map(|_| solver.new_variable(true)).collect();

    solver.add_at_most_one(&lits).unwrap();
    solver.add_at_least_one(&lits).unwrap();

    for index in 0..3 {
        assert_eq!(solver.solve(&[lits[index]]), SolveResult::Sat);
        for other in 0..3 {
            let expected = Some(other == index);
            assert_eq!(solver.read_model(lits[other]), expected);
        }
    }

    assert_eq!(solver.solve(&[lits[0], lits[1]]), SolveResult::Unsat);
    let core = solver.conflict_literals().unwrap();
    assert!(!core.is_empty());
    assert!(core.iter().all(|lit| [lits[0], lits[1]].contains(lit)));
}

#[test]
fn geometric_controller_solves_too() {
    let param = SatInitParam::from_json_str(
        r#"{"type": "ymsat1", "selector": {"type": "wlposi", "var_freq": 0.02}}"#,
    )
    .unwrap();
    let mut solver = Solver::with_init_param(&param).unwrap();

    // An unsatisfiable instance that takes a few conflicts.
    let holes = 4;
    let vars: Vec<Vec<Lit>> = (0..holes + 1)
        .map(|_| (0..holes).map(|_| solver.new_variable(true)).collect())
        .collect();

    for row in vars.iter() {
        solver.add_clause(row).unwrap();
    }
    for hole in 0..holes {
        for a in 0..holes + 1 {
            for b in 0..a {
                solver
                    .add_clause(&[!vars[a][hole], !vars[b][hole]])
                    .unwrap();
            }
        }
    }

    assert_eq!(solver.solve(&[]), SolveResult::Unsat);
    assert!(solver.stats().conflicts > 0);
}

#[test]
fn zero_time_limit_reports_unknown() {
    let mut solver = solver_with(&cnf_formula![
        1, 2;
        -1, 2;
    ]);

    assert_eq!(
        solver.solve_limited(&[], Some(Duration::from_millis(0))),
        SolveResult::Unknown
    );

    // Without the limit the instance is trivial.
    assert_eq!(solver.solve(&[]), SolveResult::Sat);
}

#[test]
fn stop_handle_interrupts_from_another_thread() {
    let mut solver = Solver::new();

    // A pigeon hole instance large enough to keep the search busy.
    let holes = 10;
    let vars: Vec<Vec<Lit>> = (0..holes + 1)
        .map(|_| (0..holes).map(|_| solver.new_variable(true)).collect())
        .collect();

    for row in vars.iter() {
        solver.add_clause(row).unwrap();
    }
    for hole in 0..holes {
        for a in 0..holes + 1 {
            for b in 0..a {
                solver
                    .add_clause(&[!vars[a][hole], !vars[b][hole]])
                    .unwrap();
            }
        }
    }

    let handle = solver.stop_handle();
    let stopper = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(50));
        handle.stop();
    });

    assert_eq!(solver.solve(&[]), SolveResult::Unknown);
    stopper.join().unwrap();
}

#[test]
fn propagation_budget_is_cumulative() {
    let mut solver = solver_with(&cnf_formula![
        1, 2, 3;
        -1, 2;
        -2, 3;
    ]);

    assert_eq!(solver.set_propagation_budget(1), -1);
    // The first solve exhausts the budget.
    assert_eq!(solver.solve(&[lit![1]]), SolveResult::Unknown);
    // It stays exhausted for the next call.
    assert_eq!(solver.solve(&[lit![1]]), SolveResult::Unknown);

    solver.set_propagation_budget(-1);
    assert_eq!(solver.solve(&[lit![1]]), SolveResult::Sat);
}

#[test]
fn dimacs_input_is_solvable() {
    let input = b"c a tiny instance\np cnf 3 3\n1 2 0\n-1 3 0\n-2 -3 0\n" as &[u8];

    let formula = DimacsParser::parse(input).unwrap();

    let mut solver = Solver::new();
    solver.add_dimacs_cnf(input).unwrap();

    assert_eq!(solver.solve(&[]), SolveResult::Sat);

    for clause in formula.iter() {
        assert!(clause.iter().any(|&lit| solver.read_model(lit) == Some(true)));
    }
}

proptest! {
    #[test]
    fn dimacs_roundtrip_preserves_verdict(
        formula in sat_formula(4..15usize, 10..60usize, 0.05..0.2, 0.9..1.0),
        hard in sgen_unsat_formula(1..4usize),
    ) {
        for (input, expected) in vec![(formula, SolveResult::Sat), (hard, SolveResult::Unsat)] {
            let mut buffer = vec![];
            write_dimacs(&mut buffer, &input).unwrap();

            let reread = DimacsParser::parse(&buffer[..]).unwrap();
            prop_assert_eq!(&reread, &input);

            let mut direct = solver_with(&input);
            let mut roundtripped = solver_with(&reread);

            prop_assert_eq!(direct.solve(&[]), expected);
            prop_assert_eq!(roundtripped.solve(&[]), expected);
        }
    }

    #[test]
    fn duplicate_clauses_are_idempotent(
        formula in sat_formula(4..15usize, 10..60usize, 0.05..0.2, 0.9..1.0),
    ) {
        let mut once = solver_with(&formula);
        let mut twice = solver_with(&formula);
        twice.add_formula(&formula).unwrap();

        prop_assert_eq!(once.solve(&[]), SolveResult::Sat);
        prop_assert_eq!(twice.solve(&[]), SolveResult::Sat);

        // Any model of the duplicated instance satisfies the original clauses and vice versa.
        for clause in formula.iter() {
            prop_assert!(clause.iter().any(|&lit| twice.read_model(lit) == Some(true)));
        }

        let model: Vec<Lit> = once
            .model()
            .unwrap()
            .iter()
            .enumerate()
            .filter_map(|(index, value)| value.map(|value| Lit::from_index(index, value)))
            .collect();
        prop_assert_eq!(twice.solve(&model), SolveResult::Sat);
    }

    #[test]
    fn assumptions_are_monotonic(
        formula in sat_formula(4..15usize, 10..60usize, 0.05..0.2, 0.9..1.0),
    ) {
        let mut solver = solver_with(&formula);
        prop_assert_eq!(solver.solve(&[]), SolveResult::Sat);

        let first = Lit::from_index(0, true);

        // Under a single assumption the verdict matches the existence of a model with that
        // literal, and the negation of an unsat assumption is forced in every model.
        let positive = solver.solve(&[first]);
        let negative = solver.solve(&[!first]);

        // The formula is satisfiable, so one of the polarities must work.
        prop_assert!(positive == SolveResult::Sat || negative == SolveResult::Sat);

        if positive == SolveResult::Unsat {
            prop_assert_eq!(solver.solve(&[]), SolveResult::Sat);
            prop_assert_eq!(solver.read_model(first), Some(false));
        }
        if negative == SolveResult::Unsat {
            prop_assert_eq!(solver.solve(&[]), SolveResult::Sat);
            prop_assert_eq!(solver.read_model(first), Some(true));
        }
    }

    #[test]
    fn adding_a_model_literal_keeps_sat(
        formula in sat_formula(4..15usize, 10..60usize, 0.05..0.2, 0.9..1.0),
    ) {
        let mut solver = solver_with(&formula);
        prop_assert_eq!(solver.solve(&[]), SolveResult::Sat);

        // Any literal of the found model stays satisfiable as an assumption.
        let model: Vec<Lit> = solver
            .model()
            .unwrap()
            .iter()
            .enumerate()
            .filter_map(|(index, value)| {
                value.map(|value| Lit::from_index(index, value))
            })
            .collect();

        for &lit in model.iter().take(5) {
            prop_assert_eq!(solver.solve(&[lit]), SolveResult::Sat);
            prop_assert_eq!(solver.read_model(lit), Some(true));
        }
    }
}
