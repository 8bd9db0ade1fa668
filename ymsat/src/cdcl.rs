//! Conflict driven clause learning.
use partial_ref::{partial, PartialRef};

use crate::analyze::analyze_conflict;
use crate::assumptions::{enqueue_assumption, EnqueueAssumption};
use crate::clause::{bump_clause_activity, db, decay_clause_activities, ClauseHeader};
use crate::context::{parts::*, Context};
use crate::decision::make_decision;
use crate::prop::{backtrack, enqueue_assignment, propagate, Conflict, Reason};
use crate::simplify::{prove_units, simplify};
use crate::state::SatState;

/// Find a conflict, learn a clause and backtrack.
///
/// When no conflict is left the solver state switches to sat or unsat-under-assumptions instead.
/// An exhausted budget leaves the state unknown.
pub fn conflict_step(
    mut ctx: partial!(
        Context,
        mut AnalyzeConflictP,
        mut AssignmentP,
        mut AssumptionsP,
        mut BinaryClausesP,
        mut ClauseActivityP,
        mut ClauseAllocP,
        mut ClauseDbP,
        mut ImplGraphP,
        mut SelecterP,
        mut SolverStateP,
        mut StatsP,
        mut TmpDataP,
        mut TrailP,
        mut VsidsP,
        mut WatchlistsP,
        BudgetP,
        SolverConfigP,
    ),
) {
    let conflict = find_conflict(ctx.borrow());

    let conflict = match conflict {
        Ok(()) => {
            ctx.part_mut(SolverStateP).sat_state = SatState::Sat;
            return;
        }
        Err(FoundConflict::Assumption) => {
            ctx.part_mut(SolverStateP).sat_state = SatState::UnsatUnderAssumptions;
            return;
        }
        Err(FoundConflict::Interrupted) => return,
        Err(FoundConflict::Conflict(conflict)) => conflict,
    };

    ctx.part_mut(StatsP).conflicts += 1;

    let backtrack_to = analyze_conflict(ctx.borrow(), conflict);

    let (analyze, mut ctx) = ctx.split_part(AnalyzeConflictP);

    for &cref in analyze.involved() {
        if ctx.part(ClauseAllocP).header(cref).redundant() {
            bump_clause_activity(ctx.borrow(), cref);
        }
    }

    decay_clause_activities(ctx.borrow());

    backtrack(ctx.borrow(), backtrack_to);

    let clause = analyze.clause();

    let reason = match clause.len() {
        0 => {
            let state = ctx.part_mut(SolverStateP);
            state.sat_state = SatState::Unsat;
            state.sane = false;
            return;
        }
        1 => Reason::Unit,
        2 => {
            ctx.part_mut(BinaryClausesP)
                .add_binary_clause([clause[0], clause[1]]);
            Reason::Binary([clause[1]])
        }
        _ => {
            let mut header = ClauseHeader::new();
            header.set_redundant(true);

            let cref = db::add_clause(ctx.borrow(), header, clause);
            ctx.part_mut(WatchlistsP)
                .watch_clause(cref, [clause[0], clause[1]]);
            bump_clause_activity(ctx.borrow(), cref);
            Reason::Long(cref)
        }
    };

    let stats = ctx.part_mut(StatsP);
    stats.learnt_clauses += 1;
    stats.learnt_literals += clause.len() as u64;

    enqueue_assignment(ctx.borrow(), clause[0], reason);
}

/// Return type of [`find_conflict`].
///
/// Specifies whether a conflict was found during propagation, while enqueuing assumptions or
/// whether the budget check interrupted the search.
enum FoundConflict {
    Conflict(Conflict),
    Assumption,
    Interrupted,
}

impl From<Conflict> for FoundConflict {
    fn from(conflict: Conflict) -> FoundConflict {
        FoundConflict::Conflict(conflict)
    }
}

/// Find a conflict.
///
/// Returns `Err` if a conflict was found and `Ok` if a satisfying assignment was found instead.
fn find_conflict(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut AssumptionsP,
        mut BinaryClausesP,
        mut ClauseAllocP,
        mut ClauseDbP,
        mut ImplGraphP,
        mut SelecterP,
        mut StatsP,
        mut TmpDataP,
        mut TrailP,
        mut VsidsP,
        mut WatchlistsP,
        BudgetP,
        SolverConfigP,
    ),
) -> Result<(), FoundConflict> {
    loop {
        let propagation_result = propagate(ctx.borrow());

        let new_unit = prove_units(ctx.borrow());

        if let Err(conflict) = propagation_result {
            return Err(conflict.into());
        }

        if new_unit {
            simplify(ctx.borrow());
        }

        match enqueue_assumption(ctx.borrow()) {
            EnqueueAssumption::Enqueued => continue,
            EnqueueAssumption::Conflict => return Err(FoundConflict::Assumption),
            EnqueueAssumption::Done => (),
        }

        if !ctx.part(BudgetP).within(ctx.part(StatsP)) {
            return Err(FoundConflict::Interrupted);
        }

        if !make_decision(ctx.borrow()) {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    use partial_ref::IntoPartialRefMut;

    use ymsat_formula::{cnf_formula, test::sat_formula, test::sgen_unsat_formula};

    use crate::context::set_var_count;
    use crate::load::load_clause;

    fn solve_ctx(ctx: &mut Context) -> SatState {
        let mut ctx = ctx.into_partial_ref_mut();
        while ctx.part(SolverStateP).sat_state == SatState::Unknown {
            conflict_step(ctx.borrow());
        }
        ctx.part(SolverStateP).sat_state
    }

    #[test]
    fn level_0_unsat() {
        let mut ctx = Context::default();

        let formula = cnf_formula![
            1, 2, 3;
            -1;
            1, -2;
            2, -3;
        ];

        {
            let mut ctx = ctx.into_partial_ref_mut();
            set_var_count(ctx.borrow(), formula.var_count());

            for clause in formula.iter() {
                load_clause(ctx.borrow(), clause);
            }
        }

        assert_eq!(solve_ctx(&mut ctx), SatState::Unsat);
    }

    proptest! {
        #[test]
        fn sgen_unsat(formula in sgen_unsat_formula(1..7usize)) {
            let mut ctx = Context::default();

            {
                let mut ctx = ctx.into_partial_ref_mut();
                set_var_count(ctx.borrow(), formula.var_count());

                for clause in formula.iter() {
                    load_clause(ctx.borrow(), clause);
                }
            }

            prop_assert_eq!(solve_ctx(&mut ctx), SatState::Unsat);
        }

        #[test]
        fn sat(formula in sat_formula(4..20usize, 10..100usize, 0.05..0.2, 0.9..1.0)) {
            let mut ctx = Context::default();

            {
                let mut ctx = ctx.into_partial_ref_mut();
                set_var_count(ctx.borrow(), formula.var_count());

                for clause in formula.iter() {
                    load_clause(ctx.borrow(), clause);
                }
            }

            prop_assert_eq!(solve_ctx(&mut ctx), SatState::Sat);

            let mut ctx = ctx.into_partial_ref_mut();
            for clause in formula.iter() {
                prop_assert!(clause.iter().any(|&lit| ctx.part(AssignmentP).lit_is_true(lit)));
            }
        }

        #[test]
        fn sgen_unsat_incremental_clauses(formula in sgen_unsat_formula(1..7usize)) {
            let mut ctx = Context::default();

            {
                let mut ctx = ctx.into_partial_ref_mut();
                set_var_count(ctx.borrow(), formula.var_count());
            }

            let mut last_state = SatState::Sat;

            for clause in formula.iter() {
                {
                    let mut ctx = ctx.into_partial_ref_mut();
                    load_clause(ctx.borrow(), clause);
                }

                let state = solve_ctx(&mut ctx);

                if state != last_state {
                    prop_assert_eq!(state, SatState::Unsat);
                    prop_assert_eq!(last_state, SatState::Sat);
                    last_state = state;
                }
            }

            prop_assert_eq!(last_state, SatState::Unsat);
        }
    }
}
