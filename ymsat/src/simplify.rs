//! Simplification using top level assignments.
use partial_ref::{partial, PartialRef};

use ymsat_formula::Lit;

use crate::clause::{db, ClauseRef};
use crate::context::{parts::*, Context};

/// Turn fully propagated top level assignments into unit clauses.
///
/// The assignments stay in place, but their trail entries and reasons are dropped so that the
/// trail does not grow without bound over many solve calls and no stale clause references are
/// kept. Returns whether any new units were found since the last call.
pub fn prove_units(
    mut ctx: partial!(Context, mut ImplGraphP, mut TrailP),
) -> bool {
    let mut new_unit = false;

    if ctx.part(TrailP).current_level() == 0 {
        let (trail, mut ctx) = ctx.split_part_mut(TrailP);
        let impl_graph = ctx.part_mut(ImplGraphP);

        for &lit in trail.trail() {
            new_unit = true;
            impl_graph.update_removed_unit(lit.var());
        }

        trail.clear();
    }

    new_unit
}

/// Remove satisfied clauses and false literals.
///
/// May only be called with a fully propagated trail at decision level 0. Clauses shrinking to two
/// literals move to the binary clause store. The watched literals of an unsatisfied clause are
/// unassigned at this point, so shrinking cannot touch the watched positions.
pub fn simplify(
    mut ctx: partial!(
        Context,
        mut BinaryClausesP,
        mut ClauseAllocP,
        mut ClauseDbP,
        mut WatchlistsP,
        AssignmentP,
        TrailP,
    ),
) {
    debug_assert!(ctx.part(TrailP).current_level() == 0);
    debug_assert!(ctx.part(TrailP).fully_propagated());

    let (assignment, mut ctx) = ctx.split_part(AssignmentP);

    ctx.part_mut(BinaryClausesP).sweep_satisfied(assignment);

    let crefs: Vec<ClauseRef> = ctx.part(ClauseDbP).clause_refs().to_vec();
    let mut new_lits: Vec<Lit> = vec![];

    for cref in crefs {
        if ctx.part(ClauseAllocP).header(cref).deleted() {
            continue;
        }

        let mut satisfied = false;
        let old_len;

        new_lits.clear();
        {
            let lits = ctx.part(ClauseAllocP).clause(cref).lits();
            old_len = lits.len();
            for &lit in lits {
                match assignment.lit_value(lit) {
                    Some(true) => {
                        satisfied = true;
                        break;
                    }
                    Some(false) => (),
                    None => new_lits.push(lit),
                }
            }
        }

        if satisfied {
            db::delete_clause(ctx.borrow(), cref);
            continue;
        }

        if new_lits.len() == old_len {
            continue;
        }

        match new_lits[..] {
            // Cannot have empty or unit clauses after full propagation. An empty clause would
            // have been a conflict and a unit clause must be satisfied and thus would have been
            // dropped above.
            [] | [_] => unreachable!(),
            [lit_0, lit_1] => {
                ctx.part_mut(BinaryClausesP)
                    .add_binary_clause([lit_0, lit_1]);
                db::delete_clause(ctx.borrow(), cref);
            }
            ref lits => {
                let removed = old_len - lits.len();
                {
                    let clause = ctx.part_mut(ClauseAllocP).clause_mut(cref);
                    clause.lits_mut()[..lits.len()].copy_from_slice(lits);
                    clause.header_mut().set_len(lits.len());
                }
                ctx.part_mut(ClauseDbP).add_garbage(removed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use partial_ref::IntoPartialRefMut;

    use ymsat_formula::lits;

    use crate::context::set_var_count;
    use crate::load::load_clause;
    use crate::prop::propagate;

    #[test]
    fn sweep_after_units() {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();

        set_var_count(ctx.borrow(), 10);

        load_clause(ctx.borrow(), &lits![1, 2, 3]);
        load_clause(ctx.borrow(), &lits![-1, 4, 5]);
        load_clause(ctx.borrow(), &lits![4, 5]);
        load_clause(ctx.borrow(), &lits![1]);

        assert!(propagate(ctx.borrow()).is_ok());
        assert!(prove_units(ctx.borrow()));

        simplify(ctx.borrow());

        // (1 2 3) is satisfied, (-1 4 5) loses its false literal and becomes binary.
        assert_eq!(ctx.part(ClauseDbP).constraint_count(), 0);
        assert_eq!(ctx.part(BinaryClausesP).count(), 2);

        assert!(!prove_units(ctx.borrow()));
    }
}
