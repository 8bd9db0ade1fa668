//! Learnt clause reduction.
use ordered_float::OrderedFloat;

use partial_ref::{partial, PartialRef};

use vec_mut_scan::VecMutScan;

use crate::context::{parts::*, Context};
use crate::prop::Reason;

use super::{db, ClauseRef};

/// Reduce the learnt clause pool to roughly half its size.
///
/// The long learnt clauses are ordered by activity. The lower half is deleted unconditionally,
/// the upper half only when a clause's activity falls below `bump / pool size`. Clauses that are
/// the reason of an assignment on the trail are locked and always kept. Binary learnt clauses
/// live in the binary clause store and are never reduced.
pub fn reduce_learnts(
    mut ctx: partial!(
        Context,
        mut ClauseAllocP,
        mut ClauseDbP,
        mut StatsP,
        mut WatchlistsP,
        AssignmentP,
        ClauseActivityP,
        ImplGraphP,
    ),
) {
    let mut learnts: Vec<ClauseRef> = ctx
        .part(ClauseDbP)
        .clause_refs()
        .iter()
        .cloned()
        .filter(|&cref| {
            let header = ctx.part(ClauseAllocP).header(cref);
            !header.deleted() && header.redundant()
        })
        .collect();

    if learnts.is_empty() {
        return;
    }

    {
        let alloc = ctx.part(ClauseAllocP);
        learnts.sort_unstable_by_key(|&cref| OrderedFloat(alloc.header(cref).activity()));
    }

    let threshold = ctx.part(ClauseActivityP).bump() / learnts.len() as f32;
    let half = learnts.len() / 2;

    let mut index = 0;
    let mut scan = VecMutScan::new(&mut learnts);

    while let Some(cref) = scan.next() {
        let keep_by_policy =
            index >= half && ctx.part(ClauseAllocP).header(*cref).activity() >= threshold;
        index += 1;

        if keep_by_policy || is_locked(ctx.borrow(), *cref) {
            continue;
        }

        db::delete_clause(ctx.borrow(), *cref);
        cref.remove();
    }

    drop(scan);

    ctx.part_mut(StatsP).reduces += 1;
}

/// Whether a clause is the reason of the assignment of its first literal.
fn is_locked(
    ctx: partial!(Context, AssignmentP, ClauseAllocP, ImplGraphP),
    cref: ClauseRef,
) -> bool {
    let asserted = ctx.part(ClauseAllocP).clause(cref).lits()[0];
    ctx.part(AssignmentP).lit_is_true(asserted)
        && ctx.part(ImplGraphP).reason(asserted.var()) == &Reason::Long(cref)
}
