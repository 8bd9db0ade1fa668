//! Database for long clauses.
use partial_ref::{partial, PartialRef};

use ymsat_formula::Lit;

use crate::context::{parts::*, Context};

use super::{header::HEADER_LEN, ClauseHeader, ClauseRef};

/// Database for long clauses.
///
/// Removal of entries from the `clauses` field can be delayed, so the clause header's deleted flag
/// needs to be checked when iterating over it. The constraint and redundant counts are always up
/// to date.
#[derive(Default)]
pub struct ClauseDb {
    /// May contain deleted clauses, see above
    pub(super) clauses: Vec<ClauseRef>,
    count_constraint: usize,
    count_redundant: usize,
    /// Size of deleted but not collected clauses
    pub(super) garbage_size: usize,
}

impl ClauseDb {
    /// The number of long constraint clauses.
    pub fn constraint_count(&self) -> usize {
        self.count_constraint
    }

    /// The number of long learnt clauses.
    pub fn redundant_count(&self) -> usize {
        self.count_redundant
    }

    /// All clause references handed out and not yet collected.
    ///
    /// May contain references to clauses already marked as deleted.
    pub(crate) fn clause_refs(&self) -> &[ClauseRef] {
        &self.clauses
    }

    /// Account for literals removed from a clause without deleting it.
    pub(crate) fn add_garbage(&mut self, size: usize) {
        self.garbage_size += size;
    }
}

/// Add a long clause to the database.
pub fn add_clause(
    mut ctx: partial!(Context, mut ClauseAllocP, mut ClauseDbP),
    header: ClauseHeader,
    lits: &[Lit],
) -> ClauseRef {
    let redundant = header.redundant();

    let cref = ctx.part_mut(ClauseAllocP).add_clause(header, lits);

    let db = ctx.part_mut(ClauseDbP);

    db.clauses.push(cref);
    if redundant {
        db.count_redundant += 1;
    } else {
        db.count_constraint += 1;
    }

    cref
}

/// Delete a long clause from the database.
///
/// This detaches the clause's two watches and marks the clause as deleted. The clause data is
/// reclaimed by the next garbage collection.
pub fn delete_clause(
    mut ctx: partial!(Context, mut ClauseAllocP, mut ClauseDbP, mut WatchlistsP),
    cref: ClauseRef,
) {
    let (alloc, mut ctx) = ctx.split_part_mut(ClauseAllocP);

    {
        let lits = alloc.clause(cref).lits();
        let watched = [lits[0], lits[1]];
        let watchlists = ctx.part_mut(WatchlistsP);
        watchlists.remove_watch(!watched[0], cref);
        watchlists.remove_watch(!watched[1], cref);
    }

    let header = alloc.header_mut(cref);

    debug_assert!(!header.deleted(), "delete_clause for already deleted clause");

    header.set_deleted(true);

    let redundant = header.redundant();
    let garbage = header.len() + HEADER_LEN;

    let db = ctx.part_mut(ClauseDbP);
    if redundant {
        db.count_redundant -= 1;
    } else {
        db.count_constraint -= 1;
    }
    db.garbage_size += garbage;
}

#[cfg(test)]
mod tests {
    use super::*;

    use partial_ref::IntoPartialRefMut;

    use ymsat_formula::cnf_formula;

    use crate::context::set_var_count;

    #[test]
    fn counts_and_deletes() {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();

        let clauses = cnf_formula![
            1, 2, 3;
            4, -5, 6;
            -2, 3, -4;
            -3, 5, 2, 7, 5;
        ];

        set_var_count(ctx.borrow(), clauses.var_count());

        let mut crefs = vec![];

        for (index, clause) in clauses.iter().enumerate() {
            let mut header = ClauseHeader::new();
            header.set_redundant(index >= 2);
            let cref = add_clause(ctx.borrow(), header, clause);
            ctx.part_mut(WatchlistsP)
                .watch_clause(cref, [clause[0], clause[1]]);
            crefs.push(cref);
        }

        assert_eq!(ctx.part(ClauseDbP).constraint_count(), 2);
        assert_eq!(ctx.part(ClauseDbP).redundant_count(), 2);

        delete_clause(ctx.borrow(), crefs[0]);
        delete_clause(ctx.borrow(), crefs[2]);

        assert_eq!(ctx.part(ClauseDbP).constraint_count(), 1);
        assert_eq!(ctx.part(ClauseDbP).redundant_count(), 1);
        assert!(ctx.part(ClauseDbP).garbage_size > 0);

        for &cref in crefs.iter() {
            let deleted = ctx.part(ClauseAllocP).header(cref).deleted();
            assert_eq!(deleted, cref == crefs[0] || cref == crefs[2]);
        }
    }
}
