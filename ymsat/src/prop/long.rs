//! Propagation of long clauses.
use std::mem::take;

use partial_ref::{partial, PartialRef};

use ymsat_formula::Lit;

use crate::context::{parts::*, Context};

use super::enqueue_assignment;
use super::{Conflict, Reason, Watch};

/// Propagate all literals implied by long clauses watched by the given literal.
///
/// On conflict return the clause propagating the conflicting assignment.
///
/// The watchlist of the literal is compacted in place: a read and a write cursor walk the list
/// and after the scan the list contains exactly the watches that remained attached to the
/// literal. Watches moved to other literals are appended to those literals' lists, which is safe
/// as the processed list is detached for the duration of the scan.
///
/// See [`prop::watch`](crate::prop::watch) for the invariants that this has to uphold.
pub fn propagate_long(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut ClauseAllocP,
        mut ImplGraphP,
        mut TrailP,
        mut WatchlistsP,
    ),
    lit: Lit,
) -> Result<(), Conflict> {
    let (watchlists, mut ctx) = ctx.split_part_mut(WatchlistsP);
    let (alloc, mut ctx) = ctx.split_part_mut(ClauseAllocP);

    let mut watches = take(watchlists.watched_by_mut(lit));

    let false_lit = !lit;

    let end = watches.len();
    let mut read = 0;
    let mut write = 0;
    let mut conflict = None;

    'watches: while read < end {
        let watch = watches[read];
        read += 1;

        // If the blocking literal (which is part of the watched clause) is already true, the
        // watched clause is satisfied and we don't even have to look at it.
        if ctx.part(AssignmentP).lit_is_true(watch.blocking) {
            watches[write] = watch;
            write += 1;
            continue;
        }

        let cref = watch.cref;

        // First we ensure that the literal we're currently propagating is at index 1. This
        // prepares the literal order for further propagations, as the propagating literal has to
        // be at index 0. Doing this here also avoids a similar check later should the clause be
        // satisfied by a non-watched literal, as we can just move it to index 1.
        let first = {
            let lits = alloc.clause_mut(cref).lits_mut();
            if lits[0] == false_lit {
                lits.swap(0, 1);
            }
            lits[0]
        };

        // We create a new watch with the other watched literal as blocking literal. This will
        // either replace the currently processed watch or be added to another literal's watch
        // list.
        let new_watch = Watch {
            cref,
            blocking: first,
        };

        // If the other watched literal (now the first) isn't the blocking literal, check whether
        // that one is true. If so nothing else needs to be done.
        if first != watch.blocking && ctx.part(AssignmentP).lit_is_true(first) {
            watches[write] = new_watch;
            write += 1;
            continue;
        }

        // At this point we try to find a non-false unwatched literal to replace our current
        // literal as the watched literal.
        {
            let lits = alloc.clause_mut(cref).lits_mut();

            for position in 2..lits.len() {
                let rest_lit = lits[position];
                if !ctx.part(AssignmentP).lit_is_false(rest_lit) {
                    // We found a non-false literal and make it a watched literal by reordering
                    // the literals and adding the watch to the corresponding watchlist.
                    lits[1] = rest_lit;
                    lits[position] = false_lit;

                    // The unwatched literals are distinct from the watched ones, so this does not
                    // alias the detached list.
                    debug_assert_ne!(!rest_lit, lit);
                    watchlists.add_watch(!rest_lit, new_watch);
                    continue 'watches;
                }
            }
        }

        // We didn't find a non-false unwatched literal, so either we're propagating or we have a
        // conflict.
        watches[write] = new_watch;
        write += 1;

        // If the other watched literal is false we have a conflict.
        if ctx.part(AssignmentP).lit_is_false(first) {
            // Keep all unprocessed watches attached.
            while read < end {
                watches[write] = watches[read];
                write += 1;
                read += 1;
            }
            conflict = Some(cref);
            break;
        }

        // Otherwise we enqueue a new propagation.
        enqueue_assignment(ctx.borrow(), first, Reason::Long(cref));
    }

    watches.truncate(write);
    *watchlists.watched_by_mut(lit) = watches;

    match conflict {
        Some(cref) => Err(Conflict::Long(cref)),
        None => Ok(()),
    }
}
