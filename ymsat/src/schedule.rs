//! Scheduling of restarts and learnt clause reductions.
use log::info;

use partial_ref::{partial, PartialRef};

use crate::cdcl::conflict_step;
use crate::clause::{collect_garbage, reduce::reduce_learnts};
use crate::config::ControllerKind;
use crate::context::{parts::*, Context};
use crate::prop::restart;
use crate::state::SatState;

mod luby;

use luby::LubySequence;

/// Restart and learnt clause limit bookkeeping.
///
/// Two interchangeable controller policies are implemented, selected by the solver
/// configuration:
///
/// * `minisat1`: geometric restarts with an initial conflict limit of 100 growing by a factor of
///   1.5, and a learnt clause limit starting at a third of the constraint count growing by a
///   factor of 1.1 per restart.
/// * `minisat2`: Luby restarts with a unit of 100 conflicts, and the same learnt clause limit
///   start value growing by 10% each time an adjustment counter fires, where the counter interval
///   itself starts at 100 conflicts and grows by a factor of 1.5.
#[derive(Default)]
pub struct Schedule {
    conflict_limit: u64,
    learnt_limit: u64,
    real_conflict_limit: f64,
    real_learnt_limit: f64,
    adjust_conflicts: f64,
    adjust_count: u64,
    conflicts_at_restart: u64,
    luby: LubySequence,
}

impl Schedule {
    fn update_on_restart(&mut self, controller: ControllerKind) {
        match controller {
            ControllerKind::Minisat1 => {
                self.real_conflict_limit *= 1.5;
                self.real_learnt_limit *= 1.1;
                self.conflict_limit = self.real_conflict_limit as u64;
                self.learnt_limit = self.real_learnt_limit as u64;
            }
            ControllerKind::Minisat2 => {
                self.conflict_limit = 100 * self.luby.advance();
            }
        }
    }

    fn update_on_conflict(&mut self, controller: ControllerKind) {
        if controller == ControllerKind::Minisat2 {
            self.adjust_count -= 1;
            if self.adjust_count == 0 {
                self.adjust_conflicts *= 1.5;
                self.adjust_count = self.adjust_conflicts as u64;
                self.real_learnt_limit *= 1.1;
                self.learnt_limit = self.real_learnt_limit as u64;
            }
        }
    }
}

/// Reset the schedule at the start of a solve.
pub fn init_schedule(
    mut ctx: partial!(
        Context,
        mut ScheduleP,
        BinaryClausesP,
        ClauseDbP,
        SolverConfigP,
        StatsP,
    ),
) {
    let clause_count =
        ctx.part(ClauseDbP).constraint_count() + ctx.part(BinaryClausesP).count();
    let controller = ctx.part(SolverConfigP).controller;
    let conflicts = ctx.part(StatsP).conflicts;

    let schedule = ctx.part_mut(ScheduleP);

    schedule.real_learnt_limit = clause_count as f64 / 3.0;
    schedule.learnt_limit = schedule.real_learnt_limit as u64;
    schedule.conflicts_at_restart = conflicts;

    match controller {
        ControllerKind::Minisat1 => {
            schedule.real_conflict_limit = 100.0;
            schedule.conflict_limit = 100;
        }
        ControllerKind::Minisat2 => {
            schedule.luby = LubySequence::default();
            schedule.conflict_limit = 100 * schedule.luby.advance();
            schedule.adjust_conflicts = 100.0;
            schedule.adjust_count = 100;
        }
    }
}

/// Perform one step of the search schedule.
///
/// Returns `false` when the search is finished, either because a verdict was reached or because
/// a budget was exhausted or a stop was requested.
pub fn schedule_step(
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
        mut ScheduleP,
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
) -> bool {
    if ctx.part(SolverStateP).sat_state != SatState::Unknown {
        return false;
    }

    if !ctx.part(BudgetP).within(ctx.part(StatsP)) {
        return false;
    }

    let (schedule, mut ctx) = ctx.split_part_mut(ScheduleP);

    if ctx.part(StatsP).conflicts - schedule.conflicts_at_restart >= schedule.conflict_limit {
        restart(ctx.borrow());
        ctx.part_mut(StatsP).restarts += 1;
        schedule.conflicts_at_restart = ctx.part(StatsP).conflicts;
        schedule.update_on_restart(ctx.part(SolverConfigP).controller);

        if ctx.part(SolverConfigP).verbose {
            let stats = ctx.part(StatsP);
            let db = ctx.part(ClauseDbP);
            info!(
                "restart {}: confl: {} vars: {} bin: {} irred: {} learnt: {} limit: {}",
                stats.restarts,
                stats.conflicts,
                ctx.part(AssignmentP).assignment().len()
                    - ctx.part(TrailP).top_level_assignment_count(),
                ctx.part(BinaryClausesP).count(),
                db.constraint_count(),
                db.redundant_count(),
                schedule.learnt_limit,
            );
        }
    }

    let assigned = ctx.part(TrailP).trail().len() as u64;
    if ctx.part(ClauseDbP).redundant_count() as u64 >= schedule.learnt_limit + assigned {
        reduce_learnts(ctx.borrow());
        collect_garbage(ctx.borrow());
    }

    let conflicts_before = ctx.part(StatsP).conflicts;
    conflict_step(ctx.borrow());

    if ctx.part(StatsP).conflicts != conflicts_before {
        schedule.update_on_conflict(ctx.part(SolverConfigP).controller);
    }

    true
}
