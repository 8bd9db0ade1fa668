//! Decision heuristics.
use partial_ref::{partial, PartialRef};

use ymsat_formula::{Lit, Var};

use crate::config::{PolarityMode, SelectorConfig, SolverConfig};
use crate::context::{parts::*, Context};
use crate::prop::{enqueue_assignment, Reason};

pub mod random;
pub mod vsids;

use random::Random;

/// State of the decision literal selection.
///
/// The variable itself comes from the VSIDS heap; this part only owns the random number generator
/// used for the `var_freq` random pick and the random polarity mode.
pub struct Selecter {
    rng: Random,
}

impl Default for Selecter {
    fn default() -> Selecter {
        Selecter {
            rng: Random::new(SolverConfig::default().random_seed),
        }
    }
}

impl Selecter {
    /// Restart the random sequence with a new seed.
    pub fn reseed(&mut self, seed: f64) {
        self.rng = Random::new(seed);
    }
}

/// Insert a variable into the decision heap if it is decision eligible.
pub fn make_available(mut ctx: partial!(Context, mut VsidsP), var: Var) {
    ctx.part_mut(VsidsP).make_available(var);
}

/// Make a decision and enqueue it.
///
/// Returns `false` if no decision was made because all decision eligible variables are assigned,
/// which means the current assignment is a model.
pub fn make_decision(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut ImplGraphP,
        mut SelecterP,
        mut StatsP,
        mut TrailP,
        mut VsidsP,
        BinaryClausesP,
        SolverConfigP,
        WatchlistsP,
    ),
) -> bool {
    let selector = ctx.part(SolverConfigP).selector;

    let mut decision_var = pick_random_var(ctx.borrow(), &selector);
    if decision_var.is_none() {
        decision_var = pick_active_var(ctx.borrow());
    }

    let decision_var = match decision_var {
        None => return false,
        Some(var) => var,
    };

    let polarity = choose_polarity(ctx.borrow(), &selector, decision_var);
    let decision = Lit::from_var(decision_var, polarity);

    ctx.part_mut(TrailP).new_decision_level();
    enqueue_assignment(ctx.borrow(), decision, Reason::Unit);
    ctx.part_mut(StatsP).decisions += 1;

    true
}

/// With probability `var_freq` pick a uniformly random heap entry.
///
/// The pick is only used when it happens to be unassigned and decision eligible, otherwise the
/// activity based selection takes over.
fn pick_random_var(
    mut ctx: partial!(
        Context,
        mut SelecterP,
        mut StatsP,
        AssignmentP,
        VsidsP
    ),
    selector: &SelectorConfig,
) -> Option<Var> {
    if selector.var_freq <= 0.0 {
        return None;
    }

    let (selecter, mut ctx) = ctx.split_part_mut(SelecterP);

    if !selecter.rng.chance(selector.var_freq) {
        return None;
    }

    let var = {
        let vsids = ctx.part(VsidsP);
        if vsids.heap_len() == 0 {
            return None;
        }
        let entry = selecter.rng.irand(vsids.heap_len());
        let var = vsids.heap_entry(entry);
        if !vsids.is_eligible(var) {
            return None;
        }
        var
    };

    if ctx.part(AssignmentP).var_value(var).is_some() {
        return None;
    }

    ctx.part_mut(StatsP).rnd_decisions += 1;
    Some(var)
}

/// Pop the heap until an unassigned decision eligible variable is found.
fn pick_active_var(mut ctx: partial!(Context, mut VsidsP, AssignmentP)) -> Option<Var> {
    while let Some(var) = ctx.part_mut(VsidsP).next() {
        if ctx.part(AssignmentP).var_value(var).is_none() && ctx.part(VsidsP).is_eligible(var) {
            return Some(var);
        }
    }
    None
}

/// Choose the polarity of the decision literal.
///
/// When the phase cache is enabled and the variable was assigned before, the remembered value
/// wins. Otherwise the configured fallback polarity mode applies.
fn choose_polarity(
    mut ctx: partial!(
        Context,
        mut SelecterP,
        AssignmentP,
        BinaryClausesP,
        WatchlistsP
    ),
    selector: &SelectorConfig,
    var: Var,
) -> bool {
    if selector.phase_cache {
        if let Some(value) = ctx.part(AssignmentP).last_var_value(var) {
            return value;
        }
    }

    match selector.polarity {
        PolarityMode::Posi => true,
        PolarityMode::Nega => false,
        PolarityMode::WlPosi => {
            watcher_count(ctx.borrow(), var.positive()) >= watcher_count(ctx.borrow(), var.negative())
        }
        PolarityMode::WlNega => {
            watcher_count(ctx.borrow(), var.positive()) < watcher_count(ctx.borrow(), var.negative())
        }
        PolarityMode::Random => ctx.part_mut(SelecterP).rng.chance(0.5),
    }
}

/// Number of watchers triggered by assigning the given literal.
fn watcher_count(ctx: partial!(Context, BinaryClausesP, WatchlistsP), lit: Lit) -> usize {
    ctx.part(WatchlistsP).watch_count(lit) + ctx.part(BinaryClausesP).implied(lit).len()
}
