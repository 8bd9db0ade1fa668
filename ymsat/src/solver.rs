//! Boolean satisfiability solver.
use std::io;
use std::time::{Duration, Instant};

use partial_ref::{IntoPartialRefMut, PartialRef};

use log::{info, warn};
use thiserror::Error;

use ymsat_dimacs::DimacsParser;
use ymsat_formula::{CnfFormula, Lit, Var};

use crate::assumptions::set_assumptions;
use crate::config::{SatInitParam, SolverConfig};
use crate::context::{config_changed, parts::*, set_var_count, Context};
use crate::load::load_clause;
use crate::schedule::{init_schedule, schedule_step};
use crate::state::{SatState, SolverStats};

pub use crate::budget::StopHandle;

/// Errors reported by the solver facade.
///
/// Unsatisfiability, exhausted budgets and interruptions are not errors; they are reported
/// through [`SolveResult`].
#[derive(Debug, Error)]
pub enum SolverError {
    /// Invalid engine type, malformed parameter object or out of range option value.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// The API was used in an unsupported way. The solver state remains valid for further calls.
    #[error("usage error: {0}")]
    Usage(String),
}

/// Verdict of a [`solve`](Solver::solve) call.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum SolveResult {
    /// A satisfying assignment was found, available through [`Solver::model`].
    Sat,
    /// The constraint set, or the constraint set under the given assumptions, is unsatisfiable.
    /// In the latter case [`Solver::conflict_literals`] names the offending assumptions.
    Unsat,
    /// A budget was exhausted or the search was interrupted.
    Unknown,
}

/// A boolean satisfiability solver.
pub struct Solver {
    ctx: Box<Context>,
    conditional_lits: Vec<Lit>,
    model: Vec<Option<bool>>,
    constant_false: Option<Lit>,
}

impl Default for Solver {
    fn default() -> Solver {
        Solver {
            ctx: Box::new(Context::default()),
            conditional_lits: vec![],
            model: vec![],
            constant_false: None,
        }
    }
}

impl Solver {
    /// Create a new solver with the default configuration.
    ///
    /// Configuration discovery from the environment is deliberately not performed here; use
    /// [`SatInitParam::from_env`] and [`Solver::with_init_param`] to opt into it.
    pub fn new() -> Solver {
        Solver::default()
    }

    /// Create a new solver from a configuration.
    pub fn with_config(config: SolverConfig) -> Result<Solver, SolverError> {
        validate_config(&config)?;

        let mut solver = Solver::default();
        solver.ctx.solver_config = config;

        let mut ctx = solver.ctx.into_partial_ref_mut();
        config_changed(ctx.borrow());

        Ok(solver)
    }

    /// Create a new solver from an initialization parameter object.
    pub fn with_init_param(param: &SatInitParam) -> Result<Solver, SolverError> {
        Solver::with_config(param.solver_config())
    }

    /// Number of variables added to the solver.
    pub fn variable_count(&self) -> usize {
        self.ctx.assignment.assignment().len()
    }

    /// Number of constraint clauses, including binary ones.
    pub fn clause_count(&self) -> usize {
        self.ctx.clause_db.constraint_count() + self.ctx.binary_clauses.count()
    }

    /// Add a new variable and return its positive literal.
    ///
    /// When `decision` is false the variable is never picked as a decision; its value can still
    /// be forced by propagation.
    pub fn new_variable(&mut self, decision: bool) -> Lit {
        let index = self.variable_count();
        let var = Var::from_index(index);

        let mut ctx = self.ctx.into_partial_ref_mut();
        set_var_count(ctx.borrow(), index + 1);
        ctx.part_mut(VsidsP).set_eligible(var, decision);

        Lit::positive(var)
    }

    /// Add a clause over previously added variables.
    ///
    /// While conditional literals are installed, the negation of each of them is appended to the
    /// clause.
    ///
    /// After the constraint set was found unsatisfiable this is a no-op reporting a usage error.
    pub fn add_clause(&mut self, lits: &[Lit]) -> Result<(), SolverError> {
        self.check_lits(lits)?;

        if !self.ctx.solver_state.sane {
            return Err(SolverError::Usage(
                "the constraint set is already unsatisfiable".to_owned(),
            ));
        }

        if self.conditional_lits.is_empty() {
            self.add_clause_internal(lits)
        } else {
            let mut guarded = Vec::with_capacity(lits.len() + self.conditional_lits.len());
            guarded.extend_from_slice(lits);
            guarded.extend(self.conditional_lits.iter().map(|&lit| !lit));
            self.add_clause_internal(&guarded)
        }
    }

    /// Install a set of conditional literals.
    ///
    /// Every clause added afterwards is only active when all conditional literals are true.
    pub fn set_conditional_literals(&mut self, lits: &[Lit]) -> Result<(), SolverError> {
        self.check_lits(lits)?;
        self.conditional_lits.clear();
        self.conditional_lits.extend_from_slice(lits);
        Ok(())
    }

    /// Remove all conditional literals.
    pub fn clear_conditional_literals(&mut self) {
        self.conditional_lits.clear();
    }

    /// Check the satisfiability of the constraint set.
    pub fn solve(&mut self, assumptions: &[Lit]) -> SolveResult {
        self.solve_limited(assumptions, None)
    }

    /// Check the satisfiability of the constraint set within a time limit.
    ///
    /// The time limit is checked at the same search boundaries as the budgets, so the solve may
    /// overshoot it by the duration of one propagation pass.
    pub fn solve_limited(
        &mut self,
        assumptions: &[Lit],
        time_limit: Option<Duration>,
    ) -> SolveResult {
        self.ctx.stats.solves += 1;

        if !self.ctx.solver_state.sane {
            self.ctx.solver_state.sat_state = SatState::Unsat;
            return SolveResult::Unsat;
        }

        for &lit in assumptions {
            self.ensure_var(lit.var());
        }

        self.ctx.budget.clear_interrupt();
        self.ctx
            .budget
            .set_deadline(time_limit.map(|limit| Instant::now() + limit));

        let verbose = self.ctx.solver_config.verbose;

        let result = {
            let mut ctx = self.ctx.into_partial_ref_mut();

            set_assumptions(ctx.borrow(), assumptions);
            init_schedule(ctx.borrow());

            while schedule_step(ctx.borrow()) {}

            match ctx.part(SolverStateP).sat_state {
                SatState::Unknown => SolveResult::Unknown,
                SatState::Sat => SolveResult::Sat,
                SatState::Unsat | SatState::UnsatUnderAssumptions => SolveResult::Unsat,
            }
        };

        if result == SolveResult::Sat {
            self.model.clear();
            self.model
                .extend_from_slice(self.ctx.assignment.assignment());
        }

        // Leave the solver at decision level 0, whatever the outcome.
        let mut ctx = self.ctx.into_partial_ref_mut();
        crate::prop::full_restart(ctx.borrow());

        self.ctx.budget.set_deadline(None);

        if verbose {
            let stats = self.ctx.stats;
            info!(
                "solve {:?}: confl: {} dec: {} ({} rnd) prop: {} rest: {} learnt: {} ({} lits, {} minimized)",
                result,
                stats.conflicts,
                stats.decisions,
                stats.rnd_decisions,
                stats.propagations,
                stats.restarts,
                stats.learnt_clauses,
                stats.learnt_literals,
                stats.minimized_literals,
            );
        }

        result
    }

    /// The satisfying assignment of the last solve, one entry per variable.
    ///
    /// Only valid directly after a [`solve`](Solver::solve) call returned
    /// [`SolveResult::Sat`]. Variables whose value does not matter are unassigned.
    pub fn model(&self) -> Option<&[Option<bool>]> {
        if self.ctx.solver_state.sat_state == SatState::Sat {
            Some(&self.model)
        } else {
            None
        }
    }

    /// The value of a literal in the last model.
    ///
    /// Variables added after the last solve are unassigned.
    pub fn read_model(&self, lit: Lit) -> Option<bool> {
        match self.model() {
            None => None,
            Some(model) => model
                .get(lit.index())
                .copied()
                .flatten()
                .map(|value| value ^ lit.is_negative()),
        }
    }

    /// The subset of the last assumptions that made the constraint set unsatisfiable.
    ///
    /// Only valid after a [`solve`](Solver::solve) call with assumptions returned
    /// [`SolveResult::Unsat`]. When the constraint set is unsatisfiable on its own this is
    /// empty.
    pub fn conflict_literals(&self) -> Option<&[Lit]> {
        match self.ctx.solver_state.sat_state {
            SatState::UnsatUnderAssumptions => Some(self.ctx.assumptions.failed_core()),
            SatState::Unsat => Some(&[]),
            _ => None,
        }
    }

    /// Set the cumulative conflict budget, returning the previous value.
    ///
    /// A negative value disables the budget. The budget counts all conflicts since the solver was
    /// created, so an exhausted budget keeps subsequent solves returning
    /// [`SolveResult::Unknown`] until it is raised.
    pub fn set_conflict_budget(&mut self, limit: i64) -> i64 {
        self.ctx.budget.set_conflict_budget(limit)
    }

    /// Set the cumulative propagation budget, returning the previous value.
    ///
    /// Works like [`set_conflict_budget`](Solver::set_conflict_budget).
    pub fn set_propagation_budget(&mut self, limit: i64) -> i64 {
        self.ctx.budget.set_propagation_budget(limit)
    }

    /// A handle that interrupts a running solve from another thread or a signal handler.
    pub fn stop_handle(&self) -> StopHandle {
        self.ctx.budget.stop_handle()
    }

    /// Whether the constraint set is still possibly satisfiable.
    ///
    /// This turns false when an empty clause is added or a top level conflict is derived. All
    /// later solves return [`SolveResult::Unsat`] without searching.
    pub fn sane(&self) -> bool {
        self.ctx.solver_state.sane
    }

    /// A snapshot of the search statistics.
    pub fn stats(&self) -> SolverStats {
        self.ctx.stats
    }

    /// Add all clauses of a formula, adding variables as needed.
    pub fn add_formula(&mut self, formula: &CnfFormula) -> Result<(), SolverError> {
        while self.variable_count() < formula.var_count() {
            self.new_variable(true);
        }
        for clause in formula.iter() {
            self.add_clause(clause)?;
        }
        Ok(())
    }

    /// Reads and adds a formula in DIMACS CNF format.
    ///
    /// Using this avoids creating a temporary [`CnfFormula`] for the whole input. Header
    /// mismatches are reported as warnings through the `log` crate.
    pub fn add_dimacs_cnf(&mut self, input: impl io::Read) -> Result<(), anyhow::Error> {
        let mut parser = DimacsParser::parse_incremental(input, |parser| {
            Ok(self.add_formula(&parser.take_formula())?)
        })?;

        self.add_formula(&parser.take_formula())?;

        for warning in parser.warnings() {
            warn!("{}", warning);
        }

        info!(
            "Parsed formula with {} variables and {} clauses",
            parser.var_count(),
            parser.clause_count()
        );

        Ok(())
    }

    /// Add a clause without applying conditional literals.
    pub(crate) fn add_clause_internal(&mut self, lits: &[Lit]) -> Result<(), SolverError> {
        let mut ctx = self.ctx.into_partial_ref_mut();
        load_clause(ctx.borrow(), lits);
        Ok(())
    }

    /// A fresh literal for encoder internals.
    pub(crate) fn fresh_lit(&mut self) -> Lit {
        self.new_variable(true)
    }

    /// A literal that is false in every model.
    ///
    /// Created on first use and forced by an unconditional unit clause, so it stays false even
    /// while conditional literals are installed.
    pub(crate) fn constant_false_lit(&mut self) -> Result<Lit, SolverError> {
        match self.constant_false {
            Some(lit) => Ok(lit),
            None => {
                let lit = self.new_variable(false);
                self.add_clause_internal(&[!lit])?;
                self.constant_false = Some(lit);
                Ok(lit)
            }
        }
    }

    fn ensure_var(&mut self, var: Var) {
        if var.index() >= self.variable_count() {
            let mut ctx = self.ctx.into_partial_ref_mut();
            set_var_count(ctx.borrow(), var.index() + 1);
        }
    }

    fn check_lits(&self, lits: &[Lit]) -> Result<(), SolverError> {
        let count = self.variable_count();
        for &lit in lits {
            if lit.index() >= count {
                return Err(SolverError::Usage(format!(
                    "literal {} references a variable that was not added",
                    lit
                )));
            }
        }
        Ok(())
    }
}

fn validate_config(config: &SolverConfig) -> Result<(), SolverError> {
    if !(config.var_decay > 1.0 / 16.0 && config.var_decay < 1.0) {
        return Err(SolverError::Configuration(format!(
            "var_decay {} out of range",
            config.var_decay
        )));
    }
    if !(config.clause_decay > 1.0 / 16.0 && config.clause_decay < 1.0) {
        return Err(SolverError::Configuration(format!(
            "clause_decay {} out of range",
            config.clause_decay
        )));
    }
    if !(0.0..=1.0).contains(&config.selector.var_freq) {
        return Err(SolverError::Configuration(format!(
            "var_freq {} is not a probability",
            config.selector.var_freq
        )));
    }
    if config.random_seed == 0.0 {
        return Err(SolverError::Configuration(
            "random_seed must not be zero".to_owned(),
        ));
    }
    Ok(())
}
