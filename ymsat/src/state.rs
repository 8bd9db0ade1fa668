//! Miscellaneous solver state.

/// Satisfiability state.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum SatState {
    Unknown,
    Sat,
    Unsat,
    UnsatUnderAssumptions,
}

impl Default for SatState {
    fn default() -> SatState {
        SatState::Unknown
    }
}

/// Miscellaneous solver state.
///
/// Anything larger or any larger group of related state variables should be moved into a separate
/// part of [`Context`](crate::context::Context).
pub struct SolverState {
    pub sat_state: SatState,
    /// False when the constraint set itself was found unsatisfiable.
    ///
    /// Once this is false the solver answers every query with unsat without searching.
    pub sane: bool,
}

impl Default for SolverState {
    fn default() -> SolverState {
        SolverState {
            sat_state: SatState::Unknown,
            sane: true,
        }
    }
}

/// Monotonically increasing counters of the search.
#[derive(Copy, Clone, Default, Debug)]
pub struct SolverStats {
    pub solves: u64,
    pub restarts: u64,
    pub conflicts: u64,
    pub decisions: u64,
    pub rnd_decisions: u64,
    pub propagations: u64,
    pub learnt_clauses: u64,
    pub learnt_literals: u64,
    pub minimized_literals: u64,
    pub reduces: u64,
}
