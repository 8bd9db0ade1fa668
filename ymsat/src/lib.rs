//! A CDCL based SAT solver.
//!
//! The `ymsat` crate implements a conflict driven clause learning SAT solver with two-watched
//! literal propagation, VSIDS branching, Luby and geometric restart schedules, assumption based
//! incremental solving with unsatisfiable core extraction, and a Tseitin style encoding front-end
//! for gates, cardinality constraints and bit-vector comparisons.

pub mod config;
pub mod solver;

mod analyze;
mod assumptions;
mod binary;
mod budget;
mod cdcl;
mod clause;
mod context;
mod decision;
mod encoder;
mod load;
mod prop;
mod schedule;
mod simplify;
mod state;
mod tmp;

pub use ymsat_formula::{CnfFormula, Lit, Var};

pub use config::{
    AnalyzerKind, ControllerKind, PolarityMode, SatInitParam, SelectorConfig, SolverConfig,
};
pub use solver::{SolveResult, Solver, SolverError, StopHandle};
pub use state::SolverStats;
