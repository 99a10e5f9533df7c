//! Model transformations for bilevel and multi-scenario LP/MILP formulations.
//!
//! A typical pipeline derives the dual of an inner LP, merges it back with a
//! duality-gap row, and then turns selected coefficients into decisions, either
//! as digit expansions ([`RadixLinearizer`]) or as two-regime switches
//! ([`DisjunctiveEncoder`]). [`ScenarioStack`] repeats a model per scenario over
//! one canonical model so that decision binaries are shared.

mod disjunctive;
mod dual;
mod error;
mod gap;
mod links;
mod quadratic;
mod radix;
mod scenario;

pub use disjunctive::{indicator_id, DisjunctiveEncoder, DisjunctivePair};
pub use dual::{dual_constraint_id, wa_id, wl_id, wu_id, DualityTransformer, DEFAULT_INFINITY};
pub use error::TransformError;
pub use gap::DualityGapComposer;
pub use quadratic::QuadraticObjectiveAssembler;
pub use radix::{binary_id, slice_id, Digits, GroupTerm, RadixLinearizer};
pub use scenario::{clone_with_suffix, scenario_suffix, split_scenarios, BoundOverride, ScenarioStack};
