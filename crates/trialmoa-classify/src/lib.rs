//! trialmoa-classify: Trial annotation engine.
//!
//! Stages run in a fixed order per record:
//! - `normalise`: clean raw fields, resolve drug and target aliases, canonicalise phase
//! - `classifier`: ordered first-match-wins target/MOA rules
//! - `innovation`: NOVEL / ESTABLISHED / UNKNOWN from mechanism + signals
//!
//! `pipeline` drives a whole batch with per-row failure isolation;
//! `discovery` and `summary` are analysis helpers around it.

pub mod normalise;
pub mod rules;
pub mod classifier;
pub mod innovation;
pub mod pipeline;
pub mod discovery;
pub mod summary;

pub use classifier::classify;
pub use discovery::{discover_targets, is_valid_target, DiscoveredTarget};
pub use innovation::{assess_innovation, AuxiliarySignals, InnovationTable};
pub use normalise::Normaliser;
pub use pipeline::{run_batch, Annotator, BatchOutcome, RowError, SkippedRow};
pub use rules::{ClassificationRule, Predicate, Ruleset};
pub use summary::Summary;
