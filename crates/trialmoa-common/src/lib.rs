//! trialmoa-common: Shared types, errors, and configuration used across all trialmoa crates.

pub mod error;
pub mod record;
pub mod vocabulary;

// Re-export commonly used types
pub use error::{Result, TrialMoaError};
pub use record::{
    AnnotatedTrial, Classification, ColumnMap, DrugNameSource, Field, InnovationAssessment,
    InnovationBasis, InnovationStatus, NormalizedFields, Phase, RawFields, RawRow, TrialRecord,
    MISSING, UNCLASSIFIED_MOA, UNCLASSIFIED_TARGET,
};
pub use vocabulary::{
    FirstInClassRegistry, InnovationConfig, InnovationEntry, PatternSpec, RuleSpec, Vocabulary,
};
