//! PGx Core - Pharmacogenomic Dosing and Risk Stratification
//!
//! Pure Rust engine that turns a patient's organ-function markers,
//! drug-metabolizing enzyme and transporter genotypes, HLA typing and a
//! candidate drug into a personalized, bounded dosing recommendation.
//!
//! # Features
//!
//! - CYP450 activity scoring (CYP2C9, CYP2D6, CYP3A4, CYP1A2, CYP2B6, CYP2C19)
//! - Drug transporter disposition risk (SLCO1B1, ABCB1, ABCG2)
//! - HLA hypersensitivity screening with drug-specific contraindications
//! - Multiplicative dose-factor pipeline clamped to a safety range
//! - Single-observation Bayesian PK re-estimation for TDM
//! - Overall genetic risk, dosing complexity, monitoring and actionability tiers
//!
//! Every assessment is a deterministic computation over structured input.
//! Reference tables are built once and shared read-only through [`PgxEngine`].
//!
//! # Example
//!
//! ```rust
//! use pgx_core::{AssessmentRequest, PgxEngine, RiskTier};
//!
//! let engine = PgxEngine::standard();
//!
//! let mut request = AssessmentRequest::new("Abacavir", 300.0);
//! request.hla.hla_b.push("HLA-B*5701".to_string());
//!
//! let report = engine.assess(&request);
//! assert_eq!(report.hla.overall_hypersensitivity_risk, RiskTier::Critical);
//! ```

pub mod aggregate;
pub mod catalog;
pub mod cyp;
pub mod dosing;
pub mod engine;
pub mod hla;
pub mod interactions;
pub mod labs;
pub mod patient;
pub mod pk;
pub mod transporter;

#[cfg(feature = "parallel")]
pub mod batch;

// Re-export commonly used types for convenience
pub use aggregate::{PrecisionSummary, RiskAggregator};
pub use catalog::{CypEnzyme, DrugAlleleAssociation, GenotypeActivityCatalog, Subject, Transporter};
pub use cyp::{CypAnalysis, CypMetabolismAnalyzer};
pub use dosing::{DoseAdjustmentCalculator, DoseFactor, DoseRecommendation};
pub use engine::{AssessmentReport, PgxEngine};
pub use hla::{HlaHypersensitivityScreener, HlaScreening};
pub use patient::{AlleleSet, AssessmentRequest, GenotypeProfile, PatientCovariates, Sex};
pub use pk::{BayesianPkOptimizer, PkOptimization, PkPriorTable, PkState};
pub use transporter::{TransporterAnalysis, TransporterDispositionAnalyzer};

use serde::{Deserialize, Serialize};

/// Lower bound of the composite dose factor (10% of standard dose)
pub const MIN_DOSE_FACTOR: f64 = 0.1;

/// Upper bound of the composite dose factor (200% of standard dose)
pub const MAX_DOSE_FACTOR: f64 = 2.0;

/// Result type for PGx operations
pub type Result<T> = std::result::Result<T, PgxError>;

/// Errors raised at the boundary of the engine.
///
/// Assessment itself never fails; these cover request validation and
/// loading of external reference data.
#[derive(Debug, thiserror::Error)]
pub enum PgxError {
    #[error("Invalid assessment request: {}", .0.join("; "))]
    InvalidInput(Vec<String>),

    #[error("Unknown enzyme or transporter: {0}")]
    UnknownGenotypeSubject(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Four-level risk tier shared by every analyzer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskTier {
    Low,
    Moderate,
    High,
    Critical,
}

impl RiskTier {
    /// Tier for a single enzyme activity score.
    ///
    /// Enhanced metabolism (>= 1.5) is labelled `Moderate`, the same tier
    /// used for mild impairment elsewhere.
    pub fn from_enzyme_activity(score: f64) -> Self {
        if score <= 0.2 {
            RiskTier::Critical
        } else if score <= 0.5 {
            RiskTier::High
        } else if score >= 1.5 {
            RiskTier::Moderate
        } else {
            RiskTier::Low
        }
    }

    /// Tier for the composite (mean) CYP metabolism score
    pub fn from_composite_score(score: f64) -> Self {
        if score <= 0.3 {
            RiskTier::Critical
        } else if score <= 0.6 {
            RiskTier::High
        } else if score >= 1.5 {
            RiskTier::Moderate
        } else {
            RiskTier::Low
        }
    }

    /// True for High and Critical
    pub fn is_severe(&self) -> bool {
        matches!(self, RiskTier::High | RiskTier::Critical)
    }
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskTier::Low => write!(f, "Low"),
            RiskTier::Moderate => write!(f, "Moderate"),
            RiskTier::High => write!(f, "High"),
            RiskTier::Critical => write!(f, "Critical"),
        }
    }
}

/// Round half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// Serde helpers that round scores for display without touching the
/// full-precision values used for thresholds.
pub(crate) mod display {
    use serde::Serializer;

    pub fn two_decimals<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(super::round_to(*value, 2))
    }

    pub fn two_decimals_opt<S: Serializer>(
        value: &Option<f64>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.serialize_some(&super::round_to(*v, 2)),
            None => serializer.serialize_none(),
        }
    }
}
