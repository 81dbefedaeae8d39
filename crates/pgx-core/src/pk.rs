//! Bayesian Pharmacokinetic Optimization
//!
//! One-compartment, first-order elimination model with a single-observation
//! clearance update. The update is a ratio heuristic: the most recent
//! measured level is compared with `dose / clearance` and clearance is
//! rescaled by that ratio. It is not a posterior estimate.
//!
//! Population priors come from a [`PkPriorTable`]. Drugs without a prior
//! produce [`PkOptimization::Unavailable`] and nothing else is computed.

use crate::patient::PatientCovariates;
use crate::{round_to, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// ln(2), as used for half-life
pub const LN2: f64 = 0.693;

/// Reference body weight for weight scaling (kg)
pub const REFERENCE_WEIGHT_KG: f64 = 70.0;

/// Sampling grid for the predicted concentration profile (hours)
pub const PROFILE_TIMES: [f64; 6] = [0.0, 2.0, 4.0, 8.0, 12.0, 24.0];

/// Reason reported when a drug has no population prior
pub const PARAMETERS_UNAVAILABLE: &str = "Population PK parameters not available for this medication";

// =============================================================================
// Population priors
// =============================================================================

/// Therapeutic concentration window
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TargetWindow {
    pub min: f64,
    pub max: f64,
    #[serde(default)]
    pub unit: String,
}

impl TargetWindow {
    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }
}

/// Population clearance, volume and target window for one drug
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PopulationPrior {
    pub clearance: f64,
    pub volume: f64,
    #[serde(alias = "target_concentration")]
    pub target: TargetWindow,
}

/// Drug name → population prior. Lookups ignore ASCII case and surrounding whitespace.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PkPriorTable {
    priors: BTreeMap<String, PopulationPrior>,
}

impl PkPriorTable {
    /// Built-in priors for Warfarin, Digoxin and Phenytoin
    pub fn standard() -> Self {
        let mut table = PkPriorTable::default();
        table.insert("Warfarin", PopulationPrior {
            clearance: 0.045,
            volume: 0.14,
            target: TargetWindow { min: 1.0, max: 3.0, unit: "mg/L".to_string() },
        });
        table.insert("Digoxin", PopulationPrior {
            clearance: 1.2,
            volume: 7.3,
            target: TargetWindow { min: 1.0, max: 2.0, unit: "ng/mL".to_string() },
        });
        table.insert("Phenytoin", PopulationPrior {
            clearance: 0.04,
            volume: 0.65,
            target: TargetWindow { min: 10.0, max: 20.0, unit: "mg/L".to_string() },
        });
        table
    }

    /// Parse a JSON object of `{ "<drug>": { clearance, volume, target } }`
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Add or replace a prior. Replaces any entry whose name matches ignoring case.
    pub fn insert(&mut self, drug: &str, prior: PopulationPrior) {
        let drug = drug.trim();
        self.priors.retain(|name, _| !name.eq_ignore_ascii_case(drug));
        self.priors.insert(drug.to_string(), prior);
    }

    /// Overlay `other` on this table; entries in `other` win.
    pub fn merge(&mut self, other: PkPriorTable) {
        for (drug, prior) in other.priors {
            self.insert(&drug, prior);
        }
    }

    pub fn get(&self, drug: &str) -> Option<&PopulationPrior> {
        let drug = drug.trim();
        self.priors
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(drug))
            .map(|(_, prior)| prior)
    }

    pub fn drugs(&self) -> impl Iterator<Item = &str> {
        self.priors.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.priors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.priors.is_empty()
    }
}

// =============================================================================
// PK state
// =============================================================================

/// Clearance and volume for one (patient, drug) computation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PkState {
    pub clearance: f64,
    pub volume: f64,
}

/// Outcome of the single-observation update
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpdateSummary {
    pub applied: bool,
    pub latest_level: Option<f64>,
    pub predicted_level: Option<f64>,
    pub adjustment_factor: f64,
}

impl PkState {
    /// Scale population values by age, weight and renal function.
    pub fn individualize(prior: &PopulationPrior, covariates: &PatientCovariates) -> Self {
        let age_factor = if covariates.age >= 65.0 { 0.8 } else { 1.0 };
        let weight_factor = covariates.weight / REFERENCE_WEIGHT_KG;
        let renal_factor = if covariates.creatinine > 1.2 { 0.7 } else { 1.0 };

        PkState {
            clearance: prior.clearance * age_factor * weight_factor * renal_factor,
            volume: prior.volume * weight_factor,
        }
    }

    /// `0.693 * V / CL`; `None` when either parameter is not positive
    pub fn half_life(&self) -> Option<f64> {
        if self.clearance > 0.0 && self.volume > 0.0 {
            Some(LN2 * self.volume / self.clearance)
        } else {
            None
        }
    }

    /// Rescale clearance from the most recent measured level.
    ///
    /// No levels leaves the state untouched. A non-positive prediction or a
    /// non-positive ratio falls back to an adjustment of 1.0.
    pub fn bayesian_update(&mut self, measured_levels: &[f64], current_dose: f64) -> UpdateSummary {
        let Some(&latest) = measured_levels.last() else {
            return UpdateSummary {
                applied: false,
                latest_level: None,
                predicted_level: None,
                adjustment_factor: 1.0,
            };
        };

        let predicted = if self.clearance > 0.0 {
            current_dose / self.clearance
        } else {
            0.0
        };

        let ratio = if predicted > 0.0 { latest / predicted } else { 1.0 };
        let adjustment_factor = if ratio.is_finite() && ratio > 0.0 { ratio } else { 1.0 };

        if adjustment_factor != 1.0 {
            self.clearance /= adjustment_factor;
        }

        UpdateSummary {
            applied: adjustment_factor != 1.0,
            latest_level: Some(latest),
            predicted_level: (predicted > 0.0).then_some(predicted),
            adjustment_factor,
        }
    }
}

// =============================================================================
// Optimization output
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConcentrationProfile {
    pub dose: f64,
    pub times: Vec<f64>,
    pub concentrations: Vec<f64>,
}

impl ConcentrationProfile {
    /// `C(t) = (dose / V) * exp(-t / t½)`, zero at t = 0, two decimals
    pub fn predict(state: &PkState, dose: f64) -> Option<Self> {
        let half_life = state.half_life()?;
        let concentrations = PROFILE_TIMES
            .iter()
            .map(|&t| {
                if t == 0.0 {
                    0.0
                } else {
                    round_to((dose / state.volume) * (-t / half_life).exp(), 2)
                }
            })
            .collect();

        Some(ConcentrationProfile {
            dose,
            times: PROFILE_TIMES.to_vec(),
            concentrations,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SamplingRecommendation {
    pub recommended_time: String,
    pub steady_state_hours: f64,
    pub rationale: String,
    pub alternative_times: Vec<String>,
}

impl SamplingRecommendation {
    pub fn from_half_life(half_life: f64) -> Self {
        let steady_state = 5.0 * half_life;
        SamplingRecommendation {
            recommended_time: format!("{:.1} hours after dose change", steady_state),
            steady_state_hours: steady_state,
            rationale: "Steady-state achievement for accurate assessment".to_string(),
            alternative_times: vec![
                format!("{:.1}h (early assessment)", 2.0 * half_life),
                format!("{:.1}h (intermediate)", 3.0 * half_life),
            ],
        }
    }
}

/// Population-variability band around the optimized dose
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PredictionConfidence {
    pub confidence_level: String,
    pub lower_bound: f64,
    pub upper_bound: f64,
    /// Optimized dose scaled by the bounds
    pub dose_range: Option<(f64, f64)>,
    pub note: String,
}

impl PredictionConfidence {
    fn around(optimized_dose: Option<f64>) -> Self {
        let (lower_bound, upper_bound) = (0.8, 1.2);
        PredictionConfidence {
            confidence_level: "95%".to_string(),
            lower_bound,
            upper_bound,
            dose_range: optimized_dose
                .map(|d| (round_to(d * lower_bound, 1), round_to(d * upper_bound, 1))),
            note: "Confidence intervals based on population variability".to_string(),
        }
    }
}

/// Full PK result for a drug with a population prior
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PkEstimate {
    pub drug: String,
    pub current_dose: f64,
    pub individual: PkState,
    pub updated: PkState,
    pub half_life_hours: Option<f64>,
    pub update: UpdateSummary,
    pub target: TargetWindow,
    pub optimized_dose: Option<f64>,
    pub predicted_levels: Option<ConcentrationProfile>,
    pub confidence_interval: PredictionConfidence,
    pub next_sampling: Option<SamplingRecommendation>,
    pub clinical_interpretation: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PkOptimization {
    Unavailable { drug: String, error: String },
    Optimized(Box<PkEstimate>),
}

impl PkOptimization {
    pub fn estimate(&self) -> Option<&PkEstimate> {
        match self {
            PkOptimization::Optimized(estimate) => Some(estimate),
            PkOptimization::Unavailable { .. } => None,
        }
    }

    pub fn optimized_dose(&self) -> Option<f64> {
        self.estimate().and_then(|e| e.optimized_dose)
    }

    pub fn is_available(&self) -> bool {
        self.estimate().is_some()
    }
}

// =============================================================================
// Optimizer
// =============================================================================

pub struct BayesianPkOptimizer<'a> {
    priors: &'a PkPriorTable,
}

impl<'a> BayesianPkOptimizer<'a> {
    pub fn new(priors: &'a PkPriorTable) -> Self {
        BayesianPkOptimizer { priors }
    }

    /// Individualize, update from the latest level, and optimize for the target midpoint.
    ///
    /// The predicted profile, the sampling plan and `half_life_hours` all use
    /// the half-life of the *updated* state, not the pre-update individual
    /// half-life. The two differ whenever a measured level moved clearance.
    pub fn optimize(
        &self,
        drug: &str,
        covariates: &PatientCovariates,
        current_dose: f64,
        measured_levels: &[f64],
    ) -> PkOptimization {
        let Some(prior) = self.priors.get(drug) else {
            tracing::warn!(drug, "No population PK prior");
            return PkOptimization::Unavailable {
                drug: drug.to_string(),
                error: PARAMETERS_UNAVAILABLE.to_string(),
            };
        };

        let mut state = PkState::individualize(prior, covariates);
        let individual = state.clone();
        let update = state.bayesian_update(measured_levels, current_dose);

        let target_level = prior.target.midpoint();
        let optimized_dose = if target_level > 0.0 && state.clearance > 0.0 {
            Some(round_to(target_level * state.clearance, 1))
        } else {
            None
        };

        let half_life = state.half_life();
        let profile_dose = optimized_dose.unwrap_or(current_dose);

        tracing::debug!(
            drug,
            clearance = state.clearance,
            volume = state.volume,
            adjustment_factor = update.adjustment_factor,
            ?optimized_dose,
            "PK estimate updated"
        );

        PkOptimization::Optimized(Box::new(PkEstimate {
            drug: drug.to_string(),
            current_dose,
            predicted_levels: ConcentrationProfile::predict(&state, profile_dose),
            next_sampling: half_life.map(SamplingRecommendation::from_half_life),
            clinical_interpretation: interpret_level(measured_levels.last().copied(), &prior.target),
            confidence_interval: PredictionConfidence::around(optimized_dose),
            half_life_hours: half_life,
            individual,
            updated: state,
            update,
            target: prior.target.clone(),
            optimized_dose,
        }))
    }
}

/// Compare the latest measured level with the therapeutic window
pub fn interpret_level(latest: Option<f64>, target: &TargetWindow) -> String {
    match latest {
        None => "Insufficient data for interpretation".to_string(),
        Some(level) if level < target.min => {
            format!("Subtherapeutic level ({}) - consider dose increase", level)
        }
        Some(level) if level > target.max => {
            format!("Supratherapeutic level ({}) - consider dose reduction", level)
        }
        Some(level) => format!("Therapeutic level ({}) - continue current dose", level),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn elderly() -> PatientCovariates {
        PatientCovariates {
            age: 70.0,
            weight: 80.0,
            creatinine: 1.5,
            ..PatientCovariates::default()
        }
    }

    #[test]
    fn test_unknown_drug_is_unavailable() {
        let priors = PkPriorTable::standard();
        let result = BayesianPkOptimizer::new(&priors).optimize(
            "Metformin",
            &PatientCovariates::default(),
            500.0,
            &[1.0],
        );
        assert!(!result.is_available());
        assert!(result.optimized_dose().is_none());
        match result {
            PkOptimization::Unavailable { error, .. } => assert_eq!(error, PARAMETERS_UNAVAILABLE),
            other => panic!("expected Unavailable, got {:?}", other),
        }
    }

    #[test]
    fn test_individualize() {
        let priors = PkPriorTable::standard();
        let prior = priors.get("Digoxin").unwrap();
        let state = PkState::individualize(prior, &elderly());

        let wf = 80.0 / 70.0;
        assert!((state.clearance - 1.2 * 0.8 * wf * 0.7).abs() < 1e-12);
        assert!((state.volume - 7.3 * wf).abs() < 1e-12);
        let hl = state.half_life().unwrap();
        assert!((hl - 0.693 * state.volume / state.clearance).abs() < 1e-12);
    }

    #[test]
    fn test_no_levels_leaves_state_unchanged() {
        let priors = PkPriorTable::standard();
        let result = BayesianPkOptimizer::new(&priors).optimize("Warfarin", &elderly(), 5.0, &[]);
        let estimate = result.estimate().unwrap();

        let expected = PkState::individualize(priors.get("Warfarin").unwrap(), &elderly());
        assert_eq!(estimate.individual, expected);
        assert_eq!(estimate.updated, expected);
        assert!(!estimate.update.applied);
        assert_eq!(estimate.clinical_interpretation, "Insufficient data for interpretation");
    }

    #[test]
    fn test_update_rescales_clearance() {
        let mut state = PkState { clearance: 2.0, volume: 10.0 };
        // predicted = 100 / 2 = 50, measured 25 -> factor 0.5
        let update = state.bayesian_update(&[80.0, 25.0], 100.0);
        assert!(update.applied);
        assert_eq!(update.predicted_level, Some(50.0));
        assert_eq!(update.adjustment_factor, 0.5);
        assert_eq!(state.clearance, 4.0);
        assert_eq!(state.volume, 10.0);
        // half-life follows the updated clearance
        assert!((state.half_life().unwrap() - 0.693 * 10.0 / 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_update_guards_degenerate_values() {
        let mut state = PkState { clearance: 0.0, volume: 10.0 };
        let update = state.bayesian_update(&[5.0], 100.0);
        assert!(!update.applied);
        assert_eq!(update.adjustment_factor, 1.0);
        assert_eq!(state.clearance, 0.0);
        assert!(state.half_life().is_none());

        let mut state = PkState { clearance: 2.0, volume: 10.0 };
        let update = state.bayesian_update(&[0.0], 100.0);
        assert_eq!(update.adjustment_factor, 1.0);
        assert_eq!(state.clearance, 2.0);
    }

    #[test]
    fn test_sampling_follows_updated_half_life() {
        let priors = PkPriorTable::standard();
        let result = BayesianPkOptimizer::new(&priors).optimize(
            "Digoxin",
            &PatientCovariates::default(),
            0.25,
            &[0.1],
        );
        let estimate = result.estimate().unwrap();
        assert!(estimate.update.applied);

        let updated_hl = estimate.updated.half_life().unwrap();
        let individual_hl = estimate.individual.half_life().unwrap();
        assert!((updated_hl - individual_hl).abs() > 1.0);

        assert_eq!(estimate.half_life_hours, Some(updated_hl));
        let sampling = estimate.next_sampling.as_ref().unwrap();
        assert!((sampling.steady_state_hours - 5.0 * updated_hl).abs() < 1e-9);
    }

    #[test]
    fn test_optimized_dose_targets_midpoint() {
        let priors = PkPriorTable::standard();
        let covariates = PatientCovariates::default();
        let result = BayesianPkOptimizer::new(&priors).optimize("Digoxin", &covariates, 0.25, &[]);
        let estimate = result.estimate().unwrap();

        // midpoint 1.5 * clearance 1.2
        assert_eq!(estimate.optimized_dose, Some(1.8));
        let (lo, hi) = estimate.confidence_interval.dose_range.unwrap();
        assert_eq!((lo, hi), (1.4, 2.2));

        let profile = estimate.predicted_levels.as_ref().unwrap();
        assert_eq!(profile.times, PROFILE_TIMES.to_vec());
        assert_eq!(profile.concentrations[0], 0.0);
        assert!(profile.concentrations.windows(2).skip(1).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_sampling_text() {
        let sampling = SamplingRecommendation::from_half_life(10.0);
        assert_eq!(sampling.recommended_time, "50.0 hours after dose change");
        assert_eq!(
            sampling.alternative_times,
            vec!["20.0h (early assessment)", "30.0h (intermediate)"]
        );
    }

    #[test]
    fn test_interpretation() {
        let window = TargetWindow { min: 10.0, max: 20.0, unit: "mg/L".to_string() };
        assert_eq!(
            interpret_level(Some(8.5), &window),
            "Subtherapeutic level (8.5) - consider dose increase"
        );
        assert_eq!(
            interpret_level(Some(25.5), &window),
            "Supratherapeutic level (25.5) - consider dose reduction"
        );
        assert_eq!(
            interpret_level(Some(15.5), &window),
            "Therapeutic level (15.5) - continue current dose"
        );
    }

    #[test]
    fn test_prior_table_lookup_and_merge() {
        let mut table = PkPriorTable::standard();
        assert!(table.get("warfarin").is_some());
        assert!(table.get(" DIGOXIN ").is_some());

        let extra = PkPriorTable::from_json_str(
            r#"{
                "Vancomycin": { "clearance": 0.05, "volume": 0.7,
                                "target_concentration": { "min": 10, "max": 20, "unit": "mg/L" } },
                "warfarin": { "clearance": 0.05, "volume": 0.15,
                              "target": { "min": 2.0, "max": 3.0 } }
            }"#,
        )
        .unwrap();
        table.merge(extra);

        assert_eq!(table.len(), 4);
        assert_eq!(table.get("Vancomycin").unwrap().target.max, 20.0);
        assert_eq!(table.get("Warfarin").unwrap().clearance, 0.05);
    }

    #[test]
    fn test_prior_table_rejects_bad_json() {
        assert!(PkPriorTable::from_json_str("[1, 2]").is_err());
    }

    #[test]
    fn test_serializes_status_tag() {
        let priors = PkPriorTable::standard();
        let result =
            BayesianPkOptimizer::new(&priors).optimize("Aspirin", &PatientCovariates::default(), 1.0, &[]);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "unavailable");
    }
}
