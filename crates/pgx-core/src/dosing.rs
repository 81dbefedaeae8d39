//! Personalized Dose Adjustment
//!
//! Five independent step-function factors are evaluated in a fixed order,
//! multiplied together, and only then clamped to
//! [`MIN_DOSE_FACTOR`]..=[`MAX_DOSE_FACTOR`]. Individual factors are never
//! clamped on their own.
//!
//! ```
//! use pgx_core::dosing::DoseAdjustmentCalculator;
//! use pgx_core::PatientCovariates;
//!
//! let covariates = PatientCovariates { age: 70.0, egfr: 25.0, ..Default::default() };
//! let dose = DoseAdjustmentCalculator::new().calculate("Warfarin", 200.0, &covariates, 1.0);
//! assert_eq!(dose.recommended_dose, 80.0);
//! ```

use crate::patient::PatientCovariates;
use crate::{round_to, MAX_DOSE_FACTOR, MIN_DOSE_FACTOR};
use serde::{Deserialize, Serialize};

/// Named multiplier in the dose pipeline
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoseFactor {
    Age,
    Weight,
    Renal,
    Hepatic,
    Genetic,
}

impl DoseFactor {
    /// Evaluation order
    pub const PIPELINE: [DoseFactor; 5] = [
        DoseFactor::Age,
        DoseFactor::Weight,
        DoseFactor::Renal,
        DoseFactor::Hepatic,
        DoseFactor::Genetic,
    ];

    pub fn title(self) -> &'static str {
        match self {
            DoseFactor::Age => "Age Factor",
            DoseFactor::Weight => "Weight Factor",
            DoseFactor::Renal => "Renal Factor",
            DoseFactor::Hepatic => "Hepatic Factor",
            DoseFactor::Genetic => "Genetic Factor",
        }
    }

    /// Evaluate this factor. The genetic factor uses the CYP composite score
    /// and is the same for every drug.
    pub fn evaluate(self, covariates: &PatientCovariates, cyp_composite: f64) -> f64 {
        match self {
            DoseFactor::Age => age_factor(covariates.age),
            DoseFactor::Weight => weight_factor(covariates.weight),
            DoseFactor::Renal => renal_factor(covariates.egfr),
            DoseFactor::Hepatic => hepatic_factor(covariates.ast_alt),
            DoseFactor::Genetic => genetic_factor(cyp_composite),
        }
    }
}

impl std::fmt::Display for DoseFactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.title())
    }
}

pub fn age_factor(age: f64) -> f64 {
    if age < 18.0 {
        0.7
    } else if age >= 65.0 {
        0.8
    } else {
        1.0
    }
}

pub fn weight_factor(weight: f64) -> f64 {
    if weight < 50.0 {
        0.8
    } else if weight > 100.0 {
        1.2
    } else {
        1.0
    }
}

/// Renal factor by eGFR. Creatinine does not enter this factor.
pub fn renal_factor(egfr: f64) -> f64 {
    if egfr < 30.0 {
        0.5
    } else if egfr < 60.0 {
        0.7
    } else if egfr < 90.0 {
        0.9
    } else {
        1.0
    }
}

pub fn hepatic_factor(ast_alt: f64) -> f64 {
    if ast_alt > 200.0 {
        0.5
    } else if ast_alt > 100.0 {
        0.7
    } else if ast_alt > 60.0 {
        0.9
    } else {
        1.0
    }
}

pub fn genetic_factor(cyp_composite: f64) -> f64 {
    if cyp_composite < 0.3 {
        0.5
    } else if cyp_composite < 0.7 {
        0.75
    } else if cyp_composite > 1.5 {
        1.25
    } else {
        1.0
    }
}

/// One evaluated pipeline stage
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AppliedFactor {
    pub factor: DoseFactor,
    pub value: f64,
}

/// Monitoring suggested by the size of the dose change
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DosingMonitoring {
    Standard,
    Enhanced,
}

/// Therapeutic drug monitoring advice
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TdmRecommendation {
    Recommended {
        timing: String,
        frequency: String,
        target_levels: String,
    },
    NotRequired {
        rationale: String,
    },
}

impl TdmRecommendation {
    pub fn is_recommended(&self) -> bool {
        matches!(self, TdmRecommendation::Recommended { .. })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DoseRecommendation {
    pub drug: String,
    pub standard_dose: f64,
    /// `standard_dose * final_dose_factor`, one decimal
    pub recommended_dose: f64,
    /// Product of all factors before clamping
    pub composite_factor: f64,
    /// Clamped factor at full precision
    pub final_dose_factor: f64,
    /// Clamped factor rounded to two decimals, as reported
    pub dose_adjustment_factor: f64,
    pub adjustments: Vec<AppliedFactor>,
    pub dosing_rationale: Vec<String>,
    pub monitoring: DosingMonitoring,
    pub tdm: TdmRecommendation,
}

impl DoseRecommendation {
    pub fn factor(&self, factor: DoseFactor) -> Option<f64> {
        self.adjustments
            .iter()
            .find(|a| a.factor == factor)
            .map(|a| a.value)
    }

    /// Number of factors that moved the dose
    pub fn non_unity_count(&self) -> usize {
        self.adjustments.iter().filter(|a| a.value != 1.0).count()
    }
}

/// Evaluates the factor pipeline and applies the safety clamp
#[derive(Clone, Debug)]
pub struct DoseAdjustmentCalculator {
    min_factor: f64,
    max_factor: f64,
}

impl Default for DoseAdjustmentCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl DoseAdjustmentCalculator {
    pub fn new() -> Self {
        DoseAdjustmentCalculator {
            min_factor: MIN_DOSE_FACTOR,
            max_factor: MAX_DOSE_FACTOR,
        }
    }

    pub fn calculate(
        &self,
        drug: &str,
        standard_dose: f64,
        covariates: &PatientCovariates,
        cyp_composite: f64,
    ) -> DoseRecommendation {
        let adjustments: Vec<AppliedFactor> = DoseFactor::PIPELINE
            .into_iter()
            .map(|factor| AppliedFactor {
                factor,
                value: factor.evaluate(covariates, cyp_composite),
            })
            .collect();

        let composite_factor = adjustments.iter().map(|a| a.value).product::<f64>();
        let final_dose_factor = composite_factor.clamp(self.min_factor, self.max_factor);
        let recommended_dose = round_to(standard_dose * final_dose_factor, 1);

        tracing::debug!(
            drug,
            composite_factor,
            final_dose_factor,
            recommended_dose,
            "Dose factors applied"
        );

        let attention = needs_attention(final_dose_factor);

        DoseRecommendation {
            drug: drug.to_string(),
            standard_dose,
            recommended_dose,
            composite_factor,
            final_dose_factor,
            dose_adjustment_factor: round_to(final_dose_factor, 2),
            dosing_rationale: rationale(&adjustments),
            adjustments,
            monitoring: if attention {
                DosingMonitoring::Enhanced
            } else {
                DosingMonitoring::Standard
            },
            tdm: if attention {
                TdmRecommendation::Recommended {
                    timing: "Steady-state (5 half-lives after dose change)".to_string(),
                    frequency: "Weekly initially, then monthly".to_string(),
                    target_levels: "Refer to institutional guidelines".to_string(),
                }
            } else {
                TdmRecommendation::NotRequired {
                    rationale: "Standard dosing - routine monitoring sufficient".to_string(),
                }
            },
        }
    }
}

/// Enhanced monitoring and TDM apply strictly outside [0.7, 1.3].
pub fn needs_attention(final_dose_factor: f64) -> bool {
    final_dose_factor < 0.7 || final_dose_factor > 1.3
}

/// Percentages are rounded to the nearest whole number. Truncating would
/// report a 0.8 factor as 19% because `(1.0 - 0.8) * 100.0` is just below 20.
fn rationale(adjustments: &[AppliedFactor]) -> Vec<String> {
    let lines: Vec<String> = adjustments
        .iter()
        .filter(|a| a.value != 1.0)
        .map(|a| {
            let pct = ((1.0 - a.value).abs() * 100.0).round();
            let direction = if a.value < 1.0 { "reduction" } else { "increase" };
            format!("{}: {}% dose {} recommended", a.factor, pct, direction)
        })
        .collect();

    if lines.is_empty() {
        vec!["Standard dosing appropriate for this patient profile".to_string()]
    } else {
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn covariates(age: f64, weight: f64, egfr: f64, ast_alt: f64) -> PatientCovariates {
        PatientCovariates {
            age,
            weight,
            egfr,
            ast_alt,
            ..PatientCovariates::default()
        }
    }

    #[test]
    fn test_step_functions() {
        assert_eq!(age_factor(10.0), 0.7);
        assert_eq!(age_factor(18.0), 1.0);
        assert_eq!(age_factor(65.0), 0.8);
        assert_eq!(weight_factor(49.9), 0.8);
        assert_eq!(weight_factor(100.0), 1.0);
        assert_eq!(weight_factor(100.1), 1.2);
        assert_eq!(hepatic_factor(60.0), 1.0);
        assert_eq!(hepatic_factor(61.0), 0.9);
        assert_eq!(hepatic_factor(150.0), 0.7);
        assert_eq!(hepatic_factor(250.0), 0.5);
        assert_eq!(genetic_factor(0.2), 0.5);
        assert_eq!(genetic_factor(0.5), 0.75);
        assert_eq!(genetic_factor(1.0), 1.0);
        assert_eq!(genetic_factor(1.5), 1.0);
        assert_eq!(genetic_factor(1.6), 1.25);
    }

    #[test]
    fn test_renal_thresholds() {
        assert_eq!(renal_factor(25.0), 0.5);
        assert_eq!(renal_factor(55.0), 0.7);
        assert_eq!(renal_factor(80.0), 0.9);
        assert_eq!(renal_factor(95.0), 1.0);
    }

    #[test]
    fn test_elderly_renal_impairment_scenario() {
        let dose = DoseAdjustmentCalculator::new().calculate(
            "Warfarin",
            200.0,
            &covariates(70.0, 70.0, 25.0, 30.0),
            1.0,
        );

        assert_eq!(dose.factor(DoseFactor::Age), Some(0.8));
        assert_eq!(dose.factor(DoseFactor::Renal), Some(0.5));
        assert_eq!(dose.factor(DoseFactor::Hepatic), Some(1.0));
        assert_eq!(dose.factor(DoseFactor::Genetic), Some(1.0));
        assert_eq!(dose.factor(DoseFactor::Weight), Some(1.0));
        assert!((dose.final_dose_factor - 0.4).abs() < 1e-12);
        assert_eq!(dose.recommended_dose, 80.0);
        assert_eq!(dose.monitoring, DosingMonitoring::Enhanced);
        assert!(dose.tdm.is_recommended());
        assert_eq!(dose.non_unity_count(), 2);
        assert_eq!(
            dose.dosing_rationale,
            vec![
                "Age Factor: 20% dose reduction recommended",
                "Renal Factor: 50% dose reduction recommended",
            ]
        );
    }

    #[test]
    fn test_neutral_patient() {
        let dose = DoseAdjustmentCalculator::new().calculate(
            "Warfarin",
            5.0,
            &PatientCovariates::default(),
            1.0,
        );
        assert_eq!(dose.final_dose_factor, 1.0);
        assert_eq!(dose.recommended_dose, 5.0);
        assert_eq!(dose.monitoring, DosingMonitoring::Standard);
        assert!(!dose.tdm.is_recommended());
        assert_eq!(
            dose.dosing_rationale,
            vec!["Standard dosing appropriate for this patient profile"]
        );
    }

    #[test]
    fn test_increase_rationale() {
        let dose = DoseAdjustmentCalculator::new().calculate(
            "Warfarin",
            10.0,
            &covariates(40.0, 120.0, 95.0, 30.0),
            2.0,
        );
        // 1.2 * 1.25
        assert!((dose.final_dose_factor - 1.5).abs() < 1e-12);
        assert_eq!(dose.recommended_dose, 15.0);
        assert_eq!(
            dose.dosing_rationale,
            vec![
                "Weight Factor: 20% dose increase recommended",
                "Genetic Factor: 25% dose increase recommended",
            ]
        );
    }

    #[test]
    fn test_attention_threshold_is_strict() {
        assert!(!needs_attention(0.7));
        assert!(!needs_attention(1.3));
        assert!(needs_attention(0.69));
        assert!(needs_attention(1.31));
    }

    #[test]
    fn test_attention_boundaries_through_pipeline() {
        let calc = DoseAdjustmentCalculator::new();
        let cases = [
            // renal 0.7 alone
            (covariates(40.0, 70.0, 55.0, 30.0), 1.0, false),
            // renal 0.7 * hepatic 0.9
            (covariates(40.0, 70.0, 55.0, 61.0), 1.0, true),
            // genetic 1.25 alone
            (covariates(40.0, 70.0, 95.0, 30.0), 2.0, false),
            // weight 1.2 * renal 0.9 * genetic 1.25
            (covariates(40.0, 120.0, 75.0, 30.0), 2.0, true),
        ];

        for (covariates, composite, expected) in cases {
            let dose = calc.calculate("Warfarin", 100.0, &covariates, composite);
            let monitoring = if expected {
                DosingMonitoring::Enhanced
            } else {
                DosingMonitoring::Standard
            };
            assert_eq!(dose.monitoring, monitoring, "factor {}", dose.final_dose_factor);
            assert_eq!(dose.tdm.is_recommended(), expected, "factor {}", dose.final_dose_factor);
        }
    }

    #[test]
    fn test_rationale_percentages_are_rounded() {
        let dose = DoseAdjustmentCalculator::new().calculate(
            "Warfarin",
            100.0,
            &covariates(70.0, 70.0, 75.0, 30.0),
            1.0,
        );
        assert_eq!(
            dose.dosing_rationale,
            vec![
                "Age Factor: 20% dose reduction recommended",
                "Renal Factor: 10% dose reduction recommended",
            ]
        );
    }

    #[test]
    fn test_clamp_applies_after_composition() {
        // 0.7 * 0.8 * 0.5 * 0.5 * 0.5 = 0.07
        let dose = DoseAdjustmentCalculator::new().calculate(
            "Warfarin",
            100.0,
            &covariates(10.0, 40.0, 10.0, 300.0),
            0.0,
        );
        assert!((dose.composite_factor - 0.07).abs() < 1e-12);
        assert_eq!(dose.final_dose_factor, MIN_DOSE_FACTOR);
        assert_eq!(dose.recommended_dose, 10.0);
    }

    #[test]
    fn test_tdm_serializes_with_status() {
        let tdm = TdmRecommendation::NotRequired {
            rationale: "x".to_string(),
        };
        let json = serde_json::to_value(&tdm).unwrap();
        assert_eq!(json["status"], "not_required");
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn final_factor_stays_in_bounds(
                age in 0.0f64..130.0,
                weight in 1.0f64..300.0,
                egfr in 0.0f64..150.0,
                ast_alt in 0.0f64..500.0,
                composite in 0.0f64..2.5,
                standard_dose in 0.1f64..2000.0,
            ) {
                let dose = DoseAdjustmentCalculator::new().calculate(
                    "Drug",
                    standard_dose,
                    &covariates(age, weight, egfr, ast_alt),
                    composite,
                );
                prop_assert!(dose.final_dose_factor >= MIN_DOSE_FACTOR);
                prop_assert!(dose.final_dose_factor <= MAX_DOSE_FACTOR);
                // one-decimal rounding of the dose
                let expected = standard_dose * dose.final_dose_factor;
                prop_assert!((dose.recommended_dose - expected).abs() <= 0.05 + 1e-9);
            }

            #[test]
            fn renal_factor_is_monotonic(a in 0.0f64..200.0, b in 0.0f64..200.0) {
                let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
                prop_assert!(renal_factor(lo) <= renal_factor(hi));
            }
        }
    }
}
