//! Precision-medicine summary
//!
//! Integer point scores over the analyzer outputs, each mapped to a tier
//! with fixed clinical text. The dose factor used here is the reported
//! (two-decimal) `dose_adjustment_factor`.

use crate::catalog::TransporterRisk;
use crate::cyp::{clinical_impact, CypAnalysis};
use crate::dosing::DoseRecommendation;
use crate::hla::HlaScreening;
use crate::transporter::TransporterAnalysis;
use crate::RiskTier;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneticRisk {
    pub risk_score: u32,
    pub risk_category: RiskTier,
    pub contributing_factors: Vec<String>,
    pub clinical_significance: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DosingComplexity {
    pub complexity_score: u32,
    /// Low, Moderate or High
    pub complexity_level: RiskTier,
    pub contributing_factors: Vec<String>,
    pub clinical_implications: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MonitoringIntensity {
    Standard,
    Enhanced,
    Intensive,
}

impl MonitoringIntensity {
    pub fn frequency(self) -> &'static str {
        match self {
            MonitoringIntensity::Intensive => "Daily to weekly",
            MonitoringIntensity::Enhanced => "Weekly to bi-weekly",
            MonitoringIntensity::Standard => "Monthly",
        }
    }

    pub fn protocols(self) -> [&'static str; 4] {
        match self {
            MonitoringIntensity::Intensive => [
                "Daily clinical assessment for first week",
                "Laboratory monitoring every 2-3 days initially",
                "Vital signs monitoring every 4-6 hours",
                "Immediate availability of antidotes/interventions",
            ],
            MonitoringIntensity::Enhanced => [
                "Clinical assessment 2-3 times per week initially",
                "Laboratory monitoring weekly for first month",
                "Vital signs monitoring daily",
                "Patient education on warning signs",
            ],
            MonitoringIntensity::Standard => [
                "Routine clinical follow-up",
                "Standard laboratory monitoring intervals",
                "Patient self-monitoring as appropriate",
                "Standard safety protocols",
            ],
        }
    }
}

impl std::fmt::Display for MonitoringIntensity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MonitoringIntensity::Standard => write!(f, "Standard"),
            MonitoringIntensity::Enhanced => write!(f, "Enhanced"),
            MonitoringIntensity::Intensive => write!(f, "Intensive"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MonitoringPlan {
    pub monitoring_score: u32,
    pub intensity_level: MonitoringIntensity,
    pub recommended_frequency: String,
    pub specific_requirements: Vec<String>,
    pub clinical_protocols: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImplementationPriority {
    pub timeline: String,
    pub actions: Vec<String>,
    pub stakeholders: Vec<String>,
}

impl ImplementationPriority {
    fn for_tier(tier: RiskTier) -> Self {
        let (timeline, actions, stakeholders): (&str, &[&str], &[&str]) = match tier {
            RiskTier::Critical => (
                "Immediate (within hours)",
                &[
                    "Stop current medication if contraindicated",
                    "Implement alternative therapy",
                    "Intensive monitoring",
                ],
                &["Prescribing physician", "Clinical pharmacist", "Nursing staff", "Patient/family"],
            ),
            RiskTier::High => (
                "24-48 hours",
                &["Adjust dosing regimen", "Enhance monitoring protocols", "Patient education"],
                &["Prescribing physician", "Clinical pharmacist", "Patient"],
            ),
            RiskTier::Moderate => (
                "1 week",
                &[
                    "Consider dosing modifications",
                    "Implement precautionary monitoring",
                    "Document findings",
                ],
                &["Prescribing physician", "Patient"],
            ),
            RiskTier::Low => (
                "Next routine visit",
                &["Document findings", "Continue standard protocols"],
                &["Healthcare team"],
            ),
        };
        ImplementationPriority {
            timeline: timeline.to_string(),
            actions: actions.iter().map(|s| s.to_string()).collect(),
            stakeholders: stakeholders.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClinicalActionability {
    pub actionability_score: u32,
    pub actionability_level: RiskTier,
    pub urgency_level: String,
    pub actionable_findings: Vec<String>,
    pub implementation_priority: ImplementationPriority,
}

/// All four summary tiers
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrecisionSummary {
    pub overall_genetic_risk: GeneticRisk,
    pub dosing_complexity: DosingComplexity,
    pub monitoring_intensity: MonitoringPlan,
    pub clinical_actionability: ClinicalActionability,
}

/// Combines the analyzer outputs into the summary tiers
#[derive(Clone, Copy, Debug, Default)]
pub struct RiskAggregator;

impl RiskAggregator {
    pub fn new() -> Self {
        RiskAggregator
    }

    pub fn summarize(
        &self,
        cyp: &CypAnalysis,
        transporters: &TransporterAnalysis,
        hla: &HlaScreening,
        dose: &DoseRecommendation,
    ) -> PrecisionSummary {
        PrecisionSummary {
            overall_genetic_risk: self.genetic_risk(cyp, transporters, hla),
            dosing_complexity: self.dosing_complexity(dose),
            monitoring_intensity: self.monitoring_intensity(cyp, transporters, dose),
            clinical_actionability: self.actionability(cyp, hla, dose),
        }
    }

    pub fn genetic_risk(
        &self,
        cyp: &CypAnalysis,
        transporters: &TransporterAnalysis,
        hla: &HlaScreening,
    ) -> GeneticRisk {
        let mut score = 0;
        let mut factors = Vec::new();

        for finding in &cyp.enzymes {
            let (points, label) = match finding.risk_level {
                RiskTier::Critical => (3, "Critical impairment"),
                RiskTier::High => (2, "High risk"),
                RiskTier::Moderate => (1, "Moderate risk"),
                RiskTier::Low => continue,
            };
            score += points;
            factors.push(format!("{}: {}", finding.enzyme, label));
        }

        for finding in &transporters.transporters {
            let (points, label) = match finding.risk_category {
                TransporterRisk::High => (2, "High transport risk"),
                TransporterRisk::Intermediate => (1, "Intermediate transport risk"),
                TransporterRisk::Low => continue,
            };
            score += points;
            factors.push(format!("{}: {}", finding.transporter, label));
        }

        if hla.overall_hypersensitivity_risk == RiskTier::Critical {
            score += 5;
            factors.push("HLA: Critical hypersensitivity risk".to_string());
        } else if hla.has_risk_alleles() {
            score += 2;
            factors.push("HLA: High-risk alleles present".to_string());
        }

        let category = if score >= 8 {
            RiskTier::Critical
        } else if score >= 5 {
            RiskTier::High
        } else if score >= 2 {
            RiskTier::Moderate
        } else {
            RiskTier::Low
        };

        GeneticRisk {
            risk_score: score,
            risk_category: category,
            contributing_factors: factors,
            clinical_significance: match category {
                RiskTier::Critical => {
                    "Genetic factors pose severe ADR risk - immediate intervention required"
                }
                RiskTier::High => {
                    "Significant genetic risk factors identified - enhanced monitoring needed"
                }
                RiskTier::Moderate => "Some genetic risk factors present - consider precautions",
                RiskTier::Low => "Minimal genetic risk factors - standard protocols appropriate",
            }
            .to_string(),
        }
    }

    pub fn dosing_complexity(&self, dose: &DoseRecommendation) -> DosingComplexity {
        let factor = dose.dose_adjustment_factor;
        let mut score = 0;
        let mut factors = Vec::new();

        if factor <= 0.5 {
            score += 3;
            factors.push("Major dose reduction required".to_string());
        } else if factor <= 0.7 {
            score += 2;
            factors.push("Moderate dose reduction required".to_string());
        } else if factor >= 1.5 {
            score += 2;
            factors.push("Dose increase required".to_string());
        }

        score += dose.non_unity_count() as u32;

        if dose.tdm.is_recommended() {
            score += 2;
            factors.push("Therapeutic drug monitoring required".to_string());
        }

        let level = if score >= 6 {
            RiskTier::High
        } else if score >= 3 {
            RiskTier::Moderate
        } else {
            RiskTier::Low
        };

        DosingComplexity {
            complexity_score: score,
            complexity_level: level,
            contributing_factors: factors,
            clinical_implications: match level {
                RiskTier::High | RiskTier::Critical => {
                    "Complex dosing regimen requires specialist consultation and intensive monitoring"
                }
                RiskTier::Moderate => "Moderate dosing adjustments needed with enhanced follow-up",
                RiskTier::Low => "Standard dosing protocols with routine monitoring appropriate",
            }
            .to_string(),
        }
    }

    pub fn monitoring_intensity(
        &self,
        cyp: &CypAnalysis,
        transporters: &TransporterAnalysis,
        dose: &DoseRecommendation,
    ) -> MonitoringPlan {
        let mut score = 0;
        let mut requirements = Vec::new();

        let composite = cyp.composite_score;
        if composite <= 0.3 {
            score += 3;
            requirements.push("Intensive CYP-related monitoring".to_string());
        } else if composite <= 0.7 || composite >= 1.5 {
            score += 2;
            requirements.push("Enhanced CYP-related monitoring".to_string());
        }

        let high_risk = transporters.high_risk_count as u32;
        score += high_risk;
        if high_risk > 0 {
            requirements.push("Transporter-related monitoring required".to_string());
        }

        if is_large_adjustment(dose.dose_adjustment_factor) {
            score += 2;
            requirements.push("Dose adjustment monitoring".to_string());
        }

        let intensity = if score >= 6 {
            MonitoringIntensity::Intensive
        } else if score >= 3 {
            MonitoringIntensity::Enhanced
        } else {
            MonitoringIntensity::Standard
        };

        MonitoringPlan {
            monitoring_score: score,
            intensity_level: intensity,
            recommended_frequency: intensity.frequency().to_string(),
            specific_requirements: requirements,
            clinical_protocols: intensity.protocols().iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn actionability(
        &self,
        cyp: &CypAnalysis,
        hla: &HlaScreening,
        dose: &DoseRecommendation,
    ) -> ClinicalActionability {
        let mut score = 0;
        let mut findings = Vec::new();

        for finding in cyp.enzymes.iter().filter(|f| f.risk_level.is_severe()) {
            score += 2;
            findings.push(format!("{}: {}", finding.enzyme, clinical_impact(finding.risk_level)));
        }

        if hla.has_contraindication() {
            score += 5;
            findings.push("HLA: Drug contraindication identified".to_string());
        } else if hla.has_risk_alleles() {
            score += 2;
            findings.push("HLA: High-risk alleles require monitoring".to_string());
        }

        let factor = dose.dose_adjustment_factor;
        if is_large_adjustment(factor) {
            score += 2;
            findings.push(format!(
                "Dosing: {}% adjustment recommended",
                ((1.0 - factor).abs() * 100.0).round()
            ));
        }

        let (level, urgency) = if score >= 7 {
            (RiskTier::Critical, "Immediate action required")
        } else if score >= 4 {
            (RiskTier::High, "Action recommended within 24 hours")
        } else if score >= 2 {
            (RiskTier::Moderate, "Consider action within 1 week")
        } else {
            (RiskTier::Low, "Standard care protocols")
        };

        ClinicalActionability {
            actionability_score: score,
            actionability_level: level,
            urgency_level: urgency.to_string(),
            actionable_findings: findings,
            implementation_priority: ImplementationPriority::for_tier(level),
        }
    }
}

fn is_large_adjustment(factor: f64) -> bool {
    factor <= 0.6 || factor >= 1.4
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CypEnzyme, GenotypeActivityCatalog, Transporter};
    use crate::cyp::CypMetabolismAnalyzer;
    use crate::dosing::DoseAdjustmentCalculator;
    use crate::hla::HlaHypersensitivityScreener;
    use crate::patient::{AlleleSet, GenotypeProfile, PatientCovariates};
    use crate::transporter::TransporterDispositionAnalyzer;

    fn summarize(
        profile: &GenotypeProfile,
        covariates: &PatientCovariates,
        alleles: &AlleleSet,
        drug: &str,
    ) -> PrecisionSummary {
        let catalog = GenotypeActivityCatalog::standard();
        let cyp = CypMetabolismAnalyzer::new(&catalog).analyze(profile);
        let transporters = TransporterDispositionAnalyzer::new(&catalog).analyze(profile);
        let hla = HlaHypersensitivityScreener::new(&catalog).screen(alleles, drug);
        let dose = DoseAdjustmentCalculator::new().calculate(drug, 100.0, covariates, cyp.composite_score);
        RiskAggregator::new().summarize(&cyp, &transporters, &hla, &dose)
    }

    #[test]
    fn test_baseline_patient_is_low_everywhere() {
        let summary = summarize(
            &GenotypeProfile::default(),
            &PatientCovariates::default(),
            &AlleleSet::default(),
            "Warfarin",
        );
        assert_eq!(summary.overall_genetic_risk.risk_score, 0);
        assert_eq!(summary.overall_genetic_risk.risk_category, RiskTier::Low);
        assert_eq!(summary.dosing_complexity.complexity_level, RiskTier::Low);
        assert_eq!(summary.monitoring_intensity.intensity_level, MonitoringIntensity::Standard);
        assert_eq!(summary.monitoring_intensity.recommended_frequency, "Monthly");
        assert_eq!(summary.clinical_actionability.actionability_level, RiskTier::Low);
        assert_eq!(
            summary.clinical_actionability.implementation_priority.timeline,
            "Next routine visit"
        );
    }

    #[test]
    fn test_contraindication_drives_critical_actionability() {
        let alleles = AlleleSet {
            hla_b: vec!["HLA-B*5701".into()],
            ..AlleleSet::default()
        };
        let profile = GenotypeProfile::default().with_enzyme(CypEnzyme::Cyp2D6, "PM");
        let summary = summarize(&profile, &PatientCovariates::default(), &alleles, "Abacavir");

        // CYP2D6 Critical (+3) and HLA Critical (+5)
        assert_eq!(summary.overall_genetic_risk.risk_score, 8);
        assert_eq!(summary.overall_genetic_risk.risk_category, RiskTier::Critical);
        assert!(summary
            .overall_genetic_risk
            .contributing_factors
            .contains(&"HLA: Critical hypersensitivity risk".to_string()));

        // CYP2D6 (+2) and contraindication (+5)
        let action = &summary.clinical_actionability;
        assert_eq!(action.actionability_score, 7);
        assert_eq!(action.actionability_level, RiskTier::Critical);
        assert_eq!(action.urgency_level, "Immediate action required");
        assert_eq!(action.implementation_priority.stakeholders.len(), 4);
        assert_eq!(
            action.actionable_findings[0],
            "CYP2D6: Severe impairment - major dose reduction required"
        );
    }

    #[test]
    fn test_carried_allele_without_drug_match() {
        let alleles = AlleleSet {
            hla_b: vec!["HLA-B*5801".into()],
            ..AlleleSet::default()
        };
        let summary = summarize(
            &GenotypeProfile::default(),
            &PatientCovariates::default(),
            &alleles,
            "Warfarin",
        );

        let risk = &summary.overall_genetic_risk;
        assert_eq!(risk.risk_score, 2);
        assert_eq!(risk.risk_category, RiskTier::Moderate);
        assert_eq!(risk.contributing_factors, vec!["HLA: High-risk alleles present"]);

        let action = &summary.clinical_actionability;
        assert_eq!(action.actionability_score, 2);
        assert_eq!(action.actionability_level, RiskTier::Moderate);
        assert_eq!(action.urgency_level, "Consider action within 1 week");
        assert_eq!(action.implementation_priority.timeline, "1 week");
        assert_eq!(
            action.actionable_findings,
            vec!["HLA: High-risk alleles require monitoring"]
        );
    }

    #[test]
    fn test_large_adjustment_edges() {
        assert!(is_large_adjustment(0.6));
        assert!(!is_large_adjustment(0.61));
        assert!(!is_large_adjustment(1.39));
        assert!(is_large_adjustment(1.4));

        let catalog = GenotypeActivityCatalog::standard();
        let profile = GenotypeProfile::default();
        let cyp = CypMetabolismAnalyzer::new(&catalog).analyze(&profile);
        let transporters = TransporterDispositionAnalyzer::new(&catalog).analyze(&profile);
        let calc = DoseAdjustmentCalculator::new();

        // age 0.8 * genetic 0.75
        let at_edge = calc.calculate(
            "Warfarin",
            100.0,
            &PatientCovariates {
                age: 70.0,
                ..PatientCovariates::default()
            },
            0.5,
        );
        assert_eq!(at_edge.dose_adjustment_factor, 0.6);
        let plan = RiskAggregator::new().monitoring_intensity(&cyp, &transporters, &at_edge);
        assert_eq!(plan.monitoring_score, 2);
        assert_eq!(plan.specific_requirements, vec!["Dose adjustment monitoring"]);

        // renal 0.7 * hepatic 0.9
        let inside = calc.calculate(
            "Warfarin",
            100.0,
            &PatientCovariates {
                egfr: 55.0,
                ast_alt: 61.0,
                ..PatientCovariates::default()
            },
            1.0,
        );
        assert_eq!(inside.dose_adjustment_factor, 0.63);
        let plan = RiskAggregator::new().monitoring_intensity(&cyp, &transporters, &inside);
        assert_eq!(plan.monitoring_score, 0);
        assert!(plan.specific_requirements.is_empty());
    }

    #[test]
    fn test_elderly_renal_patient_complexity() {
        let covariates = PatientCovariates {
            age: 70.0,
            egfr: 25.0,
            ..PatientCovariates::default()
        };
        let summary = summarize(
            &GenotypeProfile::default(),
            &covariates,
            &AlleleSet::default(),
            "Warfarin",
        );

        // factor 0.4: major reduction (+3), two factors (+2), TDM (+2)
        assert_eq!(summary.dosing_complexity.complexity_score, 7);
        assert_eq!(summary.dosing_complexity.complexity_level, RiskTier::High);

        // dose adjustment monitoring only
        assert_eq!(summary.monitoring_intensity.monitoring_score, 2);
        assert_eq!(summary.monitoring_intensity.intensity_level, MonitoringIntensity::Standard);

        assert!(summary
            .clinical_actionability
            .actionable_findings
            .contains(&"Dosing: 60% adjustment recommended".to_string()));
        assert_eq!(summary.clinical_actionability.actionability_level, RiskTier::Moderate);
    }

    #[test]
    fn test_poor_metabolizer_monitoring() {
        let profile = GenotypeProfile::default()
            .with_enzyme(CypEnzyme::Cyp2C9, "Poor")
            .with_enzyme(CypEnzyme::Cyp2D6, "PM")
            .with_enzyme(CypEnzyme::Cyp3A4, "Poor")
            .with_enzyme(CypEnzyme::Cyp1A2, "Slow")
            .with_enzyme(CypEnzyme::Cyp2B6, "Poor")
            .with_enzyme(CypEnzyme::Cyp2C19, "PM")
            .with_transporter(Transporter::Slco1b1, "*5/*5")
            .with_transporter(Transporter::Abcb1, "TT");
        let summary = summarize(
            &profile,
            &PatientCovariates::default(),
            &AlleleSet::default(),
            "Simvastatin",
        );

        // composite 0.7/6 (+3), two high transporters (+2), factor 0.5 (+2)
        assert_eq!(summary.monitoring_intensity.monitoring_score, 7);
        assert_eq!(summary.monitoring_intensity.intensity_level, MonitoringIntensity::Intensive);
        assert_eq!(summary.monitoring_intensity.clinical_protocols.len(), 4);
        assert_eq!(summary.overall_genetic_risk.risk_category, RiskTier::Critical);
    }
}
