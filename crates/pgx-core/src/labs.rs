//! Laboratory interpretation for the renal and hepatic markers carried in
//! [`PatientCovariates`].

use crate::patient::{PatientCovariates, Sex};
use crate::RiskTier;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabTest {
    Creatinine,
    Egfr,
    AstAlt,
}

impl LabTest {
    pub fn unit(self) -> &'static str {
        match self {
            LabTest::Creatinine => "mg/dL",
            LabTest::Egfr => "mL/min/1.73m²",
            LabTest::AstAlt => "U/L",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LabTest::Creatinine => "CREATININE",
            LabTest::Egfr => "EGFR",
            LabTest::AstAlt => "AST_ALT",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LabStatus {
    Low,
    High,
}

/// One out-of-range finding
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabFinding {
    pub test: LabTest,
    pub value: f64,
    pub unit: String,
    pub status: LabStatus,
    pub clinical_significance: String,
    /// Low, Moderate or High
    pub severity: RiskTier,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabAssessment {
    pub findings: Vec<LabFinding>,
    pub high_risk_findings: Vec<String>,
    pub moderate_risk_findings: Vec<String>,
    pub monitoring_recommendations: Vec<String>,
}

impl LabAssessment {
    /// Recommendation for the worst finding level, if any
    pub fn overall_recommendation(&self) -> Option<&'static str> {
        if !self.high_risk_findings.is_empty() {
            Some("Immediate clinical attention required")
        } else if !self.moderate_risk_findings.is_empty() {
            Some("Enhanced monitoring recommended")
        } else {
            None
        }
    }
}

/// Interpret one lab value. `None` when the value is within range.
pub fn interpret(test: LabTest, value: f64, sex: Sex) -> Option<LabFinding> {
    let (status, significance, severity) = match test {
        LabTest::Creatinine => {
            let upper = match sex {
                Sex::Male => 1.3,
                Sex::Female => 1.1,
            };
            if value <= upper {
                return None;
            }
            let severity = if value > 2.0 { RiskTier::High } else { RiskTier::Moderate };
            (LabStatus::High, "Renal impairment", severity)
        }
        LabTest::Egfr => {
            if value < 60.0 {
                let severity = if value < 30.0 { RiskTier::High } else { RiskTier::Moderate };
                (LabStatus::Low, "Chronic Kidney Disease", severity)
            } else if value < 90.0 {
                (LabStatus::Low, "Mild kidney dysfunction", RiskTier::Low)
            } else {
                return None;
            }
        }
        LabTest::AstAlt => {
            if value <= 40.0 {
                return None;
            }
            let severity = if value > 120.0 { RiskTier::High } else { RiskTier::Moderate };
            (LabStatus::High, "Liver injury/inflammation", severity)
        }
    };

    Some(LabFinding {
        test,
        value,
        unit: test.unit().to_string(),
        status,
        clinical_significance: significance.to_string(),
        severity,
    })
}

/// Interpret creatinine, eGFR and AST/ALT. Sex defaults to male limits.
pub fn assess(covariates: &PatientCovariates) -> LabAssessment {
    let sex = covariates.sex.unwrap_or(Sex::Male);
    let findings: Vec<LabFinding> = [
        (LabTest::Creatinine, covariates.creatinine),
        (LabTest::Egfr, covariates.egfr),
        (LabTest::AstAlt, covariates.ast_alt),
    ]
    .into_iter()
    .filter_map(|(test, value)| interpret(test, value, sex))
    .collect();

    let summarize = |tier: RiskTier| -> Vec<String> {
        findings
            .iter()
            .filter(|f| f.severity == tier)
            .map(|f| format!("{}: {}", f.test.label(), f.clinical_significance))
            .collect()
    };
    let high_risk_findings = summarize(RiskTier::High);
    let moderate_risk_findings = summarize(RiskTier::Moderate);

    let mut monitoring_recommendations = Vec::new();
    if covariates.creatinine > 1.5 {
        monitoring_recommendations.push("Monitor renal function weekly".to_string());
    }
    if covariates.ast_alt > 80.0 {
        monitoring_recommendations.push("Monitor liver function every 3-7 days".to_string());
    }
    if covariates.egfr < 60.0 {
        monitoring_recommendations.push("Adjust drug dosing for renal impairment".to_string());
    }

    LabAssessment {
        findings,
        high_risk_findings,
        moderate_risk_findings,
        monitoring_recommendations,
    }
}
