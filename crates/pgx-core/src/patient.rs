//! Per-request patient input
//!
//! Everything here is transient: built at the start of one assessment and
//! dropped at its end. Missing fields fall back to documented defaults
//! rather than failing the assessment.

use crate::catalog::{CypEnzyme, Transporter};
use crate::{PgxError, Result};
use serde::{Deserialize, Serialize};

/// Biological sex, used only for sex-specific laboratory limits
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    #[serde(alias = "M", alias = "male")]
    Male,
    #[serde(alias = "F", alias = "female")]
    Female,
}

/// Organ-function markers and demographics
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatientCovariates {
    /// Years
    pub age: f64,
    /// Kilograms
    pub weight: f64,
    /// mL/min/1.73m²
    pub egfr: f64,
    /// mg/dL
    pub creatinine: f64,
    /// U/L
    pub ast_alt: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sex: Option<Sex>,
}

impl Default for PatientCovariates {
    fn default() -> Self {
        PatientCovariates {
            age: 50.0,
            weight: 70.0,
            egfr: 90.0,
            creatinine: 1.0,
            ast_alt: 30.0,
            sex: None,
        }
    }
}

/// Enzyme and transporter genotype labels. `None` means "use the neutral default".
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenotypeProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cyp2c9: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cyp2d6: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cyp3a4: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cyp1a2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cyp2b6: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cyp2c19: Option<String>,
    #[serde(alias = "slco1b1_genotype", skip_serializing_if = "Option::is_none")]
    pub slco1b1: Option<String>,
    #[serde(alias = "abcb1_genotype", skip_serializing_if = "Option::is_none")]
    pub abcb1: Option<String>,
    #[serde(alias = "abcg2_genotype", skip_serializing_if = "Option::is_none")]
    pub abcg2: Option<String>,
}

impl GenotypeProfile {
    fn enzyme_slot(&mut self, enzyme: CypEnzyme) -> &mut Option<String> {
        match enzyme {
            CypEnzyme::Cyp2C9 => &mut self.cyp2c9,
            CypEnzyme::Cyp2D6 => &mut self.cyp2d6,
            CypEnzyme::Cyp3A4 => &mut self.cyp3a4,
            CypEnzyme::Cyp1A2 => &mut self.cyp1a2,
            CypEnzyme::Cyp2B6 => &mut self.cyp2b6,
            CypEnzyme::Cyp2C19 => &mut self.cyp2c19,
        }
    }

    fn transporter_slot(&mut self, transporter: Transporter) -> &mut Option<String> {
        match transporter {
            Transporter::Slco1b1 => &mut self.slco1b1,
            Transporter::Abcb1 => &mut self.abcb1,
            Transporter::Abcg2 => &mut self.abcg2,
        }
    }

    /// Label as supplied, if any
    pub fn enzyme_genotype(&self, enzyme: CypEnzyme) -> Option<&str> {
        match enzyme {
            CypEnzyme::Cyp2C9 => self.cyp2c9.as_deref(),
            CypEnzyme::Cyp2D6 => self.cyp2d6.as_deref(),
            CypEnzyme::Cyp3A4 => self.cyp3a4.as_deref(),
            CypEnzyme::Cyp1A2 => self.cyp1a2.as_deref(),
            CypEnzyme::Cyp2B6 => self.cyp2b6.as_deref(),
            CypEnzyme::Cyp2C19 => self.cyp2c19.as_deref(),
        }
    }

    /// Supplied label, or the enzyme's neutral default
    pub fn enzyme_label(&self, enzyme: CypEnzyme) -> &str {
        self.enzyme_genotype(enzyme)
            .unwrap_or_else(|| enzyme.default_genotype())
    }

    pub fn transporter_genotype(&self, transporter: Transporter) -> Option<&str> {
        match transporter {
            Transporter::Slco1b1 => self.slco1b1.as_deref(),
            Transporter::Abcb1 => self.abcb1.as_deref(),
            Transporter::Abcg2 => self.abcg2.as_deref(),
        }
    }

    pub fn transporter_label(&self, transporter: Transporter) -> &str {
        self.transporter_genotype(transporter)
            .unwrap_or_else(|| transporter.default_genotype())
    }

    /// Builder-style setter
    pub fn with_enzyme(mut self, enzyme: CypEnzyme, label: impl Into<String>) -> Self {
        *self.enzyme_slot(enzyme) = Some(label.into());
        self
    }

    pub fn with_transporter(mut self, transporter: Transporter, label: impl Into<String>) -> Self {
        *self.transporter_slot(transporter) = Some(label.into());
        self
    }
}

/// HLA typing per locus, in the order reported by the lab
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlleleSet {
    #[serde(alias = "hla_a_typing")]
    pub hla_a: Vec<String>,
    #[serde(alias = "hla_b_typing")]
    pub hla_b: Vec<String>,
    #[serde(alias = "hla_drb1_typing")]
    pub hla_drb1: Vec<String>,
}

impl AlleleSet {
    /// All alleles across loci (A, then B, then DRB1)
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.hla_a
            .iter()
            .chain(&self.hla_b)
            .chain(&self.hla_drb1)
            .map(String::as_str)
    }

    pub fn contains(&self, allele: &str) -> bool {
        self.iter().any(|a| a == allele)
    }

    pub fn is_empty(&self) -> bool {
        self.hla_a.is_empty() && self.hla_b.is_empty() && self.hla_drb1.is_empty()
    }
}

/// One assessment: a candidate drug for one patient
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssessmentRequest {
    #[serde(alias = "medication_name")]
    pub drug: String,

    #[serde(alias = "index_drug_dose")]
    pub standard_dose: f64,

    #[serde(default)]
    pub covariates: PatientCovariates,

    #[serde(default)]
    pub genotypes: GenotypeProfile,

    #[serde(default)]
    pub hla: AlleleSet,

    /// Measured drug concentrations, most recent last
    #[serde(default, alias = "measured_drug_levels")]
    pub measured_levels: Vec<f64>,

    /// Other drugs the patient is taking
    #[serde(default, alias = "concomitant_drugs")]
    pub concomitant_medications: Vec<String>,
}

impl AssessmentRequest {
    /// Request with default covariates and genotypes
    pub fn new(drug: impl Into<String>, standard_dose: f64) -> Self {
        AssessmentRequest {
            drug: drug.into(),
            standard_dose,
            covariates: PatientCovariates::default(),
            genotypes: GenotypeProfile::default(),
            hla: AlleleSet::default(),
            measured_levels: Vec::new(),
            concomitant_medications: Vec::new(),
        }
    }

    /// Most recent measured level
    pub fn latest_level(&self) -> Option<f64> {
        self.measured_levels.last().copied()
    }

    /// Check every field and report all violations at once.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();
        let c = &self.covariates;

        if self.drug.trim().is_empty() {
            errors.push("Drug name must not be empty".to_string());
        }
        if !self.standard_dose.is_finite() || self.standard_dose <= 0.0 {
            errors.push(format!(
                "Standard dose must be positive, got {}",
                self.standard_dose
            ));
        }
        if !(0.0..=130.0).contains(&c.age) {
            errors.push(format!("Age must be between 0 and 130 years, got {}", c.age));
        }
        if !c.weight.is_finite() || c.weight <= 0.0 || c.weight > 500.0 {
            errors.push(format!("Weight must be in (0, 500] kg, got {}", c.weight));
        }
        for (name, value) in [
            ("eGFR", c.egfr),
            ("Creatinine", c.creatinine),
            ("AST/ALT", c.ast_alt),
        ] {
            if !value.is_finite() || value < 0.0 {
                errors.push(format!("{} must be non-negative, got {}", name, value));
            }
        }
        for (i, level) in self.measured_levels.iter().enumerate() {
            if !level.is_finite() || *level < 0.0 {
                errors.push(format!("Measured level #{} must be non-negative, got {}", i + 1, level));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(PgxError::InvalidInput(errors))
        }
    }
}
