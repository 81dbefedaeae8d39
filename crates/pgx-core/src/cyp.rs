//! CYP450 Metabolism Analysis
//!
//! Scores the six drug-metabolizing enzymes of a [`GenotypeProfile`] and
//! folds them into a composite metabolism score (arithmetic mean).

use crate::catalog::{CypEnzyme, GenotypeActivityCatalog, Resolution};
use crate::patient::GenotypeProfile;
use crate::RiskTier;
use serde::{Deserialize, Serialize};

/// Result for a single enzyme
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnzymeFinding {
    pub enzyme: CypEnzyme,
    pub genotype: String,
    pub activity_score: f64,
    pub risk_level: RiskTier,
    /// `Unmatched` when the label was not recognized and the fallback was used
    pub resolution: Resolution,
    pub clinical_impact: String,
    pub affected_drugs: Vec<String>,
}

/// Enzyme-by-enzyme analysis plus the composite score
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CypAnalysis {
    pub enzymes: Vec<EnzymeFinding>,
    #[serde(serialize_with = "crate::display::two_decimals")]
    pub composite_score: f64,
    pub overall_risk: RiskTier,
    pub overall_description: String,
    pub recommendations: Vec<String>,
}

impl CypAnalysis {
    pub fn finding(&self, enzyme: CypEnzyme) -> Option<&EnzymeFinding> {
        self.enzymes.iter().find(|f| f.enzyme == enzyme)
    }

    /// Enzymes whose label fell back to the default activity
    pub fn unmatched(&self) -> impl Iterator<Item = &EnzymeFinding> {
        self.enzymes
            .iter()
            .filter(|f| f.resolution == Resolution::Unmatched)
    }
}

/// Scores enzyme genotypes against the catalog
pub struct CypMetabolismAnalyzer<'a> {
    catalog: &'a GenotypeActivityCatalog,
}

impl<'a> CypMetabolismAnalyzer<'a> {
    pub fn new(catalog: &'a GenotypeActivityCatalog) -> Self {
        CypMetabolismAnalyzer { catalog }
    }

    /// Analyze all six enzymes. Absent labels use the per-enzyme default.
    pub fn analyze(&self, profile: &GenotypeProfile) -> CypAnalysis {
        let enzymes: Vec<EnzymeFinding> = CypEnzyme::ALL
            .into_iter()
            .map(|enzyme| self.analyze_enzyme(enzyme, profile.enzyme_label(enzyme)))
            .collect();

        let composite_score =
            enzymes.iter().map(|f| f.activity_score).sum::<f64>() / enzymes.len() as f64;
        let overall_risk = RiskTier::from_composite_score(composite_score);

        tracing::debug!(composite_score, %overall_risk, "CYP profile scored");

        CypAnalysis {
            recommendations: recommendations(&enzymes),
            enzymes,
            composite_score,
            overall_risk,
            overall_description: overall_description(overall_risk).to_string(),
        }
    }

    /// Score one enzyme genotype
    pub fn analyze_enzyme(&self, enzyme: CypEnzyme, genotype: &str) -> EnzymeFinding {
        let found = self.catalog.enzyme_activity(enzyme, genotype);
        if !found.resolution.is_matched() {
            tracing::warn!(%enzyme, genotype, "Unrecognized genotype label, assuming normal activity");
        }

        EnzymeFinding {
            enzyme,
            genotype: genotype.to_string(),
            activity_score: found.activity_score,
            risk_level: found.risk_tier,
            resolution: found.resolution,
            clinical_impact: clinical_impact(found.risk_tier).to_string(),
            affected_drugs: enzyme.substrate_drugs().iter().map(|d| d.to_string()).collect(),
        }
    }
}

/// Clinical impact note for an enzyme tier
pub fn clinical_impact(tier: RiskTier) -> &'static str {
    match tier {
        RiskTier::Critical => "Severe impairment - major dose reduction required",
        RiskTier::High => "Moderate impairment - dose reduction recommended",
        RiskTier::Moderate => "Enhanced metabolism - dose increase may be needed",
        RiskTier::Low => "Normal metabolism expected",
    }
}

fn overall_description(tier: RiskTier) -> &'static str {
    match tier {
        RiskTier::Critical => "Critical - Severe metabolic impairment",
        RiskTier::High => "High - Significant metabolic impairment",
        RiskTier::Moderate => "Moderate - Enhanced metabolism",
        RiskTier::Low => "Low - Normal metabolism expected",
    }
}

fn recommendations(findings: &[EnzymeFinding]) -> Vec<String> {
    let recs: Vec<String> = findings
        .iter()
        .filter_map(|f| {
            let advice = match f.risk_level {
                RiskTier::Critical => "Consider alternative medication or 50-75% dose reduction",
                RiskTier::High => "25-50% dose reduction with enhanced monitoring",
                RiskTier::Moderate => "Consider dose adjustment and monitoring",
                RiskTier::Low => return None,
            };
            Some(format!("{}: {}", f.enzyme, advice))
        })
        .collect();

    if recs.is_empty() {
        vec!["Standard CYP-related protocols appropriate".to_string()]
    } else {
        recs
    }
}
