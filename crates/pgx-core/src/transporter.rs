//! Drug Transporter Disposition Analysis
//!
//! Risk categories come straight from the transporter table; the aggregate
//! disposition risk counts High and Intermediate transporters.

use crate::catalog::{GenotypeActivityCatalog, Resolution, Transporter, TransporterRisk};
use crate::patient::GenotypeProfile;
use crate::RiskTier;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransporterFinding {
    pub transporter: Transporter,
    pub genotype: String,
    pub activity_level: f64,
    pub risk_category: TransporterRisk,
    pub resolution: Resolution,
    pub clinical_implications: String,
    pub affected_drugs: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransporterAnalysis {
    pub transporters: Vec<TransporterFinding>,
    pub high_risk_count: usize,
    pub intermediate_risk_count: usize,
    pub disposition_risk: RiskTier,
    pub disposition_description: String,
    pub monitoring_recommendations: Vec<String>,
}

impl TransporterAnalysis {
    pub fn finding(&self, transporter: Transporter) -> Option<&TransporterFinding> {
        self.transporters.iter().find(|f| f.transporter == transporter)
    }

    pub fn unmatched(&self) -> impl Iterator<Item = &TransporterFinding> {
        self.transporters
            .iter()
            .filter(|f| f.resolution == Resolution::Unmatched)
    }
}

pub struct TransporterDispositionAnalyzer<'a> {
    catalog: &'a GenotypeActivityCatalog,
}

impl<'a> TransporterDispositionAnalyzer<'a> {
    pub fn new(catalog: &'a GenotypeActivityCatalog) -> Self {
        TransporterDispositionAnalyzer { catalog }
    }

    pub fn analyze(&self, profile: &GenotypeProfile) -> TransporterAnalysis {
        let transporters: Vec<TransporterFinding> = Transporter::ALL
            .into_iter()
            .map(|t| self.analyze_transporter(t, profile.transporter_label(t)))
            .collect();

        let high_risk_count = count_risk(&transporters, TransporterRisk::High);
        let intermediate_risk_count = count_risk(&transporters, TransporterRisk::Intermediate);
        let disposition_risk = disposition_risk(high_risk_count, intermediate_risk_count);

        tracing::debug!(
            high_risk_count,
            intermediate_risk_count,
            %disposition_risk,
            "Transporter profile scored"
        );

        TransporterAnalysis {
            monitoring_recommendations: monitoring_recommendations(&transporters),
            transporters,
            high_risk_count,
            intermediate_risk_count,
            disposition_risk,
            disposition_description: disposition_description(disposition_risk).to_string(),
        }
    }

    pub fn analyze_transporter(&self, transporter: Transporter, genotype: &str) -> TransporterFinding {
        let found = self.catalog.transporter_profile(transporter, genotype);
        if !found.resolution.is_matched() {
            tracing::warn!(%transporter, genotype, "Unrecognized transporter genotype, assuming normal activity");
        }

        TransporterFinding {
            transporter,
            genotype: genotype.to_string(),
            activity_level: found.activity,
            risk_category: found.risk,
            resolution: found.resolution,
            clinical_implications: transporter.clinical_implication(found.risk).to_string(),
            affected_drugs: transporter
                .substrate_drugs()
                .iter()
                .map(|d| d.to_string())
                .collect(),
        }
    }
}

fn count_risk(findings: &[TransporterFinding], risk: TransporterRisk) -> usize {
    findings.iter().filter(|f| f.risk_category == risk).count()
}

/// Two or more High transporters is High; one High or two Intermediate is Moderate.
pub fn disposition_risk(high: usize, intermediate: usize) -> RiskTier {
    if high >= 2 {
        RiskTier::High
    } else if high >= 1 || intermediate >= 2 {
        RiskTier::Moderate
    } else {
        RiskTier::Low
    }
}

fn disposition_description(tier: RiskTier) -> &'static str {
    match tier {
        RiskTier::High | RiskTier::Critical => "High - Multiple transporter impairments",
        RiskTier::Moderate => "Moderate - Some transporter impairments",
        RiskTier::Low => "Low - Normal drug disposition expected",
    }
}

fn monitoring_recommendations(findings: &[TransporterFinding]) -> Vec<String> {
    let recs: Vec<String> = findings
        .iter()
        .filter_map(|f| match f.risk_category {
            TransporterRisk::High => {
                Some(format!("{}: Intensive monitoring for substrate drugs", f.transporter))
            }
            TransporterRisk::Intermediate => {
                Some(format!("{}: Enhanced monitoring recommended", f.transporter))
            }
            TransporterRisk::Low => None,
        })
        .collect();

    if recs.is_empty() {
        vec!["Standard monitoring protocols".to_string()]
    } else {
        recs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(profile: GenotypeProfile) -> TransporterAnalysis {
        let catalog = GenotypeActivityCatalog::standard();
        TransporterDispositionAnalyzer::new(&catalog).analyze(&profile)
    }

    #[test]
    fn test_default_profile_is_low() {
        let analysis = analyze(GenotypeProfile::default());
        assert_eq!(analysis.transporters.len(), 3);
        assert_eq!(analysis.disposition_risk, RiskTier::Low);
        assert_eq!(analysis.disposition_description, "Low - Normal drug disposition expected");
        assert_eq!(analysis.monitoring_recommendations, vec!["Standard monitoring protocols"]);
    }

    #[test]
    fn test_disposition_thresholds() {
        assert_eq!(disposition_risk(2, 0), RiskTier::High);
        assert_eq!(disposition_risk(1, 0), RiskTier::Moderate);
        assert_eq!(disposition_risk(0, 2), RiskTier::Moderate);
        assert_eq!(disposition_risk(0, 1), RiskTier::Low);
    }

    #[test]
    fn test_two_high_transporters() {
        let profile = GenotypeProfile::default()
            .with_transporter(Transporter::Slco1b1, "*5/*5")
            .with_transporter(Transporter::Abcb1, "TT");
        let analysis = analyze(profile);

        assert_eq!(analysis.high_risk_count, 2);
        assert_eq!(analysis.disposition_risk, RiskTier::High);

        let slco = analysis.finding(Transporter::Slco1b1).unwrap();
        assert_eq!(slco.activity_level, 0.2);
        assert_eq!(
            slco.clinical_implications,
            "Increased risk of statin-induced myopathy - consider dose reduction"
        );
        assert_eq!(
            analysis.monitoring_recommendations,
            vec![
                "SLCO1B1: Intensive monitoring for substrate drugs",
                "ABCB1: Intensive monitoring for substrate drugs",
            ]
        );
    }

    #[test]
    fn test_unmatched_transporter_genotype() {
        let profile = GenotypeProfile::default().with_transporter(Transporter::Abcg2, "421C>A");
        let analysis = analyze(profile);

        let abcg2 = analysis.finding(Transporter::Abcg2).unwrap();
        assert_eq!(abcg2.resolution, Resolution::Unmatched);
        assert_eq!(abcg2.activity_level, 1.0);
        assert_eq!(abcg2.risk_category, TransporterRisk::Low);
        assert_eq!(analysis.unmatched().count(), 1);
    }
}
