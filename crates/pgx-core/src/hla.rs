//! HLA Hypersensitivity Screening
//!
//! Exact allele-id matching against the catalog's association table. A
//! carried allele whose drug list names the candidate drug is a hard
//! contraindication and forces the overall risk to `Critical`.

use crate::catalog::{DrugAlleleAssociation, GenotypeActivityCatalog};
use crate::patient::AlleleSet;
use crate::RiskTier;
use serde::{Deserialize, Serialize};

/// Recommendation attached to every drug-specific match
pub const CONTRAINDICATED: &str = "CONTRAINDICATED - Alternative therapy required";

/// A catalogued high-risk allele the patient carries
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlleleFinding {
    pub allele: String,
    pub associated_drugs: Vec<String>,
    pub reaction_type: String,
    pub risk_level: RiskTier,
}

impl From<&DrugAlleleAssociation> for AlleleFinding {
    fn from(assoc: &DrugAlleleAssociation) -> Self {
        AlleleFinding {
            allele: assoc.allele.clone(),
            associated_drugs: assoc.drugs.clone(),
            reaction_type: assoc.reaction.clone(),
            risk_level: assoc.risk_level,
        }
    }
}

/// Candidate drug matched against a carried allele
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DrugSpecificRisk {
    pub medication: String,
    pub hla_allele: String,
    pub reaction_risk: String,
    pub recommendation: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HlaScreening {
    pub high_risk_alleles_present: Vec<AlleleFinding>,
    pub drug_specific_risks: Vec<DrugSpecificRisk>,
    pub overall_hypersensitivity_risk: RiskTier,
    /// Highest table-declared level among carried alleles
    pub highest_allele_risk: Option<RiskTier>,
    pub recommendations: Vec<String>,
    /// Patient alleles with no catalog entry
    pub unmatched_alleles: Vec<String>,
}

impl HlaScreening {
    pub fn has_contraindication(&self) -> bool {
        !self.drug_specific_risks.is_empty()
    }

    pub fn has_risk_alleles(&self) -> bool {
        !self.high_risk_alleles_present.is_empty()
    }
}

pub struct HlaHypersensitivityScreener<'a> {
    catalog: &'a GenotypeActivityCatalog,
}

impl<'a> HlaHypersensitivityScreener<'a> {
    pub fn new(catalog: &'a GenotypeActivityCatalog) -> Self {
        HlaHypersensitivityScreener { catalog }
    }

    /// Screen the patient's alleles for the candidate drug.
    pub fn screen(&self, alleles: &AlleleSet, drug: &str) -> HlaScreening {
        let mut present = Vec::new();
        let mut drug_specific = Vec::new();
        let mut recommendations = Vec::new();

        for assoc in self.catalog.hla_associations() {
            if !alleles.contains(&assoc.allele) {
                continue;
            }
            present.push(AlleleFinding::from(assoc));

            if assoc.implicates(drug) {
                tracing::warn!(allele = %assoc.allele, drug, "HLA contraindication");
                drug_specific.push(DrugSpecificRisk {
                    medication: drug.to_string(),
                    hla_allele: assoc.allele.clone(),
                    reaction_risk: assoc.reaction.clone(),
                    recommendation: CONTRAINDICATED.to_string(),
                });
                recommendations.push(format!(
                    "CONTRAINDICATED - {} is contraindicated due to {} ({})",
                    drug, assoc.allele, assoc.reaction
                ));
                recommendations
                    .push("Alternative therapy required - consult clinical pharmacist".to_string());
            } else {
                recommendations.push(format!(
                    "Caution with {} due to {}",
                    assoc.drugs.join(", "),
                    assoc.allele
                ));
            }
        }

        let mut unmatched_alleles = Vec::new();
        for allele in alleles.iter() {
            if self.catalog.lookup_allele(allele).is_none()
                && !unmatched_alleles.iter().any(|a| a == allele)
            {
                unmatched_alleles.push(allele.to_string());
            }
        }

        let overall_hypersensitivity_risk = if drug_specific.is_empty() {
            RiskTier::Low
        } else {
            RiskTier::Critical
        };

        tracing::debug!(
            carried = present.len(),
            contraindications = drug_specific.len(),
            %overall_hypersensitivity_risk,
            "HLA screen complete"
        );

        HlaScreening {
            highest_allele_risk: present.iter().map(|f| f.risk_level).max(),
            high_risk_alleles_present: present,
            drug_specific_risks: drug_specific,
            overall_hypersensitivity_risk,
            recommendations,
            unmatched_alleles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alleles_b(list: &[&str]) -> AlleleSet {
        AlleleSet {
            hla_b: list.iter().map(|s| s.to_string()).collect(),
            ..AlleleSet::default()
        }
    }

    #[test]
    fn test_abacavir_with_b5701_is_contraindicated() {
        let catalog = GenotypeActivityCatalog::standard();
        let screening = HlaHypersensitivityScreener::new(&catalog)
            .screen(&alleles_b(&["HLA-B*5701"]), "Abacavir");

        assert_eq!(screening.overall_hypersensitivity_risk, RiskTier::Critical);
        assert!(screening.has_contraindication());
        assert_eq!(screening.drug_specific_risks[0].recommendation, CONTRAINDICATED);
        assert!(screening.recommendations[0].contains("CONTRAINDICATED"));
        assert!(screening.recommendations[0].contains("HLA-B*5701"));
    }

    #[test]
    fn test_allele_without_matching_drug_is_cautionary() {
        let catalog = GenotypeActivityCatalog::standard();
        let screening = HlaHypersensitivityScreener::new(&catalog)
            .screen(&alleles_b(&["HLA-B*5801"]), "Warfarin");

        assert_eq!(screening.overall_hypersensitivity_risk, RiskTier::Low);
        assert_eq!(screening.highest_allele_risk, Some(RiskTier::Critical));
        assert!(screening.has_risk_alleles());
        assert!(!screening.has_contraindication());
        assert_eq!(
            screening.recommendations,
            vec!["Caution with Allopurinol, Carbamazepine due to HLA-B*5801"]
        );
    }

    #[test]
    fn test_matching_is_exact_for_alleles() {
        let catalog = GenotypeActivityCatalog::standard();
        let screening = HlaHypersensitivityScreener::new(&catalog)
            .screen(&alleles_b(&["HLA-B*57:01", "HLA-B*0702"]), "Abacavir");

        assert!(!screening.has_risk_alleles());
        assert_eq!(screening.overall_hypersensitivity_risk, RiskTier::Low);
        assert_eq!(screening.unmatched_alleles, vec!["HLA-B*57:01", "HLA-B*0702"]);
        assert!(screening.recommendations.is_empty());
    }

    #[test]
    fn test_drug_name_ignores_case() {
        let catalog = GenotypeActivityCatalog::standard();
        let alleles = AlleleSet {
            hla_a: vec!["HLA-A*3101".into()],
            ..AlleleSet::default()
        };
        let screening = HlaHypersensitivityScreener::new(&catalog).screen(&alleles, " carbamazepine");
        assert_eq!(screening.overall_hypersensitivity_risk, RiskTier::Critical);
    }

    #[test]
    fn test_no_alleles() {
        let catalog = GenotypeActivityCatalog::standard();
        let screening =
            HlaHypersensitivityScreener::new(&catalog).screen(&AlleleSet::default(), "Abacavir");
        assert_eq!(screening.overall_hypersensitivity_risk, RiskTier::Low);
        assert!(screening.highest_allele_risk.is_none());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// A drug named by a carried allele always yields Critical,
            /// whatever else the patient carries.
            #[test]
            fn matched_drug_forces_critical(
                assoc_idx in 0usize..5,
                drug_idx in 0usize..2,
                noise in proptest::collection::vec("HLA-[A-C]\\*[0-9]{4}", 0..6),
            ) {
                let catalog = GenotypeActivityCatalog::standard();
                let assoc = &catalog.hla_associations()[assoc_idx];
                let drug = assoc.drugs[drug_idx % assoc.drugs.len()].clone();

                let mut alleles = AlleleSet { hla_a: noise, ..AlleleSet::default() };
                alleles.hla_drb1.push(assoc.allele.clone());

                let screening = HlaHypersensitivityScreener::new(&catalog).screen(&alleles, &drug);
                prop_assert_eq!(screening.overall_hypersensitivity_risk, RiskTier::Critical);
                prop_assert!(!screening.drug_specific_risks.is_empty());
            }
        }
    }
}
