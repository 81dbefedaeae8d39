//! Assessment engine
//!
//! [`PgxEngine`] owns the read-only reference tables and runs one
//! assessment per call. Nothing inside is mutated after construction, so a
//! single engine can be shared across threads.

use crate::aggregate::{PrecisionSummary, RiskAggregator};
use crate::catalog::GenotypeActivityCatalog;
use crate::cyp::{CypAnalysis, CypMetabolismAnalyzer};
use crate::dosing::{DoseAdjustmentCalculator, DoseRecommendation};
use crate::hla::{HlaHypersensitivityScreener, HlaScreening};
use crate::interactions::{self, InteractionScreen};
use crate::labs::{self, LabAssessment};
use crate::patient::{AlleleSet, AssessmentRequest, PatientCovariates};
use crate::pk::{BayesianPkOptimizer, PkOptimization, PkPriorTable};
use crate::transporter::{TransporterAnalysis, TransporterDispositionAnalyzer};
use crate::Result;
use serde::{Deserialize, Serialize};

/// Everything computed for one request
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssessmentReport {
    pub drug: String,
    pub standard_dose: f64,
    /// SHA-256 of the reference tables used
    pub catalog_fingerprint: String,
    pub cyp: CypAnalysis,
    pub transporters: TransporterAnalysis,
    pub hla: HlaScreening,
    pub dosing: DoseRecommendation,
    pub pk: PkOptimization,
    pub summary: PrecisionSummary,
    pub interactions: InteractionScreen,
    pub labs: LabAssessment,
    /// "<subject>: <label>" for every genotype that fell back to the default
    pub unmatched_genotypes: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct PgxEngine {
    catalog: GenotypeActivityCatalog,
    pk_priors: PkPriorTable,
    dose_calculator: DoseAdjustmentCalculator,
    aggregator: RiskAggregator,
}

impl Default for PgxEngine {
    fn default() -> Self {
        Self::standard()
    }
}

impl PgxEngine {
    /// Engine over the built-in catalog and PK priors
    pub fn standard() -> Self {
        Self::new(GenotypeActivityCatalog::standard(), PkPriorTable::standard())
    }

    pub fn new(catalog: GenotypeActivityCatalog, pk_priors: PkPriorTable) -> Self {
        tracing::debug!(
            fingerprint = catalog.fingerprint(),
            pk_drugs = pk_priors.len(),
            "Engine initialized"
        );
        PgxEngine {
            catalog,
            pk_priors,
            dose_calculator: DoseAdjustmentCalculator::new(),
            aggregator: RiskAggregator::new(),
        }
    }

    pub fn catalog(&self) -> &GenotypeActivityCatalog {
        &self.catalog
    }

    pub fn pk_priors(&self) -> &PkPriorTable {
        &self.pk_priors
    }

    /// Validate, then assess
    pub fn assess_checked(&self, request: &AssessmentRequest) -> Result<AssessmentReport> {
        request.validate()?;
        Ok(self.assess(request))
    }

    /// Run every component. Never fails: unknown labels, missing priors and
    /// degenerate arithmetic all resolve to explicit fallbacks in the report.
    pub fn assess(&self, request: &AssessmentRequest) -> AssessmentReport {
        let drug = request.drug.trim();

        let cyp = CypMetabolismAnalyzer::new(&self.catalog).analyze(&request.genotypes);
        let transporters =
            TransporterDispositionAnalyzer::new(&self.catalog).analyze(&request.genotypes);
        let hla = self.screen_hla(&request.hla, drug);
        let dosing = self.dose_calculator.calculate(
            drug,
            request.standard_dose,
            &request.covariates,
            cyp.composite_score,
        );
        let pk = self.optimize_pk(
            drug,
            &request.covariates,
            request.standard_dose,
            &request.measured_levels,
        );
        let summary = self.aggregator.summarize(&cyp, &transporters, &hla, &dosing);

        let interactions = interactions::screen(
            std::iter::once(drug).chain(request.concomitant_medications.iter().map(String::as_str)),
        );
        let labs = labs::assess(&request.covariates);

        let unmatched_genotypes: Vec<String> = cyp
            .unmatched()
            .map(|f| format!("{}: {}", f.enzyme, f.genotype))
            .chain(
                transporters
                    .unmatched()
                    .map(|f| format!("{}: {}", f.transporter, f.genotype)),
            )
            .collect();

        tracing::info!(
            drug,
            recommended_dose = dosing.recommended_dose,
            genetic_risk = %summary.overall_genetic_risk.risk_category,
            actionability = %summary.clinical_actionability.actionability_level,
            hla_risk = %hla.overall_hypersensitivity_risk,
            pk_available = pk.is_available(),
            unmatched = unmatched_genotypes.len(),
            fingerprint = self.catalog.fingerprint(),
            "Assessment complete"
        );

        AssessmentReport {
            drug: drug.to_string(),
            standard_dose: request.standard_dose,
            catalog_fingerprint: self.catalog.fingerprint().to_string(),
            cyp,
            transporters,
            hla,
            dosing,
            pk,
            summary,
            interactions,
            labs,
            unmatched_genotypes,
        }
    }

    /// HLA screen alone
    pub fn screen_hla(&self, alleles: &AlleleSet, drug: &str) -> HlaScreening {
        HlaHypersensitivityScreener::new(&self.catalog).screen(alleles, drug)
    }

    /// PK optimization alone
    pub fn optimize_pk(
        &self,
        drug: &str,
        covariates: &PatientCovariates,
        current_dose: f64,
        measured_levels: &[f64],
    ) -> PkOptimization {
        BayesianPkOptimizer::new(&self.pk_priors).optimize(drug, covariates, current_dose, measured_levels)
    }
}
