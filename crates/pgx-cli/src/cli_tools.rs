//! Subcommand implementations for the `pgx` binary
//!
//! Each command renders either a colored text report or pretty JSON, and
//! writes it to stdout or the `--output` file.

use crate::OutputFormat;
use anyhow::{bail, Context};
use colored::*;
use pgx_core::catalog::Subject;
use pgx_core::{
    AlleleSet, AssessmentReport, AssessmentRequest, HlaScreening, PatientCovariates, PgxEngine,
    PkOptimization, PkPriorTable, RiskTier,
};
use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

type Result<T> = anyhow::Result<T>;

// =============================================================================
// Output
// =============================================================================

pub struct Output {
    format: OutputFormat,
    path: Option<PathBuf>,
}

impl Output {
    pub fn new(format: OutputFormat, path: Option<PathBuf>) -> Self {
        // escape codes never go into files
        if path.is_some() {
            colored::control::set_override(false);
        }
        Output { format, path }
    }

    fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    /// Serialize `value` as JSON, or fall back to the text renderer
    fn emit<T: Serialize>(&self, value: &T, render: impl FnOnce() -> String) -> Result<()> {
        let body = if self.is_json() {
            serde_json::to_string_pretty(value)?
        } else {
            render()
        };
        self.write(&body)
    }

    fn write(&self, body: &str) -> Result<()> {
        match &self.path {
            Some(path) => {
                fs::write(path, body)
                    .with_context(|| format!("Failed to write output to {}", path.display()))?;
                eprintln!("  Output saved to: {}", path.display().to_string().green());
            }
            None => println!("{}", body),
        }
        Ok(())
    }
}

fn section(out: &mut String, title: &str) {
    let _ = writeln!(out, "{}", "─".repeat(60));
    let _ = writeln!(out, "{}", title.green().bold());
    let _ = writeln!(out, "{}", "─".repeat(60));
}

fn tier(t: RiskTier) -> ColoredString {
    let label = t.to_string();
    match t {
        RiskTier::Critical => label.red().bold(),
        RiskTier::High => label.red(),
        RiskTier::Moderate => label.yellow(),
        RiskTier::Low => label.green(),
    }
}

fn bullets(out: &mut String, items: &[String]) {
    for item in items {
        let _ = writeln!(out, "    • {}", item);
    }
}

// =============================================================================
// Engine setup
// =============================================================================

/// Standard engine, with extra PK priors overlaid when a file is given
pub fn build_engine(pk_priors: Option<&Path>) -> Result<PgxEngine> {
    let mut priors = PkPriorTable::standard();
    if let Some(path) = pk_priors {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read PK priors from {}", path.display()))?;
        let extra = PkPriorTable::from_json_str(&json)
            .with_context(|| format!("Invalid PK priors in {}", path.display()))?;
        tracing::info!(path = %path.display(), drugs = extra.len(), "Loaded PK priors");
        priors.merge(extra);
    }
    Ok(PgxEngine::new(pgx_core::GenotypeActivityCatalog::standard(), priors))
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
    }
}

// =============================================================================
// assess
// =============================================================================

pub fn assess(engine: &PgxEngine, request: &Path, out: &Output) -> Result<()> {
    let json = read_input(request)?;
    let request: AssessmentRequest =
        serde_json::from_str(&json).context("Request is not a valid assessment request")?;
    let report = engine.assess_checked(&request)?;

    out.emit(&report, || render_report(&report))
}

fn render_report(report: &AssessmentReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "═".repeat(60).cyan());
    let _ = writeln!(
        out,
        "{}",
        format!("PHARMACOGENOMIC ASSESSMENT: {}", report.drug).cyan().bold()
    );
    let _ = writeln!(out, "{}", "═".repeat(60).cyan());
    let _ = writeln!(out, "  Standard dose: {}", report.standard_dose);
    let fingerprint = &report.catalog_fingerprint;
    let _ = writeln!(out, "  Catalog: {}", fingerprint.get(..12).unwrap_or(fingerprint));
    let _ = writeln!(out);

    section(&mut out, "CYP METABOLISM");
    for finding in &report.cyp.enzymes {
        let marker = if finding.resolution.is_matched() { "" } else { " (unrecognized)" };
        let _ = writeln!(
            out,
            "  {:<8} {:<14} activity {:.2}  {}{}",
            finding.enzyme.to_string(),
            finding.genotype,
            finding.activity_score,
            tier(finding.risk_level),
            marker.yellow()
        );
    }
    let _ = writeln!(
        out,
        "  Composite: {:.2}  Overall: {}",
        report.cyp.composite_score,
        tier(report.cyp.overall_risk)
    );
    bullets(&mut out, &report.cyp.recommendations);
    let _ = writeln!(out);

    section(&mut out, "TRANSPORTERS");
    for finding in &report.transporters.transporters {
        let _ = writeln!(
            out,
            "  {:<8} {:<16} activity {:.2}  {}",
            finding.transporter.to_string(),
            finding.genotype,
            finding.activity_level,
            tier(finding.risk_category.as_tier())
        );
    }
    let _ = writeln!(out, "  Disposition: {}", tier(report.transporters.disposition_risk));
    bullets(&mut out, &report.transporters.monitoring_recommendations);
    let _ = writeln!(out);

    render_hla_section(&mut out, &report.hla);

    section(&mut out, "DOSE RECOMMENDATION");
    for applied in &report.dosing.adjustments {
        let _ = writeln!(out, "  {:<16} {:.2}", applied.factor.title(), applied.value);
    }
    let _ = writeln!(
        out,
        "  Final factor: {:.2}  Recommended dose: {}",
        report.dosing.final_dose_factor,
        report.dosing.recommended_dose.to_string().cyan().bold()
    );
    bullets(&mut out, &report.dosing.dosing_rationale);
    let _ = writeln!(out);

    render_pk_section(&mut out, &report.pk);

    section(&mut out, "PRECISION SUMMARY");
    let summary = &report.summary;
    let _ = writeln!(
        out,
        "  Genetic risk:   {} (score {})",
        tier(summary.overall_genetic_risk.risk_category),
        summary.overall_genetic_risk.risk_score
    );
    let _ = writeln!(
        out,
        "  Complexity:     {} (score {})",
        tier(summary.dosing_complexity.complexity_level),
        summary.dosing_complexity.complexity_score
    );
    let _ = writeln!(
        out,
        "  Monitoring:     {} ({})",
        summary.monitoring_intensity.intensity_level,
        summary.monitoring_intensity.recommended_frequency
    );
    let _ = writeln!(
        out,
        "  Actionability:  {} - {}",
        tier(summary.clinical_actionability.actionability_level),
        summary.clinical_actionability.urgency_level
    );
    bullets(&mut out, &summary.clinical_actionability.actionable_findings);
    let _ = writeln!(out);

    section(&mut out, "INTERACTIONS AND LABS");
    let _ = writeln!(
        out,
        "  Medications: {}  Interaction score: {:.1} ({:?})",
        report.interactions.total_medication_count,
        report.interactions.interaction_risk_score,
        report.interactions.severity
    );
    bullets(&mut out, &report.interactions.detected_drug_risks);
    for finding in &report.labs.findings {
        let _ = writeln!(
            out,
            "  {:<10} {} {}  {}",
            finding.test.label(),
            finding.value,
            finding.unit,
            tier(finding.severity)
        );
    }
    if let Some(rec) = report.labs.overall_recommendation() {
        let _ = writeln!(out, "  {}", rec.yellow());
    }

    if !report.unmatched_genotypes.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{} unrecognized genotypes treated as normal function:",
            "Warning:".yellow().bold()
        );
        bullets(&mut out, &report.unmatched_genotypes);
    }

    out
}

fn render_hla_section(out: &mut String, hla: &HlaScreening) {
    section(out, "HLA HYPERSENSITIVITY");
    if hla.high_risk_alleles_present.is_empty() {
        let _ = writeln!(out, "  No risk alleles present");
    }
    for allele in &hla.high_risk_alleles_present {
        let _ = writeln!(
            out,
            "  {:<14} {}  {}",
            allele.allele,
            tier(allele.risk_level),
            allele.reaction_type
        );
    }
    let _ = writeln!(out, "  Overall: {}", tier(hla.overall_hypersensitivity_risk));
    for rec in &hla.recommendations {
        if rec.starts_with("CONTRAINDICATED") {
            let _ = writeln!(out, "    • {}", rec.red().bold());
        } else {
            let _ = writeln!(out, "    • {}", rec);
        }
    }
    let _ = writeln!(out);
}

fn render_pk_section(out: &mut String, pk: &PkOptimization) {
    section(out, "BAYESIAN PHARMACOKINETICS");
    match pk {
        PkOptimization::Unavailable { error, .. } => {
            let _ = writeln!(out, "  {}", error.dimmed());
        }
        PkOptimization::Optimized(estimate) => {
            let _ = writeln!(
                out,
                "  Clearance: {:.3} L/h  Volume: {:.3} L",
                estimate.updated.clearance, estimate.updated.volume
            );
            match estimate.half_life_hours {
                Some(t) => {
                    let _ = writeln!(out, "  Half-life: {:.1} h", t);
                }
                None => {
                    let _ = writeln!(out, "  Half-life: {}", "undefined".yellow());
                }
            }
            let _ = writeln!(
                out,
                "  Target: {}-{} {}",
                estimate.target.min, estimate.target.max, estimate.target.unit
            );
            if let Some(dose) = estimate.optimized_dose {
                let _ = writeln!(out, "  Optimized dose: {}", dose.to_string().cyan().bold());
            }
            let _ = writeln!(out, "  {}", estimate.clinical_interpretation);
            if let Some(sampling) = &estimate.next_sampling {
                let _ = writeln!(out, "  Next sample: {}", sampling.recommended_time);
            }
        }
    }
    let _ = writeln!(out);
}

// =============================================================================
// batch
// =============================================================================

#[cfg(feature = "parallel")]
#[derive(Serialize)]
struct BatchOutput<'a> {
    total: usize,
    succeeded: usize,
    processing_time_ms: u64,
    reports: Vec<IndexedReport<'a>>,
    failures: Vec<FailureOutput<'a>>,
}

#[cfg(feature = "parallel")]
#[derive(Serialize)]
struct IndexedReport<'a> {
    index: usize,
    report: &'a AssessmentReport,
}

#[cfg(feature = "parallel")]
#[derive(Serialize)]
struct FailureOutput<'a> {
    index: usize,
    error: &'a str,
}

#[cfg(feature = "parallel")]
pub fn batch(engine: &PgxEngine, requests: &Path, parallel: bool, out: &Output) -> Result<()> {
    use indicatif::{ProgressBar, ProgressStyle};
    use pgx_core::batch::{BatchAssessor, BatchConfig};

    let json = read_input(requests)?;
    let requests: Vec<AssessmentRequest> =
        serde_json::from_str(&json).context("Expected a JSON array of assessment requests")?;

    let pb = ProgressBar::new(requests.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let assessor = BatchAssessor::new(engine, BatchConfig::default().with_parallel(parallel));
    let result = assessor.assess_all_with_progress(&requests, || pb.inc(1));
    pb.finish_with_message("done");

    let output = BatchOutput {
        total: result.total_count(),
        succeeded: result.success_count(),
        processing_time_ms: result.stats.processing_time_ms,
        reports: result
            .reports
            .iter()
            .map(|(index, report)| IndexedReport { index: *index, report })
            .collect(),
        failures: result
            .failures
            .iter()
            .map(|f| FailureOutput { index: f.index, error: &f.error })
            .collect(),
    };

    out.emit(&output, || {
        let mut text = String::new();
        section(&mut text, "BATCH ASSESSMENT");
        let _ = writeln!(
            text,
            "  Assessed: {}/{}  ({:.1}%)  in {} ms",
            result.success_count().to_string().cyan(),
            result.total_count(),
            result.success_rate() * 100.0,
            result.stats.processing_time_ms
        );
        let _ = writeln!(text);
        for (index, report) in &result.reports {
            let _ = writeln!(
                text,
                "  [{:>4}] {:<16} dose {:<10} genetic {:<8} HLA {}",
                index,
                report.drug,
                report.dosing.recommended_dose,
                tier(report.summary.overall_genetic_risk.risk_category),
                tier(report.hla.overall_hypersensitivity_risk)
            );
        }
        for failure in &result.failures {
            let _ = writeln!(
                text,
                "  [{:>4}] {} {}",
                failure.index,
                "invalid:".red(),
                failure.error
            );
        }
        text
    })
}

// =============================================================================
// hla / pk
// =============================================================================

pub fn hla(engine: &PgxEngine, drug: &str, alleles: &AlleleSet, out: &Output) -> Result<()> {
    if drug.trim().is_empty() {
        bail!("Drug name must not be empty");
    }
    let screening = engine.screen_hla(alleles, drug.trim());

    out.emit(&screening, || {
        let mut text = String::new();
        render_hla_section(&mut text, &screening);
        if !screening.unmatched_alleles.is_empty() {
            let _ = writeln!(text, "  Not in catalog: {}", screening.unmatched_alleles.join(", "));
        }
        text
    })
}

pub fn pk(
    engine: &PgxEngine,
    drug: &str,
    dose: f64,
    covariates: &PatientCovariates,
    levels: &[f64],
    out: &Output,
) -> Result<()> {
    if !(dose.is_finite() && dose > 0.0) {
        bail!("Dose must be positive, got {}", dose);
    }
    let optimization = engine.optimize_pk(drug.trim(), covariates, dose, levels);

    out.emit(&optimization, || {
        let mut text = String::new();
        render_pk_section(&mut text, &optimization);
        text
    })
}

// =============================================================================
// catalog
// =============================================================================

#[derive(Serialize)]
struct VocabularyOutput {
    subject: String,
    default_genotype: String,
    genotypes: Vec<GenotypeEntry>,
    substrate_drugs: Vec<String>,
}

#[derive(Serialize)]
struct GenotypeEntry {
    label: String,
    activity: f64,
    risk: RiskTier,
}

#[derive(Serialize)]
struct CatalogOutput<'a> {
    fingerprint: &'a str,
    subjects: Vec<VocabularyOutput>,
    hla_associations: &'a [pgx_core::DrugAlleleAssociation],
    pk_drugs: Vec<&'a str>,
}

fn vocabulary(engine: &PgxEngine, subject: Subject) -> VocabularyOutput {
    let (default_genotype, genotypes) = match subject {
        Subject::Enzyme(enzyme) => (
            enzyme.default_genotype(),
            enzyme
                .vocabulary()
                .into_iter()
                .map(|(label, activity)| GenotypeEntry {
                    label: label.to_string(),
                    activity,
                    risk: RiskTier::from_enzyme_activity(activity),
                })
                .collect(),
        ),
        Subject::Transporter(transporter) => (
            transporter.default_genotype(),
            transporter
                .vocabulary()
                .into_iter()
                .map(|(label, activity, risk)| GenotypeEntry {
                    label: label.to_string(),
                    activity,
                    risk: risk.as_tier(),
                })
                .collect(),
        ),
    };
    VocabularyOutput {
        subject: subject.to_string(),
        default_genotype: default_genotype.to_string(),
        genotypes,
        substrate_drugs: engine.catalog().substrate_drugs(subject),
    }
}

pub fn catalog(engine: &PgxEngine, subject: Option<&str>, out: &Output) -> Result<()> {
    let subjects: Vec<Subject> = match subject {
        Some(name) => vec![name.parse::<Subject>()?],
        None => pgx_core::CypEnzyme::ALL
            .iter()
            .map(|e| Subject::Enzyme(*e))
            .chain(pgx_core::Transporter::ALL.iter().map(|t| Subject::Transporter(*t)))
            .collect(),
    };
    let show_tables = subject.is_none();

    let output = CatalogOutput {
        fingerprint: engine.catalog().fingerprint(),
        subjects: subjects.into_iter().map(|s| vocabulary(engine, s)).collect(),
        hla_associations: if show_tables { engine.catalog().hla_associations() } else { &[] },
        pk_drugs: if show_tables { engine.pk_priors().drugs().collect() } else { Vec::new() },
    };

    out.emit(&output, || {
        let mut text = String::new();
        for vocab in &output.subjects {
            section(&mut text, &vocab.subject);
            for entry in &vocab.genotypes {
                let default = if entry.label == vocab.default_genotype { " (default)" } else { "" };
                let _ = writeln!(
                    text,
                    "  {:<18} {:.2}  {}{}",
                    entry.label,
                    entry.activity,
                    tier(entry.risk),
                    default.dimmed()
                );
            }
            let _ = writeln!(text, "  Substrates: {}", vocab.substrate_drugs.join(", "));
            let _ = writeln!(text);
        }
        if show_tables {
            section(&mut text, "HLA ASSOCIATIONS");
            for assoc in output.hla_associations {
                let _ = writeln!(
                    text,
                    "  {:<14} {}  {} ({})",
                    assoc.allele,
                    tier(assoc.risk_level),
                    assoc.drugs.join(", "),
                    assoc.reaction
                );
            }
            let _ = writeln!(text);
            section(&mut text, "PK PRIORS");
            let _ = writeln!(text, "  {}", output.pk_drugs.join(", "));
            let _ = writeln!(text);
        }
        let _ = writeln!(text, "  Fingerprint: {}", output.fingerprint.dimmed());
        text
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_engine_merges_priors() {
        let dir = std::env::temp_dir().join(format!("pgx-priors-{}.json", std::process::id()));
        fs::write(
            &dir,
            r#"{"Vancomycin": {"clearance": 4.5, "volume": 50.0,
                "target": {"min": 10.0, "max": 20.0, "unit": "mg/L"}}}"#,
        )
        .unwrap();

        let engine = build_engine(Some(&dir)).unwrap();
        fs::remove_file(&dir).ok();

        assert!(engine.pk_priors().get("vancomycin").is_some());
        assert!(engine.pk_priors().get("Warfarin").is_some());
    }

    #[test]
    fn test_missing_priors_file_is_an_error() {
        assert!(build_engine(Some(Path::new("/nonexistent/priors.json"))).is_err());
    }

    #[test]
    fn test_text_report_flags_contraindication() {
        colored::control::set_override(false);
        let engine = PgxEngine::standard();
        let mut request = AssessmentRequest::new("Abacavir", 300.0);
        request.hla.hla_b.push("HLA-B*5701".to_string());

        let text = render_report(&engine.assess(&request));
        assert!(text.contains("HLA HYPERSENSITIVITY"));
        assert!(text.contains("CONTRAINDICATED - Abacavir"));
        assert!(text.contains("Overall: Critical"));
    }

    #[test]
    fn test_unknown_catalog_subject_is_rejected() {
        let out = Output::new(OutputFormat::Json, None);
        assert!(catalog(&PgxEngine::standard(), Some("CYP9Z9"), &out).is_err());
    }
}
