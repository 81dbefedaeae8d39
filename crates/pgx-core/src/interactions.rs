//! Concomitant-medication interaction screen
//!
//! Case-insensitive substring matching of each medication name against
//! fixed drug-class lists. At most one hit per list per medication.

use serde::{Deserialize, Serialize};

/// Score ceiling for reporting
pub const MAX_INTERACTION_SCORE: f64 = 10.0;

/// Medication count above which polypharmacy is flagged
pub const POLYPHARMACY_THRESHOLD: usize = 5;

struct HighRiskDrug {
    name: &'static str,
    qt: bool,
    cyp_inhibitor: bool,
    narrow_therapeutic: bool,
    bleeding: bool,
}

const fn high_risk(
    name: &'static str,
    qt: bool,
    cyp_inhibitor: bool,
    narrow_therapeutic: bool,
    bleeding: bool,
) -> HighRiskDrug {
    HighRiskDrug {
        name,
        qt,
        cyp_inhibitor,
        narrow_therapeutic,
        bleeding,
    }
}

const HIGH_RISK_DRUGS: &[HighRiskDrug] = &[
    high_risk("warfarin", false, false, true, true),
    high_risk("digoxin", true, false, true, false),
    high_risk("lithium", false, false, true, false),
    high_risk("phenytoin", false, true, true, false),
    high_risk("carbamazepine", false, true, true, false),
    high_risk("methotrexate", false, false, true, false),
    high_risk("amiodarone", true, true, true, false),
    high_risk("cyclosporine", false, true, true, false),
    high_risk("tacrolimus", true, false, true, false),
    high_risk("theophylline", false, false, true, false),
];

const QT_PROLONGING: &[&str] = &[
    "amiodarone",
    "sotalol",
    "quinidine",
    "procainamide",
    "disopyramide",
    "haloperidol",
    "chlorpromazine",
    "thioridazine",
    "ziprasidone",
    "ondansetron",
    "droperidol",
    "methadone",
    "clarithromycin",
    "erythromycin",
    "azithromycin",
    "ciprofloxacin",
    "levofloxacin",
    "fluconazole",
    "ketoconazole",
];

const CYP_INHIBITORS: &[&str] = &[
    "fluconazole",
    "ketoconazole",
    "itraconazole",
    "voriconazole",
    "erythromycin",
    "clarithromycin",
    "telithromycin",
    "ritonavir",
    "indinavir",
    "nelfinavir",
    "cimetidine",
    "omeprazole",
    "fluvoxamine",
    "grapefruit",
    "grapefruit juice",
];

const BLEEDING_RISK: &[&str] = &[
    "warfarin",
    "heparin",
    "enoxaparin",
    "dabigatran",
    "rivaroxaban",
    "apixaban",
    "aspirin",
    "clopidogrel",
    "prasugrel",
    "ticagrelor",
    "ibuprofen",
    "naproxen",
    "diclofenac",
    "celecoxib",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InteractionSeverity {
    Minor,
    Moderate,
    Major,
}

impl InteractionSeverity {
    fn from_score(score: f64) -> Self {
        if score >= 6.0 {
            InteractionSeverity::Major
        } else if score >= 3.0 {
            InteractionSeverity::Moderate
        } else {
            InteractionSeverity::Minor
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionCounts {
    pub qt_prolonging: u32,
    pub cyp_inhibitor: u32,
    pub bleeding_risk: u32,
    pub narrow_therapeutic: u32,
    pub high_risk_drugs: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InteractionScreen {
    pub total_medication_count: usize,
    pub counts: InteractionCounts,
    pub qt_prolonging_flag: bool,
    pub cyp_inhibitors_flag: bool,
    pub bleeding_risk_flag: bool,
    pub narrow_therapeutic_flag: bool,
    pub polypharmacy_flag: bool,
    /// Capped at [`MAX_INTERACTION_SCORE`]
    pub interaction_risk_score: f64,
    /// Derived from the uncapped score
    pub severity: InteractionSeverity,
    pub detected_drug_risks: Vec<String>,
}

fn mentions_any(list: &[&str], medication: &str) -> bool {
    list.iter().any(|needle| medication.contains(needle))
}

/// Screen the candidate drug together with everything else the patient takes.
/// Blank names are skipped entirely and do not count toward
/// `total_medication_count`.
pub fn screen<'a>(medications: impl IntoIterator<Item = &'a str>) -> InteractionScreen {
    let mut counts = InteractionCounts::default();
    let mut detected = Vec::new();
    let mut total = 0usize;

    for medication in medications {
        let name = medication.trim();
        if name.is_empty() {
            continue;
        }
        total += 1;
        let lower = name.to_lowercase();

        if let Some(drug) = HIGH_RISK_DRUGS.iter().find(|d| lower.contains(d.name)) {
            counts.high_risk_drugs += 1;
            detected.push(format!("High-risk drug detected: {}", name));
            counts.qt_prolonging += drug.qt as u32;
            counts.cyp_inhibitor += drug.cyp_inhibitor as u32;
            counts.narrow_therapeutic += drug.narrow_therapeutic as u32;
            counts.bleeding_risk += drug.bleeding as u32;
        }
        if mentions_any(QT_PROLONGING, &lower) {
            counts.qt_prolonging += 1;
            detected.push(format!("QT-prolonging drug detected: {}", name));
        }
        if mentions_any(CYP_INHIBITORS, &lower) {
            counts.cyp_inhibitor += 1;
            detected.push(format!("CYP inhibitor detected: {}", name));
        }
        if mentions_any(BLEEDING_RISK, &lower) {
            counts.bleeding_risk += 1;
            detected.push(format!("Bleeding risk drug detected: {}", name));
        }
    }

    let raw_score = 2.0 * counts.qt_prolonging as f64
        + 2.0 * counts.cyp_inhibitor as f64
        + 1.5 * counts.bleeding_risk as f64
        + 2.0 * counts.narrow_therapeutic as f64
        + 0.5 * total.saturating_sub(1) as f64;

    let severity = InteractionSeverity::from_score(raw_score);
    tracing::debug!(total, raw_score, ?severity, "Interaction screen complete");

    InteractionScreen {
        total_medication_count: total,
        qt_prolonging_flag: counts.qt_prolonging > 0,
        cyp_inhibitors_flag: counts.cyp_inhibitor > 0,
        bleeding_risk_flag: counts.bleeding_risk > 0,
        narrow_therapeutic_flag: counts.narrow_therapeutic > 0,
        polypharmacy_flag: total > POLYPHARMACY_THRESHOLD,
        interaction_risk_score: raw_score.min(MAX_INTERACTION_SCORE),
        severity,
        detected_drug_risks: detected,
        counts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_benign_drug() {
        let result = screen(["Metformin"]);
        assert_eq!(result.total_medication_count, 1);
        assert_eq!(result.interaction_risk_score, 0.0);
        assert_eq!(result.severity, InteractionSeverity::Minor);
        assert!(result.detected_drug_risks.is_empty());
    }

    #[test]
    fn test_warfarin_counts_both_tables() {
        let result = screen(["Warfarin 5mg"]);
        // high-risk table (narrow + bleeding) and the bleeding list
        assert_eq!(result.counts.high_risk_drugs, 1);
        assert_eq!(result.counts.narrow_therapeutic, 1);
        assert_eq!(result.counts.bleeding_risk, 2);
        assert_eq!(result.interaction_risk_score, 5.0);
        assert_eq!(result.severity, InteractionSeverity::Moderate);
        assert_eq!(
            result.detected_drug_risks,
            vec![
                "High-risk drug detected: Warfarin 5mg",
                "Bleeding risk drug detected: Warfarin 5mg",
            ]
        );
    }

    #[test]
    fn test_amiodarone_with_fluconazole_is_major() {
        let result = screen(["Amiodarone", "Fluconazole"]);
        // amiodarone: table qt+cyp+narrow, qt list
        // fluconazole: qt list, cyp list
        assert_eq!(result.counts.qt_prolonging, 3);
        assert_eq!(result.counts.cyp_inhibitor, 2);
        assert_eq!(result.counts.narrow_therapeutic, 1);
        assert_eq!(result.interaction_risk_score, 10.0);
        assert_eq!(result.severity, InteractionSeverity::Major);
    }

    #[test]
    fn test_polypharmacy_and_blank_names() {
        let meds = ["a", "b", "", "c", "d", "e", "f", "  "];
        let result = screen(meds);
        assert_eq!(result.total_medication_count, 6);
        assert!(result.polypharmacy_flag);
        assert_eq!(result.interaction_risk_score, 2.5);

        // five names: no flag, and blanks add nothing to the n - 1 term
        let result = screen(["a", "", "b", " ", "c", "d", "e"]);
        assert_eq!(result.total_medication_count, 5);
        assert!(!result.polypharmacy_flag);
        assert_eq!(result.interaction_risk_score, 2.0);
    }

    #[test]
    fn test_empty_list() {
        let result = screen(std::iter::empty::<&str>());
        assert_eq!(result.total_medication_count, 0);
        assert_eq!(result.interaction_risk_score, 0.0);
    }
}
