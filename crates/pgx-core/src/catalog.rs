//! Genotype Activity Catalog
//!
//! Immutable reference tables for drug-metabolizing enzymes, drug
//! transporters and HLA hypersensitivity alleles.
//!
//! Each enzyme and transporter has its own closed genotype vocabulary
//! (CYP2C9 uses Poor/Intermediate/Wild/Rapid, CYP2D6 uses PM/IM/EM/UM, ...).
//! Labels from one vocabulary are never accepted for another subject.
//! A label outside the vocabulary resolves to the documented fallback
//! (activity 1.0, tier Low) and is reported as [`Resolution::Unmatched`].

use crate::{PgxError, RiskTier};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Activity assumed for a genotype label that is not in the vocabulary
pub const UNMATCHED_ACTIVITY: f64 = 1.0;

/// Declares a closed genotype vocabulary: one variant per label with its
/// activity score.
macro_rules! genotype_vocabulary {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $label:literal, $activity:literal; )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
        }

        impl $name {
            /// Every label of this vocabulary, in table order
            pub const ALL: &'static [$name] = &[ $( $name::$variant, )+ ];

            /// Exact-match parse of a genotype label
            pub fn parse(label: &str) -> Option<Self> {
                match label {
                    $( $label => Some($name::$variant), )+
                    _ => None,
                }
            }

            /// Genotype label as written in reports
            pub fn label(self) -> &'static str {
                match self {
                    $( $name::$variant => $label, )+
                }
            }

            /// Activity score (1.0 = normal function)
            pub fn activity(self) -> f64 {
                match self {
                    $( $name::$variant => $activity, )+
                }
            }
        }
    };
}

// =============================================================================
// CYP450 vocabularies
// =============================================================================

genotype_vocabulary! {
    /// CYP2C9 phenotype calls
    Cyp2C9Genotype {
        Poor => "Poor", 0.1;
        Intermediate => "Intermediate", 0.5;
        /// Wild type (normal function)
        Wild => "Wild", 1.0;
        Rapid => "Rapid", 1.5;
    }
}

genotype_vocabulary! {
    /// CYP2D6 metabolizer classes
    Cyp2D6Genotype {
        /// Poor metabolizer
        Pm => "PM", 0.0;
        /// Intermediate metabolizer
        Im => "IM", 0.5;
        /// Extensive (normal) metabolizer
        Em => "EM", 1.0;
        /// Ultrarapid metabolizer
        Um => "UM", 2.0;
    }
}

genotype_vocabulary! {
    /// CYP3A4 phenotype calls
    Cyp3A4Genotype {
        Poor => "Poor", 0.2;
        Intermediate => "Intermediate", 0.6;
        Normal => "Normal", 1.0;
        Rapid => "Rapid", 1.8;
    }
}

genotype_vocabulary! {
    /// CYP1A2 phenotype calls
    Cyp1A2Genotype {
        Slow => "Slow", 0.3;
        Intermediate => "Intermediate", 0.7;
        Normal => "Normal", 1.0;
        Rapid => "Rapid", 1.6;
    }
}

genotype_vocabulary! {
    /// CYP2B6 phenotype calls
    Cyp2B6Genotype {
        Poor => "Poor", 0.1;
        Intermediate => "Intermediate", 0.4;
        Normal => "Normal", 1.0;
        Rapid => "Rapid", 1.7;
    }
}

genotype_vocabulary! {
    /// CYP2C19 metabolizer classes
    Cyp2C19Genotype {
        Pm => "PM", 0.0;
        Im => "IM", 0.3;
        Em => "EM", 1.0;
        /// Rapid metabolizer
        Rm => "RM", 1.5;
        Um => "UM", 2.5;
    }
}

// =============================================================================
// Transporter vocabularies
// =============================================================================

genotype_vocabulary! {
    /// SLCO1B1 (OATP1B1) diplotypes
    Slco1b1Genotype {
        Star1Star1 => "*1/*1", 1.0;
        Star5Star5 => "*5/*5", 0.2;
        Star15Star15 => "*15/*15", 0.3;
        Star1Star5 => "*1/*5", 0.6;
        Star1Star15 => "*1/*15", 0.65;
    }
}

genotype_vocabulary! {
    /// ABCB1 (P-glycoprotein) C3435T genotypes
    Abcb1Genotype {
        Cc => "CC", 1.0;
        Ct => "CT", 0.7;
        Tt => "TT", 0.4;
    }
}

genotype_vocabulary! {
    /// ABCG2 (BCRP) genotypes
    Abcg2Genotype {
        WildWild => "Wild/Wild", 1.0;
        WildVariant => "Wild/Variant", 0.6;
        VariantVariant => "Variant/Variant", 0.3;
    }
}

impl Slco1b1Genotype {
    fn risk(self) -> TransporterRisk {
        match self {
            Slco1b1Genotype::Star1Star1 => TransporterRisk::Low,
            Slco1b1Genotype::Star5Star5 | Slco1b1Genotype::Star15Star15 => TransporterRisk::High,
            Slco1b1Genotype::Star1Star5 | Slco1b1Genotype::Star1Star15 => {
                TransporterRisk::Intermediate
            }
        }
    }
}

impl Abcb1Genotype {
    fn risk(self) -> TransporterRisk {
        match self {
            Abcb1Genotype::Cc => TransporterRisk::Low,
            Abcb1Genotype::Ct => TransporterRisk::Intermediate,
            Abcb1Genotype::Tt => TransporterRisk::High,
        }
    }
}

impl Abcg2Genotype {
    fn risk(self) -> TransporterRisk {
        match self {
            Abcg2Genotype::WildWild => TransporterRisk::Low,
            Abcg2Genotype::WildVariant => TransporterRisk::Intermediate,
            Abcg2Genotype::VariantVariant => TransporterRisk::High,
        }
    }
}

// =============================================================================
// Subjects
// =============================================================================

/// Drug-metabolizing CYP450 enzymes covered by the catalog
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CypEnzyme {
    #[serde(rename = "CYP2C9")]
    Cyp2C9,
    #[serde(rename = "CYP2D6")]
    Cyp2D6,
    #[serde(rename = "CYP3A4")]
    Cyp3A4,
    #[serde(rename = "CYP1A2")]
    Cyp1A2,
    #[serde(rename = "CYP2B6")]
    Cyp2B6,
    #[serde(rename = "CYP2C19")]
    Cyp2C19,
}

impl CypEnzyme {
    /// All enzymes in report order
    pub const ALL: [CypEnzyme; 6] = [
        CypEnzyme::Cyp2C9,
        CypEnzyme::Cyp2D6,
        CypEnzyme::Cyp3A4,
        CypEnzyme::Cyp1A2,
        CypEnzyme::Cyp2B6,
        CypEnzyme::Cyp2C19,
    ];

    /// Gene symbol (e.g., "CYP2D6")
    pub fn name(self) -> &'static str {
        match self {
            CypEnzyme::Cyp2C9 => "CYP2C9",
            CypEnzyme::Cyp2D6 => "CYP2D6",
            CypEnzyme::Cyp3A4 => "CYP3A4",
            CypEnzyme::Cyp1A2 => "CYP1A2",
            CypEnzyme::Cyp2B6 => "CYP2B6",
            CypEnzyme::Cyp2C19 => "CYP2C19",
        }
    }

    /// Case-insensitive gene symbol lookup
    pub fn from_name(name: &str) -> Option<Self> {
        CypEnzyme::ALL
            .into_iter()
            .find(|e| e.name().eq_ignore_ascii_case(name.trim()))
    }

    /// Neutral genotype assumed when the profile omits this enzyme
    pub fn default_genotype(self) -> &'static str {
        match self {
            CypEnzyme::Cyp2C9 => Cyp2C9Genotype::Wild.label(),
            CypEnzyme::Cyp2D6 => Cyp2D6Genotype::Em.label(),
            CypEnzyme::Cyp3A4 => Cyp3A4Genotype::Normal.label(),
            CypEnzyme::Cyp1A2 => Cyp1A2Genotype::Normal.label(),
            CypEnzyme::Cyp2B6 => Cyp2B6Genotype::Normal.label(),
            CypEnzyme::Cyp2C19 => Cyp2C19Genotype::Em.label(),
        }
    }

    /// Activity score for a label of this enzyme's vocabulary
    pub fn activity_for(self, label: &str) -> Option<f64> {
        match self {
            CypEnzyme::Cyp2C9 => Cyp2C9Genotype::parse(label).map(Cyp2C9Genotype::activity),
            CypEnzyme::Cyp2D6 => Cyp2D6Genotype::parse(label).map(Cyp2D6Genotype::activity),
            CypEnzyme::Cyp3A4 => Cyp3A4Genotype::parse(label).map(Cyp3A4Genotype::activity),
            CypEnzyme::Cyp1A2 => Cyp1A2Genotype::parse(label).map(Cyp1A2Genotype::activity),
            CypEnzyme::Cyp2B6 => Cyp2B6Genotype::parse(label).map(Cyp2B6Genotype::activity),
            CypEnzyme::Cyp2C19 => Cyp2C19Genotype::parse(label).map(Cyp2C19Genotype::activity),
        }
    }

    /// (label, activity) pairs of this enzyme's vocabulary
    pub fn vocabulary(self) -> Vec<(&'static str, f64)> {
        fn pairs<T: Copy>(all: &[T], label: fn(T) -> &'static str, activity: fn(T) -> f64) -> Vec<(&'static str, f64)> {
            all.iter().map(|g| (label(*g), activity(*g))).collect()
        }
        match self {
            CypEnzyme::Cyp2C9 => pairs(Cyp2C9Genotype::ALL, Cyp2C9Genotype::label, Cyp2C9Genotype::activity),
            CypEnzyme::Cyp2D6 => pairs(Cyp2D6Genotype::ALL, Cyp2D6Genotype::label, Cyp2D6Genotype::activity),
            CypEnzyme::Cyp3A4 => pairs(Cyp3A4Genotype::ALL, Cyp3A4Genotype::label, Cyp3A4Genotype::activity),
            CypEnzyme::Cyp1A2 => pairs(Cyp1A2Genotype::ALL, Cyp1A2Genotype::label, Cyp1A2Genotype::activity),
            CypEnzyme::Cyp2B6 => pairs(Cyp2B6Genotype::ALL, Cyp2B6Genotype::label, Cyp2B6Genotype::activity),
            CypEnzyme::Cyp2C19 => pairs(Cyp2C19Genotype::ALL, Cyp2C19Genotype::label, Cyp2C19Genotype::activity),
        }
    }

    /// Representative substrate drugs
    pub fn substrate_drugs(self) -> &'static [&'static str] {
        match self {
            CypEnzyme::Cyp2C9 => &["Warfarin", "Phenytoin", "Tolbutamide", "S-Warfarin", "Losartan"],
            CypEnzyme::Cyp2D6 => &["Codeine", "Tramadol", "Metoprolol", "Paroxetine", "Risperidone"],
            CypEnzyme::Cyp3A4 => &["Simvastatin", "Midazolam", "Cyclosporine", "Tacrolimus", "Nifedipine"],
            CypEnzyme::Cyp1A2 => &["Caffeine", "Theophylline", "Clozapine", "Olanzapine", "Tizanidine"],
            CypEnzyme::Cyp2B6 => &["Bupropion", "Efavirenz", "Cyclophosphamide", "Ketamine"],
            CypEnzyme::Cyp2C19 => &["Omeprazole", "Clopidogrel", "Escitalopram", "Diazepam", "Phenytoin"],
        }
    }
}

impl std::fmt::Display for CypEnzyme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Drug transporters covered by the catalog
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Transporter {
    #[serde(rename = "SLCO1B1")]
    Slco1b1,
    #[serde(rename = "ABCB1")]
    Abcb1,
    #[serde(rename = "ABCG2")]
    Abcg2,
}

impl Transporter {
    /// All transporters in report order
    pub const ALL: [Transporter; 3] = [Transporter::Slco1b1, Transporter::Abcb1, Transporter::Abcg2];

    pub fn name(self) -> &'static str {
        match self {
            Transporter::Slco1b1 => "SLCO1B1",
            Transporter::Abcb1 => "ABCB1",
            Transporter::Abcg2 => "ABCG2",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Transporter::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(name.trim()))
    }

    /// Neutral genotype assumed when the profile omits this transporter
    pub fn default_genotype(self) -> &'static str {
        match self {
            Transporter::Slco1b1 => Slco1b1Genotype::Star1Star1.label(),
            Transporter::Abcb1 => Abcb1Genotype::Cc.label(),
            Transporter::Abcg2 => Abcg2Genotype::WildWild.label(),
        }
    }

    /// (activity, risk) for a genotype of this transporter's vocabulary
    pub fn profile_for(self, label: &str) -> Option<(f64, TransporterRisk)> {
        match self {
            Transporter::Slco1b1 => Slco1b1Genotype::parse(label).map(|g| (g.activity(), g.risk())),
            Transporter::Abcb1 => Abcb1Genotype::parse(label).map(|g| (g.activity(), g.risk())),
            Transporter::Abcg2 => Abcg2Genotype::parse(label).map(|g| (g.activity(), g.risk())),
        }
    }

    /// (label, activity, risk) triples of this transporter's vocabulary
    pub fn vocabulary(self) -> Vec<(&'static str, f64, TransporterRisk)> {
        match self {
            Transporter::Slco1b1 => Slco1b1Genotype::ALL
                .iter()
                .map(|g| (g.label(), g.activity(), g.risk()))
                .collect(),
            Transporter::Abcb1 => Abcb1Genotype::ALL
                .iter()
                .map(|g| (g.label(), g.activity(), g.risk()))
                .collect(),
            Transporter::Abcg2 => Abcg2Genotype::ALL
                .iter()
                .map(|g| (g.label(), g.activity(), g.risk()))
                .collect(),
        }
    }

    /// Representative substrate drugs
    pub fn substrate_drugs(self) -> &'static [&'static str] {
        match self {
            Transporter::Slco1b1 => &["Simvastatin", "Atorvastatin", "Rosuvastatin", "Metformin", "Repaglinide"],
            Transporter::Abcb1 => &["Digoxin", "Dabigatran", "Fexofenadine", "Loperamide", "Cyclosporine"],
            Transporter::Abcg2 => &["Rosuvastatin", "Sulfasalazine", "Methotrexate", "Topotecan", "Imatinib"],
        }
    }

    /// Clinical implication keyed by transporter and risk tier
    pub fn clinical_implication(self, risk: TransporterRisk) -> &'static str {
        match (self, risk) {
            (Transporter::Slco1b1, TransporterRisk::High) => {
                "Increased risk of statin-induced myopathy - consider dose reduction"
            }
            (Transporter::Slco1b1, TransporterRisk::Intermediate) => {
                "Moderate risk - enhanced monitoring recommended"
            }
            (Transporter::Slco1b1, TransporterRisk::Low) => "Standard statin therapy appropriate",
            (Transporter::Abcb1, TransporterRisk::High) => {
                "Increased drug exposure - consider dose reduction for P-gp substrates"
            }
            (Transporter::Abcb1, TransporterRisk::Intermediate) => {
                "Moderate exposure increase - monitor for toxicity"
            }
            (Transporter::Abcb1, TransporterRisk::Low) => "Standard dosing for P-gp substrates",
            (Transporter::Abcg2, TransporterRisk::High) => {
                "Increased drug exposure - dose reduction may be needed"
            }
            (Transporter::Abcg2, TransporterRisk::Intermediate) => "Monitor for increased drug effects",
            (Transporter::Abcg2, TransporterRisk::Low) => "Standard protocols appropriate",
        }
    }
}

impl std::fmt::Display for Transporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Transporter risk category as declared in the transporter table
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TransporterRisk {
    Low,
    Intermediate,
    High,
}

impl TransporterRisk {
    /// Map onto the shared four-level tier
    pub fn as_tier(self) -> RiskTier {
        match self {
            TransporterRisk::Low => RiskTier::Low,
            TransporterRisk::Intermediate => RiskTier::Moderate,
            TransporterRisk::High => RiskTier::High,
        }
    }
}

impl std::fmt::Display for TransporterRisk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransporterRisk::Low => write!(f, "Low"),
            TransporterRisk::Intermediate => write!(f, "Intermediate"),
            TransporterRisk::High => write!(f, "High"),
        }
    }
}

/// Anything with a genotype vocabulary in the catalog
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subject {
    Enzyme(CypEnzyme),
    Transporter(Transporter),
}

impl Subject {
    pub fn name(self) -> &'static str {
        match self {
            Subject::Enzyme(e) => e.name(),
            Subject::Transporter(t) => t.name(),
        }
    }

    pub fn substrate_drugs(self) -> &'static [&'static str] {
        match self {
            Subject::Enzyme(e) => e.substrate_drugs(),
            Subject::Transporter(t) => t.substrate_drugs(),
        }
    }
}

impl std::str::FromStr for Subject {
    type Err = PgxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(enzyme) = CypEnzyme::from_name(s) {
            return Ok(Subject::Enzyme(enzyme));
        }
        Transporter::from_name(s)
            .map(Subject::Transporter)
            .ok_or_else(|| PgxError::UnknownGenotypeSubject(s.to_string()))
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Lookups
// =============================================================================

/// Whether a genotype label was found in its subject's vocabulary
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    /// Label belongs to the vocabulary; values come from the table
    Matched,
    /// Label not recognized; the normal-function fallback was substituted
    Unmatched,
}

impl Resolution {
    pub fn is_matched(self) -> bool {
        self == Resolution::Matched
    }
}

/// Result of a `(subject, label)` catalog lookup
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActivityLookup {
    pub activity_score: f64,
    pub risk_tier: RiskTier,
    pub resolution: Resolution,
}

/// Result of a transporter lookup, keeping the table's own risk category
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransporterLookup {
    pub activity: f64,
    pub risk: TransporterRisk,
    pub resolution: Resolution,
}

/// HLA allele associated with immune-mediated drug hypersensitivity
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DrugAlleleAssociation {
    /// Allele identifier (e.g., "HLA-B*5701")
    pub allele: String,
    /// Drugs that must not be given to carriers
    pub drugs: Vec<String>,
    /// Reaction the allele predisposes to
    pub reaction: String,
    /// Declared risk level
    pub risk_level: RiskTier,
}

impl DrugAlleleAssociation {
    pub fn new(allele: &str, drugs: &[&str], reaction: &str, risk_level: RiskTier) -> Self {
        DrugAlleleAssociation {
            allele: allele.to_string(),
            drugs: drugs.iter().map(|d| d.to_string()).collect(),
            reaction: reaction.to_string(),
            risk_level,
        }
    }

    /// Whole-name membership test, ignoring ASCII case and surrounding
    /// whitespace, so `" abacavir"` implicates an `Abacavir` entry. Substrings
    /// never match.
    pub fn implicates(&self, drug: &str) -> bool {
        let drug = drug.trim();
        self.drugs.iter().any(|d| d.eq_ignore_ascii_case(drug))
    }
}

/// Read-only reference tables, built once at startup and shared by every assessment.
///
/// # Example
///
/// ```
/// use pgx_core::{CypEnzyme, GenotypeActivityCatalog, Subject};
/// use pgx_core::catalog::Resolution;
///
/// let catalog = GenotypeActivityCatalog::standard();
///
/// let pm = catalog.lookup(Subject::Enzyme(CypEnzyme::Cyp2D6), "PM");
/// assert_eq!(pm.activity_score, 0.0);
///
/// // CYP2D6 does not use the CYP2C9 vocabulary
/// let miss = catalog.lookup(Subject::Enzyme(CypEnzyme::Cyp2D6), "Poor");
/// assert_eq!(miss.activity_score, 1.0);
/// assert_eq!(miss.resolution, Resolution::Unmatched);
/// ```
#[derive(Clone, Debug)]
pub struct GenotypeActivityCatalog {
    hla_associations: Vec<DrugAlleleAssociation>,
    fingerprint: String,
}

impl GenotypeActivityCatalog {
    /// Catalog with the standard HLA association table
    pub fn standard() -> Self {
        Self::with_hla_associations(standard_hla_associations())
    }

    /// Catalog with a caller-supplied HLA association table
    pub fn with_hla_associations(hla_associations: Vec<DrugAlleleAssociation>) -> Self {
        let fingerprint = fingerprint_tables(&hla_associations);
        GenotypeActivityCatalog {
            hla_associations,
            fingerprint,
        }
    }

    /// Activity score and tier for a genotype label. Never fails.
    pub fn lookup(&self, subject: Subject, label: &str) -> ActivityLookup {
        match subject {
            Subject::Enzyme(enzyme) => self.enzyme_activity(enzyme, label),
            Subject::Transporter(transporter) => {
                let found = self.transporter_profile(transporter, label);
                ActivityLookup {
                    activity_score: found.activity,
                    risk_tier: found.risk.as_tier(),
                    resolution: found.resolution,
                }
            }
        }
    }

    /// Enzyme lookup; the tier is derived from the activity score
    pub fn enzyme_activity(&self, enzyme: CypEnzyme, label: &str) -> ActivityLookup {
        let (activity_score, resolution) = match enzyme.activity_for(label) {
            Some(score) => (score, Resolution::Matched),
            None => (UNMATCHED_ACTIVITY, Resolution::Unmatched),
        };
        ActivityLookup {
            activity_score,
            risk_tier: match resolution {
                Resolution::Matched => RiskTier::from_enzyme_activity(activity_score),
                Resolution::Unmatched => RiskTier::Low,
            },
            resolution,
        }
    }

    /// Transporter lookup; the risk comes straight from the table
    pub fn transporter_profile(&self, transporter: Transporter, label: &str) -> TransporterLookup {
        match transporter.profile_for(label) {
            Some((activity, risk)) => TransporterLookup {
                activity,
                risk,
                resolution: Resolution::Matched,
            },
            None => TransporterLookup {
                activity: UNMATCHED_ACTIVITY,
                risk: TransporterRisk::Low,
                resolution: Resolution::Unmatched,
            },
        }
    }

    /// Exact allele-id lookup
    pub fn lookup_allele(&self, allele: &str) -> Option<&DrugAlleleAssociation> {
        self.hla_associations.iter().find(|a| a.allele == allele)
    }

    /// HLA associations in table order
    pub fn hla_associations(&self) -> &[DrugAlleleAssociation] {
        &self.hla_associations
    }

    pub fn substrate_drugs(&self, subject: Subject) -> Vec<String> {
        subject
            .substrate_drugs()
            .iter()
            .map(|d| d.to_string())
            .collect()
    }

    /// SHA-256 over every table, hex encoded
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

impl Default for GenotypeActivityCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

fn standard_hla_associations() -> Vec<DrugAlleleAssociation> {
    vec![
        DrugAlleleAssociation::new(
            "HLA-B*5701",
            &["Abacavir", "Flucloxacillin"],
            "Severe Hypersensitivity Syndrome",
            RiskTier::Critical,
        ),
        DrugAlleleAssociation::new(
            "HLA-B*5801",
            &["Allopurinol", "Carbamazepine"],
            "Stevens-Johnson Syndrome/TEN",
            RiskTier::Critical,
        ),
        DrugAlleleAssociation::new(
            "HLA-A*3101",
            &["Carbamazepine", "Phenytoin"],
            "Severe Cutaneous Reactions",
            RiskTier::High,
        ),
        DrugAlleleAssociation::new(
            "HLA-DRB1*0701",
            &["Lapatinib"],
            "Drug-Induced Liver Injury",
            RiskTier::High,
        ),
        DrugAlleleAssociation::new(
            "HLA-DQA1*0201",
            &["Terbinafine"],
            "Hepatotoxicity",
            RiskTier::Moderate,
        ),
    ]
}

fn fingerprint_tables(hla: &[DrugAlleleAssociation]) -> String {
    let mut hasher = Sha256::new();
    for enzyme in CypEnzyme::ALL {
        for (label, activity) in enzyme.vocabulary() {
            hasher.update(format!("CYP|{}|{}|{}\n", enzyme, label, activity).as_bytes());
        }
    }
    for transporter in Transporter::ALL {
        for (label, activity, risk) in transporter.vocabulary() {
            hasher.update(format!("TRN|{}|{}|{}|{}\n", transporter, label, activity, risk).as_bytes());
        }
    }
    for assoc in hla {
        hasher.update(
            format!(
                "HLA|{}|{}|{}|{}\n",
                assoc.allele,
                assoc.drugs.join(","),
                assoc.reaction,
                assoc.risk_level
            )
            .as_bytes(),
        );
    }
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}
