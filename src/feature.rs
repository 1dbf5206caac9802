//! CPU feature flags and the requirement sets parsed from definition summaries.
//!
//! A definition summary carries its requirement as a trailing parenthesized
//! annotation, e.g. `"Add packed 32-bit integers in a and b. (AVX512F, AVX512VL)"`.
//! [`parse_summary`] splits that annotation off once at load time so queries
//! never re-parse text. Every listed flag must hold for the intrinsic to be
//! usable; an empty set means the intrinsic belongs to the baseline ISA.
//!
//! Parsing never fails. Malformed or unknown items are collected as
//! [`AnnotationIssue`]s for the loader to report.

use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;

/// Instruction-set extensions the engine knows by name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KnownFeature {
    Adx,
    Aes,
    Avx,
    Avx2,
    Avx512Bw,
    Avx512Cd,
    Avx512Dq,
    Avx512Er,
    Avx512F,
    Avx512Ifma52,
    Avx512Pf,
    Avx512Vbmi,
    Avx512Vl,
    Bmi1,
    Bmi2,
    ClflushOpt,
    Fma,
    Fp16c,
    Fxsr,
    Kncni,
    Lzcnt,
    Mmx,
    Mpx,
    Pclmulqdq,
    Popcnt,
    Rdrand,
    Rdseed,
    Sha,
    Sse,
    Sse2,
    Sse3,
    Sse41,
    Sse42,
    Ssse3,
    Svml,
    Tsc,
    Xsave,
}

impl KnownFeature {
    pub const ALL: [KnownFeature; 37] = [
        KnownFeature::Adx,
        KnownFeature::Aes,
        KnownFeature::Avx,
        KnownFeature::Avx2,
        KnownFeature::Avx512Bw,
        KnownFeature::Avx512Cd,
        KnownFeature::Avx512Dq,
        KnownFeature::Avx512Er,
        KnownFeature::Avx512F,
        KnownFeature::Avx512Ifma52,
        KnownFeature::Avx512Pf,
        KnownFeature::Avx512Vbmi,
        KnownFeature::Avx512Vl,
        KnownFeature::Bmi1,
        KnownFeature::Bmi2,
        KnownFeature::ClflushOpt,
        KnownFeature::Fma,
        KnownFeature::Fp16c,
        KnownFeature::Fxsr,
        KnownFeature::Kncni,
        KnownFeature::Lzcnt,
        KnownFeature::Mmx,
        KnownFeature::Mpx,
        KnownFeature::Pclmulqdq,
        KnownFeature::Popcnt,
        KnownFeature::Rdrand,
        KnownFeature::Rdseed,
        KnownFeature::Sha,
        KnownFeature::Sse,
        KnownFeature::Sse2,
        KnownFeature::Sse3,
        KnownFeature::Sse41,
        KnownFeature::Sse42,
        KnownFeature::Ssse3,
        KnownFeature::Svml,
        KnownFeature::Tsc,
        KnownFeature::Xsave,
    ];

    /// Canonical spelling as it appears in annotations.
    pub fn as_str(self) -> &'static str {
        match self {
            KnownFeature::Adx => "ADX",
            KnownFeature::Aes => "AES",
            KnownFeature::Avx => "AVX",
            KnownFeature::Avx2 => "AVX2",
            KnownFeature::Avx512Bw => "AVX512BW",
            KnownFeature::Avx512Cd => "AVX512CD",
            KnownFeature::Avx512Dq => "AVX512DQ",
            KnownFeature::Avx512Er => "AVX512ER",
            KnownFeature::Avx512F => "AVX512F",
            KnownFeature::Avx512Ifma52 => "AVX512IFMA52",
            KnownFeature::Avx512Pf => "AVX512PF",
            KnownFeature::Avx512Vbmi => "AVX512VBMI",
            KnownFeature::Avx512Vl => "AVX512VL",
            KnownFeature::Bmi1 => "BMI1",
            KnownFeature::Bmi2 => "BMI2",
            KnownFeature::ClflushOpt => "CLFLUSHOPT",
            KnownFeature::Fma => "FMA",
            KnownFeature::Fp16c => "FP16C",
            KnownFeature::Fxsr => "FXSR",
            KnownFeature::Kncni => "KNCNI",
            KnownFeature::Lzcnt => "LZCNT",
            KnownFeature::Mmx => "MMX",
            KnownFeature::Mpx => "MPX",
            KnownFeature::Pclmulqdq => "PCLMULQDQ",
            KnownFeature::Popcnt => "POPCNT",
            KnownFeature::Rdrand => "RDRAND",
            KnownFeature::Rdseed => "RDSEED",
            KnownFeature::Sha => "SHA",
            KnownFeature::Sse => "SSE",
            KnownFeature::Sse2 => "SSE2",
            KnownFeature::Sse3 => "SSE3",
            KnownFeature::Sse41 => "SSE4.1",
            KnownFeature::Sse42 => "SSE4.2",
            KnownFeature::Ssse3 => "SSSE3",
            KnownFeature::Svml => "SVML",
            KnownFeature::Tsc => "TSC",
            KnownFeature::Xsave => "XSAVE",
        }
    }

    /// Short human-readable name of the extension, listed in quick info.
    pub fn documentation(self) -> &'static str {
        match self {
            KnownFeature::Adx => "Multi-Precision Add-Carry Instruction Extension",
            KnownFeature::Aes => "Advanced Encryption Standard Extension",
            KnownFeature::Avx => "Advanced Vector Extensions",
            KnownFeature::Avx2 => "Advanced Vector Extensions 2",
            KnownFeature::Avx512Bw => "Instruction set AVX512 Byte and Word (Intel Xeon)",
            KnownFeature::Avx512Cd => {
                "Instruction set AVX512 Conflict Detection (Knights Landing, Intel Xeon)"
            }
            KnownFeature::Avx512Dq => "Instruction set AVX512 Doubleword and QuadWord (Intel Xeon)",
            KnownFeature::Avx512Er => {
                "Instruction set AVX512 Exponential and Reciprocal (Knights Landing)"
            }
            KnownFeature::Avx512F => "Instruction set AVX512 Foundation (Knights Landing, Intel Xeon)",
            KnownFeature::Avx512Ifma52 => "Instruction set AVX512 Integer Fused Multiply-Add (52-bit)",
            KnownFeature::Avx512Pf => "Instruction set AVX512 Prefetch (Knights Landing)",
            KnownFeature::Avx512Vbmi => "Instruction set AVX512 Vector Byte Manipulation",
            KnownFeature::Avx512Vl => {
                "Instruction set AVX512 Vector Length Extensions (Intel Xeon)"
            }
            KnownFeature::Bmi1 => "Bit Manipulation Instruction Set 1",
            KnownFeature::Bmi2 => "Bit Manipulation Instruction Set 2",
            KnownFeature::ClflushOpt => "Optimized Cache Line Flush",
            KnownFeature::Fma => "Fused Multiply-Add Instructions",
            KnownFeature::Fp16c => "Half Precision Floating Point Conversion Instructions",
            KnownFeature::Fxsr => "Fast x87/SSE State Save and Restore",
            KnownFeature::Kncni => "Knights Corner New Instructions",
            KnownFeature::Lzcnt => "Leading Zero Count",
            KnownFeature::Mmx => "MultiMedia Extensions",
            KnownFeature::Mpx => "Memory Protection Extensions",
            KnownFeature::Pclmulqdq => "Carry-Less Multiplication Instructions",
            KnownFeature::Popcnt => "Population Count",
            KnownFeature::Rdrand => "Hardware Random Number Generator",
            KnownFeature::Rdseed => "Hardware Random Seed Generator",
            KnownFeature::Sha => "Secure Hash Algorithm Extensions",
            KnownFeature::Sse => "Streaming SIMD Extensions",
            KnownFeature::Sse2 => "Streaming SIMD Extensions 2",
            KnownFeature::Sse3 => "Streaming SIMD Extensions 3",
            KnownFeature::Sse41 => "Streaming SIMD Extensions 4.1",
            KnownFeature::Sse42 => "Streaming SIMD Extensions 4.2",
            KnownFeature::Ssse3 => "Supplemental Streaming SIMD Extensions 3",
            KnownFeature::Svml => "Short Vector Math Library (compiler runtime, no single instruction)",
            KnownFeature::Tsc => "Time Stamp Counter",
            KnownFeature::Xsave => "Processor Extended State Save and Restore",
        }
    }

    fn from_canonical(token: &str) -> Option<Self> {
        KnownFeature::ALL
            .iter()
            .copied()
            .find(|feature| feature.as_str() == token)
    }
}

/// One feature flag named by an annotation.
///
/// Well-formed tokens the engine does not recognize are kept as `Other` so a
/// newer data set still loads; the loader reports them.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CpuFeature {
    Known(KnownFeature),
    Other(String),
}

impl CpuFeature {
    /// Parse a single annotation item.
    ///
    /// Matching is case-insensitive and `SSE4_1` is accepted for `SSE4.1`.
    pub fn parse_token(raw: &str) -> Result<Self, AnnotationIssue> {
        let item = raw.trim();
        if item.is_empty() {
            return Err(AnnotationIssue::EmptyItem);
        }
        if !item
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.'))
        {
            return Err(AnnotationIssue::Malformed(item.to_string()));
        }
        let upper = item.to_ascii_uppercase();
        let canonical = match upper.as_str() {
            "SSE4_1" => "SSE4.1",
            "SSE4_2" => "SSE4.2",
            other => other,
        };
        Ok(match KnownFeature::from_canonical(canonical) {
            Some(known) => CpuFeature::Known(known),
            None => CpuFeature::Other(canonical.to_string()),
        })
    }

    pub fn as_str(&self) -> &str {
        match self {
            CpuFeature::Known(known) => known.as_str(),
            CpuFeature::Other(name) => name,
        }
    }

    /// Documentation string for known flags; `None` for unrecognized ones.
    pub fn documentation(&self) -> Option<&'static str> {
        match self {
            CpuFeature::Known(known) => Some(known.documentation()),
            CpuFeature::Other(_) => None,
        }
    }
}

impl From<KnownFeature> for CpuFeature {
    fn from(value: KnownFeature) -> Self {
        CpuFeature::Known(value)
    }
}

impl fmt::Display for CpuFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CpuFeature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Something in an annotation that could not be taken at face value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AnnotationIssue {
    /// Two separators with nothing between them, e.g. `(AVX,, SSE)`.
    EmptyItem,
    /// An item containing characters no feature name uses.
    Malformed(String),
    /// A well-formed name that is not in [`KnownFeature`].
    Unknown(String),
    /// The summary ends in `)` without a matching `(`.
    Unbalanced,
    /// The trailing group reads as prose rather than a feature list; it was
    /// kept in the description.
    NotAnAnnotation(String),
}

impl fmt::Display for AnnotationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnnotationIssue::EmptyItem => write!(f, "empty feature item"),
            AnnotationIssue::Malformed(item) => write!(f, "malformed feature item '{item}'"),
            AnnotationIssue::Unknown(item) => write!(f, "unknown feature '{item}'"),
            AnnotationIssue::Unbalanced => write!(f, "unbalanced parentheses in annotation"),
            AnnotationIssue::NotAnAnnotation(text) => {
                write!(f, "trailing group '({text})' lists no feature names")
            }
        }
    }
}

/// Conjunction of feature flags required by one intrinsic.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct FeatureRequirementSet {
    features: BTreeSet<CpuFeature>,
}

/// Result of parsing an annotation: the best-effort set plus what was skipped.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedRequirement {
    pub set: FeatureRequirementSet,
    pub issues: Vec<AnnotationIssue>,
}

impl FeatureRequirementSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an annotation such as `"AVX512F, AVX512VL"` or `"(AVX512F)"`.
    ///
    /// Empty text yields an empty set. Items are separated by commas; bad
    /// items are skipped and reported, never fatal.
    pub fn parse(text: &str) -> ParsedRequirement {
        let mut inner = text.trim();
        if let Some(stripped) = inner
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
        {
            inner = stripped.trim();
        }

        let mut parsed = ParsedRequirement::default();
        if inner.is_empty() {
            return parsed;
        }

        for item in inner.split(',') {
            match CpuFeature::parse_token(item) {
                Ok(feature) => {
                    if let CpuFeature::Other(name) = &feature {
                        parsed.issues.push(AnnotationIssue::Unknown(name.clone()));
                    }
                    parsed.set.features.insert(feature);
                }
                Err(issue) => parsed.issues.push(issue),
            }
        }
        parsed
    }

    /// True when `token` (any accepted spelling) is one of the required flags.
    pub fn requires(&self, token: &str) -> bool {
        match CpuFeature::parse_token(token) {
            Ok(feature) => self.features.contains(&feature),
            Err(_) => false,
        }
    }

    pub fn contains(&self, feature: &CpuFeature) -> bool {
        self.features.contains(feature)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Flags in stable (alphabetical by known name) order.
    pub fn iter(&self) -> impl Iterator<Item = &CpuFeature> {
        self.features.iter()
    }

    /// True when the target enables every required flag.
    pub fn is_satisfied_by(&self, target: &TargetFeatures) -> bool {
        self.features.iter().all(|feature| target.enables(feature))
    }

    /// Required flags the target does not enable.
    pub fn missing_from(&self, target: &TargetFeatures) -> FeatureRequirementSet {
        FeatureRequirementSet {
            features: self
                .features
                .iter()
                .filter(|feature| !target.enables(feature))
                .cloned()
                .collect(),
        }
    }
}

impl FromIterator<CpuFeature> for FeatureRequirementSet {
    fn from_iter<I: IntoIterator<Item = CpuFeature>>(iter: I) -> Self {
        Self {
            features: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for FeatureRequirementSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for feature in &self.features {
            if !first {
                f.write_str(", ")?;
            }
            f.write_str(feature.as_str())?;
            first = false;
        }
        Ok(())
    }
}

/// A definition summary split into display text and requirement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedSummary {
    pub description: String,
    pub requirement: FeatureRequirementSet,
    pub issues: Vec<AnnotationIssue>,
}

/// Split the trailing annotation off `summary` and parse it.
pub fn parse_summary(summary: &str) -> ParsedSummary {
    let trimmed = summary.trim();
    match split_annotation(trimmed) {
        Annotation::Absent => ParsedSummary {
            description: trimmed.to_string(),
            requirement: FeatureRequirementSet::new(),
            issues: Vec::new(),
        },
        Annotation::Unbalanced => ParsedSummary {
            description: trimmed.to_string(),
            requirement: FeatureRequirementSet::new(),
            issues: vec![AnnotationIssue::Unbalanced],
        },
        Annotation::Present { description, inner } => {
            let parsed = FeatureRequirementSet::parse(inner);
            if parsed.set.is_empty() && !parsed.issues.is_empty() && inner.contains(' ') {
                // Nothing usable and it reads like a sentence: leave the text alone.
                return ParsedSummary {
                    description: trimmed.to_string(),
                    requirement: FeatureRequirementSet::new(),
                    issues: vec![AnnotationIssue::NotAnAnnotation(inner.trim().to_string())],
                };
            }
            ParsedSummary {
                description: description.to_string(),
                requirement: parsed.set,
                issues: parsed.issues,
            }
        }
    }
}

/// Shape of the tail of a summary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Annotation<'a> {
    Absent,
    Unbalanced,
    Present { description: &'a str, inner: &'a str },
}

/// Locate a trailing balanced `( ... )` group.
pub fn split_annotation(summary: &str) -> Annotation<'_> {
    let text = summary.trim_end();
    if !text.ends_with(')') {
        return Annotation::Absent;
    }

    let mut depth = 0usize;
    for (idx, ch) in text.char_indices().rev() {
        match ch {
            ')' => depth += 1,
            '(' => {
                depth -= 1;
                if depth == 0 {
                    return Annotation::Present {
                        description: text[..idx].trim_end(),
                        inner: &text[idx + 1..text.len() - 1],
                    };
                }
            }
            _ => {}
        }
    }
    Annotation::Unbalanced
}

/// Feature flags enabled for the host's compilation target.
///
/// `All` is the default: nothing is filtered and nothing is reported missing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum TargetFeatures {
    #[default]
    All,
    Only(BTreeSet<CpuFeature>),
}

impl TargetFeatures {
    /// Parse a comma/space separated list; `all` or `*` selects everything.
    pub fn from_list(raw: &str) -> (Self, Vec<AnnotationIssue>) {
        let items = crate::split_list(raw);
        if items
            .iter()
            .any(|item| item == "*" || item.eq_ignore_ascii_case("all"))
        {
            return (TargetFeatures::All, Vec::new());
        }

        let mut enabled = BTreeSet::new();
        let mut issues = Vec::new();
        for item in items {
            match CpuFeature::parse_token(&item) {
                Ok(feature) => {
                    if let CpuFeature::Other(name) = &feature {
                        issues.push(AnnotationIssue::Unknown(name.clone()));
                    }
                    enabled.insert(feature);
                }
                Err(issue) => issues.push(issue),
            }
        }
        (TargetFeatures::Only(enabled), issues)
    }

    pub fn enables(&self, feature: &CpuFeature) -> bool {
        match self {
            TargetFeatures::All => true,
            TargetFeatures::Only(enabled) => enabled.contains(feature),
        }
    }
}

impl fmt::Display for TargetFeatures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetFeatures::All => f.write_str("all"),
            TargetFeatures::Only(enabled) => {
                let names: Vec<&str> = enabled.iter().map(CpuFeature::as_str).collect();
                f.write_str(&names.join(", "))
            }
        }
    }
}
