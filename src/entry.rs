//! Intrinsic entries and their identity.
//!
//! An [`Entry`] is immutable once the loader admits it. Its [`IntrinsicName`]
//! is the only identity key: names are stored in canonical ASCII upper case so
//! `_mm_add_ps`, `_MM_ADD_PS` and `_Mm_Add_Ps` all address the same entry.

use crate::feature::FeatureRequirementSet;
use serde::{Deserialize, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;
use std::ops::Range;

/// Canonical (upper-case) intrinsic identifier.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IntrinsicName(String);

/// Why a raw name could not become an [`IntrinsicName`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NameError {
    Empty,
    InvalidStart(char),
    InvalidChar { ch: char, offset: usize },
}

impl fmt::Display for NameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameError::Empty => write!(f, "name is empty"),
            NameError::InvalidStart(ch) => {
                write!(f, "name must start with a letter or '_', found '{ch}'")
            }
            NameError::InvalidChar { ch, offset } => {
                write!(f, "invalid character '{ch}' at offset {offset}")
            }
        }
    }
}

impl std::error::Error for NameError {}

impl IntrinsicName {
    /// Validate `raw` against `[A-Za-z_][A-Za-z0-9_]*` and upper-case it.
    ///
    /// Surrounding whitespace is not trimmed; a padded token is not a name.
    pub fn parse(raw: &str) -> Result<Self, NameError> {
        let mut chars = raw.char_indices();
        let (_, first) = chars.next().ok_or(NameError::Empty)?;
        if !(first.is_ascii_alphabetic() || first == '_') {
            return Err(NameError::InvalidStart(first));
        }
        if let Some((offset, ch)) = chars.find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_')) {
            return Err(NameError::InvalidChar { ch, offset });
        }
        Ok(Self(raw.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Spelling used in C source, e.g. `_mm512_add_epi32`.
    pub fn source_spelling(&self) -> String {
        self.0.to_ascii_lowercase()
    }
}

impl fmt::Display for IntrinsicName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for IntrinsicName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl Serialize for IntrinsicName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Register width implied by the name prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorWidth {
    /// No vector prefix: scalar or bit-manipulation helpers such as `_bswap`.
    Scalar,
    /// `_m_` (MMX).
    Bits64,
    /// `_mm_`.
    Bits128,
    /// `_mm256_`.
    Bits256,
    /// `_mm512_`.
    Bits512,
}

impl VectorWidth {
    pub fn bits(self) -> Option<u16> {
        match self {
            VectorWidth::Scalar => None,
            VectorWidth::Bits64 => Some(64),
            VectorWidth::Bits128 => Some(128),
            VectorWidth::Bits256 => Some(256),
            VectorWidth::Bits512 => Some(512),
        }
    }
}

/// Write-mask form taken from the segment after the width prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Masking {
    Unmasked,
    /// `mask_`, `mask2_`, `mask3_`: inactive lanes keep a source value.
    Merge,
    /// `maskz_`: inactive lanes are zeroed.
    Zero,
}

/// Browsing category derived from the structure of a name.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Category {
    pub width: VectorWidth,
    pub masking: Masking,
    /// Leading operation word, e.g. `ADD` for `_MM512_MASK_ADD_EPI32`.
    pub operation: String,
}

const WIDTH_PREFIXES: [(&str, VectorWidth); 4] = [
    ("_MM512_", VectorWidth::Bits512),
    ("_MM256_", VectorWidth::Bits256),
    ("_MM_", VectorWidth::Bits128),
    ("_M_", VectorWidth::Bits64),
];

impl Category {
    pub fn derive(name: &IntrinsicName) -> Self {
        let full = name.as_str();
        let (width, rest) = WIDTH_PREFIXES
            .iter()
            .find_map(|(prefix, width)| full.strip_prefix(prefix).map(|rest| (*width, rest)))
            .unwrap_or((VectorWidth::Scalar, full.trim_start_matches('_')));
        // MMX intrinsics share the `_mm_` prefix; their element suffix gives them away.
        let width = match (width, full.rsplit('_').next()) {
            (VectorWidth::Bits128, Some("PI8" | "PI16" | "PI32" | "SI64")) => VectorWidth::Bits64,
            (width, _) => width,
        };

        let mut segments = rest.split('_').filter(|s| !s.is_empty()).peekable();
        let masking = match segments.peek().copied() {
            Some("MASKZ") => Masking::Zero,
            Some("MASK" | "MASK2" | "MASK3") => Masking::Merge,
            _ => Masking::Unmasked,
        };
        if masking != Masking::Unmasked {
            segments.next();
        }
        // `_mm512_mask_mov_epi32` has an op word; `_mm512_kand` style names do not
        // carry a mask segment at all.
        let operation = segments.next().unwrap_or(rest).to_string();

        Self {
            width,
            masking,
            operation,
        }
    }
}

/// One formal parameter of a C prototype.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Parameter {
    #[serde(rename = "type")]
    pub ty: String,
    pub name: String,
}

impl Parameter {
    pub fn new(ty: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            name: name.into(),
        }
    }
}

/// C prototype of an intrinsic.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Prototype {
    pub return_type: String,
    pub parameters: Vec<Parameter>,
}

impl Prototype {
    /// `ret name(type a, type b)` plus the byte range of each parameter.
    pub fn render_with_spans(&self, name: &str) -> (String, Vec<Range<usize>>) {
        let mut text = format!("{} {name}(", self.return_type);
        let mut spans = Vec::with_capacity(self.parameters.len());
        for (i, param) in self.parameters.iter().enumerate() {
            if i > 0 {
                text.push_str(", ");
            }
            let start = text.len();
            text.push_str(&param.ty);
            text.push(' ');
            text.push_str(&param.name);
            spans.push(start..text.len());
        }
        text.push(')');
        (text, spans)
    }

    pub fn render(&self, name: &str) -> String {
        self.render_with_spans(name).0
    }
}

/// One catalogued intrinsic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub name: IntrinsicName,
    pub description: String,
    pub requirement: FeatureRequirementSet,
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prototype: Option<Prototype>,
    /// Mnemonic the intrinsic compiles to, when it maps to a single one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instruction: Option<String>,
    /// Pseudo-code of the operation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
}

impl Entry {
    pub fn new(name: IntrinsicName, description: String, requirement: FeatureRequirementSet) -> Self {
        let category = Category::derive(&name);
        Self {
            name,
            description,
            requirement,
            category,
            prototype: None,
            instruction: None,
            operation: None,
        }
    }

    pub fn with_prototype(mut self, prototype: Option<Prototype>) -> Self {
        self.prototype = prototype;
        self
    }

    pub fn with_instruction(mut self, instruction: Option<String>) -> Self {
        self.instruction = instruction;
        self
    }

    pub fn with_operation(mut self, operation: Option<String>) -> Self {
        self.operation = operation;
        self
    }

    /// True when both entries would answer every query identically.
    pub fn same_content(&self, other: &Entry) -> bool {
        self == other
    }

    /// `name [FEATURES]` header used by completion lists and the CLI.
    pub fn signature(&self) -> String {
        self.with_features(self.name.source_spelling())
    }

    /// The C prototype when known, otherwise the bare name, followed by the
    /// required features. First line of quick info.
    pub fn declaration(&self) -> String {
        let head = match &self.prototype {
            Some(prototype) => prototype.render(&self.name.source_spelling()),
            None => self.name.source_spelling(),
        };
        self.with_features(head)
    }

    fn with_features(&self, head: String) -> String {
        if self.requirement.is_empty() {
            head
        } else {
            format!("{head} [{}]", self.requirement)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::FeatureRequirementSet;

    fn name(raw: &str) -> IntrinsicName {
        IntrinsicName::parse(raw).expect("valid name")
    }

    #[test]
    fn names_are_case_folded() {
        assert_eq!(name("_mm_add_ps"), name("_MM_ADD_PS"));
        assert_eq!(name("_mm_add_ps").as_str(), "_MM_ADD_PS");
        assert_eq!(name("_MM_ADD_PS").source_spelling(), "_mm_add_ps");
    }

    #[test]
    fn invalid_names_are_rejected() {
        assert_eq!(IntrinsicName::parse(""), Err(NameError::Empty));
        assert_eq!(
            IntrinsicName::parse("9lives"),
            Err(NameError::InvalidStart('9'))
        );
        assert_eq!(
            IntrinsicName::parse("_mm_add ps"),
            Err(NameError::InvalidChar { ch: ' ', offset: 7 })
        );
        assert!(IntrinsicName::parse(" _mm_add_ps").is_err());
    }

    #[test]
    fn category_reads_width_masking_and_operation() {
        let masked = Category::derive(&name("_mm512_mask_add_epi32"));
        assert_eq!(masked.width, VectorWidth::Bits512);
        assert_eq!(masked.masking, Masking::Merge);
        assert_eq!(masked.operation, "ADD");

        let zeroing = Category::derive(&name("_MM256_MASKZ_LOADU_PS"));
        assert_eq!(zeroing.width, VectorWidth::Bits256);
        assert_eq!(zeroing.masking, Masking::Zero);
        assert_eq!(zeroing.operation, "LOADU");

        let permute = Category::derive(&name("_mm512_mask2_permutex2var_epi32"));
        assert_eq!(permute.masking, Masking::Merge);
        assert_eq!(permute.operation, "PERMUTEX2VAR");

        let mmx = Category::derive(&name("_m_empty"));
        assert_eq!(mmx.width, VectorWidth::Bits64);
        assert_eq!(mmx.operation, "EMPTY");
        assert_eq!(
            Category::derive(&name("_mm_add_pi16")).width,
            VectorWidth::Bits64
        );
        assert_eq!(
            Category::derive(&name("_mm_add_epi16")).width,
            VectorWidth::Bits128
        );

        let scalar = Category::derive(&name("_bswap64"));
        assert_eq!(scalar.width, VectorWidth::Scalar);
        assert_eq!(scalar.masking, Masking::Unmasked);
        assert_eq!(scalar.operation, "BSWAP64");
    }

    #[test]
    fn signature_lists_features_when_present() {
        let set = FeatureRequirementSet::parse("AVX512VL, AVX512F").set;
        let entry = Entry::new(name("_mm_mask_add_epi32"), "Add.".to_string(), set);
        assert_eq!(entry.signature(), "_mm_mask_add_epi32 [AVX512F, AVX512VL]");

        let baseline = Entry::new(name("_bswap"), "Swap.".to_string(), FeatureRequirementSet::new());
        assert_eq!(baseline.signature(), "_bswap");
        assert_eq!(baseline.declaration(), "_bswap");
    }

    #[test]
    fn declaration_renders_prototype_and_parameter_spans() {
        let prototype = Prototype {
            return_type: "__m512i".to_string(),
            parameters: vec![
                Parameter::new("__m512i", "src"),
                Parameter::new("__mmask16", "k"),
            ],
        };
        let (text, spans) = prototype.render_with_spans("_mm512_mask_mov_epi32");
        assert_eq!(text, "__m512i _mm512_mask_mov_epi32(__m512i src, __mmask16 k)");
        assert_eq!(&text[spans[0].clone()], "__m512i src");
        assert_eq!(&text[spans[1].clone()], "__mmask16 k");

        let set = FeatureRequirementSet::parse("AVX512F").set;
        let entry = Entry::new(name("_mm512_mask_mov_epi32"), "Move.".to_string(), set)
            .with_prototype(Some(prototype));
        assert_eq!(
            entry.declaration(),
            "__m512i _mm512_mask_mov_epi32(__m512i src, __mmask16 k) [AVX512F]"
        );
        assert_eq!(entry.signature(), "_mm512_mask_mov_epi32 [AVX512F]");

        let nullary = Prototype {
            return_type: "unsigned __int64".to_string(),
            parameters: Vec::new(),
        };
        assert_eq!(nullary.render("_rdtsc"), "unsigned __int64 _rdtsc()");
    }
}
