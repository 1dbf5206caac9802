//! SIMD register and mask type names (`__m128`, `__m512i`, `__mmask16`, ...).
//!
//! These are the second token class a highlighter cares about besides
//! intrinsic names. Each type is tied to the extension that introduced it so
//! completion can hide, say, `__m512` when AVX-512 is not targeted.

use crate::feature::{CpuFeature, KnownFeature, TargetFeatures};
use serde::{Serialize, Serializer};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RegisterType {
    M64,
    M128,
    M128d,
    M128i,
    M256,
    M256d,
    M256i,
    M512,
    M512d,
    M512i,
    Mmask8,
    Mmask16,
    Mmask32,
    Mmask64,
}

impl RegisterType {
    pub const ALL: [RegisterType; 14] = [
        RegisterType::M64,
        RegisterType::M128,
        RegisterType::M128d,
        RegisterType::M128i,
        RegisterType::M256,
        RegisterType::M256d,
        RegisterType::M256i,
        RegisterType::M512,
        RegisterType::M512d,
        RegisterType::M512i,
        RegisterType::Mmask8,
        RegisterType::Mmask16,
        RegisterType::Mmask32,
        RegisterType::Mmask64,
    ];

    /// Case-insensitive; `__M128I` and `__m128i` are the same type.
    pub fn parse(token: &str) -> Option<Self> {
        RegisterType::ALL
            .iter()
            .copied()
            .find(|ty| ty.as_str().eq_ignore_ascii_case(token))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RegisterType::M64 => "__m64",
            RegisterType::M128 => "__m128",
            RegisterType::M128d => "__m128d",
            RegisterType::M128i => "__m128i",
            RegisterType::M256 => "__m256",
            RegisterType::M256d => "__m256d",
            RegisterType::M256i => "__m256i",
            RegisterType::M512 => "__m512",
            RegisterType::M512d => "__m512d",
            RegisterType::M512i => "__m512i",
            RegisterType::Mmask8 => "__mmask8",
            RegisterType::Mmask16 => "__mmask16",
            RegisterType::Mmask32 => "__mmask32",
            RegisterType::Mmask64 => "__mmask64",
        }
    }

    pub fn bits(self) -> u16 {
        match self {
            RegisterType::M64 | RegisterType::Mmask64 => 64,
            RegisterType::M128 | RegisterType::M128d | RegisterType::M128i => 128,
            RegisterType::M256 | RegisterType::M256d | RegisterType::M256i => 256,
            RegisterType::M512 | RegisterType::M512d | RegisterType::M512i => 512,
            RegisterType::Mmask8 => 8,
            RegisterType::Mmask16 => 16,
            RegisterType::Mmask32 => 32,
        }
    }

    pub fn is_mask(self) -> bool {
        matches!(
            self,
            RegisterType::Mmask8
                | RegisterType::Mmask16
                | RegisterType::Mmask32
                | RegisterType::Mmask64
        )
    }

    /// Extension that introduced the type.
    pub fn introduced_by(self) -> KnownFeature {
        match self {
            RegisterType::M64 => KnownFeature::Mmx,
            RegisterType::M128 => KnownFeature::Sse,
            RegisterType::M128d | RegisterType::M128i => KnownFeature::Sse2,
            RegisterType::M256 | RegisterType::M256d | RegisterType::M256i => KnownFeature::Avx,
            RegisterType::M512
            | RegisterType::M512d
            | RegisterType::M512i
            | RegisterType::Mmask8
            | RegisterType::Mmask16 => KnownFeature::Avx512F,
            RegisterType::Mmask32 | RegisterType::Mmask64 => KnownFeature::Avx512Bw,
        }
    }

    /// Whether the target can use this type at all.
    ///
    /// 512-bit and mask types are also usable on Knights Corner targets.
    pub fn is_available(self, target: &TargetFeatures) -> bool {
        let introduced = CpuFeature::Known(self.introduced_by());
        if target.enables(&introduced) {
            return true;
        }
        match self.introduced_by() {
            KnownFeature::Avx512F | KnownFeature::Avx512Bw => {
                target.enables(&CpuFeature::Known(KnownFeature::Kncni))
            }
            _ => false,
        }
    }
}

impl fmt::Display for RegisterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RegisterType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_any_case() {
        assert_eq!(RegisterType::parse("__m256i"), Some(RegisterType::M256i));
        assert_eq!(RegisterType::parse("__MMASK16"), Some(RegisterType::Mmask16));
        assert_eq!(RegisterType::parse("__m1024"), None);
        assert_eq!(RegisterType::parse("m128"), None);
    }

    #[test]
    fn widths_match_names() {
        assert_eq!(RegisterType::M128d.bits(), 128);
        assert_eq!(RegisterType::Mmask8.bits(), 8);
        assert!(RegisterType::Mmask64.is_mask());
        assert!(!RegisterType::M64.is_mask());
    }

    #[test]
    fn availability_follows_target() {
        let (sse_only, _) = TargetFeatures::from_list("SSE SSE2");
        assert!(RegisterType::M128i.is_available(&sse_only));
        assert!(!RegisterType::M256.is_available(&sse_only));

        let (knc, _) = TargetFeatures::from_list("KNCNI");
        assert!(RegisterType::M512i.is_available(&knc));
        assert!(RegisterType::Mmask16.is_available(&knc));
        assert!(RegisterType::M512.is_available(&TargetFeatures::All));
    }
}
