//! Editor-facing queries: token classification, completion, quick info and
//! signature help.

use crate::catalog::Catalog;
use crate::entry::Entry;
use crate::feature::TargetFeatures;
use crate::register::RegisterType;
use crate::text::{cleanup, linewrap};
use serde::Serialize;

/// What a source token refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenClass<'a> {
    Intrinsic(&'a Entry),
    Register(RegisterType),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionKind {
    Intrinsic,
    Register,
}

/// Parameter help for a call being typed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SignatureHelp {
    /// Declaration line, e.g. `__m128 _mm_add_ps(__m128 a, __m128 b) [SSE]`.
    pub label: String,
    pub documentation: String,
    pub parameters: Vec<ParameterHelp>,
    /// `None` once the caller is past the last parameter.
    pub active_parameter: Option<usize>,
}

/// One parameter of a [`SignatureHelp`], located in its label by byte offsets.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ParameterHelp {
    pub label: String,
    pub start: usize,
    pub end: usize,
}

/// One completion list item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Completion {
    pub kind: CompletionKind,
    /// Text inserted into the buffer (C spelling).
    pub insert: String,
    /// Single line shown in the list.
    pub display: String,
}

impl Catalog {
    /// Classify a token as an intrinsic or a SIMD register type.
    pub fn classify_token(&self, token: &str) -> Option<TokenClass<'_>> {
        if let Some(entry) = self.classify(token) {
            return Some(TokenClass::Intrinsic(entry));
        }
        RegisterType::parse(token).map(TokenClass::Register)
    }

    /// Completions for `partial`, limited to what `target` can compile.
    ///
    /// An empty `partial` yields nothing. Intrinsics come first in name
    /// order, then register types.
    pub fn complete(&self, partial: &str, target: &TargetFeatures, width: usize) -> Vec<Completion> {
        if partial.is_empty() {
            return Vec::new();
        }

        let mut items: Vec<Completion> = self
            .prefix(partial)
            .iter()
            .filter(|entry| entry.requirement.is_satisfied_by(target))
            .map(|entry| Completion {
                kind: CompletionKind::Intrinsic,
                insert: entry.name.source_spelling(),
                display: cleanup(
                    &format!("{} - {}", entry.signature(), entry.description),
                    width,
                ),
            })
            .collect();

        let lowered = partial.to_ascii_lowercase();
        items.extend(
            RegisterType::ALL
                .iter()
                .filter(|ty| ty.as_str().starts_with(&lowered) && ty.is_available(target))
                .map(|ty| Completion {
                    kind: CompletionKind::Register,
                    insert: ty.as_str().to_string(),
                    display: cleanup(&register_summary(*ty), width),
                }),
        );
        items
    }

    /// Tooltip text for `token`.
    ///
    /// Intrinsics get their declaration line, the wrapped description, the
    /// documentation of each required extension, then the instruction and
    /// operation when the definitions carry them.
    pub fn quick_info(&self, token: &str, width: usize) -> Option<String> {
        let entry = match self.classify_token(token)? {
            TokenClass::Intrinsic(entry) => entry,
            TokenClass::Register(ty) => return Some(linewrap(&register_summary(ty), width)),
        };

        let mut info = entry.declaration();
        if !entry.description.is_empty() {
            info.push('\n');
            info.push_str(&linewrap(&entry.description, width));
        }
        let documented: Vec<String> = entry
            .requirement
            .iter()
            .filter_map(|feature| {
                let doc = feature.documentation()?;
                Some(linewrap(&format!("{feature}: {doc}"), width))
            })
            .collect();
        if !documented.is_empty() {
            info.push_str("\n\n");
            info.push_str(&documented.join("\n"));
        }
        if let Some(instruction) = &entry.instruction {
            info.push_str("\n\nInstruction: ");
            info.push_str(instruction);
        }
        if let Some(operation) = &entry.operation {
            info.push_str("\n\nOperation:\n");
            info.push_str(operation);
        }
        Some(info)
    }

    /// Parameter help for a call to `token` with the cursor in argument
    /// `param_index` (zero based). `None` unless the intrinsic has a known
    /// prototype.
    pub fn signature_help(&self, token: &str, param_index: usize) -> Option<SignatureHelp> {
        let entry = self.classify(token)?;
        let prototype = entry.prototype.as_ref()?;
        let (mut label, spans) = prototype.render_with_spans(&entry.name.source_spelling());
        let parameters = spans
            .into_iter()
            .map(|span| ParameterHelp {
                label: label[span.clone()].to_string(),
                start: span.start,
                end: span.end,
            })
            .collect::<Vec<_>>();
        if !entry.requirement.is_empty() {
            label.push_str(&format!(" [{}]", entry.requirement));
        }
        let active_parameter = (param_index < parameters.len()).then_some(param_index);
        Some(SignatureHelp {
            label,
            documentation: entry.description.clone(),
            parameters,
            active_parameter,
        })
    }
}

fn register_summary(ty: RegisterType) -> String {
    let shape = if ty.is_mask() { "mask" } else { "vector register" };
    format!(
        "{} - {}-bit {} type [{}]",
        ty,
        ty.bits(),
        shape,
        ty.introduced_by().as_str()
    )
}
