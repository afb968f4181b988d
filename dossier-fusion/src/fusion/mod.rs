// Fusion Module - identity resolution over people-lookup records
//
// Architecture: SourceNormalizer → IdentityGate → {FieldResolver, SetMerger}
//               → ProfileAssembler (+ validators for derived assessments)
//
// Every stage is a pure function of its inputs. Nothing here fails: a bad
// input shape or a rejected record only makes the profile emptier and shows
// up in the FusionTrace.

pub mod assembler;
pub mod field_resolver;
pub mod identity_gate;
pub mod normalizer;
pub mod relatives;
pub mod scoring;
pub mod set_merger;
pub mod synonyms;
pub mod validators;

/// Keep ASCII digits only
pub fn digits_only(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Append `item` unless already present, preserving first-seen order
pub(crate) fn push_unique(list: &mut Vec<String>, item: &str) {
    if !list.iter().any(|existing| existing == item) {
        list.push(item.to_string());
    }
}
