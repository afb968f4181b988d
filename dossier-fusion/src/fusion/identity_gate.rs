// Identity Gate
//
// Decides whether a record is evidence about the subject at all.
//
// Linked records (joined by phone/email at the provider) are admitted
// outright. Strict records (from a broad name search) must carry a name that
// fuzzily matches the primary name; records with no usable name cannot be
// judged and are admitted. Rejecting a true match costs less than attaching a
// stranger's SSN or address to the subject, so the rule errs toward rejection.

use crate::config::{FusionConfig, GateConfig};
use crate::fusion::synonyms;
use crate::types::{GateDecision, GateMode, GateReason, SourceRecord};
use tracing::debug;

/// Record names this short are not judged
const MIN_JUDGEABLE_NAME_LEN: usize = 3;

pub struct IdentityGate<'a> {
    gate: &'a GateConfig,
    config: &'a FusionConfig,
}

impl<'a> IdentityGate<'a> {
    pub fn new(config: &'a FusionConfig) -> Self {
        Self {
            gate: &config.gate,
            config,
        }
    }

    /// Admission decision for one record against the primary name
    pub fn admit(&self, record: &SourceRecord, primary_name: Option<&str>) -> GateDecision {
        let record_name = synonyms::record_name(record, self.config);
        let mut decision = GateDecision {
            provider: record.provider.clone(),
            source: record.source.clone(),
            sequence: record.sequence,
            mode: record.gating,
            record_name: record_name.clone(),
            admitted: true,
            matched_tokens: 0,
            required_tokens: 0,
            reason: GateReason::LinkedSource,
        };

        if record.gating == GateMode::Linked {
            return decision;
        }

        let Some(primary) = primary_name.filter(|n| !n.trim().is_empty()) else {
            decision.reason = GateReason::NoPrimaryName;
            return decision;
        };

        let name = match record_name {
            Some(name) if name.chars().count() >= MIN_JUDGEABLE_NAME_LEN => name,
            _ => {
                decision.reason = GateReason::NoRecordName;
                return decision;
            }
        };

        let outcome = match_names(&name, primary, self.gate.min_matched_tokens);
        decision.matched_tokens = outcome.matched;
        decision.required_tokens = outcome.required;
        decision.admitted = outcome.is_match();
        decision.reason = if decision.admitted {
            GateReason::NameMatched
        } else {
            GateReason::NameMismatch
        };

        debug!(
            "Gate {} #{}: '{}' vs '{}' matched {}/{} → {}",
            record.source,
            record.sequence,
            name,
            primary,
            outcome.matched,
            outcome.required,
            if decision.admitted { "admit" } else { "reject" }
        );
        decision
    }
}

/// Token overlap between a record name and the primary name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameMatch {
    pub matched: usize,
    pub required: usize,
}

impl NameMatch {
    pub fn is_match(&self) -> bool {
        self.matched >= self.required
    }
}

/// Lower-cased whitespace tokens longer than one character
pub fn name_tokens(name: &str) -> Vec<String> {
    name.split_whitespace()
        .map(str::to_lowercase)
        .filter(|t| t.chars().count() > 1)
        .collect()
}

/// Count primary-name tokens found in the record name
///
/// A primary token matches when it and some record token contain one
/// another. The record must match `min(min_matched, primary token count)`.
pub fn match_names(record_name: &str, primary_name: &str, min_matched: usize) -> NameMatch {
    let primary_tokens = name_tokens(primary_name);
    let record_tokens = name_tokens(record_name);

    let matched = primary_tokens
        .iter()
        .filter(|tp| {
            record_tokens
                .iter()
                .any(|rp| rp.contains(tp.as_str()) || tp.contains(rp.as_str()))
        })
        .count();

    NameMatch {
        matched,
        required: min_matched.min(primary_tokens.len()),
    }
}

/// First name offered by any linked record, used when the anchor has none
pub fn linked_primary_name(records: &[SourceRecord], config: &FusionConfig) -> Option<String> {
    records
        .iter()
        .filter(|r| r.is_linked())
        .find_map(|r| synonyms::record_name(r, config))
}
