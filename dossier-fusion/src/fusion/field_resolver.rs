// Field Resolver
//
// Chooses one canonical value per scalar field from the admitted records.
//
// Algorithm (per field, in FIELD_SPECS order):
// 1. Collect candidates from every admitted record via the synonym table
// 2. Score them (scored fields) or keep encounter order (first-nonempty fields)
// 3. Pick the best; ties go to the candidate encountered first
// 4. Scored fields stay unset unless the best score is above zero
// 5. For trusted-override fields, a qualifying linked candidate beats any
//    strict one
//
// The email scorer rewards addresses that contain the subject's name: the
// anchor name when the query has one, else the name resolved above.

use crate::config::FusionConfig;
use crate::fusion::scoring::{self, EmailContext, NameTokens};
use crate::fusion::synonyms::{FieldSpec, SynonymTable, FIELD_SPECS};
use crate::fusion::{digits_only, push_unique};
use crate::types::{
    Anchor, CandidateValue, CanonicalField, Conflict, FieldTrace, ResolutionPolicy, Scorer,
    SourceRecord,
};
use std::collections::BTreeMap;
use tracing::debug;

/// A resolved scalar value with the sources that proposed it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedValue {
    pub value: String,
    pub sources: Vec<String>,
}

/// Output of a resolver run
#[derive(Debug, Clone, Default)]
pub struct ResolvedFields {
    pub values: BTreeMap<CanonicalField, ResolvedValue>,
    pub traces: Vec<FieldTrace>,
}

impl ResolvedFields {
    pub fn get(&self, field: CanonicalField) -> Option<&str> {
        self.values.get(&field).map(|v| v.value.as_str())
    }
}

/// Inputs shared by all scorers in one run
struct ScoringInputs<'a> {
    query_phone: String,
    email: EmailContext<'a>,
}

pub struct FieldResolver<'a> {
    config: &'a FusionConfig,
    synonyms: SynonymTable<'a>,
}

impl<'a> FieldResolver<'a> {
    pub fn new(config: &'a FusionConfig) -> Self {
        Self {
            config,
            synonyms: SynonymTable::new(config),
        }
    }

    /// Resolve every canonical field over the admitted records
    pub fn resolve_all(&self, records: &[SourceRecord], anchor: &Anchor) -> ResolvedFields {
        let mut out = ResolvedFields::default();
        let mut inputs = ScoringInputs {
            query_phone: anchor.phone_digits(),
            email: EmailContext {
                names: NameTokens::default(),
                config: &self.config.scoring,
            },
        };

        for spec in FIELD_SPECS {
            if spec.field == CanonicalField::PrimaryEmail {
                let subject_name = anchor
                    .name
                    .clone()
                    .filter(|n| !n.trim().is_empty())
                    .or_else(|| out.get(CanonicalField::Name).map(str::to_string))
                    .unwrap_or_default();
                inputs.email.names = NameTokens::from_name(&subject_name);
            }

            let (resolved, trace) = self.resolve_field(spec, records, &inputs);
            if let Some(resolved) = resolved {
                out.values.insert(spec.field, resolved);
            }
            if !trace.candidates.is_empty() {
                out.traces.push(trace);
            }
        }

        debug!(
            "Resolved {} of {} scalar fields from {} records",
            out.values.len(),
            FIELD_SPECS.len(),
            records.len()
        );
        out
    }

    fn resolve_field(
        &self,
        spec: &FieldSpec,
        records: &[SourceRecord],
        inputs: &ScoringInputs<'_>,
    ) -> (Option<ResolvedValue>, FieldTrace) {
        let candidates: Vec<CandidateValue> = records
            .iter()
            .flat_map(|record| {
                self.synonyms
                    .values(spec.field, record)
                    .into_iter()
                    .map(move |value| (record, value))
            })
            .map(|(record, value)| CandidateValue {
                score: score_candidate(spec.policy, &value, inputs),
                value,
                source: record.source.clone(),
                provider: record.provider.clone(),
                trusted: record.is_linked(),
                sequence: record.sequence,
            })
            .collect();

        let (winner, trusted_override) = select(spec, &candidates);
        let mut trace = FieldTrace {
            field: spec.field,
            policy: spec.policy,
            candidates: Vec::new(),
            winner: None,
            conflicts: Vec::new(),
            trusted_override,
        };

        let resolved = winner.map(|index| {
            let chosen = &candidates[index];
            let key = normalized(spec.policy, &chosen.value);

            let mut sources = Vec::new();
            for candidate in &candidates {
                let candidate_key = normalized(spec.policy, &candidate.value);
                if candidate_key == key {
                    push_unique(&mut sources, &candidate.source);
                } else if !trace
                    .conflicts
                    .iter()
                    .any(|c| normalized(spec.policy, &c.value) == candidate_key)
                {
                    trace.conflicts.push(Conflict {
                        value: candidate.value.clone(),
                        score: candidate.score,
                        similarity: strsim::normalized_levenshtein(
                            &chosen.value.to_lowercase(),
                            &candidate.value.to_lowercase(),
                        ),
                    });
                }
            }

            if trusted_override {
                debug!(
                    "{}: linked candidate '{}' overrides higher-ranked strict candidate",
                    spec.field.key(),
                    chosen.value
                );
            }

            ResolvedValue {
                value: chosen.value.clone(),
                sources,
            }
        });

        trace.winner = resolved.as_ref().map(|r| r.value.clone());
        trace.candidates = candidates;
        (resolved, trace)
    }
}

fn score_candidate(policy: ResolutionPolicy, value: &str, inputs: &ScoringInputs<'_>) -> i64 {
    match policy {
        ResolutionPolicy::Scored(Scorer::Ssn) => scoring::score_ssn(value),
        ResolutionPolicy::Scored(Scorer::Phone) => scoring::score_phone(value, &inputs.query_phone),
        ResolutionPolicy::Scored(Scorer::Email) => scoring::score_email(value, &inputs.email),
        ResolutionPolicy::FirstNonEmpty => 0,
    }
}

/// Index of the winning candidate and whether the trusted override applied
fn select(spec: &FieldSpec, candidates: &[CandidateValue]) -> (Option<usize>, bool) {
    let overall = best_of(spec.policy, candidates.iter().enumerate());
    if !spec.trusted_override {
        return (overall, false);
    }

    let trusted = best_of(
        spec.policy,
        candidates.iter().enumerate().filter(|(_, c)| c.trusted),
    );
    match trusted {
        Some(index) => (Some(index), overall != Some(index)),
        None => (overall, false),
    }
}

/// Best candidate from a pool in encounter order
///
/// Strictly greater scores displace the incumbent, so ties keep the earliest
/// candidate.
fn best_of<'c>(
    policy: ResolutionPolicy,
    mut pool: impl Iterator<Item = (usize, &'c CandidateValue)>,
) -> Option<usize> {
    match policy {
        ResolutionPolicy::FirstNonEmpty => pool.next().map(|(index, _)| index),
        ResolutionPolicy::Scored(_) => {
            let mut best: Option<(usize, i64)> = None;
            for (index, candidate) in pool {
                if best.map_or(true, |(_, score)| candidate.score > score) {
                    best = Some((index, candidate.score));
                }
            }
            best.filter(|(_, score)| *score > 0).map(|(index, _)| index)
        }
    }
}

/// Comparison form used to group equal candidates
fn normalized(policy: ResolutionPolicy, value: &str) -> String {
    match policy {
        ResolutionPolicy::Scored(Scorer::Ssn) | ResolutionPolicy::Scored(Scorer::Phone) => {
            digits_only(value)
        }
        ResolutionPolicy::Scored(Scorer::Email) => value.trim().to_lowercase(),
        ResolutionPolicy::FirstNonEmpty => value
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase(),
    }
}
