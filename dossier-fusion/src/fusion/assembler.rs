// Profile Assembler
//
// Orchestrates one fusion run:
// 1. ingest(): normalize each provider response as it arrives (any order)
// 2. finish(): pick the primary name, gate every record, resolve scalar
//    fields, merge plural fields, attach provenance and derived assessments
//
// Accumulate-then-merge: responses are only collected until finish(), which
// consumes the assembler and returns an immutable profile plus its trace.
// Providers that never answered are noted and simply contribute nothing.

use crate::config::FusionConfig;
use crate::fusion::field_resolver::{FieldResolver, ResolvedFields};
use crate::fusion::identity_gate::{linked_primary_name, IdentityGate};
use crate::fusion::normalizer::SourceNormalizer;
use crate::fusion::set_merger::{MergedSets, SetMerger};
use crate::fusion::validators::{assess_risk, CompletenessScorer};
use crate::types::{
    Address, Anchor, Assets, BasicInfo, CanonicalField, Contact, Family, Financial, FusionTrace,
    Location, ProfileEntity, Professional, ProviderResponse, Security, Social, SourceRecord,
    UnavailableProvider,
};
use chrono::{Datelike, NaiveDate};
use tracing::{debug, info, warn};

const BIRTHDAY_FORMATS: [&str; 5] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d", "%d.%m.%Y", "%Y%m%d"];

pub struct ProfileAssembler<'a> {
    config: &'a FusionConfig,
    anchor: Anchor,
    normalizer: SourceNormalizer,
    records: Vec<SourceRecord>,
    trace: FusionTrace,
    reference_date: Option<NaiveDate>,
}

impl<'a> ProfileAssembler<'a> {
    pub fn new(anchor: Anchor, config: &'a FusionConfig) -> Self {
        Self {
            config,
            trace: FusionTrace::new(anchor.clone()),
            anchor,
            normalizer: SourceNormalizer::new(),
            records: Vec::new(),
            reference_date: None,
        }
    }

    /// Date used to derive the subject's age; no age is derived without one
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    /// Normalize and queue one provider response
    pub fn ingest(&mut self, response: &ProviderResponse) {
        let normalized = self.normalizer.normalize(response, self.records.len());
        debug!(
            "Ingested {} ({:?}): {} records",
            response.provider,
            response.gating,
            normalized.records.len()
        );
        self.records.extend(normalized.records);
        self.trace.skipped.extend(normalized.skipped);
    }

    /// Record a provider that produced nothing before the deadline
    pub fn note_unavailable(&mut self, provider: &str, reason: &str) {
        warn!("Provider {} unavailable: {}", provider, reason);
        self.trace.unavailable.push(UnavailableProvider {
            provider: provider.to_string(),
            reason: reason.to_string(),
        });
    }

    /// Number of records collected so far
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Run gating, resolution and merging; returns the fused profile and trace
    pub fn finish(self) -> (ProfileEntity, FusionTrace) {
        let Self {
            config,
            anchor,
            records,
            mut trace,
            reference_date,
            ..
        } = self;

        let primary_name = anchor
            .name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .or_else(|| linked_primary_name(&records, config));
        trace.primary_name = primary_name.clone();

        let gate = IdentityGate::new(config);
        let mut admitted = Vec::with_capacity(records.len());
        for record in records {
            let decision = gate.admit(&record, primary_name.as_deref());
            if decision.admitted {
                admitted.push(record);
            }
            trace.gate.push(decision);
        }

        let resolved = FieldResolver::new(config).resolve_all(&admitted, &anchor);

        let mut merger = SetMerger::new(config);
        for record in &admitted {
            merger.absorb(record);
        }
        let merged = merger.finish();

        let mut profile = build_profile(&resolved, merged);
        profile.basic_info.age = match (reference_date, profile.basic_info.birthday.as_deref()) {
            (Some(today), Some(birthday)) => age_on(birthday, today),
            _ => None,
        };
        profile.security.risk_level = assess_risk(&profile.security);
        profile.completeness_score = CompletenessScorer::default().score(&profile);
        trace.fields = resolved.traces;

        info!(
            "Fusion complete: {} records admitted, {} rejected, {} skipped inputs, {} providers unavailable, completeness {}",
            trace.admitted_count(),
            trace.rejected_count(),
            trace.skipped.len(),
            trace.unavailable.len(),
            profile.completeness_score
        );
        (profile, trace)
    }
}

/// Fuse a complete set of responses in one call
pub fn fuse(
    anchor: &Anchor,
    responses: &[ProviderResponse],
    config: &FusionConfig,
) -> (ProfileEntity, FusionTrace) {
    let mut assembler = ProfileAssembler::new(anchor.clone(), config);
    for response in responses {
        assembler.ingest(response);
    }
    assembler.finish()
}

fn build_profile(resolved: &ResolvedFields, merged: MergedSets) -> ProfileEntity {
    let get = |field: CanonicalField| resolved.get(field).map(str::to_string);

    let mut provenance = merged.provenance;
    for (field, value) in &resolved.values {
        provenance.insert(field.path().to_string(), value.sources.clone());
    }

    let handles_on = |domain: &str| -> Vec<String> {
        merged
            .social
            .iter()
            .filter(|p| p.platform == domain)
            .map(|p| p.handle.clone())
            .collect()
    };

    ProfileEntity {
        basic_info: BasicInfo {
            name: get(CanonicalField::Name),
            gender: get(CanonicalField::Gender),
            birthday: get(CanonicalField::Birthday),
            age: None,
            ssn: get(CanonicalField::Ssn),
            political_party: get(CanonicalField::PoliticalParty),
            religion: get(CanonicalField::Religion),
            education: get(CanonicalField::Education),
            ethnicity: get(CanonicalField::Ethnicity),
        },
        contact: Contact {
            primary_phone: get(CanonicalField::PrimaryPhone),
            primary_email: get(CanonicalField::PrimaryEmail),
            phones: merged.phones,
            emails: merged.emails,
            usernames: merged.usernames,
        },
        address: Address {
            full_address: get(CanonicalField::FullAddress),
            city: get(CanonicalField::City),
            state: get(CanonicalField::State),
            postcode: get(CanonicalField::Postcode),
            country: get(CanonicalField::Country),
        },
        professional: Professional {
            company: get(CanonicalField::Company),
            position: get(CanonicalField::Position),
            industry: get(CanonicalField::Industry),
            history: merged.employment,
        },
        financial: Financial {
            income: get(CanonicalField::Income),
            net_worth: get(CanonicalField::NetWorth),
            bank: get(CanonicalField::Bank),
            credit_capacity: get(CanonicalField::CreditCapacity),
        },
        family: Family {
            marital_status: get(CanonicalField::MaritalStatus),
            children_count: get(CanonicalField::ChildrenCount),
            spouse: get(CanonicalField::Spouse),
            relatives: merged.relatives,
        },
        assets: Assets {
            vehicles: merged.vehicles,
            home_value: get(CanonicalField::HomeValue),
            home_built_year: get(CanonicalField::HomeBuiltYear),
            property_type: get(CanonicalField::PropertyType),
        },
        security: Security {
            ssn: get(CanonicalField::Ssn),
            passwords: merged.credentials,
            breach_count: merged.leak_details.len(),
            leak_sources: merged.leak_sources,
            leak_details: merged.leak_details,
            ips: merged.ips,
            risk_level: Default::default(),
        },
        social: Social {
            twitter: handles_on("twitter.com"),
            linkedin: handles_on("linkedin.com"),
            profiles: merged.social,
        },
        location: Location {
            coordinates: merged.coordinates,
        },
        completeness_score: 0,
        provenance,
    }
}

/// Parse a birthday in any of the common provider formats
pub fn parse_birthday(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    BIRTHDAY_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
}

/// Whole years between `birthday` and `today`; `None` if unparseable or in the future
pub fn age_on(birthday: &str, today: NaiveDate) -> Option<u32> {
    let born = parse_birthday(birthday)?;
    if born > today {
        return None;
    }
    let mut years = today.year() - born.year();
    if (today.month(), today.day()) < (born.month(), born.day()) {
        years -= 1;
    }
    u32::try_from(years).ok()
}
