// Set Merger
//
// Accumulates plural fields across admitted records. Every entry has a dedup
// key; a record that repeats a known key merges into the existing entry
// (sources appended, better representation kept) instead of adding a
// duplicate.
//
// Dedup keys:
// - phones: digits plus mask 'X'; last 10 digits when ≥10 digits and unmasked
// - emails, usernames: lower-cased
// - social profiles: "<platform domain>:<handle>"
// - employment: lower-cased (title, company)
// - vehicles: VIN, else lower-cased (brand, model)
// - credentials: literal secret value
// - relatives: lower-cased name

use crate::config::FusionConfig;
use crate::fusion::push_unique;
use crate::fusion::relatives::parse_relatives;
use crate::fusion::synonyms::{self, lookup, lookup_first, value_text};
use crate::types::{
    Coordinate, Credential, CredentialKind, EmploymentEntry, Relative, SocialProfile,
    SourceRecord, Vehicle,
};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Mask character providers use for redacted phone digits
pub const PHONE_MASK: char = 'X';

/// Plural fields produced by the merger
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedSets {
    pub phones: Vec<String>,
    pub emails: Vec<String>,
    pub usernames: Vec<String>,
    pub social: Vec<SocialProfile>,
    pub employment: Vec<EmploymentEntry>,
    pub vehicles: Vec<Vehicle>,
    pub credentials: Vec<Credential>,
    pub leak_sources: Vec<String>,
    pub leak_details: BTreeMap<String, String>,
    pub ips: Vec<String>,
    pub coordinates: Vec<Coordinate>,
    pub relatives: Vec<Relative>,
    /// Output path → contributing sources, only for non-empty fields
    pub provenance: BTreeMap<String, Vec<String>>,
}

/// Insertion-ordered set keyed by a dedup key
struct DedupSet<T> {
    entries: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T> Default for DedupSet<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T> DedupSet<T> {
    /// Insert a new entry or merge into the existing one for `key`
    fn upsert(&mut self, key: String, make: impl FnOnce() -> T, merge: impl FnOnce(&mut T)) {
        match self.index.get(&key) {
            Some(&position) => merge(&mut self.entries[position]),
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push(make());
            }
        }
    }

    fn into_vec(self) -> Vec<T> {
        self.entries
    }
}

pub struct SetMerger<'a> {
    config: &'a FusionConfig,
    phones: DedupSet<String>,
    emails: DedupSet<String>,
    usernames: DedupSet<String>,
    social: DedupSet<SocialProfile>,
    employment: DedupSet<EmploymentEntry>,
    vehicles: DedupSet<Vehicle>,
    credentials: DedupSet<Credential>,
    leak_sources: Vec<String>,
    leak_details: BTreeMap<String, String>,
    ips: DedupSet<String>,
    coordinates: DedupSet<Coordinate>,
    relatives: DedupSet<Relative>,
    provenance: BTreeMap<String, Vec<String>>,
}

impl<'a> SetMerger<'a> {
    pub fn new(config: &'a FusionConfig) -> Self {
        Self {
            config,
            phones: DedupSet::default(),
            emails: DedupSet::default(),
            usernames: DedupSet::default(),
            social: DedupSet::default(),
            employment: DedupSet::default(),
            vehicles: DedupSet::default(),
            credentials: DedupSet::default(),
            leak_sources: Vec::new(),
            leak_details: BTreeMap::new(),
            ips: DedupSet::default(),
            coordinates: DedupSet::default(),
            relatives: DedupSet::default(),
            provenance: BTreeMap::new(),
        }
    }

    /// Fold one admitted record into the accumulated sets
    pub fn absorb(&mut self, record: &SourceRecord) {
        self.absorb_phones(record);
        self.absorb_emails(record);
        self.absorb_usernames(record);
        self.absorb_social(record);
        self.absorb_employment(record);
        self.absorb_vehicle(record);
        self.absorb_credentials(record);
        self.absorb_leak(record);
        self.absorb_ips(record);
        self.absorb_coordinates(record);
        self.absorb_relatives(record);
    }

    pub fn finish(self) -> MergedSets {
        debug!(
            "Merged {} phones, {} emails, {} social profiles, {} credentials",
            self.phones.entries.len(),
            self.emails.entries.len(),
            self.social.entries.len(),
            self.credentials.entries.len()
        );
        MergedSets {
            phones: self.phones.into_vec(),
            emails: self.emails.into_vec(),
            usernames: self.usernames.into_vec(),
            social: self.social.into_vec(),
            employment: self.employment.into_vec(),
            vehicles: self.vehicles.into_vec(),
            credentials: self.credentials.into_vec(),
            leak_sources: self.leak_sources,
            leak_details: self.leak_details,
            ips: self.ips.into_vec(),
            coordinates: self.coordinates.into_vec(),
            relatives: self.relatives.into_vec(),
            provenance: self.provenance,
        }
    }

    fn note(&mut self, path: &str, source: &str) {
        push_unique(self.provenance.entry(path.to_string()).or_default(), source);
    }

    fn absorb_phones(&mut self, record: &SourceRecord) {
        for phone in lookup(record, synonyms::PHONE_KEYS.iter().copied(), self.config) {
            let Some(key) = phone_dedup_key(&phone) else {
                continue;
            };
            self.phones.upsert(
                key,
                || phone.clone(),
                |existing| {
                    if phone.starts_with('+') && !existing.starts_with('+') {
                        *existing = phone.clone();
                    }
                },
            );
            self.note("contact.phones", &record.source);
        }
    }

    fn absorb_emails(&mut self, record: &SourceRecord) {
        for email in record_emails(record, self.config) {
            self.emails.upsert(email.clone(), || email, |_| {});
            self.note("contact.emails", &record.source);
        }
    }

    fn absorb_usernames(&mut self, record: &SourceRecord) {
        for name in lookup(record, synonyms::USERNAME_KEYS.iter().copied(), self.config) {
            self.usernames.upsert(name.to_lowercase(), || name, |_| {});
            self.note("contact.usernames", &record.source);
        }
    }

    fn absorb_social(&mut self, record: &SourceRecord) {
        let mut found: Vec<(String, String)> = Vec::new();

        // Platform-named keys, e.g. "Twitter": "@handle" or "LinkedInURL": "..."
        for (key, value) in &record.fields {
            let Some(domain) = self.config.platform_domain(key) else {
                continue;
            };
            let Some(text) = value_text(value) else {
                continue;
            };
            for part in text.split(synonyms::MULTI_VALUE_SEPARATOR) {
                if !self.config.is_placeholder(part) {
                    found.push((domain.to_string(), part.trim().to_string()));
                }
            }
        }

        // Account records: {"Site": "Instagram", "UserName": "..."}
        let platform = lookup_first(record, synonyms::PLATFORM_KEYS.iter().copied(), self.config)
            .and_then(|p| self.config.platform_domain(&p).map(str::to_string));
        match platform {
            Some(domain) => {
                if let Some(handle) = lookup_first(record, synonyms::HANDLE_KEYS.iter().copied(), self.config) {
                    found.push((domain, handle));
                }
            }
            // Bare profile links: {"Url": "https://instagram.com/..."}
            None => {
                for link in lookup(record, synonyms::URL_KEYS.iter().copied(), self.config) {
                    if let Some(domain) = url_host(&link).and_then(|host| self.config.platform_domain(&host)) {
                        found.push((domain.to_string(), link));
                    }
                }
            }
        }

        // Leak databases named after a platform, e.g. "Twitter 200M"
        if record.source != record.provider {
            if let Some(domain) = self.config.platform_domain(&record.source) {
                let handle = lookup_first(record, synonyms::NICK_KEYS.iter().copied(), self.config)
                    .or_else(|| record_emails(record, self.config).iter().find_map(|e| handle_from_email(e)));
                if let Some(handle) = handle {
                    found.push((domain.to_string(), handle));
                }
            }
        }

        for (domain, raw) in found {
            let Some((handle, url)) = normalize_handle(&raw, &domain) else {
                continue;
            };
            let source = record.source.clone();
            self.social.upsert(
                format!("{}:{}", domain, handle),
                || SocialProfile {
                    platform: domain.clone(),
                    handle: handle.clone(),
                    url: url.clone(),
                    sources: vec![source.clone()],
                },
                |existing| {
                    push_unique(&mut existing.sources, &source);
                    if existing.url.is_none() {
                        existing.url = url.clone();
                    }
                },
            );
            self.note("social.profiles", &record.source);
        }
    }

    fn absorb_employment(&mut self, record: &SourceRecord) {
        let title = lookup_first(record, synonyms::TITLE_KEYS.iter().copied(), self.config);
        let company = lookup_first(record, synonyms::COMPANY_KEYS.iter().copied(), self.config);
        if title.is_none() && company.is_none() {
            return;
        }

        let (company, inferred) = match company {
            Some(company) => (Some(company), false),
            None => {
                let inferred = record_emails(record, self.config)
                    .iter()
                    .find_map(|email| infer_company(email, self.config));
                let was_inferred = inferred.is_some();
                (inferred, was_inferred)
            }
        };

        let key = format!(
            "{}|{}",
            title.as_deref().unwrap_or_default().to_lowercase(),
            company.as_deref().unwrap_or_default().to_lowercase()
        );
        let source = record.source.clone();
        self.employment.upsert(
            key,
            || EmploymentEntry {
                title,
                company,
                company_inferred: inferred,
                sources: vec![source.clone()],
            },
            |existing| push_unique(&mut existing.sources, &source),
        );
        self.note("professional.history", &record.source);
    }

    fn absorb_vehicle(&mut self, record: &SourceRecord) {
        let first = |keys: &[&str]| lookup_first(record, keys.iter().copied(), self.config);
        let vin = first(synonyms::VIN_KEYS);
        let brand = first(synonyms::BRAND_KEYS);
        let model = first(synonyms::MODEL_KEYS);
        if vin.is_none() && brand.is_none() && model.is_none() {
            return;
        }

        let key = match &vin {
            Some(vin) => vin.to_uppercase(),
            None => format!(
                "{}|{}",
                brand.as_deref().unwrap_or_default().to_lowercase(),
                model.as_deref().unwrap_or_default().to_lowercase()
            ),
        };
        let incoming = Vehicle {
            vin,
            brand,
            model,
            year: first(synonyms::VEHICLE_YEAR_KEYS),
            plate: first(synonyms::PLATE_KEYS),
            sources: vec![record.source.clone()],
        };
        let source = record.source.clone();
        self.vehicles.upsert(
            key,
            || incoming.clone(),
            |existing| {
                fill(&mut existing.brand, &incoming.brand);
                fill(&mut existing.model, &incoming.model);
                fill(&mut existing.year, &incoming.year);
                fill(&mut existing.plate, &incoming.plate);
                push_unique(&mut existing.sources, &source);
            },
        );
        self.note("assets.vehicles", &record.source);
    }

    fn absorb_credentials(&mut self, record: &SourceRecord) {
        for (key, value) in &record.fields {
            let lower = key.to_lowercase();
            if !(lower.contains("password") || lower.contains("hash")) {
                continue;
            }
            let Some(secret) = value_text(value) else {
                continue;
            };
            if self.config.is_placeholder(&secret) {
                continue;
            }

            let kind = credential_kind(key, &secret);
            let source = record.source.clone();
            self.credentials.upsert(
                secret.clone(),
                || Credential {
                    value: secret.clone(),
                    kinds: vec![kind],
                    field_types: vec![key.clone()],
                    sources: vec![source.clone()],
                },
                |existing| {
                    if !existing.kinds.contains(&kind) {
                        existing.kinds.push(kind);
                    }
                    push_unique(&mut existing.field_types, key);
                    push_unique(&mut existing.sources, &source);
                },
            );
            self.note("security.passwords", &record.source);
        }
    }

    /// Records from a database map or with leak info count as leak sources
    fn absorb_leak(&mut self, record: &SourceRecord) {
        if record.source == record.provider && record.leak_info.is_none() {
            return;
        }
        push_unique(&mut self.leak_sources, &record.source);
        if let Some(info) = &record.leak_info {
            self.leak_details
                .entry(record.source.clone())
                .or_insert_with(|| info.clone());
        }
        self.note("security.leak_sources", &record.source);
    }

    fn absorb_ips(&mut self, record: &SourceRecord) {
        for ip in lookup(record, synonyms::IP_KEYS.iter().copied(), self.config) {
            self.ips.upsert(ip.clone(), || ip, |_| {});
            self.note("security.ips", &record.source);
        }
    }

    fn absorb_coordinates(&mut self, record: &SourceRecord) {
        let Some((latitude, longitude)) = record_coordinates(record, self.config) else {
            return;
        };
        let source = record.source.clone();
        self.coordinates.upsert(
            format!("{:.6},{:.6}", latitude, longitude),
            || Coordinate {
                latitude,
                longitude,
                sources: vec![source.clone()],
            },
            |existing| push_unique(&mut existing.sources, &source),
        );
        self.note("location.coordinates", &record.source);
    }

    fn absorb_relatives(&mut self, record: &SourceRecord) {
        let Some(raw) = lookup_first(record, synonyms::RELATIVES_KEYS.iter().copied(), self.config) else {
            return;
        };
        for relative in parse_relatives(&raw) {
            let key = relative.name.to_lowercase();
            self.relatives.upsert(
                key,
                || relative.clone(),
                |existing| {
                    fill(&mut existing.relationship, &relative.relationship);
                    fill(&mut existing.ssn_masked, &relative.ssn_masked);
                },
            );
            self.note("family.relatives", &record.source);
        }
    }
}

/// Dedup key for a phone number, or `None` when it has no digits
pub fn phone_dedup_key(raw: &str) -> Option<String> {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == PHONE_MASK)
        .collect();
    if !kept.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    if kept.len() >= 10 && !kept.contains(PHONE_MASK) {
        return Some(kept[kept.len() - 10..].to_string());
    }
    Some(kept)
}

/// Lower-cased addresses offered by a record
fn record_emails(record: &SourceRecord, config: &FusionConfig) -> Vec<String> {
    let mut emails = Vec::new();
    for email in lookup(record, synonyms::EMAIL_KEYS.iter().copied(), config) {
        let email = email.to_lowercase();
        let valid = email
            .split_once('@')
            .map(|(local, domain)| !local.is_empty() && !domain.is_empty())
            .unwrap_or(false);
        if valid {
            push_unique(&mut emails, &email);
        }
    }
    emails
}

/// Employer name from a non-public email domain: "jane@acme-corp.com" → "Acme-corp"
pub fn infer_company(email: &str, config: &FusionConfig) -> Option<String> {
    let (_, domain) = email.split_once('@')?;
    if config.is_public_email_domain(domain) {
        return None;
    }
    let label = domain.split('.').next()?;
    if label.chars().count() <= 2 {
        return None;
    }
    let mut chars = label.chars();
    let first = chars.next()?;
    Some(first.to_uppercase().chain(chars).collect())
}

/// Handle and original URL for a raw social value on `domain`
pub fn normalize_handle(raw: &str, domain: &str) -> Option<(String, Option<String>)> {
    let trimmed = raw.trim();
    let lower = trimmed.to_lowercase();
    let is_url = lower.contains("://") || lower.starts_with("www.") || lower.contains(".com/");

    let handle = if is_url {
        let without_scheme = lower.split_once("://").map(|(_, rest)| rest).unwrap_or(&lower);
        let path = without_scheme
            .split(['?', '#'])
            .next()
            .unwrap_or_default();
        let segments: Vec<&str> = path.split('/').skip(1).filter(|s| !s.is_empty()).collect();
        let linkedin_profile = segments
            .iter()
            .position(|s| *s == "in")
            .and_then(|i| segments.get(i + 1));
        match linkedin_profile {
            Some(profile) if domain == "linkedin.com" => profile.to_string(),
            _ => segments.last()?.to_string(),
        }
    } else {
        lower
    };

    let handle = handle.trim().trim_start_matches('@').to_string();
    if handle.is_empty() {
        return None;
    }
    Some((handle, is_url.then(|| trimmed.to_string())))
}

/// Host of a URL-looking value, without a leading "www."
fn url_host(raw: &str) -> Option<String> {
    let lower = raw.trim().to_lowercase();
    let (rest, has_scheme) = match lower.split_once("://") {
        Some((_, rest)) => (rest, true),
        None => (lower.as_str(), false),
    };
    let (host, path) = match rest.split_once('/') {
        Some((host, path)) => (host, Some(path)),
        None => (rest, None),
    };
    let host = host.trim_start_matches("www.");
    let looks_like_url = has_scheme || lower.starts_with("www.") || path.is_some();
    if !looks_like_url || !host.contains('.') || host.contains(char::is_whitespace) {
        return None;
    }
    Some(host.to_string())
}

/// Handle guessed from an email local part: dots become '_', trailing digits dropped
fn handle_from_email(email: &str) -> Option<String> {
    let (local, _) = email.split_once('@')?;
    let handle = local.replace('.', "_");
    let handle = handle.trim_end_matches(|c: char| c.is_ascii_digit());
    (!handle.is_empty()).then(|| handle.to_string())
}

fn credential_kind(key: &str, secret: &str) -> CredentialKind {
    let hex_digest = matches!(secret.len(), 32 | 40 | 64 | 128)
        && secret.chars().all(|c| c.is_ascii_hexdigit());
    let crypt_format = ["$2a$", "$2b$", "$2y$", "$argon2", "$6$", "$5$", "$1$"]
        .iter()
        .any(|prefix| secret.starts_with(prefix));
    if key.to_lowercase().contains("hash") || hex_digest || crypt_format {
        CredentialKind::Hash
    } else {
        CredentialKind::Plaintext
    }
}

fn record_coordinates(record: &SourceRecord, config: &FusionConfig) -> Option<(f64, f64)> {
    let parse = |s: &str| s.trim().parse::<f64>().ok().filter(|v| v.is_finite());

    let lat = lookup_first(record, synonyms::LATITUDE_KEYS.iter().copied(), config);
    let lng = lookup_first(record, synonyms::LONGITUDE_KEYS.iter().copied(), config);
    let pair = match (lat, lng) {
        (Some(lat), Some(lng)) => parse(&lat).zip(parse(&lng)),
        _ => lookup_first(record, synonyms::GEOLOCATION_KEYS.iter().copied(), config).and_then(|geo| {
            let (lat, lng) = geo.split_once(',')?;
            parse(lat).zip(parse(lng))
        }),
    }?;

    let (lat, lng) = pair;
    ((-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng)).then_some(pair)
}

fn fill(slot: &mut Option<String>, incoming: &Option<String>) {
    if slot.is_none() {
        slot.clone_from(incoming);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GateMode;
    use serde_json::{json, Value};

    fn record(source: &str, fields: Value) -> SourceRecord {
        SourceRecord {
            source: source.to_string(),
            provider: "provider".to_string(),
            gating: GateMode::Linked,
            fields: fields.as_object().cloned().unwrap_or_default(),
            leak_info: None,
            sequence: 0,
        }
    }

    fn merge(records: &[SourceRecord]) -> MergedSets {
        let config = FusionConfig::default();
        let mut merger = SetMerger::new(&config);
        for r in records {
            merger.absorb(r);
        }
        merger.finish()
    }

    #[test]
    fn test_phone_keys() {
        assert_eq!(phone_dedup_key("+1-555-123-4567").as_deref(), Some("5551234567"));
        assert_eq!(phone_dedup_key("5551234567").as_deref(), Some("5551234567"));
        assert_eq!(phone_dedup_key("555-12XX-4567").as_deref(), Some("55512XX4567"));
        assert_eq!(phone_dedup_key("123-4567").as_deref(), Some("1234567"));
        assert_eq!(phone_dedup_key("n/a"), None);
    }

    #[test]
    fn test_plus_form_retained_either_order() {
        let merged = merge(&[
            record("a", json!({"Phone": "5551234567"})),
            record("b", json!({"Phone": "+1-555-123-4567"})),
        ]);
        assert_eq!(merged.phones, vec!["+1-555-123-4567"]);

        let merged = merge(&[
            record("a", json!({"Phone": "+1-555-123-4567"})),
            record("b", json!({"Phone": "5551234567"})),
        ]);
        assert_eq!(merged.phones, vec!["+1-555-123-4567"]);
        assert_eq!(merged.provenance["contact.phones"], vec!["a", "b"]);
    }

    #[test]
    fn test_masked_phones_not_collapsed_by_suffix() {
        let merged = merge(&[record("a", json!({"Phone": "555-123-45XX / 555-123-4567"}))]);
        assert_eq!(merged.phones.len(), 2);
    }

    #[test]
    fn test_emails_lowercased_and_validated() {
        let merged = merge(&[
            record("a", json!({"Email": "A@X.com"})),
            record("b", json!({"Email": "a@x.COM / not-an-email"})),
        ]);
        assert_eq!(merged.emails, vec!["a@x.com"]);
    }

    #[test]
    fn test_social_profiles() {
        let merged = merge(&[
            record("a", json!({"Twitter": "@InesB", "LinkedIn": "https://www.linkedin.com/in/ines-brady/"})),
            record("b", json!({"Site": "twitter", "UserName": "inesb"})),
            record("c", json!({"Platform": "MySpace", "UserName": "ines"})),
        ]);
        assert_eq!(merged.social.len(), 2);
        assert_eq!(merged.social[0].platform, "twitter.com");
        assert_eq!(merged.social[0].handle, "inesb");
        assert_eq!(merged.social[0].sources, vec!["a", "b"]);
        assert_eq!(merged.social[1].platform, "linkedin.com");
        assert_eq!(merged.social[1].handle, "ines-brady");
        assert!(merged.social[1].url.is_some());
    }

    #[test]
    fn test_platform_named_keys_match_by_keyword() {
        let merged = merge(&[record(
            "a",
            json!({"TwitterUrl": "https://twitter.com/ibrady", "LinkedInURL": "linkedin.com/in/ines-brady"}),
        )]);
        let found: Vec<(&str, &str)> = merged
            .social
            .iter()
            .map(|p| (p.platform.as_str(), p.handle.as_str()))
            .collect();
        assert_eq!(found, vec![("twitter.com", "ibrady"), ("linkedin.com", "ines-brady")]);
    }

    #[test]
    fn test_bare_profile_url() {
        let merged = merge(&[
            record("a", json!({"Url": "https://instagram.com/ines.brady"})),
            record("b", json!({"Url": "https://example.com/ines"})),
        ]);
        assert_eq!(merged.social.len(), 1);
        assert_eq!(merged.social[0].platform, "instagram.com");
        assert_eq!(merged.social[0].handle, "ines.brady");
        assert_eq!(merged.social[0].url.as_deref(), Some("https://instagram.com/ines.brady"));
    }

    #[test]
    fn test_platform_named_leak_database() {
        let merged = merge(&[
            record("Twitter 200M", json!({"NickName": "inesb"})),
            record("Twitter 200M", json!({"Email": "ines.brady84@gmail.com"})),
            record("Forum2019", json!({"NickName": "someone"})),
        ]);
        let handles: Vec<&str> = merged.social.iter().map(|p| p.handle.as_str()).collect();
        assert_eq!(handles, vec!["inesb", "ines_brady"]);
        assert!(merged.social.iter().all(|p| p.platform == "twitter.com"));
    }

    #[test]
    fn test_url_host() {
        assert_eq!(url_host("https://www.Instagram.com/x").as_deref(), Some("instagram.com"));
        assert_eq!(url_host("twitter.com/x").as_deref(), Some("twitter.com"));
        assert_eq!(url_host("inesb"), None);
        assert_eq!(url_host("ines.brady"), None);
    }

    #[test]
    fn test_normalize_handle() {
        assert_eq!(normalize_handle("@Foo", "twitter.com"), Some(("foo".to_string(), None)));
        assert_eq!(
            normalize_handle("https://twitter.com/Foo?s=20", "twitter.com").map(|(h, _)| h),
            Some("foo".to_string())
        );
        assert_eq!(normalize_handle("https://twitter.com/", "twitter.com"), None);
        assert_eq!(normalize_handle("  ", "twitter.com"), None);
    }

    #[test]
    fn test_employment_merges_sources() {
        let merged = merge(&[
            record("a", json!({"JobTitle": "Engineer", "CompanyName": "Acme"})),
            record("b", json!({"Title": "engineer", "Company": "ACME"})),
            record("c", json!({"JobTitle": "Manager", "Email": "ines@brightsolar.com"})),
            record("d", json!({"JobTitle": "Clerk", "Email": "ines@gmail.com"})),
        ]);
        assert_eq!(merged.employment.len(), 3);
        assert_eq!(merged.employment[0].sources, vec!["a", "b"]);
        assert_eq!(merged.employment[1].company.as_deref(), Some("Brightsolar"));
        assert!(merged.employment[1].company_inferred);
        assert!(merged.employment[2].company.is_none());
    }

    #[test]
    fn test_infer_company_rules() {
        let config = FusionConfig::default();
        assert_eq!(infer_company("x@acme.com", &config).as_deref(), Some("Acme"));
        assert_eq!(infer_company("x@ab.com", &config), None);
        assert_eq!(infer_company("x@yahoo.co.uk", &config), None);
        assert_eq!(infer_company("x@comcast.net", &config), None);
    }

    #[test]
    fn test_vehicles_keyed_by_vin_then_model() {
        let merged = merge(&[
            record("a", json!({"VIN": "1hgcm82633a004352", "AutoBrand": "Honda"})),
            record("b", json!({"VIN": "1HGCM82633A004352", "AutoModel": "Accord", "IssueYear": 2003})),
            record("c", json!({"AutoBrand": "Ford", "AutoModel": "F-150"})),
            record("d", json!({"VehicleMake": "ford", "VehicleModel": "f-150"})),
        ]);
        assert_eq!(merged.vehicles.len(), 2);
        assert_eq!(merged.vehicles[0].model.as_deref(), Some("Accord"));
        assert_eq!(merged.vehicles[0].year.as_deref(), Some("2003"));
        assert_eq!(merged.vehicles[0].sources, vec!["a", "b"]);
        assert_eq!(merged.vehicles[1].sources, vec!["c", "d"]);
    }

    #[test]
    fn test_credentials_merge_sources_and_types() {
        let merged = merge(&[
            record("a", json!({"Password": "hunter2"})),
            record("b", json!({"password": "hunter2", "PasswordHash": "5f4dcc3b5aa765d61d8327deb882cf99"})),
            record("c", json!({"Hash": "hunter2"})),
        ]);
        assert_eq!(merged.credentials.len(), 2);
        let plain = &merged.credentials[0];
        assert_eq!(plain.value, "hunter2");
        assert_eq!(plain.sources, vec!["a", "b", "c"]);
        assert_eq!(plain.field_types, vec!["Password", "password", "Hash"]);
        assert_eq!(plain.kinds, vec![CredentialKind::Plaintext, CredentialKind::Hash]);
        assert_eq!(merged.credentials[1].kinds, vec![CredentialKind::Hash]);
    }

    #[test]
    fn test_leak_sources_and_details() {
        let mut leaked = record("Breach2019", json!({"Email": "a@x.com"}));
        leaked.leak_info = Some("Forum dump".to_string());
        let direct = SourceRecord {
            source: "provider".to_string(),
            ..record("provider", json!({"Email": "b@x.com"}))
        };
        let merged = merge(&[leaked, direct]);
        assert_eq!(merged.leak_sources, vec!["Breach2019"]);
        assert_eq!(merged.leak_details["Breach2019"], "Forum dump");
    }

    #[test]
    fn test_ips_coordinates_relatives() {
        let merged = merge(&[
            record("a", json!({
                "IP": "10.0.0.1",
                "Latitude": "30.2672", "Longitude": "-97.7431",
                "Relatives": "LOUIS MARVALDI P 297282573"
            })),
            record("b", json!({
                "LastIP": "10.0.0.1 / 10.0.0.2",
                "GeoLocation": "30.2672,-97.7431",
                "Relatives": "Louis Marvaldi, ANNA MARVALDI S 123450987"
            })),
            record("c", json!({"Latitude": "200", "Longitude": "10"})),
        ]);
        assert_eq!(merged.ips, vec!["10.0.0.1", "10.0.0.2"]);
        assert_eq!(merged.coordinates.len(), 1);
        assert_eq!(merged.coordinates[0].sources, vec!["a", "b"]);
        assert_eq!(merged.relatives.len(), 2);
        assert_eq!(merged.relatives[0].ssn_masked.as_deref(), Some("***2573"));
        assert_eq!(merged.relatives[1].relationship.as_deref(), Some("Spouse"));
    }

    #[test]
    fn test_provenance_only_for_populated_fields() {
        // source equal to provider: a direct lookup, not a leak database
        let merged = merge(&[record("provider", json!({"Email": "a@x.com"}))]);
        assert_eq!(merged.provenance.len(), 1);
        assert!(merged.provenance.contains_key("contact.emails"));
    }
}
