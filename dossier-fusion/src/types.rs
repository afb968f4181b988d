// Shared Types and Data Contracts
//
// Explicit contracts between the fusion stages: provider responses go in,
// flat source records move between stages, and one immutable profile plus a
// diagnostic trace come out.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use uuid::Uuid;

// ============================================================================
// Inputs
// ============================================================================

/// How records from a provider are admitted as evidence for the subject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateMode {
    /// Broad name search; may return unrelated people with similar names
    Strict,
    /// Already joined by phone/email at the provider; admitted automatically
    Linked,
}

/// The identifiers that started the lookup
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anchor {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl Anchor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_phone(mut self, phone: &str) -> Self {
        self.phone = Some(phone.to_string());
        self
    }

    pub fn with_email(mut self, email: &str) -> Self {
        self.email = Some(email.to_string());
        self
    }

    /// Query phone reduced to its digits
    pub fn phone_digits(&self) -> String {
        self.phone
            .as_deref()
            .map(|p| p.chars().filter(|c| c.is_ascii_digit()).collect())
            .unwrap_or_default()
    }
}

/// One provider's raw response, as handed over by the client layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    pub provider: String,
    pub gating: GateMode,
    pub payload: Value,
}

impl ProviderResponse {
    pub fn new(provider: &str, gating: GateMode, payload: Value) -> Self {
        Self {
            provider: provider.to_string(),
            gating,
            payload,
        }
    }

    pub fn strict(provider: &str, payload: Value) -> Self {
        Self::new(provider, GateMode::Strict, payload)
    }

    pub fn linked(provider: &str, payload: Value) -> Self {
        Self::new(provider, GateMode::Linked, payload)
    }
}

// ============================================================================
// Normalized records and candidates
// ============================================================================

/// One flat record from one provider/database
///
/// Immutable once the normalizer has produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRecord {
    /// Database name for database-map responses, else the provider name
    pub source: String,
    pub provider: String,
    pub gating: GateMode,
    pub fields: Map<String, Value>,
    pub leak_info: Option<String>,
    /// Position of the record in provider-response order
    pub sequence: usize,
}

impl SourceRecord {
    pub fn is_linked(&self) -> bool {
        self.gating == GateMode::Linked
    }
}

/// A scored proposal for a single scalar field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateValue {
    pub value: String,
    pub source: String,
    pub provider: String,
    pub score: i64,
    /// Candidate came from a linked (higher-trust) record
    pub trusted: bool,
    pub sequence: usize,
}

/// Named scalar slots of the output profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Name,
    Gender,
    Birthday,
    Ssn,
    PrimaryPhone,
    PrimaryEmail,
    FullAddress,
    City,
    State,
    Postcode,
    Country,
    MaritalStatus,
    ChildrenCount,
    Spouse,
    PoliticalParty,
    Religion,
    Education,
    Ethnicity,
    Income,
    NetWorth,
    Bank,
    CreditCapacity,
    Company,
    Position,
    Industry,
    HomeValue,
    HomeBuiltYear,
    PropertyType,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 28] = [
        Self::Name,
        Self::Gender,
        Self::Birthday,
        Self::Ssn,
        Self::PrimaryPhone,
        Self::PrimaryEmail,
        Self::FullAddress,
        Self::City,
        Self::State,
        Self::Postcode,
        Self::Country,
        Self::MaritalStatus,
        Self::ChildrenCount,
        Self::Spouse,
        Self::PoliticalParty,
        Self::Religion,
        Self::Education,
        Self::Ethnicity,
        Self::Income,
        Self::NetWorth,
        Self::Bank,
        Self::CreditCapacity,
        Self::Company,
        Self::Position,
        Self::Industry,
        Self::HomeValue,
        Self::HomeBuiltYear,
        Self::PropertyType,
    ];

    /// Short key, e.g. `primary_phone`
    pub fn key(self) -> &'static str {
        let path = self.path();
        path.rsplit('.').next().unwrap_or(path)
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.key() == key)
    }

    /// Output path used as the provenance key
    pub fn path(self) -> &'static str {
        match self {
            Self::Name => "basic_info.name",
            Self::Gender => "basic_info.gender",
            Self::Birthday => "basic_info.birthday",
            Self::Ssn => "basic_info.ssn",
            Self::PrimaryPhone => "contact.primary_phone",
            Self::PrimaryEmail => "contact.primary_email",
            Self::FullAddress => "address.full_address",
            Self::City => "address.city",
            Self::State => "address.state",
            Self::Postcode => "address.postcode",
            Self::Country => "address.country",
            Self::MaritalStatus => "family.marital_status",
            Self::ChildrenCount => "family.children_count",
            Self::Spouse => "family.spouse",
            Self::PoliticalParty => "basic_info.political_party",
            Self::Religion => "basic_info.religion",
            Self::Education => "basic_info.education",
            Self::Ethnicity => "basic_info.ethnicity",
            Self::Income => "financial.income",
            Self::NetWorth => "financial.net_worth",
            Self::Bank => "financial.bank",
            Self::CreditCapacity => "financial.credit_capacity",
            Self::Company => "professional.company",
            Self::Position => "professional.position",
            Self::Industry => "professional.industry",
            Self::HomeValue => "assets.home_value",
            Self::HomeBuiltYear => "assets.home_built_year",
            Self::PropertyType => "assets.property_type",
        }
    }
}

/// Scoring function applied to a scored field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scorer {
    Ssn,
    Phone,
    Email,
}

/// How a canonical field picks its value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionPolicy {
    /// Maximum score wins; nothing is chosen when the maximum is ≤ 0
    Scored(Scorer),
    /// First admitted non-placeholder value wins
    FirstNonEmpty,
}

// ============================================================================
// Output profile
// ============================================================================

/// The fused subject profile
///
/// Built once per query and never modified afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProfileEntity {
    pub basic_info: BasicInfo,
    pub contact: Contact,
    pub address: Address,
    pub professional: Professional,
    pub financial: Financial,
    pub family: Family,
    pub assets: Assets,
    pub security: Security,
    pub social: Social,
    pub location: Location,
    pub completeness_score: u8,
    /// Output field path → contributing source names
    pub provenance: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BasicInfo {
    pub name: Option<String>,
    pub gender: Option<String>,
    pub birthday: Option<String>,
    pub age: Option<u32>,
    pub ssn: Option<String>,
    pub political_party: Option<String>,
    pub religion: Option<String>,
    pub education: Option<String>,
    pub ethnicity: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Contact {
    pub primary_phone: Option<String>,
    pub primary_email: Option<String>,
    pub phones: Vec<String>,
    pub emails: Vec<String>,
    pub usernames: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Address {
    pub full_address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postcode: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Professional {
    pub company: Option<String>,
    pub position: Option<String>,
    pub industry: Option<String>,
    pub history: Vec<EmploymentEntry>,
}

/// One job held, merged across sources
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmploymentEntry {
    pub title: Option<String>,
    pub company: Option<String>,
    /// Company was derived from a non-public email domain
    pub company_inferred: bool,
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Financial {
    pub income: Option<String>,
    pub net_worth: Option<String>,
    pub bank: Option<String>,
    pub credit_capacity: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Family {
    pub marital_status: Option<String>,
    pub children_count: Option<String>,
    pub spouse: Option<String>,
    pub relatives: Vec<Relative>,
}

/// A relative parsed from a provider's relatives string
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Relative {
    pub name: String,
    pub relationship: Option<String>,
    /// Last four SSN digits, prefixed with `***`
    pub ssn_masked: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Assets {
    pub vehicles: Vec<Vehicle>,
    pub home_value: Option<String>,
    pub home_built_year: Option<String>,
    pub property_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Vehicle {
    pub vin: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub year: Option<String>,
    pub plate: Option<String>,
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Security {
    pub ssn: Option<String>,
    pub passwords: Vec<Credential>,
    pub leak_sources: Vec<String>,
    /// Database name → leak description
    pub leak_details: BTreeMap<String, String>,
    pub breach_count: usize,
    pub ips: Vec<String>,
    pub risk_level: RiskLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
    Plaintext,
    Hash,
}

/// A leaked secret, deduplicated on its literal value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Credential {
    pub value: String,
    pub kinds: Vec<CredentialKind>,
    /// Raw key names the secret appeared under
    pub field_types: Vec<String>,
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Social {
    pub profiles: Vec<SocialProfile>,
    pub twitter: Vec<String>,
    pub linkedin: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SocialProfile {
    /// Platform domain, e.g. `twitter.com`
    pub platform: String,
    pub handle: String,
    pub url: Option<String>,
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Location {
    pub coordinates: Vec<Coordinate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
    pub sources: Vec<String>,
}

// ============================================================================
// Diagnostic trace
// ============================================================================

/// Audit trail of one fusion run
#[derive(Debug, Clone, Serialize)]
pub struct FusionTrace {
    pub run_id: Uuid,
    pub anchor: Anchor,
    /// Name used for strict gating (anchor name or linked fallback)
    pub primary_name: Option<String>,
    pub unavailable: Vec<UnavailableProvider>,
    pub skipped: Vec<SkippedInput>,
    pub gate: Vec<GateDecision>,
    pub fields: Vec<FieldTrace>,
}

impl FusionTrace {
    pub fn new(anchor: Anchor) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            anchor,
            primary_name: None,
            unavailable: Vec::new(),
            skipped: Vec::new(),
            gate: Vec::new(),
            fields: Vec::new(),
        }
    }

    pub fn admitted_count(&self) -> usize {
        self.gate.iter().filter(|d| d.admitted).count()
    }

    pub fn rejected_count(&self) -> usize {
        self.gate.len() - self.admitted_count()
    }

    /// Trace entry for one canonical field, if it had any candidates
    pub fn field(&self, field: CanonicalField) -> Option<&FieldTrace> {
        self.fields.iter().find(|f| f.field == field)
    }
}

/// A provider that produced no response before fusion ran
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnavailableProvider {
    pub provider: String,
    pub reason: String,
}

/// Part of a response the normalizer could not use
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedInput {
    pub provider: String,
    /// Location inside the response, e.g. `List.Breach2019[3]`
    pub location: String,
    pub reason: String,
}

/// Admission decision for one record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GateDecision {
    pub provider: String,
    pub source: String,
    pub sequence: usize,
    pub mode: GateMode,
    pub record_name: Option<String>,
    pub admitted: bool,
    pub matched_tokens: usize,
    pub required_tokens: usize,
    pub reason: GateReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateReason {
    LinkedSource,
    NoRecordName,
    NoPrimaryName,
    NameMatched,
    NameMismatch,
}

/// Candidates and outcome for one scalar field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldTrace {
    pub field: CanonicalField,
    pub policy: ResolutionPolicy,
    pub candidates: Vec<CandidateValue>,
    pub winner: Option<String>,
    pub conflicts: Vec<Conflict>,
    /// A trusted linked candidate displaced a higher-ranked strict one
    pub trusted_override: bool,
}

/// A losing distinct value for a field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conflict {
    pub value: String,
    pub score: i64,
    /// Normalized Levenshtein similarity to the winner (1.0 = identical)
    pub similarity: f64,
}
