// Synonym Table
//
// Declarative mapping from canonical fields to the raw keys providers use for
// them, plus one generic lookup that every stage shares. Adding a provider
// spelling is a data change here (or a `fusion.synonyms` config entry), not a
// code change in the resolver or merger.

use crate::config::FusionConfig;
use crate::types::{CanonicalField, ResolutionPolicy, Scorer, SourceRecord};
use chrono::NaiveDate;
use serde_json::Value;

/// Separator providers use to pack several values into one string
pub const MULTI_VALUE_SEPARATOR: &str = " / ";

/// Value assembled from several raw keys when no direct alias is present
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Composite {
    /// "<first> <last>"
    FirstLast {
        first: &'static str,
        last: &'static str,
    },
    /// "YYYY-MM-DD" from separate parts; month and day default to 01
    BirthParts {
        year: &'static str,
        month: &'static str,
        day: &'static str,
    },
}

/// Resolution rules for one canonical field
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub field: CanonicalField,
    pub aliases: &'static [&'static str],
    pub composite: Option<Composite>,
    pub policy: ResolutionPolicy,
    /// Linked-record candidates outrank strict-record candidates
    pub trusted_override: bool,
}

const fn first_wins(field: CanonicalField, aliases: &'static [&'static str]) -> FieldSpec {
    FieldSpec {
        field,
        aliases,
        composite: None,
        policy: ResolutionPolicy::FirstNonEmpty,
        trusted_override: false,
    }
}

pub const PHONE_KEYS: &[&str] = &[
    "Phone",
    "MobilePhone",
    "Cell",
    "HomePhone",
    "PhoneNumber",
    "Phone2",
    "WorkPhone",
];
pub const EMAIL_KEYS: &[&str] = &["Email", "EmailAddress", "Email2", "Mail"];
pub const NAME_KEYS: &[&str] = &["FullName", "Name"];
pub const TITLE_KEYS: &[&str] = &["JobTitle", "Title", "Work", "Position"];
pub const COMPANY_KEYS: &[&str] = &["JobCompanyName", "CompanyName", "Company", "Employer"];
pub const USERNAME_KEYS: &[&str] = &["NickName", "Nick", "UserName", "Username", "Login"];
pub const IP_KEYS: &[&str] = &["IP", "LastIP", "IPAddress", "RegIP"];
pub const VIN_KEYS: &[&str] = &["VIN"];
pub const BRAND_KEYS: &[&str] = &["AutoBrand", "VehicleMake", "CarMake", "Make"];
pub const MODEL_KEYS: &[&str] = &["AutoModel", "VehicleModel", "CarModel", "Model"];
pub const VEHICLE_YEAR_KEYS: &[&str] = &["IssueYear", "VehicleYear", "CarYear"];
pub const PLATE_KEYS: &[&str] = &["AutoNumber", "LicensePlate"];
pub const LATITUDE_KEYS: &[&str] = &["Latitude", "lat"];
pub const LONGITUDE_KEYS: &[&str] = &["Longitude", "lng", "lon"];
pub const GEOLOCATION_KEYS: &[&str] = &["GeoLocation"];
pub const RELATIVES_KEYS: &[&str] = &["Relatives"];
pub const PLATFORM_KEYS: &[&str] = &["Platform", "Site", "Service", "Network"];
pub const URL_KEYS: &[&str] = &["Url", "Link", "ProfileUrl"];
pub const NICK_KEYS: &[&str] = &["NickName", "Nick"];
pub const HANDLE_KEYS: &[&str] = &["Handle", "UserName", "Nick", "NickName", "Login", "Url", "Link", "Profile"];

const NAME_COMPOSITE: Composite = Composite::FirstLast {
    first: "FirstName",
    last: "LastName",
};

const BIRTH_COMPOSITE: Composite = Composite::BirthParts {
    year: "BDayYear",
    month: "BDayMonth",
    day: "BDayDay",
};

/// Built-in field table, in resolution order
pub const FIELD_SPECS: &[FieldSpec] = &[
    FieldSpec {
        field: CanonicalField::Name,
        aliases: NAME_KEYS,
        composite: Some(NAME_COMPOSITE),
        policy: ResolutionPolicy::FirstNonEmpty,
        trusted_override: true,
    },
    first_wins(CanonicalField::Gender, &["Gender", "Sex"]),
    FieldSpec {
        field: CanonicalField::Birthday,
        aliases: &["BDay", "Birthday", "BirthDate", "DateOfBirth", "DOB"],
        composite: Some(BIRTH_COMPOSITE),
        policy: ResolutionPolicy::FirstNonEmpty,
        trusted_override: false,
    },
    FieldSpec {
        field: CanonicalField::Ssn,
        aliases: &["SSN", "SocialSecurityNumber"],
        composite: None,
        policy: ResolutionPolicy::Scored(Scorer::Ssn),
        trusted_override: true,
    },
    FieldSpec {
        field: CanonicalField::PrimaryPhone,
        aliases: PHONE_KEYS,
        composite: None,
        policy: ResolutionPolicy::Scored(Scorer::Phone),
        trusted_override: false,
    },
    FieldSpec {
        field: CanonicalField::PrimaryEmail,
        aliases: EMAIL_KEYS,
        composite: None,
        policy: ResolutionPolicy::Scored(Scorer::Email),
        trusted_override: false,
    },
    first_wins(CanonicalField::FullAddress, &["Address", "FullAddress", "Street"]),
    first_wins(CanonicalField::City, &["City", "Locality"]),
    first_wins(CanonicalField::State, &["State", "Region", "Province"]),
    first_wins(CanonicalField::Postcode, &["PostCode", "Zip", "ZipCode", "PostalCode"]),
    first_wins(CanonicalField::Country, &["Country", "CountryName", "CountryCode"]),
    first_wins(CanonicalField::MaritalStatus, &["MaritalStatus"]),
    first_wins(CanonicalField::ChildrenCount, &["NumberOfChildren", "AmountKids"]),
    first_wins(CanonicalField::Spouse, &["Spouse"]),
    first_wins(CanonicalField::PoliticalParty, &["PoliticalParty", "Party", "PartyVoted"]),
    first_wins(CanonicalField::Religion, &["Religion"]),
    first_wins(CanonicalField::Education, &["Education"]),
    first_wins(CanonicalField::Ethnicity, &["EthnicGroup", "Ethnicity"]),
    first_wins(CanonicalField::Income, &["Income"]),
    first_wins(CanonicalField::NetWorth, &["NetWorth"]),
    first_wins(CanonicalField::Bank, &["BankName", "Bank"]),
    first_wins(CanonicalField::CreditCapacity, &["CreditCapacity"]),
    first_wins(CanonicalField::Company, COMPANY_KEYS),
    first_wins(CanonicalField::Position, TITLE_KEYS),
    first_wins(CanonicalField::Industry, &["Industry"]),
    first_wins(
        CanonicalField::HomeValue,
        &["HomeValue", "EstimatedHomeValue", "HomeMarketValue", "HousePrice"],
    ),
    first_wins(CanonicalField::HomeBuiltYear, &["HomeBuiltYear", "YearBuilt"]),
    first_wins(CanonicalField::PropertyType, &["PropertyType", "DwellingType"]),
];

/// Table entry for `field`
pub fn spec_for(field: CanonicalField) -> Option<&'static FieldSpec> {
    FIELD_SPECS.iter().find(|spec| spec.field == field)
}

/// Field lookups bound to a configuration
pub struct SynonymTable<'a> {
    config: &'a FusionConfig,
}

impl<'a> SynonymTable<'a> {
    pub fn new(config: &'a FusionConfig) -> Self {
        Self { config }
    }

    /// All usable values a record offers for `field`
    ///
    /// Direct aliases (built-in, then configured) come first; the composite
    /// is consulted only when no alias produced a value.
    pub fn values(&self, field: CanonicalField, record: &SourceRecord) -> Vec<String> {
        let Some(spec) = spec_for(field) else {
            return Vec::new();
        };
        let aliases = spec
            .aliases
            .iter()
            .copied()
            .chain(self.config.extra_synonyms(field).iter().map(String::as_str));
        let mut values = lookup(record, aliases, self.config);

        if values.is_empty() {
            if let Some(composite) = spec.composite {
                values.extend(compose(composite, record, self.config));
            }
        }
        values
    }

    /// First usable value for `field`
    pub fn first(&self, field: CanonicalField, record: &SourceRecord) -> Option<String> {
        self.values(field, record).into_iter().next()
    }
}

/// Generic lookup over an ordered alias list
///
/// Keys match case-insensitively. Multi-value strings are split on
/// [`MULTI_VALUE_SEPARATOR`]; placeholders and repeats are dropped.
pub fn lookup<'k>(
    record: &SourceRecord,
    aliases: impl IntoIterator<Item = &'k str>,
    config: &FusionConfig,
) -> Vec<String> {
    let mut values: Vec<String> = Vec::new();
    for alias in aliases {
        for (key, raw) in &record.fields {
            if !key.eq_ignore_ascii_case(alias) {
                continue;
            }
            let Some(text) = value_text(raw) else {
                continue;
            };
            for part in text.split(MULTI_VALUE_SEPARATOR) {
                let part = part.trim();
                if config.is_placeholder(part) || values.iter().any(|v| v == part) {
                    continue;
                }
                values.push(part.to_string());
            }
        }
    }
    values
}

/// First usable value among `aliases`
pub fn lookup_first<'k>(
    record: &SourceRecord,
    aliases: impl IntoIterator<Item = &'k str>,
    config: &FusionConfig,
) -> Option<String> {
    lookup(record, aliases, config).into_iter().next()
}

/// Name-like value used by the identity gate: FullName, Name, or First + Last
pub fn record_name(record: &SourceRecord, config: &FusionConfig) -> Option<String> {
    lookup_first(record, NAME_KEYS.iter().copied(), config)
        .or_else(|| compose(NAME_COMPOSITE, record, config))
}

/// Scalar JSON value as trimmed text; containers and null yield nothing
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn compose(composite: Composite, record: &SourceRecord, config: &FusionConfig) -> Option<String> {
    match composite {
        Composite::FirstLast { first, last } => {
            let first = lookup_first(record, [first], config).unwrap_or_default();
            let last = lookup_first(record, [last], config).unwrap_or_default();
            let joined = format!("{} {}", first, last).trim().to_string();
            (!joined.is_empty()).then_some(joined)
        }
        Composite::BirthParts { year, month, day } => {
            let year: i32 = lookup_first(record, [year], config)?.parse().ok()?;
            let month: u32 = lookup_first(record, [month], config)
                .and_then(|m| m.parse().ok())
                .unwrap_or(1);
            let day: u32 = lookup_first(record, [day], config)
                .and_then(|d| d.parse().ok())
                .unwrap_or(1);
            let date = NaiveDate::from_ymd_opt(year, month, day)?;
            Some(date.format("%Y-%m-%d").to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GateMode;
    use serde_json::json;

    fn record(fields: Value) -> SourceRecord {
        SourceRecord {
            source: "db".to_string(),
            provider: "p".to_string(),
            gating: GateMode::Strict,
            fields: fields.as_object().cloned().unwrap_or_default(),
            leak_info: None,
            sequence: 0,
        }
    }

    #[test]
    fn test_every_field_has_a_table_entry() {
        for field in CanonicalField::ALL {
            assert!(spec_for(field).is_some(), "missing spec for {:?}", field);
        }
    }

    #[test]
    fn test_alias_order_and_case() {
        let config = FusionConfig::default();
        let table = SynonymTable::new(&config);
        let rec = record(json!({"mobilephone": "555-000-1111", "Phone": "555-222-3333"}));
        assert_eq!(
            table.values(CanonicalField::PrimaryPhone, &rec),
            vec!["555-222-3333", "555-000-1111"]
        );
    }

    #[test]
    fn test_multi_value_split_and_placeholders() {
        let config = FusionConfig::default();
        let table = SynonymTable::new(&config);
        let rec = record(json!({"Email": "a@x.com / N/A / b@y.com / a@x.com", "Gender": "U"}));
        assert_eq!(
            table.values(CanonicalField::PrimaryEmail, &rec),
            vec!["a@x.com", "b@y.com"]
        );
        assert!(table.first(CanonicalField::Gender, &rec).is_none());
    }

    #[test]
    fn test_numbers_are_text() {
        let config = FusionConfig::default();
        let table = SynonymTable::new(&config);
        let rec = record(json!({"SSN": 123450987, "Zip": 0}));
        assert_eq!(table.first(CanonicalField::Ssn, &rec).as_deref(), Some("123450987"));
        assert!(table.first(CanonicalField::Postcode, &rec).is_none());
    }

    #[test]
    fn test_name_composite_only_without_alias() {
        let config = FusionConfig::default();
        let table = SynonymTable::new(&config);

        let rec = record(json!({"FirstName": "Ines", "LastName": "Brady"}));
        assert_eq!(table.first(CanonicalField::Name, &rec).as_deref(), Some("Ines Brady"));

        let rec = record(json!({"FirstName": "Ines", "FullName": "Ines M. Brady"}));
        assert_eq!(table.first(CanonicalField::Name, &rec).as_deref(), Some("Ines M. Brady"));

        let rec = record(json!({"LastName": "Brady"}));
        assert_eq!(record_name(&rec, &config).as_deref(), Some("Brady"));
    }

    #[test]
    fn test_birthday_composite() {
        let config = FusionConfig::default();
        let table = SynonymTable::new(&config);

        let rec = record(json!({"BDayYear": "1984", "BDayMonth": "7", "BDayDay": "3"}));
        assert_eq!(table.first(CanonicalField::Birthday, &rec).as_deref(), Some("1984-07-03"));

        let rec = record(json!({"BDayYear": 1984}));
        assert_eq!(table.first(CanonicalField::Birthday, &rec).as_deref(), Some("1984-01-01"));

        let rec = record(json!({"BDayYear": "0", "BDayMonth": "7"}));
        assert!(table.first(CanonicalField::Birthday, &rec).is_none());

        let rec = record(json!({"BDayYear": "1984", "BDayMonth": "2", "BDayDay": "31"}));
        assert!(table.first(CanonicalField::Birthday, &rec).is_none());

        let rec = record(json!({"BDay": "03/07/1984", "BDayYear": "1990"}));
        assert_eq!(table.first(CanonicalField::Birthday, &rec).as_deref(), Some("03/07/1984"));
    }

    #[test]
    fn test_configured_synonyms_are_appended() {
        let mut config = FusionConfig::default();
        config
            .synonyms
            .insert("ssn".to_string(), vec!["TaxId".to_string()]);
        let table = SynonymTable::new(&config);
        let rec = record(json!({"TaxId": "219-09-9999"}));
        assert_eq!(table.first(CanonicalField::Ssn, &rec).as_deref(), Some("219-09-9999"));
    }
}
