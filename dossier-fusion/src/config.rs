//! Fusion configuration
//!
//! All tables consulted during fusion (placeholders, scoring constants,
//! platform domains, extra synonyms) live here. They are loaded once at
//! startup and never mutated afterwards.

use crate::types::CanonicalField;
use dossier_common::config::{ConfigResolver, ConfigSource, LoggingConfig};
use dossier_common::{Error, Result};
use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::warn;

/// Application name used for the platform config directory
pub const APP_NAME: &str = "dossier";

static GLOBAL: OnceCell<FusionConfig> = OnceCell::new();

/// Top-level configuration file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DossierConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub fusion: FusionConfig,
}

impl DossierConfig {
    /// Resolve (CLI → env → platform file → defaults), load and validate
    pub fn load(cli_arg: Option<&Path>) -> Result<(Self, ConfigSource)> {
        let (config, source): (Self, ConfigSource) = ConfigResolver::new(APP_NAME).load(cli_arg)?;
        config.fusion.validate()?;
        Ok((config, source))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FusionConfig {
    #[serde(default)]
    pub gate: GateConfig,

    /// Values treated as "no value" everywhere
    #[serde(default = "default_placeholders")]
    pub placeholders: Vec<String>,

    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Webmail domains that say nothing about an employer
    #[serde(default = "default_public_email_domains")]
    pub public_email_domains: Vec<String>,

    /// Ordered keyword → platform domain rules
    #[serde(default = "default_platforms")]
    pub platforms: Vec<PlatformRule>,

    /// Extra raw-key aliases per field key (e.g. `ssn`), tried after the built-in ones
    #[serde(default)]
    pub synonyms: BTreeMap<String, Vec<String>>,

    #[serde(default)]
    pub display: DisplayConfig,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            gate: GateConfig::default(),
            placeholders: default_placeholders(),
            scoring: ScoringConfig::default(),
            public_email_domains: default_public_email_domains(),
            platforms: default_platforms(),
            synonyms: BTreeMap::new(),
            display: DisplayConfig::default(),
        }
    }
}

impl FusionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.gate.min_matched_tokens == 0 {
            return Err(Error::Config(
                "fusion.gate.min_matched_tokens must be at least 1".to_string(),
            ));
        }
        if self.display.top_n == 0 {
            return Err(Error::Config("fusion.display.top_n must be at least 1".to_string()));
        }
        if let Some(rule) = self.platforms.iter().find(|r| r.keyword.trim().is_empty()) {
            return Err(Error::Config(format!(
                "fusion.platforms entry for '{}' has an empty keyword",
                rule.domain
            )));
        }
        if let Some(key) = self
            .synonyms
            .keys()
            .find(|k| CanonicalField::from_key(k).is_none())
        {
            return Err(Error::Config(format!("fusion.synonyms: unknown field '{}'", key)));
        }
        Ok(())
    }

    /// Configured extra aliases for `field`
    pub fn extra_synonyms(&self, field: CanonicalField) -> &[String] {
        self.synonyms
            .get(field.key())
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// True when `value` carries no information
    pub fn is_placeholder(&self, value: &str) -> bool {
        let value = value.trim();
        self.placeholders.iter().any(|p| p.eq_ignore_ascii_case(value))
    }

    pub fn is_public_email_domain(&self, domain: &str) -> bool {
        let domain = domain.to_lowercase();
        self.public_email_domains.iter().any(|p| {
            if p.contains('.') {
                domain == *p
            } else {
                domain.split('.').next() == Some(p.as_str())
            }
        })
    }

    /// Map a platform name or URL fragment to its canonical domain
    ///
    /// Short keywords (under three characters) must match exactly so that
    /// e.g. "ok" does not claim "facebook".
    pub fn platform_domain(&self, name: &str) -> Option<&str> {
        let name = name.trim().to_lowercase();
        if name.is_empty() {
            return None;
        }
        self.platforms
            .iter()
            .find(|rule| {
                let keyword = rule.keyword.to_lowercase();
                name == keyword
                    || name == rule.domain
                    || (keyword.len() >= 3 && name.contains(&keyword))
            })
            .map(|rule| rule.domain.as_str())
    }
}

/// Install the process-wide configuration
///
/// Only the first call takes effect; later calls are ignored with a warning.
pub fn install(config: FusionConfig) -> &'static FusionConfig {
    if GLOBAL.set(config).is_err() {
        warn!("Fusion configuration already installed; ignoring replacement");
    }
    global()
}

/// Process-wide configuration, compiled defaults if none was installed
pub fn global() -> &'static FusionConfig {
    GLOBAL.get_or_init(FusionConfig::default)
}

#[derive(Debug, Clone, Deserialize)]
pub struct GateConfig {
    /// Matched anchor tokens required, capped at the anchor's token count
    #[serde(default = "default_min_matched_tokens")]
    pub min_matched_tokens: usize,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            min_matched_tokens: default_min_matched_tokens(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    /// Email domain → bonus
    #[serde(default = "default_popular_domains")]
    pub popular_domains: BTreeMap<String, i64>,

    #[serde(default = "default_corporate_domains")]
    pub corporate_domains: Vec<String>,

    /// Other people's name fragments; an email local part containing one is penalized
    #[serde(default)]
    pub excluded_name_tokens: Vec<String>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            popular_domains: default_popular_domains(),
            corporate_domains: default_corporate_domains(),
            excluded_name_tokens: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlatformRule {
    pub keyword: String,
    pub domain: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
        }
    }
}

fn default_min_matched_tokens() -> usize {
    2
}

fn default_top_n() -> usize {
    5
}

fn default_placeholders() -> Vec<String> {
    ["U", "N/A", "0", ""].iter().map(|s| s.to_string()).collect()
}

fn default_popular_domains() -> BTreeMap<String, i64> {
    [
        ("gmail.com", 100),
        ("yahoo.com", 90),
        ("hotmail.com", 80),
        ("outlook.com", 80),
        ("live.com", 70),
        ("icloud.com", 70),
        ("aol.com", 60),
    ]
    .iter()
    .map(|(d, b)| (d.to_string(), *b))
    .collect()
}

fn default_corporate_domains() -> Vec<String> {
    [
        "conocophillips.com",
        "blackboard.com",
        "ab-inbev.com",
        "tdameritrade.com",
        "bmoharris.com",
        "edwardjones.com",
        "babcock.com",
        "cintas.com",
        "sonicdrivein.com",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_public_email_domains() -> Vec<String> {
    [
        "gmail",
        "yahoo",
        "hotmail",
        "aol",
        "outlook",
        "icloud",
        "comcast.net",
        "verizon.net",
        "cox.net",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_platforms() -> Vec<PlatformRule> {
    [
        ("twitter", "twitter.com"),
        ("x", "twitter.com"),
        ("facebook", "facebook.com"),
        ("instagram", "instagram.com"),
        ("linkedin", "linkedin.com"),
        ("google", "google.com"),
        ("gmail", "google.com"),
        ("youtube", "youtube.com"),
        ("whatsapp", "whatsapp.com"),
        ("telegram", "telegram.org"),
        ("tiktok", "tiktok.com"),
        ("github", "github.com"),
        ("skype", "skype.com"),
        ("vk", "vk.com"),
        ("ok", "ok.ru"),
    ]
    .iter()
    .map(|(k, d)| PlatformRule {
        keyword: k.to_string(),
        domain: d.to_string(),
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = FusionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.gate.min_matched_tokens, 2);
        assert_eq!(config.display.top_n, 5);
        assert_eq!(config.scoring.popular_domains.get("gmail.com"), Some(&100));
    }

    #[test]
    fn test_placeholders() {
        let config = FusionConfig::default();
        assert!(config.is_placeholder("U"));
        assert!(config.is_placeholder("n/a"));
        assert!(config.is_placeholder("  "));
        assert!(config.is_placeholder("0"));
        assert!(!config.is_placeholder("00"));
        assert!(!config.is_placeholder("Ines"));
    }

    #[test]
    fn test_platform_domain_lookup() {
        let config = FusionConfig::default();
        assert_eq!(config.platform_domain("Twitter"), Some("twitter.com"));
        assert_eq!(config.platform_domain("twitter_handle"), Some("twitter.com"));
        assert_eq!(config.platform_domain("X"), Some("twitter.com"));
        assert_eq!(config.platform_domain("Facebook"), Some("facebook.com"));
        assert_eq!(config.platform_domain("gmail"), Some("google.com"));
        assert_eq!(config.platform_domain("OK"), Some("ok.ru"));
        assert_eq!(config.platform_domain("MySpace"), None);
        assert_eq!(config.platform_domain(""), None);
    }

    #[test]
    fn test_public_email_domains() {
        let config = FusionConfig::default();
        assert!(config.is_public_email_domain("gmail.com"));
        assert!(config.is_public_email_domain("yahoo.co.uk"));
        assert!(config.is_public_email_domain("comcast.net"));
        assert!(!config.is_public_email_domain("acme.com"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let toml_str = r#"
            [logging]
            level = "debug"

            [fusion.gate]
            min_matched_tokens = 1

            [fusion.scoring]
            excluded_name_tokens = ["warren", "pamela"]

            [fusion.synonyms]
            ssn = ["TaxId"]
        "#;
        let config: DossierConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.fusion.gate.min_matched_tokens, 1);
        assert_eq!(config.fusion.scoring.excluded_name_tokens, vec!["warren", "pamela"]);
        assert_eq!(config.fusion.scoring.corporate_domains.len(), 9);
        assert_eq!(config.fusion.extra_synonyms(CanonicalField::Ssn), ["TaxId".to_string()]);
        assert!(config.fusion.extra_synonyms(CanonicalField::Name).is_empty());
        assert!(config.fusion.validate().is_ok());
        assert_eq!(config.fusion.placeholders, default_placeholders());
    }

    #[test]
    fn test_zero_thresholds_rejected() {
        let mut config = FusionConfig::default();
        config.gate.min_matched_tokens = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = FusionConfig::default();
        config.display.top_n = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = FusionConfig::default();
        config.synonyms.insert("shoe_size".to_string(), vec!["Shoe".to_string()]);
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
