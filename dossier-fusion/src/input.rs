//! Provider response files
//!
//! Each file holds one provider's raw JSON answer; the provider is named
//! after the file stem (`caller-id.json` → `caller-id`).

use crate::types::{GateMode, ProviderResponse};
use dossier_common::{Error, Result};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Load one provider response from disk
pub fn load_provider_file(path: &Path, gating: GateMode) -> Result<ProviderResponse> {
    let provider = provider_name(path)?;
    let text = fs::read_to_string(path)?;
    let payload = serde_json::from_str(&text)?;
    debug!("Loaded {} response from {}", provider, path.display());
    Ok(ProviderResponse::new(&provider, gating, payload))
}

/// Provider name for a response file
pub fn provider_name(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            Error::InvalidInput(format!("cannot name provider from {}", path.display()))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_load_provider_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("caller-id.json");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, r#"{{"data": [{{"Phone": "6462083471"}}]}}"#).unwrap();

        let response = load_provider_file(&path, GateMode::Linked).unwrap();
        assert_eq!(response.provider, "caller-id");
        assert_eq!(response.gating, GateMode::Linked);
        assert!(response.payload.get("data").is_some());
    }

    #[test]
    fn test_bad_json_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            load_provider_file(&path, GateMode::Strict),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.json");
        assert!(matches!(
            load_provider_file(&path, GateMode::Strict),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn test_provider_name_needs_a_stem() {
        assert_eq!(provider_name(Path::new("/tmp/leaks.json")).unwrap(), "leaks");
        assert!(provider_name(Path::new("/")).is_err());
    }
}
