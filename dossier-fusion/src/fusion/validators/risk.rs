// Risk Assessment
//
// Exposure level from the security section:
// - critical: any leaked credential
// - high: more than 3 breaches or more than 5 leak sources
// - medium: any breach or leak source
// - low: otherwise

use crate::types::{RiskLevel, Security};

const HIGH_BREACHES: usize = 3;
const HIGH_LEAK_SOURCES: usize = 5;

pub fn assess_risk(security: &Security) -> RiskLevel {
    if !security.passwords.is_empty() {
        RiskLevel::Critical
    } else if security.breach_count > HIGH_BREACHES || security.leak_sources.len() > HIGH_LEAK_SOURCES {
        RiskLevel::High
    } else if security.breach_count > 0 || !security.leak_sources.is_empty() {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Credential, CredentialKind};

    fn sources(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("db{}", i)).collect()
    }

    #[test]
    fn test_levels() {
        let mut s = Security::default();
        assert_eq!(assess_risk(&s), RiskLevel::Low);

        s.leak_sources = sources(1);
        assert_eq!(assess_risk(&s), RiskLevel::Medium);

        s.leak_sources = sources(6);
        assert_eq!(assess_risk(&s), RiskLevel::High);

        s.leak_sources = sources(5);
        s.breach_count = 4;
        assert_eq!(assess_risk(&s), RiskLevel::High);

        s.passwords.push(Credential {
            value: "hunter2".to_string(),
            kinds: vec![CredentialKind::Plaintext],
            field_types: vec!["Password".to_string()],
            sources: vec!["db0".to_string()],
        });
        assert_eq!(assess_risk(&s), RiskLevel::Critical);
    }
}
