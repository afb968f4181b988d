// Completeness Scorer
//
// Weighted presence score over the fused profile, 0..=100.
// Every present section contributes its weight; social profiles contribute
// per profile up to a cap.

use crate::types::ProfileEntity;

/// Points awarded per present field
#[derive(Debug, Clone)]
pub struct FieldWeights {
    pub name: u32,
    pub gender: u32,
    pub birthday: u32,
    pub primary_email: u32,
    pub extra_emails: u32,
    pub primary_phone: u32,
    pub address: u32,
    pub company: u32,
    pub position: u32,
    pub industry: u32,
    /// Per social profile
    pub social_each: u32,
    pub social_cap: u32,
    pub breaches: u32,
    pub leak_sources: u32,
    pub financial: u32,
    pub marital_status: u32,
    pub vehicles: u32,
}

impl Default for FieldWeights {
    fn default() -> Self {
        Self {
            name: 10,
            gender: 3,
            birthday: 4,
            primary_email: 8,
            extra_emails: 4,
            primary_phone: 8,
            address: 5,
            company: 5,
            position: 5,
            industry: 5,
            social_each: 3,
            social_cap: 15,
            breaches: 5,
            leak_sources: 5,
            financial: 3,
            marital_status: 2,
            vehicles: 3,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CompletenessScorer {
    weights: FieldWeights,
}

impl CompletenessScorer {
    pub fn new(weights: FieldWeights) -> Self {
        Self { weights }
    }

    /// Completeness score in range [0, 100]
    pub fn score(&self, profile: &ProfileEntity) -> u8 {
        let w = &self.weights;
        let award = |present: bool, points: u32| if present { points } else { 0 };

        let basic = &profile.basic_info;
        let contact = &profile.contact;
        let professional = &profile.professional;
        let financial = &profile.financial;

        let social = (profile.social.profiles.len() as u32)
            .saturating_mul(w.social_each)
            .min(w.social_cap);

        let total = award(basic.name.is_some(), w.name)
            + award(basic.gender.is_some(), w.gender)
            + award(basic.birthday.is_some(), w.birthday)
            + award(
                contact.primary_email.is_some() || !contact.emails.is_empty(),
                w.primary_email,
            )
            + award(contact.emails.len() > 1, w.extra_emails)
            + award(
                contact.primary_phone.is_some() || !contact.phones.is_empty(),
                w.primary_phone,
            )
            + award(
                profile.address.full_address.is_some() || profile.address.city.is_some(),
                w.address,
            )
            + award(professional.company.is_some(), w.company)
            + award(professional.position.is_some(), w.position)
            + award(professional.industry.is_some(), w.industry)
            + social
            + award(profile.security.breach_count > 0, w.breaches)
            + award(!profile.security.leak_sources.is_empty(), w.leak_sources)
            + award(
                financial.income.is_some()
                    || financial.net_worth.is_some()
                    || financial.bank.is_some()
                    || financial.credit_capacity.is_some(),
                w.financial,
            )
            + award(profile.family.marital_status.is_some(), w.marital_status)
            + award(!profile.assets.vehicles.is_empty(), w.vehicles);

        total.min(100) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SocialProfile;

    fn profile(handles: usize) -> SocialProfile {
        SocialProfile {
            platform: "twitter.com".to_string(),
            handle: format!("h{}", handles),
            url: None,
            sources: vec![],
        }
    }

    #[test]
    fn test_empty_profile_scores_zero() {
        assert_eq!(CompletenessScorer::default().score(&ProfileEntity::default()), 0);
    }

    #[test]
    fn test_contact_weights() {
        let mut p = ProfileEntity::default();
        p.basic_info.name = Some("Ines Brady".to_string());
        p.contact.emails = vec!["a@x.com".to_string(), "b@x.com".to_string()];
        p.contact.primary_phone = Some("5551234567".to_string());
        assert_eq!(CompletenessScorer::default().score(&p), 10 + 8 + 4 + 8);
    }

    #[test]
    fn test_social_capped() {
        let mut p = ProfileEntity::default();
        p.social.profiles = (0..3).map(profile).collect();
        assert_eq!(CompletenessScorer::default().score(&p), 9);
        p.social.profiles = (0..9).map(profile).collect();
        assert_eq!(CompletenessScorer::default().score(&p), 15);
    }

    #[test]
    fn test_custom_weights_clamped() {
        let weights = FieldWeights {
            name: 250,
            ..FieldWeights::default()
        };
        let mut p = ProfileEntity::default();
        p.basic_info.name = Some("X".to_string());
        assert_eq!(CompletenessScorer::new(weights).score(&p), 100);
    }
}
