// Display View
//
// Presentation copy of a fused profile with every list cut to the first N
// entries. The fused entity is only borrowed; what was cut is reported per
// path so a reader knows the view is partial.

use crate::types::ProfileEntity;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize)]
pub struct DisplayView {
    #[serde(flatten)]
    pub profile: ProfileEntity,
    /// Entries left out, keyed by entity path
    pub hidden: BTreeMap<&'static str, usize>,
}

impl DisplayView {
    pub fn from_profile(profile: &ProfileEntity, top_n: usize) -> Self {
        let mut view = profile.clone();
        let mut hidden = BTreeMap::new();

        let mut cut = |path: &'static str, len: usize| {
            if len > top_n {
                hidden.insert(path, len - top_n);
            }
        };
        cut("contact.phones", view.contact.phones.len());
        cut("contact.emails", view.contact.emails.len());
        cut("contact.usernames", view.contact.usernames.len());
        cut("social.profiles", view.social.profiles.len());
        cut("social.twitter", view.social.twitter.len());
        cut("social.linkedin", view.social.linkedin.len());
        cut("professional.history", view.professional.history.len());
        cut("assets.vehicles", view.assets.vehicles.len());
        cut("security.passwords", view.security.passwords.len());
        cut("security.leak_sources", view.security.leak_sources.len());
        cut("security.ips", view.security.ips.len());
        cut("location.coordinates", view.location.coordinates.len());
        cut("family.relatives", view.family.relatives.len());

        view.contact.phones.truncate(top_n);
        view.contact.emails.truncate(top_n);
        view.contact.usernames.truncate(top_n);
        view.social.profiles.truncate(top_n);
        view.social.twitter.truncate(top_n);
        view.social.linkedin.truncate(top_n);
        view.professional.history.truncate(top_n);
        view.assets.vehicles.truncate(top_n);
        view.security.passwords.truncate(top_n);
        view.security.leak_sources.truncate(top_n);
        view.security.ips.truncate(top_n);
        view.location.coordinates.truncate(top_n);
        view.family.relatives.truncate(top_n);

        Self {
            profile: view,
            hidden,
        }
    }
}
