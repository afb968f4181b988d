// Candidate Scoring
//
// Pure scoring functions for the scored scalar fields. Higher is better; a
// field is only resolved when its best candidate scores above zero. The
// constants are empirical and kept exactly as calibrated.

use crate::config::ScoringConfig;
use crate::fusion::digits_only;
use crate::fusion::identity_gate::name_tokens;
use std::collections::HashSet;

/// Score for structurally impossible values
pub const REJECT: i64 = -1000;

/// Score for obviously fabricated values (repeated or sequential digits)
pub const FABRICATED: i64 = -500;

const SSN_SEQUENCES: [&str; 3] = ["012345678", "123456789", "987654321"];
const PHONE_SEQUENCES: [&str; 2] = ["1234567890", "9876543210"];

/// Subject name tokens used by the email scorer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameTokens {
    pub first: Option<String>,
    pub last: Option<String>,
}

impl NameTokens {
    /// First and last name token of `name`, lower-cased
    ///
    /// Tokens follow the identity gate's rule (one-letter tokens such as
    /// middle initials are dropped), then lose surrounding punctuation.
    /// A single-token name yields the same token for both.
    pub fn from_name(name: &str) -> Self {
        let parts: Vec<String> = name_tokens(name)
            .into_iter()
            .map(|p| p.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
            .filter(|p| p.chars().count() > 1)
            .collect();
        Self {
            first: parts.first().cloned(),
            last: parts.last().cloned(),
        }
    }

    fn is_subject_token(&self, token: &str) -> bool {
        self.first.as_deref() == Some(token) || self.last.as_deref() == Some(token)
    }
}

/// Context for email scoring
pub struct EmailContext<'a> {
    pub names: NameTokens,
    pub config: &'a ScoringConfig,
}

/// Score an SSN candidate
pub fn score_ssn(raw: &str) -> i64 {
    let digits = digits_only(raw);
    let mut score = match digits.len() {
        9 => 100,
        10 => 50,
        _ => return REJECT,
    };

    if is_repeated_digit(&digits) || SSN_SEQUENCES.iter().any(|s| digits.contains(s)) {
        return FABRICATED;
    }

    let area = segment(&digits, 0, 3);
    score += if area == 0 || area == 666 || area >= 900 { -200 } else { 50 };

    let group = segment(&digits, 3, 5);
    score += if group == 0 { -200 } else { 30 };

    let serial = segment(&digits, 5, 9);
    score += if serial == 0 { -200 } else { 30 };

    score + diversity_bonus(&digits)
}

/// Score a phone candidate against the query's digits
pub fn score_phone(raw: &str, query_digits: &str) -> i64 {
    let digits = digits_only(raw);
    let mut score = 0;

    if !query_digits.is_empty() && digits == query_digits {
        score += 1000;
    }
    if query_digits.len() >= 7 && digits.ends_with(&query_digits[query_digits.len() - 7..]) {
        score += 500;
    }

    score += match digits.len() {
        10 => 100,
        11 => 80,
        _ => return REJECT,
    };

    if is_repeated_digit(&digits) || PHONE_SEQUENCES.iter().any(|s| digits.contains(s)) {
        return FABRICATED;
    }

    let area = segment(&digits, 0, 3);
    if (200..=999).contains(&area) && area != 555 {
        score += 50;
    }

    score + diversity_bonus(&digits)
}

/// Score an email candidate
pub fn score_email(raw: &str, ctx: &EmailContext<'_>) -> i64 {
    let lower = raw.trim().to_lowercase();
    let mut parts = lower.split('@');
    let local = parts.next().unwrap_or_default();
    let domain = parts.next().unwrap_or_default();
    if local.is_empty() || domain.is_empty() {
        return REJECT;
    }

    let mut score = ctx.config.popular_domains.get(domain).copied().unwrap_or(0);

    let local_len = local.chars().count();
    if (5..=15).contains(&local_len) {
        score += 50;
    } else if (3..=20).contains(&local_len) {
        score += 30;
    }

    // first and last are checked independently; a one-word name counts twice
    for token in [&ctx.names.first, &ctx.names.last].into_iter().flatten() {
        if local.contains(token.as_str()) {
            score += 80;
        }
    }

    let digit_count = local.chars().filter(|c| c.is_ascii_digit()).count();
    if digit_count == 0 {
        score += 40;
    } else if digit_count <= 2 {
        score += 20;
    } else if digit_count > 6 {
        score -= 30;
    }

    let special_count = local.chars().filter(|c| matches!(c, '.' | '_' | '-')).count();
    if special_count <= 1 {
        score += 30;
    } else if special_count > 3 {
        score -= 20;
    }

    if ctx.config.corporate_domains.iter().any(|d| d.eq_ignore_ascii_case(domain)) {
        score -= 50;
    }

    let other_person = ctx.config.excluded_name_tokens.iter().any(|token| {
        let token = token.to_lowercase();
        !token.is_empty() && local.contains(&token) && !ctx.names.is_subject_token(&token)
    });
    if other_person {
        score -= 200;
    }

    score
}

/// Unique-digit diversity adjustment shared by SSN and phone
fn diversity_bonus(digits: &str) -> i64 {
    let unique = digits.chars().collect::<HashSet<_>>().len();
    if unique >= 7 {
        40
    } else if unique >= 5 {
        20
    } else if unique < 3 {
        -100
    } else {
        0
    }
}

fn is_repeated_digit(digits: &str) -> bool {
    let mut chars = digits.chars();
    match chars.next() {
        Some(first) => chars.all(|c| c == first),
        None => false,
    }
}

/// Numeric value of `digits[start..end]`, clamped to the string length
fn segment(digits: &str, start: usize, end: usize) -> u32 {
    let end = end.min(digits.len());
    let start = start.min(end);
    digits[start..end].parse().unwrap_or(0)
}
