// Relatives Parser
//
// Providers pack relatives into one string:
//   "LOUIS MARVALDI P 297282573, JAMES ABAZIA C 278667532, MARY ABAZIA"
// Each comma-separated entry is a name, an optional 1-2 letter relationship
// code, and an optional trailing 9-digit SSN (kept masked to its last four).

use crate::types::Relative;

/// Relationship label for a single code letter
pub fn relationship_label(code: char) -> Option<&'static str> {
    let label = match code.to_ascii_uppercase() {
        'P' => "Parent",
        'C' => "Child",
        'S' => "Spouse",
        'B' => "Brother",
        'I' => "In-law",
        'A' => "Aunt/Uncle",
        'G' => "Grandparent",
        'N' => "Nephew/Niece",
        'O' => "Other",
        'L' => "Lives with",
        'R' => "Relative",
        'M' => "Mother",
        'F' => "Father",
        'D' => "Daughter",
        'H' => "Husband",
        'W' => "Wife",
        _ => return None,
    };
    Some(label)
}

/// Parse a relatives string into entries, in order
pub fn parse_relatives(raw: &str) -> Vec<Relative> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(parse_entry)
        .collect()
}

fn parse_entry(part: &str) -> Relative {
    let mut words: Vec<&str> = part.split_whitespace().collect();

    let ssn = match words.last() {
        Some(last) if words.len() > 1 && is_ssn(last) => words.pop(),
        _ => None,
    };
    let Some(ssn) = ssn else {
        return Relative {
            name: part.to_string(),
            relationship: None,
            ssn_masked: None,
        };
    };

    let code = match words.last() {
        Some(last) if words.len() > 1 && is_code(last) => words.pop(),
        _ => None,
    };

    Relative {
        name: title_case(&words),
        relationship: code.map(describe_code),
        ssn_masked: Some(format!("***{}", &ssn[ssn.len() - 4..])),
    }
}

fn is_ssn(word: &str) -> bool {
    word.len() == 9 && word.chars().all(|c| c.is_ascii_digit())
}

fn is_code(word: &str) -> bool {
    (1..=2).contains(&word.len()) && word.chars().all(|c| c.is_ascii_alphabetic())
}

/// "PS" → "Parent / Spouse"; unknown letters fall back to the raw code
fn describe_code(code: &str) -> String {
    let labels: Vec<&str> = code.chars().filter_map(relationship_label).collect();
    if labels.is_empty() {
        code.to_string()
    } else {
        labels.join(" / ")
    }
}

fn title_case(words: &[&str]) -> String {
    words
        .iter()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_entries() {
        let rels = parse_relatives("LOUIS MARVALDI P 297282573, JAMES ABAZIA C 278667532");
        assert_eq!(rels.len(), 2);
        assert_eq!(rels[0].name, "Louis Marvaldi");
        assert_eq!(rels[0].relationship.as_deref(), Some("Parent"));
        assert_eq!(rels[0].ssn_masked.as_deref(), Some("***2573"));
        assert_eq!(rels[1].relationship.as_deref(), Some("Child"));
    }

    #[test]
    fn test_entry_without_code() {
        let rels = parse_relatives("JAMES ABAZIA 278887532");
        assert_eq!(rels[0].name, "James Abazia");
        assert!(rels[0].relationship.is_none());
        assert_eq!(rels[0].ssn_masked.as_deref(), Some("***7532"));
    }

    #[test]
    fn test_two_letter_and_unknown_codes() {
        let rels = parse_relatives("ANNA LEE PS 123450987, BOB KAY XZ 123450987");
        assert_eq!(rels[0].relationship.as_deref(), Some("Parent / Spouse"));
        assert_eq!(rels[1].relationship.as_deref(), Some("XZ"));
    }

    #[test]
    fn test_unparseable_entry_kept_verbatim() {
        let rels = parse_relatives("Mary Abazia, , 123456789");
        assert_eq!(rels.len(), 2);
        assert_eq!(rels[0].name, "Mary Abazia");
        assert!(rels[0].ssn_masked.is_none());
        assert_eq!(rels[1].name, "123456789");
    }
}
