//! High-stakes domain detection.
//!
//! Runs independently of the truth class. The lookup policy and the doctrine
//! gates consume the result; the classifier's own decision never does.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use truthgate_contracts::truth::{HighStakes, HighStakesDomain};

static DOMAIN_PATTERNS: LazyLock<Vec<(HighStakesDomain, Regex)>> = LazyLock::new(|| {
    vec![
        (
            HighStakesDomain::Medical,
            Regex::new(
                r"(?i)\b(symptoms?|diagnos\w*|dosage|doses?|medications?|medicines?|drugs?|prescri\w+|side effects?|overdos\w*|pregnan\w*|vaccines?|disease|cancer|diabetes|insulin|ibuprofen|acetaminophen|tylenol|advil|antibiotics?|treatment|surgery|allerg\w*|blood pressure)\b",
            )
            .unwrap(),
        ),
        (
            HighStakesDomain::Legal,
            Regex::new(
                r"(?i)\b(lawsuit|sue|suing|legal(ly)?|illegal|lawyer|attorney|court|custody|visa|immigration|contract|liab(le|ility)|divorce|arrest(ed)?|tenant rights|copyright)\b",
            )
            .unwrap(),
        ),
        (
            HighStakesDomain::Financial,
            Regex::new(
                r"(?i)\b(invest(ing|ment|ments)?|stocks?|retirement|401k|ira|mortgage|loans?|tax(es)?|bankrupt\w*|credit score|crypto\w*|bitcoin|savings|portfolio|debt|interest rates?)\b",
            )
            .unwrap(),
        ),
        (
            HighStakesDomain::Safety,
            Regex::new(
                r"(?i)\b(emergency|poison\w*|toxic|suicid\w*|self[- ]harm|evacuat\w*|earthquake|hurricane|tornado|wildfire|recall(ed)?|carbon monoxide|gas leak|unsafe|dangerous)\b",
            )
            .unwrap(),
        ),
    ]
});

/// Scan `text` for medical, legal, financial and safety markers.
pub fn detect_high_stakes(text: &str) -> HighStakes {
    let domains: BTreeSet<HighStakesDomain> = DOMAIN_PATTERNS
        .iter()
        .filter(|(_, pattern)| pattern.is_match(text))
        .map(|(domain, _)| *domain)
        .collect();
    HighStakes::from_domains(domains)
}

#[cfg(test)]
mod tests {
    use truthgate_contracts::truth::HighStakesDomain;

    use super::detect_high_stakes;

    #[test]
    fn medical_dosage_is_high_stakes() {
        let result = detect_high_stakes("What is the max dosage of ibuprofen for adults?");
        assert!(result.is_high_stakes);
        assert!(result.contains(HighStakesDomain::Medical));
    }

    #[test]
    fn multiple_domains_are_collected() {
        let result = detect_high_stakes("Can I sue my landlord over a gas leak?");
        assert!(result.contains(HighStakesDomain::Legal));
        assert!(result.contains(HighStakesDomain::Safety));
        assert_eq!(result.domains.len(), 2);
    }

    #[test]
    fn everyday_question_is_not_high_stakes() {
        let result = detect_high_stakes("How do I tie a bowline knot?");
        assert!(!result.is_high_stakes);
        assert!(result.domains.is_empty());
    }
}
