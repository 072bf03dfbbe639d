//! Fuzzy "did you mean" matching for attribute and kind names

/// Maximum Levenshtein distance to consider for suggestions
const MAX_SUGGESTION_DISTANCE: usize = 3;

/// Find the closest candidates to `input`, best first
pub fn closest_matches<'a, I>(input: &str, candidates: I, max_results: usize) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let input = input.to_lowercase();
    let mut scored: Vec<(usize, &str)> = candidates
        .into_iter()
        .filter_map(|candidate| {
            let distance = strsim::levenshtein(&input, &candidate.to_lowercase());
            (distance <= MAX_SUGGESTION_DISTANCE && distance > 0).then_some((distance, candidate))
        })
        .collect();

    scored.sort_by_key(|(distance, _)| *distance);
    scored.dedup_by(|a, b| a.1 == b.1);
    scored
        .into_iter()
        .take(max_results)
        .map(|(_, candidate)| candidate.to_string())
        .collect()
}

/// Format a suggestion list as an error hint suffix (empty when nothing matched)
pub fn hint(suggestions: &[String]) -> String {
    match suggestions {
        [] => String::new(),
        [one] => format!(" (did you mean '{}'?)", one),
        many => format!(" (did you mean one of: {}?)", many.join(", ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closest_matches_typo() {
        let matches = closest_matches("prots", ["ports", "vip", "selector"], 3);
        assert_eq!(matches, vec!["ports".to_string()]);
    }

    #[test]
    fn test_closest_matches_ignores_exact_and_distant() {
        let matches = closest_matches("vip", ["vip", "completely_different"], 3);
        assert!(matches.is_empty());
    }

    #[test]
    fn test_hint_formatting() {
        assert_eq!(hint(&[]), "");
        assert_eq!(hint(&["ports".to_string()]), " (did you mean 'ports'?)");
        assert!(hint(&["a".to_string(), "b".to_string()]).contains("one of: a, b"));
    }
}
