//! Conversion of chart titles into artifact file names.

/// Symbol replacements applied before anything else, so the spelled-out
/// words survive the character filter.
const SYMBOLS: [(&str, &str); 3] = [(">", "over "), ("<", "below "), ("≤", "below or equal ")];

/// Turns a human title into a safe file stem containing only
/// `[a-z0-9_-]`. Whitespace runs become a single `_`.
///
/// No length limit is applied.
pub fn sanitize(title: &str) -> String {
    let mut name = title.to_string();
    for (symbol, word) in SYMBOLS {
        name = name.replace(symbol, word);
    }

    // runs of whitespace collapse into one separator
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_safe(name: &str) -> bool {
        name.chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
    }

    #[test]
    fn test_symbols_are_spelled_out() {
        assert_eq!(sanitize("A > B"), "a_over_b");
        assert_eq!(sanitize("Age < 26"), "age_below_26");
        assert_eq!(
            sanitize("Do you currently have the JugendBW-Ticket? (≤26)"),
            "do_you_currently_have_the_jugendbw-ticket_below_or_equal_26"
        );
        assert_eq!(
            sanitize("Would you buy the JugendBW-Ticket if eligible? (>26)"),
            "would_you_buy_the_jugendbw-ticket_if_eligible_over_26"
        );
    }

    #[test]
    fn test_whitespace_runs_collapse() {
        assert_eq!(sanitize("A  >  B"), "a_over_b");
        assert_eq!(sanitize(" Age\t< 26 "), "age_below_26");
        assert_eq!(sanitize("Mixed CASE with    spaces"), "mixed_case_with_spaces");
    }

    #[test]
    fn test_non_ascii_is_stripped() {
        assert_eq!(sanitize("Größe in €"), "gre_in_");
        assert_eq!(sanitize(""), "");
    }

    #[test]
    fn test_output_alphabet_and_idempotence() {
        let samples = [
            "Participation",
            "A > B",
            "<<>>",
            "≤ ≤",
            "Mixed CASE with    spaces",
            "tabs\tand\nnewlines",
            "emoji 🎉 and ümlauts",
            "already_safe-name_42",
            "İstanbul",
            "ﬁ ligature",
        ];
        for sample in samples {
            let once = sanitize(sample);
            assert!(is_safe(&once), "{sample:?} -> {once:?}");
            assert_eq!(sanitize(&once), once, "not idempotent for {sample:?}");
        }
    }
}
