//! Property tests for the parsing layers.

use proptest::prelude::*;

use leaderscrape::amount::{parse_amount, parse_rank};
use leaderscrape::strategies::markdown::clean_markdown_username;

proptest! {
    /// Username cleaning is idempotent on anything it accepts.
    #[test]
    fn username_cleaning_is_idempotent(raw in "[ -~]{0,40}") {
        if let Some(once) = clean_markdown_username(&raw) {
            let twice = clean_markdown_username(&once);
            prop_assert_eq!(
                twice.as_deref(),
                Some(once.as_str()),
                "not idempotent for {:?}",
                raw
            );
        }
    }

    /// Parsed amounts are always finite and non-negative.
    #[test]
    fn amounts_are_finite_and_non_negative(raw in "[0-9$€£km.,\\s]{0,20}") {
        if let Some(value) = parse_amount(&raw) {
            prop_assert!(value.is_finite());
            prop_assert!(value >= 0.0);
        }
    }

    /// Ranks never parse to zero.
    #[test]
    fn ranks_are_positive(raw in "#?[0-9]{0,6}[.)]?") {
        if let Some(rank) = parse_rank(&raw) {
            prop_assert!(rank > 0);
        }
    }
}

#[test]
fn separator_conventions_agree() {
    assert_eq!(parse_amount("1,234.56"), Some(1234.56));
    assert_eq!(parse_amount("1234.56"), Some(1234.56));
    assert_eq!(parse_amount("1.234,56"), Some(1234.56));
    assert_eq!(parse_amount("10k"), Some(10_000.0));
    assert_eq!(parse_amount("2.5m"), Some(2_500_000.0));
}

#[test]
fn rank_shapes_normalize_to_four() {
    for raw in ["#04.", "04", "4.", "4"] {
        assert_eq!(parse_rank(raw), Some(4), "failed on {raw:?}");
    }
}

#[test]
fn censored_single_letter_accepted() {
    assert_eq!(clean_markdown_username("A*").as_deref(), Some("A*"));
}
