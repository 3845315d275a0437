//! Entry alignment across strategy outputs.

use crate::model::RawEntry;

/// Username normalization used only for alignment: lowercase, trimmed,
/// asterisks/whitespace/`_`/`-` stripped. Display names keep their original
/// form; this exists so `Z****o` and `z_o` can meet.
#[must_use]
pub fn normalize_username(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '*' | '_' | '-'))
        .collect()
}

/// Stable alignment key: rank when present, else normalized username plus
/// the rounded wager.
#[must_use]
pub fn alignment_key(entry: &RawEntry) -> String {
    if entry.rank > 0 {
        format!("r{}", entry.rank)
    } else {
        format!(
            "u{}|{}",
            normalize_username(&entry.username),
            entry.wager.map_or(0, |w| w.round() as i64)
        )
    }
}

/// Field-by-field comparison of two aligned entries.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldComparison {
    pub username: Option<bool>,
    pub rank: Option<bool>,
    pub wager: Option<bool>,
    pub prize: Option<bool>,
}

impl FieldComparison {
    /// Number of fields both entries carried.
    #[must_use]
    pub fn comparable(&self) -> usize {
        [self.username, self.rank, self.wager, self.prize]
            .iter()
            .flatten()
            .count()
    }

    #[must_use]
    pub fn agreements(&self) -> usize {
        [self.username, self.rank, self.wager, self.prize]
            .iter()
            .flatten()
            .filter(|ok| **ok)
            .count()
    }

    /// A pair matches when at least 75% of its comparable fields agree.
    #[must_use]
    pub fn matches(&self) -> bool {
        let comparable = self.comparable();
        comparable > 0 && self.agreements() * 4 >= comparable * 3
    }
}

/// Amounts agree within a 5% relative tolerance.
#[must_use]
pub fn amounts_agree(a: f64, b: f64) -> bool {
    let scale = a.abs().max(b.abs());
    if scale == 0.0 {
        return true;
    }
    (a - b).abs() <= scale * 0.05
}

/// Compare two aligned entries field by field.
#[must_use]
pub fn compare(a: &RawEntry, b: &RawEntry) -> FieldComparison {
    FieldComparison {
        username: Some(normalize_username(&a.username) == normalize_username(&b.username)),
        rank: (a.rank > 0 && b.rank > 0).then(|| a.rank.abs_diff(b.rank) <= 1),
        wager: a.wager.zip(b.wager).map(|(wa, wb)| amounts_agree(wa, wb)),
        prize: a.prize.zip(b.prize).map(|(pa, pb)| amounts_agree(pa, pb)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(rank: u32, name: &str, wager: f64, prize: f64) -> RawEntry {
        let mut e = RawEntry::new(rank, name);
        e.wager = Some(wager);
        e.prize = Some(prize);
        e
    }

    #[test]
    fn username_normalization() {
        assert_eq!(normalize_username("  Z****o "), "zo");
        assert_eq!(normalize_username("High_Roller-99"), "highroller99");
        assert_eq!(normalize_username("ALICE"), "alice");
    }

    #[test]
    fn keys_prefer_rank() {
        assert_eq!(alignment_key(&entry(3, "x", 1.0, 0.0)), "r3");
        let mut unranked = entry(0, "Bob", 123.4, 0.0);
        unranked.rank = 0;
        assert_eq!(alignment_key(&unranked), "ubob|123");
    }

    #[test]
    fn tolerances() {
        assert!(amounts_agree(100.0, 104.9));
        assert!(!amounts_agree(100.0, 108.0));
        assert!(amounts_agree(0.0, 0.0));

        let cmp = compare(&entry(1, "Alice", 1000.0, 100.0), &entry(2, "alice", 1030.0, 100.0));
        assert_eq!(cmp.rank, Some(true), "rank off by one still agrees");
        assert!(cmp.matches());
    }

    #[test]
    fn pair_match_threshold() {
        // 3 of 4 fields agree: exactly 75%
        let cmp = compare(&entry(1, "Alice", 1000.0, 100.0), &entry(1, "Alice", 1000.0, 900.0));
        assert_eq!(cmp.agreements(), 3);
        assert!(cmp.matches());

        // 2 of 4: below threshold
        let cmp = compare(&entry(1, "Alice", 1000.0, 100.0), &entry(1, "Bob", 2000.0, 100.0));
        assert!(!cmp.matches());
    }
}
