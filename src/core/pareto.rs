//! Pareto aggregation of categorical defect counts
//!
//! Counts categories, ranks them descending, keeps the top entries and adds a
//! cumulative-fraction curve for the report overlay.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Number of categories shown on the Pareto chart
pub const PARETO_TOP_N: usize = 13;

/// One bar of a Pareto chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParetoEntry {
    pub category: String,
    pub count: u64,
    /// Running count / total count of the retained entries
    pub cumulative_fraction: f64,
}

/// Compute a Pareto ranking over the top [`PARETO_TOP_N`] categories
pub fn compute_pareto<T, F>(records: &[T], extractor: F) -> Vec<ParetoEntry>
where
    F: Fn(&T) -> Option<String>,
{
    compute_pareto_with_limit(records, extractor, PARETO_TOP_N)
}

/// Compute a Pareto ranking keeping at most `limit` categories
///
/// Records whose category is missing or blank are not counted. Ties keep
/// the order in which categories were first seen.
///
/// The cumulative fraction is relative to the retained categories only, so
/// the last retained entry always reads exactly 1.0 even when categories
/// past the limit were dropped.
pub fn compute_pareto_with_limit<T, F>(
    records: &[T],
    extractor: F,
    limit: usize,
) -> Vec<ParetoEntry>
where
    F: Fn(&T) -> Option<String>,
{
    // Insertion-ordered counts keep ties in first-seen order after the stable sort
    let mut counts: Vec<(String, u64)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in records {
        let Some(category) = extractor(record) else {
            continue;
        };
        if category.trim().is_empty() {
            continue;
        }
        match index.get(&category) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(category.clone(), counts.len());
                counts.push((category, 1));
            }
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(limit);

    let total: u64 = counts.iter().map(|(_, count)| count).sum();
    let mut running = 0u64;

    counts
        .into_iter()
        .map(|(category, count)| {
            running += count;
            let cumulative_fraction = if total > 0 {
                running as f64 / total as f64
            } else {
                0.0
            };
            ParetoEntry {
                category,
                count,
                cumulative_fraction,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(items: &[&str]) -> Vec<Option<String>> {
        items
            .iter()
            .map(|s| if s.is_empty() { None } else { Some(s.to_string()) })
            .collect()
    }

    #[test]
    fn test_pareto_ranks_descending() {
        let records = codes(&["A", "B", "B", "C", "B", "A"]);
        let pareto = compute_pareto(&records, |r| r.clone());

        let cats: Vec<&str> = pareto.iter().map(|e| e.category.as_str()).collect();
        assert_eq!(cats, vec!["B", "A", "C"]);
        assert_eq!(pareto[0].count, 3);
        assert!((pareto[0].cumulative_fraction - 0.5).abs() < 1e-12);
        assert!((pareto[1].cumulative_fraction - 5.0 / 6.0).abs() < 1e-12);
        assert_eq!(pareto[2].cumulative_fraction, 1.0);
    }

    #[test]
    fn test_pareto_drops_missing_and_blank() {
        let records = codes(&["A", "", "A"]);
        let mut with_blank = records.clone();
        with_blank.push(Some("   ".to_string()));

        let pareto = compute_pareto(&with_blank, |r| r.clone());
        assert_eq!(pareto.len(), 1);
        assert_eq!(pareto[0].count, 2);
    }

    #[test]
    fn test_pareto_ties_keep_first_seen_order() {
        let records = codes(&["X", "Y", "Z", "Y", "X", "Z"]);
        let pareto = compute_pareto(&records, |r| r.clone());
        let cats: Vec<&str> = pareto.iter().map(|e| e.category.as_str()).collect();
        assert_eq!(cats, vec!["X", "Y", "Z"]);
    }

    #[test]
    fn test_pareto_truncates_to_top_13_and_ends_at_one() {
        // 20 categories, category i appears i+1 times
        let mut records = Vec::new();
        for i in 0..20 {
            for _ in 0..=i {
                records.push(Some(format!("CAT{:02}", i)));
            }
        }

        let pareto = compute_pareto(&records, |r| r.clone());
        assert_eq!(pareto.len(), PARETO_TOP_N);
        assert_eq!(pareto[0].category, "CAT19");
        assert_eq!(pareto.last().unwrap().cumulative_fraction, 1.0);

        // Monotonically non-decreasing
        for pair in pareto.windows(2) {
            assert!(pair[1].cumulative_fraction >= pair[0].cumulative_fraction);
        }
    }

    #[test]
    fn test_pareto_empty_input() {
        let records: Vec<Option<String>> = Vec::new();
        assert!(compute_pareto(&records, |r| r.clone()).is_empty());
    }

    #[test]
    fn test_pareto_zero_limit_yields_nothing() {
        let records = codes(&["A", "B"]);
        assert!(compute_pareto_with_limit(&records, |r| r.clone(), 0).is_empty());
    }

    #[test]
    fn test_pareto_json_shape() {
        let records = codes(&["A"]);
        let pareto = compute_pareto(&records, |r| r.clone());
        let json = serde_json::to_value(&pareto).unwrap();
        assert_eq!(json[0]["category"], "A");
        assert_eq!(json[0]["count"], 1);
        assert_eq!(json[0]["cumulativeFraction"], 1.0);
    }
}
