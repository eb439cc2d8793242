use crate::core::models::result::{JobResult, Pose};
use tracing::{debug, info};

/// One scored molecule in a ranked selection.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedEntry {
    /// 1-based position in the selection.
    pub rank: usize,
    pub molecule_id: String,
    pub score: f64,
    pub pose: Option<Pose>,
}

/// Results ordered by ascending score (strongest predicted binding first) and truncated to a
/// fixed maximum length.
///
/// Invariants: `len() <= limit()`, and scores never decrease from one entry to the next.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedSelection {
    entries: Vec<RankedEntry>,
    limit: usize,
}

impl RankedSelection {
    pub fn entries(&self) -> &[RankedEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn iter(&self) -> impl Iterator<Item = &RankedEntry> {
        self.entries.iter()
    }

    pub fn molecule_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.molecule_id.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
    pub selection: RankedSelection,
    /// Molecules left out because they carry no score, in input order.
    pub unranked: Vec<String>,
    /// Number of scored results that competed for the selection.
    pub scored: usize,
}

/// Sorts results by score and keeps the best `limit`.
///
/// The sort is stable, so equal scores keep their input order; with inputs enumerated in
/// launch order this makes the selection reproducible across runs.
pub fn rank(results: Vec<JobResult>, limit: usize) -> Ranking {
    let mut unranked = Vec::new();
    let mut scored: Vec<(f64, JobResult)> = Vec::with_capacity(results.len());

    for result in results {
        match result.score {
            Some(score) => scored.push((score, result)),
            None => {
                debug!("Molecule '{}' has no score and is not ranked.", result.molecule_id);
                unranked.push(result.molecule_id);
            }
        }
    }

    let scored_count = scored.len();
    scored.sort_by(|(a, _), (b, _)| a.total_cmp(b));
    scored.truncate(limit);

    let entries = scored
        .into_iter()
        .enumerate()
        .map(|(i, (score, result))| RankedEntry {
            rank: i + 1,
            molecule_id: result.molecule_id,
            score,
            pose: result.pose,
        })
        .collect::<Vec<_>>();

    info!(
        "Ranked {} scored result(s); selected {} (limit {}), {} unranked.",
        scored_count,
        entries.len(),
        limit,
        unranked.len()
    );

    Ranking {
        selection: RankedSelection { entries, limit },
        unranked,
        scored: scored_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(id: &str, score: Option<f64>) -> JobResult {
        JobResult {
            molecule_id: id.to_string(),
            score,
            pose: None,
        }
    }

    fn scores(ranking: &Ranking) -> Vec<f64> {
        ranking.selection.iter().map(|e| e.score).collect()
    }

    #[test]
    fn selects_strongest_binders_first() {
        let ranking = rank(
            vec![
                result("a", Some(-5.0)),
                result("b", Some(-9.3)),
                result("c", Some(-7.1)),
            ],
            2,
        );

        assert_eq!(scores(&ranking), vec![-9.3, -7.1]);
        assert_eq!(ranking.selection.molecule_ids().collect::<Vec<_>>(), vec!["b", "c"]);
        assert_eq!(ranking.selection.entries()[0].rank, 1);
        assert_eq!(ranking.selection.entries()[1].rank, 2);
    }

    #[test]
    fn ties_keep_input_order() {
        let input = vec![
            result("first", Some(-8.0)),
            result("other", Some(-9.0)),
            result("second", Some(-8.0)),
            result("third", Some(-8.0)),
        ];

        let ranking = rank(input.clone(), 10);
        let again = rank(input, 10);

        assert_eq!(
            ranking.selection.molecule_ids().collect::<Vec<_>>(),
            vec!["other", "first", "second", "third"]
        );
        assert_eq!(ranking, again);
    }

    #[test]
    fn unscored_results_are_excluded_and_reported() {
        let ranking = rank(
            vec![
                result("a", None),
                result("b", Some(-6.0)),
                result("c", None),
            ],
            5,
        );

        assert_eq!(ranking.selection.molecule_ids().collect::<Vec<_>>(), vec!["b"]);
        assert_eq!(ranking.unranked, vec!["a", "c"]);
        assert_eq!(ranking.scored, 1);
    }

    #[test]
    fn selection_length_is_min_of_limit_and_scored_count() {
        let input: Vec<_> = (0..12)
            .map(|i| {
                let score = if i % 4 == 0 { None } else { Some(-(i as f64)) };
                result(&format!("m{}", i), score)
            })
            .collect();

        for limit in [1, 5, 9, 20] {
            let ranking = rank(input.clone(), limit);
            assert_eq!(ranking.selection.len(), limit.min(9));
            assert_eq!(ranking.selection.limit(), limit);
            assert!(
                ranking
                    .selection
                    .entries()
                    .windows(2)
                    .all(|w| w[0].score <= w[1].score)
            );
        }
    }

    #[test]
    fn positive_and_fractional_scores_sort_numerically() {
        let ranking = rank(
            vec![
                result("P", Some(1.5)),
                result("Z", Some(0.0)),
                result("N", Some(-0.25)),
                result("M", Some(-10.0)),
            ],
            10,
        );

        assert_eq!(scores(&ranking), vec![-10.0, -0.25, 0.0, 1.5]);
    }

    #[test]
    fn empty_input_yields_empty_selection() {
        let ranking = rank(Vec::new(), 500);
        assert!(ranking.selection.is_empty());
        assert!(ranking.unranked.is_empty());
    }
}
