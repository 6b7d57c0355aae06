use crate::engine::error::EngineError;
use crate::engine::scoring::ScoringResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::info;

/// How affinities from multiple backends are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsensusMethod {
    /// Arithmetic mean of all succeeded affinities.
    Mean,
    /// Statistical median; an even count averages the two middle values.
    Median,
    /// Fixed higher weight on the primary engine (0.5), the remainder split
    /// equally across the peers; a lone primary takes the full weight.
    Weighted,
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
#[error("unknown consensus method '{0}' (expected mean, median, or weighted)")]
pub struct ParseConsensusMethodError(pub String);

impl FromStr for ConsensusMethod {
    type Err = ParseConsensusMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mean" => Ok(Self::Mean),
            "median" => Ok(Self::Median),
            "weighted" => Ok(Self::Weighted),
            other => Err(ParseConsensusMethodError(other.to_string())),
        }
    }
}

impl fmt::Display for ConsensusMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Mean => "mean",
            Self::Median => "median",
            Self::Weighted => "weighted",
        };
        write!(f, "{name}")
    }
}

/// The aggregated verdict of one docking call.
///
/// The primary engine's raw affinity is always carried alongside the consensus
/// value, never replaced by it, so downstream consumers can compare
/// single-engine and ensemble behavior and spot outliers the ensemble smoothed.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsensusResult {
    /// The primary engine's own affinity, kcal/mol.
    pub primary_affinity: f64,
    /// Present iff consensus was requested; degrades to the primary affinity
    /// when no peer succeeded.
    pub consensus_affinity: Option<f64>,
    /// Population standard deviation across succeeded backends; 0.0 when only
    /// one backend succeeded. Present iff consensus was requested.
    pub uncertainty: Option<f64>,
    /// Every backend's outcome, primary first, in registry order.
    pub per_engine: Vec<ScoringResult>,
    /// The aggregation method, when consensus was requested.
    pub method: Option<ConsensusMethod>,
}

/// Combines per-backend results into a single consensus verdict.
///
/// Only succeeded results enter the aggregate. Zero successes is the one
/// genuinely fatal condition of the whole pipeline ([`EngineError::AllScorersFailed`]);
/// a failed primary with surviving peers is also fatal, because the contract
/// promises the primary's raw affinity in every record.
pub fn aggregate(
    results: Vec<ScoringResult>,
    method: Option<ConsensusMethod>,
    primary_engine: &str,
) -> Result<ConsensusResult, EngineError> {
    let succeeded: Vec<(&str, f64)> = results
        .iter()
        .filter_map(|r| r.affinity.map(|a| (r.engine.as_str(), a)))
        .collect();

    if succeeded.is_empty() {
        let details = results
            .iter()
            .map(|r| {
                format!(
                    "{}: {}",
                    r.engine,
                    r.error.as_deref().unwrap_or("no result recorded")
                )
            })
            .collect::<Vec<_>>()
            .join("; ");
        return Err(EngineError::AllScorersFailed { details });
    }

    let primary_affinity = succeeded
        .iter()
        .find(|(name, _)| *name == primary_engine)
        .map(|(_, affinity)| *affinity)
        .ok_or_else(|| EngineError::PrimaryScorerFailed {
            name: primary_engine.to_string(),
            detail: results
                .iter()
                .find(|r| r.engine == primary_engine)
                .and_then(|r| r.error.clone())
                .unwrap_or_else(|| "no result recorded".to_string()),
        })?;

    let (consensus_affinity, uncertainty) = match method {
        Some(method) => {
            let affinities: Vec<f64> = succeeded.iter().map(|(_, a)| *a).collect();
            let consensus = combine(&affinities, method, &succeeded, primary_engine);
            let spread = population_std_dev(&affinities);
            info!(
                method = %method,
                consensus,
                uncertainty = spread,
                backends = affinities.len(),
                "Consensus affinity"
            );
            (Some(consensus), Some(spread))
        }
        None => (None, None),
    };

    Ok(ConsensusResult {
        primary_affinity,
        consensus_affinity,
        uncertainty,
        per_engine: results,
        method,
    })
}

fn combine(
    affinities: &[f64],
    method: ConsensusMethod,
    succeeded: &[(&str, f64)],
    primary_engine: &str,
) -> f64 {
    match method {
        ConsensusMethod::Mean => affinities.iter().sum::<f64>() / affinities.len() as f64,
        ConsensusMethod::Median => median(affinities),
        ConsensusMethod::Weighted => {
            if succeeded.len() == 1 {
                return succeeded[0].1;
            }
            let peer_weight = 0.5 / (succeeded.len() - 1) as f64;
            succeeded
                .iter()
                .map(|(name, affinity)| {
                    let weight = if *name == primary_engine { 0.5 } else { peer_weight };
                    affinity * weight
                })
                .sum()
        }
    }
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    }
}

fn population_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::scoring::ScoringResult;

    fn three_engine_results() -> Vec<ScoringResult> {
        vec![
            ScoringResult::success("vina", -7.43),
            ScoringResult::success("gnina", -5.98),
            ScoringResult::success("rf-score", -5.90),
        ]
    }

    #[test]
    fn mean_consensus_matches_reference_values() {
        let result = aggregate(three_engine_results(), Some(ConsensusMethod::Mean), "vina").unwrap();

        let consensus = result.consensus_affinity.unwrap();
        assert!((consensus - (-6.437)).abs() < 0.005);
        // Population standard deviation of the three affinities.
        let uncertainty = result.uncertainty.unwrap();
        assert!((uncertainty - 0.7032).abs() < 0.005);
        assert!((result.primary_affinity - (-7.43)).abs() < 1e-9);
        assert_eq!(result.method, Some(ConsensusMethod::Mean));
    }

    #[test]
    fn median_with_odd_count_takes_the_middle_value() {
        let result =
            aggregate(three_engine_results(), Some(ConsensusMethod::Median), "vina").unwrap();
        assert!((result.consensus_affinity.unwrap() - (-5.98)).abs() < 1e-9);
    }

    #[test]
    fn median_with_even_count_averages_the_middle_pair() {
        let results = vec![
            ScoringResult::success("vina", -8.0),
            ScoringResult::success("gnina", -6.0),
            ScoringResult::success("rf-score", -5.0),
            ScoringResult::success("extra", -4.0),
        ];
        let result = aggregate(results, Some(ConsensusMethod::Median), "vina").unwrap();
        assert!((result.consensus_affinity.unwrap() - (-5.5)).abs() < 1e-9);
    }

    #[test]
    fn weighted_consensus_puts_half_the_weight_on_the_primary() {
        let result =
            aggregate(three_engine_results(), Some(ConsensusMethod::Weighted), "vina").unwrap();
        // 0.5 * -7.43 + 0.25 * -5.98 + 0.25 * -5.90
        assert!((result.consensus_affinity.unwrap() - (-6.685)).abs() < 1e-9);
    }

    #[test]
    fn lone_primary_degrades_to_its_own_affinity_with_zero_uncertainty() {
        let results = vec![
            ScoringResult::success("vina", -7.43),
            ScoringResult::failure("gnina", "not installed"),
        ];
        let result = aggregate(results, Some(ConsensusMethod::Mean), "vina").unwrap();

        assert_eq!(result.consensus_affinity, Some(-7.43));
        assert_eq!(result.uncertainty, Some(0.0));
    }

    #[test]
    fn consensus_not_requested_leaves_aggregate_fields_empty() {
        let result = aggregate(three_engine_results(), None, "vina").unwrap();
        assert_eq!(result.consensus_affinity, None);
        assert_eq!(result.uncertainty, None);
        assert_eq!(result.method, None);
        assert!((result.primary_affinity - (-7.43)).abs() < 1e-9);
    }

    #[test]
    fn failed_backends_are_excluded_from_the_aggregate() {
        let results = vec![
            ScoringResult::success("vina", -7.0),
            ScoringResult::success("gnina", -5.0),
            ScoringResult::failure("rf-score", "exploded"),
        ];
        let result = aggregate(results, Some(ConsensusMethod::Mean), "vina").unwrap();
        assert!((result.consensus_affinity.unwrap() - (-6.0)).abs() < 1e-9);
        assert_eq!(result.per_engine.len(), 3);
    }

    #[test]
    fn zero_successes_is_fatal() {
        let results = vec![
            ScoringResult::failure("vina", "crashed"),
            ScoringResult::failure("gnina", "timed out"),
        ];
        let result = aggregate(results, Some(ConsensusMethod::Mean), "vina");
        match result {
            Err(EngineError::AllScorersFailed { details }) => {
                assert!(details.contains("vina: crashed"));
                assert!(details.contains("gnina: timed out"));
            }
            other => panic!("expected AllScorersFailed, got {other:?}"),
        }
    }

    #[test]
    fn failed_primary_with_surviving_peers_is_fatal() {
        let results = vec![
            ScoringResult::failure("vina", "crashed"),
            ScoringResult::success("gnina", -6.0),
        ];
        let result = aggregate(results, Some(ConsensusMethod::Mean), "vina");
        assert!(matches!(
            result,
            Err(EngineError::PrimaryScorerFailed { .. })
        ));
    }

    #[test]
    fn method_names_parse_and_render() {
        assert_eq!("mean".parse::<ConsensusMethod>().unwrap(), ConsensusMethod::Mean);
        assert_eq!(
            "WEIGHTED".parse::<ConsensusMethod>().unwrap(),
            ConsensusMethod::Weighted
        );
        assert!("average".parse::<ConsensusMethod>().is_err());
        assert_eq!(ConsensusMethod::Median.to_string(), "median");
    }
}
