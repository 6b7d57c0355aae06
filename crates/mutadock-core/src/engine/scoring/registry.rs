use super::peers::{GninaScorer, RfScorer};
use super::vina::VinaScorer;
use super::Scorer;
use crate::engine::error::EngineError;
use tracing::{info, warn};

/// Immutable snapshot of which scoring backends are present.
///
/// Each candidate is probed exactly once, at construction; the snapshot is then
/// read-only for the process lifetime and passed explicitly to whoever scores,
/// never read from ambient global state. The first entry is always the primary
/// engine; construction fails if it is absent, since the pipeline cannot
/// produce any affinity without it.
pub struct ScorerRegistry {
    scorers: Vec<Box<dyn Scorer>>,
}

impl ScorerRegistry {
    /// Probes the given candidates. `primary` must respond; `optional`
    /// backends that do not respond are excluded with a warning.
    pub fn detect(
        primary: Box<dyn Scorer>,
        optional: Vec<Box<dyn Scorer>>,
    ) -> Result<Self, EngineError> {
        if !primary.is_available() {
            return Err(EngineError::PrimaryScorerUnavailable {
                name: primary.name().to_string(),
                detail: "executable not found or not responding; install it and ensure it is on PATH"
                    .to_string(),
            });
        }

        let mut scorers: Vec<Box<dyn Scorer>> = vec![primary];
        for candidate in optional {
            if candidate.is_available() {
                info!(engine = candidate.name(), "Optional scoring engine detected");
                scorers.push(candidate);
            } else {
                warn!(
                    engine = candidate.name(),
                    "Optional scoring engine not found; excluded from the ensemble"
                );
            }
        }

        info!(
            engines = %scorers
                .iter()
                .map(|s| s.name())
                .collect::<Vec<_>>()
                .join(", "),
            "Scoring ensemble initialized"
        );

        Ok(Self { scorers })
    }

    /// Probes the default engine set: Vina as primary, GNINA and RF-Score as
    /// optional peers.
    pub fn detect_default() -> Result<Self, EngineError> {
        Self::detect(
            Box::new(VinaScorer::default()),
            vec![
                Box::new(GninaScorer::default()),
                Box::new(RfScorer::default()),
            ],
        )
    }

    pub fn primary(&self) -> &dyn Scorer {
        self.scorers[0].as_ref()
    }

    pub fn primary_name(&self) -> &str {
        self.primary().name()
    }

    /// Present backends, primary first, in detection order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Scorer> {
        self.scorers.iter().map(|s| s.as_ref())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.scorers.iter().map(|s| s.name())
    }

    pub fn len(&self) -> usize {
        self.scorers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scorers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::scoring::test_support::FakeScorer;

    #[test]
    fn missing_primary_fails_construction() {
        let result = ScorerRegistry::detect(Box::new(FakeScorer::absent("vina")), vec![]);
        assert!(matches!(
            result,
            Err(EngineError::PrimaryScorerUnavailable { .. })
        ));
    }

    #[test]
    fn absent_optional_backends_are_excluded_not_fatal() {
        let registry = ScorerRegistry::detect(
            Box::new(FakeScorer::returning("vina", -7.0)),
            vec![
                Box::new(FakeScorer::absent("gnina")),
                Box::new(FakeScorer::returning("rf-score", -6.0)),
            ],
        )
        .unwrap();

        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, vec!["vina", "rf-score"]);
        assert_eq!(registry.primary_name(), "vina");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn primary_is_always_first() {
        let registry = ScorerRegistry::detect(
            Box::new(FakeScorer::returning("vina", -7.0)),
            vec![Box::new(FakeScorer::returning("gnina", -6.0))],
        )
        .unwrap();
        assert_eq!(registry.iter().next().unwrap().name(), "vina");
    }
}
