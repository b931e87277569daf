use geo::{MultiPolygon, Polygon};

use crate::geometry::{GeometryEngine, GeometryError};

/// One way of merging several areas into one.
pub trait MergeStrategy {
    /// Name used in log messages.
    fn name(&self) -> &'static str;

    /// Merges the areas. An empty result for non-empty input is treated by [`FallbackLadder`] as a failure.
    fn merge(
        &self,
        engine: &dyn GeometryEngine,
        areas: &[MultiPolygon<f64>],
    ) -> Result<MultiPolygon<f64>, GeometryError>;
}

/// Removes all shared boundaries in one step.
#[derive(Debug, Default, Copy, Clone)]
pub struct DissolveTier;

impl MergeStrategy for DissolveTier {
    fn name(&self) -> &'static str {
        "dissolve"
    }

    fn merge(
        &self,
        engine: &dyn GeometryEngine,
        areas: &[MultiPolygon<f64>],
    ) -> Result<MultiPolygon<f64>, GeometryError> {
        let polygons: Vec<Polygon<f64>> = areas.iter().flat_map(|a| a.0.iter().cloned()).collect();
        engine.dissolve(&polygons)
    }
}

/// Unions the areas one by one, left to right.
#[derive(Debug, Default, Copy, Clone)]
pub struct PairwiseUnionTier;

impl MergeStrategy for PairwiseUnionTier {
    fn name(&self) -> &'static str {
        "pairwise union"
    }

    fn merge(
        &self,
        engine: &dyn GeometryEngine,
        areas: &[MultiPolygon<f64>],
    ) -> Result<MultiPolygon<f64>, GeometryError> {
        let Some((first, rest)) = areas.split_first() else {
            return Ok(MultiPolygon::new(vec![]));
        };

        rest.iter()
            .try_fold(first.clone(), |acc, next| engine.union(&acc, next))
    }
}

/// Collects all polygons into one multipolygon without merging anything. Never fails.
#[derive(Debug, Default, Copy, Clone)]
pub struct ConcatenateTier;

impl ConcatenateTier {
    fn concatenate(areas: &[MultiPolygon<f64>]) -> MultiPolygon<f64> {
        MultiPolygon::new(areas.iter().flat_map(|a| a.0.iter().cloned()).collect())
    }
}

impl MergeStrategy for ConcatenateTier {
    fn name(&self) -> &'static str {
        "concatenation"
    }

    fn merge(
        &self,
        _engine: &dyn GeometryEngine,
        areas: &[MultiPolygon<f64>],
    ) -> Result<MultiPolygon<f64>, GeometryError> {
        Ok(Self::concatenate(areas))
    }
}

/// Result of [`FallbackLadder::merge`].
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    /// Merged area.
    pub area: MultiPolygon<f64>,
    /// Name of the strategy that produced the area.
    pub strategy: &'static str,
}

/// Ordered list of merge strategies. Each one is tried until one of them succeeds.
///
/// If every strategy fails, the areas are concatenated, so merging through a ladder always produces a result.
pub struct FallbackLadder {
    tiers: Vec<Box<dyn MergeStrategy>>,
}

impl FallbackLadder {
    /// Creates a ladder with the given tiers, tried in order.
    pub fn new(tiers: Vec<Box<dyn MergeStrategy>>) -> Self {
        Self { tiers }
    }

    /// Pairwise union, then concatenation.
    pub fn union() -> Self {
        Self::new(vec![Box::new(PairwiseUnionTier), Box::new(ConcatenateTier)])
    }

    /// Dissolve, then pairwise union, then concatenation.
    pub fn dissolve() -> Self {
        Self::new(vec![
            Box::new(DissolveTier),
            Box::new(PairwiseUnionTier),
            Box::new(ConcatenateTier),
        ])
    }

    /// Names of the tiers in the order they are tried.
    pub fn tier_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.tiers.iter().map(|t| t.name())
    }

    /// Merges the areas with the first tier that succeeds.
    pub fn merge(&self, engine: &dyn GeometryEngine, areas: &[MultiPolygon<f64>]) -> MergeOutcome {
        let input_is_empty = areas.iter().all(|a| a.0.is_empty());

        for tier in &self.tiers {
            match tier.merge(engine, areas) {
                Ok(area) if !area.0.is_empty() || input_is_empty => {
                    return MergeOutcome {
                        area,
                        strategy: tier.name(),
                    };
                }
                Ok(_) => log::warn!(
                    "Merge by {} returned an empty result, trying next strategy",
                    tier.name()
                ),
                Err(err) => log::warn!(
                    "Merge by {} failed: {err}, trying next strategy",
                    tier.name()
                ),
            }
        }

        MergeOutcome {
            area: ConcatenateTier::concatenate(areas),
            strategy: ConcatenateTier.name(),
        }
    }
}

impl std::fmt::Debug for FallbackLadder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.tier_names()).finish()
    }
}
