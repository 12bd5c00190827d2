//! Population planning: how many records of each type a run creates.

use std::collections::BTreeMap;

use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};

use crate::config::MIN_PER_TYPE;
use crate::error::GenerationError;

/// Planned record count per entity type.
pub type PopulationPlan = BTreeMap<String, usize>;

/// Splits a record budget across weighted entity types.
///
/// Every type first receives the floor. The rest of the budget is drawn one
/// record at a time from the cumulative weight distribution. A budget smaller
/// than the floors is ignored, so the plan may exceed `count` but never leaves
/// a type below the floor.
#[derive(Debug, Clone)]
pub struct EntityPopulationPlanner {
    weights: BTreeMap<String, u32>,
    count: usize,
    floor: usize,
}

impl EntityPopulationPlanner {
    pub fn new(weights: BTreeMap<String, u32>, count: usize) -> Self {
        Self {
            weights,
            count,
            floor: MIN_PER_TYPE,
        }
    }

    /// Raises the floor. Values below 2 are ignored.
    pub fn with_floor(mut self, floor: usize) -> Self {
        self.floor = floor.max(MIN_PER_TYPE);
        self
    }

    pub fn plan(&self, rng: &mut impl Rng) -> Result<PopulationPlan, GenerationError> {
        let names: Vec<&String> = self.weights.keys().collect();
        let mut tallies = vec![self.floor; names.len()];

        let reserved = self.floor * names.len();
        let remaining = self.count.saturating_sub(reserved);

        if remaining > 0 && !names.is_empty() {
            let mut weights: Vec<u32> = self.weights.values().copied().collect();
            if weights.iter().all(|w| *w == 0) {
                weights.iter_mut().for_each(|w| *w = 1);
            }
            let dist = WeightedIndex::new(&weights)
                .map_err(|e| GenerationError::InvalidConfig(format!("weights: {e}")))?;
            for _ in 0..remaining {
                tallies[dist.sample(rng)] += 1;
            }
        }

        Ok(names
            .into_iter()
            .zip(tallies)
            .map(|(name, tally)| (name.clone(), tally.max(self.floor)))
            .collect())
    }
}
