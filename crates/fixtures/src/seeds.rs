//! Numeric seed ranges per entity type.
//!
//! Each type's records are keyed by integers drawn from its own range, so
//! `identifierInPrimarySource` values never collide across types. A range
//! starts at an offset derived from a checksum of the type name.

use std::collections::BTreeMap;
use std::ops::Range;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::GenerationError;

/// Upper bound on records planned for one run.
pub const MAX_TOTAL_COUNT: usize = 1_000_000;

/// Offset of a type's seed range: the first four bytes of SHA-256 of its name.
pub fn type_offset(entity_type: &str) -> u64 {
    let digest = Sha256::digest(entity_type.as_bytes());
    u64::from(u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]))
}

/// A contiguous block of numeric seeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumericIdRange {
    pub offset: u64,
    pub count: u64,
}

impl NumericIdRange {
    pub fn end(&self) -> u64 {
        self.offset + self.count
    }

    pub fn seeds(&self) -> Range<u64> {
        self.offset..self.end()
    }

    pub fn overlaps(&self, other: &NumericIdRange) -> bool {
        self.offset < other.end() && other.offset < self.end()
    }
}

/// Assigns every registered type a seed offset and checks that no two ranges
/// can touch for any count up to `max_count`.
#[derive(Debug, Clone)]
pub struct NumericSeedAllocator {
    offsets: BTreeMap<String, u64>,
    max_count: u64,
}

impl NumericSeedAllocator {
    pub fn new<'a>(
        entity_types: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, GenerationError> {
        Self::with_max_count(entity_types, MAX_TOTAL_COUNT as u64)
    }

    pub fn with_max_count<'a>(
        entity_types: impl IntoIterator<Item = &'a str>,
        max_count: u64,
    ) -> Result<Self, GenerationError> {
        let offsets: BTreeMap<String, u64> = entity_types
            .into_iter()
            .map(|name| (name.to_string(), type_offset(name)))
            .collect();

        let mut by_offset: Vec<(&str, u64)> =
            offsets.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        by_offset.sort_by_key(|(_, offset)| *offset);

        for pair in by_offset.windows(2) {
            let (first, low) = pair[0];
            let (second, high) = pair[1];
            let spacing = high - low;
            if spacing <= max_count {
                return Err(GenerationError::SeedRangeOverlap {
                    first: first.to_string(),
                    second: second.to_string(),
                    spacing,
                    required: max_count,
                });
            }
        }

        Ok(Self { offsets, max_count })
    }

    pub fn offset(&self, entity_type: &str) -> Option<u64> {
        self.offsets.get(entity_type).copied()
    }

    /// Smallest distance between neighbouring offsets.
    pub fn min_spacing(&self) -> Option<u64> {
        let mut offsets: Vec<u64> = self.offsets.values().copied().collect();
        offsets.sort_unstable();
        offsets.windows(2).map(|w| w[1] - w[0]).min()
    }

    /// Seed ranges for the planned counts.
    pub fn allocate(
        &self,
        counts: &BTreeMap<String, usize>,
    ) -> Result<BTreeMap<String, NumericIdRange>, GenerationError> {
        let mut ranges = BTreeMap::new();
        for (entity_type, count) in counts {
            let offset = self
                .offset(entity_type)
                .ok_or_else(|| GenerationError::UnknownEntityType(entity_type.clone()))?;
            let count = *count as u64;
            if count > self.max_count {
                return Err(GenerationError::InvalidConfig(format!(
                    "{entity_type} is planned with {count} records, above {}",
                    self.max_count
                )));
            }
            ranges.insert(entity_type.clone(), NumericIdRange { offset, count });
        }
        Ok(ranges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaRegistry;

    #[test]
    fn test_offsets_are_stable() {
        assert_eq!(type_offset("A"), 1_436_216_016);
        assert_eq!(type_offset("B"), 3_749_605_605);
        assert_eq!(type_offset("Person"), type_offset("Person"));
    }

    #[test]
    fn test_builtin_types_never_overlap() {
        let registry = SchemaRegistry::builtin();
        let allocator = NumericSeedAllocator::new(registry.names()).unwrap();
        assert!(allocator.min_spacing().unwrap() > MAX_TOTAL_COUNT as u64);

        let counts: BTreeMap<String, usize> = registry
            .names()
            .map(|name| (name.to_string(), MAX_TOTAL_COUNT))
            .collect();
        let ranges: Vec<NumericIdRange> =
            allocator.allocate(&counts).unwrap().into_values().collect();
        for (i, a) in ranges.iter().enumerate() {
            for b in &ranges[i + 1..] {
                assert!(!a.overlaps(b));
            }
        }
    }

    #[test]
    fn test_two_type_ranges() {
        let allocator = NumericSeedAllocator::new(["A", "B"]).unwrap();
        let counts = BTreeMap::from([("A".to_string(), 2), ("B".to_string(), 2)]);
        let ranges = allocator.allocate(&counts).unwrap();

        let a = ranges["A"];
        let b = ranges["B"];
        assert_eq!(a.seeds().collect::<Vec<_>>(), vec![1_436_216_016, 1_436_216_017]);
        assert!(b.offset.abs_diff(a.offset) > 4);
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn test_overlap_is_detected() {
        // Spacing between A and B is about 2.3 billion; a larger bound must fail.
        let err = NumericSeedAllocator::with_max_count(["A", "B"], 3_000_000_000).unwrap_err();
        assert!(matches!(err, GenerationError::SeedRangeOverlap { .. }));
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let allocator = NumericSeedAllocator::new(["A"]).unwrap();
        let counts = BTreeMap::from([("Z".to_string(), 2)]);
        assert!(matches!(
            allocator.allocate(&counts),
            Err(GenerationError::UnknownEntityType(_))
        ));
    }
}
