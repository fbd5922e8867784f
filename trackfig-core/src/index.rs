//! Per-chromosome interval index used by every interval-based reader.

use bio::data_structures::interval_tree::ArrayBackedIntervalTree;
use std::collections::HashMap;

use crate::chrom::resolve_chrom;
use crate::region::{GenomicPos, Region};

/// Interval tree keyed by chromosome. Values are stored once in insertion
/// order; the trees hold their positions.
pub struct IntervalIndex<T> {
    items: Vec<T>,
    trees: HashMap<String, ArrayBackedIntervalTree<GenomicPos, usize>>,
    starts: Vec<GenomicPos>,
}

impl<T> IntervalIndex<T> {
    /// Build an index from `(chrom, start, end, value)` entries.
    /// Zero-length intervals are widened to one base so they stay findable.
    pub fn build<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, GenomicPos, GenomicPos, T)>,
    {
        let mut items = Vec::new();
        let mut starts = Vec::new();
        let mut trees: HashMap<String, ArrayBackedIntervalTree<GenomicPos, usize>> = HashMap::new();

        for (chrom, start, end, value) in entries {
            let end = end.max(start + 1);
            let idx = items.len();
            items.push(value);
            starts.push(start);
            trees
                .entry(chrom)
                .or_insert_with(ArrayBackedIntervalTree::new)
                .insert(start..end, idx);
        }

        for tree in trees.values_mut() {
            tree.index();
        }

        Self { items, trees, starts }
    }

    /// Resolve the region's chromosome against the indexed names.
    pub fn resolve(&self, chrom: &str) -> Option<String> {
        resolve_chrom(chrom, |c| self.trees.contains_key(c))
    }

    /// Values overlapping `region`, sorted by start then insertion order.
    pub fn query(&self, region: &Region) -> Vec<&T> {
        let Some(chrom) = self.resolve(&region.chrom) else {
            return Vec::new();
        };
        let Some(tree) = self.trees.get(&chrom) else {
            return Vec::new();
        };

        let mut hits: Vec<usize> = tree
            .find(region.start..region.end)
            .iter()
            .map(|entry| *entry.data())
            .collect();
        hits.sort_by_key(|&i| (self.starts[i], i));
        hits.into_iter().map(|i| &self.items[i]).collect()
    }

    pub fn contains_chrom(&self, chrom: &str) -> bool {
        self.resolve(chrom).is_some()
    }

    pub fn chromosomes(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.trees.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo() -> IntervalIndex<&'static str> {
        IntervalIndex::build(vec![
            ("chr1".to_string(), 100, 200, "a"),
            ("chr1".to_string(), 50, 120, "b"),
            ("chr1".to_string(), 300, 300, "point"),
            ("chr2".to_string(), 0, 1000, "c"),
        ])
    }

    #[test]
    fn test_query_sorted_by_start() {
        let index = demo();
        let region = Region::new("chr1", 110, 150).unwrap();
        assert_eq!(index.query(&region), vec![&"b", &"a"]);
    }

    #[test]
    fn test_zero_length_is_findable() {
        let index = demo();
        let region = Region::new("chr1", 299, 301).unwrap();
        assert_eq!(index.query(&region), vec![&"point"]);
    }

    #[test]
    fn test_query_resolves_chrom_alias() {
        let index = demo();
        let region = Region::new("2", 10, 20).unwrap();
        assert_eq!(index.query(&region), vec![&"c"]);
        assert!(index.query(&Region::new("chr7", 0, 10).unwrap()).is_empty());
    }

    #[test]
    fn test_half_open_boundaries() {
        let index = demo();
        assert!(index.query(&Region::new("chr1", 200, 250).unwrap()).is_empty());
        assert_eq!(index.len(), 4);
        assert_eq!(index.chromosomes(), vec!["chr1", "chr2"]);
    }
}
