// src/size_generator.rs
//
// File type and size selection for synthetic artifacts
//
// Two-stage weighted draw: file type from the actor's preferences, then a
// size range from that type's table, then a uniform size inside the range.
// The smallest range can be boosted to bias a bucket toward many small objects.

use std::collections::BTreeMap;

use anyhow::{anyhow, Result};
use rand::distr::{Distribution, Uniform};
use rand::seq::IndexedRandom;
use rand::Rng;

use crate::config::{FileType, FileTypeSpec, SizeRange};
use crate::weighted;

/// Range weights after applying the small-file bias.
///
/// The range with the lowest `min` has its weight scaled by `1 + bias`;
/// every other weight is unchanged. A bias of zero (or less) is a no-op.
pub fn effective_size_weights(ranges: &[SizeRange], small_file_bias: f64) -> Vec<f64> {
    let mut weights: Vec<f64> = ranges.iter().map(|r| r.weight).collect();
    if small_file_bias <= 0.0 {
        return weights;
    }
    if let Some((idx, _)) = ranges.iter().enumerate().min_by_key(|(_, r)| r.min) {
        weights[idx] *= 1.0 + small_file_bias;
    }
    weights
}

/// Uniform integer in `[min, max]`
pub fn size_in_range<R: Rng + ?Sized>(range: &SizeRange, rng: &mut R) -> u64 {
    if range.min >= range.max {
        return range.min;
    }
    match Uniform::new_inclusive(range.min, range.max) {
        Ok(dist) => dist.sample(rng),
        Err(_) => range.min,
    }
}

/// One selection result
#[derive(Debug, Clone, PartialEq)]
pub struct FileChoice {
    pub file_type: FileType,
    pub size: u64,
    pub extension: String,
}

struct TypeTable {
    ranges: Vec<SizeRange>,
    weights: Vec<f64>,
    extensions: Vec<String>,
}

/// Per-actor selector combining preferences with the file type table
pub struct FileSelector {
    preferences: Vec<(FileType, f64)>,
    tables: BTreeMap<FileType, TypeTable>,
}

impl FileSelector {
    pub fn new(
        preferences: &BTreeMap<FileType, f64>,
        file_types: &BTreeMap<FileType, FileTypeSpec>,
        small_file_bias: f64,
    ) -> Result<Self> {
        let mut tables = BTreeMap::new();
        let mut prefs = Vec::with_capacity(preferences.len());

        for (&file_type, &weight) in preferences {
            let spec = file_types
                .get(&file_type)
                .ok_or_else(|| anyhow!("no size table for file type {}", file_type))?;
            if spec.sizes.is_empty() {
                return Err(anyhow!("file type {} has no size ranges", file_type));
            }
            tables.insert(
                file_type,
                TypeTable {
                    weights: effective_size_weights(&spec.sizes, small_file_bias),
                    ranges: spec.sizes.clone(),
                    extensions: spec.extensions.clone(),
                },
            );
            prefs.push((file_type, weight));
        }

        if !prefs.iter().any(|(_, w)| *w > 0.0) {
            return Err(anyhow!("file preferences contain no positive weight"));
        }

        Ok(Self {
            preferences: prefs,
            tables,
        })
    }

    pub fn choose_type<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<FileType> {
        weighted::choose(&self.preferences, rng).copied()
    }

    pub fn choose_size<R: Rng + ?Sized>(&self, file_type: FileType, rng: &mut R) -> Option<u64> {
        let table = self.tables.get(&file_type)?;
        let idx = weighted::choose_index(table.weights.iter().copied(), rng)?;
        Some(size_in_range(&table.ranges[idx], rng))
    }

    pub fn select<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<FileChoice> {
        let file_type = self.choose_type(rng)?;
        let size = self.choose_size(file_type, rng)?;
        let table = self.tables.get(&file_type)?;
        let extension = table.extensions.choose(rng).cloned().unwrap_or_default();
        Some(FileChoice {
            file_type,
            size,
            extension,
        })
    }
}
