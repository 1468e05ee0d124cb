use std::{cmp::Ordering, collections::HashSet};

use tour_cuts::{City, CoordinateSet};

use crate::city_import::CityRecord;

/// Weights of the city attributes that make up a score.
#[derive(Debug, Clone, Copy)]
pub struct Weights {
    pub population: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Weights { population: 1.0 }
    }
}

pub fn score(record: &CityRecord, weights: &Weights) -> f64 {
    weights.population * record.population.unwrap_or(0.0)
}

/// The `n` best scored cities with distinct names, best first. Cities with
/// equal score keep their order from the input; a repeated name keeps its best
/// scored entry.
pub fn pick_top_n<'a>(
    records: &'a [CityRecord],
    n: usize,
    weights: &Weights,
) -> Vec<&'a CityRecord> {
    let mut scored: Vec<(f64, &CityRecord)> =
        records.iter().map(|r| (score(r, weights), r)).collect();
    scored.sort_by(|(a, _), (b, _)| b.partial_cmp(a).unwrap_or(Ordering::Equal));

    let mut seen = HashSet::new();
    let mut duplicates = 0;
    let chosen: Vec<&CityRecord> = scored
        .into_iter()
        .map(|(_, r)| r)
        .filter(|&r| {
            let fresh = seen.insert(r.name.as_str());
            if !fresh {
                duplicates += 1;
            }
            fresh
        })
        .take(n)
        .collect();

    if duplicates > 0 {
        log::warn!("Skipped {} repeated city names while ranking.", duplicates);
    }
    if chosen.len() < n {
        log::warn!("Only {} distinct cities available, {} requested.", chosen.len(), n);
    }
    chosen
}

/// Turns the chosen records into a coordinate set. A name that occurs twice
/// keeps its first entry.
pub fn to_coordinate_set(chosen: &[&CityRecord]) -> CoordinateSet {
    let mut coords = CoordinateSet::new();
    for record in chosen {
        let city = City::new(record.name.as_str());
        if coords.contains(&city) {
            log::warn!("Ignoring duplicate city {}.", city);
            continue;
        }
        if let Err(err) = coords.insert(city, record.coord) {
            log::warn!("{}", err);
        }
    }
    coords
}
