//! Weather fields and the per-method deployment-eligibility table.
//!
//! `WeatherFields` holds time-aligned temperature, wind and precipitation
//! grids supplied by the external ingestion layer. `DeploymentGrid` is the
//! read-only boolean relation over (lon cell, lat cell, timestep) per method
//! that the scheduler consults; it is built once at scenario construction
//! and never mutated afterwards.

use bevy_ecs::prelude::Resource;
use rand::Rng;

use crate::ecs::MethodId;
use crate::errors::ConfigError;

/// Per-cell, per-day weather arrays on a regular lon/lat grid.
///
/// Values are indexed `[day][yi][xi]`, flattened as
/// `day * (lon_cells * lat_cells) + yi * lon_cells + xi`.
#[derive(Debug, Clone)]
pub struct WeatherFields {
    pub lon_cells: usize,
    pub lat_cells: usize,
    pub days: usize,
    /// Cell-centre coordinates, ascending.
    pub lon_centres: Vec<f64>,
    pub lat_centres: Vec<f64>,
    pub temp_c: Vec<f64>,
    pub wind_m_per_s: Vec<f64>,
    pub precip_mm: Vec<f64>,
}

impl WeatherFields {
    /// Uniform synthetic weather, mostly for tests and fixtures.
    pub fn uniform(
        lon_cells: usize,
        lat_cells: usize,
        days: usize,
        temp_c: f64,
        wind_m_per_s: f64,
        precip_mm: f64,
    ) -> Self {
        let n = lon_cells * lat_cells * days;
        Self {
            lon_cells,
            lat_cells,
            days,
            lon_centres: (0..lon_cells).map(|i| i as f64).collect(),
            lat_centres: (0..lat_cells).map(|i| i as f64).collect(),
            temp_c: vec![temp_c; n],
            wind_m_per_s: vec![wind_m_per_s; n],
            precip_mm: vec![precip_mm; n],
        }
    }

    #[inline]
    fn idx(&self, xi: usize, yi: usize, day: usize) -> usize {
        day * self.lon_cells * self.lat_cells + yi * self.lon_cells + xi
    }

    /// Nearest-grid-cell lookup for a site coordinate. Fatal when the
    /// coordinate falls outside the half-cell-padded grid bounds.
    pub fn grid_index_for(
        &self,
        facility_id: &str,
        lat: f64,
        lon: f64,
    ) -> Result<(usize, usize), ConfigError> {
        let xi = nearest_index(&self.lon_centres, lon);
        let yi = nearest_index(&self.lat_centres, lat);
        let (Some(xi), Some(yi)) = (xi, yi) else {
            return Err(ConfigError::SiteOutsideGrid {
                facility_id: facility_id.to_string(),
                lat,
                lon,
            });
        };
        Ok((xi, yi))
    }
}

/// Index of the closest centre, or `None` when the value lies outside the
/// grid by more than half the edge cell spacing.
fn nearest_index(centres: &[f64], value: f64) -> Option<usize> {
    if centres.is_empty() {
        return None;
    }
    let spacing = if centres.len() > 1 {
        (centres[centres.len() - 1] - centres[0]).abs() / (centres.len() - 1) as f64
    } else {
        1.0
    };
    let half = spacing / 2.0;
    if value < centres[0] - half || value > centres[centres.len() - 1] + half {
        return None;
    }
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (i, centre) in centres.iter().enumerate() {
        let d = (value - centre).abs();
        if d < best_dist {
            best_dist = d;
            best = i;
        }
    }
    Some(best)
}

/// Environmental operating envelope for one method.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct WeatherEnvelope {
    pub min_temp_c: f64,
    pub max_temp_c: f64,
    pub max_wind_m_per_s: f64,
    pub max_precip_mm: f64,
}

impl Default for WeatherEnvelope {
    fn default() -> Self {
        Self {
            min_temp_c: -40.0,
            max_temp_c: 50.0,
            max_wind_m_per_s: 20.0,
            max_precip_mm: 10.0,
        }
    }
}

/// Optional random coverage mask intersected with the weather envelope:
/// a cell passes spatial sampling for the whole run, and each (cell, day)
/// independently passes temporal sampling.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CoverageSampling {
    pub spatial_fraction: f64,
    pub temporal_fraction: f64,
}

impl Default for CoverageSampling {
    fn default() -> Self {
        Self {
            spatial_fraction: 1.0,
            temporal_fraction: 1.0,
        }
    }
}

/// Precomputed per-method deployment eligibility. Pure lookup table; no
/// mutation after construction.
#[derive(Debug, Resource)]
pub struct DeploymentGrid {
    lon_cells: usize,
    lat_cells: usize,
    days: usize,
    /// One flattened boolean table per method, same layout as WeatherFields.
    tables: Vec<Vec<bool>>,
}

impl DeploymentGrid {
    pub fn build<R: Rng>(
        weather: &WeatherFields,
        envelopes: &[(WeatherEnvelope, Option<CoverageSampling>)],
        rng: &mut R,
    ) -> Self {
        let cells = weather.lon_cells * weather.lat_cells;
        let mut tables = Vec::with_capacity(envelopes.len());
        for (envelope, coverage) in envelopes {
            let coverage = coverage.unwrap_or_default();
            let spatial_mask: Vec<bool> = (0..cells)
                .map(|_| rng.gen::<f64>() < coverage.spatial_fraction)
                .collect();
            let mut table = vec![false; cells * weather.days];
            for day in 0..weather.days {
                for yi in 0..weather.lat_cells {
                    for xi in 0..weather.lon_cells {
                        let i = weather.idx(xi, yi, day);
                        let weather_ok = weather.temp_c[i] >= envelope.min_temp_c
                            && weather.temp_c[i] <= envelope.max_temp_c
                            && weather.wind_m_per_s[i] <= envelope.max_wind_m_per_s
                            && weather.precip_mm[i] <= envelope.max_precip_mm;
                        let covered = spatial_mask[yi * weather.lon_cells + xi]
                            && (coverage.temporal_fraction >= 1.0
                                || rng.gen::<f64>() < coverage.temporal_fraction);
                        table[i] = weather_ok && covered;
                    }
                }
            }
            tables.push(table);
        }
        Self {
            lon_cells: weather.lon_cells,
            lat_cells: weather.lat_cells,
            days: weather.days,
            tables,
        }
    }

    /// Can `method` operate at grid cell (xi, yi) on `day`?
    pub fn is_deployable(&self, method: MethodId, xi: usize, yi: usize, day: u32) -> bool {
        let day = day as usize;
        if day >= self.days || xi >= self.lon_cells || yi >= self.lat_cells {
            return false;
        }
        self.tables[method.0][day * self.lon_cells * self.lat_cells + yi * self.lon_cells + xi]
    }

    pub fn days(&self) -> usize {
        self.days
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn one_method(envelope: WeatherEnvelope) -> Vec<(WeatherEnvelope, Option<CoverageSampling>)> {
        vec![(envelope, None)]
    }

    #[test]
    fn envelope_gates_eligibility() {
        let mut weather = WeatherFields::uniform(2, 2, 3, 10.0, 5.0, 0.0);
        // Day 1, cell (1, 0): storm.
        let i = weather.idx(1, 0, 1);
        weather.wind_m_per_s[i] = 30.0;

        let mut rng = StdRng::seed_from_u64(0);
        let grid = DeploymentGrid::build(&weather, &one_method(WeatherEnvelope::default()), &mut rng);

        assert!(grid.is_deployable(MethodId(0), 1, 0, 0));
        assert!(!grid.is_deployable(MethodId(0), 1, 0, 1));
        assert!(grid.is_deployable(MethodId(0), 0, 0, 1));
    }

    #[test]
    fn lookups_are_immutable_across_repeated_queries() {
        let weather = WeatherFields::uniform(3, 3, 5, 10.0, 5.0, 0.0);
        let mut rng = StdRng::seed_from_u64(7);
        let grid = DeploymentGrid::build(
            &weather,
            &one_method(WeatherEnvelope::default()),
            &mut rng,
        );
        let first = grid.is_deployable(MethodId(0), 2, 1, 3);
        for _ in 0..10 {
            assert_eq!(grid.is_deployable(MethodId(0), 2, 1, 3), first);
        }
    }

    #[test]
    fn out_of_range_queries_are_ineligible() {
        let weather = WeatherFields::uniform(2, 2, 2, 10.0, 5.0, 0.0);
        let mut rng = StdRng::seed_from_u64(1);
        let grid = DeploymentGrid::build(&weather, &one_method(WeatherEnvelope::default()), &mut rng);
        assert!(!grid.is_deployable(MethodId(0), 0, 0, 99));
        assert!(!grid.is_deployable(MethodId(0), 9, 0, 0));
    }

    #[test]
    fn site_resolution_rejects_out_of_bounds_coordinates() {
        let weather = WeatherFields::uniform(4, 4, 1, 10.0, 5.0, 0.0);
        assert!(weather.grid_index_for("ok", 2.2, 1.4).is_ok());
        let err = weather.grid_index_for("far", 40.0, 1.0).unwrap_err();
        assert!(matches!(err, ConfigError::SiteOutsideGrid { .. }));
    }

    #[test]
    fn zero_spatial_coverage_blocks_everything() {
        let weather = WeatherFields::uniform(2, 2, 2, 10.0, 5.0, 0.0);
        let mut rng = StdRng::seed_from_u64(3);
        let grid = DeploymentGrid::build(
            &weather,
            &[(
                WeatherEnvelope::default(),
                Some(CoverageSampling {
                    spatial_fraction: 0.0,
                    temporal_fraction: 1.0,
                }),
            )],
            &mut rng,
        );
        for day in 0..2 {
            for yi in 0..2 {
                for xi in 0..2 {
                    assert!(!grid.is_deployable(MethodId(0), xi, yi, day));
                }
            }
        }
    }
}
