//! Travel-time models for crew scheduling.
//!
//! Two deployment models: empirical between-sites sampling (no geometry) and
//! route planning over haversine distance with home-base selection. Pairwise
//! distances are memoised in an LRU cache since crews revisit the same site
//! pairs thousands of times over a multi-year run.

use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;
use rand::rngs::StdRng;
use rand::Rng;

use crate::distributions::EmpiricalRate;

/// A geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// Haversine great-circle distance in km.
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let (lat1, lon1) = (a.lat.to_radians(), a.lon.to_radians());
    let (lat2, lon2) = (b.lat.to_radians(), b.lon.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let sin_dlat = (dlat * 0.5).sin();
    let sin_dlon = (dlon * 0.5).sin();
    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    6371.0 * c
}

/// Produces travel legs for a crew's day.
pub trait TravelModel: Send + Sync + std::fmt::Debug {
    /// Minutes to reach `to` from `from` (`None` = start of day, leaving a
    /// home base).
    fn travel_to_mins(&self, from: Option<GeoPoint>, to: GeoPoint, rng: &mut StdRng) -> f64;

    /// Minutes from `from` back to the nearest home base.
    fn travel_home_mins(&self, from: GeoPoint, rng: &mut StdRng) -> f64;
}

/// Travel times drawn from an empirical between-sites distribution,
/// independent of geometry.
#[derive(Debug)]
pub struct EmpiricalTravel {
    minutes: EmpiricalRate,
}

impl EmpiricalTravel {
    pub fn new(samples_mins: Vec<f64>) -> Self {
        Self {
            minutes: EmpiricalRate::new(samples_mins),
        }
    }
}

impl TravelModel for EmpiricalTravel {
    fn travel_to_mins(&self, _from: Option<GeoPoint>, _to: GeoPoint, rng: &mut StdRng) -> f64 {
        self.minutes.sample(rng)
    }

    fn travel_home_mins(&self, _from: GeoPoint, rng: &mut StdRng) -> f64 {
        self.minutes.sample(rng)
    }
}

type PairKey = ((u64, u64), (u64, u64));

/// Route-planning model: haversine distance at a fixed road speed, with the
/// closest of several home bases as the day's origin and terminus.
#[derive(Debug)]
pub struct RoutedTravel {
    home_bases: Vec<GeoPoint>,
    speed_kmh: f64,
    cache: Mutex<LruCache<PairKey, f64>>,
}

impl RoutedTravel {
    pub fn new(home_bases: Vec<GeoPoint>, speed_kmh: f64) -> Self {
        debug_assert!(!home_bases.is_empty(), "route planning needs a home base");
        Self {
            home_bases,
            speed_kmh: speed_kmh.max(1.0),
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(50_000).expect("cache size must be non-zero"),
            )),
        }
    }

    fn key(a: GeoPoint, b: GeoPoint) -> PairKey {
        let ka = (a.lat.to_bits(), a.lon.to_bits());
        let kb = (b.lat.to_bits(), b.lon.to_bits());
        if ka <= kb {
            (ka, kb)
        } else {
            (kb, ka)
        }
    }

    fn distance_km(&self, a: GeoPoint, b: GeoPoint) -> f64 {
        let key = Self::key(a, b);
        let mut cache = match self.cache.lock() {
            Ok(guard) => guard,
            Err(_) => return haversine_km(a, b),
        };
        *cache.get_or_insert(key, || haversine_km(a, b))
    }

    fn nearest_home(&self, to: GeoPoint) -> GeoPoint {
        *self
            .home_bases
            .iter()
            .min_by(|a, b| {
                self.distance_km(**a, to)
                    .total_cmp(&self.distance_km(**b, to))
            })
            .expect("at least one home base")
    }

    fn minutes_for_km(&self, km: f64) -> f64 {
        km / self.speed_kmh * 60.0
    }
}

impl TravelModel for RoutedTravel {
    fn travel_to_mins(&self, from: Option<GeoPoint>, to: GeoPoint, _rng: &mut StdRng) -> f64 {
        let origin = from.unwrap_or_else(|| self.nearest_home(to));
        self.minutes_for_km(self.distance_km(origin, to))
    }

    fn travel_home_mins(&self, from: GeoPoint, _rng: &mut StdRng) -> f64 {
        let home = self.nearest_home(from);
        self.minutes_for_km(self.distance_km(from, home))
    }
}

/// Configured travel model, resolved once at scenario build.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum TravelSpec {
    /// Sample every leg from a between-sites minutes distribution.
    Empirical { samples_mins: Vec<f64> },
    /// Haversine/speed route planning from the closest home base.
    Routed {
        home_bases: Vec<(f64, f64)>,
        speed_kmh: f64,
    },
}

pub fn build_travel_model(spec: &TravelSpec) -> Box<dyn TravelModel> {
    match spec {
        TravelSpec::Empirical { samples_mins } => {
            Box::new(EmpiricalTravel::new(samples_mins.clone()))
        }
        TravelSpec::Routed {
            home_bases,
            speed_kmh,
        } => Box::new(RoutedTravel::new(
            home_bases
                .iter()
                .map(|(lat, lon)| GeoPoint {
                    lat: *lat,
                    lon: *lon,
                })
                .collect(),
            *speed_kmh,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn haversine_matches_known_distance() {
        // Berlin to Hamburg, ~255 km.
        let berlin = GeoPoint {
            lat: 52.52,
            lon: 13.405,
        };
        let hamburg = GeoPoint {
            lat: 53.551,
            lon: 9.994,
        };
        let km = haversine_km(berlin, hamburg);
        assert!((km - 255.0).abs() < 5.0, "got {km}");
    }

    #[test]
    fn zero_distance_is_zero_minutes() {
        let p = GeoPoint { lat: 55.0, lon: -110.0 };
        let model = RoutedTravel::new(vec![p], 80.0);
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(model.travel_to_mins(None, p, &mut rng), 0.0);
        assert_eq!(model.travel_home_mins(p, &mut rng), 0.0);
    }

    #[test]
    fn routed_travel_uses_closest_home_base() {
        let near = GeoPoint { lat: 55.0, lon: -110.0 };
        let far = GeoPoint { lat: 60.0, lon: -120.0 };
        let site = GeoPoint {
            lat: 55.1,
            lon: -110.1,
        };
        let model = RoutedTravel::new(vec![far, near], 60.0);
        let mut rng = StdRng::seed_from_u64(0);
        let mins = model.travel_to_mins(None, site, &mut rng);
        let expect = haversine_km(near, site) / 60.0 * 60.0;
        assert!((mins - expect).abs() < 1e-9);
    }

    #[test]
    fn empirical_travel_draws_from_samples() {
        let model = EmpiricalTravel::new(vec![15.0, 30.0, 45.0]);
        let mut rng = StdRng::seed_from_u64(1);
        let p = GeoPoint { lat: 0.0, lon: 0.0 };
        for _ in 0..50 {
            let mins = model.travel_to_mins(None, p, &mut rng);
            assert!([15.0, 30.0, 45.0].contains(&mins));
        }
    }

    #[test]
    fn cached_distance_is_stable() {
        let a = GeoPoint { lat: 54.0, lon: -112.0 };
        let b = GeoPoint { lat: 54.5, lon: -112.5 };
        let model = RoutedTravel::new(vec![a], 60.0);
        let first = model.distance_km(a, b);
        for _ in 0..5 {
            assert_eq!(model.distance_km(a, b), first);
            assert_eq!(model.distance_km(b, a), first);
        }
    }
}
