use rand::{rngs::StdRng, Rng, SeedableRng};
use tour_cuts::{Coordinate, CoordinateSet, TspError};

/// Latitude and longitude ranges random cities are drawn from.
#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Default for BoundingBox {
    /// Germany.
    fn default() -> Self {
        BoundingBox {
            min_lat: 47.27,
            max_lat: 55.06,
            min_lng: 5.87,
            max_lng: 15.04,
        }
    }
}

pub struct RandomCityGenerator {
    rng: StdRng,
    bounds: BoundingBox,
}

impl RandomCityGenerator {
    pub fn new(seed: u64, bounds: BoundingBox) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            bounds,
        }
    }

    fn random_coordinate(&mut self) -> Coordinate {
        Coordinate::new(
            self.rng.gen_range(self.bounds.min_lat..self.bounds.max_lat),
            self.rng.gen_range(self.bounds.min_lng..self.bounds.max_lng),
        )
    }

    /// Cities named `city0`, `city1`, ...
    pub fn generate(&mut self, num_cities: usize) -> Result<CoordinateSet, TspError> {
        let mut coords = CoordinateSet::new();
        for i in 0..num_cities {
            let coord = self.random_coordinate();
            coords.insert(format!("city{}", i).into(), coord)?;
        }
        log::info!("Generated {} random cities.", num_cities);
        Ok(coords)
    }
}
