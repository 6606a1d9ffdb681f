//! Target location catalog.
//!
//! The embedded city list is parsed once at construction, shuffled with a
//! seeded RNG, and then cycled: every city appears once before any repeats.
//! The seed lives in the server configuration so a run can be reproduced.

use mapdart_round::GeoPoint;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// One guessable location.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct City {
    pub name: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl City {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// Shuffled, cycling source of round targets.
#[derive(Debug)]
pub struct Catalog {
    cities: Vec<City>,
    index: usize,
}

impl Catalog {
    /// Catalog over the embedded city list.
    pub fn embedded(seed: u64) -> Self {
        let cities: Vec<City> = serde_json::from_str(include_str!("../cities.json"))
            .expect("embedded cities.json does not have the expected format");
        Self::from_cities(cities, seed)
    }

    /// Catalog over a caller-provided list (tests, custom deployments).
    ///
    /// # Panics
    /// If `cities` is empty — a game without targets cannot run.
    pub fn from_cities(mut cities: Vec<City>, seed: u64) -> Self {
        assert!(!cities.is_empty(), "catalog requires at least one city");
        cities.shuffle(&mut StdRng::seed_from_u64(seed));
        Self { cities, index: 0 }
    }

    /// The next target, cycling through the whole list before repeating.
    pub fn next_city(&mut self) -> City {
        let city = self.cities[self.index].clone();
        self.index = (self.index + 1) % self.cities.len();
        city
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(n: usize) -> Vec<City> {
        (0..n)
            .map(|i| City {
                name: format!("city{i}"),
                country: format!("country{i}"),
                latitude: i as f64,
                longitude: -(i as f64),
            })
            .collect()
    }

    #[test]
    fn test_embedded_catalog_parses() {
        let catalog = Catalog::embedded(0);
        assert!(catalog.len() >= 10);
    }

    #[test]
    fn test_same_seed_same_order() {
        let mut a = Catalog::from_cities(sample(8), 42);
        let mut b = Catalog::from_cities(sample(8), 42);

        for _ in 0..8 {
            assert_eq!(a.next_city().name, b.next_city().name);
        }
    }

    #[test]
    fn test_cycles_through_every_city_before_repeating() {
        let mut catalog = Catalog::from_cities(sample(5), 7);

        let mut seen: Vec<String> = (0..5).map(|_| catalog.next_city().name).collect();
        seen.sort();
        let mut expected: Vec<String> = sample(5).into_iter().map(|c| c.name).collect();
        expected.sort();
        assert_eq!(seen, expected);

        // Sixth draw wraps around to the start of the same shuffled order.
        let mut fresh = Catalog::from_cities(sample(5), 7);
        let first = fresh.next_city().name;
        assert_eq!(catalog.next_city().name, first);
    }

    #[test]
    #[should_panic(expected = "at least one city")]
    fn test_empty_catalog_panics() {
        let _ = Catalog::from_cities(vec![], 0);
    }
}
