use geo::Point;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::{
    error::TspError,
    graph::{nodes, Node},
};

/// An opaque city identifier.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct City(String);

impl City {
    pub fn new<S: Into<String>>(name: S) -> Self {
        City(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for City {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for City {
    fn from(name: &str) -> Self {
        City::new(name)
    }
}

impl From<String> for City {
    fn from(name: String) -> Self {
        City(name)
    }
}

/// A (latitude, longitude) pair.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize)]
pub struct Coordinate {
    lat: f64,
    lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Coordinate { lat, lng }
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }

    /// The coordinate as a point of the plane, latitude on the first axis.
    pub fn to_point(&self) -> Point<f64> {
        Point::new(self.lat, self.lng)
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((lat, lng): (f64, f64)) -> Self {
        Coordinate::new(lat, lng)
    }
}

/// Cities with their coordinates, in insertion order. The position of a city
/// is its [`Node`].
#[derive(Clone, Debug, Default)]
pub struct CoordinateSet {
    cities: Vec<City>,
    coords: Vec<Coordinate>,
    index: FxHashMap<City, Node>,
}

impl CoordinateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects `(city, coordinate)` pairs, failing on the first duplicate city.
    pub fn from_pairs<I, C, P>(pairs: I) -> Result<Self, TspError>
    where
        I: IntoIterator<Item = (C, P)>,
        C: Into<City>,
        P: Into<Coordinate>,
    {
        let mut set = Self::new();
        for (city, coord) in pairs {
            set.insert(city.into(), coord.into())?;
        }
        Ok(set)
    }

    pub fn insert(&mut self, city: City, coord: Coordinate) -> Result<Node, TspError> {
        if self.index.contains_key(&city) {
            return Err(TspError::Input(format!("duplicate city {}", city)));
        }
        let node = Node::new(self.cities.len());
        self.index.insert(city.clone(), node);
        self.cities.push(city);
        self.coords.push(coord);
        Ok(node)
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = Node> {
        nodes(self.len())
    }

    pub fn city(&self, node: Node) -> &City {
        &self.cities[node.id()]
    }

    pub fn coordinate(&self, node: Node) -> Coordinate {
        self.coords[node.id()]
    }

    pub fn node_of(&self, city: &City) -> Option<Node> {
        self.index.get(city).copied()
    }

    pub fn contains(&self, city: &City) -> bool {
        self.index.contains_key(city)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&City, Coordinate)> + '_ {
        self.cities.iter().zip(self.coords.iter().copied())
    }
}
