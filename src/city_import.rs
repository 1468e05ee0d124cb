use std::{error::Error, fs::File, io::Read, path::Path};

use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use tour_cuts::Coordinate;

/// One row of a city table as it comes from the file. Every field is read as
/// text so a single bad value drops the row instead of failing the import.
#[derive(Debug, Deserialize)]
struct RawRecord {
    city: Option<String>,
    lat: Option<String>,
    lng: Option<String>,
    population: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CityRecord {
    pub name: String,
    pub coord: Coordinate,
    pub population: Option<f64>,
}

/// Parses a number that may use a decimal comma.
fn parse_decimal(raw: &str) -> Option<f64> {
    let value = raw.trim().replace(',', ".").parse::<f64>().ok()?;
    if value.is_finite() {
        Some(value)
    } else {
        None
    }
}

impl RawRecord {
    fn into_record(self) -> Option<CityRecord> {
        let name = self.city?.trim().to_string();
        if name.is_empty() {
            return None;
        }
        let lat = parse_decimal(self.lat.as_deref()?)?;
        let lng = parse_decimal(self.lng.as_deref()?)?;
        let population = self.population.as_deref().and_then(parse_decimal);

        Some(CityRecord {
            name,
            coord: Coordinate::new(lat, lng),
            population,
        })
    }
}

/// Reads city records from CSV with the headers `city, lat, lng, population`.
/// Further columns are ignored. Rows without a name or with unusable
/// coordinates are skipped.
pub fn read_cities<R: Read>(reader: R) -> Result<Vec<CityRecord>, Box<dyn Error>> {
    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut records = vec![];
    let mut skipped = 0;
    for row in rdr.deserialize::<RawRecord>() {
        match row?.into_record() {
            Some(record) => records.push(record),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        log::warn!("Skipped {} rows without name or coordinates.", skipped);
    }
    log::info!("Imported {} cities.", records.len());
    Ok(records)
}

pub fn import_cities<P: AsRef<Path>>(path: P) -> Result<Vec<CityRecord>, Box<dyn Error>> {
    let file = File::open(path)?;
    read_cities(file)
}
