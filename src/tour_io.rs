use std::{error::Error, io::Write, path::Path};

use csv::WriterBuilder;
use serde::Serialize;
use tour_cuts::{CoordinateSet, SolvedTour, TerminalStatus};

#[derive(Debug, Serialize)]
struct TourRow<'a> {
    position: usize,
    city: &'a str,
    lat: f64,
    lng: f64,
}

#[derive(Debug, Serialize)]
pub struct TourSummary {
    pub cities: usize,
    pub length: f64,
    pub status: TerminalStatus,
}

impl TourSummary {
    pub fn of(solved: &SolvedTour) -> Self {
        TourSummary {
            cities: solved.cities().len(),
            length: solved.objective(),
            status: solved.status(),
        }
    }
}

/// Writes the tour as a closed polyline: one row per city in tour order and
/// the first city once more at the end.
pub fn write_tour<W: Write>(
    writer: W,
    solved: &SolvedTour,
    coords: &CoordinateSet,
) -> Result<(), Box<dyn Error>> {
    let mut wtr = WriterBuilder::new().from_writer(writer);

    let closing = solved.tour().first();
    for (position, &node) in solved.tour().nodes().iter().chain(closing.iter()).enumerate() {
        let coord = coords.coordinate(node);
        wtr.serialize(TourRow {
            position,
            city: coords.city(node).as_str(),
            lat: coord.lat(),
            lng: coord.lng(),
        })?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn export_tour<P: AsRef<Path>>(
    path: P,
    solved: &SolvedTour,
    coords: &CoordinateSet,
) -> Result<(), Box<dyn Error>> {
    log::info!("Exporting tour to {:?}.", path.as_ref());
    let file = std::fs::File::create(path)?;
    write_tour(file, solved, coords)
}

pub fn write_summary<W: Write>(writer: W, solved: &SolvedTour) -> Result<(), Box<dyn Error>> {
    let mut wtr = WriterBuilder::new().from_writer(writer);
    wtr.serialize(TourSummary::of(solved))?;
    wtr.flush()?;
    Ok(())
}

/// Prints the summary as CSV on stdout. The route goes to the log.
pub fn print_summary(solved: &SolvedTour) -> Result<(), Box<dyn Error>> {
    let names: Vec<&str> = solved.cities().iter().map(|c| c.as_str()).collect();
    if let Some(first) = names.first() {
        log::info!("Route: {} -> {}", names.join(" -> "), first);
    }
    write_summary(std::io::stdout(), solved)
}
