//! Streaming readers for the two tab-separated input files.
//!
//! Both readers yield one parsed record per useful line and skip malformed
//! rows silently, matching how the gazetteer dumps are actually consumed:
//! the files contain the odd short or unparseable line and a build should
//! not die on them. I/O errors are still surfaced.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

use crate::city::City;
use crate::error::Result;
use crate::geom::LatLng;
use crate::postal::PostalEntry;

/// Parses one GeoNames dump row.
///
/// Field indexes (tab-separated): 1 = name, 3 = comma-separated alternate
/// names, 4 = latitude, 5 = longitude, 8 = country code. Rows with fewer
/// than 9 fields or an unparseable coordinate yield `None`; alternate names
/// are only taken from complete 19-field rows.
pub fn parse_city_row(line: &str) -> Option<City> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < 9 {
        return None;
    }
    let latitude: f64 = fields[4].trim().parse().ok()?;
    let longitude: f64 = fields[5].trim().parse().ok()?;
    // Out-of-range coordinates are as unusable as unparseable ones. The
    // check also keeps ids aligned between the spatial and name builds,
    // which stream this file independently.
    LatLng::new(latitude, longitude).ok()?;
    let alt_names = if fields.len() >= 19 {
        fields[3]
            .split(',')
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect()
    } else {
        Vec::new()
    };
    Some(City {
        name: fields[1].to_owned(),
        country: fields[8].to_owned(),
        latitude,
        longitude,
        alt_names,
    })
}

/// Parses one postal-registry row.
///
/// Field indexes: 0 = country, 1 = postal code, 2 = place name, 3..=8 =
/// admin1–3 names and codes, 9 = latitude, 10 = longitude, 11 = accuracy
/// (may be empty).
pub fn parse_postal_row(line: &str) -> Option<PostalEntry> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < 12 {
        return None;
    }
    let latitude: f64 = fields[9].trim().parse().ok()?;
    let longitude: f64 = fields[10].trim().parse().ok()?;
    Some(PostalEntry {
        country_code: fields[0].to_owned(),
        postal_code: fields[1].to_owned(),
        place_name: fields[2].to_owned(),
        admin_name1: fields[3].to_owned(),
        admin_code1: fields[4].to_owned(),
        admin_name2: fields[5].to_owned(),
        admin_code2: fields[6].to_owned(),
        admin_name3: fields[7].to_owned(),
        admin_code3: fields[8].to_owned(),
        latitude,
        longitude,
        accuracy: fields[11].trim().parse().unwrap_or(0),
    })
}

/// Lazy iterator over the parsed cities of a GeoNames dump.
pub struct GeoNamesReader<R: BufRead> {
    lines: Lines<R>,
}

impl GeoNamesReader<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: BufRead> GeoNamesReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }
}

impl<R: BufRead> Iterator for GeoNamesReader<R> {
    type Item = Result<City>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.lines.next()? {
                Err(e) => return Some(Err(e.into())),
                Ok(line) => {
                    if let Some(city) = parse_city_row(&line) {
                        return Some(Ok(city));
                    }
                }
            }
        }
    }
}

/// Lazy iterator over the parsed rows of a postal-code registry dump.
pub struct PostalReader<R: BufRead> {
    lines: Lines<R>,
}

impl PostalReader<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: BufRead> PostalReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }
}

impl<R: BufRead> Iterator for PostalReader<R> {
    type Item = Result<PostalEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.lines.next()? {
                Err(e) => return Some(Err(e.into())),
                Ok(line) => {
                    if let Some(entry) = parse_postal_row(&line) {
                        return Some(Ok(entry));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // A complete 19-field row in GeoNames dump layout.
    const BERLIN: &str = "2950159\tBerlin\tBerlin\tBerlino,Berlín,Берлин\t52.52437\t13.41053\tP\tPPLC\tDE\t\t16\t00\t11000\t11000000\t3426354\t74\t43\tEurope/Berlin\t2022-08-29";

    #[test]
    fn parses_complete_row() {
        let city = parse_city_row(BERLIN).unwrap();
        assert_eq!(city.name, "Berlin");
        assert_eq!(city.country, "DE");
        assert_eq!(city.latitude, 52.52437);
        assert_eq!(city.longitude, 13.41053);
        assert_eq!(city.alt_names, vec!["Berlino", "Berlín", "Берлин"]);
    }

    #[test]
    fn short_row_keeps_name_but_drops_alt_names() {
        let row = "1\tLonetown\tLonetown\tAlias1,Alias2\t10.5\t-20.25\tP\tPPL\tXK";
        let city = parse_city_row(row).unwrap();
        assert_eq!(city.name, "Lonetown");
        assert!(city.alt_names.is_empty());
    }

    #[test]
    fn malformed_rows_are_skipped() {
        assert!(parse_city_row("too\tfew\tfields").is_none());
        assert!(parse_city_row("1\tX\tX\t\tnot-a-float\t2.0\tP\tPPL\tDE").is_none());
        assert!(parse_city_row("1\tX\tX\t\t1.0\tNaNish\tP\tPPL\tDE").is_none());
        assert!(parse_city_row("1\tX\tX\t\t95.0\t2.0\tP\tPPL\tDE").is_none());
        assert!(parse_city_row("").is_none());
    }

    #[test]
    fn reader_streams_and_skips() {
        let input = format!("{BERLIN}\ngarbage line\n1\tTown\tTown\t\t1.5\t2.5\tP\tPPL\tFR\n");
        let cities: Vec<City> = GeoNamesReader::new(input.as_bytes())
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(cities.len(), 2);
        assert_eq!(cities[0].name, "Berlin");
        assert_eq!(cities[1].country, "FR");
    }

    #[test]
    fn parses_postal_row() {
        let row = "US\t10001\tNew York\tNew York\tNY\tNew York\t061\t\t\t40.7484\t-73.9967\t4";
        let entry = parse_postal_row(row).unwrap();
        assert_eq!(entry.postal_code, "10001");
        assert_eq!(entry.place_name, "New York");
        assert_eq!(entry.admin_code1, "NY");
        assert_eq!(entry.latitude, 40.7484);
        assert_eq!(entry.accuracy, 4);
    }

    #[test]
    fn postal_empty_accuracy_defaults_to_zero() {
        let row = "DE\t10115\tBerlin\tBerlin\tBE\t\t\t\t\t52.5323\t13.3846\t";
        assert_eq!(parse_postal_row(row).unwrap().accuracy, 0);
        assert!(parse_postal_row("DE\t10115").is_none());
    }
}
