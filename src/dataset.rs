use csv::{ReaderBuilder, StringRecord};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::time::Instant;
use tracing::info;

use crate::error::{DashboardError, Result};

/// Exact header names of the store locations CSV.
pub mod columns {
    pub const STORE_NUMBER: &str = "Store Number";
    pub const STORE_NAME: &str = "Store Name";
    pub const OWNERSHIP_TYPE: &str = "Ownership Type";
    pub const STREET_ADDRESS: &str = "Street Address";
    pub const CITY: &str = "City";
    pub const STATE_PROVINCE: &str = "State/Province";
    pub const COUNTRY: &str = "Country";
    pub const POSTCODE: &str = "Postcode";
    pub const PHONE_NUMBER: &str = "Phone Number";
    pub const TIMEZONE: &str = "Timezone";
    pub const LONGITUDE: &str = "Longitude";
    pub const LATITUDE: &str = "Latitude";

    pub const ALL: [&str; 12] = [
        STORE_NUMBER,
        STORE_NAME,
        OWNERSHIP_TYPE,
        STREET_ADDRESS,
        CITY,
        STATE_PROVINCE,
        COUNTRY,
        POSTCODE,
        PHONE_NUMBER,
        TIMEZONE,
        LONGITUDE,
        LATITUDE,
    ];
}

/// One store row, typed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreRecord {
    #[serde(rename = "Store Number")]
    pub store_number: String,
    #[serde(rename = "Store Name")]
    pub store_name: String,
    #[serde(rename = "Ownership Type")]
    pub ownership_type: String,
    #[serde(rename = "Street Address")]
    pub street_address: String,
    #[serde(rename = "City")]
    pub city: String,
    #[serde(rename = "State/Province")]
    pub state_province: String,
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "Postcode")]
    pub postcode: String,
    #[serde(rename = "Phone Number")]
    pub phone_number: Option<String>,
    #[serde(rename = "Timezone")]
    pub timezone: String,
    #[serde(rename = "Longitude", deserialize_with = "csv::invalid_option")]
    pub longitude: Option<f64>,
    #[serde(rename = "Latitude", deserialize_with = "csv::invalid_option")]
    pub latitude: Option<f64>,
}

/// Field values read as null besides the empty string. `NA` is left out so
/// Namibia's country code survives.
pub const NULL_MARKERS: [&str; 17] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN", "<NA>",
    "N/A", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// The loaded table: header row plus every data row, in file order.
///
/// Empty fields and [`NULL_MARKERS`] are treated as null.
#[derive(Debug, Clone)]
pub struct Dataset {
    headers: StringRecord,
    rows: Vec<StringRecord>,
}

impl Dataset {
    pub fn from_reader<R: Read>(source_id: &str, reader: R) -> Result<Self> {
        let start_time = Instant::now();
        let mut rdr = ReaderBuilder::new().from_reader(reader);

        let headers = rdr
            .headers()
            .map_err(|e| DashboardError::unavailable(source_id, e))?
            .clone();

        let rows = rdr
            .records()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| DashboardError::unavailable(source_id, e))?;

        info!(
            action = "parse",
            component = "dataset",
            source = source_id,
            column_count = headers.len(),
            row_count = rows.len(),
            duration_ms = start_time.elapsed().as_millis(),
            "Parsed CSV dataset"
        );

        Ok(Dataset { headers, rows })
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.headers.iter()
    }

    pub fn rows(&self) -> &[StringRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of `name` in the header row. Names match exactly.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| DashboardError::UnknownColumn(name.to_string()))
    }

    pub fn values(&self, name: &str) -> Result<impl Iterator<Item = Option<&str>> + '_> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(move |row| field(row, idx)))
    }

    pub fn store_records(&self) -> Result<Vec<StoreRecord>> {
        self.rows
            .iter()
            .map(|row| {
                let cleaned: StringRecord = row
                    .iter()
                    .map(|value| if is_null(value) { "" } else { value })
                    .collect();
                cleaned.deserialize(Some(&self.headers)).map_err(|e| {
                    DashboardError::unavailable("dataset", format!("bad store row: {}", e))
                })
            })
            .collect()
    }
}

pub fn is_null(value: &str) -> bool {
    value.is_empty() || NULL_MARKERS.contains(&value)
}

pub fn field(record: &StringRecord, idx: usize) -> Option<&str> {
    record.get(idx).filter(|value| !is_null(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Store Number,Store Name,Ownership Type,Street Address,City,State/Province,Country,Postcode,Phone Number,Timezone,Longitude,Latitude
1-1,Pike Place,Company Owned,102 Pike St,Seattle,WA,US,98101,206-555-0100,GMT-08:00 America/Los_Angeles,-122.34,47.61
1-2,Pearl,Licensed,1 Pearl St,Portland,OR,US,97209,,GMT-08:00 America/Los_Angeles,bad,45.52
1-3,Pioneer,Licensed,2 Pioneer Sq,Portland,OR,US,97204,NULL,GMT-08:00 America/Los_Angeles,nan,NaN
";

    #[test]
    fn parses_headers_and_rows_in_order() {
        let ds = Dataset::from_reader("test", SAMPLE.as_bytes()).unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.headers().collect::<Vec<_>>(), columns::ALL.to_vec());
        assert_eq!(ds.column_index(columns::CITY).unwrap(), 4);
    }

    #[test]
    fn column_lookup_is_case_sensitive() {
        let ds = Dataset::from_reader("test", SAMPLE.as_bytes()).unwrap();
        let err = ds.column_index("city").unwrap_err();
        assert!(matches!(err, DashboardError::UnknownColumn(name) if name == "city"));
    }

    #[test]
    fn empty_fields_read_as_null() {
        let ds = Dataset::from_reader("test", SAMPLE.as_bytes()).unwrap();
        let phones: Vec<_> = ds.values(columns::PHONE_NUMBER).unwrap().collect();
        assert_eq!(phones, vec![Some("206-555-0100"), None, None]);
    }

    #[test]
    fn null_markers_read_as_null_but_namibia_stays() {
        let csv = "City,Country\nN/A,NA\nNULL,US\nnan,US\nSeattle,US\n";
        let ds = Dataset::from_reader("markers", csv.as_bytes()).unwrap();
        let cities: Vec<_> = ds.values(columns::CITY).unwrap().collect();
        assert_eq!(cities, vec![None, None, None, Some("Seattle")]);
        let countries: Vec<_> = ds.values(columns::COUNTRY).unwrap().flatten().collect();
        assert_eq!(countries, vec!["NA", "US", "US", "US"]);
    }

    #[test]
    fn store_records_tolerate_bad_coordinates() {
        let ds = Dataset::from_reader("test", SAMPLE.as_bytes()).unwrap();
        let records = ds.store_records().unwrap();
        assert_eq!(records[0].latitude, Some(47.61));
        assert_eq!(records[1].longitude, None);
        assert_eq!(records[1].phone_number, None);
        assert_eq!(records[1].city, "Portland");
        assert_eq!(records[2].phone_number, None);
        assert_eq!(records[2].latitude, None);
        assert_eq!(records[2].longitude, None);
    }

    #[test]
    fn ragged_rows_are_unavailable_data() {
        let err = Dataset::from_reader("ragged", "a,b\n1,2,3\n".as_bytes()).unwrap_err();
        assert!(matches!(err, DashboardError::DataUnavailable { .. }));
    }
}
