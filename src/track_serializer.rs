use crate::domain::{TrackPoint, TrackPointError};
use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;
use tracing::{debug, warn};

pub const HEADER: &str = "User_id,Time,Lat,Lon";
const FIELD_COUNT: usize = 4;

/// Encodes a trajectory as CSV: a header line followed by one line per point, in order.
///
/// Fields are not quoted, so observer ids and timestamps must not contain commas. Coordinates use
/// the shortest representation that parses back to the same value.
pub fn encode(points: &[TrackPoint]) -> String {
    let mut lines = Vec::with_capacity(points.len() + 1);
    lines.push(HEADER.to_string());
    lines.extend(points.iter().map(|point| {
        format!(
            "{},{},{},{}",
            point.observer_id(),
            point.timestamp().to_rfc3339_opts(SecondsFormat::AutoSi, true),
            point.latitude(),
            point.longitude()
        )
    }));

    lines.join("\n")
}

/// Decodes the last non-blank row, the latest known position of whoever recorded the track.
pub fn decode(text: &str) -> Result<TrackPoint, ParseError> {
    let (index, line) = text
        .lines()
        .enumerate()
        .map(|(index, line)| (index, line.trim()))
        .filter(|(_, line)| !line.is_empty())
        .last()
        .ok_or(ParseError::NoData)?;

    if is_header(line) {
        return Err(ParseError::NoData);
    }

    let fields = line.split(',').map(str::trim).collect::<Vec<_>>();
    parse_row(&fields, index + 1)
}

/// Result of decoding every row of a track.
#[derive(Debug, PartialEq)]
pub struct DecodedTrack {
    pub points: Vec<TrackPoint>,
    pub skipped: usize,
}

/// Decodes every data row. The header row is optional. Rows that fail validation are skipped and
/// counted instead of aborting the import.
pub fn decode_all(text: &str) -> Result<DecodedTrack, ParseError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut points = Vec::new();
    let mut skipped = 0;
    let mut rows = 0;
    let mut first = true;

    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!("⚠️ Skipping unreadable row: {}", e);
                first = false;
                skipped += 1;
                rows += 1;
                continue;
            }
        };

        if record.len() == 1 && record.get(0).is_some_and(str::is_empty) {
            continue;
        }

        let fields = record.iter().collect::<Vec<_>>();
        if std::mem::take(&mut first) && is_header(&fields.join(",")) {
            continue;
        }

        rows += 1;
        let line = record.position().map(|p| p.line() as usize).unwrap_or_default();
        match parse_row(&fields, line) {
            Ok(point) => points.push(point),
            Err(e) => {
                warn!("⚠️ Skipping row: {}", e);
                skipped += 1;
            }
        }
    }

    if rows == 0 {
        return Err(ParseError::NoData);
    }

    debug!("Decoded {} point(s), skipped {} row(s)", points.len(), skipped);
    Ok(DecodedTrack { points, skipped })
}

fn is_header(line: &str) -> bool {
    line.split(',').map(str::trim).eq(HEADER.split(','))
}

fn parse_row(fields: &[&str], line: usize) -> Result<TrackPoint, ParseError> {
    if fields.len() < FIELD_COUNT {
        return Err(ParseError::MalformedRow { line, fields: fields.len() });
    }

    let latitude = parse_coordinate("Lat", fields[2])?;
    let longitude = parse_coordinate("Lon", fields[3])?;
    let timestamp = DateTime::parse_from_rfc3339(fields[1])
        .map_err(|_| ParseError::InvalidTimestamp(fields[1].to_string()))?
        .with_timezone(&Utc);

    Ok(TrackPoint::new(fields[0], timestamp, latitude, longitude)?)
}

fn parse_coordinate(field: &'static str, value: &str) -> Result<f64, ParseError> {
    match value.parse::<f64>() {
        Ok(number) if number.is_finite() => Ok(number),
        _ => Err(ParseError::InvalidNumber {
            field,
            value: value.to_string(),
        }),
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum ParseError {
    #[error("row {line} has {fields} field(s), expected at least 4")]
    MalformedRow { line: usize, fields: usize },
    #[error("field '{field}' is not a finite number: '{value}'")]
    InvalidNumber { field: &'static str, value: String },
    #[error("'{0}' is not an RFC 3339 timestamp")]
    InvalidTimestamp(String),
    #[error("invalid track point: {0}")]
    InvalidPoint(#[from] TrackPointError),
    #[error("the track contains no data rows")]
    NoData,
}
