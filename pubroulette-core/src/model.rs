//! Domain data structures for candidates, venues, and search queries.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Largest search radius accepted from callers, in metres.
pub const MAX_RADIUS_METRES: u32 = 2000;
/// Largest number of venues a crawl may ask for.
pub const MAX_CRAWL_LENGTH: usize = 5;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
/// Rejected query parameters.
pub enum InvalidQuery {
    /// Latitude outside `[-90, 90]`.
    #[error("invalid latitude: {0}")]
    Latitude(f64),
    /// Longitude outside `[-180, 180]`.
    #[error("invalid longitude: {0}")]
    Longitude(f64),
    /// Radius outside `[0, MAX_RADIUS_METRES]`.
    #[error("invalid radius: {0}")]
    Radius(i64),
    /// Crawl length outside `[1, MAX_CRAWL_LENGTH]`.
    #[error("invalid length: {0}")]
    Length(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
/// Backend-assigned identifier of a candidate record.
pub struct CandidateId(pub i64);

impl fmt::Display for CandidateId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
/// A point in decimal degrees.
pub struct Coordinates {
    /// Latitude in `[-90, 90]`.
    pub latitude: f64,
    /// Longitude in `[-180, 180]`.
    pub longitude: f64,
}

impl Coordinates {
    /// Validate and construct a coordinate pair.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidQuery::Latitude`] or [`InvalidQuery::Longitude`] when a
    /// component is out of range or not a number.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, InvalidQuery> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(InvalidQuery::Latitude(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(InvalidQuery::Longitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Latitude with the fixed six-decimal precision external services expect.
    #[must_use]
    pub fn latitude_fixed(&self) -> String {
        format!("{:.6}", self.latitude)
    }

    /// Longitude with the fixed six-decimal precision external services expect.
    #[must_use]
    pub fn longitude_fixed(&self) -> String {
        format!("{:.6}", self.longitude)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
/// Circle to search for venues in.
pub struct SearchArea {
    /// Center of the circle.
    pub center: Coordinates,
    /// Radius in metres.
    pub radius_metres: u32,
}

impl SearchArea {
    /// Validate and construct a search area.
    ///
    /// # Errors
    ///
    /// Returns an [`InvalidQuery`] naming the first out-of-range parameter.
    pub fn new(latitude: f64, longitude: f64, radius_metres: i64) -> Result<Self, InvalidQuery> {
        let center = Coordinates::new(latitude, longitude)?;
        let radius_metres = u32::try_from(radius_metres)
            .ok()
            .filter(|radius| *radius <= MAX_RADIUS_METRES)
            .ok_or(InvalidQuery::Radius(radius_metres))?;
        Ok(Self {
            center,
            radius_metres,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Number of venues requested for a crawl.
pub struct CrawlLength(usize);

impl CrawlLength {
    /// Validate and construct a crawl length.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidQuery::Length`] when `length` is outside `[1, MAX_CRAWL_LENGTH]`.
    pub fn new(length: i64) -> Result<Self, InvalidQuery> {
        usize::try_from(length)
            .ok()
            .filter(|len| (1..=MAX_CRAWL_LENGTH).contains(len))
            .map(Self)
            .ok_or(InvalidQuery::Length(length))
    }

    /// The requested number of venues.
    #[must_use]
    pub fn get(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Geometry kind of a raw record. Has no effect on selection.
pub enum RecordKind {
    /// Single point.
    Node,
    /// Outline.
    Way,
    /// Grouped geometry.
    Relation,
}

#[derive(Debug, Clone, PartialEq)]
/// One raw location record returned by a geodata backend.
pub struct CandidateRecord {
    /// Identifier, unique within one backend response.
    pub id: CandidateId,
    /// Position of the record.
    pub location: Coordinates,
    /// Raw attributes, ordered by attribute name.
    pub tags: BTreeMap<String, String>,
    /// Geometry kind.
    pub kind: RecordKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Resolved name set of a venue.
pub struct VenueNames {
    /// Display name. Never the `unknown` sentinel.
    pub name: String,
    /// Alternate name, cleared when it equals `name`.
    pub alt_name: Option<String>,
    /// Historical name, cleared when it equals `name`.
    pub old_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Opening hours for a single day.
pub struct OpeningHour {
    /// Day label as published by the source, e.g. `Monday`.
    pub day: String,
    /// Opening time, absent when closed.
    #[serde(with = "hhmm", default)]
    pub open: Option<NaiveTime>,
    /// Closing time, absent when closed.
    #[serde(with = "hhmm", default)]
    pub close: Option<NaiveTime>,
    /// Whether the venue is closed all day.
    pub closed: bool,
}

impl OpeningHour {
    /// Entry for a day on which the venue is closed.
    #[must_use]
    pub fn closed(day: impl Into<String>) -> Self {
        Self {
            day: day.into(),
            open: None,
            close: None,
            closed: true,
        }
    }

    /// Entry for a day with an open and close time.
    #[must_use]
    pub fn open(day: impl Into<String>, open: NaiveTime, close: NaiveTime) -> Self {
        Self {
            day: day.into(),
            open: Some(open),
            close: Some(close),
            closed: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Supplementary data returned by an enrichment source.
///
/// Empty fields mean "no information" and never overwrite a venue.
pub struct PartialVenue {
    /// Alternate name.
    pub alt_name: Option<String>,
    /// Historical name.
    pub old_name: Option<String>,
    /// Formatted address.
    pub address: Option<String>,
    /// Feature labels.
    pub features: Vec<String>,
    /// Opening hours.
    pub opening_times: Vec<OpeningHour>,
}

impl PartialVenue {
    /// True when no field carries information.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        non_blank(self.alt_name.as_deref()).is_none()
            && non_blank(self.old_name.as_deref()).is_none()
            && non_blank(self.address.as_deref()).is_none()
            && self.features.is_empty()
            && self.opening_times.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Fully resolved venue returned to callers.
pub struct Venue {
    /// Display name.
    pub name: String,
    /// Alternate name.
    pub alt_name: Option<String>,
    /// Historical name.
    pub old_name: Option<String>,
    /// Position of the venue.
    #[serde(flatten)]
    pub location: Coordinates,
    /// Human-facing address.
    pub address: String,
    /// Curated feature labels.
    pub features: Vec<String>,
    /// Opening hours, empty when unknown.
    pub opening_times: Vec<OpeningHour>,
}

impl Venue {
    /// Merge an enrichment result, replacing every field the partial result carries.
    ///
    /// Alternate and historical names equal to the display name are ignored.
    pub fn merge(&mut self, partial: PartialVenue) {
        if let Some(alt_name) = non_blank(partial.alt_name.as_deref())
            && alt_name != self.name
        {
            self.alt_name = Some(alt_name.to_owned());
        }
        if let Some(old_name) = non_blank(partial.old_name.as_deref())
            && old_name != self.name
        {
            self.old_name = Some(old_name.to_owned());
        }
        if let Some(address) = non_blank(partial.address.as_deref()) {
            address.clone_into(&mut self.address);
        }
        if !partial.features.is_empty() {
            self.features = partial.features;
        }
        if !partial.opening_times.is_empty() {
            self.opening_times = partial.opening_times;
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.trim().is_empty())
}

mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub(super) fn serialize<S: Serializer>(
        time: &Option<NaiveTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match time {
            Some(time) => serializer.serialize_str(&time.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveTime>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| NaiveTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom))
            .transpose()
    }
}
