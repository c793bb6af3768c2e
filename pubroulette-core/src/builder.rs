//! Conversion of a raw candidate record into a [`Venue`].

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::model::{CandidateRecord, Venue, VenueNames};
use crate::ports::ReverseGeocoder;
use crate::tags::filter_tags;

/// Attribute holding the primary name.
pub const NAME_KEY: &str = "name";
/// Attribute holding the alternate name.
pub const ALT_NAME_KEY: &str = "alt_name";
/// Attribute holding the historical name.
pub const OLD_NAME_KEY: &str = "old_name";

const UNKNOWN_NAME: &str = "unknown";

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
/// Reasons a candidate cannot become a venue.
pub enum BuildError {
    /// The record carries no usable primary name.
    #[error("no name resolved")]
    NoNameResolved,
    /// No address could be found for the record's position.
    #[error("address unresolved: {0}")]
    AddressUnresolved(String),
}

/// Resolve the primary, alternate and historical names of a record.
///
/// Alternate and historical names equal to the primary name are cleared.
///
/// # Errors
///
/// Returns [`BuildError::NoNameResolved`] when the primary name is absent or blank.
pub fn resolve_names(tags: &BTreeMap<String, String>) -> Result<VenueNames, BuildError> {
    let name = tags
        .get(NAME_KEY)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .unwrap_or(UNKNOWN_NAME);

    if name == UNKNOWN_NAME {
        return Err(BuildError::NoNameResolved);
    }

    let distinct = |key: &str| {
        tags.get(key)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty() && *value != name)
            .map(str::to_owned)
    };

    Ok(VenueNames {
        alt_name: distinct(ALT_NAME_KEY),
        old_name: distinct(OLD_NAME_KEY),
        name: name.to_owned(),
    })
}

/// Builds venues using a reverse geocoder for addresses.
#[derive(Clone)]
pub struct EntityBuilder {
    geocoder: Arc<dyn ReverseGeocoder>,
}

impl EntityBuilder {
    /// Create a builder bound to the given geocoder.
    #[must_use]
    pub fn new(geocoder: Arc<dyn ReverseGeocoder>) -> Self {
        Self { geocoder }
    }

    /// Convert `record` into a venue without enrichment.
    ///
    /// # Errors
    ///
    /// Returns the first of [`BuildError::NoNameResolved`] and
    /// [`BuildError::AddressUnresolved`] encountered.
    pub async fn build(&self, record: &CandidateRecord) -> Result<Venue, BuildError> {
        let names = resolve_names(&record.tags)?;

        let address = match self.geocoder.lookup(record.location).await {
            Ok(Some(address)) if !address.trim().is_empty() => address,
            Ok(_) => return Err(BuildError::AddressUnresolved("empty lookup result".into())),
            Err(err) => return Err(BuildError::AddressUnresolved(err.to_string())),
        };

        let features = filter_tags(
            record
                .tags
                .iter()
                .map(|(key, value)| (key.as_str(), value.as_str())),
        );

        Ok(Venue {
            name: names.name,
            alt_name: names.alt_name,
            old_name: names.old_name,
            location: record.location,
            address,
            features,
            opening_times: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{MockGeocoder, record};

    fn tags(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect()
    }

    #[test]
    fn alternate_name_equal_to_primary_is_cleared() {
        let names = resolve_names(&tags(&[("name", "The Anchor"), ("alt_name", "The Anchor")]))
            .expect("name present");
        assert_eq!(names.name, "The Anchor");
        assert_eq!(names.alt_name, None);
    }

    #[test]
    fn missing_primary_name_fails() {
        let result = resolve_names(&tags(&[("alt_name", "Old Anchor")]));
        assert_eq!(result, Err(BuildError::NoNameResolved));
    }

    #[test]
    fn blank_or_sentinel_name_fails() {
        assert_eq!(
            resolve_names(&tags(&[("name", "  ")])),
            Err(BuildError::NoNameResolved)
        );
        assert_eq!(
            resolve_names(&tags(&[("name", "unknown")])),
            Err(BuildError::NoNameResolved)
        );
    }

    #[test]
    fn distinct_names_are_kept() {
        let names = resolve_names(&tags(&[
            ("name", "The Anchor"),
            ("alt_name", "Anchor Inn"),
            ("old_name", "The Ship"),
        ]))
        .expect("name present");
        assert_eq!(names.alt_name.as_deref(), Some("Anchor Inn"));
        assert_eq!(names.old_name.as_deref(), Some("The Ship"));
    }

    #[tokio::test]
    async fn builds_venue_with_address_and_features() {
        let geocoder = Arc::new(MockGeocoder::resolving("1 Quay Street, Bristol"));
        let builder = EntityBuilder::new(geocoder.clone());
        let mut candidate = record(7, Some("The Anchor"));
        candidate.tags.insert("food".into(), "yes".into());

        let venue = builder.build(&candidate).await.expect("buildable");

        assert_eq!(venue.name, "The Anchor");
        assert_eq!(venue.address, "1 Quay Street, Bristol");
        assert_eq!(venue.features, vec!["Food"]);
        assert_eq!(venue.location, candidate.location);
        assert_eq!(geocoder.lookups().len(), 1);
    }

    #[tokio::test]
    async fn absent_address_fails() {
        let builder = EntityBuilder::new(Arc::new(MockGeocoder::empty()));
        let result = builder.build(&record(7, Some("The Anchor"))).await;
        assert!(matches!(result, Err(BuildError::AddressUnresolved(_))));
    }

    #[tokio::test]
    async fn name_failure_skips_geocoding() {
        let geocoder = Arc::new(MockGeocoder::resolving("anywhere"));
        let builder = EntityBuilder::new(geocoder.clone());
        let result = builder.build(&record(7, None)).await;
        assert_eq!(result, Err(BuildError::NoNameResolved));
        assert!(geocoder.lookups().is_empty());
    }
}
