//! Address geocoding through the MapQuest geocoding API.

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::ProviderError;
use crate::mapquest::{Info, MapQuestConfig};
use crate::model::Coordinate;
use crate::retry::RetryPolicy;
use crate::traits::Geocoder;

const PROVIDER: &str = "mapquest-geocoding";

/// Where MapQuest places addresses it could not resolve: the geographic
/// centre of the contiguous United States.
pub const MAPQUEST_UNRESOLVED: Coordinate = Coordinate::new(39.78373, -100.445882);

const SENTINEL_TOLERANCE: f64 = 1e-5;

/// Region appended to addresses that do not already name it.
pub const DEFAULT_REGION: &str = "Philippines";

#[derive(Debug, Clone)]
pub struct GeocoderConfig {
    pub mapquest: MapQuestConfig,
    /// `None` leaves addresses untouched.
    pub region: Option<String>,
    pub retry: RetryPolicy,
}

impl GeocoderConfig {
    pub fn new(mapquest: MapQuestConfig) -> Self {
        Self {
            mapquest: mapquest.with_timeout_secs(10),
            region: Some(DEFAULT_REGION.to_string()),
            retry: RetryPolicy::geocoding(),
        }
    }

    #[must_use]
    pub fn with_region(mut self, region: Option<String>) -> Self {
        self.region = region;
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[derive(Debug, Clone)]
pub struct MapQuestGeocoder {
    config: GeocoderConfig,
    client: reqwest::blocking::Client,
}

impl MapQuestGeocoder {
    pub fn new(config: GeocoderConfig) -> Result<Self, reqwest::Error> {
        let client = config.mapquest.http_client()?;
        Ok(Self { config, client })
    }

    fn request(&self, location: &str) -> Result<Coordinate, ProviderError> {
        let timeout_secs = self.config.mapquest.timeout_secs;
        let body = self
            .client
            .get(self.config.mapquest.endpoint("geocoding/v1/address"))
            .query(&[
                ("key", self.config.mapquest.api_key.as_str()),
                ("location", location),
                ("maxResults", "1"),
            ])
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json::<GeocodeResponse>())
            .map_err(|err| ProviderError::from_reqwest(PROVIDER, timeout_secs, err))?;

        body.into_coordinate()
    }
}

impl Geocoder for MapQuestGeocoder {
    fn geocode(&self, address: &str) -> Option<Coordinate> {
        let location = qualify_address(address, self.config.region.as_deref());
        debug!(%location, "geocoding");

        match self.config.retry.run("geocode", |_| self.request(&location)) {
            Ok(coordinate) => Some(coordinate),
            Err(err) => {
                warn!(address, error = %err, "could not geocode address");
                None
            }
        }
    }
}

/// Appends `, {region}` unless the address already mentions the region.
pub fn qualify_address(address: &str, region: Option<&str>) -> String {
    match region {
        Some(region)
            if !region.is_empty()
                && !address.to_lowercase().contains(&region.to_lowercase()) =>
        {
            format!("{address}, {region}")
        }
        _ => address.to_string(),
    }
}

/// True when `coordinate` is MapQuest's unresolved placeholder.
pub fn is_unresolved_placeholder(coordinate: Coordinate) -> bool {
    (coordinate.lat - MAPQUEST_UNRESOLVED.lat).abs() < SENTINEL_TOLERANCE
        && (coordinate.lon - MAPQUEST_UNRESOLVED.lon).abs() < SENTINEL_TOLERANCE
}

#[derive(Debug, Deserialize)]
pub(crate) struct GeocodeResponse {
    #[serde(default)]
    info: Info,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    #[serde(default)]
    locations: Vec<GeocodeLocation>,
}

#[derive(Debug, Deserialize)]
struct GeocodeLocation {
    #[serde(rename = "latLng")]
    lat_lng: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

impl GeocodeResponse {
    pub(crate) fn into_coordinate(self) -> Result<Coordinate, ProviderError> {
        self.info.check(PROVIDER)?;

        let location = self
            .results
            .into_iter()
            .next()
            .and_then(|result| result.locations.into_iter().next())
            .ok_or(ProviderError::NoMatch { provider: PROVIDER })?;

        let coordinate = Coordinate::new(location.lat_lng.lat, location.lat_lng.lng);
        if is_unresolved_placeholder(coordinate) {
            return Err(ProviderError::Placeholder { provider: PROVIDER });
        }
        Ok(coordinate)
    }
}
