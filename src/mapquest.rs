//! MapQuest directions adapter (fallback provider).
//!
//! MapQuest reports distance in kilometres and the road shape as a flat
//! `[lat, lng, lat, lng, ...]` array; both are normalized here.

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::error::ProviderError;
use crate::model::{Coordinate, ProviderKind, RouteCost};
use crate::polyline::Polyline;
use crate::traits::RoutingProvider;

const PROVIDER: &str = "mapquest";

/// Connection settings shared by the MapQuest geocoding and directions
/// clients.
#[derive(Debug, Clone)]
pub struct MapQuestConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

impl MapQuestConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: "http://www.mapquestapi.com".to_string(),
            api_key: api_key.into(),
            timeout_secs: 15,
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    pub(crate) fn http_client(&self) -> Result<reqwest::blocking::Client, reqwest::Error> {
        reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()
    }
}

#[derive(Debug, Clone)]
pub struct MapQuestDirections {
    config: MapQuestConfig,
    client: reqwest::blocking::Client,
}

impl MapQuestDirections {
    pub fn new(config: MapQuestConfig) -> Result<Self, reqwest::Error> {
        let client = config.http_client()?;
        Ok(Self { config, client })
    }
}

impl RoutingProvider for MapQuestDirections {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Fallback
    }

    fn query(&self, from: Coordinate, to: Coordinate) -> Result<RouteCost, ProviderError> {
        let from = format!("{},{}", from.lat, from.lon);
        let to = format!("{},{}", to.lat, to.lon);
        debug!(%from, %to, "requesting MapQuest route");

        let body = self
            .client
            .get(self.config.endpoint("directions/v2/route"))
            .query(&[
                ("key", self.config.api_key.as_str()),
                ("from", from.as_str()),
                ("to", to.as_str()),
                ("unit", "k"),
                ("routeType", "fastest"),
                ("doReverseGeocode", "false"),
                ("fullShape", "true"),
            ])
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json::<DirectionsResponse>())
            .map_err(|err| ProviderError::from_reqwest(PROVIDER, self.config.timeout_secs, err))?;

        body.into_route_cost()
    }
}

/// The `info` block MapQuest attaches to every response.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct Info {
    #[serde(default)]
    pub statuscode: i64,
    #[serde(default)]
    pub messages: Vec<String>,
}

impl Info {
    pub(crate) fn check(&self, provider: &'static str) -> Result<(), ProviderError> {
        if self.statuscode == 0 {
            return Ok(());
        }
        Err(ProviderError::Service {
            provider,
            code: self.statuscode.to_string(),
            message: self.messages.join("; "),
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct DirectionsResponse {
    #[serde(default)]
    info: Info,
    route: Option<DirectionsRoute>,
}

#[derive(Debug, Deserialize)]
struct DirectionsRoute {
    /// Kilometres, because requests ask for `unit=k`.
    distance: Option<f64>,
    /// Seconds.
    time: Option<f64>,
    shape: Option<Shape>,
}

#[derive(Debug, Deserialize)]
struct Shape {
    #[serde(rename = "shapePoints", default)]
    shape_points: Vec<f64>,
}

impl DirectionsResponse {
    pub(crate) fn into_route_cost(self) -> Result<RouteCost, ProviderError> {
        self.info.check(PROVIDER)?;

        let route = self.route.ok_or(ProviderError::NoMatch { provider: PROVIDER })?;
        let (Some(distance_km), Some(time)) = (route.distance, route.time) else {
            return Err(ProviderError::NoMatch { provider: PROVIDER });
        };
        if !distance_km.is_finite() || !time.is_finite() {
            return Err(ProviderError::Decode {
                provider: PROVIDER,
                message: "non-finite route cost".to_string(),
            });
        }

        let geometry = route
            .shape
            .map(|shape| Polyline::from_flat(&shape.shape_points))
            .filter(Polyline::is_drawable);

        Ok(RouteCost::new(time, distance_km * 1000.0, geometry))
    }
}
