//! OSRM HTTP adapter for point-to-point route costs (primary provider).

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::ProviderError;
use crate::model::{Coordinate, ProviderKind, RouteCost};
use crate::polyline::{POLYLINE_PRECISION, Polyline};
use crate::traits::RoutingProvider;

const PROVIDER: &str = "osrm";

#[derive(Debug, Clone)]
pub struct OsrmConfig {
    pub base_url: String,
    pub profile: String,
    pub timeout_secs: u64,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://router.project-osrm.org".to_string(),
            profile: "driving".to_string(),
            timeout_secs: 15,
        }
    }
}

impl OsrmConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::blocking::Client,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    /// `{base}/route/v1/{profile}/{lon},{lat};{lon},{lat}` with full geometry.
    fn route_url(&self, from: Coordinate, to: Coordinate) -> String {
        format!(
            "{}/route/v1/{}/{},{};{},{}?overview=full&geometries=polyline&steps=false&alternatives=false",
            self.config.base_url.trim_end_matches('/'),
            self.config.profile,
            from.lon,
            from.lat,
            to.lon,
            to.lat
        )
    }
}

impl RoutingProvider for OsrmClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Primary
    }

    fn query(&self, from: Coordinate, to: Coordinate) -> Result<RouteCost, ProviderError> {
        let url = self.route_url(from, to);
        debug!(%url, "requesting OSRM route");

        let body = self
            .client
            .get(&url)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json::<OsrmRouteResponse>())
            .map_err(|err| ProviderError::from_reqwest(PROVIDER, self.config.timeout_secs, err))?;

        body.into_route_cost()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct OsrmRouteResponse {
    code: String,
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    duration: f64,
    distance: f64,
    geometry: Option<String>,
}

impl OsrmRouteResponse {
    fn is_ok(&self) -> bool {
        self.code == "Ok"
    }

    /// Takes the first route; an undecodable or empty geometry keeps the
    /// cost and drops the path.
    pub(crate) fn into_route_cost(self) -> Result<RouteCost, ProviderError> {
        if !self.is_ok() {
            return Err(ProviderError::Service {
                provider: PROVIDER,
                code: self.code,
                message: self.message.unwrap_or_default(),
            });
        }

        let route = self
            .routes
            .into_iter()
            .next()
            .ok_or(ProviderError::NoMatch { provider: PROVIDER })?;

        if !route.duration.is_finite() || !route.distance.is_finite() {
            return Err(ProviderError::Decode {
                provider: PROVIDER,
                message: "non-finite route cost".to_string(),
            });
        }

        let geometry = match route.geometry.as_deref() {
            Some(encoded) => match Polyline::decode(encoded, POLYLINE_PRECISION) {
                Ok(polyline) if polyline.is_drawable() => Some(polyline),
                Ok(_) => None,
                Err(err) => {
                    warn!(error = %err, "discarding undecodable OSRM geometry");
                    None
                }
            },
            None => None,
        };

        Ok(RouteCost::new(route.duration, route.distance, geometry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> OsrmRouteResponse {
        serde_json::from_str(json).expect("should deserialize")
    }

    #[test]
    fn route_url_puts_longitude_first() {
        let client = OsrmClient::new(OsrmConfig::new("http://localhost:5000/")).expect("client");
        let url = client.route_url(Coordinate::new(14.5, 121.0), Coordinate::new(14.6, 121.1));
        assert_eq!(
            url,
            "http://localhost:5000/route/v1/driving/121,14.5;121.1,14.6?overview=full&geometries=polyline&steps=false&alternatives=false"
        );
    }

    #[test]
    fn decodes_successful_route() {
        let cost = parse(
            r#"{
                "code": "Ok",
                "routes": [{"duration": 812.4, "distance": 6120.5, "geometry": "_p~iF~ps|U_ulLnnqC"}],
                "waypoints": []
            }"#,
        )
        .into_route_cost()
        .expect("ok route");

        assert_eq!(cost.duration_seconds, 812.4);
        assert_eq!(cost.distance_meters, 6120.5);
        let geometry = cost.geometry.expect("geometry");
        assert_eq!(geometry.points(), &[(38.5, -120.2), (40.7, -120.95)][..]);
    }

    #[test]
    fn error_code_is_service_error() {
        let err = parse(r#"{"code": "NoRoute", "message": "Impossible route between points"}"#)
            .into_route_cost()
            .expect_err("should fail");
        match err {
            ProviderError::Service { code, message, .. } => {
                assert_eq!(code, "NoRoute");
                assert_eq!(message, "Impossible route between points");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn ok_without_routes_is_no_match() {
        let err = parse(r#"{"code": "Ok", "routes": []}"#)
            .into_route_cost()
            .expect_err("should fail");
        assert!(matches!(err, ProviderError::NoMatch { .. }));
    }

    #[test]
    fn overflowing_geometry_degrades_edge() {
        let geometry = ("~".repeat(12) + "F").repeat(6);
        let json = format!(
            r#"{{"code": "Ok", "routes": [{{"duration": 60.0, "distance": 500.0, "geometry": "{geometry}"}}]}}"#
        );
        let cost = parse(&json).into_route_cost().expect("cost survives");
        assert_eq!(cost.duration_seconds, 60.0);
        assert!(cost.geometry.is_none());
    }

    #[test]
    fn bad_geometry_degrades_edge() {
        let cost = parse(r#"{"code": "Ok", "routes": [{"duration": 60.0, "distance": 500.0, "geometry": "_p~"}]}"#)
            .into_route_cost()
            .expect("cost survives");
        assert_eq!(cost.distance_meters, 500.0);
        assert!(cost.geometry.is_none());
    }
}
