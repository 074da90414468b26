use axum::extract::{Extension, Json, Query};
use chrono::Local;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::entities::{CategoryQuotes, FareEstimate, PricingContext, Provider, Quote};
use crate::error::{invalid_input_error, Error};
use crate::server::DynAPI;

#[derive(Serialize, Deserialize)]
pub struct EstimateParams {
    distance: Option<String>,
}

#[derive(Serialize)]
pub struct FareResponse {
    estimates: Estimates,
    intercity: bool,
}

pub struct Estimates(Vec<CategoryQuotes>);

#[derive(Serialize)]
struct QuoteEntry {
    service: Provider,
    fare: String,
    intercity: bool,
}

impl From<&Quote> for QuoteEntry {
    fn from(quote: &Quote) -> Self {
        Self {
            service: quote.provider,
            fare: format!("{:.1}", quote.fare),
            intercity: quote.region_mode.is_intercity(),
        }
    }
}

impl Serialize for Estimates {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;

        for category in &self.0 {
            let entries: Vec<QuoteEntry> =
                category.quotes.iter().map(QuoteEntry::from).collect();
            map.serialize_entry(category.category.name(), &entries)?;
        }

        map.end()
    }
}

impl From<FareEstimate> for FareResponse {
    fn from(estimate: FareEstimate) -> Self {
        Self {
            intercity: estimate.region_mode.is_intercity(),
            estimates: Estimates(estimate.categories),
        }
    }
}

fn parse_distance(params: EstimateParams) -> Result<f64, Error> {
    let distance = params
        .distance
        .filter(|distance| !distance.trim().is_empty())
        .ok_or_else(|| invalid_input_error("Distance is required"))?;

    distance
        .trim()
        .parse()
        .map_err(|_| invalid_input_error("Invalid distance value"))
}

pub async fn estimate(
    Extension(api): Extension<DynAPI>,
    Query(params): Query<EstimateParams>,
) -> Result<Json<FareResponse>, Error> {
    let distance_km = parse_distance(params)?;
    let context = PricingContext::at(&Local::now());

    let estimate = api.estimate_fares(distance_km, context, &mut rand::thread_rng())?;

    Ok(FareResponse::from(estimate).into())
}

#[cfg(test)]
fn fare_request(uri: &str) -> (axum::http::StatusCode, serde_json::Value) {
    use crate::{
        config::Config, engine::Engine, entities::RateTable, external::geoapify::Geoapify,
        server::router,
    };
    use axum::{body::Body, http::Request};
    use std::sync::Arc;
    use tokio_test::block_on;
    use tower::ServiceExt;

    let engine = Engine::new(RateTable::default(), Geoapify::new(&Config::default()));
    let app = router(Arc::new(engine) as DynAPI);

    block_on(async {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let body = hyper::body::to_bytes(response.into_body()).await.unwrap();

        (status, serde_json::from_slice(&body).unwrap())
    })
}

#[test]
fn fare_response_lists_categories_in_order() {
    use axum::http::StatusCode;

    let (status, body) = fare_request("/api/fare?distance=10");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["intercity"], false);

    let estimates = body["estimates"].as_object().unwrap();
    assert_eq!(estimates.len(), 3);

    for category in ["two-wheeler", "three-wheeler", "four-wheeler"] {
        let quotes = estimates[category].as_array().unwrap();
        let services: Vec<_> = quotes
            .iter()
            .map(|q| q["service"].as_str().unwrap())
            .collect();
        assert_eq!(services, vec!["obeer", "radipoo", "yela"]);

        for quote in quotes {
            let fare = quote["fare"].as_str().unwrap();
            assert_eq!(fare.split('.').nth(1).map(str::len), Some(1));
            assert!(fare.parse::<f64>().unwrap() >= 10.0);
            assert_eq!(quote["intercity"], false);
        }
    }
}

#[test]
fn long_trips_are_quoted_as_intercity() {
    let (_, body) = fare_request("/api/fare?distance=120.5");

    assert_eq!(body["intercity"], true);
    assert_eq!(body["estimates"]["four-wheeler"][0]["intercity"], true);
}

#[test]
fn distance_errors_match_the_public_contract() {
    use axum::http::StatusCode;

    let (status, body) = fare_request("/api/fare");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Distance is required");

    let (status, body) = fare_request("/api/fare?distance=");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Distance is required");

    for bad in ["abc", "-1", "NaN", "inf"] {
        let (status, body) = fare_request(&format!("/api/fare?distance={}", bad));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid distance value");
    }
}
