use async_trait::async_trait;

use crate::engine::UnitSource;
use crate::entities::{FareEstimate, PricingContext, RouteSummary};
use crate::error::Error;

pub trait FareAPI {
    fn estimate_fares(
        &self,
        distance_km: f64,
        context: PricingContext,
        source: &mut dyn UnitSource,
    ) -> Result<FareEstimate, Error>;
}

#[async_trait]
pub trait DistanceAPI {
    async fn measure_distance(&self, source: String, destination: String)
        -> Result<RouteSummary, Error>;
}

pub trait API: FareAPI + DistanceAPI {}
