use super::Engine;

use async_trait::async_trait;

use crate::{
    api::DistanceAPI,
    entities::RouteSummary,
    error::{invalid_input_error, Error},
};

#[async_trait]
impl DistanceAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn measure_distance(
        &self,
        source: String,
        destination: String,
    ) -> Result<RouteSummary, Error> {
        if source.trim().is_empty() || destination.trim().is_empty() {
            return Err(invalid_input_error("Source and destination are required"));
        }

        let (origin, destination) = futures::try_join!(
            self.geoapify.geocode(&source),
            self.geoapify.geocode(&destination)
        )?;

        let route = self.geoapify.route(origin, destination).await?;

        tracing::info!("measured route of {}", route.distance_text());

        Ok(route)
    }
}

#[test]
fn blank_addresses_are_rejected_before_geocoding() {
    use crate::{config::Config, entities::RateTable, external::geoapify::Geoapify};
    use tokio_test::block_on;

    let engine = Engine::new(RateTable::default(), Geoapify::new(&Config::default()));

    let err = block_on(engine.measure_distance("".into(), "Indiranagar".into())).unwrap_err();
    assert!(err.is_invalid_input_error());

    let err = block_on(engine.measure_distance("Koramangala".into(), "  ".into())).unwrap_err();
    assert!(err.is_invalid_input_error());
}
