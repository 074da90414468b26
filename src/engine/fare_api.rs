use super::pricing::{price, region_mode};
use super::{Engine, UnitSource};

use crate::{
    api::FareAPI,
    entities::{CategoryQuotes, FareEstimate, PricingContext, Quote, VehicleCategory},
    error::{invalid_input_error, Error},
};

impl FareAPI for Engine {
    #[tracing::instrument(skip(self, source))]
    fn estimate_fares(
        &self,
        distance_km: f64,
        context: PricingContext,
        source: &mut dyn UnitSource,
    ) -> Result<FareEstimate, Error> {
        if !distance_km.is_finite() || distance_km < 0.0 {
            return Err(invalid_input_error("Invalid distance value"));
        }

        context.validate()?;

        let region_mode = region_mode(distance_km);
        let mut categories = Vec::with_capacity(VehicleCategory::ALL.len());

        for category in VehicleCategory::ALL {
            let quotes = self
                .rates
                .lookup(region_mode, category)?
                .iter()
                .map(|(provider, entry)| Quote {
                    provider: *provider,
                    fare: price(entry, distance_km, &context, &mut *source),
                    region_mode,
                })
                .collect();

            categories.push(CategoryQuotes { category, quotes });
        }

        tracing::debug!("priced {} categories as {}", categories.len(), region_mode.name());

        Ok(FareEstimate {
            region_mode,
            categories,
        })
    }
}

#[cfg(test)]
fn test_engine() -> Engine {
    use crate::{config::Config, entities::RateTable, external::geoapify::Geoapify};

    Engine::new(RateTable::default(), Geoapify::new(&Config::default()))
}

#[test]
fn every_category_gets_every_provider() {
    use crate::entities::{Provider, RegionMode};

    let engine = test_engine();
    let mut rng = rand::thread_rng();

    for distance in [0.0, 3.5, 50.0, 50.01, 420.0] {
        let estimate = engine
            .estimate_fares(distance, PricingContext::new(12, 3), &mut rng)
            .unwrap();

        let categories: Vec<_> = estimate.categories.iter().map(|c| c.category).collect();
        assert_eq!(categories, VehicleCategory::ALL.to_vec());

        for category in &estimate.categories {
            let rates = engine
                .rates()
                .lookup(estimate.region_mode, category.category)
                .unwrap();
            let providers: Vec<_> = category.quotes.iter().map(|q| q.provider).collect();
            assert_eq!(providers, Provider::ALL.to_vec());

            for quote in &category.quotes {
                assert!(quote.fare >= rates[&quote.provider].base_fare);
                assert_eq!(quote.region_mode, estimate.region_mode);
            }
        }

        let expected_mode = if distance > 50.0 {
            RegionMode::Intercity
        } else {
            RegionMode::Local
        };
        assert_eq!(estimate.region_mode, expected_mode);
    }
}

#[test]
fn intercity_distances_use_intercity_rates() {
    use crate::engine::FixedDraws;
    use crate::entities::{Provider, RegionMode};

    let engine = test_engine();

    // midpoint draws: spread 1.0, noise 0.0
    let local = engine
        .estimate_fares(50.0, PricingContext::new(12, 3), &mut FixedDraws::constant(0.5))
        .unwrap();
    assert_eq!(local.region_mode, RegionMode::Local);
    let cab = local.quotes_for(VehicleCategory::FourWheeler).unwrap();
    assert_eq!(cab[0].provider, Provider::Obeer);
    assert_eq!(cab[0].fare, 755.0);

    let intercity = engine
        .estimate_fares(100.0, PricingContext::new(12, 3), &mut FixedDraws::constant(0.5))
        .unwrap();
    assert_eq!(intercity.region_mode, RegionMode::Intercity);
    let cab = intercity.quotes_for(VehicleCategory::FourWheeler).unwrap();
    assert_eq!(cab[2].provider, Provider::Yela);
    assert_eq!(cab[2].fare, 1380.0);
}

#[test]
fn invalid_inputs_are_rejected() {
    let engine = test_engine();
    let mut rng = rand::thread_rng();
    let context = PricingContext::new(3, 2);

    for distance in [-1.0, f64::NAN, f64::INFINITY] {
        let err = engine.estimate_fares(distance, context, &mut rng).unwrap_err();
        assert!(err.is_invalid_input_error());
        assert_eq!(err.message, "Invalid distance value");
    }

    let err = engine
        .estimate_fares(10.0, PricingContext::new(24, 2), &mut rng)
        .unwrap_err();
    assert!(err.is_invalid_input_error());

    let err = engine
        .estimate_fares(10.0, PricingContext::new(3, 7), &mut rng)
        .unwrap_err();
    assert!(err.is_invalid_input_error());
}

#[test]
fn structure_is_stable_across_calls() {
    let engine = test_engine();
    let mut rng = rand::thread_rng();
    let context = PricingContext::new(18, 5);

    let keys = |estimate: &FareEstimate| {
        estimate
            .categories
            .iter()
            .flat_map(|c| c.quotes.iter().map(move |q| (c.category, q.provider)))
            .collect::<Vec<_>>()
    };

    let first = engine.estimate_fares(12.0, context, &mut rng).unwrap();
    let second = engine.estimate_fares(12.0, context, &mut rng).unwrap();

    assert_eq!(keys(&first), keys(&second));
    assert_eq!(keys(&first).len(), 9);
}
