mod distance_api;
mod fare_api;
mod pricing;

pub use pricing::{region_mode, UnitSource, INTERCITY_THRESHOLD_KM};

#[cfg(test)]
pub(crate) use pricing::FixedDraws;

use crate::{config::Config, entities::RateTable, external::geoapify::Geoapify};

#[derive(Debug)]
pub struct Engine {
    rates: RateTable,
    geoapify: Geoapify,
}

impl Engine {
    #[tracing::instrument(name = "Engine::new", skip_all)]
    pub fn new(rates: RateTable, geoapify: Geoapify) -> Self {
        Self { rates, geoapify }
    }

    #[tracing::instrument(name = "Engine::from_config", skip_all)]
    pub fn from_config(config: &Config) -> Result<Self, crate::error::Error> {
        let rates = match &config.fare_rates_path {
            Some(path) => {
                tracing::info!("loading fare rates from {}", path);
                RateTable::from_path(path)?
            }
            None => {
                tracing::info!("using built-in fare rates");
                RateTable::default()
            }
        };

        Ok(Self::new(rates, Geoapify::new(config)))
    }

    pub fn rates(&self) -> &RateTable {
        &self.rates
    }
}

impl crate::api::API for Engine {}

#[test]
fn engine_falls_back_to_built_in_rates() {
    let engine = Engine::from_config(&Config::default()).unwrap();

    assert_eq!(engine.rates(), &RateTable::default());
}

#[test]
fn engine_refuses_unusable_rate_files() {
    let missing = Config {
        fare_rates_path: Some("/nonexistent/ridewise/rates.json".into()),
        ..Config::default()
    };
    assert!(Engine::from_config(&missing).unwrap_err().is_configuration_error());

    let path = std::env::temp_dir().join(format!("ridewise-rates-{}.json", std::process::id()));
    std::fs::write(&path, r#"{"local": {}, "intercity": {}}"#).unwrap();

    let partial = Config {
        fare_rates_path: Some(path.to_string_lossy().into_owned()),
        ..Config::default()
    };
    let result = Engine::from_config(&partial);
    std::fs::remove_file(&path).ok();

    assert!(result.unwrap_err().is_configuration_error());
}
