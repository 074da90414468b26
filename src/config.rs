use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use crate::error::{configuration_error, Error};

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub geoapify_api_base: String,
    pub geoapify_api_key: Option<String>,
    pub fare_rates_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 5000,
            geoapify_api_base: "api.geoapify.com".into(),
            geoapify_api_key: None,
            fare_rates_path: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, Error> {
        dotenv::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let host = match non_empty("HOST") {
            Some(host) => host
                .parse()
                .map_err(|_| configuration_error(format!("invalid HOST: {}", host)))?,
            None => defaults.host,
        };

        let port = match non_empty("PORT") {
            Some(port) => port
                .parse()
                .map_err(|_| configuration_error(format!("invalid PORT: {}", port)))?,
            None => defaults.port,
        };

        Ok(Self {
            host,
            port,
            geoapify_api_base: non_empty("GEOAPIFY_API_BASE").unwrap_or(defaults.geoapify_api_base),
            geoapify_api_key: non_empty("GEOAPIFY_API_KEY"),
            fare_rates_path: non_empty("FARE_RATES_PATH"),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[test]
fn empty_environment_uses_defaults() {
    let config = Config::from_lookup(|_| None).unwrap();

    assert_eq!(config, Config::default());
    assert_eq!(config.addr().to_string(), "127.0.0.1:5000");
}

#[test]
fn environment_overrides_defaults() {
    let config = Config::from_lookup(|key| match key {
        "HOST" => Some("0.0.0.0".into()),
        "PORT" => Some("8080".into()),
        "GEOAPIFY_API_KEY" => Some("secret".into()),
        "FARE_RATES_PATH" => Some("".into()),
        _ => None,
    })
    .unwrap();

    assert_eq!(config.addr().to_string(), "0.0.0.0:8080");
    assert_eq!(config.geoapify_api_key.as_deref(), Some("secret"));
    assert_eq!(config.fare_rates_path, None);
}

#[test]
fn malformed_port_is_a_configuration_error() {
    let err = Config::from_lookup(|key| match key {
        "PORT" => Some("fifty".into()),
        _ => None,
    })
    .unwrap_err();

    assert!(err.is_configuration_error());
}
