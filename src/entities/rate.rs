use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use crate::error::{configuration_error, Error};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionMode {
    Local,
    Intercity,
}

impl RegionMode {
    pub fn is_intercity(&self) -> bool {
        matches!(self, Self::Intercity)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Intercity => "intercity",
        }
    }
}

impl FromStr for RegionMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(Self::Local),
            "intercity" => Ok(Self::Intercity),
            _ => Err(configuration_error(format!("unknown region mode: {}", s))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VehicleCategory {
    TwoWheeler,
    ThreeWheeler,
    FourWheeler,
}

impl VehicleCategory {
    pub const ALL: [VehicleCategory; 3] =
        [Self::TwoWheeler, Self::ThreeWheeler, Self::FourWheeler];

    pub fn name(&self) -> &'static str {
        match self {
            Self::TwoWheeler => "two-wheeler",
            Self::ThreeWheeler => "three-wheeler",
            Self::FourWheeler => "four-wheeler",
        }
    }
}

impl fmt::Display for VehicleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for VehicleCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "two-wheeler" | "bike" => Ok(Self::TwoWheeler),
            "three-wheeler" | "auto" => Ok(Self::ThreeWheeler),
            "four-wheeler" | "cab" => Ok(Self::FourWheeler),
            _ => Err(configuration_error(format!("unknown vehicle category: {}", s))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    Obeer,
    Radipoo,
    Yela,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Self::Obeer, Self::Radipoo, Self::Yela];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Obeer => "obeer",
            Self::Radipoo => "radipoo",
            Self::Yela => "yela",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Provider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "obeer" => Ok(Self::Obeer),
            "radipoo" => Ok(Self::Radipoo),
            "yela" => Ok(Self::Yela),
            _ => Err(configuration_error(format!("unknown provider: {}", s))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RateEntry {
    pub base_fare: f64,
    pub per_km_rate: f64,
}

impl RateEntry {
    pub const fn new(base_fare: f64, per_km_rate: f64) -> Self {
        Self {
            base_fare,
            per_km_rate,
        }
    }

    fn validate(
        &self,
        mode: RegionMode,
        category: VehicleCategory,
        provider: Provider,
    ) -> Result<(), Error> {
        let valid = |v: f64| v.is_finite() && v >= 0.0;

        if !valid(self.base_fare) || !valid(self.per_km_rate) {
            return Err(configuration_error(format!(
                "invalid rate for {}/{}/{}",
                mode.name(),
                category,
                provider
            )));
        }

        // quotes are floored at the base fare and then shown with one decimal
        let tenths = self.base_fare * 10.0;
        if (tenths - tenths.round()).abs() > 1e-9 {
            return Err(configuration_error(format!(
                "base fare for {}/{}/{} must be a whole number of tenths",
                mode.name(),
                category,
                provider
            )));
        }

        Ok(())
    }
}

pub type ProviderRates = BTreeMap<Provider, RateEntry>;
pub type CategoryRates = BTreeMap<VehicleCategory, ProviderRates>;

#[derive(Clone, Debug, PartialEq)]
pub struct RateTable {
    local: CategoryRates,
    intercity: CategoryRates,
}

// keeps every key of a JSON object, repeated ones included
struct RawEntries<T>(Vec<(String, T)>);

impl<'de, T: Deserialize<'de>> Deserialize<'de> for RawEntries<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor<T>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>> Visitor<'de> for EntriesVisitor<T> {
            type Value = RawEntries<T>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of rates")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::new();

                while let Some(entry) = map.next_entry()? {
                    entries.push(entry);
                }

                Ok(RawEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}

type RawModeRates = RawEntries<RawEntries<RateEntry>>;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRateTable {
    local: RawModeRates,
    intercity: RawModeRates,
}

impl RateTable {
    pub fn new(local: CategoryRates, intercity: CategoryRates) -> Result<Self, Error> {
        let table = Self { local, intercity };

        for mode in [RegionMode::Local, RegionMode::Intercity] {
            let categories = table.mode_rates(mode);

            if categories.len() != VehicleCategory::ALL.len() {
                return Err(configuration_error(format!(
                    "{} rates must cover exactly {} categories",
                    mode.name(),
                    VehicleCategory::ALL.len()
                )));
            }

            for category in VehicleCategory::ALL {
                let providers = table.lookup(mode, category)?;

                if providers.len() != Provider::ALL.len() {
                    return Err(configuration_error(format!(
                        "{}/{} rates must cover exactly {} providers",
                        mode.name(),
                        category,
                        Provider::ALL.len()
                    )));
                }

                for provider in Provider::ALL {
                    let entry = providers.get(&provider).ok_or_else(|| {
                        configuration_error(format!(
                            "{}/{} is missing provider {}",
                            mode.name(),
                            category,
                            provider
                        ))
                    })?;

                    entry.validate(mode, category, provider)?;
                }
            }
        }

        Ok(table)
    }

    pub fn from_json(data: &str) -> Result<Self, Error> {
        let raw: RawRateTable = serde_json::from_str(data)?;

        Self::new(parse_mode(raw.local)?, parse_mode(raw.intercity)?)
    }

    #[tracing::instrument]
    pub fn from_path(path: &str) -> Result<Self, Error> {
        let data = std::fs::read_to_string(path)?;

        Self::from_json(&data)
    }

    pub fn lookup(
        &self,
        mode: RegionMode,
        category: VehicleCategory,
    ) -> Result<&ProviderRates, Error> {
        self.mode_rates(mode).get(&category).ok_or_else(|| {
            configuration_error(format!("no {} rates for {}", mode.name(), category))
        })
    }

    fn mode_rates(&self, mode: RegionMode) -> &CategoryRates {
        match mode {
            RegionMode::Local => &self.local,
            RegionMode::Intercity => &self.intercity,
        }
    }
}

fn parse_mode(raw: RawModeRates) -> Result<CategoryRates, Error> {
    let mut categories = CategoryRates::new();

    for (category_name, RawEntries(raw_providers)) in raw.0 {
        let category: VehicleCategory = category_name.parse()?;
        let mut providers = ProviderRates::new();

        for (provider_name, entry) in raw_providers {
            let provider: Provider = provider_name.parse()?;

            if providers.insert(provider, entry).is_some() {
                return Err(configuration_error(format!(
                    "duplicate rates for {}/{}",
                    category, provider
                )));
            }
        }

        if categories.insert(category, providers).is_some() {
            return Err(configuration_error(format!(
                "duplicate rates for category {}",
                category
            )));
        }
    }

    Ok(categories)
}

fn rates(entries: [(VehicleCategory, [RateEntry; 3]); 3]) -> CategoryRates {
    entries
        .into_iter()
        .map(|(category, per_provider)| {
            let providers = Provider::ALL.into_iter().zip(per_provider).collect();
            (category, providers)
        })
        .collect()
}

impl Default for RateTable {
    fn default() -> Self {
        use VehicleCategory::*;

        // obeer, radipoo, yela
        let local = rates([
            (
                TwoWheeler,
                [
                    RateEntry::new(10.0, 4.8),
                    RateEntry::new(10.0, 5.0),
                    RateEntry::new(10.0, 5.2),
                ],
            ),
            (
                ThreeWheeler,
                [
                    RateEntry::new(20.0, 9.5),
                    RateEntry::new(20.0, 10.0),
                    RateEntry::new(20.0, 10.5),
                ],
            ),
            (
                FourWheeler,
                [
                    RateEntry::new(30.0, 14.5),
                    RateEntry::new(30.0, 15.0),
                    RateEntry::new(30.0, 15.5),
                ],
            ),
        ]);

        let intercity = rates([
            (
                TwoWheeler,
                [
                    RateEntry::new(10.0, 4.2),
                    RateEntry::new(10.0, 4.5),
                    RateEntry::new(10.0, 4.8),
                ],
            ),
            (
                ThreeWheeler,
                [
                    RateEntry::new(20.0, 8.5),
                    RateEntry::new(20.0, 9.0),
                    RateEntry::new(20.0, 9.5),
                ],
            ),
            (
                FourWheeler,
                [
                    RateEntry::new(30.0, 12.5),
                    RateEntry::new(30.0, 13.0),
                    RateEntry::new(30.0, 13.5),
                ],
            ),
        ]);

        Self { local, intercity }
    }
}

#[test]
fn default_table_is_complete() {
    let table = RateTable::default();

    let checked = RateTable::new(table.local.clone(), table.intercity.clone()).unwrap();
    assert_eq!(checked, table);

    let cab = table.lookup(RegionMode::Local, VehicleCategory::FourWheeler).unwrap();
    assert_eq!(cab.get(&Provider::Radipoo), Some(&RateEntry::new(30.0, 15.0)));

    let bike = table.lookup(RegionMode::Intercity, VehicleCategory::TwoWheeler).unwrap();
    assert_eq!(bike.keys().copied().collect::<Vec<_>>(), Provider::ALL.to_vec());
}

#[test]
fn missing_provider_is_a_configuration_error() {
    let table = RateTable::default();
    let mut intercity = table.intercity.clone();
    intercity
        .get_mut(&VehicleCategory::ThreeWheeler)
        .unwrap()
        .remove(&Provider::Yela);

    let err = RateTable::new(table.local.clone(), intercity).unwrap_err();
    assert!(err.is_configuration_error());
}

#[test]
fn missing_category_is_a_configuration_error() {
    let table = RateTable::default();
    let mut local = table.local.clone();
    local.remove(&VehicleCategory::TwoWheeler);

    let err = RateTable::new(local, table.intercity.clone()).unwrap_err();
    assert!(err.is_configuration_error());
}

#[test]
fn invalid_rates_are_rejected() {
    let table = RateTable::default();

    let mut negative = table.local.clone();
    negative
        .get_mut(&VehicleCategory::FourWheeler)
        .unwrap()
        .insert(Provider::Obeer, RateEntry::new(30.0, -1.0));
    assert!(RateTable::new(negative, table.intercity.clone())
        .unwrap_err()
        .is_configuration_error());

    let mut fractional = table.local.clone();
    fractional
        .get_mut(&VehicleCategory::FourWheeler)
        .unwrap()
        .insert(Provider::Obeer, RateEntry::new(30.25, 14.5));
    assert!(RateTable::new(fractional, table.intercity.clone())
        .unwrap_err()
        .is_configuration_error());
}

#[test]
fn unknown_names_are_configuration_errors() {
    assert!("scooter".parse::<VehicleCategory>().unwrap_err().is_configuration_error());
    assert!("uber".parse::<Provider>().unwrap_err().is_configuration_error());
    assert!("regional".parse::<RegionMode>().unwrap_err().is_configuration_error());

    assert_eq!("cab".parse::<VehicleCategory>().unwrap(), VehicleCategory::FourWheeler);
    assert_eq!("intercity".parse::<RegionMode>().unwrap(), RegionMode::Intercity);
}

#[test]
fn table_loads_from_json_with_aliases() {
    let provider_rates = |base: f64, per_km: f64| {
        serde_json::json!({
            "obeer": { "base_fare": base, "per_km_rate": per_km },
            "radipoo": { "base_fare": base, "per_km_rate": per_km },
            "yela": { "base_fare": base, "per_km_rate": per_km },
        })
    };

    let data = serde_json::json!({
        "local": {
            "bike": provider_rates(10.0, 5.0),
            "auto": provider_rates(20.0, 10.0),
            "four-wheeler": provider_rates(30.0, 12.0),
        },
        "intercity": {
            "two-wheeler": provider_rates(10.0, 4.0),
            "three-wheeler": provider_rates(20.0, 9.0),
            "cab": provider_rates(30.0, 11.0),
        },
    });

    let table = RateTable::from_json(&data.to_string()).unwrap();
    let cab = table.lookup(RegionMode::Local, VehicleCategory::FourWheeler).unwrap();
    assert_eq!(cab.get(&Provider::Yela), Some(&RateEntry::new(30.0, 12.0)));

    // "cab" and "four-wheeler" name the same category
    let duplicated = data.to_string().replace("\"auto\"", "\"cab\"");
    assert!(RateTable::from_json(&duplicated).unwrap_err().is_configuration_error());

    assert!(RateTable::from_json("{\"local\": {}}").unwrap_err().is_configuration_error());
}

#[test]
fn repeated_or_unexpected_keys_are_rejected() {
    let entry = r#"{ "base_fare": 10.0, "per_km_rate": 5.0 }"#;
    let full = format!(r#"{{ "obeer": {e}, "radipoo": {e}, "yela": {e} }}"#, e = entry);
    let mode = format!(r#"{{ "bike": {p}, "auto": {p}, "cab": {p} }}"#, p = full);

    let valid = format!(r#"{{ "local": {m}, "intercity": {m} }}"#, m = mode);
    assert!(RateTable::from_json(&valid).is_ok());

    // the second yela entry must not silently replace the first
    let repeated = full.replace("\"radipoo\"", "\"yela\"");
    let mode_with_repeat = format!(
        r#"{{ "bike": {p}, "auto": {p}, "cab": {r} }}"#,
        p = full,
        r = repeated
    );
    let data = format!(
        r#"{{ "local": {m}, "intercity": {r} }}"#,
        m = mode,
        r = mode_with_repeat
    );
    let err = RateTable::from_json(&data).unwrap_err();
    assert!(err.is_configuration_error());
    assert!(err.message.contains("duplicate"));

    let extra_mode = format!(
        r#"{{ "local": {m}, "intercity": {m}, "regional": {m} }}"#,
        m = mode
    );
    assert!(RateTable::from_json(&extra_mode).unwrap_err().is_configuration_error());

    let extra_field = valid.replacen(
        "\"per_km_rate\": 5.0",
        "\"per_km_rate\": 5.0, \"surge\": 2.0",
        1,
    );
    assert!(RateTable::from_json(&extra_field).unwrap_err().is_configuration_error());
}
