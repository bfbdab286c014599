//! services/api/src/adapters/countries.rs
//!
//! This module contains the adapter for the REST Countries public API.
//! It implements the `CountryDirectory` port from the core crate.

use std::collections::BTreeMap;

use async_trait::async_trait;
use globe_explorer_core::domain::Country;
use globe_explorer_core::ports::{CountryDirectory, PortError, PortResult};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use tracing::error;

/// Public REST Countries endpoint.
pub const DEFAULT_BASE_URL: &str = "https://restcountries.com/v3.1";

/// Fields requested from `/all`; the endpoint refuses unfiltered requests.
const LIST_FIELDS: &str = "cca3,name,flag,flags,population,region,subregion,capital,languages";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `CountryDirectory` port using REST Countries v3.1.
#[derive(Clone)]
pub struct RestCountriesAdapter {
    client: Client,
    base_url: String,
}

impl RestCountriesAdapter {
    /// Creates a new `RestCountriesAdapter` for e.g. `https://restcountries.com/v3.1`.
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Creates an adapter for the public endpoint.
    pub fn public(client: Client) -> Self {
        Self::new(client, DEFAULT_BASE_URL)
    }

    fn url(&self, segments: &[&str]) -> PortResult<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| PortError::Unexpected(format!("Invalid country API URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| PortError::Unexpected("Country API URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Fetches a list of countries. `None` means the API answered 404.
    async fn fetch(&self, url: Url) -> PortResult<Option<Vec<Country>>> {
        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            error!("Country API request to {} failed: {}", url, e);
            PortError::Unexpected(e.to_string())
        })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let records = response
                    .json::<Vec<CountryRecord>>()
                    .await
                    .map_err(|e| PortError::Unexpected(format!("Malformed country data: {e}")))?;
                Ok(Some(records.into_iter().map(CountryRecord::to_domain).collect()))
            }
            status => Err(PortError::Unexpected(format!(
                "Country API answered {status} for {url}"
            ))),
        }
    }
}

//=========================================================================================
// Wire Records
//=========================================================================================

#[derive(Deserialize)]
struct NameRecord {
    common: String,
    #[serde(default)]
    official: String,
}

#[derive(Deserialize, Default)]
struct FlagsRecord {
    png: Option<String>,
    svg: Option<String>,
}

#[derive(Deserialize)]
struct CountryRecord {
    cca3: String,
    name: NameRecord,
    #[serde(default)]
    flag: Option<String>,
    #[serde(default)]
    flags: FlagsRecord,
    #[serde(default)]
    population: u64,
    #[serde(default)]
    region: String,
    #[serde(default)]
    subregion: Option<String>,
    #[serde(default)]
    capital: Vec<String>,
    #[serde(default)]
    languages: BTreeMap<String, String>,
}

impl CountryRecord {
    fn to_domain(self) -> Country {
        Country {
            code: self.cca3,
            common_name: self.name.common,
            official_name: self.name.official,
            flag: self.flag,
            flag_url: self.flags.svg.or(self.flags.png),
            population: self.population,
            region: self.region,
            subregion: self.subregion,
            capitals: self.capital,
            languages: self.languages.into_values().collect(),
        }
    }
}

//=========================================================================================
// `CountryDirectory` Trait Implementation
//=========================================================================================

#[async_trait]
impl CountryDirectory for RestCountriesAdapter {
    async fn all(&self) -> PortResult<Vec<Country>> {
        let mut url = self.url(&["all"])?;
        url.query_pairs_mut().append_pair("fields", LIST_FIELDS);
        Ok(self.fetch(url).await?.unwrap_or_default())
    }

    async fn by_code(&self, code: &str) -> PortResult<Country> {
        let url = self.url(&["alpha", code])?;
        self.fetch(url)
            .await?
            .and_then(|countries| countries.into_iter().next())
            .ok_or_else(|| PortError::NotFound(format!("Country {} not found", code)))
    }

    async fn search_by_name(&self, name: &str) -> PortResult<Vec<Country>> {
        let url = self.url(&["name", name])?;
        Ok(self.fetch(url).await?.unwrap_or_default())
    }

    async fn by_region(&self, region: &str) -> PortResult<Vec<Country>> {
        let url = self.url(&["region", region])?;
        Ok(self.fetch(url).await?.unwrap_or_default())
    }
}
