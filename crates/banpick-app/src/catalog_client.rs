// Data Dragon catalog client.
//
// Reads the version list and the per-locale champion tables from the public
// CDN, merges the locales into one entity per champion and tags each with the
// lane roles from roles.toml.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, warn};

use banpick_core::catalog::{CatalogError, CatalogSource, Entity, Role};
use banpick_core::config::CatalogConfig;
use banpick_core::draft::EntityId;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChampionFile {
    data: HashMap<String, ChampionEntry>,
}

#[derive(Debug, Deserialize)]
struct ChampionEntry {
    id: String,
    key: String,
    name: String,
}

// ---------------------------------------------------------------------------
// DataDragonClient
// ---------------------------------------------------------------------------

pub struct DataDragonClient {
    http: reqwest::Client,
    base_url: String,
    locales: Vec<String>,
    roles: HashMap<String, BTreeSet<Role>>,
}

impl DataDragonClient {
    pub fn new(
        config: &CatalogConfig,
        roles: HashMap<String, BTreeSet<Role>>,
    ) -> Result<Self, CatalogError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| CatalogError::Request(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            locales: config.locales.clone(),
            roles,
        })
    }

    fn versions_url(&self) -> String {
        format!("{}/api/versions.json", self.base_url)
    }

    fn champions_url(&self, version: &str, locale: &str) -> String {
        format!("{}/cdn/{version}/data/{locale}/champion.json", self.base_url)
    }

    async fn get_text(&self, url: &str) -> Result<String, CatalogError> {
        debug!("GET {}", url);
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| CatalogError::Request(format!("{url}: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Request(format!("{url}: HTTP {status}")));
        }
        response
            .text()
            .await
            .map_err(|e| CatalogError::Request(format!("{url}: {e}")))
    }
}

#[async_trait]
impl CatalogSource for DataDragonClient {
    async fn latest_version(&self) -> Result<String, CatalogError> {
        let body = self.get_text(&self.versions_url()).await?;
        let version = parse_latest_version(&body)?;
        info!("Latest catalog version is {}", version);
        Ok(version)
    }

    async fn fetch_catalog(&self, version: &str) -> Result<Vec<Entity>, CatalogError> {
        let mut tables = Vec::with_capacity(self.locales.len());
        for (idx, locale) in self.locales.iter().enumerate() {
            let result = match self.get_text(&self.champions_url(version, locale)).await {
                Ok(body) => parse_champion_file(&body),
                Err(e) => Err(e),
            };
            match result {
                Ok(table) => tables.push((locale.clone(), table)),
                // The display locale is required; the rest only add names.
                Err(e) if idx == 0 => return Err(e),
                Err(e) => warn!("Skipping locale {} for version {}: {}", locale, version, e),
            }
        }
        Ok(merge_locales(tables, &self.roles))
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// The version list is newest-first.
fn parse_latest_version(body: &str) -> Result<String, CatalogError> {
    let versions: Vec<String> =
        serde_json::from_str(body).map_err(|e| CatalogError::Decode(e.to_string()))?;
    versions.into_iter().next().ok_or(CatalogError::NoVersions)
}

fn parse_champion_file(body: &str) -> Result<Vec<ChampionEntry>, CatalogError> {
    let file: ChampionFile =
        serde_json::from_str(body).map_err(|e| CatalogError::Decode(e.to_string()))?;
    Ok(file.data.into_values().collect())
}

/// Combine per-locale tables into entities. The first table decides which
/// entities exist; later tables only contribute names.
fn merge_locales(
    tables: Vec<(String, Vec<ChampionEntry>)>,
    roles: &HashMap<String, BTreeSet<Role>>,
) -> Vec<Entity> {
    let mut merged: BTreeMap<String, Entity> = BTreeMap::new();
    for (idx, (locale, entries)) in tables.into_iter().enumerate() {
        for entry in entries {
            if idx == 0 {
                let roles = roles.get(&entry.id).cloned().unwrap_or_default();
                merged.insert(
                    entry.id.clone(),
                    Entity {
                        id: EntityId::new(entry.id),
                        key: entry.key,
                        names: BTreeMap::from([(locale.clone(), entry.name)]),
                        roles,
                    },
                );
            } else if let Some(entity) = merged.get_mut(&entry.id) {
                entity.names.insert(locale.clone(), entry.name);
            }
        }
    }
    merged.into_values().collect()
}
