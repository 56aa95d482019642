// Entity catalog: the selectable champions, their role tags, and the
// abstract source they are fetched from.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::draft::EntityId;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog request failed: {0}")]
    Request(String),

    #[error("catalog response could not be decoded: {0}")]
    Decode(String),

    #[error("catalog source returned no versions")]
    NoVersions,
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// Lane role tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Top,
    Jungle,
    Mid,
    Bot,
    Support,
}

impl Role {
    pub const ALL: [Role; 5] = [Role::Top, Role::Jungle, Role::Mid, Role::Bot, Role::Support];

    pub fn from_str_role(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "top" => Some(Role::Top),
            "jungle" | "jg" => Some(Role::Jungle),
            "mid" => Some(Role::Mid),
            "bot" | "adc" => Some(Role::Bot),
            "support" | "sup" => Some(Role::Support),
            _ => None,
        }
    }

    pub fn display_str(&self) -> &'static str {
        match self {
            Role::Top => "top",
            Role::Jungle => "jungle",
            Role::Mid => "mid",
            Role::Bot => "bot",
            Role::Support => "support",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

/// A selectable draft unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    /// Numeric key assigned by the data source (e.g. "266").
    pub key: String,
    /// Display names keyed by locale tag (e.g. "en_US", "zh_CN").
    pub names: BTreeMap<String, String>,
    pub roles: BTreeSet<Role>,
}

impl Entity {
    /// Display name for `locale`, falling back to any name and finally to
    /// the identifier.
    pub fn name(&self, locale: &str) -> &str {
        self.names
            .get(locale)
            .or_else(|| self.names.values().next())
            .map(String::as_str)
            .unwrap_or(self.id.as_str())
    }

    fn matches(&self, term: &str) -> bool {
        self.id.as_str().to_lowercase().contains(term)
            || self.names.values().any(|n| n.to_lowercase().contains(term))
    }
}

// ---------------------------------------------------------------------------
// Catalog snapshot
// ---------------------------------------------------------------------------

/// An immutable snapshot of every entity for one data version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    version: String,
    entities: Vec<Entity>,
}

impl Catalog {
    /// Build a snapshot, sorting entities by identifier.
    pub fn new(version: impl Into<String>, mut entities: Vec<Entity>) -> Self {
        entities.sort_by(|a, b| a.id.cmp(&b.id));
        entities.dedup_by(|a, b| a.id == b.id);
        Catalog {
            version: version.into(),
            entities,
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Entity> {
        self.entities
            .binary_search_by(|e| e.id.as_str().cmp(id))
            .ok()
            .map(|idx| &self.entities[idx])
    }

    /// Resolve user input to an entity: exact id first, then a
    /// case-insensitive match on id or any display name.
    pub fn resolve(&self, input: &str) -> Option<&Entity> {
        if let Some(e) = self.get(input) {
            return Some(e);
        }
        let lower = input.to_lowercase();
        self.entities.iter().find(|e| {
            e.id.as_str().to_lowercase() == lower
                || e.names.values().any(|n| n.to_lowercase() == lower)
        })
    }

    /// Case-insensitive substring search over ids and every display name.
    /// An empty term matches everything.
    pub fn search(&self, term: &str) -> Vec<&Entity> {
        let term = term.trim().to_lowercase();
        self.entities.iter().filter(|e| e.matches(&term)).collect()
    }

    pub fn with_role(&self, role: Role) -> Vec<&Entity> {
        self.entities
            .iter()
            .filter(|e| e.roles.contains(&role))
            .collect()
    }

    /// Search narrowed to a role; `None` means any role.
    pub fn filter(&self, term: &str, role: Option<Role>) -> Vec<&Entity> {
        let Some(role) = role else {
            return self.search(term);
        };
        let term = term.trim().to_lowercase();
        self.with_role(role)
            .into_iter()
            .filter(|e| e.matches(&term))
            .collect()
    }

    /// Entities not in `excluded`.
    pub fn available(&self, excluded: &BTreeSet<EntityId>) -> Vec<&Entity> {
        self.entities
            .iter()
            .filter(|e| !excluded.contains(&e.id))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// A read-only source of catalog data, such as a remote CDN.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// The newest data version the source offers.
    async fn latest_version(&self) -> Result<String, CatalogError>;

    /// Every entity of `version`.
    async fn fetch_catalog(&self, version: &str) -> Result<Vec<Entity>, CatalogError>;
}

#[async_trait]
impl<T: CatalogSource + ?Sized> CatalogSource for Arc<T> {
    async fn latest_version(&self) -> Result<String, CatalogError> {
        (**self).latest_version().await
    }

    async fn fetch_catalog(&self, version: &str) -> Result<Vec<Entity>, CatalogError> {
        (**self).fetch_catalog(version).await
    }
}

/// Wraps a source and keeps one snapshot per version.
pub struct CachedCatalog<S> {
    source: S,
    cache: Mutex<HashMap<String, Catalog>>,
}

impl<S: CatalogSource> CachedCatalog<S> {
    pub fn new(source: S) -> Self {
        CachedCatalog {
            source,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch `version`, or reuse the cached snapshot.
    pub async fn get(&self, version: &str) -> Result<Catalog, CatalogError> {
        if let Some(hit) = self.cache.lock().await.get(version) {
            debug!("Catalog cache hit for version {}", version);
            return Ok(hit.clone());
        }
        let entities = self.source.fetch_catalog(version).await?;
        let catalog = Catalog::new(version, entities);
        info!("Loaded catalog version {} ({} entities)", version, catalog.len());
        self.cache
            .lock()
            .await
            .insert(version.to_string(), catalog.clone());
        Ok(catalog)
    }

    /// Resolve the newest version and fetch it.
    pub async fn latest(&self) -> Result<Catalog, CatalogError> {
        let version = self.source.latest_version().await?;
        self.get(&version).await
    }
}
