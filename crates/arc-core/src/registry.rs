// ── Resource registry ──
//
// Owns one `Resource` per resource name, all sharing a single RPC client.
// Cheaply cloneable; clones share the same caches.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::Serialize;
use strum::IntoEnumIterator;
use tracing::{info, warn};

use arc_api::RpcClient;

use crate::ask::AskStatus;
use crate::config::ClientConfig;
use crate::error::CoreError;
use crate::model::{ResourceInfo, ResourceName};
use crate::resource::Resource;

// ── Builder ──────────────────────────────────────────────────────

/// Builds a registry, optionally with richer field metadata per resource.
pub struct RegistryBuilder {
    rpc: RpcClient,
    infos: HashMap<ResourceName, ResourceInfo>,
}

impl RegistryBuilder {
    #[must_use]
    pub fn with_info(mut self, name: ResourceName, info: ResourceInfo) -> Self {
        self.infos.insert(name, info);
        self
    }

    pub fn build(mut self) -> ResourceRegistry {
        let mut make = |name: ResourceName| {
            let info = self
                .infos
                .remove(&name)
                .unwrap_or_else(|| ResourceInfo::for_resource(name));
            Resource::new(name, info, self.rpc.clone())
        };

        let inner = RegistryInner {
            tutors: make(ResourceName::Tutors),
            learners: make(ResourceName::Learners),
            bookings: make(ResourceName::Bookings),
            matchings: make(ResourceName::Matchings),
            requests: make(ResourceName::Requests),
            request_submissions: make(ResourceName::RequestSubmissions),
            rpc: self.rpc.clone(),
        };
        ResourceRegistry {
            inner: Arc::new(inner),
        }
    }
}

// ── Registry ─────────────────────────────────────────────────────

#[derive(Clone)]
pub struct ResourceRegistry {
    inner: Arc<RegistryInner>,
}

struct RegistryInner {
    rpc: RpcClient,
    tutors: Resource,
    learners: Resource,
    bookings: Resource,
    matchings: Resource,
    requests: Resource,
    request_submissions: Resource,
}

/// Point-in-time summary of one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceSummary {
    pub status: AskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub version: u64,
}

impl ResourceRegistry {
    /// Registry with default field metadata for every resource.
    pub fn new(rpc: RpcClient) -> Self {
        Self::builder(rpc).build()
    }

    pub fn builder(rpc: RpcClient) -> RegistryBuilder {
        RegistryBuilder {
            rpc,
            infos: HashMap::new(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, CoreError> {
        Ok(Self::new(config.build_rpc()?))
    }

    pub fn rpc(&self) -> &RpcClient {
        &self.inner.rpc
    }

    // ── Lookup ───────────────────────────────────────────────────

    pub fn get(&self, name: ResourceName) -> &Resource {
        let inner = &*self.inner;
        match name {
            ResourceName::Tutors => &inner.tutors,
            ResourceName::Learners => &inner.learners,
            ResourceName::Bookings => &inner.bookings,
            ResourceName::Matchings => &inner.matchings,
            ResourceName::Requests => &inner.requests,
            ResourceName::RequestSubmissions => &inner.request_submissions,
        }
    }

    /// Resolve a wire name such as `"requestSubmissions"`.
    pub fn by_name(&self, name: &str) -> Result<&Resource, CoreError> {
        let name = name
            .parse::<ResourceName>()
            .map_err(|_| CoreError::UnknownResource { name: name.into() })?;
        Ok(self.get(name))
    }

    /// Resources in initialization order.
    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        ResourceName::iter().map(|name| self.get(name))
    }

    pub fn tutors(&self) -> &Resource {
        &self.inner.tutors
    }

    pub fn learners(&self) -> &Resource {
        &self.inner.learners
    }

    pub fn bookings(&self) -> &Resource {
        &self.inner.bookings
    }

    pub fn matchings(&self) -> &Resource {
        &self.inner.matchings
    }

    pub fn requests(&self) -> &Resource {
        &self.inner.requests
    }

    pub fn request_submissions(&self) -> &Resource {
        &self.inner.request_submissions
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Initialize every resource, one after another. A failed resource is
    /// left in its error state and does not stop the others.
    pub async fn initialize_resources(&self) {
        for resource in self.iter() {
            let state = resource.state().initialize().await;
            if let Some(message) = state.message() {
                warn!(resource = %resource.name(), error = %message, "initialization failed");
            }
        }
        info!("resources initialized");
    }

    /// Re-fetch every resource, one after another.
    pub async fn force_refresh_all_resources(&self) {
        for resource in self.iter() {
            resource.state().force_refresh().await;
        }
        info!("resources refreshed");
    }

    /// Status of every resource, keyed by name.
    pub fn debug_snapshot(&self) -> BTreeMap<ResourceName, ResourceSummary> {
        self.iter()
            .map(|resource| {
                let observable = resource.state();
                let state = observable.state();
                let summary = ResourceSummary {
                    status: state.status(),
                    records: state.as_ref().unwrap_or_fail().ok().map(|c| c.len()),
                    message: state.message().map(str::to_owned),
                    version: observable.version(),
                };
                (resource.name(), summary)
            })
            .collect()
    }
}

impl std::fmt::Debug for ResourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceRegistry")
            .field("rpc", &self.inner.rpc)
            .finish_non_exhaustive()
    }
}
