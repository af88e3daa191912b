// Copyright 2025 RustFS Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! In-process cluster store
//!
//! Implements the storage contract the schema relies on: validated writes,
//! compare-and-swap on `resourceVersion`, paged lists and a watch stream.
//!
//! Spec and status are versioned independently. A write carrying resource
//! version `R` conflicts only if the sub-tree it replaces was written after
//! `R`, so a registrar and a status reporter never contend with each other.

use crate::types::error::{AlreadyExistsSnafu, ConflictSnafu, Error, NotFoundSnafu};
use crate::types::v1alpha1::cluster::Cluster;
use crate::types::v1alpha1::list::ClusterList;
use crate::types::v1alpha1::status::StatusReport;
use chrono::{DateTime, Utc};
use futures::{Stream, StreamExt};
use k8s_openapi::apimachinery::pkg::apis::meta::v1 as metav1;
use kube::api::ListParams;
use snafu::OptionExt;
use std::collections::BTreeMap;
use std::ops::Bound;
use tokio::sync::{Mutex, broadcast};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tracing::{debug, info, warn};

const WATCH_CHANNEL_CAPACITY: usize = 256;

/// Attempts made by [`MemoryStore::report_status`] before giving up on conflicts.
const STATUS_WRITE_ATTEMPTS: usize = 3;

#[derive(Clone, Debug, PartialEq)]
pub enum WatchEvent {
    Added(Cluster),
    Modified(Cluster),
    Deleted(Cluster),
}

impl WatchEvent {
    pub fn cluster(&self) -> &Cluster {
        match self {
            WatchEvent::Added(c) | WatchEvent::Modified(c) | WatchEvent::Deleted(c) => c,
        }
    }
}

#[derive(Debug)]
struct Entry {
    cluster: Cluster,
    spec_version: u64,
    status_version: u64,
}

#[derive(Debug, Default)]
struct Inner {
    entries: BTreeMap<String, Entry>,
    version: u64,
}

impl Inner {
    fn next_version(&mut self) -> u64 {
        self.version += 1;
        self.version
    }

    fn entry_mut(&mut self, name: &str) -> Result<&mut Entry, Error> {
        self.entries.get_mut(name).context(NotFoundSnafu { name })
    }
}

#[derive(Debug)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    events: broadcast::Sender<WatchEvent>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(WATCH_CHANNEL_CAPACITY);
        Self {
            inner: Mutex::new(Inner::default()),
            events,
        }
    }

    /// Registers a cluster. Any status on the input is dropped.
    pub async fn create(&self, cluster: &Cluster) -> Result<Cluster, Error> {
        cluster.validate()?;
        let name = cluster.required_name()?.to_owned();

        let mut inner = self.inner.lock().await;
        if inner.entries.contains_key(&name) {
            return AlreadyExistsSnafu { name }.fail();
        }

        let version = inner.next_version();
        let mut stored = cluster.clone();
        stored.status = None;
        stored.metadata.resource_version = Some(version.to_string());
        stored.metadata.generation = Some(1);

        inner.entries.insert(
            name.clone(),
            Entry {
                cluster: stored.clone(),
                spec_version: version,
                status_version: version,
            },
        );
        self.emit(WatchEvent::Added(stored.clone()));

        info!("cluster {} registered at resource version {}", name, version);
        Ok(stored)
    }

    pub async fn get(&self, name: &str) -> Result<Cluster, Error> {
        let inner = self.inner.lock().await;
        inner
            .entries
            .get(name)
            .map(|e| e.cluster.clone())
            .context(NotFoundSnafu { name })
    }

    /// Replaces spec, labels and annotations. Status is left as stored.
    pub async fn update_spec(&self, cluster: &Cluster) -> Result<Cluster, Error> {
        cluster.spec.validate()?;
        let name = cluster.required_name()?;

        let mut inner = self.inner.lock().await;
        let latest = inner.version;
        let current = inner.entry_mut(name)?;
        check_version(name, cluster, current.spec_version, latest, &current.cluster)?;

        let version = inner.next_version();
        let entry = inner.entry_mut(name)?;
        let stored = &mut entry.cluster;
        if stored.spec != cluster.spec {
            stored.metadata.generation = Some(stored.metadata.generation.unwrap_or(0) + 1);
        }
        stored.spec = cluster.spec.clone();
        stored.metadata.labels = cluster.metadata.labels.clone();
        stored.metadata.annotations = cluster.metadata.annotations.clone();
        stored.metadata.resource_version = Some(version.to_string());
        entry.spec_version = version;

        let updated = entry.cluster.clone();
        self.emit(WatchEvent::Modified(updated.clone()));

        debug!("cluster {} spec updated at resource version {}", name, version);
        Ok(updated)
    }

    /// Replaces the whole status. Spec and metadata are left as stored.
    pub async fn update_status(&self, cluster: &Cluster) -> Result<Cluster, Error> {
        if let Some(status) = &cluster.status {
            status.validate()?;
        }
        let name = cluster.required_name()?;

        let mut inner = self.inner.lock().await;
        let latest = inner.version;
        let current = inner.entry_mut(name)?;
        check_version(name, cluster, current.status_version, latest, &current.cluster)?;

        let version = inner.next_version();
        let entry = inner.entry_mut(name)?;
        entry.cluster.status = cluster.status.clone();
        entry.cluster.metadata.resource_version = Some(version.to_string());
        entry.status_version = version;

        let updated = entry.cluster.clone();
        self.emit(WatchEvent::Modified(updated.clone()));

        debug!("cluster {} status updated at resource version {}", name, version);
        Ok(updated)
    }

    /// Reads the cluster, applies `report` and writes the status back,
    /// re-reading on conflicts.
    pub async fn report_status(
        &self,
        name: &str,
        report: StatusReport,
        now: DateTime<Utc>,
    ) -> Result<Cluster, Error> {
        report.validate()?;

        let mut attempt = 1;
        loop {
            let mut cluster = self.get(name).await?;
            cluster.report_status(report.clone(), now)?;

            match self.update_status(&cluster).await {
                Err(e) if e.is_conflict() && attempt < STATUS_WRITE_ATTEMPTS => {
                    info!("status update of cluster {name} conflicted, retrieve the latest and retry.");
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    pub async fn delete(&self, name: &str) -> Result<Cluster, Error> {
        let mut inner = self.inner.lock().await;
        let entry = inner.entries.remove(name).context(NotFoundSnafu { name })?;
        inner.next_version();
        self.emit(WatchEvent::Deleted(entry.cluster.clone()));

        info!("cluster {} deregistered", name);
        Ok(entry.cluster)
    }

    /// Lists clusters ordered by name. `limit` and `continue_token` page
    /// through the store; the token is opaque to callers.
    pub async fn list(&self, params: &ListParams) -> Result<ClusterList, Error> {
        let inner = self.inner.lock().await;

        let start = match params.continue_token.as_deref() {
            Some(token) if !token.is_empty() => Bound::Excluded(token.to_owned()),
            _ => Bound::Unbounded,
        };
        let limit = params
            .limit
            .filter(|l| *l > 0)
            .map_or(usize::MAX, |l| l as usize);

        let mut remaining = inner.entries.range((start, Bound::Unbounded));
        let items: Vec<Cluster> = remaining
            .by_ref()
            .take(limit)
            .map(|(_, e)| e.cluster.clone())
            .collect();
        let continue_ = match remaining.next() {
            Some(_) => items.last().map(Cluster::name),
            None => None,
        };

        Ok(ClusterList::new(
            metav1::ListMeta {
                continue_,
                resource_version: Some(inner.version.to_string()),
                ..Default::default()
            },
            items,
        ))
    }

    /// Follows every page of a list.
    pub async fn list_all(&self, page_size: u32) -> Result<ClusterList, Error> {
        let mut params = ListParams::default().limit(page_size);
        let mut all = self.list(&params).await?;
        while let Some(token) = all.continue_token().map(str::to_owned) {
            params = params.continue_token(&token);
            let page = self.list(&params).await?;
            all.extend_page(page);
        }
        Ok(all)
    }

    /// Stream of changes made after the call. Slow consumers skip events
    /// they lagged behind on.
    pub fn watch(&self) -> impl Stream<Item = WatchEvent> + use<> {
        BroadcastStream::new(self.events.subscribe()).filter_map(|event| async move {
            match event {
                Ok(event) => Some(event),
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    warn!("cluster watch lagged, {} events skipped", skipped);
                    None
                }
            }
        })
    }

    fn emit(&self, event: WatchEvent) {
        if self.events.send(event).is_err() {
            debug!("no active cluster watchers");
        }
    }
}

/// `written` is the version at which the sub-tree being replaced was last
/// written and `latest` the newest version the store has handed out. A
/// missing resource version on the input is an unconditional write.
fn check_version(
    name: &str,
    cluster: &Cluster,
    written: u64,
    latest: u64,
    stored: &Cluster,
) -> Result<(), Error> {
    let Some(expected) = cluster.metadata.resource_version.as_deref() else {
        return Ok(());
    };

    let actual = stored
        .metadata
        .resource_version
        .clone()
        .unwrap_or_default();
    match expected.parse::<u64>() {
        Ok(read_at) if (written..=latest).contains(&read_at) => Ok(()),
        _ => ConflictSnafu {
            name,
            expected,
            actual,
        }
        .fail(),
    }
}
