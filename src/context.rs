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

use crate::types;
use crate::types::v1alpha1::cluster::Cluster;
use crate::types::v1alpha1::list::ClusterList;
use crate::types::v1alpha1::status::StatusReport;
use kube::api::{Api, DeleteParams, ListParams, PostParams};
use snafu::Snafu;
use tracing::{debug, info};

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("Kubernetes API error: {}", source))]
    Kube { source: kube::Error },

    #[snafu(transparent)]
    Types { source: types::error::Error },

    #[snafu(transparent)]
    Serde { source: serde_json::Error },
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Types { source } if source.is_not_found())
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Types { source } if source.is_conflict())
    }
}

/// Maps API server 404 and 409 responses onto the inventory error kinds.
fn api_error(name: &str, sent_version: Option<&str>, source: kube::Error) -> Error {
    let response = match &source {
        kube::Error::Api(response) => Some((response.code, response.message.clone())),
        _ => None,
    };

    match response {
        Some((404, _)) => types::error::Error::NotFound {
            name: name.to_owned(),
        }
        .into(),
        Some((409, message)) => types::error::Error::Conflict {
            name: name.to_owned(),
            expected: sent_version.unwrap_or_default().to_owned(),
            actual: message,
        }
        .into(),
        _ => Error::Kube { source },
    }
}

/// The API server bumps `metadata.generation` only on spec changes, so an
/// equal generation means every write since `read` left the spec alone.
fn spec_unchanged_since(read: &Cluster, latest: &Cluster) -> bool {
    read.metadata.generation.is_some() && read.metadata.generation == latest.metadata.generation
}

/// Cluster records on a live API server.
pub struct Context {
    pub(crate) client: kube::Client,
}

impl Context {
    pub fn new(client: kube::Client) -> Self {
        Self { client }
    }

    fn api(&self) -> Api<Cluster> {
        Api::all(self.client.clone())
    }

    pub async fn get(&self, name: &str) -> Result<Cluster, Error> {
        self.api()
            .get(name)
            .await
            .map_err(|e| api_error(name, None, e))
    }

    pub async fn create(&self, cluster: &Cluster) -> Result<Cluster, Error> {
        cluster.validate()?;
        let name = cluster.name();
        let created = self
            .api()
            .create(&PostParams::default(), cluster)
            .await
            .map_err(|e| api_error(&name, None, e))?;

        info!("cluster {} registered", name);
        Ok(created)
    }

    /// Replaces spec, labels and annotations.
    ///
    /// The API server shares one resource version between spec and status,
    /// so a status write after `cluster` was read also fails the replace.
    /// On such a conflict the latest cluster is fetched; if its spec was not
    /// rewritten in the meantime the replace is retried on top of it,
    /// otherwise the conflict is returned.
    pub async fn update_spec(&self, cluster: &Cluster) -> Result<Cluster, Error> {
        cluster.spec.validate()?;
        let name = cluster.name();

        let replace_func = async |base: &Cluster| {
            let mut next = cluster.clone();
            next.metadata.resource_version = base.metadata.resource_version.clone();
            next.status = None;
            let sent = next.metadata.resource_version.as_deref();
            self.api()
                .replace(&name, &PostParams::default(), &next)
                .await
                .map_err(|e| api_error(&name, sent, e))
        };

        if cluster.metadata.resource_version.is_none() {
            let latest = self.get(&name).await?;
            return replace_func(&latest).await;
        }

        match replace_func(cluster).await {
            Err(e) if e.is_conflict() => {}
            result => return result,
        }

        let latest = self.get(&name).await?;
        if !spec_unchanged_since(cluster, &latest) {
            return Err(types::error::Error::Conflict {
                name: name.clone(),
                expected: cluster.metadata.resource_version.clone().unwrap_or_default(),
                actual: latest.metadata.resource_version.unwrap_or_default(),
            }
            .into());
        }

        debug!("cluster {} changed outside its spec, retrying spec write", name);
        replace_func(&latest).await
    }

    /// Replaces the status through the status subresource.
    pub async fn update_status(&self, cluster: &Cluster) -> Result<Cluster, Error> {
        if let Some(status) = &cluster.status {
            status.validate()?;
        }
        let name = cluster.name();
        let sent = cluster.metadata.resource_version.as_deref();
        let body = serde_json::to_vec(cluster)?;
        self.api()
            .replace_status(&name, &PostParams::default(), body)
            .await
            .map_err(|e| api_error(&name, sent, e))
    }

    /// Applies `report` to `cluster` and writes the status. On a conflict the
    /// latest cluster is fetched and the report applied once more.
    pub async fn report_status(
        &self,
        cluster: &Cluster,
        report: StatusReport,
    ) -> Result<Cluster, Error> {
        report.validate()?;
        let now = types::v1alpha1::cluster::now();

        let update_func = async |cluster: &Cluster| {
            let mut next = cluster.clone();
            next.report_status(report.clone(), now)?;
            self.update_status(&next).await
        };

        match update_func(cluster).await {
            Err(e) if e.is_conflict() => {}
            result => return result,
        }

        info!("status update failed due to conflict, retrieve the latest resource and retry.");

        let latest = self.get(&cluster.name()).await?;
        update_func(&latest).await
    }

    pub async fn list(&self, params: &ListParams) -> Result<ClusterList, Error> {
        self.api()
            .list(params)
            .await
            .map(ClusterList::from)
            .map_err(|source| Error::Kube { source })
    }

    /// Follows every page of a list.
    pub async fn list_all(&self, page_size: u32) -> Result<ClusterList, Error> {
        let mut params = ListParams::default().limit(page_size);
        let mut all = self.list(&params).await?;
        while let Some(token) = all.continue_token().map(str::to_owned) {
            debug!("listing next cluster page");
            params = params.continue_token(&token);
            let page = self.list(&params).await?;
            all.extend_page(page);
        }
        Ok(all)
    }

    pub async fn delete(&self, name: &str) -> Result<(), Error> {
        self.api()
            .delete(name, &DeleteParams::default())
            .await
            .map_err(|e| api_error(name, None, e))?;

        info!("cluster {} deregistered", name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::core::ErrorResponse;

    fn response(code: u16) -> kube::Error {
        kube::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message: "the object has been modified".to_string(),
            reason: "Conflict".to_string(),
            code,
        })
    }

    fn read_at(generation: Option<i64>, resource_version: &str) -> Cluster {
        let mut cluster = crate::tests::create_test_cluster("c1");
        cluster.metadata.generation = generation;
        cluster.metadata.resource_version = Some(resource_version.to_string());
        cluster
    }

    #[test]
    fn test_status_write_does_not_block_spec_retry() {
        // a heartbeat moved the resource version but not the generation
        let read = read_at(Some(3), "10");
        let latest = read_at(Some(3), "11");
        assert!(spec_unchanged_since(&read, &latest));
    }

    #[test]
    fn test_concurrent_spec_write_is_not_retried() {
        let read = read_at(Some(3), "10");
        let latest = read_at(Some(4), "12");
        assert!(!spec_unchanged_since(&read, &latest));

        // without a generation the read cannot be trusted
        let unknown = read_at(None, "10");
        assert!(!spec_unchanged_since(&unknown, &read_at(None, "11")));
    }

    #[test]
    fn test_api_error_mapping() {
        assert!(api_error("c1", None, response(404)).is_not_found());

        let conflict = api_error("c1", Some("42"), response(409));
        assert!(conflict.is_conflict());
        assert!(conflict.to_string().contains("expected resource version 42"));

        let other = api_error("c1", None, response(500));
        assert!(matches!(other, Error::Kube { .. }));
        assert!(!other.is_conflict());
    }
}
