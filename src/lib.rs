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

use crate::types::v1alpha1::cluster::Cluster;
use futures::TryStreamExt;
use kube::runtime::watcher;
use kube::{Api, Client, CustomResourceExt};
use std::pin::Pin;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

pub mod context;
pub mod store;
pub mod types;


pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_level(true)
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();
}

/// Streams cluster changes from the API server and logs their state.
pub async fn watch() -> Result<(), Box<dyn std::error::Error>> {
    let client = Client::try_default().await?;
    let clusters = Api::<Cluster>::all(client);

    let mut stream = Box::pin(watcher(clusters, watcher::Config::default()));
    while let Some(event) = stream.try_next().await? {
        match event {
            watcher::Event::Apply(cluster) | watcher::Event::InitApply(cluster) => log_cluster(&cluster),
            watcher::Event::Delete(cluster) => info!("cluster {} deregistered", cluster.name()),
            watcher::Event::Init => info!("cluster watch (re)starting"),
            watcher::Event::InitDone => info!("cluster watch synced"),
        }
    }

    Ok(())
}

fn log_cluster(cluster: &Cluster) {
    if let Err(e) = cluster.validate() {
        warn!("cluster {} is invalid: {}", cluster.name(), e);
    }
    info!(
        cluster = %cluster.name(),
        joined = %cluster.condition_status(types::v1alpha1::status::condition::CONDITION_JOINED),
        healthy = %cluster.condition_status(types::v1alpha1::status::condition::CONDITION_HEALTHY),
        version = cluster.kubernetes_version().unwrap_or("unknown"),
        heartbeat_seconds = cluster.heartbeat_interval().as_secs(),
        "cluster observed"
    );
}

/// Parses a Cluster document (YAML or JSON) and validates it.
pub async fn validate(file: &str) -> Result<Cluster, Box<dyn std::error::Error>> {
    let document = tokio::fs::read_to_string(file).await?;
    let cluster = Cluster::from_yaml(&document)?;
    cluster.validate()?;
    Ok(cluster)
}

pub async fn crd(file: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let mut writer: Pin<Box<dyn AsyncWrite + Send>> = if let Some(file) = file {
        Box::pin(
            tokio::fs::OpenOptions::new()
                .create(true)
                .truncate(true)
                .write(true)
                .open(file)
                .await?,
        )
    } else {
        Box::pin(tokio::io::stdout())
    };

    writer
        .write_all(serde_yaml_ng::to_string(&Cluster::crd())?.as_bytes())
        .await?;
    writer.flush().await?;

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod validate_tests {
    use super::*;

    const VALID: &str = r#"
apiVersion: inventory.multicluster.io/v1alpha1
kind: Cluster
metadata:
  name: c1
spec:
  accessObjectRef:
    - type: KUBECONFIG
      resource: secrets
      name: c1-kubeconfig
      namespace: fleet-system
  healthProbe:
    heatbeatIntervalSeconds: 30
"#;

    async fn write_temp(name: &str, contents: &str) -> String {
        let path = std::env::temp_dir().join(format!("{}-{}", std::process::id(), name));
        tokio::fs::write(&path, contents).await.unwrap();
        path.to_string_lossy().into_owned()
    }

    #[tokio::test]
    async fn test_validate_file() {
        let path = write_temp("valid.yaml", VALID).await;
        let cluster = validate(&path).await.unwrap();
        assert_eq!(cluster.name(), "c1");
        assert_eq!(cluster.heartbeat_interval().as_secs(), 30);
    }

    #[tokio::test]
    async fn test_validate_file_rejects_missing_name() {
        let path = write_temp("invalid.yaml", &VALID.replace("name: c1-kubeconfig", "name: \"\"")).await;
        let err = validate(&path).await.unwrap_err();
        assert!(err.to_string().contains("spec.accessObjectRef[0].name"));
    }
}
