// Copyright 2024 RustFS Team
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

use clap::{Parser, Subcommand};
use shadow_rs::shadow;
use tracing::{error, info};

shadow!(build);

#[derive(Parser)]
#[command(name = "cluster-inventory")]
#[command(about = "Cluster inventory CLI", long_about = None)]
#[command(version = build::PKG_VERSION, long_version = build::CLAP_LONG_VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Output CRDs in YAML
    Crd {
        /// Optional output path. If not set, the output will be written to stdout.
        #[arg(short, long)]
        file: Option<String>,
    },

    /// Validate a Cluster document (YAML or JSON)
    Validate {
        /// Path of the document to validate.
        file: String,
    },

    /// Watch clusters and log their state
    Watch {},
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Crd { file } => inventory::crd(file).await?,
        Commands::Validate { file } => {
            inventory::init_tracing();
            match inventory::validate(&file).await {
                Ok(cluster) => info!("cluster {} is valid", cluster.name()),
                Err(e) => {
                    error!("{}: {}", file, e);
                    return Err(e);
                }
            }
        }
        Commands::Watch {} => {
            inventory::init_tracing();
            inventory::watch().await?
        }
    }

    Ok(())
}
