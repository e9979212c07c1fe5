//! r-pod-fetch
//!
//! Command-line fetcher for Printful stores: product and variant listings,
//! printing templates and mockup previews, exported as zip bundles. All
//! API access runs through a cached, rate-limited client.
//!
//! # Usage
//!
//! ```bash
//! # Probe the configured access token
//! r-pod-fetch validate
//!
//! # List store products with their catalog product IDs
//! r-pod-fetch products
//!
//! # Export front templates of two products
//! r-pod-fetch templates --products 101,102 --placement front
//!
//! # Export mockup previews for one style
//! r-pod-fetch mockups --products 101 --style 5
//!
//! # Upload a design and generate a mockup
//! r-pod-fetch generate --product 71 --variant 4012 --design ./design.png
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info, warn};

mod config;
mod domain;
mod export;
mod fetch;
mod printful;

use crate::config::Settings;
use crate::domain::StoreProduct;
use crate::export::{Bundle, BundleWriter, ExportRecord, ZipBundleWriter};
use crate::fetch::{
    ImageFetcher, MockupFetchOptions, MockupFetcher, ProgressCallback, TemplateFetchOptions,
    TemplateFetcher,
};
use crate::printful::{CredentialCheck, PrintfulClient, PrintfulResponse, TaskStatus};

#[derive(Parser)]
#[command(name = "r-pod-fetch")]
#[command(version, about = "Printful catalog, template and mockup fetcher")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Probe the Printful API with the configured access token
    Validate,

    /// List store products with their catalog product IDs
    Products {
        /// Bypass the session caches
        #[arg(long)]
        refresh: bool,
    },

    /// List the resolved variants of one store product
    Variants {
        /// Store product ID
        product_id: i64,

        /// Bypass the session caches
        #[arg(long)]
        refresh: bool,
    },

    /// Fetch printing templates and export them as a zip bundle
    Templates {
        /// Store product IDs, comma separated; all products when omitted
        #[arg(long, value_delimiter = ',')]
        products: Vec<i64>,

        /// Placement to export (front is preferred when omitted)
        #[arg(long)]
        placement: Option<String>,

        /// Bypass the session caches
        #[arg(long)]
        refresh: bool,
    },

    /// Fetch mockup previews and export them as a zip bundle
    Mockups {
        /// Store product IDs, comma separated; all products when omitted
        #[arg(long, value_delimiter = ',')]
        products: Vec<i64>,

        /// Mockup style ID; the first listed style is used when omitted
        #[arg(long)]
        style: Option<i64>,

        /// Bypass the session caches
        #[arg(long)]
        refresh: bool,
    },

    /// Upload a design file and generate a mockup for one variant
    Generate {
        /// Catalog product ID
        #[arg(long)]
        product: i64,

        /// Catalog variant ID
        #[arg(long)]
        variant: i64,

        /// Placement of the design
        #[arg(long, default_value = "front")]
        placement: String,

        /// Path of the design file
        #[arg(long)]
        design: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Structured JSON logs go to stderr so stdout stays pipeable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("r_pod_fetch=info".parse().unwrap()),
        )
        .json()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            error!("Command failed: {}", err);
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<i32> {
    let settings = Settings::load()?;
    let client = PrintfulClient::new(&settings);

    info!(
        "Starting r-pod-fetch v{} against {}",
        env!("CARGO_PKG_VERSION"),
        settings.api.base_url
    );

    // every command runs against a checked credential
    let check = client.validate_credential().await;

    match cli.command {
        Command::Validate => {
            info!("Credential check: {}", check);
            println!("{}", check);
            Ok(exit_code(check))
        }
        _ if check != CredentialCheck::Valid => {
            error!("Credential check failed: {}", check);
            Ok(exit_code(check))
        }
        Command::Products { refresh } => {
            let products = client.fetch_store_products(refresh).await;
            info!("Fetched {} store products", products.len());
            for product in &products {
                let catalog = product
                    .catalog_product_id
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!("{}\t{}\t{}", product.id, catalog, product.name);
            }
            Ok(0)
        }
        Command::Variants {
            product_id,
            refresh,
        } => {
            let resolved = client.get_product_variants(product_id, refresh).await;
            if resolved.variants.is_empty() {
                warn!("No variants resolved for product {}", product_id);
                return Ok(0);
            }
            info!(
                "Category: {} (ID: {})",
                resolved.category_title,
                resolved
                    .main_category_id
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "-".to_string())
            );
            for variant in &resolved.variants {
                println!(
                    "{}\t{}\t{}\t{}",
                    variant.catalog_variant_id,
                    variant.size,
                    variant.color_code,
                    if variant.in_stock {
                        "in stock"
                    } else {
                        "out of stock"
                    }
                );
            }
            Ok(0)
        }
        Command::Templates {
            products,
            placement,
            refresh,
        } => {
            let selected = select_products(&client, &products, refresh).await;
            let images = ImageFetcher::new();
            let fetcher = TemplateFetcher::new(&client, &images)
                .with_options(TemplateFetchOptions {
                    placement,
                    force_refresh: refresh,
                })
                .with_progress(progress_logger());
            let records = fetcher.run(&selected).await;
            export_bundle(&records, "templates", &settings)
        }
        Command::Mockups {
            products,
            style,
            refresh,
        } => {
            let selected = select_products(&client, &products, refresh).await;
            let images = ImageFetcher::new();
            let fetcher = MockupFetcher::new(&client, &images)
                .with_options(MockupFetchOptions {
                    style_id: style,
                    force_refresh: refresh,
                })
                .with_progress(progress_logger());
            let records = fetcher.run(&selected).await;
            export_bundle(&records, "mockups", &settings)
        }
        Command::Generate {
            product,
            variant,
            placement,
            design,
        } => {
            let file_data = std::fs::read(&design)?;
            info!(
                "Uploading design {} ({} bytes)",
                design.display(),
                file_data.len()
            );
            let Some(uploaded) = client.upload_file(&file_data).await else {
                error!("Design upload failed");
                return Ok(1);
            };
            let Some(payload) = client
                .generate_mockup(product, variant, &placement, uploaded.id)
                .await
            else {
                error!("Mockup generation did not complete");
                return Ok(1);
            };

            let status: PrintfulResponse<TaskStatus> = serde_json::from_value(payload)?;
            for mockup in status.result.mockups {
                if let Some(url) = mockup.mockup_url {
                    let covered = mockup
                        .variant_ids
                        .iter()
                        .map(|id| id.to_string())
                        .collect::<Vec<_>>()
                        .join(",");
                    println!(
                        "{}\t{}\t{}",
                        mockup.placement.as_deref().unwrap_or("-"),
                        covered,
                        url
                    );
                }
            }
            Ok(0)
        }
    }
}

fn exit_code(check: CredentialCheck) -> i32 {
    match check {
        CredentialCheck::Valid => 0,
        CredentialCheck::Invalid => 1,
        CredentialCheck::Unreachable => 2,
    }
}

/// Resolve requested product IDs against the store listing; an empty
/// request selects every product
async fn select_products(
    client: &PrintfulClient,
    requested: &[i64],
    force_refresh: bool,
) -> Vec<StoreProduct> {
    let all = client.fetch_store_products(force_refresh).await;
    if requested.is_empty() {
        return all;
    }
    let mut selected = Vec::new();
    for id in requested {
        match all.iter().find(|product| product.id == *id) {
            Some(product) => selected.push(product.clone()),
            None => warn!("Store product {} not found, skipping", id),
        }
    }
    selected
}

fn progress_logger() -> ProgressCallback {
    Box::new(|progress| {
        info!(
            "Processing product {}/{}: {}",
            progress.index + 1,
            progress.total,
            progress.product_name
        );
    })
}

fn export_bundle(records: &[ExportRecord], prefix: &str, settings: &Settings) -> Result<i32> {
    if records.is_empty() {
        warn!("Nothing gathered, no bundle written");
        return Ok(0);
    }
    let bundle = Bundle::assemble(records, prefix);
    let path = ZipBundleWriter.write_to_dir(&bundle, &settings.export.output_dir)?;
    println!("{}", path.display());
    Ok(0)
}
