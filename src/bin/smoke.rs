//! End-to-end check of the blob datastore against a real S3-compatible bucket.
//!
//! Configuration comes from the environment:
//! `BLOB_DS_ACCOUNT_NAME`, `BLOB_DS_ACCOUNT_KEY`, `BLOB_DS_CONTAINER`,
//! `BLOB_DS_FOLDER` (optional), `BLOB_DS_REGION` (optional),
//! `BLOB_DS_ENDPOINT` (optional, enables path-style addressing).

use blob_datastore::storage::{BlobDatastore, Datastore, DatastoreConfig, Key, S3Config, S3ObjectClient};
use bytes::Bytes;
use color_eyre::eyre::{ensure, Result, WrapErr};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const OPERATION_TIMEOUT: Duration = Duration::from_secs(300);

fn env_var(name: &str) -> Result<String> {
    std::env::var(name).wrap_err_with(|| format!("{} is not set", name))
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = DatastoreConfig::new(
        env_var("BLOB_DS_ACCOUNT_NAME")?,
        env_var("BLOB_DS_ACCOUNT_KEY")?,
        env_var("BLOB_DS_CONTAINER")?,
        std::env::var("BLOB_DS_FOLDER").unwrap_or_default(),
    );
    let endpoint_url = std::env::var("BLOB_DS_ENDPOINT").ok();
    let s3_config = S3Config {
        region: std::env::var("BLOB_DS_REGION").unwrap_or_else(|_| S3Config::default().region),
        path_style: endpoint_url.is_some(),
        endpoint_url,
    };

    let client = S3ObjectClient::new(&config, &s3_config).await;
    let datastore = BlobDatastore::connect(config, client)
        .await
        .wrap_err("failed to open datastore")?;

    tokio::time::timeout(OPERATION_TIMEOUT, run(&datastore))
        .await
        .wrap_err("smoke test timed out")?
}

async fn run(datastore: &BlobDatastore<S3ObjectClient>) -> Result<()> {
    let key = Key::new(format!("/smoke/{}", uuid::Uuid::new_v4()));
    tracing::info!(key = %key, path = %datastore.object_path(&key), "starting smoke test");

    ensure!(!datastore.has(&key).await?, "fresh key unexpectedly exists");

    datastore.put(&key, Bytes::from("test string")).await?;
    ensure!(datastore.has(&key).await?, "key missing after put");

    let value = datastore.get(&key).await?;
    ensure!(value == Bytes::from("test string"), "read back {:?}", value);
    ensure!(datastore.get_size(&key).await? == 11, "unexpected size");

    datastore.delete(&key).await?;
    ensure!(!datastore.has(&key).await?, "key still present after delete");
    ensure!(
        datastore.delete(&key).await.is_err_and(|e| e.is_not_found()),
        "second delete did not report not found"
    );

    tracing::info!("smoke test passed");
    Ok(())
}
