//! Walks one service through its lifecycle against a running vconf server
//! while a refresh callback reports every change.
//!
//! ```text
//! cargo run -p vconf-server &
//! cargo run -p vconf-client --example refresh_demo
//! ```

use std::time::Duration;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use vconf_client::ConfigClient;

#[derive(Debug, Serialize, Deserialize)]
struct AppConfig {
    key1: String,
    key2: String,
}

fn log_config_refresh(payload: Bytes) {
    match serde_json::from_slice::<AppConfig>(&payload) {
        Ok(cfg) => println!("Updated config: {:?}", cfg),
        Err(e) => tracing::warn!(error = %e, "undecodable config payload"),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let client = ConfigClient::connect("http://localhost:8080/config", "example", None)?;

    client.delete_config().await?;
    tokio::time::sleep(Duration::from_secs(1)).await;

    client
        .create_config(&AppConfig {
            key1: "Value1".to_string(),
            key2: "Value2".to_string(),
        })
        .await?;

    let initial: AppConfig = client.read_and_decode_config().await?;
    println!("Initial config: {:?}", initial);

    client.assign_refresh_callback(Duration::from_secs(2), log_config_refresh)?;

    for i in 0..5 {
        tokio::time::sleep(Duration::from_secs(5)).await;
        let update = AppConfig {
            key1: format!("Value-{}", i * 1000),
            key2: format!("Value-{}", i * 2000),
        };
        if let Err(e) = client.update_config(&update).await {
            tracing::warn!(error = %e, "update failed");
        }
    }

    tokio::time::sleep(Duration::from_secs(5)).await;
    client.stop_refresh();
    println!("Update completed");

    Ok(())
}
