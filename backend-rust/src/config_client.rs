//! # config_client
//!
//! Client of the external configuration service. The service owns a mutable
//! `objectSpeed` setting; this module only fetches and updates it on behalf
//! of callers. Failures stay with the caller — nothing here ever reaches
//! into the aggregator/solver pipeline.

use thiserror::Error;

use tdoa_types::ConfigRecord;

#[derive(Debug, Error)]
#[error("config service unavailable: {0}")]
pub struct ConfigServiceUnavailable(#[from] reqwest::Error);

/// `GET {base}/config`
pub async fn fetch_config(base_url: &str) -> Result<ConfigRecord, ConfigServiceUnavailable> {
    let record = reqwest::get(format!("{base_url}/config"))
        .await?
        .error_for_status()?
        .json::<ConfigRecord>()
        .await?;
    Ok(record)
}

/// `POST {base}/config` with `{ "objectSpeed": n }`; returns the echoed record.
pub async fn update_object_speed(
    base_url: &str,
    new_speed: f64,
) -> Result<ConfigRecord, ConfigServiceUnavailable> {
    let record = reqwest::Client::new()
        .post(format!("{base_url}/config"))
        .json(&serde_json::json!({ "objectSpeed": new_speed }))
        .send()
        .await?
        .error_for_status()?
        .json::<ConfigRecord>()
        .await?;
    Ok(record)
}
