use aws_config::{SdkConfig, default_provider::credentials::DefaultCredentialsChain};
use aws_sdk_kms::config::BehaviorVersion;

/// Overrides the KMS endpoint, used against local KMS emulators.
pub const ENDPOINT_ENV: &str = "DA_GATEWAY_AWS_ENDPOINT";

pub async fn load_config_from_env() -> SdkConfig {
    let loader = aws_config::defaults(BehaviorVersion::latest())
        .credentials_provider(DefaultCredentialsChain::builder().build().await);

    let loader = match std::env::var(ENDPOINT_ENV) {
        Ok(url) => loader.endpoint_url(url),
        _ => loader,
    };

    loader.load().await
}
