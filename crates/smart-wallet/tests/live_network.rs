//! Checks against a deployed factory.
//!
//! Configure through `.env` (see `WalletConfig`) and run with
//! `cargo test -p smart-wallet --test live_network -- --ignored`.
//! `ACCOUNT_ZERO_ADDRESS` may be set to pin the expected address of index 0.

use std::time::Duration;

use rand::Rng;
use smart_wallet::{TxOptions, WalletClient, WalletConfig};

fn client() -> WalletClient {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let config = WalletConfig::from_env().expect("live network configuration");
    WalletClient::from_config(&config).expect("client")
}

/// Stays within 2^53 like indices chosen by other clients of the factory.
fn random_index() -> u64 {
    rand::thread_rng().gen_range(0..(1u64 << 53))
}

#[tokio::test]
#[ignore = "requires a deployed factory and PROVIDER_URL"]
async fn factory_reports_configured_model() {
    let client = client();
    let info = client.info().await.unwrap();
    assert_eq!(info.model_account, client.model_account());
}

#[tokio::test]
#[ignore = "requires a deployed factory and PROVIDER_URL"]
async fn local_derivation_agrees_with_factory() {
    let client = client();

    for index in [0u64, 1] {
        let account = client.account(index);
        let info = account.info().await.unwrap();

        assert_eq!(info.address, account.address());
        assert_eq!(info.salt, account.salt_hex());
    }

    if let Ok(expected) = std::env::var("ACCOUNT_ZERO_ADDRESS") {
        assert!(client.account(0u64).address().eq_ignore_ascii_case(&expected));
    }
}

#[tokio::test]
#[ignore = "requires a deployed factory and PROVIDER_URL"]
async fn native_balance_is_readable() {
    let client = client();
    let balance = client.account(0u64).balance(None).await.unwrap();
    assert_eq!(balance.decimals, 18);
}

#[tokio::test]
#[ignore = "sends a transaction; requires a funded PRIVATE_KEY"]
async fn create_fresh_account() {
    let client = client();

    let account = loop {
        let candidate = client.account(random_index());
        if !candidate.info().await.unwrap().exists {
            break candidate;
        }
    };

    let pending = account.create(&TxOptions::new()).await.unwrap();
    assert!(pending.hash.starts_with("0x"));

    let receipt = tokio::time::timeout(
        Duration::from_secs(120),
        client.wait_for_receipt(&pending, Duration::from_secs(2)),
    )
    .await
    .expect("mined within two minutes")
    .unwrap();
    assert!(receipt.success);
    assert!(account.info().await.unwrap().exists);
}
