use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use actix_web::{HttpResponse, web};
use alloy::{
    consensus::{Transaction as _, TxEnvelope},
    eips::eip2718::Decodable2718,
    primitives::{Address, hex, keccak256},
    signers::local::PrivateKeySigner,
};
use eth::HttpClient;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use services::{
    ports::l1::Api,
    types::{Fees, TxRequest},
};
use url::Url;

const SIGNER_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// A node that answers nonce lookups slowly and, like a real mempool,
/// rejects a transaction whose nonce was already taken.
fn fake_node(accepted: Arc<Mutex<Vec<u64>>>) -> Url {
    test_helpers::http::serve(move |cfg| {
        let accepted = Arc::clone(&accepted);
        cfg.route(
            "/",
            web::post().to(move |request: web::Json<Value>| {
                let accepted = Arc::clone(&accepted);
                async move {
                    let id = request["id"].clone();
                    let reply = |body: Value| {
                        let mut body = body;
                        body["jsonrpc"] = json!("2.0");
                        body["id"] = id.clone();
                        HttpResponse::Ok().json(body)
                    };

                    match request["method"].as_str() {
                        Some("eth_chainId") => reply(json!({ "result": "0x1" })),
                        Some("eth_getTransactionCount") => {
                            tokio::time::sleep(Duration::from_millis(50)).await;
                            let count = accepted.lock().unwrap().len();
                            reply(json!({ "result": format!("{count:#x}") }))
                        }
                        Some("eth_sendRawTransaction") => {
                            let raw = hex::decode(request["params"][0].as_str().unwrap()).unwrap();
                            let tx = TxEnvelope::decode_2718(&mut raw.as_slice()).unwrap();

                            let mut accepted = accepted.lock().unwrap();
                            if tx.nonce() != accepted.len() as u64 {
                                return reply(json!({
                                    "error": { "code": -32000, "message": "nonce too low" }
                                }));
                            }
                            accepted.push(tx.nonce());

                            reply(json!({ "result": keccak256(&raw).to_string() }))
                        }
                        other => reply(json!({
                            "error": { "code": -32601, "message": format!("{other:?} not served") }
                        })),
                    }
                }
            }),
        );
    })
}

fn calldata_tx(input: &[u8]) -> TxRequest {
    TxRequest {
        to: Address::repeat_byte(0x1b),
        input: input.to_vec(),
        sidecar: None,
        gas_limit: 30_000,
        fees: Fees {
            max_fee_per_gas: 210,
            max_priority_fee_per_gas: 10,
            max_fee_per_blob_gas: None,
        },
    }
}

#[tokio::test]
async fn concurrent_sends_get_consecutive_nonces() {
    // given
    let accepted = Arc::new(Mutex::new(vec![]));
    let client = HttpClient::connect(
        fake_node(Arc::clone(&accepted)),
        SIGNER_KEY.parse::<PrivateKeySigner>().unwrap(),
        1,
        Duration::from_secs(5),
    )
    .await
    .unwrap();
    let shared = client.clone();

    // when
    let (first, second) = tokio::join!(
        client.send_transaction(calldata_tx(b"first")),
        shared.send_transaction(calldata_tx(b"second")),
    );

    // then
    first.unwrap();
    second.unwrap();
    assert_eq!(*accepted.lock().unwrap(), vec![0, 1]);
}
