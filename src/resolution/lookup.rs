use std::{
    collections::HashMap,
    sync::atomic::{AtomicU64, Ordering},
};

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tracing::{debug, warn};
use url::Url;

use crate::{
    error::{VdaDidError, VdaDidResult},
    resolution::abi::{decode_lookup_output, encode_lookup_call},
};

/// namespace for the "mainnet". as it would appear in a DID.
pub const MAINNET_NAMESPACE: &str = "mainnet";
/// default JSON-RPC URL for the "mainnet".
pub const MAINNET_DEFAULT_RPC: &str = "https://polygon-rpc.com";
/// namespace for the "testnet". as it would appear in a DID.
pub const TESTNET_NAMESPACE: &str = "testnet";
/// default JSON-RPC URL for the "testnet".
pub const TESTNET_DEFAULT_RPC: &str = "https://rpc-amoy.polygon.technology";

/// Configuration for the [DidRegistryLookup]
#[derive(Clone, Default)]
pub struct DidRegistryConfiguration {
    /// Configuration for which networks can be looked up
    pub networks: Vec<NetworkConfiguration>,
}

/// Where the registry contract of one network lives and how to reach it.
#[derive(Clone)]
pub struct NetworkConfiguration {
    /// the namespace of the network - as it would appear in a DID (did:vda:namespace:0x...)
    pub namespace: String,
    /// JSON-RPC endpoint of a node on that network
    pub rpc_url: String,
    /// address of the DID registry contract
    pub registry_address: String,
}

impl NetworkConfiguration {
    pub fn new(
        namespace: impl Into<String>,
        rpc_url: impl Into<String>,
        registry_address: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            rpc_url: rpc_url.into(),
            registry_address: registry_address.into(),
        }
    }

    /// default RPC configuration for mainnet, with the given registry deployment
    pub fn mainnet(registry_address: impl Into<String>) -> Self {
        Self::new(MAINNET_NAMESPACE, MAINNET_DEFAULT_RPC, registry_address)
    }

    /// default RPC configuration for testnet, with the given registry deployment
    pub fn testnet(registry_address: impl Into<String>) -> Self {
        Self::new(TESTNET_NAMESPACE, TESTNET_DEFAULT_RPC, registry_address)
    }
}

#[derive(Clone)]
struct RegistryRpcClient {
    http: Client,
    endpoint: Url,
    registry_address: String,
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

/// Read-only access to the DID registry contract.
pub struct DidRegistryLookup {
    networks: Vec<NetworkConfiguration>,
    network_clients: Mutex<HashMap<String, RegistryRpcClient>>,
    request_id: AtomicU64,
}

impl DidRegistryLookup {
    /// Assemble a new lookup with the given config.
    pub fn new(configuration: DidRegistryConfiguration) -> Self {
        Self {
            networks: configuration.networks,
            network_clients: Default::default(),
            request_id: AtomicU64::new(0),
        }
    }

    /// lazily get the client, initializing if not already
    async fn client_for_network(&self, network: &str) -> VdaDidResult<RegistryRpcClient> {
        let mut lock = self.network_clients.lock().await;
        if let Some(client) = lock.get(network) {
            return Ok(client.clone());
        }

        let network_config = self.network_config(network)?;
        let client = build_client(&network_config.rpc_url, &network_config.registry_address)?;
        lock.insert(network.to_owned(), client.clone());

        Ok(client)
    }

    fn network_config(&self, network: &str) -> VdaDidResult<&NetworkConfiguration> {
        self.networks
            .iter()
            .find(|n| n.namespace == network)
            .ok_or(VdaDidError::NetworkNotSupported(network.to_owned()))
    }

    /// Fetch the raw attribute records the registry holds for `did_address` on
    /// `network`, in registry order.
    ///
    /// Any failure of the contract call itself is reported as
    /// [VdaDidError::DidNotFound]; the cause is kept as its `source`.
    pub async fn lookup(&self, did_address: &str, network: &str) -> VdaDidResult<Vec<String>> {
        let client = self.client_for_network(network).await?;
        self.lookup_with_client(&client, did_address).await
    }

    /// Same as [DidRegistryLookup::lookup], against an explicit RPC endpoint
    /// instead of the configured one. The client is not cached.
    pub async fn lookup_with_rpc(
        &self,
        did_address: &str,
        network: &str,
        rpc_url: &str,
    ) -> VdaDidResult<Vec<String>> {
        let network_config = self.network_config(network)?;
        let client = build_client(rpc_url, &network_config.registry_address)?;
        self.lookup_with_client(&client, did_address).await
    }

    async fn lookup_with_client(
        &self,
        client: &RegistryRpcClient,
        did_address: &str,
    ) -> VdaDidResult<Vec<String>> {
        self.call_lookup(client, did_address).await.map_err(|e| {
            warn!("registry lookup for {did_address} failed: {e}");
            VdaDidError::not_found(did_address, e)
        })
    }

    async fn call_lookup(
        &self,
        client: &RegistryRpcClient,
        did_address: &str,
    ) -> VdaDidResult<Vec<String>> {
        let data = encode_lookup_call(did_address)?;
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let request = RpcRequest {
            jsonrpc: "2.0",
            id,
            method: "eth_call",
            params: json!([{ "to": client.registry_address, "data": data }, "latest"]),
        };

        debug!("eth_call lookup({did_address}) id={id} to {}", client.endpoint);

        let response = client
            .http
            .post(client.endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| VdaDidError::TransportError(Box::new(e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(VdaDidError::NonSuccessResponse {
                code: i64::from(status.as_u16()),
                message: status.to_string(),
            });
        }

        let body: RpcResponse<String> = response
            .json()
            .await
            .map_err(|e| VdaDidError::InvalidResponse(e.to_string()))?;
        if let Some(error) = body.error {
            return Err(VdaDidError::NonSuccessResponse {
                code: error.code,
                message: error.message,
            });
        }
        let result = body.result.ok_or(VdaDidError::InvalidResponse(
            "eth_call did not return a result".into(),
        ))?;

        let output = decode_lookup_output(&result)?;
        debug!(
            "lookup({did_address}) returned {} records, controller {}",
            output.records.len(),
            output.controller
        );
        Ok(output.records)
    }
}

fn build_client(rpc_url: &str, registry_address: &str) -> VdaDidResult<RegistryRpcClient> {
    let endpoint = Url::parse(rpc_url).map_err(|_e| {
        VdaDidError::BadConfiguration(format!("Failed to parse RPC url: {rpc_url}"))
    })?;

    let http = Client::builder()
        .build()
        .map_err(|e| VdaDidError::TransportError(Box::new(e)))?;

    Ok(RegistryRpcClient {
        http,
        endpoint,
        registry_address: registry_address.to_owned(),
    })
}

#[cfg(test)]
mod unit_tests {
    use std::error::Error as _;

    use mockito::{Matcher, Mock, Server, ServerGuard};

    use super::*;
    use crate::resolution::abi::tests::encode_output;

    const DID_ADDRESS: &str = "0x2b3f34e9d4b127797ce6244ea341a83733ddd6e4";
    const REGISTRY: &str = "0x0000000000000000000000000000000000000abc";
    // nothing listens on the discard port
    const UNREACHABLE_RPC: &str = "http://127.0.0.1:9";

    fn lookup_for(url: &str) -> DidRegistryLookup {
        DidRegistryLookup::new(DidRegistryConfiguration {
            networks: vec![NetworkConfiguration::new("devnet", url, REGISTRY)],
        })
    }

    /// Mock node answering the `eth_call` for [DID_ADDRESS] with `status` and `body`.
    fn mock_eth_call(server: &mut ServerGuard, status: usize, body: Value) -> Mock {
        server
            .mock("POST", "/")
            .match_header("content-type", "application/json")
            .match_body(Matcher::PartialJson(json!({
                "jsonrpc": "2.0",
                "method": "eth_call",
                "params": [
                    { "to": REGISTRY, "data": encode_lookup_call(DID_ADDRESS).unwrap() },
                    "latest"
                ]
            })))
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
    }

    #[tokio::test]
    async fn test_lookup_fails_if_no_network_config() {
        let lookup = DidRegistryLookup::new(Default::default());
        let e = lookup.lookup(DID_ADDRESS, "devnet").await.unwrap_err();
        assert!(matches!(e, VdaDidError::NetworkNotSupported(_)));
    }

    #[tokio::test]
    async fn test_lookup_fails_if_bad_rpc_url() {
        let lookup = lookup_for("@baduri://.");
        let e = lookup.lookup(DID_ADDRESS, "devnet").await.unwrap_err();
        assert!(matches!(e, VdaDidError::BadConfiguration(_)));
    }

    #[tokio::test]
    async fn test_lookup_returns_records() {
        let mut server = Server::new_async().await;
        let result = encode_output(&[0x22; 20], &["record-1", "record-2"]);
        let mock = mock_eth_call(
            &mut server,
            200,
            json!({ "jsonrpc": "2.0", "id": 0, "result": result }),
        )
        .create_async()
        .await;

        let records = lookup_for(&server.url())
            .lookup(DID_ADDRESS, "devnet")
            .await
            .unwrap();

        assert_eq!(records, vec!["record-1".to_string(), "record-2".to_string()]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_lookup_reuses_network_client() {
        let mut server = Server::new_async().await;
        let result = encode_output(&[0x22; 20], &[]);
        let mock = mock_eth_call(
            &mut server,
            200,
            json!({ "jsonrpc": "2.0", "id": 0, "result": result }),
        )
        .expect(2)
        .create_async()
        .await;

        let lookup = lookup_for(&server.url());
        assert!(lookup.lookup(DID_ADDRESS, "devnet").await.unwrap().is_empty());
        assert!(lookup.lookup(DID_ADDRESS, "devnet").await.unwrap().is_empty());

        assert_eq!(lookup.network_clients.lock().await.len(), 1);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_lookup_with_rpc_overrides_endpoint() {
        let mut server = Server::new_async().await;
        let result = encode_output(&[0x22; 20], &["only"]);
        let mock = mock_eth_call(
            &mut server,
            200,
            json!({ "jsonrpc": "2.0", "id": 0, "result": result }),
        )
        .create_async()
        .await;

        let lookup = lookup_for(UNREACHABLE_RPC);
        let records = lookup
            .lookup_with_rpc(DID_ADDRESS, "devnet", &server.url())
            .await
            .unwrap();

        assert_eq!(records, vec!["only".to_string()]);
        assert!(lookup.network_clients.lock().await.is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_lookup_revert_is_not_found() {
        let mut server = Server::new_async().await;
        let mock = mock_eth_call(
            &mut server,
            200,
            json!({
                "jsonrpc": "2.0",
                "id": 0,
                "error": { "code": 3, "message": "execution reverted" }
            }),
        )
        .create_async()
        .await;

        let e = lookup_for(&server.url())
            .lookup(DID_ADDRESS, "devnet")
            .await
            .unwrap_err();

        assert!(e.is_not_found());
        assert!(e.source().unwrap().to_string().contains("execution reverted"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_lookup_http_error_is_not_found() {
        let mut server = Server::new_async().await;
        let mock = mock_eth_call(&mut server, 500, json!({}))
            .create_async()
            .await;

        let e = lookup_for(&server.url())
            .lookup(DID_ADDRESS, "devnet")
            .await
            .unwrap_err();

        let VdaDidError::DidNotFound { source, .. } = e else {
            panic!("expected DidNotFound");
        };
        assert!(matches!(*source, VdaDidError::NonSuccessResponse { code: 500, .. }));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_lookup_missing_result_is_not_found() {
        let mut server = Server::new_async().await;
        let mock = mock_eth_call(&mut server, 200, json!({ "jsonrpc": "2.0", "id": 0 }))
            .create_async()
            .await;

        let e = lookup_for(&server.url())
            .lookup(DID_ADDRESS, "devnet")
            .await
            .unwrap_err();

        let VdaDidError::DidNotFound { source, .. } = e else {
            panic!("expected DidNotFound");
        };
        assert!(matches!(*source, VdaDidError::InvalidResponse(_)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_lookup_bad_address_is_not_found() {
        let lookup = lookup_for(UNREACHABLE_RPC);
        let e = lookup.lookup("0x1234", "devnet").await.unwrap_err();
        let VdaDidError::DidNotFound { source, .. } = e else {
            panic!("expected DidNotFound");
        };
        assert!(matches!(*source, VdaDidError::InvalidDid(_)));
    }

    #[tokio::test]
    async fn test_lookup_unreachable_node_is_not_found() {
        let lookup = lookup_for(UNREACHABLE_RPC);
        let e = lookup.lookup(DID_ADDRESS, "devnet").await.unwrap_err();
        let VdaDidError::DidNotFound { source, .. } = e else {
            panic!("expected DidNotFound");
        };
        assert!(matches!(*source, VdaDidError::TransportError(_)));
    }
}
