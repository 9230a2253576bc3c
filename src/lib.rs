//! Client-side helpers for DIDs of the `did:vda` method, whose documents are
//! anchored as delegate and attribute records in an on-chain DID registry.
//!
//! The crate covers two directions of traffic with the registry:
//!
//! - **Document to registry.** [UpdatePlanner] maps a DID Document onto the
//!   registry's record naming scheme (`did/pub/<algorithm>/<purpose>/<encoding>`
//!   for keys, `did/svc/<type>` for services, `veriKey` delegates for entries
//!   with a `blockchainAccountId`). [UpdatePlanner::plan_document_update] diffs
//!   an existing and a target document first (see [diff]) so that only changed
//!   entries are added or revoked. Plans are handed to a transaction submitter
//!   through an [UpdateSink].
//! - **Registry to client.** [DidRegistryLookup] performs the read-only
//!   `lookup(address)` contract call over JSON-RPC and returns the raw records
//!   held for a DID.
//!
//! Signing and submitting transactions, and rebuilding a DID Document from the
//! raw records, are left to other components.
//!
//! Quick example
//! -------------
//! Planning is synchronous and needs no network access:
//!
//! ```
//! use did_vda_registry::{DidDocument, UpdatePlanner};
//!
//! let document: DidDocument = serde_json::from_str(r#"{
//!     "id": "did:vda:testnet:0x2b3f34e9d4b127797ce6244ea341a83733ddd6e4",
//!     "verificationMethod": [{
//!         "id": "did:vda:testnet:0x2b3f34e9d4b127797ce6244ea341a83733ddd6e4#key-1",
//!         "type": "Ed25519VerificationKey2018",
//!         "publicKeyBase58": "abc123"
//!     }]
//! }"#).unwrap();
//!
//! let updates = UpdatePlanner::new(Default::default()).plan(&document).unwrap();
//! assert_eq!(updates.attributes[0].name, "did/pub/Ed25519/veriKey/base58");
//! assert_eq!(updates.attributes[0].value, "abc123");
//! ```

pub mod diff;
pub mod document;
pub mod error;
pub mod resolution;
pub mod update;

pub use document::{DidDocument, Service, VerificationMethod};
pub use error::{VdaDidError, VdaDidResult};
pub use resolution::lookup::{DidRegistryConfiguration, DidRegistryLookup, NetworkConfiguration};
pub use resolution::parser::{
    IdentifierInterpreter, InterpretedIdentifier, VdaIdentifierInterpreter,
};
pub use update::{DocumentUpdate, PlannerConfig, UpdateList, UpdatePlanner, UpdateSink};
