//! Typed DID Document model and the closed vocabularies the registry's
//! attribute naming scheme is built from.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A W3C DID Document, restricted to the members the registry can express.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidDocument {
    #[serde(rename = "@context", default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub also_known_as: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub verification_method: Vec<VerificationMethod>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authentication: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assertion_method: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_agreement: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capability_invocation: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capability_delegation: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub service: Vec<Service>,
}

impl DidDocument {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// JSON view of the document. Empty lists and unset members are left out.
    pub fn to_json(&self) -> Value {
        to_json(self)
    }
}

/// One key bound to the DID. At most one of the `public_key_*`/`value` members
/// is expected to be set. A `blockchainAccountId` member marks a delegate,
/// even when its value is `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    pub id: String,
    #[serde(rename = "type")]
    pub method_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key_hex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key_base64: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key_base58: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key_pem: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub blockchain_account_id: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<Value>,
}

impl VerificationMethod {
    pub fn is_delegate(&self) -> bool {
        self.blockchain_account_id.is_some()
    }
}

/// Keeps a member that is present with a `null` value apart from an absent one.
fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// Structural JSON form of a document entry, the form equality runs on.
///
/// Document types hold only strings and JSON values, so serializing them
/// cannot fail.
pub(crate) fn to_json<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_default()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    #[serde(rename = "type")]
    pub service_type: String,
    pub service_endpoint: String,
}

/// Verification method types the registry knows how to encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationMethodType {
    EcdsaSecp256k1RecoveryMethod2020,
    EcdsaSecp256k1VerificationKey2019,
    Ed25519VerificationKey2018,
    RsaVerificationKey2018,
    X25519KeyAgreementKey2019,
}

impl VerificationMethodType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "EcdsaSecp256k1RecoveryMethod2020" => Some(Self::EcdsaSecp256k1RecoveryMethod2020),
            "EcdsaSecp256k1VerificationKey2019" => Some(Self::EcdsaSecp256k1VerificationKey2019),
            "Ed25519VerificationKey2018" => Some(Self::Ed25519VerificationKey2018),
            "RSAVerificationKey2018" => Some(Self::RsaVerificationKey2018),
            "X25519KeyAgreementKey2019" => Some(Self::X25519KeyAgreementKey2019),
            _ => None,
        }
    }
}

/// Algorithm segment of a `did/pub/...` attribute name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyAlgorithm {
    #[default]
    Secp256k1,
    Ed25519,
    Rsa,
    X25519,
}

impl KeyAlgorithm {
    /// Unrecognised types fall back to `Secp256k1`.
    pub fn for_method_type(method_type: &str) -> Self {
        match VerificationMethodType::parse(method_type) {
            Some(
                VerificationMethodType::EcdsaSecp256k1RecoveryMethod2020
                | VerificationMethodType::EcdsaSecp256k1VerificationKey2019,
            ) => Self::Secp256k1,
            Some(VerificationMethodType::Ed25519VerificationKey2018) => Self::Ed25519,
            Some(VerificationMethodType::RsaVerificationKey2018) => Self::Rsa,
            Some(VerificationMethodType::X25519KeyAgreementKey2019) => Self::X25519,
            None => Self::default(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Secp256k1 => "Secp256k1",
            Self::Ed25519 => "Ed25519",
            Self::Rsa => "Rsa",
            Self::X25519 => "X25519",
        }
    }
}

/// Purpose segment of a `did/pub/...` attribute name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyPurpose {
    #[default]
    VeriKey,
    SigAuth,
    Enc,
}

impl KeyPurpose {
    /// `authentication` is checked before `keyAgreement`; first hit wins.
    pub fn infer(document: &DidDocument, method_id: &str) -> Self {
        if document.authentication.iter().any(|r| r == method_id) {
            Self::SigAuth
        } else if document.key_agreement.iter().any(|r| r == method_id) {
            Self::Enc
        } else {
            Self::VeriKey
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VeriKey => "veriKey",
            Self::SigAuth => "sigAuth",
            Self::Enc => "enc",
        }
    }
}

/// Encoding segment of a `did/pub/...` attribute name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEncoding {
    Hex,
    Base64,
    Base58,
    Pem,
}

impl KeyEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hex => "hex",
            Self::Base64 => "base64",
            Self::Base58 => "base58",
            Self::Pem => "pem",
        }
    }
}

/// Delegate relationship recorded by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DelegateType {
    #[serde(rename = "veriKey")]
    VeriKey,
    #[serde(rename = "sigAuth")]
    SigAuth,
    #[serde(rename = "enc")]
    Enc,
}

impl DelegateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VeriKey => "veriKey",
            Self::SigAuth => "sigAuth",
            Self::Enc => "enc",
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_as_str!(KeyAlgorithm, KeyPurpose, KeyEncoding, DelegateType);
