use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

use crate::{
    diff::remove_common_items,
    document::{
        DelegateType, DidDocument, KeyAlgorithm, KeyEncoding, KeyPurpose, Service,
        VerificationMethod,
    },
    error::{VdaDidError, VdaDidResult},
    resolution::parser::{
        IdentifierInterpreter, InterpretedIdentifier, VdaIdentifierInterpreter,
    },
};

/// Placeholder written into attribute values when an identifier lacks a part
/// the encoding needs. Registries already hold values carrying it.
pub const MISSING_CAPTURE: &str = "undefined";

/// Verification methods whose id ends with this are maintained by the
/// resolver and never submitted.
pub const CONTROLLER_SUFFIX: &str = "#controller";

/// `<did>[?context=<word>][&type=<word>]`
static KEY_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([A-Za-z0-9_,:]+)(\?context=([A-Za-z0-9_]+))?(&type=([A-Za-z0-9_]+))?")
        .expect("should compile")
});

/// `...context=<word>&type=<word>`
static SERVICE_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(.*)?context=([A-Za-z0-9_]+)&type=([A-Za-z0-9_]+)").expect("should compile")
});

/// Which member a `base64` encoded key is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Base64Source {
    /// Read `publicKeyBase58`. Attributes already on chain were written this way.
    #[default]
    LegacyBase58Field,
    /// Read `publicKeyBase64`.
    Base64Field,
}

/// What to do when an identifier or key lacks a part its attribute needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MalformedInputPolicy {
    /// Write [MISSING_CAPTURE] in place of the missing part.
    #[default]
    Forward,
    /// Fail with [VdaDidError::MalformedIdentifier] or [VdaDidError::MissingKeyMaterial].
    Reject,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PlannerConfig {
    pub base64_source: Base64Source,
    pub malformed_input: MalformedInputPolicy,
}

impl PlannerConfig {
    /// Reads base64 keys from `publicKeyBase64` and rejects malformed input.
    pub fn strict() -> Self {
        Self {
            base64_source: Base64Source::Base64Field,
            malformed_input: MalformedInputPolicy::Reject,
        }
    }
}

/// Instruction to add a delegate on chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegateUpdate {
    pub delegate: String,
    pub delegate_type: DelegateType,
}

/// Instruction to set a named attribute on chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeUpdate {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateList {
    #[serde(rename = "delegateList")]
    pub delegates: Vec<DelegateUpdate>,
    #[serde(rename = "attributeList")]
    pub attributes: Vec<AttributeUpdate>,
}

impl UpdateList {
    pub fn is_empty(&self) -> bool {
        self.delegates.is_empty() && self.attributes.is_empty()
    }
}

/// Registry changes that turn one document into another.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentUpdate {
    /// entries only the target document has
    pub add: UpdateList,
    /// entries only the existing document has
    pub revoke: UpdateList,
}

impl DocumentUpdate {
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.revoke.is_empty()
    }
}

/// Maps DID Document entries onto the registry's delegate and attribute records.
///
/// Keys become `did/pub/<algorithm>/<purpose>/<encoding>` attributes, services
/// become `did/svc/<type>` attributes and entries with a `blockchainAccountId`
/// become `veriKey` delegates.
pub struct UpdatePlanner<I = VdaIdentifierInterpreter> {
    interpreter: I,
    config: PlannerConfig,
}

impl UpdatePlanner {
    pub fn new(config: PlannerConfig) -> Self {
        Self::with_interpreter(VdaIdentifierInterpreter, config)
    }
}

impl Default for UpdatePlanner {
    fn default() -> Self {
        Self::new(PlannerConfig::default())
    }
}

impl<I: IdentifierInterpreter> UpdatePlanner<I> {
    pub fn with_interpreter(interpreter: I, config: PlannerConfig) -> Self {
        Self {
            interpreter,
            config,
        }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Delegate and attribute records for every entry of `document`, in
    /// document order, verification methods first.
    pub fn plan(&self, document: &DidDocument) -> VdaDidResult<UpdateList> {
        let mut updates = UpdateList::default();

        for method in &document.verification_method {
            if method.is_delegate() {
                if method.id.ends_with(CONTROLLER_SUFFIX) {
                    trace!("skipping controller entry {}", method.id);
                    continue;
                }
                let InterpretedIdentifier { address, .. } =
                    self.interpreter.interpret(&method.id)?;
                updates.delegates.push(DelegateUpdate {
                    delegate: address,
                    delegate_type: DelegateType::VeriKey,
                });
            } else {
                updates.attributes.push(self.key_attribute(document, method)?);
            }
        }

        for service in &document.service {
            updates.attributes.push(self.service_attribute(service)?);
        }

        debug!(
            "planned {} delegates and {} attributes for {}",
            updates.delegates.len(),
            updates.attributes.len(),
            document.id
        );
        Ok(updates)
    }

    /// Records to add and to revoke so that the registry state of `existing`
    /// becomes that of `target`. Entries both documents share are left alone,
    /// unless a shared key moved between purposes, which renames its attribute.
    pub fn plan_document_update(
        &self,
        existing: &DidDocument,
        target: &DidDocument,
    ) -> VdaDidResult<DocumentUpdate> {
        let (mut stale, mut fresh) = remove_common_items(existing, target);

        // key purposes come from the complete reference lists
        stale.authentication.clone_from(&existing.authentication);
        stale.key_agreement.clone_from(&existing.key_agreement);
        fresh.authentication.clone_from(&target.authentication);
        fresh.key_agreement.clone_from(&target.key_agreement);

        let moved: Vec<VerificationMethod> = target
            .verification_method
            .iter()
            .filter(|method| !method.is_delegate())
            .filter(|method| !fresh.verification_method.contains(*method))
            .filter(|method| {
                KeyPurpose::infer(existing, &method.id) != KeyPurpose::infer(target, &method.id)
            })
            .cloned()
            .collect();
        for method in moved {
            trace!("key {} changed purpose", method.id);
            stale.verification_method.push(method.clone());
            fresh.verification_method.push(method);
        }

        Ok(DocumentUpdate {
            add: self.plan(&fresh)?,
            revoke: self.plan(&stale)?,
        })
    }

    fn key_attribute(
        &self,
        document: &DidDocument,
        method: &VerificationMethod,
    ) -> VdaDidResult<AttributeUpdate> {
        let algorithm = KeyAlgorithm::for_method_type(&method.method_type);
        let purpose = KeyPurpose::infer(document, &method.id);
        let (encoding, mut value) = self.key_material(method)?;

        if let Some(captures) = KEY_ID.captures(&method.id) {
            if let Some(context) = captures.get(3) {
                value = format!("{value}?context={}", context.as_str());
                if let Some(key_type) = captures.get(5) {
                    value = format!("{value}&type={}", key_type.as_str());
                }
            }
        }

        let encoding = encoding.map_or("null", |e| e.as_str());
        Ok(AttributeUpdate {
            name: format!("did/pub/{algorithm}/{purpose}/{encoding}"),
            value,
            proof: method.proof.clone(),
        })
    }

    /// Probes hex, base64, base58, pem, then `value`; the first present wins.
    fn key_material(
        &self,
        method: &VerificationMethod,
    ) -> VdaDidResult<(Option<KeyEncoding>, String)> {
        if let Some(hex) = &method.public_key_hex {
            let value = if hex.starts_with("0x") {
                hex.clone()
            } else {
                format!("0x{hex}")
            };
            return Ok((Some(KeyEncoding::Hex), value));
        }

        if let Some(base64) = &method.public_key_base64 {
            let value = match self.config.base64_source {
                Base64Source::Base64Field => base64.clone(),
                Base64Source::LegacyBase58Field => match &method.public_key_base58 {
                    Some(base58) => base58.clone(),
                    None => {
                        self.missing(|| VdaDidError::MissingKeyMaterial(method.id.clone()))?
                    }
                },
            };
            return Ok((Some(KeyEncoding::Base64), value));
        }

        if let Some(base58) = &method.public_key_base58 {
            return Ok((Some(KeyEncoding::Base58), base58.clone()));
        }

        if let Some(pem) = &method.public_key_pem {
            return Ok((Some(KeyEncoding::Pem), pem.clone()));
        }

        Ok((None, method.value.clone().unwrap_or_default()))
    }

    fn service_attribute(&self, service: &Service) -> VdaDidResult<AttributeUpdate> {
        let parts = SERVICE_ID
            .captures(&service.id)
            .and_then(|c| Some((c.get(2)?.as_str(), c.get(3)?.as_str())));

        let (context, suffix) = match parts {
            Some(parts) => parts,
            None => {
                self.missing(|| VdaDidError::MalformedIdentifier(service.id.clone()))?;
                (MISSING_CAPTURE, MISSING_CAPTURE)
            }
        };

        Ok(AttributeUpdate {
            name: format!("did/svc/{}", service.service_type),
            value: format!(
                "{}?context={context}&type={suffix}",
                service.service_endpoint
            ),
            proof: None,
        })
    }

    fn missing(&self, error: impl FnOnce() -> VdaDidError) -> VdaDidResult<String> {
        match self.config.malformed_input {
            MalformedInputPolicy::Forward => Ok(MISSING_CAPTURE.to_owned()),
            MalformedInputPolicy::Reject => Err(error()),
        }
    }
}
