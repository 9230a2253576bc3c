use crate::{
    error::{VdaDidError, VdaDidResult},
    resolution::abi::parse_address,
};

pub const DID_VDA_PREFIX: &str = "did:vda";

/// Length of a `0x`-prefixed 20 byte address. Longer identifiers carry a public key.
const ADDRESS_LEN: usize = 42;

/// What an identifier points at on chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpretedIdentifier {
    /// `0x`-prefixed chain address
    pub address: String,
    /// Network segment(s) of the DID (e.g. `testnet`), if present
    pub network: Option<String>,
}

/// Extracts a chain address from a DID, DID URL or bare address.
pub trait IdentifierInterpreter {
    fn interpret(&self, identifier: &str) -> VdaDidResult<InterpretedIdentifier>;
}

/// Interpreter for `did:vda` identifiers.
///
/// Accepted forms:
/// - `did:vda:<address>`
/// - `did:vda:<network>:<address>` (the network may itself contain `:`)
/// - any of the above followed by `?<query>` and/or `#<fragment>`
/// - a bare `0x` address
#[derive(Debug, Clone, Copy, Default)]
pub struct VdaIdentifierInterpreter;

impl IdentifierInterpreter for VdaIdentifierInterpreter {
    fn interpret(&self, identifier: &str) -> VdaDidResult<InterpretedIdentifier> {
        let mut id = identifier;
        let mut network = None;

        if id.starts_with(DID_VDA_PREFIX) {
            // drop query and fragment
            id = id.split(['?', '#']).next().unwrap_or(id);

            let components: Vec<&str> = id.split(':').collect();
            id = components.last().copied().unwrap_or_default();
            if components.len() >= 4 {
                network = Some(components[2..components.len() - 1].join(":"));
            }
        } else if identifier.starts_with("did:") {
            return Err(VdaDidError::MethodNotSupported(format!(
                "not a did:vda identifier: {identifier}"
            )));
        }

        if id.len() > ADDRESS_LEN {
            return Err(VdaDidError::InvalidDid(format!(
                "public key identifiers cannot be mapped to an address: {identifier}"
            )));
        }
        parse_address(id).map_err(|_| {
            VdaDidError::InvalidDid(format!("no address in identifier: {identifier}"))
        })?;

        Ok(InterpretedIdentifier {
            address: id.to_owned(),
            network,
        })
    }
}
