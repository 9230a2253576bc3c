//! Minimal ABI codec for the registry's `lookup(address)` view call, which
//! returns `(address controller, string[] records)`.

use crate::error::{VdaDidError, VdaDidResult, parsing::ParsingErrorSource};

/// First four bytes of `keccak256("lookup(address)")`.
pub const LOOKUP_SELECTOR: [u8; 4] = [0xd4, 0xb6, 0xb5, 0xda];

const WORD: usize = 32;

/// Decoded return value of `lookup(address)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupOutput {
    pub controller: String,
    pub records: Vec<String>,
}

/// Parse a `0x`-prefixed (or bare) 40 hex digit address.
pub fn parse_address(address: &str) -> VdaDidResult<[u8; 20]> {
    let digits = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .unwrap_or(address);
    if digits.len() != 40 {
        return Err(VdaDidError::InvalidDid(format!(
            "expected a 20 byte address, got: {address}"
        )));
    }

    let bytes = hex::decode(digits)?;
    let mut out = [0u8; 20];
    out.copy_from_slice(&bytes);
    Ok(out)
}

/// Hex call data for `lookup(did_address)`.
pub fn encode_lookup_call(did_address: &str) -> VdaDidResult<String> {
    let address = parse_address(did_address)?;

    let mut data = Vec::with_capacity(LOOKUP_SELECTOR.len() + WORD);
    data.extend_from_slice(&LOOKUP_SELECTOR);
    data.extend_from_slice(&[0u8; WORD - 20]);
    data.extend_from_slice(&address);
    Ok(format!("0x{}", hex::encode(data)))
}

/// Decode the hex return data of `lookup(address)`.
pub fn decode_lookup_output(data: &str) -> VdaDidResult<LookupOutput> {
    let bytes = hex::decode(data.trim_start_matches("0x"))?;

    let controller = read_address(&bytes, 0)?;
    let array_at = read_usize(&bytes, WORD)?;
    let len = read_usize(&bytes, array_at)?;
    // element offsets are relative to the first word after the length
    let base = offset(array_at, WORD)?;

    let mut records = Vec::with_capacity(len.min(bytes.len() / WORD));
    for i in 0..len {
        let head = offset(base, i.checked_mul(WORD).ok_or_else(|| abi_error("offset overflow"))?)?;
        let string_at = offset(base, read_usize(&bytes, head)?)?;
        records.push(read_string(&bytes, string_at)?);
    }

    Ok(LookupOutput {
        controller,
        records,
    })
}

fn word(bytes: &[u8], at: usize) -> VdaDidResult<&[u8]> {
    let end = offset(at, WORD)?;
    bytes
        .get(at..end)
        .ok_or_else(|| abi_error(&format!("word at {at} is out of bounds ({} bytes)", bytes.len())))
}

fn read_usize(bytes: &[u8], at: usize) -> VdaDidResult<usize> {
    let w = word(bytes, at)?;
    if w[..WORD - 8].iter().any(|b| *b != 0) {
        return Err(abi_error(&format!("integer at {at} does not fit 64 bits")));
    }
    let mut be = [0u8; 8];
    be.copy_from_slice(&w[WORD - 8..]);
    Ok(usize::try_from(u64::from_be_bytes(be))?)
}

fn read_address(bytes: &[u8], at: usize) -> VdaDidResult<String> {
    let w = word(bytes, at)?;
    Ok(format!("0x{}", hex::encode(&w[WORD - 20..])))
}

fn read_string(bytes: &[u8], at: usize) -> VdaDidResult<String> {
    let len = read_usize(bytes, at)?;
    let start = offset(at, WORD)?;
    let end = offset(start, len)?;
    let raw = bytes
        .get(start..end)
        .ok_or_else(|| abi_error(&format!("string at {at} is out of bounds")))?;
    Ok(String::from_utf8(raw.to_vec())?)
}

fn offset(a: usize, b: usize) -> VdaDidResult<usize> {
    a.checked_add(b).ok_or_else(|| abi_error("offset overflow"))
}

fn abi_error(message: &str) -> VdaDidError {
    VdaDidError::ParsingError(ParsingErrorSource::AbiError(message.to_owned()))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn uint_word(n: usize) -> Vec<u8> {
        let mut w = vec![0u8; WORD];
        w[WORD - 8..].copy_from_slice(&(n as u64).to_be_bytes());
        w
    }

    fn padded(s: &str) -> Vec<u8> {
        let mut out = uint_word(s.len());
        let mut data = s.as_bytes().to_vec();
        data.resize(s.len().div_ceil(WORD) * WORD, 0);
        out.extend(data);
        out
    }

    /// ABI-encode `(address, string[])` the way the registry returns it.
    pub(crate) fn encode_output(controller: &[u8; 20], records: &[&str]) -> String {
        let mut out = vec![0u8; WORD - 20];
        out.extend_from_slice(controller);
        out.extend(uint_word(2 * WORD));
        out.extend(uint_word(records.len()));

        let tails: Vec<Vec<u8>> = records.iter().map(|r| padded(r)).collect();
        let mut next = records.len() * WORD;
        for tail in &tails {
            out.extend(uint_word(next));
            next += tail.len();
        }
        for tail in tails {
            out.extend(tail);
        }
        format!("0x{}", hex::encode(out))
    }

    #[test]
    fn encode_call_data() {
        let data = encode_lookup_call("0x2b3f34e9d4b127797ce6244ea341a83733ddd6e4").unwrap();
        assert_eq!(
            data,
            "0xd4b6b5da0000000000000000000000002b3f34e9d4b127797ce6244ea341a83733ddd6e4"
        );
    }

    #[test]
    fn encode_call_rejects_short_address() {
        let e = encode_lookup_call("0x1234").unwrap_err();
        assert!(matches!(e, VdaDidError::InvalidDid(_)));
    }

    #[test]
    fn decode_records() {
        let controller = [0x11u8; 20];
        let long = "https://acacia-dev1.tn.verida.tech/did/0x01?context=0xabc&type=database";
        let data = encode_output(&controller, &["hello", long]);

        let out = decode_lookup_output(&data).unwrap();
        assert_eq!(out.controller, format!("0x{}", "11".repeat(20)));
        assert_eq!(out.records, vec!["hello".to_string(), long.to_string()]);
    }

    #[test]
    fn decode_empty_array() {
        let out = decode_lookup_output(&encode_output(&[0u8; 20], &[])).unwrap();
        assert!(out.records.is_empty());
    }

    #[test]
    fn decode_rejects_empty_return_data() {
        let e = decode_lookup_output("0x").unwrap_err();
        assert!(matches!(
            e,
            VdaDidError::ParsingError(ParsingErrorSource::AbiError(_))
        ));
    }

    #[test]
    fn decode_rejects_truncated_string() {
        let data = encode_output(&[0u8; 20], &["hello world"]);
        // cut the padded string data short
        let truncated = &data[..data.len() - 2 * WORD];
        assert!(decode_lookup_output(truncated).is_err());
    }
}
