//! Parameter decoding
//!
//! Decodes the calldata tail against an ABI fragment with
//! `alloy_dyn_abi`, the same path Foundry's `abi_decode_calldata` takes.

use alloy::dyn_abi::{DynSolValue, JsonAbiExt};
use alloy::json_abi::Function;
use alloy::primitives::{hex, U256};

use crate::error::ParamDecodeError;
use crate::types::DecodedParam;

/// Decode `calldata` (selector included) with `function`.
pub fn decode_params(
    function: &Function,
    calldata: &[u8],
) -> Result<Vec<DecodedParam>, ParamDecodeError> {
    let signature = function.signature();
    let expected = function.selector();

    if calldata.len() < 4 || calldata[..4] != expected[..] {
        return Err(ParamDecodeError::SelectorMismatch {
            expected: expected.to_string(),
            found: format!("0x{}", hex::encode(&calldata[..calldata.len().min(4)])),
        });
    }

    let tail = &calldata[4..];
    if tail.is_empty() && function.inputs.is_empty() {
        return Ok(Vec::new());
    }

    let decoded = function
        .abi_decode_input(tail, true)
        .map_err(|e| ParamDecodeError::Abi {
            signature: signature.clone(),
            reason: e.to_string(),
        })?;

    if decoded.len() != function.inputs.len() {
        return Err(ParamDecodeError::Abi {
            signature,
            reason: format!(
                "decoded {} values for {} inputs",
                decoded.len(),
                function.inputs.len()
            ),
        });
    }

    Ok(decoded
        .into_iter()
        .zip(function.inputs.iter())
        .enumerate()
        .map(|(i, (raw, input))| DecodedParam {
            name: if input.name.is_empty() {
                format!("arg{i}")
            } else {
                input.name.clone()
            },
            typ: input.selector_type().into_owned(),
            value: format_value(&raw),
            unlimited: is_unlimited(&raw),
            raw,
        })
        .collect())
}

/// `uint256` holding `type(uint256).max`.
pub fn is_unlimited(val: &DynSolValue) -> bool {
    matches!(val, DynSolValue::Uint(v, 256) if *v == U256::MAX)
}

/// Format a decoded value for display
pub fn format_value(val: &DynSolValue) -> String {
    match val {
        DynSolValue::Bool(b) => b.to_string(),
        DynSolValue::Int(i, _) => i.to_string(),
        DynSolValue::Uint(u, _) => u.to_string(),
        // bytesN is right-padded in its word; keep the first `size` bytes
        DynSolValue::FixedBytes(word, size) => {
            format!("0x{}", hex::encode(&word.as_slice()[..*size]))
        }
        DynSolValue::Address(a) => a.to_string(),
        DynSolValue::Function(f) => format!("0x{}", hex::encode(f)),
        DynSolValue::Bytes(b) => format!("0x{}", hex::encode(b)),
        DynSolValue::String(s) => s.clone(),
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) => {
            let items: Vec<String> = items.iter().map(format_value).collect();
            format!("[{}]", items.join(", "))
        }
        DynSolValue::Tuple(items) => {
            let items: Vec<String> = items.iter().map(format_value).collect();
            format!("({})", items.join(", "))
        }
        #[allow(unreachable_patterns)]
        other => format!("{other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calldata(hex_str: &str) -> Vec<u8> {
        hex::decode(hex_str.strip_prefix("0x").unwrap_or(hex_str)).unwrap()
    }

    #[test]
    fn test_decode_transfer() {
        let func = Function::parse("transfer(address,uint256)").unwrap();
        let data = calldata("0xa9059cbb000000000000000000000000d8da6bf26964af9d7eed9e03e53415d37aa960450000000000000000000000000000000000000000000000000de0b6b3a7640000");

        let params = decode_params(&func, &data).unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].name, "arg0");
        assert_eq!(params[0].typ, "address");
        assert_eq!(params[1].typ, "uint256");
        assert_eq!(params[1].value, "1000000000000000000");
        assert!(!params[1].unlimited);
    }

    #[test]
    fn test_decode_no_params() {
        let func = Function::parse("pause()").unwrap();
        let params = decode_params(&func, &calldata("0x8456cb59")).unwrap();
        assert!(params.is_empty());
    }

    #[test]
    fn test_max_uint_is_unlimited() {
        let func = Function::parse("approve(address,uint256)").unwrap();
        let data = calldata(concat!(
            "095ea7b3",
            "000000000000000000000000000000000022d473030f116ddee9f6b43ac78ba3",
            "ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff",
        ));
        let params = decode_params(&func, &data).unwrap();
        assert!(params[1].unlimited);
        assert_eq!(params[1].as_uint(), Some(U256::MAX));
    }

    #[test]
    fn test_dynamic_types() {
        let func = Function::parse("upgradeToAndCall(address,bytes)").unwrap();
        let data = calldata(concat!(
            "4f1ef286",
            "0000000000000000000000001111111111111111111111111111111111111111",
            "0000000000000000000000000000000000000000000000000000000000000040",
            "0000000000000000000000000000000000000000000000000000000000000004",
            "8129fc1c00000000000000000000000000000000000000000000000000000000",
        ));
        let params = decode_params(&func, &data).unwrap();
        assert_eq!(params[1].typ, "bytes");
        assert_eq!(params[1].value, "0x8129fc1c");
    }

    #[test]
    fn test_truncated_tail_fails() {
        let func = Function::parse("approve(address,uint256)").unwrap();
        let data = calldata("0x095ea7b3000000000000000000000000000000000022d473030f116ddee9f6b43ac78ba3");
        assert!(matches!(
            decode_params(&func, &data),
            Err(ParamDecodeError::Abi { .. })
        ));
    }

    #[test]
    fn test_wrong_selector_fails() {
        let func = Function::parse("approve(address,uint256)").unwrap();
        assert!(matches!(
            decode_params(&func, &calldata("0xa9059cbb")),
            Err(ParamDecodeError::SelectorMismatch { .. })
        ));
    }
}
