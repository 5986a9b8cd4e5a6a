//! MultiSend batch parsing and aggregation

use alloy::primitives::{Address, U256};

use crate::catalog::MULTISEND_SELECTOR;
use crate::error::DecodeError;
use crate::types::{BatchInfo, BatchSummary, BucketCounts, Operation, Severity, SubCall};

/// One packed record: `operation(1) | to(20) | value(32) | dataLength(32) | data`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRecord {
    pub operation: Operation,
    pub to: Address,
    pub value: U256,
    pub data: Vec<u8>,
}

pub fn is_multisend(calldata: &[u8]) -> bool {
    calldata.len() >= 4 && calldata[..4] == MULTISEND_SELECTOR[..]
}

/// Bounds-checked reader over an immutable buffer.
struct ByteCursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn at(bytes: &'a [u8], pos: usize) -> Self {
        Self { bytes, pos }
    }

    fn is_empty(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn take(&mut self, n: usize, field: &str) -> Result<&'a [u8], DecodeError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.bytes.len())
            .ok_or_else(|| {
                DecodeError::invalid(format!(
                    "buffer ends inside '{field}' at byte {} (need {n}, have {})",
                    self.pos,
                    self.bytes.len().saturating_sub(self.pos)
                ))
            })?;
        let out = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn u8(&mut self, field: &str) -> Result<u8, DecodeError> {
        Ok(self.take(1, field)?[0])
    }

    fn address(&mut self, field: &str) -> Result<Address, DecodeError> {
        Ok(Address::from_slice(self.take(20, field)?))
    }

    fn word(&mut self, field: &str) -> Result<U256, DecodeError> {
        Ok(U256::from_be_slice(self.take(32, field)?))
    }

    /// A 32-byte word used as a length or offset.
    fn length(&mut self, field: &str) -> Result<usize, DecodeError> {
        let word = self.take(32, field)?;
        // anything above 2^64 cannot index a real buffer
        if word[..24].iter().any(|&b| b != 0) {
            return Err(DecodeError::invalid(format!("'{field}' is out of range")));
        }
        let mut low = [0u8; 8];
        low.copy_from_slice(&word[24..]);
        usize::try_from(u64::from_be_bytes(low))
            .map_err(|_| DecodeError::invalid(format!("'{field}' is out of range")))
    }
}

/// Extract the packed `transactions` argument from `multiSend(bytes)` calldata.
pub fn multisend_payload(calldata: &[u8]) -> Result<&[u8], DecodeError> {
    if !is_multisend(calldata) {
        return Err(DecodeError::invalid("calldata is not a multiSend(bytes) call"));
    }
    let args = &calldata[4..];
    let offset = ByteCursor::new(args).length("bytes offset")?;
    let mut cursor = ByteCursor::at(args, offset);
    let len = cursor.length("bytes length")?;
    cursor.take(len, "transactions")
}

/// Split packed MultiSend transactions in payload order.
pub fn split_transactions(packed: &[u8], max_calls: usize) -> Result<Vec<BatchRecord>, DecodeError> {
    let mut cursor = ByteCursor::new(packed);
    let mut records = Vec::new();

    while !cursor.is_empty() {
        if records.len() == max_calls {
            return Err(DecodeError::invalid(format!(
                "batch holds more than {max_calls} calls"
            )));
        }
        let index = records.len();
        let flag = cursor.u8("operation")?;
        let operation = Operation::from_flag(flag).ok_or_else(|| {
            DecodeError::invalid(format!("call #{index} has operation flag {flag}, expected 0 or 1"))
        })?;
        let to = cursor.address("to")?;
        let value = cursor.word("value")?;
        let data_len = cursor.length("dataLength")?;
        let data = cursor.take(data_len, "data")?.to_vec();

        records.push(BatchRecord {
            operation,
            to,
            value,
            data,
        });
    }

    tracing::debug!(calls = records.len(), "split multiSend payload");
    Ok(records)
}

/// Parse `multiSend(bytes)` calldata into its records.
pub fn parse_multisend(calldata: &[u8], max_calls: usize) -> Result<Vec<BatchRecord>, DecodeError> {
    split_transactions(multisend_payload(calldata)?, max_calls)
}

/// Tally sub-call header severities. Keeps `calls` in the order given.
pub fn summarize(calls: Vec<SubCall>) -> BatchInfo {
    let mut counts = BucketCounts::default();
    let mut overall = Severity::Ok;
    for call in &calls {
        let severity = call.analysis.header_severity;
        counts.add(severity);
        overall = overall.worst(severity);
    }
    BatchInfo {
        call_count: calls.len(),
        calls,
        batch_summary: BatchSummary {
            counts,
            overall_severity: overall,
        },
    }
}

/// Encode records the way MultiSend packs them.
pub fn encode_transactions(records: &[BatchRecord]) -> Vec<u8> {
    let mut out = Vec::new();
    for r in records {
        out.push(match r.operation {
            Operation::Call => 0,
            Operation::Delegatecall => 1,
        });
        out.extend_from_slice(r.to.as_slice());
        out.extend_from_slice(&r.value.to_be_bytes::<32>());
        out.extend_from_slice(&U256::from(r.data.len()).to_be_bytes::<32>());
        out.extend_from_slice(&r.data);
    }
    out
}
