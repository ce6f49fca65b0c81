// src/blockchain/abi.rs
//! The small slice of the Solidity ABI the registry contract needs: a
//! `bytes32` argument, a `bool` return and a list of `string` returns.

use sha3::{Digest, Keccak256};

use super::LedgerError;
use crate::core::identity::types::{RecordFields, RECORD_FIELD_COUNT};

const WORD: usize = 32;

pub const VERIFY_DOCUMENT: &str = "verifyDocument(bytes32)";
pub const GET_DETAILS: &str = "getStudentDetails(bytes32)";

pub fn selector(signature: &str) -> [u8; 4] {
    let hash = Keccak256::digest(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Calldata for a function taking a single `bytes32`.
pub fn encode_bytes32_call(signature: &str, arg: &[u8; WORD]) -> Vec<u8> {
    let mut data = Vec::with_capacity(4 + WORD);
    data.extend_from_slice(&selector(signature));
    data.extend_from_slice(arg);
    data
}

pub fn decode_bool(data: &[u8]) -> Result<bool, LedgerError> {
    let word = read_word(data, 0)?;
    if word[..WORD - 1].iter().any(|b| *b != 0) {
        return Err(LedgerError::Decode("bool word has high bits set".into()));
    }
    match word[WORD - 1] {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(LedgerError::Decode(format!("invalid bool value {}", other))),
    }
}

/// Decodes the registry's twelve string outputs.
///
/// Both encodings a contract may produce are accepted: twelve separate
/// return values, or a single struct wrapping them (one leading offset word).
pub fn decode_record(data: &[u8]) -> Result<RecordFields, LedgerError> {
    let strings = match decode_strings(data, 0, RECORD_FIELD_COUNT) {
        Ok(strings) => strings,
        Err(direct) => {
            if read_usize(data, 0)? != WORD {
                return Err(direct);
            }
            decode_strings(data, WORD, RECORD_FIELD_COUNT)?
        }
    };

    let values: [String; RECORD_FIELD_COUNT] = strings
        .try_into()
        .map_err(|_| LedgerError::Decode("wrong number of record fields".into()))?;
    Ok(RecordFields::from_tuple(values))
}

/// Decodes `count` dynamic strings whose head starts at `base`. Offsets are
/// relative to `base`.
pub fn decode_strings(data: &[u8], base: usize, count: usize) -> Result<Vec<String>, LedgerError> {
    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        let offset = read_usize(data, base + i * WORD)?;
        let start = base
            .checked_add(offset)
            .ok_or_else(|| LedgerError::Decode("string offset overflow".into()))?;
        if start < base + count * WORD {
            return Err(LedgerError::Decode(format!(
                "string {} points into the head section",
                i
            )));
        }
        let len = read_usize(data, start)?;
        let body_start = start
            .checked_add(WORD)
            .ok_or_else(|| LedgerError::Decode("string offset overflow".into()))?;
        let body_end = body_start
            .checked_add(len)
            .filter(|end| *end <= data.len())
            .ok_or_else(|| LedgerError::Decode(format!("string {} runs past end of data", i)))?;
        let value = String::from_utf8(data[body_start..body_end].to_vec())
            .map_err(|e| LedgerError::Decode(format!("string {} is not UTF-8: {}", i, e)))?;
        out.push(value);
    }
    Ok(out)
}

/// Encodes strings as consecutive dynamic return values.
pub fn encode_strings(values: &[&str]) -> Vec<u8> {
    let mut head = Vec::with_capacity(values.len() * WORD);
    let mut tail = Vec::new();
    for value in values {
        head.extend_from_slice(&usize_word(values.len() * WORD + tail.len()));
        tail.extend_from_slice(&usize_word(value.len()));
        tail.extend_from_slice(value.as_bytes());
        let padding = (WORD - value.len() % WORD) % WORD;
        tail.extend(std::iter::repeat(0u8).take(padding));
    }
    head.extend_from_slice(&tail);
    head
}

pub fn encode_bool(value: bool) -> Vec<u8> {
    usize_word(value as usize).to_vec()
}

fn usize_word(value: usize) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[WORD - 8..].copy_from_slice(&(value as u64).to_be_bytes());
    word
}

fn read_word(data: &[u8], at: usize) -> Result<&[u8], LedgerError> {
    at.checked_add(WORD)
        .and_then(|end| data.get(at..end))
        .ok_or_else(|| {
            LedgerError::Decode(format!(
                "need a word at offset {}, data is {} bytes",
                at,
                data.len()
            ))
        })
}

fn read_usize(data: &[u8], at: usize) -> Result<usize, LedgerError> {
    let word = read_word(data, at)?;
    if word[..WORD - 8].iter().any(|b| *b != 0) {
        return Err(LedgerError::Decode(format!("value at offset {} is too large", at)));
    }
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&word[WORD - 8..]);
    usize::try_from(u64::from_be_bytes(buf))
        .map_err(|_| LedgerError::Decode(format!("value at offset {} is too large", at)))
}
