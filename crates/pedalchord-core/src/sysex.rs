//! 7-bit packing and the bank-listing SysEx.
//!
//! Bank names travel as UTF-8 packed into 7-bit safe data bytes. A byte
//! `b >= 0x40` becomes the pair `0x40 | (b & 0x3F)`, `0x40 | ((b & 0xC0) >> 2)`;
//! lower bytes pass through unchanged.
//!
//! The listing message is
//! `F0 7D 00 [<00 ..> <len> <packed name>]* <checksum> F7`, where each full 127
//! bytes of a long name are announced by a `00` marker and the checksum makes
//! the sum of all length and data bytes a multiple of 128.

use crate::error::{Error, Result};
use crate::message::{MidiMessage, END_OF_EXCLUSIVE};

pub const BANK_LIST_HEADER: [u8; 3] = [0xF0, 0x7D, 0x00];

const MAX_CHUNK: usize = 127;

pub fn pack_7bit(bytes: &[u8]) -> Vec<u8> {
    let mut packed = Vec::with_capacity(bytes.len() * 2);
    for &byte in bytes {
        if byte >= 0x40 {
            packed.push(0x40 | (byte & 0x3F));
            packed.push(0x40 | ((byte & 0xC0) >> 2));
        } else {
            packed.push(byte);
        }
    }
    packed
}

pub fn unpack_7bit(packed: &[u8]) -> Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity(packed.len());
    let mut iter = packed.iter().copied();
    while let Some(byte) = iter.next() {
        if byte < 0x40 {
            bytes.push(byte);
            continue;
        }
        match iter.next() {
            Some(control @ (0x50 | 0x60 | 0x70)) => {
                bytes.push((byte & 0x3F) | ((control & 0x30) << 2));
            }
            Some(other) => {
                return Err(Error::Decode(format!(
                    "byte {:02X} followed by invalid control byte {:02X}",
                    byte, other
                )));
            }
            None => {
                return Err(Error::Decode(format!(
                    "byte {:02X} is missing its control byte",
                    byte
                )));
            }
        }
    }
    Ok(bytes)
}

/// `(128 - sum % 128) % 128`, always a valid data byte.
pub fn checksum(bytes: &[u8]) -> u8 {
    let sum: u32 = bytes.iter().map(|b| *b as u32).sum();
    ((128 - sum % 128) % 128) as u8
}

fn push_length(out: &mut Vec<u8>, len: usize) {
    let mut remaining = len;
    while remaining > MAX_CHUNK {
        out.push(0x00);
        remaining -= MAX_CHUNK;
    }
    out.push(remaining as u8);
}

/// Builds the bank-listing SysEx for `names`, in bank order.
pub fn build_bank_list<S: AsRef<str>>(names: &[S]) -> Result<MidiMessage> {
    let mut body = Vec::new();
    for (index, name) in names.iter().enumerate() {
        let packed = pack_7bit(name.as_ref().as_bytes());
        if packed.is_empty() {
            return Err(Error::Config(format!("bank {} has an empty name", index + 1)));
        }
        push_length(&mut body, packed.len());
        body.extend_from_slice(&packed);
    }

    let mut bytes = Vec::with_capacity(BANK_LIST_HEADER.len() + body.len() + 2);
    bytes.extend_from_slice(&BANK_LIST_HEADER);
    bytes.extend_from_slice(&body);
    bytes.push(checksum(&body));
    bytes.push(END_OF_EXCLUSIVE);
    Ok(MidiMessage::from(bytes))
}

/// Decodes a bank-listing SysEx back into bank names.
pub fn decode_bank_list(message: &[u8]) -> Result<Vec<String>> {
    let body = message
        .strip_prefix(&BANK_LIST_HEADER[..])
        .ok_or_else(|| Error::Decode("missing bank list header".to_string()))?;
    let (checksum_byte, body) = match body {
        [body @ .., checksum_byte, END_OF_EXCLUSIVE] => (*checksum_byte, body),
        _ => return Err(Error::Decode("truncated bank list".to_string())),
    };
    if checksum(body) != checksum_byte {
        return Err(Error::Decode(format!(
            "bank list checksum mismatch: expected {:02X}, got {:02X}",
            checksum(body),
            checksum_byte
        )));
    }

    let mut names = Vec::new();
    let mut pos = 0;
    while pos < body.len() {
        let mut len = 0usize;
        loop {
            let byte = *body
                .get(pos)
                .ok_or_else(|| Error::Decode("bank list ends inside a length".to_string()))?;
            pos += 1;
            if byte == 0x00 {
                len += MAX_CHUNK;
            } else {
                len += byte as usize;
                break;
            }
        }

        let packed = body
            .get(pos..pos + len)
            .ok_or_else(|| Error::Decode(format!("bank name of {} bytes is truncated", len)))?;
        pos += len;

        let bytes = unpack_7bit(packed)?;
        let name = String::from_utf8(bytes)
            .map_err(|e| Error::Decode(format!("bank name is not UTF-8: {}", e)))?;
        names.push(name);
    }
    Ok(names)
}
