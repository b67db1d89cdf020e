//! Hashes computed at compile time.
//!
//! Message discriminators are the leading 32 bits of SHA-256 over a type's
//! layout signature. Text receivers compare against the representation hash
//! of the cell `[32 zero bits][utf-8 text]`, which for an ordinary cell
//! without references is SHA-256 over its two descriptor bytes followed by
//! the data.

use std::fmt::Write as _;

use sha2::{Digest, Sha256};

use crate::allocation::CELL_BITS;
use crate::error::{CodegenError, CodegenResult};

/// Longest text that fits one cell after the zero opcode.
pub const MAX_COMMENT_BYTES: usize = CELL_BITS as usize / 8 - 4;

/// Discriminator for a layout signature such as `Deploy{queryId:uint64}`.
pub fn message_id(signature: &str) -> u32 {
    let digest = Sha256::digest(signature.as_bytes());
    u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
}

/// Representation hash of the comment cell carrying `comment`, as 64 hex digits.
pub fn comment_hash(comment: &str) -> CodegenResult<String> {
    let text = comment.as_bytes();
    if text.len() > MAX_COMMENT_BYTES {
        return Err(CodegenError::CommentTooLong {
            comment: comment.to_string(),
            bytes: text.len(),
            max: MAX_COMMENT_BYTES,
        });
    }
    // Byte-aligned data: d2 = floor(bits / 8) + ceil(bits / 8).
    let data_bytes = text.len() + 4;
    let d2 = u8::try_from(data_bytes * 2).unwrap_or(u8::MAX);

    let mut hasher = Sha256::new();
    hasher.update([0u8, d2]);
    hasher.update([0u8; 4]);
    hasher.update(text);
    Ok(to_hex(&hasher.finalize()))
}

fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}
