//! SPL memo instructions.

use crate::transaction::{SolAccountMeta, SolInstruction};

/// `MemoSq4gqABAXKb96qnH8TysNcWxMyWCqXgDLGmfcHr`
pub const MEMO_PROGRAM_ID: [u8; 32] = [
    0x05, 0x4a, 0x53, 0x5a, 0x99, 0x29, 0x21, 0x06, 0x4d, 0x24, 0xe8, 0x71, 0x60, 0xda, 0x38,
    0x7c, 0x7c, 0x35, 0xb5, 0xdd, 0xbc, 0x92, 0xbb, 0x81, 0xe4, 0x1f, 0xa8, 0x40, 0x41, 0x05,
    0x44, 0x8d,
];

/// A UTF-8 memo signed by `signer`.
pub fn memo(signer: &[u8; 32], text: &str) -> SolInstruction {
    SolInstruction {
        program_id: MEMO_PROGRAM_ID,
        accounts: vec![SolAccountMeta::writable(*signer, true)],
        data: text.as_bytes().to_vec(),
    }
}

/// `Some(memo)` for a non-empty memo.
pub fn optional_memo(signer: &[u8; 32], text: Option<&str>) -> Option<SolInstruction> {
    text.filter(|t| !t.is_empty()).map(|t| memo(signer, t))
}
