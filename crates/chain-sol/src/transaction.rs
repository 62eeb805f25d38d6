//! Solana transaction wire format and signing.
//!
//! Transactions are built by hand, without `solana-sdk`:
//!
//! ```text
//! Transaction:
//!   num_signatures          compact-u16
//!   signatures              64 bytes * num_signatures
//!   message:
//!     [version prefix]      0x80 | version, v0 messages only
//!     num_required_sigs     u8
//!     num_readonly_signed   u8
//!     num_readonly_unsigned u8
//!     num_accounts          compact-u16
//!     account_keys          32 bytes * num_accounts
//!     recent_blockhash      32 bytes
//!     num_instructions      compact-u16
//!     instructions[]
//!     [address lookups]     v0 messages only
//!
//! Instruction:
//!   program_id_index        u8
//!   num_accounts            compact-u16
//!   account_indices         u8 * num_accounts
//!   data_len                compact-u16
//!   data                    u8 * data_len
//! ```

use ed25519_dalek::{Signer, SigningKey};

use crate::compute_budget::{
    COMPUTE_BUDGET_PROGRAM_ID, SET_COMPUTE_UNIT_LIMIT, SET_COMPUTE_UNIT_PRICE,
};
use crate::error::SolError;

pub const SIGNATURE_LEN: usize = 64;

/// Flag set on the first message byte of versioned messages.
const VERSION_PREFIX_MASK: u8 = 0x80;

/// Encodes a `u16` as Solana's compact-u16 (1 to 3 bytes).
pub fn encode_compact_u16(value: u16) -> Vec<u8> {
    let mut val = value as u32;
    let mut out = Vec::with_capacity(3);

    loop {
        let mut byte = (val & 0x7f) as u8;
        val >>= 7;
        if val > 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if val == 0 {
            break;
        }
    }

    out
}

/// Decodes a compact-u16, returning `(value, bytes_consumed)`.
pub fn decode_compact_u16(data: &[u8]) -> Result<(u16, usize), SolError> {
    let mut value: u32 = 0;
    let mut consumed = 0usize;

    loop {
        let byte = *data.get(consumed).ok_or_else(|| {
            SolError::SerializationError("unexpected end of data while decoding compact-u16".into())
        })?;
        value |= ((byte & 0x7f) as u32) << (7 * consumed);
        consumed += 1;

        if byte & 0x80 == 0 || consumed >= 3 {
            break;
        }
    }

    let value = u16::try_from(value)
        .map_err(|_| SolError::SerializationError("compact-u16 value overflow".into()))?;
    Ok((value, consumed))
}

fn compact_len(len: usize) -> Result<Vec<u8>, SolError> {
    u16::try_from(len)
        .map(encode_compact_u16)
        .map_err(|_| SolError::SerializationError(format!("length {len} exceeds compact-u16")))
}

/// An account reference in an instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolAccountMeta {
    pub pubkey: [u8; 32],
    pub is_signer: bool,
    pub is_writable: bool,
}

impl SolAccountMeta {
    pub fn writable(pubkey: [u8; 32], is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: true,
        }
    }

    pub fn readonly(pubkey: [u8; 32], is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: false,
        }
    }
}

/// An instruction before it is compiled into a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolInstruction {
    pub program_id: [u8; 32],
    pub accounts: Vec<SolAccountMeta>,
    pub data: Vec<u8>,
}

/// A compiled legacy message.
#[derive(Debug, Clone)]
pub struct SolTransaction {
    /// Writable signers, read-only signers, writable non-signers, then
    /// read-only non-signers. The fee payer is always first.
    pub account_keys: Vec<[u8; 32]>,
    pub num_required_signatures: u8,
    pub num_readonly_signed: u8,
    pub num_readonly_unsigned: u8,
    pub recent_blockhash: [u8; 32],
    pub compiled_instructions: Vec<CompiledInstruction>,
}

/// An instruction whose accounts are indices into `account_keys`.
#[derive(Debug, Clone)]
pub struct CompiledInstruction {
    pub program_id_index: u8,
    pub account_indices: Vec<u8>,
    pub data: Vec<u8>,
}

/// Compiles instructions into a message paid for by `fee_payer`.
pub fn compile_transaction(
    instructions: &[SolInstruction],
    fee_payer: &[u8; 32],
    recent_blockhash: &[u8; 32],
) -> Result<SolTransaction, SolError> {
    struct AccountEntry {
        pubkey: [u8; 32],
        is_signer: bool,
        is_writable: bool,
    }

    let mut entries: Vec<AccountEntry> = Vec::new();
    let mut upsert = |pubkey: [u8; 32], signer: bool, writable: bool| {
        if let Some(entry) = entries.iter_mut().find(|e| e.pubkey == pubkey) {
            entry.is_signer |= signer;
            entry.is_writable |= writable;
        } else {
            entries.push(AccountEntry {
                pubkey,
                is_signer: signer,
                is_writable: writable,
            });
        }
    };

    upsert(*fee_payer, true, true);
    for ix in instructions {
        for meta in &ix.accounts {
            upsert(meta.pubkey, meta.is_signer, meta.is_writable);
        }
        upsert(ix.program_id, false, false);
    }

    // Stable, so the fee payer stays ahead of other writable signers.
    entries.sort_by_key(|e| match (e.is_signer, e.is_writable) {
        (true, true) => 0u8,
        (true, false) => 1,
        (false, true) => 2,
        (false, false) => 3,
    });

    let count = |pred: fn(&AccountEntry) -> bool| -> Result<u8, SolError> {
        u8::try_from(entries.iter().filter(|e| pred(e)).count())
            .map_err(|_| SolError::TransactionBuildError("too many accounts".into()))
    };
    let num_required_signatures = count(|e| e.is_signer)?;
    let num_readonly_signed = count(|e| e.is_signer && !e.is_writable)?;
    let num_readonly_unsigned = count(|e| !e.is_signer && !e.is_writable)?;

    let account_keys: Vec<[u8; 32]> = entries.iter().map(|e| e.pubkey).collect();
    let index_of = |key: &[u8; 32]| -> Result<u8, SolError> {
        account_keys
            .iter()
            .position(|k| k == key)
            .and_then(|i| u8::try_from(i).ok())
            .ok_or_else(|| SolError::TransactionBuildError("account not in account keys".into()))
    };

    let compiled_instructions = instructions
        .iter()
        .map(|ix| {
            Ok(CompiledInstruction {
                program_id_index: index_of(&ix.program_id)?,
                account_indices: ix
                    .accounts
                    .iter()
                    .map(|meta| index_of(&meta.pubkey))
                    .collect::<Result<_, SolError>>()?,
                data: ix.data.clone(),
            })
        })
        .collect::<Result<Vec<_>, SolError>>()?;

    Ok(SolTransaction {
        account_keys,
        num_required_signatures,
        num_readonly_signed,
        num_readonly_unsigned,
        recent_blockhash: *recent_blockhash,
        compiled_instructions,
    })
}

/// The message bytes that get signed.
pub fn serialize_message(tx: &SolTransaction) -> Result<Vec<u8>, SolError> {
    let mut buf = Vec::with_capacity(256);

    buf.push(tx.num_required_signatures);
    buf.push(tx.num_readonly_signed);
    buf.push(tx.num_readonly_unsigned);

    buf.extend_from_slice(&compact_len(tx.account_keys.len())?);
    for key in &tx.account_keys {
        buf.extend_from_slice(key);
    }

    buf.extend_from_slice(&tx.recent_blockhash);

    buf.extend_from_slice(&compact_len(tx.compiled_instructions.len())?);
    for ix in &tx.compiled_instructions {
        buf.push(ix.program_id_index);
        buf.extend_from_slice(&compact_len(ix.account_indices.len())?);
        buf.extend_from_slice(&ix.account_indices);
        buf.extend_from_slice(&compact_len(ix.data.len())?);
        buf.extend_from_slice(&ix.data);
    }

    Ok(buf)
}

/// Signs a single-signer message and returns the wire bytes.
pub fn sign_transaction(tx: &SolTransaction, private_key: &[u8; 32]) -> Result<Vec<u8>, SolError> {
    if tx.num_required_signatures != 1 {
        return Err(SolError::SigningError(format!(
            "expected one signer, message requires {}",
            tx.num_required_signatures
        )));
    }
    let message = serialize_message(tx)?;
    let signature = SigningKey::from_bytes(private_key).sign(&message);

    let raw = RawTransaction {
        signatures: vec![signature.to_bytes()],
        message,
    };
    Ok(raw.to_bytes())
}

/// A transaction split into its signature slots and message bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTransaction {
    pub signatures: Vec<[u8; SIGNATURE_LEN]>,
    pub message: Vec<u8>,
}

impl RawTransaction {
    pub fn parse(bytes: &[u8]) -> Result<Self, SolError> {
        let (count, offset) = decode_compact_u16(bytes)?;
        if count == 0 {
            return Err(SolError::TransactionBuildError(
                "transaction has zero signatures".into(),
            ));
        }
        let message_start = offset + count as usize * SIGNATURE_LEN;
        if message_start > bytes.len() {
            return Err(SolError::SerializationError(
                "transaction too short: signature slots exceed length".into(),
            ));
        }

        let signatures = bytes[offset..message_start]
            .chunks_exact(SIGNATURE_LEN)
            .map(|chunk| {
                let mut slot = [0u8; SIGNATURE_LEN];
                slot.copy_from_slice(chunk);
                slot
            })
            .collect();
        Ok(Self {
            signatures,
            message: bytes[message_start..].to_vec(),
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = encode_compact_u16(self.signatures.len() as u16);
        for signature in &self.signatures {
            out.extend_from_slice(signature);
        }
        out.extend_from_slice(&self.message);
        out
    }

    /// Public keys expected to sign, in slot order.
    pub fn signer_keys(&self) -> Result<Vec<[u8; 32]>, SolError> {
        let layout = MessageLayout::parse(&self.message)?;
        Ok(layout
            .account_keys(&self.message)
            .take(layout.num_required_signatures)
            .collect())
    }

    /// Signs the message into the slot of the key's public key.
    pub fn sign(&mut self, private_key: &[u8; 32]) -> Result<[u8; SIGNATURE_LEN], SolError> {
        let signing_key = SigningKey::from_bytes(private_key);
        let pubkey = signing_key.verifying_key().to_bytes();

        let slot = self
            .signer_keys()?
            .iter()
            .position(|key| *key == pubkey)
            .ok_or_else(|| {
                SolError::SigningError("wallet pubkey not found in transaction signers".into())
            })?;
        let signature = signing_key.sign(&self.message).to_bytes();
        let target = self.signatures.get_mut(slot).ok_or_else(|| {
            SolError::SerializationError(format!("no signature slot {slot}"))
        })?;
        *target = signature;
        Ok(signature)
    }

    /// Rewrites existing compute-budget instructions in place. Messages
    /// without them are left untouched. Returns how many were rewritten.
    pub fn set_compute_budget(&mut self, unit_limit: u32, unit_price: u64) -> Result<usize, SolError> {
        let layout = MessageLayout::parse(&self.message)?;
        let Some(program_index) = layout
            .account_keys(&self.message)
            .position(|key| key == COMPUTE_BUDGET_PROGRAM_ID)
        else {
            return Ok(0);
        };

        let mut rewritten = 0;
        for ix in layout.instructions(&self.message)? {
            if ix.program_index as usize != program_index {
                continue;
            }
            let data = &mut self.message[ix.data.clone()];
            match (data.first().copied(), data.len()) {
                (Some(SET_COMPUTE_UNIT_LIMIT), 5) => {
                    data[1..].copy_from_slice(&unit_limit.to_le_bytes());
                    rewritten += 1;
                }
                (Some(SET_COMPUTE_UNIT_PRICE), 9) => {
                    data[1..].copy_from_slice(&unit_price.to_le_bytes());
                    rewritten += 1;
                }
                _ => {}
            }
        }
        Ok(rewritten)
    }
}

/// Signs a pre-built transaction in the signer slot that matches the key.
pub fn sign_raw_transaction(private_key: &[u8; 32], raw_tx: &[u8]) -> Result<Vec<u8>, SolError> {
    let mut tx = RawTransaction::parse(raw_tx)?;
    tx.sign(private_key)?;
    Ok(tx.to_bytes())
}

/// Offsets into a serialized message.
struct MessageLayout {
    num_required_signatures: usize,
    keys_start: usize,
    num_keys: usize,
    instructions_start: usize,
}

struct InstructionSpan {
    program_index: u8,
    data: std::ops::Range<usize>,
}

impl MessageLayout {
    fn parse(message: &[u8]) -> Result<Self, SolError> {
        let header = match message.first() {
            Some(byte) if byte & VERSION_PREFIX_MASK != 0 => 1,
            Some(_) => 0,
            None => return Err(SolError::SerializationError("empty message".into())),
        };
        let too_short = || SolError::SerializationError("transaction message too short".into());

        let num_required_signatures = *message.get(header).ok_or_else(too_short)? as usize;
        let counts_end = header + 3;
        let (num_keys, len) = decode_compact_u16(message.get(counts_end..).ok_or_else(too_short)?)?;
        let keys_start = counts_end + len;
        let keys_end = keys_start + num_keys as usize * 32;
        let instructions_start = keys_end + 32;
        if instructions_start > message.len() {
            return Err(SolError::SerializationError(
                "transaction message too short for account keys".into(),
            ));
        }

        Ok(Self {
            num_required_signatures,
            keys_start,
            num_keys: num_keys as usize,
            instructions_start,
        })
    }

    fn account_keys<'a>(&self, message: &'a [u8]) -> impl Iterator<Item = [u8; 32]> + 'a {
        message[self.keys_start..self.keys_start + self.num_keys * 32]
            .chunks_exact(32)
            .map(|chunk| {
                let mut key = [0u8; 32];
                key.copy_from_slice(chunk);
                key
            })
    }

    fn instructions(&self, message: &[u8]) -> Result<Vec<InstructionSpan>, SolError> {
        let too_short = || SolError::SerializationError("truncated instruction".into());
        let mut offset = self.instructions_start;
        let (count, len) = decode_compact_u16(message.get(offset..).ok_or_else(too_short)?)?;
        offset += len;

        let mut spans = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let program_index = *message.get(offset).ok_or_else(too_short)?;
            offset += 1;
            let (accounts, len) = decode_compact_u16(message.get(offset..).ok_or_else(too_short)?)?;
            offset += len + accounts as usize;
            let (data_len, len) = decode_compact_u16(message.get(offset..).ok_or_else(too_short)?)?;
            offset += len;
            let data = offset..offset + data_len as usize;
            if data.end > message.len() {
                return Err(too_short());
            }
            offset = data.end;
            spans.push(InstructionSpan {
                program_index,
                data,
            });
        }
        Ok(spans)
    }
}
