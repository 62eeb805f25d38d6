//! Compute budget program instructions.

use crate::transaction::SolInstruction;

/// `ComputeBudget111111111111111111111111111111`
pub const COMPUTE_BUDGET_PROGRAM_ID: [u8; 32] = [
    0x03, 0x06, 0x46, 0x6f, 0xe5, 0x21, 0x17, 0x32, 0xff, 0xec, 0xad, 0xba, 0x72, 0xc3, 0x9b,
    0xe7, 0xbc, 0x8c, 0xe5, 0xbb, 0xc5, 0xf7, 0x12, 0x6b, 0x2c, 0x43, 0x9b, 0x3a, 0x40, 0x00,
    0x00, 0x00,
];

pub const SET_COMPUTE_UNIT_LIMIT: u8 = 2;
pub const SET_COMPUTE_UNIT_PRICE: u8 = 3;

pub fn set_compute_unit_limit(units: u32) -> SolInstruction {
    let mut data = vec![SET_COMPUTE_UNIT_LIMIT];
    data.extend_from_slice(&units.to_le_bytes());
    SolInstruction {
        program_id: COMPUTE_BUDGET_PROGRAM_ID,
        accounts: Vec::new(),
        data,
    }
}

/// Price in micro-lamports per compute unit.
pub fn set_compute_unit_price(micro_lamports: u64) -> SolInstruction {
    let mut data = vec![SET_COMPUTE_UNIT_PRICE];
    data.extend_from_slice(&micro_lamports.to_le_bytes());
    SolInstruction {
        program_id: COMPUTE_BUDGET_PROGRAM_ID,
        accounts: Vec::new(),
        data,
    }
}

/// The limit instruction, followed by the price instruction when the price
/// is non-zero.
pub fn budget_instructions(unit_limit: u32, unit_price: u64) -> Vec<SolInstruction> {
    let mut instructions = vec![set_compute_unit_limit(unit_limit)];
    if unit_price > 0 {
        instructions.push(set_compute_unit_price(unit_price));
    }
    instructions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::bytes_to_address;

    #[test]
    fn program_id_matches_base58() {
        assert_eq!(
            bytes_to_address(&COMPUTE_BUDGET_PROGRAM_ID),
            "ComputeBudget111111111111111111111111111111"
        );
    }

    #[test]
    fn instruction_data() {
        assert_eq!(set_compute_unit_limit(100_000).data, vec![2, 0xa0, 0x86, 0x01, 0x00]);
        assert_eq!(
            set_compute_unit_price(10_000).data,
            vec![3, 0x10, 0x27, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn zero_price_is_omitted() {
        assert_eq!(budget_instructions(100_000, 0).len(), 1);
        let both = budget_instructions(100_000, 5);
        assert_eq!(both.len(), 2);
        assert_eq!(both[0].data[0], SET_COMPUTE_UNIT_LIMIT);
        assert_eq!(both[1].data[0], SET_COMPUTE_UNIT_PRICE);
    }
}
