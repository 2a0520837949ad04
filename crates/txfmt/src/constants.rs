/// `OP_RETURN`.
pub const OP_RETURN: u8 = 0x6a;

/// Push opcode for the 71-byte payload.
pub const OP_PUSHBYTES_71: u8 = 0x47;

/// Protocol tag at the start of the payload.
pub const STAKE_TAG: [u8; 4] = *b"bbn1";

/// Leading script bytes shared by every stake commitment.
pub const MAGIC_PREFIX: [u8; 6] = [
    OP_RETURN,
    OP_PUSHBYTES_71,
    STAKE_TAG[0],
    STAKE_TAG[1],
    STAKE_TAG[2],
    STAKE_TAG[3],
];

/// Length of the pushed payload.
pub const PAYLOAD_LEN: usize = 71;

/// Length of the full null-data script.
pub const STAKE_SCRIPT_LEN: usize = 2 + PAYLOAD_LEN;

/// Suffix the fixed-term layout requires in place of a free staking time.
pub const FIXED_TERM_SUFFIX: [u8; 2] = [0xfa, 0x00];
