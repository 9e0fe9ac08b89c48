//! Bit-exact identity string formats (spec §6 "Identity string formats").

/// Number of hex digits in a pageview/session identity (80 random bits).
pub const SCOPE_ID_HEX_LEN: usize = 20;

/// Number of hex digits in an activity sequence suffix.
pub const ACTIVITY_SEQ_HEX_LEN: usize = 4;

/// Render a 16-bit activity sequence number as exactly four lowercase hex
/// digits, e.g. `1` -> `"0001"`.
///
/// Per spec §4.2, behaviour for `n >= 0x1_0000` is an open design choice; we
/// wrap (`n & 0xFFFF`) rather than panic, so a runaway activity count never
/// takes down the host application (see DESIGN.md "activity overflow").
pub fn hex4(n: u32) -> String {
    format!("{:04x}", n & 0xFFFF)
}

/// Zero-pad a random byte string to the canonical 20-hex-digit scope identity.
pub fn scope_id_from_bytes(bytes: &[u8]) -> String {
    let mut hex = String::with_capacity(SCOPE_ID_HEX_LEN);
    for b in bytes {
        hex.push_str(&format!("{:02x}", b));
    }
    hex.truncate(SCOPE_ID_HEX_LEN);
    while hex.len() < SCOPE_ID_HEX_LEN {
        hex.insert(0, '0');
    }
    hex
}

/// Concatenate a scope identity with a sequence number to form an activity id.
pub fn activity_id(scope_id: &str, seq: u32) -> String {
    format!("{scope_id}{}", hex4(seq))
}
