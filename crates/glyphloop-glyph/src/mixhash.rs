//! Stateless integer mixers.
//!
//! Glyph geometry must be reproducible from the quantized observable
//! bucket alone, so none of these functions hold state or touch the
//! world's random generator. Every output is a pure function of its
//! inputs.

const FNV_OFFSET: u32 = 0x811C_9DC5;
const FNV_PRIME: u32 = 0x0100_0193;

/// Order-sensitive 32-bit hash of a byte sequence.
///
/// FNV-1a followed by a bijective avalanche. Each step is a bijection of
/// the running state, so changing any single byte always changes the
/// result.
pub fn signature_hash(bytes: &[u8]) -> u32 {
    let mut h = FNV_OFFSET;
    for &b in bytes {
        h ^= u32::from(b);
        h = h.wrapping_mul(FNV_PRIME);
    }
    avalanche32(h)
}

/// Murmur3 32-bit finalizer.
pub const fn avalanche32(mut h: u32) -> u32 {
    h ^= h >> 16;
    h = h.wrapping_mul(0x85EB_CA6B);
    h ^= h >> 13;
    h = h.wrapping_mul(0xC2B2_AE35);
    h ^= h >> 16;
    h
}

/// `SplitMix64` finalizer.
pub const fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Derive a value for element `index` of shape part `part` from `seed`.
pub const fn derive(seed: u64, part: u64, index: u64) -> u64 {
    mix64(seed ^ mix64(part.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ index))
}

/// Map a 64-bit value to `[0, 1)` using its top 53 bits.
pub fn unit(x: u64) -> f64 {
    (x >> 11) as f64 / (1_u64 << 53) as f64
}
