//! Per-token initialization vectors.

use rand::RngCore;

/// IV length in bytes (one AES block).
pub const IV_LEN: usize = 16;

const WORD: usize = 4;

/// Draw a fresh IV and mix it with the configured seed.
///
/// The random half guarantees a new IV per token; the seed makes the IV
/// unpredictable to anyone without the configuration. Neither half provides
/// integrity protection.
pub fn generate_iv(seed: &[u8; IV_LEN]) -> [u8; IV_LEN] {
    // Generate 16 bytes of cryptographically secure random data
    let mut random = [0u8; IV_LEN];
    rand::rngs::OsRng.fill_bytes(&mut random);

    // Mix with the seed word by word
    mix(&random, seed)
}

/// XOR `random` and `seed` as four big-endian 32-bit words, preserving order.
pub fn mix(random: &[u8; IV_LEN], seed: &[u8; IV_LEN]) -> [u8; IV_LEN] {
    let mut iv = [0u8; IV_LEN];

    for ((out, r), s) in iv
        .chunks_exact_mut(WORD)
        .zip(random.chunks_exact(WORD))
        .zip(seed.chunks_exact(WORD))
    {
        let r = u32::from_be_bytes([r[0], r[1], r[2], r[3]]);
        let s = u32::from_be_bytes([s[0], s[1], s[2], s[3]]);
        out.copy_from_slice(&(r ^ s).to_be_bytes());
    }

    iv
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: &[u8; IV_LEN] = b"fedcba9876543210";

    #[test]
    fn test_mix_with_zero_random_is_seed() {
        assert_eq!(mix(&[0u8; IV_LEN], SEED), *SEED);
    }

    #[test]
    fn test_mix_is_bytewise_xor() {
        let random: [u8; IV_LEN] = core::array::from_fn(|i| (i as u8).wrapping_mul(37));
        let iv = mix(&random, SEED);
        for i in 0..IV_LEN {
            assert_eq!(iv[i], random[i] ^ SEED[i]);
        }
    }

    #[test]
    fn test_mix_is_reversible() {
        let random = [0xA5u8; IV_LEN];
        let iv = mix(&random, SEED);
        assert_eq!(mix(&iv, SEED), random);
    }

    #[test]
    fn test_generate_iv_is_fresh() {
        let iv1 = generate_iv(SEED);
        let iv2 = generate_iv(SEED);
        assert_eq!(iv1.len(), IV_LEN);
        assert_ne!(iv1, iv2);
    }
}
