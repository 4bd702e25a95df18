use scrip_bits::BitVector;
use sha3::{Digest, Keccak224};

use crate::errors::TicketError;

/// Width of the Keccak-224 digest, the largest hash any spec may request.
pub(crate) const DIGEST_SIZE_BITS: usize = 224;
pub(crate) const DIGEST_SIZE_BYTES: usize = DIGEST_SIZE_BITS / 8;

/// Bits reserved at the end of the digest for the nonce seed; bounds the
/// encrypted payload to `224 - 64` bits.
pub(crate) const MAX_SECRET_BITS: usize = DIGEST_SIZE_BITS - 64;

/// One pre-keyed Keccak-224 state per specification.
///
/// The key (when present) is absorbed once at construction; every digest
/// evaluation clones the stored state, so concurrent calls never contend
/// and the prekeys are never mutated after construction.
#[derive(Clone)]
pub(crate) struct DigestSet {
    prekeys: Vec<Keccak224>,
}

impl DigestSet {
    /// Builds prekeys for `spec_count` specs from at most `spec_count`
    /// secrets. An empty secret leaves the spec unkeyed; specs beyond the
    /// last secret reuse its prekey.
    pub(crate) fn new(spec_count: usize, secrets: &[&[u8]]) -> Result<Self, TicketError> {
        if secrets.len() > spec_count {
            return Err(TicketError::invalid("more secrets than specifications"));
        }
        let vanilla = Keccak224::new();
        let mut current = vanilla.clone();
        let mut prekeys = Vec::with_capacity(spec_count);
        for &secret in secrets {
            current = vanilla.clone();
            if !secret.is_empty() {
                current.update(secret);
            }
            prekeys.push(current.clone());
        }
        for _ in secrets.len()..spec_count {
            prekeys.push(current.clone());
        }
        Ok(Self { prekeys })
    }

    /// Digest of `bytes` under the spec's prekey.
    pub(crate) fn digest(&self, spec_index: usize, bytes: &[u8]) -> [u8; DIGEST_SIZE_BYTES] {
        let mut state = self.prekeys[spec_index].clone();
        state.update(bytes);
        state.finalize().into()
    }

    /// The leading `length` bits of the digest over `bytes`, empty when
    /// the spec requests no hash.
    pub(crate) fn hash_tag(&self, spec_index: usize, length: u32, bytes: &[u8]) -> BitVector {
        if length == 0 {
            return BitVector::new();
        }
        let digest = self.digest(spec_index, bytes);
        BitVector::from_bytes(&digest, length as usize)
    }
}

/// Derives the length-hiding nonce from the tail of the encryption
/// digest: a deterministic LCG seeded from the last eight digest bytes
/// picks a bit length in 17..=32 and fills the low bits, so the emitted
/// secret-block length reveals the nonce draw rather than the payload
/// size.
pub(crate) fn derive_nonce(digest: &[u8; DIGEST_SIZE_BYTES]) -> u64 {
    let mut seed_bytes = [0u8; 8];
    seed_bytes.copy_from_slice(&digest[DIGEST_SIZE_BYTES - 8..]);
    let mut rng = Lcg(u64::from_be_bytes(seed_bytes));
    let count = 16 + rng.next_u32() % 16;
    let bits = u64::from(rng.next_u32());
    (1 << count) | (bits & ((1 << count) - 1))
}

// Knuth's MMIX multiplier/increment; only the high half is drawn.
struct Lcg(u64);

impl Lcg {
    fn next_u32(&mut self) -> u32 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (self.0 >> 32) as u32
    }
}

#[cfg(test)]
#[allow(clippy::missing_assert_message)]
mod tests {
    use super::*;

    fn finalized_hex(state: &Keccak224) -> String {
        hex::encode(state.clone().finalize())
    }

    // Known-answer vectors for Keccak-224 (original padding, not SHA3).
    #[test]
    fn keccak224_known_answers() {
        let mut state = Keccak224::new();
        assert_eq!(
            finalized_hex(&state),
            "f71837502ba8e10837bdd8d365adb85591895602fc552b48b7390abd"
        );
        state.update(b"a");
        let mut forked = state.clone();
        assert_eq!(
            finalized_hex(&state),
            "7cf87d912ee7088d30ec23f8e7100d9319bff090618b439d3fe91308"
        );
        state.update(b"b");
        assert_eq!(
            finalized_hex(&state),
            "2b7904dc1950b9ec7acf9b5d7798e5d6d8b73a220c7801378b6d2592"
        );
        forked.update(b"b");
        assert_eq!(
            finalized_hex(&forked),
            "54927ada38dd4928ba3bc8d40059dbe1ba68ed7f8e3a6fb3b41492f3"
        );
    }

    #[test]
    fn prekeys_extend_to_all_specs() {
        let set = DigestSet::new(3, &[b"key"]).unwrap();
        let a = set.digest(0, b"payload");
        let b = set.digest(1, b"payload");
        let c = set.digest(2, b"payload");
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn empty_secret_is_unkeyed() {
        let keyed = DigestSet::new(2, &[b"", b"key"]).unwrap();
        let plain = DigestSet::new(1, &[]).unwrap();
        assert_eq!(keyed.digest(0, b"x"), plain.digest(0, b"x"));
        assert_ne!(keyed.digest(1, b"x"), plain.digest(0, b"x"));
    }

    #[test]
    fn secrets_cannot_outnumber_specs() {
        assert!(DigestSet::new(1, &[b"a", b"b"]).is_err());
    }

    #[test]
    fn hash_tag_truncates_and_zero_length_is_empty() {
        let set = DigestSet::new(1, &[]).unwrap();
        assert!(set.hash_tag(0, 0, b"x").is_empty());
        let tag = set.hash_tag(0, 50, b"x");
        assert_eq!(tag.len(), 50);
        let full = set.digest(0, b"x");
        assert_eq!(tag, BitVector::from_bytes(&full, 50));
    }

    #[test]
    fn nonce_bit_length_is_between_17_and_32() {
        for i in 0u32..256 {
            let mut digest = [0u8; DIGEST_SIZE_BYTES];
            digest[DIGEST_SIZE_BYTES - 4..].copy_from_slice(&i.to_be_bytes());
            let nonce = derive_nonce(&digest);
            let bits = 64 - nonce.leading_zeros();
            assert!((17..=32).contains(&bits), "nonce {nonce:#x} has {bits} bits");
        }
    }

    #[test]
    fn nonce_is_deterministic_in_the_digest_tail() {
        let digest = [0x5Au8; DIGEST_SIZE_BYTES];
        assert_eq!(derive_nonce(&digest), derive_nonce(&digest));
    }
}
