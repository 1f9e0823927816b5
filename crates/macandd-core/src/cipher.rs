//! Per-round encryption of the enrollment secret.
//!
//! Each round stores `seal(k_i, s)` in a fixed 32-byte ciphertext block. The
//! default [`XorCipher`] is the plain byte-wise XOR the record layout was
//! designed around: it is only as strong as `k_i` is uniformly random and
//! used once per enrollment, and it provides no integrity of its own (the
//! stored tag does that). Swap in another [`RoundCipher`] to change it; the
//! block size is part of the persisted layout and cannot grow.

use crate::kdf::KEY_LEN;
use crate::memory::SecretBytes;

/// Length-preserving encryption of one 32-byte secret under one round key.
pub trait RoundCipher {
    /// Encrypt `secret` under `key` into a persisted block.
    fn seal(&self, key: &SecretBytes<KEY_LEN>, secret: &[u8; KEY_LEN]) -> [u8; KEY_LEN];

    /// Decrypt a persisted block under `key` into secure memory.
    fn open(&self, key: &SecretBytes<KEY_LEN>, block: &[u8; KEY_LEN]) -> SecretBytes<KEY_LEN>;
}

/// Byte-wise XOR of key and secret.
#[derive(Clone, Copy, Debug, Default)]
pub struct XorCipher;

impl RoundCipher for XorCipher {
    fn seal(&self, key: &SecretBytes<KEY_LEN>, secret: &[u8; KEY_LEN]) -> [u8; KEY_LEN] {
        let mut block = [0u8; KEY_LEN];
        xor_into(&mut block, key.expose(), secret);
        block
    }

    fn open(&self, key: &SecretBytes<KEY_LEN>, block: &[u8; KEY_LEN]) -> SecretBytes<KEY_LEN> {
        let mut secret = SecretBytes::zeroed();
        xor_into(secret.expose_mut(), key.expose(), block);
        secret
    }
}

fn xor_into(out: &mut [u8; KEY_LEN], a: &[u8; KEY_LEN], b: &[u8; KEY_LEN]) {
    for ((o, x), y) in out.iter_mut().zip(a).zip(b) {
        *o = x ^ y;
    }
}
