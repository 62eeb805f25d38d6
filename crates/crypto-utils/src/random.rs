use rand::RngCore;
use rand_core::OsRng;

use crate::secret::PrivateKey;

/// Generates a fixed-size array of cryptographically secure random bytes.
pub fn random_bytes_fixed<const N: usize>() -> [u8; N] {
    let mut buf = [0u8; N];
    OsRng.fill_bytes(&mut buf);
    buf
}

/// Generates a single-use key for encodings where only the shape of the
/// signature matters, such as sizing a transaction for an L1 fee oracle.
///
/// The bytes are uniformly random; callers targeting a specific curve must
/// reject the (negligible) out-of-range values themselves.
pub fn throwaway_key() -> PrivateKey {
    PrivateKey::new(random_bytes_fixed())
}
