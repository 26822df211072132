//! Small code-generation helpers used by the API layer.

use blake2::{Blake2b512, Digest};
use rand::{distributions::Alphanumeric, thread_rng, Rng};

/// A random six-digit one-time code, zero-padded.
pub fn otp_code() -> String {
    let n = thread_rng().gen_range(0..1_000_000u32);
    format!("{n:06}")
}

/// The customer's shareable referral code, derived deterministically from the phone number so that
/// re-registering after a failure produces the same code.
pub fn referral_code_for_phone(phone: &str) -> String {
    let mut hasher = Blake2b512::new();
    hasher.update(phone.as_bytes());
    let digest = hasher.finalize();
    digest.iter().take(4).map(|b| format!("{b:02X}")).collect()
}

fn random_code(prefix: &str, len: usize) -> String {
    let tail: String = thread_rng().sample_iter(&Alphanumeric).take(len).map(char::from).collect();
    format!("{prefix}-{tail}")
}

/// The (customer-facing, merchant-facing) QR code pair for a new order handshake.
pub fn qr_code_pair() -> (String, String) {
    (random_code("ORD", 24), random_code("MCH", 24))
}
