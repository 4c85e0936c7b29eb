//! PKCE (Proof Key for Code Exchange) challenge/verifier generation for the
//! Anthropic OAuth authorization-code flow.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// A PKCE verifier/challenge pair, plus the `state` value to round-trip
/// through the authorization redirect.
#[derive(Debug, Clone)]
pub struct PkcePair {
    pub verifier: String,
    pub challenge: String,
    pub state: String,
}

/// Generate a fresh PKCE verifier and its S256 challenge.
#[must_use]
pub fn generate_pkce() -> PkcePair {
    let verifier = random_url_safe_token(32);
    let state = random_url_safe_token(16);

    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    let digest = hasher.finalize();
    let challenge = URL_SAFE_NO_PAD.encode(digest);

    PkcePair {
        verifier,
        challenge,
        state,
    }
}

fn random_url_safe_token(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    rand::rng().fill_bytes(&mut buf);
    URL_SAFE_NO_PAD.encode(buf)
}
