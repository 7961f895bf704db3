use base64::Engine;
use rand::RngCore;

/// Generates the tokens mailed to users so they can confirm their account.
pub trait TokenGenerator: Send + Sync {
    /// Generate a new URL-safe token.
    fn generate_token(&self) -> String;
}

/// Generates 32 random bytes encoded as unpadded URL-safe base64.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomTokenGenerator;

impl TokenGenerator for RandomTokenGenerator {
    fn generate_token(&self) -> String {
        let mut bytes = [0u8; 32];
        rand::rng().fill_bytes(&mut bytes);
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
    }
}
