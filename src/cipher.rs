//! Card-number protection: reversible encryption at rest, one-way masking
//! for display.
//!
//! Encryption is deterministic under a fixed (password, salt) pair so the
//! UNIQUE constraint on stored card numbers stays meaningful: the synthetic
//! IV is an HMAC tag over the plaintext, the keystream is derived from that
//! IV, and the IV doubles as the integrity check on decrypt.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

const SIV_LEN: usize = 16;
const BLOCK_LEN: usize = 32;

/// Symmetric cipher for card numbers. Key material is derived once at
/// startup and lives here for the process lifetime; it is never logged.
pub struct CardCipher {
    stream_key: [u8; 32],
    tag_key: [u8; 32],
}

impl CardCipher {
    pub fn new(password: &str, salt_hex: &str) -> Result<Self, AppError> {
        if password.trim().is_empty() {
            return Err(AppError::Configuration(
                "encryption password must not be empty".to_string(),
            ));
        }

        let salt = hex::decode(salt_hex.trim()).map_err(|_| {
            AppError::Configuration("encryption salt must be hex-encoded".to_string())
        })?;
        if salt.is_empty() {
            return Err(AppError::Configuration(
                "encryption salt must not be empty".to_string(),
            ));
        }

        Ok(Self {
            stream_key: derive_subkey(password.as_bytes(), &salt, b"stream"),
            tag_key: derive_subkey(password.as_bytes(), &salt, b"tag"),
        })
    }

    /// Deterministic: the same plaintext always produces the same ciphertext
    /// under the same key material.
    pub fn encrypt(&self, plaintext: &str) -> String {
        let siv = self.tag(plaintext.as_bytes());

        let mut out = Vec::with_capacity(SIV_LEN + plaintext.len());
        out.extend_from_slice(&siv);
        out.extend_from_slice(plaintext.as_bytes());
        self.apply_keystream(&siv, &mut out[SIV_LEN..]);

        BASE64.encode(out)
    }

    /// Inverse of [`encrypt`](Self::encrypt). Malformed or tampered input
    /// fails closed.
    pub fn decrypt(&self, ciphertext: &str) -> Result<String, AppError> {
        let raw = BASE64
            .decode(ciphertext)
            .map_err(|_| AppError::Cipher("ciphertext is not valid base64".to_string()))?;

        if raw.len() < SIV_LEN {
            return Err(AppError::Cipher("ciphertext is too short".to_string()));
        }

        let (siv, body) = raw.split_at(SIV_LEN);
        let mut plaintext = body.to_vec();
        self.apply_keystream(siv, &mut plaintext);

        let mut mac = HmacSha256::new_from_slice(&self.tag_key)
            .expect("HMAC accepts keys of any length");
        mac.update(&plaintext);
        mac.verify_truncated_left(siv)
            .map_err(|_| AppError::Cipher("ciphertext failed integrity check".to_string()))?;

        String::from_utf8(plaintext)
            .map_err(|_| AppError::Cipher("decrypted payload is not valid UTF-8".to_string()))
    }

    fn tag(&self, data: &[u8]) -> [u8; SIV_LEN] {
        let mut mac = HmacSha256::new_from_slice(&self.tag_key)
            .expect("HMAC accepts keys of any length");
        mac.update(data);
        let digest = mac.finalize().into_bytes();

        let mut siv = [0u8; SIV_LEN];
        siv.copy_from_slice(&digest[..SIV_LEN]);
        siv
    }

    fn apply_keystream(&self, siv: &[u8], buf: &mut [u8]) {
        for (block_index, chunk) in buf.chunks_mut(BLOCK_LEN).enumerate() {
            let mut mac = HmacSha256::new_from_slice(&self.stream_key)
                .expect("HMAC accepts keys of any length");
            mac.update(siv);
            mac.update(&(block_index as u64).to_be_bytes());
            let block = mac.finalize().into_bytes();

            for (byte, key_byte) in chunk.iter_mut().zip(block.iter()) {
                *byte ^= key_byte;
            }
        }
    }
}

impl std::fmt::Debug for CardCipher {
    // Key material stays out of logs and error chains.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardCipher").finish_non_exhaustive()
    }
}

fn derive_subkey(password: &[u8], salt: &[u8], label: &[u8]) -> [u8; 32] {
    let mut mac = HmacSha256::new_from_slice(password).expect("HMAC accepts keys of any length");
    mac.update(salt);
    mac.update(label);

    let digest = mac.finalize().into_bytes();
    let mut key = [0u8; 32];
    key.copy_from_slice(&digest);
    key
}

/// One-way masking for display: reveals only the last four digits.
pub fn mask_card_number(last_four: &str) -> String {
    format!("**** **** **** {last_four}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cipher() -> CardCipher {
        CardCipher::new("s3cr3t-pass", "deadbeefdeadbeef").unwrap()
    }

    #[test]
    fn encrypt_decrypt_round_trip() {
        let cipher = cipher();
        let ciphertext = cipher.encrypt("4111111111111111");

        assert_ne!(ciphertext, "4111111111111111");
        assert_eq!(cipher.decrypt(&ciphertext).unwrap(), "4111111111111111");
    }

    #[test]
    fn encryption_is_deterministic() {
        let cipher = cipher();

        assert_eq!(
            cipher.encrypt("4111111111111111"),
            cipher.encrypt("4111111111111111")
        );
        assert_ne!(
            cipher.encrypt("4111111111111111"),
            cipher.encrypt("4111111111111112")
        );
    }

    #[test]
    fn different_key_material_yields_different_ciphertext() {
        let a = CardCipher::new("password-a", "deadbeefdeadbeef").unwrap();
        let b = CardCipher::new("password-b", "deadbeefdeadbeef").unwrap();

        assert_ne!(a.encrypt("4111111111111111"), b.encrypt("4111111111111111"));
    }

    #[test]
    fn tampered_ciphertext_is_rejected() {
        let cipher = cipher();
        let ciphertext = cipher.encrypt("4111111111111111");

        let mut raw = BASE64.decode(&ciphertext).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0x01;
        let tampered = BASE64.encode(raw);

        assert!(matches!(
            cipher.decrypt(&tampered),
            Err(AppError::Cipher(_))
        ));
    }

    #[test]
    fn malformed_input_is_rejected() {
        let cipher = cipher();

        assert!(cipher.decrypt("not base64!!!").is_err());
        assert!(cipher.decrypt("AAAA").is_err());
        assert!(cipher.decrypt("").is_err());
    }

    #[test]
    fn missing_key_material_fails_at_construction() {
        assert!(matches!(
            CardCipher::new("", "deadbeefdeadbeef"),
            Err(AppError::Configuration(_))
        ));
        assert!(matches!(
            CardCipher::new("password", "not-hex"),
            Err(AppError::Configuration(_))
        ));
        assert!(matches!(
            CardCipher::new("password", ""),
            Err(AppError::Configuration(_))
        ));
    }

    #[test]
    fn mask_reveals_only_last_four() {
        assert_eq!(mask_card_number("1111"), "**** **** **** 1111");
        // Idempotent for a given input.
        assert_eq!(mask_card_number("1111"), mask_card_number("1111"));
    }
}
