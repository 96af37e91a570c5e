//! Authenticated-encryption envelope for CAN FD payloads.
//!
//! Envelope layout inside the 64-byte data field:
//!
//! | bytes    | content                               |
//! |----------|---------------------------------------|
//! | `0..16`  | ciphertext of the 16-byte plaintext   |
//! | `16..32` | GCM tag                               |
//! | `32..40` | AAD: send time, wall-clock secs (LE)  |
//! | `40..56` | random 128-bit nonce                  |
//! | `56..64` | zero                                  |
//!
//! Without a key the codec copies the first 16 bytes through unchanged.

use aes_gcm::aead::consts::U16;
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::aes::Aes256;
use aes_gcm::AesGcm;
use rand::RngCore;

use crate::clock::Clock;
use crate::error::{CanError, CanResult};
use crate::types::WIRE_FRAME_LEN;

/// Bytes of application data carried per frame.
pub const PLAINTEXT_LEN: usize = 16;
/// Key length for AES-256.
pub const KEY_LEN: usize = 32;
/// Frames sent more than this many seconds ago are rejected.
pub const MAX_FRAME_AGE_SECS: i64 = 1;

const TAG_OFFSET: usize = 16;
const AAD_OFFSET: usize = 32;
const NONCE_OFFSET: usize = 40;
const ENVELOPE_LEN: usize = 56;
const NONCE_LEN: usize = ENVELOPE_LEN - NONCE_OFFSET;

/// AES-256-GCM with the 16-byte IV the ECUs use on the wire.
type Aes256Gcm16 = AesGcm<Aes256, U16>;

/// Decoded wire frame: fixed 64-byte data field.
pub type WireFrame = [u8; WIRE_FRAME_LEN];

// ── Key material ────────────────────────────────────────────────

/// 256-bit shared bus key.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptionKey([u8; KEY_LEN]);

impl EncryptionKey {
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Parse a configured secret.
    ///
    /// Exactly 64 hex characters are decoded to 32 bytes. Anything else is
    /// taken as a raw passphrase whose first 32 bytes form the key.
    pub fn parse(secret: &str) -> CanResult<Self> {
        let secret = secret.trim();
        if secret.len() == KEY_LEN * 2 {
            if let Ok(bytes) = hex::decode(secret) {
                let mut key = [0u8; KEY_LEN];
                key.copy_from_slice(&bytes);
                return Ok(Self(key));
            }
        }

        let raw = secret.as_bytes();
        if raw.len() < KEY_LEN {
            return Err(CanError::InvalidKey(format!(
                "need 64 hex characters or at least {KEY_LEN} bytes, got {}",
                raw.len()
            )));
        }
        let mut key = [0u8; KEY_LEN];
        key.copy_from_slice(&raw[..KEY_LEN]);
        Ok(Self(key))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EncryptionKey(<redacted>)")
    }
}

// ── Codec ───────────────────────────────────────────────────────

/// Per-node frame codec, built once at startup.
#[derive(Clone)]
pub struct FrameCodec {
    cipher: Option<Aes256Gcm16>,
}

impl FrameCodec {
    /// Identity codec for unencrypted buses.
    pub fn plaintext() -> Self {
        Self { cipher: None }
    }

    pub fn with_key(key: &EncryptionKey) -> CanResult<Self> {
        let cipher = Aes256Gcm16::new_from_slice(key.as_bytes())
            .map_err(|e| CanError::InvalidKey(e.to_string()))?;
        Ok(Self {
            cipher: Some(cipher),
        })
    }

    /// Build from an optional secret; `None` yields the plaintext codec.
    pub fn from_secret(secret: Option<&str>) -> CanResult<Self> {
        match secret {
            Some(s) => Self::with_key(&EncryptionKey::parse(s)?),
            None => Ok(Self::plaintext()),
        }
    }

    pub fn is_encrypted(&self) -> bool {
        self.cipher.is_some()
    }

    /// Encode with the current wall-clock time as AAD.
    pub fn encode(&self, plaintext: &[u8]) -> CanResult<WireFrame> {
        self.encode_at(plaintext, Clock::wall_secs())
    }

    /// Encode the first 16 bytes of `plaintext` (zero-extended if shorter).
    pub fn encode_at(&self, plaintext: &[u8], now_secs: i64) -> CanResult<WireFrame> {
        let mut frame = [0u8; WIRE_FRAME_LEN];
        let n = plaintext.len().min(PLAINTEXT_LEN);
        frame[..n].copy_from_slice(&plaintext[..n]);

        let Some(cipher) = &self.cipher else {
            return Ok(frame);
        };

        let mut nonce = [0u8; NONCE_LEN];
        rand::rngs::OsRng.fill_bytes(&mut nonce);
        let aad = now_secs.to_le_bytes();

        let tag = cipher
            .encrypt_in_place_detached(
                GenericArray::from_slice(&nonce),
                &aad,
                &mut frame[..PLAINTEXT_LEN],
            )
            .map_err(|e| CanError::Encryption(e.to_string()))?;

        frame[TAG_OFFSET..AAD_OFFSET].copy_from_slice(&tag);
        frame[AAD_OFFSET..NONCE_OFFSET].copy_from_slice(&aad);
        frame[NONCE_OFFSET..ENVELOPE_LEN].copy_from_slice(&nonce);
        Ok(frame)
    }

    /// Decode against the current wall-clock time.
    pub fn decode(&self, data: &[u8]) -> CanResult<[u8; PLAINTEXT_LEN]> {
        self.decode_at(data, Clock::wall_secs())
    }

    /// Recover the 16-byte plaintext from a received data field.
    ///
    /// The freshness check runs before any cryptographic work.
    pub fn decode_at(&self, data: &[u8], now_secs: i64) -> CanResult<[u8; PLAINTEXT_LEN]> {
        let mut plaintext = [0u8; PLAINTEXT_LEN];

        let Some(cipher) = &self.cipher else {
            let n = data.len().min(PLAINTEXT_LEN);
            plaintext[..n].copy_from_slice(&data[..n]);
            return Ok(plaintext);
        };

        if data.len() < ENVELOPE_LEN {
            return Err(CanError::Malformed {
                len: data.len(),
                expected: ENVELOPE_LEN,
            });
        }

        let mut aad = [0u8; 8];
        aad.copy_from_slice(&data[AAD_OFFSET..NONCE_OFFSET]);
        let sent_secs = i64::from_le_bytes(aad);
        let age_secs = now_secs.saturating_sub(sent_secs);
        if age_secs > MAX_FRAME_AGE_SECS {
            return Err(CanError::ReplayRejected { age_secs });
        }

        plaintext.copy_from_slice(&data[..PLAINTEXT_LEN]);
        cipher
            .decrypt_in_place_detached(
                GenericArray::from_slice(&data[NONCE_OFFSET..ENVELOPE_LEN]),
                &aad,
                &mut plaintext,
                GenericArray::from_slice(&data[TAG_OFFSET..AAD_OFFSET]),
            )
            .map_err(|_| CanError::AuthenticationFailed)?;
        Ok(plaintext)
    }
}

impl std::fmt::Debug for FrameCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameCodec")
            .field("encrypted", &self.is_encrypted())
            .finish()
    }
}
