//! Reversible per-(game, word) anonymization of participant identities.
//!
//! `token = hex(AES-128-CBC(key, iv = game_id padded with '0' / truncated to
//! 16 bytes, plaintext = identity + "/" + word_id))`, PKCS#7 padded.
//!
//! The key is one server-wide secret shared by every game. This hides vote
//! targets from other players, not from anyone holding the key.

use aes::Aes128;
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};

use crate::types::{MaskedId, UserId, WordId};

type Encryptor = cbc::Encryptor<Aes128>;
type Decryptor = cbc::Decryptor<Aes128>;

pub const KEY_LENGTH: usize = 16;
const IV_LENGTH: usize = 16;
const SEPARATOR: char = '/';

/// Development key, used when `MASK_KEY` is not configured
pub const DEFAULT_MASK_KEY: &[u8; KEY_LENGTH] = b"1234567890abcdef";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MaskError {
    #[error("Masked id is not valid hex")]
    InvalidHex,

    #[error("Masked id does not decrypt under this game")]
    Undecryptable,

    #[error("Masked id does not contain a word scope")]
    MissingScope,
}

/// Identity recovered from a token, along with the word it was minted for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unmasked {
    pub identity: UserId,
    pub word_id: WordId,
}

#[derive(Clone)]
pub struct Masker {
    key: [u8; KEY_LENGTH],
}

impl std::fmt::Debug for Masker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Masker").finish_non_exhaustive()
    }
}

impl Default for Masker {
    fn default() -> Self {
        Self::new(*DEFAULT_MASK_KEY)
    }
}

impl Masker {
    pub fn new(key: [u8; KEY_LENGTH]) -> Self {
        Self { key }
    }

    /// Deterministic: the same inputs always produce the same token
    pub fn mask(&self, identity: &str, game_id: &str, word_id: &str) -> MaskedId {
        let plaintext = format!("{identity}{SEPARATOR}{word_id}");
        let iv = adjust_iv(game_id);
        let ciphertext = Encryptor::new(&self.key.into(), &iv.into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());
        hex::encode(ciphertext)
    }

    /// Recover the identity behind a token minted for `game_id`
    pub fn unmask(&self, token: &str, game_id: &str) -> Result<UserId, MaskError> {
        self.unmask_scoped(token, game_id).map(|u| u.identity)
    }

    /// Like [`Masker::unmask`], also returning the word the token belongs to
    pub fn unmask_scoped(&self, token: &str, game_id: &str) -> Result<Unmasked, MaskError> {
        let ciphertext = hex::decode(token).map_err(|_| MaskError::InvalidHex)?;
        let iv = adjust_iv(game_id);
        let plaintext = Decryptor::new(&self.key.into(), &iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
            .map_err(|_| MaskError::Undecryptable)?;
        let plaintext = String::from_utf8(plaintext).map_err(|_| MaskError::Undecryptable)?;
        let (identity, word_id) = plaintext
            .split_once(SEPARATOR)
            .ok_or(MaskError::MissingScope)?;
        Ok(Unmasked {
            identity: identity.to_string(),
            word_id: word_id.to_string(),
        })
    }
}

/// Pad the game id with '0' or truncate it to the cipher block length
fn adjust_iv(game_id: &str) -> [u8; IV_LENGTH] {
    let mut iv = [b'0'; IV_LENGTH];
    for (slot, byte) in iv.iter_mut().zip(game_id.bytes()) {
        *slot = byte;
    }
    iv
}
