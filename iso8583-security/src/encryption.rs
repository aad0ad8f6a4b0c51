//! Block-cipher collaborator for MAC computation and message encryption

use cipher::generic_array::GenericArray;
use cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use des::{Des, TdesEde2};
use iso8583_core::{Iso8583Error, Iso8583Result};

/// DES block size in bytes.
pub const BLOCK_SIZE: usize = 8;

/// Opaque "encrypt one buffer under a key" collaborator.
///
/// The codec consumes this seam without caring which primitive sits behind
/// it; the MAC and envelope tests also swap in fakes through it.
pub trait BlockCipher {
    /// Encrypt `data`, zero-padded to a multiple of the block size.
    fn encrypt(&self, data: &[u8]) -> Iso8583Result<Vec<u8>>;

    /// Decrypt `data`, which must be a multiple of the block size.
    fn decrypt(&self, data: &[u8]) -> Iso8583Result<Vec<u8>>;
}

enum DesKey {
    /// 8-byte key, single DES.
    Single(Des),
    /// 16-byte key, two-key triple DES (EDE).
    Triple(TdesEde2),
}

/// DES/3DES ECB context keyed by an 8- or 16-byte key.
pub struct DesCipher {
    key: DesKey,
}

impl DesCipher {
    /// Create a cipher context. The key must be 8 bytes (single DES) or
    /// 16 bytes (two-key triple DES).
    pub fn new(key: &[u8]) -> Iso8583Result<Self> {
        let key = match key.len() {
            8 => DesKey::Single(
                Des::new_from_slice(key).map_err(|_| Iso8583Error::InvalidKeyLength(key.len()))?,
            ),
            16 => DesKey::Triple(
                TdesEde2::new_from_slice(key)
                    .map_err(|_| Iso8583Error::InvalidKeyLength(key.len()))?,
            ),
            n => return Err(Iso8583Error::InvalidKeyLength(n)),
        };
        Ok(Self { key })
    }
}

impl BlockCipher for DesCipher {
    fn encrypt(&self, data: &[u8]) -> Iso8583Result<Vec<u8>> {
        let mut padded = data.to_vec();
        let rem = padded.len() % BLOCK_SIZE;
        if rem != 0 {
            padded.resize(padded.len() + BLOCK_SIZE - rem, 0);
        }
        let mut out = Vec::with_capacity(padded.len());
        for chunk in padded.chunks_exact(BLOCK_SIZE) {
            let mut block = GenericArray::clone_from_slice(chunk);
            match &self.key {
                DesKey::Single(c) => c.encrypt_block(&mut block),
                DesKey::Triple(c) => c.encrypt_block(&mut block),
            }
            out.extend_from_slice(&block);
        }
        Ok(out)
    }

    fn decrypt(&self, data: &[u8]) -> Iso8583Result<Vec<u8>> {
        if data.is_empty() || data.len() % BLOCK_SIZE != 0 {
            return Err(Iso8583Error::InvalidData(format!(
                "ciphertext length {} is not a multiple of the {}-byte block size",
                data.len(),
                BLOCK_SIZE
            )));
        }
        let mut out = Vec::with_capacity(data.len());
        for chunk in data.chunks_exact(BLOCK_SIZE) {
            let mut block = GenericArray::clone_from_slice(chunk);
            match &self.key {
                DesKey::Single(c) => c.decrypt_block(&mut block),
                DesKey::Triple(c) => c.decrypt_block(&mut block),
            }
            out.extend_from_slice(&block);
        }
        Ok(out)
    }
}
