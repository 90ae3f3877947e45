// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Secure Buffers
//!
//! Secrets held for longer than one operation (private keys loaded by the
//! CLI, passphrases handed to an external KDF) are kept XOR-masked with a
//! random pad of the same length. Cleartext exists only inside the closure
//! passed to `with_value` / `with_str`, in a zeroising scratch copy.
//!
//! Both types zeroise mask and masked bytes on `dispose()` and on drop.
//! Any access after `dispose()` fails with `SecureBufferDisposed`.

use crate::error::{EciesError, Result};
use rand::{rngs::OsRng, RngCore};
use std::fmt;
use zeroize::{Zeroize, Zeroizing};

/// Masked byte buffer
pub struct SecureBuffer {
    masked: Vec<u8>,
    mask: Vec<u8>,
    disposed: bool,
}

impl SecureBuffer {
    /// Take ownership of `data`; the original allocation is zeroised
    pub fn new(mut data: Vec<u8>) -> Self {
        let buffer = Self::from_slice(&data);
        data.zeroize();
        buffer
    }

    /// Copy `data` into a new masked buffer
    pub fn from_slice(data: &[u8]) -> Self {
        let mut mask = vec![0u8; data.len()];
        OsRng.fill_bytes(&mut mask);
        let masked = data.iter().zip(&mask).map(|(d, m)| d ^ m).collect();
        Self {
            masked,
            mask,
            disposed: false,
        }
    }

    pub fn len(&self) -> usize {
        self.masked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masked.is_empty()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Run `f` over the cleartext
    pub fn with_value<R>(&self, f: impl FnOnce(&[u8]) -> R) -> Result<R> {
        let clear = self.unmask()?;
        Ok(f(&clear))
    }

    /// Zeroising cleartext copy
    pub fn expose(&self) -> Result<Zeroizing<Vec<u8>>> {
        self.unmask()
    }

    fn unmask(&self) -> Result<Zeroizing<Vec<u8>>> {
        if self.disposed {
            return Err(EciesError::SecureBufferDisposed);
        }
        Ok(Zeroizing::new(
            self.masked
                .iter()
                .zip(&self.mask)
                .map(|(c, m)| c ^ m)
                .collect(),
        ))
    }

    /// Zeroise and mark unusable; idempotent
    pub fn dispose(&mut self) {
        self.masked.zeroize();
        self.mask.zeroize();
        self.disposed = true;
    }

    /// Fresh copy under a new mask
    pub fn try_clone(&self) -> Result<Self> {
        let clear = self.unmask()?;
        Ok(Self::from_slice(&clear))
    }
}

impl Drop for SecureBuffer {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for SecureBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecureBuffer")
            .field("len", &self.masked.len())
            .field("disposed", &self.disposed)
            .finish()
    }
}

/// Masked UTF-8 string
pub struct SecureString {
    inner: SecureBuffer,
}

impl SecureString {
    /// Take ownership of `value`; the original allocation is zeroised
    pub fn new(value: String) -> Self {
        Self {
            inner: SecureBuffer::new(value.into_bytes()),
        }
    }

    /// Copy `value`; the caller keeps its own string
    pub fn from_text(value: &str) -> Self {
        Self {
            inner: SecureBuffer::from_slice(value.as_bytes()),
        }
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.is_disposed()
    }

    /// Run `f` over the cleartext string
    pub fn with_str<R>(&self, f: impl FnOnce(&str) -> R) -> Result<R> {
        let clear = self.inner.unmask()?;
        let text = std::str::from_utf8(&clear).map_err(|_| EciesError::SecureStringEncoding)?;
        Ok(f(text))
    }

    pub fn dispose(&mut self) {
        self.inner.dispose();
    }
}

impl fmt::Debug for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecureString")
            .field("len", &self.inner.len())
            .field("disposed", &self.inner.is_disposed())
            .finish()
    }
}
