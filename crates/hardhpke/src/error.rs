//! Error types

use hardhpke_crypto::CryptoError;

/// HPKE Error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Generic invalid input.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    /// Exactly one of `psk` and `psk_id` was provided.
    #[error("inconsistent PSK input")]
    InconsistentPsk,

    /// PSK input is required but missing.
    #[error("PSK input is required but missing")]
    MissingPsk,

    /// PSK input is provided but not needed.
    #[error("PSK input is provided but not needed")]
    UnnecessaryPsk,

    /// An input exceeds the length this implementation accepts.
    #[error("{what} is {len} bytes long, at most {max} bytes are accepted")]
    InputTooLong {
        /// Which input.
        what: &'static str,
        /// The length provided.
        len: usize,
        /// The accepted maximum.
        max: usize,
    },

    /// A serialized key or `enc` has the wrong length or is not a valid
    /// element of the group.
    #[error("deserialization failed: {0}")]
    Deserialization(#[source] CryptoError),

    /// `Encap()` / `AuthEncap()` failed.
    #[error("encapsulation failed: {0}")]
    Encap(#[source] CryptoError),

    /// `Decap()` / `AuthDecap()` failed.
    #[error("decapsulation failed: {0}")]
    Decap(#[source] CryptoError),

    /// `DeriveKeyPair()` failed.
    #[error("unable to derive keypair from seed")]
    DeriveKeyPair,

    /// The message limit for this AEAD, key, and nonce has been reached. The
    /// context can no longer seal or open.
    #[error("message limit reached")]
    MessageLimitReached,

    /// Seal / Open called on a context of the export-only AEAD.
    #[error("not available in export-only mode")]
    ExportOnly,

    /// The ciphertext failed to authenticate.
    #[error("open failed: ciphertext or associated data was tampered with")]
    OpenFailed,

    /// Another thread opened a message at the same sequence number first.
    #[error("sequence number advanced concurrently")]
    SequenceConflict,

    /// Error passed from the underlying crypto implementation.
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

impl Error {
    /// Returns true if the error is `Error::InvalidInput` or
    /// `Error::InputTooLong`.
    pub const fn is_invalid_input(&self) -> bool {
        matches!(self, Error::InvalidInput(_) | Error::InputTooLong { .. })
    }

    /// Returns true if the error is due to the crypto backend not supporting
    /// the requested algorithm.
    pub const fn is_unsupported(&self) -> bool {
        matches!(
            self,
            Error::Crypto(
                CryptoError::KemUnsupported
                    | CryptoError::KdfUnsupported
                    | CryptoError::AeadUnsupported
            )
        )
    }
}
