//! Implementations of [`Crypto`](crate::Crypto).

#[cfg(feature = "backend-rustcrypto")]
pub mod rustcrypto;

#[cfg(feature = "backend-rustcrypto")]
pub use self::rustcrypto::HpkeCrypto as HpkeCryptoRustCrypto;
