//! AEAD error types.

use thiserror::Error;

/// Errors surfaced by the engines and sessions.
///
/// Every precondition is checked synchronously at the violating call,
/// before any session state is mutated; nothing is retried internally. A
/// failed tag check is NOT an error - `verify` reports it as `false`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AeadError {
    /// Invalid key length
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },

    /// Invalid nonce length
    #[error("invalid nonce length: expected {expected}, got {actual}")]
    InvalidNonceLength {
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },

    /// Associated data is empty (the construction requires at least one byte)
    #[error("associated data must not be empty")]
    InvalidAssociatedData,

    /// Zero-length input passed to a raw engine call
    #[error("input must not be empty")]
    EmptyInput,

    /// Session already produced its tag; no further data may be processed
    #[error("session is finalized")]
    Finalized,
}
