//! Closed error taxonomy shared by the RLP codec, the node-record codec and the big-endian
//! compact integer codec.
//!
//! Every fallible operation in this crate returns `Result<T, TrieError>`. The hash builder's own
//! ordering contract (§4.6) is enforced with `debug_assert!` instead, since a violation is a
//! caller bug rather than a recoverable, data-dependent condition.

/// The single error type returned by every fallible operation in this crate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrieError {
    /// Input ended before the declared header or payload was fully consumed.
    #[error("input too short")]
    InputTooShort,

    /// `LeftoverPolicy::Prohibit` was used and bytes remained after decoding the value.
    #[error("input too long: {0} trailing byte(s)")]
    InputTooLong(usize),

    /// A big-endian compact integer (or an RLP length-of-length) began with a zero byte.
    #[error("leading zero byte in big-endian compact encoding")]
    LeadingZero,

    /// A parsed integer did not fit in the target width, or a decoded boolean was `> 1`.
    #[error("value overflows target width")]
    Overflow,

    /// A short-form RLP header was used where the long form (or no header) was required, or a
    /// single-byte string payload was `< 0x80` and should have been self-describing.
    #[error("non-canonical RLP size encoding")]
    NonCanonicalSize,

    /// A fixed-width decode target received a payload of the wrong length.
    #[error("unexpected payload length: expected {expected}, got {actual}")]
    UnexpectedLength {
        /// The length the decoder required.
        expected: usize,
        /// The length actually present in the input.
        actual: usize,
    },

    /// A decoder that requires a string header encountered a list header.
    #[error("expected a string, found a list")]
    UnexpectedList,

    /// A decoder that requires a list header encountered a string header.
    #[error("expected a list, found a string")]
    UnexpectedString,

    /// A list decoder finished reading its known fields but input remained inside the list.
    #[error("unexpected elements remaining in list")]
    UnexpectedListElements,

    /// A composite decode could not match any known fieldset shape.
    #[error("input does not match any known fieldset")]
    InvalidFieldset,

    /// An intermediate node record's trailing hash bytes were not a multiple of 32, or the
    /// effective hash count did not agree with `hash_mask`/`root_hash` presence.
    #[error("invalid hashes length in node-record trailer")]
    InvalidHashesLength,

    /// An intermediate node record's `tree_mask` or `hash_mask` was not a subset of `state_mask`.
    #[error("tree_mask/hash_mask is not a subset of state_mask")]
    InvalidMasksSubsets,

    /// Reserved for transaction-codec callers built atop this crate; a signature's `v` value was
    /// outside the range that codec accepts.
    #[error("invalid v value in transaction signature")]
    InvalidVInSignature,

    /// Reserved for transaction-codec callers; the EIP-2718 transaction type byte was not one
    /// the caller's codec recognizes.
    #[error("unsupported transaction type")]
    UnsupportedTransactionType,

    /// Reserved for transaction-codec callers; an EIP-2718 envelope was serialized in a form
    /// that violates the envelope's own canonical encoding rules.
    #[error("unexpected EIP-2718 serialization")]
    UnexpectedEip2718Serialization,
}
