//! Chain-of-custody verification.
//!
//! A verifier answers whether a content hash has been anchored somewhere
//! trustworthy. Fusion only sees the resulting boolean.

/// Checks a hex content hash against an external record.
pub trait ChainVerifier: Send + Sync {
    fn name(&self) -> &'static str;

    fn verify(&self, hash: &str) -> bool;
}

/// Verifier with no backing ledger; nothing is ever verified.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullVerifier;

impl ChainVerifier for NullVerifier {
    fn name(&self) -> &'static str {
        "null"
    }

    fn verify(&self, _hash: &str) -> bool {
        false
    }
}
