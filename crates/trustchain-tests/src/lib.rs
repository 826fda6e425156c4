//! Adversarial and end-to-end test suite for TrustChain.
//!
//! Scripted collaborators in [`helpers`] stand in for the ledger RPC, the
//! reputation service, and the notary, so the full scoring pipeline runs
//! without a network.

pub mod helpers;
