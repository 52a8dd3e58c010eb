//! # Onchain Program Instance Module
//!
//! Binding for the token_vesting program deployed on Solana.
//!
//! ## Features
//! - Program ID resolution per cluster
//! - Instruction builders generated from the program IDL
//! - Anchor-client backed program handle

/// Cluster selection and explorer links
pub mod cluster;

/// token_vesting program binding
pub mod instance;

#[cfg(test)]
pub mod memory;
