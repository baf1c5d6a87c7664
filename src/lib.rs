//! # LDPC decoders
//!
//! `ldpc_decoders` is a collection of iterative soft-input hard-output
//! decoders for LDPC block codes. Three algorithm families are implemented:
//! bit flipping (BF, WBF, MWBF, IMWBF), majority logic (one-step and the
//! iterative hard, soft and adaptive soft variants) and min-sum (plain,
//! normalized and offset). All decoders consume the same sparse parity check
//! matrix representation and expose a common decode contract, so a benchmark
//! harness can drive any of them interchangeably.

pub mod codes;
pub mod decoder;
pub mod sparse;
