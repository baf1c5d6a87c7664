//! Min-sum decoders.
//!
//! This module implements belief propagation decoding with the min-sum
//! approximation of the check node update, in three flavors: plain min-sum,
//! normalized min-sum (check messages scaled down by a factor `alpha`) and
//! offset min-sum (check message magnitudes reduced by `alpha` and floored
//! at zero). Decoding alternates a check node pass, which only needs the two
//! smallest variable message magnitudes and the sign parity of each row, and
//! a variable node pass, which forms the posterior of each bit and the
//! extrinsic messages for the next iteration.

use super::{hard_decisions, syndrome, DecoderOutput, LdpcDecoder};
use crate::sparse::SparseMatrix;
use log::{debug, trace};
use ndarray::Array2;
use std::sync::Arc;
use thiserror::Error;

/// Min-sum decoder configuration error.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Error)]
pub enum Error {
    /// The normalization factor must be positive, since check messages are
    /// divided by it.
    #[error("normalization factor must be positive")]
    NonPositiveNormalization,
    /// A negative offset would grow the check messages instead of shrinking
    /// them.
    #[error("offset must not be negative")]
    NegativeOffset,
}

/// Check message scaling rule.
///
/// Selects one of the three decoders of the min-sum family. Normalization
/// and offset are mutually exclusive by construction.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Scaling {
    /// Plain min-sum check node update.
    None,
    /// Check messages scaled by `1/alpha`.
    Normalized {
        /// Normalization factor, must be positive.
        alpha: f64,
    },
    /// Check message magnitudes reduced by `alpha` and floored at zero.
    Offset {
        /// Offset, must not be negative.
        alpha: f64,
    },
}

/// Min-sum decoder.
#[derive(Debug, Clone)]
pub struct Decoder {
    h: Arc<SparseMatrix>,
    scaling: Scaling,
    max_iterations: usize,
    var_messages: Array2<f64>,
    check_messages: Array2<f64>,
    min1: Vec<f64>,
    min2: Vec<f64>,
    sign_parity: Vec<u8>,
    out: Vec<u8>,
    synd: Vec<u8>,
}

impl Decoder {
    /// Creates a new min-sum decoder.
    ///
    /// The parameters are the parity check matrix, the check message scaling
    /// rule and the maximum number of iterations per decode call.
    ///
    /// # Errors
    /// Fails if the scaling rule carries an invalid parameter: a
    /// non-positive normalization factor or a negative offset.
    pub fn new(
        h: Arc<SparseMatrix>,
        scaling: Scaling,
        max_iterations: usize,
    ) -> Result<Decoder, Error> {
        match scaling {
            Scaling::Normalized { alpha } if alpha <= 0.0 => {
                return Err(Error::NonPositiveNormalization);
            }
            Scaling::Offset { alpha } if alpha < 0.0 => {
                return Err(Error::NegativeOffset);
            }
            _ => (),
        }
        let k = h.num_rows();
        let n = h.num_cols();
        Ok(Decoder {
            // NaN marks the positions outside the sparsity pattern; they are
            // never read
            var_messages: Array2::from_elem((k, n), f64::NAN),
            check_messages: Array2::from_elem((k, n), f64::NAN),
            min1: vec![0.0; k],
            min2: vec![0.0; k],
            sign_parity: vec![0; k],
            out: vec![0; n],
            synd: vec![0; k],
            h,
            scaling,
            max_iterations,
        })
    }

    /// Decodes a block of received channel samples.
    ///
    /// See [`LdpcDecoder::decode`].
    pub fn decode(&mut self, samples: &[f64]) -> Result<DecoderOutput, DecoderOutput> {
        let k = self.h.num_rows();
        let n = self.h.num_cols();
        assert_eq!(samples.len(), n);
        hard_decisions(samples, &mut self.out);
        if syndrome(&self.h, &self.out, &mut self.synd) {
            return Ok(self.output(0));
        }
        for iteration in 1..=self.max_iterations {
            // check node pass: per-row minima and sign parity of the
            // variable messages
            for i in 0..k {
                let mut min1 = f64::INFINITY;
                let mut min2 = f64::INFINITY;
                let mut parity = 0;
                for &j in self.h.iter_row(i) {
                    if iteration == 1 {
                        self.var_messages[[i, j]] = samples[j];
                    }
                    let q = self.var_messages[[i, j]];
                    let magnitude = q.abs();
                    if magnitude < min1 {
                        min2 = min1;
                        min1 = magnitude;
                    } else if magnitude < min2 {
                        min2 = magnitude;
                    }
                    if q < 0.0 {
                        parity ^= 1;
                    }
                }
                self.min1[i] = min1;
                self.min2[i] = min2;
                self.sign_parity[i] = parity;
            }
            for i in 0..k {
                for &j in self.h.iter_row(i) {
                    let q = self.var_messages[[i, j]];
                    // exclude the edge itself: the smallest magnitude of the
                    // other entries is the second minimum when this entry
                    // holds the minimum
                    let magnitude = if q.abs() == self.min1[i] {
                        self.min2[i]
                    } else {
                        self.min1[i]
                    };
                    let magnitude = match self.scaling {
                        Scaling::None => magnitude,
                        Scaling::Normalized { alpha } => magnitude / alpha,
                        Scaling::Offset { alpha } => (magnitude - alpha).max(0.0),
                    };
                    let negative = (self.sign_parity[i] ^ u8::from(q < 0.0)) == 1;
                    self.check_messages[[i, j]] = if negative { -magnitude } else { magnitude };
                }
            }
            // variable node pass: posterior hard decisions and the variable
            // messages of the next iteration
            for j in 0..n {
                let extrinsic: f64 = self
                    .h
                    .iter_col(j)
                    .map(|&i| self.check_messages[[i, j]])
                    .sum();
                let posterior = samples[j] + extrinsic;
                self.out[j] = u8::from(posterior < 0.0);
                for &i in self.h.iter_col(j) {
                    self.var_messages[[i, j]] = posterior - self.check_messages[[i, j]];
                }
            }
            trace!("iteration {}: decisions {:?}", iteration, self.out);
            if syndrome(&self.h, &self.out, &mut self.synd) {
                debug!("min-sum converged after {} iterations", iteration);
                return Ok(self.output(iteration));
            }
        }
        debug!("min-sum gave up after {} iterations", self.max_iterations);
        Err(self.output(self.max_iterations))
    }

    fn output(&self, iterations: usize) -> DecoderOutput {
        DecoderOutput {
            codeword: self.out.clone(),
            iterations,
        }
    }
}

impl LdpcDecoder for Decoder {
    fn decode(&mut self, samples: &[f64]) -> Result<DecoderOutput, DecoderOutput> {
        Decoder::decode(self, samples)
    }
}
