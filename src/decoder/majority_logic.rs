//! Majority-logic decoders.
//!
//! This module implements the majority-logic family of LDPC decoders: the
//! classical one-step majority-logic corrector and the iterative variants
//! that keep a saturating reliability register per bit (hard, soft and
//! adaptive soft). Majority-logic decoding requires every parity check row
//! to have the same weight, so constructing any decoder in this family on an
//! irregular matrix fails.
//!
//! The iterative decoders update each register by the count of checks voting
//! against the current decision of its bit, saturate, and re-derive the hard
//! decision from the register sign. The hard variant initializes the
//! registers from the hard decisions only and saturates at the row weight;
//! the soft variants quantize the received samples into a narrow register
//! and saturate at the largest value the register width can hold. The
//! adaptive soft variant additionally weights the vote of each check by the
//! reliability of its other bits and scales the register update by `alpha`.

use super::{hard_decisions, syndrome, DecoderOutput, LdpcDecoder};
use crate::sparse::SparseMatrix;
use log::{debug, trace};
use ndarray::Array2;
use std::sync::Arc;
use thiserror::Error;

/// Bit width of the soft reliability registers.
const REGISTER_BITS: u32 = 3;

/// Majority-logic decoder error.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Error)]
pub enum Error {
    /// The parity check matrix rows do not all have the same weight.
    #[error("majority logic decoding requires a row-regular parity check matrix")]
    IrregularCode,
}

/// One-step majority-logic decoder.
///
/// Performs a single correction pass: every bit whose unsatisfied check
/// count exceeds half the row weight is flipped. By contract the decoder
/// always reports success, since there is no iteration to retry; the output
/// can therefore still violate parity, and a caller wanting a guarantee must
/// re-check it.
#[derive(Debug, Clone)]
pub struct OneStepDecoder {
    h: Arc<SparseMatrix>,
    majority: i32,
    out: Vec<u8>,
    synd: Vec<u8>,
}

impl OneStepDecoder {
    /// Creates a new one-step majority-logic decoder.
    ///
    /// # Errors
    /// Fails if the parity check matrix is not row-regular.
    pub fn new(h: Arc<SparseMatrix>) -> Result<OneStepDecoder, Error> {
        let gamma = h.uniform_row_weight().ok_or(Error::IrregularCode)?;
        Ok(OneStepDecoder {
            majority: (gamma / 2) as i32,
            out: vec![0; h.num_cols()],
            synd: vec![0; h.num_rows()],
            h,
        })
    }

    /// Decodes a block of received channel samples.
    ///
    /// See [`LdpcDecoder::decode`] and the caveat on the type documentation:
    /// the return value is always `Ok`.
    pub fn decode(&mut self, samples: &[f64]) -> Result<DecoderOutput, DecoderOutput> {
        assert_eq!(samples.len(), self.h.num_cols());
        hard_decisions(samples, &mut self.out);
        if syndrome(&self.h, &self.out, &mut self.synd) {
            return Ok(self.output(0));
        }
        let mut flips = 0;
        for j in 0..self.h.num_cols() {
            let unsatisfied: i32 = self
                .h
                .iter_col(j)
                .map(|&i| i32::from(self.synd[i]))
                .sum();
            if unsatisfied > self.majority {
                self.out[j] ^= 1;
                flips += 1;
            }
        }
        debug!("one-step majority logic flipped {} columns", flips);
        Ok(self.output(1))
    }

    fn output(&self, iterations: usize) -> DecoderOutput {
        DecoderOutput {
            codeword: self.out.clone(),
            iterations,
        }
    }
}

impl LdpcDecoder for OneStepDecoder {
    fn decode(&mut self, samples: &[f64]) -> Result<DecoderOutput, DecoderOutput> {
        OneStepDecoder::decode(self, samples)
    }
}

/// Register update rule.
///
/// Selects one of the iterative decoders of the majority-logic family.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Update {
    /// Registers start at the saturation bound from the hard decisions and
    /// saturate at the row weight.
    Hard,
    /// Registers quantize the received samples and saturate at the largest
    /// magnitude a three-bit register can hold.
    Soft,
    /// Like [`Update::Soft`], but checks vote with per-edge reliability
    /// weights and the register update is scaled by `alpha`.
    AdaptiveSoft {
        /// Update gain.
        alpha: f64,
    },
}

/// Iterative majority-logic decoder.
#[derive(Debug, Clone)]
pub struct Decoder {
    h: Arc<SparseMatrix>,
    update: Update,
    max_iterations: usize,
    bound: i32,
    out: Vec<u8>,
    synd: Vec<u8>,
    registers: Vec<i32>,
    real_registers: Vec<f64>,
    edge_weights: Array2<f64>,
}

impl Decoder {
    /// Creates a new iterative majority-logic decoder.
    ///
    /// The parameters are the parity check matrix, the register update rule
    /// and the maximum number of iterations per decode call.
    ///
    /// # Errors
    /// Fails if the parity check matrix is not row-regular.
    pub fn new(
        h: Arc<SparseMatrix>,
        update: Update,
        max_iterations: usize,
    ) -> Result<Decoder, Error> {
        let gamma = h.uniform_row_weight().ok_or(Error::IrregularCode)?;
        let bound = match update {
            Update::Hard => gamma as i32,
            Update::Soft | Update::AdaptiveSoft { .. } => (1 << (REGISTER_BITS - 1)) - 1,
        };
        let k = h.num_rows();
        let n = h.num_cols();
        let (registers, real_registers) = match update {
            Update::AdaptiveSoft { .. } => (Vec::new(), vec![0.0; n]),
            _ => (vec![0; n], Vec::new()),
        };
        let edge_weights = match update {
            // NaN marks the positions outside the sparsity pattern; they are
            // never read
            Update::AdaptiveSoft { .. } => Array2::from_elem((k, n), f64::NAN),
            _ => Array2::from_elem((0, 0), f64::NAN),
        };
        Ok(Decoder {
            out: vec![0; n],
            synd: vec![0; k],
            registers,
            real_registers,
            edge_weights,
            h,
            update,
            max_iterations,
            bound,
        })
    }

    /// Decodes a block of received channel samples.
    ///
    /// See [`LdpcDecoder::decode`].
    pub fn decode(&mut self, samples: &[f64]) -> Result<DecoderOutput, DecoderOutput> {
        let n = self.h.num_cols();
        assert_eq!(samples.len(), n);
        hard_decisions(samples, &mut self.out);
        match self.update {
            Update::Hard => {
                for j in 0..n {
                    self.registers[j] = if self.out[j] == 1 {
                        -self.bound
                    } else {
                        self.bound
                    };
                }
            }
            Update::Soft => {
                for j in 0..n {
                    self.registers[j] = quantize(samples[j], self.bound);
                }
            }
            Update::AdaptiveSoft { .. } => {
                for j in 0..n {
                    self.real_registers[j] = f64::from(quantize(samples[j], self.bound));
                }
            }
        }
        if syndrome(&self.h, &self.out, &mut self.synd) {
            return Ok(self.output(0));
        }
        match self.update {
            Update::AdaptiveSoft { alpha } => self.run_adaptive(alpha),
            _ => self.run_integer(),
        }
    }

    fn run_integer(&mut self) -> Result<DecoderOutput, DecoderOutput> {
        let n = self.h.num_cols();
        for iteration in 1..=self.max_iterations {
            for j in 0..n {
                // checks voting against the current decision of this bit
                // push the register toward flipping it
                let mut e = 0;
                for &i in self.h.iter_col(j) {
                    e += 2 * i32::from(self.synd[i] ^ self.out[j]) - 1;
                }
                let r = (self.registers[j] - e).clamp(-self.bound, self.bound);
                self.registers[j] = r;
                self.out[j] = u8::from(r < 0);
            }
            trace!("iteration {}: registers {:?}", iteration, self.registers);
            if syndrome(&self.h, &self.out, &mut self.synd) {
                debug!("majority logic converged after {} iterations", iteration);
                return Ok(self.output(iteration));
            }
        }
        debug!(
            "majority logic gave up after {} iterations",
            self.max_iterations
        );
        Err(self.output(self.max_iterations))
    }

    fn run_adaptive(&mut self, alpha: f64) -> Result<DecoderOutput, DecoderOutput> {
        let k = self.h.num_rows();
        let n = self.h.num_cols();
        let bound = f64::from(self.bound);
        // per-edge weights from the initial registers: each check votes on a
        // bit with the smallest register magnitude among its other bits
        for i in 0..k {
            for &j in self.h.iter_row(i) {
                let mut weight = f64::INFINITY;
                for &other in self.h.iter_row(i) {
                    if other != j {
                        weight = weight.min(self.real_registers[other].abs());
                    }
                }
                self.edge_weights[[i, j]] = weight;
            }
        }
        for iteration in 1..=self.max_iterations {
            for j in 0..n {
                let mut e = 0.0;
                for &i in self.h.iter_col(j) {
                    let against = (self.synd[i] ^ self.out[j]) == 1;
                    let weight = self.edge_weights[[i, j]];
                    e += if against { weight } else { -weight };
                }
                let r = (self.real_registers[j] - alpha * e).clamp(-bound, bound);
                self.real_registers[j] = r;
                self.out[j] = u8::from(r < 0.0);
            }
            trace!(
                "iteration {}: registers {:?}",
                iteration,
                self.real_registers
            );
            if syndrome(&self.h, &self.out, &mut self.synd) {
                debug!(
                    "adaptive majority logic converged after {} iterations",
                    iteration
                );
                return Ok(self.output(iteration));
            }
        }
        debug!(
            "adaptive majority logic gave up after {} iterations",
            self.max_iterations
        );
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

fn quantize(sample: f64, bound: i32) -> i32 {
    let q = (sample * f64::from(bound)).round() as i32;
    q.clamp(-bound, bound)
}

#[cfg(test)]
mod test {
    use super::*;

    fn test_matrix() -> Arc<SparseMatrix> {
        // Example 2.5 in Sarah J. Johnson - Iterative Error Correction
        let mut h = SparseMatrix::new(4, 6);
        h.insert_row(0, [0, 1, 3].iter());
        h.insert_row(1, [1, 2, 4].iter());
        h.insert_row(2, [0, 4, 5].iter());
        h.insert_row(3, [2, 3, 5].iter());
        Arc::new(h)
    }

    fn irregular_matrix() -> Arc<SparseMatrix> {
        let mut h = SparseMatrix::new(2, 4);
        h.insert_row(0, [0, 1].iter());
        h.insert_row(1, [1, 2, 3].iter());
        Arc::new(h)
    }

    fn to_samples(bits: &[u8]) -> Vec<f64> {
        bits.iter()
            .map(|&b| if b == 0 { 1.3863 } else { -1.3863 })
            .collect()
    }

    fn updates() -> Vec<Update> {
        vec![Update::Hard, Update::Soft, Update::AdaptiveSoft { alpha: 0.5 }]
    }

    #[test]
    fn irregular_matrix_rejected() {
        assert_eq!(
            OneStepDecoder::new(irregular_matrix()).err(),
            Some(Error::IrregularCode)
        );
        for update in updates() {
            assert_eq!(
                Decoder::new(irregular_matrix(), update, 10).err(),
                Some(Error::IrregularCode)
            );
        }
    }

    #[test]
    fn one_step_corrects_single_error() {
        let mut decoder = OneStepDecoder::new(test_matrix()).unwrap();
        let codeword_good = [0, 0, 1, 0, 1, 1];
        for j in 0..codeword_good.len() {
            let mut codeword_bad = codeword_good;
            codeword_bad[j] ^= 1;
            let output = decoder.decode(&to_samples(&codeword_bad)).unwrap();
            assert_eq!(&output.codeword, &codeword_good);
            assert_eq!(output.iterations, 1);
        }
    }

    #[test]
    fn one_step_always_succeeds() {
        // even on a word it cannot repair, the one-step corrector reports
        // success by contract
        let mut decoder = OneStepDecoder::new(test_matrix()).unwrap();
        let samples = [-0.1, -0.2, 0.3, -0.4, 0.5, -0.6];
        assert!(decoder.decode(&samples).is_ok());
    }

    #[test]
    fn no_errors() {
        for update in updates() {
            let mut decoder = Decoder::new(test_matrix(), update, 100).unwrap();
            let codeword = [0, 0, 1, 0, 1, 1];
            let output = decoder.decode(&to_samples(&codeword)).unwrap();
            assert_eq!(&output.codeword, &codeword);
            assert_eq!(output.iterations, 0);
        }
    }

    #[test]
    fn single_error() {
        for update in updates() {
            let mut decoder = Decoder::new(test_matrix(), update, 100).unwrap();
            let codeword_good = [0, 0, 1, 0, 1, 1];
            for j in 0..codeword_good.len() {
                let mut codeword_bad = codeword_good;
                codeword_bad[j] ^= 1;
                let output = decoder.decode(&to_samples(&codeword_bad)).unwrap();
                assert_eq!(&output.codeword, &codeword_good);
            }
        }
    }

    #[test]
    fn saturated_samples() {
        // samples far outside the register range quantize to the saturation
        // bound and decode normally
        for update in updates() {
            let mut decoder = Decoder::new(test_matrix(), update, 100).unwrap();
            let samples: Vec<f64> = to_samples(&[0, 0, 1, 0, 1, 1])
                .iter()
                .map(|x| x * 100.0)
                .collect();
            let output = decoder.decode(&samples).unwrap();
            assert_eq!(&output.codeword, &[0, 0, 1, 0, 1, 1]);
        }
    }
}
