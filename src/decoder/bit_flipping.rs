//! Bit-flipping decoders.
//!
//! This module implements the bit-flipping family of LDPC decoders: plain
//! bit flipping (BF), weighted bit flipping (WBF), modified weighted bit
//! flipping (MWBF) and improved modified weighted bit flipping (IMWBF). The
//! four decoders share one loop: compute the syndrome, derive a per-column
//! flip metric from the unsatisfied checks, and flip every column whose
//! metric ties the maximum. They differ in the metric. BF counts unsatisfied
//! checks with an integer metric; the weighted rules fold in channel
//! reliability information, using per-check weights (WBF, MWBF) or per-edge
//! weights that exclude the target column (IMWBF), and MWBF and IMWBF
//! additionally subtract `alpha` times the reliability of the column itself.

use super::{hard_decisions, syndrome, DecoderOutput, LdpcDecoder};
use crate::sparse::SparseMatrix;
use log::{debug, trace};
use ndarray::Array2;
use std::sync::Arc;

/// Tolerance used to collect the flip set of the real-valued metrics.
const FLIP_EPSILON: f64 = 1e-3;

/// Flip metric rule.
///
/// Selects one of the four decoders of the bit-flipping family. The weighted
/// rules form a chain of refinements, so the rule that needs per-edge weights
/// also carries the reliability factor `alpha`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Rule {
    /// Plain bit flipping: the metric counts unsatisfied checks.
    Hard,
    /// Weighted bit flipping: each check votes with the reliability of its
    /// least reliable sample.
    Weighted,
    /// Modified weighted bit flipping: like [`Rule::Weighted`], minus
    /// `alpha` times the reliability of the column being scored.
    ModifiedWeighted {
        /// Reliability factor.
        alpha: f64,
    },
    /// Improved modified weighted bit flipping: like
    /// [`Rule::ModifiedWeighted`], but each check votes with the smallest
    /// reliability among its other samples.
    ImprovedWeighted {
        /// Reliability factor.
        alpha: f64,
    },
}

/// Bit-flipping decoder.
#[derive(Debug, Clone)]
pub struct Decoder {
    h: Arc<SparseMatrix>,
    rule: Rule,
    max_iterations: usize,
    out: Vec<u8>,
    synd: Vec<u8>,
    hard_metric: Vec<i32>,
    metric: Vec<f64>,
    check_weights: Vec<f64>,
    edge_weights: Array2<f64>,
}

impl Decoder {
    /// Creates a new bit-flipping decoder.
    ///
    /// The parameters are the parity check matrix, the flip metric rule and
    /// the maximum number of iterations per decode call.
    pub fn new(h: Arc<SparseMatrix>, rule: Rule, max_iterations: usize) -> Decoder {
        let k = h.num_rows();
        let n = h.num_cols();
        let (hard_metric, metric) = match rule {
            Rule::Hard => (vec![0; n], Vec::new()),
            _ => (Vec::new(), vec![0.0; n]),
        };
        let check_weights = match rule {
            Rule::Weighted | Rule::ModifiedWeighted { .. } => vec![0.0; k],
            _ => Vec::new(),
        };
        let edge_weights = match rule {
            // NaN marks the positions outside the sparsity pattern; they are
            // never read
            Rule::ImprovedWeighted { .. } => Array2::from_elem((k, n), f64::NAN),
            _ => Array2::from_elem((0, 0), f64::NAN),
        };
        Decoder {
            out: vec![0; n],
            synd: vec![0; k],
            hard_metric,
            metric,
            check_weights,
            edge_weights,
            h,
            rule,
            max_iterations,
        }
    }

    /// Decodes a block of received channel samples.
    ///
    /// See [`LdpcDecoder::decode`].
    pub fn decode(&mut self, samples: &[f64]) -> Result<DecoderOutput, DecoderOutput> {
        assert_eq!(samples.len(), self.h.num_cols());
        hard_decisions(samples, &mut self.out);
        if syndrome(&self.h, &self.out, &mut self.synd) {
            return Ok(self.output(0));
        }
        match self.rule {
            Rule::Hard => self.run_hard(),
            _ => self.run_weighted(samples),
        }
    }

    fn run_hard(&mut self) -> Result<DecoderOutput, DecoderOutput> {
        let n = self.h.num_cols();
        for iteration in 1..=self.max_iterations {
            for j in 0..n {
                self.hard_metric[j] = self
                    .h
                    .iter_col(j)
                    .map(|&i| i32::from(self.synd[i]))
                    .sum();
            }
            let threshold = self.hard_metric.iter().copied().max().unwrap_or(0);
            let mut flips = 0;
            for j in 0..n {
                if self.hard_metric[j] == threshold {
                    self.out[j] ^= 1;
                    flips += 1;
                }
            }
            trace!("iteration {}: flipped {} columns", iteration, flips);
            if syndrome(&self.h, &self.out, &mut self.synd) {
                debug!("bit flipping converged after {} iterations", iteration);
                return Ok(self.output(iteration));
            }
        }
        debug!(
            "bit flipping gave up after {} iterations",
            self.max_iterations
        );
        Err(self.output(self.max_iterations))
    }

    fn run_weighted(&mut self, samples: &[f64]) -> Result<DecoderOutput, DecoderOutput> {
        let k = self.h.num_rows();
        let n = self.h.num_cols();
        let (alpha, improved) = match self.rule {
            Rule::Weighted => (0.0, false),
            Rule::ModifiedWeighted { alpha } => (alpha, false),
            Rule::ImprovedWeighted { alpha } => (alpha, true),
            Rule::Hard => unreachable!(),
        };
        let modified = !matches!(self.rule, Rule::Weighted);

        // The weights depend only on the received samples, so they are
        // computed once per call, before the first metric pass.
        if improved {
            for i in 0..k {
                for &j in self.h.iter_row(i) {
                    let mut weight = f64::INFINITY;
                    for &other in self.h.iter_row(i) {
                        if other != j {
                            weight = weight.min(samples[other].abs());
                        }
                    }
                    self.edge_weights[[i, j]] = weight;
                }
            }
        } else {
            for (i, weight) in self.check_weights.iter_mut().enumerate() {
                *weight = self
                    .h
                    .iter_row(i)
                    .fold(f64::INFINITY, |w, &j| w.min(samples[j].abs()));
            }
        }

        for iteration in 1..=self.max_iterations {
            for j in 0..n {
                let mut e = if modified {
                    -alpha * samples[j].abs()
                } else {
                    0.0
                };
                for &i in self.h.iter_col(j) {
                    let weight = if improved {
                        self.edge_weights[[i, j]]
                    } else {
                        self.check_weights[i]
                    };
                    // an unsatisfied check votes for flipping, a satisfied
                    // one against
                    e += if self.synd[i] == 1 { weight } else { -weight };
                }
                self.metric[j] = e;
            }
            let threshold = self
                .metric
                .iter()
                .fold(f64::NEG_INFINITY, |a, &b| a.max(b));
            let mut flips = 0;
            for j in 0..n {
                if (self.metric[j] - threshold).abs() < FLIP_EPSILON {
                    self.out[j] ^= 1;
                    flips += 1;
                }
            }
            trace!("iteration {}: flipped {} columns", iteration, flips);
            if syndrome(&self.h, &self.out, &mut self.synd) {
                debug!(
                    "weighted bit flipping converged after {} iterations",
                    iteration
                );
                return Ok(self.output(iteration));
            }
        }
        debug!(
            "weighted bit flipping gave up after {} iterations",
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
