//! LDPC decoder factory.
//!
//! This module contains routines to build an LDPC decoder generically over
//! the decoding algorithms of this crate. Such decoders are represented by
//! `Box<dyn LdpcDecoder>`, using the trait [`LdpcDecoder`]. The
//! [`DecoderImplementation`] enum covers every decoder in the crate and can
//! be parsed from the name strings used by a benchmark harness.

use super::{bit_flipping, majority_logic, min_sum, LdpcDecoder};
use crate::sparse::SparseMatrix;
use enum_iterator::Sequence;
use std::fmt::Display;
use std::sync::Arc;
use thiserror::Error;

/// Decoder construction error.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Error)]
pub enum Error {
    /// A majority-logic decoder was requested for an unsuitable matrix.
    #[error(transparent)]
    MajorityLogic(#[from] majority_logic::Error),
    /// A min-sum decoder was requested with an invalid scaling parameter.
    #[error(transparent)]
    MinSum(#[from] min_sum::Error),
}

/// Decoder factory.
///
/// This trait is implemented by [`DecoderImplementation`], which builds a
/// suitable decoder depending on the value of an enum. Other factories can
/// be implemented by the user in order to drive a benchmark harness with an
/// LDPC decoder implemented externally to this crate (such a decoder must be
/// wrapped as a `Box<dyn LdpcDecoder>`).
pub trait DecoderFactory: Display + Clone + Send + Sync + 'static {
    /// Builds an LDPC decoder.
    ///
    /// Given a parity check matrix, a maximum number of iterations and a
    /// tuning factor `alpha` (ignored by the implementations that do not use
    /// one), this function builds an LDPC decoder corresponding to this
    /// decoder implementation.
    fn build_decoder(
        &self,
        h: Arc<SparseMatrix>,
        max_iterations: usize,
        alpha: f64,
    ) -> Result<Box<dyn LdpcDecoder>, Error>;
}

/// LDPC decoder implementation.
///
/// This enum lists the decoding algorithms implemented in this crate.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Sequence)]
pub enum DecoderImplementation {
    /// Plain bit flipping.
    Bf,
    /// Weighted bit flipping.
    Wbf,
    /// Modified weighted bit flipping. Uses `alpha`.
    Mwbf,
    /// Improved modified weighted bit flipping. Uses `alpha`.
    Imwbf,
    /// One-step majority logic.
    OneStepMlg,
    /// Iterative hard majority logic.
    HardMlg,
    /// Iterative soft majority logic.
    SoftMlg,
    /// Iterative adaptive soft majority logic. Uses `alpha`.
    AdaptiveSoftMlg,
    /// Plain min-sum.
    MinSum,
    /// Normalized min-sum. Uses `alpha`.
    NormalizedMinSum,
    /// Offset min-sum. Uses `alpha`.
    OffsetMinSum,
}

impl DecoderImplementation {
    /// Returns `true` if this implementation uses the `alpha` tuning factor.
    pub fn uses_alpha(&self) -> bool {
        matches!(
            self,
            DecoderImplementation::Mwbf
                | DecoderImplementation::Imwbf
                | DecoderImplementation::AdaptiveSoftMlg
                | DecoderImplementation::NormalizedMinSum
                | DecoderImplementation::OffsetMinSum
        )
    }
}

impl DecoderFactory for DecoderImplementation {
    fn build_decoder(
        &self,
        h: Arc<SparseMatrix>,
        max_iterations: usize,
        alpha: f64,
    ) -> Result<Box<dyn LdpcDecoder>, Error> {
        Ok(match self {
            DecoderImplementation::Bf => Box::new(bit_flipping::Decoder::new(
                h,
                bit_flipping::Rule::Hard,
                max_iterations,
            )),
            DecoderImplementation::Wbf => Box::new(bit_flipping::Decoder::new(
                h,
                bit_flipping::Rule::Weighted,
                max_iterations,
            )),
            DecoderImplementation::Mwbf => Box::new(bit_flipping::Decoder::new(
                h,
                bit_flipping::Rule::ModifiedWeighted { alpha },
                max_iterations,
            )),
            DecoderImplementation::Imwbf => Box::new(bit_flipping::Decoder::new(
                h,
                bit_flipping::Rule::ImprovedWeighted { alpha },
                max_iterations,
            )),
            DecoderImplementation::OneStepMlg => {
                Box::new(majority_logic::OneStepDecoder::new(h)?)
            }
            DecoderImplementation::HardMlg => Box::new(majority_logic::Decoder::new(
                h,
                majority_logic::Update::Hard,
                max_iterations,
            )?),
            DecoderImplementation::SoftMlg => Box::new(majority_logic::Decoder::new(
                h,
                majority_logic::Update::Soft,
                max_iterations,
            )?),
            DecoderImplementation::AdaptiveSoftMlg => Box::new(majority_logic::Decoder::new(
                h,
                majority_logic::Update::AdaptiveSoft { alpha },
                max_iterations,
            )?),
            DecoderImplementation::MinSum => Box::new(min_sum::Decoder::new(
                h,
                min_sum::Scaling::None,
                max_iterations,
            )?),
            DecoderImplementation::NormalizedMinSum => Box::new(min_sum::Decoder::new(
                h,
                min_sum::Scaling::Normalized { alpha },
                max_iterations,
            )?),
            DecoderImplementation::OffsetMinSum => Box::new(min_sum::Decoder::new(
                h,
                min_sum::Scaling::Offset { alpha },
                max_iterations,
            )?),
        })
    }
}

impl std::str::FromStr for DecoderImplementation {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "bf" => DecoderImplementation::Bf,
            "wbf" => DecoderImplementation::Wbf,
            "mwbf" => DecoderImplementation::Mwbf,
            "imwbf" => DecoderImplementation::Imwbf,
            "one-step-mlg" => DecoderImplementation::OneStepMlg,
            "hard-mlg" => DecoderImplementation::HardMlg,
            "soft-mlg" => DecoderImplementation::SoftMlg,
            "adaptive-soft-mlg" => DecoderImplementation::AdaptiveSoftMlg,
            "min-sum" => DecoderImplementation::MinSum,
            "normalized-min-sum" => DecoderImplementation::NormalizedMinSum,
            "offset-min-sum" => DecoderImplementation::OffsetMinSum,
            _ => return Err("invalid decoder implementation"),
        })
    }
}

impl Display for DecoderImplementation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(
            f,
            "{}",
            match self {
                DecoderImplementation::Bf => "bf",
                DecoderImplementation::Wbf => "wbf",
                DecoderImplementation::Mwbf => "mwbf",
                DecoderImplementation::Imwbf => "imwbf",
                DecoderImplementation::OneStepMlg => "one-step-mlg",
                DecoderImplementation::HardMlg => "hard-mlg",
                DecoderImplementation::SoftMlg => "soft-mlg",
                DecoderImplementation::AdaptiveSoftMlg => "adaptive-soft-mlg",
                DecoderImplementation::MinSum => "min-sum",
                DecoderImplementation::NormalizedMinSum => "normalized-min-sum",
                DecoderImplementation::OffsetMinSum => "offset-min-sum",
            }
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::codes::CyclicCode;
    use enum_iterator::all;
    use rand::Rng;
    use rand_chacha::{rand_core::SeedableRng, ChaCha8Rng};
    use rand_distr::StandardNormal;

    // cyclic code of length 15 with minimum distance 5, described by the
    // parity polynomial exponents {0, 4, 6, 7, 8} and all 15 cyclic shifts
    // as checks (row weight 5)
    fn test_code() -> Arc<SparseMatrix> {
        let code: CyclicCode = "15 15 5 : 0 4 6 7 8 ortho".parse().unwrap();
        Arc::new(code.h())
    }

    // alpha values that exercise each tuned decoder sensibly on the test code
    fn alpha_for(implementation: DecoderImplementation) -> f64 {
        match implementation {
            DecoderImplementation::Mwbf | DecoderImplementation::Imwbf => 0.2,
            DecoderImplementation::AdaptiveSoftMlg => 0.5,
            DecoderImplementation::NormalizedMinSum => 1.25,
            DecoderImplementation::OffsetMinSum => 0.15,
            _ => 0.0,
        }
    }

    fn parity_ok(h: &SparseMatrix, bits: &[u8]) -> bool {
        (0..h.num_rows()).all(|i| {
            h.iter_row(i).map(|&j| u32::from(bits[j])).sum::<u32>() % 2 == 0
        })
    }

    #[test]
    fn name_roundtrip() {
        for implementation in all::<DecoderImplementation>() {
            let name = implementation.to_string();
            assert_eq!(name.parse::<DecoderImplementation>(), Ok(implementation));
        }
        assert!("bit-flipping".parse::<DecoderImplementation>().is_err());
    }

    #[test]
    fn alpha_usage() {
        let with_alpha: Vec<DecoderImplementation> = all::<DecoderImplementation>()
            .filter(DecoderImplementation::uses_alpha)
            .collect();
        assert_eq!(
            with_alpha,
            vec![
                DecoderImplementation::Mwbf,
                DecoderImplementation::Imwbf,
                DecoderImplementation::AdaptiveSoftMlg,
                DecoderImplementation::NormalizedMinSum,
                DecoderImplementation::OffsetMinSum,
            ]
        );
    }

    #[test]
    fn clean_input_needs_no_iterations() {
        let h = test_code();
        for implementation in all::<DecoderImplementation>() {
            let mut decoder = implementation
                .build_decoder(h.clone(), 50, alpha_for(implementation))
                .unwrap();
            let output = decoder.decode(&[1.0; 15]).unwrap();
            assert_eq!(output.codeword, vec![0; 15], "{}", implementation);
            assert_eq!(output.iterations, 0, "{}", implementation);
        }
    }

    #[test]
    fn single_strong_error() {
        let h = test_code();
        for implementation in all::<DecoderImplementation>() {
            let mut decoder = implementation
                .build_decoder(h.clone(), 50, alpha_for(implementation))
                .unwrap();
            let mut samples = [1.0; 15];
            samples[3] = -0.9;
            let output = decoder.decode(&samples).unwrap();
            assert_eq!(output.codeword, vec![0; 15], "{}", implementation);
        }
    }

    #[test]
    fn two_weak_errors() {
        // two low-reliability errors sit just inside the correction radius
        // of the distance-5 code; the decoders that exploit reliability
        // information recover the transmitted word
        let h = test_code();
        for implementation in [
            DecoderImplementation::Wbf,
            DecoderImplementation::Mwbf,
            DecoderImplementation::Imwbf,
            DecoderImplementation::AdaptiveSoftMlg,
        ] {
            let mut decoder = implementation
                .build_decoder(h.clone(), 50, alpha_for(implementation))
                .unwrap();
            let mut samples = [0.2; 15];
            samples[3] = -0.15;
            samples[9] = -0.15;
            let output = decoder.decode(&samples).unwrap();
            assert_eq!(output.codeword, vec![0; 15], "{}", implementation);
        }
    }

    #[test]
    fn tied_metrics_flip_together() {
        // with two equal-reliability errors every column whose flip metric
        // ties the maximum is flipped in the same pass; for plain bit
        // flipping on this input the first pass flips five columns at once,
        // so after the single allowed iteration the word holds the three
        // freshly corrupted bits
        let h = test_code();
        let mut decoder = DecoderImplementation::Bf.build_decoder(h, 1, 0.0).unwrap();
        let mut samples = [0.2; 15];
        samples[3] = -0.15;
        samples[9] = -0.15;
        let output = decoder.decode(&samples).unwrap_err();
        let mut expected = vec![0u8; 15];
        for j in [7, 10, 11] {
            expected[j] = 1;
        }
        assert_eq!(output.codeword, expected);
        assert_eq!(output.iterations, 1);
    }

    #[test]
    fn uncorrectable_burst_reports_accurately() {
        // six adjacent errors exceed the minimum distance; whatever the
        // decoders do, the success flag must match the parity of the output,
        // and a reported success can only be a convergence to a codeword
        // other than the transmitted one
        let h = test_code();
        let mut samples = [1.0; 15];
        for s in samples.iter_mut().take(6) {
            *s = -1.0;
        }
        for implementation in all::<DecoderImplementation>() {
            if implementation == DecoderImplementation::OneStepMlg {
                // the one-step corrector reports success by contract
                continue;
            }
            let mut decoder = implementation
                .build_decoder(h.clone(), 50, alpha_for(implementation))
                .unwrap();
            match decoder.decode(&samples) {
                Ok(output) => {
                    assert!(parity_ok(&h, &output.codeword), "{}", implementation);
                }
                Err(output) => {
                    assert!(!parity_ok(&h, &output.codeword), "{}", implementation);
                    assert_eq!(output.iterations, 50, "{}", implementation);
                }
            }
        }
        // with every reliability equal, the bit-flipping rules walk the same
        // flip sets and settle on a valid codeword six places away from the
        // transmitted one
        for implementation in [
            DecoderImplementation::Bf,
            DecoderImplementation::Wbf,
            DecoderImplementation::Mwbf,
            DecoderImplementation::Imwbf,
        ] {
            let mut decoder = implementation
                .build_decoder(h.clone(), 50, alpha_for(implementation))
                .unwrap();
            let output = decoder.decode(&samples).unwrap();
            assert!(parity_ok(&h, &output.codeword), "{}", implementation);
            assert_ne!(output.codeword, vec![0; 15], "{}", implementation);
        }
    }

    #[test]
    fn zero_iterations_budget() {
        let h = test_code();
        let mut decoder = DecoderImplementation::Bf.build_decoder(h, 0, 0.0).unwrap();
        assert!(decoder.decode(&[1.0; 15]).is_ok());
        let mut samples = [1.0; 15];
        samples[3] = -0.9;
        let output = decoder.decode(&samples).unwrap_err();
        assert_eq!(output.iterations, 0);
        // the hard decision is returned untouched
        let mut expected = vec![0u8; 15];
        expected[3] = 1;
        assert_eq!(output.codeword, expected);
    }

    #[test]
    fn decoding_is_deterministic() {
        let h = test_code();
        let mut samples = [0.2; 15];
        samples[3] = -0.15;
        samples[9] = -0.15;
        for implementation in all::<DecoderImplementation>() {
            let mut decoder = implementation
                .build_decoder(h.clone(), 50, alpha_for(implementation))
                .unwrap();
            let first = decoder.decode(&samples);
            let second = decoder.decode(&samples);
            assert_eq!(first, second, "{}", implementation);
        }
    }

    #[test]
    fn noisy_channel_flag_accuracy() {
        // transmit the all-zero codeword over a reproducible noisy channel
        // and check that every decoder keeps its success flag consistent
        // with the parity of its output
        let h = test_code();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for trial in 0..20 {
            let samples: Vec<f64> = (0..15)
                .map(|_| 1.0 + 0.8 * rng.sample::<f64, _>(StandardNormal))
                .collect();
            for implementation in all::<DecoderImplementation>() {
                if implementation == DecoderImplementation::OneStepMlg {
                    continue;
                }
                let mut decoder = implementation
                    .build_decoder(h.clone(), 50, alpha_for(implementation))
                    .unwrap();
                match decoder.decode(&samples) {
                    Ok(output) => {
                        assert!(
                            parity_ok(&h, &output.codeword),
                            "{} trial {}",
                            implementation,
                            trial
                        );
                    }
                    Err(output) => {
                        assert!(
                            !parity_ok(&h, &output.codeword),
                            "{} trial {}",
                            implementation,
                            trial
                        );
                    }
                }
            }
        }
    }
}
