//! # Cyclic code descriptions
//!
//! This module parses the textual control lines that describe the cyclic
//! codes used with the decoders in this crate, and expands a description into
//! its parity check matrix. A control line has the form
//!
//! ```text
//! <n> <k> <d_min> : <e1> <e2> ... <eR> <ortho|nonortho>
//! ```
//!
//! where `n` is the code length, `k` the number of parity checks, `d_min` the
//! minimum distance, and the `e` values are the exponents of the nonzero
//! terms of the polynomial defining one row of the parity check matrix. The
//! polynomial is expanded, high exponent first, into a bit string of length
//! `n`, and the `k` rows of the matrix are the cyclic shifts of that bit
//! string. The trailing keyword records whether the checks of the code are
//! orthogonal.
//!
//! A file may hold one control line per code. Blank lines and lines starting
//! with `#` are skipped.

use crate::sparse::SparseMatrix;
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

/// Control line parse error.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Error)]
pub enum ParseError {
    /// The line has no `:` between the dimensions and the exponents.
    #[error("control line has no `:` separator")]
    MissingSeparator,
    /// The part before the `:` is not three whitespace-separated fields.
    #[error("control line header must be `<n> <k> <d_min>`")]
    BadHeader,
    /// A field could not be parsed as a number.
    #[error("invalid number `{0}` in control line")]
    BadNumber(String),
    /// The code dimensions are impossible.
    #[error("invalid code dimensions n = {n}, k = {k}")]
    BadDimensions {
        /// Code length given in the line.
        n: usize,
        /// Number of parity checks given in the line.
        k: usize,
    },
    /// The line lists no polynomial exponents.
    #[error("control line lists no polynomial exponents")]
    NoExponents,
    /// An exponent does not fit in the code length.
    #[error("exponent {exponent} out of range for code length {n}")]
    ExponentOutOfRange {
        /// The offending exponent.
        exponent: usize,
        /// Code length given in the line.
        n: usize,
    },
    /// The same exponent appears twice.
    #[error("duplicate exponent {0}")]
    DuplicateExponent(usize),
    /// The line does not end in `ortho` or `nonortho`.
    #[error("control line must end in `ortho` or `nonortho`")]
    BadTrailer,
}

/// Description of a cyclic code
///
/// The parity check matrix of the code has `k` rows, each a cyclic shift of
/// the bit string obtained by expanding the row polynomial. All rows have the
/// same weight (the number of polynomial exponents), so these matrices are
/// always row-regular.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct CyclicCode {
    n: usize,
    k: usize,
    d_min: usize,
    exponents: Vec<usize>,
    orthogonal: bool,
}

impl CyclicCode {
    /// Creates a cyclic code description.
    ///
    /// # Errors
    /// The dimensions and exponents are validated as when parsing a control
    /// line: `1 <= k <= n`, at least one exponent, every exponent smaller
    /// than `n`, and no duplicate exponents.
    pub fn new(
        n: usize,
        k: usize,
        d_min: usize,
        exponents: Vec<usize>,
        orthogonal: bool,
    ) -> Result<CyclicCode, ParseError> {
        if n == 0 || k == 0 || k > n {
            return Err(ParseError::BadDimensions { n, k });
        }
        if exponents.is_empty() {
            return Err(ParseError::NoExponents);
        }
        for (idx, &e) in exponents.iter().enumerate() {
            if e >= n {
                return Err(ParseError::ExponentOutOfRange { exponent: e, n });
            }
            if exponents[..idx].contains(&e) {
                return Err(ParseError::DuplicateExponent(e));
            }
        }
        Ok(CyclicCode {
            n,
            k,
            d_min,
            exponents,
            orthogonal,
        })
    }

    /// Returns the code length.
    pub fn n(&self) -> usize {
        self.n
    }

    /// Returns the number of parity checks.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Returns the minimum distance of the code.
    pub fn d_min(&self) -> usize {
        self.d_min
    }

    /// Returns `true` if the parity checks of the code are orthogonal.
    pub fn orthogonal(&self) -> bool {
        self.orthogonal
    }

    /// Returns the weight of each parity check matrix row.
    pub fn row_weight(&self) -> usize {
        self.exponents.len()
    }

    /// Constructs the parity check matrix for the code.
    ///
    /// # Examples
    /// ```
    /// # use ldpc_decoders::codes::CyclicCode;
    /// let code: CyclicCode = "15 15 5 : 0 4 6 7 8 ortho".parse().unwrap();
    /// let h = code.h();
    /// assert_eq!(h.num_rows(), 15);
    /// assert_eq!(h.uniform_row_weight(), Some(5));
    /// ```
    pub fn h(&self) -> SparseMatrix {
        // positions of the ones in the expanded bit string, high exponent at
        // position zero
        let degree = *self.exponents.iter().max().unwrap();
        let positions: Vec<usize> = (0..=degree)
            .filter(|p| self.exponents.contains(&(degree - p)))
            .collect();
        let mut h = SparseMatrix::new(self.k, self.n);
        for i in 0..self.k {
            h.insert_row(i, positions.iter().map(|&p| (p + i) % self.n));
        }
        h
    }
}

impl FromStr for CyclicCode {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<CyclicCode, ParseError> {
        let (head, tail) = s.split_once(':').ok_or(ParseError::MissingSeparator)?;
        let mut fields = head.split_whitespace();
        let mut field = || fields.next().ok_or(ParseError::BadHeader);
        let n = parse_number(field()?)?;
        let k = parse_number(field()?)?;
        let d_min = parse_number(field()?)?;
        if fields.next().is_some() {
            return Err(ParseError::BadHeader);
        }
        let mut tokens: Vec<&str> = tail.split_whitespace().collect();
        let orthogonal = match tokens.pop() {
            Some("ortho") => true,
            Some("nonortho") => false,
            _ => return Err(ParseError::BadTrailer),
        };
        let exponents = tokens
            .iter()
            .map(|tok| parse_number(tok))
            .collect::<Result<Vec<usize>, ParseError>>()?;
        CyclicCode::new(n, k, d_min, exponents, orthogonal)
    }
}

impl Display for CyclicCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {} :", self.n, self.k, self.d_min)?;
        for e in &self.exponents {
            write!(f, " {}", e)?;
        }
        write!(
            f,
            " {}",
            if self.orthogonal { "ortho" } else { "nonortho" }
        )
    }
}

fn parse_number(token: &str) -> Result<usize, ParseError> {
    token
        .parse()
        .map_err(|_| ParseError::BadNumber(token.to_string()))
}

/// Parses a table of control lines.
///
/// Returns one [`CyclicCode`] per control line in `text`. Blank lines and
/// lines whose first non-whitespace character is `#` are skipped.
///
/// # Errors
/// The error of the first line that fails to parse is returned.
pub fn parse_table(text: &str) -> Result<Vec<CyclicCode>, ParseError> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::parse)
        .collect()
}
