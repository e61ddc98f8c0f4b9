use crate::rom::error::{RomError, RomResult};

/// Dense row-major matrix of f64 values.
///
/// Matrices arrive as whitespace-delimited ASCII text inside the dataset
/// archive. A file with zero data rows decodes to a `0 x 0` matrix, a valid
/// state the assembly layer keeps distinct from "matrix never arrived".
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    pub fn empty() -> Self {
        Matrix {
            rows: 0,
            cols: 0,
            data: Vec::new(),
        }
    }

    /// Parse one archive text file: one matrix row per line, values
    /// whitespace-separated, blank lines skipped. Every token must parse as
    /// a number and every row must have the same width; anything else is a
    /// fatal decode error naming the offending file.
    pub fn parse(text: &str, file: &str) -> RomResult<Matrix> {
        let mut data = Vec::new();
        let mut rows = 0usize;
        let mut cols: Option<usize> = None;

        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let mut width = 0usize;
            for token in line.split_whitespace() {
                let value: f64 = token.parse().map_err(|_| {
                    RomError::decode(file, format!("non-numeric token {token:?} in row {rows}"))
                })?;
                data.push(value);
                width += 1;
            }
            match cols {
                None => cols = Some(width),
                Some(expected) if expected != width => {
                    return Err(RomError::decode(
                        file,
                        format!("ragged row {rows}: expected {expected} values, got {width}"),
                    ));
                }
                Some(_) => {}
            }
            rows += 1;
        }

        Ok(Matrix {
            rows,
            cols: cols.unwrap_or(0),
            data,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    /// Row-major backing storage.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Pure transpose: `transpose(M)[j][i] == M[i][j]`.
    pub fn transpose(&self) -> Matrix {
        let mut out = Vec::with_capacity(self.data.len());
        for col in 0..self.cols {
            for row in 0..self.rows {
                out.push(self.get(row, col));
            }
        }
        Matrix {
            rows: self.cols,
            cols: self.rows,
            data: out,
        }
    }

    /// Flattened column-then-row iteration order, the layout the solver
    /// consumes. Equivalent to `self.transpose().as_slice()` but without
    /// relabeling the shape.
    pub fn column_major(&self) -> Vec<f64> {
        self.transpose().data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Matrix {
        Matrix::parse("1 2 3\n4 5 6\n", "sample_mat.txt").unwrap()
    }

    #[test]
    fn test_parse_basic_shape() {
        let m = sample();
        assert_eq!(m.rows(), 2);
        assert_eq!(m.cols(), 3);
        assert_eq!(m.get(0, 0), 1.0);
        assert_eq!(m.get(1, 2), 6.0);
    }

    #[test]
    fn test_parse_skips_blank_lines() {
        let m = Matrix::parse("\n1 2\n\n3 4\n\n", "m.txt").unwrap();
        assert_eq!(m.rows(), 2);
        assert_eq!(m.cols(), 2);
    }

    #[test]
    fn test_parse_scientific_notation() {
        let m = Matrix::parse("1.5e-3 -2.25E+2\n", "m.txt").unwrap();
        assert_eq!(m.get(0, 0), 1.5e-3);
        assert_eq!(m.get(0, 1), -225.0);
    }

    #[test]
    fn test_zero_rows_is_valid_and_distinct() {
        let m = Matrix::parse("", "empty_mat.txt").unwrap();
        assert_eq!(m.rows(), 0);
        assert_eq!(m.cols(), 0);
        assert!(m.is_empty());
    }

    #[test]
    fn test_non_numeric_token_names_file() {
        let err = Matrix::parse("1 2\n3 oops\n", "K_mat.txt").unwrap_err();
        match err {
            RomError::Decode { file, detail } => {
                assert_eq!(file, "K_mat.txt");
                assert!(detail.contains("oops"), "detail was: {detail}");
            }
            other => panic!("expected Decode error, got {other:?}"),
        }
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let err = Matrix::parse("1 2 3\n4 5\n", "B_mat.txt").unwrap_err();
        assert!(matches!(err, RomError::Decode { .. }));
    }

    #[test]
    fn test_transpose_definition() {
        let m = sample();
        let t = m.transpose();
        assert_eq!(t.rows(), 3);
        assert_eq!(t.cols(), 2);
        for i in 0..m.rows() {
            for j in 0..m.cols() {
                assert_eq!(t.get(j, i), m.get(i, j));
            }
        }
    }

    #[test]
    fn test_transpose_round_trip() {
        for text in ["7\n", "1 2 3 4\n", "1 2\n3 4\n5 6\n", ""] {
            let m = Matrix::parse(text, "m.txt").unwrap();
            assert_eq!(m.transpose().transpose(), m, "round trip failed for {text:?}");
        }
    }

    #[test]
    fn test_column_major_order() {
        let m = sample();
        assert_eq!(m.column_major(), vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    }

    #[test]
    fn test_decode_deterministic() {
        let text = "0.1 0.2\n0.3 0.4\n";
        let a = Matrix::parse(text, "m.txt").unwrap();
        let b = Matrix::parse(text, "m.txt").unwrap();
        assert_eq!(a, b);
    }
}
