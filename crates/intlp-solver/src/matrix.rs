use std::fmt;

use crate::error::{Error, Result};

/// Dense row-major matrix of `f64`.
///
/// Every transforming operation returns a new matrix; only [`Matrix::set`]
/// writes in place.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Vec<Vec<f64>>", into = "Vec<Vec<f64>>"))]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Create a `rows x cols` matrix filled with zeros
    pub fn zeros(rows: usize, cols: usize) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(Error::InvalidArgument(format!(
                "Matrix dimensions must be positive: ({}, {})",
                rows, cols
            )));
        }
        let Some(len) = rows.checked_mul(cols) else {
            return Err(Error::InvalidArgument(format!(
                "Matrix dimensions are too large: ({}, {})",
                rows, cols
            )));
        };
        Ok(Self {
            rows,
            cols,
            data: vec![0.0; len],
        })
    }

    /// Create a `1 x n` row vector
    pub fn from_vec(values: &[f64]) -> Result<Self> {
        if values.is_empty() {
            return Err(Error::InvalidArgument("A vector needs at least one element".to_string()));
        }
        Ok(Self {
            rows: 1,
            cols: values.len(),
            data: values.to_vec(),
        })
    }

    /// Create a matrix from its rows. All rows must have the same length.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let Some(first) = rows.first() else {
            return Err(Error::InvalidArgument("A matrix needs at least one row".to_string()));
        };
        let cols = first.len();
        if cols == 0 {
            return Err(Error::InvalidArgument("A matrix needs at least one column".to_string()));
        }

        let mut data = Vec::with_capacity(rows.len() * cols);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(Error::InvalidArgument(format!(
                    "Row {} has {} elements, expected {}",
                    i,
                    row.len(),
                    cols
                )));
            }
            data.extend_from_slice(row);
        }

        Ok(Self {
            rows: rows.len(),
            cols,
            data,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_vector(&self) -> bool {
        self.rows == 1 || self.cols == 1
    }

    /// Flatten a row or column vector into its elements
    pub fn to_vector(&self) -> Result<Vec<f64>> {
        if !self.is_vector() {
            return Err(Error::InvalidState(format!(
                "The matrix is not a vector: ({}, {})",
                self.rows, self.cols
            )));
        }
        Ok(self.data.clone())
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.data.chunks(self.cols).map(<[f64]>::to_vec).collect()
    }

    pub fn get(&self, row: usize, col: usize) -> Result<f64> {
        self.check_index(row, col)?;
        Ok(self.data[row * self.cols + col])
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        self.check_index(row, col)?;
        self.data[row * self.cols + col] = value;
        Ok(())
    }

    pub fn row(&self, row: usize) -> Result<Vec<f64>> {
        if row >= self.rows {
            return Err(Error::OutOfRange(format!(
                "Row {} must be between 0 and {}",
                row,
                self.rows - 1
            )));
        }
        Ok(self.row_slice(row).to_vec())
    }

    pub fn column(&self, col: usize) -> Result<Vec<f64>> {
        if col >= self.cols {
            return Err(Error::OutOfRange(format!(
                "Column {} must be between 0 and {}",
                col,
                self.cols - 1
            )));
        }
        Ok(self.column_iter(col).collect())
    }

    /// Return a copy of this matrix with `values` appended as the last row
    pub fn add_row(&self, values: &[f64]) -> Result<Matrix> {
        self.check_row_len(values)?;
        Ok(self.append_row(values))
    }

    /// Return a copy of this matrix with `values` appended as the last column
    pub fn add_column(&self, values: &[f64]) -> Result<Matrix> {
        self.check_column_len(values)?;

        let cols = self.cols + 1;
        let mut data = Vec::with_capacity(self.rows * cols);
        for (row, &value) in self.data.chunks(self.cols).zip(values) {
            data.extend_from_slice(row);
            data.push(value);
        }

        Ok(Matrix {
            rows: self.rows,
            cols,
            data,
        })
    }

    /// Index of the first row bit-identical to `values`
    pub fn find_row(&self, values: &[f64]) -> Result<Option<usize>> {
        self.check_row_len(values)?;
        Ok(self.position_of_row(values))
    }

    /// Index of the first column bit-identical to `values`
    pub fn find_column(&self, values: &[f64]) -> Result<Option<usize>> {
        self.check_column_len(values)?;
        Ok((0..self.cols).find(|&j| same_bits(self.column_iter(j), values)))
    }

    pub fn contains_row(&self, values: &[f64]) -> Result<bool> {
        Ok(self.find_row(values)?.is_some())
    }

    pub fn contains_column(&self, values: &[f64]) -> Result<bool> {
        Ok(self.find_column(values)?.is_some())
    }

    pub fn transpose(&self) -> Matrix {
        let mut data = Vec::with_capacity(self.data.len());
        for j in 0..self.cols {
            data.extend(self.column_iter(j));
        }
        Matrix {
            rows: self.cols,
            cols: self.rows,
            data,
        }
    }

    pub fn plus(&self, other: &Matrix) -> Result<Matrix> {
        self.zip_with(other, |a, b| a + b)
    }

    pub fn minus(&self, other: &Matrix) -> Result<Matrix> {
        self.zip_with(other, |a, b| a - b)
    }

    pub fn multiply_element_wise(&self, other: &Matrix) -> Result<Matrix> {
        self.zip_with(other, |a, b| a * b)
    }

    /// Inner product of conformant operands, as a `1 x 1` matrix.
    ///
    /// Requires `self` to be `r x c` and `other` to be `c x r`; the result is
    /// `sum(self[i][j] * other[j][i])`, which for a row vector and a column
    /// vector is the usual dot product.
    pub fn dot(&self, other: &Matrix) -> Result<Matrix> {
        if self.cols != other.rows || self.rows != other.cols {
            return Err(self.size_mismatch(other));
        }

        let mut value = 0.0;
        for i in 0..self.rows {
            for j in 0..self.cols {
                value += self.data[i * self.cols + j] * other.data[j * other.cols + i];
            }
        }

        Matrix::from_vec(&[value])
    }

    /// Standard matrix product
    pub fn multiply(&self, other: &Matrix) -> Result<Matrix> {
        if self.cols != other.rows {
            return Err(self.size_mismatch(other));
        }

        let mut data = vec![0.0; self.rows * other.cols];
        for i in 0..self.rows {
            for k in 0..self.cols {
                let a = self.data[i * self.cols + k];
                for j in 0..other.cols {
                    data[i * other.cols + j] += a * other.data[k * other.cols + j];
                }
            }
        }

        Ok(Matrix {
            rows: self.rows,
            cols: other.cols,
            data,
        })
    }

    /// Append a row whose length the caller has already checked.
    pub(crate) fn append_row(&self, values: &[f64]) -> Matrix {
        debug_assert_eq!(values.len(), self.cols);
        let mut data = Vec::with_capacity(self.data.len() + self.cols);
        data.extend_from_slice(&self.data);
        data.extend_from_slice(values);
        Matrix {
            rows: self.rows + 1,
            cols: self.cols,
            data,
        }
    }

    pub(crate) fn position_of_row(&self, values: &[f64]) -> Option<usize> {
        (0..self.rows).find(|&i| same_bits(self.row_slice(i).iter().copied(), values))
    }

    /// Build a matrix from storage the caller knows to be `rows x cols`.
    pub(crate) fn from_raw(rows: usize, cols: usize, data: Vec<f64>) -> Matrix {
        debug_assert!(rows > 0 && cols > 0 && data.len() == rows * cols);
        Matrix { rows, cols, data }
    }

    pub(crate) fn row_slice(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub(crate) fn as_slice(&self) -> &[f64] {
        &self.data
    }

    fn column_iter(&self, col: usize) -> impl Iterator<Item = f64> + '_ {
        self.data.iter().skip(col).step_by(self.cols).copied()
    }

    fn zip_with(&self, other: &Matrix, op: impl Fn(f64, f64) -> f64) -> Result<Matrix> {
        if self.rows != other.rows || self.cols != other.cols {
            return Err(self.size_mismatch(other));
        }
        Ok(Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().zip(&other.data).map(|(&a, &b)| op(a, b)).collect(),
        })
    }

    fn check_index(&self, row: usize, col: usize) -> Result<()> {
        if row >= self.rows || col >= self.cols {
            return Err(Error::OutOfRange(format!(
                "({}, {}) must be between (0, 0) and ({}, {})",
                row,
                col,
                self.rows - 1,
                self.cols - 1
            )));
        }
        Ok(())
    }

    fn check_row_len(&self, values: &[f64]) -> Result<()> {
        if values.len() != self.cols {
            return Err(Error::InvalidArgument(format!(
                "A row must have one element per column: {} is different than {}",
                values.len(),
                self.cols
            )));
        }
        Ok(())
    }

    fn check_column_len(&self, values: &[f64]) -> Result<()> {
        if values.len() != self.rows {
            return Err(Error::InvalidArgument(format!(
                "A column must have one element per row: {} is different than {}",
                values.len(),
                self.rows
            )));
        }
        Ok(())
    }

    fn size_mismatch(&self, other: &Matrix) -> Error {
        Error::InvalidArgument(format!(
            "Invalid matrix sizes: ({}, {}), ({}, {})",
            self.rows, self.cols, other.rows, other.cols
        ))
    }
}

fn same_bits(lhs: impl Iterator<Item = f64>, rhs: &[f64]) -> bool {
    lhs.zip(rhs).all(|(a, &b)| a.to_bits() == b.to_bits())
}

impl TryFrom<Vec<Vec<f64>>> for Matrix {
    type Error = Error;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self> {
        Matrix::from_rows(rows)
    }
}

impl From<Matrix> for Vec<Vec<f64>> {
    fn from(matrix: Matrix) -> Self {
        matrix.to_rows()
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.data.chunks(self.cols).enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "[")?;
            for (j, value) in row.iter().enumerate() {
                if j > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", value)?;
            }
            write!(f, "]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(rows: &[&[f64]]) -> Matrix {
        Matrix::from_rows(rows.iter().map(|r| r.to_vec()).collect()).unwrap()
    }

    fn assert_close(a: &Matrix, b: &Matrix) {
        assert_eq!((a.rows(), a.cols()), (b.rows(), b.cols()));
        for (x, y) in a.as_slice().iter().zip(b.as_slice()) {
            assert!((x - y).abs() < 1e-9, "{} != {}", x, y);
        }
    }

    #[test]
    fn test_constructors_reject_bad_shapes() {
        assert!(matches!(Matrix::zeros(0, 3), Err(Error::InvalidArgument(_))));
        assert!(matches!(Matrix::from_vec(&[]), Err(Error::InvalidArgument(_))));
        assert!(matches!(Matrix::from_rows(vec![]), Err(Error::InvalidArgument(_))));
        assert!(matches!(
            Matrix::from_rows(vec![vec![1.0, 2.0], vec![3.0]]),
            Err(Error::InvalidArgument(_))
        ));

        assert!(matches!(Matrix::zeros(usize::MAX, 2), Err(Error::InvalidArgument(_))));
        let z = Matrix::zeros(2, 3).unwrap();
        assert_eq!(z.rows(), 2);
        assert_eq!(z.cols(), 3);
        assert!(z.as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_get_set_bounds() {
        let mut a = Matrix::zeros(2, 2).unwrap();
        a.set(1, 0, 4.5).unwrap();
        assert_eq!(a.get(1, 0).unwrap(), 4.5);
        assert!(matches!(a.get(2, 0), Err(Error::OutOfRange(_))));
        assert!(matches!(a.set(0, 2, 1.0), Err(Error::OutOfRange(_))));
        assert!(matches!(a.row(2), Err(Error::OutOfRange(_))));
        assert!(matches!(a.column(5), Err(Error::OutOfRange(_))));
    }

    #[test]
    fn test_row_and_column_are_copies() {
        let a = m(&[&[1.0, 2.0], &[3.0, 4.0]]);
        let mut row = a.row(1).unwrap();
        row[0] = 99.0;
        assert_eq!(a.get(1, 0).unwrap(), 3.0);
        assert_eq!(a.column(1).unwrap(), vec![2.0, 4.0]);
    }

    #[test]
    fn test_vector_extraction() {
        assert_eq!(m(&[&[1.0, 2.0, 3.0]]).to_vector().unwrap(), vec![1.0, 2.0, 3.0]);
        assert_eq!(m(&[&[1.0], &[2.0]]).to_vector().unwrap(), vec![1.0, 2.0]);
        assert!(matches!(
            m(&[&[1.0, 2.0], &[3.0, 4.0]]).to_vector(),
            Err(Error::InvalidState(_))
        ));
    }

    #[test]
    fn test_add_row_and_column() {
        let a = m(&[&[1.0, 2.0]]);
        let b = a.add_row(&[3.0, 4.0]).unwrap();
        assert_eq!(b, m(&[&[1.0, 2.0], &[3.0, 4.0]]));
        assert_eq!(a.rows(), 1);

        let c = b.add_column(&[5.0, 6.0]).unwrap();
        assert_eq!(c, m(&[&[1.0, 2.0, 5.0], &[3.0, 4.0, 6.0]]));

        assert!(matches!(a.add_row(&[1.0]), Err(Error::InvalidArgument(_))));
        assert!(matches!(a.add_column(&[1.0, 2.0]), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_find_rows_and_columns() {
        let a = m(&[&[1.0, 0.0], &[0.0, 1.0], &[1.0, 0.0]]);
        assert_eq!(a.find_row(&[1.0, 0.0]).unwrap(), Some(0));
        assert_eq!(a.find_row(&[0.0, 1.0]).unwrap(), Some(1));
        assert_eq!(a.find_row(&[2.0, 2.0]).unwrap(), None);
        assert!(a.contains_row(&[0.0, 1.0]).unwrap());
        assert!(!a.contains_row(&[0.5, 0.5]).unwrap());

        assert_eq!(a.find_column(&[0.0, 1.0, 0.0]).unwrap(), Some(1));
        assert!(!a.contains_column(&[1.0, 1.0, 1.0]).unwrap());
        assert!(matches!(a.find_row(&[1.0]), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_find_row_is_bit_exact() {
        let a = m(&[&[0.0, 1.0]]);
        assert_eq!(a.find_row(&[-0.0, 1.0]).unwrap(), None);
        assert_eq!(a.find_row(&[0.0, 1.0 + f64::EPSILON]).unwrap(), None);
    }

    #[test]
    fn test_transpose_involution() {
        let a = m(&[&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]]);
        let t = a.transpose();
        assert_eq!(t, m(&[&[1.0, 4.0], &[2.0, 5.0], &[3.0, 6.0]]));
        assert_eq!(t.transpose(), a);
    }

    #[test]
    fn test_plus_minus() {
        let a = m(&[&[1.5, -2.0], &[0.1, 7.0]]);
        let b = m(&[&[0.2, 3.0], &[-4.0, 0.3]]);
        assert_close(&a.plus(&b).unwrap().minus(&b).unwrap(), &a);
        assert!(matches!(a.plus(&m(&[&[1.0, 2.0]])), Err(Error::InvalidArgument(_))));
        assert!(matches!(a.minus(&m(&[&[1.0], &[2.0]])), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_dot() {
        let row = m(&[&[1.0, 2.0, 3.0]]);
        let col = m(&[&[4.0], &[5.0], &[6.0]]);
        assert_eq!(row.dot(&col).unwrap(), m(&[&[32.0]]));
        assert!(matches!(row.dot(&row), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_multiply_element_wise() {
        let a = m(&[&[1.0, 2.0], &[3.0, 4.0], &[5.0, 6.0]]);
        let b = m(&[&[2.0, 0.5], &[1.0, -1.0], &[0.0, 2.0]]);
        assert_eq!(
            a.multiply_element_wise(&b).unwrap(),
            m(&[&[2.0, 1.0], &[3.0, -4.0], &[0.0, 12.0]])
        );
        assert!(matches!(
            a.multiply_element_wise(&a.transpose()),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_multiply() {
        let a = m(&[&[1.0, 2.0], &[3.0, 4.0]]);
        let b = m(&[&[5.0, 6.0, 7.0], &[8.0, 9.0, 10.0]]);
        assert_eq!(
            a.multiply(&b).unwrap(),
            m(&[&[21.0, 24.0, 27.0], &[47.0, 54.0, 61.0]])
        );
        assert!(matches!(b.multiply(&a), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_multiply_associative() {
        let a = m(&[&[1.0, -2.0], &[0.5, 3.0], &[2.0, 2.0]]);
        let b = m(&[&[4.0, 0.0, 1.0], &[-1.0, 2.0, 0.25]]);
        let c = m(&[&[1.0], &[3.0], &[-2.0]]);
        let left = a.multiply(&b).unwrap().multiply(&c).unwrap();
        let right = a.multiply(&b.multiply(&c).unwrap()).unwrap();
        assert_close(&left, &right);
    }

    #[test]
    fn test_display() {
        let a = m(&[&[1.0, 2.5], &[-3.0, 0.0]]);
        assert_eq!(a.to_string(), "[1, 2.5]\n[-3, 0]");
    }
}
