//! Dense/sparse matrix capability used by the model builders.
//!
//! Assembly code is written once against [`MatrixLike`]; `DMatrix<f64>` is the
//! dense implementation and [`SparseMatrix`] (CSC storage) the sparse one.

use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::{CooMatrix, CscMatrix};
use std::fmt::Debug;
use std::ops::Range;

/// Nonzero entry `(row, col, value)`.
pub type Triplet = (usize, usize, f64);

pub trait MatrixLike: Clone + Debug {
    fn zeros(nrows: usize, ncols: usize) -> Self;
    fn nrows(&self) -> usize;
    fn ncols(&self) -> usize;

    /// Stored nonzero entries.
    fn triplets(&self) -> Vec<Triplet>;

    /// Adds `factor * value` for every entry, offset by `(row, col)`.
    fn add_triplets(&mut self, row: usize, col: usize, entries: &[Triplet], factor: f64);

    fn scale_columns(&mut self, cols: Range<usize>, factor: f64);
    fn scale(&mut self, factor: f64);

    fn mul_vec(&self, x: &DVector<f64>) -> DVector<f64>;
    /// `self * rhs`
    fn mul_dense(&self, rhs: &DMatrix<f64>) -> DMatrix<f64>;
    /// `lhs * self`
    fn premul_dense(&self, lhs: &DMatrix<f64>) -> DMatrix<f64>;
    /// `self * rhs` in the same storage.
    fn mul_same(&self, rhs: &Self) -> Self;

    /// New matrix made of the listed columns, in order.
    fn keep_columns(&self, cols: &[usize]) -> Self;

    fn to_dense(&self) -> DMatrix<f64>;
    fn nnz(&self) -> usize;

    fn shape(&self) -> (usize, usize) {
        (self.nrows(), self.ncols())
    }

    fn from_dense(dense: &DMatrix<f64>) -> Self {
        let mut out = Self::zeros(dense.nrows(), dense.ncols());
        out.add_block(0, 0, dense);
        out
    }

    /// Adds a dense block with its top-left corner at `(row, col)`.
    fn add_block(&mut self, row: usize, col: usize, block: &DMatrix<f64>) {
        self.add_triplets(row, col, &dense_triplets(block), 1.0);
    }

    /// Adds `factor * other` with its top-left corner at `(row, col)`.
    fn add_block_from(&mut self, row: usize, col: usize, other: &Self, factor: f64) {
        self.add_triplets(row, col, &other.triplets(), factor);
    }

    /// Adds `value` on `len` diagonal entries starting at `(row, col)`.
    fn add_diagonal(&mut self, row: usize, col: usize, len: usize, value: f64) {
        let entries: Vec<Triplet> = (0..len).map(|i| (i, i, value)).collect();
        self.add_triplets(row, col, &entries, 1.0);
    }

    /// Dense copy of a sub-block.
    fn block(&self, rows: Range<usize>, cols: Range<usize>) -> DMatrix<f64> {
        let mut out = DMatrix::zeros(rows.len(), cols.len());
        for (i, j, v) in self.triplets() {
            if rows.contains(&i) && cols.contains(&j) {
                out[(i - rows.start, j - cols.start)] += v;
            }
        }
        out
    }
}

fn dense_triplets(m: &DMatrix<f64>) -> Vec<Triplet> {
    let mut out = Vec::new();
    for j in 0..m.ncols() {
        for i in 0..m.nrows() {
            let v = m[(i, j)];
            if v != 0.0 {
                out.push((i, j, v));
            }
        }
    }
    out
}

impl MatrixLike for DMatrix<f64> {
    fn zeros(nrows: usize, ncols: usize) -> Self {
        DMatrix::zeros(nrows, ncols)
    }

    fn nrows(&self) -> usize {
        self.shape().0
    }

    fn ncols(&self) -> usize {
        self.shape().1
    }

    fn triplets(&self) -> Vec<Triplet> {
        dense_triplets(self)
    }

    fn add_triplets(&mut self, row: usize, col: usize, entries: &[Triplet], factor: f64) {
        for &(i, j, v) in entries {
            self[(row + i, col + j)] += factor * v;
        }
    }

    fn add_block(&mut self, row: usize, col: usize, block: &DMatrix<f64>) {
        let mut view = self.view_mut((row, col), block.shape());
        view += block;
    }

    fn scale_columns(&mut self, cols: Range<usize>, factor: f64) {
        for j in cols {
            let mut c = self.column_mut(j);
            c *= factor;
        }
    }

    fn scale(&mut self, factor: f64) {
        *self *= factor;
    }

    fn mul_vec(&self, x: &DVector<f64>) -> DVector<f64> {
        self * x
    }

    fn mul_dense(&self, rhs: &DMatrix<f64>) -> DMatrix<f64> {
        self * rhs
    }

    fn premul_dense(&self, lhs: &DMatrix<f64>) -> DMatrix<f64> {
        lhs * self
    }

    fn mul_same(&self, rhs: &Self) -> Self {
        self * rhs
    }

    fn keep_columns(&self, cols: &[usize]) -> Self {
        self.select_columns(cols.iter())
    }

    fn block(&self, rows: Range<usize>, cols: Range<usize>) -> DMatrix<f64> {
        self.view((rows.start, cols.start), (rows.len(), cols.len()))
            .into_owned()
    }

    fn to_dense(&self) -> DMatrix<f64> {
        self.clone()
    }

    fn nnz(&self) -> usize {
        self.iter().filter(|v| **v != 0.0).count()
    }
}

/// Sparse matrix in CSC storage.
///
/// Block additions rebuild the CSC arrays through COO; assembly adds few
/// large blocks so the rebuild cost stays proportional to the final size.
#[derive(Clone, Debug, PartialEq)]
pub struct SparseMatrix {
    csc: CscMatrix<f64>,
}

impl SparseMatrix {
    pub fn from_triplets(nrows: usize, ncols: usize, entries: &[Triplet]) -> Self {
        let mut coo = CooMatrix::new(nrows, ncols);
        for &(i, j, v) in entries {
            if v != 0.0 {
                coo.push(i, j, v);
            }
        }
        Self {
            csc: CscMatrix::from(&coo),
        }
    }

    pub fn csc(&self) -> &CscMatrix<f64> {
        &self.csc
    }

    fn rebuild(&mut self, entries: Vec<Triplet>) {
        *self = Self::from_triplets(self.nrows(), self.ncols(), &entries);
    }
}

impl MatrixLike for SparseMatrix {
    fn zeros(nrows: usize, ncols: usize) -> Self {
        Self {
            csc: CscMatrix::zeros(nrows, ncols),
        }
    }

    fn nrows(&self) -> usize {
        self.csc.nrows()
    }

    fn ncols(&self) -> usize {
        self.csc.ncols()
    }

    fn triplets(&self) -> Vec<Triplet> {
        self.csc.triplet_iter().map(|(i, j, v)| (i, j, *v)).collect()
    }

    fn add_triplets(&mut self, row: usize, col: usize, entries: &[Triplet], factor: f64) {
        let mut all = self.triplets();
        all.extend(
            entries
                .iter()
                .map(|&(i, j, v)| (row + i, col + j, factor * v)),
        );
        // duplicates are summed by the COO -> CSC conversion
        self.rebuild(all);
    }

    fn scale_columns(&mut self, cols: Range<usize>, factor: f64) {
        let scaled = self
            .triplets()
            .into_iter()
            .map(|(i, j, v)| if cols.contains(&j) { (i, j, factor * v) } else { (i, j, v) })
            .collect();
        self.rebuild(scaled);
    }

    fn scale(&mut self, factor: f64) {
        for v in self.csc.values_mut() {
            *v *= factor;
        }
    }

    fn mul_vec(&self, x: &DVector<f64>) -> DVector<f64> {
        let mut y = DVector::zeros(self.nrows());
        for (i, j, v) in self.csc.triplet_iter() {
            y[i] += v * x[j];
        }
        y
    }

    fn mul_dense(&self, rhs: &DMatrix<f64>) -> DMatrix<f64> {
        let mut out = DMatrix::zeros(self.nrows(), rhs.ncols());
        for (i, j, v) in self.csc.triplet_iter() {
            for k in 0..rhs.ncols() {
                out[(i, k)] += v * rhs[(j, k)];
            }
        }
        out
    }

    fn premul_dense(&self, lhs: &DMatrix<f64>) -> DMatrix<f64> {
        let mut out = DMatrix::zeros(lhs.nrows(), self.ncols());
        for (i, j, v) in self.csc.triplet_iter() {
            for k in 0..lhs.nrows() {
                out[(k, j)] += lhs[(k, i)] * v;
            }
        }
        out
    }

    fn mul_same(&self, rhs: &Self) -> Self {
        Self {
            csc: &self.csc * &rhs.csc,
        }
    }

    fn keep_columns(&self, cols: &[usize]) -> Self {
        let mut positions: Vec<Vec<usize>> = vec![Vec::new(); self.ncols()];
        for (new, &old) in cols.iter().enumerate() {
            positions[old].push(new);
        }
        let mut entries = Vec::new();
        for (i, j, v) in self.csc.triplet_iter() {
            for &new in &positions[j] {
                entries.push((i, new, *v));
            }
        }
        Self::from_triplets(self.nrows(), cols.len(), &entries)
    }

    fn to_dense(&self) -> DMatrix<f64> {
        let mut out = DMatrix::zeros(self.nrows(), self.ncols());
        for (i, j, v) in self.csc.triplet_iter() {
            out[(i, j)] += *v;
        }
        out
    }

    fn nnz(&self) -> usize {
        self.csc.nnz()
    }
}
