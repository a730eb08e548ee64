use std::fmt;

use tracing::{debug, instrument};

use crate::collections::vector::{BinaryOp, CiphertextVector};
use crate::error::{FvError, Result};
use crate::fv::Ciphertext;
use crate::parallel::{CancelToken, WorkerPool};

/// Column-major matrix of ciphertexts: element (i, j) lives at i + j·nrow.
#[derive(Clone, Debug, PartialEq)]
pub struct CiphertextMatrix {
    elements: Vec<Ciphertext>,
    nrow: usize,
    ncol: usize,
}

/// Number of cells in an nrow x ncol matrix, rejecting sizes that overflow.
pub(crate) fn cell_count(nrow: usize, ncol: usize) -> Result<usize> {
    nrow.checked_mul(ncol).ok_or_else(|| {
        FvError::shape("an addressable matrix size", format!("{nrow} x {ncol}"))
    })
}

impl CiphertextMatrix {
    pub fn new(elements: Vec<Ciphertext>, nrow: usize, ncol: usize) -> Result<Self> {
        let n = cell_count(nrow, ncol)?;
        if elements.len() != n {
            return Err(FvError::shape(
                format!("{n} elements for {nrow} x {ncol}"),
                elements.len(),
            ));
        }
        Ok(Self { elements, nrow, ncol })
    }

    pub fn nrow(&self) -> usize {
        self.nrow
    }

    pub fn ncol(&self) -> usize {
        self.ncol
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Ciphertext> {
        self.elements.iter()
    }

    /// Flattened column-major elements.
    pub fn to_vector(&self) -> CiphertextVector {
        CiphertextVector::from_vec(self.elements.clone())
    }

    /// Element at flat (column-major) index `i`.
    pub fn get(&self, i: usize) -> Result<&Ciphertext> {
        self.elements.get(i).ok_or(FvError::IndexOutOfRange {
            index: i,
            len: self.len(),
        })
    }

    pub fn get_at(&self, i: usize, j: usize) -> Result<&Ciphertext> {
        let index = self.flat_index(i, j)?;
        Ok(&self.elements[index])
    }

    pub fn set(&mut self, i: usize, j: usize, ct: Ciphertext) -> Result<()> {
        let index = self.flat_index(i, j)?;
        self.elements[index] = ct;
        Ok(())
    }

    fn flat_index(&self, i: usize, j: usize) -> Result<usize> {
        if i >= self.nrow {
            return Err(FvError::IndexOutOfRange { index: i, len: self.nrow });
        }
        if j >= self.ncol {
            return Err(FvError::IndexOutOfRange { index: j, len: self.ncol });
        }
        Ok(i + j * self.nrow)
    }

    /// Fill an `nrow x ncol` matrix by cycling through `source`.
    ///
    /// With `by_row` the k-th value goes to row k / ncol, column k % ncol;
    /// otherwise values are laid down column by column.
    pub fn reshape_from(source: &CiphertextVector, nrow: usize, ncol: usize, by_row: bool) -> Result<Self> {
        let n = cell_count(nrow, ncol)?;
        if source.is_empty() && n > 0 {
            return Err(FvError::shape(
                format!("a non-empty vector to fill {nrow} x {ncol}"),
                "0 elements",
            ));
        }
        let src = source.as_slice();
        let elements = (0..n)
            .map(|pos| {
                let k = if by_row {
                    let (i, j) = (pos % nrow, pos / nrow);
                    i * ncol + j
                } else {
                    pos
                };
                src[k % src.len()].clone()
            })
            .collect();
        Ok(Self { elements, nrow, ncol })
    }

    pub fn transpose(&self) -> Self {
        let elements = (0..self.len())
            .map(|pos| {
                // pos indexes the transposed (ncol x nrow) matrix
                let (j, i) = (pos % self.ncol, pos / self.ncol);
                self.elements[i + j * self.nrow].clone()
            })
            .collect();
        Self {
            elements,
            nrow: self.ncol,
            ncol: self.nrow,
        }
    }

    /// New `nrow x ncol` matrix from the flat indices, column-major.
    pub fn subset(&self, indices: &[usize], nrow: usize, ncol: usize) -> Result<Self> {
        Self::new(self.subset_vector(indices)?.into_inner(), nrow, ncol)
    }

    pub fn subset_vector(&self, indices: &[usize]) -> Result<CiphertextVector> {
        indices.iter().map(|&i| self.get(i).cloned()).collect()
    }

    pub fn add(&self, other: &Self) -> Result<Self> {
        self.elementwise(other, Ciphertext::add)
    }

    /// Elementwise (Hadamard) product.
    pub fn mul(&self, other: &Self) -> Result<Self> {
        self.elementwise(other, Ciphertext::mul)
    }

    pub fn add_ct(&self, ct: &Ciphertext) -> Result<Self> {
        self.broadcast(ct, Ciphertext::add)
    }

    pub fn mul_ct(&self, ct: &Ciphertext) -> Result<Self> {
        self.broadcast(ct, Ciphertext::mul)
    }

    fn elementwise(&self, other: &Self, op: BinaryOp) -> Result<Self> {
        if (self.nrow, self.ncol) != (other.nrow, other.ncol) {
            return Err(FvError::shape(
                format!("{} x {}", self.nrow, self.ncol),
                format!("{} x {}", other.nrow, other.ncol),
            ));
        }
        let elements = self
            .elements
            .iter()
            .zip(&other.elements)
            .map(|(a, b)| op(a, b))
            .collect::<Result<_>>()?;
        Ok(Self { elements, ..*self })
    }

    fn broadcast(&self, ct: &Ciphertext, op: BinaryOp) -> Result<Self> {
        let elements = self
            .elements
            .iter()
            .map(|x| op(x, ct))
            .collect::<Result<_>>()?;
        Ok(Self { elements, ..*self })
    }

    /// Matrix product, one cell at a time on the calling thread.
    #[instrument(skip_all, fields(lhs = %self.shape(), rhs = %y.shape()))]
    pub fn matmul_serial(&self, y: &Self) -> Result<Self> {
        let cells = self.check_matmul(y)?;
        let elements = (0..cells)
            .map(|idx| self.product_cell(y, idx))
            .collect::<Result<_>>()?;
        Ok(Self {
            elements,
            nrow: self.nrow,
            ncol: y.ncol,
        })
    }

    /// Matrix product on rayon's global pool.
    pub fn matmul_parallel(&self, y: &Self) -> Result<Self> {
        self.matmul_parallel_with(&WorkerPool::global(), y, &CancelToken::new())
    }

    /// Matrix product with output cells split into ranges across `pool`.
    ///
    /// Each cell uses the same left-to-right fold as [`Self::matmul_serial`],
    /// so both produce identical ciphertexts.
    #[instrument(skip_all, fields(lhs = %self.shape(), rhs = %y.shape(), threads = pool.threads()))]
    pub fn matmul_parallel_with(&self, pool: &WorkerPool, y: &Self, cancel: &CancelToken) -> Result<Self> {
        let cells = self.check_matmul(y)?;
        let chunk = pool.chunk_for(cells);
        debug!(cells, chunk, "parallel matmul");
        let ranges = pool.map_ranges(cells, chunk, cancel, |r| {
            r.map(|idx| self.product_cell(y, idx)).collect::<Result<Vec<_>>>()
        })?;
        Ok(Self {
            elements: ranges.into_iter().flatten().collect(),
            nrow: self.nrow,
            ncol: y.ncol,
        })
    }

    /// Validates the shapes and returns the number of output cells.
    fn check_matmul(&self, y: &Self) -> Result<usize> {
        if self.ncol != y.nrow {
            return Err(FvError::shape(
                format!("{} rows on the right-hand side", self.ncol),
                format!("{} x {}", y.nrow, y.ncol),
            ));
        }
        let cells = cell_count(self.nrow, y.ncol)?;
        if self.ncol == 0 && cells > 0 {
            return Err(FvError::shape("a non-empty inner dimension", "0"));
        }
        Ok(cells)
    }

    /// Output cell `idx` (column-major) of self · y.
    fn product_cell(&self, y: &Self, idx: usize) -> Result<Ciphertext> {
        let (i, j) = (idx % self.nrow, idx / self.nrow);
        let term = |k: usize| self.elements[i + k * self.nrow].mul(&y.elements[k + j * y.nrow]);
        (1..self.ncol).try_fold(term(0)?, |acc, k| acc.add(&term(k)?))
    }

    fn shape(&self) -> String {
        format!("{}x{}", self.nrow, self.ncol)
    }
}

impl fmt::Display for CiphertextMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Matrix of {} x {} Fan and Vercauteren cipher texts",
            self.nrow, self.ncol
        )
    }
}
