use std::fmt;

use tracing::instrument;

use crate::error::{FvError, Result};
use crate::fv::Ciphertext;
use crate::parallel::{CancelToken, WorkerPool};

pub(crate) type BinaryOp = fn(&Ciphertext, &Ciphertext) -> Result<Ciphertext>;

/// Ordered sequence of ciphertexts; position is identity.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CiphertextVector {
    elements: Vec<Ciphertext>,
}

impl CiphertextVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vec(elements: Vec<Ciphertext>) -> Self {
        Self { elements }
    }

    pub fn into_inner(self) -> Vec<Ciphertext> {
        self.elements
    }

    pub fn as_slice(&self) -> &[Ciphertext] {
        &self.elements
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

    pub fn push(&mut self, ct: Ciphertext) {
        self.elements.push(ct);
    }

    pub fn push_all(&mut self, other: &CiphertextVector) {
        self.elements.extend_from_slice(&other.elements);
    }

    pub fn get(&self, i: usize) -> Result<&Ciphertext> {
        self.elements.get(i).ok_or(FvError::IndexOutOfRange {
            index: i,
            len: self.len(),
        })
    }

    pub fn set(&mut self, i: usize, ct: Ciphertext) -> Result<()> {
        let len = self.len();
        let slot = self
            .elements
            .get_mut(i)
            .ok_or(FvError::IndexOutOfRange { index: i, len })?;
        *slot = ct;
        Ok(())
    }

    /// Elements at `indices`, in the given order; repeats allowed.
    pub fn subset(&self, indices: &[usize]) -> Result<Self> {
        indices
            .iter()
            .map(|&i| self.get(i).cloned())
            .collect()
    }

    /// Copy with the given positions removed. Order and duplicates in
    /// `indices` do not matter.
    pub fn without(&self, indices: &[usize]) -> Result<Self> {
        let mut drop = indices.to_vec();
        drop.sort_unstable();
        drop.dedup();
        if let Some(&last) = drop.last() {
            if last >= self.len() {
                return Err(FvError::IndexOutOfRange {
                    index: last,
                    len: self.len(),
                });
            }
        }
        let mut elements = self.elements.clone();
        for &i in drop.iter().rev() {
            elements.remove(i);
        }
        Ok(Self { elements })
    }

    /// Elementwise sum, recycling the shorter operand.
    pub fn add(&self, other: &Self) -> Result<Self> {
        self.recycle(other, Ciphertext::add)
    }

    /// Elementwise product, recycling the shorter operand.
    pub fn mul(&self, other: &Self) -> Result<Self> {
        self.recycle(other, Ciphertext::mul)
    }

    pub fn add_ct(&self, ct: &Ciphertext) -> Result<Self> {
        self.broadcast(ct, Ciphertext::add)
    }

    pub fn mul_ct(&self, ct: &Ciphertext) -> Result<Self> {
        self.broadcast(ct, Ciphertext::mul)
    }

    pub fn sum_serial(&self) -> Result<Ciphertext> {
        fold_left(&self.elements, Ciphertext::add)
    }

    pub fn prod_serial(&self) -> Result<Ciphertext> {
        fold_left(&self.elements, Ciphertext::mul)
    }

    pub fn sum_parallel(&self) -> Result<Ciphertext> {
        self.sum_parallel_with(&WorkerPool::global(), &CancelToken::new())
    }

    pub fn prod_parallel(&self) -> Result<Ciphertext> {
        self.prod_parallel_with(&WorkerPool::global(), &CancelToken::new())
    }

    pub fn sum_parallel_with(&self, pool: &WorkerPool, cancel: &CancelToken) -> Result<Ciphertext> {
        self.reduce_parallel(pool, cancel, Ciphertext::add)
    }

    pub fn prod_parallel_with(&self, pool: &WorkerPool, cancel: &CancelToken) -> Result<Ciphertext> {
        self.reduce_parallel(pool, cancel, Ciphertext::mul)
    }

    /// Σ self[i]·other[i] with recycling.
    pub fn inner_product(&self, other: &Self) -> Result<Ciphertext> {
        self.mul(other)?.sum_serial()
    }

    fn recycle(&self, other: &Self, op: BinaryOp) -> Result<Self> {
        if self.is_empty() || other.is_empty() {
            return Err(FvError::shape(
                "two non-empty vectors",
                format!("lengths {} and {}", self.len(), other.len()),
            ));
        }
        let (long, short) = if self.len() >= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        long.elements
            .iter()
            .enumerate()
            .map(|(i, ct)| op(ct, &short.elements[i % short.len()]))
            .collect()
    }

    fn broadcast(&self, ct: &Ciphertext, op: BinaryOp) -> Result<Self> {
        self.elements.iter().map(|x| op(x, ct)).collect()
    }

    /// Contiguous chunks are folded on the pool, then the partial results are
    /// folded in chunk order.
    #[instrument(skip_all, fields(n = self.len(), threads = pool.threads()))]
    fn reduce_parallel(&self, pool: &WorkerPool, cancel: &CancelToken, op: BinaryOp) -> Result<Ciphertext> {
        if self.is_empty() {
            return Err(empty_reduction());
        }
        let chunk = pool.chunk_for(self.len());
        let partials = pool.map_ranges(self.len(), chunk, cancel, |r| {
            fold_left(&self.elements[r], op)
        })?;
        fold_left(&partials, op)
    }
}

fn empty_reduction() -> FvError {
    FvError::shape("a non-empty collection", "0 elements")
}

/// ((x0 op x1) op x2) op ...
pub(crate) fn fold_left(items: &[Ciphertext], op: BinaryOp) -> Result<Ciphertext> {
    let (first, rest) = items.split_first().ok_or_else(empty_reduction)?;
    rest.iter().try_fold(first.clone(), |acc, x| op(&acc, x))
}

impl FromIterator<Ciphertext> for CiphertextVector {
    fn from_iter<I: IntoIterator<Item = Ciphertext>>(iter: I) -> Self {
        Self {
            elements: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for CiphertextVector {
    type Item = Ciphertext;
    type IntoIter = std::vec::IntoIter<Ciphertext>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.into_iter()
    }
}

impl<'a> IntoIterator for &'a CiphertextVector {
    type Item = &'a Ciphertext;
    type IntoIter = std::slice::Iter<'a, Ciphertext>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

impl fmt::Display for CiphertextVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Vector of {} Fan and Vercauteren cipher texts", self.len())
    }
}
