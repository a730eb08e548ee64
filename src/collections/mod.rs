//! Vectors and matrices of ciphertexts with elementwise and reduction algebra.

pub mod matrix;
pub mod vector;

pub use matrix::CiphertextMatrix;
pub use vector::CiphertextVector;
