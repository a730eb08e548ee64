pub mod modular;
pub mod poly;

pub use modular::{center, pow2, rescale_round, split_digit};
pub use poly::Poly;
