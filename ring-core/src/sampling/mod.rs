//! Samplers (C7): uniform, ternary, and discrete-Gaussian distributions
//! over `R_Q`, each producing a [`Poly`] at a chosen level. Grounded on the
//! corpus's `sampling.rs` (`Uniform` distribution, Fisher-Yates style
//! position selection), generalized from single-modulus `i32` coefficients
//! to RNS `u64` rows and from `rand::distributions::Uniform` rejection to
//! explicit bitmask rejection sampling (needed once `q` isn't a power of
//! two).

mod gaussian;
mod ternary;
mod uniform;

pub use gaussian::GaussianSampler;
pub use ternary::TernarySampler;
pub use uniform::UniformSampler;
