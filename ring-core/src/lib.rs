//! RNS polynomial-arithmetic engine for `Z_Q[X]/(X^N+1)`: modular
//! reduction, the number-theoretic transform, RNS rescaling, samplers, and
//! the keyed PRNG that feeds them.

pub mod error;
pub mod modular;
pub mod ntt;
pub mod params;
pub mod poly;
pub mod prng;
pub mod rescale;
pub mod ring;
pub mod sampling;
pub mod scalar;
pub mod vector_ops;

pub use error::{Result, RingError};
pub use poly::Poly;
pub use ring::{RingKind, RnsRing};
pub use scalar::RnsScalar;
