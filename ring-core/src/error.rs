use thiserror::Error;

/// Errors surfaced by ring construction, validation, prime generation, and
/// PRNG seeking. Arithmetic kernels never fail at runtime: callers are
/// responsible for level and size preconditions, checked with
/// `debug_assert!` rather than a runtime fallback.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum RingError {
    /// `N` is not a power of two.
    #[error("degree {0} is not a power of two")]
    InvalidDegree(usize),

    /// At least one modulus is non-prime or not congruent to 1 modulo the
    /// required root order. The ring is still usable for non-NTT
    /// arithmetic; `forward`/`backward` on it are disabled.
    #[error("modulus {modulus} is not a valid {root_order}-th root NTT prime")]
    UnsupportedModulus { modulus: u64, root_order: u64 },

    /// `Ring::merge` was asked to combine two rings with incompatible N.
    #[error("cannot merge rings of degree {lhs} and {rhs}")]
    MergeMismatch { lhs: usize, rhs: usize },

    /// A rescale was asked to drop more levels than the polynomial has.
    #[error("cannot drop {requested} levels from a polynomial at level {level}")]
    LevelOverflow { level: usize, requested: usize },

    /// Prime generation exhausted its search space before finding enough
    /// primes of the requested size.
    #[error("exhausted search space generating NTT-friendly primes near 2^{log_q}")]
    NotEnoughPrimes { log_q: usize },

    /// `PreviousNTTPrime` stepped below the required root order.
    #[error("no NTT-friendly prime below {candidate} with root order {root_order}")]
    BelowRoot { candidate: u64, root_order: u64 },

    /// System entropy could not be read at PRNG construction.
    #[error("failed to read system entropy: {0}")]
    Prng(String),

    /// `set_clock` was called with a counter smaller than the current one.
    #[error("cannot rewind PRNG clock from {current} to {requested}")]
    PrngRewind { current: u64, requested: u64 },
}

pub type Result<T> = std::result::Result<T, RingError>;
