use num_bigint::BigInt;
use num_traits::{One, Signed};

/// `n * (n - step) * (n - 2 * step) * ...` over the positive terms; `1` when `n` is zero.
///
/// A step of 1 is the ordinary factorial, 2 the double and 3 the triple factorial.
pub fn multifactorial(n: &BigInt, step: usize) -> BigInt {
    let step = BigInt::from(step);
    let mut result = BigInt::one();
    let mut term = n.clone();
    while term.is_positive() {
        result *= &term;
        term -= &step;
    }
    result
}
