//! Modular and floating-point arithmetic primitives.
//!
//! Pure, swappable predicates used by the point search and the local point
//! counts: perfect-square tests (tolerance-based and exact), quadratic
//! residue tests (the naive O(p) scan and an O(log p) Euler-criterion
//! replacement), a prime sieve, and modular exponentiation.

use num_integer::Roots;

/// Generate all primes up to `bound` using the sieve of Eratosthenes.
pub fn sieve_primes(bound: u64) -> Vec<u64> {
    if bound < 2 {
        return Vec::new();
    }

    let bound = bound as usize;
    let mut is_prime = vec![true; bound + 1];
    is_prime[0] = false;
    is_prime[1] = false;

    let mut p = 2;
    while p * p <= bound {
        if is_prime[p] {
            let mut multiple = p * p;
            while multiple <= bound {
                is_prime[multiple] = false;
                multiple += p;
            }
        }
        p += 1;
    }

    is_prime
        .iter()
        .enumerate()
        .filter_map(|(i, &is_p)| if is_p { Some(i as u64) } else { None })
        .collect()
}

/// Modular exponentiation base^exp mod modulus.
pub fn mod_pow(base: u64, exp: u64, modulus: u64) -> u64 {
    if modulus == 1 {
        return 0;
    }
    let m = modulus as u128;
    let mut result = 1u128;
    let mut base = base as u128 % m;
    let mut exp = exp;
    while exp > 0 {
        if exp & 1 == 1 {
            result = result * base % m;
        }
        base = base * base % m;
        exp >>= 1;
    }
    result as u64
}

/// Reduce a signed coefficient into [0, p).
pub fn mod_reduce(n: i64, p: u64) -> u64 {
    n.rem_euclid(p as i64) as u64
}

/// Tolerance-based perfect-square test for a real value.
///
/// Negative inputs are never squares; otherwise true iff √n is within
/// `tolerance` of an integer.
pub fn is_near_square(n: f64, tolerance: f64) -> bool {
    if n < 0.0 {
        return false;
    }
    let root = n.sqrt();
    (root - root.round()).abs() < tolerance
}

/// Exact integer perfect-square test: ⌊√n⌋² == n, no tolerance.
pub fn is_perfect_square(n: i128) -> bool {
    if n < 0 {
        return false;
    }
    let root = n.sqrt();
    root * root == n
}

/// Quadratic residue test mod a prime p via the naive O(p) scan.
///
/// `n` is reduced into [0, p) first; zero counts as a residue. Otherwise
/// true iff some i ∈ [1, (p−1)/2] has i² ≡ n (mod p).
pub fn is_quadratic_residue(n: i64, p: u64) -> bool {
    let r = mod_reduce(n, p);
    if r == 0 {
        return true;
    }
    let half = (p - 1) / 2;
    for i in 1..=half {
        if (i as u128 * i as u128 % p as u128) as u64 == r {
            return true;
        }
    }
    false
}

/// Euler-criterion residue test: n^((p−1)/2) ≡ 1 (mod p).
///
/// O(log p) drop-in replacement for [`is_quadratic_residue`]; the two agree
/// on every odd prime. Zero counts as a residue, as in the naive scan.
pub fn is_quadratic_residue_euler(n: i64, p: u64) -> bool {
    let r = mod_reduce(n, p);
    if r == 0 {
        return true;
    }
    mod_pow(r, (p - 1) / 2, p) == 1
}
