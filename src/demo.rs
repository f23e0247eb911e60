//! Functions for trying out `call`.
//!
//! They use the C calling convention and unmangled names, so they resolve by the names listed in
//! [`FUNCTIONS`].

use std::ffi::{CStr, c_char};

/// Adds two integers.
#[unsafe(no_mangle)]
pub extern "C" fn kdb_add(a: i64, b: i64) -> i64 {
    a.wrapping_add(b)
}

/// Greets `name` on standard output. Returns the number of bytes in the name.
///
/// # Safety
/// `name` must point to a NUL terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kdb_hello(name: *const c_char) -> usize {
    if name.is_null() {
        return 0;
    }
    // SAFETY: Non-null and NUL terminated per the contract.
    let name = unsafe { CStr::from_ptr(name) };
    println!("Hello, {}!", name.to_string_lossy());
    name.to_bytes().len()
}

/// Returns `1*a + 2*b + ... + 10*j`, so misplaced arguments show up in the result.
#[unsafe(no_mangle)]
#[allow(clippy::too_many_arguments)]
pub extern "C" fn kdb_weighted10(
    a: i64,
    b: i64,
    c: i64,
    d: i64,
    e: i64,
    f: i64,
    g: i64,
    h: i64,
    i: i64,
    j: i64,
) -> i64 {
    [a, b, c, d, e, f, g, h, i, j]
        .iter()
        .zip(1..)
        .map(|(v, w)| v.wrapping_mul(w))
        .fold(0, i64::wrapping_add)
}

/// Returns `x * factor`, truncated.
#[unsafe(no_mangle)]
pub extern "C" fn kdb_scale(x: f64, factor: i32) -> i64 {
    (x * f64::from(factor)) as i64
}

/// Returns the average of two doubles. The result is in the floating-point return register.
#[unsafe(no_mangle)]
pub extern "C" fn kdb_average(a: f64, b: f64) -> f64 {
    (a + b) / 2.0
}

/// Every demo function with a hint at its arguments.
pub const FUNCTIONS: &[(&str, &str)] = &[
    ("kdb_add", "%ld a, %ld b"),
    ("kdb_hello", "%s name"),
    ("kdb_weighted10", "%ld a .. %ld j"),
    ("kdb_scale", "%lf x, %d factor"),
    ("kdb_average", "%lf a, %lf b"),
];

/// The addresses of the demo functions, in [`FUNCTIONS`] order.
pub fn addresses() -> [usize; 5] {
    [
        kdb_add as usize,
        kdb_hello as usize,
        kdb_weighted10 as usize,
        kdb_scale as usize,
        kdb_average as usize,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_follow_position() {
        assert_eq!(kdb_weighted10(1, 1, 1, 1, 1, 1, 1, 1, 1, 1), 55);
        assert_eq!(kdb_weighted10(0, 0, 0, 0, 0, 0, 0, 0, 0, 1), 10);
    }

    #[test]
    fn hello_counts_bytes() {
        // SAFETY: Literal C strings are NUL terminated.
        assert_eq!(unsafe { kdb_hello(c"kernel".as_ptr()) }, 6);
        // SAFETY: Null is handled.
        assert_eq!(unsafe { kdb_hello(std::ptr::null()) }, 0);
    }
}
