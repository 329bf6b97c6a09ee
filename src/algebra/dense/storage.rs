//! Storage size primitives for dense matrices and vectors held in a
//! byte arena.
//!
//! Every matrix or vector payload occupies a whole number of cache lines,
//! so that consecutive payloads placed from an aligned cursor stay aligned.

/// Cache line size in bytes, which is also the alignment of every
/// floating point payload in an arena.
pub const CACHE_LINE_SIZE: usize = 64;

/// Round `n` up to the next multiple of `align` (a power of two).
#[inline]
pub const fn align_up(n: usize, align: usize) -> usize {
    (n + align - 1) & !(align - 1)
}

/// Bytes required to store an `m x n` column major matrix of `T`.
pub fn matrix_memsize<T>(m: usize, n: usize) -> usize {
    align_up(m * n * std::mem::size_of::<T>(), CACHE_LINE_SIZE)
}

/// Bytes required to store a vector of `n` elements of `T`.
pub fn vector_memsize<T>(n: usize) -> usize {
    align_up(n * std::mem::size_of::<T>(), CACHE_LINE_SIZE)
}

#[test]
fn test_memsize() {
    assert_eq!(align_up(0, 64), 0);
    assert_eq!(align_up(1, 64), 64);
    assert_eq!(align_up(64, 64), 64);
    assert_eq!(align_up(65, 64), 128);

    assert_eq!(matrix_memsize::<f64>(0, 5), 0);
    assert_eq!(matrix_memsize::<f64>(3, 3), 128);
    assert_eq!(matrix_memsize::<f32>(4, 4), 64);
    assert_eq!(vector_memsize::<f64>(8), 64);
    assert_eq!(vector_memsize::<f64>(9), 128);
}
