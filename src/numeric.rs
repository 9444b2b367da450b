// Small helpers over integer collections used by the field parser.

/// Returns the smallest value of `values`, or `None` when it is empty.
pub fn find_min<T: Ord + Copy>(values: &[T]) -> Option<T> {
    values.iter().copied().min()
}

/// Returns the largest value of `values`, or `None` when it is empty.
pub fn find_max<T: Ord + Copy>(values: &[T]) -> Option<T> {
    values.iter().copied().max()
}

/// Sorts `values` ascending and drops duplicates.
pub fn find_unique<T: Ord>(mut values: Vec<T>) -> Vec<T> {
    values.sort_unstable();
    values.dedup();
    values
}

/// Expands two bounds into the inclusive sequence between them.
///
/// The bounds may be given in either order, `make_range(5, 2)` yields `[2, 3, 4, 5]`.
pub fn make_range(a: u32, b: u32) -> Vec<u32> {
    let (low, high) = if a <= b { (a, b) } else { (b, a) };
    (low..=high).collect()
}
