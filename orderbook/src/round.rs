/// Decimal places for rounding a derived value: the larger of the two source
/// precisions, floored by a magnitude-dependent minimum (smaller values need
/// more digits to stay distinguishable).
pub fn round_digits(a: u32, b: u32, value: f64) -> u32 {
    let v = value.abs();
    let magnitude_min = if v <= 1e-2 {
        8
    } else if v < 1.0 {
        5
    } else {
        2
    };
    a.max(b).max(magnitude_min)
}

/// Round to `digits` decimal places.
pub fn round_to(value: f64, digits: u32) -> f64 {
    let factor = 10f64.powi(digits as i32);
    (value * factor).round() / factor
}

/// Number of decimal places in the shortest representation of `value`.
/// Integral values count as one, matching the book's minimum precision.
pub fn count_decimals(value: f64) -> u32 {
    let repr = format!("{value}");
    match repr.split_once('.') {
        Some((_, frac)) => (frac.len() as u32).max(1),
        None => 1,
    }
}
