//! Time-domain statistics over a single channel.
//!
//! Values are accumulated in f64 and callers narrow to f32 at the feature
//! boundary. Degenerate inputs (empty series, zero variance) resolve to `0.0`
//! instead of NaN.

/// Arithmetic mean. Returns 0 for an empty series.
pub fn mean(values: &[f32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64
}

/// Population variance (divides by N). Returns 0 for an empty series.
pub fn population_variance(values: &[f32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values
        .iter()
        .map(|&v| {
            let d = v as f64 - m;
            d * d
        })
        .sum::<f64>()
        / values.len() as f64
}

/// Pearson correlation coefficient of two equally long series.
///
/// Returns 0 when either series has zero variance, when the lengths differ,
/// when fewer than two points are given, or when the result is not finite.
pub fn pearson(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.len() < 2 {
        return 0.0;
    }
    // The f64 mean of a constant series can be off by an ulp, which would
    // leave a tiny non-zero spread and a spurious ±1.
    if is_constant(a) || is_constant(b) {
        return 0.0;
    }

    let mean_a = mean(a);
    let mean_b = mean(b);

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (&x, &y) in a.iter().zip(b) {
        let dx = x as f64 - mean_a;
        let dy = y as f64 - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    let denom = (var_a * var_b).sqrt();
    if denom == 0.0 {
        return 0.0;
    }

    let r = cov / denom;
    if r.is_finite() {
        r.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

fn is_constant(values: &[f32]) -> bool {
    values.windows(2).all(|w| w[0] == w[1])
}
