/// Polynomial with vector coefficients `c_0 + c_1 x + ... + c_d x^d`.
///
/// Coefficient `c_k` occupies `coefficients[k * dimension..(k + 1) * dimension]`.
pub struct Polynomial<'a> {
    coefficients: &'a [f64],
    dimension: usize,
    size: usize,
}

impl<'a> Polynomial<'a> {
    pub fn new(coefficients: &'a [f64], dimension: usize) -> Self {
        let size = coefficients.len() / dimension;
        Polynomial { coefficients, dimension, size }
    }

    /// Value and derivatives up to `order` at `x`, by Horner's rule on each
    /// derivative; `results` receives `order + 1` points.
    pub fn evaluate(&self, x: f64, order: usize, results: &mut [f64]) {
        let dimension = self.dimension;
        for k in 0..=order {
            let out = &mut results[k * dimension..(k + 1) * dimension];
            out.fill(0.0);
            if k >= self.size {
                continue;
            }
            for i in (k..self.size).rev() {
                let factor = falling_factorial(i, k);
                let coefficient = &self.coefficients[i * dimension..(i + 1) * dimension];
                for (value, c) in out.iter_mut().zip(coefficient) {
                    *value = *value * x + c * factor;
                }
            }
        }
    }
}

/// `i * (i - 1) * ... * (i - k + 1)`.
fn falling_factorial(i: usize, k: usize) -> f64 {
    (i + 1 - k..=i).fold(1.0, |acc, m| acc * m as f64)
}
