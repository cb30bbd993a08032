//! Weight initialization and small numeric helpers shared by the layers.

use ndarray::linalg::general_mat_mul;
use ndarray::{Array1, Array2, ArrayViewMut2, Axis};
use rand::distributions::Uniform;
use rand::Rng;

/// Glorot/Xavier uniform: `U(-sqrt(6 / (fan_in + fan_out)), +...)`.
pub(crate) fn glorot_uniform<R: Rng>(rows: usize, cols: usize, rng: &mut R) -> Array2<f64> {
    let limit = (6.0 / (rows + cols) as f64).sqrt();
    uniform(rows, cols, limit, rng)
}

/// `U(-sqrt(1 / units), +...)`, used for recurrent kernels.
pub(crate) fn recurrent_uniform<R: Rng>(
    rows: usize,
    units: usize,
    rng: &mut R,
) -> Array2<f64> {
    let limit = (1.0 / units as f64).sqrt();
    uniform(rows, units, limit, rng)
}

fn uniform<R: Rng>(rows: usize, cols: usize, limit: f64, rng: &mut R) -> Array2<f64> {
    let dist = Uniform::new_inclusive(-limit, limit);
    Array2::from_shape_fn((rows, cols), |_| rng.sample(&dist))
}

pub(crate) fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Derivative of the sigmoid expressed through its output.
pub(crate) fn sigmoid_grad(y: f64) -> f64 {
    y * (1.0 - y)
}

/// Derivative of tanh expressed through its output.
pub(crate) fn tanh_grad(y: f64) -> f64 {
    1.0 - y * y
}

/// `target += column ⊗ row`.
pub(crate) fn add_outer(mut target: ArrayViewMut2<'_, f64>, column: &Array1<f64>, row: &Array1<f64>) {
    let column = column.view().insert_axis(Axis(1));
    let row = row.view().insert_axis(Axis(0));
    general_mat_mul(1.0, &column, &row, 1.0, &mut target);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn glorot_respects_limit() {
        let mut rng = StdRng::seed_from_u64(7);
        let weights = glorot_uniform(16, 8, &mut rng);
        let limit = (6.0 / 24.0f64).sqrt();
        assert_eq!(weights.dim(), (16, 8));
        assert!(weights.iter().all(|w| w.abs() <= limit));
    }

    #[test]
    fn outer_product_accumulates() {
        let mut target = Array2::<f64>::ones((2, 3));
        add_outer(target.view_mut(), &array![1.0, 2.0], &array![1.0, 0.0, -1.0]);
        assert_eq!(target, array![[2.0, 1.0, 0.0], [3.0, 1.0, -1.0]]);
    }

    #[test]
    fn sigmoid_is_centered() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert_eq!(sigmoid_grad(0.5), 0.25);
        assert_eq!(tanh_grad(0.0), 1.0);
    }
}
