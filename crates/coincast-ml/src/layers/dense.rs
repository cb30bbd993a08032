use ndarray::{Array1, Array2, ArrayViewD, ArrayViewMutD};
use rand::Rng;

use crate::init::{add_outer, glorot_uniform};

/// Fully connected linear layer, no activation.
#[derive(Debug, Clone)]
pub struct Dense {
    weights: Array2<f64>,
    bias: Array1<f64>,
}

#[derive(Debug, Clone)]
pub struct DenseGradients {
    weights: Array2<f64>,
    bias: Array1<f64>,
}

impl Dense {
    pub fn new<R: Rng>(input_dim: usize, output_dim: usize, rng: &mut R) -> Self {
        Self {
            weights: glorot_uniform(output_dim, input_dim, rng),
            bias: Array1::zeros(output_dim),
        }
    }

    pub fn forward(&self, input: &Array1<f64>) -> Array1<f64> {
        self.weights.dot(input) + &self.bias
    }

    /// Accumulate gradients and return the gradient with respect to `input`.
    pub fn backward(
        &self,
        input: &Array1<f64>,
        d_output: &Array1<f64>,
        grads: &mut DenseGradients,
    ) -> Array1<f64> {
        add_outer(grads.weights.view_mut(), d_output, input);
        grads.bias += d_output;
        self.weights.t().dot(d_output)
    }

    pub(crate) fn parameters_mut(&mut self) -> Vec<ArrayViewMutD<'_, f64>> {
        vec![
            self.weights.view_mut().into_dyn(),
            self.bias.view_mut().into_dyn(),
        ]
    }
}

impl DenseGradients {
    pub fn zeros_like(layer: &Dense) -> Self {
        Self {
            weights: Array2::zeros(layer.weights.raw_dim()),
            bias: Array1::zeros(layer.bias.raw_dim()),
        }
    }

    pub(crate) fn views(&self) -> Vec<ArrayViewD<'_, f64>> {
        vec![self.weights.view().into_dyn(), self.bias.view().into_dyn()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn backward_returns_weight_projection() {
        let mut rng = StdRng::seed_from_u64(2);
        let layer = Dense::new(3, 1, &mut rng);
        let input = array![1.0, -2.0, 0.5];
        let mut grads = DenseGradients::zeros_like(&layer);

        let d_input = layer.backward(&input, &array![2.0], &mut grads);

        assert_eq!(d_input, &layer.weights.row(0) * 2.0);
        assert_eq!(grads.weights.row(0).to_vec(), vec![2.0, -4.0, 1.0]);
        assert_eq!(grads.bias, array![2.0]);
    }
}
