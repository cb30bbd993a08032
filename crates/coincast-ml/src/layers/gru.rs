//! Gated recurrent unit returning only its final hidden state.

use ndarray::{s, Array1, Array2, ArrayViewD, ArrayViewMutD};
use rand::Rng;

use crate::init::{add_outer, glorot_uniform, recurrent_uniform, sigmoid, sigmoid_grad, tanh_grad};

/// GRU layer with gate blocks ordered update, reset, candidate. The reset
/// gate is applied to the previous state before the recurrent product.
#[derive(Debug, Clone)]
pub struct Gru {
    units: usize,
    kernel: Array2<f64>,
    recurrent: Array2<f64>,
    bias: Array1<f64>,
}

#[derive(Debug, Clone)]
pub struct GruGradients {
    kernel: Array2<f64>,
    recurrent: Array2<f64>,
    bias: Array1<f64>,
}

#[derive(Debug, Clone)]
struct GruStep {
    input: Array1<f64>,
    hidden_prev: Array1<f64>,
    update: Array1<f64>,
    reset: Array1<f64>,
    candidate: Array1<f64>,
    reset_hidden: Array1<f64>,
}

#[derive(Debug, Clone)]
pub struct GruTrace {
    steps: Vec<GruStep>,
    last: Array1<f64>,
}

impl GruTrace {
    pub fn last_hidden(&self) -> &Array1<f64> {
        &self.last
    }
}

impl Gru {
    pub fn new<R: Rng>(input_dim: usize, units: usize, rng: &mut R) -> Self {
        Self {
            units,
            kernel: glorot_uniform(3 * units, input_dim, rng),
            recurrent: recurrent_uniform(3 * units, units, rng),
            bias: Array1::zeros(3 * units),
        }
    }

    pub fn units(&self) -> usize {
        self.units
    }

    pub fn forward(&self, inputs: &[Array1<f64>]) -> GruTrace {
        let h = self.units;
        let mut hidden = Array1::<f64>::zeros(h);
        let mut steps = Vec::with_capacity(inputs.len());

        for input in inputs {
            let projected = self.kernel.dot(input) + &self.bias;

            let gates = &projected.slice(s![..2 * h])
                + &self.recurrent.slice(s![..2 * h, ..]).dot(&hidden);
            let update = gates.slice(s![..h]).mapv(sigmoid);
            let reset = gates.slice(s![h..]).mapv(sigmoid);

            let reset_hidden = &reset * &hidden;
            let candidate = (&projected.slice(s![2 * h..])
                + &self.recurrent.slice(s![2 * h.., ..]).dot(&reset_hidden))
                .mapv(f64::tanh);

            let next = &update * &hidden + &(1.0 - &update) * &candidate;

            steps.push(GruStep {
                input: input.clone(),
                hidden_prev: hidden,
                update,
                reset,
                candidate,
                reset_hidden,
            });
            hidden = next;
        }

        GruTrace {
            steps,
            last: hidden,
        }
    }

    /// Backpropagate the gradient of the final hidden state. Returns the
    /// gradient with respect to every input step, in forward order.
    pub fn backward(
        &self,
        trace: &GruTrace,
        d_last: &Array1<f64>,
        grads: &mut GruGradients,
    ) -> Vec<Array1<f64>> {
        let h = self.units;
        let mut d_hidden = d_last.clone();
        let mut d_inputs = Vec::with_capacity(trace.steps.len());

        for step in trace.steps.iter().rev() {
            let d_update = &d_hidden * &(&step.hidden_prev - &step.candidate);
            let d_candidate = &d_hidden * &(1.0 - &step.update);
            let d_candidate_pre = d_candidate * &step.candidate.mapv(tanh_grad);

            let d_reset_hidden = self
                .recurrent
                .slice(s![2 * h.., ..])
                .t()
                .dot(&d_candidate_pre);
            let d_reset = &d_reset_hidden * &step.hidden_prev;

            let mut d_pre = Array1::<f64>::zeros(3 * h);
            d_pre
                .slice_mut(s![..h])
                .assign(&(d_update * &step.update.mapv(sigmoid_grad)));
            d_pre
                .slice_mut(s![h..2 * h])
                .assign(&(d_reset * &step.reset.mapv(sigmoid_grad)));
            d_pre.slice_mut(s![2 * h..]).assign(&d_candidate_pre);

            let d_gates = d_pre.slice(s![..2 * h]).to_owned();

            add_outer(grads.kernel.view_mut(), &d_pre, &step.input);
            add_outer(
                grads.recurrent.slice_mut(s![..2 * h, ..]),
                &d_gates,
                &step.hidden_prev,
            );
            add_outer(
                grads.recurrent.slice_mut(s![2 * h.., ..]),
                &d_candidate_pre,
                &step.reset_hidden,
            );
            grads.bias += &d_pre;

            d_inputs.push(self.kernel.t().dot(&d_pre));
            d_hidden = &d_hidden * &step.update
                + &d_reset_hidden * &step.reset
                + self.recurrent.slice(s![..2 * h, ..]).t().dot(&d_gates);
        }

        d_inputs.reverse();
        d_inputs
    }

    pub(crate) fn parameters_mut(&mut self) -> Vec<ArrayViewMutD<'_, f64>> {
        vec![
            self.kernel.view_mut().into_dyn(),
            self.recurrent.view_mut().into_dyn(),
            self.bias.view_mut().into_dyn(),
        ]
    }
}

impl GruGradients {
    pub fn zeros_like(layer: &Gru) -> Self {
        Self {
            kernel: Array2::zeros(layer.kernel.raw_dim()),
            recurrent: Array2::zeros(layer.recurrent.raw_dim()),
            bias: Array1::zeros(layer.bias.raw_dim()),
        }
    }

    pub(crate) fn views(&self) -> Vec<ArrayViewD<'_, f64>> {
        vec![
            self.kernel.view().into_dyn(),
            self.recurrent.view().into_dyn(),
            self.bias.view().into_dyn(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sequence(rows: &[[f64; 2]]) -> Vec<Array1<f64>> {
        rows.iter().map(|row| Array1::from(row.to_vec())).collect()
    }

    fn loss(layer: &Gru, inputs: &[Array1<f64>]) -> f64 {
        layer.forward(inputs).last_hidden().sum()
    }

    #[test]
    fn final_state_has_unit_width() {
        let mut rng = StdRng::seed_from_u64(5);
        let layer = Gru::new(2, 3, &mut rng);
        let trace = layer.forward(&sequence(&[[0.1, 0.2], [0.3, 0.4]]));
        assert_eq!(trace.last_hidden().len(), 3);
        assert!(trace.last_hidden().iter().all(|v| v.abs() < 1.0));
    }

    #[test]
    fn analytic_gradient_matches_finite_difference() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut layer = Gru::new(2, 3, &mut rng);
        let mut inputs = sequence(&[[0.5, -0.1], [0.2, 0.7], [-0.4, 0.3]]);

        let trace = layer.forward(&inputs);
        let mut grads = GruGradients::zeros_like(&layer);
        let d_inputs = layer.backward(&trace, &Array1::ones(3), &mut grads);
        assert_eq!(d_inputs.len(), inputs.len());

        let eps = 1e-6;
        for (row, col) in [(0, 1), (4, 0), (7, 1)] {
            let original = layer.kernel[[row, col]];
            layer.kernel[[row, col]] = original + eps;
            let plus = loss(&layer, &inputs);
            layer.kernel[[row, col]] = original - eps;
            let minus = loss(&layer, &inputs);
            layer.kernel[[row, col]] = original;

            let numeric = (plus - minus) / (2.0 * eps);
            let analytic = grads.kernel[[row, col]];
            assert!((numeric - analytic).abs() < 1e-6, "kernel[{row},{col}]");
        }

        for (row, col) in [(1, 0), (3, 2), (8, 1)] {
            let original = layer.recurrent[[row, col]];
            layer.recurrent[[row, col]] = original + eps;
            let plus = loss(&layer, &inputs);
            layer.recurrent[[row, col]] = original - eps;
            let minus = loss(&layer, &inputs);
            layer.recurrent[[row, col]] = original;

            let numeric = (plus - minus) / (2.0 * eps);
            let analytic = grads.recurrent[[row, col]];
            assert!((numeric - analytic).abs() < 1e-6, "recurrent[{row},{col}]");
        }

        for (step, feature) in [(0, 0), (1, 1), (2, 0)] {
            let original = inputs[step][feature];
            inputs[step][feature] = original + eps;
            let plus = loss(&layer, &inputs);
            inputs[step][feature] = original - eps;
            let minus = loss(&layer, &inputs);
            inputs[step][feature] = original;

            let numeric = (plus - minus) / (2.0 * eps);
            let analytic = d_inputs[step][feature];
            assert!((numeric - analytic).abs() < 1e-6, "input[{step}][{feature}]");
        }
    }
}
