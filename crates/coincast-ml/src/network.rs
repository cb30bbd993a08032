//! LSTM → dropout → GRU → linear head, over univariate windows.

use ndarray::{Array1, ArrayViewD, ArrayViewMutD};
use rand::Rng;

use crate::layers::{Dense, DenseGradients, Dropout, Gru, GruGradients, Lstm, LstmGradients};
use crate::optimizer::Adam;
use crate::ModelConfig;

#[derive(Debug, Clone)]
pub struct StackedNetwork {
    lstm: Lstm,
    dropout: Dropout,
    gru: Gru,
    head: Dense,
}

#[derive(Debug, Clone)]
pub struct NetworkGradients {
    lstm: LstmGradients,
    gru: GruGradients,
    head: DenseGradients,
}

impl NetworkGradients {
    fn zeros_like(network: &StackedNetwork) -> Self {
        Self {
            lstm: LstmGradients::zeros_like(&network.lstm),
            gru: GruGradients::zeros_like(&network.gru),
            head: DenseGradients::zeros_like(&network.head),
        }
    }

    fn views(&self) -> Vec<ArrayViewD<'_, f64>> {
        let mut views = self.lstm.views();
        views.extend(self.gru.views());
        views.extend(self.head.views());
        views
    }
}

fn as_sequence(window: &[f64]) -> Vec<Array1<f64>> {
    window.iter().map(|&v| Array1::from_elem(1, v)).collect()
}

impl StackedNetwork {
    pub fn new<R: Rng>(config: &ModelConfig, rng: &mut R) -> Self {
        Self {
            lstm: Lstm::new(1, config.lstm_units, rng),
            dropout: Dropout::new(config.dropout),
            gru: Gru::new(config.lstm_units, config.gru_units, rng),
            head: Dense::new(config.gru_units, 1, rng),
        }
    }

    /// Inference pass; dropout is inactive.
    pub fn predict(&self, window: &[f64]) -> f64 {
        let sequence = self.lstm.forward(&as_sequence(window)).outputs();
        let trace = self.gru.forward(&sequence);
        // Single output unit.
        self.head.forward(trace.last_hidden()).sum()
    }

    /// Mean squared error over the batch and its gradient with respect to
    /// every parameter. Draws fresh dropout masks from `rng`.
    pub fn loss_and_gradients<R: Rng>(
        &self,
        windows: &[&[f64]],
        targets: &[f64],
        rng: &mut R,
    ) -> (f64, NetworkGradients) {
        let mut grads = NetworkGradients::zeros_like(self);
        let n = windows.len().max(1) as f64;
        let mut loss = 0.0;

        for (window, &target) in windows.iter().zip(targets) {
            let lstm_trace = self.lstm.forward(&as_sequence(window));
            let lstm_outputs = lstm_trace.outputs();
            let masks: Vec<Array1<f64>> = lstm_outputs
                .iter()
                .map(|_| self.dropout.mask(self.lstm.units(), rng))
                .collect();
            let dropped: Vec<Array1<f64>> = lstm_outputs
                .iter()
                .zip(&masks)
                .map(|(output, mask)| output * mask)
                .collect();

            let gru_trace = self.gru.forward(&dropped);
            let last = gru_trace.last_hidden();
            let prediction = self.head.forward(last).sum();

            let error = prediction - target;
            loss += error * error / n;

            let d_prediction = Array1::from_elem(1, 2.0 * error / n);
            let d_last = self.head.backward(last, &d_prediction, &mut grads.head);
            let d_dropped = self.gru.backward(&gru_trace, &d_last, &mut grads.gru);
            let d_lstm: Vec<Array1<f64>> = d_dropped
                .into_iter()
                .zip(&masks)
                .map(|(d, mask)| d * mask)
                .collect();
            self.lstm.backward(&lstm_trace, &d_lstm, &mut grads.lstm);
        }

        (loss, grads)
    }

    pub fn apply(&mut self, optimizer: &mut Adam, grads: &NetworkGradients) {
        optimizer.update(self.parameters_mut(), grads.views());
    }

    pub fn is_finite(&mut self) -> bool {
        self.parameters_mut()
            .iter()
            .all(|tensor| tensor.iter().all(|v| v.is_finite()))
    }

    fn parameters_mut(&mut self) -> Vec<ArrayViewMutD<'_, f64>> {
        let mut params = self.lstm.parameters_mut();
        params.extend(self.gru.parameters_mut());
        params.extend(self.head.parameters_mut());
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn small_config(dropout: f64) -> ModelConfig {
        ModelConfig {
            window_len: 4,
            lstm_units: 3,
            dropout,
            gru_units: 2,
            learning_rate: 0.01,
            seed: Some(1),
        }
    }

    fn mse(network: &StackedNetwork, windows: &[&[f64]], targets: &[f64]) -> f64 {
        let n = windows.len() as f64;
        windows
            .iter()
            .zip(targets)
            .map(|(w, t)| (network.predict(w) - t).powi(2) / n)
            .sum()
    }

    #[test]
    fn loss_matches_inference_without_dropout() {
        let mut rng = StdRng::seed_from_u64(4);
        let network = StackedNetwork::new(&small_config(0.0), &mut rng);
        let windows: [&[f64]; 2] = [&[0.1, 0.2, 0.3, 0.4], &[0.4, 0.3, 0.2, 0.1]];
        let targets = [0.5, 0.0];

        let (loss, _) = network.loss_and_gradients(&windows, &targets, &mut rng);
        assert!((loss - mse(&network, &windows, &targets)).abs() < 1e-12);
    }

    #[test]
    fn gradients_match_finite_difference() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut network = StackedNetwork::new(&small_config(0.0), &mut rng);
        let windows: [&[f64]; 2] = [&[0.1, 0.5, 0.2, 0.9], &[0.7, 0.6, 0.4, 0.3]];
        let targets = [1.0, 0.2];

        let (_, grads) = network.loss_and_gradients(&windows, &targets, &mut rng);
        let analytic: Vec<f64> = grads
            .views()
            .iter()
            .map(|g| g.iter().next().copied().unwrap_or(0.0))
            .collect();

        let eps = 1e-6;
        for (index, expected) in analytic.iter().enumerate() {
            let original = network.parameters_mut()[index].iter().next().copied().unwrap_or(0.0);
            set_first(&mut network, index, original + eps);
            let plus = mse(&network, &windows, &targets);
            set_first(&mut network, index, original - eps);
            let minus = mse(&network, &windows, &targets);
            set_first(&mut network, index, original);

            let numeric = (plus - minus) / (2.0 * eps);
            assert!(
                (numeric - expected).abs() < 1e-6,
                "tensor {index}: numeric={numeric} analytic={expected}"
            );
        }
    }

    fn set_first(network: &mut StackedNetwork, index: usize, value: f64) {
        if let Some(first) = network.parameters_mut()[index].iter_mut().next() {
            *first = value;
        }
    }

    #[test]
    fn training_steps_reduce_loss() {
        let mut rng = StdRng::seed_from_u64(21);
        let config = small_config(0.0);
        let mut network = StackedNetwork::new(&config, &mut rng);
        let mut adam = Adam::new(0.05);
        let windows: [&[f64]; 3] = [
            &[0.0, 0.1, 0.2, 0.3],
            &[0.3, 0.4, 0.5, 0.6],
            &[0.6, 0.7, 0.8, 0.9],
        ];
        let targets = [0.4, 0.7, 1.0];

        let before = mse(&network, &windows, &targets);
        for _ in 0..200 {
            let (_, grads) = network.loss_and_gradients(&windows, &targets, &mut rng);
            network.apply(&mut adam, &grads);
        }
        let after = mse(&network, &windows, &targets);

        assert!(after < before * 0.5, "before={before} after={after}");
        assert!(network.is_finite());
    }
}
