//! Adam optimizer over a flat list of parameter tensors.

use ndarray::{ArrayD, ArrayViewD, ArrayViewMutD, Zip};

pub const DEFAULT_BETA1: f64 = 0.9;
pub const DEFAULT_BETA2: f64 = 0.999;
pub const DEFAULT_EPSILON: f64 = 1e-7;

#[derive(Debug, Clone)]
pub struct Adam {
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    step: i32,
    first_moment: Vec<ArrayD<f64>>,
    second_moment: Vec<ArrayD<f64>>,
}

impl Adam {
    pub fn new(learning_rate: f64) -> Self {
        Self {
            learning_rate,
            beta1: DEFAULT_BETA1,
            beta2: DEFAULT_BETA2,
            epsilon: DEFAULT_EPSILON,
            step: 0,
            first_moment: Vec::new(),
            second_moment: Vec::new(),
        }
    }

    /// Number of updates applied so far.
    pub fn steps(&self) -> i32 {
        self.step
    }

    /// Apply one update. `params` and `grads` must list the same tensors in
    /// the same order on every call; moment buffers are allocated on the
    /// first call.
    pub fn update(&mut self, params: Vec<ArrayViewMutD<'_, f64>>, grads: Vec<ArrayViewD<'_, f64>>) {
        debug_assert_eq!(params.len(), grads.len());
        if self.first_moment.len() != params.len() {
            self.first_moment = params.iter().map(|p| ArrayD::zeros(p.raw_dim())).collect();
            self.second_moment = params.iter().map(|p| ArrayD::zeros(p.raw_dim())).collect();
        }

        self.step = self.step.saturating_add(1);
        let (beta1, beta2, epsilon) = (self.beta1, self.beta2, self.epsilon);
        let correction = (1.0 - beta2.powi(self.step)).sqrt() / (1.0 - beta1.powi(self.step));
        let step_size = self.learning_rate * correction;

        for (((param, grad), m), v) in params
            .into_iter()
            .zip(grads)
            .zip(self.first_moment.iter_mut())
            .zip(self.second_moment.iter_mut())
        {
            Zip::from(param)
                .and(&grad)
                .and(m)
                .and(v)
                .for_each(|p, &g, m, v| {
                    *m = beta1 * *m + (1.0 - beta1) * g;
                    *v = beta2 * *v + (1.0 - beta2) * g * g;
                    *p -= step_size * *m / (v.sqrt() + epsilon);
                });
        }
    }
}
