//! Long short-term memory layer returning its full output sequence.

use ndarray::{s, Array1, Array2, ArrayViewD, ArrayViewMutD};
use rand::Rng;

use crate::init::{add_outer, glorot_uniform, recurrent_uniform, sigmoid, sigmoid_grad, tanh_grad};

/// LSTM layer. Gate blocks are stacked in the order input, forget,
/// candidate, output along the first axis of every parameter.
#[derive(Debug, Clone)]
pub struct Lstm {
    units: usize,
    kernel: Array2<f64>,
    recurrent: Array2<f64>,
    bias: Array1<f64>,
}

#[derive(Debug, Clone)]
pub struct LstmGradients {
    kernel: Array2<f64>,
    recurrent: Array2<f64>,
    bias: Array1<f64>,
}

#[derive(Debug, Clone)]
struct LstmStep {
    input: Array1<f64>,
    hidden_prev: Array1<f64>,
    cell_prev: Array1<f64>,
    /// Activated gates `[i, f, g, o]`.
    gates: Array1<f64>,
    cell_tanh: Array1<f64>,
    hidden: Array1<f64>,
}

/// Forward activations kept for backpropagation through time.
#[derive(Debug, Clone)]
pub struct LstmTrace {
    steps: Vec<LstmStep>,
}

impl LstmTrace {
    pub fn outputs(&self) -> Vec<Array1<f64>> {
        self.steps.iter().map(|step| step.hidden.clone()).collect()
    }
}

impl Lstm {
    pub fn new<R: Rng>(input_dim: usize, units: usize, rng: &mut R) -> Self {
        let mut bias = Array1::<f64>::zeros(4 * units);
        // Unit forget bias.
        bias.slice_mut(s![units..2 * units]).fill(1.0);

        Self {
            units,
            kernel: glorot_uniform(4 * units, input_dim, rng),
            recurrent: recurrent_uniform(4 * units, units, rng),
            bias,
        }
    }

    pub fn units(&self) -> usize {
        self.units
    }

    pub fn forward(&self, inputs: &[Array1<f64>]) -> LstmTrace {
        let h = self.units;
        let mut hidden = Array1::<f64>::zeros(h);
        let mut cell = Array1::<f64>::zeros(h);
        let mut steps = Vec::with_capacity(inputs.len());

        for input in inputs {
            let mut gates = self.kernel.dot(input) + self.recurrent.dot(&hidden) + &self.bias;
            gates.slice_mut(s![..2 * h]).mapv_inplace(sigmoid);
            gates.slice_mut(s![2 * h..3 * h]).mapv_inplace(f64::tanh);
            gates.slice_mut(s![3 * h..]).mapv_inplace(sigmoid);

            let input_gate = gates.slice(s![..h]);
            let forget_gate = gates.slice(s![h..2 * h]);
            let candidate = gates.slice(s![2 * h..3 * h]);
            let output_gate = gates.slice(s![3 * h..]);

            let next_cell = &forget_gate * &cell + &input_gate * &candidate;
            let cell_tanh = next_cell.mapv(f64::tanh);
            let next_hidden = &output_gate * &cell_tanh;

            steps.push(LstmStep {
                input: input.clone(),
                hidden_prev: hidden,
                cell_prev: cell,
                gates,
                cell_tanh,
                hidden: next_hidden.clone(),
            });
            hidden = next_hidden;
            cell = next_cell;
        }

        LstmTrace { steps }
    }

    /// Accumulate parameter gradients given the loss gradient with respect
    /// to every output step.
    pub fn backward(
        &self,
        trace: &LstmTrace,
        d_outputs: &[Array1<f64>],
        grads: &mut LstmGradients,
    ) {
        let h = self.units;
        let mut d_hidden_next = Array1::<f64>::zeros(h);
        let mut d_cell_next = Array1::<f64>::zeros(h);

        for (step, upstream) in trace.steps.iter().zip(d_outputs).rev() {
            let d_hidden = upstream + &d_hidden_next;

            let input_gate = step.gates.slice(s![..h]);
            let forget_gate = step.gates.slice(s![h..2 * h]);
            let candidate = step.gates.slice(s![2 * h..3 * h]);
            let output_gate = step.gates.slice(s![3 * h..]);

            let d_output_gate = &d_hidden * &step.cell_tanh;
            let d_cell = &d_hidden * &output_gate * &step.cell_tanh.mapv(tanh_grad) + &d_cell_next;

            let mut d_pre = Array1::<f64>::zeros(4 * h);
            d_pre
                .slice_mut(s![..h])
                .assign(&(&d_cell * &candidate * &input_gate.mapv(sigmoid_grad)));
            d_pre
                .slice_mut(s![h..2 * h])
                .assign(&(&d_cell * &step.cell_prev * &forget_gate.mapv(sigmoid_grad)));
            d_pre
                .slice_mut(s![2 * h..3 * h])
                .assign(&(&d_cell * &input_gate * &candidate.mapv(tanh_grad)));
            d_pre
                .slice_mut(s![3 * h..])
                .assign(&(d_output_gate * &output_gate.mapv(sigmoid_grad)));

            add_outer(grads.kernel.view_mut(), &d_pre, &step.input);
            add_outer(grads.recurrent.view_mut(), &d_pre, &step.hidden_prev);
            grads.bias += &d_pre;

            d_hidden_next = self.recurrent.t().dot(&d_pre);
            d_cell_next = &d_cell * &forget_gate;
        }
    }

    pub(crate) fn parameters_mut(&mut self) -> Vec<ArrayViewMutD<'_, f64>> {
        vec![
            self.kernel.view_mut().into_dyn(),
            self.recurrent.view_mut().into_dyn(),
            self.bias.view_mut().into_dyn(),
        ]
    }
}

impl LstmGradients {
    pub fn zeros_like(layer: &Lstm) -> Self {
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
