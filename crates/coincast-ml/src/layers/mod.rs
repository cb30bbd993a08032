//! Network building blocks. Every layer keeps its parameters as `ndarray`
//! matrices and exposes them to the optimizer as dynamic-dimension views in
//! a fixed order that its gradient struct mirrors.

mod dense;
mod dropout;
mod gru;
mod lstm;

pub use dense::{Dense, DenseGradients};
pub use dropout::Dropout;
pub use gru::{Gru, GruGradients, GruTrace};
pub use lstm::{Lstm, LstmGradients, LstmTrace};
