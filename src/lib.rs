//! Single hidden layer autoencoder with hand-written back-propagation.
//! Small. Few dependencies. CPU only.
//!
//! # Features
//!
//! - **Explicit gradients** — Forward intermediates are kept in a named
//! [ForwardPass] record and handed to the gradient engine, which derives
//! all four parameter gradients without any autograd machinery.
//!
//! - **Race-free parallel accumulation** — A batch's rows are split across
//! scoped worker threads. Each worker sums into private buffers that are
//! reduced in order once every worker has joined. Results don't depend on
//! the number of workers.
//!
//! - **Stable activations** — The logistic [sigmoid](ops::sigmoid) never
//! exponentiates large positive arguments.
//!
//! - **Bit-exact persistence** — Parameters round-trip through [postcard]
//! without loss, and shapes are validated before they replace a live model.
//!
//! # Examples
//!
//! Training on a single binary pattern:
//! ```
//! use microencoder::{ ops::*, Autoencoder, Tensor };
//!
//! let mut model = Autoencoder::<f64>::seeded(8, 3, 7);
//! let batch = Tensor::new(&[1, 8], vec![0., 1., 0., 1., 0., 1., 0., 1.]);
//!
//! let first = model.train_step(&batch, 0.05).unwrap();
//! for _ in 0..500 {
//!   model.train_step(&batch, 0.05).unwrap();
//! }
//! let last = model.train_step(&batch, 0.05).unwrap();
//! assert!(last < first);
//!
//! // Binarize reconstructions as a separate step
//! let binary = model.reconstruct(&batch, 0.5).unwrap();
//! assert_eq!(binary.shape().dims, vec![1, 8]);
//! ```
//!
//! Probing the latent space:
//! ```
//! use microencoder::{ ops::*, Autoencoder, Tensor, Parallelism };
//!
//! let model = Autoencoder::<f32>::seeded(8, 3, 1)
//!   .with_parallelism(Parallelism::fixed(2));
//! let corners = Tensor::new(&[2, 3], vec![0., 0., 0., 1., 1., 1.]);
//! let out = model.decode(&corners).unwrap();
//! assert_eq!(out.shape().dims, vec![2, 8]);
//! ```
//!
//! ## More examples
//! Check the `/demos` folder for a complete training run.
//!
//!
//! # Optional features
//!
//! Some features can be toggled in your `Cargo.toml`.
//!
//! - `unsafe` *(default)* — Accelerated matrix math using [matrixmultiply] crate.
//! - `rayon` — Row-parallel parameter updates.

mod internal;
mod shape;
mod tensor;
mod autoencoder;

pub mod ops;
pub mod scalar;
pub mod error;
pub mod workers;
pub mod model;
pub mod forward;
pub mod gradient;
pub mod optimize;
pub mod persist;

pub use shape::Shape;
pub use tensor::Tensor;
pub use error::{ Error, Result };
pub use workers::Parallelism;
pub use model::Parameters;
pub use forward::ForwardPass;
pub use gradient::Gradients;
pub use optimize::Optimizer;
pub use autoencoder::Autoencoder;
