//! Compute module - Variation, selection and evaluation for the optimizer.

mod crossover;
mod engine;
mod evaluate;
mod geometry;
mod mutation;
mod population;
mod rng;
mod selection;

pub use crossover::*;
pub use engine::*;
pub use evaluate::*;
pub use geometry::*;
pub use mutation::*;
pub use population::*;
pub use rng::*;
pub use selection::*;
