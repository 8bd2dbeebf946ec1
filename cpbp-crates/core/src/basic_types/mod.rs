mod model_error;
mod propagation_status;
mod random;
mod trail;

pub use model_error::ModelError;
pub use propagation_status::Inconsistency;
pub use propagation_status::PropagationStatus;
pub use random::Random;
pub(crate) use trail::Trail;
#[cfg(test)]
pub(crate) use random::tests;
