mod repair_loop;

pub use repair_loop::*;

use flowsmith_llm::GeneratorError;
use flowsmith_validator::ValidatorError;
use thiserror::Error;

/// Failures that abort a repair-loop run. Exhausting the attempt budget is
/// not one of them; it is reported as `GenerationOutcome::Failure`.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Generator(#[from] GeneratorError),

    #[error(transparent)]
    Validator(#[from] ValidatorError),

    #[error("generation cancelled")]
    Cancelled,
}
