mod outcome;
mod report;
mod request;
mod validation;

pub use outcome::*;
pub use report::*;
pub use request::*;
pub use validation::*;
