pub mod builder;
pub mod validator;

pub use builder::{build_forest, BuildOutcome, ForestBuilder};
pub use validator::{validate_inputs, ValidationResult, ValidationStats};
