pub mod builders;
pub mod schemas;

pub use builders::{principal_with, NoPrincipal, ValidationScenario};
pub use schemas::{basic_schema, nested_schema, typed_schema};
