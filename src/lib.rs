//! graphql-authz - policy-based authorization for GraphQL query validation
//!
//! Policies (named, ordered sets of requirements) attach to schema elements:
//! types, fields, arguments and input fields. A validation rule walks the
//! parsed query document before execution, evaluating the policies of every
//! element the executing operation touches. Denials come back as positioned
//! errors; the host aborts execution when the list is non-empty.
//!
//! This crate is intentionally decoupled from GraphQL execution and HTTP.
//! It consumes the `async-graphql-parser` AST and the host's schema/policy
//! configuration, nothing else.

pub mod errors;
pub mod evaluator;
pub mod policy;
pub mod principal;
pub mod requirement;
pub mod rule;
pub mod schema;
pub mod settings;
pub mod skip;
mod walker;

pub use errors::AuthzError;
pub use evaluator::{
    AuthorizationContext, AuthorizationEvaluator, AuthorizationFailure, AuthorizationResult,
};
pub use policy::{Policy, PolicyBuilder};
pub use principal::{Claim, Principal, ProvideClaimsPrincipal};
pub use requirement::{
    AuthenticatedUserRequirement, ClaimRequirement, DelegatedRequirement, Outcome,
    PolicyExistsRequirement, Requirement,
};
pub use rule::{AuthorizationError, AuthorizationValidationRule};
pub use schema::{
    ArgumentDef, FieldDef, InputFieldDef, InputObjectType, ObjectType, PolicyMetadata,
    SchemaElement, SchemaModel, SchemaModelBuilder,
};
pub use settings::AuthorizationSettings;
pub use skip::{IntrospectionSkipCondition, SkipCondition, SkipContext};
