use miette::Diagnostic;
use thiserror::Error;

/// Configuration-time failures raised while assembling a [`crate::schema::SchemaModel`].
///
/// Request-time denials never surface here; those travel as
/// [`crate::evaluator::AuthorizationResult`] values.
#[derive(Debug, Error, Diagnostic)]
pub enum AuthzError {
    #[error("Undefined type `{referenced}` referenced by {referrer}")]
    #[diagnostic(
        code(graphql_authz::schema::undefined_type),
        help("Declare the type with `object`, `input_object` or `scalar` on the builder before calling build()")
    )]
    UndefinedType { referenced: String, referrer: String },

    #[error("Duplicate type definition `{0}`")]
    #[diagnostic(
        code(graphql_authz::schema::duplicate_type),
        help("Each type name may be declared only once per schema model")
    )]
    DuplicateType(String),

    #[error("Cannot attach policy `{policy}` to unknown schema element {element}")]
    #[diagnostic(
        code(graphql_authz::schema::unknown_element),
        help("Policies may only be attached to declared types, fields, arguments and input fields")
    )]
    UnknownElement { element: String, policy: String },

    #[error("Root {operation} type `{type_name}` is not a declared object type")]
    #[diagnostic(
        code(graphql_authz::schema::missing_root),
        help("The query/mutation/subscription root must name an object type declared on the builder")
    )]
    MissingRootType {
        operation: &'static str,
        type_name: String,
    },
}
