mod helpers;

use graphql_authz::{FieldDef, ObjectType, Principal, SchemaModel};
use helpers::{basic_schema, nested_schema, principal_with, typed_schema, ValidationScenario};

fn admin() -> Principal {
    principal_with(&[("Admin", "true")])
}

#[tokio::test]
async fn test_type_and_field_policies_pass_with_claim() {
    ValidationScenario::new(basic_schema(), "query { post }")
        .policy("ClassPolicy", |b| b.require_claim("admin"))
        .policy("FieldPolicy", |b| b.require_claim("admin"))
        .principal(admin())
        .should_pass()
        .await;
}

#[tokio::test]
async fn test_type_policy_fails_without_claim() {
    ValidationScenario::new(basic_schema(), "query { post }")
        .policy("ClassPolicy", |b| b.require_claim("admin"))
        .policy("FieldPolicy", |b| b.require_claim("admin"))
        .should_fail()
        .await;
}

#[tokio::test]
async fn test_field_policy_fails_without_claim() {
    // the type itself is open (ClassPolicy empty), the field is not
    ValidationScenario::new(basic_schema(), "query { post }")
        .policy("ClassPolicy", |b| b)
        .policy("FieldPolicy", |b| b.require_claim("admin"))
        .should_fail()
        .await;
}

#[tokio::test]
async fn test_unregistered_policy_fails_closed() {
    // FieldPolicy is attached to the schema but never registered
    let errors = ValidationScenario::new(basic_schema(), "query { post }")
        .policy("ClassPolicy", |b| b)
        .principal(admin())
        .should_fail()
        .await;
    assert_eq!(
        errors[0].message(),
        "You are not authorized to run this query.\nRequired policy 'FieldPolicy' is not present."
    );
}

#[tokio::test]
async fn test_restricted_return_type_fails_even_if_field_is_open() {
    ValidationScenario::new(nested_schema(), "query { post }")
        .policy("PostPolicy", |b| b.require_claim("admin"))
        .should_fail()
        .await;
}

#[tokio::test]
async fn test_restricted_return_type_passes_with_claim() {
    ValidationScenario::new(nested_schema(), "query { post }")
        .policy("PostPolicy", |b| b.require_claim("admin"))
        .principal(admin())
        .should_pass()
        .await;
}

#[tokio::test]
async fn test_list_return_type_unwraps_to_restricted_type() {
    ValidationScenario::new(nested_schema(), "query { posts }")
        .policy("PostPolicy", |b| b.require_claim("admin"))
        .should_fail()
        .await;
}

#[tokio::test]
async fn test_non_null_list_return_type_unwraps_to_restricted_type() {
    ValidationScenario::new(nested_schema(), "query { postsNonNull }")
        .policy("PostPolicy", |b| b.require_claim("admin"))
        .should_fail()
        .await;
}

#[tokio::test]
async fn test_sibling_operation_restrictions_do_not_leak_by_name() {
    ValidationScenario::new(nested_schema(), "query p { posts } query c { comment }")
        .policy("PostPolicy", |b| b.require_claim("admin"))
        .operation_name("c")
        .should_pass()
        .await;
}

#[tokio::test]
async fn test_sibling_operation_restrictions_do_not_leak_by_document_order() {
    ValidationScenario::new(nested_schema(), "query c { comment } query p { posts }")
        .policy("PostPolicy", |b| b.require_claim("admin"))
        .should_pass()
        .await;
}

#[tokio::test]
async fn test_fragment_used_only_by_sibling_operation_is_not_checked() {
    let query = "query a { article { id } } \
                 query b { article { ...frag } } \
                 fragment frag on Article { content }";
    ValidationScenario::new(typed_schema(), query)
        .policy("AdminPolicy", |b| b.require_claim("admin"))
        .operation_name("a")
        .should_pass()
        .await;
}

#[tokio::test]
async fn test_each_operation_sees_only_its_own_fragments() {
    let query = "query a { article { ...frag1 author } } \
                 query b { article { ...frag2 } } \
                 fragment frag1 on Article { id } \
                 fragment frag2 on Article { content }";
    ValidationScenario::new(typed_schema(), query)
        .policy("AdminPolicy", |b| b.require_claim("admin"))
        .operation_name("a")
        .should_pass()
        .await;
}

#[tokio::test]
async fn test_fragment_spread_from_executing_operation_is_checked() {
    let query = "query a { article { ...frag } } \
                 query b { article { ...frag } } \
                 fragment frag on Article { content }";
    let errors = ValidationScenario::new(typed_schema(), query)
        .policy("AdminPolicy", |b| b.require_claim("admin"))
        .operation_name("a")
        .should_fail()
        .await;
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].message(),
        "You are not authorized to run this query.\nRequired claim 'admin' is not present."
    );
}

#[tokio::test]
async fn test_nested_fragments_are_followed() {
    let query = "query a { article { ...frag } } \
                 fragment frag on Article { ...frag2 } \
                 fragment frag2 on Article { content }";
    let errors = ValidationScenario::new(typed_schema(), query)
        .policy("AdminPolicy", |b| b.require_claim("admin"))
        .should_fail()
        .await;
    assert_eq!(errors.len(), 1);
}

#[tokio::test]
async fn test_cyclic_fragments_terminate() {
    let query = "query a { article { ...frag } } \
                 fragment frag on Article { ...frag2 content } \
                 fragment frag2 on Article { ...frag }";
    ValidationScenario::new(typed_schema(), query)
        .policy("AdminPolicy", |b| b.require_claim("admin"))
        .principal(admin())
        .should_pass()
        .await;
}

#[tokio::test]
async fn test_input_object_literal_field_passes_with_claim() {
    ValidationScenario::new(typed_schema(), r#"query { author(input: { name: "Quinn" }) }"#)
        .policy("FieldPolicy", |b| b.require_claim("admin"))
        .principal(admin())
        .should_pass()
        .await;
}

#[tokio::test]
async fn test_input_object_literal_field_fails_without_claim() {
    ValidationScenario::new(typed_schema(), r#"query { author(input: { name: "Quinn" }) }"#)
        .policy("FieldPolicy", |b| b.require_claim("admin"))
        .should_fail()
        .await;
}

#[tokio::test]
async fn test_input_field_not_supplied_is_not_checked() {
    // no `name` key in the literal, so FieldPolicy never runs
    ValidationScenario::new(typed_schema(), "query { author(input: {}) }")
        .policy("FieldPolicy", |b| b.require_claim("admin"))
        .should_pass()
        .await;
}

#[tokio::test]
async fn test_multiple_policies_on_field_and_input_field() {
    let query = r#"query { author(input: { name: "Quinn" }) project(input: { name: "TEST" }) }"#;
    ValidationScenario::new(typed_schema(), query)
        .policy("FieldPolicy", |b| b.require_claim("admin"))
        .policy("AdminPolicy", |b| b.require_claim("admin"))
        .policy("ConfidentialPolicy", |b| b.require_claim("admin"))
        .principal(admin())
        .should_pass()
        .await;
}

#[tokio::test]
async fn test_unknown_field_with_arguments_is_ignored() {
    ValidationScenario::new(typed_schema(), "query { unknown(obj: { id: 7 }) }")
        .policy("FieldPolicy", |b| b.require_claim("admin"))
        .principal(admin())
        .should_pass()
        .await;
}

#[tokio::test]
async fn test_variable_supplied_input_field_passes_with_claim() {
    ValidationScenario::new(
        typed_schema(),
        "query Author($input: AuthorInput!) { author(input: $input) }",
    )
    .policy("FieldPolicy", |b| b.require_claim("admin"))
    .variables(serde_json::json!({ "input": { "name": "Quinn" } }))
    .principal(admin())
    .should_pass()
    .await;
}

#[tokio::test]
async fn test_variable_supplied_input_field_fails_without_claim() {
    ValidationScenario::new(
        typed_schema(),
        "query Author($input: AuthorInput!) { author(input: $input) }",
    )
    .policy("FieldPolicy", |b| b.require_claim("admin"))
    .variables(serde_json::json!({ "input": { "name": "Quinn" } }))
    .should_fail()
    .await;
}

#[tokio::test]
async fn test_missing_variable_value_produces_no_authorization_error() {
    // the executor rejects the null non-null variable; authorization stays out
    ValidationScenario::new(
        typed_schema(),
        "query Author($input: AuthorInput!) { author(input: $input) }",
    )
    .policy("FieldPolicy", |b| b.require_claim("admin"))
    .principal(admin())
    .should_pass()
    .await;
}

#[tokio::test]
async fn test_connection_type_policy() {
    ValidationScenario::new(typed_schema(), "query { posts { items { id } } }")
        .policy("ConnectionPolicy", |b| b.require_claim("admin"))
        .principal(admin())
        .should_pass()
        .await;

    ValidationScenario::new(typed_schema(), "query { posts { items { id } } }")
        .policy("ConnectionPolicy", |b| b.require_claim("admin"))
        .should_fail()
        .await;
}

#[tokio::test]
async fn test_skip_directive_suppresses_authorization() {
    ValidationScenario::new(nested_schema(), "query { posts @skip(if: true) comment }")
        .policy("PostPolicy", |b| b.require_claim("admin"))
        .should_pass()
        .await;
}

#[tokio::test]
async fn test_skip_directive_false_still_checks() {
    ValidationScenario::new(nested_schema(), "query { posts @skip(if: false) comment }")
        .policy("PostPolicy", |b| b.require_claim("admin"))
        .should_fail()
        .await;
}

#[tokio::test]
async fn test_include_directive_resolves_variables() {
    let query = "query($inc: Boolean!) { posts @include(if: $inc) comment }";
    ValidationScenario::new(nested_schema(), query)
        .policy("PostPolicy", |b| b.require_claim("admin"))
        .variables(serde_json::json!({ "inc": false }))
        .should_pass()
        .await;

    ValidationScenario::new(nested_schema(), query)
        .policy("PostPolicy", |b| b.require_claim("admin"))
        .variables(serde_json::json!({ "inc": true }))
        .should_fail()
        .await;
}

#[tokio::test]
async fn test_argument_policy_checked_only_when_argument_present() {
    let schema = SchemaModel::builder("Query")
        .object(
            ObjectType::new("Query")
                .field(FieldDef::new("search", "String").argument("filter", "String")),
        )
        .authorize_argument("Query", "search", "filter", "FilterPolicy")
        .build()
        .unwrap();

    ValidationScenario::new(schema.clone(), r#"query { search(filter: "x") }"#)
        .policy("FilterPolicy", |b| b.require_claim("admin"))
        .should_fail()
        .await;

    ValidationScenario::new(schema, "query { search }")
        .policy("FilterPolicy", |b| b.require_claim("admin"))
        .should_pass()
        .await;
}

#[tokio::test]
async fn test_schema_wide_policy_runs_before_traversal() {
    let schema = SchemaModel::builder("Query")
        .object(ObjectType::new("Query").field(FieldDef::new("ping", "String")))
        .authorize_schema("AuthenticatedPolicy")
        .build()
        .unwrap();

    ValidationScenario::new(schema.clone(), "query { ping }")
        .policy("AuthenticatedPolicy", |b| b.require_authenticated_user())
        .should_fail()
        .await;

    ValidationScenario::new(schema, "query { ping }")
        .policy("AuthenticatedPolicy", |b| b.require_authenticated_user())
        .principal(Principal::authenticated(vec![]))
        .should_pass()
        .await;
}

#[tokio::test]
async fn test_mutation_denial_names_the_operation_kind() {
    let schema = SchemaModel::builder("Query")
        .mutation_type("Mutation")
        .object(ObjectType::new("Query").field(FieldDef::new("ping", "String")))
        .object(ObjectType::new("Mutation").field(FieldDef::new("reset", "String")))
        .authorize_field("Mutation", "reset", "AdminPolicy")
        .build()
        .unwrap();

    let errors = ValidationScenario::new(schema, "mutation { reset }")
        .policy("AdminPolicy", |b| b.require_claim("admin"))
        .should_fail()
        .await;
    assert!(errors[0]
        .message()
        .starts_with("You are not authorized to run this mutation."));
}

#[tokio::test]
async fn test_spec_example_scenario_exact_message() {
    let schema = SchemaModel::builder("Query")
        .object(ObjectType::new("Query").field(FieldDef::new("viewer", "User")))
        .object(
            ObjectType::new("User")
                .field(FieldDef::new("id", "ID"))
                .field(FieldDef::new("name", "String")),
        )
        .authorize_field("Query", "viewer", "AdminPolicy")
        .build()
        .unwrap();

    let errors = ValidationScenario::new(schema.clone(), "{ viewer { id name } }")
        .policy("AdminPolicy", |b| b.require_claim_values("role", ["Admin"]))
        .should_fail()
        .await;
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].message(),
        "You are not authorized to run this query.\n\
         Required claim 'role' with any value of 'Admin' is not present."
    );
    assert_eq!(errors[0].code(), "authorization");
    assert_eq!(errors[0].position().line, 1);

    ValidationScenario::new(schema, "{ viewer { id name } }")
        .policy("AdminPolicy", |b| b.require_claim_values("role", ["Admin"]))
        .principal(principal_with(&[("role", "Admin")]))
        .should_pass()
        .await;
}

#[tokio::test]
async fn test_same_element_reported_once_per_run() {
    // `content` reached twice: directly and through the fragment
    let query = "query { article { content ...frag } } fragment frag on Article { content }";
    let errors = ValidationScenario::new(typed_schema(), query)
        .policy("AdminPolicy", |b| b.require_claim("admin"))
        .should_fail()
        .await;
    assert_eq!(errors.len(), 1);
}
