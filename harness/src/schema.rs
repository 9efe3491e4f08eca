//! The sample schema served by the harness:
//!
//! ```graphql
//! type Query {
//!   viewer: User    # guarded by AdminPolicy
//!   users: [User]
//!   guest: String
//! }
//!
//! type User {
//!   id: ID
//!   name: String
//! }
//! ```

use async_graphql_parser::types::{DocumentOperations, ExecutableDocument, Selection};
use graphql_authz::{AuthzError, FieldDef, ObjectType, SchemaModel};
use serde_json::{json, Value};

pub fn build_schema() -> Result<SchemaModel, AuthzError> {
    SchemaModel::builder("Query")
        .object(
            ObjectType::new("Query")
                .field(FieldDef::new("viewer", "User"))
                .field(FieldDef::new("users", "[User]"))
                .field(FieldDef::new("guest", "String")),
        )
        .object(
            ObjectType::new("User")
                .field(FieldDef::new("id", "ID"))
                .field(FieldDef::new("name", "String")),
        )
        .authorize_field("Query", "viewer", "AdminPolicy")
        .build()
}

/// Canned resolution for authorized documents. Real execution is out of scope
/// for this repository; the harness only demonstrates the decision layer.
pub fn resolve(document: &ExecutableDocument, operation_name: Option<&str>) -> Value {
    let operation = match (&document.operations, operation_name) {
        (DocumentOperations::Single(operation), _) => Some(operation),
        (DocumentOperations::Multiple(operations), Some(name)) => operations
            .iter()
            .find(|(candidate, _)| candidate.as_str() == name)
            .map(|(_, operation)| operation),
        (DocumentOperations::Multiple(operations), None) => operations
            .values()
            .min_by_key(|operation| (operation.pos.line, operation.pos.column)),
    };
    let Some(operation) = operation else {
        return Value::Null;
    };

    let mut data = serde_json::Map::new();
    for item in &operation.node.selection_set.node.items {
        if let Selection::Field(field) = &item.node {
            let name = field.node.name.node.as_str();
            let key = field
                .node
                .alias
                .as_ref()
                .map(|alias| alias.node.to_string())
                .unwrap_or_else(|| name.to_string());
            let value = match name {
                "viewer" => json!({ "id": "u-1000", "name": "Quinn" }),
                "users" => json!([{ "id": "u-1000", "name": "Quinn" }]),
                "guest" => json!("guest42"),
                "__typename" => json!("Query"),
                _ => Value::Null,
            };
            data.insert(key, value);
        }
    }
    Value::Object(data)
}
