use graphql_authz::{FieldDef, InputObjectType, ObjectType, SchemaModel};

/// A query root with a type-level policy and a field-level policy:
/// `ClassPolicy` on `Query`, `FieldPolicy` on `Query.post`.
pub fn basic_schema() -> SchemaModel {
    SchemaModel::builder("Query")
        .object(ObjectType::new("Query").field(FieldDef::new("post", "String").argument("id", "ID")))
        .authorize_type("Query", "ClassPolicy")
        .authorize_field("Query", "post", "FieldPolicy")
        .build()
        .expect("basic schema must build")
}

/// A restricted return type behind unrestricted fields: `PostPolicy` on
/// `Post`, reached via plain, list and non-null-list fields.
pub fn nested_schema() -> SchemaModel {
    SchemaModel::builder("Query")
        .object(
            ObjectType::new("Query")
                .field(FieldDef::new("post", "Post").argument("id", "ID"))
                .field(FieldDef::new("posts", "[Post]"))
                .field(FieldDef::new("postsNonNull", "[Post!]!"))
                .field(FieldDef::new("comment", "String")),
        )
        .object(ObjectType::new("Post").field(FieldDef::new("id", "ID")))
        .authorize_type("Post", "PostPolicy")
        .build()
        .expect("nested schema must build")
}

/// The richer fixture: guarded input field (`FieldPolicy` on
/// `AuthorInput.name`), doubly guarded field (`AdminPolicy` +
/// `ConfidentialPolicy` on `Query.project`), guarded field on a nested type
/// (`AdminPolicy` on `Article.content`) and a guarded connection type
/// (`ConnectionPolicy` on `PostConnection`).
pub fn typed_schema() -> SchemaModel {
    SchemaModel::builder("Query")
        .object(
            ObjectType::new("Query")
                .field(FieldDef::new("author", "String").argument("input", "AuthorInput"))
                .field(FieldDef::new("project", "String").argument("input", "AuthorInput"))
                .field(FieldDef::new("article", "Article"))
                .field(FieldDef::new("posts", "PostConnection")),
        )
        .object(
            ObjectType::new("Article")
                .field(FieldDef::new("id", "ID"))
                .field(FieldDef::new("author", "String"))
                .field(FieldDef::new("content", "String")),
        )
        .object(ObjectType::new("PostConnection").field(FieldDef::new("items", "[Post]")))
        .object(ObjectType::new("Post").field(FieldDef::new("id", "ID")))
        .input_object(InputObjectType::new("AuthorInput").field("name", "String"))
        .authorize_input_field("AuthorInput", "name", "FieldPolicy")
        .authorize_field("Query", "project", "AdminPolicy")
        .authorize_field("Query", "project", "ConfidentialPolicy")
        .authorize_field("Article", "content", "AdminPolicy")
        .authorize_type("PostConnection", "ConnectionPolicy")
        .build()
        .expect("typed schema must build")
}
