//! Declarative reference schemas and their flattened accessor form
//!
//! A [`Schema`] describes where an entity stores foreign keys: leaves are
//! either a type name (to-one reference) or a one-element list of a type name
//! (to-many reference); internal nodes descend into sub-objects. Schemas are
//! declared once per entity and are immutable after build.
//!
//! Flattening turns the tree into a list of [`Accessor`]s, each pairing a
//! field path with the referenced type. Schemas are static trees, not data
//! graphs, so no cycle detection is needed.

use crate::core::error::{DenormError, DenormResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Nested description of an entity's foreign-key fields
///
/// Deserializes from JSON or YAML, e.g.:
///
/// ```yaml
/// author: user
/// visibleTo: [user]
/// nestedData:
///   comments: [comment]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Schema {
    /// A to-one reference: the field holds a single id of the named type
    Ref(String),

    /// A to-many reference: the field holds a list of ids of the named type
    ///
    /// Exactly one type name is allowed; validated during flattening.
    RefList(Vec<String>),

    /// Descent into a nested sub-object
    Nested(BTreeMap<String, Schema>),
}

/// The target of an accessor: a type name, to-one or to-many
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    One(String),
    Many(String),
}

impl TypeRef {
    /// The referenced type name, regardless of cardinality
    pub fn name(&self) -> &str {
        match self {
            TypeRef::One(name) | TypeRef::Many(name) => name,
        }
    }

    pub fn is_many(&self) -> bool {
        matches!(self, TypeRef::Many(_))
    }
}

/// A (path, type-reference) pair describing where a foreign-key value lives
/// and what type it references
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accessor {
    /// Ordered field-name segments from the item root to the reference field
    pub path: Vec<String>,
    /// The referenced type
    pub target: TypeRef,
}

impl Accessor {
    /// Dot-joined rendering of the path, for logs and introspection
    pub fn dotted(&self) -> String {
        self.path.join(".")
    }
}

impl Schema {
    /// Flatten the schema tree into accessors, one per reference leaf.
    ///
    /// Accessor order is deterministic: fields are visited in sorted order at
    /// every level.
    pub fn flatten(&self) -> DenormResult<Vec<Accessor>> {
        let mut accessors = Vec::new();
        let mut prefix = Vec::new();
        self.flatten_into(&mut prefix, &mut accessors)?;
        Ok(accessors)
    }

    fn flatten_into(
        &self,
        prefix: &mut Vec<String>,
        accessors: &mut Vec<Accessor>,
    ) -> DenormResult<()> {
        match self {
            Schema::Ref(type_name) => accessors.push(Accessor {
                path: prefix.clone(),
                target: TypeRef::One(type_name.clone()),
            }),
            Schema::RefList(type_names) => {
                let [type_name] = type_names.as_slice() else {
                    return Err(DenormError::InvalidListRef {
                        path: prefix.join("."),
                        len: type_names.len(),
                    });
                };
                accessors.push(Accessor {
                    path: prefix.clone(),
                    target: TypeRef::Many(type_name.clone()),
                });
            }
            Schema::Nested(fields) => {
                for (field, child) in fields {
                    prefix.push(field.clone());
                    child.flatten_into(prefix, accessors)?;
                    prefix.pop();
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema(value: serde_json::Value) -> Schema {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_flatten_nested_schema() {
        let accessors = schema(json!({ "a": { "b": "T" } })).flatten().unwrap();
        assert_eq!(
            accessors,
            vec![Accessor {
                path: vec!["a".to_string(), "b".to_string()],
                target: TypeRef::One("T".to_string()),
            }]
        );
    }

    #[test]
    fn test_flatten_message_schema() {
        let accessors = schema(json!({
            "author": "user",
            "recipient": "user",
            "visibleTo": ["user"],
            "nestedData": { "comments": ["comment"] }
        }))
        .flatten()
        .unwrap();

        let rendered: Vec<(String, TypeRef)> = accessors
            .into_iter()
            .map(|a| (a.dotted(), a.target))
            .collect();
        assert_eq!(
            rendered,
            vec![
                ("author".to_string(), TypeRef::One("user".to_string())),
                (
                    "nestedData.comments".to_string(),
                    TypeRef::Many("comment".to_string())
                ),
                ("recipient".to_string(), TypeRef::One("user".to_string())),
                ("visibleTo".to_string(), TypeRef::Many("user".to_string())),
            ]
        );
    }

    #[test]
    fn test_flatten_rejects_empty_list_ref() {
        let err = schema(json!({ "tags": [] })).flatten().unwrap_err();
        assert!(matches!(err, DenormError::InvalidListRef { len: 0, .. }));
    }

    #[test]
    fn test_flatten_rejects_multi_type_list_ref() {
        let err = schema(json!({ "tags": ["a", "b"] })).flatten().unwrap_err();
        assert!(matches!(err, DenormError::InvalidListRef { len: 2, .. }));
    }

    #[test]
    fn test_schema_from_yaml() {
        let parsed: Schema = serde_yaml::from_str(
            "author: user\nvisibleTo: [user]\nnestedData:\n  comments: [comment]\n",
        )
        .unwrap();
        let accessors = parsed.flatten().unwrap();
        assert_eq!(accessors.len(), 3);
        assert!(accessors.iter().any(|a| a.dotted() == "nestedData.comments"));
    }

    #[test]
    fn test_type_ref_name_and_cardinality() {
        assert_eq!(TypeRef::One("user".to_string()).name(), "user");
        assert_eq!(TypeRef::Many("user".to_string()).name(), "user");
        assert!(TypeRef::Many("user".to_string()).is_many());
        assert!(!TypeRef::One("user".to_string()).is_many());
    }
}
