//! Rule tree compiler
//!
//! Turns a flat [`SchemaDefinition`] of dotted paths into a tree whose shape
//! mirrors the documents it validates:
//!
//! - `a.b.c` creates branches `a` and `a.b` and a leaf `c`
//! - `array(T)` creates an array node whose element node is compiled from `T`
//! - `array(schema)` compiles the nested schema into the element branch
//!
//! Schema mistakes are reported here, once, instead of on every document.
//! The compiled tree is never mutated afterwards.

use super::definition::SchemaDefinition;
use super::errors::{SchemaError, SchemaResult};
use super::rule::FieldRule;
use super::types::{ElementType, FieldType};

/// A node of the compiled rule tree.
#[derive(Debug)]
pub enum RuleNode {
    /// Scalar field
    Leaf(FieldRule),
    /// Nested object
    Branch(Branch),
    /// Array-typed field
    Array(ArrayNode),
}

/// Nested object: child keys in declaration order.
#[derive(Debug, Default)]
pub struct Branch {
    children: Vec<(String, RuleNode)>,
}

impl Branch {
    pub fn children(&self) -> impl Iterator<Item = (&str, &RuleNode)> {
        self.children.iter().map(|(k, n)| (k.as_str(), n))
    }

    pub fn get(&self, key: &str) -> Option<&RuleNode> {
        self.children.iter().find(|(k, _)| k == key).map(|(_, n)| n)
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    fn get_mut(&mut self, key: &str) -> Option<&mut RuleNode> {
        self.children.iter_mut().find(|(k, _)| k == key).map(|(_, n)| n)
    }
}

/// Array-typed field: the container's own rule plus the rule tree applied
/// to every element.
#[derive(Debug)]
pub struct ArrayNode {
    pub rule: FieldRule,
    pub element: Box<RuleNode>,
}

/// The compiled, immutable rule tree of one schema definition.
#[derive(Debug)]
pub struct CompiledSchema {
    root: Branch,
    field_count: usize,
}

impl CompiledSchema {
    pub fn root(&self) -> &Branch {
        &self.root
    }

    /// Number of distinct top-level field declarations.
    pub fn field_count(&self) -> usize {
        self.field_count
    }

    /// Human-readable outline, one line per leaf or array node.
    pub fn outline(&self) -> Vec<String> {
        let mut lines = Vec::new();
        outline_branch(&self.root, "", &mut lines);
        lines
    }
}

/// Compiles a schema definition into a rule tree.
pub fn compile(definition: &SchemaDefinition) -> SchemaResult<CompiledSchema> {
    let fields = resolve_declarations(definition)?;
    let field_count = fields.len();
    let root = build_branch(fields)?;
    Ok(CompiledSchema { root, field_count })
}

/// Checks every path and folds repeated declarations of the same shape
/// into the first position.
fn resolve_declarations(definition: &SchemaDefinition) -> SchemaResult<Vec<(String, FieldRule)>> {
    let mut fields: Vec<(String, FieldRule)> = Vec::with_capacity(definition.len());

    for (path, rule) in definition.iter() {
        if path.split('.').any(str::is_empty) {
            return Err(SchemaError::malformed_path(path));
        }

        match fields.iter_mut().find(|(p, _)| p == path) {
            Some((_, existing)) => {
                if !existing.field_type.same_shape(&rule.field_type) {
                    return Err(SchemaError::duplicate_path(
                        path,
                        &existing.field_type.describe(),
                        &rule.field_type.describe(),
                    ));
                }
                *existing = rule.clone();
            }
            None => fields.push((path.to_string(), rule.clone())),
        }
    }

    Ok(fields)
}

fn build_branch(fields: Vec<(String, FieldRule)>) -> SchemaResult<Branch> {
    let mut root = Branch::default();
    for (path, rule) in fields {
        let node = compile_field(&path, rule)?;
        let segments: Vec<&str> = path.split('.').collect();
        insert(&mut root, &segments, 0, &path, node)?;
    }
    Ok(root)
}

fn insert(
    branch: &mut Branch,
    segments: &[&str],
    depth: usize,
    path: &str,
    node: RuleNode,
) -> SchemaResult<()> {
    let key = segments[depth];

    if depth + 1 == segments.len() {
        if let Some(existing) = branch.get(key) {
            let nested = match existing {
                RuleNode::Branch(b) => b.children().next().map(|(k, _)| k.to_string()),
                _ => None,
            };
            let other = match nested {
                Some(child) => format!("{}.{}", path, child),
                None => path.to_string(),
            };
            return Err(SchemaError::path_collision(path, other));
        }
        branch.children.push((key.to_string(), node));
        return Ok(());
    }

    if branch.get(key).is_none() {
        branch
            .children
            .push((key.to_string(), RuleNode::Branch(Branch::default())));
    }

    match branch.get_mut(key) {
        Some(RuleNode::Branch(child)) => insert(child, segments, depth + 1, path, node),
        _ => Err(SchemaError::path_collision(
            segments[..=depth].join("."),
            path,
        )),
    }
}

fn compile_field(path: &str, rule: FieldRule) -> SchemaResult<RuleNode> {
    check_rule(path, &rule)?;

    let element = match &rule.field_type {
        FieldType::Array(element) => Some(compile_element(path, element)?),
        _ => None,
    };

    Ok(match element {
        Some(element) => RuleNode::Array(ArrayNode {
            rule,
            element: Box::new(element),
        }),
        None => RuleNode::Leaf(rule),
    })
}

fn compile_element(path: &str, element: &ElementType) -> SchemaResult<RuleNode> {
    match element {
        ElementType::Type(field_type) => compile_field(path, FieldRule::new(field_type.clone())),
        ElementType::Schema(definition) => {
            let nested = resolve_declarations(definition)
                .and_then(build_branch)
                .map_err(|e| e.nested_under(path))?;
            Ok(RuleNode::Branch(nested))
        }
    }
}

fn check_rule(path: &str, rule: &FieldRule) -> SchemaResult<()> {
    let bounded = rule.min_length.is_some() || rule.max_length.is_some();
    if bounded && !rule.field_type.has_length() {
        return Err(SchemaError::invalid_rule(
            path,
            format!("length bounds do not apply to {}", rule.field_type.type_name()),
        ));
    }
    if let (Some(min), Some(max)) = (rule.min_length, rule.max_length) {
        if min > max {
            return Err(SchemaError::invalid_rule(
                path,
                format!("minLength {} exceeds maxLength {}", min, max),
            ));
        }
    }
    Ok(())
}

fn outline_branch(branch: &Branch, prefix: &str, lines: &mut Vec<String>) {
    for (key, node) in branch.children() {
        let path = if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", prefix, key)
        };
        outline_node(node, &path, lines);
    }
}

fn outline_node(node: &RuleNode, path: &str, lines: &mut Vec<String>) {
    match node {
        RuleNode::Leaf(rule) => lines.push(outline_line(path, rule)),
        RuleNode::Branch(branch) => outline_branch(branch, path, lines),
        RuleNode::Array(array) => {
            lines.push(outline_line(path, &array.rule));
            outline_node(&array.element, &format!("{}[]", path), lines);
        }
    }
}

fn outline_line(path: &str, rule: &FieldRule) -> String {
    let flags = rule.flags();
    if flags.is_empty() {
        format!("{}: {}", path, rule.field_type)
    } else {
        format!("{}: {} [{}]", path, rule.field_type, flags.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::errors::SchemaErrorCode;
    use crate::schema::types;

    fn keys(branch: &Branch) -> Vec<&str> {
        branch.children().map(|(k, _)| k).collect()
    }

    #[test]
    fn test_dotted_paths_become_branches() {
        let def = SchemaDefinition::new()
            .field("account.name", FieldRule::new(types::string()))
            .field("age", FieldRule::new(types::number()))
            .field("account.email", FieldRule::new(types::string()));

        let compiled = compile(&def).unwrap();
        assert_eq!(keys(compiled.root()), vec!["account", "age"]);

        match compiled.root().get("account") {
            Some(RuleNode::Branch(account)) => assert_eq!(keys(account), vec!["name", "email"]),
            other => panic!("expected branch, got {:?}", other),
        }
        assert!(matches!(compiled.root().get("age"), Some(RuleNode::Leaf(_))));
        assert_eq!(compiled.field_count(), 3);
    }

    #[test]
    fn test_array_of_primitives_wraps_leaf() {
        let def = SchemaDefinition::new().field("tags", FieldRule::new(types::array(types::string())));
        let compiled = compile(&def).unwrap();

        match compiled.root().get("tags") {
            Some(RuleNode::Array(array)) => match array.element.as_ref() {
                RuleNode::Leaf(rule) => assert_eq!(rule.field_type.type_name(), "string"),
                other => panic!("expected leaf element, got {:?}", other),
            },
            other => panic!("expected array node, got {:?}", other),
        }
    }

    #[test]
    fn test_array_of_documents_wraps_branch() {
        let friend = SchemaDefinition::new()
            .field("name", FieldRule::new(types::string()))
            .field("meta.since", FieldRule::new(types::date()));
        let def = SchemaDefinition::new().field("friends", FieldRule::new(types::array_of(friend)));
        let compiled = compile(&def).unwrap();

        match compiled.root().get("friends") {
            Some(RuleNode::Array(array)) => match array.element.as_ref() {
                RuleNode::Branch(element) => assert_eq!(keys(element), vec!["name", "meta"]),
                other => panic!("expected branch element, got {:?}", other),
            },
            other => panic!("expected array node, got {:?}", other),
        }
    }

    #[test]
    fn test_leaf_then_branch_collides() {
        let def = SchemaDefinition::new()
            .field("account", FieldRule::new(types::string()))
            .field("account.name", FieldRule::new(types::string()));
        let err = compile(&def).unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::PathCollision);
        assert_eq!(err.path(), Some("account"));
    }

    #[test]
    fn test_branch_then_leaf_collides() {
        let def = SchemaDefinition::new()
            .field("account.name", FieldRule::new(types::string()))
            .field("account", FieldRule::new(types::string()));
        let err = compile(&def).unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::PathCollision);
        assert!(err.message().contains("account.name"));
    }

    #[test]
    fn test_conflicting_duplicate_fails() {
        let def = SchemaDefinition::new()
            .field("age", FieldRule::new(types::number()))
            .field("age", FieldRule::new(types::string()));
        let err = compile(&def).unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::DuplicatePath);
    }

    #[test]
    fn test_same_shape_duplicate_replaces_in_place() {
        let def = SchemaDefinition::new()
            .field("name", FieldRule::new(types::string()))
            .field("age", FieldRule::new(types::number()))
            .field("name", FieldRule::new(types::string()).required());
        let compiled = compile(&def).unwrap();

        assert_eq!(keys(compiled.root()), vec!["name", "age"]);
        match compiled.root().get("name") {
            Some(RuleNode::Leaf(rule)) => assert!(rule.required),
            other => panic!("expected leaf, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_paths() {
        for path in ["", "a..b", ".a", "a."] {
            let def = SchemaDefinition::new().field(path, FieldRule::new(types::string()));
            let err = compile(&def).unwrap_err();
            assert_eq!(err.code(), SchemaErrorCode::MalformedPath, "path {:?}", path);
        }
    }

    #[test]
    fn test_invalid_length_bounds() {
        let def = SchemaDefinition::new()
            .field("name", FieldRule::new(types::string()).min_length(5).max_length(2));
        assert_eq!(compile(&def).unwrap_err().code(), SchemaErrorCode::InvalidRule);

        let def = SchemaDefinition::new().field("age", FieldRule::new(types::number()).max_length(2));
        assert_eq!(compile(&def).unwrap_err().code(), SchemaErrorCode::InvalidRule);
    }

    #[test]
    fn test_nested_schema_errors_carry_full_path() {
        let friend = SchemaDefinition::new()
            .field("name", FieldRule::new(types::string()))
            .field("name.first", FieldRule::new(types::string()));
        let def = SchemaDefinition::new().field("account.friends", FieldRule::new(types::array_of(friend)));

        let err = compile(&def).unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::PathCollision);
        assert_eq!(err.path(), Some("account.friends[].name"));
    }

    #[test]
    fn test_outline() {
        let friend = SchemaDefinition::new().field("name", FieldRule::new(types::string()).required());
        let def = SchemaDefinition::new()
            .field("account.name", FieldRule::new(types::string()).trim())
            .field("account.friends", FieldRule::new(types::array_of(friend)).max_length(3));

        let outline = compile(&def).unwrap().outline();
        assert_eq!(
            outline,
            vec![
                "account.name: string [trim]",
                "account.friends: array<object> [maxLength=3]",
                "account.friends[].name: string [required]",
            ]
        );
    }
}
