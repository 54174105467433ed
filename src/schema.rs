//! Flat leaf-column schema: derivation of `max_def`/`max_rep`, and the bridge to the Thrift
//! `SchemaElement` list written into and read from the file footer.

use parquet_format_safe::{ConvertedType, FieldRepetitionType, SchemaElement, Type};

use crate::error::{Error, Result};
use crate::value::{PhysicalType, Repetition};

/// The synthetic root schema element name this writer emits. Preserved for round-trip
/// bit-compatibility, not configurable.
pub const ROOT_NAME: &str = "parquet_go_root";

/// One leaf column: its path from the record root, its physical storage type, and the
/// repetition (required/optional/repeated) of each path element from outermost to the leaf
/// itself.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnSchema {
    pub path: Vec<String>,
    pub physical_type: PhysicalType,
    pub repetition_path: Vec<Repetition>,
}

impl ColumnSchema {
    pub fn new(
        path: Vec<String>,
        physical_type: PhysicalType,
        repetition_path: Vec<Repetition>,
    ) -> Self {
        assert_eq!(
            path.len(),
            repetition_path.len(),
            "path and repetition_path must have the same length"
        );
        assert!(!path.is_empty(), "a column path must have at least one element");
        ColumnSchema {
            path,
            physical_type,
            repetition_path,
        }
    }

    /// Count of path elements that are `Optional` or `Repeated`.
    pub fn max_def(&self) -> u16 {
        self.repetition_path
            .iter()
            .filter(|r| !matches!(r, Repetition::Required))
            .count() as u16
    }

    /// Count of path elements that are `Repeated`.
    pub fn max_rep(&self) -> u16 {
        self.repetition_path
            .iter()
            .filter(|r| matches!(r, Repetition::Repeated))
            .count() as u16
    }

    /// Bit width needed by the level codec to represent `0..=max`.
    pub fn bit_width(max: u16) -> u8 {
        if max == 0 {
            0
        } else {
            (32 - (max as u32).leading_zeros()) as u8
        }
    }
}

/// An ordered list of leaf columns, the unit of schema this crate's shredder, assembler, writer
/// and reader all operate against.
#[derive(Clone, Debug, PartialEq)]
pub struct SchemaDescriptor {
    leaves: Vec<ColumnSchema>,
}

impl SchemaDescriptor {
    pub fn new(leaves: Vec<ColumnSchema>) -> Self {
        SchemaDescriptor { leaves }
    }

    pub fn leaves(&self) -> &[ColumnSchema] {
        &self.leaves
    }

    pub fn num_columns(&self) -> usize {
        self.leaves.len()
    }

    /// Builds the Thrift `SchemaElement` list this crate writes into the footer: a synthetic
    /// [`ROOT_NAME`] group element, followed by the leaves' common-prefix tree in pre-order —
    /// matching path segments shared by two leaves (e.g. `link.forward` and `link.backward`)
    /// collapse into one intermediate group element, the same shape Parquet's own schema tree
    /// uses.
    pub fn to_thrift(&self) -> Vec<SchemaElement> {
        let tree = build_tree(&self.leaves);
        let mut elements = Vec::with_capacity(self.leaves.len() + 1);
        elements.push(SchemaElement {
            type_: None,
            type_length: None,
            repetition_type: Some(FieldRepetitionType::REQUIRED),
            name: ROOT_NAME.to_string(),
            num_children: Some(tree.len() as i32),
            converted_type: None,
            scale: None,
            precision: None,
            field_id: None,
            logical_type: None,
        });
        flatten_to_thrift(&tree, &mut elements);
        elements
    }

    /// Inverse of [`SchemaDescriptor::to_thrift`]: a recursive-descent parse of the flat
    /// `SchemaElement` list (consuming each group's declared `num_children`) that rebuilds every
    /// leaf's full path and repetition path, skipping the synthetic root.
    pub fn try_from_thrift(elements: &[SchemaElement]) -> Result<Self> {
        if elements.is_empty() {
            return Err(Error::SchemaViolation(
                "schema element list is empty".to_string(),
            ));
        }
        let root = &elements[0];
        let num_children = root.num_children.unwrap_or(0) as usize;

        let mut pos = 1;
        let mut leaves = Vec::new();
        for _ in 0..num_children {
            pos = parse_node(elements, pos, Vec::new(), Vec::new(), &mut leaves)?;
        }
        if pos != elements.len() {
            return Err(Error::SchemaViolation(format!(
                "{} schema elements trail the declared tree",
                elements.len() - pos
            )));
        }
        Ok(SchemaDescriptor::new(leaves))
    }
}

/// One node of the tree leaves imply through their shared path prefixes.
enum SchemaNode {
    Leaf {
        name: String,
        repetition: Repetition,
        physical_type: PhysicalType,
    },
    Group {
        name: String,
        repetition: Repetition,
        children: Vec<SchemaNode>,
    },
}

fn build_tree(leaves: &[ColumnSchema]) -> Vec<SchemaNode> {
    let mut roots = Vec::new();
    for leaf in leaves {
        insert_leaf(&mut roots, &leaf.path, &leaf.repetition_path, leaf.physical_type, 0);
    }
    roots
}

fn insert_leaf(
    siblings: &mut Vec<SchemaNode>,
    path: &[String],
    reps: &[Repetition],
    physical_type: PhysicalType,
    depth: usize,
) {
    let name = &path[depth];
    let is_leaf = depth == path.len() - 1;
    if let Some(existing) = siblings.iter_mut().find(|n| match n {
        SchemaNode::Leaf { name: n, .. } | SchemaNode::Group { name: n, .. } => n == name,
    }) {
        if let SchemaNode::Group { children, .. } = existing {
            insert_leaf(children, path, reps, physical_type, depth + 1);
        }
        return;
    }
    if is_leaf {
        siblings.push(SchemaNode::Leaf {
            name: name.clone(),
            repetition: reps[depth],
            physical_type,
        });
    } else {
        let mut children = Vec::new();
        insert_leaf(&mut children, path, reps, physical_type, depth + 1);
        siblings.push(SchemaNode::Group {
            name: name.clone(),
            repetition: reps[depth],
            children,
        });
    }
}

fn flatten_to_thrift(nodes: &[SchemaNode], out: &mut Vec<SchemaElement>) {
    for node in nodes {
        match node {
            SchemaNode::Leaf {
                name,
                repetition,
                physical_type,
            } => {
                let (type_, converted_type) = physical_type_to_thrift(*physical_type);
                out.push(SchemaElement {
                    type_: Some(type_),
                    type_length: None,
                    repetition_type: Some(repetition_to_thrift(*repetition)),
                    name: name.clone(),
                    num_children: None,
                    converted_type,
                    scale: None,
                    precision: None,
                    field_id: None,
                    logical_type: None,
                });
            }
            SchemaNode::Group {
                name,
                repetition,
                children,
            } => {
                out.push(SchemaElement {
                    type_: None,
                    type_length: None,
                    repetition_type: Some(repetition_to_thrift(*repetition)),
                    name: name.clone(),
                    num_children: Some(children.len() as i32),
                    converted_type: None,
                    scale: None,
                    precision: None,
                    field_id: None,
                    logical_type: None,
                });
                flatten_to_thrift(children, out);
            }
        }
    }
}

fn parse_node(
    elements: &[SchemaElement],
    pos: usize,
    mut path: Vec<String>,
    mut reps: Vec<Repetition>,
    leaves: &mut Vec<ColumnSchema>,
) -> Result<usize> {
    let element = elements.get(pos).ok_or_else(|| {
        Error::SchemaViolation(
            "schema element list truncated before the declared child count".to_string(),
        )
    })?;
    path.push(element.name.clone());
    let repetition_type = element.repetition_type.ok_or_else(|| {
        Error::SchemaViolation(format!("element '{}' has no repetition", element.name))
    })?;
    reps.push(thrift_to_repetition(repetition_type));
    let mut pos = pos + 1;

    if let Some(num_children) = element.num_children {
        for _ in 0..num_children {
            pos = parse_node(elements, pos, path.clone(), reps.clone(), leaves)?;
        }
        Ok(pos)
    } else {
        let type_ = element.type_.ok_or_else(|| {
            Error::SchemaViolation(format!("leaf '{}' has no physical type", element.name))
        })?;
        let physical_type = thrift_to_physical_type(type_, element.converted_type)?;
        leaves.push(ColumnSchema::new(path, physical_type, reps));
        Ok(pos)
    }
}

pub(crate) fn physical_type_to_thrift(t: PhysicalType) -> (Type, Option<ConvertedType>) {
    match t {
        PhysicalType::Bool => (Type::BOOLEAN, None),
        PhysicalType::Int32 => (Type::INT32, None),
        PhysicalType::Int64 => (Type::INT64, None),
        PhysicalType::UInt32 => (Type::INT32, Some(ConvertedType::UINT_32)),
        PhysicalType::UInt64 => (Type::INT64, Some(ConvertedType::UINT_64)),
        PhysicalType::Float32 => (Type::FLOAT, None),
        PhysicalType::Float64 => (Type::DOUBLE, None),
        PhysicalType::ByteArray => (Type::BYTE_ARRAY, None),
    }
}

fn thrift_to_physical_type(
    t: Type,
    converted_type: Option<ConvertedType>,
) -> Result<PhysicalType> {
    Ok(match (t, converted_type) {
        (Type::BOOLEAN, _) => PhysicalType::Bool,
        (Type::INT32, Some(ConvertedType::UINT_32)) => PhysicalType::UInt32,
        (Type::INT32, _) => PhysicalType::Int32,
        (Type::INT64, Some(ConvertedType::UINT_64)) => PhysicalType::UInt64,
        (Type::INT64, _) => PhysicalType::Int64,
        (Type::FLOAT, _) => PhysicalType::Float32,
        (Type::DOUBLE, _) => PhysicalType::Float64,
        (Type::BYTE_ARRAY, _) => PhysicalType::ByteArray,
        (other, _) => {
            return Err(Error::SchemaViolation(format!(
                "unsupported physical type {other:?}"
            )))
        }
    })
}

fn repetition_to_thrift(r: Repetition) -> FieldRepetitionType {
    match r {
        Repetition::Required => FieldRepetitionType::REQUIRED,
        Repetition::Optional => FieldRepetitionType::OPTIONAL,
        Repetition::Repeated => FieldRepetitionType::REPEATED,
    }
}

fn thrift_to_repetition(r: FieldRepetitionType) -> Repetition {
    match r {
        FieldRepetitionType::REQUIRED => Repetition::Required,
        FieldRepetitionType::OPTIONAL => Repetition::Optional,
        FieldRepetitionType::REPEATED => Repetition::Repeated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_def_and_rep_for_repeated_optional_path() {
        let col = ColumnSchema::new(
            vec!["link".to_string(), "forward".to_string()],
            PhysicalType::Int64,
            vec![Repetition::Optional, Repetition::Repeated],
        );
        assert_eq!(col.max_def(), 2);
        assert_eq!(col.max_rep(), 1);
    }

    #[test]
    fn bit_width_table() {
        assert_eq!(ColumnSchema::bit_width(0), 0);
        assert_eq!(ColumnSchema::bit_width(1), 1);
        assert_eq!(ColumnSchema::bit_width(2), 2);
        assert_eq!(ColumnSchema::bit_width(3), 2);
        assert_eq!(ColumnSchema::bit_width(4), 3);
    }

    #[test]
    fn schema_round_trips_through_thrift() {
        let schema = SchemaDescriptor::new(vec![
            ColumnSchema::new(
                vec!["id".to_string()],
                PhysicalType::Int32,
                vec![Repetition::Required],
            ),
            ColumnSchema::new(
                vec!["name".to_string()],
                PhysicalType::ByteArray,
                vec![Repetition::Optional],
            ),
        ]);
        let elements = schema.to_thrift();
        assert_eq!(elements[0].name, ROOT_NAME);
        assert_eq!(elements[0].num_children, Some(2));

        let decoded = SchemaDescriptor::try_from_thrift(&elements).unwrap();
        assert_eq!(decoded.leaves()[0].physical_type, PhysicalType::Int32);
        assert_eq!(decoded.leaves()[1].physical_type, PhysicalType::ByteArray);
    }

    #[test]
    fn nested_paths_with_shared_prefix_round_trip_through_thrift() {
        // Two leaves sharing the "link" group prefix.
        let schema = SchemaDescriptor::new(vec![
            ColumnSchema::new(
                vec!["link".to_string(), "forward".to_string()],
                PhysicalType::Int64,
                vec![Repetition::Optional, Repetition::Repeated],
            ),
            ColumnSchema::new(
                vec!["link".to_string(), "backward".to_string()],
                PhysicalType::Int64,
                vec![Repetition::Optional, Repetition::Repeated],
            ),
            ColumnSchema::new(
                vec!["name".to_string()],
                PhysicalType::ByteArray,
                vec![Repetition::Optional],
            ),
        ]);

        let elements = schema.to_thrift();
        assert_eq!(elements[0].name, ROOT_NAME);
        assert_eq!(elements[0].num_children, Some(2)); // "link" group + "name" leaf
        assert_eq!(elements[1].name, "link");
        assert_eq!(elements[1].num_children, Some(2)); // forward + backward

        let decoded = SchemaDescriptor::try_from_thrift(&elements).unwrap();
        assert_eq!(decoded.leaves().len(), 3);
        assert_eq!(
            decoded.leaves()[0].path,
            vec!["link".to_string(), "forward".to_string()]
        );
        assert_eq!(decoded.leaves()[0].repetition_path, schema.leaves()[0].repetition_path);
        assert_eq!(
            decoded.leaves()[1].path,
            vec!["link".to_string(), "backward".to_string()]
        );
        assert_eq!(decoded.leaves()[2].path, vec!["name".to_string()]);
        assert_eq!(decoded, schema);
    }
}
