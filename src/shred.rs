//! Dremel-style record shredding: walks a [`Value`] record against a
//! [`SchemaDescriptor`] and emits, for each leaf column, a stream of `(value?, def, rep)` triples.
//!
//! Each leaf is walked independently, end to end, before the next leaf is considered; no state is
//! shared across leaves or across records.

use crate::error::{Error, Result};
use crate::schema::{ColumnSchema, SchemaDescriptor};
use crate::value::{Repetition, Value};

/// One shredded triple: the leaf value if present, its definition level, and its repetition
/// level.
pub type Triple = (Option<Value>, u16, u16);

/// Shreds one record into `out`, one `Vec<Triple>` per schema leaf in schema order. `out` must
/// already have one (possibly non-empty) `Vec` per leaf, in the same order as
/// `schema.leaves()`.
pub fn shred_record(record: &Value, schema: &SchemaDescriptor, out: &mut [Vec<Triple>]) -> Result<()> {
    assert_eq!(out.len(), schema.leaves().len());
    for (column, buffer) in schema.leaves().iter().zip(out.iter_mut()) {
        step(Some(record), column, 0, 0, 0, buffer)?;
    }
    Ok(())
}

/// Shreds every record in `records` into one `Vec<Triple>` per leaf.
pub fn shred_records(records: &[Value], schema: &SchemaDescriptor) -> Result<Vec<Vec<Triple>>> {
    let mut columns: Vec<Vec<Triple>> = schema.leaves().iter().map(|_| Vec::new()).collect();
    for record in records {
        shred_record(record, schema, &mut columns)?;
    }
    Ok(columns)
}

fn step(
    container: Option<&Value>,
    column: &ColumnSchema,
    idx: usize,
    def: u16,
    rep: u16,
    out: &mut Vec<Triple>,
) -> Result<()> {
    let name = &column.path[idx];
    let repetition = column.repetition_path[idx];
    let is_leaf = idx == column.path.len() - 1;

    let field_value = match container {
        None => None,
        Some(v) => v.field(name),
    };

    match repetition {
        Repetition::Required => {
            let value = field_value.ok_or_else(|| {
                Error::SchemaViolation(format!(
                    "required field '{name}' missing at path {:?}",
                    column.path
                ))
            })?;
            descend(value, column, idx, is_leaf, def, rep, out)
        }
        Repetition::Optional => match field_value {
            None => {
                out.push((None, def, rep));
                Ok(())
            }
            Some(value) => descend(value, column, idx, is_leaf, def + 1, rep, out),
        },
        Repetition::Repeated => {
            let depth = column.repetition_path[..=idx]
                .iter()
                .filter(|r| matches!(r, Repetition::Repeated))
                .count() as u16;
            let items = match field_value {
                None => None,
                Some(Value::List(items)) => Some(items),
                Some(_) => {
                    return Err(Error::SchemaViolation(format!(
                        "field '{name}' at path {:?} expected a list",
                        column.path
                    )))
                }
            };
            match items {
                None => {
                    out.push((None, def, rep));
                    Ok(())
                }
                Some(items) if items.is_empty() => {
                    out.push((None, def, rep));
                    Ok(())
                }
                Some(items) => {
                    for (i, item) in items.iter().enumerate() {
                        let child_rep = if i == 0 { rep } else { depth };
                        descend(item, column, idx, is_leaf, def + 1, child_rep, out)?;
                    }
                    Ok(())
                }
            }
        }
    }
}

fn descend(
    value: &Value,
    column: &ColumnSchema,
    idx: usize,
    is_leaf: bool,
    def: u16,
    rep: u16,
    out: &mut Vec<Triple>,
) -> Result<()> {
    if is_leaf {
        if value.physical_type() != Some(column.physical_type) {
            return Err(Error::SchemaViolation(format!(
                "leaf at path {:?} expected {:?}, found {:?}",
                column.path,
                column.physical_type,
                value.physical_type()
            )));
        }
        out.push((Some(value.clone()), def, rep));
        Ok(())
    } else {
        step(Some(value), column, idx + 1, def, rep, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::PhysicalType;

    fn required_int32_schema() -> SchemaDescriptor {
        SchemaDescriptor::new(vec![ColumnSchema::new(
            vec!["id".to_string()],
            PhysicalType::Int32,
            vec![Repetition::Required],
        )])
    }

    #[test]
    fn required_flat_column_has_zero_levels() {
        let schema = required_int32_schema();
        let records = vec![
            Value::Group(vec![("id".to_string(), Value::Int32(1))]),
            Value::Group(vec![("id".to_string(), Value::Int32(2))]),
            Value::Group(vec![("id".to_string(), Value::Int32(3))]),
        ];
        let columns = shred_records(&records, &schema).unwrap();
        assert_eq!(columns.len(), 1);
        assert_eq!(
            columns[0],
            vec![
                (Some(Value::Int32(1)), 0, 0),
                (Some(Value::Int32(2)), 0, 0),
                (Some(Value::Int32(3)), 0, 0),
            ]
        );
    }

    #[test]
    fn optional_flat_column_carries_def_level() {
        let schema = SchemaDescriptor::new(vec![ColumnSchema::new(
            vec!["id".to_string()],
            PhysicalType::Int32,
            vec![Repetition::Optional],
        )]);
        let records = vec![
            Value::Group(vec![("id".to_string(), Value::Int32(10))]),
            Value::Group(vec![]),
            Value::Group(vec![("id".to_string(), Value::Int32(20))]),
        ];
        let columns = shred_records(&records, &schema).unwrap();
        assert_eq!(
            columns[0],
            vec![
                (Some(Value::Int32(10)), 1, 0),
                (None, 0, 0),
                (Some(Value::Int32(20)), 1, 0),
            ]
        );
    }

    #[test]
    fn nested_optional_string_carries_def_level_per_ancestor() {
        let schema = SchemaDescriptor::new(vec![ColumnSchema::new(
            vec!["hobby".to_string(), "name".to_string()],
            PhysicalType::ByteArray,
            vec![Repetition::Optional, Repetition::Optional],
        )]);
        let records = vec![
            Value::Group(vec![(
                "hobby".to_string(),
                Value::Group(vec![("name".to_string(), Value::str("x"))]),
            )]),
            Value::Group(vec![]),
            Value::Group(vec![("hobby".to_string(), Value::Group(vec![]))]),
        ];
        let columns = shred_records(&records, &schema).unwrap();
        assert_eq!(
            columns[0],
            vec![(Some(Value::str("x")), 2, 0), (None, 0, 0), (None, 1, 0)]
        );
    }

    #[test]
    fn repeated_int64_carries_rep_level_per_item() {
        let schema = SchemaDescriptor::new(vec![ColumnSchema::new(
            vec!["link".to_string(), "forward".to_string()],
            PhysicalType::Int64,
            vec![Repetition::Optional, Repetition::Repeated],
        )]);
        let records = vec![
            Value::Group(vec![(
                "link".to_string(),
                Value::Group(vec![("forward".to_string(), Value::List(vec![]))]),
            )]),
            Value::Group(vec![(
                "link".to_string(),
                Value::Group(vec![(
                    "forward".to_string(),
                    Value::List(vec![Value::Int64(7), Value::Int64(8), Value::Int64(9)]),
                )]),
            )]),
        ];
        let columns = shred_records(&records, &schema).unwrap();
        let defs: Vec<u16> = columns[0].iter().map(|(_, d, _)| *d).collect();
        let reps: Vec<u16> = columns[0].iter().map(|(_, _, r)| *r).collect();
        assert_eq!(defs, vec![1, 2, 2, 2]);
        assert_eq!(reps, vec![0, 0, 1, 1]);
        let values: Vec<Value> = columns[0]
            .iter()
            .filter_map(|(v, _, _)| v.clone())
            .collect();
        assert_eq!(
            values,
            vec![Value::Int64(7), Value::Int64(8), Value::Int64(9)]
        );
    }

    #[test]
    fn required_field_absent_is_schema_violation() {
        let schema = required_int32_schema();
        let records = vec![Value::Group(vec![])];
        let err = shred_records(&records, &schema).unwrap_err();
        assert!(matches!(err, Error::SchemaViolation(_)));
    }
}
