//! Dremel-style record assembly: the inverse of [`crate::shred`]. Consumes
//! each leaf's flat `(value?, def, rep)` triple stream and rebuilds [`Value`] records, allocating
//! intermediate containers exactly where definition levels require.

use crate::error::{Error, Result};
use crate::schema::{ColumnSchema, SchemaDescriptor};
use crate::shred::Triple;
use crate::value::{Repetition, Value};

/// Reassembles one record per `rep == 0` boundary across every leaf's triple stream. `columns`
/// must have one entry per `schema.leaves()`, in the same order.
pub fn assemble_records(schema: &SchemaDescriptor, columns: &[Vec<Triple>]) -> Result<Vec<Value>> {
    assert_eq!(columns.len(), schema.leaves().len());

    let per_column: Vec<Vec<&[Triple]>> = columns.iter().map(|c| split_into_records(c)).collect();
    let num_records = per_column.first().map(|r| r.len()).unwrap_or(0);
    for recs in &per_column {
        if recs.len() != num_records {
            return Err(Error::SchemaViolation(
                "columns disagree on the number of records in this row group".to_string(),
            ));
        }
    }

    let mut records = Vec::with_capacity(num_records);
    for r in 0..num_records {
        let mut root = Value::Group(Vec::new());
        for (column, col_records) in schema.leaves().iter().zip(per_column.iter()) {
            for (value, def, rep) in col_records[r] {
                let mut budget = *def;
                place(&mut root, column, 0, &mut budget, *rep, value.as_ref());
            }
        }
        records.push(root);
    }
    Ok(records)
}

/// Splits a column's flat triple stream into per-record runs: a `rep == 0` triple starts a new
/// run, every following `rep > 0` triple continues it.
fn split_into_records(triples: &[Triple]) -> Vec<&[Triple]> {
    let mut result = Vec::new();
    if triples.is_empty() {
        return result;
    }
    let mut start = 0;
    for i in 1..triples.len() {
        if triples[i].2 == 0 {
            result.push(&triples[start..i]);
            start = i;
        }
    }
    result.push(&triples[start..]);
    result
}

fn place(
    container: &mut Value,
    column: &ColumnSchema,
    idx: usize,
    budget: &mut u16,
    rep: u16,
    value: Option<&Value>,
) {
    let name = &column.path[idx];
    let repetition = column.repetition_path[idx];
    let is_leaf = idx == column.path.len() - 1;

    match repetition {
        Repetition::Required => {
            if is_leaf {
                set_leaf(container, name, value);
            } else {
                let child = get_or_insert(container, name, || Value::Group(Vec::new()));
                place(child, column, idx + 1, budget, rep, value);
            }
        }
        Repetition::Optional => {
            if *budget == 0 {
                return; // leave the field absent.
            }
            *budget -= 1;
            if is_leaf {
                set_leaf(container, name, value);
            } else {
                let child = get_or_insert(container, name, || Value::Group(Vec::new()));
                place(child, column, idx + 1, budget, rep, value);
            }
        }
        Repetition::Repeated => {
            if *budget == 0 {
                get_or_insert(container, name, || Value::List(Vec::new()));
                return;
            }
            *budget -= 1;

            let depth = column.repetition_path[..=idx]
                .iter()
                .filter(|r| matches!(r, Repetition::Repeated))
                .count() as u16;

            let list = match get_or_insert(container, name, || Value::List(Vec::new())) {
                Value::List(items) => items,
                _ => unreachable!("a repeated field's slot is always a list"),
            };

            if depth < rep {
                let last = list
                    .last_mut()
                    .expect("a continuation always implies a prior element");
                if is_leaf {
                    unreachable!(
                        "a repeated leaf's own depth always equals max_rep, so reuse (depth < rep) is unreachable for it"
                    );
                }
                place(last, column, idx + 1, budget, rep, value);
            } else if is_leaf {
                list.push(value.cloned().unwrap_or(Value::Null));
            } else {
                list.push(Value::Group(Vec::new()));
                let new_last = list.last_mut().unwrap();
                place(new_last, column, idx + 1, budget, rep, value);
            }
        }
    }
}

fn group_fields_mut(container: &mut Value) -> &mut Vec<(String, Value)> {
    match container {
        Value::Group(fields) => fields,
        _ => unreachable!("the assembler only ever descends into Group containers"),
    }
}

fn get_or_insert<'a>(
    container: &'a mut Value,
    name: &str,
    default: impl FnOnce() -> Value,
) -> &'a mut Value {
    let fields = group_fields_mut(container);
    if let Some(pos) = fields.iter().position(|(n, _)| n == name) {
        &mut fields[pos].1
    } else {
        fields.push((name.to_string(), default()));
        &mut fields.last_mut().unwrap().1
    }
}

fn set_leaf(container: &mut Value, name: &str, value: Option<&Value>) {
    let fields = group_fields_mut(container);
    let v = value.cloned().unwrap_or(Value::Null);
    if let Some(pos) = fields.iter().position(|(n, _)| n == name) {
        fields[pos].1 = v;
    } else {
        fields.push((name.to_string(), v));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::PhysicalType;

    #[test]
    fn round_trips_repeated_int64_lists() {
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

        let columns = crate::shred::shred_records(&records, &schema).unwrap();
        let reassembled = assemble_records(&schema, &columns).unwrap();
        assert_eq!(reassembled, records);
    }

    #[test]
    fn round_trips_doubly_nested_repeated_lists() {
        // a: [[1, 2], [3]] shredded through a schema where both "a" and "b" are repeated.
        let schema = SchemaDescriptor::new(vec![ColumnSchema::new(
            vec!["a".to_string(), "b".to_string()],
            PhysicalType::Int32,
            vec![Repetition::Repeated, Repetition::Repeated],
        )]);
        let record = Value::Group(vec![(
            "a".to_string(),
            Value::List(vec![
                Value::Group(vec![(
                    "b".to_string(),
                    Value::List(vec![Value::Int32(1), Value::Int32(2)]),
                )]),
                Value::Group(vec![("b".to_string(), Value::List(vec![Value::Int32(3)]))]),
            ]),
        )]);

        let columns = crate::shred::shred_records(std::slice::from_ref(&record), &schema).unwrap();
        let reassembled = assemble_records(&schema, &columns).unwrap();
        assert_eq!(reassembled, vec![record]);
    }

    #[test]
    fn round_trips_nested_optional_string() {
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

        let columns = crate::shred::shred_records(&records, &schema).unwrap();
        let reassembled = assemble_records(&schema, &columns).unwrap();
        assert_eq!(reassembled, records);
    }
}
