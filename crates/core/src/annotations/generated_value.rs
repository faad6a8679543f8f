//! `@GeneratedValue` parameters:
//!
//! - `GeneratedValue(AUTO)`
//! - `GeneratedValue(IDENTITY)`
//! - `GeneratedValue(SEQUENCE, GeneratorName, SequenceName [, AllocationSize])`
//! - `GeneratedValue(TABLE, GeneratorName, TableName [, PkColumnName, PkColumnValue, ValueColumnName [, AllocationSize]])`

use crate::model::{GeneratedValue, GenerationStrategy};

pub(super) fn validate(list: &[String]) -> Result<(), String> {
    let Some(first) = list.first() else {
        return Err("invalid parameter ('strategy' is required)".to_owned());
    };
    let strategy = GenerationStrategy::from_name(first)
        .ok_or_else(|| format!("invalid strategy '{}'", first))?;
    let n = list.len();
    match strategy {
        GenerationStrategy::Sequence if n != 3 && n != 4 => {
            Err("invalid number of parameters for 'SEQUENCE'".to_owned())
        }
        GenerationStrategy::Table if n != 3 && n != 6 && n != 7 => {
            Err("invalid number of parameters for 'TABLE'".to_owned())
        }
        _ => Ok(()),
    }
}

/// Build the generated value description from a validated parameter list.
pub(super) fn build(list: &[String]) -> Result<GeneratedValue, String> {
    let first = list.first().map(String::as_str).unwrap_or_default();
    let strategy = GenerationStrategy::from_name(first)
        .ok_or_else(|| format!("invalid strategy '{}'", first))?;
    let mut gv = GeneratedValue::new(strategy);
    let at = |i: usize| list.get(i).cloned();

    match strategy {
        GenerationStrategy::Auto | GenerationStrategy::Identity => {}
        GenerationStrategy::Sequence => {
            gv.generator_name = at(1);
            gv.sequence_name = at(2);
            if let Some(size) = list.get(3) {
                gv.allocation_size = Some(allocation_size(size)?);
            }
        }
        GenerationStrategy::Table => {
            gv.generator_name = at(1);
            gv.table_name = at(2);
            if list.len() >= 6 {
                gv.pk_column_name = at(3);
                gv.pk_column_value = at(4);
                gv.value_column_name = at(5);
            }
            if let Some(size) = list.get(6) {
                gv.allocation_size = Some(allocation_size(size)?);
            }
        }
    }
    Ok(gv)
}

fn allocation_size(s: &str) -> Result<i64, String> {
    s.parse()
        .map_err(|_| format!("invalid allocation size '{}' (integer expected)", s))
}
