//! Minimal CSV reader for the command line front end.
//!
//! The first record is the header. A column whose non-empty cells all parse
//! as numbers becomes numeric; anything else is text. Empty cells and `NA`
//! are missing.

use super::{Column, DataFrame};
use crate::error::{Error, Result};
use std::io::BufRead;

/// Read a CSV document into a data frame.
pub fn read_csv<R: BufRead>(reader: R) -> Result<DataFrame> {
    let mut records = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let fields = split_record(&line)
            .ok_or_else(|| Error::Data(format!("unterminated quote on line {}", lineno + 1)))?;
        records.push(fields);
    }

    let mut records = records.into_iter();
    let header = records
        .next()
        .ok_or_else(|| Error::Data("CSV input has no header".into()))?;
    let rows: Vec<Vec<String>> = records.collect();
    if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != header.len()) {
        return Err(Error::Data(format!(
            "record {} has {} fields, header has {}",
            i + 2,
            row.len(),
            header.len()
        )));
    }

    let mut df = DataFrame::new();
    for (j, name) in header.iter().enumerate() {
        let cells: Vec<Option<&str>> = rows
            .iter()
            .map(|r| {
                let cell = r[j].trim();
                (!cell.is_empty() && cell != "NA").then_some(cell)
            })
            .collect();
        df.insert(name.trim(), infer_column(&cells))?;
    }
    Ok(df)
}

fn infer_column(cells: &[Option<&str>]) -> Column {
    let numbers: Option<Vec<f64>> = cells
        .iter()
        .map(|c| match c {
            Some(s) => s.parse::<f64>().ok(),
            None => Some(f64::NAN),
        })
        .collect();
    match numbers {
        Some(v) => Column::Number(v),
        None => Column::Text(cells.iter().map(|c| c.map(str::to_string)).collect()),
    }
}

/// Split one record on commas, honoring double quotes.
fn split_record(line: &str) -> Option<Vec<String>> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    if in_quotes {
        return None;
    }
    fields.push(current);
    Some(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataValue;

    #[test]
    fn test_read_csv_infers_types() {
        let text = "a,b,label\n1,2.5,x\n2,NA,\"y, z\"\n";
        let df = read_csv(text.as_bytes()).unwrap();
        assert_eq!(df.nrow(), 2);
        assert_eq!(df.numbers("a").unwrap(), &[1.0, 2.0]);
        assert!(df.numbers("b").unwrap()[1].is_nan());
        assert_eq!(df.get("label").unwrap().get(1), DataValue::from("y, z"));
    }

    #[test]
    fn test_ragged_record_is_an_error() {
        assert!(read_csv("a,b\n1\n".as_bytes()).is_err());
        assert!(read_csv("".as_bytes()).is_err());
    }
}
