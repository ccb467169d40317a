//! Aesthetic evaluation and grouping.

use super::aes::AesExpr;
use super::expr::{Environment, Expr, Namespace, Value};
use crate::data::{ninteraction, Column, DataFrame};
use crate::error::{Error, Result};

/// Group id meaning "no grouping requested".
pub const NO_GROUP: i64 = -1;

/// Aesthetics that never define groups.
const NON_GROUPING: &[&str] = &["label", "PANEL"];

/// Evaluate aesthetic sources against a data frame.
///
/// Returns one column per aesthetic. Column references are copied
/// verbatim; other strings are parsed and evaluated with columns shadowing
/// `env`. Scalars broadcast to every row, or become a single row when the
/// data is empty and every source is scalar. With empty data, the first
/// list or column longer than one sets the row count.
pub fn evaluate<'a, I>(entries: I, data: &DataFrame, env: &Environment) -> Result<DataFrame>
where
    I: IntoIterator<Item = (&'a str, &'a AesExpr)>,
{
    let mut n = data.nrow();
    let ns = Namespace::new(data, env);
    let mut results: Vec<(&str, Value)> = Vec::new();

    for (ae, source) in entries {
        let value = match source {
            AesExpr::Expr(text) => match data.get(text) {
                Some(col) => Value::Column(col.clone()),
                None => Expr::parse(text)
                    .and_then(|e| e.eval(&ns))
                    .map_err(|cause| eval_error(ae, source, cause))?,
            },
            AesExpr::Literal(v) => Value::Scalar(v.clone()),
            AesExpr::Values(values) => match values.len() {
                1 => Value::Scalar(values[0].clone()),
                len if len == n || n == 0 => {
                    n = len;
                    Column::from_values(values)
                        .map(Value::Column)
                        .map_err(|e| eval_error(ae, source, e.to_string()))?
                }
                _ => {
                    return Err(eval_error(
                        ae,
                        source,
                        "Aesthetics must either be length one, or the same length as the data"
                            .to_string(),
                    ))
                }
            },
            AesExpr::Func { f, .. } => f(&ns).map_err(|cause| eval_error(ae, source, cause))?,
        };
        let value = match value {
            Value::Column(c) if c.len() == 1 && n != 1 => Value::Scalar(c.get(0)),
            Value::Column(c) if n == 0 => {
                n = c.len();
                Value::Column(c)
            }
            Value::Column(c) if c.len() != n => {
                return Err(eval_error(
                    ae,
                    source,
                    format!(
                        "the result has {} values but the data has {n} rows",
                        c.len()
                    ),
                ))
            }
            other => other,
        };
        results.push((ae, value));
    }

    let all_scalar = results.iter().all(|(_, v)| matches!(v, Value::Scalar(_)));
    let nrow = if n == 0 && all_scalar && !results.is_empty() {
        1
    } else {
        n
    };

    let mut out = DataFrame::new();
    for (ae, value) in results {
        let col = match value {
            Value::Scalar(v) => Column::broadcast(&v, nrow),
            Value::Column(c) => c,
        };
        out.insert(ae, col)?;
    }
    tracing::trace!(rows = out.nrow(), aesthetics = out.ncol(), "aesthetics evaluated");
    Ok(out)
}

fn eval_error(ae: &str, source: &AesExpr, cause: String) -> Error {
    Error::Evaluation {
        aesthetic: ae.to_string(),
        expr: source.describe(),
        cause,
    }
}

/// Assign the `group` column.
///
/// An explicit group mapping is renumbered; otherwise the interaction of
/// all discrete columns defines groups, and without discrete columns every
/// row gets [`NO_GROUP`].
pub fn add_group(data: &mut DataFrame) -> Result<()> {
    if data.is_empty() {
        return Ok(());
    }
    let n = data.nrow();
    let ids: Vec<f64> = if let Some(group) = data.get("group") {
        ninteraction(&[group], n).into_iter().map(|i| i as f64).collect()
    } else {
        let discrete: Vec<&Column> = data
            .iter()
            .filter(|(name, col)| col.is_discrete() && !NON_GROUPING.contains(name))
            .map(|(_, col)| col)
            .collect();
        if discrete.is_empty() {
            vec![NO_GROUP as f64; n]
        } else {
            ninteraction(&discrete, n)
                .into_iter()
                .map(|i| i as f64)
                .collect()
        }
    };
    data.insert("group", Column::Number(ids))
}

/// Replace or add every column of `new` in `data`.
///
/// When `data` has no columns it simply becomes `new`.
pub fn merge_columns(data: &mut DataFrame, new: DataFrame) -> Result<()> {
    if data.ncol() == 0 {
        *data = new;
        return Ok(());
    }
    for (name, col) in new.iter() {
        data.insert(name, col.clone())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataValue;
    use crate::grammar::aes::Aes;

    fn data() -> DataFrame {
        DataFrame::new()
            .with_column("a", vec![1.0, 2.0, 3.0])
            .unwrap()
            .with_column("b", vec![10.0, 20.0, 30.0])
            .unwrap()
            .with_column("g", vec!["u", "v", "u"])
            .unwrap()
    }

    fn eval(aes: &Aes, df: &DataFrame) -> Result<DataFrame> {
        evaluate(aes.starts(), df, &Environment::new())
    }

    #[test]
    fn test_column_reference_copied() {
        let out = eval(&Aes::new().x("a").color("g"), &data()).unwrap();
        assert_eq!(out.numbers("x").unwrap(), &[1.0, 2.0, 3.0]);
        assert!(out.get("color").unwrap().is_discrete());
    }

    #[test]
    fn test_expression_and_scalar() {
        let out = eval(&Aes::new().y("b / a").size(2.0), &data()).unwrap();
        assert_eq!(out.numbers("y").unwrap(), &[10.0, 10.0, 10.0]);
        assert_eq!(out.numbers("size").unwrap(), &[2.0, 2.0, 2.0]);
    }

    #[test]
    fn test_environment_variables_are_shadowed_by_columns() {
        let env = Environment::new().with("a", 100.0).with("k", 5.0);
        let aes = Aes::new().x("a + k");
        let out = evaluate(aes.starts(), &data(), &env).unwrap();
        assert_eq!(out.numbers("x").unwrap(), &[6.0, 7.0, 8.0]);
    }

    #[test]
    fn test_bad_expression_names_aesthetic_and_text() {
        let err = eval(&Aes::new().y("b * nope"), &data()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("'y'"));
        assert!(msg.contains("b * nope"));
        assert!(msg.contains("nope"));
    }

    #[test]
    fn test_list_length_rules() {
        let ok = eval(&Aes::new().x(vec![5.0]), &data()).unwrap();
        assert_eq!(ok.numbers("x").unwrap(), &[5.0, 5.0, 5.0]);
        let ok = eval(&Aes::new().x(vec![1.0, 2.0, 3.0]), &data()).unwrap();
        assert_eq!(ok.nrow(), 3);
        let err = eval(&Aes::new().x(vec![1.0, 2.0]), &data()).unwrap_err();
        assert!(err.to_string().contains("length one, or the same length"));
    }

    #[test]
    fn test_lists_on_empty_data_set_row_count() {
        let aes = Aes::new().x(vec![1.0, 2.0, 3.0]).y(vec![4.0, 5.0, 6.0]).size(2.0);
        let out = eval(&aes, &DataFrame::new()).unwrap();
        assert_eq!(out.nrow(), 3);
        assert_eq!(out.numbers("y").unwrap(), &[4.0, 5.0, 6.0]);
        assert_eq!(out.numbers("size").unwrap(), &[2.0, 2.0, 2.0]);
        let err = eval(&Aes::new().x(vec![1.0, 2.0, 3.0]).y(vec![1.0, 2.0]), &DataFrame::new());
        assert!(err.is_err());
    }

    #[test]
    fn test_scalar_on_empty_data_is_one_row() {
        let out = eval(&Aes::new().y(3.0), &DataFrame::new()).unwrap();
        assert_eq!(out.nrow(), 1);
        assert_eq!(out.get("y").unwrap().get(0), DataValue::Number(3.0));
    }

    #[test]
    fn test_closure_source() {
        let aes = Aes::new().y(AesExpr::func("twice a", |ns| {
            let a = ns.column("a").and_then(Column::as_numbers).ok_or("no a")?;
            Ok(Value::from(a.iter().map(|v| v * 2.0).collect::<Vec<_>>()))
        }));
        let out = eval(&aes, &data()).unwrap();
        assert_eq!(out.numbers("y").unwrap(), &[2.0, 4.0, 6.0]);
    }

    #[test]
    fn test_add_group_from_discrete_columns() {
        let mut out = eval(&Aes::new().x("a").color("g"), &data()).unwrap();
        add_group(&mut out).unwrap();
        assert_eq!(out.numbers("group").unwrap(), &[1.0, 2.0, 1.0]);
    }

    #[test]
    fn test_add_group_without_discrete_columns() {
        let mut out = eval(&Aes::new().x("a").y("b"), &data()).unwrap();
        add_group(&mut out).unwrap();
        assert_eq!(out.numbers("group").unwrap(), &[-1.0, -1.0, -1.0]);
    }

    #[test]
    fn test_explicit_group_wins() {
        let mut out = eval(&Aes::new().x("a").color("g").group("b"), &data()).unwrap();
        add_group(&mut out).unwrap();
        assert_eq!(out.numbers("group").unwrap(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_label_does_not_group() {
        let mut out = eval(&Aes::new().x("a").label("g"), &data()).unwrap();
        add_group(&mut out).unwrap();
        assert_eq!(out.numbers("group").unwrap(), &[-1.0, -1.0, -1.0]);
    }
}
