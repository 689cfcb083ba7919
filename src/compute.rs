use crate::data::Record;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Recognize a plain numeric cell: a signed number with at most one `.` or
/// `,` decimal separator. Returns the parsed value and the byte position of
/// the separator, if any. Grouped spellings like `1,234.56` carry several
/// separators and are not plain numbers, so they keep their original form.
pub(crate) fn parse_value(field: &str) -> Option<(Decimal, Option<usize>)> {
    let mut separators = field
        .char_indices()
        .filter(|(_, c)| *c == '.' || *c == ',')
        .map(|(i, _)| i);
    let separator = separators.next();
    if separators.next().is_some() {
        return None;
    }
    let canonical: String = field
        .chars()
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    let value = Decimal::from_str(&canonical).ok()?;
    Some((value, separator))
}

/// Rewrite a numeric cell with the requested decimal mark. `None` when the
/// cell is not a plain number or carries no fractional part, in which case
/// the caller keeps the original text. Substituting an already matching
/// mark reproduces the input unchanged.
pub(crate) fn with_decimal_mark(field: &str, mark: char) -> Option<String> {
    let (_, separator) = parse_value(field)?;
    let at = separator?;
    let mut out = String::with_capacity(field.len() + mark.len_utf8());
    out.push_str(&field[..at]);
    out.push(mark);
    out.push_str(&field[at + 1..]);
    Some(out)
}

/// For a run of records, which columns hold one single value throughout.
/// Those columns collapse into one merged cell when the run is rendered.
/// Columns a record does not carry count as empty.
pub(crate) fn uniform_columns(records: &[&Record], width: usize) -> Vec<bool> {
    (0..width)
        .map(|col| {
            let mut values = records.iter().map(|rec| rec.field(col));
            match values.next() {
                Some(first) => values.all(|value| value == first),
                None => true,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn plain_decimal_comma_parses() {
        let (value, separator) = parse_value("1234,56").unwrap();
        assert_eq!(value, dec!(1234.56));
        assert_eq!(separator, Some(4));
    }

    #[test]
    fn integer_parses_without_separator() {
        let (value, separator) = parse_value("-250").unwrap();
        assert_eq!(value, dec!(-250));
        assert_eq!(separator, None);
    }

    #[test]
    fn grouped_number_is_not_plain() {
        assert!(parse_value("1,234.56").is_none());
    }

    #[test]
    fn text_is_not_numeric() {
        assert!(parse_value("Amount").is_none());
        assert!(parse_value("").is_none());
        assert!(parse_value("12,5 EUR").is_none());
    }

    #[test]
    fn substitutes_comma_with_dot() {
        assert_eq!(with_decimal_mark("1234,56", '.').as_deref(), Some("1234.56"));
        assert_eq!(with_decimal_mark("-0.5", ',').as_deref(), Some("-0,5"));
    }

    #[test]
    fn substitution_is_idempotent() {
        let once = with_decimal_mark("1234,56", '.').unwrap();
        assert_eq!(with_decimal_mark(&once, '.').as_deref(), Some(once.as_str()));
    }

    #[test]
    fn integers_and_text_are_left_alone() {
        assert_eq!(with_decimal_mark("1234", '.'), None);
        assert_eq!(with_decimal_mark("Widget", '.'), None);
        assert_eq!(with_decimal_mark("1,234.56", ','), None);
    }

    fn record(fields: &[&str]) -> Record {
        Record {
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }

    #[test]
    fn uniform_columns_over_a_run() {
        let a = record(&["42", "Widget", "10"]);
        let b = record(&["42", "Gadget", "10"]);
        let run = [&a, &b];
        assert_eq!(uniform_columns(&run, 3), vec![true, false, true]);
    }

    #[test]
    fn ragged_records_compare_missing_as_empty() {
        let a = record(&["42", "Widget", "10", "x"]);
        let b = record(&["42", "Widget", "10"]);
        let run = [&a, &b];
        assert_eq!(uniform_columns(&run, 4), vec![true, true, true, false]);
    }

    #[test]
    fn single_record_is_fully_uniform() {
        let a = record(&["42", "Widget", "10"]);
        let run = [&a];
        assert_eq!(uniform_columns(&run, 3), vec![true, true, true]);
    }
}
