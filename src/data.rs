use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

/// Account id -> owner name, loaded once per run and read-only afterwards.
pub(crate) type OwnerMap = HashMap<String, String>;

/// Canonical column layout of a data record. Column position implies the
/// semantic role; everything from `COL_VALUES` on is a value column
/// (amounts, limits, dates) and is the only region where decimal mark
/// substitution applies.
pub(crate) const COL_ACCOUNT: usize = 0;
pub(crate) const COL_DESCRIPTION: usize = 1;
pub(crate) const COL_VALUES: usize = 2;

/// A line only counts as a data record when its field count falls in
/// `MIN_FIELDS..=MAX_FIELDS`. Anything else is a structural line (report
/// preamble, totals, captions) and is passed through as a note.
pub(crate) const MIN_FIELDS: usize = 3;
pub(crate) const MAX_FIELDS: usize = 13;

/// One data row of the table, fields already trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Record {
    pub fields: Vec<String>,
}

impl Record {
    pub fn account(&self) -> &str {
        &self.fields[COL_ACCOUNT]
    }

    /// Field at `idx`, empty for columns this record does not carry.
    /// Records are ragged within the bounds, so the renderer always asks
    /// through here instead of indexing.
    pub fn field(&self, idx: usize) -> &str {
        self.fields.get(idx).map(String::as_str).unwrap_or("")
    }
}

/// A parsed input line: either a data record or a structural note that is
/// rendered as-is across the full table width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Row {
    Record(Record),
    Note(String),
}

/// Rows between two `*` marker lines.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct Section {
    pub rows: Vec<Row>,
}

/// Everything parsed out of one input file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct Report {
    pub sections: Vec<Section>,
}

impl Report {
    /// Add a section, dropping it when it holds no rows at all. Input files
    /// routinely end with a dangling marker line, which would otherwise
    /// leave an empty trailing section.
    pub fn push_section(&mut self, section: Section) {
        if !section.rows.is_empty() {
            self.sections.push(section);
        }
    }

    /// Widest data record in the report; the rendered table gets this many
    /// data columns. At least `MIN_FIELDS` so a report of only notes still
    /// renders a sensible header.
    pub fn width(&self) -> usize {
        self.sections
            .iter()
            .flat_map(|s| &s.rows)
            .filter_map(|row| match row {
                Row::Record(rec) => Some(rec.fields.len()),
                Row::Note(_) => None,
            })
            .max()
            .unwrap_or(MIN_FIELDS)
            .max(MIN_FIELDS)
    }
}

#[derive(Error, Debug)]
pub(crate) enum Error {
    #[error("owner entry {entry} must be a tab-separated account and owner")]
    OwnerEntry {
        entry: u64,
        #[source]
        source: csv::Error,
    },
    #[error("cannot read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fields: &[&str]) -> Record {
        Record {
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }

    #[test]
    fn missing_fields_read_as_empty() {
        let rec = record(&["42", "Widget", "1.5"]);
        assert_eq!(rec.field(2), "1.5");
        assert_eq!(rec.field(7), "");
        assert_eq!(rec.account(), "42");
    }

    #[test]
    fn empty_sections_are_dropped() {
        let mut report = Report::default();
        report.push_section(Section::default());
        report.push_section(Section {
            rows: vec![Row::Note("totals".into())],
        });
        assert_eq!(report.sections.len(), 1);
    }

    #[test]
    fn width_tracks_widest_record() {
        let mut report = Report::default();
        report.push_section(Section {
            rows: vec![
                Row::Record(record(&["1", "a", "2", "3"])),
                Row::Record(record(&["2", "b", "4", "5", "6"])),
            ],
        });
        assert_eq!(report.width(), 5);
    }

    #[test]
    fn width_of_note_only_report_is_minimum() {
        let mut report = Report::default();
        report.push_section(Section {
            rows: vec![Row::Note("preamble".into())],
        });
        assert_eq!(report.width(), MIN_FIELDS);
    }
}
