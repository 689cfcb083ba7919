use crate::compute::{uniform_columns, with_decimal_mark};
use crate::data::{
    OwnerMap, Record, Report, Row, Section, COL_ACCOUNT, COL_DESCRIPTION, COL_VALUES,
};
use std::io::Write;

/// Rendering knobs coming straight from the command line.
pub(crate) struct RenderOptions {
    /// Decimal mark to force into numeric cells; `None` leaves them as-is.
    pub decimal_mark: Option<char>,
    /// Flat variant: one plain row per record, owner next to the account,
    /// no merged cells. The default variant reproduces the merged review
    /// layout with blank workflow columns.
    pub flat: bool,
}

const REPORT_STYLE: &str = "\
      body { font-size: 8pt; font-family: sans-serif; }
      table { border-collapse: collapse; text-align: center; }
      thead { background-color: yellow; }
      th, td { border: 1px solid black; padding: 0 0.5em 0 0.5em; }
      td:hover { background-color: #C0C0FF; }
      tr.note td { text-align: left; font-style: italic; }
      tr.space { height: 1em; }
      footer { margin: 2em 0 1em 0; }
";

const FLAT_STYLE: &str = "\
      body { font-family: sans-serif; }
      table { border-collapse: collapse; }
      th, td { border: 1px solid #999999; padding: 0 0.5em; }
      tr.note td { text-align: left; }
";

/// Render a parsed report as one self-contained HTML document. Inline
/// styles only, so the file opens correctly wherever it is imported.
pub(crate) fn write_report<W: Write>(
    mut writer: W,
    title: &str,
    report: &Report,
    owners: &OwnerMap,
    opts: &RenderOptions,
) -> Result<(), anyhow::Error> {
    let width = report.width();
    let titles = column_titles(width, opts.flat);
    let total = titles.len();

    write_head(&mut writer, title, &titles, opts)?;
    for section in &report.sections {
        if opts.flat {
            write_section_flat(&mut writer, section, owners, opts, width, total)?;
        } else {
            write_section(&mut writer, section, owners, opts, width, total)?;
        }
    }
    write_tail(&mut writer, opts)?;
    writer.flush()?;
    Ok(())
}

fn column_titles(width: usize, flat: bool) -> Vec<String> {
    let mut titles: Vec<String> = (0..width).map(data_column_title).collect();
    if flat {
        titles.insert(1, "Owner".to_string());
    } else {
        titles.push("Status".to_string());
        titles.push("Approver".to_string());
        titles.push("Owner".to_string());
    }
    titles
}

fn data_column_title(idx: usize) -> String {
    match idx {
        COL_ACCOUNT => "Account".to_string(),
        COL_DESCRIPTION => "Description".to_string(),
        COL_VALUES => "Amount".to_string(),
        _ => format!("Value {}", idx + 1),
    }
}

fn write_head<W: Write>(
    w: &mut W,
    title: &str,
    titles: &[String],
    opts: &RenderOptions,
) -> std::io::Result<()> {
    let style = if opts.flat { FLAT_STYLE } else { REPORT_STYLE };
    writeln!(w, "<!DOCTYPE html>")?;
    writeln!(w, r#"<html lang="en" dir="ltr">"#)?;
    writeln!(w, "  <head>")?;
    writeln!(w, r#"    <meta charset="UTF-8">"#)?;
    writeln!(w, "    <title>{}</title>", escape(title))?;
    writeln!(w, "    <style>")?;
    write!(w, "{style}")?;
    writeln!(w, "    </style>")?;
    writeln!(w, "  </head>")?;
    writeln!(w, "  <body>")?;
    writeln!(w, "    <main>")?;
    writeln!(w, "      <table>")?;
    writeln!(w, "        <thead>")?;
    writeln!(w, "          <tr>")?;
    for title in titles {
        writeln!(w, "            <th>{}</th>", escape(title))?;
    }
    writeln!(w, "          </tr>")?;
    writeln!(w, "        </thead>")?;
    writeln!(w, "        <tbody>")?;
    Ok(())
}

fn write_tail<W: Write>(w: &mut W, opts: &RenderOptions) -> std::io::Result<()> {
    writeln!(w, "        </tbody>")?;
    writeln!(w, "      </table>")?;
    writeln!(w, "    </main>")?;
    if !opts.flat {
        writeln!(
            w,
            "    <footer>Formatted by {} {}.</footer>",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        )?;
    }
    writeln!(w, "  </body>")?;
    writeln!(w, "</html>")?;
    Ok(())
}

/// Merged review layout. Columns holding one value across a run of
/// consecutive records collapse into a single spanning cell; the owner
/// column follows the account column's merging. Notes break a run, so a
/// span never crosses one.
fn write_section<W: Write>(
    w: &mut W,
    section: &Section,
    owners: &OwnerMap,
    opts: &RenderOptions,
    width: usize,
    total: usize,
) -> std::io::Result<()> {
    let mut run: Vec<&Record> = Vec::new();
    for row in &section.rows {
        match row {
            Row::Record(rec) => run.push(rec),
            Row::Note(text) => {
                write_run(w, &run, owners, opts, width)?;
                run.clear();
                write_note(w, text, total)?;
            }
        }
    }
    write_run(w, &run, owners, opts, width)?;
    writeln!(
        w,
        r#"          <tr class="space"><td colspan="{total}"></td></tr>"#
    )?;
    Ok(())
}

fn write_run<W: Write>(
    w: &mut W,
    run: &[&Record],
    owners: &OwnerMap,
    opts: &RenderOptions,
    width: usize,
) -> std::io::Result<()> {
    if run.is_empty() {
        return Ok(());
    }
    let uniform = uniform_columns(run, width);
    let rowspan = run.len();
    for (i, rec) in run.iter().enumerate() {
        let first = i == 0;
        writeln!(w, "          <tr>")?;
        for col in 0..width {
            let value = cell_value(rec.field(col), col, opts);
            write_cell(w, first, rowspan, uniform[col], &value)?;
        }
        // Status and Approver stay blank, filled in by hand after import.
        write_cell(w, first, rowspan, true, "")?;
        write_cell(w, first, rowspan, true, "")?;
        let owner = owners.get(rec.account()).map(String::as_str).unwrap_or("");
        write_cell(w, first, rowspan, uniform[COL_ACCOUNT], owner)?;
        writeln!(w, "          </tr>")?;
    }
    Ok(())
}

fn write_cell<W: Write>(
    w: &mut W,
    first: bool,
    rowspan: usize,
    merged: bool,
    value: &str,
) -> std::io::Result<()> {
    if merged && first && rowspan > 1 {
        writeln!(
            w,
            r#"            <td rowspan="{rowspan}">{}</td>"#,
            escape(value)
        )
    } else if !merged || first {
        writeln!(w, "            <td>{}</td>", escape(value))
    } else {
        Ok(())
    }
}

/// Flat layout for clean spreadsheet import: account, owner, then the rest,
/// one row per record, nothing merged.
fn write_section_flat<W: Write>(
    w: &mut W,
    section: &Section,
    owners: &OwnerMap,
    opts: &RenderOptions,
    width: usize,
    total: usize,
) -> std::io::Result<()> {
    for row in &section.rows {
        match row {
            Row::Record(rec) => {
                writeln!(w, "          <tr>")?;
                writeln!(
                    w,
                    "            <td>{}</td>",
                    escape(rec.field(COL_ACCOUNT))
                )?;
                let owner = owners.get(rec.account()).map(String::as_str).unwrap_or("");
                writeln!(w, "            <td>{}</td>", escape(owner))?;
                for col in 1..width {
                    let value = cell_value(rec.field(col), col, opts);
                    writeln!(w, "            <td>{}</td>", escape(&value))?;
                }
                writeln!(w, "          </tr>")?;
            }
            Row::Note(text) => write_note(w, text, total)?,
        }
    }
    Ok(())
}

fn write_note<W: Write>(w: &mut W, text: &str, total: usize) -> std::io::Result<()> {
    writeln!(
        w,
        r#"          <tr class="note"><td colspan="{total}">{}</td></tr>"#,
        escape(text)
    )
}

fn cell_value(field: &str, col: usize, opts: &RenderOptions) -> String {
    if col >= COL_VALUES {
        if let Some(mark) = opts.decimal_mark {
            if let Some(substituted) = with_decimal_mark(field, mark) {
                return substituted;
            }
        }
    }
    field.to_string()
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}
