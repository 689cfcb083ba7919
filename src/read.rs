use crate::data::{Error, OwnerMap, Record, Report, Row, Section, MAX_FIELDS, MIN_FIELDS};
use anyhow::Context;
use serde::Deserialize;
use std::fs::File;
use std::path::Path;

/// Decode raw input bytes to text. The report exports this tool grew up on
/// are UTF-16-LE, so the byte order mark is sniffed first; anything without
/// a BOM is taken as UTF-8, lossily so a stray byte never kills a whole
/// file.
pub(crate) fn decode_input(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFF, 0xFE]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        let rest = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
        String::from_utf8_lossy(rest).into_owned()
    }
}

/// Parse one decoded report into sections of rows.
///
/// Lines are tab-delimited with every field trimmed. Blank lines vanish, a
/// line whose first field starts with `*` closes the current section (its
/// text, if any, stays behind as a trailing note), and any line whose field
/// count falls outside the data bounds is carried along as a note instead
/// of failing the file.
pub(crate) fn parse_report<R: std::io::Read>(reader: R) -> Result<Report, anyhow::Error> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut report = Report::default();
    let mut section = Section::default();
    let mut raw = csv::StringRecord::new();

    while rdr.read_record(&mut raw)? {
        let fields: Vec<String> = raw.iter().map(str::to_string).collect();
        if fields.iter().all(|f| f.is_empty()) {
            continue;
        }
        if let Some(rest) = fields[0].strip_prefix('*') {
            let mut text = rest.trim().to_string();
            for extra in &fields[1..] {
                if !extra.is_empty() {
                    if !text.is_empty() {
                        text.push(' ');
                    }
                    text.push_str(extra);
                }
            }
            if !text.is_empty() {
                section.rows.push(Row::Note(text));
            }
            report.push_section(std::mem::take(&mut section));
            continue;
        }
        if (MIN_FIELDS..=MAX_FIELDS).contains(&fields.len()) {
            section.rows.push(Row::Record(Record { fields }));
        } else {
            section.rows.push(Row::Note(fields.join(" ")));
        }
    }
    report.push_section(section);

    Ok(report)
}

#[derive(Debug, Deserialize)]
struct OwnerEntry {
    account: String,
    owner: String,
}

/// Load the optional account owners file. No path means no annotations and
/// an empty map.
pub(crate) fn read_owners(path: Option<&Path>) -> Result<OwnerMap, anyhow::Error> {
    let Some(path) = path else {
        return Ok(OwnerMap::new());
    };
    let file = File::open(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    owners_from_reader(file).with_context(|| format!("owner file {}", path.display()))
}

/// Strict owner parsing: every entry must be exactly a tab-separated
/// account and owner. The file is hand-curated, so a malformed entry means
/// the annotations can't be trusted and the run stops. Duplicated accounts
/// keep the last owner seen.
pub(crate) fn owners_from_reader<R: std::io::Read>(reader: R) -> Result<OwnerMap, Error> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .quoting(false)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut owners = OwnerMap::new();
    for (idx, result) in rdr.deserialize().enumerate() {
        let entry: OwnerEntry = result.map_err(|source| Error::OwnerEntry {
            entry: idx as u64 + 1,
            source,
        })?;
        owners.insert(entry.account, entry.owner);
    }
    Ok(owners)
}
