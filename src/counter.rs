use std::fs;
use std::path::Path;
use tracing::warn;

/// Rough estimate of hand-editing time one formatted file replaces.
pub(crate) const SAVED_MINUTES_PER_FILE: u64 = 30;

/// Prior counter value. Anything wrong with the file (missing, unreadable,
/// not a number) starts the count over at zero with a warning; a broken
/// counter must never stop the actual formatting work.
pub(crate) fn read_saved_minutes(path: &Path) -> u64 {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            warn!(
                "cannot read counter file {}, starting from zero: {err}",
                path.display()
            );
            return 0;
        }
    };
    match text.trim().parse() {
        Ok(minutes) => minutes,
        Err(err) => {
            warn!(
                "counter file {} does not hold a number, starting from zero: {err}",
                path.display()
            );
            0
        }
    }
}

/// Add this run's contribution and persist the new total. The value is read
/// here, bumped and written back in one place; a failed write is only worth
/// a warning since the total is a statistic, not data.
pub(crate) fn accumulate_saved_minutes(path: &Path, processed_files: u64) -> u64 {
    let total = read_saved_minutes(path) + SAVED_MINUTES_PER_FILE * processed_files;
    if let Err(err) = fs::write(path, format!("{total}\n")) {
        warn!("cannot write counter file {}: {err}", path.display());
    }
    total
}

/// Break a minute total into calendar units for the end-of-run summary,
/// e.g. `2 hours, 30 minutes`. Months are 30 days, years 12 such months.
pub(crate) fn pretty_saved_time(minutes: u64) -> String {
    const UNITS: [(&str, u64); 5] = [
        ("years", 12 * 30 * 24 * 60),
        ("months", 30 * 24 * 60),
        ("days", 24 * 60),
        ("hours", 60),
        ("minutes", 1),
    ];

    let mut remainder = minutes;
    let mut parts = Vec::new();
    for (unit, factor) in UNITS {
        if remainder == 0 {
            break;
        }
        let count = remainder / factor;
        remainder %= factor;
        if count > 0 {
            parts.push(format!("{count} {unit}"));
        }
    }
    if parts.is_empty() {
        "0 minutes".to_string()
    } else {
        parts.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_counter_reads_as_zero() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(read_saved_minutes(&tmp.path().join("counter")), 0);
    }

    #[test]
    fn garbage_counter_reads_as_zero() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("counter");
        fs::write(&path, "not a number").unwrap();
        assert_eq!(read_saved_minutes(&path), 0);
    }

    #[test]
    fn counter_value_is_trimmed() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("counter");
        fs::write(&path, "90\n").unwrap();
        assert_eq!(read_saved_minutes(&path), 90);
    }

    #[test]
    fn accumulation_adds_per_file_contribution() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("counter");
        assert_eq!(
            accumulate_saved_minutes(&path, 1),
            SAVED_MINUTES_PER_FILE
        );
        assert_eq!(
            accumulate_saved_minutes(&path, 2),
            3 * SAVED_MINUTES_PER_FILE
        );
        assert_eq!(
            fs::read_to_string(&path).unwrap().trim(),
            (3 * SAVED_MINUTES_PER_FILE).to_string()
        );
    }

    #[test]
    fn pretty_breakdown() {
        assert_eq!(pretty_saved_time(0), "0 minutes");
        assert_eq!(pretty_saved_time(30), "30 minutes");
        assert_eq!(pretty_saved_time(90), "1 hours, 30 minutes");
        assert_eq!(pretty_saved_time(24 * 60 + 60 + 1), "1 days, 1 hours, 1 minutes");
        assert_eq!(pretty_saved_time(12 * 30 * 24 * 60), "1 years");
    }
}
