use anyhow::Context;
use clap::Parser;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use counter::{accumulate_saved_minutes, pretty_saved_time, SAVED_MINUTES_PER_FILE};
use data::{Error, OwnerMap};
use read::{decode_input, parse_report, read_owners};
use write::{write_report, RenderOptions};

mod compute;
mod counter;
mod data;
mod read;
mod write;

#[derive(Parser, Debug)]
#[command(
    name = "tabreport",
    version,
    about = "Format tab-delimited report tables as HTML importable into spreadsheet applications"
)]
struct Cli {
    /// Directory with the input report files
    #[arg(short = 'i', long = "in", value_name = "DIR")]
    input_dir: PathBuf,
    /// Directory the HTML files are written to
    #[arg(short = 'o', long = "out", value_name = "DIR")]
    output_dir: PathBuf,
    /// Tab-delimited file with accounts and their owners
    #[arg(short = 'w', long = "owners", value_name = "FILE")]
    owners_file: Option<PathBuf>,
    /// File with the running total of saved time
    #[arg(short = 'c', long = "counter", value_name = "FILE")]
    counter_file: Option<PathBuf>,
    /// Decimal mark for numeric cells, e.g. '.' or ','
    #[arg(short = 'd', long = "decimal-mark", value_name = "CHAR")]
    decimal_mark: Option<char>,
    /// One plain row per record, owner next to the account, no merged cells
    #[arg(long)]
    flat: bool,
}

fn main() -> Result<(), anyhow::Error> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    run(&Cli::parse())
}

fn run(cli: &Cli) -> Result<(), anyhow::Error> {
    let started = Instant::now();
    anyhow::ensure!(
        cli.input_dir.is_dir(),
        "input directory {} does not exist",
        cli.input_dir.display()
    );
    anyhow::ensure!(
        cli.output_dir.is_dir(),
        "output directory {} does not exist",
        cli.output_dir.display()
    );

    let owners = read_owners(cli.owners_file.as_deref())?;
    let opts = RenderOptions {
        decimal_mark: cli.decimal_mark,
        flat: cli.flat,
    };

    let mut names: Vec<OsString> = Vec::new();
    for entry in fs::read_dir(&cli.input_dir)
        .with_context(|| format!("input directory {}", cli.input_dir.display()))?
    {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            names.push(entry.file_name());
        }
    }
    // Sorted so output and logs come out in the same order on every run.
    names.sort();

    let mut processed: u64 = 0;
    for name in &names {
        let input = cli.input_dir.join(name);
        let output = cli.output_dir.join(output_name(name));
        match format_one_file(&input, &output, &owners, &opts) {
            Ok(()) => {
                info!("formatted {} -> {}", input.display(), output.display());
                processed += 1;
            }
            Err(err) => error!("skipping {}: {err:#}", input.display()),
        }
    }

    if processed > 0 {
        if let Some(counter_file) = &cli.counter_file {
            let contribution = SAVED_MINUTES_PER_FILE * processed;
            let total = accumulate_saved_minutes(counter_file, processed);
            println!(
                "Saved {contribution} minutes this run, {total} minutes overall ({}).",
                pretty_saved_time(total)
            );
        }
    }
    info!(
        "{processed} of {} file(s) formatted in {:.2?}",
        names.len(),
        started.elapsed()
    );
    Ok(())
}

/// Output file name: the input's base name with the extension replaced by
/// `.html`, appended when there is none.
fn output_name(name: &OsStr) -> PathBuf {
    Path::new(name).with_extension("html")
}

fn format_one_file(
    input: &Path,
    output: &Path,
    owners: &OwnerMap,
    opts: &RenderOptions,
) -> Result<(), anyhow::Error> {
    let bytes = fs::read(input).map_err(|source| Error::Read {
        path: input.to_path_buf(),
        source,
    })?;
    let report = parse_report(decode_input(&bytes).as_bytes())?;
    let title = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Report".to_string());
    let file = fs::File::create(output)
        .with_context(|| format!("cannot create {}", output.display()))?;
    write_report(BufWriter::new(file), &title, &report, owners, opts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_name_replaces_extension() {
        assert_eq!(output_name(OsStr::new("report.txt")), Path::new("report.html"));
        assert_eq!(output_name(OsStr::new("report.TXT")), Path::new("report.html"));
    }

    #[test]
    fn output_name_appends_when_no_extension() {
        assert_eq!(output_name(OsStr::new("report")), Path::new("report.html"));
    }
}
