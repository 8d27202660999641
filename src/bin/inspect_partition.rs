use anyhow::{bail, Context, Result};
use arrow::util::display::{ArrayFormatter, FormatOptions};
use ic3scraper::store::{partition_files, read_partition};
use parquet::file::reader::{FileReader, SerializedFileReader};
use std::{env, fs::File, path::Path, process::exit};

const DEFAULT_MAX_ROWS: usize = 20;

fn main() -> Result<()> {
    // Expect a partition (or dataset) directory, optionally a row limit.
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.len() > 3 {
        eprintln!("Usage: {} <PARTITION_DIR> [MAX_ROWS]", args[0]);
        exit(1);
    }
    let dir = Path::new(&args[1]);
    let max_rows = args
        .get(2)
        .map(|s| s.parse::<usize>())
        .transpose()
        .context("MAX_ROWS must be a number")?
        .unwrap_or(DEFAULT_MAX_ROWS);

    let files = partition_files(dir)?;
    if files.is_empty() {
        bail!("no parquet files under {}", dir.display());
    }

    // 1) Per-file metadata
    println!("=== Partition: {} ===", dir.display());
    for path in &files {
        let reader = SerializedFileReader::new(
            File::open(path).with_context(|| format!("opening {}", path.display()))?,
        )?;
        let meta = reader.metadata().file_metadata();
        println!(
            "- {:<60} | rows: {:>6} | created by: {}",
            path.strip_prefix(dir).unwrap_or(path).display(),
            meta.num_rows(),
            meta.created_by().unwrap_or("<unknown>")
        );
    }
    println!();

    // 2) Union of all files, schema taken from the first
    let batches = read_partition(dir)?;
    let Some(first) = batches.first() else {
        println!("(all files empty)");
        return Ok(());
    };
    let schema = first.schema();
    if let Some(other) = batches.iter().find(|b| b.schema() != schema) {
        eprintln!(
            "warning: files disagree on schema:\n  {:?}\n  {:?}",
            schema,
            other.schema()
        );
    }

    println!("=== Schema ===");
    for field in schema.fields() {
        println!("- {:<30} | {}", field.name(), field.data_type());
    }
    println!();

    let total: usize = batches.iter().map(|b| b.num_rows()).sum();
    println!("=== Rows ({} total, showing {}) ===", total, total.min(max_rows));
    let header: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
    println!("{}", header.join("\t"));

    let options = FormatOptions::default();
    let mut shown = 0;
    'outer: for batch in &batches {
        let formatters = batch
            .columns()
            .iter()
            .map(|c| ArrayFormatter::try_new(c.as_ref(), &options))
            .collect::<Result<Vec<_>, _>>()?;
        for row in 0..batch.num_rows() {
            if shown == max_rows {
                break 'outer;
            }
            let cells: Vec<String> = formatters.iter().map(|f| f.value(row).to_string()).collect();
            println!("{}", cells.join("\t"));
            shown += 1;
        }
    }

    Ok(())
}
