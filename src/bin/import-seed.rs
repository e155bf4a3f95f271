use std::error::Error;
use std::path::PathBuf;

use log::{info, initialize_logger};
use structopt::StructOpt;

use goshuin::catalog::validate_rows;
use goshuin::place::RawPlace;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "import-seed",
    about = "Validate seed rows and write the catalog the server loads"
)]
struct Opt {
    /// JSON array of seed rows
    #[structopt(long, parse(from_os_str))]
    input: PathBuf,

    /// Where to write the catalog
    #[structopt(long, parse(from_os_str))]
    output: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let opt = Opt::from_args();

    let logger = initialize_logger();

    info!(logger, "Reading seed rows..."; "input" => %opt.input.display());
    let contents = tokio::fs::read(&opt.input).await?;
    let mut rows: Vec<RawPlace> = serde_json::from_slice(&contents)?;

    for row in rows.iter_mut().filter(|r| r.source.trim().is_empty()) {
        row.source = "seed".to_owned();
    }

    let total = rows.len();
    let places = validate_rows(&logger, rows);

    info!(logger, "Writing catalog..."; "output" => %opt.output.display(), "places" => places.len(), "skipped" => total - places.len());
    tokio::fs::write(&opt.output, serde_json::to_vec_pretty(&places)?).await?;

    Ok(())
}
