//! `checksession mysession.json`
//!
//! Parse and validate `mysession.json`. No output and an exit code of 0
//! indicates success.

use anyhow::{Context, Result};
use std::env;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use plexevents::cfg::Session;

fn main() -> Result<()> {
    let args = env::args().collect::<Vec<_>>();
    let path = PathBuf::from(args.get(1).context("usage: checksession <session.json>")?);
    let file = File::open(&path)?;
    let rdr = BufReader::new(file);
    let session: Session = serde_json::from_reader(rdr)?;
    session.validate()?;

    Ok(())
}
