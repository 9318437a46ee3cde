use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use either::Either;
use plexevents::acc::FixedLength;
use plexevents::cfg::{Session, SessionLimit};
use plexstream::device::DeviceService;
use plexstream::poll::PollLoop;
use plexstream::replay::{Recorder, ReplayDevice};
use plexstream::sim::SyntheticDevice;
use plexstream::sink::WriterHandle;
use plexstream::CliArgs;
use std::fs::{File, OpenOptions};
use std::io::{stdout, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

const GIT_VERSION: &str = git_version::git_version!(fallback = "unknown");

fn main() -> Result<()> {
    // Parse command line arguments
    let args: CliArgs = argh::from_env();

    if args.version {
        println!(
            concat!(
                env!("CARGO_BIN_NAME"),
                " ",
                "{}",
            ),
            GIT_VERSION,
        );
        return Ok(())
    }

    // Records go to stdout, so logs go to stderr
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    // Load the session file
    let (cfg_path, mut session) = match &args.config {
        Some(c) => {
            let path = PathBuf::from(c);
            let f = File::open(&path).with_context(|| format!("cannot open session file {}", c))?;
            let session: Session = serde_json::from_reader(BufReader::new(f))
                .with_context(|| format!("cannot parse session file {}", c))?;
            (Some(path), session)
        }
        None => (None, Session::default()),
    };
    if let Some(c) = args.capacity {
        session.capacity = Some(c);
    }
    if let Some(n) = args.polls {
        session.limit = Some(SessionLimit::Polls(n));
    }

    // Pick a data source
    let device: Box<dyn DeviceService> = match &args.replay {
        Some(path) => {
            info!(path = path.as_str(), "replaying recording");
            Box::new(ReplayDevice::open(path, args.tick, args.aux_rate)?.with_batch(args.batch)?)
        }
        None => {
            let seed = args.seed.unwrap_or_else(rand::random);
            info!(seed, "generating synthetic data");
            let mut dev = SyntheticDevice::new(args.tick, args.aux_rate, seed);
            dev.packet_words = session.packet_words();
            Box::new(dev)
        }
    };
    let device: Box<dyn DeviceService> = match &args.record {
        Some(path) => {
            let f = File::create(path).with_context(|| format!("cannot create {}", path))?;
            Box::new(Recorder::new(device, BufWriter::new(f)))
        }
        None => device,
    };

    // Start the writer thread
    let out = match &args.output {
        Some(path) => Either::Right(File::create(path).with_context(|| format!("cannot create {}", path))?),
        None => Either::Left(stdout()),
    };
    let writer = WriterHandle::new(BufWriter::new(out));
    let mut sink = writer.sink();

    let timestamp = Local::now();
    let first_tick = Instant::now();
    let decoder = FixedLength { words: session.packet_words() };
    let mut poll = PollLoop::new(device, &session, decoder)?;
    let result = poll.run(&mut sink);
    let counters = *poll.counters();
    drop(sink);
    let rows = writer.finish()?;
    info!(rows, ?counters, "session finished");

    // Now write the session record to disk, stalled or not
    if let Some(path) = cfg_path {
        let record = Session {
            // name, limit, capacity, wait...: from declaration
            timestamp:  Some(timestamp),
            duration:   Some(first_tick.elapsed()),
            counters:   Some(counters),
            ..session
        };
        write_record(&path, &record, timestamp)?;
    }

    result?;
    Ok(())
}

/// Write `record` next to the session file, named after its stem and the
/// start time
fn write_record(cfg_path: &Path, record: &Session, ts: DateTime<Local>) -> Result<()> {
    let json_record = serde_json::to_string_pretty(record)?;

    let mut rcd_stem = cfg_path
        .file_stem()
        .unwrap_or_else(|| std::ffi::OsStr::new("session"))
        .to_string_lossy()
        .to_string();
    rcd_stem.push('_');
    let rcd_path = cfg_path.with_file_name(format!("{}{}.json", rcd_stem, ts.format("%F_%H-%M-%S")));
    let rcd_path2 = cfg_path.with_file_name(format!("{}{}.json", rcd_stem, ts.format("%F_%H-%M-%S%.3f")));

    let f = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&rcd_path)
        .or_else(|_| OpenOptions::new().write(true).create_new(true).open(&rcd_path2))
        .context("saving more than one session record per millisecond")?;
    let mut wtr = BufWriter::new(f);
    wtr.write_all(json_record.as_bytes())?;
    wtr.flush()?;
    info!(stem = rcd_stem.as_str(), "wrote session record");
    Ok(())
}
