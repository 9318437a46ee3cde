//! Handing records off to a writer thread

use anyhow::{anyhow, Result};
use plexevents::demux::{Record, RecordSink};
use plexevents::ser::TsvSink;
use std::fmt::Debug;
use std::io::Write;
use std::thread;

/// Sends every record down a channel, so that slow output never holds up
/// the poll loop
pub struct ChannelSink<M>(pub flume::Sender<Record<M>>);

impl<M> RecordSink<M> for ChannelSink<M> {
    fn record(&mut self, record: Record<M>) -> Result<()> {
        self.0
            .send(record)
            .map_err(|_| anyhow!("record writer has shut down"))
    }
}

pub struct WriterHandle<M> {
    pub sender: flume::Sender<Record<M>>,
    pub join_handle: thread::JoinHandle<Result<u64>>,
}

impl<M: Debug + Send + 'static> WriterHandle<M> {
    /// Spawn a thread writing records to `wtr` as tab-separated rows until
    /// every sender is dropped. The thread returns the number of rows
    /// written.
    pub fn new<W: Write + Send + 'static>(wtr: W) -> Self {
        let (sender, receiver) = flume::unbounded::<Record<M>>();
        let join_handle = thread::spawn(move || {
            let mut tsv = TsvSink::new(wtr);
            let mut rows = 0u64;
            while let Ok(record) = receiver.recv() {
                tsv.record(record)?;
                rows += 1;
                // Flush whenever the loop has caught up
                if receiver.is_empty() {
                    tsv.flush()?;
                }
            }
            tsv.flush()?;
            Ok(rows)
        });
        WriterHandle { sender, join_handle }
    }

    pub fn sink(&self) -> ChannelSink<M> {
        ChannelSink(self.sender.clone())
    }

    /// Close the channel and wait for the writer to finish
    pub fn finish(self) -> Result<u64> {
        drop(self.sender);
        self.join_handle
            .join()
            .map_err(|_| anyhow!("record writer panicked"))?
    }
}
