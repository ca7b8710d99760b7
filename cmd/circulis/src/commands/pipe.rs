//! Copy stdin to stdout through a blocking ring buffer.

use std::io::{self, Read, Write};
use std::thread;

use anyhow::{Context, Result, anyhow};
use circulis::RingBuffer;
use clap::Args;
use tracing::{debug, info};

use crate::Cli;
use crate::config::{PipeConfig, RunConfig};

/// Copy stdin to stdout through a ring buffer
#[derive(Args, Debug, Default)]
pub struct PipeCommand {
    /// Buffer capacity in bytes (rounded up to a power of two)
    #[arg(long)]
    pub capacity: Option<usize>,
}

impl PipeCommand {
    pub fn run(&self, cli: &Cli) -> Result<()> {
        let file = RunConfig::load(cli.file.as_deref())?;
        let config = PipeConfig {
            capacity: self.capacity.unwrap_or(file.pipe.capacity),
        };
        debug!(?config, "pipe configuration");

        let (read, written) = pipe(io::stdin(), io::stdout(), &config)?;
        info!(read, written, "pipe finished");
        Ok(())
    }
}

/// Moves everything from `input` to `output` with a producer thread feeding
/// the buffer and the calling thread draining it.
///
/// Returns the byte counts on each side.
pub fn pipe<R, W>(input: R, mut output: W, config: &PipeConfig) -> Result<(u64, u64)>
where
    R: Read + Send + 'static,
    W: Write,
{
    let buf = RingBuffer::try_new(config.capacity)?;
    buf.set_blocking(true);
    debug!(capacity = buf.capacity(), "pipe buffer ready");

    let producer = {
        let buf = buf.clone();
        thread::spawn(move || -> io::Result<u64> {
            let mut input = input;
            let result = io::copy(&mut input, &mut &buf);
            buf.close();
            result
        })
    };

    let drained = io::copy(&mut &buf, &mut output).and_then(|n| output.flush().map(|_| n));
    // Unblocks the producer if the output side failed first.
    buf.close();

    let read = producer
        .join()
        .map_err(|_| anyhow!("producer thread panicked"))?;
    let written = drained.context("failed to write output")?;
    let read = read.context("failed to read input")?;
    Ok((read, written))
}
