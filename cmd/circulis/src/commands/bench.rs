//! Throughput benchmark: N producers and M consumers sharing one buffer.

use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Result, anyhow, bail};
use circulis::{BufferError, RingBuffer};
use clap::Args;
use tracing::{debug, info, warn};

use crate::Cli;
use crate::config::{BenchConfig, Mode, RunConfig};

/// Push bytes through a ring buffer and report throughput
#[derive(Args, Debug, Default)]
pub struct BenchCommand {
    /// Buffer capacity in bytes (rounded up to a power of two)
    #[arg(long)]
    pub capacity: Option<usize>,

    /// Bytes per write call
    #[arg(long)]
    pub chunk: Option<usize>,

    /// Bytes sent by each producer
    #[arg(long)]
    pub total: Option<usize>,

    /// Number of producer threads
    #[arg(short = 'p', long)]
    pub producers: Option<usize>,

    /// Number of consumer threads
    #[arg(short = 'n', long)]
    pub consumers: Option<usize>,

    /// Buffer mode
    #[arg(long, value_enum)]
    pub mode: Option<Mode>,

    /// Microseconds to sleep after Full/Empty in non-blocking mode
    #[arg(long)]
    pub retry_us: Option<u64>,
}

/// Outcome of one benchmark run.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchReport {
    pub bytes: usize,
    pub elapsed: Duration,
    /// Non-blocking writes that hit a full buffer.
    pub full_retries: usize,
    /// Non-blocking reads that hit an empty buffer.
    pub empty_retries: usize,
}

impl BenchReport {
    pub fn mib_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        self.bytes as f64 / (1024.0 * 1024.0) / secs
    }
}

impl BenchCommand {
    pub fn run(&self, cli: &Cli) -> Result<()> {
        let file = RunConfig::load(cli.file.as_deref())?;
        let config = self.merge(file.bench);
        config.validate()?;
        debug!(?config, "bench configuration");

        let report = run_bench(&config)?;
        info!(
            bytes = report.bytes,
            elapsed_ms = report.elapsed.as_millis() as u64,
            full_retries = report.full_retries,
            empty_retries = report.empty_retries,
            "bench finished"
        );
        println!(
            "{} bytes in {:.3?} ({:.1} MiB/s, {} full retries, {} empty retries)",
            report.bytes,
            report.elapsed,
            report.mib_per_sec(),
            report.full_retries,
            report.empty_retries
        );
        Ok(())
    }

    /// Overlays the flags that were given on top of `base`.
    fn merge(&self, base: BenchConfig) -> BenchConfig {
        BenchConfig {
            capacity: self.capacity.unwrap_or(base.capacity),
            chunk: self.chunk.unwrap_or(base.chunk),
            total: self.total.unwrap_or(base.total),
            producers: self.producers.unwrap_or(base.producers),
            consumers: self.consumers.unwrap_or(base.consumers),
            mode: self.mode.unwrap_or(base.mode),
            retry_us: self.retry_us.unwrap_or(base.retry_us),
        }
    }
}

/// Byte written at position `i` of every producer's stream.
fn pattern_byte(i: usize) -> u8 {
    (i % 251) as u8
}

struct Tally {
    bytes: usize,
    sum: u64,
    retries: usize,
}

fn produce(buf: &RingBuffer, config: &BenchConfig) -> Result<Tally> {
    let chunk: Vec<u8> = (0..config.chunk).map(pattern_byte).collect();
    let backoff = Duration::from_micros(config.retry_us);
    let mut tally = Tally {
        bytes: 0,
        sum: 0,
        retries: 0,
    };

    while tally.bytes < config.total {
        let n = config.chunk.min(config.total - tally.bytes);
        let mut data = &chunk[..n];
        while !data.is_empty() {
            let written = match buf.write(data) {
                Ok(written) => written,
                Err(err) if err.error == BufferError::Full => {
                    tally.retries += 1;
                    thread::sleep(backoff);
                    err.written
                }
                Err(err) => return Err(err.into()),
            };
            tally.sum += data[..written].iter().map(|&b| b as u64).sum::<u64>();
            tally.bytes += written;
            data = &data[written..];
        }
    }
    Ok(tally)
}

fn consume(buf: &RingBuffer, config: &BenchConfig) -> Result<Tally> {
    let mut chunk = vec![0u8; config.chunk];
    let backoff = Duration::from_micros(config.retry_us);
    let mut tally = Tally {
        bytes: 0,
        sum: 0,
        retries: 0,
    };

    loop {
        match buf.read(&mut chunk) {
            Ok(n) => {
                tally.bytes += n;
                tally.sum += chunk[..n].iter().map(|&b| b as u64).sum::<u64>();
            }
            Err(BufferError::Empty) => {
                tally.retries += 1;
                thread::sleep(backoff);
            }
            Err(BufferError::Closed) => return Ok(tally),
            Err(err) => return Err(err.into()),
        }
    }
}

fn join<T>(handle: thread::JoinHandle<Result<T>>, role: &str) -> Result<T> {
    handle
        .join()
        .map_err(|_| anyhow!("{role} thread panicked"))?
}

/// Runs the benchmark described by `config` and checks nothing was lost.
pub fn run_bench(config: &BenchConfig) -> Result<BenchReport> {
    let buf = RingBuffer::try_new(config.capacity)?;
    buf.set_blocking(config.mode.is_blocking());
    info!(
        capacity = buf.capacity(),
        producers = config.producers,
        consumers = config.consumers,
        mode = ?config.mode,
        "starting bench"
    );

    let start = Instant::now();

    let consumers: Vec<_> = (0..config.consumers)
        .map(|_| {
            let buf = buf.clone();
            let config = config.clone();
            thread::spawn(move || consume(&buf, &config))
        })
        .collect();

    let producers: Vec<_> = (0..config.producers)
        .map(|_| {
            let buf = buf.clone();
            let config = config.clone();
            thread::spawn(move || produce(&buf, &config))
        })
        .collect();

    let produced: Vec<_> = producers.into_iter().map(|h| join(h, "producer")).collect();
    // Consumers only stop on close, so close even if a producer failed.
    buf.close();
    let consumed: Vec<_> = consumers.into_iter().map(|h| join(h, "consumer")).collect();
    let elapsed = start.elapsed();

    let produced = produced.into_iter().collect::<Result<Vec<_>>>()?;
    let consumed = consumed.into_iter().collect::<Result<Vec<_>>>()?;

    let sent: usize = produced.iter().map(|t| t.bytes).sum();
    let received: usize = consumed.iter().map(|t| t.bytes).sum();
    let sent_sum: u64 = produced.iter().map(|t| t.sum).sum();
    let received_sum: u64 = consumed.iter().map(|t| t.sum).sum();

    if sent != received || sent_sum != received_sum {
        warn!(sent, received, sent_sum, received_sum, "byte accounting mismatch");
        bail!("sent {sent} bytes but received {received}");
    }

    Ok(BenchReport {
        bytes: received,
        elapsed,
        full_retries: produced.iter().map(|t| t.retries).sum(),
        empty_retries: consumed.iter().map(|t| t.retries).sum(),
    })
}
