//! Processing strategies for export dumps.
//!
//! Every page is parsed independently, so pages can be spread across
//! threads freely. Output and word counting always happen on the calling
//! thread, which owns the [`PageWriter`] and the [`WordCounter`].
//!
//! - Sequential (baseline, supports early termination)
//! - Batch-parallel (scoped threads over batches of pages, order preserved)
//! - Channel-pipeline (reader thread, worker pool, writer on the caller)

use clap::ValueEnum;
use indicatif::ProgressBar;
use std::io::{BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::config::ScanConfig;
use crate::error::Result;
use crate::export::{process_page_xml, scan_pages, PageOutcome};
use crate::output::PageWriter;
use crate::word_count::WordCounter;

const PROGRESS_EVERY: usize = 1000;

/// Processing strategy for a dump
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Strategy {
    /// One page at a time on the calling thread
    Sequential,
    /// Batches of pages split across threads
    BatchParallel,
    /// Reader, worker pool and writer connected by channels
    ChannelPipeline,
}

/// Configuration for parallel processing
#[derive(Debug, Clone)]
pub struct ParallelConfig {
    /// Threads per batch
    pub num_threads: usize,
    /// Pages per batch for batch-parallel processing
    pub batch_size: usize,
    /// Bound of both pipeline channels
    pub channel_buffer: usize,
    /// Worker threads for pipeline processing
    pub num_workers: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        let cpus = thread::available_parallelism()
            .map(|p| p.get())
            .unwrap_or(4);
        Self {
            num_threads: cpus,
            batch_size: 1000,
            channel_buffer: 10000,
            num_workers: cpus.saturating_sub(1).max(1),
        }
    }
}

impl ParallelConfig {
    /// Use `threads` threads, or the detected CPU count when `0`.
    pub fn with_threads(mut self, threads: usize) -> Self {
        if threads > 0 {
            self.num_threads = threads;
            self.num_workers = threads.saturating_sub(1).max(1);
        }
        self
    }
}

#[derive(Debug, Default, Clone)]
pub struct Stats {
    pub pages_scanned: usize,
    pub pages_written: usize,
    pub special: usize,
    pub redirects: usize,
    pub too_short: usize,
    pub malformed: usize,
    pub categories: usize,
    pub citations: usize,
    pub anchors: usize,
    pub elapsed: Duration,
}

impl Stats {
    pub fn pages_per_sec(&self) -> f64 {
        self.pages_scanned as f64 / self.elapsed.as_secs_f64().max(f64::EPSILON)
    }
}

/// Owns the per-run state that only the calling thread touches.
struct Collector<'a, W: Write> {
    writer: &'a mut PageWriter<W>,
    counter: &'a mut WordCounter,
    progress: &'a ProgressBar,
    stats: Stats,
    start_time: Instant,
}

impl<'a, W: Write> Collector<'a, W> {
    fn new(writer: &'a mut PageWriter<W>, counter: &'a mut WordCounter, progress: &'a ProgressBar) -> Self {
        Collector {
            writer,
            counter,
            progress,
            stats: Stats::default(),
            start_time: Instant::now(),
        }
    }

    fn handle(&mut self, page_id: usize, outcome: PageOutcome) -> Result<()> {
        self.stats.pages_scanned += 1;

        match outcome {
            PageOutcome::Kept(page) => {
                self.counter.record(page.lead_text());
                self.stats.categories += page.categories().len();
                self.stats.citations += page.citations().len();
                self.stats.anchors += page.anchors().len();
                self.writer.write_page(&page)?;
                self.stats.pages_written += 1;
            }
            PageOutcome::Special => {
                log::debug!("Page {page_id}: special page, skipped");
                self.stats.special += 1;
            }
            PageOutcome::Redirect => {
                log::debug!("Page {page_id}: redirect, skipped");
                self.stats.redirects += 1;
            }
            PageOutcome::TooShort => {
                log::debug!("Page {page_id}: lead text too short, skipped");
                self.stats.too_short += 1;
            }
            PageOutcome::Malformed(e) => {
                log::warn!("Page {page_id}: {e}");
                self.stats.malformed += 1;
            }
        }

        if self.stats.pages_scanned % PROGRESS_EVERY == 0 {
            let rate = self.stats.pages_scanned as f64 / self.start_time.elapsed().as_secs_f64();
            self.progress.set_message(format!(
                "Pages: {} | Written: {} | Rate: {:.0} pg/s",
                self.stats.pages_scanned, self.stats.pages_written, rate
            ));
        }
        Ok(())
    }

    fn finish(self) -> Result<Stats> {
        self.writer.flush()?;
        let mut stats = self.stats;
        stats.elapsed = self.start_time.elapsed();
        Ok(stats)
    }
}

/// Strategy 1: sequential processing. Stops as soon as `limit` pages have
/// been written.
pub fn run_sequential<W: Write>(
    reader: impl BufRead,
    writer: &mut PageWriter<W>,
    counter: &mut WordCounter,
    scan_config: &ScanConfig,
    limit: Option<usize>,
    progress: &ProgressBar,
) -> Result<Stats> {
    let mut collector = Collector::new(writer, counter, progress);
    let mut page_id = 0;
    let mut failure = None;

    scan_pages(reader, |page_xml| {
        if limit.is_some_and(|l| collector.stats.pages_written >= l) {
            return false;
        }
        let outcome = process_page_xml(&page_xml, page_id, scan_config);
        if let Err(e) = collector.handle(page_id, outcome) {
            failure = Some(e);
            return false;
        }
        page_id += 1;
        limit.map_or(true, |l| collector.stats.pages_written < l)
    })?;

    if let Some(e) = failure {
        return Err(e);
    }
    collector.finish()
}

/// Strategy 2: batch-parallel processing. Pages are collected into
/// batches and each batch is split across scoped threads; output keeps
/// input order.
pub fn process_batch_parallel<W: Write>(
    reader: impl BufRead,
    writer: &mut PageWriter<W>,
    counter: &mut WordCounter,
    scan_config: &ScanConfig,
    config: &ParallelConfig,
    progress: &ProgressBar,
) -> Result<Stats> {
    let mut collector = Collector::new(writer, counter, progress);
    let mut batch: Vec<String> = Vec::with_capacity(config.batch_size);
    let mut page_id = 0;
    let mut failure = None;

    scan_pages(reader, |page_xml| {
        batch.push(page_xml);
        if batch.len() < config.batch_size.max(1) {
            return true;
        }
        let base_id = page_id;
        page_id += batch.len();
        let results = process_batch_threaded(&batch, base_id, scan_config, config.num_threads);
        batch.clear();
        for (pid, outcome) in results {
            if let Err(e) = collector.handle(pid, outcome) {
                failure = Some(e);
                return false;
            }
        }
        true
    })?;

    if let Some(e) = failure {
        return Err(e);
    }

    for (pid, outcome) in process_batch_threaded(&batch, page_id, scan_config, config.num_threads) {
        collector.handle(pid, outcome)?;
    }

    collector.finish()
}

/// Process a batch of page chunks on up to `num_threads` threads.
fn process_batch_threaded(
    batch: &[String],
    base_id: usize,
    scan_config: &ScanConfig,
    num_threads: usize,
) -> Vec<(usize, PageOutcome)> {
    if batch.is_empty() {
        return vec![];
    }

    let num_threads = num_threads.min(batch.len()).max(1);
    let chunk_size = batch.len().div_ceil(num_threads);

    thread::scope(|scope| {
        let handles: Vec<_> = batch
            .chunks(chunk_size)
            .enumerate()
            .map(|(n, chunk)| {
                let first_id = base_id + n * chunk_size;
                scope.spawn(move || {
                    chunk
                        .iter()
                        .enumerate()
                        .map(|(i, xml)| {
                            let pid = first_id + i;
                            (pid, process_page_xml(xml, pid, scan_config))
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut results = Vec::with_capacity(batch.len());
        for handle in handles {
            match handle.join() {
                Ok(chunk_results) => results.extend(chunk_results),
                Err(_) => log::error!("A batch worker panicked; its pages were dropped"),
            }
        }
        results
    })
}

/// Strategy 3: channel pipeline. A reader thread feeds page chunks to a
/// pool of workers; outcomes are written on the calling thread in
/// completion order.
pub fn process_channel_pipeline<W: Write>(
    reader: impl BufRead + Send + 'static,
    writer: &mut PageWriter<W>,
    counter: &mut WordCounter,
    scan_config: &ScanConfig,
    config: &ParallelConfig,
    progress: &ProgressBar,
) -> Result<Stats> {
    let (page_tx, page_rx): (SyncSender<(usize, String)>, Receiver<(usize, String)>) =
        sync_channel(config.channel_buffer);
    let (result_tx, result_rx): (SyncSender<(usize, PageOutcome)>, Receiver<(usize, PageOutcome)>) =
        sync_channel(config.channel_buffer);

    let stop = Arc::new(AtomicBool::new(false));

    let reader_stop = Arc::clone(&stop);
    let reader_handle = thread::spawn(move || read_pages_to_channel(reader, page_tx, &reader_stop));

    let page_rx = Arc::new(Mutex::new(page_rx));
    let shared_config = Arc::new(scan_config.clone());
    let worker_handles: Vec<JoinHandle<()>> = (0..config.num_workers.max(1))
        .map(|_| {
            let rx = Arc::clone(&page_rx);
            let tx = result_tx.clone();
            let scan_config = Arc::clone(&shared_config);
            let worker_stop = Arc::clone(&stop);
            thread::spawn(move || process_pages_worker(rx, tx, &scan_config, &worker_stop))
        })
        .collect();

    // The receiver must die with the last worker so a blocked reader send fails
    drop(page_rx);

    // Channel closes once every worker has dropped its sender
    drop(result_tx);

    let mut collector = Collector::new(writer, counter, progress);
    let mut failure = None;
    while let Ok((pid, outcome)) = result_rx.recv() {
        if let Err(e) = collector.handle(pid, outcome) {
            stop.store(true, Ordering::SeqCst);
            failure = Some(e);
            break;
        }
    }
    drop(result_rx);

    let read_result = reader_handle.join();
    for handle in worker_handles {
        handle.join().ok();
    }

    if let Some(e) = failure {
        return Err(e);
    }
    match read_result {
        Ok(Ok(count)) => log::debug!("Reader thread forwarded {count} pages"),
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => log::error!("Reader thread panicked"),
    }

    collector.finish()
}

fn read_pages_to_channel(
    reader: impl BufRead,
    tx: SyncSender<(usize, String)>,
    stop: &AtomicBool,
) -> std::io::Result<usize> {
    let mut count = 0;
    scan_pages(reader, |page_xml| {
        if stop.load(Ordering::Relaxed) || tx.send((count, page_xml)).is_err() {
            return false;
        }
        count += 1;
        true
    })?;
    Ok(count)
}

fn process_pages_worker(
    rx: Arc<Mutex<Receiver<(usize, String)>>>,
    tx: SyncSender<(usize, PageOutcome)>,
    scan_config: &ScanConfig,
    stop: &AtomicBool,
) {
    loop {
        if stop.load(Ordering::Relaxed) {
            break;
        }

        let next = {
            let lock = rx.lock().ok();
            lock.and_then(|guard| guard.recv().ok())
        };

        match next {
            Some((pid, xml)) => {
                let outcome = process_page_xml(&xml, pid, scan_config);
                if tx.send((pid, outcome)).is_err() {
                    break;
                }
            }
            None => break,
        }
    }
}
