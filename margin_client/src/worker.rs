//! Bounded worker pool for fetching several symbols at once.
//!
//! Jobs `(index, config)` go out on one channel and `(index, outcome)` come
//! back on another. Results are slotted by index, so the report keeps the
//! configured order whatever order the fetches finish in. A fatal error stops
//! the other workers from taking new jobs and is returned once all threads
//! have joined.
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crossbeam_channel::{Receiver, Sender, unbounded};
use log::{debug, error, info};
use margin_common::quote::SkipNote;
use margin_common::{MarginError, MarketData, Result, SymbolConfig};

use crate::pipeline::{INTERRUPTED, ScanOptions, SymbolOutcome, process_symbol};

type Job<'a> = (usize, &'a SymbolConfig);
type Done = (usize, Result<SymbolOutcome>);

/// Parallel counterpart of [`crate::pipeline::scan`].
pub fn scan_parallel<M: MarketData + Sync>(
    market: &M,
    symbols: &[SymbolConfig],
    options: &ScanOptions,
    shutdown: &AtomicBool,
) -> Result<Vec<SymbolOutcome>> {
    let (job_tx, job_rx) = unbounded::<Job<'_>>();
    let (done_tx, done_rx) = unbounded::<Done>();
    let abort = AtomicBool::new(false);

    for job in symbols.iter().enumerate() {
        job_tx
            .send(job)
            .map_err(|e| MarginError::ChannelSend(e.to_string()))?;
    }
    drop(job_tx);

    let workers = options.workers.clamp(1, symbols.len().max(1));
    thread::scope(|scope| {
        for id in 0..workers {
            let job_rx = job_rx.clone();
            let done_tx = done_tx.clone();
            let abort = &abort;
            scope.spawn(move || run_worker(id, market, options, shutdown, abort, job_rx, done_tx));
        }
    });
    drop(done_tx);

    let mut slots: Vec<Option<SymbolOutcome>> = vec![None; symbols.len()];
    let mut fatal = None;
    for (index, outcome) in done_rx.iter() {
        match outcome {
            Ok(outcome) => slots[index] = Some(outcome),
            Err(e) => {
                error!("Worker stopped on {}: {}", symbols[index].symbol, e);
                fatal.get_or_insert(e);
            }
        }
    }
    if let Some(e) = fatal {
        return Err(e);
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(i, slot)| {
            slot.ok_or_else(|| MarginError::ChannelRecv(format!("no result for {}", symbols[i].symbol)))
        })
        .collect()
}

fn run_worker<M: MarketData + Sync>(
    id: usize,
    market: &M,
    options: &ScanOptions,
    shutdown: &AtomicBool,
    abort: &AtomicBool,
    jobs: Receiver<Job<'_>>,
    done: Sender<Done>,
) {
    debug!("Worker {} started", id);
    for (index, config) in jobs.iter() {
        if abort.load(Ordering::Relaxed) {
            break;
        }
        let outcome = if shutdown.load(Ordering::Relaxed) {
            Ok(SymbolOutcome::Skipped(SkipNote::symbol(&config.symbol, INTERRUPTED)))
        } else {
            info!("Worker {} processing {}", id, config.symbol);
            let outcome = process_symbol(market, config, options.rounding);
            if !options.delay.is_zero() {
                thread::sleep(options.delay);
            }
            outcome
        };
        if outcome.is_err() {
            abort.store(true, Ordering::Relaxed);
        }
        if done.send((index, outcome)).is_err() {
            break;
        }
    }
    debug!("Worker {} stopping", id);
}
