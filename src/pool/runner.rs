//! Concurrent synthesis pool — claims free lines and converts them.
//!
//! # Architecture
//!
//! ```text
//! SynthPool::start
//!   └─▶ control thread
//!         ├─ spawns N worker threads ("synth-0" … "synth-N-1")
//!         │     loop: claim_next() → synthesize → complete / fail
//!         ├─ joins all workers
//!         └─ runs the cache write-back exactly once
//! ```
//!
//! Workers claim lines in an order biased toward the playhead: forward from
//! the current playback index to the end, then wrapping to the start and
//! scanning backward toward the index.  Upcoming lines are converted first
//! so playback rarely blocks, while lines behind the playhead (needed for
//! loop mode) still get covered.
//!
//! Shutdown is cooperative: the flag is checked between lines, never
//! mid-call, so a synthesis request already on the wire runs to completion.
//! [`SynthPool::close`] sets the flag and joins the control thread; calling
//! it again is a no-op.  There is no implicit shutdown on drop — lifecycle
//! is construct → start → close, always explicit.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::pool::playhead::Playhead;
use crate::script::{CacheWriteback, Script};
use crate::synth::Synthesizer;

// ---------------------------------------------------------------------------
// Claim scan
// ---------------------------------------------------------------------------

/// Claim the next free line, biased toward the playhead.
///
/// Scans `[p, len)` forward, then `[0, p)` in reverse, and wins the first
/// `Free` line via its atomic claim.  Returns `None` when no claimable line
/// remains anywhere — the caller's signal to stop.
fn claim_next(script: &Script, playhead: &Playhead) -> Option<usize> {
    let p = playhead.get().min(script.len());
    let ahead = p..script.len();
    let behind = (0..p).rev();

    for index in ahead.chain(behind) {
        if script.line(index).try_claim() {
            return Some(index);
        }
    }
    None
}

/// One worker: claim, convert, record, repeat.
fn worker_loop(
    script: &Script,
    playhead: &Playhead,
    shutdown: &AtomicBool,
    synth: &dyn Synthesizer,
) {
    loop {
        if shutdown.load(Ordering::SeqCst) {
            log::debug!("pool: shutdown requested, worker exiting");
            return;
        }

        let Some(index) = claim_next(script, playhead) else {
            log::debug!("pool: no claimable lines left, worker exiting");
            return;
        };

        let line = script.line(index);
        match synth.synthesize(line.text()) {
            Ok(audio) => {
                log::debug!("pool: line {index} converted ({} bytes)", audio.len());
                line.complete(audio);
            }
            Err(e) => {
                // Per-line failure is never fatal to the pool.
                log::warn!("pool: line {index} failed to convert: {e}");
                line.fail(e.to_string());
            }
        }
    }
}

// ---------------------------------------------------------------------------
// SynthPool
// ---------------------------------------------------------------------------

/// Fixed-size pool of synthesis workers over one shared [`Script`].
///
/// Create with [`SynthPool::start`]; the workers begin claiming
/// immediately.  Once every worker has exited — all lines settled, or
/// shutdown requested — the control thread runs the cache write-back and
/// the pool is done.  Call [`close`](Self::close) to request shutdown and
/// wait for that control path to finish.
pub struct SynthPool {
    playhead: Playhead,
    shutdown: Arc<AtomicBool>,
    control: Option<JoinHandle<()>>,
}

impl SynthPool {
    /// Spawn `workers` synthesis threads (at least one) plus the control
    /// thread that joins them and finalizes the cache.
    pub fn start(
        script: Arc<Script>,
        synth: Arc<dyn Synthesizer>,
        writeback: Option<CacheWriteback>,
        workers: usize,
    ) -> Self {
        let playhead = Playhead::new();
        let shutdown = Arc::new(AtomicBool::new(false));
        let workers = workers.max(1);

        let control = {
            let script = Arc::clone(&script);
            let playhead = playhead.clone();
            let shutdown = Arc::clone(&shutdown);

            std::thread::Builder::new()
                .name("synth-control".into())
                .spawn(move || {
                    let handles: Vec<JoinHandle<()>> = (0..workers)
                        .map(|i| {
                            let script = Arc::clone(&script);
                            let playhead = playhead.clone();
                            let shutdown = Arc::clone(&shutdown);
                            let synth = Arc::clone(&synth);

                            std::thread::Builder::new()
                                .name(format!("synth-{i}"))
                                .spawn(move || {
                                    worker_loop(&script, &playhead, &shutdown, synth.as_ref())
                                })
                                .expect("failed to spawn synthesis worker")
                        })
                        .collect();

                    for handle in handles {
                        if handle.join().is_err() {
                            log::error!("pool: a synthesis worker panicked");
                        }
                    }

                    // All conversion activity has ceased — persist once.
                    if let Some(writeback) = writeback {
                        writeback.run(&script);
                    }
                    log::info!("pool: all workers finished");
                })
                .expect("failed to spawn pool control thread")
        };

        log::info!("pool: started {workers} worker(s) over {script}");

        Self {
            playhead,
            shutdown,
            control: Some(control),
        }
    }

    /// Handle on the shared playback index, for the playback loop.
    pub fn playhead(&self) -> Playhead {
        self.playhead.clone()
    }

    /// Request cooperative shutdown and wait for the control thread
    /// (worker joins + cache write-back) to finish.
    ///
    /// A conversion already in flight completes first.  Idempotent: the
    /// second and later calls return immediately.
    pub fn close(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(control) = self.control.take() {
            if control.join().is_err() {
                log::error!("pool: control thread panicked");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
