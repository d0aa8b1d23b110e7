//! Application entry point — read-aloud.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Parse the CLI and load [`AppConfig`] from disk (default on first run).
//! 3. Resolve the input text (literal / file / stdin / clipboard).
//! 4. Run cache housekeeping (`--clear-cache`, size warning).
//! 5. Build the [`Script`] and probe the cache for a previous conversion.
//! 6. Start the [`SynthPool`] — workers begin converting immediately.
//! 7. Run the [`PlaybackSequencer`] on the main thread — blocks until the
//!    last line has played (or forever with `--loop`).
//! 8. Close the pool: join workers, write the cache back.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;

use read_aloud::{
    cli::Cli,
    config::{AppConfig, AppPaths},
    playback::{AudioOutput, FallbackSpeaker, PlaybackSequencer, ProcessSpeaker, RodioOutput},
    pool::SynthPool,
    script::{CacheWriteback, Script, ScriptCache},
    source,
    synth::{HttpSynthesizer, Synthesizer},
};

fn main() -> anyhow::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("read-aloud starting up");

    // 2. CLI + configuration
    let cli = Cli::parse();
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    // 3. Input text
    let raw_text = source::resolve(&cli.text_source()?).context("could not resolve input text")?;

    // 4. Cache housekeeping (never fatal)
    let cache_dir = config
        .cache
        .dir
        .clone()
        .unwrap_or_else(|| AppPaths::new().cache_dir);
    let cache = ScriptCache::new(cache_dir, config.cache.hash_digits, config.cache.warn_bytes);
    if let Err(e) = cache.housekeeping(cli.clear_cache) {
        log::warn!("cache housekeeping failed: {e}");
    }

    // 5. Script construction + cache probe
    let fresh = Script::from_text(&raw_text);
    let cache_enabled = config.cache.enabled && !cli.no_cache;

    let (script, writeback) = if cache_enabled {
        let lookup = cache.resolve(&fresh);
        let script = lookup.script.unwrap_or(fresh);
        let writeback = lookup
            .target
            .map(|path| CacheWriteback::new(cache.clone(), path));
        (Arc::new(script), writeback)
    } else {
        log::debug!("cache disabled for this run");
        (Arc::new(fresh), None)
    };

    if script.is_empty() {
        log::info!("input contains no non-blank lines, nothing to read");
        return Ok(());
    }
    anyhow::ensure!(
        cli.start < script.len(),
        "start index {} is out of range for {} line(s)",
        cli.start,
        script.len()
    );
    log::info!("reading {script} from line {}", cli.start);

    // 6. Synthesis pool
    let synth: Arc<dyn Synthesizer> = Arc::new(HttpSynthesizer::from_config(&config.synth));
    let workers = cli.workers.unwrap_or(config.pool.workers);
    let mut pool = SynthPool::start(Arc::clone(&script), synth, writeback, workers);

    // 7. Playback on the main thread
    let output: Arc<dyn AudioOutput> = Arc::new(RodioOutput::new());
    let fallback: Arc<dyn FallbackSpeaker> = Arc::new(ProcessSpeaker::from_config(&config.playback));
    let sequencer = PlaybackSequencer::new(
        Arc::clone(&script),
        pool.playhead(),
        output,
        fallback,
        Duration::from_millis(config.playback.poll_interval_ms),
    );

    let playback_result = sequencer.run(cli.start, cli.looping);

    // 8. Always close the pool — joins workers and writes the cache back —
    //    before surfacing any playback error.
    pool.close();
    playback_result?;

    log::info!("read-aloud finished");
    Ok(())
}
