/*!
 * condlatch - Demo Entry Point
 *
 * Simulates a flush-completion latch:
 * - Several observers block until the flush completes
 * - One impatient observer gives up after a short deadline
 * - A flusher thread fires the latch once
 */

use std::error::Error;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::info;

use condlatch::{init_tracing, Condition, SimpleCondition, SyncConfig};

const DEFAULT_WAITERS: usize = 4;
const FLUSH_DELAY: Duration = Duration::from_millis(200);
const IMPATIENT_TIMEOUT: Duration = Duration::from_millis(50);

fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();

    let waiters = match std::env::var("CONDLATCH_DEMO_WAITERS") {
        Ok(raw) => raw.parse::<usize>()?,
        Err(_) => DEFAULT_WAITERS,
    };

    info!(waiters, "Starting flush completion demo");
    let flushed = Arc::new(SimpleCondition::with_config(SyncConfig::long_wait()));

    let observers: Vec<_> = (0..waiters)
        .map(|i| {
            let flushed = flushed.clone();
            thread::Builder::new()
                .name(format!("observer-{}", i))
                .spawn(move || flushed.wait())
        })
        .collect::<Result<_, _>>()?;

    let impatient = {
        let flushed = flushed.clone();
        thread::Builder::new()
            .name("impatient".into())
            .spawn(move || flushed.wait_for(IMPATIENT_TIMEOUT))?
    };

    let flusher = {
        let flushed = flushed.clone();
        thread::Builder::new().name("flusher".into()).spawn(move || {
            thread::sleep(FLUSH_DELAY);
            let result = flushed.signal_all();
            info!(woken = result.count(), "Flush complete, latch fired");
        })?
    };

    for (i, observer) in observers.into_iter().enumerate() {
        let result = observer
            .join()
            .map_err(|_| format!("observer-{} panicked", i))?;
        info!(observer = i, ok = result.is_ok(), "Observer released");
        result?;
    }

    let impatient_woken = impatient
        .join()
        .map_err(|_| "impatient observer panicked")??;
    info!(woken = impatient_woken, "Impatient observer finished");

    flusher.join().map_err(|_| "flusher panicked")?;

    // Late observers take the fast path
    flushed.wait()?;
    info!(signaled = flushed.is_signaled(), "Demo finished");

    Ok(())
}
