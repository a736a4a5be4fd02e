/*!
 * Synchronization Primitives Benchmarks
 *
 * Fast path, registration cost and wake latency for park vs. spinwait
 */

use condlatch::{Condition, SimpleCondition, StrategyType, SyncConfig, WaitQueue};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn bench_signaled_fast_path(c: &mut Criterion) {
    let cond = SimpleCondition::new();
    cond.signal_all();

    c.bench_function("signaled_fast_path", |b| {
        b.iter(|| black_box(cond.wait()).ok());
    });
}

fn bench_register_cancel(c: &mut Criterion) {
    let queue = WaitQueue::with_defaults();

    c.bench_function("register_cancel", |b| {
        b.iter(|| {
            let signal = queue.register();
            black_box(signal.cancel());
        });
    });
}

fn bench_wake_latency(c: &mut Criterion) {
    let mut group = c.benchmark_group("wake_latency");

    for strategy in [StrategyType::Park, StrategyType::SpinWait] {
        let config = SyncConfig {
            strategy,
            spin_duration: Duration::from_micros(10),
            max_spins: 100,
        };

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{:?}", strategy)),
            &config,
            |b, config| {
                b.iter(|| {
                    let cond = Arc::new(SimpleCondition::with_config(config.clone()));
                    let cond_clone = cond.clone();

                    let handle =
                        thread::spawn(move || cond_clone.wait_for(Duration::from_secs(1)));

                    // Immediate wake
                    cond.signal_all();
                    handle.join().unwrap().ok();
                });
            },
        );
    }

    group.finish();
}

fn bench_multi_waiter_wake(c: &mut Criterion) {
    let mut group = c.benchmark_group("multi_waiter_wake");

    for num_waiters in [1, 4, 8, 16] {
        group.bench_with_input(
            BenchmarkId::from_parameter(num_waiters),
            &num_waiters,
            |b, &num_waiters| {
                b.iter(|| {
                    let cond = Arc::new(SimpleCondition::with_config(SyncConfig::long_wait()));

                    let handles: Vec<_> = (0..num_waiters)
                        .map(|_| {
                            let cond_clone = cond.clone();
                            thread::spawn(move || cond_clone.wait_for(Duration::from_secs(1)))
                        })
                        .collect();

                    // Give threads time to park
                    thread::sleep(Duration::from_millis(10));

                    cond.signal_all();

                    for handle in handles {
                        handle.join().unwrap().ok();
                    }
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_signaled_fast_path,
    bench_register_cancel,
    bench_wake_latency,
    bench_multi_waiter_wake
);
criterion_main!(benches);
