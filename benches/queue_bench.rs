use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use std::thread;

use crossbeam_channel::bounded;
use flume::bounded as flume_bounded;
use ringcore::{mpmc, mpsc, spsc, QueueConsumer, QueueProducer};

const MESSAGES: usize = 1_000_000;
const BUFFER_SIZE: usize = 1024;

fn bench_1p_1c(c: &mut Criterion) {
    let mut group = c.benchmark_group("1p_1c");
    group.throughput(Throughput::Elements(MESSAGES as u64));

    group.bench_function("ringcore_spsc", |b| {
        b.iter(|| {
            let (mut tx, mut rx) = spsc::queue::<usize>(BUFFER_SIZE).unwrap();

            let producer = thread::spawn(move || {
                for i in 0..MESSAGES {
                    tx.push(black_box(i));
                }
            });

            let consumer = thread::spawn(move || {
                for _ in 0..MESSAGES {
                    let _ = rx.pop();
                }
            });

            producer.join().unwrap();
            consumer.join().unwrap();
        });
    });

    group.bench_function("crossbeam_channel", |b| {
        b.iter(|| {
            let (tx, rx) = bounded::<usize>(BUFFER_SIZE);

            let producer = thread::spawn(move || {
                for i in 0..MESSAGES {
                    tx.send(black_box(i)).unwrap();
                }
            });

            let consumer = thread::spawn(move || {
                for _ in 0..MESSAGES {
                    rx.recv().unwrap();
                }
            });

            producer.join().unwrap();
            consumer.join().unwrap();
        });
    });

    group.bench_function("flume", |b| {
        b.iter(|| {
            let (tx, rx) = flume_bounded::<usize>(BUFFER_SIZE);

            let producer = thread::spawn(move || {
                for i in 0..MESSAGES {
                    tx.send(black_box(i)).unwrap();
                }
            });

            let consumer = thread::spawn(move || {
                for _ in 0..MESSAGES {
                    rx.recv().unwrap();
                }
            });

            producer.join().unwrap();
            consumer.join().unwrap();
        });
    });

    group.finish();
}

fn bench_4p_1c(c: &mut Criterion) {
    let mut group = c.benchmark_group("4p_1c");
    group.throughput(Throughput::Elements(MESSAGES as u64));
    const PRODUCERS: usize = 4;
    const MSGS_PER_PRODUCER: usize = MESSAGES / PRODUCERS;

    group.bench_function("ringcore_mpsc", |b| {
        b.iter(|| {
            let (tx, mut rx) = mpsc::queue::<usize>(BUFFER_SIZE).unwrap();
            let mut handles = vec![];

            for p in 0..PRODUCERS {
                let mut tx = tx.clone();
                handles.push(thread::spawn(move || {
                    for i in 0..MSGS_PER_PRODUCER {
                        tx.push(black_box(p * MSGS_PER_PRODUCER + i));
                    }
                }));
            }

            handles.push(thread::spawn(move || {
                for _ in 0..MESSAGES {
                    let _ = rx.pop();
                }
            }));

            for h in handles {
                h.join().unwrap();
            }
        });
    });

    group.bench_function("crossbeam_channel", |b| {
        b.iter(|| {
            let (tx, rx) = bounded::<usize>(BUFFER_SIZE);
            let mut handles = vec![];

            for p in 0..PRODUCERS {
                let tx = tx.clone();
                handles.push(thread::spawn(move || {
                    for i in 0..MSGS_PER_PRODUCER {
                        tx.send(black_box(p * MSGS_PER_PRODUCER + i)).unwrap();
                    }
                }));
            }
            drop(tx);

            handles.push(thread::spawn(move || {
                for _ in 0..MESSAGES {
                    rx.recv().unwrap();
                }
            }));

            for h in handles {
                h.join().unwrap();
            }
        });
    });

    group.bench_function("flume", |b| {
        b.iter(|| {
            let (tx, rx) = flume_bounded::<usize>(BUFFER_SIZE);
            let mut handles = vec![];

            for p in 0..PRODUCERS {
                let tx = tx.clone();
                handles.push(thread::spawn(move || {
                    for i in 0..MSGS_PER_PRODUCER {
                        tx.send(black_box(p * MSGS_PER_PRODUCER + i)).unwrap();
                    }
                }));
            }
            drop(tx);

            handles.push(thread::spawn(move || {
                for _ in 0..MESSAGES {
                    rx.recv().unwrap();
                }
            }));

            for h in handles {
                h.join().unwrap();
            }
        });
    });

    group.finish();
}

fn bench_4p_4c(c: &mut Criterion) {
    let mut group = c.benchmark_group("4p_4c");
    group.throughput(Throughput::Elements(MESSAGES as u64));
    const PRODUCERS: usize = 4;
    const CONSUMERS: usize = 4;
    const MSGS_PER_PRODUCER: usize = MESSAGES / PRODUCERS;
    const MSGS_PER_CONSUMER: usize = MESSAGES / CONSUMERS;

    group.bench_function("ringcore_mpmc", |b| {
        b.iter(|| {
            let (tx, rx) = mpmc::queue::<usize>(BUFFER_SIZE).unwrap();
            let mut handles = vec![];

            for p in 0..PRODUCERS {
                let mut tx = tx.clone();
                handles.push(thread::spawn(move || {
                    for i in 0..MSGS_PER_PRODUCER {
                        tx.push(black_box(p * MSGS_PER_PRODUCER + i));
                    }
                }));
            }

            for _ in 0..CONSUMERS {
                let mut rx = rx.clone();
                handles.push(thread::spawn(move || {
                    for _ in 0..MSGS_PER_CONSUMER {
                        let _ = rx.pop();
                    }
                }));
            }

            for h in handles {
                h.join().unwrap();
            }
        });
    });

    group.bench_function("crossbeam_channel", |b| {
        b.iter(|| {
            let (tx, rx) = bounded::<usize>(BUFFER_SIZE);
            let mut handles = vec![];

            for p in 0..PRODUCERS {
                let tx = tx.clone();
                handles.push(thread::spawn(move || {
                    for i in 0..MSGS_PER_PRODUCER {
                        tx.send(black_box(p * MSGS_PER_PRODUCER + i)).unwrap();
                    }
                }));
            }
            drop(tx);

            for _ in 0..CONSUMERS {
                let rx = rx.clone();
                handles.push(thread::spawn(move || {
                    for _ in 0..MSGS_PER_CONSUMER {
                        rx.recv().unwrap();
                    }
                }));
            }

            for h in handles {
                h.join().unwrap();
            }
        });
    });

    group.bench_function("flume", |b| {
        b.iter(|| {
            let (tx, rx) = flume_bounded::<usize>(BUFFER_SIZE);
            let mut handles = vec![];

            for p in 0..PRODUCERS {
                let tx = tx.clone();
                handles.push(thread::spawn(move || {
                    for i in 0..MSGS_PER_PRODUCER {
                        tx.send(black_box(p * MSGS_PER_PRODUCER + i)).unwrap();
                    }
                }));
            }
            drop(tx);

            for _ in 0..CONSUMERS {
                let rx = rx.clone();
                handles.push(thread::spawn(move || {
                    for _ in 0..MSGS_PER_CONSUMER {
                        rx.recv().unwrap();
                    }
                }));
            }

            for h in handles {
                h.join().unwrap();
            }
        });
    });

    group.finish();
}

fn bench_spsc_batches(c: &mut Criterion) {
    let mut group = c.benchmark_group("spsc_batch");
    group.throughput(Throughput::Elements(MESSAGES as u64));
    const BATCH: usize = 256;

    group.bench_function("ringcore_spsc_batch", |b| {
        b.iter(|| {
            let (mut tx, mut rx) = spsc::queue::<usize>(BUFFER_SIZE).unwrap();

            let producer = thread::spawn(move || {
                let mut items = Vec::with_capacity(BATCH);
                for chunk in 0..MESSAGES / BATCH {
                    items.extend(chunk * BATCH..(chunk + 1) * BATCH);
                    tx.push_batch(&mut items);
                }
            });

            let consumer = thread::spawn(move || {
                let mut out = Vec::with_capacity(BATCH);
                let mut received = 0;
                while received < MESSAGES {
                    out.clear();
                    let n = rx.try_pop_batch(&mut out, BATCH);
                    if n == 0 {
                        thread::yield_now();
                    }
                    received += n;
                }
            });

            producer.join().unwrap();
            consumer.join().unwrap();
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_1p_1c,
    bench_4p_1c,
    bench_4p_4c,
    bench_spsc_batches
);
criterion_main!(benches);
