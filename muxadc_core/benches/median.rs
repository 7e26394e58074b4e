use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use muxadc_core::mocks::injected;
use muxadc_core::{Channel, Conversion, MedianFilter, MultiChannelAdc, WindowSize};

// Synthetic channel trace: slow ramp with an impulse every 7th sample
fn synth_trace(n: usize, seed: u32) -> Vec<u16> {
    let mut state = seed.max(1);
    let mut next = || {
        let mut x = state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        state = x;
        x
    };
    (0..n)
        .map(|i| {
            if i % 7 == 3 {
                1023
            } else {
                ((i / 4) as u16 % 800) + (next() % 8) as u16
            }
        })
        .collect()
}

fn bench_seeded_median(c: &mut Criterion) {
    let mut group = c.benchmark_group("seeded_median");
    for n in [5usize, 7, 9, 11] {
        let values = synth_trace(n, 42);
        let mut filter = MedianFilter::new(n);
        group.bench_function(format!("n{n}"), |b| {
            b.iter(|| {
                filter.reset();
                for &v in &values {
                    filter.add(black_box(v));
                }
                black_box(filter.median())
            })
        });
    }
    group.finish();
}

fn bench_sliding_median(c: &mut Criterion) {
    let trace = synth_trace(10_000, 7);
    c.bench_function("sliding_median_n11_10k", |b| {
        b.iter_batched(
            || MedianFilter::new(11),
            |mut f| {
                let mut acc = 0u32;
                for &v in &trace {
                    f.add(v);
                    acc = acc.wrapping_add(u32::from(f.median().unwrap_or(0)));
                }
                black_box(acc)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_drain(c: &mut Criterion) {
    c.bench_function("drain_8ch_n5", |b| {
        b.iter_batched(
            || {
                let (converter, _injector) = injected();
                let mut adc = MultiChannelAdc::builder()
                    .with_converter(converter)
                    .with_window(WindowSize::Five)
                    .build()
                    .unwrap();
                adc.begin().unwrap();
                let trace = synth_trace(5, 3);
                for &raw in &trace {
                    for channel in Channel::ALL {
                        adc.on_complete(Conversion { channel, raw }).unwrap();
                    }
                }
                adc
            },
            |mut adc| black_box(adc.drain()),
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_seeded_median, bench_sliding_median, bench_drain);
criterion_main!(benches);
