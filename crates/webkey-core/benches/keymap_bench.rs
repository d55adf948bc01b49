//! Criterion benchmarks for key name resolution and frame decoding.
//!
//! Both run once per incoming keyboard event, so they sit on the hot path
//! between the socket and the event queue.
//!
//! Run with:
//! ```bash
//! cargo bench --package webkey-core --bench keymap_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use webkey_core::keymap::linux_x11::key_to_keysym;
use webkey_core::{Key, RealtimeFrame};

/// Names the browser keyboard sends most often, plus one miss.
const BENCH_KEY_NAMES: &[&str] = &[
    "a", "Z", "enter", "backspace", "shift_l", "CTRL_L", "space", "f12", "page_down", "hyper",
];

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("key_resolve");
    for name in BENCH_KEY_NAMES {
        group.bench_with_input(BenchmarkId::from_parameter(name), name, |b, name| {
            b.iter(|| Key::resolve(black_box(name)))
        });
    }
    group.finish();
}

fn bench_resolve_to_keysym(c: &mut Criterion) {
    c.bench_function("resolve_all_to_keysym", |b| {
        b.iter(|| {
            for name in BENCH_KEY_NAMES {
                if let Ok(key) = Key::resolve(black_box(name)) {
                    black_box(key_to_keysym(key));
                }
            }
        })
    });
}

fn bench_frame_decode(c: &mut Criterion) {
    let frames = [
        (
            "key_event",
            r#"{"event":"key_event","token":"5b1f6a2e-0000-4000-8000-000000000000","key":"a","action":"down"}"#,
        ),
        (
            "mouse_event",
            r#"{"event":"mouse_event","token":"5b1f6a2e-0000-4000-8000-000000000000","type":"move","dx":3.5,"dy":-1}"#,
        ),
        (
            "text_event",
            r#"{"event":"text_event","token":"5b1f6a2e-0000-4000-8000-000000000000","text":"hello world"}"#,
        ),
    ];

    let mut group = c.benchmark_group("frame_decode");
    for (label, text) in frames {
        group.bench_with_input(BenchmarkId::from_parameter(label), text, |b, text| {
            b.iter(|| {
                RealtimeFrame::parse(black_box(text)).and_then(RealtimeFrame::into_event)
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_resolve,
    bench_resolve_to_keysym,
    bench_frame_decode
);
criterion_main!(benches);
