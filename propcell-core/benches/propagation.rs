use criterion::{black_box, criterion_group, criterion_main, Criterion};

use propcell_core::lattice::merge;
use propcell_core::reactive::{connect, Cell};

fn temperature_cycle(c: &mut Criterion) {
    let celsius = Cell::empty(merge::within(0.01));
    let fahrenheit = Cell::empty(merge::within(0.01));
    let kelvin = Cell::empty(merge::within(0.01));

    connect(|c: &f64| c * 9.0 / 5.0 + 32.0, &celsius, &fahrenheit);
    connect(|c: &f64| c + 273.15, &celsius, &kelvin);
    connect(|f: &f64| (f - 32.0) * 5.0 / 9.0, &fahrenheit, &celsius);
    connect(|f: &f64| (f - 32.0) * 5.0 / 9.0 + 273.15, &fahrenheit, &kelvin);
    connect(|k: &f64| k - 273.15, &kelvin, &celsius);
    connect(|k: &f64| (k - 273.15) * 9.0 / 5.0 + 32.0, &kelvin, &fahrenheit);

    let mut next = 0.0;
    c.bench_function("temperature_cycle_write", |b| {
        b.iter(|| {
            next += 1.0;
            celsius.write(black_box(next));
        })
    });
}

fn fan_out(c: &mut Criterion) {
    let source = Cell::empty(merge::max::<u64>());
    let sinks: Vec<Cell<u64>> = (0..64).map(|_| Cell::empty(merge::max())).collect();
    for sink in &sinks {
        connect(|v: &u64| *v, &source, sink);
    }

    let mut next = 0u64;
    c.bench_function("fan_out_64", |b| {
        b.iter(|| {
            next += 1;
            source.write(black_box(next));
        })
    });
}

fn settled_write(c: &mut Criterion) {
    let cell = Cell::new(1u64, merge::equality());
    cell.listen(|v| {
        black_box(v);
    });

    c.bench_function("settled_write", |b| b.iter(|| cell.write(black_box(1))));
}

criterion_group!(benches, temperature_cycle, fan_out, settled_write);
criterion_main!(benches);
