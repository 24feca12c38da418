use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tsuzuri::buffer::DynString;
use tsuzuri::Buffer;

fn sample_text(lines: usize) -> String {
    (0..lines)
        .map(|n| format!("line {} of the benchmark text", n))
        .collect::<Vec<_>>()
        .join("\n")
}

fn benchmark_typing(c: &mut Criterion) {
    c.bench_function("buffer_insert_chars", |b| {
        b.iter(|| {
            let mut buffer = Buffer::new(1, "bench");
            for i in 0..1000 {
                let ch = if i % 40 == 39 { '\n' } else { 'a' };
                buffer.insert_char(black_box(ch)).unwrap();
            }
            buffer
        });
    });
}

fn benchmark_offset_conversion(c: &mut Criterion) {
    let buffer = Buffer::from_text(1, "bench", &sample_text(2000));
    let len = buffer.len_chars();

    c.bench_function("offset_to_point_round_trip", |b| {
        b.iter(|| {
            for offset in (0..len).step_by(997) {
                let pt = buffer.offset_to_point(black_box(offset));
                black_box(buffer.point_to_offset(pt));
            }
        });
    });
}

fn benchmark_markers(c: &mut Criterion) {
    c.bench_function("insert_with_markers", |b| {
        b.iter(|| {
            let mut buffer = Buffer::from_text(1, "bench", &sample_text(200));
            for offset in (0..buffer.len_chars()).step_by(50) {
                let pt = buffer.offset_to_point(offset);
                buffer.create_marker(pt);
            }
            buffer.goto_offset(0);
            for _ in 0..200 {
                buffer.insert_string(black_box("xy\n")).unwrap();
            }
            buffer
        });
    });
}

fn benchmark_deletion(c: &mut Criterion) {
    let text = sample_text(500);
    c.bench_function("buffer_delete_across_lines", |b| {
        b.iter(|| {
            let mut buffer = Buffer::from_text(1, "bench", &text);
            while buffer.len_chars() > 0 {
                buffer.delete_nstring(black_box(37)).unwrap();
            }
            buffer
        });
    });
}

fn benchmark_dyn_string(c: &mut Criterion) {
    c.bench_function("dyn_string_insert_middle", |b| {
        b.iter(|| {
            let mut line = DynString::new();
            for i in 0..500 {
                let middle = (line.len() / 2) as isize;
                line.insert_char(black_box(middle), if i % 2 == 0 { 'a' } else { 'b' });
            }
            line
        });
    });
}

criterion_group!(
    benches,
    benchmark_typing,
    benchmark_offset_conversion,
    benchmark_markers,
    benchmark_deletion,
    benchmark_dyn_string
);
criterion_main!(benches);
