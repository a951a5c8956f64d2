use brink::buffer::iter::BlockPos;
use brink::buffer::Buffer;
use brink::edit::EditCtx;
use brink::view::View;
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

fn sample_text(lines: usize) -> Vec<u8> {
    let mut out = Vec::new();
    for i in 0..lines {
        out.extend_from_slice(format!("line {} with some text on it\n", i).as_bytes());
    }
    out
}

fn buffer_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer_operations");

    group.bench_function("from_bytes_10k_lines", |b| {
        let text = sample_text(10_000);
        b.iter(|| Buffer::from_bytes(black_box(&text)))
    });

    group.bench_function("insert_churn", |b| {
        b.iter_batched(
            || {
                let buffer = Buffer::from_bytes(&sample_text(1_000));
                let view = View::new();
                (buffer, view)
            },
            |(mut buffer, mut view)| {
                let mut ctx = EditCtx::new(&mut buffer, &mut view);
                for i in 0..100 {
                    ctx.move_to_offset(i * 29);
                    ctx.insert_text(b"xyz\n");
                }
                buffer
            },
            criterion::BatchSize::SmallInput,
        )
    });

    group.bench_function("delete_churn", |b| {
        b.iter_batched(
            || {
                let buffer = Buffer::from_bytes(&sample_text(1_000));
                let view = View::new();
                (buffer, view)
            },
            |(mut buffer, mut view)| {
                let mut ctx = EditCtx::new(&mut buffer, &mut view);
                for _ in 0..100 {
                    ctx.move_to_offset(0);
                    ctx.delete(17, false);
                }
                buffer
            },
            criterion::BatchSize::SmallInput,
        )
    });

    group.bench_function("undo_redo_cycle", |b| {
        b.iter_batched(
            || {
                let mut buffer = Buffer::from_bytes(&sample_text(100));
                let mut view = View::new();
                {
                    let mut ctx = EditCtx::new(&mut buffer, &mut view);
                    for i in 0..50 {
                        ctx.move_to_offset(i);
                        ctx.insert_text(b"y");
                    }
                }
                (buffer, view)
            },
            |(mut buffer, mut view)| {
                let mut ctx = EditCtx::new(&mut buffer, &mut view);
                while ctx.undo().is_ok() {}
                while ctx.redo(None).is_ok() {}
                buffer
            },
            criterion::BatchSize::SmallInput,
        )
    });

    group.bench_function("iterate_bytes", |b| {
        let buffer = Buffer::from_bytes(&sample_text(1_000));
        b.iter(|| {
            let mut it = buffer.iter(BlockPos::default());
            let mut sum = 0usize;
            while let Some(byte) = it.next_byte() {
                sum += usize::from(byte);
            }
            sum
        })
    });

    group.finish();
}

criterion_group!(benches, buffer_operations);
criterion_main!(benches);
