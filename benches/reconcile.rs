use criterion::{black_box, criterion_group, criterion_main, Criterion};
use slotgrid::columns::{ColumnSet, GridColumn};
use slotgrid::slots::{SlotSpace, TreeSpec};

fn create_column_set(count: usize) -> ColumnSet {
    let mut set = ColumnSet::new();
    for i in 0..count {
        set.push_column(GridColumn::new(format!("col{i}")).with_width(12), None);
    }
    set
}

fn create_wide_tree(roots: usize, children: usize) -> Vec<TreeSpec> {
    (0..roots)
        .map(|r| {
            TreeSpec::branch(
                format!("root{r}"),
                false,
                (0..children)
                    .map(|c| TreeSpec::leaf(format!("r{r}c{c}")))
                    .collect(),
            )
        })
        .collect()
}

fn benchmark_incremental_inserts(c: &mut Criterion) {
    let mut group = c.benchmark_group("column_insert");

    for &count in &[100usize, 1_000] {
        group.bench_function(format!("{count}_columns"), |b| {
            b.iter(|| {
                let mut set = create_column_set(count);
                // worst case: every insert at display 0 moves everything
                set.insert_column(0, GridColumn::new("probe"), Some(0));
                black_box(set.len())
            })
        });
    }
    group.finish();
}

fn benchmark_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");

    for &count in &[100usize, 1_000, 5_000] {
        group.bench_function(format!("{count}_columns_reversed"), |b| {
            b.iter(|| {
                let mut set = create_column_set(count);
                for i in 0..count {
                    set.stage_display_index(i, count - 1 - i);
                }
                set.normalize();
                black_box(set.display_order().len())
            })
        });
    }
    group.finish();
}

fn benchmark_expand_collapse(c: &mut Criterion) {
    let mut group = c.benchmark_group("expand_collapse");

    group.bench_function("100_roots_x_100_children", |b| {
        let mut slots = SlotSpace::new();
        slots.bind_tree(create_wide_tree(100, 100));
        b.iter(|| {
            // toggle a root in the middle of the space
            slots.expand_node(black_box(50 * 101));
            slots.collapse_node(black_box(50 * 101));
            black_box(slots.slot_count())
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    benchmark_incremental_inserts,
    benchmark_normalize,
    benchmark_expand_collapse
);
criterion_main!(benches);
