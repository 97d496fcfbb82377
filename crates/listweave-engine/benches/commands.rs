use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use listweave_engine::editing::{
    Document, lift_list_item, sink_list_item, split_list_item, wrap_in_list,
};
use listweave_engine::schema::default_schema;

/// A bullet list of `items` items with the cursor in the middle one.
fn list_document(items: usize) -> String {
    let body: Vec<String> = (0..items)
        .map(|i| {
            if i == items / 2 {
                format!(r#"li(p("item <a>{i}"), ul(li(p("nested {i}"))))"#)
            } else {
                format!(r#"li(p("item {i}"))"#)
            }
        })
        .collect();
    format!("doc(ul({}))", body.join(", "))
}

/// `paragraphs` paragraphs with the selection across all of them.
fn paragraph_document(paragraphs: usize) -> String {
    let body: Vec<String> = (0..paragraphs)
        .map(|i| match i {
            0 => r#"p("<a>first")"#.to_string(),
            i if i + 1 == paragraphs => r#"p("last<b>")"#.to_string(),
            i => format!(r#"p("paragraph {i}")"#),
        })
        .collect();
    format!("doc({})", body.join(", "))
}

fn bench_list_commands(c: &mut Criterion) {
    let mut group = c.benchmark_group("commands");
    group.sample_size(10);

    let schema = default_schema();
    let item = schema.node_type("list_item").unwrap();
    let bullet = schema.node_type("bullet_list").unwrap();
    let list = Document::from_notation(&schema, &list_document(200)).unwrap();
    let paragraphs = Document::from_notation(&schema, &paragraph_document(200)).unwrap();

    let commands = [
        ("split", split_list_item(item.clone(), None)),
        ("lift", lift_list_item(item.clone())),
        ("sink", sink_list_item(item)),
    ];
    for (name, cmd) in &commands {
        group.bench_function(format!("{name}_dry_run"), |b| {
            b.iter(|| std::hint::black_box(list.can_apply(std::hint::black_box(cmd))))
        });
        group.bench_function(*name, |b| {
            b.iter_batched(
                || list.clone(),
                |mut doc| std::hint::black_box(doc.apply(cmd)),
                BatchSize::SmallInput,
            )
        });
    }

    let wrap = wrap_in_list(bullet, None);
    group.bench_function("wrap_200_paragraphs", |b| {
        b.iter_batched(
            || paragraphs.clone(),
            |mut doc| std::hint::black_box(doc.apply(&wrap)),
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

criterion_group!(benches, bench_list_commands);
criterion_main!(benches);
