use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use senteval::features::{VectorizerKind, VectorizerParams};

const DOC_COUNT: usize = 2_000;

const WORDS: [&str; 12] = [
    "great", "awful", "film", "plot", "moving", "tedious", "acting", "script", "charming",
    "bland", "story", "cast",
];

fn corpus() -> Vec<String> {
    (0..DOC_COUNT)
        .map(|i| {
            (0..12)
                .map(|j| WORDS[(i * 7 + j * 5) % WORDS.len()])
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

fn bench_vectorizers(c: &mut Criterion) {
    let texts = corpus();
    let params = VectorizerParams {
        ngram_max: 2,
        ..VectorizerParams::default()
    };
    for kind in VectorizerKind::ALL {
        c.bench_with_input(BenchmarkId::new("fit", kind), &texts, |b, texts| {
            b.iter(|| kind.fit(black_box(texts), params.clone()).expect("fit"));
        });
        let fitted = kind.fit(&texts, params.clone()).expect("fit");
        c.bench_with_input(BenchmarkId::new("transform", kind), &texts, |b, texts| {
            b.iter(|| fitted.transform(black_box(texts)));
        });
    }
}

criterion_group!(benches, bench_vectorizers);
criterion_main!(benches);
