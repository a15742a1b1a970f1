use criterion::{criterion_group, criterion_main, Criterion};
use hybrid_core::fusion::{rrf_fuse, weighted_fuse};
use hybrid_core::{Bm25Params, Document, InvertedIndex, TextNormalizer};

const WORDS: &[&str] = &[
    "bear", "london", "heist", "space", "detective", "ocean", "robot", "dragon", "wizard", "city",
    "family", "war", "love", "island", "storm", "secret", "king", "ghost", "train", "desert",
];

fn corpus(n: u32) -> Vec<Document> {
    (0..n)
        .map(|i| {
            let description: Vec<&str> = (0..40).map(|j| WORDS[((i * 7 + j * 13) % WORDS.len() as u32) as usize]).collect();
            Document { id: i, title: format!("Movie {i}"), description: description.join(" ") }
        })
        .collect()
}

fn bench_search(c: &mut Criterion) {
    let index = InvertedIndex::build(corpus(5_000), TextNormalizer::default()).unwrap();
    let params = Bm25Params::default();
    c.bench_function("bm25_search_5k", |b| b.iter(|| index.bm25_search("bear in london heist", 100, params).unwrap()));

    let lexical = index.bm25_search("bear london", 2_500, params).unwrap();
    let semantic: Vec<(u32, f64)> = lexical.iter().rev().map(|&(id, s)| (id, 1.0 / (1.0 + s))).collect();
    c.bench_function("weighted_fuse_2500", |b| b.iter(|| weighted_fuse(&lexical, &semantic, 0.5, 5)));
    c.bench_function("rrf_fuse_2500", |b| b.iter(|| rrf_fuse(&lexical, &semantic, 60.0, 5)));
}

criterion_group!(benches, bench_search);
criterion_main!(benches);
