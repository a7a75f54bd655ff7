//! Benchmark harness for the full analysis pipeline.
//!
//! Run with: cargo bench -p jsa_compiler

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use jsa_compiler::Pipeline;

const SAMPLE: &str = r#"
class Calculator {
  constructor() {
    this.history = [];
    this.precision = 2;
  }

  add(a, b) {
    const result = a + b;
    this.history.push(`${a} + ${b} = ${result}`);
    return parseFloat(result.toFixed(this.precision));
  }

  divide(a, b) {
    if (b === 0) {
      console.warn("Division by zero");
      return Infinity;
    }
    return a / b;
  }
}

const calc = new Calculator();
const sum = calc.add(10, 5);
const division = calc.divide(10, 0);
const folded = 2 * 3 + 4 > 9 ? "big" : "small";
"#;

fn bench_pipeline(c: &mut Criterion) {
    let pipeline = Pipeline::default();
    let mut group = c.benchmark_group("pipeline");
    for copies in [1, 10, 50] {
        let source = SAMPLE.repeat(copies);
        group.bench_with_input(BenchmarkId::from_parameter(copies), &source, |b, source| {
            b.iter(|| black_box(pipeline.analyze(black_box(source))));
        });
    }
    group.finish();
}

fn bench_batch(c: &mut Criterion) {
    let pipeline = Pipeline::default();
    let sources: Vec<String> = (0..32).map(|i| format!("{}\nconst k{} = {};", SAMPLE, i, i)).collect();
    c.bench_function("analyze_many_32", |b| {
        b.iter(|| black_box(pipeline.analyze_many(black_box(&sources))));
    });
}

criterion_group!(benches, bench_pipeline, bench_batch);
criterion_main!(benches);
