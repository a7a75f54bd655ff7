use bumpalo::Bump;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use jsa_parser::parse;
use jsa_scanner::tokenize;

// The sample program repeated so a run covers a few hundred lines.
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
let flags = { verbose: true, depth: 3 * (2 + 1) };
"#;

fn bench_lex(c: &mut Criterion) {
    let source = SAMPLE.repeat(20);
    c.bench_function("lex_sample", |b| {
        b.iter(|| black_box(tokenize(black_box(&source))));
    });
}

fn bench_parse(c: &mut Criterion) {
    let source = SAMPLE.repeat(20);
    let lexed = tokenize(&source);
    c.bench_function("parse_sample", |b| {
        b.iter(|| {
            let arena = Bump::new();
            let result = parse(&arena, black_box(&lexed.tokens));
            black_box(result.program.statements.len());
        });
    });
}

criterion_group!(benches, bench_lex, bench_parse);
criterion_main!(benches);
