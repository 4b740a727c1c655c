use std::io::Cursor;
use std::path::Path;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use portsh::patterns::TableCache;
use portsh::{scan_lines, ScanOptions};

/// A script exercising every pipeline stage: clean lines, pattern hits,
/// comments, quoted regions, and a heredoc per block.
fn synthetic_script(blocks: usize) -> String {
    let mut script = String::from("#!/bin/sh\n");
    for i in 0..blocks {
        script.push_str(&format!("# block {i}\n"));
        script.push_str("for f in /etc/profile.d/*.sh; do\n");
        script.push_str("    [ -r \"$f\" ] && . \"$f\"\n");
        script.push_str("done\n");
        script.push_str("if [[ -f /etc/default/locale ]]; then\n");
        script.push_str("    echo \"seed: $RANDOM\" # not portable\n");
        script.push_str("fi\n");
        script.push_str("cat <<EOF\n");
        script.push_str("heredoc body with $RANDOM and [[ ignored ]]\n");
        script.push_str("EOF\n");
        script.push_str("printf '%s\\n' 'plain text'\n");
    }
    script
}

fn bench_scan(c: &mut Criterion) {
    let script = synthetic_script(100);
    let opts = ScanOptions::default();
    let mut cache = TableCache::new();

    let mut group = c.benchmark_group("scanner");
    group.bench_function("thousand_line_script", |b| {
        b.iter(|| {
            let mut findings = 0usize;
            let status = scan_lines(
                Cursor::new(black_box(script.as_str())),
                Path::new("bench.sh"),
                &opts,
                &mut cache,
                None,
                &mut |_event| findings += 1,
            )
            .expect("in-memory reads cannot fail");
            black_box((status, findings))
        })
    });
    group.finish();
}

criterion_group!(benches, bench_scan);
criterion_main!(benches);
