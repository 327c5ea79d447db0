//! Small async pipeline instrumented with stepscope.
//!
//! Run with: RUST_LOG=debug cargo run --example pipeline
//! Then open trace.json in chrome://tracing, or compare two runs:
//!     cp profile.json base.json && cargo run --example pipeline
//!     cargo run -- diff base.json profile.json

use std::time::Duration;
use stepscope::{Profiler, ProfilerConfig};

fn checksum(data: &[u8]) -> u64 {
    data.iter().fold(0u64, |acc, b| acc.rotate_left(5) ^ u64::from(*b))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = ProfilerConfig::default()
        .with_enabled(true)
        .with_flame(true)
        .with_slow_threshold(40.0)
        .with_trace_file("trace.json")
        .with_diff_base_file("base.json");
    let profiler = Profiler::new(config);

    let payload = profiler
        .step_future("download", || async {
            tokio::time::sleep(Duration::from_millis(60)).await;
            vec![7u8; 1 << 20]
        })
        .await;

    let sum = profiler.step("process", || {
        let sum = profiler.step("checksum", || checksum(&payload));
        profiler.step("validate", || std::thread::sleep(Duration::from_millis(15)));
        sum
    });

    let worker = profiler.clone();
    profiler
        .step_async("upload", move || async move {
            worker.step("encode", || format!("{sum:x}"));
            tokio::time::sleep(Duration::from_millis(20)).await;
        })
        .await;

    let outcome = profiler.end("pipeline")?;
    if outcome.should_fail() {
        std::process::exit(1);
    }
    Ok(())
}
