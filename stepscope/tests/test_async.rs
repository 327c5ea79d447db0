use std::time::Duration;
use stepscope::export::export_to;
use stepscope::{EventSource, Profiler, ProfilerConfig, SourceCapture, StepKind, SummaryOptions};

#[tokio::test]
async fn test_step_future_records_io_step() {
    let profiler = Profiler::new(ProfilerConfig::default());

    let value = profiler
        .step_future("fetch", || async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            7
        })
        .await;
    assert_eq!(value, 7);

    let event = &profiler.snapshot().events[0];
    assert_eq!(event.name, "fetch");
    assert!(event.is_async);
    assert_eq!(event.kind, StepKind::Io);
    assert!(event.duration >= 5.0);
}

#[tokio::test]
async fn test_step_async_nests_sync_children() {
    let profiler = Profiler::new(ProfilerConfig::default());
    let inner = profiler.clone();

    let value = profiler
        .step_async("request", move || async move {
            tokio::time::sleep(Duration::from_millis(1)).await;
            inner.step("parse", || 2) + 1
        })
        .await;
    assert_eq!(value, 3);

    let profile = profiler.end("Total").unwrap().profile;
    let names: Vec<_> = profile.events.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["parse", "request"]);
    assert_eq!(profile.events[0].depth, 1);
    assert_eq!(profile.events[0].kind, StepKind::Cpu);
    assert_eq!(profile.events[1].kind, StepKind::Io);
    assert_eq!(profile.events[1].children[0].name, "parse");
}

#[tokio::test]
async fn test_step_async_opens_when_polled() {
    let profiler = Profiler::new(ProfilerConfig::default());

    let pending = profiler.step_async("later", || async { 1 });
    profiler.step("first", || ());
    pending.await;

    let profile = profiler.snapshot();
    let names: Vec<_> = profile.events.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["first", "later"]);
    assert!(profile.events.iter().all(|e| e.depth == 0));
}

#[tokio::test]
async fn test_async_error_passes_through() {
    let profiler = Profiler::new(ProfilerConfig::default());

    let result: Result<u8, &str> = profiler.step_future("load", || async { Err("offline") }).await;
    assert_eq!(result, Err("offline"));
    assert_eq!(profiler.snapshot().events.len(), 1);
}

#[tokio::test]
async fn test_cancelled_future_is_not_recorded() {
    let profiler = Profiler::new(ProfilerConfig::default());

    let never = profiler.step_future("cancelled", || std::future::pending::<()>());
    let timed_out = tokio::time::timeout(Duration::from_millis(5), never).await;
    assert!(timed_out.is_err());

    profiler.step("next", || ());

    let outcome = profiler.end("Total").unwrap();
    assert_eq!(outcome.profile.events.len(), 1);
    assert_eq!(outcome.profile.events[0].name, "next");
    assert_eq!(outcome.profile.events[0].depth, 0);
    assert!(outcome.stack_violations.is_empty());
}

#[tokio::test]
async fn test_sequential_awaits_keep_stack_balanced() {
    let profiler = Profiler::new(ProfilerConfig::default());

    for i in 0..3u64 {
        profiler
            .step_future(format!("io-{i}"), || tokio::time::sleep(Duration::from_millis(i)))
            .await;
    }

    let outcome = profiler.end("Total").unwrap();
    assert_eq!(outcome.profile.events.len(), 3);
    assert!(outcome.profile.events.iter().all(|e| e.depth == 0 && e.is_async));
    assert!(outcome.stack_violations.is_empty());
}

#[tokio::test]
async fn test_finished_child_of_cancelled_step_is_reported() {
    let profiler = Profiler::new(ProfilerConfig::default());
    let worker = profiler.clone();

    let request = profiler.step_async("request", move || async move {
        worker.step("parse", || ());
        std::future::pending::<()>().await;
    });
    assert!(tokio::time::timeout(Duration::from_millis(5), request).await.is_err());

    let profile = profiler.snapshot();
    assert_eq!(profile.events.len(), 1);
    assert_eq!(profile.events[0].depth, 1);

    let summary = profiler.summary(SummaryOptions::default());
    assert_eq!(summary.top.len(), 1);
    assert_eq!(summary.top[0].name, "parse");

    let mut buffer = Vec::new();
    export_to(&profile.events, &mut buffer).unwrap();
    let trace: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
    assert_eq!(trace["traceEvents"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_backtrace_capture_for_future_points_at_caller() {
    let profiler = Profiler::new(
        ProfilerConfig::default()
            .with_slow_threshold(0.0)
            .with_hot_threshold(1.1)
            .with_source_capture(SourceCapture::Backtrace),
    );
    profiler.step_future("fetch", || tokio::time::sleep(Duration::from_millis(1))).await;

    let event = &profiler.snapshot().events[0];
    let Some(EventSource::Location(ref loc)) = event.source else {
        panic!("expected a source location, got {:?}", event.source);
    };
    assert!(loc.file.ends_with("test_async.rs"), "{}", loc.file);
}
