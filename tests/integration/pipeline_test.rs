use atopflux::core::atop::{Collector, CollectorConfig, FieldValue, LineOutcome};
use atopflux::core::sink::{MemorySink, MetricSink};

const CPU_LINE: &str =
    "CPU host1 1000 2024-01-01 00:00:01 1 100 4 10 20 5 50 2 1 0 2 0 0 2000 50 0 0";
const CPL_LINE: &str = "CPL host1 1000 2024-01-01 00:00:01 1 4 0.52 0.31 0.12 123456 789";
const MEM_LINE: &str =
    "MEM host1 1001 2024-01-01 00:00:02 1 4096 1000 200 300 50 40 1 20 0 10 0 5 2048 8 4 0 0 0";
const DSK_LINE: &str = "DSK host1 1001 2024-01-01 00:00:02 1 sda 250 10 80 20 160 0 0";

/// A typical atop session: a warm-up interval since boot, then steady samples.
fn session() -> String {
    [
        "RESET",
        "CPU host1 999 2024-01-01 00:00:00 86400 100 4 1 1 1 1 1 1 1 1 1 0 0 0 0",
        "MEM host1 999 2024-01-01 00:00:00 86400 4096 1 1 1 1 1 1 1 1 1 1 1 2048 1 1 0 0 0",
        "SEP",
        CPU_LINE,
        CPL_LINE,
        "NET host1 1000 2024-01-01 00:00:01 1 upper 1 2 3",
        "",
        "SEP",
        MEM_LINE,
        DSK_LINE,
        "DSK host1 1001 2024-01-01 00:00:02 1 nvme0n1 100 1 8 1 8 0 0",
        "SEP",
    ]
    .join("\n")
}

#[test]
fn test_session_batches() {
    let mut collector = Collector::new(MemorySink::default());
    let stats = collector.run(session().as_bytes()).unwrap();

    let sink = collector.into_sink();
    let sizes: Vec<usize> = sink.batches.iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![0, 2, 3]);

    assert_eq!(stats.batches, 3);
    assert_eq!(stats.records, 5);
    assert_eq!(stats.stale, 2);
    assert_eq!(stats.ignored, 1);
    assert_eq!(stats.malformed, 0);
}

#[test]
fn test_session_disk_tags() {
    let mut collector = Collector::new(MemorySink::default());
    collector.run(session().as_bytes()).unwrap();

    let sink = collector.into_sink();
    let disks: Vec<&str> = sink
        .records()
        .filter_map(|r| r.tags.get("disk").map(String::as_str))
        .collect();
    assert_eq!(disks, vec!["sda", "nvme0n1"]);
}

#[test]
fn test_cpu_then_mem_are_separate_writes() {
    let input = format!("{}\nSEP\n{}\nSEP\n", CPU_LINE, MEM_LINE);
    let mut collector = Collector::new(MemorySink::default());
    collector.run(input.as_bytes()).unwrap();

    let sink = collector.into_sink();
    assert_eq!(sink.batches.len(), 2);
    assert_eq!(sink.batches[0].len(), 1);
    assert_eq!(sink.batches[1].len(), 1);
    assert!(sink.batches[0][0].fields.contains_key("cpu.usage"));
    assert!(sink.batches[1][0].fields.contains_key("mem.usage"));
}

#[test]
fn test_reset_then_sep_writes_empty_batch() {
    let mut collector = Collector::new(MemorySink::default());
    assert_eq!(collector.process_line("RESET").unwrap(), LineOutcome::Reset);
    assert_eq!(collector.process_line("SEP").unwrap(), LineOutcome::Flushed(0));

    let sink = collector.into_sink();
    assert_eq!(sink.batches.len(), 1);
    assert!(sink.batches[0].is_empty());
}

#[test]
fn test_cpu_scenario_values() {
    let mut collector = Collector::new(MemorySink::default());
    collector.process_line(CPU_LINE).unwrap();
    let record = &collector.pending()[0];

    let get = |key: &str| record.field(key).unwrap().as_f64();
    assert!((get("cpu.sys") - 0.10).abs() < 1e-9);
    assert!((get("cpu.idle") - 0.50).abs() < 1e-9);
    assert!((get("cpu.usage") - 0.875).abs() < 1e-9);
    assert_eq!(record.measurement, "performance");
    assert!(record.tags.is_empty());
}

#[test]
fn test_same_line_twice_gives_equal_records() {
    let mut collector = Collector::new(MemorySink::default());
    collector.process_line(DSK_LINE).unwrap();
    collector.process_line(DSK_LINE).unwrap();

    let pending = collector.pending();
    assert_eq!(pending.len(), 2);
    assert_eq!(pending[0], pending[1]);
}

#[test]
fn test_stale_lines_never_reach_the_batch() {
    for line in [CPU_LINE, CPL_LINE, MEM_LINE, DSK_LINE] {
        let stale = line.replacen(":01 1 ", ":01 2 ", 1).replacen(":02 1 ", ":02 2 ", 1);
        let mut collector = Collector::new(MemorySink::default());
        assert_eq!(collector.process_line(&stale).unwrap(), LineOutcome::Stale);
        assert!(collector.pending().is_empty());
    }
}

#[test]
fn test_longer_interval_raises_staleness_limit() {
    let config = CollectorConfig {
        max_delta_secs: 5,
        ..Default::default()
    };
    let line = CPL_LINE.replacen(":01 1 ", ":01 5 ", 1);
    let mut collector = Collector::with_config(MemorySink::default(), config);
    assert_eq!(collector.process_line(&line).unwrap(), LineOutcome::Appended);
}

#[test]
fn test_load_fields() {
    let mut collector = Collector::new(MemorySink::default());
    collector.process_line(CPL_LINE).unwrap();
    let record = &collector.pending()[0];
    assert_eq!(record.field("load.load1"), Some(FieldValue::Float(0.52)));
    assert_eq!(record.field("load.ctxsw"), Some(FieldValue::Int(123456)));
}

#[test]
fn test_container_creation_is_idempotent() {
    let mut sink = MemorySink::default();
    sink.ensure_container("performance").unwrap();
    sink.ensure_container("performance").unwrap();
    assert_eq!(sink.containers, vec!["performance".to_string()]);
}

#[test]
fn test_failed_write_stops_run() {
    let sink = MemorySink {
        fail_writes: true,
        ..Default::default()
    };
    let mut collector = Collector::new(sink);
    let result = collector.run(session().as_bytes());
    assert!(result.is_err());
    assert_eq!(collector.stats().batches, 0);
}
