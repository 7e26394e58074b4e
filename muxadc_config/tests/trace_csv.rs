use std::fs::File;
use std::io::Write;

use muxadc_config::{Trace, TraceRow, load_trace_csv};
use rstest::rstest;
use tempfile::tempdir;

#[rstest]
fn rows_are_grouped_per_channel_in_file_order() {
    let rows = vec![
        TraceRow { channel: 0, raw: 18 },
        TraceRow { channel: 3, raw: 30 },
        TraceRow { channel: 0, raw: 19 },
        TraceRow { channel: 3, raw: 25 },
    ];
    let trace = Trace::try_from(rows).unwrap();
    assert_eq!(trace.channels[0], vec![18, 19]);
    assert_eq!(trace.channels[3], vec![30, 25]);
    assert!(trace.channels[7].is_empty());
}

#[rstest]
fn loads_csv_with_strict_headers() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("trace.csv");
    let mut f = File::create(&path).unwrap();
    writeln!(f, "channel,raw").unwrap();
    writeln!(f, "0, 100").unwrap();
    writeln!(f, "1,200").unwrap();
    drop(f);

    let trace = load_trace_csv(&path).unwrap();
    assert_eq!(trace.channels[0], vec![100]);
    assert_eq!(trace.channels[1], vec![200]);
}

#[rstest]
#[case("raw,channel\n1,0\n", "must have headers")]
#[case("channel,raw\n0,-5\n", "invalid CSV row 2")]
#[case("channel,raw\n", "contains no readings")]
#[case("channel,raw\n9,5\n", "channel 9")]
fn rejects_bad_trace_files(#[case] body: &str, #[case] needle: &str) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.csv");
    std::fs::write(&path, body).unwrap();
    let err = load_trace_csv(&path).unwrap_err();
    assert!(
        err.to_string().contains(needle),
        "expected `{needle}` in `{err}`"
    );
}
