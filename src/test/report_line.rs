use crate::perf::{ReportLine, extract_samples, last_sample, parse_sample_line};

#[test]
fn report_line_extracts_rate_from_summary_line() {
    let report = "[ 3] 0.0-10.0 sec 1100 MBytes 920 Mbits/sec\n";
    assert_eq!(extract_samples(report), vec![920.0]);
    assert_eq!(
        parse_sample_line("[  4]  0.0-10.0 sec  1115 MBytes   935.5 Mbits/sec"),
        Some(935.5)
    );
}

#[test]
fn report_line_requires_both_markers() {
    assert_eq!(
        ReportLine::classify("[  3]  0.0-10.0 sec  1.07 GBytes   920 Mbits/sec"),
        ReportLine::Other
    );
    assert_eq!(
        ReportLine::classify("[  3]  0.0-10.0 sec  1100 MBytes   920 Kbits/sec"),
        ReportLine::Other
    );
    assert_eq!(
        ReportLine::classify("Client connecting to 10.0.0.1, TCP port 5001"),
        ReportLine::Other
    );
}

#[test]
fn report_line_skips_malformed_lines() {
    assert_eq!(
        ReportLine::classify("MBytes Mbits/sec"),
        ReportLine::Malformed
    );
    assert_eq!(
        ReportLine::classify("[  3] 1100 MBytes fast Mbits/sec"),
        ReportLine::Malformed
    );

    let report = "\
------------------------------------------------------------
Client connecting to 10.0.0.1, TCP port 5001
TCP window size: 85.0 KByte (default)
------------------------------------------------------------
[  3] local 10.0.0.2 port 40000 connected with 10.0.0.1 port 5001
[  3] 1100 MBytes oops Mbits/sec
[ ID] Interval       Transfer     Bandwidth
[  3]  0.0-10.0 sec  1100 MBytes   922 Mbits/sec
";
    assert_eq!(extract_samples(report), vec![922.0]);
}

#[test]
fn report_line_last_sample_picks_summary_after_intervals() {
    let report = "\
[  3]  0.0- 1.0 sec   110 MBytes   923 Mbits/sec
[  3]  1.0- 2.0 sec   109 MBytes   915 Mbits/sec
[  3]  0.0- 2.0 sec   219 MBytes   919 Mbits/sec
connect failed: Connection refused
";
    assert_eq!(extract_samples(report).len(), 3);
    assert_eq!(last_sample(report), Some(919.0));
    assert_eq!(last_sample("connect failed: Connection refused\n"), None);
    assert_eq!(last_sample(""), None);
}
