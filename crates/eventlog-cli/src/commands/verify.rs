//! Verify command implementation.

use crate::output::truncate;
use eventlog_cache::{list_in_progress, scan_segments, CacheError, CacheFileReader};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
struct SegmentReport {
    segment: String,
    records: u64,
    status: String,
}

impl SegmentReport {
    fn ok(&self) -> bool {
        self.status == "ok"
    }
}

fn check_segment(path: &Path) -> SegmentReport {
    let segment = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    match decode_all(path) {
        Ok(records) => SegmentReport {
            segment,
            records,
            status: "ok".to_string(),
        },
        Err((records, e)) => SegmentReport {
            segment,
            records,
            status: e.to_string(),
        },
    }
}

/// Decodes every record of a segment, returning how many were read.
pub(crate) fn decode_all(path: &Path) -> Result<u64, (u64, CacheError)> {
    let mut reader = CacheFileReader::open(path).map_err(|e| (0, e))?;
    loop {
        match reader.read_record() {
            Ok(Some(_)) => {}
            Ok(None) => return Ok(reader.records_read()),
            Err(e) => return Err((reader.records_read(), e)),
        }
    }
}

pub fn run(
    directory: String,
    strict: bool,
    json_output: bool,
    stem: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let directory = Path::new(&directory);
    if !directory.is_dir() {
        return Err(format!("Not a cache directory: {}", directory.display()).into());
    }

    let scan = scan_segments(directory, &stem)?;
    let reports: Vec<_> = scan
        .replayable
        .iter()
        .map(|segment| check_segment(segment))
        .collect();
    let in_progress = list_in_progress(directory, &stem)?.len();
    let all_ok = reports.iter().all(SegmentReport::ok);

    if json_output {
        let summary = serde_json::json!({
            "segments": reports,
            "in_progress": in_progress,
            "stranded": scan.stranded.len(),
            "ok": all_ok,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{:<30} {:>10} {}", "SEGMENT", "RECORDS", "STATUS");
        println!("{}", "-".repeat(70));
        for report in &reports {
            println!(
                "{:<30} {:>10} {}",
                truncate(&report.segment, 30),
                report.records,
                report.status
            );
        }
        if !scan.stranded.is_empty() {
            println!(
                "{} segment(s) after a gap are never replayed; run `eventlog clean --corrupt` to remove them",
                scan.stranded.len()
            );
        }
        if in_progress > 0 {
            println!("{} in-progress file(s); run `eventlog clean` to remove them", in_progress);
        }
    }

    if strict && !all_ok {
        std::process::exit(1);
    }

    Ok(())
}
