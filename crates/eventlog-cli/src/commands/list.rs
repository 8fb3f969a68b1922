//! List command implementation.

use crate::output::{self, EventSummary};
use eventlog_cache::{list_segments, CacheFileReader};
use std::path::Path;

pub fn run(
    directory: String,
    json: bool,
    max_events: Option<u64>,
    stem: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let directory = Path::new(&directory);
    if !directory.is_dir() {
        return Err(format!("Not a cache directory: {}", directory.display()).into());
    }
    let segments = list_segments(directory, &stem)?;

    if !json {
        output::print_table_header();
    }

    let mut event_count: u64 = 0;
    for segment in segments {
        let mut reader = CacheFileReader::open(&segment)
            .map_err(|e| format!("Failed to open segment {}: {}", segment.display(), e))?;
        while let Some(cached) = reader.read_record()? {
            if let Some(max) = max_events {
                if event_count >= max {
                    return Ok(());
                }
            }

            if json {
                println!("{}", serde_json::to_string(&EventSummary::from(&cached))?);
            } else {
                println!("{}", output::format_table_row(&cached));
            }
            event_count += 1;
        }
    }

    Ok(())
}
