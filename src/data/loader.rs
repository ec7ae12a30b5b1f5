// ============================================================
// Layer 4 — Track Loaders
// ============================================================
// Reads per-event track records from an event store file.
//
// Two layouts are supported:
//
//   events.jsonl  — one JSON object per line, one line per event:
//     {"eventNumber": 7, "tracks": [ {"pt": 3.1, ...}, {...} ]}
//
//   tracks.csv    — flat table, one track per row, header row
//                   naming the columns; consecutive rows with the
//                   same eventNumber form one event
//
// Both loaders stream events one at a time, stop once `num_events`
// events have been read, flatten the nested track arrays and drop
// tracks whose validity flag is false. `batch_size` is only the
// progress interval: a debug line is logged every `batch_size` events.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use crate::domain::track::TrackRecord;
use crate::domain::traits::{LoadRequest, TrackSource};

/// One line of the JSON-lines event store.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventRecord {
    #[serde(default)]
    event_number: Option<u64>,
    #[serde(default)]
    tracks: Vec<TrackRecord>,
}

/// Running totals shared by both loaders for progress logging.
#[derive(Debug, Default)]
struct LoadStats {
    events:  usize,
    tracks:  usize,
    invalid: usize,
}

impl LoadStats {
    /// Flatten one event's tracks into `out`, dropping invalid ones.
    fn absorb(&mut self, tracks: Vec<TrackRecord>, out: &mut Vec<TrackRecord>) {
        self.events += 1;
        for track in tracks {
            self.tracks += 1;
            if track.valid {
                out.push(track);
            } else {
                self.invalid += 1;
            }
        }
    }

    fn log_batch(&self, source: &Path) {
        tracing::debug!(
            "{}: {} events, {} tracks read so far ({} invalid)",
            source.display(),
            self.events,
            self.tracks,
            self.invalid
        );
    }

    fn log_done(&self, source: &Path, kept: usize) {
        tracing::info!(
            "Loaded {} valid tracks from {} events in '{}' ({} invalid dropped)",
            kept,
            self.events,
            source.display(),
            self.invalid
        );
    }
}

fn limit_reached(events: usize, request: &LoadRequest) -> bool {
    request.num_events.is_some_and(|n| events >= n)
}

// ─── EventFileLoader ──────────────────────────────────────────────────────────
/// Loads events from a JSON-lines file with nested track arrays.
pub struct EventFileLoader {
    path: PathBuf,
}

impl EventFileLoader {
    /// The file is only opened by `load`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TrackSource for EventFileLoader {
    fn load(&self, request: &LoadRequest) -> Result<Vec<TrackRecord>> {
        let file = File::open(&self.path)
            .with_context(|| format!("Cannot open event file '{}'", self.path.display()))?;
        let reader = BufReader::new(file);

        let batch_size = request.batch_size.max(1);
        let mut stats  = LoadStats::default();
        let mut tracks = Vec::new();

        for (line_no, line) in reader.lines().enumerate() {
            if limit_reached(stats.events, request) {
                break;
            }

            let line = line.with_context(|| {
                format!("Cannot read line {} of '{}'", line_no + 1, self.path.display())
            })?;
            if line.trim().is_empty() {
                continue;
            }

            let event: EventRecord = serde_json::from_str(&line).with_context(|| {
                format!("Malformed event on line {} of '{}'", line_no + 1, self.path.display())
            })?;

            // Tracks inherit the event number of their enclosing event
            let event_number = event.event_number.unwrap_or(stats.events as u64);
            let event_tracks = event
                .tracks
                .into_iter()
                .map(|mut t| {
                    t.event_number = event_number;
                    t
                })
                .collect();
            stats.absorb(event_tracks, &mut tracks);

            if stats.events % batch_size == 0 {
                stats.log_batch(&self.path);
            }
        }

        stats.log_done(&self.path, tracks.len());
        Ok(tracks)
    }
}

// ─── CsvTrackLoader ───────────────────────────────────────────────────────────
/// Loads tracks from a flat CSV table using the csv crate's serde support.
pub struct CsvTrackLoader {
    path: PathBuf,
}

impl CsvTrackLoader {
    /// The file is only opened by `load`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TrackSource for CsvTrackLoader {
    fn load(&self, request: &LoadRequest) -> Result<Vec<TrackRecord>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(&self.path)
            .with_context(|| format!("Cannot open CSV file '{}'", self.path.display()))?;

        let batch_size = request.batch_size.max(1);
        let mut stats  = LoadStats::default();
        let mut tracks = Vec::new();
        if limit_reached(0, request) {
            return Ok(tracks);
        }

        // Tracks of the event currently being assembled
        let mut current: Vec<TrackRecord> = Vec::new();

        for (row_no, row) in reader.deserialize::<TrackRecord>().enumerate() {
            let track = row.with_context(|| {
                format!("Malformed track on data row {} of '{}'", row_no + 1, self.path.display())
            })?;

            let starts_new_event = current
                .first()
                .is_some_and(|t| t.event_number != track.event_number);

            if starts_new_event {
                stats.absorb(std::mem::take(&mut current), &mut tracks);
                if stats.events % batch_size == 0 {
                    stats.log_batch(&self.path);
                }
                if limit_reached(stats.events, request) {
                    break;
                }
            }
            current.push(track);
        }

        if !current.is_empty() && !limit_reached(stats.events, request) {
            stats.absorb(current, &mut tracks);
        }

        stats.log_done(&self.path, tracks.len());
        Ok(tracks)
    }
}

/// Pick a loader from the file extension.
pub fn open_source(path: impl AsRef<Path>) -> Result<Box<dyn TrackSource>> {
    let path = path.as_ref();
    match path.extension().and_then(|e| e.to_str()) {
        Some("jsonl") | Some("json") => Ok(Box::new(EventFileLoader::new(path))),
        Some("csv") => Ok(Box::new(CsvTrackLoader::new(path))),
        _ => bail!(
            "Unsupported track file '{}': expected a .jsonl, .json or .csv file",
            path.display()
        ),
    }
}
