//! Benchmark utilities.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use flexdb_core::{Collection, Config, Pool, Record, RecordExt, RecordId, RecordMeta};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

/// Sensor names used by [`random_reading`].
pub const SENSORS: [&str; 8] = [
    "kitchen", "hall", "attic", "cellar", "garage", "porch", "study", "nursery",
];

/// A sensor reading, the record benchmarked throughout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Reading {
    #[serde(flatten)]
    meta: RecordMeta,
    /// Sensor name.
    pub sensor: String,
    /// Measured value.
    pub value: f64,
    /// Labels attached to the reading.
    pub tags: Vec<String>,
}

impl Record for Reading {
    const COLLECTION: &'static str = "readings";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }
}

/// Fills `reading` with random contents.
pub fn random_reading(reading: &mut Reading) {
    let mut rng = rand::thread_rng();
    reading.sensor = SENSORS[rng.gen_range(0..SENSORS.len())].to_string();
    reading.value = rng.gen_range(-20.0..40.0);
    reading.tags = (0..rng.gen_range(0..4))
        .map(|_| format!("t{}", rng.gen_range(0..10)))
        .collect();
}

/// A pool over a temporary directory holding `count` random readings.
pub struct Seeded {
    /// Root directory, removed on drop.
    pub dir: TempDir,
    /// Pool over `dir`.
    pub pool: Pool,
    /// Ids of the seeded readings.
    pub ids: Vec<RecordId>,
}

impl Seeded {
    /// Seeds a fresh directory and settles its snapshot.
    pub fn new(count: usize) -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let pool = Pool::new(Config::new(dir.path()));
        let readings = pool.collection::<Reading>();

        let ids = (0..count)
            .map(|_| {
                let mut reading = readings.create();
                random_reading(&mut reading);
                reading.commit().expect("Failed to commit reading");
                reading.id()
            })
            .collect();
        readings.load_all().expect("Failed to settle snapshot");

        Self { dir, pool, ids }
    }

    /// Returns the readings collection.
    pub fn readings(&self) -> Collection<Reading> {
        self.pool.collection::<Reading>()
    }

    /// Rewrites `n` random readings, leaving `n` pending commits.
    pub fn touch(&self, n: usize) {
        let readings = self.readings();
        let mut rng = rand::thread_rng();
        for _ in 0..n {
            let id = self.ids[rng.gen_range(0..self.ids.len())];
            if let Some(mut reading) = readings.load(id).expect("Failed to load reading") {
                random_reading(&mut reading);
                reading.commit().expect("Failed to commit reading");
            }
        }
    }
}
