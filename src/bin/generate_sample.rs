use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Date32Array, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Duration, NaiveDate};
use parquet::arrow::ArrowWriter;

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

fn logistic(x: f64, midpoint: f64, steepness: f64, ceiling: f64) -> f64 {
    ceiling / (1.0 + (-(x - midpoint) / steepness).exp())
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// One synthetic country.
struct Profile {
    location: &'static str,
    /// Death waves as (peak day, width in days, peak deaths per day).
    waves: &'static [(f64, f64, f64)],
    /// First day with vaccination data.
    rollout_day: usize,
    /// Plateau of people vaccinated per hundred; can exceed 100.
    vax_ceiling: f64,
}

const PROFILES: &[Profile] = &[
    Profile {
        location: "United States",
        waves: &[(45.0, 20.0, 2200.0), (310.0, 30.0, 3300.0), (540.0, 25.0, 2000.0)],
        rollout_day: 290,
        vax_ceiling: 78.0,
    },
    Profile {
        location: "India",
        waves: &[(200.0, 35.0, 1100.0), (430.0, 18.0, 4100.0)],
        rollout_day: 320,
        vax_ceiling: 72.0,
    },
    Profile {
        location: "Brazil",
        waves: &[(150.0, 40.0, 1050.0), (400.0, 35.0, 3100.0)],
        rollout_day: 325,
        vax_ceiling: 86.0,
    },
    Profile {
        location: "United Kingdom",
        waves: &[(40.0, 15.0, 950.0), (320.0, 20.0, 1250.0)],
        rollout_day: 282,
        vax_ceiling: 79.0,
    },
    Profile {
        location: "Gibraltar",
        waves: &[(320.0, 10.0, 3.0)],
        rollout_day: 315,
        vax_ceiling: 120.0,
    },
];

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);

    let start = NaiveDate::from_ymd_opt(2020, 3, 1).context("invalid start date")?;
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).context("invalid epoch")?;
    let n_days = 700;

    let mut locations: Vec<&str> = Vec::new();
    let mut dates: Vec<NaiveDate> = Vec::new();
    let mut deaths: Vec<Option<f64>> = Vec::new();
    let mut vaccinated: Vec<Option<f64>> = Vec::new();

    for profile in PROFILES {
        for day in 0..n_days {
            let t = day as f64;
            let signal: f64 = profile
                .waves
                .iter()
                .map(|&(mu, sigma, amp)| gaussian(t, mu, sigma, amp))
                .sum();
            // ~2% of days go unreported
            let death = if rng.next_f64() < 0.02 {
                None
            } else {
                let noisy = (signal + rng.gauss(0.0, signal.sqrt().max(0.1))).max(0.0);
                Some((noisy * 1000.0).round() / 1000.0)
            };

            let vax = if day < profile.rollout_day {
                None
            } else {
                let x = (day - profile.rollout_day) as f64;
                let v = logistic(x, 120.0, 30.0, profile.vax_ceiling);
                Some((v * 100.0).round() / 100.0)
            };

            locations.push(profile.location);
            dates.push(start + Duration::days(day as i64));
            deaths.push(death);
            vaccinated.push(vax);
        }
    }

    // ---- Parquet ----
    let schema = Arc::new(Schema::new(vec![
        Field::new("location", DataType::Utf8, false),
        Field::new("date", DataType::Date32, false),
        Field::new("new_deaths_smoothed", DataType::Float64, true),
        Field::new("people_vaccinated_per_hundred", DataType::Float64, true),
    ]));

    let day_numbers: Vec<i32> = dates
        .iter()
        .map(|d| (*d - epoch).num_days() as i32)
        .collect();

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(locations.clone())),
            Arc::new(Date32Array::from(day_numbers)),
            Arc::new(Float64Array::from(deaths.clone())),
            Arc::new(Float64Array::from(vaccinated.clone())),
        ],
    )
    .context("building record batch")?;

    let parquet_path = "sample_covid.parquet";
    let file = std::fs::File::create(parquet_path).context("creating parquet output")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;

    // ---- CSV (OWID column layout, with an extra column consumers ignore) ----
    let csv_path = "sample_covid.csv";
    let mut csv_writer = csv::Writer::from_path(csv_path).context("creating CSV output")?;
    csv_writer.write_record([
        "location",
        "date",
        "total_deaths",
        "new_deaths_smoothed",
        "people_vaccinated_per_hundred",
    ])?;
    let cell = |v: Option<f64>| v.map(|x| x.to_string()).unwrap_or_default();
    let mut total = 0.0;
    for i in 0..locations.len() {
        if i > 0 && locations[i] != locations[i - 1] {
            total = 0.0;
        }
        total += deaths[i].unwrap_or(0.0);
        csv_writer.write_record([
            locations[i].to_string(),
            dates[i].format("%Y-%m-%d").to_string(),
            format!("{total:.0}"),
            cell(deaths[i]),
            cell(vaccinated[i]),
        ])?;
    }
    csv_writer.flush()?;

    println!(
        "Wrote {} rows ({} locations × {n_days} days) to {parquet_path} and {csv_path}",
        locations.len(),
        PROFILES.len()
    );
    Ok(())
}
