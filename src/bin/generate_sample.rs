use std::fs::File;
use std::io::{BufWriter, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

const ROWS: usize = 2000;
const STEP: f64 = 0.01;

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

/// Simulation-like channels. `Thrust` is zero while the engine is off so the
/// histogram zero filter has something to remove.
struct Channels {
    sim_time: Vec<f64>,
    dat_time: Vec<f64>,
    altitude: Vec<f64>,
    velocity: Vec<f64>,
    thrust: Vec<f64>,
    stage: Vec<i64>,
    phase: Vec<String>,
}

fn simulate(rng: &mut SimpleRng) -> Channels {
    let mut ch = Channels {
        sim_time: Vec::with_capacity(ROWS),
        dat_time: Vec::with_capacity(ROWS),
        altitude: Vec::with_capacity(ROWS),
        velocity: Vec::with_capacity(ROWS),
        thrust: Vec::with_capacity(ROWS),
        stage: Vec::with_capacity(ROWS),
        phase: Vec::with_capacity(ROWS),
    };

    let burnout = ROWS as f64 * STEP * 0.4;
    let mut velocity = 0.0;
    let mut altitude = 0.0;
    for i in 0..ROWS {
        let t = i as f64 * STEP;
        let burning = t < burnout;
        let thrust = if burning { 1500.0 + rng.gauss(0.0, 25.0) } else { 0.0 };
        velocity += (thrust / 100.0 - 9.81) * STEP;
        altitude = (altitude + velocity * STEP).max(0.0);

        ch.sim_time.push(t);
        // Recorder clock: offset and slightly drifting.
        ch.dat_time.push(100.0 + t * 1.0002);
        ch.altitude.push(altitude + rng.gauss(0.0, 0.5));
        ch.velocity.push(velocity + rng.gauss(0.0, 0.05));
        ch.thrust.push(thrust);
        ch.stage.push(if burning { 1 } else { 2 });
        ch.phase.push(if burning { "boost" } else { "coast" }.to_string());
    }
    ch
}

fn write_dat(ch: &Channels, path: &str) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {path}"))?;
    let mut out = BufWriter::new(file);
    writeln!(out, "SimTime   DatTime   Altitude   Velocity   Thrust   Stage   Phase")?;
    for i in 0..ch.sim_time.len() {
        writeln!(
            out,
            "{:.4}   {:.4}   {:.3}   {:.3}   {:.1}   {}   {}",
            ch.sim_time[i],
            ch.dat_time[i],
            ch.altitude[i],
            ch.velocity[i],
            ch.thrust[i],
            ch.stage[i],
            ch.phase[i]
        )?;
    }
    out.flush().with_context(|| format!("writing {path}"))?;
    Ok(())
}

fn write_parquet(ch: &Channels, path: &str) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("SimTime", DataType::Float64, false),
        Field::new("DatTime", DataType::Float64, false),
        Field::new("Altitude", DataType::Float64, false),
        Field::new("Velocity", DataType::Float64, false),
        Field::new("Thrust", DataType::Float64, false),
        Field::new("Stage", DataType::Int64, false),
        Field::new("Phase", DataType::Utf8, false),
    ]));

    let columns: Vec<ArrayRef> = vec![
        Arc::new(Float64Array::from(ch.sim_time.clone())),
        Arc::new(Float64Array::from(ch.dat_time.clone())),
        Arc::new(Float64Array::from(ch.altitude.clone())),
        Arc::new(Float64Array::from(ch.velocity.clone())),
        Arc::new(Float64Array::from(ch.thrust.clone())),
        Arc::new(Int64Array::from(ch.stage.clone())),
        Arc::new(StringArray::from(
            ch.phase.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
        )),
    ];
    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    let file = File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let channels = simulate(&mut rng);

    write_dat(&channels, "sample_data.dat")?;
    write_parquet(&channels, "sample_data.parquet")?;

    println!(
        "Wrote {} rows to sample_data.dat and sample_data.parquet",
        channels.sim_time.len()
    );
    Ok(())
}
