use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use clap::Parser;
use parquet::arrow::ArrowWriter;
use serde::Serialize;

const WEEKDAYS: [&str; 7] = [
    "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday",
];
const MONTHS: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

/// (name, family, base price in €)
const MENU: [(&str, &str, f64); 14] = [
    ("Pad Thai", "NOODLES", 11.5),
    ("Yakisoba", "NOODLES", 10.9),
    ("Ramen", "NOODLES", 12.5),
    ("Nasi Goreng", "RICE BOWL", 11.0),
    ("Chicken Teriyaki Bowl", "RICE BOWL", 11.9),
    ("Korean Bibimbap", "RICE BOWL", 12.4),
    ("Gyozas", "ENTRANTES", 5.5),
    ("Rollitos Primavera", "ENTRANTES", 4.9),
    ("Agua", "BEBIDAS", 2.0),
    ("Cerveza", "BEBIDAS", 3.2),
    ("Refresco", "BEBIDAS", 2.5),
    ("Té Verde", "BEBIDAS", 2.2),
    ("Pasabog CheeseCake", "POSTRES", 5.9),
    ("Bolsa de Helado", "POSTRES", 3.5),
];

/// (location, price factor, first open day index, last open day index)
const LOCATIONS: [(&str, f64, usize, usize); 5] = [
    ("Barcelona", 1.00, 0, usize::MAX),
    ("Valencia", 0.95, 0, 440),
    ("Mallorca", 1.10, 100, 440),
    ("Pozuelo", 1.05, 110, usize::MAX),
    ("Malasaña", 0.93, 120, 380),
];

#[derive(Parser)]
#[command(name = "generate_sample")]
#[command(about = "Write a synthetic franchise sales table (CSV and Parquet)")]
struct Cli {
    /// Output directory
    #[arg(default_value = ".")]
    out_dir: PathBuf,

    /// PRNG seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
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
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
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

    /// Uniform integer in `lo..=hi`.
    fn range(&mut self, lo: u64, hi: u64) -> u64 {
        lo + self.next_u64() % (hi - lo + 1)
    }
}

#[derive(Serialize)]
struct SaleLine {
    #[serde(rename = "Local")]
    location: &'static str,
    #[serde(rename = "Año")]
    year: i64,
    #[serde(rename = "Semana")]
    week: i64,
    #[serde(rename = "Día Semana")]
    weekday: &'static str,
    #[serde(rename = "Mes")]
    month: &'static str,
    #[serde(rename = "Hora")]
    hour: i64,
    #[serde(rename = "Producto")]
    product: &'static str,
    #[serde(rename = "Familia")]
    family: &'static str,
    #[serde(rename = "Cantidad")]
    quantity: f64,
    #[serde(rename = "Precio Unitario")]
    unit_price: f64,
    #[serde(rename = "Total")]
    total: f64,
    #[serde(rename = "Servicio")]
    service: i64,
}

/// One calendar day of the sample period.
struct Day {
    year: i64,
    week: i64,
    weekday: usize,
    month: usize,
}

fn is_leap(year: i64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Every day from 2019-01-01 (a Tuesday) to week 32 of 2020.
fn calendar() -> Vec<Day> {
    let mut days = Vec::new();
    let mut weekday = 1; // 2019-01-01
    for year in [2019i64, 2020] {
        let jan1 = weekday;
        let mut month_lengths = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
        if is_leap(year) {
            month_lengths[1] = 29;
        }
        let mut doy = 0usize;
        for (month, &len) in month_lengths.iter().enumerate() {
            for _ in 0..len {
                let week = ((doy + jan1) / 7 + 1).min(53) as i64;
                if year == 2020 && week > 32 {
                    return days;
                }
                days.push(Day {
                    year,
                    week,
                    weekday,
                    month,
                });
                weekday = (weekday + 1) % 7;
                doy += 1;
            }
        }
    }
    days
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn generate(rng: &mut SimpleRng) -> Vec<SaleLine> {
    let mut lines = Vec::new();
    let mut service: i64 = 0;

    for (day_index, day) in calendar().iter().enumerate() {
        // Weekend and early-summer peaks, August trough.
        let mut demand = match day.weekday {
            5 => 1.6,
            4 | 6 => 1.3,
            1 => 1.1,
            _ => 1.0,
        };
        if (5..=6).contains(&day.month) {
            demand *= 1.25;
        }
        if day.month == 7 {
            demand *= 0.6;
        }

        for &(location, factor, opens, closes) in &LOCATIONS {
            if day_index < opens || day_index > closes {
                continue;
            }
            let services = (rng.range(12, 30) as f64 * demand) as u64;
            for _ in 0..services {
                service += 1;
                let hour = if rng.next_f64() < 0.42 {
                    rng.range(13, 16) as i64
                } else {
                    rng.range(20, 23) as i64
                };

                for _ in 0..rng.range(1, 4) {
                    let (product, family, base) = MENU[rng.range(0, MENU.len() as u64 - 1) as usize];
                    let quantity = rng.range(1, 3) as f64;
                    let unit_price = round2(base * factor);
                    lines.push(SaleLine {
                        location,
                        year: day.year,
                        week: day.week,
                        weekday: WEEKDAYS[day.weekday],
                        month: MONTHS[day.month],
                        hour,
                        product,
                        family,
                        quantity,
                        unit_price,
                        total: round2(quantity * unit_price),
                        service,
                    });
                }
            }
        }
    }
    lines
}

fn write_csv(path: &std::path::Path, lines: &[SaleLine]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    for line in lines {
        writer.serialize(line)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &std::path::Path, lines: &[SaleLine]) -> anyhow::Result<()> {
    let text = |f: fn(&SaleLine) -> &'static str| -> ArrayRef {
        Arc::new(StringArray::from(lines.iter().map(f).collect::<Vec<_>>()))
    };
    let int = |f: fn(&SaleLine) -> i64| -> ArrayRef {
        Arc::new(Int64Array::from(lines.iter().map(f).collect::<Vec<_>>()))
    };
    let float = |f: fn(&SaleLine) -> f64| -> ArrayRef {
        Arc::new(Float64Array::from(lines.iter().map(f).collect::<Vec<_>>()))
    };

    let schema = Arc::new(Schema::new(vec![
        Field::new("Local", DataType::Utf8, false),
        Field::new("Año", DataType::Int64, false),
        Field::new("Semana", DataType::Int64, false),
        Field::new("Día Semana", DataType::Utf8, false),
        Field::new("Mes", DataType::Utf8, false),
        Field::new("Hora", DataType::Int64, false),
        Field::new("Producto", DataType::Utf8, false),
        Field::new("Familia", DataType::Utf8, false),
        Field::new("Cantidad", DataType::Float64, false),
        Field::new("Precio Unitario", DataType::Float64, false),
        Field::new("Total", DataType::Float64, false),
        Field::new("Servicio", DataType::Int64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            text(|l| l.location),
            int(|l| l.year),
            int(|l| l.week),
            text(|l| l.weekday),
            text(|l| l.month),
            int(|l| l.hour),
            text(|l| l.product),
            text(|l| l.family),
            float(|l| l.quantity),
            float(|l| l.unit_price),
            float(|l| l.total),
            int(|l| l.service),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut rng = SimpleRng::new(cli.seed);
    let lines = generate(&mut rng);

    std::fs::create_dir_all(&cli.out_dir)
        .with_context(|| format!("creating {}", cli.out_dir.display()))?;
    let csv_path = cli.out_dir.join("df_limpio.csv");
    let parquet_path = cli.out_dir.join("df_limpio.parquet");
    write_csv(&csv_path, &lines)?;
    write_parquet(&parquet_path, &lines)?;

    println!(
        "Wrote {} sale lines ({} services) to {} and {}",
        lines.len(),
        lines.last().map(|l| l.service).unwrap_or(0),
        csv_path.display(),
        parquet_path.display()
    );
    Ok(())
}
