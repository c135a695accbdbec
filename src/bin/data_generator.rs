use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use rand::Rng;

const CATEGORIES: [(&str, f64, f64); 7] = [
    // (name, typical price, spread)
    ("belleza-y-cuidado-personal", 3500.0, 3.0),
    ("comidas-preparadas", 2800.0, 1.2),
    ("congelados", 3200.0, 1.5),
    ("frutas", 1200.0, 0.4),
    ("instantaneos-y-sopas", 900.0, 0.3),
    ("lacteos", 2500.0, 2.5),
    ("verduras", 1000.0, 0.4),
];

const BRANDS: [&str; 8] = [
    "Lider", "Soprole", "Colun", "Nestle", "Maggi", "Dove", "Frutas del Sur", "Minuto Verde",
];

/// Write a synthetic supermarket listing with the columns the analysis reads
#[derive(Parser, Debug)]
#[command(name = "data_generator")]
struct Args {
    /// Output CSV path
    #[arg(default_value = "data/supermercado.csv")]
    path: PathBuf,

    /// Number of product rows
    #[arg(short, long, default_value_t = 10_000)]
    rows: usize,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    if let Some(parent) = args.path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(&args.path)
        .with_context(|| format!("could not create {}", args.path.display()))?;
    let mut writer = BufWriter::new(file);

    writeln!(
        writer,
        "Titulo,Marca,Preco_Normal,Preco_Desconto,Desconto,Categoria"
    )?;

    let mut rng = rand::rng();
    for i in 0..args.rows {
        let (category, base, spread) = CATEGORIES[rng.random_range(0..CATEGORIES.len())];
        let brand = BRANDS[rng.random_range(0..BRANDS.len())];

        // right-skewed prices; about 5% of rows carry no reference price
        let price = if rng.random_bool(0.05) {
            0.0
        } else {
            let factor: f64 = rng.random_range(0.2..1.0f64).powf(-spread);
            (base * 0.3 * factor).round()
        };
        let discount = if price > 0.0 && rng.random_bool(0.35) {
            (price * rng.random_range(0.05..0.4)).round()
        } else {
            0.0
        };

        writeln!(
            writer,
            "\"Producto {i}, {category}\",{brand},{price},{},{discount},{category}",
            price - discount
        )?;
    }
    writer.flush()?;

    println!("Sample CSV generated: {}", args.path.display());
    Ok(())
}
