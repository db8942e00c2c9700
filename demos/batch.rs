//! Batch Certificate Generator
//!
//! Fills the certificate template once per name and writes the PDFs.
//! The asset directory holds `template.pdf`, the TrueType fonts and an
//! optional `layout.json`.
//!
//! Usage:
//!   cargo run --example batch -- <assets-dir> <names> [output-dir] [YYYY-MM-DD]
//!
//! Examples:
//!   cargo run --example batch -- public "Ana,Beto,Cid"
//!   RUST_LOG=debug cargo run --example batch -- public "Ana, Beto" output 2023-11-07

use std::path::Path;

use anyhow::Context;
use certificate::{CertificateLayout, DirSource, FieldValues, TemplateFiller};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 3 {
        eprintln!(
            "Usage: {} <assets-dir> <names> [output-dir] [YYYY-MM-DD]",
            args[0]
        );
        eprintln!();
        eprintln!("Examples:");
        eprintln!("  cargo run --example batch -- public \"Ana,Beto,Cid\"");
        std::process::exit(1);
    }

    let assets_dir = Path::new(&args[1]);
    let names = &args[2];
    let output_dir = Path::new(args.get(3).map(String::as_str).unwrap_or("output"));

    let layout_path = assets_dir.join("layout.json");
    let layout = if layout_path.exists() {
        let json = std::fs::read_to_string(&layout_path)
            .with_context(|| format!("Failed to read {}", layout_path.display()))?;
        CertificateLayout::from_json(&json)
            .map_err(|e| anyhow::anyhow!("{}: {e}", layout_path.display()))?
    } else {
        CertificateLayout::default()
    };

    let mut values = FieldValues::default();
    if let Some(date) = args.get(4) {
        values = values.with_date(date);
    }

    let filler = TemplateFiller::with_layout(DirSource::new(assets_dir), layout);
    let report = filler.generate_batch(names, &values);

    std::fs::create_dir_all(output_dir)?;
    for entry in &report.certificates {
        // Keep names with path separators inside the output directory
        let file_name = entry.file_name.replace(['/', '\\'], "_");
        let path = output_dir.join(file_name);
        std::fs::write(&path, entry.certificate.as_bytes())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!(
            "✓ {} ({} pt) -> {}",
            entry.name,
            entry.certificate.name_font_size(),
            path.display()
        );
    }

    for failure in &report.failures {
        eprintln!("✗ {}: {}", failure.name, failure.error);
    }

    if !report.is_complete() {
        anyhow::bail!("{} of {} certificates failed", report.failures.len(), report.len());
    }

    Ok(())
}
