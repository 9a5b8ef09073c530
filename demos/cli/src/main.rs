use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use timeline_core::{EventLog, TimelineConfig, TimelineDocument};
use timeline_layout::{format_course, format_entry_date, layout_timeline, summarize, TimelineView};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "timeline-cli",
    about = "Dựng các đợt kháng sinh và bố cục timeline từ file sự kiện JSON."
)]
struct Args {
    /// Đường dẫn tới file tài liệu JSON (bệnh nhân + sự kiện).
    #[arg(short, long)]
    input: PathBuf,

    /// Chiều rộng vùng vẽ (pixel).
    #[arg(short, long)]
    width: Option<u32>,

    /// In toàn bộ bố cục dạng JSON thay vì bản tóm tắt.
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let data = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Không đọc được file {:?}", args.input))?;

    let document = TimelineDocument::from_json(&data)?;
    let (patient, log) = EventLog::from_document(document)?;

    let mut config = TimelineConfig::default();
    if let Some(width) = args.width {
        config.width_px = width;
    }

    let view = layout_timeline(log.events(), &config);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    let summaries = summarize(log.events());
    println!(
        "Patient: {}\nEvents: {}",
        patient.name.as_deref().unwrap_or("N/A"),
        log.len()
    );

    println!("\nProcedures:");
    for entry in &summaries.procedures {
        println!("  {}: {}", format_entry_date(&entry.date), entry.text);
    }
    println!("\nMicrobiology:");
    for entry in &summaries.microbiology {
        println!("  {}: {}", format_entry_date(&entry.date), entry.text);
    }

    match &view {
        TimelineView::Empty { skipped } => {
            println!("\nNo datable events ({} skipped).", skipped.len());
        }
        TimelineView::Chart(chart) => {
            println!("\nAntibiotics ({} row(s)):", chart.max_rows);
            for bar in &chart.courses {
                println!(
                    "  [row {}] {}",
                    bar.assignment.row,
                    format_course(&bar.assignment.interval)
                );
            }
            println!(
                "\nAxis: {} to {}, {} ticks every {} {:?}",
                chart.scale.min.date(),
                chart.scale.max.date(),
                chart.ticks.len(),
                chart.tick_interval.step,
                chart.tick_interval.unit
            );
            let labels: Vec<&str> = chart
                .ticks
                .iter()
                .map(|mark| mark.tick.label.as_str())
                .collect();
            println!("  {}", labels.join(" | "));
            println!("Chart height: {:.0}px", chart.total_height);
            if !chart.skipped.is_empty() {
                println!("Skipped events: {}", chart.skipped.len());
            }
        }
    }

    Ok(())
}
