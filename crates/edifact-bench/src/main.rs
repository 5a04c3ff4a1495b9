//! Benchmark for EDIFACT interchange building and reading using order data.
//!
//! Usage: `bench-orders <orders.json> [repeat]`
//!
//! Set `RUST_LOG=edifact=debug` to see builder and reader events.

use std::error::Error;
use std::fs;
use std::time::Instant;

use edifact::kinds::{Order, OrderLine, Orders, Party};
use edifact::{MessageBuilder, SegmentCursor};
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

// =============================================================================
// JSON DATA STRUCTURES
// =============================================================================

#[derive(Debug, Deserialize)]
struct OrderFile {
    sender: String,
    receiver: String,
    orders: Vec<OrderRecord>,
}

#[derive(Debug, Deserialize)]
struct OrderRecord {
    number: String,
    /// CCYYMMDD
    date: String,
    buyer: String,
    supplier: Option<String>,
    lines: Vec<LineRecord>,
}

#[derive(Debug, Deserialize)]
struct LineRecord {
    #[serde(alias = "ean")]
    article: String,
    quantity: u32,
    price: Option<String>,
}

// =============================================================================
// CONVERSION
// =============================================================================

impl From<&OrderRecord> for Order {
    fn from(record: &OrderRecord) -> Self {
        Order {
            number: record.number.clone(),
            date: record.date.clone(),
            buyer: Party::new(record.buyer.as_str()),
            supplier: record.supplier.as_deref().map(Party::new),
            lines: record
                .lines
                .iter()
                .map(|line| {
                    let order_line = OrderLine::new(line.article.as_str(), line.quantity);
                    match &line.price {
                        Some(price) => order_line.with_price(price.as_str()),
                        None => order_line,
                    }
                })
                .collect(),
        }
    }
}

fn throughput(bytes: usize, secs: f64) -> f64 {
    (bytes as f64 / 1_000_000.0) / secs
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let data_path = args.next().unwrap_or_else(|| "data/orders.json".to_string());
    let repeat: usize = match args.next() {
        Some(n) => n.parse()?,
        None => 1,
    };

    println!("Loading orders from: {}", data_path);
    let json_data = fs::read_to_string(&data_path)?;

    let parse_start = Instant::now();
    let file: OrderFile = serde_json::from_str(&json_data)?;
    let orders: Vec<Order> = file.orders.iter().map(Order::from).collect();
    let parse_time = parse_start.elapsed();
    println!("Loaded {} orders in {:?}", orders.len(), parse_time);

    // Build
    let build_start = Instant::now();
    let mut builder =
        MessageBuilder::new(Orders::new(), file.sender.as_str(), file.receiver.as_str());
    for _ in 0..repeat {
        for order in &orders {
            builder.add_message(order)?;
        }
    }
    let message_count = builder.message_count();
    let reference = builder.interchange_reference()?.to_string();
    let mut reader = builder.get()?;
    let build_time = build_start.elapsed();

    let text = reader.to_edifact_string()?;
    println!(
        "\nBuilt interchange {}: {} messages, {} bytes in {:?}",
        reference,
        message_count,
        text.len(),
        build_time
    );
    println!(
        "  Throughput: {:.2} MB/s",
        throughput(text.len(), build_time.as_secs_f64())
    );

    // Structural validation
    let validate_start = Instant::now();
    reader.validate()?;
    let validate_time = validate_start.elapsed();
    println!("\nBlueprint validation in {:?}", validate_time);
    println!(
        "  Throughput: {:.2} MB/s",
        throughput(text.len(), validate_time.as_secs_f64())
    );

    // Segment self-validation
    let segments_start = Instant::now();
    reader.validate_segments()?;
    let segments_time = segments_start.elapsed();
    println!("\nSegment validation in {:?}", segments_time);

    // Full scan
    let scan_start = Instant::now();
    let mut segment_count = 0usize;
    let mut line_count = 0usize;
    reader.rewind()?;
    while let Some(segment) = reader.next_segment()? {
        segment_count += 1;
        if segment.tag() == "LIN" {
            line_count += 1;
        }
    }
    let scan_time = scan_start.elapsed();
    println!(
        "\nScanned {} segments ({} order lines) in {:?}",
        segment_count, line_count, scan_time
    );

    info!(
        reference = %reference,
        messages = message_count,
        segments = segment_count,
        "bench finished"
    );
    Ok(())
}
