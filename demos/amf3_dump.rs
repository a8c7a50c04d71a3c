//! AMF3 dump example
//!
//! Run with: cargo run --example amf3_dump -- message.amf3
//!
//! This decodes every value in a file and prints it, following object
//! references one level deep.

use std::fs::File;
use std::io::BufReader;

use amf3_rs::amf::{Amf3Decoder, Amf3Value, Complex, DynamicGraph, IoSource};

fn describe(value: &Amf3Value, graph: &DynamicGraph) -> String {
    let r = match value {
        Amf3Value::Object(r) => *r,
        other => return format!("{:?}", other),
    };
    match graph.get(r) {
        Some(Complex::Date(millis)) => format!("{} Date({})", r, millis),
        Some(Complex::Array(items)) => format!("{} Array[{}]", r, items.len()),
        Some(Complex::AssocArray(map)) => format!("{} AssocArray{{{}}}", r, map.len()),
        Some(Complex::ByteArray(data)) => format!("{} ByteArray({} bytes)", r, data.len()),
        Some(Complex::Object(obj)) if obj.is_anonymous() => format!("{} Object", r),
        Some(Complex::Object(obj)) => format!("{} {}", r, obj.class_name()),
        None => format!("{} <unresolved>", r),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("amf3_rs=debug".parse()?)
                .add_directive("amf3_dump=info".parse()?),
        )
        .init();

    // Get path from command line
    let path = std::env::args().nth(1).unwrap_or_else(|| {
        eprintln!("Usage: amf3_dump <file>");
        eprintln!("Example: amf3_dump message.amf3");
        std::process::exit(1);
    });

    let reader = BufReader::new(File::open(&path)?);
    let mut decoder = Amf3Decoder::new(IoSource::new(reader));

    let mut values = Vec::new();
    while decoder.has_remaining()? {
        values.push(decoder.decode()?);
    }
    tracing::info!(values = values.len(), objects = decoder.objects().len(), "Decoded {}", path);

    let (_, graph) = decoder.into_parts();
    for (i, value) in values.iter().enumerate() {
        println!("[{}] {}", i, describe(value, &graph));
        let obj = match value.as_object_ref().and_then(|r| graph.get(r)) {
            Some(Complex::Object(obj)) => obj,
            Some(Complex::Array(items)) => {
                for (j, item) in items.iter().enumerate() {
                    println!("    {}: {}", j, describe(item, &graph));
                }
                continue;
            }
            _ => continue,
        };
        for (name, property) in obj.properties() {
            println!("    {}: {}", name, describe(property, &graph));
        }
    }

    Ok(())
}
