//! Re-derive the stored HTML of magazine records from their structured
//! pages, or backfill `editorPages` for records that only carry HTML.
//!
//! Usage: `cargo run --example rebuild_content -- records/*.json`
//! (set `RUST_LOG=debug` for parser diagnostics).

use folio_core::{PersistedRecord, emit_content, parse_content};
use std::env;
use std::fs;
use std::path::PathBuf;

fn main() {
    env_logger::init();

    let paths: Vec<PathBuf> = env::args().skip(1).map(PathBuf::from).collect();
    if paths.is_empty() {
        eprintln!("usage: rebuild_content <record.json>...");
        std::process::exit(2);
    }

    let mut rebuilt = 0;
    let mut backfilled = 0;
    let mut skipped = 0;

    for path in &paths {
        let input = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("SKIP {}: {}", path.display(), e);
                skipped += 1;
                continue;
            }
        };
        let mut record = match PersistedRecord::from_json(&input) {
            Ok(r) => r,
            Err(e) => {
                eprintln!("BAD RECORD {}: {}", path.display(), e);
                skipped += 1;
                continue;
            }
        };

        match &record.editor_pages {
            Some(pages) => {
                let content = emit_content(pages);
                if content == record.content {
                    skipped += 1;
                    continue;
                }
                record.content = content;
                rebuilt += 1;
            }
            None => match parse_content(&record.content) {
                Ok(pages) => {
                    log::info!("{}: recovered {} page(s)", path.display(), pages.len());
                    record.editor_pages = Some(pages);
                    backfilled += 1;
                }
                Err(e) => {
                    eprintln!("PARSE ERROR {}: {}", path.display(), e);
                    skipped += 1;
                    continue;
                }
            },
        }

        let output = match record.to_json() {
            Ok(json) => json,
            Err(e) => {
                eprintln!("ERROR encoding {}: {}", path.display(), e);
                continue;
            }
        };
        if let Err(e) = fs::write(path, output) {
            eprintln!("ERROR writing {}: {}", path.display(), e);
        } else {
            println!("✓ {}", path.display());
        }
    }

    println!(
        "\nRebuilt: {}, Backfilled: {}, Skipped: {}",
        rebuilt, backfilled, skipped
    );
}
