//! Dump the directory entries of a compound file and read each stream.
//!
//! ```text
//! cargo run --example cfb_dump -- document.doc --lenient
//! RUST_LOG=debug cargo run --example cfb_dump -- document.doc
//! ```

use clap::Parser;
use litchi_cfb::ole::{CompoundFile, ReadOptions, StreamLocator, Warning, is_ole_file};

#[derive(Parser, Debug)]
#[command(about = "Reconstruct the streams of a Compound File Binary container")]
struct Args {
    /// Path to the container (.doc, .xls, .ppt, .msg, ...)
    path: std::path::PathBuf,

    /// Recover damaged chains instead of failing
    #[arg(long)]
    lenient: bool,

    /// Print warnings as YAML records
    #[arg(long)]
    yaml: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let bytes = std::fs::read(&args.path)?;
    if !is_ole_file(&bytes) {
        println!("{} is not an OLE file", args.path.display());
        return Ok(());
    }

    let mut warnings: Vec<Warning> = Vec::new();
    let mut sink = |w: &Warning| warnings.push(w.clone());
    let mut options = if args.lenient {
        ReadOptions::lenient(&mut sink)
    } else {
        ReadOptions::strict()
    };

    let cfb = CompoundFile::open_with(bytes, &mut options)?;
    let header = cfb.header();
    println!(
        "CFB v{}: {} byte sectors, {} FAT entries, {} MiniFAT entries, mini stream {} bytes",
        header.major_version,
        header.sector_size,
        cfb.fat().len(),
        cfb.mini_fat().len(),
        cfb.mini_stream().len()
    );

    for sid in 1..cfb.directory_entry_count() as u32 {
        let locator = StreamLocator::from_directory_entry(cfb.directory(), sid, cfb.header())?;
        if locator.size == 0 {
            continue;
        }
        let kind = if locator.is_mini(cfb.header()) { "mini" } else { "fat" };
        match cfb.read_stream(locator, &mut options) {
            Ok(data) => println!(
                "[{:>3}] {:<4} start {:>8} size {:>10} -> {} bytes",
                sid,
                kind,
                locator.start,
                locator.size,
                data.len()
            ),
            Err(e) => println!("[{:>3}] {:<4} failed: {}", sid, kind, e),
        }
    }
    drop(options);

    if !warnings.is_empty() {
        println!("\n{} warning(s):", warnings.len());
        if args.yaml {
            let yaml = serde_saphyr::to_string(&warnings)
                .map_err(|e| format!("Failed to serialize warnings to YAML: {}", e))?;
            println!("{}", yaml);
        } else {
            for warning in &warnings {
                println!("  {}", warning);
            }
        }
    }

    Ok(())
}
