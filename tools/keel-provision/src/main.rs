//! Keel EEPROM provisioning tool
//!
//! Builds the complete image for a board EEPROM from a TOML description,
//! reads it back through the firmware's boot reader, and writes it out.
//!
//! Usage: `keel-provision <board.toml> <image.bin> [-v]`

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use keel_protocol::Header;

mod board;
mod endian;
mod error;
mod image;
mod verify;

use board::BoardSpec;
use endian::{ByteOrder, TARGET};
use error::ProvisionError;
use image::{build_image, known_hw_code, Image};
use verify::verify_image;

struct Args {
    input: PathBuf,
    output: PathBuf,
    verbose: bool,
}

fn parse_args() -> Option<Args> {
    let mut positional = Vec::new();
    let mut verbose = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "-v" | "--verbose" => verbose = true,
            _ => positional.push(PathBuf::from(arg)),
        }
    }
    let [input, output]: [PathBuf; 2] = positional.try_into().ok()?;
    Some(Args {
        input,
        output,
        verbose,
    })
}

fn main() -> ExitCode {
    let Some(args) = parse_args() else {
        eprintln!("usage: keel-provision <board.toml> <image.bin> [-v]");
        return ExitCode::from(2);
    };

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), ProvisionError> {
    endian::check_encoder()?;

    let text = std::fs::read_to_string(&args.input).map_err(|source| ProvisionError::Read {
        path: args.input.clone(),
        source,
    })?;
    let spec = BoardSpec::parse(&text)?;
    let image = build_image(&spec)?;
    let bytes = image.to_bytes();
    verify_image(&image, &bytes)?;

    warn_unknown_hw_code(&spec);
    if args.verbose {
        dump(&image);
    }

    write_image(&args.output, &bytes)?;
    println!(
        "wrote {} records, {} bytes to {}",
        image.placements.len(),
        bytes.len(),
        args.output.display()
    );
    Ok(())
}

fn write_image(path: &Path, bytes: &[u8]) -> Result<(), ProvisionError> {
    std::fs::write(path, bytes).map_err(|source| ProvisionError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn warn_unknown_hw_code(spec: &BoardSpec) {
    let codes = spec
        .main_board
        .as_ref()
        .map(|b| (b.code, b.subcode))
        .or_else(|| spec.main_module.as_ref().map(|m| (m.code, m.subcode)));
    if let Some((code, subcode)) = codes {
        if !known_hw_code(code, subcode) {
            eprintln!(
                "warning: hardware code {:04x}:{:04x} is not one the firmware knows",
                code, subcode
            );
        }
    }
}

fn dump(image: &Image) {
    println!("Endianness");
    println!("  Host: {}", ByteOrder::host().name());
    println!("  Target: {}", TARGET.name());
    if endian::swaps() {
        println!("  Multi-byte fields are swapped on write");
    }

    println!("Image");
    println!("  Capacity: {:#06x}", image.capacity);
    println!("  Write date: {:08x}", image.directory.write_date);
    for p in &image.placements {
        // records are sealed by the encoder
        let header = Header::parse(&p.bytes).unwrap_or_default();
        println!(
            "  {:<18} #{} at {:#06x}, {} bytes, struct size {}, checksum {:#010x}",
            p.name(),
            p.instance,
            p.offset,
            p.bytes.len(),
            header.struct_size,
            header.checksum
        );
    }
}
