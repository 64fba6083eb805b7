//! Command-line barcode scanner
//!
//! Scans one or more image files and prints every decoded symbol as
//! `TYPE:data`, or as an XML document with `--xml`.

use clap::{ArgAction, Parser};
use std::io::Write;
use std::process;
use zedscan::{increase_verbosity, Image, ImageScanner, Symbol};

/// Exit status when every image was read but none held a barcode
const EXIT_NO_SYMBOLS: i32 = 4;

/// Scan and decode bar codes from one or more image files
#[derive(Parser)]
#[command(name = "zedscanimg")]
#[command(version)]
#[command(about = "Scan and decode bar codes from one or more image files", long_about = None)]
struct Args {
    /// Minimal output, only print decoded symbol data
    #[arg(short, long)]
    quiet: bool,

    /// Output decoded symbol data without converting charsets
    #[arg(long)]
    raw: bool,

    /// Print results as XML
    #[arg(long)]
    xml: bool,

    /// Apply a decoder or scanner setting, `[symbology.]config[=value]`
    #[arg(short = 'S', long = "set", value_name = "CONFIG")]
    set: Vec<String>,

    /// Increase debug output (may be repeated)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Image files to scan
    #[arg(required = true)]
    files: Vec<String>,
}

fn main() {
    let args = Args::parse();

    let default_level = match args.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
    for _ in 0..args.verbose {
        increase_verbosity();
    }

    let mut scanner = ImageScanner::new();
    for setting in &args.set {
        if let Err(e) = scanner.parse_config(setting) {
            eprintln!("ERROR: invalid config '{}': {}", setting, e);
            process::exit(1);
        }
    }

    let mut out = std::io::stdout().lock();
    let mut total_symbols = 0;

    if args.xml {
        let _ = writeln!(out, "<barcodes xmlns='http://zbar.sourceforge.net/2008/barcode'>");
    }

    for filename in &args.files {
        let img = match ::image::open(filename) {
            Ok(img) => img,
            Err(e) => {
                eprintln!("ERROR: failed to load '{}': {}", filename, e);
                process::exit(2);
            }
        };
        let mut image = Image::from(&img.to_luma8());

        let n = match scanner.scan_image(&mut image) {
            Ok(n) => n,
            Err(e) => {
                eprintln!("ERROR: failed to scan '{}': {}", filename, e);
                process::exit(1);
            }
        };
        log::debug!("{}: {} symbol(s)", filename, n);

        if args.xml {
            let _ = writeln!(out, "<source href='{}'>", filename);
            let _ = writeln!(out, "<index num='0'>");
        }
        for symbol in scanner.results().into_iter().flatten() {
            total_symbols += 1;
            if args.xml {
                let _ = writeln!(out, "{}", symbol.xml());
            } else {
                print_symbol(&mut out, &symbol, args.quiet, args.raw);
            }
        }
        if args.xml {
            let _ = writeln!(out, "</index>");
            let _ = writeln!(out, "</source>");
        }
        let _ = out.flush();
    }

    if args.xml {
        let _ = writeln!(out, "</barcodes>");
        let _ = out.flush();
    }

    if !args.quiet && !args.xml {
        eprintln!(
            "scanned {} barcode symbols from {} image(s)",
            total_symbols,
            args.files.len()
        );
    }
    if total_symbols == 0 {
        if !args.quiet {
            eprintln!("WARNING: barcode data was not detected in some image(s)");
        }
        process::exit(EXIT_NO_SYMBOLS);
    }
}

fn print_symbol(out: &mut impl Write, symbol: &Symbol<'_>, quiet: bool, raw: bool) {
    if !quiet {
        let _ = write!(out, "{}{}:", symbol.symbol_type(), symbol.addon().name());
    }
    if raw {
        let _ = out.write_all(symbol.data());
    } else {
        // Symbol data is ISO-8859-1 unless it already decodes as UTF-8
        let text = match std::str::from_utf8(symbol.data()) {
            Ok(s) => std::borrow::Cow::Borrowed(s),
            Err(_) => encoding_rs::WINDOWS_1252
                .decode_without_bom_handling(symbol.data())
                .0,
        };
        let _ = out.write_all(text.as_bytes());
    }
    let _ = writeln!(out);
}
