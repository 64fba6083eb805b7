//! Decode a stream of bar/space widths read from the command line or stdin
//!
//! Widths are whitespace separated and start with the leading quiet zone
//! (a space). Example:
//!
//! ```text
//! echo "40 2 5 2 2 5 2 5 2 2 2 ..." | cargo run --example scan_widths
//! ```

use std::io::Read;
use zedscan::{Decoder, SymbolType};

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let text = if args.is_empty() {
        let mut input = String::new();
        if let Err(e) = std::io::stdin().read_to_string(&mut input) {
            eprintln!("ERROR: reading stdin: {e}");
            std::process::exit(1);
        }
        input
    } else {
        args.join(" ")
    };

    let mut dcode = Decoder::new();
    let mut found = 0;
    for token in text.split_whitespace() {
        let width: u32 = match token.parse() {
            Ok(w) => w,
            Err(_) => {
                eprintln!("ERROR: not a width: {token}");
                std::process::exit(1);
            }
        };
        let sym = dcode.decode_width(width);
        if sym > SymbolType::Partial {
            found += 1;
            println!(
                "{}:{} (direction {})",
                sym,
                String::from_utf8_lossy(dcode.data()),
                dcode.direction()
            );
        }
    }
    // trailing quiet zone
    let sym = dcode.decode_width(0);
    if sym > SymbolType::Partial {
        found += 1;
        println!("{}:{}", sym, String::from_utf8_lossy(dcode.data()));
    }

    if found == 0 {
        eprintln!("no symbols decoded");
        std::process::exit(4);
    }
}
