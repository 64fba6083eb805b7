//! Synthetic barcode images shared by the integration tests

#![allow(dead_code)]

use image::{GrayImage, Luma};

const CODE128: [&str; 107] = [
    "212222", "222122", "222221", "121223", "121322", "131222", "122213", "122312", "132212",
    "221213", "221312", "231212", "112232", "122132", "122231", "113222", "123122", "123221",
    "223211", "221132", "221231", "213212", "223112", "312131", "311222", "321122", "321221",
    "312212", "322112", "322211", "212123", "212321", "232121", "111323", "131123", "131321",
    "112313", "132113", "132311", "211313", "231113", "231311", "112133", "112331", "132131",
    "113123", "113321", "133121", "313121", "211331", "231131", "213113", "213311", "213131",
    "311123", "311321", "331121", "312113", "312311", "332111", "314111", "221411", "431111",
    "111224", "111422", "121124", "121421", "141122", "141221", "112214", "112412", "122114",
    "122411", "142112", "142211", "241211", "221114", "413111", "241112", "134111", "111242",
    "121142", "121241", "114212", "124112", "124211", "411212", "421112", "421211", "212141",
    "214121", "412121", "111143", "111341", "131141", "114113", "114311", "411113", "411311",
    "113141", "114131", "311141", "411131", "211412", "211214", "211232", "2331112",
];

/// Code 128 "HELLO" in code set B
pub const HELLO: [u8; 6] = [104, 40, 37, 44, 44, 47];

/// Code 128 widths for raw character values, start code first
pub fn code128(values: &[u8], u: u32) -> Vec<u32> {
    let mut sum = values[0] as usize;
    for (i, &v) in values.iter().enumerate().skip(1) {
        sum += i * v as usize;
    }
    let mut ws = vec![20 * u];
    for &v in values.iter().chain(&[(sum % 103) as u8, 106]) {
        ws.extend(CODE128[v as usize].bytes().map(|b| (b - b'0') as u32 * u));
    }
    ws.push(20 * u);
    ws
}

const CODE39: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ-. *";
const CODE39_PATTERNS: [&str; 40] = [
    "000110100", "100100001", "001100001", "101100000", "000110001", "100110000", "001110000",
    "000100101", "100100100", "001100100", "100001001", "001001001", "101001000", "000011001",
    "100011000", "001011000", "000001101", "100001100", "001001100", "000011100", "100000011",
    "001000011", "101000010", "000010011", "100010010", "001010010", "000000111", "100000110",
    "001000110", "000010110", "110000001", "011000001", "111000000", "010010001", "110010000",
    "011010000", "010000101", "110000100", "011000100", "010010100",
];

/// Code 39 widths with `n` narrow and `wd` wide elements
pub fn code39(text: &str, n: u32, wd: u32) -> Vec<u32> {
    let mut ws = vec![40];
    for c in format!("*{text}*").chars() {
        let pattern = CODE39_PATTERNS[CODE39.find(c).expect("character not in Code 39")];
        ws.extend(pattern.bytes().map(|b| if b == b'1' { wd } else { n }));
        ws.push(n);
    }
    *ws.last_mut().unwrap() = 40;
    ws
}

const EAN_DIGITS: [[u32; 4]; 10] = [
    [3, 2, 1, 1],
    [2, 2, 2, 1],
    [2, 1, 2, 2],
    [1, 4, 1, 1],
    [1, 1, 3, 2],
    [1, 2, 3, 1],
    [1, 1, 1, 4],
    [1, 3, 1, 2],
    [1, 2, 1, 3],
    [3, 1, 1, 2],
];

const EAN13_PARITY: [&str; 10] = [
    "LLLLLL", "LLGLGG", "LLGGLG", "LLGGGL", "LGLLGG", "LGGLLG", "LGGGLL", "LGLGLG", "LGLGGL",
    "LGGLGL",
];

const EAN5_PARITY: [&str; 10] = [
    "GGLLL", "GLGLL", "GLLGL", "GLLLG", "LGGLL", "LLGGL", "LLLGG", "LGLGL", "LGLLG", "LLGLG",
];

fn ean_char(ws: &mut Vec<u32>, digit: u8, mirrored: bool, u: u32) {
    let mut w = EAN_DIGITS[(digit - b'0') as usize];
    if mirrored {
        w.reverse();
    }
    ws.extend(w.iter().map(|x| x * u));
}

/// EAN-13 widths for all 13 digits, with `q` module quiet zones
pub fn ean13(digits: &str, u: u32, q: u32) -> Vec<u32> {
    let d = digits.as_bytes();
    let parity = EAN13_PARITY[(d[0] - b'0') as usize].as_bytes();
    let mut ws = vec![q * u, u, u, u];
    for (&c, &p) in d[1..7].iter().zip(parity) {
        ean_char(&mut ws, c, p == b'G', u);
    }
    ws.extend([u; 5]);
    for &c in &d[7..] {
        ean_char(&mut ws, c, false, u);
    }
    ws.extend([u, u, u, q * u]);
    ws
}

/// Append an EAN-5 add-on nine modules after an EAN symbol
pub fn with_ean5(main: &[u32], digits: &str, u: u32, q: u32) -> Vec<u32> {
    let d: Vec<u32> = digits.bytes().map(|c| (c - b'0') as u32).collect();
    let chk = (3 * (d[0] + d[2] + d[4]) + 9 * (d[1] + d[3])) % 10;
    let parity = EAN5_PARITY[chk as usize].as_bytes();

    let mut ws = main[..main.len() - 1].to_vec();
    ws.extend([9 * u, u, u, 2 * u]);
    for (i, (&c, &p)) in digits.as_bytes().iter().zip(parity).enumerate() {
        if i > 0 {
            ws.extend([u, u]);
        }
        ean_char(&mut ws, c, p == b'G', u);
    }
    ws.push(q * u);
    ws
}

/// Render widths as `height` identical rows, white first
pub fn render(widths: &[u32], height: u32) -> GrayImage {
    let mut row = Vec::new();
    let mut level = 255u8;
    for &w in widths {
        row.extend(std::iter::repeat(level).take(w as usize));
        level = !level;
    }
    let width = row.len() as u32;
    GrayImage::from_fn(width, height, |x, _| Luma([row[x as usize]]))
}

/// Swap black and white
pub fn invert(img: &GrayImage) -> GrayImage {
    let mut out = img.clone();
    image::imageops::invert(&mut out);
    out
}
