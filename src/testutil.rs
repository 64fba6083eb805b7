//! Width-sequence encoders for tests
//!
//! Every sequence starts and ends with a quiet-zone space, so it can be fed
//! straight into a fresh [`Decoder`].

use crate::{Decoder, SymbolType};

const CODE39: [(char, &str); 44] = [
    ('0', "000110100"),
    ('1', "100100001"),
    ('2', "001100001"),
    ('3', "101100000"),
    ('4', "000110001"),
    ('5', "100110000"),
    ('6', "001110000"),
    ('7', "000100101"),
    ('8', "100100100"),
    ('9', "001100100"),
    ('A', "100001001"),
    ('B', "001001001"),
    ('C', "101001000"),
    ('D', "000011001"),
    ('E', "100011000"),
    ('F', "001011000"),
    ('G', "000001101"),
    ('H', "100001100"),
    ('I', "001001100"),
    ('J', "000011100"),
    ('K', "100000011"),
    ('L', "001000011"),
    ('M', "101000010"),
    ('N', "000010011"),
    ('O', "100010010"),
    ('P', "001010010"),
    ('Q', "000000111"),
    ('R', "100000110"),
    ('S', "001000110"),
    ('T', "000010110"),
    ('U', "110000001"),
    ('V', "011000001"),
    ('W', "111000000"),
    ('X', "010010001"),
    ('Y', "110010000"),
    ('Z', "011010000"),
    ('-', "010000101"),
    ('.', "110000100"),
    (' ', "011000100"),
    ('*', "010010100"),
    ('$', "010101000"),
    ('/', "010100010"),
    ('+', "010001010"),
    ('%', "000101010"),
];

/// Characters Code 39 encodes directly
pub(crate) const CODE39_CHARS: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ-. $/+%";

/// Code 39 with `n` narrow and `wd` wide elements
pub(crate) fn code39(text: &str, n: u32, wd: u32) -> Vec<u32> {
    let mut ws = vec![40];
    for c in std::iter::once('*').chain(text.chars()).chain(std::iter::once('*')) {
        let (_, pattern) = CODE39
            .iter()
            .find(|(k, _)| *k == c)
            .expect("character not in Code 39");
        ws.extend(pattern.bytes().map(|b| if b == b'1' { wd } else { n }));
        ws.push(n);
    }
    *ws.last_mut().unwrap() = 40;
    ws
}

const CODE93: [&str; 47] = [
    "131112", "111213", "111312", "111411", "121113", "121212", "121311", "111114", "131211",
    "141111", "211113", "211212", "211311", "221112", "221211", "231111", "112113", "112212",
    "112311", "122112", "132111", "111123", "111222", "111321", "121122", "131121", "212112",
    "212211", "211122", "211221", "221121", "222111", "112122", "112221", "122121", "123111",
    "121131", "311112", "311211", "321111", "112131", "113121", "211131", "121221", "312111",
    "311121", "122211",
];

/// Code 93 values of the directly encoded characters in `text`
pub(crate) fn code93_values(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| CODE39_CHARS.find(c).expect("character not in Code 93") as u8)
        .collect()
}

/// Code 93 for raw character values, check characters appended
pub(crate) fn code93(values: &[u8], u: u32) -> Vec<u32> {
    fn check(vals: &[u8], wmax: usize) -> u8 {
        let sum: usize = vals
            .iter()
            .rev()
            .enumerate()
            .map(|(i, &v)| (i % wmax + 1) * v as usize)
            .sum();
        (sum % 47) as u8
    }
    let mut vals = values.to_vec();
    vals.push(check(&vals, 20));
    vals.push(check(&vals, 15));

    let mut ws = vec![40];
    let start_stop = "111141";
    for pattern in std::iter::once(start_stop)
        .chain(vals.iter().map(|&v| CODE93[v as usize]))
        .chain(std::iter::once(start_stop))
    {
        ws.extend(pattern.bytes().map(|b| (b - b'0') as u32 * u));
    }
    ws.extend([u, 40]);
    ws
}

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

/// Code 128 for raw character values (start code first), check and stop
/// appended, with a 20 module quiet zone
pub(crate) fn code128(values: &[u8], u: u32) -> Vec<u32> {
    let sum: usize = values[0] as usize
        + values
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, &v)| i * v as usize)
            .sum::<usize>();
    let mut ws = vec![20 * u];
    for &v in values.iter().chain(&[(sum % 103) as u8, 106]) {
        ws.extend(CODE128[v as usize].bytes().map(|b| (b - b'0') as u32 * u));
    }
    ws.push(20 * u);
    ws
}

const CODABAR: [(char, &str); 20] = [
    ('0', "0000011"),
    ('1', "0000110"),
    ('2', "0001001"),
    ('3', "1100000"),
    ('4', "0010010"),
    ('5', "1000010"),
    ('6', "0100001"),
    ('7', "0100100"),
    ('8', "0110000"),
    ('9', "1001000"),
    ('-', "0001100"),
    ('$', "0011000"),
    (':', "1000101"),
    ('/', "1010001"),
    ('.', "1010100"),
    ('+', "0010101"),
    ('A', "0011010"),
    ('B', "0101001"),
    ('C', "0001011"),
    ('D', "0001110"),
];

/// Codabar, start and stop characters included in `text`
pub(crate) fn codabar(text: &str, n: u32, wd: u32) -> Vec<u32> {
    let mut ws = vec![60];
    for c in text.chars() {
        let (_, pattern) = CODABAR
            .iter()
            .find(|(k, _)| *k == c)
            .expect("character not in Codabar");
        ws.extend(pattern.bytes().map(|b| if b == b'1' { wd } else { n }));
        ws.push(n);
    }
    *ws.last_mut().unwrap() = 60;
    ws
}

const I25: [&[u8; 5]; 10] = [
    b"NNWWN", b"WNNNW", b"NWNNW", b"WWNNN", b"NNWNW", b"WNWNN", b"NWWNN", b"NNNWW", b"WNNWN",
    b"NWNWN",
];

/// Interleaved 2 of 5 for an even number of digits
pub(crate) fn i25(digits: &str, n: u32, wd: u32) -> Vec<u32> {
    let width = |c: u8| if c == b'W' { wd } else { n };
    let mut ws = vec![60, n, n, n, n];
    for pair in digits.as_bytes().chunks(2) {
        let bars = I25[(pair[0] - b'0') as usize];
        let spaces = I25[(pair[1] - b'0') as usize];
        for (&b, &s) in bars.iter().zip(spaces.iter()) {
            ws.extend([width(b), width(s)]);
        }
    }
    ws.extend([wd, n, n, 60]);
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

const EAN13_PARITY: [&[u8; 6]; 10] = [
    b"LLLLLL", b"LLGLGG", b"LLGGLG", b"LLGGGL", b"LGLLGG", b"LGGLLG", b"LGGGLL", b"LGLGLG",
    b"LGLGGL", b"LGGLGL",
];

const UPCE_PARITY: [&[u8; 6]; 10] = [
    b"GGGLLL", b"GGLGLL", b"GGLLGL", b"GGLLLG", b"GLGGLL", b"GLLGGL", b"GLLLGG", b"GLGLGL",
    b"GLGLLG", b"GLLGLG",
];

const EAN5_PARITY: [&[u8; 5]; 10] = [
    b"GGLLL", b"GLGLL", b"GLLGL", b"GLLLG", b"LGGLL", b"LLGGL", b"LLLGG", b"LGLGL", b"LGLLG",
    b"LLGLG",
];

fn ean_char(ws: &mut Vec<u32>, digit: u8, parity: u8, u: u32) {
    let mut w = EAN_DIGITS[(digit - b'0') as usize];
    if parity == b'G' {
        w.reverse();
    }
    ws.extend(w.iter().map(|x| x * u));
}

/// EAN-13 from all 13 digits, `q` module quiet zones
pub(crate) fn ean13(digits: &str, u: u32, q: u32) -> Vec<u32> {
    let d = digits.as_bytes();
    let mut ws = vec![q * u, u, u, u];
    for (&c, &p) in d[1..7].iter().zip(EAN13_PARITY[(d[0] - b'0') as usize]) {
        ean_char(&mut ws, c, p, u);
    }
    ws.extend([u; 5]);
    for &c in &d[7..] {
        ean_char(&mut ws, c, b'R', u);
    }
    ws.extend([u, u, u, q * u]);
    ws
}

/// EAN-8 from all 8 digits
pub(crate) fn ean8(digits: &str, u: u32, q: u32) -> Vec<u32> {
    let d = digits.as_bytes();
    let mut ws = vec![q * u, u, u, u];
    for &c in &d[..4] {
        ean_char(&mut ws, c, b'L', u);
    }
    ws.extend([u; 5]);
    for &c in &d[4..] {
        ean_char(&mut ws, c, b'R', u);
    }
    ws.extend([u, u, u, q * u]);
    ws
}

/// UPC-E (number system 0) from its six data digits and check digit
pub(crate) fn upce(six: &str, check: u8, u: u32, q: u32) -> Vec<u32> {
    let mut ws = vec![q * u, u, u, u];
    for (&c, &p) in six.as_bytes().iter().zip(UPCE_PARITY[check as usize]) {
        ean_char(&mut ws, c, p, u);
    }
    ws.extend([u; 6]);
    ws.push(q * u);
    ws
}

/// Bars of an EAN-2 or EAN-5 add-on, without quiet zones
pub(crate) fn addon_body(digits: &str, u: u32) -> Vec<u32> {
    let d: Vec<u32> = digits.bytes().map(|c| (c - b'0') as u32).collect();
    let parity: &[u8] = if d.len() == 5 {
        let chk = (3 * (d[0] + d[2] + d[4]) + 9 * (d[1] + d[3])) % 10;
        &EAN5_PARITY[chk as usize][..]
    } else {
        &[b"LL", b"LG", b"GL", b"GG"][((d[0] * 10 + d[1]) % 4) as usize][..]
    };
    let mut ws = vec![u, u, 2 * u];
    for (i, (&c, &p)) in digits.as_bytes().iter().zip(parity).enumerate() {
        if i > 0 {
            ws.extend([u, u]);
        }
        ean_char(&mut ws, c, p, u);
    }
    ws
}

/// A stand-alone add-on between quiet zones
pub(crate) fn addon(digits: &str, u: u32, q: u32) -> Vec<u32> {
    let mut ws = vec![q * u];
    ws.extend(addon_body(digits, u));
    ws.push(q * u);
    ws
}

/// Append an add-on `gap` modules after an EAN/UPC symbol
pub(crate) fn with_addon(main: &[u32], digits: &str, u: u32, gap: u32, q: u32) -> Vec<u32> {
    let mut ws = main[..main.len() - 1].to_vec();
    ws.push(gap * u);
    ws.extend(addon_body(digits, u));
    ws.push(q * u);
    ws
}

/// The same symbol scanned right to left
pub(crate) fn reversed(ws: &[u32]) -> Vec<u32> {
    ws.iter().rev().copied().collect()
}

/// Feed widths and collect every completed symbol with its direction
pub(crate) fn decode_all(dcode: &mut Decoder, widths: &[u32]) -> Vec<(SymbolType, Vec<u8>, i32)> {
    let mut out = Vec::new();
    for &w in widths {
        let sym = dcode.decode_width(w);
        if sym > SymbolType::Partial {
            out.push((sym, dcode.data().to_vec(), dcode.direction()));
        }
    }
    out
}

/// A decoder with only the given symbologies enabled
pub(crate) fn decoder_for(syms: &[SymbolType]) -> Decoder {
    let mut dcode = Decoder::new();
    dcode
        .set_config(SymbolType::None, crate::Config::Enable, 0)
        .unwrap();
    for &sym in syms {
        dcode.set_config(sym, crate::Config::Enable, 1).unwrap();
    }
    dcode
}

/// Pixel row for a width sequence, starting white
pub(crate) fn render_row(widths: &[u32], scale: u32) -> Vec<u8> {
    let mut row = Vec::new();
    let mut level = 255u8;
    for &w in widths {
        row.extend(std::iter::repeat(level).take((w * scale) as usize));
        level = !level;
    }
    row
}
