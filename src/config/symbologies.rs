//! Marker types for the configurable symbologies
//!
//! Each marker is a zero-sized type carrying its [`SymbolType`] and display
//! name. The capability traits it implements decide which
//! [`DecoderConfig`] setters accept it.

use super::*;

macro_rules! symbologies {
    ($($(#[$doc:meta])* $ty:ident => $name:literal;)*) => {
        $(
            $(#[$doc])*
            #[derive(Debug, Clone, Copy)]
            pub struct $ty;

            impl Symbology for $ty {
                const TYPE: SymbolType = SymbolType::$ty;
                const NAME: &'static str = $name;
            }
        )*
    };
}

macro_rules! capability {
    ($cap:ident: $($ty:ident),* $(,)?) => {
        $(impl $cap for $ty {})*
    };
}

symbologies! {
    /// 2-digit EAN add-on
    Ean2 => "EAN-2";
    /// 5-digit EAN add-on
    Ean5 => "EAN-5";
    Ean8 => "EAN-8";
    Upce => "UPC-E";
    /// ISBN-10, reported from a 978-prefixed EAN-13
    Isbn10 => "ISBN-10";
    Upca => "UPC-A";
    Ean13 => "EAN-13";
    /// ISBN-13, reported from a 978/979-prefixed EAN-13
    Isbn13 => "ISBN-13";
    /// EAN/UPC symbol merged with its add-on by the image scanner
    Composite => "Composite";
    /// Interleaved 2 of 5
    I25 => "Interleaved 2 of 5";
    Codabar => "Codabar";
    Code39 => "Code 39";
    Code93 => "Code 93";
    Code128 => "Code 128";
}

capability!(SupportsEnable:
    Ean2, Ean5, Ean8, Upce, Isbn10, Upca, Ean13, Isbn13, Composite,
    I25, Codabar, Code39, Code93, Code128,
);

capability!(SupportsChecksum:
    Ean2, Ean5, Ean8, Upce, Isbn10, Upca, Ean13, Isbn13,
    Codabar, Code39, Code93, Code128,
);

// fixed-length symbologies have no length limits
capability!(SupportsLengthLimits: I25, Codabar, Code39, Code93, Code128);

capability!(SupportsAscii: Code39);

capability!(SupportsUncertainty:
    Ean2, Ean5, Ean8, Upce, Isbn10, Upca, Ean13, Isbn13, Composite,
    I25, Codabar, Code39, Code93, Code128,
);
