//! Bar/space element color

/// Color of element: bar or space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Color {
    #[default]
    Space = 0, // light area or space between bars
    Bar = 1,   // dark area or colored bar segment
}

impl Color {
    /// The other color
    pub fn opposite(self) -> Self {
        match self {
            Self::Space => Self::Bar,
            Self::Bar => Self::Space,
        }
    }
}

impl From<u8> for Color {
    fn from(value: u8) -> Self {
        if value & 1 == 1 {
            Self::Bar
        } else {
            Self::Space
        }
    }
}
