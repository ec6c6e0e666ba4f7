use std::fmt;

/// An exact 8-bit RGB triple. Alpha is never part of the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColorKey {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl ColorKey {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl From<[u8; 3]> for ColorKey {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self { r, g, b }
    }
}

/// Lowercase `#rrggbb`
impl fmt::Display for ColorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// A color together with the number of pixels it covered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorCount {
    pub color: ColorKey,
    pub count: u64,
}

impl ColorCount {
    /// Ranking order: higher count first, then lower `ColorKey` among equal counts.
    pub fn outranks(&self, other: &ColorCount) -> bool {
        self.count > other.count || (self.count == other.count && self.color < other.color)
    }
}

/// Up to three colors, strictly ordered by rank.
///
/// Unused slots are `None` and always trail the used ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TopThree {
    slots: [Option<ColorCount>; 3],
}

impl TopThree {
    pub const SLOTS: usize = 3;

    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn from_slots(slots: [Option<ColorCount>; 3]) -> Self {
        Self { slots }
    }

    pub fn get(&self, index: usize) -> Option<ColorCount> {
        self.slots.get(index).copied().flatten()
    }

    /// Ranked entries, skipping empty slots
    pub fn entries(&self) -> impl Iterator<Item = ColorCount> + '_ {
        self.slots.iter().flatten().copied()
    }

    pub fn colors(&self) -> impl Iterator<Item = ColorKey> + '_ {
        self.entries().map(|entry| entry.color)
    }

    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots[0].is_none()
    }
}
