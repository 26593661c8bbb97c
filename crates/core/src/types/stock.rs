//! Per-size stock counters for footwear products.

use serde::{Deserialize, Serialize};

/// One of the six stocked shoe sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Size {
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Eleven,
}

impl Size {
    /// Every stocked size, smallest first.
    pub const ALL: [Self; 6] = [
        Self::Six,
        Self::Seven,
        Self::Eight,
        Self::Nine,
        Self::Ten,
        Self::Eleven,
    ];

    /// Numeric shoe size.
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::Six => 6,
            Self::Seven => 7,
            Self::Eight => 8,
            Self::Nine => 9,
            Self::Ten => 10,
            Self::Eleven => 11,
        }
    }

    /// Look up a size by its number.
    #[must_use]
    pub const fn from_number(n: u8) -> Option<Self> {
        match n {
            6 => Some(Self::Six),
            7 => Some(Self::Seven),
            8 => Some(Self::Eight),
            9 => Some(Self::Nine),
            10 => Some(Self::Ten),
            11 => Some(Self::Eleven),
            _ => None,
        }
    }

    /// Column name of this size's counter (`size_6` .. `size_11`).
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Six => "size_6",
            Self::Seven => "size_7",
            Self::Eight => "size_8",
            Self::Nine => "size_9",
            Self::Ten => "size_10",
            Self::Eleven => "size_11",
        }
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Units available per size.
///
/// Flattened into the product shape, so on the wire the counters are the
/// top-level `size_6` .. `size_11` fields. Absent counters read as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SizeRun {
    pub size_6: u32,
    pub size_7: u32,
    pub size_8: u32,
    pub size_9: u32,
    pub size_10: u32,
    pub size_11: u32,
}

impl SizeRun {
    /// Units on hand for one size.
    #[must_use]
    pub const fn get(&self, size: Size) -> u32 {
        match size {
            Size::Six => self.size_6,
            Size::Seven => self.size_7,
            Size::Eight => self.size_8,
            Size::Nine => self.size_9,
            Size::Ten => self.size_10,
            Size::Eleven => self.size_11,
        }
    }

    /// Replace the counter for one size.
    pub const fn set(&mut self, size: Size, units: u32) {
        match size {
            Size::Six => self.size_6 = units,
            Size::Seven => self.size_7 = units,
            Size::Eight => self.size_8 = units,
            Size::Nine => self.size_9 = units,
            Size::Ten => self.size_10 = units,
            Size::Eleven => self.size_11 = units,
        }
    }

    /// Builder-style variant of [`SizeRun::set`].
    #[must_use]
    pub const fn with(mut self, size: Size, units: u32) -> Self {
        self.set(size, units);
        self
    }

    /// Sum of all six counters.
    ///
    /// Widened to `u64` so six full `u32` counters cannot overflow.
    #[must_use]
    pub fn total(&self) -> u64 {
        Size::ALL.iter().map(|&s| u64::from(self.get(s))).sum()
    }

    /// Whether any size has stock.
    #[must_use]
    pub fn in_stock(&self) -> bool {
        self.total() > 0
    }

    /// Sizes with at least one unit, smallest first.
    #[must_use]
    pub fn available_sizes(&self) -> Vec<Size> {
        Size::ALL
            .into_iter()
            .filter(|&s| self.get(s) > 0)
            .collect()
    }
}

/// Per-size counter changes. Unset sizes keep their current value.
///
/// Flattened into a product patch, so only the sizes being changed reach the
/// wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StockPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_6: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_7: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_8: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_9: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_10: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_11: Option<u32>,
}

impl StockPatch {
    /// New counter for one size, if the patch sets it.
    #[must_use]
    pub const fn get(&self, size: Size) -> Option<u32> {
        match size {
            Size::Six => self.size_6,
            Size::Seven => self.size_7,
            Size::Eight => self.size_8,
            Size::Nine => self.size_9,
            Size::Ten => self.size_10,
            Size::Eleven => self.size_11,
        }
    }

    /// Set the new counter for one size.
    pub const fn set(&mut self, size: Size, units: u32) {
        let slot = match size {
            Size::Six => &mut self.size_6,
            Size::Seven => &mut self.size_7,
            Size::Eight => &mut self.size_8,
            Size::Nine => &mut self.size_9,
            Size::Ten => &mut self.size_10,
            Size::Eleven => &mut self.size_11,
        };
        *slot = Some(units);
    }

    /// Builder-style variant of [`StockPatch::set`].
    #[must_use]
    pub const fn with(mut self, size: Size, units: u32) -> Self {
        self.set(size, units);
        self
    }

    /// Whether no size is changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        Size::ALL.iter().all(|&s| self.get(s).is_none())
    }

    /// Copy the set counters onto `run`.
    pub fn apply_to(&self, run: &mut SizeRun) {
        for size in Size::ALL {
            if let Some(units) = self.get(size) {
                run.set(size, units);
            }
        }
    }
}
