/// One of the four output rotations the blit engine supports.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Rotation {
    /// No rotation.
    #[default]
    Deg0 = 0,
    /// 90 degrees.
    Deg90 = 1,
    /// 180 degrees.
    Deg180 = 2,
    /// 270 degrees.
    Deg270 = 3,
}

/// Destination axis flags derived from a [`Rotation`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct RotationFlags {
    /// Swap the destination x and y axes.
    pub xy_swap: bool,
    /// Reverse the destination x axis.
    pub x_rev: bool,
    /// Reverse the destination y axis.
    pub y_rev: bool,
}

impl RotationFlags {
    const fn new(xy_swap: bool, x_rev: bool, y_rev: bool) -> Self {
        Self {
            xy_swap,
            x_rev,
            y_rev,
        }
    }
}

/// Indexed by `Rotation as usize`.
const ROTATION_TABLE: [RotationFlags; 4] = [
    RotationFlags::new(false, false, false),
    RotationFlags::new(true, true, false),
    RotationFlags::new(false, true, true),
    RotationFlags::new(true, false, true),
];

impl Rotation {
    /// All rotations in table order.
    pub const ALL: [Rotation; 4] = [Self::Deg0, Self::Deg90, Self::Deg180, Self::Deg270];

    /// Rotation for a numeric index; anything outside `0..=3` is [`Rotation::Deg0`].
    pub fn from_index(index: i64) -> Self {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .unwrap_or_default()
    }

    /// Rotation for a command-line argument.
    ///
    /// Only the leading integer prefix is read (`"2x"` is 2); text with no such prefix, and
    /// values outside `0..=3`, select [`Rotation::Deg0`].
    pub fn from_arg(arg: &str) -> Self {
        leading_int(arg).map_or(Self::Deg0, Self::from_index)
    }

    /// Table index of this rotation.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Clockwise angle in degrees.
    pub fn degrees(self) -> u32 {
        self as u32 * 90
    }

    /// Destination axis flags for this rotation.
    pub fn flags(self) -> RotationFlags {
        ROTATION_TABLE[self.index()]
    }
}

/// Destination axis flags for a raw index, falling back to the identity entry.
pub fn flags_for_index(index: i64) -> RotationFlags {
    Rotation::from_index(index).flags()
}

fn leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (neg, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    // Overflowing prefixes are out of range either way.
    let v: i64 = digits[..end].parse().unwrap_or(i64::MAX);
    Some(if neg { -v } else { v })
}

#[cfg(test)]
#[path = "../../tests/unit/blit/rotation.rs"]
mod tests;
