/// Structural position an account number maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Top-level account, appended to the root list.
    Root,
    /// Child of the account with the given number, which must already exist.
    Under(u32),
}

/// Attachment rule of a chart: derives every account's place in the
/// hierarchy from its number alone.
pub trait NumberingScheme {
    /// `None` means the number is malformed for this scheme; otherwise the
    /// placement the number encodes. The returned parent is a claim, not a
    /// guarantee that it exists.
    fn placement(&self, number: u32) -> Option<Placement>;
}

/// Fixed-width positional numbering, the common 1000/1100/1110 style.
///
/// Every number has exactly `width` digits. Zeroing the last non-zero digit
/// names the parent; a number whose only non-zero digit is the leading one
/// is a root. With width 4: 1000 is a root, 1100 sits under 1000, 1110
/// under 1100, 1234 under 1230.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecimalScheme {
    width: u32,
}

impl DecimalScheme {
    pub fn new(width: u32) -> DecimalScheme {
        DecimalScheme { width }
    }
}

impl Default for DecimalScheme {
    fn default() -> DecimalScheme {
        DecimalScheme { width: 4 }
    }
}

impl NumberingScheme for DecimalScheme {
    fn placement(&self, number: u32) -> Option<Placement> {
        if number == 0 || digit_count(number) != self.width {
            return None;
        }
        // scale of the last non-zero digit; the guard keeps scale * 10
        // from overflowing at the top of the u32 range
        let mut scale = 1u32;
        while scale <= number / 10 && number % (scale * 10) == 0 {
            scale *= 10;
        }
        if number / scale < 10 {
            Some(Placement::Root)
        } else {
            Some(Placement::Under(number / (scale * 10) * (scale * 10)))
        }
    }
}

/// Variable-length digit-prefix numbering: 1 is a root, 12 sits under 1,
/// 123 under 12. Kept alongside [`DecimalScheme`] so a forest can swap the
/// attachment rule without touching any engine code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrefixScheme;

impl NumberingScheme for PrefixScheme {
    fn placement(&self, number: u32) -> Option<Placement> {
        match number {
            0 => None,
            1..=9 => Some(Placement::Root),
            _ => Some(Placement::Under(number / 10)),
        }
    }
}

fn digit_count(mut number: u32) -> u32 {
    let mut digits = 1;
    while number >= 10 {
        number /= 10;
        digits += 1;
    }
    digits
}
