use super::*;

/// An ordered bit vector. Bit 0 is the least significant.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Value(Vec<bool>);

/// The number of bits needed to represent `n`. Zero needs none.
pub fn min_bits(n: u64) -> usize {
    (u64::BITS - n.leading_zeros()) as usize
}

impl Value {
    /// An all-zero value of the given width.
    pub fn zero(width: usize) -> Value {
        Value(vec![false; width])
    }

    pub fn from_bits(bits: Vec<bool>) -> Value {
        Value(bits)
    }

    /// Expands `n` into a value of exactly `width` bits.
    pub fn from_u64(n: u64, width: usize) -> Result<Value, ValueError> {
        if min_bits(n) > width {
            return Err(ValueError::TooWide(n, width));
        }
        Ok(Value((0..width).map(|i| i < 64 && (n >> i) & 1 == 1).collect()))
    }

    pub fn width(&self) -> usize {
        self.0.len()
    }

    pub fn bit(&self, i: usize) -> bool {
        self.0[i]
    }

    pub fn set_bit(&mut self, i: usize, bit: bool) {
        self.0[i] = bit;
    }

    pub fn bits(&self) -> &[bool] {
        &self.0
    }

    /// The integer reading of this value, or `None` if a bit above 63 is set.
    pub fn to_u64(&self) -> Option<u64> {
        let mut n = 0u64;
        for (i, bit) in self.0.iter().enumerate() {
            if *bit {
                if i >= 64 {
                    return None;
                }
                n |= 1 << i;
            }
        }
        Some(n)
    }

    /// Splits this value into 1-bit values, least significant first.
    pub fn split_bits(&self) -> impl Iterator<Item = Value> + '_ {
        self.0.iter().map(|bit| Value(vec![*bit]))
    }
}

impl From<bool> for Value {
    fn from(x: bool) -> Value {
        Value(vec![x])
    }
}

impl TryFrom<Value> for bool {
    type Error = ();
    fn try_from(value: Value) -> Result<bool, Self::Error> {
        match value.0.as_slice() {
            [bit] => Ok(*bit),
            _ => Err(()),
        }
    }
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "{self}w{}", self.width())
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self.to_u64() {
            Some(n) => write!(f, "{n}"),
            None => write!(f, "{self:b}"),
        }
    }
}

impl std::fmt::Binary for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0b")?;
        for bit in self.0.iter().rev() {
            write!(f, "{}", if *bit { '1' } else { '0' })?;
        }
        Ok(())
    }
}

/// Renders a list of values the way diagnostics show them: `1, 0, 5`.
pub struct Values<'a>(pub &'a [Value]);

impl std::fmt::Display for Values<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{value}")?;
        }
        Ok(())
    }
}

#[test]
fn value_to_u64() {
    let v = Value::from_u64(7, 4).unwrap();
    assert_eq!(v.bits(), &[true, true, true, false]);
    assert_eq!(v.to_u64(), Some(7));
    assert_eq!(Value::from_u64(8, 3), Err(ValueError::TooWide(8, 3)));
    assert_eq!(Value::from_u64(0, 0).unwrap().width(), 0);
}
