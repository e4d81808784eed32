//! Utilities for the 4-component vectors every d3d9 register holds.

use std::fmt::{Display, Formatter};

use arrayvec::ArrayVec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VectorComponent {
    X,
    Y,
    Z,
    W,
}
impl VectorComponent {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'x' => Some(Self::X),
            'y' => Some(Self::Y),
            'z' => Some(Self::Z),
            'w' => Some(Self::W),
            _ => None,
        }
    }
}

pub const VECTOR_COMPONENTS: [VectorComponent; 4] = [
    VectorComponent::X,
    VectorComponent::Y,
    VectorComponent::Z,
    VectorComponent::W,
];

/// A swizzle or write mask, stored exactly as written (`.wzy` stays `[W, Z, Y]`).
pub type Swizzle = ArrayVec<VectorComponent, 4>;

/// The implicit `.xyzw` of an unmasked destination
pub fn full_mask() -> Swizzle {
    ArrayVec::from(VECTOR_COMPONENTS)
}

impl Display for VectorComponent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            VectorComponent::X => write!(f, "x"),
            VectorComponent::Y => write!(f, "y"),
            VectorComponent::Z => write!(f, "z"),
            VectorComponent::W => write!(f, "w"),
        }
    }
}

/// Display wrapper that prints a swizzle with its leading `.`
pub struct DisplaySwizzle<'a>(pub &'a Swizzle);
impl<'a> Display for DisplaySwizzle<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, ".")?;
        for c in self.0.iter() {
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}
