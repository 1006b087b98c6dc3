//! Baby Jubjub, the twisted Edwards curve `a·x² + y² = 1 + d·x²·y²` over the BN254 scalar
//! field

use core::ops::{Add, Neg};

use ethnum::U256;
use ff::Field;

use crate::{Base, Element};

const A: u64 = 168_700;
const D: u64 = 168_696;

/// The order of the prime-order subgroup every generator lives in
pub(crate) const SUBGROUP_ORDER: U256 = U256::from_words(
    0x060c_89ce_5c26_3405_370a_08b6_d030_2b0b,
    0xab3e_edb8_3920_ee0a_6772_97dc_3921_26f1,
);

/// An affine point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Point {
    pub x: Base,
    pub y: Base,
}

impl Point {
    pub fn identity() -> Self {
        Self {
            x: Base::zero(),
            y: Base::one(),
        }
    }

    pub fn from_coordinates(x: Element, y: Element) -> Self {
        Self {
            x: x.to_base(),
            y: y.to_base(),
        }
    }

    pub fn is_on_curve(&self) -> bool {
        let xx = self.x.square();
        let yy = self.y.square();

        Base::from(A) * xx + yy == Base::one() + Base::from(D) * xx * yy
    }

    /// `scalar · self`, always walking all 256 bits of `scalar`
    pub fn mul_scalar(self, scalar: U256) -> Self {
        let base = Projective::from(self);

        (0..256u32)
            .rev()
            .fold(Projective::identity(), |acc, bit| {
                let doubled = acc + acc;
                let added = doubled + base;

                match (scalar >> bit) & U256::ONE == U256::ONE {
                    true => added,
                    false => doubled,
                }
            })
            .to_affine()
    }
}

/// `(X : Y : Z)` standing for the affine point `(X/Z, Y/Z)`
#[derive(Clone, Copy)]
struct Projective {
    x: Base,
    y: Base,
    z: Base,
}

impl Projective {
    fn identity() -> Self {
        Self {
            x: Base::zero(),
            y: Base::one(),
            z: Base::one(),
        }
    }

    fn to_affine(self) -> Point {
        let z_inv = self.z.invert().unwrap_or(Base::zero());

        Point {
            x: self.x * z_inv,
            y: self.y * z_inv,
        }
    }
}

/// The same unified law as the affine one, without any inversions
impl Add for Projective {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        let a = self.z * other.z;
        let b = a.square();
        let c = self.x * other.x;
        let d = self.y * other.y;
        let e = Base::from(D) * c * d;
        let f = b - e;
        let g = b + e;

        Self {
            x: a * f * ((self.x + self.y) * (other.x + other.y) - c - d),
            y: a * g * (d - Base::from(A) * c),
            z: f * g,
        }
    }
}

impl From<Point> for Projective {
    fn from(point: Point) -> Self {
        Self {
            x: point.x,
            y: point.y,
            z: Base::one(),
        }
    }
}

/// The unified addition law, which is complete on this curve since `a` is a square and `d` is not
impl Add for Point {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        let xx = self.x * other.x;
        let yy = self.y * other.y;
        let dxxyy = Base::from(D) * xx * yy;

        let x = (self.x * other.y + self.y * other.x)
            * (Base::one() + dxxyy).invert().unwrap_or(Base::zero());
        let y = (yy - Base::from(A) * xx) * (Base::one() - dxxyy).invert().unwrap_or(Base::zero());

        Self { x, y }
    }
}

impl Neg for Point {
    type Output = Self;

    fn neg(self) -> Self {
        Self {
            x: -self.x,
            y: self.y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(x: u64, y: u64) -> Point {
        Point::from_coordinates(Element::new(x), Element::new(y))
    }

    #[test]
    fn identity_is_neutral() {
        let identity = Point::identity();
        let not_on_curve = point(3, 4);

        assert!(identity.is_on_curve());
        assert!(!not_on_curve.is_on_curve());
        assert_eq!(identity + identity, identity);
        assert_eq!(-identity, identity);
    }

    #[test]
    fn scalar_multiplication_is_repeated_addition() {
        let generator = crate::pedersen::generator(0);

        let by_addition = (0..13).fold(Point::identity(), |acc, _| acc + generator);

        assert_eq!(generator.mul_scalar(U256::new(13)), by_addition);
        assert_eq!(generator.mul_scalar(U256::ZERO), Point::identity());
        assert_eq!(generator.mul_scalar(U256::ONE), generator);
        assert_eq!(generator + -generator, Point::identity());
    }
}
