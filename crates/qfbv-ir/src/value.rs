// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Arbitrary-width bit-vector values with SMT-LIB operator semantics.

use num::bigint::{BigInt, Sign};
use num::{BigUint, One, ToPrimitive, Zero};
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

/// A fixed-width bit-vector value. The bits are always reduced modulo `2^width`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BvValue {
    width: u32,
    bits: BigUint,
}

fn modulus(width: u32) -> BigUint {
    BigUint::one() << width as usize
}

fn mask(width: u32) -> BigUint {
    modulus(width) - BigUint::one()
}

impl BvValue {
    pub fn new(width: u32, bits: BigUint) -> Self {
        Self {
            width,
            bits: bits % modulus(width),
        }
    }

    pub fn from_u64(value: u64, width: u32) -> Self {
        Self::new(width, BigUint::from(value))
    }

    pub fn zero(width: u32) -> Self {
        Self::new(width, BigUint::zero())
    }

    pub fn ones(width: u32) -> Self {
        Self::new(width, mask(width))
    }

    /// Parses a string of `0`/`1` digits, most significant bit first.
    pub fn from_bin(digits: &str) -> Option<Self> {
        if digits.is_empty() || !digits.bytes().all(|b| b == b'0' || b == b'1') {
            return None;
        }
        let bits = BigUint::parse_bytes(digits.as_bytes(), 2)?;
        Some(Self::new(digits.len() as u32, bits))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn bits(&self) -> &BigUint {
        &self.bits
    }

    pub fn to_u64(&self) -> Option<u64> {
        self.bits.to_u64()
    }

    pub fn is_zero(&self) -> bool {
        self.bits.is_zero()
    }

    pub fn bit(&self, index: u32) -> bool {
        self.bits.bit(index as u64)
    }

    pub fn msb(&self) -> bool {
        self.width > 0 && self.bit(self.width - 1)
    }

    /// Two's complement interpretation.
    pub fn to_signed(&self) -> BigInt {
        let unsigned = BigInt::from_biguint(Sign::Plus, self.bits.clone());
        if self.msb() {
            unsigned - BigInt::from_biguint(Sign::Plus, modulus(self.width))
        } else {
            unsigned
        }
    }

    /// Binary digits padded to the width.
    pub fn to_bin(&self) -> String {
        format!("{:0>w$}", self.bits.to_str_radix(2), w = self.width as usize)
    }

    fn with_bits(&self, bits: BigUint) -> Self {
        Self::new(self.width, bits)
    }

    pub fn not(&self) -> Self {
        self.with_bits(&self.bits ^ mask(self.width))
    }

    pub fn neg(&self) -> Self {
        self.with_bits(modulus(self.width) - &self.bits)
    }

    pub fn add(&self, other: &Self) -> Self {
        self.with_bits(&self.bits + &other.bits)
    }

    pub fn sub(&self, other: &Self) -> Self {
        self.add(&other.neg())
    }

    pub fn mul(&self, other: &Self) -> Self {
        self.with_bits(&self.bits * &other.bits)
    }

    /// Unsigned division; division by zero yields all ones.
    pub fn udiv(&self, other: &Self) -> Self {
        if other.is_zero() {
            Self::ones(self.width)
        } else {
            self.with_bits(&self.bits / &other.bits)
        }
    }

    /// Unsigned remainder; the remainder of division by zero is the dividend.
    pub fn urem(&self, other: &Self) -> Self {
        if other.is_zero() {
            self.clone()
        } else {
            self.with_bits(&self.bits % &other.bits)
        }
    }

    pub fn sdiv(&self, other: &Self) -> Self {
        match (self.msb(), other.msb()) {
            (false, false) => self.udiv(other),
            (true, false) => self.neg().udiv(other).neg(),
            (false, true) => self.udiv(&other.neg()).neg(),
            (true, true) => self.neg().udiv(&other.neg()),
        }
    }

    /// Signed remainder, sign follows the dividend.
    pub fn srem(&self, other: &Self) -> Self {
        match (self.msb(), other.msb()) {
            (false, false) => self.urem(other),
            (true, false) => self.neg().urem(other).neg(),
            (false, true) => self.urem(&other.neg()),
            (true, true) => self.neg().urem(&other.neg()).neg(),
        }
    }

    pub fn and(&self, other: &Self) -> Self {
        self.with_bits(&self.bits & &other.bits)
    }

    pub fn or(&self, other: &Self) -> Self {
        self.with_bits(&self.bits | &other.bits)
    }

    pub fn xor(&self, other: &Self) -> Self {
        self.with_bits(&self.bits ^ &other.bits)
    }

    /// Shift amount if it is smaller than the width.
    fn shift_amount(&self, amount: &Self) -> Option<usize> {
        if amount.bits < BigUint::from(self.width) {
            amount.bits.to_usize()
        } else {
            None
        }
    }

    pub fn shl(&self, amount: &Self) -> Self {
        match self.shift_amount(amount) {
            Some(n) => self.with_bits(&self.bits << n),
            None => Self::zero(self.width),
        }
    }

    pub fn lshr(&self, amount: &Self) -> Self {
        match self.shift_amount(amount) {
            Some(n) => self.with_bits(&self.bits >> n),
            None => Self::zero(self.width),
        }
    }

    pub fn ashr(&self, amount: &Self) -> Self {
        if self.msb() {
            self.not().lshr(amount).not()
        } else {
            self.lshr(amount)
        }
    }

    /// `self` in the high bits, `low` in the low bits.
    pub fn concat(&self, low: &Self) -> Self {
        Self::new(
            self.width + low.width,
            (&self.bits << low.width as usize) | &low.bits,
        )
    }

    pub fn extract(&self, hi: u32, lo: u32) -> Self {
        Self::new(hi - lo + 1, &self.bits >> lo as usize)
    }

    pub fn zero_extend(&self, by: u32) -> Self {
        Self::new(self.width + by, self.bits.clone())
    }

    pub fn sign_extend(&self, by: u32) -> Self {
        if self.msb() {
            Self::ones(by).concat(self)
        } else {
            self.zero_extend(by)
        }
    }

    pub fn unsigned_cmp(&self, other: &Self) -> Ordering {
        self.bits.cmp(&other.bits)
    }

    pub fn signed_cmp(&self, other: &Self) -> Ordering {
        self.to_signed().cmp(&other.to_signed())
    }
}

impl Display for BvValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#b{}", self.to_bin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bv(bits: &str) -> BvValue {
        BvValue::from_bin(bits).unwrap()
    }

    #[test]
    fn arithmetic_wraps() {
        assert_eq!(bv("1111").add(&bv("0010")), bv("0001"));
        assert_eq!(bv("0000").sub(&bv("0001")), bv("1111"));
        assert_eq!(bv("0000").neg(), bv("0000"));
        assert_eq!(bv("0110").mul(&bv("0011")), bv("0010"));
    }

    #[test]
    fn signed_division() {
        // -7 / 2 = -3 and -7 rem 2 = -1
        assert_eq!(bv("1001").sdiv(&bv("0010")), bv("1101"));
        assert_eq!(bv("1001").srem(&bv("0010")), bv("1111"));
        assert_eq!(bv("1001").sdiv(&bv("0000")), bv("0001"));
        assert_eq!(bv("0101").udiv(&bv("0000")), bv("1111"));
        assert_eq!(bv("0101").urem(&bv("0000")), bv("0101"));
    }

    #[test]
    fn shifts_saturate() {
        assert_eq!(bv("1001").shl(&bv("0001")), bv("0010"));
        assert_eq!(bv("1001").lshr(&bv("0100")), bv("0000"));
        assert_eq!(bv("1001").ashr(&bv("0010")), bv("1110"));
        assert_eq!(bv("1001").ashr(&bv("1111")), bv("1111"));
    }

    #[test]
    fn structure() {
        assert_eq!(bv("10").concat(&bv("011")), bv("10011"));
        assert_eq!(bv("110100").extract(4, 2), bv("101"));
        assert_eq!(bv("1010").sign_extend(4), bv("11111010"));
        assert_eq!(bv("1010").zero_extend(4), bv("00001010"));
        assert_eq!(bv("1000").signed_cmp(&bv("0111")), Ordering::Less);
        assert_eq!(bv("1000").unsigned_cmp(&bv("0111")), Ordering::Greater);
        assert_eq!(bv("0011").to_string(), "#b0011");
        assert_eq!(BvValue::from_bin("012"), None);
    }
}
