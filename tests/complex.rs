use cvxif_complex::alu::{apply, ArithmeticUnit, ComplexAlu};
use cvxif_complex::{wrap, Complex16, Operation};
use num_traits::Zero;
use proptest::prelude::*;

fn modular(x: i32) -> i16 {
    ((x + 32768).rem_euclid(65536) - 32768) as i16
}

#[test]
fn wrap_folds_one_past_each_end() {
    assert_eq!(wrap(32768), -32768);
    assert_eq!(wrap(-32769), 32767);
    assert_eq!(wrap(65534), -2);
    assert_eq!(wrap(-65536), 0);
    assert_eq!(wrap(1234), 1234);
}

#[test]
fn packs_real_into_low_half() {
    let v = Complex16::new(4, 2);
    assert_eq!(v.pack(), 0x0002_0004);
    assert_eq!(Complex16::new(-1, 0).pack(), 0x0000_FFFF);
    assert_eq!(Complex16::new(0, -32768).pack(), 0x8000_0000);
    assert_eq!(Complex16::unpack(0xFFFE_7FFF), Complex16::new(32767, -2));
    assert_eq!(u32::from(Complex16::from((1, -2))), 0xFFFE_0001);
}

#[test]
fn add_without_overflow() {
    let r = apply(Operation::Add, Complex16::new(1, -2), Some(Complex16::new(3, 4)));
    assert_eq!(r, Complex16::new(4, 2));
    assert_eq!(r.pack(), 0x0002_0004);
}

#[test]
fn add_overflows_both_parts() {
    let r = apply(
        Operation::Add,
        Complex16::new(32767, -32768),
        Some(Complex16::new(1, -1)),
    );
    assert_eq!(r, Complex16::new(-32768, 32767));
}

#[test]
fn conjugate_of_most_negative_imag_wraps() {
    let r = apply(Operation::Conjugate, Complex16::new(100, -32768), None);
    assert_eq!(r, Complex16::new(100, -32768));
}

#[test]
fn add_with_missing_operand_reads_zero() {
    let a = Complex16::new(-7, 9);
    assert_eq!(ComplexAlu.apply(Operation::Add, a, None), a);
    assert!(Complex16::zero().is_zero());
}

#[test]
fn conjugate_ignores_second_operand() {
    let a = Complex16::new(5, 6);
    let r = ComplexAlu.apply(Operation::Conjugate, a, Some(Complex16::new(100, 100)));
    assert_eq!(r, Complex16::new(5, -6));
}

#[test]
fn display_shows_both_parts() {
    assert_eq!(Complex16::new(-3, 8).to_string(), "(-3, 8)");
}

proptest! {
    #[test]
    fn add_is_modular(ar: i16, ai: i16, br: i16, bi: i16) {
        let r = apply(Operation::Add, Complex16::new(ar, ai), Some(Complex16::new(br, bi)));
        prop_assert_eq!(r.re, modular(ar as i32 + br as i32));
        prop_assert_eq!(r.im, modular(ai as i32 + bi as i32));
        prop_assert_eq!(r.re, ar.wrapping_add(br));
        prop_assert_eq!(r.im, ai.wrapping_add(bi));
    }

    #[test]
    fn conjugate_negates_imag(ar: i16, ai: i16) {
        let r = apply(Operation::Conjugate, Complex16::new(ar, ai), None);
        prop_assert_eq!(r.re, ar);
        prop_assert_eq!(r.im, modular(-(ai as i32)));
        prop_assert_eq!(r.im, ai.wrapping_neg());
    }

    #[test]
    fn pack_unpack_is_lossless(re: i16, im: i16, word: u32) {
        let v = Complex16::new(re, im);
        prop_assert_eq!(Complex16::unpack(v.pack()), v);
        prop_assert_eq!(Complex16::unpack(word).pack(), word);
    }

    #[test]
    fn apply_is_deterministic(ar: i16, ai: i16, br: i16, bi: i16, conj: bool) {
        let op = if conj { Operation::Conjugate } else { Operation::Add };
        let a = Complex16::new(ar, ai);
        let b = (!conj).then_some(Complex16::new(br, bi));
        prop_assert_eq!(apply(op, a, b).pack(), apply(op, a, b).pack());
    }
}
