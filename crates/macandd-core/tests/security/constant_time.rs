//! Comparison semantics of the tag check helpers.

use macandd_core::{constant_time_eq, SecretBytes};

#[test]
fn equal_inputs_compare_equal() {
    assert!(constant_time_eq(&[7; 32], &[7; 32]));
    assert!(constant_time_eq(&[], &[]));
    assert!(SecretBytes::new([9u8; 32]).ct_eq(&[9; 32]));
}

#[test]
fn any_single_bit_difference_is_detected() {
    let base = [0x5Au8; 32];
    for byte in 0..32 {
        for bit in 0..8 {
            let mut other = base;
            other[byte] ^= 1 << bit;
            assert!(!constant_time_eq(&base, &other), "byte {byte} bit {bit}");
            assert!(!SecretBytes::new(base).ct_eq(&other));
        }
    }
}

#[test]
fn length_mismatch_is_unequal() {
    assert!(!constant_time_eq(&[1, 2, 3], &[1, 2]));
    assert!(!constant_time_eq(&[], &[0]));
}
