//! Secret-bearing types never print their contents.

use macandd_core::{KdfInput, SecretBytes};

#[test]
fn secret_bytes_debug_and_display_are_masked() {
    let key = SecretBytes::<32>::new([0x41; 32]);
    assert_eq!(format!("{key:?}"), "SecretBytes<32>(***)");
    assert_eq!(format!("{key}"), "SecretBytes<32>(***)");
    assert!(!format!("{key:?}").contains("65"));
}

#[test]
fn kdf_input_debug_is_masked() {
    let input = KdfInput::new(b"1234", b"serial").unwrap();
    let debug = format!("{input:?}");
    assert_eq!(debug, "KdfInput(***)");
    assert!(!debug.contains("1234"));
}

#[test]
fn pin_errors_never_carry_pin_bytes() {
    let err = KdfInput::new(b"12345678901", b"").unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("11 bytes"));
    assert!(!msg.contains("12345678901"));
}
