//! Verify that `SecretBytes` and `KdfInput` actually zero memory on drop.
//!
//! The values are wrapped in `ManuallyDrop` and dropped in place, so the
//! storage stays valid and can be inspected after the destructor ran.

use std::mem::ManuallyDrop;

use macandd_core::{KdfInput, SecretBytes};

#[test]
fn secret_bytes_zeroed_after_drop() {
    let mut key = ManuallyDrop::new(SecretBytes::<32>::new([0xAB; 32]));
    let data_ptr = key.expose().as_ptr();
    assert_eq!(key.expose()[0], 0xAB);

    // SAFETY: `key` is dropped exactly once and never used as a
    // `SecretBytes` afterwards; its storage lives until the end of scope.
    let zeroed = unsafe {
        std::ptr::drop_in_place(&mut *key);
        std::slice::from_raw_parts(data_ptr, 32).iter().all(|&b| b == 0)
    };

    assert!(
        zeroed,
        "SecretBytes<32> memory was NOT zeroed after drop: ZeroizeOnDrop may be broken"
    );
}

#[test]
fn kdf_input_zeroed_after_drop() {
    let mut input = ManuallyDrop::new(KdfInput::new(b"\xEE\xEE\xEE\xEE", &[0xEE; 64]).unwrap());
    let data_ptr = input.as_bytes().as_ptr();
    let len = input.as_bytes().len();
    assert_eq!(len, 68);

    // SAFETY: as above.
    let sentinel_found = unsafe {
        std::ptr::drop_in_place(&mut *input);
        std::slice::from_raw_parts(data_ptr, len).contains(&0xEE)
    };

    assert!(!sentinel_found, "PIN bytes survived KdfInput drop");
}
