#![no_main]

use libfuzzer_sys::fuzz_target;
use soundmatch::Index;

// Arbitrary bytes must load cleanly or fail with an error, never panic.
// Anything that loads must re-encode to the same bytes.
fuzz_target!(|data: &[u8]| {
    if let Ok(index) = Index::from_bytes(data) {
        let bytes = index.to_bytes().expect("loaded index re-encodes");
        assert_eq!(bytes, data);
    }
});
