#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes either decode into a consistent snapshot or fail cleanly
    if let Ok(snapshot) = pfx::index::decode_snapshot(data) {
        assert!(snapshot.words.is_sorted());
        let _ = pfx::index::IndexStats::from_snapshot(&snapshot);
    }
});
