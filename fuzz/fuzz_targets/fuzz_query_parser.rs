#![no_main]

use libfuzzer_sys::fuzz_target;
use pfx::index::IndexConfig;

fuzz_target!(|data: &str| {
    // Parsing and tokenizing must never panic
    let node = pfx::query::parse_query(data);
    let _ = node.is_empty();
    let _ = pfx::query::query_tokens(data, &IndexConfig::default());
});
