#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let s = String::from_utf8_lossy(data);

    // Parsing arbitrary input must never panic; on success, compiling the
    // document must never panic either.
    if let Ok(doc) = stinger::parse(&s) {
        let registry = stinger::ActionRegistry::with_builtins();
        let _ = stinger::RuleSet::compile(&doc, &registry);
    }
});
