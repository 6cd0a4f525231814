#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Errors are fine, panics are bugs.
        if let Ok(cfdi) = cfdi::Cfdi::from_xml(s) {
            let _ = cfdi.original_chain();
            let _ = cfdi.warnings();
        }
    }
});
