#![no_main]

use cfdi::Node;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(serde_json::Value::Object(map)) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    if let Ok(doc) = cfdi::Comprobante::from_map(&map) {
        let _ = doc.to_element();
        let _ = cfdi::validate_arithmetic(&doc);
    }
});
