#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(cfdi) = cfdi::Cfdi::from_xml(s) else {
        return;
    };
    // Whatever serializes must read back with the same original chain.
    if let Ok(xml) = cfdi.to_xml() {
        let again = cfdi::Cfdi::from_xml(&xml).expect("serialized document must parse");
        assert_eq!(again.original_chain().ok(), cfdi.original_chain().ok());
    }
    let mut recalculated = cfdi.clone();
    let _ = recalculated.calculate_totals();
});
