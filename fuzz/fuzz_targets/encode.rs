#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(wbxml) = wbxml_codec::encode(data) {
        // Anything the encoder accepts must decode again
        wbxml_codec::decode(&wbxml).unwrap();
    }
});
