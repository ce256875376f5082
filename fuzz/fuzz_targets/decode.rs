#![no_main]
use libfuzzer_sys::fuzz_target;
use wbxml_codec::{Decoder, Dictionary};

fuzz_target!(|data: &[u8]| {
    if let Ok(doc) = Decoder::new(Dictionary::activesync()).decode(data) {
        let _ = doc.to_xml();
    }
});
