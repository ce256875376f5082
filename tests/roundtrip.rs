use rand::prelude::*;
use rand::rngs::StdRng;
use wbxml_codec::*;

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789 -:/{}<>&\"'";

fn random_text<R: Rng>(rng: &mut R) -> String {
    if rng.gen_bool(0.1) {
        let blank = [" ", "  ", "\t", "\n", " \n "];
        return blank.choose(rng).unwrap().to_string();
    }
    let mut text = String::new();
    let len = rng.gen_range(1..24);
    text.extend((0..len).map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char));
    if rng.gen_bool(0.1) {
        text.push_str("é€😀");
    }
    text
}

fn random_node<R: Rng>(rng: &mut R, pages: &[&Codepage], depth: usize) -> Node {
    let page = pages.choose(rng).unwrap();
    let (_, name) = page.tags.choose(rng).unwrap();
    let mut node = Node::new(name.clone(), Some(page.namespace.clone()));
    if depth == 0 {
        return node;
    }
    match rng.gen_range(0..4) {
        0 => (),
        1 => node = node.text(random_text(rng)),
        _ => {
            for _ in 0..rng.gen_range(1..5) {
                node = node.child(random_node(rng, pages, depth - 1));
            }
        }
    }
    node
}

#[test]
fn random_trees_roundtrip() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let dict = Dictionary::activesync();
    let pages: Vec<&Codepage> = dict.codepages().collect();
    let encoder = Encoder::new(dict);
    let decoder = Decoder::new(dict);

    for _ in 0..200 {
        let depth = rng.gen_range(0..6);
        let root = random_node(&mut rng, &pages, depth);
        let wbxml = encoder.encode(&root).unwrap();
        let doc = decoder.decode(&wbxml).unwrap();
        assert_eq!(doc.root, root);
        assert_eq!(encoder.encode(&doc).unwrap(), wbxml);

        // The rendered text must parse back to the same tree, generated prefixes and all
        let xml = doc.to_xml().unwrap();
        let reparsed = Document::from_xml(&xml).unwrap();
        assert_eq!(reparsed.root, root, "{}", xml);
    }
}

#[test]
fn truncation_never_panics() {
    let mut rng = StdRng::seed_from_u64(7);
    let dict = Dictionary::activesync();
    let pages: Vec<&Codepage> = dict.codepages().collect();
    let encoder = Encoder::new(dict);
    let decoder = Decoder::new(dict);

    for _ in 0..20 {
        let root = random_node(&mut rng, &pages, 4);
        let wbxml = encoder.encode(&root).unwrap();
        for len in 0..wbxml.len() {
            assert!(
                decoder.decode(&wbxml[..len]).is_err(),
                "decoded a stream cut to {} of {} bytes",
                len,
                wbxml.len()
            );
        }
    }
}

#[test]
fn random_bytes_never_panic() {
    let mut rng = StdRng::seed_from_u64(42);
    let decoder = Decoder::new(Dictionary::activesync());
    for _ in 0..2000 {
        let mut wbxml = b"\x03\x01j\x00".to_vec();
        let len = rng.gen_range(0..64);
        wbxml.extend((0..len).map(|_| rng.gen::<u8>()));
        // Only the absence of a panic matters here
        let _ = decoder.decode(&wbxml);
    }
}

#[test]
fn random_mutations_never_panic() {
    let mut rng = StdRng::seed_from_u64(99);
    let decoder = Decoder::new(Dictionary::activesync());
    let base = encode(
        r#"<Sync xmlns="AirSync:" xmlns:A1="Contacts:"><Collections><Collection><SyncKey>0</SyncKey><Supported><A1:JobTitle/><A1:Department/></Supported></Collection></Collections></Sync>"#,
    )
    .unwrap();
    for _ in 0..2000 {
        let mut wbxml = base.clone();
        for _ in 0..rng.gen_range(1..4) {
            let i = rng.gen_range(0..wbxml.len());
            wbxml[i] = rng.gen();
        }
        if let Ok(doc) = decoder.decode(&wbxml) {
            // Whatever decodes must also render
            doc.to_xml().unwrap();
        }
    }
}
