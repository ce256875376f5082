use wbxml_codec::*;

fn main() {
    // A Sync request asking for contact changes, built as a tree
    let airsync = Some("AirSync:".to_string());
    let request = Node::new("Sync", airsync.clone()).child(
        Node::new("Collections", airsync.clone()).child(
            Node::new("Collection", airsync.clone())
                .leaf("SyncKey", "0")
                .leaf("CollectionId", "Contact:DEFAULT")
                .child(
                    Node::new("Supported", airsync.clone())
                        .child(Node::new("JobTitle", Some("Contacts:".into())).with_prefix("A1"))
                        .child(Node::new("Department", Some("Contacts:".into())).with_prefix("A1")),
                )
                .child(Node::new("GetChanges", airsync)),
        ),
    );
    println!("Request as XML:\n{}\n", request.to_xml().unwrap());

    let wbxml = encode(&request).unwrap();
    let hex: Vec<String> = wbxml.iter().map(|b| format!("{:02x}", b)).collect();
    println!("Request as WBXML ({} bytes):\n{}\n", wbxml.len(), hex.join(" "));

    // The server side sees the same tree again
    let doc = decode(&wbxml).unwrap();
    assert_eq!(doc.root, request);
    let collection = doc
        .root
        .find("Collections")
        .and_then(|n| n.find("Collection"))
        .unwrap();
    println!(
        "Collection {} at sync key {}",
        collection.find("CollectionId").unwrap().text_content(),
        collection.find("SyncKey").unwrap().text_content()
    );
}
