use tracing::Level;
use wbxml_codec::*;

fn main() {
    tracing_subscriber::fmt().with_max_level(Level::TRACE).init();

    let xml = r#"<Sync xmlns="AirSync:" xmlns:A1="Contacts:" xmlns:A2="AirSyncBase:">
        <Collections>
            <Collection>
                <SyncKey>1</SyncKey>
                <CollectionId>Contact:DEFAULT</CollectionId>
                <Commands>
                    <Add>
                        <ClientId>1</ClientId>
                        <ApplicationData>
                            <A1:FirstName>Fulbert</A1:FirstName>
                            <A2:Body><A2:Type>1</A2:Type><A2:Data>Hello</A2:Data></A2:Body>
                            <A1:LastName>Creme</A1:LastName>
                        </ApplicationData>
                    </Add>
                </Commands>
            </Collection>
        </Collections>
    </Sync>"#;

    let wbxml = encode(xml).unwrap();
    let doc = decode(&wbxml).unwrap();
    println!("{}", doc.to_xml().unwrap());
}
