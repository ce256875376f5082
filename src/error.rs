use std::convert::Infallible;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Occurs when the encoder is handed something that isn't an XML document: a missing value,
    /// bytes that aren't text, or a tree using features this profile doesn't have.
    #[error("Wrong XML type: {0}")]
    WrongXmlType(String),
    /// The XML parser rejected the input text. The parser's own error is kept as the source.
    #[error("XML syntax error: {0}")]
    Xml(#[from] quick_xml::Error),
    /// The XML text was lexically fine but isn't a single well-formed document.
    #[error("Malformed XML document: {0}")]
    MalformedXml(String),
    /// A tag name isn't in the code table of the active codepage.
    #[error("Unknown tag {tag} on codepage {codepage}")]
    UnknownTag { codepage: u8, tag: String },
    /// A tag code isn't in the code table of the active codepage.
    #[error("Unknown tag code 0x{code:02x} on codepage {codepage}")]
    UnknownCode { codepage: u8, code: u8 },
    /// No codepage exists for a namespace.
    #[error("Unknown namespace {0:?}")]
    UnknownNamespace(String),
    /// A codepage index isn't in the dictionary.
    #[error("Unknown codepage {0}")]
    UnknownCodepage(u8),
    /// Occurs when the WBXML header (version, public id, charset, string table) failed to parse
    /// correctly or uses something this codec doesn't support.
    #[error("Data has bad header format: {0}")]
    BadHeader(String),
    /// Stream ended too early.
    #[error("Expected data length {expected}, but got {actual} on step [{step}]")]
    LengthTooShort {
        step: &'static str,
        actual: usize,
        expected: usize,
    },
    /// Basic WBXML encoding failure
    #[error("Basic data encoding failure: {0}")]
    BadEncode(String),
    /// A global token this profile has no use for (string table references, literals,
    /// extensions, processing instructions, attributes).
    #[error("Unsupported WBXML token 0x{0:02x}")]
    UnsupportedToken(u8),
    /// Document hit some parsing limit.
    #[error("Hit parsing limit: {0}")]
    ParseLimit(String),
    /// A codepage table handed to the dictionary is inconsistent.
    #[error("Bad dictionary: {0}")]
    BadDictionary(String),
}

impl Error {
    /// True for errors raised because the XML text itself couldn't be parsed into a document.
    pub fn is_xml_syntax(&self) -> bool {
        matches!(self, Error::Xml(_) | Error::MalformedXml(_))
    }

    /// True for lookups that failed against the dictionary.
    pub fn is_unknown_tag(&self) -> bool {
        matches!(
            self,
            Error::UnknownTag { .. }
                | Error::UnknownCode { .. }
                | Error::UnknownNamespace(_)
                | Error::UnknownCodepage(_)
        )
    }
}

impl From<Infallible> for Error {
    fn from(e: Infallible) -> Self {
        match e {}
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        Self::Xml(quick_xml::Error::InvalidAttr(e))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn classes() {
        assert!(Error::MalformedXml("no root element".into()).is_xml_syntax());
        assert!(!Error::WrongXmlType("None".into()).is_xml_syntax());
        assert!(Error::UnknownCode {
            codepage: 0,
            code: 0x3f
        }
        .is_unknown_tag());
        assert!(!Error::BadHeader("version".into()).is_unknown_tag());
    }

    #[test]
    fn display() {
        let e = Error::UnknownCode {
            codepage: 7,
            code: 0x05,
        };
        assert_eq!(e.to_string(), "Unknown tag code 0x05 on codepage 7");
        let e = Error::LengthTooShort {
            step: "decode STR_I",
            actual: 3,
            expected: 4,
        };
        assert_eq!(
            e.to_string(),
            "Expected data length 4, but got 3 on step [decode STR_I]"
        );
    }
}
