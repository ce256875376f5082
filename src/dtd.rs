//! The tag dictionary: code pages mapping tag names to byte codes, and namespaces to code pages.

use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::{
    codepages,
    error::{Error, Result},
    token::{MIN_TAG_CODE, TAG_CODE_MASK},
};

/// One code page: the namespace it covers and the byte code of each tag in it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Codepage {
    /// Index written after `SWITCH_PAGE`.
    pub index: u8,
    /// Namespace URI, e.g. `"AirSync:"`.
    pub namespace: String,
    /// `(code, local name)` pairs.
    pub tags: Vec<(u8, String)>,
}

impl Codepage {
    pub fn new(index: u8, namespace: impl Into<String>) -> Self {
        Self {
            index,
            namespace: namespace.into(),
            tags: Vec::new(),
        }
    }

    /// Add a tag to this page.
    pub fn tag(mut self, code: u8, name: impl Into<String>) -> Self {
        self.tags.push((code, name.into()));
        self
    }

    fn from_table(index: u8, namespace: &str, table: codepages::Table) -> Self {
        Self {
            index,
            namespace: namespace.to_string(),
            tags: table
                .iter()
                .map(|(code, name)| (*code, name.to_string()))
                .collect(),
        }
    }
}

/// Bidirectional tag dictionary.
///
/// Both lookup directions are built together from the same [`Codepage`] tables: `code -> name`
/// for decoding and `name -> code` for encoding, plus `codepage <-> namespace`. The dictionary is
/// immutable once built and can be shared freely between threads.
#[derive(Clone, Debug)]
pub struct Dictionary {
    pages: BTreeMap<u8, Codepage>,
    names: HashMap<(u8, u8), String>,
    codes: HashMap<u8, HashMap<String, u8>>,
    namespaces: HashMap<u8, String>,
    codepages: HashMap<String, u8>,
}

static ACTIVESYNC: OnceLock<Dictionary> = OnceLock::new();

impl Dictionary {
    /// Build a dictionary from a set of code pages.
    ///
    /// # Errors
    ///
    /// Fails if two pages share an index or namespace, if a code is outside `0x05..=0x3F`, or if
    /// a code or name appears twice within a page.
    pub fn new(pages: impl IntoIterator<Item = Codepage>) -> Result<Self> {
        let pages: Vec<Codepage> = pages.into_iter().collect();
        let mut seen_ns = HashMap::new();
        for page in pages.iter() {
            if let Some(other) = seen_ns.insert(page.namespace.as_str(), page.index) {
                return Err(Error::BadDictionary(format!(
                    "namespace {:?} used by codepages {} and {}",
                    page.namespace, other, page.index
                )));
            }
            let mut seen_codes = HashMap::new();
            let mut seen_names = HashMap::new();
            for (code, name) in page.tags.iter() {
                if !(MIN_TAG_CODE..=TAG_CODE_MASK).contains(code) {
                    return Err(Error::BadDictionary(format!(
                        "tag {} on codepage {} has code 0x{:02x}, outside 0x05..=0x3f",
                        name, page.index, code
                    )));
                }
                if seen_codes.insert(*code, name.as_str()).is_some() {
                    return Err(Error::BadDictionary(format!(
                        "code 0x{:02x} used twice on codepage {}",
                        code, page.index
                    )));
                }
                if seen_names.insert(name.as_str(), *code).is_some() {
                    return Err(Error::BadDictionary(format!(
                        "tag {} used twice on codepage {}",
                        name, page.index
                    )));
                }
            }
        }
        let page_count = pages.len();
        let dict = Self::build(pages);
        if dict.pages.len() != page_count {
            return Err(Error::BadDictionary("codepage index used twice".into()));
        }
        Ok(dict)
    }

    /// The built-in ActiveSync dictionary, constructed on first use.
    pub fn activesync() -> &'static Dictionary {
        ACTIVESYNC.get_or_init(|| {
            Self::build(
                codepages::ACTIVESYNC
                    .iter()
                    .map(|(index, ns, table)| Codepage::from_table(*index, ns, table)),
            )
        })
    }

    // Fill every lookup direction from the same pages. Doesn't validate anything.
    fn build(pages: impl IntoIterator<Item = Codepage>) -> Self {
        let mut dict = Self {
            pages: BTreeMap::new(),
            names: HashMap::new(),
            codes: HashMap::new(),
            namespaces: HashMap::new(),
            codepages: HashMap::new(),
        };
        for page in pages {
            let codes = dict.codes.entry(page.index).or_default();
            for (code, name) in page.tags.iter() {
                dict.names.insert((page.index, *code), name.clone());
                codes.insert(name.clone(), *code);
            }
            dict.namespaces.insert(page.index, page.namespace.clone());
            dict.codepages.insert(page.namespace.clone(), page.index);
            dict.pages.insert(page.index, page);
        }
        dict
    }

    /// Look up a tag name from its code (decode direction).
    pub fn tag_for(&self, codepage: u8, code: u8) -> Result<&str> {
        self.names
            .get(&(codepage, code))
            .map(String::as_str)
            .ok_or(Error::UnknownCode { codepage, code })
    }

    /// Look up a tag code from its name (encode direction).
    pub fn code_for(&self, codepage: u8, tag: &str) -> Result<u8> {
        self.codes
            .get(&codepage)
            .and_then(|codes| codes.get(tag))
            .copied()
            .ok_or_else(|| Error::UnknownTag {
                codepage,
                tag: tag.to_string(),
            })
    }

    pub fn namespace_for(&self, codepage: u8) -> Result<&str> {
        self.namespaces
            .get(&codepage)
            .map(String::as_str)
            .ok_or(Error::UnknownCodepage(codepage))
    }

    pub fn codepage_for(&self, namespace: &str) -> Result<u8> {
        self.codepages
            .get(namespace)
            .copied()
            .ok_or_else(|| Error::UnknownNamespace(namespace.to_string()))
    }

    /// Iterate over the code pages in index order.
    pub fn codepages(&self) -> impl Iterator<Item = &Codepage> {
        self.pages.values()
    }

    /// Namespace part of a `{uri}local` name. See [`get_ns`].
    pub fn get_ns<'a>(&self, qualified: &'a str) -> Option<&'a str> {
        get_ns(qualified)
    }

    /// Local part of a `{uri}local` name. See [`get_tag`].
    pub fn get_tag<'a>(&self, qualified: &'a str, namespace: Option<&str>) -> &'a str {
        get_tag(qualified, namespace)
    }
}

/// Namespace URI of a Clark-notation name (`{uri}local`), or `None` if it has no `{uri}` part.
///
/// ```
/// # use wbxml_codec::get_ns;
/// assert_eq!(get_ns("{FolderHierarchy:}FolderSync"), Some("FolderHierarchy:"));
/// assert_eq!(get_ns("FolderHierarchy:FolderSync"), None);
/// ```
pub fn get_ns(qualified: &str) -> Option<&str> {
    qualified
        .strip_prefix('{')
        .and_then(|rest| rest.split_once('}'))
        .map(|(ns, _)| ns)
}

/// Local name of a Clark-notation name, given its namespace. The name comes back unchanged when
/// `namespace` is `None` or doesn't match.
pub fn get_tag<'a>(qualified: &'a str, namespace: Option<&str>) -> &'a str {
    namespace
        .and_then(|ns| {
            qualified
                .strip_prefix('{')
                .and_then(|rest| rest.strip_prefix(ns))
                .and_then(|rest| rest.strip_prefix('}'))
        })
        .unwrap_or(qualified)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn builtin_tables_valid() {
        let pages: Vec<Codepage> = Dictionary::activesync().codepages().cloned().collect();
        assert_eq!(pages.len(), codepages::ACTIVESYNC.len());
        Dictionary::new(pages).unwrap();
    }

    #[test]
    fn inverse() {
        let dict = Dictionary::activesync();
        for page in dict.codepages() {
            assert_eq!(dict.namespace_for(page.index).unwrap(), page.namespace);
            assert_eq!(dict.codepage_for(&page.namespace).unwrap(), page.index);
            for (code, name) in page.tags.iter() {
                let found = dict.code_for(page.index, name).unwrap();
                assert_eq!(found, *code);
                assert_eq!(dict.tag_for(page.index, found).unwrap(), name);
            }
        }
    }

    #[test]
    fn known_codes() {
        let dict = Dictionary::activesync();
        assert_eq!(dict.codepage_for("FolderHierarchy:").unwrap(), 7);
        assert_eq!(dict.code_for(7, "FolderSync").unwrap(), 0x16);
        assert_eq!(dict.code_for(0, "Collections").unwrap(), 0x1c);
        assert_eq!(dict.tag_for(1, 0x28).unwrap(), "JobTitle");
        assert_eq!(dict.tag_for(18, 0x22).unwrap(), "MobileOperator");
        assert_eq!(dict.namespace_for(17).unwrap(), "AirSyncBase:");
    }

    #[test]
    fn unknown() {
        let dict = Dictionary::activesync();
        assert!(matches!(
            dict.tag_for(0, 0x3f),
            Err(Error::UnknownCode {
                codepage: 0,
                code: 0x3f
            })
        ));
        assert!(matches!(
            dict.code_for(7, "JobTitle"),
            Err(Error::UnknownTag { codepage: 7, .. })
        ));
        assert!(matches!(dict.namespace_for(3), Err(Error::UnknownCodepage(3))));
        assert!(matches!(
            dict.codepage_for("Bogus:"),
            Err(Error::UnknownNamespace(_))
        ));
    }

    #[test]
    fn custom_dictionary() {
        let dict = Dictionary::new([
            Codepage::new(0, "A:").tag(0x05, "Root").tag(0x06, "Leaf"),
            Codepage::new(3, "B:").tag(0x05, "Other"),
        ])
        .unwrap();
        assert_eq!(dict.code_for(3, "Other").unwrap(), 0x05);
        assert_eq!(dict.tag_for(0, 0x06).unwrap(), "Leaf");
        let indices: Vec<u8> = dict.codepages().map(|p| p.index).collect();
        assert_eq!(indices, vec![0, 3]);
    }

    #[test]
    fn bad_dictionaries() {
        let reserved = Dictionary::new([Codepage::new(0, "A:").tag(0x04, "Root")]);
        assert!(matches!(reserved, Err(Error::BadDictionary(_))));
        let too_big = Dictionary::new([Codepage::new(0, "A:").tag(0x40, "Root")]);
        assert!(matches!(too_big, Err(Error::BadDictionary(_))));
        let dup_code =
            Dictionary::new([Codepage::new(0, "A:").tag(0x05, "Root").tag(0x05, "Leaf")]);
        assert!(matches!(dup_code, Err(Error::BadDictionary(_))));
        let dup_name =
            Dictionary::new([Codepage::new(0, "A:").tag(0x05, "Root").tag(0x06, "Root")]);
        assert!(matches!(dup_name, Err(Error::BadDictionary(_))));
        let dup_ns = Dictionary::new([Codepage::new(0, "A:"), Codepage::new(1, "A:")]);
        assert!(matches!(dup_ns, Err(Error::BadDictionary(_))));
        let dup_index = Dictionary::new([Codepage::new(0, "A:"), Codepage::new(0, "B:")]);
        assert!(matches!(dup_index, Err(Error::BadDictionary(_))));
    }

    #[test]
    fn qualified_names() {
        assert_eq!(
            get_ns("{FolderHierarchy:}FolderSync"),
            Some("FolderHierarchy:")
        );
        assert_eq!(get_ns("FolderHierarchy:FolderSync"), None);
        assert_eq!(
            get_tag("{FolderHierarchy:}FolderSync", Some("FolderHierarchy:")),
            "FolderSync"
        );
        assert_eq!(
            get_tag("{FolderHierarchy:}FolderSync", None),
            "{FolderHierarchy:}FolderSync"
        );
        assert_eq!(
            get_tag("{FolderHierarchy:}FolderSync", Some("AirSync:")),
            "{FolderHierarchy:}FolderSync"
        );
    }

    #[test]
    fn codepage_from_data() {
        let page = Codepage::new(12, "Contacts2:").tag(0x05, "CustomerId");
        let json = serde_json::to_string(&page).unwrap();
        assert_eq!(
            json,
            r#"{"index":12,"namespace":"Contacts2:","tags":[[5,"CustomerId"]]}"#
        );
        let back: Codepage = serde_json::from_str(&json).unwrap();
        let dict = Dictionary::new([back]).unwrap();
        assert_eq!(dict.tag_for(12, 0x05).unwrap(), "CustomerId");
    }
}
