use byteorder::ReadBytesExt;

use crate::{
    depth_tracking::DepthTracker,
    error::{Error, Result},
    token::*,
    varint::VarInt,
};

/// One token of a WBXML body, as written by the encoder or read by the [`Parser`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Element<'a> {
    SwitchPage(u8),
    End,
    Str(&'a str),
    Entity(u32),
    Opaque(&'a [u8]),
    Tag { code: u8, content: bool },
}

/// Serialize an element onto a byte vector. Doesn't check if tags and ends balance, just writes
/// elements out.
///
/// # Panics
///
/// Panics if a string contains a NUL byte or a tag code is outside the dictionary range. The
/// encoder checks both before calling this.
pub fn serialize_elem(buf: &mut Vec<u8>, elem: Element) {
    use self::Element::*;
    match elem {
        SwitchPage(page) => {
            buf.push(Token::SwitchPage.into());
            buf.push(page);
        }
        End => buf.push(Token::End.into()),
        Str(v) => {
            assert!(!v.as_bytes().contains(&0), "STR_I content may not contain NUL");
            buf.push(Token::StrI.into());
            buf.extend_from_slice(v.as_bytes());
            buf.push(0);
        }
        Entity(v) => {
            buf.push(Token::Entity.into());
            VarInt::from(v).write(buf);
        }
        Opaque(v) => {
            assert!(v.len() <= (u32::MAX as usize));
            buf.push(Token::Opaque.into());
            VarInt::from(v.len() as u32).write(buf);
            buf.extend_from_slice(v);
        }
        Tag { code, content } => {
            assert!((MIN_TAG_CODE..=TAG_CODE_MASK).contains(&code));
            buf.push(
                Token::Tag {
                    code,
                    content,
                    attributes: false,
                }
                .into(),
            );
        }
    }
}

/// Iterates over the tokens of a WBXML body. Stops after the first error.
#[derive(Clone, Debug)]
pub struct Parser<'a> {
    data: &'a [u8],
    depth_tracking: DepthTracker,
    errored: bool,
}

impl<'a> Parser<'a> {
    /// Start parsing a body. `data` must already be past the header.
    pub fn new(data: &'a [u8]) -> Parser<'a> {
        Self {
            data,
            depth_tracking: DepthTracker::new(),
            errored: false,
        }
    }

    /// Number of elements opened but not yet closed by `END`.
    pub fn depth(&self) -> usize {
        self.depth_tracking.depth()
    }

    // Given a retrieved token, try to turn it into the next element, which may move through the
    // data. If we can't, error. This function *does not* set the the errored flag. That's
    // up to the caller.
    fn parse_element(&mut self, byte: u8) -> Result<Element<'a>> {
        let elem = match Token::from_u8(byte) {
            Token::SwitchPage => {
                let page = self.data.read_u8().map_err(|_| Error::LengthTooShort {
                    step: "decode SWITCH_PAGE index",
                    actual: 0,
                    expected: 1,
                })?;
                Element::SwitchPage(page)
            }
            Token::End => Element::End,
            Token::StrI => {
                let len = self.data.iter().position(|b| *b == 0).ok_or(
                    Error::LengthTooShort {
                        step: "find STR_I terminator",
                        actual: self.data.len(),
                        expected: self.data.len() + 1,
                    },
                )?;
                let (string, data) = self.data.split_at(len);
                self.data = &data[1..];
                let string = std::str::from_utf8(string)
                    .map_err(|e| Error::BadEncode(format!("STR_I is not UTF-8: {}", e)))?;
                Element::Str(string)
            }
            Token::Entity => {
                let v = VarInt::read(&mut self.data, "decode ENTITY code point")?;
                Element::Entity(v.into())
            }
            Token::Opaque => {
                let len = VarInt::read(&mut self.data, "decode OPAQUE length")?.to_u32() as usize;
                if len > self.data.len() {
                    return Err(Error::LengthTooShort {
                        step: "get OPAQUE content",
                        actual: self.data.len(),
                        expected: len,
                    });
                }
                let (bytes, data) = self.data.split_at(len);
                self.data = data;
                Element::Opaque(bytes)
            }
            Token::Tag {
                code,
                content,
                attributes: false,
            } => Element::Tag { code, content },
            _ => return Err(Error::UnsupportedToken(byte)),
        };
        self.depth_tracking.update_elem(&elem)?;
        Ok(elem)
    }
}

impl<'a> std::iter::Iterator for Parser<'a> {
    type Item = Result<Element<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.errored {
            return None;
        }
        let (&byte, data) = self.data.split_first()?;
        self.data = data;
        let result = self.parse_element(byte);
        if result.is_err() {
            self.errored = true;
        }
        Some(result)
    }
}
