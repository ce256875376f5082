/// Bit marking a tag byte as having content (children or text) terminated by `END`.
pub const TAG_CONTENT: u8 = 0x40;
/// Bit marking a tag byte as having attributes. Never set by this profile.
pub const TAG_ATTRIBUTES: u8 = 0x80;
/// Mask selecting the dictionary code out of a tag byte.
pub const TAG_CODE_MASK: u8 = 0x3F;
/// Lowest valid dictionary code. Lower values collide with global tokens.
pub const MIN_TAG_CODE: u8 = 0x05;

/// WBXML body tokens. For internal use only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Token {
    SwitchPage,
    End,
    Entity,
    StrI,
    Literal,
    ExtI(u8),
    Pi,
    LiteralC,
    ExtT(u8),
    StrT,
    LiteralA,
    Ext(u8),
    Opaque,
    LiteralAc,
    /// A tag byte: dictionary code plus its content and attribute flags.
    Tag {
        code: u8,
        content: bool,
        attributes: bool,
    },
}

impl Token {
    /// Construct a token from a single byte.
    pub fn from_u8(n: u8) -> Token {
        match n {
            0x00 => Token::SwitchPage,
            0x01 => Token::End,
            0x02 => Token::Entity,
            0x03 => Token::StrI,
            0x04 => Token::Literal,
            0x40..=0x42 => Token::ExtI(n & 0x03),
            0x43 => Token::Pi,
            0x44 => Token::LiteralC,
            0x80..=0x82 => Token::ExtT(n & 0x03),
            0x83 => Token::StrT,
            0x84 => Token::LiteralA,
            0xc0..=0xc2 => Token::Ext(n & 0x03),
            0xc3 => Token::Opaque,
            0xc4 => Token::LiteralAc,
            _ => Token::Tag {
                code: n & TAG_CODE_MASK,
                content: n & TAG_CONTENT != 0,
                attributes: n & TAG_ATTRIBUTES != 0,
            },
        }
    }

    /// Converts a token into its single-byte representation.
    /// Assumes a tag code is already within `MIN_TAG_CODE..=TAG_CODE_MASK`.
    pub fn into_u8(self) -> u8 {
        match self {
            Token::SwitchPage => 0x00,
            Token::End => 0x01,
            Token::Entity => 0x02,
            Token::StrI => 0x03,
            Token::Literal => 0x04,
            Token::ExtI(i) => 0x40 | i,
            Token::Pi => 0x43,
            Token::LiteralC => 0x44,
            Token::ExtT(i) => 0x80 | i,
            Token::StrT => 0x83,
            Token::LiteralA => 0x84,
            Token::Ext(i) => 0xc0 | i,
            Token::Opaque => 0xc3,
            Token::LiteralAc => 0xc4,
            Token::Tag {
                code,
                content,
                attributes,
            } => {
                let mut byte = code & TAG_CODE_MASK;
                if content {
                    byte |= TAG_CONTENT;
                }
                if attributes {
                    byte |= TAG_ATTRIBUTES;
                }
                byte
            }
        }
    }
}

impl From<Token> for u8 {
    fn from(val: Token) -> u8 {
        val.into_u8()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn every_byte_roundtrips() {
        for n in 0..=255u8 {
            assert_eq!(Token::from_u8(n).into_u8(), n, "byte 0x{:02x}", n);
        }
    }

    #[test]
    fn tag_bytes() {
        assert_eq!(
            Token::from_u8(b'V'),
            Token::Tag {
                code: 0x16,
                content: true,
                attributes: false
            }
        );
        assert_eq!(
            Token::from_u8(0x28),
            Token::Tag {
                code: 0x28,
                content: false,
                attributes: false
            }
        );
        // Low codes with flag bits are global tokens, not tags
        assert_eq!(Token::from_u8(0x43), Token::Pi);
        assert_eq!(Token::from_u8(0xc3), Token::Opaque);
    }
}
