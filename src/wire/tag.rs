//! Tag byte constants and the fixed-range tag grammar.
//!
//! Every encoded value starts with one tag byte. Most tags are single reserved
//! values; five sub-ranges pack a small value or length into the tag itself:
//!
//! | Range      | Bits        | Bytes          | Payload               |
//! |------------|-------------|----------------|-----------------------|
//! | posfixint  | `0xxx xxxx` | `0x00..=0x7f`  | value 0..=127         |
//! | fixmap     | `1000 xxxx` | `0x80..=0x8f`  | entry count 0..=15    |
//! | fixarray   | `1001 xxxx` | `0x90..=0x9f`  | element count 0..=15  |
//! | fixstr     | `101x xxxx` | `0xa0..=0xbf`  | byte length 0..=31    |
//! | negfixint  | `111x xxxx` | `0xe0..=0xff`  | value -32..=-1        |
//!
//! Codecs build and read these ranges only through the functions below.

// Nil
pub const NIL: u8 = 0xC0;

// Never used.
pub const RESERVED: u8 = 0xC1;

// Boolean
pub const FALSE: u8 = 0xC2;
pub const TRUE: u8 = 0xC3;

// Binary
pub const BIN_8: u8 = 0xC4;
pub const BIN_16: u8 = 0xC5;
pub const BIN_32: u8 = 0xC6;

// Extension (type id byte + payload)
pub const EXT_8: u8 = 0xC7;
pub const EXT_16: u8 = 0xC8;
pub const EXT_32: u8 = 0xC9;

// Float (IEEE 754)
pub const FLOAT_32: u8 = 0xCA;
pub const FLOAT_64: u8 = 0xCB;

// Unsigned integer
pub const UINT_8: u8 = 0xCC;
pub const UINT_16: u8 = 0xCD;
pub const UINT_32: u8 = 0xCE;
pub const UINT_64: u8 = 0xCF;

// Signed integer
pub const INT_8: u8 = 0xD0;
pub const INT_16: u8 = 0xD1;
pub const INT_32: u8 = 0xD2;
pub const INT_64: u8 = 0xD3;

// Fixed-size extension
pub const FIX_EXT_1: u8 = 0xD4;
pub const FIX_EXT_2: u8 = 0xD5;
pub const FIX_EXT_4: u8 = 0xD6;
pub const FIX_EXT_8: u8 = 0xD7;
pub const FIX_EXT_16: u8 = 0xD8;

// String
pub const STR_8: u8 = 0xD9;
pub const STR_16: u8 = 0xDA;
pub const STR_32: u8 = 0xDB;

// Array
pub const ARRAY_16: u8 = 0xDC;
pub const ARRAY_32: u8 = 0xDD;

// Map
pub const MAP_16: u8 = 0xDE;
pub const MAP_32: u8 = 0xDF;

// -- positive fixint: 0xxx xxxx --

pub const fn pos_fixint_tag(v: u8) -> u8 {
    v & 0x7F
}

pub const fn is_pos_fixint(tag: u8) -> bool {
    tag & 0x80 == 0
}

pub const fn read_pos_fixint(tag: u8) -> u8 {
    tag & 0x7F
}

// -- negative fixint: 111x xxxx --

pub const fn neg_fixint_tag(v: i8) -> u8 {
    0xE0 | (v as u8 & 0x1F)
}

pub const fn is_neg_fixint(tag: u8) -> bool {
    tag & 0xE0 == 0xE0
}

pub const fn read_neg_fixint(tag: u8) -> i8 {
    tag as i8
}

// -- fixstr: 101x xxxx --

pub const fn fixstr_tag(len: usize) -> u8 {
    0xA0 | (len as u8 & 0x1F)
}

pub const fn is_fixstr(tag: u8) -> bool {
    tag & 0xE0 == 0xA0
}

pub const fn read_fixstr(tag: u8) -> usize {
    (tag & 0x1F) as usize
}

// -- fixarray: 1001 xxxx --

pub const fn fixarray_tag(len: usize) -> u8 {
    0x90 | (len as u8 & 0x0F)
}

pub const fn is_fixarray(tag: u8) -> bool {
    tag & 0xF0 == 0x90
}

pub const fn read_fixarray(tag: u8) -> usize {
    (tag & 0x0F) as usize
}

// -- fixmap: 1000 xxxx --

pub const fn fixmap_tag(len: usize) -> u8 {
    0x80 | (len as u8 & 0x0F)
}

pub const fn is_fixmap(tag: u8) -> bool {
    tag & 0xF0 == 0x80
}

pub const fn read_fixmap(tag: u8) -> usize {
    (tag & 0x0F) as usize
}

/// Classification of a tag byte.
///
/// Every byte maps to exactly one variant. The fixed-range variants carry the
/// value or length packed into the tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Class {
    PosFixint(u8),
    NegFixint(i8),
    FixStr(usize),
    FixArray(usize),
    FixMap(usize),
    Nil,
    Reserved,
    False,
    True,
    Bin8,
    Bin16,
    Bin32,
    Ext8,
    Ext16,
    Ext32,
    Float32,
    Float64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Int8,
    Int16,
    Int32,
    Int64,
    FixExt1,
    FixExt2,
    FixExt4,
    FixExt8,
    FixExt16,
    Str8,
    Str16,
    Str32,
    Array16,
    Array32,
    Map16,
    Map32,
}

impl Class {
    pub const fn of(tag: u8) -> Self {
        if is_pos_fixint(tag) {
            return Self::PosFixint(read_pos_fixint(tag));
        }
        if is_neg_fixint(tag) {
            return Self::NegFixint(read_neg_fixint(tag));
        }
        if is_fixstr(tag) {
            return Self::FixStr(read_fixstr(tag));
        }
        if is_fixarray(tag) {
            return Self::FixArray(read_fixarray(tag));
        }
        if is_fixmap(tag) {
            return Self::FixMap(read_fixmap(tag));
        }
        match tag {
            NIL => Self::Nil,
            FALSE => Self::False,
            TRUE => Self::True,
            BIN_8 => Self::Bin8,
            BIN_16 => Self::Bin16,
            BIN_32 => Self::Bin32,
            EXT_8 => Self::Ext8,
            EXT_16 => Self::Ext16,
            EXT_32 => Self::Ext32,
            FLOAT_32 => Self::Float32,
            FLOAT_64 => Self::Float64,
            UINT_8 => Self::Uint8,
            UINT_16 => Self::Uint16,
            UINT_32 => Self::Uint32,
            UINT_64 => Self::Uint64,
            INT_8 => Self::Int8,
            INT_16 => Self::Int16,
            INT_32 => Self::Int32,
            INT_64 => Self::Int64,
            FIX_EXT_1 => Self::FixExt1,
            FIX_EXT_2 => Self::FixExt2,
            FIX_EXT_4 => Self::FixExt4,
            FIX_EXT_8 => Self::FixExt8,
            FIX_EXT_16 => Self::FixExt16,
            STR_8 => Self::Str8,
            STR_16 => Self::Str16,
            STR_32 => Self::Str32,
            ARRAY_16 => Self::Array16,
            ARRAY_32 => Self::Array32,
            MAP_16 => Self::Map16,
            MAP_32 => Self::Map32,
            // Only 0xC1 is left once the ranges above are excluded.
            _ => Self::Reserved,
        }
    }
}
