//! Operation attribute values. A closed, non-recursive enum rather than
//! `Box<dyn Any>` type erasure: every attribute an ingest stage attaches is
//! one of a small fixed set of scalar/vector shapes, so a tagged union is
//! both sufficient and cheaper to pattern-match than downcasting.

use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    BoolList(Vec<bool>),
    IntList(Vec<i64>),
    FloatList(Vec<f64>),
    StrList(Vec<String>),
}

pub type AttrMap = BTreeMap<String, AttrValue>;
