// Copyright 2025 PRAGMA
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Untyped plutus core programs in their on-chain "flat" serialisation.
//!
//! Flat is a bit-level format: values are written most-significant bit first, naturals as
//! little-endian groups of 7 bits with a continuation bit, and byte strings are aligned on a byte
//! boundary by a filler (zeros, then a one) before being chunked into blocks of at most 255
//! bytes. Programs are decoded into a full term tree rather than patched in place, because
//! wrapping a term shifts every later bit and realigns every filler.

use num::{BigInt, BigUint, Integer, Signed, ToPrimitive};

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum FlatError {
    #[error("unexpected end of input at byte {0}")]
    EndOfInput(usize),
    #[error("unknown term tag {0}")]
    UnknownTermTag(u8),
    #[error("unsupported constant type tag {0}")]
    UnsupportedType(u8),
    #[error("malformed constant type")]
    MalformedType,
    #[error("string constant is not valid utf-8")]
    InvalidUtf8,
    #[error("natural number does not fit in 64 bits")]
    WordOverflow,
    #[error("filler does not end on a byte boundary")]
    MisalignedFiller,
    #[error("{0} trailing byte(s) after the program")]
    TrailingBytes(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub version: (u64, u64, u64),
    pub term: Term,
}

/// Terms use de Bruijn indices: lambdas carry no binder and variables are numbered from 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    Var(u64),
    Delay(Box<Term>),
    Lambda(Box<Term>),
    Apply {
        function: Box<Term>,
        argument: Box<Term>,
    },
    Constant(Constant),
    Force(Box<Term>),
    Error,
    Builtin(u8),
    Constr {
        tag: u64,
        fields: Vec<Term>,
    },
    Case {
        scrutinee: Box<Term>,
        branches: Vec<Term>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Integer,
    ByteString,
    String,
    Unit,
    Bool,
    Data,
    List(Box<Type>),
    Pair(Box<Type>, Box<Type>),
}

/// `Data` constants are kept as the CBOR found in the program, so that re-encoding is exact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constant {
    Integer(BigInt),
    ByteString(Vec<u8>),
    String(String),
    Unit,
    Bool(bool),
    Data(Vec<u8>),
    ProtoList(Type, Vec<Constant>),
    ProtoPair(Type, Type, Box<Constant>, Box<Constant>),
}

impl Program {
    pub fn from_flat(bytes: &[u8]) -> Result<Self, FlatError> {
        let mut reader = Reader::new(bytes);
        let version = (reader.word()?, reader.word()?, reader.word()?);
        let term = decode_term(&mut reader)?;
        reader.filler()?;
        if reader.position != bytes.len() {
            return Err(FlatError::TrailingBytes(bytes.len() - reader.position));
        }
        Ok(Self { version, term })
    }

    pub fn to_flat(&self) -> Vec<u8> {
        let mut writer = Writer::default();
        writer.word(self.version.0);
        writer.word(self.version.1);
        writer.word(self.version.2);
        encode_term(&mut writer, &self.term);
        writer.filler();
        writer.output
    }

    /// Apply the program body to one more argument, keeping the version.
    pub fn apply(self, argument: Term) -> Self {
        Self {
            version: self.version,
            term: self.term.apply(argument),
        }
    }
}

impl Term {
    pub fn apply(self, argument: Term) -> Self {
        Term::Apply {
            function: Box::new(self),
            argument: Box::new(argument),
        }
    }

    /// A `(con data ...)` term from serialised plutus data.
    pub fn data(cbor: Vec<u8>) -> Self {
        Term::Constant(Constant::Data(cbor))
    }
}

impl Type {
    fn push_tags(&self, tags: &mut Vec<u8>) {
        match self {
            Type::Integer => tags.push(0),
            Type::ByteString => tags.push(1),
            Type::String => tags.push(2),
            Type::Unit => tags.push(3),
            Type::Bool => tags.push(4),
            Type::Data => tags.push(8),
            Type::List(element) => {
                tags.extend([7, 5]);
                element.push_tags(tags);
            }
            Type::Pair(first, second) => {
                tags.extend([7, 7, 6]);
                first.push_tags(tags);
                second.push_tags(tags);
            }
        }
    }

    fn from_tags<I: Iterator<Item = u8>>(tags: &mut I) -> Result<Self, FlatError> {
        match tags.next().ok_or(FlatError::MalformedType)? {
            0 => Ok(Type::Integer),
            1 => Ok(Type::ByteString),
            2 => Ok(Type::String),
            3 => Ok(Type::Unit),
            4 => Ok(Type::Bool),
            8 => Ok(Type::Data),
            7 => match tags.next() {
                Some(5) => Ok(Type::List(Box::new(Self::from_tags(tags)?))),
                Some(7) if tags.next() == Some(6) => {
                    let first = Self::from_tags(tags)?;
                    let second = Self::from_tags(tags)?;
                    Ok(Type::Pair(Box::new(first), Box::new(second)))
                }
                _ => Err(FlatError::MalformedType),
            },
            other => Err(FlatError::UnsupportedType(other)),
        }
    }
}

impl Constant {
    pub fn type_of(&self) -> Type {
        match self {
            Constant::Integer(..) => Type::Integer,
            Constant::ByteString(..) => Type::ByteString,
            Constant::String(..) => Type::String,
            Constant::Unit => Type::Unit,
            Constant::Bool(..) => Type::Bool,
            Constant::Data(..) => Type::Data,
            Constant::ProtoList(element, ..) => Type::List(Box::new(element.clone())),
            Constant::ProtoPair(first, second, ..) => {
                Type::Pair(Box::new(first.clone()), Box::new(second.clone()))
            }
        }
    }
}

// ----------------------------------------------------------------------------
// Decoding
// ----------------------------------------------------------------------------

struct Reader<'a> {
    input: &'a [u8],
    position: usize,
    used: u8,
}

impl<'a> Reader<'a> {
    fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            position: 0,
            used: 0,
        }
    }

    fn bit(&mut self) -> Result<bool, FlatError> {
        let byte = self
            .input
            .get(self.position)
            .ok_or(FlatError::EndOfInput(self.position))?;
        let bit = (byte >> (7 - self.used)) & 1 == 1;
        self.used += 1;
        if self.used == 8 {
            self.used = 0;
            self.position += 1;
        }
        Ok(bit)
    }

    fn bits(&mut self, count: u8) -> Result<u8, FlatError> {
        (0..count).try_fold(0_u8, |acc, _| Ok((acc << 1) | u8::from(self.bit()?)))
    }

    fn natural(&mut self) -> Result<BigUint, FlatError> {
        let mut value = BigUint::default();
        let mut shift = 0_u64;
        loop {
            let group = self.bits(8)?;
            value |= BigUint::from(group & 0x7f) << shift;
            if group & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
        }
    }

    fn word(&mut self) -> Result<u64, FlatError> {
        self.natural()?.to_u64().ok_or(FlatError::WordOverflow)
    }

    fn filler(&mut self) -> Result<(), FlatError> {
        while !self.bit()? {}
        if self.used == 0 {
            Ok(())
        } else {
            Err(FlatError::MisalignedFiller)
        }
    }

    /// Must only be called on a byte boundary.
    fn byte(&mut self) -> Result<u8, FlatError> {
        let byte = *self
            .input
            .get(self.position)
            .ok_or(FlatError::EndOfInput(self.position))?;
        self.position += 1;
        Ok(byte)
    }

    fn bytes(&mut self) -> Result<Vec<u8>, FlatError> {
        self.filler()?;
        let mut bytes = Vec::new();
        loop {
            let length = usize::from(self.byte()?);
            if length == 0 {
                return Ok(bytes);
            }
            let chunk = self
                .input
                .get(self.position..self.position + length)
                .ok_or(FlatError::EndOfInput(self.input.len()))?;
            bytes.extend_from_slice(chunk);
            self.position += length;
        }
    }

    fn list<T>(
        &mut self,
        mut item: impl FnMut(&mut Self) -> Result<T, FlatError>,
    ) -> Result<Vec<T>, FlatError> {
        let mut items = Vec::new();
        while self.bit()? {
            items.push(item(self)?);
        }
        Ok(items)
    }
}

fn decode_term(reader: &mut Reader<'_>) -> Result<Term, FlatError> {
    match reader.bits(4)? {
        0 => Ok(Term::Var(reader.word()?)),
        1 => Ok(Term::Delay(Box::new(decode_term(reader)?))),
        2 => Ok(Term::Lambda(Box::new(decode_term(reader)?))),
        3 => {
            let function = decode_term(reader)?;
            let argument = decode_term(reader)?;
            Ok(function.apply(argument))
        }
        4 => Ok(Term::Constant(decode_constant(reader)?)),
        5 => Ok(Term::Force(Box::new(decode_term(reader)?))),
        6 => Ok(Term::Error),
        7 => Ok(Term::Builtin(reader.bits(7)?)),
        8 => {
            let tag = reader.word()?;
            let fields = reader.list(decode_term)?;
            Ok(Term::Constr { tag, fields })
        }
        9 => {
            let scrutinee = Box::new(decode_term(reader)?);
            let branches = reader.list(decode_term)?;
            Ok(Term::Case {
                scrutinee,
                branches,
            })
        }
        tag => Err(FlatError::UnknownTermTag(tag)),
    }
}

fn decode_constant(reader: &mut Reader<'_>) -> Result<Constant, FlatError> {
    let mut tags = reader.list(|reader| reader.bits(4))?.into_iter();
    let ty = Type::from_tags(&mut tags)?;
    if tags.next().is_some() {
        return Err(FlatError::MalformedType);
    }
    decode_value(reader, &ty)
}

fn decode_value(reader: &mut Reader<'_>, ty: &Type) -> Result<Constant, FlatError> {
    Ok(match ty {
        Type::Integer => Constant::Integer(unzigzag(reader.natural()?)),
        Type::ByteString => Constant::ByteString(reader.bytes()?),
        Type::String => Constant::String(
            String::from_utf8(reader.bytes()?).map_err(|_| FlatError::InvalidUtf8)?,
        ),
        Type::Unit => Constant::Unit,
        Type::Bool => Constant::Bool(reader.bit()?),
        Type::Data => Constant::Data(reader.bytes()?),
        Type::List(element) => Constant::ProtoList(
            element.as_ref().clone(),
            reader.list(|reader| decode_value(reader, element))?,
        ),
        Type::Pair(first, second) => {
            let left = decode_value(reader, first)?;
            let right = decode_value(reader, second)?;
            Constant::ProtoPair(
                first.as_ref().clone(),
                second.as_ref().clone(),
                Box::new(left),
                Box::new(right),
            )
        }
    })
}

fn unzigzag(value: BigUint) -> BigInt {
    if value.is_odd() {
        -BigInt::from(value >> 1_u32) - 1_u32
    } else {
        BigInt::from(value >> 1_u32)
    }
}

// ----------------------------------------------------------------------------
// Encoding
// ----------------------------------------------------------------------------

#[derive(Default)]
struct Writer {
    output: Vec<u8>,
    current: u8,
    used: u8,
}

impl Writer {
    fn bit(&mut self, bit: bool) {
        if bit {
            self.current |= 1 << (7 - self.used);
        }
        self.used += 1;
        if self.used == 8 {
            self.output.push(self.current);
            self.current = 0;
            self.used = 0;
        }
    }

    fn bits(&mut self, count: u8, value: u8) {
        for i in (0..count).rev() {
            self.bit((value >> i) & 1 == 1);
        }
    }

    fn natural(&mut self, value: &BigUint) {
        let digits = value.to_radix_le(128);
        match digits.split_last() {
            None => self.bits(8, 0),
            Some((last, init)) => {
                for digit in init {
                    self.bits(8, digit | 0x80);
                }
                self.bits(8, *last);
            }
        }
    }

    fn word(&mut self, mut value: u64) {
        loop {
            let group = (value & 0x7f) as u8;
            value >>= 7;
            if value == 0 {
                self.bits(8, group);
                return;
            }
            self.bits(8, group | 0x80);
        }
    }

    /// Pads up to the next byte boundary; a full byte is written when already aligned.
    fn filler(&mut self) {
        while self.used != 7 {
            self.bit(false);
        }
        self.bit(true);
    }

    fn bytes(&mut self, bytes: &[u8]) {
        self.filler();
        for chunk in bytes.chunks(255) {
            self.output.push(chunk.len() as u8);
            self.output.extend_from_slice(chunk);
        }
        self.output.push(0);
    }

    fn list<T>(&mut self, items: &[T], mut item: impl FnMut(&mut Self, &T)) {
        for it in items {
            self.bit(true);
            item(self, it);
        }
        self.bit(false);
    }
}

fn encode_term(writer: &mut Writer, term: &Term) {
    match term {
        Term::Var(index) => {
            writer.bits(4, 0);
            writer.word(*index);
        }
        Term::Delay(body) => {
            writer.bits(4, 1);
            encode_term(writer, body);
        }
        Term::Lambda(body) => {
            writer.bits(4, 2);
            encode_term(writer, body);
        }
        Term::Apply { function, argument } => {
            writer.bits(4, 3);
            encode_term(writer, function);
            encode_term(writer, argument);
        }
        Term::Constant(constant) => {
            writer.bits(4, 4);
            let mut tags = Vec::new();
            constant.type_of().push_tags(&mut tags);
            writer.list(&tags, |writer, tag| writer.bits(4, *tag));
            encode_value(writer, constant);
        }
        Term::Force(body) => {
            writer.bits(4, 5);
            encode_term(writer, body);
        }
        Term::Error => writer.bits(4, 6),
        Term::Builtin(function) => {
            writer.bits(4, 7);
            writer.bits(7, *function);
        }
        Term::Constr { tag, fields } => {
            writer.bits(4, 8);
            writer.word(*tag);
            writer.list(fields, encode_term);
        }
        Term::Case {
            scrutinee,
            branches,
        } => {
            writer.bits(4, 9);
            encode_term(writer, scrutinee);
            writer.list(branches, encode_term);
        }
    }
}

fn encode_value(writer: &mut Writer, constant: &Constant) {
    match constant {
        Constant::Integer(value) => writer.natural(&zigzag(value)),
        Constant::ByteString(bytes) | Constant::Data(bytes) => writer.bytes(bytes),
        Constant::String(text) => writer.bytes(text.as_bytes()),
        Constant::Unit => (),
        Constant::Bool(value) => writer.bit(*value),
        Constant::ProtoList(_, items) => writer.list(items, encode_value),
        Constant::ProtoPair(_, _, first, second) => {
            encode_value(writer, first);
            encode_value(writer, second);
        }
    }
}

fn zigzag(value: &BigInt) -> BigUint {
    let doubled: BigInt = value << 1_u32;
    if value.is_negative() {
        (-doubled - 1_u32).into_parts().1
    } else {
        doubled.into_parts().1
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use test_utils::*;

#[cfg(any(test, feature = "test-utils"))]
mod test_utils {
    use super::{Constant, Program, Term, Type};
    use num::BigInt;
    use proptest::{collection, prelude::*};

    pub fn any_constant() -> impl Strategy<Value = Constant> {
        prop_oneof![
            any::<i128>().prop_map(|n| Constant::Integer(BigInt::from(n))),
            collection::vec(any::<u8>(), 0..600).prop_map(Constant::ByteString),
            "[a-z]{0,16}".prop_map(Constant::String),
            Just(Constant::Unit),
            any::<bool>().prop_map(Constant::Bool),
            collection::vec(any::<i64>(), 0..4).prop_map(|items| Constant::ProtoList(
                Type::Integer,
                items
                    .into_iter()
                    .map(|n| Constant::Integer(BigInt::from(n)))
                    .collect()
            )),
        ]
    }

    pub fn any_term() -> impl Strategy<Value = Term> {
        let leaf = prop_oneof![
            (1_u64..1000).prop_map(Term::Var),
            Just(Term::Error),
            (0_u8..90).prop_map(Term::Builtin),
            any_constant().prop_map(Term::Constant),
        ];
        leaf.prop_recursive(6, 64, 4, |inner| {
            prop_oneof![
                inner.clone().prop_map(|t| Term::Delay(Box::new(t))),
                inner.clone().prop_map(|t| Term::Lambda(Box::new(t))),
                inner.clone().prop_map(|t| Term::Force(Box::new(t))),
                (inner.clone(), inner.clone()).prop_map(|(f, a)| f.apply(a)),
                (any::<u64>(), collection::vec(inner.clone(), 0..4))
                    .prop_map(|(tag, fields)| Term::Constr { tag, fields }),
                (inner.clone(), collection::vec(inner, 0..4)).prop_map(|(s, branches)| {
                    Term::Case {
                        scrutinee: Box::new(s),
                        branches,
                    }
                }),
            ]
        })
    }

    pub fn any_program() -> impl Strategy<Value = Program> {
        (prop_oneof![Just((1, 0, 0)), Just((1, 1, 0))], any_term())
            .prop_map(|(version, term)| Program { version, term })
    }
}
