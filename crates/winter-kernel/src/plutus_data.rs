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

use crate::{BigInt, Constr, Hash, Int, MaybeIndefArray, OutputReference, PlutusData};

/// CBOR tag used for constructors whose index does not have a compact tag.
pub const GENERAL_CONSTR_TAG: u64 = 102;

/// The compact CBOR tag of a constructor index, when there is one.
///
/// Indices 0..=6 map onto tags 121..=127, indices 7..=127 onto tags 1280..=1400; anything beyond
/// is encoded under the general tag 102 with an explicit alternative.
pub fn to_constr_tag(index: u64) -> Option<u64> {
    if index <= 6 {
        Some(121 + index)
    } else if index <= 127 {
        Some(1280 - 7 + index)
    } else {
        None
    }
}

/// The constructor index carried by a `Constr`, whichever of the three tag ranges it uses.
pub fn constr_index<A>(constr: &Constr<A>) -> Option<u64> {
    match constr.tag {
        121..=127 => Some(constr.tag - 121),
        1280..=1400 => Some(constr.tag - 1280 + 7),
        GENERAL_CONSTR_TAG => constr.any_constructor,
        _unknown => None,
    }
}

#[macro_export]
macro_rules! constr {
    ($index:expr, [$($field:expr),* $(,)?] $(,)?) => {{
        let index: u64 = $index;
        let maybe_constr_tag = $crate::plutus_data::to_constr_tag(index);
        $crate::PlutusData::Constr($crate::Constr {
            tag: maybe_constr_tag.unwrap_or($crate::plutus_data::GENERAL_CONSTR_TAG),
            any_constructor: maybe_constr_tag.map_or(Some(index), |_| None),
            fields: $crate::plutus_data::array(vec![
                $($crate::ToPlutusData::to_plutus_data(&$field)),*
            ]),
        })
    }};

    ($index:expr $(,)?) => {{
        $crate::constr!($index, [])
    }};
}

/// Serializing a type to PlutusData, which can then be serialised to CBOR.
pub trait ToPlutusData {
    fn to_plutus_data(&self) -> PlutusData;
}

impl ToPlutusData for PlutusData {
    fn to_plutus_data(&self) -> PlutusData {
        self.clone()
    }
}

impl ToPlutusData for bool {
    fn to_plutus_data(&self) -> PlutusData {
        constr!(u64::from(*self))
    }
}

impl ToPlutusData for i64 {
    fn to_plutus_data(&self) -> PlutusData {
        PlutusData::BigInt(BigInt::Int(Int::from(*self)))
    }
}

impl ToPlutusData for u64 {
    fn to_plutus_data(&self) -> PlutusData {
        match i64::try_from(*self) {
            Ok(small) => small.to_plutus_data(),
            Err(..) => PlutusData::BigInt(BigInt::BigUInt(
                self.to_be_bytes().to_vec().into(),
            )),
        }
    }
}

impl ToPlutusData for [u8] {
    fn to_plutus_data(&self) -> PlutusData {
        PlutusData::BoundedBytes(self.to_vec().into())
    }
}

impl ToPlutusData for Vec<u8> {
    fn to_plutus_data(&self) -> PlutusData {
        self.as_slice().to_plutus_data()
    }
}

impl<const BYTES: usize> ToPlutusData for Hash<BYTES> {
    fn to_plutus_data(&self) -> PlutusData {
        PlutusData::BoundedBytes(self.to_vec().into())
    }
}

/// Non-empty arrays are encoded with an indefinite length, empty ones as a definite `[]`; this
/// is how the off-chain tooling of the protocol serialises data, and hashes depend on it.
pub fn array(items: Vec<PlutusData>) -> MaybeIndefArray<PlutusData> {
    if items.is_empty() {
        MaybeIndefArray::Def(items)
    } else {
        MaybeIndefArray::Indef(items)
    }
}

pub fn list_of<T: ToPlutusData>(items: &[T]) -> PlutusData {
    PlutusData::Array(array(
        items.iter().map(ToPlutusData::to_plutus_data).collect(),
    ))
}

impl ToPlutusData for OutputReference {
    fn to_plutus_data(&self) -> PlutusData {
        constr!(0, [constr!(0, [self.transaction_id]), self.index])
    }
}

#[cfg(test)]
mod tests {
    use super::{ToPlutusData, constr_index, list_of, to_constr_tag};
    use crate::{Constr, MaybeIndefArray, OutputReference, PlutusData, to_cbor};
    use test_case::test_case;

    #[test_case(0, Some(121))]
    #[test_case(6, Some(127))]
    #[test_case(7, Some(1280))]
    #[test_case(127, Some(1400))]
    #[test_case(128, None)]
    fn constructor_tags(index: u64, tag: Option<u64>) {
        assert_eq!(to_constr_tag(index), tag);
    }

    #[test_case(0)]
    #[test_case(1)]
    #[test_case(7)]
    #[test_case(127)]
    #[test_case(1000)]
    fn constructor_index_roundtrip(index: u64) {
        match constr!(index) {
            PlutusData::Constr(constr) => assert_eq!(constr_index(&constr), Some(index)),
            other => panic!("expected a constructor, got {other:?}"),
        }
    }

    #[test]
    fn unknown_tags_have_no_index() {
        let constr: Constr<PlutusData> = Constr {
            tag: 200,
            any_constructor: None,
            fields: MaybeIndefArray::Def(vec![]),
        };
        assert_eq!(constr_index(&constr), None);
    }

    #[test]
    fn output_reference_encoding() {
        let out_ref: OutputReference =
            "6773419548e12aad793c1c38c8dfdf1d93bac0689c4c5cab68b26f5f26532c90#0"
                .parse()
                .unwrap();
        assert_eq!(
            hex::encode(to_cbor(&out_ref.to_plutus_data())),
            "d8799fd8799f58206773419548e12aad793c1c38c8dfdf1d93bac0689c4c5cab68b26f5f26532c90ff00ff"
        );
    }

    #[test]
    fn lists_are_indefinite() {
        let signers = vec![vec![0xaa], vec![0xbb]];
        assert_eq!(hex::encode(to_cbor(&list_of(&signers))), "9f41aa41bbff");
    }

    #[test]
    fn empty_arrays_are_definite() {
        assert_eq!(hex::encode(to_cbor(&list_of::<Vec<u8>>(&[]))), "80");
        assert_eq!(hex::encode(to_cbor(&constr!(0))), "d87980");
    }
}
