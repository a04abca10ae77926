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

//! Helpers used to produce serialised values for payouts and events.
//! Amounts are arbitrary-precision, so they are rendered as decimal strings
//! rather than JSON numbers.

use quri_kernel::{Amount, SafeRatio};
use std::collections::BTreeMap;

pub fn encode_amount(amount: &Amount) -> String {
    amount.to_string()
}

pub fn encode_ratio(r: &SafeRatio) -> String {
    format!("{}/{}", r.numer(), r.denom())
}

pub fn serialize_string_map<K, S: serde::ser::SerializeStruct>(
    field: &'static str,
    s: &mut S,
    m: &BTreeMap<K, Amount>,
    serialize_key: impl Fn(&K) -> String,
) -> Result<(), S::Error> {
    let elems = m
        .iter()
        .map(|(k, v)| (serialize_key(k), encode_amount(v)))
        .collect::<BTreeMap<String, String>>();
    s.serialize_field(field, &elems)
}
