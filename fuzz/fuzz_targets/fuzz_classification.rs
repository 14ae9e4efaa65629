// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use argus::analyzers::classify::parse_classification;
use argus::content::ContentType;

#[derive(Arbitrary, Debug)]
struct Input<'a> {
    response: &'a str,
    extension: &'a str,
}

fuzz_target!(|input: Input<'_>| {
    // Must never panic, whatever the model replies
    let _ = parse_classification(input.response);

    if ContentType::from_extension(input.extension).is_some() {
        assert!(["txt", "png", "mp3"]
            .iter()
            .any(|ext| ext.eq_ignore_ascii_case(input.extension)));
    }
});
