// Copyright (c) 2024, The Tari Project
// SPDX-License-Identifier: BSD-3-Clause


#![no_main]

use graph_coloring_zkp::commitment::Commitment;
use libfuzzer_sys::fuzz_target;

// Test basic deserialization and canonical serialization
fuzz_target!(|data: &[u8]| {
	// If deserialization succeeds, serialization should be canonical
	if let Ok(commitment) = Commitment::from_bytes(data) {
		assert_eq!(&commitment.to_bytes(), data);
	}
});
