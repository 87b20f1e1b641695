// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

pub mod combine_latest_error_tests;
pub mod combine_latest_fixed_arity_tests;
pub mod combine_latest_tests;
