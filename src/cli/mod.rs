// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Terminal output for the `voxset` binary

pub mod progress;
pub mod reporter;

pub use progress::progress_bar;
pub use reporter::Reporter;
