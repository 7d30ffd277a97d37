// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Taxonomy-driven dataset indexing and multi-view sampling

pub mod composer;
pub mod index;
pub mod layout;
pub mod loader;
pub mod record;
pub mod rendering;
pub mod sampling;
pub mod taxonomy;
pub mod template;

pub use composer::{selected_len, ComposedDataset, ComposedSource};
pub use index::{CategorySpan, DatasetIndex, TaxonomyIndex};
pub use layout::{SourceLayout, ViewIndexing};
pub use loader::{build_dataset, build_source, collect_source};
pub use record::SampleRecord;
pub use rendering::{load_rendering, RenderingImage};
pub use sampling::{
    load_sample, select_views, MultiViewDataset, Sample, SamplingMode, ViewCount, ViewDataset,
};
pub use taxonomy::{load_taxonomies, parse_taxonomies, DatasetSplit, Taxonomy};
pub use template::{sample_number, PathTemplate};
