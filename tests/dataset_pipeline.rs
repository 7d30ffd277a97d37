// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! End-to-end indexing and sampling over on-disk fixture trees

use image::{GrayImage, Luma, Rgba, RgbaImage};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use voxset::config::{DatasetKind, SourceConfig, VoxsetConfig};
use voxset::dataset::{build_dataset, build_source, collect_source, ViewIndexing};
use voxset::{DatasetSplit, SamplingMode, ViewDataset, VoxelGrid, VoxsetError};

fn write_png(path: &Path, width: u32, height: u32) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    RgbaImage::from_pixel(width, height, Rgba([255, 128, 0, 255]))
        .save(path)
        .unwrap();
}

fn write_volume(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let mut grid = VoxelGrid::empty([4, 4, 4]).unwrap();
    grid.set(1, 2, 3, true);
    voxset::write_binvox(&grid, path).unwrap();
}

/// ShapeNet-like tree: `plane` has three usable samples with five views each,
/// `chair` has one usable sample plus one without a volume and one without views
fn shapenet_fixture(root: &Path) -> SourceConfig {
    let manifest = r#"[
        // comments are allowed in manifests
        {"taxonomy_id": "plane", "taxonomy_name": "airplane",
         "train": ["p0", "p1", "p2"], "test": ["p0"], "val": []},
        {"taxonomy_id": "chair", "taxonomy_name": "chair",
         "train": ["c0", "c_novox", "c_noview"], "test": [], "val": []}
    ]"#;
    fs::write(root.join("shapenet.json"), manifest).unwrap();

    for (taxonomy, sample) in [("plane", "p0"), ("plane", "p1"), ("plane", "p2"), ("chair", "c0")] {
        for view in 0..5 {
            write_png(
                &root.join(format!("render/{}/{}/rendering/{:02}.png", taxonomy, sample, view)),
                8,
                6,
            );
        }
        write_volume(&root.join(format!("vox/{}/{}/model.binvox", taxonomy, sample)));
    }
    write_png(&root.join("render/chair/c_novox/rendering/00.png"), 8, 6);
    write_volume(&root.join("vox/chair/c_noview/model.binvox"));

    SourceConfig {
        taxonomy_file: root.join("shapenet.json"),
        rendering_template: format!(
            "{}/render/{{taxonomy}}/{{sample}}/rendering/{{view:02}}.png",
            root.display()
        ),
        volume_template: format!("{}/vox/{{taxonomy}}/{{sample}}/model.binvox", root.display()),
        view_indexing: ViewIndexing::ZeroBased,
        image_size: None,
    }
}

/// MVS-like tree: two scans with one-based views and numbered volumes
fn mvs_fixture(root: &Path) -> SourceConfig {
    let manifest = r#"[
        {"taxonomy_id": "mvs", "taxonomy_name": "dtu",
         "train": ["scan1", "scan12"], "test": ["scan1"], "val": []}
    ]"#;
    fs::write(root.join("mvs.json"), manifest).unwrap();

    for scan in [1, 12] {
        for view in 1..=3 {
            write_png(
                &root.join(format!("mvs/images/scan{}/clean_{:03}_max.png", scan, view)),
                16,
                12,
            );
        }
        write_volume(&root.join(format!("mvs/voxels/stl{:03}_total.binvox", scan)));
    }

    SourceConfig {
        taxonomy_file: root.join("mvs.json"),
        rendering_template: format!(
            "{}/mvs/images/scan{{number}}/clean_{{view:03}}_max.png",
            root.display()
        ),
        volume_template: format!("{}/mvs/voxels/stl{{number:03}}_total.binvox", root.display()),
        view_indexing: ViewIndexing::OneBased,
        image_size: Some([4, 4]),
    }
}

fn config(root: &Path, dataset: DatasetKind) -> VoxsetConfig {
    VoxsetConfig {
        dataset,
        n_views: 2,
        shapenet_ratio: 2.0,
        output_dir: root.join("output"),
        shapenet: shapenet_fixture(root),
        mvs: mvs_fixture(root),
        ..VoxsetConfig::default()
    }
}

#[test]
fn test_index_skips_incomplete_samples() {
    let dir = TempDir::new().unwrap();
    let source = shapenet_fixture(dir.path());

    let index = collect_source(&source, DatasetSplit::Train).unwrap();
    assert_eq!(index.len(), 4);

    let ids: Vec<_> = index.records().iter().map(|r| r.sample_id()).collect();
    assert_eq!(ids, ["p0", "p1", "p2", "c0"]);

    for record in index.records() {
        assert!(record.volume_path().exists());
        assert_eq!(record.view_count(), 5);
        assert!(record.rendering_paths().iter().all(|p| p.exists()));
    }

    let chair = &index.categories()[1];
    assert_eq!(chair.taxonomy_name, "chair");
    assert_eq!((chair.start, chair.len, chair.skipped), (3, 1, 2));
}

#[test]
fn test_missing_manifest_is_fatal() {
    let dir = TempDir::new().unwrap();
    let mut source = shapenet_fixture(dir.path());
    source.taxonomy_file = dir.path().join("absent.json");

    let err = collect_source(&source, DatasetSplit::Train).unwrap_err();
    let not_found = err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<VoxsetError>(),
            Some(VoxsetError::ManifestNotFound(_))
        )
    });
    assert!(not_found);
}

#[test]
fn test_mvs_numbered_layout() {
    let dir = TempDir::new().unwrap();
    let source = mvs_fixture(dir.path());

    let index = collect_source(&source, DatasetSplit::Train).unwrap();
    assert_eq!(index.len(), 2);

    let scan12 = index.get(1).unwrap();
    assert!(scan12.volume_path().ends_with("stl012_total.binvox"));
    assert_eq!(scan12.view_count(), 3);
    assert!(scan12.rendering_paths()[0].ends_with("clean_001_max.png"));
}

#[test]
fn test_training_samples_decode() {
    let dir = TempDir::new().unwrap();
    let dataset = build_source(&shapenet_fixture(dir.path()), DatasetSplit::Train, 3).unwrap();
    assert_eq!(dataset.mode(), SamplingMode::Train);

    let mut rng = StdRng::seed_from_u64(5);
    let sample = dataset.get_with_rng(0, &mut rng).unwrap();

    assert_eq!(sample.images.len(), 3);
    assert_eq!(sample.view_shape(), Some([6, 8, 4]));
    let unique: HashSet<_> = sample.view_indices.iter().collect();
    assert_eq!(unique.len(), 3);

    assert_eq!(sample.volume.dimensions, [4, 4, 4]);
    assert_eq!(sample.volume.data.iter().filter(|&&v| v > 0.5).count(), 1);

    let pixel = sample.images[0].at(0, 0, 1);
    assert!((pixel - 128.0 / 255.0).abs() < 1e-6);
}

#[test]
fn test_eval_samples_are_deterministic() {
    let dir = TempDir::new().unwrap();
    let dataset = build_source(&mvs_fixture(dir.path()), DatasetSplit::Test, 2).unwrap();

    let a = dataset.get(0).unwrap();
    let b = dataset.get(0).unwrap();
    assert_eq!(a.view_indices, vec![0, 1]);
    assert_eq!(a.view_indices, b.view_indices);
    assert_eq!(a.view_shape(), Some([4, 4, 4]));
}

#[test]
fn test_mixed_dataset_composition() {
    let dir = TempDir::new().unwrap();
    let config = config(dir.path(), DatasetKind::Mixed);

    let dataset = build_dataset(&config, DatasetSplit::Train).unwrap();
    // two scans followed by round(4 / 2.0) ShapeNet samples
    assert_eq!(dataset.len(), 2 + 2);
    assert_eq!(dataset.record(0).unwrap().taxonomy_id(), "mvs");
    assert_eq!(dataset.record(1).unwrap().sample_id(), "scan12");
    assert_eq!(dataset.record(2).unwrap().sample_id(), "p0");
    assert_eq!(dataset.record(3).unwrap().sample_id(), "p1");
    assert!(dataset.record(4).is_none());

    dataset.set_view_count(3);
    let mut rng = StdRng::seed_from_u64(1);
    assert_eq!(dataset.get_with_rng(0, &mut rng).unwrap().images.len(), 3);
    assert_eq!(dataset.get_with_rng(3, &mut rng).unwrap().images.len(), 3);

    // more views than a scan has
    dataset.set_view_count(4);
    assert!(matches!(
        dataset.get_with_rng(0, &mut rng).unwrap_err(),
        VoxsetError::NotEnoughViews { available: 3, .. }
    ));
}

#[test]
fn test_view_count_shared_across_threads() {
    let dir = TempDir::new().unwrap();
    let config = config(dir.path(), DatasetKind::ShapeNet);
    let dataset = build_dataset(&config, DatasetSplit::Train).unwrap();

    std::thread::scope(|scope| {
        for worker in 0..4u64 {
            let dataset = &dataset;
            scope.spawn(move || {
                let mut rng = StdRng::seed_from_u64(worker);
                for i in 0..dataset.len() {
                    let sample = dataset.get_with_rng(i, &mut rng).unwrap();
                    assert!(matches!(sample.images.len(), 1 | 2));
                }
            });
        }
        dataset.set_view_count(1);
    });
}

#[test]
fn test_grayscale_rendering_is_fatal() {
    let dir = TempDir::new().unwrap();
    let source = shapenet_fixture(dir.path());
    for view in 0..5 {
        GrayImage::from_pixel(8, 6, Luma([10]))
            .save(dir.path().join(format!("render/plane/p0/rendering/{:02}.png", view)))
            .unwrap();
    }

    let dataset = build_source(&source, DatasetSplit::Test, 1).unwrap();
    let err = dataset.get(0).unwrap_err();
    assert!(matches!(err, VoxsetError::MissingChannelAxis(_)));
    assert!(err.is_fatal());
}
