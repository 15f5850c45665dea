//! Registry and resource behaviour over a scratch directory.

mod common;

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use hwtools::prelude::*;
use hwtools::resource::{ArchiveExpander, XmlConverter};
use parking_lot::Mutex;
use tempfile::TempDir;

fn scratch() -> TempDir {
    tempfile::tempdir().unwrap()
}

#[test]
fn test_one_resource_per_path() {
    let dir = scratch();
    let ctx = Context::new(dir.path());

    let a = ctx.resource("scenario\\skirmish\\gulch.xtd").unwrap().unwrap();
    let b = ctx.resource_of_kind("scenario/skirmish/gulch", ResourceKind::Xtd).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(ctx.resources().len(), 1);
}

#[test]
fn test_unknown_extension_is_not_an_error() {
    let dir = scratch();
    let ctx = Context::new(dir.path());
    assert!(ctx.resource("data/readme.txt").unwrap().is_none());
    assert!(ctx.is_empty());
}

#[test]
fn test_accessor_on_wrong_kind() {
    let dir = scratch();
    common::put(dir.path(), "m.xtt", &common::terrain(4));
    let ctx = Context::new(dir.path());

    let r = ctx.resource("m.xtt").unwrap().unwrap();
    assert!(matches!(r.terrain_mesh(1), Err(Error::KindMismatch { .. })));
    assert!(matches!(r.lighting(), Err(Error::KindMismatch { .. })));
}

#[test]
fn test_missing_file() {
    let dir = scratch();
    let ctx = Context::new(dir.path());
    let r = ctx.resource("nowhere.ugx").unwrap().unwrap();
    assert!(matches!(r.mesh(), Err(Error::FileNotFound(_))));
}

#[test]
fn test_terrain_through_registry() {
    let dir = scratch();
    common::put(dir.path(), "maps/gulch.xtd", &common::terrain(4));
    let ctx = Context::new(dir.path());
    let r = ctx.resource("maps/gulch.xtd").unwrap().unwrap();

    let full = r.terrain_mesh(TERRAIN_DEFAULT_STRIDE).unwrap();
    assert_eq!(full.vertices.len(), 16);
    assert_eq!(full.faces.len(), 18);
    assert_eq!(full.materials[0].name, "terrain");

    // memoized per stride
    assert!(Arc::ptr_eq(&full, &r.terrain_mesh(1).unwrap()));
    let coarse = r.terrain_mesh(2).unwrap();
    assert_eq!(coarse.vertices.len(), 4);
    assert_eq!(coarse.faces.len(), 2);

    assert_eq!(r.chunks().unwrap().len(), 2);
}

#[test]
fn test_invalid_stride_is_not_cached() {
    let dir = scratch();
    common::put(dir.path(), "t.xtd", &common::terrain(4));
    let ctx = Context::new(dir.path());
    let r = ctx.resource("t.xtd").unwrap().unwrap();

    assert!(r.terrain_mesh(0).is_err());
    assert!(r.terrain_mesh(0).is_err());
    assert!(r.terrain_mesh(1).is_ok());
}

#[test]
fn test_mesh_and_texture_names() {
    let dir = scratch();
    common::put(dir.path(), "art/warthog.ugx", &common::mesh(&[(0, 0), (1, 0), (0, 1)]));
    let ctx = Context::new(dir.path());
    let r = ctx.resource("art/warthog.ugx").unwrap().unwrap();

    let mesh = r.mesh().unwrap();
    assert_eq!(mesh.vertices.len(), 9);
    assert_eq!(mesh.faces.len(), 3);
    let materials: Vec<&str> = mesh.materials.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(materials, ["material_1", "material_2"]);
    let sections: Vec<&str> = mesh.sections.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(sections, ["object_1", "object_2"]);
    assert_eq!(mesh.faces[2].indices, [6, 8, 7]);

    assert_eq!(*r.texture_names().unwrap(), vec!["\\art\\warthog_df".to_string()]);
}

#[test]
fn test_export_mesh() {
    let dir = scratch();
    common::put(dir.path(), "art/warthog.ugx", &common::mesh(&[(0, 0)]));
    let ctx = Context::new(dir.path());
    let r = ctx.resource("art/warthog.ugx").unwrap().unwrap();

    let mut mesh = (*r.mesh().unwrap()).clone();
    mesh.export_options.normal_mode = NormalMode::Flat;
    let out = dir.path().join("out/warthog");
    mesh.export_obj(&out).unwrap();

    let obj = fs::read_to_string(out.with_extension("obj")).unwrap();
    assert!(obj.contains("mtllib warthog.mtl"));
    assert!(obj.contains("usemtl material_1"));
    assert!(out.with_extension("mtl").exists());
}

#[test]
fn test_occlusion_with_block_decoder() {
    let dir = scratch();
    common::put(dir.path(), "t.xtd", &common::terrain_with_occlusion(2, 200));
    let ctx = Context::new(dir.path());
    let r = ctx.resource("t.xtd").unwrap().unwrap();

    let ao = r.ambient_occlusion_texture().unwrap();
    assert_eq!(ao.dimensions(), (2, 2));
    assert!(ao.pixels().all(|p| p.0 == [200, 200, 200, 255]));

    assert!(matches!(
        r.opacity_texture(),
        Err(Error::ChunkNotFound(ChunkType::XtdAlpha))
    ));
}

#[test]
fn test_loader_runs_once_across_threads() {
    let dir = scratch();
    common::put(dir.path(), "t.xtd", &common::terrain(8));
    let ctx = Context::new(dir.path());

    let meshes: Vec<Arc<GenericMesh>> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                s.spawn(|| {
                    let r = ctx.resource("t.xtd").unwrap().unwrap();
                    r.terrain_mesh(1).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(meshes.iter().all(|m| Arc::ptr_eq(m, &meshes[0])));
    let r = ctx.resource("t.xtd").unwrap().unwrap();
    assert_eq!(r.cache().misses(), 3);
}

#[test]
fn test_observer() {
    let dir = scratch();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let ctx = Context::new(dir.path()).with_observer(move |e: &AccessEvent| {
        sink.lock().push(e.to_string());
    });

    ctx.resource("a.ugx").unwrap();
    ctx.resource_of_kind("a", ResourceKind::Ugx).unwrap();

    assert_eq!(
        *seen.lock(),
        vec![
            "Created resource \"a.ugx\"".to_string(),
            "Accessed resource \"a.ugx\"".to_string(),
        ]
    );
}

struct CopyConverter {
    calls: Arc<AtomicUsize>,
}

impl XmlConverter for CopyConverter {
    fn convert(&self, compiled: &Path, plain: &Path) -> hwtools::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        fs::copy(compiled, plain)?;
        Ok(())
    }
}

#[test]
fn test_plain_xml() {
    let dir = scratch();
    common::put(dir.path(), "s/gulch.gls", common::LIGHTING.as_bytes());
    let ctx = Context::new(dir.path());
    let r = ctx.resource("s/gulch.gls").unwrap().unwrap();

    let lighting = r.lighting().unwrap();
    assert_eq!(lighting.sun_color, [255, 128, 0]);
    assert_eq!(lighting.background_color, [0, 0, 64]);

    let root = r.with_xml(|doc| Ok(doc.root_element().tag_name().name().to_string())).unwrap();
    assert_eq!(root, "Lighting");
    assert!(matches!(r.raw_bytes(), Err(Error::KindMismatch { .. })));
}

#[test]
fn test_compiled_xml_needs_converter() {
    let dir = scratch();
    common::put(dir.path(), "s/gulch.gls.xmb", common::LIGHTING.as_bytes());

    let ctx = Context::new(dir.path());
    let r = ctx.resource("s/gulch.gls").unwrap().unwrap();
    assert!(matches!(r.xml_text(), Err(Error::MissingCollaborator(_))));

    let calls = Arc::new(AtomicUsize::new(0));
    let ctx = Context::new(dir.path()).with_xml_converter(CopyConverter { calls: Arc::clone(&calls) });
    let r = ctx.resource("s/gulch.gls").unwrap().unwrap();
    assert!(r.lighting().is_ok());
    assert!(r.xml_text().is_ok());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(dir.path().join("s/gulch.gls").exists());
}

#[test]
fn test_missing_xml() {
    let dir = scratch();
    let ctx = Context::new(dir.path());
    let r = ctx.resource("s/none.vis").unwrap().unwrap();
    assert!(matches!(r.xml_text(), Err(Error::FileNotFound(_))));
}

struct TouchExpander {
    calls: Arc<AtomicUsize>,
}

impl ArchiveExpander for TouchExpander {
    fn expand(&self, archive: &Path, out_dir: &Path, stem: &str) -> hwtools::Result<()> {
        assert!(archive.exists());
        self.calls.fetch_add(1, Ordering::SeqCst);
        fs::write(out_dir.join(format!("{}.eradef", stem)), b"")?;
        Ok(())
    }
}

#[test]
fn test_unpack_archives() {
    let install = scratch();
    let dir = scratch();
    for name in ["root.era", "Scenario.ERA", "notes.txt"] {
        common::put(install.path(), name, b"");
    }
    common::put(dir.path(), "root.eradef", b"");

    let calls = Arc::new(AtomicUsize::new(0));
    let ctx = Context::new(dir.path())
        .with_install_dir(install.path())
        .with_archive_expander(TouchExpander { calls: Arc::clone(&calls) });

    assert!(ctx.is_archive_unpacked("root.era"));
    assert!(!ctx.is_archive_unpacked("Scenario.ERA"));
    assert_eq!(ctx.unpack_all_archives().unwrap(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(ctx.is_archive_unpacked("Scenario.ERA"));
    assert_eq!(ctx.unpack_all_archives().unwrap(), 0);
}

fn albedo(header: [i32; 4], payload: &[u8]) -> Vec<u8> {
    let mut chunk = Vec::new();
    for v in header {
        chunk.extend_from_slice(&v.to_be_bytes());
    }
    chunk.extend_from_slice(payload);
    common::container(&[(0x6666, chunk)])
}

#[test]
fn test_albedo_through_registry() {
    let dir = scratch();
    // one BC1 block, colour 0 pure red
    common::put(dir.path(), "maps/gulch.xtt", &albedo([8, 4, 4, 0], &[0x00, 0xF8, 0, 0, 0, 0, 0, 0]));
    common::put(dir.path(), "maps/broken.xtt", &albedo([8, i32::MAX, i32::MAX, 0], &[0u8; 8]));
    let ctx = Context::new(dir.path());

    let good = ctx.resource("maps/gulch.xtt").unwrap().unwrap();
    let image = good.albedo_texture().unwrap();
    assert_eq!(image.dimensions(), (4, 4));
    assert!(image.pixels().all(|p| p.0 == [255, 0, 0, 255]));

    let broken = ctx.resource("maps/broken.xtt").unwrap().unwrap();
    assert!(matches!(broken.albedo_texture(), Err(Error::MalformedContainer(_))));
    // a bad resource leaves the others usable
    assert!(Arc::ptr_eq(&image, &good.albedo_texture().unwrap()));
}
