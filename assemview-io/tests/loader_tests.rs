//! End-to-end tests: sample data on disk, loaded through the threaded loader

use std::time::{Duration, Instant};

use approx::assert_relative_eq;
use assemview_core::*;
use assemview_io::*;

/// Pump until no loads are pending or the deadline passes
fn pump_until_settled(ctx: &mut ViewerContext, expected: usize) -> usize {
    let deadline = Instant::now() + Duration::from_secs(10);
    let mut applied = 0;
    while applied < expected && Instant::now() < deadline {
        applied += ctx.pump().unwrap();
        std::thread::sleep(Duration::from_millis(5));
    }
    applied
}

#[test]
fn test_sample_data_loads_into_viewer_context() {
    let dir = tempfile::tempdir().unwrap();
    let assembly_path = write_sample_data(dir.path()).unwrap();
    assert!(assembly_path.ends_with(SAMPLE_ASSEMBLY_FILE));

    let (assembly, base_dir) = read_assembly(&assembly_path).unwrap();
    assert_eq!(assembly, Assembly::sample());
    assert_eq!(base_dir, dir.path());

    let loader = ThreadedMeshLoader::new(base_dir);
    let mut ctx = ViewerContext::new(assembly, &loader).unwrap();
    assert_eq!(pump_until_settled(&mut ctx, 5), 5);
    assert!(ctx.bindings().unbound().is_empty());

    // each cube is baked at its offset and then placed by its matrix
    let (min, max) = ctx.scene().visible_bounds().unwrap();
    assert_relative_eq!(min, Point3f::new(-4.5, -0.5, -0.5));
    assert_relative_eq!(max, Point3f::new(4.5, 0.5, 0.5));

    let drawn = ctx.scene().drawables();
    assert_eq!(drawn.len(), 5);
    assert!(drawn.iter().all(|d| d.mesh.vertex_count() == 8 && d.mesh.face_count() == 12));
}

#[test]
fn test_missing_mesh_leaves_item_unbound() {
    let dir = tempfile::tempdir().unwrap();
    write_sample_data(dir.path()).unwrap();
    std::fs::remove_file(dir.path().join("cube3.stl")).unwrap();

    let loader = ThreadedMeshLoader::new(dir.path());
    let mut ctx = ViewerContext::new(Assembly::sample(), &loader).unwrap();
    assert_eq!(pump_until_settled(&mut ctx, 4), 4);

    // give a stray completion a chance to show up
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(ctx.pump().unwrap(), 0);

    let unbound: Vec<NodeId> = ctx.bindings().unbound().iter().map(|b| b.node).collect();
    assert_eq!(unbound, [NodeId(4)]);
    assert_eq!(ctx.pending_loads(), 1);
}

#[test]
fn test_read_assembly_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = read_assembly(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn test_written_cube_reads_back_with_shared_vertices() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cube.stl");
    write_mesh(&cube_mesh(Vector3f::new(1.0, 0.0, 0.0)), &path).unwrap();

    let mesh = read_mesh(&path).unwrap();
    assert_eq!(mesh.vertex_count(), 8);
    assert_eq!(mesh.face_count(), 12);
    let (min, max) = mesh.bounding_box();
    assert_relative_eq!(min, Point3f::new(0.5, -0.5, -0.5));
    assert_relative_eq!(max, Point3f::new(1.5, 0.5, 0.5));
}
