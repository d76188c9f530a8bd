use orbitview::prelude::*;
use std::time::Duration;

#[test]
fn test_cube_scenario_through_umbrella() -> anyhow::Result<()> {
    let loader = AssetLoader::default();
    let cube = loader.load(&AssetSource::Sample(SampleModel::Cube))?;
    assert_eq!(cube.vertex_count(), 8);
    assert_eq!(cube.index_count(), 36);
    assert!(cube.indices().iter().all(|&i| i < 8));
    Ok(())
}

#[test]
fn test_viewer_renders_through_umbrella() -> anyhow::Result<()> {
    let config = ViewerConfig {
        viewport: Viewport::new(40, 30),
        ..ViewerConfig::default()
    };
    let mut viewer = ViewerCore::new(config, SoftwareRenderer::default())?;
    viewer.open_sample(SampleModel::Sphere);
    let events = viewer.wait_idle(Duration::from_secs(10));
    assert!(events.iter().any(|e| matches!(e, ViewerEvent::AssetLoaded { .. })));
    assert_eq!(viewer.last_frame().map(|f| (f.width, f.height)), Some((40, 30)));
    Ok(())
}
