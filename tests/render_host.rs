#![cfg(feature = "block-surface")]

use printraster::channel::{MethodCall, MethodResponse};
use printraster::platform::{DisplayMetrics, StaticEnvironment, WindowMetrics};
use printraster::rendering::BlockSurface;
use printraster::{CaptureConfig, Error, InvalidDimensionPolicy, PixelDimensions, RenderHost};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const SIZED_BODY: &str = "<body style='width:100px;height:50px;background:#336699'>x</body>";

async fn host_with(density: f64, config: CaptureConfig) -> RenderHost {
    let env = Arc::new(StaticEnvironment::new(DisplayMetrics {
        density,
        window: WindowMetrics::Legacy {
            width: 576,
            height: 1024,
        },
    }));
    RenderHost::new(BlockSurface::factory(env.clone()), env, config)
        .await
        .expect("host starts")
}

#[tokio::test]
async fn captures_at_device_density() -> anyhow::Result<()> {
    let host = host_with(2.0, CaptureConfig::default()).await;
    let png = host
        .content_to_image(SIZED_BODY, Some(10.0))
        .await?
        .expect("image delivered");

    let decoded = png.decode()?;
    assert_eq!(decoded.size(), PixelDimensions::new(200, 100));
    // body box starts at the 8 unit margin
    assert_eq!(decoded.pixel(0, 0), Some([255, 255, 255, 255]));
    assert_eq!(decoded.pixel(20, 20), Some([0x33, 0x66, 0x99, 255]));
    assert_eq!(decoded.pixel(199, 99), Some([0x33, 0x66, 0x99, 255]));

    assert_eq!(host.shutdown().await?, 0);
    Ok(())
}

#[tokio::test]
async fn zero_duration_captures_at_density_two() -> anyhow::Result<()> {
    let host = host_with(2.0, CaptureConfig::default()).await;
    let png = host
        .content_to_image("<body style='width:100px;height:50px'>x</body>", Some(0.0))
        .await?
        .expect("image delivered");
    assert_eq!(png.size()?, PixelDimensions::new(200, 100));
    host.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn non_ascii_colour_does_not_take_the_host_down() -> anyhow::Result<()> {
    let host = host_with(1.0, CaptureConfig::default()).await;
    let first = host
        .content_to_image(
            "<body style='width:10px;height:10px;background:#a\u{e9}\u{20ac}'>x</body>",
            None,
        )
        .await?
        .expect("unparsable colour is ignored");
    assert_eq!(first.size()?, PixelDimensions::new(10, 10));

    let second = host.content_to_image(SIZED_BODY, None).await?;
    assert_eq!(second.expect("host still serving").size()?, PixelDimensions::new(100, 50));
    host.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn far_off_canvas_block_is_clipped() -> anyhow::Result<()> {
    let host = host_with(1.0, CaptureConfig::default()).await;
    let markup = "<body style='width:100px;height:50px'>\
        <div style='margin:1e19px;width:1e16px;height:1e16px;background:red'></div></body>";
    let png = host
        .content_to_image(markup, None)
        .await?
        .expect("image delivered");
    let decoded = png.decode()?;
    assert_eq!(decoded.size(), PixelDimensions::new(100, 50));
    assert_eq!(decoded.pixel(99, 49), Some([255, 255, 255, 255]));
    host.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn same_markup_gives_same_bytes() -> anyhow::Result<()> {
    let host = host_with(1.5, CaptureConfig::default()).await;
    let markup = "<body style='width:120px'><h1>Shop</h1><p>1 x Coffee 2.50</p></body>";
    let a = host.content_to_image(markup, None).await?.expect("first");
    let b = host.content_to_image(markup, None).await?.expect("second");
    assert_eq!(a.digest(), b.digest());
    assert_eq!(a.size()?.width_px, 180);
    host.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn empty_body_is_dropped_by_default() -> anyhow::Result<()> {
    let host = host_with(1.0, CaptureConfig::default()).await;
    let outcome = tokio::time::timeout(
        Duration::from_secs(10),
        host.content_to_image("<body></body>", None),
    )
    .await?;
    assert!(outcome?.is_none());
    host.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn empty_body_fails_under_strict_policy() -> anyhow::Result<()> {
    let config = CaptureConfig {
        invalid_dimensions: InvalidDimensionPolicy::Fail,
        ..Default::default()
    };
    let host = host_with(1.0, config).await;
    let err = host
        .content_to_image("<body></body>", None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::CaptureFailure(_)));
    host.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn bad_requests_and_unknown_methods() -> anyhow::Result<()> {
    let host = host_with(1.0, CaptureConfig::default()).await;

    let reply = host.invoke(MethodCall::new("openDrawer", json!({}))).await?;
    assert_eq!(reply, Some(MethodResponse::NotImplemented));

    let err = host.content_to_image("   ", None).await.unwrap_err();
    assert!(matches!(err, Error::InvalidRequest(_)));
    host.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn previews_attach_and_dispose() -> anyhow::Result<()> {
    let host = host_with(1.0, CaptureConfig::default()).await;

    let attached = host
        .create_preview(1, Some(json!({ "width": 300, "height": 200, "content": "<p>x</p>" })))
        .await?;
    assert!(attached);
    assert!(!host.create_preview(2, Some(json!({ "width": 300 }))).await?);

    assert!(host.dispose_preview(1).await?);
    assert!(host.dispose_preview(2).await?);
    assert!(!host.dispose_preview(3).await?);
    host.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn shutdown_cancels_in_flight_captures() -> anyhow::Result<()> {
    let host = host_with(1.0, CaptureConfig::default()).await;
    let pending = {
        let host = host.clone();
        tokio::spawn(async move { host.content_to_image(SIZED_BODY, Some(5_000.0)).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(host.clone().shutdown().await?, 1);
    let outcome = pending.await?;
    assert!(matches!(outcome, Ok(None)));

    match host.content_to_image(SIZED_BODY, None).await {
        Err(Error::HostUnavailable(_)) | Ok(None) => {}
        other => panic!("unexpected outcome after shutdown: {:?}", other.map(|o| o.is_some())),
    }
    Ok(())
}
