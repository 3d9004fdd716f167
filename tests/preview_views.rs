mod common;

use common::{factory, probe, Script};
use printraster::preview::{PlatformViewFactory, PreviewViewFactory, PREVIEW_VIEW_TYPE};
use serde_json::json;

#[test]
fn registered_under_the_preview_view_type() {
    let p = probe();
    let previews = PreviewViewFactory::new(factory(&p, Script::sized("1", "1")));
    assert_eq!(previews.view_type(), PREVIEW_VIEW_TYPE);
    assert_eq!(PREVIEW_VIEW_TYPE, "webview-view-type");
}

#[test]
fn missing_fields_create_no_surface() {
    let p = probe();
    let previews = PreviewViewFactory::new(factory(&p, Script::sized("1", "1")));

    for args in [
        None,
        Some(json!({ "height": 200, "content": "<p>x</p>" })),
        Some(json!({ "width": 300, "content": "<p>x</p>" })),
        Some(json!({ "width": 300, "height": 200 })),
        Some(json!({ "width": 0, "height": 200, "content": "<p>x</p>" })),
    ] {
        let mut view = previews.create(7, args.as_ref());
        assert_eq!(view.view_id(), 7);
        assert!(!view.is_attached());
        assert!(view.surface().is_none());
        // disposal of a surface-less view is a no-op
        view.dispose();
    }
    assert_eq!(p.borrow().created, 0);
}

#[test]
fn full_params_attach_a_locked_down_surface() {
    let p = probe();
    let previews = PreviewViewFactory::new(factory(&p, Script::sized("1", "1")));
    let args = json!({ "width": 300, "height": 200, "content": "<h1>Total</h1>" });

    let mut view = previews.create(1, Some(&args));
    assert!(view.is_attached());
    assert_eq!(view.params().map(|p| p.width), Some(300));
    {
        let probe = p.borrow();
        assert_eq!(
            probe.events,
            vec![
                "layout 300x200".to_string(),
                "settings js=true files=false".into(),
                "load text/HTML UTF-8 <h1>Total</h1>".into(),
            ]
        );
    }

    view.dispose();
    assert!(!view.is_attached());
    view.dispose();
    assert_eq!(p.borrow().destroyed, 1);
}

#[test]
fn dropping_a_view_disposes_its_surface() {
    let p = probe();
    let previews = PreviewViewFactory::new(factory(&p, Script::sized("1", "1")));
    let args = json!({ "width": 10, "height": 10, "content": "" });
    drop(previews.create(2, Some(&args)));
    assert_eq!(p.borrow().destroyed, 1);
}

#[test]
fn refused_markup_leaves_view_detached() {
    let p = probe();
    let mut script = Script::sized("1", "1");
    script.fail_load = true;
    let previews = PreviewViewFactory::new(factory(&p, script));
    let args = json!({ "width": 10, "height": 10, "content": "<p/>" });

    let view = previews.create(3, Some(&args));
    assert!(!view.is_attached());
    assert!(view.params().is_some());
    assert_eq!(p.borrow().destroyed, 1);
}
