use super::*;
use serde_json::json;

fn comment(v: Value) -> DigestComment {
    serde_json::from_value(v).unwrap()
}

#[test]
fn parses_items_with_asset_path_alias() {
    let job = DigestJob::from_json(
        r#"{"items": [{"type": "3d", "assetPath": "models/chair.glb", "projectName": "Chair",
            "comments": [{"content": "hi", "user": {"name": "Ana"}, "timestamp": 1.5}]}]}"#,
    )
    .unwrap();
    assert_eq!(job.items.len(), 1);
    assert_eq!(job.items[0].kind, AssetKind::ThreeD);
    assert_eq!(job.items[0].src, "models/chair.glb");
    assert_eq!(job.comment_count(), 1);
    assert!(job.is_renderable());

    let bare = DigestJob::from_json(r#"[{"type": "image", "src": "a.png"}]"#).unwrap();
    assert!(!bare.is_renderable());
    assert!(DigestJob::from_json("42").is_err());
}

#[test]
fn normalize_drops_replies_and_sorts_by_timestamp() {
    let mut item = DigestItem {
        kind: AssetKind::Video,
        src: "v.mp4".into(),
        project_id: None,
        project_name: None,
        comments: vec![
            comment(json!({"content": "late", "timestamp": 9.0})),
            comment(json!({"content": "reply", "timestamp": 1.0, "parentId": 7})),
            comment(json!({"content": "early", "timestamp": 2.0})),
        ],
    };
    item.normalize();
    let texts: Vec<_> = item.comments.iter().filter_map(|c| c.content.as_deref()).collect();
    assert_eq!(texts, ["early", "late"]);
}

#[test]
fn comments_without_timestamps_sort_by_creation() {
    let mut item = DigestItem {
        kind: AssetKind::Image,
        src: "i.png".into(),
        project_id: None,
        project_name: None,
        comments: vec![
            comment(json!({"content": "b", "createdAt": "2024-05-02T10:00:00Z", "timestamp": 1.0})),
            comment(json!({"content": "a", "createdAt": "2024-05-01T10:00:00Z"})),
            comment(json!({"content": "null parent", "createdAt": "2024-05-03T10:00:00Z", "parentId": null})),
        ],
    };
    item.normalize();
    let texts: Vec<_> = item.comments.iter().filter_map(|c| c.content.as_deref()).collect();
    assert_eq!(texts, ["a", "b", "null parent"]);
}

#[test]
fn display_user_and_text() {
    let c = comment(json!({"content": "x".repeat(200), "user": {"name": "", "avatarPath": "u1.png"}}));
    let user = c.display_user();
    assert_eq!(user.name.as_deref(), Some("Reviewer"));
    assert_eq!(user.avatar_path.as_deref(), Some("avatars/u1.png"));
    assert_eq!(c.display_text().unwrap().chars().count(), 150);

    let anon = comment(json!({"content": "hi"}));
    assert_eq!(anon.display_user().avatar_path, None);
}

#[test]
fn camera_and_annotation_decode_leniently() {
    let c = comment(json!({
        "cameraState": "{\"orbit\": \"0rad 1rad 2m\"}",
        "annotation": {"shapes": [{"tool": "rectangle", "x": 0.1, "y": 0.1, "w": 0.2, "h": 0.2}]}
    }));
    assert!(c.camera().unwrap().orbit.is_some());
    assert_eq!(c.annotation_set().unwrap().shapes.len(), 1);

    let bad = comment(json!({"cameraState": "{not json", "annotation": {"shapes": []}}));
    assert!(bad.camera().is_none());
    assert!(bad.annotation_set().is_none());
}

#[test]
fn builds_items_from_projects() {
    let job = DigestJob::from_json(
        &json!({"projects": [
            {"id": 1, "name": "Bundle", "versions": [
                {"type": "image_bundle", "filename": "empty.png", "images": []},
                {"type": "image_bundle", "filename": "shots.png", "images": [
                    {"id": 10, "comments": [{"content": "one", "createdAt": "2024-01-02T00:00:00Z"}]},
                    {"id": 11, "comments": [{"content": "two", "createdAt": "2024-01-01T00:00:00Z"}]}
                ]}
            ]},
            {"id": 2, "name": "Model", "versions": [
                {"type": "three_d_asset", "filename": "m.glb", "comments": []}
            ]},
            {"id": 3, "name": "Nothing", "versions": []}
        ]})
        .to_string(),
    )
    .unwrap();

    assert_eq!(job.items.len(), 2);
    let bundle = &job.items[0];
    assert_eq!(bundle.kind, AssetKind::Image);
    assert_eq!(bundle.src, "shots.png");
    assert_eq!(bundle.project_name.as_deref(), Some("Bundle"));
    assert_eq!(bundle.comments[0].content.as_deref(), Some("two"));
    assert_eq!(bundle.comments[0].image_id, Some(json!(11)));

    assert_eq!(job.items[1].kind, AssetKind::ThreeD);
    assert_eq!(job.comment_count(), 2);
}
