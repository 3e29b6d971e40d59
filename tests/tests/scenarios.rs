//! Patch batch scenarios against the seeded site.

use canopy_tests::prelude::*;
use canopy_tree::TreeAccessor;

mod create_text {
    use super::*;

    pub fn scenario() -> Scenario {
        Scenario::new("create_text").step(
            "create_into_main",
            |site| {
                vec![create_node(
                    &site.id("home/main"),
                    "Site:Text",
                    "into",
                    json!({"title": "Hello"}),
                )]
            },
            |a| {
                a.succeeds()
                    .rolled_back(false)
                    .outcomes(1)
                    .created(1)
                    .custom(|r| {
                        let created = r.outcomes[0].created_nodes.as_ref().unwrap();
                        created[0].depth == 0 && created[0].properties["title"] == json!("Hello")
                    })
            },
        )
    }

    #[test]
    fn test_create_node_into_parent() {
        let site = scenario().run().unwrap();

        assert_eq!(site.child_names("home/main").len(), 3);
        let created = site
            .repo
            .children(&site.ctx, &site.id("home/main"))
            .pop()
            .unwrap();
        assert_eq!(created.type_name, "Site:Text");
        assert_eq!(created.property("title"), Some(&json!("Hello")));
    }
}

mod update_missing_node {
    use super::*;

    pub fn scenario() -> Scenario {
        Scenario::new("update_missing_node").step(
            "update",
            |_| vec![update_node(&NodeId::from("missing-id"), json!({"title": "x"}))],
            |a| {
                a.fails()
                    .kind(PatchErrorKind::Validation)
                    .operation("updateNode")
                    .node_id("missing-id")
                    .patch_index(0)
                    .rolled_back(false)
                    .outcomes(0)
                    .unchanged()
            },
        )
    }

    #[test]
    fn test_update_missing_node_is_rejected() {
        scenario().run().unwrap();
    }
}

mod later_invalid_patch {
    use super::*;

    pub fn scenario() -> Scenario {
        Scenario::new("later_invalid_patch").step(
            "create_then_update_missing",
            |site| {
                vec![
                    create_node(
                        &site.id("home/main"),
                        "Site:Text",
                        "into",
                        json!({"title": "New"}),
                    ),
                    update_node(&NodeId::from("missing-id"), json!({})),
                ]
            },
            |a| {
                a.fails()
                    .patch_index(1)
                    .operation("updateNode")
                    .node_id("missing-id")
                    .unchanged()
            },
        )
    }

    #[test]
    fn test_earlier_valid_patch_is_not_applied() {
        let site = scenario().run().unwrap();

        assert_eq!(site.child_names("home/main"), vec!["hello", "hero"]);
    }
}

mod forbidden_move {
    use super::*;

    pub fn scenario() -> Scenario {
        Scenario::new("forbidden_move").step(
            "move_text_into_page",
            |site| vec![move_node(&site.id("hello"), &site.id("about"), "into")],
            |a| {
                a.fails()
                    .kind(PatchErrorKind::Validation)
                    .operation("moveNode")
                    .message("not allowed")
                    .unchanged()
            },
        )
    }

    #[test]
    fn test_move_into_forbidden_parent_is_rejected() {
        scenario().run().unwrap();
    }
}

mod asset_normalization {
    use super::*;

    pub fn scenario() -> Scenario {
        Scenario::new("asset_normalization").step(
            "update_image",
            |site| {
                vec![update_node(
                    &site.id("hero"),
                    json!({"image": {"identifier": "def", "filename": "y.png"}}),
                )]
            },
            |a| a.succeeds().outcomes(1).created(0),
        )
    }

    #[test]
    fn test_asset_descriptor_stored_as_identifier() {
        let site = scenario().run().unwrap();

        let hero = site.repo.find_node(&site.ctx, &site.id("hero")).unwrap();
        assert_eq!(hero.property("image"), Some(&json!("def")));
    }
}

mod auto_created_children {
    use super::*;

    pub fn scenario() -> Scenario {
        Scenario::new("auto_created_children")
            .step(
                "create_two_column",
                |site| {
                    vec![create_node(&site.id("home/main"), "Site:TwoColumn", "into", json!({}))]
                },
                |a| a.succeeds().created(3).max_depth(1),
            )
            .step(
                "create_teaser_from_template",
                |site| {
                    vec![create_node(&site.id("hello"), "Site:Teaser", "after", json!({}))]
                },
                |a| {
                    a.succeeds().created(3).max_depth(2).custom(|r| {
                        let created = r.outcomes[0].created_nodes.as_ref().unwrap();
                        let text = &created[2];
                        text.type_name == "Site:Text"
                            && text.properties["title"] == json!("Read more")
                            && text.properties["_hidden"] == json!(false)
                    })
                },
            )
    }

    #[test]
    fn test_created_descendants_are_reported_depth_first() {
        let site = scenario().run().unwrap();

        let names = site.child_names("home/main");
        assert_eq!(names.len(), 4);
        assert_eq!(names[0], "hello");
        assert!(names[1].starts_with("teaser-"));
        assert_eq!(names[2], "hero");
        assert!(names[3].starts_with("twocolumn-"));
    }
}

mod grandchild_constraints {
    use super::*;

    fn two_column_column(site: &Site) -> NodeId {
        let main = site.id("home/main");
        let two_column = site
            .repo
            .children(&site.ctx, &main)
            .into_iter()
            .find(|c| c.type_name == "Site:TwoColumn")
            .unwrap();
        site.repo
            .children(&site.ctx, &two_column.id)
            .into_iter()
            .find(|c| c.name == "column0")
            .unwrap()
            .id
    }

    pub fn scenario() -> Scenario {
        Scenario::new("grandchild_constraints")
            .step(
                "create_two_column",
                |site| {
                    vec![create_node(&site.id("home/main"), "Site:TwoColumn", "into", json!({}))]
                },
                |a| a.succeeds(),
            )
            .step(
                "text_in_column_allowed",
                |site| vec![create_node(&two_column_column(site), "Site:Text", "into", json!({}))],
                |a| a.succeeds().created(1),
            )
            .step(
                "gallery_in_column_forbidden",
                |site| {
                    vec![create_node(&two_column_column(site), "Site:Gallery", "into", json!({}))]
                },
                |a| a.fails().kind(PatchErrorKind::Validation).unchanged(),
            )
    }

    #[test]
    fn test_auto_created_child_constraints() {
        scenario().run().unwrap();
    }
}

mod mixed_batch {
    use super::*;

    pub fn scenario() -> Scenario {
        Scenario::new("mixed_batch").step(
            "all_operations",
            |site| {
                vec![
                    create_node(
                        &site.id("hello"),
                        "Site:Text",
                        "before",
                        json!({"title": "First"}),
                    ),
                    update_node(&site.id("hello"), json!({"title": "Hi", "_hidden": true})),
                    move_node(&site.id("news"), &site.id("about"), "after"),
                    delete_node(&site.id("hero")),
                ]
            },
            |a| {
                a.succeeds().outcomes(4).created(1).custom(|r| {
                    r.outcomes.iter().enumerate().all(|(k, o)| o.index == k)
                        && r.outcomes[0].created_nodes.is_some()
                        && r.outcomes[1..].iter().all(|o| o.created_nodes.is_none())
                })
            },
        )
    }

    #[test]
    fn test_all_operations_in_one_batch() {
        let site = scenario().run().unwrap();

        let main = site.child_names("home/main");
        assert_eq!(main.len(), 2);
        assert_eq!(main[1], "hello");
        assert_eq!(site.child_names("site"), vec!["home", "about", "news"]);
        assert!(site.child_names("home").iter().all(|n| n != "news"));
        let hello = site.repo.find_node(&site.ctx, &site.id("hello")).unwrap();
        assert_eq!(hello.property("_hidden"), Some(&json!(true)));
    }
}

mod invalid_properties {
    use super::*;

    pub fn scenario() -> Scenario {
        Scenario::new("invalid_properties")
            .step(
                "internal_property",
                |site| vec![update_node(&site.id("hello"), json!({"_nodeType": "Site:Image"}))],
                |a| a.fails().message("internal").unchanged(),
            )
            .step(
                "undeclared_property",
                |site| vec![update_node(&site.id("hello"), json!({"color": "red"}))],
                |a| a.fails().message("not declared").unchanged(),
            )
            .step(
                "pattern_mismatch",
                |site| vec![update_node(&site.id("about"), json!({"uriPathSegment": "About Us"}))],
                |a| a.fails().message("does not match pattern").unchanged(),
            )
            .step(
                "abstract_type",
                |site| vec![create_node(&site.id("home/main"), "Site:Content", "into", json!({}))],
                |a| a.fails().message("abstract").unchanged(),
            )
            .step(
                "clear_with_null",
                |site| vec![update_node(&site.id("hello"), json!({"title": null}))],
                |a| a.succeeds(),
            )
    }

    #[test]
    fn test_property_validation() {
        let site = scenario().run().unwrap();

        let hello = site.repo.find_node(&site.ctx, &site.id("hello")).unwrap();
        assert_eq!(hello.property("title"), None);
    }
}

mod workspaces {
    use super::*;
    use canopy_core::Dimensions;

    #[test]
    fn test_patches_stay_in_their_workspace() {
        let site = Site::new();
        let live_before = site.dump("live");

        let result = site.executor().apply(
            &[delete_node(&site.id("hero"))],
            &WorkspaceName::new("user-admin"),
            &Dimensions::none(),
            false,
        );

        assert!(result.success, "{:?}", result.error);
        assert_eq!(site.dump("live"), live_before);
        assert_ne!(site.dump("user-admin"), live_before);
    }

    #[test]
    fn test_unknown_dimension_point_is_system_error() {
        let site = Site::new();

        let result = site.executor().apply(
            &[delete_node(&site.id("hero"))],
            &WorkspaceName::live(),
            &Dimensions::none().with("language", &["fr"]),
            false,
        );

        let error = result.error.unwrap();
        assert_eq!(error.kind, PatchErrorKind::System);
        assert_eq!(error.operation, "unknown");
        assert_eq!(error.node_id, None);
    }
}
