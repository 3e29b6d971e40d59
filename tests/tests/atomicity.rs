//! All-or-nothing, dry-run and ordering properties.

use canopy_tests::prelude::*;
use proptest::prelude::*;

/// A batch of valid patches touching every part of the seeded site.
fn valid_batch(site: &Site) -> Vec<Value> {
    vec![
        create_node(&site.id("home/main"), "Site:Text", "into", json!({"title": "A"})),
        update_node(&site.id("hello"), json!({"text": "Body"})),
        create_node(&site.id("about"), "Site:Page", "after", json!({"title": "Contact"})),
        move_node(&site.id("hero"), &site.id("hello"), "before"),
        create_node(&site.id("news/main"), "Site:TwoColumn", "into", json!({})),
        delete_node(&site.id("about")),
    ]
}

// ========== TEST: failure at any index leaves the tree untouched ==========
#[test]
fn test_validation_failure_at_any_index_is_atomic() {
    // GIVEN a valid batch of N patches
    let site = Site::new();
    let batch = valid_batch(&site);

    for i in 0..=batch.len() {
        // WHEN an invalid patch is inserted at position i
        let mut patches = batch.clone();
        patches.insert(i, delete_node(&NodeId::from("ghost")));
        let before = site.dump("live");

        let result = site.apply(patches);

        // THEN the batch fails at i and nothing changes
        assert!(!result.success);
        let error = result.error.unwrap();
        assert_eq!(error.patch_index, i);
        assert_eq!(error.kind, PatchErrorKind::Validation);
        assert!(!result.rolled_back);
        assert_eq!(site.dump("live"), before);
    }
}

// ========== TEST: execution failure undoes earlier patches ==========
#[test]
fn test_execution_failure_is_atomic() {
    // GIVEN a batch whose last patch updates a node an earlier patch deletes
    let site = Site::new();
    let mut patches = valid_batch(&site);
    patches.push(update_node(&site.id("about"), json!({"title": "Gone"})));
    let before = site.dump("live");

    // WHEN applying
    let result = site.apply(patches);

    // THEN execution fails, the transaction is rolled back, nothing changes
    assert!(!result.success);
    let error = result.error.unwrap();
    assert_eq!(error.kind, PatchErrorKind::Execution);
    assert_eq!(error.patch_index, 6);
    assert!(result.rolled_back);
    assert!(result.outcomes.is_empty());
    assert_eq!(site.dump("live"), before);
}

// ========== TEST: dry run leaves the tree untouched ==========
#[test]
fn test_dry_run_is_pure() {
    let site = Site::new();
    let before = site.dump("live");

    let result = site.dry_run(valid_batch(&site));

    assert!(result.success, "{:?}", result.error);
    assert!(result.dry_run);
    assert!(result.rolled_back);
    assert_eq!(result.outcomes.len(), 6);
    assert!(result.created_nodes().count() >= 5);
    assert_eq!(site.dump("live"), before);
}

// ========== TEST: failing dry run leaves the tree untouched ==========
#[test]
fn test_failing_dry_run_is_pure() {
    let site = Site::new();
    let mut patches = valid_batch(&site);
    patches.push(update_node(&site.id("about"), json!({"title": "Gone"})));
    let before = site.dump("live");

    let result = site.dry_run(patches);

    assert!(!result.success);
    assert!(result.dry_run);
    assert!(result.rolled_back);
    assert_eq!(site.dump("live"), before);
}

// ========== TEST: committed batch is visible ==========
#[test]
fn test_committed_batch_is_applied() {
    let site = Site::new();

    let result = site.apply(valid_batch(&site));

    assert!(result.success, "{:?}", result.error);
    assert!(!result.dry_run);
    assert!(!result.rolled_back);
    assert_eq!(site.child_names("site").len(), 2);
    assert_eq!(site.child_names("home/main")[..2], ["hero", "hello"]);
}

#[derive(Debug, Clone)]
enum Edit {
    CreateText(String),
    UpdateHello(String),
    CreateImage,
}

fn arb_edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        "[A-Za-z ]{0,12}".prop_map(Edit::CreateText),
        "[a-z ]{0,12}".prop_map(Edit::UpdateHello),
        Just(Edit::CreateImage),
    ]
}

fn to_patch(site: &Site, edit: &Edit) -> Value {
    match edit {
        Edit::CreateText(title) => {
            create_node(&site.id("home/main"), "Site:Text", "into", json!({"title": title}))
        }
        Edit::UpdateHello(text) => update_node(&site.id("hello"), json!({"text": text})),
        Edit::CreateImage => create_node(
            &site.id("news/main"),
            "Site:Image",
            "into",
            json!({"image": {"identifier": "abc"}}),
        ),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn outcomes_preserve_batch_order(edits in prop::collection::vec(arb_edit(), 1..8)) {
        let site = Site::new();
        let patches: Vec<Value> = edits.iter().map(|e| to_patch(&site, e)).collect();
        let operations: Vec<String> = patches
            .iter()
            .map(|p| p["operation"].as_str().unwrap_or_default().to_string())
            .collect();

        let result = site.apply(patches);

        prop_assert!(result.success, "{:?}", result.error);
        prop_assert_eq!(result.outcomes.len(), edits.len());
        for (k, outcome) in result.outcomes.iter().enumerate() {
            prop_assert_eq!(outcome.index, k);
            prop_assert_eq!(&outcome.operation, &operations[k]);
        }
    }
}
