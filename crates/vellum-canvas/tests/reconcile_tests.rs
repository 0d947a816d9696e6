//! End-to-end reconciliation scenarios: cookie handling, legacy-mode
//! matching, merge containers, and the degradation paths.

use vellum_canvas::{build, Cookie, CookieFidelity};
use vellum_geometry::Rect;
use vellum_model::{Document, ElementDescriptor, MERGE_TAG};
use vellum_testing::prelude::*;

#[test]
fn direct_child_bounds_are_absolute_and_inclusive() {
    let (doc, root, kids) = linear_doc("frame", &["label"]);
    let render_root = render("Frame", (0, 0, 100, 100))
        .with_cookie(Cookie::Node(root))
        .with_child(render("Label", (0, 0, 20, 10)).with_cookie(Cookie::Node(kids[0])));

    let tree = build(&doc, &render_root, CookieFidelity::Complete);

    assert_eq!(tree.abs_rect(tree.root()), Rect::new(0, 0, 99, 99));
    let child = tree.children(tree.root())[0];
    assert_eq!(tree.abs_rect(child), Rect::new(0, 0, 19, 9));
    // Already larger than the minimum, so no expansion.
    assert_eq!(tree.selection_rect(child), tree.abs_rect(child));
    assert_eq!(tree.source(child), Some(kids[0]));
    assert!(tree.included_bounds().is_empty());
    assert_tree_invariants(&tree);
}

#[test]
fn nested_offsets_accumulate() {
    let (mut doc, root) = container_doc("frame");
    let inner = doc.add_child(root, ElementDescriptor::container("row"));
    let leaf = doc.add_child(inner, ElementDescriptor::widget("label"));

    let render_root = render("Frame", (0, 0, 200, 200))
        .with_cookie(Cookie::Node(root))
        .with_child(
            render("Row", (10, 20, 110, 120))
                .with_cookie(Cookie::Node(inner))
                .with_child(render("Label", (5, 5, 25, 15)).with_cookie(Cookie::Node(leaf))),
        );

    let tree = build(&doc, &render_root, CookieFidelity::Complete);

    let row = tree.children(tree.root())[0];
    let label = tree.children(row)[0];
    assert_eq!(tree.abs_rect(row), Rect::new(10, 20, 99, 99));
    assert_eq!(tree.abs_rect(label), Rect::new(15, 25, 19, 9));
    assert_tree_invariants(&tree);
}

#[test]
fn tiny_widget_gets_centered_min_selection() {
    let (doc, root, kids) = linear_doc("frame", &["dot"]);
    let render_root = render("Frame", (0, 0, 100, 100))
        .with_cookie(Cookie::Node(root))
        .with_child(render("Dot", (0, 0, 2, 2)).with_cookie(Cookie::Node(kids[0])));

    let tree = build(&doc, &render_root, CookieFidelity::Complete);

    let dot = tree.children(tree.root())[0];
    assert_eq!(tree.abs_rect(dot), Rect::new(0, 0, 1, 1));
    // Width 2 grows to 6, origin shifted back by (6 - 2) / 2 = 2.
    assert_eq!(tree.selection_rect(dot), Rect::new(-2, -2, 5, 5));
    assert_tree_invariants(&tree);
}

#[test]
fn merge_views_share_one_sibling_group() {
    let (doc, root, kids) = linear_doc("frame", &["item"]);
    let item = kids[0];
    let render_root = render("Frame", (0, 0, 100, 100))
        .with_cookie(Cookie::Node(root))
        .with_child(render("ItemA", (0, 0, 50, 20)).with_cookie(Cookie::Merge(item)))
        .with_child(render("ItemB", (0, 20, 50, 40)).with_cookie(Cookie::Merge(item)))
        .with_child(render("ItemC", (0, 40, 50, 60)).with_cookie(Cookie::Merge(item)));

    let tree = build(&doc, &render_root, CookieFidelity::Complete);

    let children = tree.children(tree.root());
    assert_eq!(children.len(), 3);
    let first = children[0];
    let siblings = tree.siblings(first).expect("first view must be grouped");
    assert_eq!(siblings.len(), 3);
    assert!(tree.is_primary_sibling(first));
    assert!(!tree.is_primary_sibling(children[1]));
    assert!(!tree.is_primary_sibling(children[2]));
    // The outline sees the element once.
    assert_eq!(tree.unique_children(tree.root()), vec![first]);
    assert_tree_invariants(&tree);
}

#[test]
fn legacy_exact_count_pairs_positionally() {
    let (doc, root, kids) = linear_doc("column", &["text", "image"]);
    let render_root = render("Column", (0, 0, 100, 100))
        .with_cookie(Cookie::Node(root))
        .with_child(render("Text", (0, 0, 50, 20)))
        .with_child(render("Image", (0, 20, 50, 40)));

    let tree = build(&doc, &render_root, CookieFidelity::Legacy);

    let children = tree.children(tree.root());
    assert_eq!(children.len(), 2);
    // Paired in source order, keeping the render class names and bounds.
    assert_eq!(tree.source(children[0]), Some(kids[0]));
    assert_eq!(tree.source(children[1]), Some(kids[1]));
    assert_eq!(child_names(&tree, tree.root()), vec!["Text", "Image"]);
    assert_eq!(tree.abs_rect(children[1]), Rect::new(0, 20, 49, 19));
    // Flat pairing does not recurse.
    assert!(tree.children(children[0]).is_empty());
    assert_tree_invariants(&tree);
}

#[test]
fn legacy_mismatch_respects_order_window_and_ranks_placeholders() {
    let (doc, root, kids) = linear_doc("column", &["t0", "t1", "t2", "t3", "t4"]);
    let (a, b, c, d, e) = (kids[0], kids[1], kids[2], kids[3], kids[4]);
    let render_root = render("Column", (0, 0, 100, 100))
        .with_cookie(Cookie::Node(root))
        .with_child(render("A", (0, 0, 30, 10)).with_cookie(Cookie::Node(a)))
        .with_child(render("B", (0, 10, 30, 20)))
        .with_child(render("C", (0, 20, 30, 30)).with_cookie(Cookie::Node(c)));

    let tree = build(&doc, &render_root, CookieFidelity::Legacy);

    let children: Vec<_> = tree.children(tree.root()).to_vec();
    assert_eq!(children.len(), 5);
    let sources: Vec<_> = children.iter().map(|&id| tree.source(id)).collect();
    // Only t1 fits between the bracketing usable siblings; t3 and t4
    // become zero-size placeholders slotted in by source rank.
    assert_eq!(
        sources,
        vec![Some(a), Some(b), Some(c), Some(d), Some(e)]
    );
    for &placeholder in &children[3..] {
        assert_eq!(tree.abs_rect(placeholder), Rect::new(0, 0, 0, 0));
        assert_eq!(tree.selection_rect(placeholder), Rect::new(-2, -2, 5, 5));
        assert!(tree.children(placeholder).is_empty());
    }
    assert_eq!(tree.name(children[3]), "t3");
    assert_eq!(tree.name(children[4]), "t4");
    assert_tree_invariants(&tree);
}

#[test]
fn legacy_unmatched_render_child_is_dropped() {
    let (doc, root, kids) = linear_doc("column", &["t0", "t1"]);
    let (a, b) = (kids[0], kids[1]);
    // Two cookie-less children but only one unclaimed element, and it sits
    // before the already-resolved sibling, so the window rejects it.
    let render_root = render("Column", (0, 0, 100, 100))
        .with_cookie(Cookie::Node(root))
        .with_child(render("B", (0, 0, 30, 10)).with_cookie(Cookie::Node(b)))
        .with_child(render("X", (0, 10, 30, 20)))
        .with_child(render("Y", (0, 20, 30, 30)));

    let tree = build(&doc, &render_root, CookieFidelity::Legacy);

    let children = tree.children(tree.root());
    assert_eq!(children.len(), 2);
    assert_eq!(tree.source(children[0]), Some(b));
    // t0 still shows up, as a trailing placeholder.
    assert_eq!(tree.source(children[1]), Some(a));
    assert_eq!(tree.abs_rect(children[1]), Rect::new(0, 0, 0, 0));
    assert_tree_invariants(&tree);
}

#[test]
fn legacy_without_candidates_ignores_cookieless_children() {
    let (doc, root, kids) = linear_doc("column", &["text"]);
    let render_root = render("Column", (0, 0, 100, 100))
        .with_cookie(Cookie::Node(root))
        .with_child(render("Text", (0, 0, 50, 20)).with_cookie(Cookie::Node(kids[0])))
        .with_child(render("Scrollbar", (90, 0, 100, 100)));

    let tree = build(&doc, &render_root, CookieFidelity::Legacy);

    let children = tree.children(tree.root());
    assert_eq!(children.len(), 1);
    assert_eq!(tree.source(children[0]), Some(kids[0]));
    assert_tree_invariants(&tree);
}

#[test]
fn complete_fidelity_skips_cookieless_children() {
    let (doc, root, kids) = linear_doc("frame", &["label"]);
    let render_root = render("Frame", (0, 0, 100, 100))
        .with_cookie(Cookie::Node(root))
        .with_child(render("Label", (0, 0, 20, 10)).with_cookie(Cookie::Node(kids[0])))
        .with_child(render("Decoration", (0, 50, 100, 100)));

    let tree = build(&doc, &render_root, CookieFidelity::Complete);

    assert_eq!(tree.children(tree.root()).len(), 1);
    assert_tree_invariants(&tree);
}

#[test]
fn include_content_is_opaque() {
    let mut doc = Document::new();
    let include = doc.add_root(ElementDescriptor::container("include"));
    doc.set_attribute(include, "layout", "@layout/header");
    let render_root = render("Include", (0, 0, 100, 40))
        .with_cookie(Cookie::Node(include))
        .with_child(render("Title", (0, 0, 80, 20)))
        .with_child(render("Subtitle", (0, 20, 80, 40)));

    let tree = build(&doc, &render_root, CookieFidelity::Legacy);

    // The embedded document is one opaque, non-editable unit.
    assert!(tree.children(tree.root()).is_empty());
    assert_eq!(
        tree.enclosing_include_ref(tree.root(), &doc),
        Some("@layout/header")
    );
    assert_tree_invariants(&tree);
}

#[test]
fn parent_echo_child_is_dropped() {
    let (doc, root, _) = linear_doc("zoom", &["knob"]);
    let render_root = render("Zoom", (0, 0, 100, 100))
        .with_cookie(Cookie::Node(root))
        .with_child(render("ZoomEcho", (0, 0, 100, 100)).with_cookie(Cookie::Node(root)));

    let tree = build(&doc, &render_root, CookieFidelity::Complete);

    assert!(tree.children(tree.root()).is_empty());
    assert_eq!(tree.len(), 1);
    assert_tree_invariants(&tree);
}

#[test]
fn headless_root_collects_included_regions() {
    let (doc, root, kids) = linear_doc("frame", &["label"]);
    // The engine rendered an outer context; nothing above our document's
    // root carries a cookie.
    let render_root = render("OuterFrame", (0, 0, 200, 200)).with_child(
        render("Holder", (10, 10, 110, 110)).with_child(
            render("Frame", (5, 5, 105, 105))
                .with_cookie(Cookie::Node(root))
                .with_child(render("Label", (0, 0, 20, 10)).with_cookie(Cookie::Node(kids[0]))),
        ),
    );

    let tree = build(&doc, &render_root, CookieFidelity::Complete);

    assert_eq!(tree.source(tree.root()), None);
    assert_eq!(tree.abs_rect(tree.root()), Rect::new(0, 0, 199, 199));
    let frame = tree.children(tree.root())[0];
    assert_eq!(tree.abs_rect(frame), Rect::new(15, 15, 99, 99));
    let label = tree.children(frame)[0];
    assert_eq!(tree.abs_rect(label), Rect::new(15, 15, 19, 9));
    assert_eq!(tree.included_bounds(), &[Rect::new(15, 15, 99, 99)]);
    // Embedded regions act as roots of their own.
    assert!(tree.is_root(frame));
    assert_tree_invariants(&tree);
}

#[test]
fn headless_merge_groups_get_one_container() {
    let mut doc = Document::new();
    let merge = doc.add_root(ElementDescriptor::container(MERGE_TAG));
    let text = doc.add_child(merge, ElementDescriptor::widget("text"));
    let image = doc.add_child(merge, ElementDescriptor::widget("image"));

    let render_root = render("OuterFrame", (0, 0, 200, 200))
        .with_child(render("Text", (0, 0, 50, 20)).with_cookie(Cookie::Merge(text)))
        .with_child(render("Image", (0, 20, 50, 40)).with_cookie(Cookie::Merge(image)))
        .with_child(render("TextShadow", (0, 40, 50, 60)).with_cookie(Cookie::Merge(text)));

    let tree = build(&doc, &render_root, CookieFidelity::Complete);

    // Bounds were recorded per primary before the container went in.
    assert_eq!(
        tree.included_bounds(),
        &[Rect::new(0, 0, 49, 19), Rect::new(0, 20, 49, 19)]
    );

    let root_children = tree.children(tree.root());
    assert_eq!(root_children.len(), 2);
    // The secondary text view stays at the top level.
    assert_eq!(tree.name(root_children[0]), "TextShadow");
    let container = root_children[1];
    assert_eq!(tree.name(container), MERGE_TAG);
    assert_eq!(tree.source(container), Some(merge));
    // Union of the two member rects.
    assert_eq!(tree.abs_rect(container), Rect::new(0, 0, 49, 39));
    let members = tree.children(container);
    assert_eq!(members.len(), 2);
    assert_eq!(tree.source(members[0]), Some(text));
    assert_eq!(tree.source(members[1]), Some(image));
    // The two text views still share their group across the move.
    assert_eq!(tree.siblings(members[0]).map(<[_]>::len), Some(2));
    assert_tree_invariants(&tree);
}

#[test]
fn ambiguous_merge_parents_merge_only_the_first_group() {
    let mut doc = Document::new();
    let frame = doc.add_root(ElementDescriptor::container("frame"));
    let merge_a = doc.add_child(frame, ElementDescriptor::container(MERGE_TAG));
    let a1 = doc.add_child(merge_a, ElementDescriptor::widget("text"));
    let a2 = doc.add_child(merge_a, ElementDescriptor::widget("image"));
    let merge_b = doc.add_child(frame, ElementDescriptor::container(MERGE_TAG));
    let b1 = doc.add_child(merge_b, ElementDescriptor::widget("text"));
    let b2 = doc.add_child(merge_b, ElementDescriptor::widget("image"));

    // Headless context with hoisted views from two distinct merge elements.
    let render_root = render("OuterFrame", (0, 0, 200, 200))
        .with_child(render("A1", (0, 0, 40, 10)).with_cookie(Cookie::Merge(a1)))
        .with_child(render("A2", (0, 10, 40, 20)).with_cookie(Cookie::Merge(a2)))
        .with_child(render("B1", (50, 0, 90, 10)).with_cookie(Cookie::Merge(b1)))
        .with_child(render("B2", (50, 10, 90, 20)).with_cookie(Cookie::Merge(b2)));

    let tree = build(&doc, &render_root, CookieFidelity::Complete);

    // Only the first-encountered merge parent gets its container; the
    // views of the other merge stay loose at the top level.
    let root_children = tree.children(tree.root());
    assert_eq!(root_children.len(), 3);
    assert_eq!(child_names(&tree, tree.root()), vec!["B1", "B2", MERGE_TAG]);
    let container = root_children[2];
    assert_eq!(tree.source(container), Some(merge_a));
    assert_eq!(tree.abs_rect(container), Rect::new(0, 0, 39, 19));
    let members: Vec<_> = tree
        .children(container)
        .iter()
        .map(|&m| tree.source(m))
        .collect();
    assert_eq!(members, vec![Some(a1), Some(a2)]);
    assert_tree_invariants(&tree);
}

#[test]
fn legacy_merge_cookies_pair_remaining_elements_positionally() {
    let (doc, root, kids) = linear_doc("column", &["text", "label"]);
    let (hoisted, plain) = (kids[0], kids[1]);

    // One element rendered twice as flattened views; the plain sibling
    // lost its cookie but is the only unclaimed element, so the counts
    // still line up.
    let render_root = render("Column", (0, 0, 100, 100))
        .with_cookie(Cookie::Node(root))
        .with_child(render("H1", (0, 0, 50, 20)).with_cookie(Cookie::Merge(hoisted)))
        .with_child(render("H2", (0, 20, 50, 40)).with_cookie(Cookie::Merge(hoisted)))
        .with_child(render("Label", (0, 40, 50, 60)));

    let tree = build(&doc, &render_root, CookieFidelity::Legacy);

    let children = tree.children(tree.root());
    assert_eq!(children.len(), 3);
    assert_eq!(tree.siblings(children[0]).map(<[_]>::len), Some(2));
    assert!(tree.is_primary_sibling(children[0]));
    assert_eq!(tree.source(children[2]), Some(plain));
    assert_eq!(tree.abs_rect(children[2]), Rect::new(0, 40, 49, 19));
    assert_tree_invariants(&tree);
}

#[test]
fn legacy_merge_only_children_leave_placeholders_for_missing_elements() {
    let (doc, root, kids) = linear_doc("column", &["text", "label"]);
    let (hoisted, ghost) = (kids[0], kids[1]);

    // Every render child is a flattened view of the first element; the
    // sibling that rendered nothing must still come back as a placeholder.
    let render_root = render("Column", (0, 0, 100, 100))
        .with_cookie(Cookie::Node(root))
        .with_child(render("H1", (0, 0, 50, 20)).with_cookie(Cookie::Merge(hoisted)))
        .with_child(render("H2", (0, 20, 50, 40)).with_cookie(Cookie::Merge(hoisted)));

    let tree = build(&doc, &render_root, CookieFidelity::Legacy);

    let children = tree.children(tree.root());
    assert_eq!(children.len(), 3);
    assert_eq!(tree.source(children[2]), Some(ghost));
    assert_eq!(tree.abs_rect(children[2]), Rect::new(0, 0, 0, 0));
    assert_eq!(tree.selection_rect(children[2]), Rect::new(-2, -2, 5, 5));
    assert_tree_invariants(&tree);
}

#[test]
fn merge_root_is_exposed_as_true_root() {
    let mut doc = Document::new();
    let merge = doc.add_root(ElementDescriptor::container(MERGE_TAG));
    let text = doc.add_child(merge, ElementDescriptor::widget("text"));

    let render_root = render("Text", (0, 0, 50, 20)).with_cookie(Cookie::Node(text));

    let tree = build(&doc, &render_root, CookieFidelity::Complete);

    let root = tree.root();
    assert_eq!(tree.name(root), MERGE_TAG);
    assert_eq!(tree.source(root), Some(merge));
    assert_eq!(tree.children(root).len(), 1);
    let inner = tree.children(root)[0];
    assert_eq!(tree.source(inner), Some(text));
    assert_eq!(tree.abs_rect(root), tree.abs_rect(inner));
    assert!(tree.included_bounds().is_empty());
    assert_tree_invariants(&tree);
}

#[test]
fn lone_merge_view_is_not_grouped() {
    let (doc, root, kids) = linear_doc("frame", &["item"]);
    let render_root = render("Frame", (0, 0, 100, 100))
        .with_cookie(Cookie::Node(root))
        .with_child(render("Item", (0, 0, 50, 20)).with_cookie(Cookie::Merge(kids[0])));

    let tree = build(&doc, &render_root, CookieFidelity::Complete);

    let item = tree.children(tree.root())[0];
    // A group with a single member carries no information; it is dissolved.
    assert_eq!(tree.siblings(item), None);
    assert!(tree.is_primary_sibling(item));
    assert_tree_invariants(&tree);
}

#[test]
fn rebuild_is_idempotent() {
    let (doc, root, kids) = linear_doc("column", &["t0", "t1", "t2", "t3", "t4"]);
    let render_root = render("Column", (0, 0, 100, 100))
        .with_cookie(Cookie::Node(root))
        .with_child(render("A", (0, 0, 30, 10)).with_cookie(Cookie::Node(kids[0])))
        .with_child(render("B", (0, 10, 30, 20)))
        .with_child(render("C", (0, 20, 30, 30)).with_cookie(Cookie::Node(kids[2])));

    let first = build(&doc, &render_root, CookieFidelity::Legacy);
    let second = build(&doc, &render_root, CookieFidelity::Legacy);

    assert_same_shape(&first, &second);
}
