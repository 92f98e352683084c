//! Attributes flow into properties, property writes flow back into attributes.

use std::rc::Rc;

use futures_util::future::ready;
use pretty_assertions::assert_eq;
use serde_json::json;
use strand_core::*;
use strand_dom::{text, NodeId};

/// Renders `label:count:open` from its properties.
fn widget(runtime: &Runtime) {
    runtime
        .declare(
            "widget",
            |component| {
                let component = component.clone();
                from_fn(move || {
                    let view = ["label", "count", "open"]
                        .map(|name| component.property(name).map(|p| p.to_string()).unwrap_or_default())
                        .join(":");
                    ready(Ok(Step::Yield(text(view))))
                })
            },
            DefaultProps::new()
                .prop("label", "none")
                .prop("count", 0)
                .prop("open", false)
                .prop("data", json!({ "rows": [] })),
            ComponentOptions::new(),
        )
        .unwrap();
}

fn setup() -> (Rc<Runtime>, NodeId, Component) {
    let runtime = Runtime::new(Config::default());
    widget(&runtime);
    let doc = runtime.document();
    let el = doc.create_element("x-widget");
    doc.append_child(doc.body(), el).unwrap();
    let component = Component::from_element(doc, el).unwrap();
    (runtime, el, component)
}

#[test]
fn defaults_are_the_initial_properties() {
    let (runtime, el, component) = setup();
    assert_eq!(runtime.document().text_content(el), "none:0:false");
    assert_eq!(
        component.properties(),
        vec![
            ("label".to_string(), PropValue::from("none")),
            ("count".to_string(), PropValue::Number(0.0)),
            ("open".to_string(), PropValue::Bool(false)),
            ("data".to_string(), PropValue::Object(json!({ "rows": [] }))),
        ]
    );
}

#[test]
fn attribute_changes_are_coerced_before_the_next_render() {
    let (runtime, el, component) = setup();
    let doc = runtime.document();

    doc.set_attribute(el, "count", "42").unwrap();
    doc.set_attribute(el, "open", "").unwrap();
    doc.set_attribute(el, "label", "hi").unwrap();

    // properties update right away, the view waits for a render
    assert_eq!(component.property("count"), Some(PropValue::Number(42.0)));
    assert_eq!(doc.text_content(el), "none:0:false");

    component.render();
    runtime.flush();
    assert_eq!(doc.text_content(el), "hi:42:true");
}

#[test]
fn unparseable_numbers_stay_strings() {
    let (runtime, el, component) = setup();
    runtime.document().set_attribute(el, "count", "many").unwrap();
    assert_eq!(component.property("count"), Some(PropValue::from("many")));
}

#[test]
fn the_string_false_is_false() {
    let (runtime, el, component) = setup();
    runtime.document().set_attribute(el, "open", "false").unwrap();
    assert_eq!(component.property("open"), Some(PropValue::Bool(false)));
    runtime.document().set_attribute(el, "open", "no").unwrap();
    assert_eq!(component.property("open"), Some(PropValue::Bool(true)));
}

#[test]
fn removing_an_attribute_restores_the_default() {
    let (runtime, el, component) = setup();
    let doc = runtime.document();

    doc.set_attribute(el, "label", "hi").unwrap();
    doc.set_attribute(el, "open", "").unwrap();
    doc.remove_attribute(el, "label").unwrap();
    doc.remove_attribute(el, "open").unwrap();

    assert_eq!(component.property("label"), Some(PropValue::from("none")));
    assert_eq!(component.property("open"), Some(PropValue::Bool(false)));
}

#[test]
fn undeclared_attributes_are_ignored() {
    let (runtime, el, component) = setup();
    let doc = runtime.document();
    let before = component.properties();

    doc.set_attribute(el, "title", "tooltip").unwrap();
    assert_eq!(component.properties(), before);
    assert_eq!(component.property("title"), None);
}

#[test]
fn initial_attributes_are_seeded_on_connect() {
    let runtime = Runtime::new(Config::default());
    widget(&runtime);
    let doc = runtime.document();

    let el = doc.create_element("x-widget");
    doc.set_attribute(el, "label", "early").unwrap();
    doc.set_attribute(el, "count", "3").unwrap();
    doc.append_child(doc.body(), el).unwrap();

    assert_eq!(doc.text_content(el), "early:3:false");
}

#[test]
fn upgraded_elements_see_their_attributes() {
    let runtime = Runtime::new(Config::default());
    let doc = runtime.document();

    let el = doc.create_element("x-widget");
    doc.set_attribute(el, "open", "").unwrap();
    doc.append_child(doc.body(), el).unwrap();
    assert_eq!(doc.text_content(el), "");

    widget(&runtime);
    assert_eq!(doc.text_content(el), "none:0:true");
}

#[test]
fn property_writes_reflect_without_looping() {
    let (runtime, el, component) = setup();
    let doc = runtime.document();

    let before = doc.mutation_count();
    component.set_property("count", 7).unwrap();
    assert_eq!(doc.mutation_count(), before + 1);
    assert_eq!(doc.attribute(el, "count").as_deref(), Some("7"));
    assert_eq!(component.property("count"), Some(PropValue::Number(7.0)));

    component.set_property("label", "set").unwrap();
    assert_eq!(doc.attribute(el, "label").as_deref(), Some("set"));

    // the attribute still drives the property afterwards
    doc.set_attribute(el, "count", "8").unwrap();
    assert_eq!(component.property("count"), Some(PropValue::Number(8.0)));

    component.render();
    runtime.flush();
    assert_eq!(doc.text_content(el), "set:8:false");
}

#[test]
fn reflected_writes_are_not_coerced_back() {
    let (runtime, el, component) = setup();
    let doc = runtime.document();

    // coercing the attribute would turn this into a number
    component.set_property("count", " 5").unwrap();
    assert_eq!(doc.attribute(el, "count").as_deref(), Some(" 5"));
    assert_eq!(component.property("count"), Some(PropValue::from(" 5")));

    // only the echo of the write is skipped
    doc.set_attribute(el, "count", " 5").unwrap();
    assert_eq!(component.property("count"), Some(PropValue::Number(5.0)));
}

#[test]
fn booleans_reflect_as_presence() {
    let (runtime, el, component) = setup();
    let doc = runtime.document();

    component.set_property("open", true).unwrap();
    assert_eq!(doc.attribute(el, "open").as_deref(), Some(""));

    component.set_property("open", false).unwrap();
    assert!(!doc.has_attribute(el, "open"));
    assert_eq!(component.property("open"), Some(PropValue::Bool(false)));

    // nothing to remove
    let before = doc.mutation_count();
    component.set_property("open", false).unwrap();
    assert_eq!(doc.mutation_count(), before);
}

#[test]
fn objects_are_not_reflected() {
    let (runtime, el, component) = setup();
    let doc = runtime.document();

    let before = doc.mutation_count();
    component.set_property("data", json!({ "rows": [1, 2] })).unwrap();
    assert_eq!(doc.mutation_count(), before);
    assert!(!doc.has_attribute(el, "data"));
    assert_eq!(
        component.property("data").unwrap().as_object(),
        Some(&json!({ "rows": [1, 2] }))
    );
}

#[test]
fn undeclared_properties_are_rejected() {
    let (_runtime, _el, component) = setup();
    let err = component.set_property("colour", "red").unwrap_err();
    assert!(matches!(
        err,
        PropertyError::Undeclared { ref component, ref name } if component == "x-widget" && name == "colour"
    ));
}

#[test]
fn detached_handles_report_it() {
    let (runtime, el, component) = setup();
    let doc = runtime.document();
    doc.remove(el).unwrap();
    doc.destroy(el).unwrap();

    assert!(matches!(component.set_property("count", 1), Err(PropertyError::Detached)));
    assert_eq!(component.property("count"), None);
    assert_eq!(component.lifecycle(), Lifecycle::Finalized);
}
