//! Generator lifecycle: first render, coalescing, settling, errors and teardown.

use std::{any::Any, cell::Cell, cell::RefCell, rc::Rc};

use futures_util::{future::ready, stream};
use pretty_assertions::assert_eq;
use strand_core::*;
use strand_dom::{h, text, CustomElement, Document, DomError, ElementDefinition, NodeId, VNode};
use tokio::sync::Notify;

type Log = Rc<RefCell<Vec<String>>>;

fn runtime() -> Rc<Runtime> {
    Runtime::new(Config::default())
}

fn mount(runtime: &Runtime, name: &str) -> NodeId {
    let doc = runtime.document();
    let el = doc.create_element(name);
    doc.append_child(doc.body(), el).unwrap();
    el
}

/// A counter: each click bumps the count and requests a render.
fn counter(runtime: &Runtime) {
    runtime
        .declare(
            "counter",
            |component| {
                let component = component.clone();
                let count = Rc::new(Cell::new(0));
                from_fn(move || {
                    let (component, count) = (component.clone(), count.clone());
                    async move {
                        let view = h("button")
                            .on("click", {
                                let count = count.clone();
                                move |_| {
                                    count.set(count.get() + 1);
                                    component.render();
                                }
                            })
                            .child(text(count.get().to_string()));
                        Ok(Step::Yield(view.into()))
                    }
                })
            },
            DefaultProps::new(),
            ComponentOptions::new(),
        )
        .unwrap();
}

fn click(doc: &Document, counter: NodeId) {
    let button = doc.children(counter)[0];
    doc.dispatch_event(button, "click").unwrap();
}

#[test]
fn connecting_commits_exactly_one_view() {
    let runtime = runtime();
    let resumes = Rc::new(Cell::new(0));

    let counted = resumes.clone();
    runtime
        .declare(
            "once-per-connect",
            move |_| {
                let resumes = counted.clone();
                from_fn(move || {
                    resumes.set(resumes.get() + 1);
                    ready(Ok(Step::Yield(h("p").child(text("hello")).into())))
                })
            },
            DefaultProps::new(),
            ComponentOptions::new(),
        )
        .unwrap();

    let doc = runtime.document();
    let el = doc.create_element("once-per-connect");
    assert_eq!(resumes.get(), 0);

    doc.append_child(doc.body(), el).unwrap();
    assert_eq!(resumes.get(), 1);
    assert_eq!(doc.inner_html(el), "<p>hello</p>");

    runtime.flush();
    assert_eq!(resumes.get(), 1);
    assert_eq!(Component::from_element(doc, el).unwrap().lifecycle(), Lifecycle::Running);
}

#[test]
fn two_clicks_count_to_two() {
    let runtime = runtime();
    counter(&runtime);
    let doc = runtime.document();
    let el = mount(&runtime, "x-counter");
    assert_eq!(doc.outer_html(el), "<x-counter><button>0</button></x-counter>");

    click(doc, el);
    // renders are asynchronous
    assert_eq!(doc.text_content(el), "0");
    runtime.flush();
    assert_eq!(doc.text_content(el), "1");

    click(doc, el);
    runtime.flush();
    assert_eq!(doc.outer_html(el), "<x-counter><button>2</button></x-counter>");
}

#[test]
fn queued_requests_are_absorbed() {
    let runtime = runtime();
    counter(&runtime);
    let doc = runtime.document();
    let el = mount(&runtime, "x-counter");

    // both clicks land before the scheduler runs: one render sees both increments
    click(doc, el);
    click(doc, el);
    let before = doc.mutation_count();
    runtime.flush();
    assert_eq!(doc.text_content(el), "2");
    assert_eq!(doc.mutation_count(), before + 1);
}

#[test]
fn siblings_keep_their_own_state() {
    let runtime = runtime();
    counter(&runtime);
    let doc = runtime.document();
    let first = mount(&runtime, "x-counter");
    let second = mount(&runtime, "x-counter");

    click(doc, first);
    runtime.flush();
    click(doc, first);
    runtime.flush();

    assert_eq!(doc.text_content(first), "2");
    assert_eq!(doc.text_content(second), "0");

    click(doc, second);
    runtime.flush();
    assert_eq!(doc.text_content(first), "2");
    assert_eq!(doc.text_content(second), "1");
}

#[test]
fn reconnecting_restarts_the_generator() {
    let runtime = runtime();
    counter(&runtime);
    let doc = runtime.document();
    let el = mount(&runtime, "x-counter");

    click(doc, el);
    runtime.flush();
    assert_eq!(doc.text_content(el), "1");

    doc.remove(el).unwrap();
    let component = Component::from_element(doc, el).unwrap();
    assert_eq!(component.lifecycle(), Lifecycle::Finalized);

    // renders requested while disconnected are ignored
    component.render();
    runtime.flush();
    assert_eq!(doc.text_content(el), "1");

    doc.append_child(doc.body(), el).unwrap();
    assert_eq!(component.lifecycle(), Lifecycle::Running);
    assert_eq!(doc.text_content(el), "0");
}

#[test]
fn requests_during_a_render_coalesce_into_one() {
    let runtime = runtime();
    let resumes = Rc::new(Cell::new(0));
    let gate = Rc::new(Notify::new());

    let (counted, gated) = (resumes.clone(), gate.clone());
    runtime
        .declare(
            "slow",
            move |_| {
                let (resumes, gate) = (counted.clone(), gated.clone());
                from_fn(move || {
                    let n = resumes.get() + 1;
                    resumes.set(n);
                    let gate = gate.clone();
                    async move {
                        if n > 1 {
                            gate.notified().await;
                        }
                        Ok(Step::Yield(text(n.to_string())))
                    }
                })
            },
            DefaultProps::new(),
            ComponentOptions::new(),
        )
        .unwrap();

    let doc = runtime.document();
    let el = mount(&runtime, "x-slow");
    let component = Component::from_element(doc, el).unwrap();
    assert_eq!(doc.text_content(el), "1");

    component.render();
    runtime.flush();
    assert_eq!(resumes.get(), 2);

    for _ in 0..5 {
        component.render();
    }
    runtime.flush();
    assert_eq!(resumes.get(), 2);

    // the in-flight render lands and exactly one more starts
    gate.notify_one();
    runtime.flush();
    assert_eq!(doc.text_content(el), "2");
    assert_eq!(resumes.get(), 3);

    gate.notify_one();
    runtime.flush();
    assert_eq!(doc.text_content(el), "3");
    assert_eq!(resumes.get(), 3);
    assert!(!runtime.has_pending_work());
}

#[test]
fn returned_views_settle() {
    let runtime = runtime();
    runtime
        .declare(
            "static-view",
            |_| once(ready(Ok(h("em").child(text("fixed")).into()))),
            DefaultProps::new(),
            ComponentOptions::new(),
        )
        .unwrap();

    let doc = runtime.document();
    let el = mount(&runtime, "static-view");
    assert_eq!(doc.inner_html(el), "<em>fixed</em>");

    let component = Component::from_element(doc, el).unwrap();
    assert_eq!(component.lifecycle(), Lifecycle::Settled);

    let before = doc.mutation_count();
    component.render();
    runtime.flush();
    assert_eq!(doc.mutation_count(), before);
    assert!(!runtime.has_pending_work());
}

#[test]
fn returning_nothing_keeps_the_last_view() {
    let runtime = runtime();
    runtime
        .declare(
            "short-stream",
            |_| from_stream(stream::iter([Ok(text("only"))])),
            DefaultProps::new(),
            ComponentOptions::new(),
        )
        .unwrap();

    let doc = runtime.document();
    let el = mount(&runtime, "short-stream");
    let component = Component::from_element(doc, el).unwrap();
    assert_eq!(component.lifecycle(), Lifecycle::Running);

    component.render();
    runtime.flush();
    assert_eq!(component.lifecycle(), Lifecycle::Settled);
    assert_eq!(doc.inner_html(el), "only");
}

#[test]
fn first_render_errors_reach_the_connecting_call() {
    let runtime = runtime();
    runtime
        .declare(
            "broken",
            |_| from_fn(|| ready(Err(RenderError::msg("no data")))),
            DefaultProps::new(),
            ComponentOptions::new(),
        )
        .unwrap();

    let doc = runtime.document();
    let el = doc.create_element("x-broken");
    let err = doc.append_child(doc.body(), el).unwrap_err();

    let DomError::Callback { element, source } = &err else {
        panic!("expected a callback error, got {err:?}");
    };
    assert_eq!(element, "x-broken");
    let connect = source.downcast_ref::<ConnectError>().unwrap();
    assert_eq!(connect.component, "x-broken");
    assert_eq!(connect.error.to_string(), "Render aborted: no data");

    assert_eq!(doc.inner_html(el), "");
    assert_eq!(Component::from_element(doc, el).unwrap().lifecycle(), Lifecycle::Finalized);
}

#[test]
fn later_errors_keep_the_last_view() {
    let runtime = runtime();
    runtime
        .declare(
            "flaky",
            |_| {
                let mut attempt = 0;
                from_fn(move || {
                    attempt += 1;
                    ready(match attempt {
                        1 => Ok(Step::Yield(text("good"))),
                        _ => Err(RenderError::msg("gone bad")),
                    })
                })
            },
            DefaultProps::new(),
            ComponentOptions::new(),
        )
        .unwrap();

    let doc = runtime.document();
    let el = mount(&runtime, "x-flaky");
    let component = Component::from_element(doc, el).unwrap();

    component.render();
    runtime.flush();
    assert_eq!(doc.inner_html(el), "good");
    assert_eq!(component.lifecycle(), Lifecycle::Finalized);

    component.render();
    runtime.flush();
    assert_eq!(doc.inner_html(el), "good");
}

/// Empties the element named by the cell while it is being created, so a patch inserting it fails.
struct Saboteur;

impl CustomElement for Saboteur {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[test]
fn failed_commits_finalize_the_instance() {
    let runtime = runtime();
    let doc = runtime.document();
    let host = Rc::new(Cell::new(None::<NodeId>));

    let target = host.clone();
    doc.define(
        "x-saboteur",
        ElementDefinition::new(move |doc: &Document, _: NodeId| {
            if let Some(host) = target.get() {
                for child in doc.children(host) {
                    doc.remove(child).unwrap();
                }
            }
            Rc::new(Saboteur) as Rc<dyn CustomElement>
        }),
    )
    .unwrap();

    for (name, returns) in [("x-yields", false), ("x-returns", true)] {
        runtime
            .declare(
                name,
                move |_| {
                    let mut attempt = 0;
                    from_fn(move || {
                        attempt += 1;
                        let view: VNode = match attempt {
                            1 => text("before"),
                            _ => h("x-saboteur").into(),
                        };
                        ready(Ok(match (attempt, returns) {
                            (1, _) | (_, false) => Step::Yield(view),
                            _ => Step::Return(Some(view)),
                        }))
                    })
                },
                DefaultProps::new(),
                ComponentOptions::new(),
            )
            .unwrap();

        let el = mount(&runtime, name);
        assert_eq!(doc.inner_html(el), "before");
        host.set(Some(el));

        let component = Component::from_element(doc, el).unwrap();
        component.render();
        runtime.flush();

        assert_eq!(doc.inner_html(el), "", "{name}");
        assert_eq!(component.lifecycle(), Lifecycle::Finalized, "{name}");
        assert!(!runtime.has_pending_work(), "{name}");
    }
}

#[test]
fn callbacks_wrap_the_generator() {
    let runtime = runtime();
    let log = Log::default();

    let (factory_log, connected_log, disconnected_log) = (log.clone(), log.clone(), log.clone());
    runtime
        .declare(
            "logged",
            move |_| {
                factory_log.borrow_mut().push("factory".into());
                let cleanup_log = factory_log.clone();
                from_fn(|| ready(Ok(Step::Yield(text("x"))))).on_finalize(move || {
                    cleanup_log.borrow_mut().push("cleanup".into());
                    Ok(())
                })
            },
            DefaultProps::new(),
            ComponentOptions::new()
                .on_connected(move |c| connected_log.borrow_mut().push(format!("connected {}", c.name())))
                .on_disconnected(move |_| disconnected_log.borrow_mut().push("disconnected".into())),
        )
        .unwrap();

    let doc = runtime.document();
    let el = mount(&runtime, "x-logged");
    doc.remove(el).unwrap();
    // finalizing twice is harmless
    doc.destroy(el).unwrap();

    assert_eq!(
        *log.borrow(),
        ["factory", "connected x-logged", "disconnected", "cleanup"]
    );
}

#[test]
fn cleanup_errors_are_contained() {
    let runtime = runtime();
    runtime
        .declare(
            "bad-cleanup",
            |_| from_fn(|| ready(Ok(Step::Yield(text("x"))))).on_finalize(|| Err(RenderError::msg("leak"))),
            DefaultProps::new(),
            ComponentOptions::new(),
        )
        .unwrap();

    let doc = runtime.document();
    let el = mount(&runtime, "bad-cleanup");
    assert!(doc.remove(el).is_ok());
    assert_eq!(Component::from_element(doc, el).unwrap().lifecycle(), Lifecycle::Finalized);
}

#[test]
fn renders_finishing_after_disconnect_are_discarded() {
    let runtime = runtime();
    let gate = Rc::new(Notify::new());
    let cleaned = Rc::new(Cell::new(0));

    let (gated, counter) = (gate.clone(), cleaned.clone());
    runtime
        .declare(
            "late",
            move |_| {
                let gate = gated.clone();
                let cleaned = counter.clone();
                let mut renders = 0;
                from_fn(move || {
                    renders += 1;
                    let (gate, n) = (gate.clone(), renders);
                    async move {
                        if n > 1 {
                            gate.notified().await;
                        }
                        Ok(Step::Yield(text(format!("render {n}"))))
                    }
                })
                .on_finalize(move || {
                    cleaned.set(cleaned.get() + 1);
                    Ok(())
                })
            },
            DefaultProps::new(),
            ComponentOptions::new(),
        )
        .unwrap();

    let doc = runtime.document();
    let el = mount(&runtime, "x-late");
    let component = Component::from_element(doc, el).unwrap();
    component.render();
    runtime.flush();

    doc.remove(el).unwrap();
    // the generator is busy, it is finalized when it comes back
    assert_eq!(cleaned.get(), 0);

    gate.notify_one();
    runtime.flush();
    assert_eq!(cleaned.get(), 1);
    assert_eq!(doc.inner_html(el), "render 1");
    assert!(!runtime.has_pending_work());
}

#[test]
fn destroyed_elements_are_not_confused_with_new_nodes() {
    let runtime = runtime();
    let gate = Rc::new(Notify::new());
    let seen = Log::default();

    let (gated, log) = (gate.clone(), seen.clone());
    runtime
        .declare(
            "stale",
            move |component| {
                let (component, gate, log) = (component.clone(), gated.clone(), log.clone());
                let mut renders = 0;
                from_fn(move || {
                    renders += 1;
                    let (component, gate, log, n) = (component.clone(), gate.clone(), log.clone(), renders);
                    async move {
                        if n > 1 {
                            gate.notified().await;
                            let written = component.set_property("label", "leak");
                            log.borrow_mut().push(format!(
                                "connected={} element={:?} written={}",
                                component.is_connected(),
                                component.element(),
                                written.is_ok(),
                            ));
                        }
                        Ok(Step::Yield(text("view")))
                    }
                })
            },
            DefaultProps::new().prop("label", "none"),
            ComponentOptions::new(),
        )
        .unwrap();

    let doc = runtime.document();
    let el = mount(&runtime, "x-stale");
    Component::from_element(doc, el).unwrap().render();
    runtime.flush();

    doc.remove(el).unwrap();
    doc.destroy(el).unwrap();

    // the freed ids are handed out again
    let fresh: Vec<_> = (0..4)
        .map(|_| {
            let node = doc.create_element("div");
            doc.append_child(doc.body(), node).unwrap();
            node
        })
        .collect();
    assert!(fresh.contains(&el));

    gate.notify_one();
    runtime.flush();

    assert_eq!(*seen.borrow(), ["connected=false element=None written=false"]);
    for node in fresh {
        assert_eq!(doc.attribute(node, "label"), None);
    }
    assert_eq!(doc.inner_html(doc.body()), "<div></div>".repeat(4));
    assert!(!runtime.has_pending_work());
}

#[test]
fn children_connect_after_the_parent_commits() {
    let runtime = runtime();
    let log = Log::default();

    let parent_log = log.clone();
    runtime
        .declare(
            "parent",
            move |component| {
                let (component, log) = (component.clone(), parent_log.clone());
                let mut renders = 0;
                from_fn(move || {
                    renders += 1;
                    log.borrow_mut().push(format!("parent {renders}"));
                    let label = component.property("label").map(|p| p.to_string()).unwrap_or_default();
                    ready(Ok(Step::Yield(
                        h("section")
                            .child(h("h1").child(text(label)))
                            .child(h("x-child"))
                            .into(),
                    )))
                })
            },
            DefaultProps::new().prop("label", "title"),
            ComponentOptions::new(),
        )
        .unwrap();

    let child_log = log.clone();
    runtime
        .declare(
            "child",
            move |component| {
                let (component, log) = (component.clone(), child_log.clone());
                from_fn(move || {
                    let document = component.document().unwrap();
                    let parent = document.elements_by_tag(document.body(), "x-parent")[0];
                    log.borrow_mut()
                        .push(format!("child sees {}", document.text_content(parent)));
                    ready(Ok(Step::Yield(h("span").child(text("child")).into())))
                })
            },
            DefaultProps::new(),
            ComponentOptions::new(),
        )
        .unwrap();

    let doc = runtime.document();
    let parent = mount(&runtime, "x-parent");
    assert_eq!(*log.borrow(), ["parent 1", "child sees title"]);

    // re-rendering the parent leaves the child's own content alone
    let component = Component::from_element(doc, parent).unwrap();
    component.set_property("label", "renamed").unwrap();
    component.render();
    runtime.flush();

    assert_eq!(
        doc.inner_html(parent),
        "<section><h1>renamed</h1><x-child><span>child</span></x-child></section>"
    );
    assert_eq!(log.borrow().len(), 3);
}
