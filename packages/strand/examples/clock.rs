//! A component that waits on a timer between views, driven by a tokio runtime.
//!
//! Run with `STRAND_LOG=strand_core=debug cargo run --example clock`.

use std::{cell::Cell, rc::Rc, time::Duration};

use strand::prelude::*;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    strand::logger::init_from_env().expect("failed to init logger");

    let runtime = Runtime::new(Config::default());
    let _guard = RuntimeGuard::new(runtime.clone());

    declare_component(
        "clock",
        |component| {
            let component = component.clone();
            let ticks = Rc::new(Cell::new(0u32));
            from_fn(move || {
                let (component, ticks) = (component.clone(), ticks.clone());
                async move {
                    let limit = component.property("ticks").and_then(|p| p.as_number()).unwrap_or(3.0);
                    let tick = ticks.get();
                    if f64::from(tick) >= limit {
                        return Ok(Step::Return(Some(h("p").child(text("done")).into())));
                    }
                    if tick > 0 {
                        tokio::time::sleep(Duration::from_millis(100)).await;
                    }
                    ticks.set(tick + 1);
                    component.render();
                    Ok(Step::Yield(h("p").child(text(format!("tick {tick}"))).into()))
                }
            })
            .on_finalize(|| {
                println!("clock stopped");
                Ok(())
            })
        },
        DefaultProps::new().prop("ticks", 3),
        ComponentOptions::new().on_connected(|c| println!("<{}> connected", c.name())),
    )
    .expect("failed to declare <x-clock>");

    let doc = runtime.document();
    let clock = doc.create_element("x-clock");
    doc.set_attribute(clock, "ticks", "5").expect("clock is an element");
    doc.append_child(doc.body(), clock).expect("clock failed to connect");
    println!("{}", doc.outer_html(clock));

    while runtime.has_pending_work() {
        runtime.wait_for_work().await;
        println!("{}", doc.outer_html(clock));
    }
}
