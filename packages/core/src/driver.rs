//! Drives a component's generator.
//!
//! ```text
//!   Unstarted --start--> Running --return--> Settled
//!                          |  ^
//!                    yield |  | render()
//!                          v  |
//!                        Running --raise / disconnect--> Finalized --start--> Running
//! ```
//!
//! At most one advance runs per instance. A render request while an advance is queued is absorbed by it, and
//! any number of requests while one is running turn into exactly one more advance after it. Every connection
//! gets a new epoch, so an advance that finishes after its element disconnected finalizes its generator and
//! throws the view away. A view that fails to commit finalizes the instance, whether it was yielded or returned.

use std::{cell::RefCell, rc::Rc};

use strand_dom::{DomError, VNode};

use crate::{
    instance::{InstanceInner, Lifecycle, RenderSlot},
    RenderError, Step,
};

/// The result of the first advance, handed back to `start` if it finishes synchronously.
enum FirstRender {
    Waiting,
    Finished(Result<(), RenderError>),
    Detached,
}

impl InstanceInner {
    /// Create a fresh generator, advance it once and commit what it produces.
    ///
    /// If the first advance completes synchronously its error is returned. If it suspends, the view is committed
    /// once it completes and a failure is logged.
    pub(crate) fn start(self: &Rc<Self>) -> Result<(), RenderError> {
        let scheduler = self.scheduler.upgrade().ok_or(RenderError::NoRuntime)?;

        let stale = {
            let mut driver = self.driver.borrow_mut();
            driver.epoch += 1;
            driver.lifecycle = Lifecycle::Running;
            driver.slot = RenderSlot::InFlight { trailing: false };
            driver.generator.take()
        };
        if let Some(mut stale) = stale {
            if let Err(err) = stale.finalize() {
                tracing::error!("<{}> failed to clean up: {err}", self.name());
            }
        }

        let epoch = self.driver.borrow().epoch;
        tracing::debug!("<{}> starting generator (epoch {epoch})", self.name());

        let generator = (self.definition.factory)(&self.handle());
        {
            let mut driver = self.driver.borrow_mut();
            if driver.epoch != epoch {
                // The factory disconnected the element.
                drop(driver);
                let mut generator = generator;
                return generator.finalize();
            }
            driver.generator = Some(generator);
        }

        let first = Rc::new(RefCell::new(FirstRender::Waiting));
        let task = {
            let instance = self.clone();
            let first = first.clone();
            async move {
                let result = instance.clone().advance(epoch).await;
                let mut first = first.borrow_mut();
                match *first {
                    FirstRender::Waiting => *first = FirstRender::Finished(result),
                    _ => {
                        if let Err(err) = result {
                            tracing::error!("<{}> failed to render: {err}", instance.name());
                        }
                    }
                }
            }
        };
        scheduler.spawn_eager(task);

        let outcome = std::mem::replace(&mut *first.borrow_mut(), FirstRender::Detached);
        match outcome {
            FirstRender::Finished(result) => result,
            _ => Ok(()),
        }
    }

    /// Request a render.
    pub(crate) fn request_render(self: &Rc<Self>) {
        let epoch = {
            let mut driver = self.driver.borrow_mut();
            if driver.lifecycle != Lifecycle::Running {
                tracing::trace!("<{}> is {:?}, ignoring render request", self.name(), driver.lifecycle);
                return;
            }
            match driver.slot {
                RenderSlot::Idle => driver.slot = RenderSlot::Scheduled,
                RenderSlot::Scheduled => return,
                RenderSlot::InFlight { .. } => {
                    tracing::trace!("<{}> render in flight, coalescing", self.name());
                    driver.slot = RenderSlot::InFlight { trailing: true };
                    return;
                }
            }
            driver.epoch
        };

        self.schedule(epoch);
    }

    fn schedule(self: &Rc<Self>, epoch: u64) {
        let Some(scheduler) = self.scheduler.upgrade() else {
            self.driver.borrow_mut().slot = RenderSlot::Idle;
            return;
        };

        let instance = self.clone();
        scheduler.spawn(async move {
            {
                let mut driver = instance.driver.borrow_mut();
                if driver.epoch != epoch {
                    return;
                }
                driver.slot = RenderSlot::InFlight { trailing: false };
            }
            if let Err(err) = instance.clone().advance(epoch).await {
                tracing::error!("<{}> failed to render, keeping its last view: {err}", instance.name());
            }
        });
    }

    /// Resume the generator once and commit the step it produced.
    async fn advance(self: Rc<Self>, epoch: u64) -> Result<(), RenderError> {
        let generator = {
            let mut driver = self.driver.borrow_mut();
            match driver.lifecycle {
                Lifecycle::Running if driver.epoch == epoch => driver.generator.take(),
                _ => None,
            }
        };
        let Some(mut generator) = generator else {
            let mut driver = self.driver.borrow_mut();
            if driver.epoch == epoch {
                driver.slot = RenderSlot::Idle;
            }
            return Ok(());
        };

        let step = generator.resume().await;

        let current = {
            let driver = self.driver.borrow();
            driver.epoch == epoch && driver.lifecycle == Lifecycle::Running
        };
        if !current {
            tracing::debug!("<{}> disconnected during a render, discarding it", self.name());
            if let Err(err) = generator.finalize() {
                tracing::error!("<{}> failed to clean up: {err}", self.name());
            }
            return Ok(());
        }

        match step {
            Ok(Step::Yield(view)) => {
                self.driver.borrow_mut().generator = Some(generator);
                if let Err(err) = self.commit(&view) {
                    self.fail(epoch);
                    return Err(err);
                }
                self.finish_render(epoch);
                Ok(())
            }
            Ok(Step::Return(view)) => {
                tracing::debug!("<{}> settled", self.name());
                self.settle(epoch, Lifecycle::Settled, generator);
                let Some(view) = view else {
                    return Ok(());
                };
                if let Err(err) = self.commit(&view) {
                    self.fail(epoch);
                    return Err(err);
                }
                Ok(())
            }
            Err(err) => {
                self.settle(epoch, Lifecycle::Finalized, generator);
                Err(err)
            }
        }
    }

    /// Run the trailing render requested during the advance that just finished, if any.
    fn finish_render(self: &Rc<Self>, epoch: u64) {
        let rerun = {
            let mut driver = self.driver.borrow_mut();
            if driver.epoch != epoch {
                return;
            }
            let rerun = matches!(driver.slot, RenderSlot::InFlight { trailing: true })
                && driver.lifecycle == Lifecycle::Running;
            driver.slot = if rerun {
                RenderSlot::Scheduled
            } else {
                RenderSlot::Idle
            };
            rerun
        };

        if rerun {
            self.schedule(epoch);
        }
    }

    /// End the generator after it returned or raised.
    fn settle(&self, epoch: u64, lifecycle: Lifecycle, mut generator: Box<dyn crate::Generator>) {
        {
            let mut driver = self.driver.borrow_mut();
            if driver.epoch == epoch {
                driver.lifecycle = lifecycle;
                driver.slot = RenderSlot::Idle;
            }
        }
        if let Err(err) = generator.finalize() {
            tracing::error!("<{}> failed to clean up: {err}", self.name());
        }
    }

    /// A commit failed: take the generator out of service. After a return the generator is already finalized and
    /// only the lifecycle changes.
    fn fail(&self, epoch: u64) {
        let generator = {
            let mut driver = self.driver.borrow_mut();
            if driver.epoch != epoch {
                return;
            }
            driver.lifecycle = Lifecycle::Finalized;
            driver.slot = RenderSlot::Idle;
            driver.generator.take()
        };
        if let Some(generator) = generator {
            self.settle(epoch, Lifecycle::Finalized, generator);
        }
    }

    /// Finalize the generator of this connection. Does nothing if there is none.
    pub(crate) fn finalize(&self) {
        let generator = {
            let mut driver = self.driver.borrow_mut();
            if !matches!(driver.lifecycle, Lifecycle::Running | Lifecycle::Settled) {
                return;
            }
            driver.lifecycle = Lifecycle::Finalized;
            driver.epoch += 1;
            driver.slot = RenderSlot::Idle;
            driver.generator.take()
        };

        tracing::debug!("<{}> finalized", self.name());

        // A generator that is mid-advance is finalized by that advance when it comes back.
        if let Some(mut generator) = generator {
            if let Err(err) = generator.finalize() {
                tracing::error!("<{}> failed to clean up: {err}", self.name());
            }
        }
    }

    /// Reconcile the render root with a view.
    ///
    /// Committing into an element that is no longer in the document does nothing. Child components that fail to
    /// connect are logged; they don't fail the parent's render.
    pub(crate) fn commit(&self, view: &VNode) -> Result<(), RenderError> {
        let Some(document) = self.document() else {
            return Ok(());
        };
        if !document.is_connected(self.element) {
            tracing::trace!("<{}> is not connected, skipping commit", self.name());
            return Ok(());
        }

        match strand_dom::patch(&document, self.render_root, view) {
            Ok(()) => Ok(()),
            Err(err @ DomError::Callback { .. }) => {
                tracing::error!("<{}> committed, but a child failed: {err}", self.name());
                Ok(())
            }
            Err(err) => Err(RenderError::Commit(err)),
        }
    }
}
