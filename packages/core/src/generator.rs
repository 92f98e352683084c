//! The render procedures components are built from.
//!
//! A component is a [`Generator`]: something that can be resumed to produce its next view, and finalized when
//! the component leaves the document. Each resume either yields a view and stays alive, or returns, which ends
//! the generator. The adapters in this module cover the usual shapes:
//!
//! - [`from_fn`]: a closure called once per resume, with whatever state it captures;
//! - [`from_stream`]: a stream of views, where the end of the stream returns;
//! - [`once`]: a static component computing a single view;
//! - [`Generator::on_finalize`]: teardown code that runs after the main loop.

use std::future::Future;

use futures_util::{
    future::LocalBoxFuture,
    stream::{LocalBoxStream, Stream, StreamExt},
    FutureExt,
};
use strand_dom::VNode;

use crate::RenderError;

/// The outcome of resuming a generator.
#[derive(Debug)]
pub enum Step {
    /// A view to commit. The generator stays alive and is resumed on the next render request.
    Yield(VNode),

    /// The generator is finished. A view, if any, is committed once; otherwise the last view stays.
    Return(Option<VNode>),
}

/// A resumable render procedure.
///
/// The driver never resumes a generator while a previous resume is still running.
pub trait Generator: 'static {
    /// Run until the next view is available.
    fn resume(&mut self) -> LocalBoxFuture<'_, Result<Step, RenderError>>;

    /// Run teardown code. Called exactly once, when the generator returns, raises or is abandoned.
    fn finalize(&mut self) -> Result<(), RenderError> {
        Ok(())
    }

    /// Run `cleanup` when the generator is finalized.
    fn on_finalize<F>(self, cleanup: F) -> OnFinalize<Self, F>
    where
        Self: Sized,
        F: FnOnce() -> Result<(), RenderError> + 'static,
    {
        OnFinalize {
            inner: self,
            cleanup: Some(cleanup),
        }
    }
}

impl<G: Generator + ?Sized> Generator for Box<G> {
    fn resume(&mut self) -> LocalBoxFuture<'_, Result<Step, RenderError>> {
        (**self).resume()
    }

    fn finalize(&mut self) -> Result<(), RenderError> {
        (**self).finalize()
    }
}

/// Build a generator from a closure that produces each step.
///
/// ```rust
/// use std::{cell::Cell, rc::Rc};
/// use strand_core::{from_fn, Step};
/// use strand_dom::text;
///
/// let count = Rc::new(Cell::new(0));
/// let generator = from_fn(move || {
///     let count = count.clone();
///     async move { Ok(Step::Yield(text(count.get().to_string()))) }
/// });
/// ```
pub fn from_fn<F, Fut>(f: F) -> FromFn<F>
where
    F: FnMut() -> Fut + 'static,
    Fut: Future<Output = Result<Step, RenderError>> + 'static,
{
    FromFn { f }
}

pub struct FromFn<F> {
    f: F,
}

impl<F, Fut> Generator for FromFn<F>
where
    F: FnMut() -> Fut + 'static,
    Fut: Future<Output = Result<Step, RenderError>> + 'static,
{
    fn resume(&mut self) -> LocalBoxFuture<'_, Result<Step, RenderError>> {
        (self.f)().boxed_local()
    }
}

/// Build a generator from a stream of views. The end of the stream returns without a view.
pub fn from_stream<S>(stream: S) -> FromStream
where
    S: Stream<Item = Result<VNode, RenderError>> + 'static,
{
    FromStream {
        stream: stream.boxed_local(),
    }
}

pub struct FromStream {
    stream: LocalBoxStream<'static, Result<VNode, RenderError>>,
}

impl Generator for FromStream {
    fn resume(&mut self) -> LocalBoxFuture<'_, Result<Step, RenderError>> {
        async move {
            match self.stream.next().await {
                Some(Ok(view)) => Ok(Step::Yield(view)),
                Some(Err(err)) => Err(err),
                None => Ok(Step::Return(None)),
            }
        }
        .boxed_local()
    }
}

/// A static component: computes one view and returns it.
pub fn once<Fut>(view: Fut) -> Once
where
    Fut: Future<Output = Result<VNode, RenderError>> + 'static,
{
    Once {
        view: Some(view.boxed_local()),
    }
}

pub struct Once {
    view: Option<LocalBoxFuture<'static, Result<VNode, RenderError>>>,
}

impl Generator for Once {
    fn resume(&mut self) -> LocalBoxFuture<'_, Result<Step, RenderError>> {
        async move {
            match self.view.take() {
                Some(view) => Ok(Step::Return(Some(view.await?))),
                None => Ok(Step::Return(None)),
            }
        }
        .boxed_local()
    }
}

/// See [`Generator::on_finalize`].
pub struct OnFinalize<G, F> {
    inner: G,
    cleanup: Option<F>,
}

impl<G, F> Generator for OnFinalize<G, F>
where
    G: Generator,
    F: FnOnce() -> Result<(), RenderError> + 'static,
{
    fn resume(&mut self) -> LocalBoxFuture<'_, Result<Step, RenderError>> {
        self.inner.resume()
    }

    fn finalize(&mut self) -> Result<(), RenderError> {
        let inner = self.inner.finalize();
        if let Some(cleanup) = self.cleanup.take() {
            cleanup()?;
        }
        inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::{future::ready, stream};
    use std::{cell::Cell, rc::Rc};
    use strand_dom::text;

    fn step<G: Generator>(generator: &mut G) -> Result<Step, RenderError> {
        futures_util::FutureExt::now_or_never(generator.resume()).expect("generator should be ready")
    }

    #[test]
    fn streams_return_when_exhausted() {
        let mut generator = from_stream(stream::iter([Ok(text("a")), Ok(text("b"))]));

        assert!(matches!(step(&mut generator), Ok(Step::Yield(v)) if v.as_text() == Some("a")));
        assert!(matches!(step(&mut generator), Ok(Step::Yield(v)) if v.as_text() == Some("b")));
        assert!(matches!(step(&mut generator), Ok(Step::Return(None))));
    }

    #[test]
    fn once_returns_its_view_then_nothing() {
        let mut generator = once(ready(Ok(text("static"))));

        assert!(matches!(step(&mut generator), Ok(Step::Return(Some(v))) if v.as_text() == Some("static")));
        assert!(matches!(step(&mut generator), Ok(Step::Return(None))));
    }

    #[test]
    fn cleanup_runs_once() {
        let cleaned = Rc::new(Cell::new(0));
        let counter = cleaned.clone();
        let mut generator = from_fn(|| ready(Ok(Step::Yield(VNode::empty())))).on_finalize(move || {
            counter.set(counter.get() + 1);
            Ok(())
        });

        assert!(step(&mut generator).is_ok());
        generator.finalize().unwrap();
        generator.finalize().unwrap();
        assert_eq!(cleaned.get(), 1);
    }
}
