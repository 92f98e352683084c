use futures_channel::mpsc::{UnboundedReceiver, UnboundedSender};
use futures_util::{stream::StreamExt, task::ArcWake};
use slab::Slab;
use std::future::Future;
use std::sync::Arc;
use std::task::Waker;
use std::{cell::RefCell, rc::Rc};
use std::{pin::Pin, task::Poll};

/// A task's unique identifier.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub(crate) struct Task(pub(crate) usize);

/// A single-threaded executor for component work.
///
/// Every render after the first runs as a task. Tasks are woken through channel messages, so a waker can fire
/// from anywhere (a timer, another task, an event handler) and the work is picked up by the next [`flush`] or
/// [`wait_for_work`].
///
/// [`flush`]: Scheduler::flush
/// [`wait_for_work`]: Scheduler::wait_for_work
pub(crate) struct Scheduler {
    tasks: RefCell<Slab<Rc<LocalTask>>>,
    sender: UnboundedSender<SchedulerMsg>,
    receiver: RefCell<UnboundedReceiver<SchedulerMsg>>,
}

/// the task itself is the waker
pub(crate) struct LocalTask {
    task: RefCell<Pin<Box<dyn Future<Output = ()> + 'static>>>,
    waker: Waker,
}

/// The type of message that can be sent to the scheduler.
#[derive(Debug)]
pub(crate) enum SchedulerMsg {
    /// A task has woken and needs to be progressed
    TaskNotified(Task),
}

struct LocalTaskHandle {
    id: Task,
    tx: UnboundedSender<SchedulerMsg>,
}

impl ArcWake for LocalTaskHandle {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        _ = arc_self
            .tx
            .unbounded_send(SchedulerMsg::TaskNotified(arc_self.id));
    }
}

impl Scheduler {
    pub(crate) fn new() -> Rc<Self> {
        let (sender, receiver) = futures_channel::mpsc::unbounded();
        Rc::new(Self {
            tasks: RefCell::new(Slab::new()),
            sender,
            receiver: RefCell::new(receiver),
        })
    }

    /// Queue a future. It is first polled on the next turn of the scheduler.
    pub(crate) fn spawn(&self, task: impl Future<Output = ()> + 'static) -> Task {
        let id = self.insert(task);
        _ = self.sender.unbounded_send(SchedulerMsg::TaskNotified(id));
        id
    }

    /// Poll a future right away. It is only kept if it doesn't finish on that first poll.
    pub(crate) fn spawn_eager(&self, task: impl Future<Output = ()> + 'static) -> Option<Task> {
        let id = self.insert(task);
        match self.handle_task_wakeup(id) {
            Poll::Ready(()) => None,
            Poll::Pending => Some(id),
        }
    }

    fn insert(&self, task: impl Future<Output = ()> + 'static) -> Task {
        let mut tasks = self.tasks.borrow_mut();

        let entry = tasks.vacant_entry();
        let id = Task(entry.key());

        entry.insert(Rc::new(LocalTask {
            task: RefCell::new(Box::pin(task)),
            waker: futures_util::task::waker(Arc::new(LocalTaskHandle {
                id,
                tx: self.sender.clone(),
            })),
        }));

        id
    }

    pub(crate) fn handle_task_wakeup(&self, id: Task) -> Poll<()> {
        let task = self.tasks.borrow().get(id.0).cloned();

        // The task was removed from the scheduler, so we can just ignore it
        let Some(task) = task else {
            return Poll::Ready(());
        };

        // A task that wakes itself while being polled is already queued again
        let Ok(mut future) = task.task.try_borrow_mut() else {
            return Poll::Pending;
        };

        let mut cx = std::task::Context::from_waker(&task.waker);
        let poll_result = future.as_mut().poll(&mut cx);
        drop(future);

        if poll_result.is_ready() {
            self.tasks.borrow_mut().try_remove(id.0);
        }

        poll_result
    }

    /// Poll every task that has been woken, including tasks woken while flushing.
    pub(crate) fn flush(&self) {
        loop {
            let msg = self.receiver.borrow_mut().try_recv();
            match msg {
                Ok(SchedulerMsg::TaskNotified(id)) => {
                    tracing::trace!("polling {id:?}");
                    _ = self.handle_task_wakeup(id);
                }
                // empty, or closed once every sender is gone
                Err(_) => break,
            }
        }
    }

    /// Wait until some task is woken, then flush.
    pub(crate) async fn wait_for_work(&self) {
        let msg = futures_util::future::poll_fn(|cx| self.receiver.borrow_mut().poll_next_unpin(cx)).await;
        if let Some(SchedulerMsg::TaskNotified(id)) = msg {
            _ = self.handle_task_wakeup(id);
        }
        self.flush();
    }

    pub(crate) fn has_pending_tasks(&self) -> bool {
        !self.tasks.borrow().is_empty()
    }
}
