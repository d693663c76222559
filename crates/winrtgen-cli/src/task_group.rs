//! Work dispatcher for per-namespace emission
//!
//! Tasks are independent: each writes to its own output paths and inserts at
//! its own key of the shared dependency map. `get` is the single barrier
//! between emission and planning; it drains every task and surfaces the
//! first error observed, letting the remaining workers finish their current
//! work.

use std::sync::Mutex;

use anyhow::Result;

type Task<'a> = Box<dyn FnOnce() -> Result<()> + Send + 'a>;

pub struct TaskGroup<'a> {
    synchronous: bool,
    tasks: Vec<Task<'a>>,
}

impl<'a> TaskGroup<'a> {
    /// `synchronous` forces inline, single-threaded execution for batch
    /// builds that cannot tolerate concurrent filesystem writes.
    pub fn new(synchronous: bool) -> Self {
        Self {
            synchronous,
            tasks: Vec::new(),
        }
    }

    pub fn add(&mut self, task: impl FnOnce() -> Result<()> + Send + 'a) {
        self.tasks.push(Box::new(task));
    }

    /// Run every submitted task and block until all complete.
    pub fn get(self) -> Result<()> {
        if self.synchronous {
            let mut first_error = None;
            for task in self.tasks {
                if let Err(error) = task() {
                    first_error.get_or_insert(error);
                }
            }
            return match first_error {
                Some(error) => Err(error),
                None => Ok(()),
            };
        }

        let errors = Mutex::new(Vec::new());
        rayon::scope(|scope| {
            for task in self.tasks {
                let errors = &errors;
                scope.spawn(move |_| {
                    if let Err(error) = task() {
                        errors.lock().unwrap().push(error);
                    }
                });
            }
        });

        match errors.into_inner().unwrap().into_iter().next() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_all_tasks_run_in_parallel_mode() {
        let counter = AtomicUsize::new(0);
        let mut group = TaskGroup::new(false);
        for _ in 0..16 {
            group.add(|| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }
        group.get().unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 16);
    }

    #[test]
    fn test_synchronous_runs_in_submission_order() {
        let order = Mutex::new(Vec::new());
        let mut group = TaskGroup::new(true);
        for index in 0..8 {
            let order = &order;
            group.add(move || {
                order.lock().unwrap().push(index);
                Ok(())
            });
        }
        group.get().unwrap();
        assert_eq!(*order.lock().unwrap(), (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn test_error_propagates_after_all_tasks_drain() {
        let counter = AtomicUsize::new(0);
        let mut group = TaskGroup::new(true);
        group.add(|| {
            counter.fetch_add(1, Ordering::SeqCst);
            anyhow::bail!("first failure")
        });
        group.add(|| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let error = group.get().unwrap_err();
        assert_eq!(error.to_string(), "first failure");
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_parallel_error_propagates() {
        let mut group = TaskGroup::new(false);
        group.add(|| Ok(()));
        group.add(|| anyhow::bail!("worker failure"));
        assert!(group.get().is_err());
    }
}
