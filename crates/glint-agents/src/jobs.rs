// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Background job execution.

use crossbeam_channel::{Receiver, Sender};
use std::panic::{self, AssertUnwindSafe};
use std::thread;

/// A unit of background work.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Runs jobs off the calling thread.
pub trait JobRunner: Send + Sync {
    /// Queues `job` for execution.
    fn submit(&self, job: Job);
}

/// A fixed-size pool of named worker threads fed by a shared channel.
///
/// A panicking job is logged and does not take its worker down. Dropping the
/// pool lets queued jobs finish, then joins every worker.
pub struct WorkerPool {
    sender: Option<Sender<Job>>,
    workers: Vec<thread::JoinHandle<()>>,
}

impl WorkerPool {
    /// Starts `size` workers (at least one).
    pub fn new(size: usize) -> std::io::Result<Self> {
        let (sender, receiver) = crossbeam_channel::unbounded::<Job>();
        let mut workers = Vec::with_capacity(size.max(1));
        for index in 0..size.max(1) {
            let receiver = receiver.clone();
            let handle = thread::Builder::new()
                .name(format!("glint-loader-{index}"))
                .spawn(move || worker_loop(receiver))?;
            workers.push(handle);
        }
        log::debug!("Started {} asset loader threads", workers.len());
        Ok(Self {
            sender: Some(sender),
            workers,
        })
    }

    /// The number of worker threads.
    pub fn size(&self) -> usize {
        self.workers.len()
    }
}

fn worker_loop(receiver: Receiver<Job>) {
    while let Ok(job) = receiver.recv() {
        if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
            log::error!(
                "A background job panicked on thread '{}'",
                thread::current().name().unwrap_or("unnamed")
            );
        }
    }
}

impl JobRunner for WorkerPool {
    fn submit(&self, job: Job) {
        let Some(sender) = &self.sender else {
            log::error!("Job submitted to a stopped worker pool");
            return;
        };
        if let Err(e) = sender.send(job) {
            log::error!("Failed to queue background job: {e}");
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.sender.take();
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                log::error!("An asset loader thread terminated abnormally");
            }
        }
    }
}

/// Runs every job immediately on the submitting thread.
///
/// Makes background loading deterministic in tests and tools.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineJobRunner;

impl JobRunner for InlineJobRunner {
    fn submit(&self, job: Job) {
        job();
    }
}
