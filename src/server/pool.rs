//! # Pool de Workers
//! src/server/pool.rs
//!
//! Conjunto fijo de threads (`worker-0`, `worker-1`, ...) que consumen
//! trabajos de un canal compartido. El pool no limita la concurrencia por
//! sí mismo; eso lo hace el semáforo de admisión.

use std::io;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Sender};
use tracing::debug;

/// Pool de tamaño fijo que aplica el mismo handler a cada trabajo
pub struct WorkerPool<T: Send + 'static> {
    sender: Option<Sender<T>>,
    workers: Vec<JoinHandle<()>>,
}

impl<T: Send + 'static> WorkerPool<T> {
    /// Lanza `size` workers que ejecutan `handler` por cada trabajo recibido
    pub fn new<F>(size: usize, handler: F) -> io::Result<Self>
    where
        F: Fn(T) + Clone + Send + 'static,
    {
        let (sender, receiver) = bounded::<T>(size.max(1));
        let mut workers = Vec::with_capacity(size);

        for id in 0..size {
            let receiver = receiver.clone();
            let handler = handler.clone();

            let worker = thread::Builder::new()
                .name(format!("worker-{}", id))
                .spawn(move || {
                    debug!(worker = id, "Worker iniciado");
                    for job in receiver.iter() {
                        handler(job);
                    }
                    debug!(worker = id, "Worker terminado");
                })?;
            workers.push(worker);
        }

        Ok(Self {
            sender: Some(sender),
            workers,
        })
    }

    /// Encola un trabajo; lo devuelve si ya no quedan workers
    pub fn execute(&self, job: T) -> Result<(), T> {
        match &self.sender {
            Some(sender) => sender.send(job).map_err(|e| e.into_inner()),
            None => Err(job),
        }
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }
}

impl<T: Send + 'static> Drop for WorkerPool<T> {
    /// Cierra el canal y espera a que los workers vacíen lo pendiente
    fn drop(&mut self) {
        self.sender.take();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}
