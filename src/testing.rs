//! In-memory Garden used by unit and integration tests.

use garden_client::{ClientError, Container, ContainerSpec, Handle, LifecycleClient, Properties};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// A [`LifecycleClient`] that keeps containers in memory and counts calls.
#[derive(Default)]
pub struct FakeGarden {
    live: Mutex<Vec<Handle>>,
    specs: Mutex<Vec<ContainerSpec>>,
    next_id: AtomicUsize,
    create_calls: AtomicUsize,
    destroy_calls: AtomicUsize,
    list_calls: AtomicUsize,
    creates_in_flight: AtomicUsize,
    lists_during_create: AtomicUsize,
    fail_create_at: Mutex<Option<usize>>,
    fail_destroy: Mutex<HashSet<Handle>>,
    fail_list: AtomicBool,
    latency: Duration,
}

impl FakeGarden {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every operation sleeps for `latency` before answering.
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            ..Self::default()
        }
    }

    /// Add `count` containers without going through `create`.
    pub fn seed(&self, count: usize) -> Vec<Handle> {
        let handles: Vec<Handle> = (0..count).map(|_| self.next_handle()).collect();
        self.live.lock().unwrap().extend(handles.iter().cloned());
        handles
    }

    /// Make the `n`th create call (1-based) and every later one fail.
    pub fn fail_create_from(&self, n: usize) {
        *self.fail_create_at.lock().unwrap() = Some(n);
    }

    pub fn fail_destroy_of(&self, handle: Handle) {
        self.fail_destroy.lock().unwrap().insert(handle);
    }

    pub fn fail_list(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    pub fn live_count(&self) -> usize {
        self.live.lock().unwrap().len()
    }

    pub fn is_live(&self, handle: &Handle) -> bool {
        self.live.lock().unwrap().contains(handle)
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn destroy_calls(&self) -> usize {
        self.destroy_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Number of list calls that ran while a create was still in flight.
    pub fn lists_during_create(&self) -> usize {
        self.lists_during_create.load(Ordering::SeqCst)
    }

    pub fn created_specs(&self) -> Vec<ContainerSpec> {
        self.specs.lock().unwrap().clone()
    }

    fn next_handle(&self) -> Handle {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        Handle::new(format!("container-{id:05}"))
    }

    async fn respond(&self) {
        if self.latency.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait::async_trait]
impl LifecycleClient for FakeGarden {
    async fn create(&self, spec: &ContainerSpec) -> Result<Handle, ClientError> {
        let call = self.create_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.creates_in_flight.fetch_add(1, Ordering::SeqCst);
        self.respond().await;
        self.creates_in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(n) = *self.fail_create_at.lock().unwrap() {
            if call >= n {
                return Err(ClientError::Operation("insufficient disk".to_string()));
            }
        }

        self.specs.lock().unwrap().push(spec.clone());
        let handle = self.next_handle();
        self.live.lock().unwrap().push(handle.clone());
        Ok(handle)
    }

    async fn destroy(&self, handle: &Handle) -> Result<(), ClientError> {
        self.destroy_calls.fetch_add(1, Ordering::SeqCst);
        self.respond().await;

        if self.fail_destroy.lock().unwrap().contains(handle) {
            return Err(ClientError::Operation(format!("cannot destroy {handle}")));
        }

        let mut live = self.live.lock().unwrap();
        match live.iter().position(|h| h == handle) {
            Some(pos) => {
                live.remove(pos);
                Ok(())
            }
            None => Err(ClientError::Status {
                status: 404,
                body: format!("unknown handle: {handle}"),
            }),
        }
    }

    async fn containers(&self, _filter: &Properties) -> Result<Vec<Container>, ClientError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.creates_in_flight.load(Ordering::SeqCst) > 0 {
            self.lists_during_create.fetch_add(1, Ordering::SeqCst);
        }
        self.respond().await;
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(ClientError::Operation("list unavailable".to_string()));
        }

        Ok(self
            .live
            .lock()
            .unwrap()
            .iter()
            .cloned()
            .map(Container::new)
            .collect())
    }
}
