//! Shared test doubles for loader integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use omni_loader::{
    CoordinationHandle, CoordinationThread, EngineJob, EngineJobFactory, EngineJobListener,
    EngineResource, Executor, JobKey, JobReporter, Resource, ResourceCallback, Task, TaskHandle,
    WorkUnit,
};
use tracing_subscriber::EnvFilter;

pub type TestJob = EngineJob<TestResource>;

pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("omni_loader=warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

// ============================================================================
// Resources
// ============================================================================

pub struct TestResource {
    pub id: u32,
    recycled: Arc<AtomicUsize>,
}

impl TestResource {
    pub fn new(id: u32, recycled: &Arc<AtomicUsize>) -> Self {
        Self {
            id,
            recycled: Arc::clone(recycled),
        }
    }
}

impl Resource for TestResource {
    fn recycle(self) {
        self.recycled.fetch_add(1, Ordering::SeqCst);
    }
}

// ============================================================================
// Executors
// ============================================================================

#[derive(Default)]
struct ManualTaskState {
    cancelled: AtomicBool,
    finished: AtomicBool,
}

struct ManualTaskHandle(Arc<ManualTaskState>);

impl TaskHandle for ManualTaskHandle {
    fn cancel(&self) {
        self.0.cancelled.store(true, Ordering::SeqCst);
    }

    fn is_finished(&self) -> bool {
        self.0.finished.load(Ordering::SeqCst) || self.0.cancelled.load(Ordering::SeqCst)
    }
}

/// Queues tasks until the test runs them on its own thread.
#[derive(Default)]
pub struct ManualExecutor {
    queue: Mutex<VecDeque<(Task, Arc<ManualTaskState>)>>,
    submitted: Mutex<Vec<Arc<ManualTaskState>>>,
}

impl ManualExecutor {
    pub fn submitted(&self) -> usize {
        self.submitted.lock().unwrap().len()
    }

    pub fn pending(&self) -> usize {
        self.queue.lock().unwrap().len()
    }

    pub fn is_cancelled(&self, index: usize) -> bool {
        self.submitted.lock().unwrap()[index]
            .cancelled
            .load(Ordering::SeqCst)
    }

    /// Run the oldest queued task unless it was cancelled.
    pub fn run_next(&self) -> bool {
        let next = self.queue.lock().unwrap().pop_front();
        let Some((task, state)) = next else {
            return false;
        };
        if state.cancelled.load(Ordering::SeqCst) {
            return false;
        }
        task();
        state.finished.store(true, Ordering::SeqCst);
        true
    }
}

impl Executor for ManualExecutor {
    fn submit(&self, task: Task) -> Box<dyn TaskHandle> {
        let state = Arc::new(ManualTaskState::default());
        self.submitted.lock().unwrap().push(Arc::clone(&state));
        self.queue
            .lock()
            .unwrap()
            .push_back((task, Arc::clone(&state)));
        Box::new(ManualTaskHandle(state))
    }
}

// ============================================================================
// Work units
// ============================================================================

/// Parks its reporter so the test decides when and how the run ends.
#[derive(Default)]
pub struct DeferredUnit {
    reporter: Mutex<Option<JobReporter<TestResource>>>,
    cancelled: AtomicBool,
    runs: AtomicUsize,
}

impl DeferredUnit {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn take_reporter(&self) -> JobReporter<TestResource> {
        self.reporter
            .lock()
            .unwrap()
            .take()
            .expect("unit has not run yet")
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

impl WorkUnit<TestResource> for DeferredUnit {
    fn run(self: Arc<Self>, reporter: JobReporter<TestResource>) {
        self.runs.fetch_add(1, Ordering::SeqCst);
        *self.reporter.lock().unwrap() = Some(reporter);
    }

    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

// ============================================================================
// Callbacks and registry
// ============================================================================

type ReadyHook = Box<dyn FnOnce(&EngineResource<TestResource>) + Send>;

#[derive(Default)]
pub struct RecordingCallback {
    resources: Mutex<Vec<EngineResource<TestResource>>>,
    counts_at_delivery: Mutex<Vec<usize>>,
    failed: AtomicUsize,
    on_ready: Mutex<Option<ReadyHook>>,
}

impl RecordingCallback {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Run `hook` inside the first `on_resource_ready`.
    pub fn with_hook(hook: impl FnOnce(&EngineResource<TestResource>) + Send + 'static) -> Arc<Self> {
        let callback = Self::default();
        *callback.on_ready.lock().unwrap() = Some(Box::new(hook));
        Arc::new(callback)
    }

    pub fn as_dyn(self: &Arc<Self>) -> Arc<dyn ResourceCallback<TestResource>> {
        self.clone()
    }

    pub fn ready_count(&self) -> usize {
        self.resources.lock().unwrap().len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    pub fn counts_at_delivery(&self) -> Vec<usize> {
        self.counts_at_delivery.lock().unwrap().clone()
    }

    pub fn resource(&self, index: usize) -> EngineResource<TestResource> {
        self.resources.lock().unwrap()[index].clone()
    }
}

impl ResourceCallback<TestResource> for RecordingCallback {
    fn on_resource_ready(&self, resource: EngineResource<TestResource>) {
        self.counts_at_delivery
            .lock()
            .unwrap()
            .push(resource.acquired());
        let hook = self.on_ready.lock().unwrap().take();
        if let Some(hook) = hook {
            hook(&resource);
        }
        self.resources.lock().unwrap().push(resource);
    }

    fn on_load_failed(&self) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct RecordingListener {
    completed: Mutex<Vec<(JobKey, bool)>>,
    cancelled: Mutex<Vec<(u64, JobKey)>>,
}

impl RecordingListener {
    /// `(key, had_resource)` per completion.
    pub fn completed(&self) -> Vec<(JobKey, bool)> {
        self.completed.lock().unwrap().clone()
    }

    /// `(job_id, key)` per cancellation.
    pub fn cancelled(&self) -> Vec<(u64, JobKey)> {
        self.cancelled.lock().unwrap().clone()
    }
}

impl EngineJobListener<TestResource> for RecordingListener {
    fn on_engine_job_complete(&self, key: &JobKey, resource: Option<&EngineResource<TestResource>>) {
        self.completed
            .lock()
            .unwrap()
            .push((key.clone(), resource.is_some()));
    }

    fn on_engine_job_cancelled(&self, job: &EngineJob<TestResource>, key: &JobKey) {
        self.cancelled.lock().unwrap().push((job.id(), key.clone()));
    }
}

// ============================================================================
// Harness
// ============================================================================

/// A coordination thread plus manual pools and a recording registry.
pub struct Harness {
    pub coordination: CoordinationThread,
    pub disk_cache: Arc<ManualExecutor>,
    pub source: Arc<ManualExecutor>,
    pub listener: Arc<RecordingListener>,
    pub factory: EngineJobFactory<TestResource>,
    pub recycled: Arc<AtomicUsize>,
}

impl Harness {
    pub fn new(name: &str) -> Self {
        init_tracing();
        let coordination = CoordinationThread::spawn(name).expect("spawn coordination thread");
        let disk_cache = Arc::new(ManualExecutor::default());
        let source = Arc::new(ManualExecutor::default());
        let listener = Arc::new(RecordingListener::default());
        let factory = EngineJobFactory::<TestResource>::new(
            disk_cache.clone(),
            source.clone(),
            coordination.handle(),
            listener.clone(),
        );
        Self {
            coordination,
            disk_cache,
            source,
            listener,
            factory,
            recycled: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn handle(&self) -> CoordinationHandle {
        self.coordination.handle()
    }

    pub fn resource(&self, id: u32) -> TestResource {
        TestResource::new(id, &self.recycled)
    }

    pub fn recycled(&self) -> usize {
        self.recycled.load(Ordering::SeqCst)
    }

    pub fn on_coordination<T: Send + 'static>(&self, task: impl FnOnce() -> T + Send + 'static) -> T {
        self.handle().call(task).expect("coordination thread is running")
    }

    /// Wait until every message posted so far has been processed.
    pub fn flush(&self) {
        self.on_coordination(|| ());
    }

    /// Build and start a job whose unit parks its reporter.
    pub fn started_job(&self, key: &str) -> (Arc<TestJob>, Arc<DeferredUnit>) {
        let job = self.factory.build(key, true);
        let unit = DeferredUnit::new();
        job.start(unit.clone()).expect("first start");
        (job, unit)
    }

    pub fn add(&self, job: &Arc<TestJob>, callback: &Arc<RecordingCallback>) {
        let job = Arc::clone(job);
        let callback = callback.as_dyn();
        self.on_coordination(move || job.add_callback(callback))
            .expect("add_callback on coordination thread");
    }

    pub fn remove(&self, job: &Arc<TestJob>, callback: &Arc<RecordingCallback>) {
        let job = Arc::clone(job);
        let callback = callback.as_dyn();
        self.on_coordination(move || job.remove_callback(&callback))
            .expect("remove_callback on coordination thread");
    }

    pub fn shutdown(self) -> std::thread::Result<()> {
        self.coordination.shutdown()
    }
}
