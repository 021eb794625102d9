use clap::Parser;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use foundation_sync::{BoundedQueue, LockState, Policy, PolicyRwLock};

type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Starts writers, then readers, against one policy rwlock and logs every
/// acquire and release so the admission order can be read off the output.
#[derive(Parser, Debug)]
#[command(version, about, long_about=None)]
struct Args {
    /// Scheduling policy: readers, writers or n_way:<width>
    #[arg(short, long, default_value = "n_way:3")]
    policy: Policy,

    #[arg(short, long, default_value = "5")]
    readers: usize,

    #[arg(short, long, default_value = "2")]
    writers: usize,

    /// Milliseconds each thread holds the lock
    #[arg(long, default_value = "1000")]
    hold_ms: u64,

    /// Milliseconds between thread starts
    #[arg(long, default_value = "100")]
    stagger_ms: u64,

    /// Dispatch requests through a bounded queue to this many workers
    /// instead of starting one thread per request
    #[arg(long)]
    workers: Option<usize>,

    /// Queue capacity when dispatching to workers
    #[arg(long, default_value = "4")]
    capacity: usize,

    /// Also show the lock's internal wait and handoff events (built in
    /// through the default `debug_trace` feature)
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy)]
enum Request {
    Read(usize),
    Write(usize),
}

impl Request {
    fn thread_name(self) -> String {
        match self {
            Request::Read(id) => format!("reader-{id}"),
            Request::Write(id) => format!("writer-{id}"),
        }
    }
}

/// Writers first, so the readers arrive to a contended lock.
fn requests(args: &Args) -> Vec<Request> {
    (0..args.writers)
        .map(Request::Write)
        .chain((0..args.readers).map(Request::Read))
        .collect()
}

fn serve(lock: &PolicyRwLock, request: Request, hold: Duration) {
    match request {
        Request::Read(id) => {
            let guard = lock.read();
            tracing::info!(reader = id, "acquired read lock");
            thread::sleep(hold);
            drop(guard);
            tracing::info!(reader = id, "released read lock");
        }
        Request::Write(id) => {
            let guard = lock.write();
            tracing::info!(writer = id, "acquired write lock");
            thread::sleep(hold);
            drop(guard);
            tracing::info!(writer = id, "released write lock");
        }
    }
}

fn join_all(handles: Vec<thread::JoinHandle<()>>) -> std::result::Result<(), BoxedError> {
    for handle in handles {
        handle.join().map_err(|_| "contention thread panicked")?;
    }
    Ok(())
}

fn run_threads(lock: &Arc<PolicyRwLock>, args: &Args) -> std::result::Result<(), BoxedError> {
    let hold = Duration::from_millis(args.hold_ms);
    let stagger = Duration::from_millis(args.stagger_ms);

    let mut handles = Vec::new();
    for request in requests(args) {
        let lock = Arc::clone(lock);
        handles.push(
            thread::Builder::new()
                .name(request.thread_name())
                .spawn(move || serve(&lock, request, hold))?,
        );
        thread::sleep(stagger);
    }

    join_all(handles)
}

fn run_workers(
    lock: &Arc<PolicyRwLock>,
    args: &Args,
    workers: usize,
) -> std::result::Result<(), BoxedError> {
    if workers == 0 {
        return Err("worker mode needs at least one worker".into());
    }

    let hold = Duration::from_millis(args.hold_ms);
    let stagger = Duration::from_millis(args.stagger_ms);
    let queue = Arc::new(BoundedQueue::<Option<Request>>::new(args.capacity)?);

    let mut handles = Vec::with_capacity(workers);
    for id in 0..workers {
        let lock = Arc::clone(lock);
        let queue = Arc::clone(&queue);
        handles.push(thread::Builder::new().name(format!("worker-{id}")).spawn(move || {
            while let Some(request) = queue.pop() {
                tracing::debug!(?request, "picked up request");
                serve(&lock, request, hold);
            }
        })?);
    }

    for request in requests(args) {
        queue.push(Some(request));
        tracing::debug!(?request, pending = queue.len(), "queued request");
        thread::sleep(stagger);
    }
    for _ in 0..workers {
        queue.push(None);
    }

    join_all(handles)
}

fn main() -> std::result::Result<(), BoxedError> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .with_thread_names(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let lock = Arc::new(PolicyRwLock::new(args.policy));
    tracing::info!(
        policy = %args.policy,
        readers = args.readers,
        writers = args.writers,
        "rwlock created"
    );

    match args.workers {
        Some(workers) => run_workers(&lock, &args, workers)?,
        None => run_threads(&lock, &args)?,
    }

    let snapshot = lock.snapshot();
    if snapshot.state() != LockState::Idle || snapshot.waiting_readers + snapshot.waiting_writers > 0 {
        return Err(format!("lock not idle after all threads finished: {snapshot:?}").into());
    }

    drop(lock);
    tracing::info!("rwlock dropped");
    Ok(())
}
