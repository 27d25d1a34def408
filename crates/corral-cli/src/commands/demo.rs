//! `corral demo` — guided walk of the scheduling protocol.
//!
//! Spawns three worker threads into one container, rotates the running
//! slot through a full cycle, shares a memory block between members, and
//! drains the container. Every transition is reported on stderr.

use std::sync::mpsc;
use std::time::{Duration, Instant};

use clap::Args;
use corral_common::types::{ContainerId, ObjectId, ThreadId};
use corral_proto::device::{Device, Reply};
use corral_proto::request::Request;

/// Arguments for the `demo` command.
#[derive(Args, Debug)]
pub struct DemoArgs {
    /// Container id the workers join.
    #[arg(long, default_value_t = 1)]
    pub container: u64,

    /// Size in bytes of the shared demo block.
    #[arg(long, default_value_t = 4096)]
    pub size: u64,
}

const WAIT_BUDGET: Duration = Duration::from_secs(10);

struct Worker {
    thread: ThreadId,
    release: mpsc::Sender<()>,
    handle: std::thread::JoinHandle<anyhow::Result<()>>,
}

/// Executes the `demo` command.
///
/// # Errors
///
/// Returns an error if a worker thread fails or a transition does not
/// arrive within the wait budget.
pub fn execute(args: &DemoArgs) -> anyhow::Result<()> {
    let device = Device::new();
    let container = ContainerId::new(args.container);
    let object = ObjectId::new(7);

    eprintln!();
    eprintln!("  corral demo — container {container}, {} byte shared block", args.size);
    eprintln!();

    let (elected_tx, elected_rx) = mpsc::channel::<ThreadId>();

    // First worker: runnable immediately, seeds the shared block.
    let w1 = spawn_worker(&device, container, object, args.size, true, &elected_tx);
    let t1 = recv_elected(&elected_rx)?;
    eprintln!("  [1] thread {t1} joined first: runnable at once");

    // Two more workers: both park inside join.
    let w2 = spawn_worker(&device, container, object, args.size, false, &elected_tx);
    wait_for_members(&device, container, 2)?;
    let w3 = spawn_worker(&device, container, object, args.size, false, &elected_tx);
    wait_for_members(&device, container, 3)?;
    eprintln!("  [2] threads {} and {} joined: suspended", w2.thread, w3.thread);

    // Full rotation cycle: the running slot visits every member in join
    // order and returns to the first.
    let elected = rotate_once(&device, &elected_rx, true)?;
    eprintln!("  [3] rotate: thread {elected} elected");
    let elected = rotate_once(&device, &elected_rx, true)?;
    eprintln!("  [4] rotate: thread {elected} elected");
    let _ = rotate_once(&device, &elected_rx, false)?;
    eprintln!("  [5] rotate: running slot back at thread {t1} (full cycle)");

    // Release the workers; each departure re-elects until the container
    // drains and is unlinked from the directory.
    for worker in [w1, w2, w3] {
        let _ = worker.release.send(());
        match worker.handle.join() {
            Ok(result) => result?,
            Err(_) => anyhow::bail!("worker thread panicked"),
        }
    }
    anyhow::ensure!(
        device.scheduler().snapshot().containers.is_empty(),
        "container should be deleted after its last member left"
    );

    let violations = device.scheduler().audit();
    anyhow::ensure!(violations.is_empty(), "invariant violations: {violations:?}");
    eprintln!("  [6] all workers left: container deleted, directory clean");
    eprintln!();
    Ok(())
}

fn spawn_worker(
    device: &Device,
    container: ContainerId,
    object: ObjectId,
    size: u64,
    seed: bool,
    elected_tx: &mpsc::Sender<ThreadId>,
) -> Worker {
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let (thread_tx, thread_rx) = mpsc::channel::<ThreadId>();
    let device = device.clone();
    let elected_tx = elected_tx.clone();

    let handle = std::thread::spawn(move || -> anyhow::Result<()> {
        let me = corral_core::thread_id::current_thread_id();
        let _ = thread_tx.send(me);

        // Parks here unless this is the container's first member.
        device
            .submit(me, Request::Join { container })
            .map_err(|e| anyhow::anyhow!("join failed: {e}"))?;
        let _ = elected_tx.send(me);

        let reply = device
            .submit(me, Request::Mmap { object, length: size })
            .map_err(|e| anyhow::anyhow!("mmap failed: {e}"))?;
        let Reply::Mapped(block) = reply else {
            anyhow::bail!("mmap replied without a block");
        };
        if seed {
            block
                .write_at(0, &me.as_u64().to_le_bytes())
                .map_err(|e| anyhow::anyhow!("write failed: {e}"))?;
            tracing::info!(thread = %me, "seeded shared block");
        } else {
            let seen = block
                .read_at(0, 8)
                .map_err(|e| anyhow::anyhow!("read failed: {e}"))?;
            let mut buf = [0u8; 8];
            buf.copy_from_slice(&seen);
            tracing::info!(thread = %me, seeder = u64::from_le_bytes(buf), "read shared block");
        }

        // Hold membership until the driver releases us.
        let _ = release_rx.recv();
        device
            .submit(me, Request::Leave)
            .map_err(|e| anyhow::anyhow!("leave failed: {e}"))?;
        Ok(())
    });

    let thread = thread_rx
        .recv_timeout(WAIT_BUDGET)
        .unwrap_or(ThreadId::new(0));
    Worker {
        thread,
        release: release_tx,
        handle,
    }
}

fn rotate_once(
    device: &Device,
    elected_rx: &mpsc::Receiver<ThreadId>,
    expect_wake: bool,
) -> anyhow::Result<ThreadId> {
    device
        .scheduler()
        .rotate()
        .map_err(|e| anyhow::anyhow!("rotate failed: {e}"))?;
    if expect_wake {
        recv_elected(elected_rx)
    } else {
        Ok(ThreadId::new(0))
    }
}

fn recv_elected(rx: &mpsc::Receiver<ThreadId>) -> anyhow::Result<ThreadId> {
    rx.recv_timeout(WAIT_BUDGET)
        .map_err(|_| anyhow::anyhow!("no election within {WAIT_BUDGET:?}"))
}

fn wait_for_members(device: &Device, container: ContainerId, count: usize) -> anyhow::Result<()> {
    let start = Instant::now();
    loop {
        let registered = device
            .scheduler()
            .snapshot()
            .containers
            .iter()
            .find(|c| c.id == container)
            .map_or(0, |c| c.members.len());
        if registered >= count {
            return Ok(());
        }
        anyhow::ensure!(
            start.elapsed() < WAIT_BUDGET,
            "only {registered}/{count} members registered within {WAIT_BUDGET:?}"
        );
        std::thread::sleep(Duration::from_millis(2));
    }
}
