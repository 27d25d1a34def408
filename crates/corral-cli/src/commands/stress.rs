//! `corral stress` — interleaved joins, rotations, and departures with
//! invariant audits at every quiescent point.

use std::time::{Duration, Instant};

use clap::Args;
use corral_common::config::ScenarioConfig;
use corral_common::types::{ContainerId, ThreadId};
use corral_proto::device::Device;
use corral_proto::request::Request;

/// Arguments for the `stress` command.
#[derive(Args, Debug)]
pub struct StressArgs {
    /// Number of containers to populate.
    #[arg(long, default_value_t = ScenarioConfig::default().containers)]
    pub containers: u64,

    /// Number of member threads per container.
    #[arg(long, default_value_t = ScenarioConfig::default().threads_per_container)]
    pub threads: u64,

    /// Number of rotation calls before draining.
    #[arg(long, default_value_t = ScenarioConfig::default().rotations)]
    pub rotations: u64,

    /// Emit a JSON summary on stdout instead of plain text on stderr.
    #[arg(long)]
    pub json: bool,
}

const WAIT_BUDGET: Duration = Duration::from_secs(30);

/// Executes the `stress` command.
///
/// # Errors
///
/// Returns an error if any scheduling call fails, an invariant audit
/// reports a violation, or the run does not quiesce within the budget.
pub fn execute(args: &StressArgs) -> anyhow::Result<()> {
    anyhow::ensure!(args.containers > 0, "need at least one container");
    anyhow::ensure!(args.threads > 0, "need at least one thread per container");

    let device = Device::new();
    let started = Instant::now();

    // Phase 1: populate. Every joiner after a container's first parks
    // inside `join` until the drain elects it.
    let mut workers = Vec::new();
    for c in 0..args.containers {
        for _ in 0..args.threads {
            let device = device.clone();
            let container = ContainerId::new(c);
            workers.push(std::thread::spawn(move || -> anyhow::Result<ThreadId> {
                let me = corral_core::thread_id::current_thread_id();
                device
                    .submit(me, Request::Join { container })
                    .map_err(|e| anyhow::anyhow!("join failed: {e}"))?;
                Ok(me)
            }));
        }
    }
    wait_for_population(&device, args.containers, args.threads)?;
    audit(&device, "after population")?;
    tracing::info!(
        containers = args.containers,
        threads = args.threads,
        "population registered"
    );

    // Phase 2: rotate across the cursor cycle.
    for i in 0..args.rotations {
        let target = device
            .scheduler()
            .rotate()
            .map_err(|e| anyhow::anyhow!("rotate {i} failed: {e}"))?;
        tracing::debug!(rotation = i, container = %target, "rotated");
        audit(&device, "mid-rotation")?;
    }

    // Phase 3: drain. Retiring the running member of each container
    // elects its successor, whose pending join then returns; repeating
    // empties and unlinks every container.
    let mut departures = 0u64;
    loop {
        let snap = device.scheduler().snapshot();
        if snap.containers.is_empty() {
            break;
        }
        for container in &snap.containers {
            let Some(running) = container.running else {
                anyhow::bail!("container {} has no running member", container.id);
            };
            device
                .submit(running, Request::Leave)
                .map_err(|e| anyhow::anyhow!("leave failed: {e}"))?;
            departures += 1;
        }
        audit(&device, "mid-drain")?;
        anyhow::ensure!(
            started.elapsed() < WAIT_BUDGET,
            "drain did not finish within {WAIT_BUDGET:?}"
        );
    }

    for worker in workers {
        match worker.join() {
            Ok(result) => {
                let _ = result?;
            }
            Err(_) => anyhow::bail!("worker thread panicked"),
        }
    }
    audit(&device, "after drain")?;

    let elapsed = started.elapsed();
    report(args, departures, elapsed)?;
    Ok(())
}

fn report(args: &StressArgs, departures: u64, elapsed: Duration) -> anyhow::Result<()> {
    if args.json {
        let summary = serde_json::json!({
            "containers": args.containers,
            "threads_per_container": args.threads,
            "rotations": args.rotations,
            "departures": departures,
            "elapsed_ms": elapsed.as_millis(),
            "violations": 0,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        eprintln!();
        eprintln!(
            "  stress ok: {} containers x {} threads, {} rotations, {} departures in {elapsed:.2?}",
            args.containers, args.threads, args.rotations, departures
        );
        eprintln!();
    }
    Ok(())
}

fn audit(device: &Device, phase: &str) -> anyhow::Result<()> {
    let violations = device.scheduler().audit();
    anyhow::ensure!(
        violations.is_empty(),
        "invariant violations {phase}: {violations:?}"
    );
    Ok(())
}

fn wait_for_population(device: &Device, containers: u64, threads: u64) -> anyhow::Result<()> {
    let start = Instant::now();
    let want_containers = usize::try_from(containers)?;
    let want_members = usize::try_from(threads)?;
    loop {
        let snap = device.scheduler().snapshot();
        if snap.containers.len() == want_containers
            && snap.containers.iter().all(|c| c.members.len() == want_members)
        {
            return Ok(());
        }
        anyhow::ensure!(
            start.elapsed() < WAIT_BUDGET,
            "population did not register within {WAIT_BUDGET:?}"
        );
        std::thread::sleep(Duration::from_millis(2));
    }
}
