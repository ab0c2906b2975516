//! The Convert Driver (§4.7): owns the worker pool that turns an
//! [`ElaboratedRoot`] into a [`Netlist`]. Planning one module can discover
//! child instances that need planning themselves, and a module can't be
//! assembled until every non-blackbox child it instantiates has a ready
//! plan — so the driver can't just fan a fixed work list out over a thread
//! pool and join. It instead runs a single shared [`PlanTaskQueue`] that
//! workers both pop from and push back onto: planning a module enqueues its
//! newly discovered children plus an assembly attempt for itself; an
//! assembly attempt whose children aren't ready yet re-enqueues its own
//! continuation instead of blocking.
//!
//! Termination follows a live work counter rather than "queue looks empty":
//! every enqueue increments it, every attempt's completion decrements it,
//! and the queue is closed the instant it reaches zero. Re-enqueuing a
//! continuation increments before the original attempt's completion
//! decrements, so the counter never bottoms out with a continuation still
//! in flight.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::assembler::{assemble_graph, AssemblerContext};
use crate::ast::{ElaboratedBody, ElaboratedRoot};
use crate::cache::{PlanCache, PlanStatus};
use crate::diagnostics::Diagnostics;
use crate::logging::{LogLevel, Logger};
use crate::lowerer::lower_module;
use crate::plan::{canonical_param_signature, PlanKey};
use crate::planner::plan_module;
use crate::queue::PlanTaskQueue;
use crate::registry::InstanceRegistry;
use crate::rhg::Netlist;
use crate::write_back::resolve_write_back;

/// Mirrors `ConvertOptions` from the original front end's driver entry
/// point (§6): the knobs that change *how* conversion runs without
/// changing what it produces.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Stop producing a netlist (return `Err`) once any error-level
    /// diagnostic has been recorded, rather than running to completion
    /// with a best-effort partial graph.
    pub abort_on_error: bool,
    pub enable_logging: bool,
    pub enable_timing: bool,
    pub log_level: LogLevel,
    /// Safety cap on the loop-unrolling the lowerer performs for
    /// statically-bounded `for` loops inside a process body.
    pub max_loop_iterations: u32,
    pub thread_count: u32,
    /// Forces sequential execution on the calling thread regardless of
    /// `thread_count`, useful for reproducing a worker-pool bug
    /// deterministically.
    pub single_thread: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            abort_on_error: true,
            enable_logging: false,
            enable_timing: false,
            log_level: LogLevel::Warn,
            max_loop_iterations: 131_072,
            thread_count: num_cpus::get().max(1) as u32,
            single_thread: false,
        }
    }
}

/// Returned by [`ConvertDriver::convert`] when conversion stopped early
/// because `abort_on_error` tripped. Callers inspect
/// [`ConvertDriver::diagnostics`] for why.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvertAborted;

impl std::fmt::Display for ConvertAborted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "convert aborted")
    }
}

impl std::error::Error for ConvertAborted {}

/// One unit of work for the shared queue. Splitting the continuation out
/// from the initial attempt means a module whose children aren't ready
/// yet re-enqueues cheaply without re-running planning or lowering.
pub enum WorkItem {
    Plan { key: PlanKey, body: Arc<ElaboratedBody> },
    Assemble { key: PlanKey },
}

struct RunState<'a> {
    options: &'a ConvertOptions,
    diagnostics: &'a Diagnostics,
    plan_cache: &'a PlanCache,
    plan_queue: &'a PlanTaskQueue<WorkItem>,
    instance_registry: &'a InstanceRegistry,
    task_counter: &'a AtomicUsize,
    cancel_flag: &'a AtomicBool,
    netlist: &'a Mutex<Netlist>,
}

fn push_work(run: &RunState, item: WorkItem) {
    run.task_counter.fetch_add(1, Ordering::SeqCst);
    run.plan_queue.push(item);
}

/// Marks one attempt as finished. Must be called exactly once per value
/// handed out by [`push_work`], after any re-enqueue it performs — never
/// before, or the counter could transiently hit zero with the re-enqueued
/// continuation still pending.
fn finish_work(run: &RunState) {
    if run.task_counter.fetch_sub(1, Ordering::SeqCst) == 1 {
        run.plan_queue.close();
    }
}

fn children_ready(plan: &crate::plan::ModulePlan, cache: &PlanCache) -> bool {
    plan.instances.iter().filter(|inst| !inst.is_blackbox).all(|inst| {
        let key = PlanKey::new(inst.definition, inst.param_signature.clone());
        !matches!(cache.status(&key), Some(PlanStatus::Pending) | Some(PlanStatus::Planning))
    })
}

fn process_plan_item(run: &RunState, key: PlanKey, body: Arc<ElaboratedBody>) {
    if run.cancel_flag.load(Ordering::SeqCst) {
        finish_work(run);
        return;
    }

    let result = plan_module(&body, run.diagnostics);
    let mut plan = result.plan;
    let mut lowering = lower_module(&mut plan, &body, run.diagnostics, run.options.max_loop_iterations);
    let write_back = resolve_write_back(&plan, &mut lowering, run.diagnostics);

    run.plan_cache.store_plan(&key, plan);
    run.plan_cache.set_lowering_plan(&key, lowering);
    run.plan_cache.set_write_back_plan(&key, write_back);

    if run.options.abort_on_error && run.diagnostics.has_error() {
        run.cancel_flag.store(true, Ordering::SeqCst);
        run.plan_cache.mark_failed(&key);
    }

    for child in result.children {
        if run.plan_cache.try_claim(&child.key) {
            push_work(run, WorkItem::Plan { key: child.key, body: child.body });
        }
    }
    push_work(run, WorkItem::Assemble { key });
    finish_work(run);
}

fn process_assemble_item(run: &RunState, key: PlanKey) {
    if run.cancel_flag.load(Ordering::SeqCst) {
        finish_work(run);
        return;
    }

    let Some(plan) = run.plan_cache.find_ready(&key) else {
        // Planning hasn't landed yet (or failed outright); nothing to do.
        finish_work(run);
        return;
    };

    if !children_ready(&plan, run.plan_cache) {
        push_work(run, WorkItem::Assemble { key });
        finish_work(run);
        return;
    }

    let lowering = run
        .plan_cache
        .get_lowering_plan(&key)
        .expect("lowering plan is stored alongside a Done module plan");
    let write_back = run
        .plan_cache
        .get_write_back_plan(&key)
        .expect("write-back plan is stored alongside a Done module plan");

    let module_name = plan.symbol_table.text(plan.module_symbol).to_string();
    let graph_name = run.instance_registry.assign_name(&key, &module_name);

    let ctx = AssemblerContext {
        plan_cache: run.plan_cache,
        instance_registry: run.instance_registry,
        diagnostics: run.diagnostics,
    };
    let graph = assemble_graph(&graph_name, &plan, &lowering, &write_back, &ctx);
    run.netlist.lock().unwrap().publish(graph);

    if run.options.abort_on_error && run.diagnostics.has_error() {
        run.cancel_flag.store(true, Ordering::SeqCst);
    }
    finish_work(run);
}

fn worker_loop(run: &RunState) {
    while let Some(item) = run.plan_queue.wait_pop(Some(run.cancel_flag)) {
        match item {
            WorkItem::Plan { key, body } => process_plan_item(run, key, body),
            WorkItem::Assemble { key } => process_assemble_item(run, key),
        }
        run.diagnostics.flush_thread_local();
    }
}

/// Drives the four-stage pipeline (plan, lower, resolve write-backs,
/// assemble) over an entire elaborated design. One driver can run several
/// `convert` calls back to back; each call gets its own cache, queue, and
/// registry, so nothing about one design's graphs leaks into the next.
pub struct ConvertDriver {
    options: ConvertOptions,
    diagnostics: Diagnostics,
    logger: Logger,
}

impl Default for ConvertDriver {
    fn default() -> Self {
        Self::new(ConvertOptions::default())
    }
}

impl ConvertDriver {
    pub fn new(options: ConvertOptions) -> Self {
        let mut diagnostics = Diagnostics::new();
        diagnostics.enable_thread_local(!options.single_thread);
        let logger = Logger::new();
        if options.enable_logging {
            logger.enable();
            logger.set_level(options.log_level);
        }
        Self { options, diagnostics, logger }
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn convert(&self, root: &ElaboratedRoot) -> Result<Netlist, ConvertAborted> {
        let start = self.options.enable_timing.then(Instant::now);

        let plan_cache = PlanCache::new();
        let plan_queue: PlanTaskQueue<WorkItem> = PlanTaskQueue::new();
        let instance_registry = InstanceRegistry::new();
        let task_counter = AtomicUsize::new(0);
        let cancel_flag = AtomicBool::new(false);
        let netlist = Mutex::new(Netlist::default());

        let run = RunState {
            options: &self.options,
            diagnostics: &self.diagnostics,
            plan_cache: &plan_cache,
            plan_queue: &plan_queue,
            instance_registry: &instance_registry,
            task_counter: &task_counter,
            cancel_flag: &cancel_flag,
            netlist: &netlist,
        };

        let mut top_keys = Vec::with_capacity(root.top_instances.len());
        for top in &root.top_instances {
            let bindings: Vec<(String, String)> =
                top.parameters.iter().map(|p| (p.name.clone(), p.value.clone())).collect();
            let key = PlanKey::new(top.definition, canonical_param_signature(&bindings));
            top_keys.push(key.clone());
            if plan_cache.try_claim(&key) {
                push_work(&run, WorkItem::Plan { key, body: top.body.clone() });
            }
        }

        if plan_queue.size() == 0 {
            // No work was actually claimed (e.g. an empty root, or every
            // top definition already converted by an earlier call sharing
            // this driver's caches -- which never happens today since each
            // `convert` call gets fresh caches, but costs nothing to guard).
            plan_queue.close();
        }

        let thread_count = if self.options.single_thread {
            1
        } else {
            self.options.thread_count.max(1) as usize
        };

        std::thread::scope(|scope| {
            for _ in 0..thread_count {
                scope.spawn(|| worker_loop(&run));
            }
        });

        self.diagnostics.flush_thread_local();

        if let Some(start) = start {
            self.logger.log(
                LogLevel::Info,
                "driver",
                format!("convert finished in {:.3}s", start.elapsed().as_secs_f64()),
            );
        }

        if self.options.abort_on_error && self.diagnostics.has_error() {
            return Err(ConvertAborted);
        }

        let mut built = netlist.into_inner().unwrap();
        built.top_names = top_keys
            .iter()
            .map(|key| instance_registry.lookup(key).unwrap_or_else(|| format!("${}", key.definition.0)))
            .collect();
        Ok(built)
    }
}
