use rhg_ingest::ast::ElaboratedRoot;
use rhg_ingest::driver::{ConvertDriver, ConvertOptions};
use rhg_ingest::rhg::OperationKind;
use rhg_ingest::testing::*;

fn single_top(body: std::sync::Arc<rhg_ingest::ast::ElaboratedBody>) -> ElaboratedRoot {
    ElaboratedRoot { top_instances: vec![InstanceBuilder::new("top", fresh_definition_id(), body).build_arc()] }
}

#[test]
fn converts_a_plain_register() {
    let root = single_top(counter_module());
    let netlist = ConvertDriver::default().convert(&root).expect("conversion should not abort");

    let graph = assert_has_graph(&netlist, "counter");
    assert_graph_invariants_hold(graph);
    assert_input_port_count(graph, 2);
    assert_output_port_count(graph, 1);
    assert!(count_operations(graph, OperationKind::Register) >= 1);
    assert!(count_operations(graph, OperationKind::RegisterWritePort) >= 1);
}

#[test]
fn converts_a_transparent_latch() {
    let root = single_top(latch_passthrough_module());
    let netlist = ConvertDriver::default().convert(&root).expect("conversion should not abort");

    let graph = assert_has_graph(&netlist, "latch_passthrough");
    assert_graph_invariants_hold(graph);
    assert!(count_operations(graph, OperationKind::Latch) >= 1);
    assert!(count_operations(graph, OperationKind::LatchWritePort) >= 1);
}

#[test]
fn converts_a_synchronous_memory() {
    let root = single_top(sync_ram_module());
    let netlist = ConvertDriver::default().convert(&root).expect("conversion should not abort");

    let graph = assert_has_graph(&netlist, "sync_ram");
    assert_graph_invariants_hold(graph);
    assert!(count_operations(graph, OperationKind::MemoryWritePort) >= 1);
    assert!(count_operations(graph, OperationKind::MemoryReadPort) >= 1);
}

#[test]
fn converts_a_tristate_inout_bus() {
    let root = single_top(tristate_bus_module());
    let netlist = ConvertDriver::default().convert(&root).expect("conversion should not abort");

    let graph = assert_has_graph(&netlist, "tristate_bus");
    assert_graph_invariants_hold(graph);
    assert_eq!(graph.inouts.len(), 1);
}

#[test]
fn converts_a_two_level_hierarchy_with_one_blackbox_leaf() {
    let root = hierarchy_root_elaborated();
    let netlist = ConvertDriver::default().convert(&root).expect("conversion should not abort");
    assert_netlist_key_invariant_holds(&netlist);

    let root_graph = assert_has_graph(&netlist, "hierarchy_root");
    assert_graph_invariants_hold(root_graph);
    assert!(count_operations(root_graph, OperationKind::Instance) >= 1);

    // The blackbox leaf (sram_macro) is never scheduled for planning, so it
    // never gets its own published graph -- only the adder does.
    let adder_graph = assert_has_graph(&netlist, "adder");
    assert_graph_invariants_hold(adder_graph);
    assert!(!netlist.contains("sram_macro"));
}

#[test]
fn converts_a_register_written_from_two_clock_domains() {
    let root = single_top(dual_clock_reg_module());
    let netlist = ConvertDriver::default().convert(&root).expect("conversion should not abort");

    let graph = assert_has_graph(&netlist, "dual_clock_reg");
    assert_graph_invariants_hold(graph);
    // One write port per distinct clock-edge combination, one storage declaration.
    assert_eq!(count_operations(graph, OperationKind::Register), 1);
    assert_eq!(count_operations(graph, OperationKind::RegisterWritePort), 2);
}

#[test]
fn converts_a_system_task_call() {
    let root = single_top(heartbeat_monitor_module());
    let netlist = ConvertDriver::default().convert(&root).expect("conversion should not abort");

    let graph = assert_has_graph(&netlist, "heartbeat_monitor");
    assert_graph_invariants_hold(graph);
    assert!(count_operations(graph, OperationKind::SystemTask) >= 1);
}

#[test]
fn converts_unary_reduction_and_negation_ops() {
    let root = single_top(unary_ops_module());
    let netlist = ConvertDriver::default().convert(&root).expect("conversion should not abort");

    let graph = assert_has_graph(&netlist, "unary_ops");
    assert_graph_invariants_hold(graph);
    assert!(count_operations(graph, OperationKind::Neg) >= 1);
    assert!(count_operations(graph, OperationKind::ReduceXor) >= 1);
}

#[test]
fn single_thread_mode_produces_the_same_graph_shape() {
    let root = hierarchy_root_elaborated();
    let options = ConvertOptions { single_thread: true, ..ConvertOptions::default() };
    let netlist = ConvertDriver::new(options).convert(&root).expect("conversion should not abort");

    assert_netlist_key_invariant_holds(&netlist);
    assert_has_graph(&netlist, "hierarchy_root");
    assert_has_graph(&netlist, "adder");
}

#[test]
fn unbounded_loop_is_rejected_with_an_error_and_no_writes() {
    let root = single_top(unbounded_loop_module());
    let options = ConvertOptions { abort_on_error: false, ..ConvertOptions::default() };
    let driver = ConvertDriver::new(options);
    let netlist = driver.convert(&root).expect("abort_on_error is off, so a bad module still returns a netlist");

    assert!(driver.diagnostics().has_error(), "unbounded loop should record an error-level diagnostic");
    let graph = assert_has_graph(&netlist, "stmt_lowerer_while_stmt");
    assert_eq!(count_operations(graph, OperationKind::RegisterWritePort), 0);
    assert_eq!(count_operations(graph, OperationKind::Assign), 0);
}

#[test]
fn pattern_if_is_rejected_with_an_error_and_no_writes() {
    let root = single_top(pattern_if_module());
    let options = ConvertOptions { abort_on_error: false, ..ConvertOptions::default() };
    let driver = ConvertDriver::new(options);
    let netlist = driver.convert(&root).expect("abort_on_error is off, so a bad module still returns a netlist");

    assert!(driver.diagnostics().has_error(), "pattern-matching if should record an error-level diagnostic");
    let graph = assert_has_graph(&netlist, "stmt_lowerer_pattern_if");
    assert_eq!(count_operations(graph, OperationKind::RegisterWritePort), 0);
    assert_eq!(count_operations(graph, OperationKind::Assign), 0);
}

#[test]
fn pattern_case_is_rejected_with_an_error_and_no_writes() {
    let root = single_top(pattern_case_module());
    let options = ConvertOptions { abort_on_error: false, ..ConvertOptions::default() };
    let driver = ConvertDriver::new(options);
    let netlist = driver.convert(&root).expect("abort_on_error is off, so a bad module still returns a netlist");

    assert!(driver.diagnostics().has_error(), "pattern-matching case should record an error-level diagnostic");
    let graph = assert_has_graph(&netlist, "stmt_lowerer_pattern_case");
    assert_eq!(count_operations(graph, OperationKind::RegisterWritePort), 0);
    assert_eq!(count_operations(graph, OperationKind::Assign), 0);
}

#[test]
fn incomplete_if_in_always_comb_infers_a_latch() {
    let root = single_top(comb_incomplete_if_module());
    let netlist = ConvertDriver::default().convert(&root).expect("conversion should not abort");

    let graph = assert_has_graph(&netlist, "comb_incomplete_if");
    assert_graph_invariants_hold(graph);
    assert!(count_operations(graph, OperationKind::Latch) >= 1);
    assert!(count_operations(graph, OperationKind::LatchWritePort) >= 1);
}

#[test]
fn converts_a_static_slice_write_back_into_one_concat() {
    let root = single_top(write_back_slice_static_module());
    let driver = ConvertDriver::default();
    let netlist = driver.convert(&root).expect("conversion should not abort");

    let graph = assert_has_graph(&netlist, "write_back_slice_static");
    assert_graph_invariants_hold(graph);
    assert_eq!(count_operations(graph, OperationKind::RegisterWritePort), 1);
    assert!(count_operations(graph, OperationKind::Concat) >= 1);
    assert!(
        !driver.diagnostics().messages().iter().any(|d| d.kind == rhg_ingest::DiagnosticKind::Warning),
        "a fully-static disjoint slice write-back should not warn"
    );
}

#[test]
fn converts_a_dynamic_slice_write_back_with_a_warning() {
    let root = single_top(write_back_slice_dynamic_module());
    let driver = ConvertDriver::default();
    let netlist = driver.convert(&root).expect("conversion should not abort");

    let graph = assert_has_graph(&netlist, "write_back_slice_dynamic");
    assert_graph_invariants_hold(graph);
    assert!(count_operations(graph, OperationKind::Shl) >= 1);
    assert!(
        driver
            .diagnostics()
            .messages()
            .iter()
            .any(|d| d.kind == rhg_ingest::DiagnosticKind::Warning && d.message.contains("'r'")),
        "a dynamic-slice write-back merge should warn naming the target"
    );
}

#[test]
fn abort_on_error_is_disabled_without_surfacing_false_failures() {
    let root = single_top(counter_module());
    let options = ConvertOptions { abort_on_error: false, ..ConvertOptions::default() };
    let driver = ConvertDriver::new(options);
    let netlist = driver.convert(&root).expect("a clean design should not fail even with abort_on_error off");

    assert!(!driver.diagnostics().has_error());
    assert_has_graph(&netlist, "counter");
}
