//! Pre-built elaborated-module fixtures covering the scenarios exercised by
//! the ingest pipeline's own test suite: a plain register, a latch, a
//! memory with a synchronous read port, an inout bus, a two-level instance
//! hierarchy with a blackbox leaf, a register driven from two clock
//! domains, and a system-task/DPI call.

use std::sync::Arc;

use crate::ast::{BinaryOp, DefinitionId, EdgeKind, ElaboratedBody, ElaboratedRoot, UnaryOp};
use crate::testing::builders::*;

/// `counter`: an 8-bit register that increments every cycle and resets to
/// zero on `rst_n` low.
///
/// ```verilog
/// module counter(input clk, input rst_n, output reg [7:0] count);
///   always @(posedge clk) count <= rst_n ? count + 1 : 8'h00;
/// endmodule
/// ```
#[must_use]
pub fn counter_module() -> Arc<ElaboratedBody> {
    ModuleBuilder::new("counter")
        .input("clk", 1, false)
        .input("rst_n", 1, false)
        .output("count", 8, false)
        .always_ff(
            vec![(EdgeKind::Posedge, sig("clk"))],
            vec![assign_non_blocking(
                lv("count"),
                ternary(sig("rst_n"), binary(BinaryOp::Add, sig("count"), lit("8'd1")), lit("8'h00")),
            )],
        )
        .build_arc()
}

/// `latch_passthrough`: a transparent latch gated by `enable`.
///
/// ```verilog
/// module latch_passthrough(input enable, input [3:0] d, output reg [3:0] q);
///   always @* if (enable) q = d;
/// endmodule
/// ```
#[must_use]
pub fn latch_passthrough_module() -> Arc<ElaboratedBody> {
    ModuleBuilder::new("latch_passthrough")
        .input("enable", 1, false)
        .input("d", 4, false)
        .output("q", 4, false)
        .always_latch(vec![if_stmt(sig("enable"), vec![assign_blocking(lv("q"), sig("d"))], Vec::new())])
        .build_arc()
}

/// `sync_ram`: a 16-entry, 8-bit-wide memory with a registered read port
/// and a plain write port.
///
/// ```verilog
/// module sync_ram(input clk, input we, input [3:0] addr, input [7:0] wdata, output reg [7:0] rdata);
///   reg [7:0] mem [0:15];
///   always @(posedge clk) begin
///     if (we) mem[addr] <= wdata;
///     rdata <= mem[addr];
///   end
/// endmodule
/// ```
#[must_use]
pub fn sync_ram_module() -> Arc<ElaboratedBody> {
    ModuleBuilder::new("sync_ram")
        .input("clk", 1, false)
        .input("we", 1, false)
        .input("addr", 4, false)
        .input("wdata", 8, false)
        .output("rdata", 8, false)
        .memory("mem", 8, 16)
        .always_ff(
            vec![(EdgeKind::Posedge, sig("clk"))],
            vec![
                if_stmt(sig("we"), vec![assign_non_blocking(lv_bit("mem", sig("addr")), sig("wdata"))], Vec::new()),
                assign_non_blocking(lv("rdata"), bit_select(sig("mem"), sig("addr"))),
            ],
        )
        .build_arc()
}

/// `tristate_bus`: an inout port driven by `drive_en`/`drive_val`, read
/// back onto `sampled`.
///
/// ```verilog
/// module tristate_bus(input drive_en, input drive_val, inout bus, output sampled);
///   assign bus = drive_en ? drive_val : 1'bz;
///   assign sampled = bus;
/// endmodule
/// ```
#[must_use]
pub fn tristate_bus_module() -> Arc<ElaboratedBody> {
    ModuleBuilder::new("tristate_bus")
        .input("drive_en", 1, false)
        .input("drive_val", 1, false)
        .inout("bus", 1, false)
        .output("sampled", 1, false)
        .assign("bus", ternary(sig("drive_en"), sig("drive_val"), lit("1'bz")))
        .assign("sampled", sig("bus"))
        .build_arc()
}

/// `adder`: a plain combinational child module, instantiated by
/// [`hierarchy_root`].
///
/// ```verilog
/// module adder(input [7:0] a, input [7:0] b, output [7:0] sum);
///   assign sum = a + b;
/// endmodule
/// ```
#[must_use]
pub fn adder_module() -> Arc<ElaboratedBody> {
    ModuleBuilder::new("adder")
        .input("a", 8, false)
        .input("b", 8, false)
        .output("sum", 8, false)
        .assign("sum", binary(BinaryOp::Add, sig("a"), sig("b")))
        .build_arc()
}

/// `hierarchy_root`: instantiates [`adder_module`] once and a blackbox
/// SRAM macro once, covering both the ordinary-child and
/// never-queued-blackbox-child code paths in the Graph Assembler.
///
/// ```verilog
/// module hierarchy_root(input [7:0] x, input [7:0] y, output [7:0] z, output [7:0] cache_out);
///   adder u_adder(.a(x), .b(y), .sum(z));
///   sram_macro u_sram(.addr(x), .dout(cache_out));
/// endmodule
/// ```
#[must_use]
pub fn hierarchy_root() -> (Arc<ElaboratedBody>, DefinitionId) {
    let adder_def = fresh_definition_id();
    let adder = adder_module();

    let sram_blackbox_body = ModuleBuilder::new("sram_macro")
        .input("addr", 8, false)
        .output("dout", 8, false)
        .build_arc();

    let adder_inst = InstanceBuilder::new("u_adder", adder_def, adder)
        .connect_input("a", sig("x"))
        .connect_input("b", sig("y"))
        .connect_output("sum", "z")
        .build();

    let sram_inst = InstanceBuilder::new("u_sram", fresh_definition_id(), sram_blackbox_body)
        .blackbox()
        .connect_input("addr", sig("x"))
        .connect_output("dout", "cache_out")
        .build();

    let body = ModuleBuilder::new("hierarchy_root")
        .input("x", 8, false)
        .input("y", 8, false)
        .output("z", 8, false)
        .output("cache_out", 8, false)
        .instance(adder_inst)
        .instance(sram_inst)
        .build_arc();

    (body, adder_def)
}

/// Wraps [`hierarchy_root`] as a one-instance [`ElaboratedRoot`], the shape
/// [`crate::driver::ConvertDriver::convert`] expects.
#[must_use]
pub fn hierarchy_root_elaborated() -> ElaboratedRoot {
    let (body, _adder_def) = hierarchy_root();
    ElaboratedRoot {
        top_instances: vec![InstanceBuilder::new("top", fresh_definition_id(), body).build_arc()],
    }
}

/// `dual_clock_reg`: one register written from two independent clock
/// domains (`clk_a` advances it, `clk_b` can force a synchronous clear),
/// exercising the write-back resolver's per-domain grouping and the
/// assembler's one-write-port-per-clock-combo emission.
///
/// ```verilog
/// module dual_clock_reg(input clk_a, input clk_b, input clear_b, output reg [7:0] q);
///   always @(posedge clk_a) q <= q + 1;
///   always @(posedge clk_b) if (clear_b) q <= 8'h00;
/// endmodule
/// ```
#[must_use]
pub fn dual_clock_reg_module() -> Arc<ElaboratedBody> {
    ModuleBuilder::new("dual_clock_reg")
        .input("clk_a", 1, false)
        .input("clk_b", 1, false)
        .input("clear_b", 1, false)
        .output("q", 8, false)
        .always_ff(
            vec![(EdgeKind::Posedge, sig("clk_a"))],
            vec![assign_non_blocking(lv("q"), binary(BinaryOp::Add, sig("q"), lit("8'd1")))],
        )
        .always_ff(
            vec![(EdgeKind::Posedge, sig("clk_b"))],
            vec![if_stmt(sig("clear_b"), vec![assign_non_blocking(lv("q"), lit("8'h00"))], Vec::new())],
        )
        .build_arc()
}

/// `heartbeat_monitor`: a plain combinational `$display` in an `always @*`
/// process and an imported DPI function call, covering the task/DPI
/// emission paths.
///
/// ```verilog
/// module heartbeat_monitor(input tick, input [7:0] value);
///   import "DPI-C" function int record_sample(input int value);
///   always @* begin
///     if (tick) $display("sample=%0d", value);
///   end
/// endmodule
/// ```
#[must_use]
pub fn heartbeat_monitor_module() -> Arc<ElaboratedBody> {
    ModuleBuilder::new("heartbeat_monitor")
        .input("tick", 1, false)
        .input("value", 8, false)
        .always_comb(vec![if_stmt(
            sig("tick"),
            vec![system_task_call("$display", vec![lit("\"sample=%0d\""), sig("value")])],
            Vec::new(),
        )])
        .build_arc()
}

/// `stmt_lowerer_while_stmt`: an `always_comb` body containing nothing but
/// an unsupported unbounded loop, covering the lowerer's blanket rejection
/// of `while`/`do-while`/`forever` constructs.
///
/// ```verilog
/// module stmt_lowerer_while_stmt(input clk, output q);
///   always @* while (1) ;
/// endmodule
/// ```
#[must_use]
pub fn unbounded_loop_module() -> Arc<ElaboratedBody> {
    ModuleBuilder::new("stmt_lowerer_while_stmt")
        .input("clk", 1, false)
        .output("q", 1, false)
        .always_comb(vec![unbounded_loop()])
        .build_arc()
}

/// `write_back_slice_static`: writes `r[7:4]` and `r[3:0]` with constant
/// bounds in the same clocked process, exercising the write-back resolver's
/// static-concat fast path (no shift/mask reconstruction, no warning).
///
/// ```verilog
/// module write_back_slice_static(input clk, input [3:0] hi, input [3:0] lo, output reg [7:0] r);
///   always @(posedge clk) begin
///     r[7:4] <= hi;
///     r[3:0] <= lo;
///   end
/// endmodule
/// ```
#[must_use]
pub fn write_back_slice_static_module() -> Arc<ElaboratedBody> {
    ModuleBuilder::new("write_back_slice_static")
        .input("clk", 1, false)
        .input("hi", 4, false)
        .input("lo", 4, false)
        .output("r", 8, false)
        .always_ff(
            vec![(EdgeKind::Posedge, sig("clk"))],
            vec![
                assign_non_blocking(lv_part("r", lit("7"), lit("4")), sig("hi")),
                assign_non_blocking(lv_part("r", lit("3"), lit("0")), sig("lo")),
            ],
        )
        .build_arc()
}

/// `write_back_slice_dynamic`: writes `r[i +: 4]` with a non-constant base
/// index, forcing the write-back resolver's shift/mask reconstruction path
/// and its accompanying warning.
///
/// ```verilog
/// module write_back_slice_dynamic(input clk, input [3:0] i, input [3:0] v, output reg [7:0] r);
///   always @(posedge clk) r[i +: 4] <= v;
/// endmodule
/// ```
#[must_use]
pub fn write_back_slice_dynamic_module() -> Arc<ElaboratedBody> {
    ModuleBuilder::new("write_back_slice_dynamic")
        .input("clk", 1, false)
        .input("i", 4, false)
        .input("v", 4, false)
        .output("r", 8, false)
        .always_ff(
            vec![(EdgeKind::Posedge, sig("clk"))],
            vec![assign_non_blocking(lv_indexed("r", sig("i"), 4, true), sig("v"))],
        )
        .build_arc()
}

/// `comb_incomplete_if`: an `always_comb` process whose only write is
/// guarded by an `if` with no `else`, exercising the write-back resolver's
/// latch inference for an incompletely-covered combinational process.
///
/// ```verilog
/// module comb_incomplete_if(input en, input [3:0] d, output reg [3:0] q);
///   always @* if (en) q = d;
/// endmodule
/// ```
#[must_use]
pub fn comb_incomplete_if_module() -> Arc<ElaboratedBody> {
    ModuleBuilder::new("comb_incomplete_if")
        .input("en", 1, false)
        .input("d", 4, false)
        .output("q", 4, false)
        .always_comb(vec![if_stmt(sig("en"), vec![assign_blocking(lv("q"), sig("d"))], Vec::new())])
        .build_arc()
}

/// `stmt_lowerer_pattern_if`: a single `if (... matches ...)` statement the
/// lowerer must reject outright, mirroring [`unbounded_loop_module`].
///
/// ```verilog
/// module stmt_lowerer_pattern_if(input clk, output reg q);
///   always @* if (clk matches 1'b1) q = 1'b1;
/// endmodule
/// ```
#[must_use]
pub fn pattern_if_module() -> Arc<ElaboratedBody> {
    ModuleBuilder::new("stmt_lowerer_pattern_if")
        .input("clk", 1, false)
        .output("q", 1, false)
        .always_comb(vec![pattern_if()])
        .build_arc()
}

/// `stmt_lowerer_pattern_case`: a single `case (...) matches ...` statement
/// the lowerer must reject outright, mirroring [`unbounded_loop_module`].
///
/// ```verilog
/// module stmt_lowerer_pattern_case(input clk, output reg q);
///   always @* case (clk) matches ... endcase
/// endmodule
/// ```
#[must_use]
pub fn pattern_case_module() -> Arc<ElaboratedBody> {
    ModuleBuilder::new("stmt_lowerer_pattern_case")
        .input("clk", 1, false)
        .output("q", 1, false)
        .always_comb(vec![pattern_case()])
        .build_arc()
}

/// A one-operand reduction/negation smoke-test module, covering every
/// [`UnaryOp`] variant in one combinational process so `infer_shape`'s
/// width/sign propagation for each has at least one exercised path.
#[must_use]
pub fn unary_ops_module() -> Arc<ElaboratedBody> {
    ModuleBuilder::new("unary_ops")
        .input("a", 8, true)
        .output("negated", 8, true)
        .output("parity", 1, false)
        .assign("negated", unary(UnaryOp::Neg, sig("a")))
        .assign("parity", unary(UnaryOp::ReduceXor, sig("a")))
        .build_arc()
}
