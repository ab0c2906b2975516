//! The Module Planner (§4.3): walks one elaborated module body, interning
//! every symbol it will use and recording ports, signals, and child
//! instances. Child instances that resolve to a not-yet-claimed
//! `PlanKey` are handed to the caller so they can be pushed onto the
//! shared task queue — the planner itself never touches the queue, which
//! keeps it a pure function of `(ModulePlan, Vec<DiscoveredChild>)` and
//! easy to unit test in isolation.

use std::sync::Arc;

use crate::ast::{ElaboratedBody, ElaboratedInstance, PortDirection as AstPortDirection, SignalKind as AstSignalKind};
use crate::diagnostics::Diagnostics;
use crate::plan::{
    canonical_param_signature, InoutBinding, InoutSignalInfo, InstanceInfo, InstanceParameter, ModulePlan,
    PlanKey, PlanSymbolTable, PortDirection, PortInfo, SignalInfo, SignalKind, UnpackedDimInfo,
};

/// A child instance discovered while planning, paired with the `PlanKey`
/// it should be planned under. `is_blackbox` children are never queued —
/// the Graph Assembler emits a `kBlackbox` op straight from the parent's
/// own `InstanceInfo` without a child `Graph` ever being materialized.
pub struct DiscoveredChild {
    pub key: PlanKey,
    pub body: Arc<ElaboratedBody>,
}

pub struct PlanResult {
    pub plan: ModulePlan,
    pub children: Vec<DiscoveredChild>,
}

/// Deterministic, collision-free suffixes for the `(in, out, oe)` surrogate
/// triple a bidirectional port is split into (§3, §4.3.1). A `.` can't
/// appear in a SystemVerilog identifier, so these can never collide with a
/// user-declared signal regardless of module content.
const INOUT_IN_SUFFIX: &str = ".in";
const INOUT_OUT_SUFFIX: &str = ".out";
const INOUT_OE_SUFFIX: &str = ".oe";

pub fn plan_module(body: &ElaboratedBody, diagnostics: &Diagnostics) -> PlanResult {
    let mut table = PlanSymbolTable::new();
    let module_symbol = table.intern(&body.module_name);

    let mut ports = Vec::with_capacity(body.ports.len());
    for port in &body.ports {
        let symbol = table.intern(&port.name);
        let direction = match port.direction {
            AstPortDirection::Input => PortDirection::Input,
            AstPortDirection::Output => PortDirection::Output,
            AstPortDirection::Inout => PortDirection::Inout,
        };
        let inout_binding = if direction == PortDirection::Inout {
            Some(InoutBinding {
                in_symbol: table.intern(&format!("{}{INOUT_IN_SUFFIX}", port.name)),
                out_symbol: table.intern(&format!("{}{INOUT_OUT_SUFFIX}", port.name)),
                oe_symbol: table.intern(&format!("{}{INOUT_OE_SUFFIX}", port.name)),
            })
        } else {
            None
        };
        ports.push(PortInfo {
            symbol,
            direction,
            width: port.width,
            is_signed: port.is_signed,
            value_type: port.value_type,
            inout_binding,
        });
    }

    let inout_signals = ports
        .iter()
        .filter_map(|p| {
            p.inout_binding.map(|binding| InoutSignalInfo {
                symbol: p.symbol,
                binding,
            })
        })
        .collect();

    let mut signals = Vec::with_capacity(body.signals.len());
    for signal in &body.signals {
        let symbol = table.intern(&signal.name);
        let kind = match signal.kind {
            AstSignalKind::Net => SignalKind::Net,
            AstSignalKind::Variable => SignalKind::Variable,
            AstSignalKind::Memory => SignalKind::Memory,
        };
        if table.lookup(&signal.name) != symbol {
            diagnostics.error(
                format!("signal '{}' redeclares an existing symbol", signal.name),
                "planner",
            );
        }
        signals.push(SignalInfo {
            symbol,
            kind,
            width: signal.width,
            is_signed: signal.is_signed,
            value_type: signal.value_type,
            memory_rows: signal.memory_rows,
            unpacked_dims: signal
                .unpacked_dims
                .iter()
                .map(|d| UnpackedDimInfo { extent: d.extent as i32 })
                .collect(),
        });
    }

    let mut instances = Vec::with_capacity(body.child_instances.len());
    let mut children = Vec::new();
    for inst in &body.child_instances {
        let (info, discovered) = plan_child_instance(&mut table, inst, diagnostics);
        instances.push(info);
        if let Some(child) = discovered {
            children.push(child);
        }
    }

    let plan = ModulePlan {
        symbol_table: table,
        module_symbol,
        ports,
        signals,
        instances,
        inout_signals,
    };

    PlanResult { plan, children }
}

fn plan_child_instance(
    table: &mut PlanSymbolTable,
    inst: &Arc<ElaboratedInstance>,
    diagnostics: &Diagnostics,
) -> (InstanceInfo, Option<DiscoveredChild>) {
    let instance_symbol = table.intern(&inst.instance_name);
    let module_symbol = table.intern(&inst.body.module_name);

    let bindings: Vec<(String, String)> = inst
        .parameters
        .iter()
        .map(|p| (p.name.clone(), p.value.clone()))
        .collect();
    let param_signature = canonical_param_signature(&bindings);

    let parameters = inst
        .parameters
        .iter()
        .map(|p| InstanceParameter {
            symbol: table.intern(&p.name),
            value: p.value.clone(),
        })
        .collect();

    let blackbox_ports = if inst.is_blackbox {
        inst.body
            .ports
            .iter()
            .map(|p| {
                let symbol = table.intern(&p.name);
                let direction = match p.direction {
                    AstPortDirection::Input => PortDirection::Input,
                    AstPortDirection::Output => PortDirection::Output,
                    AstPortDirection::Inout => PortDirection::Inout,
                };
                (symbol, direction)
            })
            .collect()
    } else {
        Vec::new()
    };

    let info = InstanceInfo {
        instance_symbol,
        module_symbol,
        definition: inst.definition,
        is_blackbox: inst.is_blackbox,
        parameters,
        param_signature: param_signature.clone(),
        blackbox_ports,
    };

    if inst.is_blackbox {
        return (info, None);
    }

    let key = PlanKey::new(inst.definition, param_signature);
    if key.definition.0 == 0 && key.param_signature.is_empty() {
        diagnostics.warning(
            format!("instance '{}' has an unset definition identity", inst.instance_name),
            "planner",
        );
    }
    (
        info,
        Some(DiscoveredChild {
            key,
            body: inst.body.clone(),
        }),
    )
}
