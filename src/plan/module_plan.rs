use crate::ast::{DefinitionId, ValueType};

use super::key::{PlanSymbolId, PlanSymbolTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortDirection {
    Input,
    Output,
    Inout,
}

#[derive(Debug, Clone, Copy)]
pub struct InoutBinding {
    pub in_symbol: PlanSymbolId,
    pub out_symbol: PlanSymbolId,
    pub oe_symbol: PlanSymbolId,
}

#[derive(Debug, Clone)]
pub struct PortInfo {
    pub symbol: PlanSymbolId,
    pub direction: PortDirection,
    pub width: i32,
    pub is_signed: bool,
    pub value_type: ValueType,
    pub inout_binding: Option<InoutBinding>,
}

#[derive(Debug, Clone)]
pub struct InoutSignalInfo {
    pub symbol: PlanSymbolId,
    pub binding: InoutBinding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Net,
    Variable,
    Memory,
    Port,
}

#[derive(Debug, Clone, Copy)]
pub struct UnpackedDimInfo {
    pub extent: i32,
}

#[derive(Debug, Clone)]
pub struct SignalInfo {
    pub symbol: PlanSymbolId,
    pub kind: SignalKind,
    pub width: i32,
    pub is_signed: bool,
    pub value_type: ValueType,
    pub memory_rows: i64,
    pub unpacked_dims: Vec<UnpackedDimInfo>,
}

#[derive(Debug, Clone)]
pub struct InstanceParameter {
    pub symbol: PlanSymbolId,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct InstanceInfo {
    pub instance_symbol: PlanSymbolId,
    pub module_symbol: PlanSymbolId,
    /// The child definition's stable identity, carried alongside
    /// `param_signature` so the Graph Assembler can recompute this
    /// instance's `PlanKey` without re-walking the AST.
    pub definition: DefinitionId,
    pub is_blackbox: bool,
    pub parameters: Vec<InstanceParameter>,
    pub param_signature: String,
    /// Declared port order for blackbox children, since those are never
    /// queued through the planner and so never gain a cached `ModulePlan`
    /// of their own to consult for ordering.
    pub blackbox_ports: Vec<(PlanSymbolId, PortDirection)>,
}

/// The output of the Module Planner stage: one module body's interned
/// symbols, port/signal declarations, and child instances, ready for the
/// Statement Lowerer to consume.
#[derive(Debug, Clone)]
pub struct ModulePlan {
    pub symbol_table: PlanSymbolTable,
    pub module_symbol: PlanSymbolId,
    pub ports: Vec<PortInfo>,
    pub signals: Vec<SignalInfo>,
    pub instances: Vec<InstanceInfo>,
    pub inout_signals: Vec<InoutSignalInfo>,
}

impl ModulePlan {
    pub fn find_port_by_name(&self, name: &str) -> Option<&PortInfo> {
        let id = self.symbol_table.lookup(name);
        if !id.valid() {
            return None;
        }
        self.ports.iter().find(|p| p.symbol == id)
    }

    pub fn find_port_by_inout_name(&self, name: &str) -> Option<&PortInfo> {
        let id = self.symbol_table.lookup(name);
        if !id.valid() {
            return None;
        }
        self.ports.iter().find(|p| match p.inout_binding {
            Some(b) => b.in_symbol == id || b.out_symbol == id || b.oe_symbol == id,
            None => false,
        })
    }

    pub fn find_signal_by_name(&self, name: &str) -> Option<&SignalInfo> {
        let id = self.symbol_table.lookup(name);
        if !id.valid() {
            return None;
        }
        self.signals.iter().find(|s| s.symbol == id)
    }

    pub fn find_port_by_symbol(&self, symbol: PlanSymbolId) -> Option<&PortInfo> {
        self.ports.iter().find(|p| p.symbol == symbol)
    }

    pub fn find_signal_by_symbol(&self, symbol: PlanSymbolId) -> Option<&SignalInfo> {
        self.signals.iter().find(|s| s.symbol == symbol)
    }

    /// Declared bit width of anything nameable in this module: a port, a
    /// plain signal, or an inout companion (which inherits its parent
    /// port's width). Returns `None` for symbols this plan doesn't know
    /// about at all (hierarchical references, foreign instance ports).
    pub fn symbol_width(&self, symbol: PlanSymbolId) -> Option<i32> {
        if let Some(p) = self.find_port_by_symbol(symbol) {
            return Some(p.width);
        }
        if let Some(s) = self.find_signal_by_symbol(symbol) {
            return Some(s.width);
        }
        self.ports.iter().find_map(|p| match p.inout_binding {
            Some(b) if b.in_symbol == symbol || b.out_symbol == symbol || b.oe_symbol == symbol => {
                Some(p.width)
            }
            _ => None,
        })
    }
}
