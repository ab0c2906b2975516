use std::collections::BTreeSet;

use super::attr::AttrMap;
use super::ids::{OperationId, ValueId};
use super::operation::{Operation, OperationKind};
use super::port::{InoutPort, Port, PortDirection};
use super::symbol::{SymbolId, SymbolTable};
use super::value::{Use, Value, ValueType};
use crate::ast::SourceLoc;

/// One module's worth of the Register-Hardware Graph: a value arena, an
/// operation arena, a local symbol table, and the port surface that lets a
/// containing instance wire into it.
///
/// All mutation during assembly goes through `Graph`'s own methods so the
/// operand/user back-reference invariant (every `Value::users` entry has a
/// matching `operands[i]` in the referenced operation, and vice versa)
/// cannot be broken by a caller poking the arenas directly.
#[derive(Debug)]
pub struct Graph {
    /// Unique name within the owning [`super::Netlist`].
    name: String,
    pub symbols: SymbolTable,
    values: Vec<Value>,
    operations: Vec<Operation>,
    pub inputs: Vec<Port>,
    pub outputs: Vec<Port>,
    pub inouts: Vec<InoutPort>,
    pub declared_symbols: BTreeSet<SymbolId>,
}

impl Graph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbols: SymbolTable::new(),
            values: Vec::new(),
            operations: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            inouts: Vec::new(),
            declared_symbols: BTreeSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn value(&self, id: ValueId) -> &Value {
        &self.values[id.index()]
    }

    pub fn operation(&self, id: OperationId) -> &Operation {
        &self.operations[id.index()]
    }

    /// Allocates a value with no defining operation (a port input or a
    /// storage declaration's initial state).
    pub fn add_free_value(
        &mut self,
        symbol: SymbolId,
        width: u32,
        is_signed: bool,
        value_type: ValueType,
        src_loc: Option<SourceLoc>,
    ) -> ValueId {
        let id = ValueId::new(self.values.len() as u32);
        self.values.push(Value {
            symbol,
            width,
            is_signed,
            value_type,
            defining_op: None,
            users: BTreeSet::new(),
            src_loc,
            id,
        });
        id
    }

    /// Allocates an operation together with its result values in one step,
    /// wiring `defining_op` back onto each freshly created result so
    /// invariant 3 (single definer) holds by construction.
    pub fn add_operation(
        &mut self,
        symbol: SymbolId,
        kind: OperationKind,
        operands: Vec<ValueId>,
        results: Vec<(SymbolId, u32, bool, ValueType)>,
        attrs: AttrMap,
        src_loc: Option<SourceLoc>,
    ) -> OperationId {
        let op_id = OperationId::new(self.operations.len() as u32);
        let mut result_ids = Vec::with_capacity(results.len());
        for (sym, width, is_signed, value_type) in results {
            let value_id = ValueId::new(self.values.len() as u32);
            self.values.push(Value {
                symbol: sym,
                width,
                is_signed,
                value_type,
                defining_op: Some(op_id),
                users: BTreeSet::new(),
                src_loc: src_loc.clone(),
                id: value_id,
            });
            result_ids.push(value_id);
        }
        for (index, &operand) in operands.iter().enumerate() {
            self.values[operand.index()].users.insert(Use {
                op: op_id,
                operand_index: index as u32,
            });
        }
        self.operations.push(Operation {
            symbol,
            kind,
            operands,
            results: result_ids,
            attrs,
            src_loc,
            id: op_id,
        });
        op_id
    }

    /// Adds an additional operand to an already-allocated operation (used
    /// by the write-back resolver, which discovers an operation's full
    /// operand list incrementally while folding guards).
    pub fn push_operand(&mut self, op: OperationId, operand: ValueId) {
        let index = self.operations[op.index()].operands.len() as u32;
        self.operations[op.index()].operands.push(operand);
        self.values[operand.index()].users.insert(Use {
            op,
            operand_index: index,
        });
    }

    pub fn add_input_port(&mut self, name: SymbolId, value: ValueId) {
        self.inputs.push(Port {
            name,
            value,
            direction: PortDirection::Input,
        });
    }

    pub fn add_output_port(&mut self, name: SymbolId, value: ValueId) {
        self.outputs.push(Port {
            name,
            value,
            direction: PortDirection::Output,
        });
    }

    pub fn add_inout_port(&mut self, port: InoutPort) {
        self.inouts.push(port);
    }

    /// Checks invariants 1-4 over this graph alone; used by tests and by
    /// the assembler as a cheap post-build sanity check.
    pub fn check_invariants(&self) -> Result<(), String> {
        for (idx, op) in self.operations.iter().enumerate() {
            for &operand in &op.operands {
                if operand.index() >= self.values.len() {
                    return Err(format!("operation {idx} references out-of-range operand {operand}"));
                }
            }
            for &result in &op.results {
                if result.index() >= self.values.len() {
                    return Err(format!("operation {idx} references out-of-range result {result}"));
                }
                if self.values[result.index()].defining_op != Some(op.id()) {
                    return Err(format!("result {result} does not point back to its defining operation"));
                }
            }
        }
        for (idx, value) in self.values.iter().enumerate() {
            for u in &value.users {
                let op = self
                    .operations
                    .get(u.op.index())
                    .ok_or_else(|| format!("value {idx} references out-of-range user operation"))?;
                match op.operands.get(u.operand_index as usize) {
                    Some(&operand) if operand.index() == idx => {}
                    _ => return Err(format!("value {idx} user set disagrees with operation {} operands", u.op)),
                }
            }
        }
        Ok(())
    }
}
