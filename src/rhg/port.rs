use super::ids::ValueId;
use super::symbol::SymbolId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortDirection {
    Input,
    Output,
}

#[derive(Debug, Clone, Copy)]
pub struct Port {
    pub name: SymbolId,
    pub value: ValueId,
    pub direction: PortDirection,
}

/// The split-phase surrogate a bidirectional pin is represented as: a
/// driven-in value, a driven-out value, and an output-enable value. Pure
/// data-flow has no notion of a tristate bus, so inout ports are lowered to
/// this triple rather than modeled directly.
#[derive(Debug, Clone, Copy)]
pub struct InoutPort {
    pub name: SymbolId,
    pub in_value: ValueId,
    pub out_value: ValueId,
    pub oe_value: ValueId,
}
