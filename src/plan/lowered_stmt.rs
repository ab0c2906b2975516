//! Flattened procedural statements, produced by the Statement Lowerer
//! alongside the write-intent list: one entry per write, `$system` task
//! call, or DPI call encountered while walking a process body.

use crate::ast::SourceLoc;

use super::common::{EventEdge, ProcKind};
use super::expr_node::ExprNodeId;
use super::key::PlanSymbolId;
use super::write_intent::WriteIntent;

#[derive(Debug, Clone)]
pub struct SystemTaskStmt {
    pub name: String,
    pub args: Vec<ExprNodeId>,
}

#[derive(Debug, Clone, Default)]
pub struct DpiCallStmt {
    pub target_import_symbol: String,
    pub in_arg_names: Vec<String>,
    pub out_arg_names: Vec<String>,
    pub in_args: Vec<ExprNodeId>,
    pub results: Vec<PlanSymbolId>,
    pub has_return: bool,
}

#[derive(Debug, Clone, Default)]
pub struct DpiImportInfo {
    pub symbol: String,
    pub args_direction: Vec<String>,
    pub args_width: Vec<i64>,
    pub args_name: Vec<String>,
    pub args_signed: Vec<bool>,
    pub args_type: Vec<String>,
    pub has_return: bool,
    pub return_width: i64,
    pub return_signed: bool,
    pub return_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoweredStmtKind {
    Write,
    SystemTask,
    DpiCall,
}

#[derive(Debug, Clone)]
pub struct LoweredStmt {
    pub kind: LoweredStmtKind,
    pub update_cond: ExprNodeId,
    pub proc_kind: ProcKind,
    pub has_timing: bool,
    pub event_edges: Vec<EventEdge>,
    pub event_operands: Vec<ExprNodeId>,
    pub loc: SourceLoc,
    pub write: Option<WriteIntent>,
    pub system_task: Option<SystemTaskStmt>,
    pub dpi_call: Option<DpiCallStmt>,
}

impl LoweredStmt {
    pub fn for_write(write: WriteIntent, proc_kind: ProcKind, loc: SourceLoc) -> Self {
        Self {
            kind: LoweredStmtKind::Write,
            update_cond: ExprNodeId::invalid(),
            proc_kind,
            has_timing: false,
            event_edges: Vec::new(),
            event_operands: Vec::new(),
            loc,
            write: Some(write),
            system_task: None,
            dpi_call: None,
        }
    }

    pub fn for_system_task(task: SystemTaskStmt, proc_kind: ProcKind, loc: SourceLoc) -> Self {
        Self {
            kind: LoweredStmtKind::SystemTask,
            update_cond: ExprNodeId::invalid(),
            proc_kind,
            has_timing: false,
            event_edges: Vec::new(),
            event_operands: Vec::new(),
            loc,
            write: None,
            system_task: Some(task),
            dpi_call: None,
        }
    }

    pub fn for_dpi_call(call: DpiCallStmt, proc_kind: ProcKind, loc: SourceLoc) -> Self {
        Self {
            kind: LoweredStmtKind::DpiCall,
            update_cond: ExprNodeId::invalid(),
            proc_kind,
            has_timing: false,
            event_edges: Vec::new(),
            event_operands: Vec::new(),
            loc,
            write: None,
            system_task: None,
            dpi_call: Some(call),
        }
    }

    pub fn with_event_control(mut self, edges: Vec<EventEdge>, operands: Vec<ExprNodeId>) -> Self {
        self.has_timing = true;
        self.event_edges = edges;
        self.event_operands = operands;
        self
    }
}
