// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Read-only view of a single formula node.

use crate::formula::{Node, NodeId, Sort};
use crate::kind::Kind;

/// Declaration of a node: kind, sort, children and integer parameters.
#[derive(Debug, Clone, Copy)]
pub struct Decl<'a> {
    id: NodeId,
    node: &'a Node,
}

impl<'a> Decl<'a> {
    pub(crate) fn new(id: NodeId, node: &'a Node) -> Self {
        Self { id, node }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> Kind {
        self.node.kind
    }

    pub fn arity(&self) -> usize {
        self.node.args.len()
    }

    pub fn arg(&self, index: usize) -> Option<NodeId> {
        self.node.args.get(index).copied()
    }

    pub fn args(&self) -> &'a [NodeId] {
        &self.node.args
    }

    pub fn sort(&self) -> Sort {
        self.node.sort
    }

    /// Width of the result, if it is a bit-vector.
    pub fn bv_width(&self) -> Option<u32> {
        self.node.sort.bv_width()
    }

    pub fn int_params(&self) -> &'a [u32] {
        &self.node.params
    }

    pub fn int_param(&self, index: usize) -> Option<u32> {
        self.node.params.get(index).copied()
    }

    /// Upper bound of an `extract`.
    pub fn hi(&self) -> Option<u32> {
        match self.node.kind {
            Kind::Extract => self.int_param(0),
            _ => None,
        }
    }

    /// Lower bound of an `extract`.
    pub fn lo(&self) -> Option<u32> {
        match self.node.kind {
            Kind::Extract => self.int_param(1),
            _ => None,
        }
    }

    pub fn is_app(&self) -> bool {
        !matches!(self.node.kind, Kind::Forall | Kind::Exists | Kind::Bound)
    }

    pub fn is_quantifier(&self) -> bool {
        matches!(self.node.kind, Kind::Forall | Kind::Exists)
    }

    pub fn numeral(&self) -> Option<&'a str> {
        match self.node.kind {
            Kind::BvNumeral | Kind::IntNumeral => self.node.symbol.as_deref(),
            _ => None,
        }
    }

    /// Name of a variable, bound variable or applied function.
    pub fn name(&self) -> Option<&'a str> {
        match self.node.kind {
            Kind::Variable | Kind::Bound | Kind::Apply => self.node.symbol.as_deref(),
            _ => None,
        }
    }
}
