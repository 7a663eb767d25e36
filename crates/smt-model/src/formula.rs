// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

use crate::decl::Decl;
use crate::kind::{Kind, SortError};
use rustc_hash::FxHashMap;
use std::fmt::{Display, Formatter};

/// Sort of a formula node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Sort {
    Bool,
    BitVec(u32),
    Int,
}

impl Sort {
    pub fn bv_width(self) -> Option<u32> {
        match self {
            Sort::BitVec(w) => Some(w),
            _ => None,
        }
    }

    pub fn is_bool(self) -> bool {
        self == Sort::Bool
    }
}

impl Display for Sort {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Sort::Bool => write!(f, "Bool"),
            Sort::BitVec(w) => write!(f, "(_ BitVec {w})"),
            Sort::Int => write!(f, "Int"),
        }
    }
}

/// Identity of a node inside one [`Formula`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct Node {
    pub(crate) kind: Kind,
    pub(crate) args: Vec<NodeId>,
    pub(crate) params: Vec<u32>,
    pub(crate) sort: Sort,
    /// numeral token, variable name or applied function name
    pub(crate) symbol: Option<Box<str>>,
}

/// A hash-consed arena of formula nodes.
///
/// Structurally identical nodes are interned once, so sub-terms written twice
/// end up shared and the arena forms a DAG. Children always have smaller ids
/// than their parents.
#[derive(Debug, Default, Clone)]
pub struct Formula {
    nodes: Vec<Node>,
    interned: FxHashMap<Node, NodeId>,
}

impl Formula {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn intern(&mut self, node: Node) -> NodeId {
        if let Some(id) = self.interned.get(&node) {
            return *id;
        }
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node.clone());
        self.interned.insert(node, id);
        id
    }

    fn leaf(&mut self, kind: Kind, sort: Sort, symbol: Option<&str>) -> NodeId {
        self.intern(Node {
            kind,
            args: vec![],
            params: vec![],
            sort,
            symbol: symbol.map(Into::into),
        })
    }

    pub fn bool_const(&mut self, value: bool) -> NodeId {
        let kind = if value { Kind::True } else { Kind::False };
        self.leaf(kind, Sort::Bool, None)
    }

    /// A bit-vector numeral carrying its token verbatim (`#b...` or `#x...`).
    ///
    /// The token is not validated here; the literal decoder reports malformed tokens.
    pub fn bv_numeral(&mut self, token: &str, width: u32) -> NodeId {
        self.leaf(Kind::BvNumeral, Sort::BitVec(width), Some(token))
    }

    /// A bit-vector numeral for `value`, truncated to `width` bits (`width <= 128`).
    pub fn bv_value(&mut self, value: u128, width: u32) -> NodeId {
        let value = if width >= 128 {
            value
        } else {
            value & ((1u128 << width) - 1)
        };
        let token = if width % 4 == 0 {
            format!("#x{:0>w$x}", value, w = (width / 4) as usize)
        } else {
            format!("#b{:0>w$b}", value, w = width as usize)
        };
        self.bv_numeral(&token, width)
    }

    pub fn int_numeral(&mut self, digits: &str) -> NodeId {
        self.leaf(Kind::IntNumeral, Sort::Int, Some(digits))
    }

    /// A free constant. Declaring the same name and sort twice yields the same node.
    pub fn variable(&mut self, name: &str, sort: Sort) -> NodeId {
        self.leaf(Kind::Variable, sort, Some(name))
    }

    pub fn bound_variable(&mut self, name: &str, sort: Sort) -> NodeId {
        self.leaf(Kind::Bound, sort, Some(name))
    }

    pub fn app(&mut self, kind: Kind, args: &[NodeId]) -> Result<NodeId, SortError> {
        self.app_with_params(kind, &[], args)
    }

    pub fn app_with_params(
        &mut self,
        kind: Kind,
        params: &[u32],
        args: &[NodeId],
    ) -> Result<NodeId, SortError> {
        let arg_sorts: Vec<Sort> = args.iter().map(|a| self.sort(*a)).collect();
        let sort = kind.result_sort(params, &arg_sorts)?;
        Ok(self.intern(Node {
            kind,
            args: args.to_vec(),
            params: params.to_vec(),
            sort,
            symbol: None,
        }))
    }

    /// Application of an uninterpreted function symbol.
    pub fn apply(&mut self, name: &str, result: Sort, args: &[NodeId]) -> NodeId {
        self.intern(Node {
            kind: Kind::Apply,
            args: args.to_vec(),
            params: vec![],
            sort: result,
            symbol: Some(name.into()),
        })
    }

    /// `forall`/`exists` over `bound` (nodes made by [`Formula::bound_variable`]).
    pub fn quantifier(
        &mut self,
        forall: bool,
        bound: &[NodeId],
        body: NodeId,
    ) -> Result<NodeId, SortError> {
        let kind = if forall { Kind::Forall } else { Kind::Exists };
        if bound.is_empty() {
            return Err(SortError::Invalid {
                kind,
                reason: "no bound variables".to_string(),
            });
        }
        if let Some(v) = bound.iter().find(|v| self.node(**v).kind != Kind::Bound) {
            return Err(SortError::Invalid {
                kind,
                reason: format!("{v} is not a bound variable"),
            });
        }
        if !self.sort(body).is_bool() {
            return Err(SortError::Operand {
                kind,
                index: bound.len(),
                found: self.sort(body),
                expected: "Bool".to_string(),
            });
        }
        let mut args = bound.to_vec();
        args.push(body);
        Ok(self.intern(Node {
            kind,
            args,
            params: vec![],
            sort: Sort::Bool,
            symbol: None,
        }))
    }

    /// Conjunction of `conjuncts`: `true` when empty, the single conjunct when there is one.
    pub fn conjunction(&mut self, conjuncts: &[NodeId]) -> Result<NodeId, SortError> {
        match conjuncts {
            [] => Ok(self.bool_const(true)),
            [single] => Ok(*single),
            _ => self.app(Kind::And, conjuncts),
        }
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn sort(&self, id: NodeId) -> Sort {
        self.node(id).sort
    }

    pub fn kind(&self, id: NodeId) -> Kind {
        self.node(id).kind
    }

    pub fn decl(&self, id: NodeId) -> Decl<'_> {
        Decl::new(id, self.node(id))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    /// Free variables in order of creation.
    pub fn variables(&self) -> impl Iterator<Item = Decl<'_>> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.kind == Kind::Variable)
            .map(|(i, n)| Decl::new(NodeId(i as u32), n))
    }

    /// Nodes reachable from `root`, children before parents.
    pub fn post_order(&self, root: NodeId) -> Vec<NodeId> {
        let mut order = vec![];
        let mut visited = rustc_hash::FxHashSet::default();
        let mut stack = vec![(root, false)];
        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                order.push(id);
                continue;
            }
            if !visited.insert(id) {
                continue;
            }
            stack.push((id, true));
            for arg in self.node(id).args.iter().rev() {
                if !visited.contains(arg) {
                    stack.push((*arg, false));
                }
            }
        }
        order
    }
}
