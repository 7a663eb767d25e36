// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Translation from smt-model formulas to a [`TargetBuilder`]

use crate::error::TranslateError;
use log::{debug, trace, warn};
use qfbv_ir::{BinaryOp, TargetBuilder, UnaryOp};
use rustc_hash::{FxHashMap, FxHashSet};
use smt_model::{literal, Decl, Formula, Kind, NodeId, Sort};

type Result<T> = std::result::Result<T, TranslateError>;

/// How the target handles a node kind.
enum Support {
    Supported,
    /// Present in the source vocabulary but without a target construction.
    NotImplemented,
    /// Outside the boolean/bit-vector fragment.
    Outside(&'static str),
}

fn support(kind: Kind) -> Support {
    use Kind::*;
    match kind {
        True | False | BvNumeral | Variable => Support::Supported,
        Eq | Distinct | Ite | And | Or | Iff | Xor | Not | Implies => Support::Supported,
        BvNeg | BvAdd | BvSub | BvMul | BvSDiv | BvUDiv | BvSRem | BvURem | BvSMod => {
            Support::Supported
        }
        BvULe | BvSLe | BvUGe | BvSGe | BvULt | BvSLt | BvUGt | BvSGt => Support::Supported,
        BvAnd | BvOr | BvNot | BvXor | BvNand | BvNor | BvXnor => Support::Supported,
        Concat | SignExt | ZeroExt | Extract | Repeat | BvComp => Support::Supported,
        BvShl | BvLShr | BvAShr | RotateLeft | RotateRight => Support::Supported,
        BvSDiv0 | BvUDiv0 | BvSRem0 | BvURem0 | BvSMod0 => Support::NotImplemented,
        BvRedOr | BvRedAnd => Support::NotImplemented,
        ExtRotateLeft | ExtRotateRight => Support::NotImplemented,
        IntNumeral | IntAdd | IntSub | IntMul | IntNeg | IntLe | IntLt | IntGe | IntGt
        | Bv2Nat | Nat2Bv => Support::Outside("integer arithmetic"),
        Apply => Support::Outside("uninterpreted function"),
        Forall | Exists => Support::Outside("quantifier"),
        Bound => Support::Outside("bound variable"),
    }
}

/// Memoizing translator of one formula into one builder.
///
/// Each source node is converted at most once; later requests for the same
/// node return the cached handle. The cache lives as long as the translator,
/// so several roots of the same formula can share work.
pub struct Translator<'f, 'b, B: TargetBuilder> {
    formula: &'f Formula,
    builder: &'b mut B,
    cache: FxHashMap<NodeId, B::Handle>,
}

impl<'f, 'b, B: TargetBuilder> Translator<'f, 'b, B> {
    pub fn new(formula: &'f Formula, builder: &'b mut B) -> Self {
        Self {
            formula,
            builder,
            cache: FxHashMap::default(),
        }
    }

    /// Handle of an already translated node.
    pub fn lookup(&self, id: NodeId) -> Option<&B::Handle> {
        self.cache.get(&id)
    }

    pub fn builder(&mut self) -> &mut B {
        self.builder
    }

    /// Translates `root` and everything below it.
    ///
    /// Children are converted before their parents, left to right. The whole
    /// sub-DAG is checked first, so on error no builder method has been called.
    pub fn translate(&mut self, root: NodeId) -> Result<B::Handle> {
        if !self.formula.contains(root) {
            return Err(TranslateError::UnknownNode(root));
        }
        if let Some(handle) = self.cache.get(&root) {
            return Ok(handle.clone());
        }
        self.check_support(root)?;

        let cached_before = self.cache.len();
        // (node, children already scheduled)
        let mut stack = vec![(root, false)];
        while let Some((id, expanded)) = stack.pop() {
            if self.cache.contains_key(&id) {
                continue;
            }
            let decl = self.formula.decl(id);
            if !expanded && decl.arity() > 0 {
                stack.push((id, true));
                for child in decl.args().iter().rev() {
                    if !self.cache.contains_key(child) {
                        stack.push((*child, false));
                    }
                }
                continue;
            }
            let handle = self.convert(decl)?;
            trace!("{id} `{}` converted", decl.kind());
            self.cache.insert(id, handle);
        }
        debug!(
            "translated {} node(s) below {root}",
            self.cache.len() - cached_before
        );
        self.cache
            .get(&root)
            .cloned()
            .ok_or(TranslateError::UnknownNode(root))
    }

    /// Rejects everything below `root` that the target cannot express,
    /// reporting the node closest to the root first.
    fn check_support(&self, root: NodeId) -> Result<()> {
        let mut visited = FxHashSet::default();
        let mut worklist = vec![root];
        while let Some(id) = worklist.pop() {
            if self.cache.contains_key(&id) || !visited.insert(id) {
                continue;
            }
            let decl = self.formula.decl(id);
            self.check_node(&decl)?;
            worklist.extend(decl.args().iter().rev());
        }
        Ok(())
    }

    fn check_node(&self, decl: &Decl) -> Result<()> {
        let (id, kind) = (decl.id(), decl.kind());
        match support(kind) {
            Support::Supported => {}
            Support::NotImplemented => {
                return Err(TranslateError::unsupported(id, kind, "not implemented"))
            }
            Support::Outside(what) => return Err(TranslateError::unsupported(id, kind, what)),
        }
        if decl.sort() == Sort::BitVec(0) {
            return Err(malformed(decl, "zero-width bit-vector".to_string()));
        }
        match kind {
            Kind::Variable if decl.sort() == Sort::Int => {
                Err(TranslateError::unsupported(id, kind, "integer-sorted variable"))
            }
            Kind::BvNumeral => {
                let width = bv_width(decl)?;
                literal::decode(decl.numeral().unwrap_or_default(), width)
                    .map(|_| ())
                    .map_err(|source| TranslateError::MalformedLiteral { node: id, source })
            }
            _ if decl.sort() == Sort::Int => {
                Err(TranslateError::unsupported(id, kind, "integer-sorted term"))
            }
            _ => {
                let expected = kind.param_count();
                if decl.int_params().len() != expected {
                    return Err(malformed(
                        decl,
                        format!(
                            "expected {expected} integer parameter(s), found {}",
                            decl.int_params().len()
                        ),
                    ));
                }
                Ok(())
            }
        }
    }

    fn arg(&self, decl: &Decl, index: usize) -> Result<B::Handle> {
        decl.arg(index)
            .and_then(|a| self.cache.get(&a))
            .cloned()
            .ok_or_else(|| malformed(decl, format!("missing argument {index}")))
    }

    fn args(&self, decl: &Decl) -> Result<Vec<B::Handle>> {
        (0..decl.arity()).map(|i| self.arg(decl, i)).collect()
    }

    fn operand_width(&self, decl: &Decl) -> Result<u32> {
        let operand = decl
            .arg(0)
            .ok_or_else(|| malformed(decl, "missing argument 0".to_string()))?;
        bv_width(&self.formula.decl(operand))
    }

    fn convert(&mut self, decl: Decl) -> Result<B::Handle> {
        use Kind::*;
        let id = decl.id();
        let kind = decl.kind();
        let handle = match kind {
            // leaves
            True => self.builder.bool_lit(true),
            False => self.builder.bool_lit(false),
            BvNumeral => {
                let bits = literal::decode(decl.numeral().unwrap_or_default(), bv_width(&decl)?)
                    .map_err(|source| TranslateError::MalformedLiteral { node: id, source })?;
                self.builder.bv_bin(&bits)
            }
            Variable => {
                let name = decl.name().unwrap_or_default();
                match decl.sort() {
                    Sort::Bool => self.builder.new_bool(name),
                    Sort::BitVec(width) => self.builder.new_bv(name, width),
                    Sort::Int => {
                        return Err(TranslateError::unsupported(
                            id,
                            kind,
                            "integer-sorted variable",
                        ))
                    }
                }
            }

            // boolean structure
            Eq => {
                let args = self.args(&decl)?;
                self.chained_equality(&args)
            }
            Distinct => {
                let args = self.args(&decl)?;
                self.distinct(&args)
            }
            Ite => {
                let (c, t, e) = (self.arg(&decl, 0)?, self.arg(&decl, 1)?, self.arg(&decl, 2)?);
                self.builder.ite(c, t, e)
            }
            And => {
                let args = self.args(&decl)?;
                self.right_fold(BinaryOp::And, args, &decl)?
            }
            Or => {
                let args = self.args(&decl)?;
                self.right_fold(BinaryOp::Or, args, &decl)?
            }
            Iff => self.binary(BinaryOp::Equal, &decl)?,
            Xor => self.binary(BinaryOp::Xor, &decl)?,
            Implies => self.binary(BinaryOp::Implies, &decl)?,
            Not => self.unary(UnaryOp::Not, &decl)?,

            // arithmetic
            BvNeg => self.unary(UnaryOp::BvNeg, &decl)?,
            BvAdd => self.binary(BinaryOp::BvAdd, &decl)?,
            BvSub => self.binary(BinaryOp::BvSub, &decl)?,
            BvMul => self.binary(BinaryOp::BvMul, &decl)?,
            BvSDiv => self.binary(BinaryOp::BvSDiv, &decl)?,
            BvUDiv => self.binary(BinaryOp::BvUDiv, &decl)?,
            BvSRem => self.binary(BinaryOp::BvSRem, &decl)?,
            BvURem => self.binary(BinaryOp::BvURem, &decl)?,
            BvSMod => {
                // the target has no signed modulo; the remainder agrees whenever
                // the operands have the same sign
                warn!("{id}: translating `bvsmod` as `bvsrem`");
                self.binary(BinaryOp::BvSRem, &decl)?
            }

            // comparison
            BvULe => self.binary(BinaryOp::BvULe, &decl)?,
            BvSLe => self.binary(BinaryOp::BvSLe, &decl)?,
            BvUGe => self.binary(BinaryOp::BvUGe, &decl)?,
            BvSGe => self.binary(BinaryOp::BvSGe, &decl)?,
            BvULt => self.binary(BinaryOp::BvULt, &decl)?,
            BvSLt => self.binary(BinaryOp::BvSLt, &decl)?,
            BvUGt => self.binary(BinaryOp::BvUGt, &decl)?,
            BvSGt => self.binary(BinaryOp::BvSGt, &decl)?,

            // bitwise
            BvAnd => self.binary(BinaryOp::BvAnd, &decl)?,
            BvOr => self.binary(BinaryOp::BvOr, &decl)?,
            BvNot => self.unary(UnaryOp::BvNot, &decl)?,
            BvXor => self.binary(BinaryOp::BvXor, &decl)?,
            BvNand => self.binary(BinaryOp::BvNand, &decl)?,
            BvNor => self.binary(BinaryOp::BvNor, &decl)?,
            BvXnor => self.binary(BinaryOp::BvXnor, &decl)?,

            // structure
            Concat => self.binary(BinaryOp::Concat, &decl)?,
            SignExt | ZeroExt => {
                let by = bv_width(&decl)? - self.operand_width(&decl)?;
                let a = self.arg(&decl, 0)?;
                if kind == SignExt {
                    self.builder.sign_extend(by, a)
                } else {
                    self.builder.zero_extend(by, a)
                }
            }
            Extract => {
                let (hi, lo) = match (decl.hi(), decl.lo()) {
                    (Some(hi), Some(lo)) => (hi, lo),
                    _ => return Err(malformed(&decl, "missing bounds".to_string())),
                };
                let a = self.arg(&decl, 0)?;
                self.builder.extract(hi, lo, a)
            }
            Repeat => {
                let count = param(&decl, 0)?;
                let a = self.arg(&decl, 0)?;
                let mut repeated = a.clone();
                for _ in 1..count {
                    repeated = self.builder.binary(BinaryOp::Concat, repeated, a.clone());
                }
                repeated
            }
            BvComp => self.binary(BinaryOp::BvComp, &decl)?,

            // shifts and rotates
            BvShl => self.binary(BinaryOp::BvShl, &decl)?,
            BvLShr => self.binary(BinaryOp::BvLShr, &decl)?,
            BvAShr => self.binary(BinaryOp::BvAShr, &decl)?,
            RotateLeft | RotateRight => self.rotate(&decl)?,

            BvSDiv0 | BvUDiv0 | BvSRem0 | BvURem0 | BvSMod0 | BvRedOr | BvRedAnd
            | ExtRotateLeft | ExtRotateRight => {
                return Err(TranslateError::unsupported(id, kind, "not implemented"))
            }
            IntNumeral | IntAdd | IntSub | IntMul | IntNeg | IntLe | IntLt | IntGe | IntGt
            | Bv2Nat | Nat2Bv | Apply | Forall | Exists | Bound => {
                return Err(TranslateError::unsupported(
                    id,
                    kind,
                    "outside the bit-vector fragment",
                ))
            }
        };
        Ok(handle)
    }

    fn unary(&mut self, op: UnaryOp, decl: &Decl) -> Result<B::Handle> {
        let a = self.arg(decl, 0)?;
        Ok(self.builder.unary(op, a))
    }

    fn binary(&mut self, op: BinaryOp, decl: &Decl) -> Result<B::Handle> {
        let (a, b) = (self.arg(decl, 0)?, self.arg(decl, 1)?);
        Ok(self.builder.binary(op, a, b))
    }

    /// `op(c0, op(c1, ... op(c[n-2], c[n-1])))`
    fn right_fold(&mut self, op: BinaryOp, args: Vec<B::Handle>, decl: &Decl) -> Result<B::Handle> {
        let mut args = args.into_iter().rev();
        let mut acc = args
            .next()
            .ok_or_else(|| malformed(decl, "no arguments".to_string()))?;
        for arg in args {
            acc = self.builder.binary(op, arg, acc);
        }
        Ok(acc)
    }

    /// Equality of two operands, or of every adjacent pair when there are more.
    fn chained_equality(&mut self, args: &[B::Handle]) -> B::Handle {
        let mut pairs = args
            .windows(2)
            .map(|pair| {
                self.builder
                    .binary(BinaryOp::Equal, pair[0].clone(), pair[1].clone())
            })
            .collect::<Vec<_>>();
        let mut acc = match pairs.pop() {
            Some(last) => last,
            None => return self.builder.bool_lit(true),
        };
        while let Some(pair) = pairs.pop() {
            acc = self.builder.binary(BinaryOp::And, pair, acc);
        }
        acc
    }

    /// Pairwise disequality; more than two operands expand to a conjunction
    /// over all pairs `i < j`, starting from `true`.
    fn distinct(&mut self, args: &[B::Handle]) -> B::Handle {
        if let [a, b] = args {
            let eq = self.builder.binary(BinaryOp::Equal, a.clone(), b.clone());
            return self.builder.unary(UnaryOp::Not, eq);
        }
        let mut acc = self.builder.bool_lit(true);
        for (i, a) in args.iter().enumerate() {
            for b in &args[i + 1..] {
                let eq = self.builder.binary(BinaryOp::Equal, a.clone(), b.clone());
                let ne = self.builder.unary(UnaryOp::Not, eq);
                acc = self.builder.binary(BinaryOp::And, acc, ne);
            }
        }
        acc
    }

    fn rotate(&mut self, decl: &Decl) -> Result<B::Handle> {
        let width = bv_width(decl)?;
        let amount = param(decl, 0)?;
        let a = self.arg(decl, 0)?;
        let n = amount % width;
        if amount >= width {
            warn!(
                "{}: rotation by {amount} of a {width}-bit value reduced to {n}",
                decl.id()
            );
        }
        if n == 0 {
            return Ok(a);
        }
        let (high, low) = if decl.kind() == Kind::RotateLeft {
            (
                self.builder.extract(width - 1 - n, 0, a.clone()),
                self.builder.extract(width - 1, width - n, a),
            )
        } else {
            (
                self.builder.extract(n - 1, 0, a.clone()),
                self.builder.extract(width - 1, n, a),
            )
        };
        Ok(self.builder.binary(BinaryOp::Concat, high, low))
    }
}

fn malformed(decl: &Decl, reason: String) -> TranslateError {
    TranslateError::Malformed {
        node: decl.id(),
        kind: decl.kind(),
        reason,
    }
}

fn bv_width(decl: &Decl) -> Result<u32> {
    decl.bv_width()
        .ok_or_else(|| malformed(decl, format!("expected a bit-vector, found {}", decl.sort())))
}

fn param(decl: &Decl, index: usize) -> Result<u32> {
    decl.int_param(index)
        .ok_or_else(|| malformed(decl, format!("missing integer parameter {index}")))
}

/// Translates `root` into `builder` with a fresh cache.
pub fn translate<B: TargetBuilder>(
    formula: &Formula,
    root: NodeId,
    builder: &mut B,
) -> Result<B::Handle> {
    Translator::new(formula, builder).translate(root)
}

/// Translates a boolean `root` and asserts it.
pub fn translate_and_assert<B: TargetBuilder>(
    formula: &Formula,
    root: NodeId,
    builder: &mut B,
) -> Result<B::Handle> {
    if !formula.contains(root) {
        return Err(TranslateError::UnknownNode(root));
    }
    let sort = formula.sort(root);
    if sort != Sort::Bool {
        return Err(TranslateError::NotBoolean { node: root, sort });
    }
    let handle = translate(formula, root, builder)?;
    builder.assert(handle.clone());
    Ok(handle)
}
