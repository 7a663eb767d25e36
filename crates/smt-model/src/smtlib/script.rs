// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

use super::lexer::Token;
use super::sexpr::{read_all, SExpr};
use super::{LoadError, Span, Status};
use crate::formula::{Formula, NodeId, Sort};
use crate::kind::Kind;
use indexmap::IndexMap;
use itertools::Itertools;
use log::{debug, trace};
use num::{BigUint, Num, One};
use once_cell::sync::Lazy;
use regex::RegexSet;
use rustc_hash::FxHashMap;

type Result<T> = std::result::Result<T, LoadError>;

static NUMERAL: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"^#b[01]+$",         // binary
        r"^#x[[:xdigit:]]+$", // hex
        r"^[[:digit:]]+$",    // integer
    ])
    .unwrap()
});

/// A loaded benchmark.
#[derive(Debug, Clone)]
pub struct Script {
    pub formula: Formula,
    /// asserted formulas in script order
    pub assertions: Vec<NodeId>,
    /// conjunction of all assertions
    pub root: NodeId,
    pub logic: Option<String>,
    pub status: Option<Status>,
}

/// Loads an SMT-LIB2 script. Processing stops at `(exit)`.
pub fn parse_script(input: &str) -> Result<Script> {
    let commands = read_all(input)?;
    let mut elaborator = Elaborator::default();
    for command in &commands {
        if !elaborator.command(command)? {
            break;
        }
    }
    let Elaborator {
        mut formula,
        assertions,
        logic,
        status,
        ..
    } = elaborator;
    let root = formula
        .conjunction(&assertions)
        .map_err(|e| LoadError::new(e.to_string(), Span::default()))?;
    debug!(
        "loaded {} assertion(s), {} node(s)",
        assertions.len(),
        formula.len()
    );
    Ok(Script {
        formula,
        assertions,
        root,
        logic,
        status,
    })
}

#[derive(Debug, Clone)]
enum Symbol<'a> {
    Const(NodeId),
    Fun {
        params: Vec<Sort>,
        result: Sort,
    },
    Macro {
        params: Vec<(&'a str, Sort)>,
        body: &'a SExpr<'a>,
    },
}

/// How the elaborated arguments of an application are combined.
enum Op<'a> {
    Equality,
    Implies,
    LeftAssoc(Kind),
    Builtin(Kind, Vec<u32>),
    Fun {
        name: &'a str,
        params: Vec<Sort>,
        result: Sort,
    },
}

/// Pending elaboration work. Every `Term` leaves exactly one node on the
/// value stack.
enum Task<'a> {
    Term(&'a SExpr<'a>),
    Apply {
        op: Op<'a>,
        argc: usize,
        span: Span,
    },
    /// `let` body, once the bound values are on the value stack
    Bind {
        names: Vec<&'a str>,
        body: &'a SExpr<'a>,
    },
    PopScope,
    Quantifier {
        forall: bool,
        bound: Vec<NodeId>,
        span: Span,
    },
    Named(Vec<&'a SExpr<'a>>),
    Expand {
        name: &'a str,
        params: Vec<(&'a str, Sort)>,
        body: &'a SExpr<'a>,
        span: Span,
    },
    Restore(Vec<FxHashMap<&'a str, NodeId>>),
}

#[derive(Default)]
struct Elaborator<'a> {
    formula: Formula,
    symbols: IndexMap<&'a str, Symbol<'a>>,
    /// `let`, quantifier and macro parameter bindings, innermost last
    scopes: Vec<FxHashMap<&'a str, NodeId>>,
    assertions: Vec<NodeId>,
    logic: Option<String>,
    status: Option<Status>,
}

fn arity(command: &str, expected: &str, span: Span) -> LoadError {
    LoadError::new(format!("`{command}` expects {expected}"), span)
}

fn symbol<'a>(expr: &SExpr<'a>) -> Result<&'a str> {
    expr.symbol()
        .ok_or_else(|| LoadError::new("expected a symbol", expr.span()))
}

fn list<'a, 'b>(expr: &'b SExpr<'a>) -> Result<&'b [SExpr<'a>]> {
    expr.list()
        .ok_or_else(|| LoadError::new("expected a list", expr.span()))
}

fn index(expr: &SExpr) -> Result<u32> {
    symbol(expr)?
        .parse()
        .map_err(|_| LoadError::new("expected a numeral index", expr.span()))
}

/// Removes the topmost `n` values.
fn take(values: &mut Vec<NodeId>, n: usize) -> Vec<NodeId> {
    values.split_off(values.len() - n)
}

fn builtin(name: &str) -> Option<Kind> {
    use Kind::*;
    let kind = match name {
        "distinct" => Distinct,
        "ite" => Ite,
        "and" => And,
        "or" => Or,
        "not" => Not,
        "bvneg" => BvNeg,
        "bvsub" => BvSub,
        "bvsdiv" => BvSDiv,
        "bvudiv" => BvUDiv,
        "bvsrem" => BvSRem,
        "bvurem" => BvURem,
        "bvsmod" => BvSMod,
        "bvsdiv0" => BvSDiv0,
        "bvudiv0" => BvUDiv0,
        "bvsrem0" => BvSRem0,
        "bvurem0" => BvURem0,
        "bvsmod0" => BvSMod0,
        "bvule" => BvULe,
        "bvsle" => BvSLe,
        "bvuge" => BvUGe,
        "bvsge" => BvSGe,
        "bvult" => BvULt,
        "bvslt" => BvSLt,
        "bvugt" => BvUGt,
        "bvsgt" => BvSGt,
        "bvnot" => BvNot,
        "bvnand" => BvNand,
        "bvnor" => BvNor,
        "bvxnor" => BvXnor,
        "bvredor" => BvRedOr,
        "bvredand" => BvRedAnd,
        "bvcomp" => BvComp,
        "bvshl" => BvShl,
        "bvlshr" => BvLShr,
        "bvashr" => BvAShr,
        "ext_rotate_left" => ExtRotateLeft,
        "ext_rotate_right" => ExtRotateRight,
        "+" => IntAdd,
        "-" => IntSub,
        "*" => IntMul,
        "<=" => IntLe,
        "<" => IntLt,
        ">=" => IntGe,
        ">" => IntGt,
        "bv2nat" => Bv2Nat,
        _ => return None,
    };
    Some(kind)
}

/// Binary operators that SMT-LIB writes as left-associative chains.
fn left_assoc(name: &str) -> Option<Kind> {
    use Kind::*;
    match name {
        "xor" => Some(Xor),
        "bvadd" => Some(BvAdd),
        "bvmul" => Some(BvMul),
        "bvand" => Some(BvAnd),
        "bvor" => Some(BvOr),
        "bvxor" => Some(BvXor),
        "concat" => Some(Concat),
        _ => None,
    }
}

impl<'a> Elaborator<'a> {
    /// Returns `false` once the script asks to stop.
    fn command(&mut self, command: &'a SExpr<'a>) -> Result<bool> {
        let span = command.span();
        let items = list(command)?;
        let Some((head, rest)) = items.split_first() else {
            return Err(LoadError::new("empty command", span));
        };
        let name = symbol(head)?;
        trace!("command `{name}`");
        match name {
            "set-logic" => {
                let [logic] = rest else {
                    return Err(arity(name, "a logic name", span));
                };
                self.logic = Some(symbol(logic)?.to_string());
            }
            "set-info" => {
                if let [SExpr::Atom(Token::Keyword(":status"), _), value] = rest {
                    let status = symbol(value)?
                        .parse::<Status>()
                        .map_err(|msg| LoadError::new(msg, value.span()))?;
                    self.status = Some(status);
                }
            }
            "set-option" | "check-sat" | "get-model" | "get-value" | "get-info"
            | "get-assignment" | "get-unsat-core" | "get-assertions" | "echo" => {
                debug!("ignoring `{name}`");
            }
            "declare-const" => {
                let [id, sort] = rest else {
                    return Err(arity(name, "a name and a sort", span));
                };
                let (id, sort) = (symbol(id)?, self.sort(sort)?);
                let var = self.formula.variable(id, sort);
                self.define(id, Symbol::Const(var), span)?;
            }
            "declare-fun" => {
                let [id, params, result] = rest else {
                    return Err(arity(name, "a name, parameter sorts and a sort", span));
                };
                let id = symbol(id)?;
                let params = list(params)?
                    .iter()
                    .map(|s| self.sort(s))
                    .collect::<Result<Vec<_>>>()?;
                let result = self.sort(result)?;
                let symbol = if params.is_empty() {
                    Symbol::Const(self.formula.variable(id, result))
                } else {
                    Symbol::Fun { params, result }
                };
                self.define(id, symbol, span)?;
            }
            "define-fun" => {
                let [id, params, result, body] = rest else {
                    return Err(arity(name, "a name, parameters, a sort and a body", span));
                };
                self.define_fun(symbol(id)?, params, result, body, span)?;
            }
            "assert" => {
                let [term] = rest else {
                    return Err(arity(name, "one term", span));
                };
                let id = self.term(term)?;
                if !self.formula.sort(id).is_bool() {
                    return Err(LoadError::new(
                        format!("asserted term has sort {}", self.formula.sort(id)),
                        term.span(),
                    ));
                }
                self.assertions.push(id);
            }
            "exit" => return Ok(false),
            "push" | "pop" | "reset" | "reset-assertions" | "check-sat-assuming"
            | "define-sort" | "declare-sort" | "define-fun-rec" | "define-funs-rec"
            | "declare-datatype" | "declare-datatypes" => {
                return Err(LoadError::new(
                    format!("unsupported command `{name}`"),
                    span,
                ));
            }
            other => {
                return Err(LoadError::new(format!("unknown command `{other}`"), span));
            }
        }
        Ok(true)
    }

    fn define(&mut self, name: &'a str, symbol: Symbol<'a>, span: Span) -> Result<()> {
        if self.symbols.contains_key(name) {
            return Err(LoadError::new(
                format!("`{name}` is already declared"),
                span,
            ));
        }
        self.symbols.insert(name, symbol);
        Ok(())
    }

    fn define_fun(
        &mut self,
        name: &'a str,
        params: &'a SExpr<'a>,
        result: &'a SExpr<'a>,
        body: &'a SExpr<'a>,
        span: Span,
    ) -> Result<()> {
        let params = list(params)?
            .iter()
            .map(|p| match list(p)? {
                [id, sort] => Ok((symbol(id)?, self.sort(sort)?)),
                _ => Err(LoadError::new("expected `(name sort)`", p.span())),
            })
            .collect::<Result<Vec<_>>>()?;
        let result = self.sort(result)?;

        // the body is checked once against placeholder parameters and
        // expanded again at every application
        let bound = params
            .iter()
            .map(|(id, sort)| (*id, self.formula.bound_variable(id, *sort)))
            .collect();
        self.scopes.push(bound);
        let checked = self.term(body);
        self.scopes.pop();
        let checked = checked?;
        if self.formula.sort(checked) != result {
            return Err(LoadError::new(
                format!(
                    "`{name}` is declared as {result} but its body has sort {}",
                    self.formula.sort(checked)
                ),
                body.span(),
            ));
        }

        let symbol = if params.is_empty() {
            Symbol::Const(checked)
        } else {
            Symbol::Macro { params, body }
        };
        self.define(name, symbol, span)
    }

    fn sort(&self, expr: &SExpr<'a>) -> Result<Sort> {
        match expr {
            SExpr::Atom(Token::Symbol("Bool"), _) => Ok(Sort::Bool),
            SExpr::Atom(Token::Symbol("Int"), _) => Ok(Sort::Int),
            SExpr::List(items, span) => match items.as_slice() {
                [underscore, bitvec, width]
                    if underscore.is_symbol("_") && bitvec.is_symbol("BitVec") =>
                {
                    match index(width)? {
                        0 => Err(LoadError::new("bit-vector sorts need a width", *span)),
                        w => Ok(Sort::BitVec(w)),
                    }
                }
                _ => Err(LoadError::new("unsupported sort", *span)),
            },
            other => Err(LoadError::new("unsupported sort", other.span())),
        }
    }

    /// Elaborates a term with an explicit work stack, so nesting depth is
    /// bounded by the heap.
    fn term(&mut self, expr: &'a SExpr<'a>) -> Result<NodeId> {
        let mut tasks = vec![Task::Term(expr)];
        let mut values: Vec<NodeId> = vec![];
        while let Some(task) = tasks.pop() {
            match task {
                Task::Term(expr) => {
                    let id = match expr {
                        SExpr::Atom(Token::Symbol(s), span) => self.atom(*s, *span, false)?,
                        SExpr::Atom(Token::Quoted(s), span) => self.atom(*s, *span, true)?,
                        SExpr::Atom(_, span) => {
                            return Err(LoadError::new("expected a term", *span))
                        }
                        SExpr::List(items, span) => {
                            match self.application(items, *span, &mut tasks)? {
                                Some(id) => id,
                                None => continue,
                            }
                        }
                    };
                    values.push(id);
                }
                Task::Apply { op, argc, span } => {
                    let args = take(&mut values, argc);
                    values.push(self.apply(op, &args, span)?);
                }
                Task::Bind { names, body } => {
                    let bound = take(&mut values, names.len());
                    // later bindings of the same name win
                    self.scopes.push(names.into_iter().zip(bound).collect());
                    tasks.push(Task::PopScope);
                    tasks.push(Task::Term(body));
                }
                Task::PopScope => {
                    self.scopes.pop();
                }
                Task::Quantifier {
                    forall,
                    bound,
                    span,
                } => {
                    self.scopes.pop();
                    let body = take(&mut values, 1)[0];
                    let id = self
                        .formula
                        .quantifier(forall, &bound, body)
                        .map_err(|e| LoadError::new(e.to_string(), span))?;
                    values.push(id);
                }
                Task::Named(names) => {
                    let id = values[values.len() - 1];
                    for name in names {
                        self.define(symbol(name)?, Symbol::Const(id), name.span())?;
                    }
                }
                Task::Expand {
                    name,
                    params,
                    body,
                    span,
                } => {
                    let args = take(&mut values, params.len());
                    let expected: Vec<Sort> = params.iter().map(|(_, s)| *s).collect();
                    self.check_arguments(name, &expected, &args, span)?;
                    // macro bodies only see their parameters and global symbols
                    let bindings = params.iter().map(|(id, _)| *id).zip(args).collect();
                    let outer = std::mem::replace(&mut self.scopes, vec![bindings]);
                    tasks.push(Task::Restore(outer));
                    tasks.push(Task::Term(body));
                }
                Task::Restore(outer) => self.scopes = outer,
            }
        }
        debug_assert_eq!(values.len(), 1);
        values
            .pop()
            .ok_or_else(|| LoadError::new("expected a term", expr.span()))
    }

    fn atom(&mut self, text: &'a str, span: Span, quoted: bool) -> Result<NodeId> {
        if !quoted {
            if text == "true" || text == "false" {
                return Ok(self.formula.bool_const(text == "true"));
            }
            match NUMERAL.matches(text).into_iter().next() {
                Some(0) => return Ok(self.formula.bv_numeral(text, text.len() as u32 - 2)),
                Some(1) => {
                    return Ok(self
                        .formula
                        .bv_numeral(text, 4 * (text.len() as u32 - 2)))
                }
                Some(_) => return Ok(self.formula.int_numeral(text)),
                None if text.starts_with('#') => {
                    return Err(LoadError::new(format!("malformed numeral `{text}`"), span))
                }
                None => {}
            }
        }
        if let Some(id) = self.scopes.iter().rev().find_map(|s| s.get(text)) {
            return Ok(*id);
        }
        match self.symbols.get(text) {
            Some(Symbol::Const(id)) => Ok(*id),
            Some(_) => Err(LoadError::new(
                format!("`{text}` is a function and needs arguments"),
                span,
            )),
            None => Err(LoadError::new(format!("unknown symbol `{text}`"), span)),
        }
    }

    /// Schedules the operands of a list term. Terms that need no further
    /// elaboration are returned directly.
    fn application(
        &mut self,
        items: &'a [SExpr<'a>],
        span: Span,
        tasks: &mut Vec<Task<'a>>,
    ) -> Result<Option<NodeId>> {
        let Some((head, args)) = items.split_first() else {
            return Err(LoadError::new("empty term", span));
        };
        let op = match head {
            SExpr::List(indexed, head_span) => self.indexed(indexed, *head_span)?,
            SExpr::Atom(token, _) => {
                let name = symbol(head)?;
                if matches!(token, Token::Symbol(_)) {
                    match name {
                        "_" => return self.indexed_constant(args, span).map(Some),
                        "let" => return self.let_term(args, span, tasks).map(|_| None),
                        "!" => return self.annotation(args, span, tasks).map(|_| None),
                        "forall" | "exists" => {
                            return self
                                .quantifier(name == "forall", args, span, tasks)
                                .map(|_| None)
                        }
                        _ => {}
                    }
                }
                match self.symbols.get(name).cloned() {
                    Some(Symbol::Const(_)) => {
                        return Err(LoadError::new(
                            format!("`{name}` is a constant and takes no arguments"),
                            span,
                        ))
                    }
                    Some(Symbol::Fun { params, result }) => Op::Fun {
                        name,
                        params,
                        result,
                    },
                    Some(Symbol::Macro { params, body }) => {
                        tasks.push(Task::Expand {
                            name,
                            params,
                            body,
                            span,
                        });
                        tasks.extend(args.iter().rev().map(Task::Term));
                        return Ok(None);
                    }
                    None => match name {
                        "=" => Op::Equality,
                        "=>" => Op::Implies,
                        "-" if args.len() == 1 => Op::Builtin(Kind::IntNeg, vec![]),
                        _ => match (left_assoc(name), builtin(name)) {
                            (Some(kind), _) => Op::LeftAssoc(kind),
                            (None, Some(kind)) => Op::Builtin(kind, vec![]),
                            (None, None) => {
                                return Err(LoadError::new(
                                    format!("unknown function `{name}`"),
                                    head.span(),
                                ))
                            }
                        },
                    },
                }
            }
        };
        tasks.push(Task::Apply {
            op,
            argc: args.len(),
            span,
        });
        tasks.extend(args.iter().rev().map(Task::Term));
        Ok(None)
    }

    fn apply(&mut self, op: Op<'a>, args: &[NodeId], span: Span) -> Result<NodeId> {
        match op {
            Op::Equality => self.equality(args, span),
            Op::Implies => self.fold_right(Kind::Implies, args, span),
            Op::LeftAssoc(kind) => self.fold_left(kind, args, span),
            Op::Builtin(kind, params) => self.build(kind, &params, args, span),
            Op::Fun {
                name,
                params,
                result,
            } => {
                self.check_arguments(name, &params, args, span)?;
                Ok(self.formula.apply(name, result, args))
            }
        }
    }

    fn check_arguments(
        &self,
        name: &str,
        expected: &[Sort],
        args: &[NodeId],
        span: Span,
    ) -> Result<()> {
        let sorts: Vec<Sort> = args.iter().map(|a| self.formula.sort(*a)).collect();
        if sorts == expected {
            return Ok(());
        }
        Err(LoadError::new(
            format!(
                "`{name}` expects arguments ({}) but got ({})",
                expected.iter().join(" "),
                sorts.iter().join(" ")
            ),
            span,
        ))
    }

    fn build(&mut self, kind: Kind, params: &[u32], args: &[NodeId], span: Span) -> Result<NodeId> {
        self.formula
            .app_with_params(kind, params, args)
            .map_err(|e| LoadError::new(e.to_string(), span))
    }

    fn fold_left(&mut self, kind: Kind, args: &[NodeId], span: Span) -> Result<NodeId> {
        match args {
            [first, second, rest @ ..] => {
                let mut acc = self.build(kind, &[], &[*first, *second], span)?;
                for arg in rest {
                    acc = self.build(kind, &[], &[acc, *arg], span)?;
                }
                Ok(acc)
            }
            _ => self.build(kind, &[], args, span),
        }
    }

    fn fold_right(&mut self, kind: Kind, args: &[NodeId], span: Span) -> Result<NodeId> {
        match args {
            [rest @ .., before, last] => {
                let mut acc = self.build(kind, &[], &[*before, *last], span)?;
                for arg in rest.iter().rev() {
                    acc = self.build(kind, &[], &[*arg, acc], span)?;
                }
                Ok(acc)
            }
            _ => self.build(kind, &[], args, span),
        }
    }

    /// `(= a b c)` is `(and (= a b) (= b c))`; equality of booleans is `iff`.
    fn equality(&mut self, args: &[NodeId], span: Span) -> Result<NodeId> {
        let kind = match args.first() {
            Some(first) if self.formula.sort(*first).is_bool() => Kind::Iff,
            _ => Kind::Eq,
        };
        if args.len() < 2 {
            return self.build(Kind::Eq, &[], args, span);
        }
        let pairs = args
            .windows(2)
            .map(|pair| self.build(kind, &[], pair, span))
            .collect::<Result<Vec<_>>>()?;
        match pairs.as_slice() {
            [single] => Ok(*single),
            _ => self.build(Kind::And, &[], &pairs, span),
        }
    }

    /// `(_ name index...)` heads.
    fn indexed(&self, indexed: &[SExpr<'a>], head_span: Span) -> Result<Op<'a>> {
        let [underscore, name, indices @ ..] = indexed else {
            return Err(LoadError::new("expected `(_ name index...)`", head_span));
        };
        if !underscore.is_symbol("_") {
            return Err(LoadError::new("expected `(_ name index...)`", head_span));
        }
        let kind = match symbol(name)? {
            "extract" => Kind::Extract,
            "zero_extend" => Kind::ZeroExt,
            "sign_extend" => Kind::SignExt,
            "repeat" => Kind::Repeat,
            "rotate_left" => Kind::RotateLeft,
            "rotate_right" => Kind::RotateRight,
            "nat2bv" => Kind::Nat2Bv,
            other => {
                return Err(LoadError::new(
                    format!("unknown indexed function `{other}`"),
                    name.span(),
                ))
            }
        };
        let params = indices.iter().map(index).collect::<Result<Vec<_>>>()?;
        Ok(Op::Builtin(kind, params))
    }

    /// `(_ bvN W)`
    fn indexed_constant(&mut self, args: &[SExpr<'a>], span: Span) -> Result<NodeId> {
        let [value, width] = args else {
            return Err(LoadError::new("expected `(_ bvN width)`", span));
        };
        let digits = symbol(value)?
            .strip_prefix("bv")
            .filter(|d| !d.is_empty() && d.bytes().all(|b| b.is_ascii_digit()))
            .ok_or_else(|| LoadError::new("expected `bvN`", value.span()))?;
        let width = index(width)?;
        if width == 0 {
            return Err(LoadError::new("bit-vector sorts need a width", span));
        }
        let value = BigUint::from_str_radix(digits, 10)
            .map_err(|_| LoadError::new("expected `bvN`", value.span()))?;
        let value = value % (BigUint::one() << width as usize);
        let token = if width % 4 == 0 {
            format!("#x{:0>w$}", value.to_str_radix(16), w = (width / 4) as usize)
        } else {
            format!("#b{:0>w$}", value.to_str_radix(2), w = width as usize)
        };
        Ok(self.formula.bv_numeral(&token, width))
    }

    /// Bindings are parallel: all values are elaborated in the outer scope.
    fn let_term(
        &mut self,
        args: &'a [SExpr<'a>],
        span: Span,
        tasks: &mut Vec<Task<'a>>,
    ) -> Result<()> {
        let [bindings, body] = args else {
            return Err(arity("let", "bindings and a body", span));
        };
        let mut names = vec![];
        let mut values = vec![];
        for binding in list(bindings)? {
            let [id, value] = list(binding)? else {
                return Err(LoadError::new("expected `(name term)`", binding.span()));
            };
            names.push(symbol(id)?);
            values.push(value);
        }
        tasks.push(Task::Bind { names, body });
        tasks.extend(values.into_iter().rev().map(Task::Term));
        Ok(())
    }

    fn annotation(
        &mut self,
        args: &'a [SExpr<'a>],
        span: Span,
        tasks: &mut Vec<Task<'a>>,
    ) -> Result<()> {
        let Some((term, attributes)) = args.split_first() else {
            return Err(arity("!", "a term and attributes", span));
        };
        let names = attributes
            .windows(2)
            .filter_map(|pair| match pair {
                [SExpr::Atom(Token::Keyword(":named"), _), name] => Some(name),
                _ => None,
            })
            .collect();
        tasks.push(Task::Named(names));
        tasks.push(Task::Term(term));
        Ok(())
    }

    /// Opens the scope of the bound variables; the `Quantifier` task
    /// closes it once the body is elaborated.
    fn quantifier(
        &mut self,
        forall: bool,
        args: &'a [SExpr<'a>],
        span: Span,
        tasks: &mut Vec<Task<'a>>,
    ) -> Result<()> {
        let [vars, body] = args else {
            return Err(arity(
                if forall { "forall" } else { "exists" },
                "sorted variables and a body",
                span,
            ));
        };
        let mut scope = FxHashMap::default();
        let mut bound = vec![];
        for var in list(vars)? {
            let [id, sort] = list(var)? else {
                return Err(LoadError::new("expected `(name sort)`", var.span()));
            };
            let (id, sort) = (symbol(id)?, self.sort(sort)?);
            let node = self.formula.bound_variable(id, sort);
            scope.insert(id, node);
            bound.push(node);
        }
        self.scopes.push(scope);
        tasks.push(Task::Quantifier {
            forall,
            bound,
            span,
        });
        tasks.push(Task::Term(body));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::{evaluate, Env, Value};

    fn root_value(script: &Script, env: &Env) -> Value {
        evaluate(&script.formula, script.root, env).unwrap()
    }

    #[test]
    fn declarations_and_assertions() {
        let script = parse_script(
            r#"
            (set-logic QF_BV)
            (set-info :status sat)
            (declare-fun x () (_ BitVec 8))
            (declare-const p Bool)
            (assert (= (bvadd x #x01) #x10))
            (assert (or p (bvult x (_ bv3 8))))
            (check-sat)
            "#,
        )
        .unwrap();
        assert_eq!(script.logic.as_deref(), Some("QF_BV"));
        assert_eq!(script.status, Some(Status::Sat));
        assert_eq!(script.assertions.len(), 2);
        assert_eq!(script.formula.kind(script.root), Kind::And);

        let vars: Vec<_> = script.formula.variables().map(|d| d.id()).collect();
        let mut env = Env::default();
        env.insert(vars[0], Value::bv(8, 0x0f));
        env.insert(vars[1], Value::Bool(true));
        assert_eq!(root_value(&script, &env), Value::Bool(true));
        env.insert(vars[0], Value::bv(8, 0x0e));
        assert_eq!(root_value(&script, &env), Value::Bool(false));
    }

    #[test]
    fn no_assertions_is_true() {
        let script = parse_script("(check-sat)").unwrap();
        assert_eq!(script.formula.kind(script.root), Kind::True);
        let script = parse_script("(declare-const p Bool)(assert p)").unwrap();
        assert_eq!(script.root, script.assertions[0]);
    }

    #[test]
    fn normalisation_of_chains() {
        let script = parse_script(
            r#"
            (declare-const a (_ BitVec 4))
            (declare-const b (_ BitVec 4))
            (declare-const c (_ BitVec 4))
            (declare-const p Bool)
            (declare-const q Bool)
            (assert (= a b c))
            (assert (= p q))
            (assert (=> p q p))
            (assert (= (bvadd a b c) (concat (_ bv0 2) ((_ extract 1 0) a))))
            "#,
        )
        .unwrap();
        let f = &script.formula;
        let [chain, iff, implies, sum] = script.assertions[..] else {
            panic!("expected four assertions");
        };
        assert_eq!(f.kind(chain), Kind::And);
        assert_eq!(f.decl(chain).arity(), 2);
        assert_eq!(f.kind(iff), Kind::Iff);
        // p => (q => p)
        assert_eq!(f.kind(implies), Kind::Implies);
        assert_eq!(f.kind(f.decl(implies).arg(1).unwrap()), Kind::Implies);
        // ((a + b) + c)
        let lhs = f.decl(sum).arg(0).unwrap();
        assert_eq!(f.kind(f.decl(lhs).arg(0).unwrap()), Kind::BvAdd);
        let zero = f.decl(f.decl(sum).arg(1).unwrap()).arg(0).unwrap();
        assert_eq!(f.decl(zero).numeral(), Some("#b00"));
    }

    #[test]
    fn let_macros_and_names() {
        let script = parse_script(
            r#"
            (declare-const x (_ BitVec 8))
            (define-fun double ((v (_ BitVec 8))) (_ BitVec 8) (bvadd v v))
            (define-fun limit () (_ BitVec 8) (_ bv200 8))
            (assert (! (let ((y (double x)) (x #x01)) (bvult y (bvadd limit x))) :named small))
            (assert small)
            "#,
        )
        .unwrap();
        assert_eq!(script.assertions[0], script.assertions[1]);
        let x = script.formula.variables().next().unwrap().id();
        let mut env = Env::default();
        env.insert(x, Value::bv(8, 100));
        assert_eq!(root_value(&script, &env), Value::Bool(true));
        env.insert(x, Value::bv(8, 101));
        assert_eq!(root_value(&script, &env), Value::Bool(false));
    }

    #[test]
    fn quantifiers_and_integers_are_loaded() {
        let script = parse_script(
            r#"
            (declare-fun f ((_ BitVec 4)) Bool)
            (assert (forall ((z (_ BitVec 4))) (f z)))
            (assert (< (- 1) (+ 2 3)))
            "#,
        )
        .unwrap();
        assert_eq!(script.formula.kind(script.assertions[0]), Kind::Forall);
        assert_eq!(script.formula.kind(script.assertions[1]), Kind::IntLt);
    }

    #[test]
    fn errors_point_at_the_offending_text() {
        let input = "(declare-const x (_ BitVec 8))\n(assert (bvadd x #b1))";
        let err = parse_script(input).unwrap_err();
        assert_eq!(&input[err.span.start..err.span.end], "(bvadd x #b1)");

        let err = parse_script("(assert (foo))").unwrap_err();
        assert!(err.message.contains("unknown function `foo`"));

        let err = parse_script("(push 1)").unwrap_err();
        assert!(err.message.contains("unsupported command"));

        let err = parse_script("(declare-const x Bool)(declare-const x Bool)").unwrap_err();
        assert!(err.message.contains("already declared"));

        let err = parse_script("(assert #b102)").unwrap_err();
        assert!(err.message.contains("malformed numeral"));
    }

    #[test]
    fn exit_stops_processing() {
        let script = parse_script("(assert false)(exit)(assert (foo))").unwrap();
        assert_eq!(script.assertions.len(), 1);
    }

    #[test]
    fn deeply_nested_terms() {
        let depth = 100_000;
        let input = format!(
            "(declare-const p Bool)(assert {}p{})",
            "(not ".repeat(depth),
            ")".repeat(depth + 1)
        );
        let script = parse_script(&input).unwrap();
        let f = &script.formula;
        let mut id = script.root;
        let mut negations = 0;
        while f.kind(id) == Kind::Not {
            id = f.decl(id).arg(0).unwrap();
            negations += 1;
        }
        assert_eq!(negations, depth);
        assert_eq!(f.kind(id), Kind::Variable);

        let mut env = Env::default();
        // an even number of negations
        env.insert(id, Value::Bool(false));
        assert_eq!(root_value(&script, &env), Value::Bool(false));
    }

    #[test]
    fn deeply_nested_lets_and_macros() {
        let depth = 100_000;
        let input = format!(
            "(declare-const x (_ BitVec 8))
             (define-fun inc ((v (_ BitVec 8))) (_ BitVec 8) (bvadd v #x01))
             (assert (= x {}x{}))",
            "(let ((x (inc x))) ".repeat(depth),
            ")".repeat(depth)
        );
        let script = parse_script(&input).unwrap();
        let x = script.formula.variables().next().unwrap().id();
        let mut env = Env::default();
        // 100000 mod 256 is 160, and x = x + 160 never holds
        env.insert(x, Value::bv(8, 7));
        assert_eq!(root_value(&script, &env), Value::Bool(false));
        let [_, sum] = script.formula.decl(script.root).args()[..] else {
            panic!("expected an equality");
        };
        assert_eq!(script.formula.kind(sum), Kind::BvAdd);
    }
}
