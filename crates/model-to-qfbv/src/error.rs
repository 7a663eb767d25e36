// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

use smt_model::{Kind, LiteralError, NodeId, Sort};
use thiserror::Error;

/// Why a formula could not be translated.
///
/// All of these are detected before the first builder call, so a failed
/// translation leaves the target untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TranslateError {
    /// A construct the target fragment cannot express.
    #[error("node {node}: `{kind}` (kind {code:#x}) is not supported: {reason}")]
    Unsupported {
        node: NodeId,
        kind: Kind,
        code: u32,
        reason: &'static str,
    },
    #[error("node {node}: {source}")]
    MalformedLiteral {
        node: NodeId,
        #[source]
        source: LiteralError,
    },
    /// Missing or out-of-range integer parameters, wrong operand counts.
    #[error("node {node}: malformed `{kind}`: {reason}")]
    Malformed {
        node: NodeId,
        kind: Kind,
        reason: String,
    },
    #[error("node {0} does not belong to the formula")]
    UnknownNode(NodeId),
    #[error("node {node} has sort {sort} and cannot be asserted")]
    NotBoolean { node: NodeId, sort: Sort },
}

impl TranslateError {
    pub(crate) fn unsupported(node: NodeId, kind: Kind, reason: &'static str) -> Self {
        TranslateError::Unsupported {
            node,
            kind,
            code: kind.code(),
            reason,
        }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, TranslateError::Unsupported { .. })
    }
}
