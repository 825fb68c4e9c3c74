//! Thin Node Architecture for the stub AST
//!
//! Each node is a 16-byte header (`Node`) holding the kind, flags, source span
//! and an index into a typed storage pool. Nodes that need no extra data
//! (names, numbers, strings, `...`) keep `data_index == Node::NO_DATA` and read
//! their text straight from the source.
//!
//! Pools are grouped by node category. The `data_index` of a node is only
//! meaningful together with its `kind`.

use super::base::{NodeIndex, NodeList};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A thin 16-byte node header.
///
/// Layout:
/// - `kind`: 2 bytes (token kind or `syntax_kind_ext` value)
/// - `flags`: 2 bytes (`node_flags`)
/// - `pos`: 4 bytes (start byte offset)
/// - `end`: 4 bytes (end byte offset)
/// - `data_index`: 4 bytes (index into the pool for `kind`, `u32::MAX` = no data)
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub kind: u16,
    pub flags: u16,
    pub pos: u32,
    pub end: u32,
    pub data_index: u32,
}

impl Node {
    pub const NO_DATA: u32 = u32::MAX;

    #[inline]
    pub fn new(kind: u16, pos: u32, end: u32) -> Node {
        Node {
            kind,
            flags: 0,
            pos,
            end,
            data_index: Self::NO_DATA,
        }
    }

    #[inline]
    pub fn with_data(kind: u16, pos: u32, end: u32, data_index: u32) -> Node {
        Node {
            kind,
            flags: 0,
            pos,
            end,
            data_index,
        }
    }

    #[inline]
    pub fn has_data(&self) -> bool {
        self.data_index != Self::NO_DATA
    }

    #[inline]
    pub fn has_flag(&self, flag: u16) -> bool {
        self.flags & flag != 0
    }
}

// =============================================================================
// Typed Data Pools - statements
// =============================================================================

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModuleData {
    pub statements: NodeList,
}

/// `import a.b as c, d`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ImportData {
    pub names: NodeList,
}

/// One `name [as asname]` entry of an import statement.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ImportAliasData {
    /// Dotted name as written, without whitespace.
    pub name: String,
    pub asname: Option<String>,
}

/// `from [.]module import names`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ImportFromData {
    /// Number of leading dots.
    pub level: u32,
    pub module: Option<String>,
    pub names: NodeList,
    pub is_star: bool,
    pub parenthesized: bool,
    /// Span of the names region: the parentheses when parenthesized,
    /// otherwise first name to last name.
    pub names_pos: u32,
    pub names_end: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClassData {
    pub decorators: NodeList,
    pub name: NodeIndex,
    /// `TYPE_PARAMETER_LIST` or `NONE`
    pub type_parameters: NodeIndex,
    /// `ARGUMENT_LIST` or `NONE`
    pub arguments: NodeIndex,
    pub body: NodeIndex,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FunctionData {
    pub decorators: NodeList,
    pub is_async: bool,
    pub name: NodeIndex,
    pub type_parameters: NodeIndex,
    pub parameters: NodeIndex,
    pub returns: NodeIndex,
    pub body: NodeIndex,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct DecoratorData {
    pub expression: NodeIndex,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParameterListData {
    pub parameters: NodeList,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterKind {
    Normal,
    /// `*args`
    VarPositional,
    /// `**kwargs`
    VarKeyword,
    /// bare `*`
    KeywordOnlyMarker,
    /// `/`
    PositionalOnlyMarker,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ParameterData {
    pub kind: ParameterKind,
    pub name: NodeIndex,
    pub annotation: NodeIndex,
    pub default: NodeIndex,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TypeParameterListData {
    pub parameters: NodeList,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeParameterKind {
    /// `T`
    TypeVar,
    /// `*Ts`
    TypeVarTuple,
    /// `**P`
    ParamSpec,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct TypeParameterData {
    pub kind: TypeParameterKind,
    pub name: NodeIndex,
    pub bound: NodeIndex,
    /// May be a `STARRED` node for `*Ts = *tuple[int, ...]`.
    pub default: NodeIndex,
}

/// `type Name[params] = value`
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct TypeAliasData {
    pub name: NodeIndex,
    pub type_parameters: NodeIndex,
    pub value: NodeIndex,
}

/// `a = b = value`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AssignmentData {
    pub targets: NodeList,
    pub value: NodeIndex,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct AnnotatedAssignmentData {
    pub target: NodeIndex,
    pub annotation: NodeIndex,
    pub value: NodeIndex,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct AugmentedAssignmentData {
    pub target: NodeIndex,
    pub operator: u16,
    pub value: NodeIndex,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ExpressionStatementData {
    pub expression: NodeIndex,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct IfStatementData {
    pub condition: NodeIndex,
    pub then_block: NodeIndex,
    /// `BLOCK`, `IF_STATEMENT` for `elif`, or `NONE`
    pub else_block: NodeIndex,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlockData {
    pub statements: NodeList,
}

/// Simple keyword statements and opaque compound statements.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct KeywordStatementData {
    pub keyword: u16,
}

// =============================================================================
// Typed Data Pools - expressions
// =============================================================================

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct AttributeData {
    pub expression: NodeIndex,
    /// `NAME` node
    pub name: NodeIndex,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SubscriptData {
    pub expression: NodeIndex,
    /// A single expression, a `SLICE`, or an unparenthesized `TUPLE`.
    pub slice: NodeIndex,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SliceData {
    pub lower: NodeIndex,
    pub upper: NodeIndex,
    pub step: NodeIndex,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct CallData {
    pub expression: NodeIndex,
    /// `ARGUMENT_LIST`
    pub arguments: NodeIndex,
}

/// Parenthesized argument list of a call or class definition. The node span
/// covers both parentheses.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ArgumentListData {
    pub arguments: NodeList,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct KeywordArgumentData {
    pub name: NodeIndex,
    pub value: NodeIndex,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct StarredData {
    pub expression: NodeIndex,
}

/// Elements of a `TUPLE`, `LIST` or `SET`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SequenceData {
    pub elements: NodeList,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DictData {
    /// `NONE` key marks a `**mapping` entry.
    pub keys: Vec<NodeIndex>,
    pub values: Vec<NodeIndex>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct BinaryExprData {
    pub left: NodeIndex,
    pub operator_token: u16,
    pub right: NodeIndex,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct UnaryExprData {
    pub operator: u16,
    pub operand: NodeIndex,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ConditionalExprData {
    pub condition: NodeIndex,
    pub when_true: NodeIndex,
    pub when_false: NodeIndex,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct LambdaData {
    /// `PARAMETER_LIST` or `NONE`
    pub parameters: NodeIndex,
    pub body: NodeIndex,
}

// =============================================================================
// Arena
// =============================================================================

/// Arena storage for one parsed module.
#[derive(Clone, Debug)]
pub struct NodeArena {
    pub nodes: Vec<Node>,
    pub file_name: String,
    pub source_text: Arc<str>,

    pub modules: Vec<ModuleData>,
    pub imports: Vec<ImportData>,
    pub import_aliases: Vec<ImportAliasData>,
    pub import_froms: Vec<ImportFromData>,
    pub classes: Vec<ClassData>,
    pub functions: Vec<FunctionData>,
    pub decorators: Vec<DecoratorData>,
    pub parameter_lists: Vec<ParameterListData>,
    pub parameters: Vec<ParameterData>,
    pub type_parameter_lists: Vec<TypeParameterListData>,
    pub type_parameters: Vec<TypeParameterData>,
    pub type_aliases: Vec<TypeAliasData>,
    pub assignments: Vec<AssignmentData>,
    pub annotated_assignments: Vec<AnnotatedAssignmentData>,
    pub augmented_assignments: Vec<AugmentedAssignmentData>,
    pub expr_statements: Vec<ExpressionStatementData>,
    pub if_statements: Vec<IfStatementData>,
    pub blocks: Vec<BlockData>,
    pub keyword_statements: Vec<KeywordStatementData>,

    pub attributes: Vec<AttributeData>,
    pub subscripts: Vec<SubscriptData>,
    pub slices: Vec<SliceData>,
    pub calls: Vec<CallData>,
    pub argument_lists: Vec<ArgumentListData>,
    pub keyword_arguments: Vec<KeywordArgumentData>,
    pub starred: Vec<StarredData>,
    pub sequences: Vec<SequenceData>,
    pub dicts: Vec<DictData>,
    pub binary_exprs: Vec<BinaryExprData>,
    pub unary_exprs: Vec<UnaryExprData>,
    pub conditional_exprs: Vec<ConditionalExprData>,
    pub lambdas: Vec<LambdaData>,
}
