//! NodeArena access methods.
//!
//! Typed getters check the node kind before indexing into a pool, so a getter
//! called on the wrong kind of node returns `None` instead of unrelated data.

use super::base::NodeIndex;
use super::node::*;
use super::syntax_kind_ext::*;
use smallvec::SmallVec;
use unpy_scanner::ScannerState;

macro_rules! define_getters {
    ($($method:ident($pool:ident, $data:ty, [$($kind:ident),+]);)+) => {
        $(
            #[inline]
            pub fn $method(&self, node: &Node) -> Option<&$data> {
                if node.has_data() && matches!(node.kind, $($kind)|+) {
                    self.$pool.get(node.data_index as usize)
                } else {
                    None
                }
            }
        )+
    };
}

impl NodeArena {
    #[inline]
    pub fn get(&self, index: NodeIndex) -> Option<&Node> {
        if index.is_none() {
            None
        } else {
            self.nodes.get(index.0 as usize)
        }
    }

    #[inline]
    pub fn get_mut(&mut self, index: NodeIndex) -> Option<&mut Node> {
        if index.is_none() {
            None
        } else {
            self.nodes.get_mut(index.0 as usize)
        }
    }

    /// Kind of the node at `index`, `None` for `NodeIndex::NONE`.
    #[inline]
    pub fn kind_of(&self, index: NodeIndex) -> Option<u16> {
        self.get(index).map(|node| node.kind)
    }

    #[inline]
    pub fn is_kind(&self, index: NodeIndex, kind: u16) -> bool {
        self.kind_of(index) == Some(kind)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    define_getters! {
        get_module(modules, ModuleData, [MODULE]);
        get_import(imports, ImportData, [IMPORT_STATEMENT]);
        get_import_alias(import_aliases, ImportAliasData, [IMPORT_ALIAS]);
        get_import_from(import_froms, ImportFromData, [IMPORT_FROM_STATEMENT]);
        get_class(classes, ClassData, [CLASS_DEFINITION]);
        get_function(functions, FunctionData, [FUNCTION_DEFINITION]);
        get_decorator(decorators, DecoratorData, [DECORATOR]);
        get_parameter_list(parameter_lists, ParameterListData, [PARAMETER_LIST]);
        get_parameter(parameters, ParameterData, [PARAMETER]);
        get_type_parameter_list(type_parameter_lists, TypeParameterListData, [TYPE_PARAMETER_LIST]);
        get_type_parameter(type_parameters, TypeParameterData, [TYPE_PARAMETER]);
        get_type_alias(type_aliases, TypeAliasData, [TYPE_ALIAS_STATEMENT]);
        get_assignment(assignments, AssignmentData, [ASSIGNMENT_STATEMENT]);
        get_annotated_assignment(annotated_assignments, AnnotatedAssignmentData, [ANNOTATED_ASSIGNMENT]);
        get_augmented_assignment(augmented_assignments, AugmentedAssignmentData, [AUGMENTED_ASSIGNMENT]);
        get_expr_statement(expr_statements, ExpressionStatementData, [EXPRESSION_STATEMENT]);
        get_if_statement(if_statements, IfStatementData, [IF_STATEMENT]);
        get_block(blocks, BlockData, [BLOCK]);
        get_keyword_statement(keyword_statements, KeywordStatementData, [KEYWORD_STATEMENT, COMPOUND_STATEMENT]);
        get_attribute(attributes, AttributeData, [ATTRIBUTE]);
        get_subscript(subscripts, SubscriptData, [SUBSCRIPT]);
        get_slice(slices, SliceData, [SLICE]);
        get_call(calls, CallData, [CALL]);
        get_argument_list(argument_lists, ArgumentListData, [ARGUMENT_LIST]);
        get_keyword_argument(keyword_arguments, KeywordArgumentData, [KEYWORD_ARGUMENT]);
        get_starred(starred, StarredData, [STARRED, DOUBLE_STARRED]);
        get_sequence(sequences, SequenceData, [TUPLE, LIST, SET]);
        get_dict(dicts, DictData, [DICT]);
        get_binary_expr(binary_exprs, BinaryExprData, [BINARY_EXPRESSION, BOOLEAN_EXPRESSION, COMPARE_EXPRESSION, NAMED_EXPRESSION]);
        get_unary_expr(unary_exprs, UnaryExprData, [UNARY_EXPRESSION, AWAIT_EXPRESSION, YIELD_EXPRESSION]);
        get_conditional_expr(conditional_exprs, ConditionalExprData, [CONDITIONAL_EXPRESSION]);
        get_lambda(lambdas, LambdaData, [LAMBDA]);
    }

    // =========================================================================
    // Text helpers
    // =========================================================================

    /// Source text covered by a node.
    pub fn node_text(&self, index: NodeIndex) -> &str {
        self.get(index)
            .and_then(|node| self.source_text.get(node.pos as usize..node.end as usize))
            .unwrap_or("")
    }

    /// Identifier text of a `NAME` node.
    pub fn name_text(&self, index: NodeIndex) -> Option<&str> {
        if self.is_kind(index, NAME) {
            Some(self.node_text(index))
        } else {
            None
        }
    }

    /// Dotted text of a name/attribute chain (`a.b.c`), `None` for anything else.
    pub fn dotted_name(&self, index: NodeIndex) -> Option<String> {
        let node = self.get(index)?;
        match node.kind {
            NAME => Some(self.node_text(index).to_string()),
            ATTRIBUTE => {
                let data = self.get_attribute(node)?;
                let mut prefix = self.dotted_name(data.expression)?;
                prefix.push('.');
                prefix.push_str(self.name_text(data.name)?);
                Some(prefix)
            }
            _ => None,
        }
    }

    /// Node of each segment of a name/attribute chain, outermost last.
    ///
    /// For `a.b.c` this yields the nodes for `a`, `a.b` and `a.b.c`.
    pub fn dotted_prefixes(&self, index: NodeIndex) -> SmallVec<[NodeIndex; 4]> {
        let mut prefixes = SmallVec::new();
        let mut current = index;
        while let Some(node) = self.get(current) {
            prefixes.push(current);
            match node.kind {
                ATTRIBUTE => match self.get_attribute(node) {
                    Some(data) => current = data.expression,
                    None => break,
                },
                _ => break,
            }
        }
        prefixes.reverse();
        prefixes
    }

    /// Whitespace- and comment-insensitive text of a node.
    pub fn canonical_text(&self, index: NodeIndex) -> String {
        match self.get(index) {
            Some(node) => ScannerState::canonical_text(
                &self.source_text,
                node.pos as usize,
                node.end as usize,
            ),
            None => String::new(),
        }
    }

    /// Whether the node is a string literal (including concatenations).
    pub fn is_string(&self, index: NodeIndex) -> bool {
        self.is_kind(index, STRING)
    }

    // =========================================================================
    // Children
    // =========================================================================

    /// Direct children of an expression node, in source order.
    ///
    /// Statements are not covered; the collector walks those explicitly.
    pub fn expression_children(&self, index: NodeIndex) -> SmallVec<[NodeIndex; 4]> {
        let mut children: SmallVec<[NodeIndex; 4]> = SmallVec::new();
        let Some(node) = self.get(index) else {
            return children;
        };
        let mut push = |child: NodeIndex| {
            if child.is_some() {
                children.push(child);
            }
        };
        match node.kind {
            ATTRIBUTE => {
                if let Some(data) = self.get_attribute(node) {
                    push(data.expression);
                }
            }
            SUBSCRIPT => {
                if let Some(data) = self.get_subscript(node) {
                    push(data.expression);
                    push(data.slice);
                }
            }
            SLICE => {
                if let Some(data) = self.get_slice(node) {
                    push(data.lower);
                    push(data.upper);
                    push(data.step);
                }
            }
            CALL => {
                if let Some(data) = self.get_call(node) {
                    push(data.expression);
                    push(data.arguments);
                }
            }
            ARGUMENT_LIST => {
                if let Some(data) = self.get_argument_list(node) {
                    data.arguments.iter().for_each(&mut push);
                }
            }
            KEYWORD_ARGUMENT => {
                if let Some(data) = self.get_keyword_argument(node) {
                    push(data.value);
                }
            }
            STARRED | DOUBLE_STARRED => {
                if let Some(data) = self.get_starred(node) {
                    push(data.expression);
                }
            }
            TUPLE | LIST | SET => {
                if let Some(data) = self.get_sequence(node) {
                    data.elements.iter().for_each(&mut push);
                }
            }
            DICT => {
                if let Some(data) = self.get_dict(node) {
                    for (key, value) in data.keys.iter().zip(&data.values) {
                        push(*key);
                        push(*value);
                    }
                }
            }
            BINARY_EXPRESSION | BOOLEAN_EXPRESSION | COMPARE_EXPRESSION | NAMED_EXPRESSION => {
                if let Some(data) = self.get_binary_expr(node) {
                    push(data.left);
                    push(data.right);
                }
            }
            UNARY_EXPRESSION | AWAIT_EXPRESSION | YIELD_EXPRESSION => {
                if let Some(data) = self.get_unary_expr(node) {
                    push(data.operand);
                }
            }
            CONDITIONAL_EXPRESSION => {
                if let Some(data) = self.get_conditional_expr(node) {
                    push(data.when_true);
                    push(data.condition);
                    push(data.when_false);
                }
            }
            LAMBDA => {
                if let Some(data) = self.get_lambda(node) {
                    push(data.parameters);
                    push(data.body);
                }
            }
            PARAMETER_LIST => {
                if let Some(data) = self.get_parameter_list(node) {
                    data.parameters.iter().for_each(&mut push);
                }
            }
            PARAMETER => {
                if let Some(data) = self.get_parameter(node) {
                    push(data.annotation);
                    push(data.default);
                }
            }
            _ => {}
        }
        children
    }
}
