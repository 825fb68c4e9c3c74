//! NodeArena creation methods (add_* methods).

use super::base::{NodeIndex, NodeList};
use super::node::*;
use super::syntax_kind_ext;
use std::sync::Arc;

macro_rules! define_add_methods {
    ($($method:ident($pool:ident, $data:ty);)+) => {
        $(
            pub fn $method(&mut self, kind: u16, pos: u32, end: u32, data: $data) -> NodeIndex {
                let data_index = self.$pool.len() as u32;
                self.$pool.push(data);
                self.push_node(Node::with_data(kind, pos, end, data_index))
            }
        )+
    };
}

impl NodeArena {
    pub fn new(file_name: impl Into<String>, source_text: Arc<str>) -> NodeArena {
        let estimated_nodes = source_text.len() / 4;
        NodeArena {
            nodes: Vec::with_capacity(estimated_nodes),
            file_name: file_name.into(),
            source_text,
            modules: Vec::with_capacity(1),
            imports: Vec::new(),
            import_aliases: Vec::new(),
            import_froms: Vec::new(),
            classes: Vec::new(),
            functions: Vec::new(),
            decorators: Vec::new(),
            parameter_lists: Vec::new(),
            parameters: Vec::new(),
            type_parameter_lists: Vec::new(),
            type_parameters: Vec::new(),
            type_aliases: Vec::new(),
            assignments: Vec::new(),
            annotated_assignments: Vec::new(),
            augmented_assignments: Vec::new(),
            expr_statements: Vec::new(),
            if_statements: Vec::new(),
            blocks: Vec::new(),
            keyword_statements: Vec::new(),
            attributes: Vec::new(),
            subscripts: Vec::new(),
            slices: Vec::new(),
            calls: Vec::new(),
            argument_lists: Vec::new(),
            keyword_arguments: Vec::new(),
            starred: Vec::new(),
            sequences: Vec::new(),
            dicts: Vec::new(),
            binary_exprs: Vec::new(),
            unary_exprs: Vec::new(),
            conditional_exprs: Vec::new(),
            lambdas: Vec::new(),
        }
    }

    #[inline]
    fn push_node(&mut self, node: Node) -> NodeIndex {
        let index = self.nodes.len() as u32;
        self.nodes.push(node);
        NodeIndex(index)
    }

    /// Add a node without pool data (names, constants, numbers, strings, `...`).
    pub fn add_token(&mut self, kind: u16, pos: u32, end: u32) -> NodeIndex {
        self.push_node(Node::new(kind, pos, end))
    }

    pub fn add_name(&mut self, pos: u32, end: u32) -> NodeIndex {
        self.add_token(syntax_kind_ext::NAME, pos, end)
    }

    /// Set `node_flags` bits on an existing node.
    pub fn set_flags(&mut self, index: NodeIndex, flags: u16) {
        if let Some(node) = self.get_mut(index) {
            node.flags |= flags;
        }
    }

    /// Widen a node's span, used when trailing parts are parsed after creation.
    pub fn set_span(&mut self, index: NodeIndex, pos: u32, end: u32) {
        if let Some(node) = self.get_mut(index) {
            node.pos = pos;
            node.end = end;
        }
    }

    define_add_methods! {
        add_module(modules, ModuleData);
        add_import(imports, ImportData);
        add_import_alias(import_aliases, ImportAliasData);
        add_import_from(import_froms, ImportFromData);
        add_class(classes, ClassData);
        add_function(functions, FunctionData);
        add_decorator(decorators, DecoratorData);
        add_parameter_list(parameter_lists, ParameterListData);
        add_parameter(parameters, ParameterData);
        add_type_parameter_list(type_parameter_lists, TypeParameterListData);
        add_type_parameter(type_parameters, TypeParameterData);
        add_type_alias(type_aliases, TypeAliasData);
        add_assignment(assignments, AssignmentData);
        add_annotated_assignment(annotated_assignments, AnnotatedAssignmentData);
        add_augmented_assignment(augmented_assignments, AugmentedAssignmentData);
        add_expr_statement(expr_statements, ExpressionStatementData);
        add_if_statement(if_statements, IfStatementData);
        add_block(blocks, BlockData);
        add_keyword_statement(keyword_statements, KeywordStatementData);
        add_attribute(attributes, AttributeData);
        add_subscript(subscripts, SubscriptData);
        add_slice(slices, SliceData);
        add_call(calls, CallData);
        add_argument_list(argument_lists, ArgumentListData);
        add_keyword_argument(keyword_arguments, KeywordArgumentData);
        add_starred(starred, StarredData);
        add_sequence(sequences, SequenceData);
        add_dict(dicts, DictData);
        add_binary_expr(binary_exprs, BinaryExprData);
        add_unary_expr(unary_exprs, UnaryExprData);
        add_conditional_expr(conditional_exprs, ConditionalExprData);
        add_lambda(lambdas, LambdaData);
    }

    /// Build a `NodeList` spanning its first and last element.
    pub fn make_list(&self, nodes: Vec<NodeIndex>) -> NodeList {
        let pos = nodes
            .first()
            .and_then(|&first| self.get(first))
            .map_or(0, |node| node.pos);
        let end = nodes
            .last()
            .and_then(|&last| self.get(last))
            .map_or(pos, |node| node.end);
        NodeList::with_nodes(nodes, pos, end)
    }
}
