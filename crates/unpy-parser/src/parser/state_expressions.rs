//! Parser state - expression parsing methods
//!
//! Python precedence, loosest first:
//! lambda, conditional, `or`, `and`, `not`, comparisons, `|`, `^`, `&`,
//! shifts, `+ -`, `* / // % @`, unary `+ - ~`, `**`, `await`, primaries.

use super::base::NodeIndex;
use super::node::{
    ArgumentListData, AttributeData, BinaryExprData, CallData, ConditionalExprData, DictData,
    KeywordArgumentData, LambdaData, SequenceData, SliceData, StarredData, SubscriptData,
    UnaryExprData,
};
use super::node_flags;
use super::state::{ParseResult, ParserState};
use super::syntax_kind_ext;
use unpy_scanner::{SyntaxKind, TokenFlags};

/// Binding power of binary operators between comparisons and unary operators.
fn binary_precedence(kind: SyntaxKind) -> Option<u8> {
    let precedence = match kind {
        SyntaxKind::BarToken => 1,
        SyntaxKind::CaretToken => 2,
        SyntaxKind::AmpersandToken => 3,
        SyntaxKind::LessThanLessThanToken | SyntaxKind::GreaterThanGreaterThanToken => 4,
        SyntaxKind::PlusToken | SyntaxKind::MinusToken => 5,
        SyntaxKind::AsteriskToken
        | SyntaxKind::SlashToken
        | SyntaxKind::SlashSlashToken
        | SyntaxKind::PercentToken
        | SyntaxKind::AtToken => 6,
        _ => return None,
    };
    Some(precedence)
}

pub(crate) fn can_start_expression(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::Identifier
            | SyntaxKind::NumericLiteral
            | SyntaxKind::StringLiteral
            | SyntaxKind::NoneKeyword
            | SyntaxKind::TrueKeyword
            | SyntaxKind::FalseKeyword
            | SyntaxKind::NotKeyword
            | SyntaxKind::LambdaKeyword
            | SyntaxKind::AwaitKeyword
            | SyntaxKind::YieldKeyword
            | SyntaxKind::OpenParenToken
            | SyntaxKind::OpenBracketToken
            | SyntaxKind::OpenBraceToken
            | SyntaxKind::MinusToken
            | SyntaxKind::PlusToken
            | SyntaxKind::TildeToken
            | SyntaxKind::DotDotDotToken
            | SyntaxKind::AsteriskToken
    )
}

impl ParserState {
    pub(crate) fn node_pos(&self, index: NodeIndex) -> u32 {
        self.arena.get(index).map_or(0, |node| node.pos)
    }

    // =========================================================================
    // Expression lists
    // =========================================================================

    /// `star_expressions`: one expression, or an unparenthesized tuple.
    pub(crate) fn parse_star_expressions(&mut self) -> ParseResult<NodeIndex> {
        let first = self.parse_star_expression()?;
        if !self.is_token(SyntaxKind::CommaToken) {
            return Ok(first);
        }
        let mut elements = vec![first];
        let mut trailing_comma = false;
        while self.parse_optional(SyntaxKind::CommaToken) {
            if !can_start_expression(self.token()) {
                trailing_comma = true;
                break;
            }
            elements.push(self.parse_star_expression()?);
        }
        Ok(self.finish_tuple(elements, trailing_comma))
    }

    fn finish_tuple(&mut self, elements: Vec<NodeIndex>, trailing_comma: bool) -> NodeIndex {
        let pos = elements.first().map_or(self.token_pos(), |&e| self.node_pos(e));
        let end = self.node_end();
        let list = self.make_list(elements);
        let tuple =
            self.arena
                .add_sequence(syntax_kind_ext::TUPLE, pos, end, SequenceData { elements: list });
        if trailing_comma {
            self.arena.set_flags(tuple, node_flags::TRAILING_COMMA);
        }
        tuple
    }

    pub(crate) fn parse_star_expression(&mut self) -> ParseResult<NodeIndex> {
        if self.is_token(SyntaxKind::AsteriskToken) {
            let start = self.token_pos();
            self.next_token();
            let expression = self.parse_binary_expression(1)?;
            return Ok(self.arena.add_starred(
                syntax_kind_ext::STARRED,
                start,
                self.node_end(),
                StarredData { expression },
            ));
        }
        self.parse_expression()
    }

    /// `star_named_expression`, used inside tuple/list/set displays.
    fn parse_star_named_expression(&mut self) -> ParseResult<NodeIndex> {
        if self.is_token(SyntaxKind::AsteriskToken) {
            return self.parse_star_expression();
        }
        self.parse_named_expression()
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    /// `name := value` or a plain expression.
    pub(crate) fn parse_named_expression(&mut self) -> ParseResult<NodeIndex> {
        if self.is_token(SyntaxKind::Identifier)
            && self.peek_token() == SyntaxKind::ColonEqualsToken
        {
            let start = self.token_pos();
            let name = self.arena.add_name(start, self.token_end());
            self.next_token();
            self.next_token();
            let value = self.parse_expression()?;
            return Ok(self.arena.add_binary_expr(
                syntax_kind_ext::NAMED_EXPRESSION,
                start,
                self.node_end(),
                BinaryExprData {
                    left: name,
                    operator_token: SyntaxKind::ColonEqualsToken as u16,
                    right: value,
                },
            ));
        }
        self.parse_expression()
    }

    /// A full expression (`test` in the Python grammar).
    pub fn parse_expression(&mut self) -> ParseResult<NodeIndex> {
        self.enter_recursion()?;
        let result = self.parse_expression_worker();
        self.exit_recursion();
        result
    }

    fn parse_expression_worker(&mut self) -> ParseResult<NodeIndex> {
        if self.is_token(SyntaxKind::LambdaKeyword) {
            return self.parse_lambda();
        }
        let start = self.token_pos();
        let body = self.parse_or_test()?;
        if !self.is_token(SyntaxKind::IfKeyword) {
            return Ok(body);
        }
        self.next_token();
        let condition = self.parse_or_test()?;
        self.parse_expected(SyntaxKind::ElseKeyword, "'else'")?;
        let orelse = self.parse_expression()?;
        Ok(self.arena.add_conditional_expr(
            syntax_kind_ext::CONDITIONAL_EXPRESSION,
            start,
            self.node_end(),
            ConditionalExprData {
                condition,
                when_true: body,
                when_false: orelse,
            },
        ))
    }

    fn parse_lambda(&mut self) -> ParseResult<NodeIndex> {
        let start = self.token_pos();
        self.next_token();
        let parameters = if self.is_token(SyntaxKind::ColonToken) {
            NodeIndex::NONE
        } else {
            self.parse_parameter_entries(SyntaxKind::ColonToken, false)?
        };
        self.parse_expected(SyntaxKind::ColonToken, "':'")?;
        let body = self.parse_expression()?;
        Ok(self.arena.add_lambda(
            syntax_kind_ext::LAMBDA,
            start,
            self.node_end(),
            LambdaData { parameters, body },
        ))
    }

    fn parse_or_test(&mut self) -> ParseResult<NodeIndex> {
        let mut left = self.parse_and_test()?;
        while self.is_token(SyntaxKind::OrKeyword) {
            self.next_token();
            let right = self.parse_and_test()?;
            left = self.add_binary(
                syntax_kind_ext::BOOLEAN_EXPRESSION,
                left,
                SyntaxKind::OrKeyword,
                right,
            );
        }
        Ok(left)
    }

    fn parse_and_test(&mut self) -> ParseResult<NodeIndex> {
        let mut left = self.parse_not_test()?;
        while self.is_token(SyntaxKind::AndKeyword) {
            self.next_token();
            let right = self.parse_not_test()?;
            left = self.add_binary(
                syntax_kind_ext::BOOLEAN_EXPRESSION,
                left,
                SyntaxKind::AndKeyword,
                right,
            );
        }
        Ok(left)
    }

    fn parse_not_test(&mut self) -> ParseResult<NodeIndex> {
        if !self.is_token(SyntaxKind::NotKeyword) {
            return self.parse_comparison();
        }
        let start = self.token_pos();
        self.next_token();
        self.enter_recursion()?;
        let operand = self.parse_not_test();
        self.exit_recursion();
        let operand = operand?;
        Ok(self.arena.add_unary_expr(
            syntax_kind_ext::UNARY_EXPRESSION,
            start,
            self.node_end(),
            UnaryExprData {
                operator: SyntaxKind::NotKeyword as u16,
                operand,
            },
        ))
    }

    fn parse_comparison(&mut self) -> ParseResult<NodeIndex> {
        let mut left = self.parse_binary_expression(1)?;
        loop {
            let (operator, negated) = match self.token() {
                SyntaxKind::NotKeyword if self.peek_token() == SyntaxKind::InKeyword => {
                    self.next_token();
                    (SyntaxKind::InKeyword, true)
                }
                SyntaxKind::IsKeyword if self.peek_token() == SyntaxKind::NotKeyword => {
                    self.next_token();
                    (SyntaxKind::IsKeyword, true)
                }
                kind if unpy_scanner::token_is_comparison(kind) => (kind, false),
                _ => break,
            };
            self.next_token();
            let right = self.parse_binary_expression(1)?;
            left = self.add_binary(syntax_kind_ext::COMPARE_EXPRESSION, left, operator, right);
            if negated {
                self.arena.set_flags(left, node_flags::NEGATED);
            }
        }
        Ok(left)
    }

    /// Precedence climbing over the binary operator table.
    fn parse_binary_expression(&mut self, min_precedence: u8) -> ParseResult<NodeIndex> {
        let mut left = self.parse_factor()?;
        while let Some(precedence) = binary_precedence(self.token()) {
            if precedence < min_precedence {
                break;
            }
            let operator = self.token();
            self.next_token();
            let right = self.parse_binary_expression(precedence + 1)?;
            left = self.add_binary(syntax_kind_ext::BINARY_EXPRESSION, left, operator, right);
        }
        Ok(left)
    }

    fn add_binary(
        &mut self,
        kind: u16,
        left: NodeIndex,
        operator: SyntaxKind,
        right: NodeIndex,
    ) -> NodeIndex {
        let pos = self.node_pos(left);
        let end = self.node_end();
        self.arena.add_binary_expr(
            kind,
            pos,
            end,
            BinaryExprData {
                left,
                operator_token: operator as u16,
                right,
            },
        )
    }

    fn parse_factor(&mut self) -> ParseResult<NodeIndex> {
        let operator = self.token();
        if !matches!(
            operator,
            SyntaxKind::PlusToken | SyntaxKind::MinusToken | SyntaxKind::TildeToken
        ) {
            return self.parse_power();
        }
        let start = self.token_pos();
        self.next_token();
        self.enter_recursion()?;
        let operand = self.parse_factor();
        self.exit_recursion();
        let operand = operand?;
        Ok(self.arena.add_unary_expr(
            syntax_kind_ext::UNARY_EXPRESSION,
            start,
            self.node_end(),
            UnaryExprData {
                operator: operator as u16,
                operand,
            },
        ))
    }

    fn parse_power(&mut self) -> ParseResult<NodeIndex> {
        let base = if self.is_token(SyntaxKind::AwaitKeyword) {
            let start = self.token_pos();
            self.next_token();
            let operand = self.parse_primary()?;
            self.arena.add_unary_expr(
                syntax_kind_ext::AWAIT_EXPRESSION,
                start,
                self.node_end(),
                UnaryExprData {
                    operator: SyntaxKind::AwaitKeyword as u16,
                    operand,
                },
            )
        } else {
            self.parse_primary()?
        };
        if !self.is_token(SyntaxKind::AsteriskAsteriskToken) {
            return Ok(base);
        }
        self.next_token();
        self.enter_recursion()?;
        let exponent = self.parse_factor();
        self.exit_recursion();
        let exponent = exponent?;
        Ok(self.add_binary(
            syntax_kind_ext::BINARY_EXPRESSION,
            base,
            SyntaxKind::AsteriskAsteriskToken,
            exponent,
        ))
    }

    // =========================================================================
    // Primaries
    // =========================================================================

    pub(crate) fn parse_primary(&mut self) -> ParseResult<NodeIndex> {
        let start = self.token_pos();
        let mut expression = self.parse_atom()?;
        loop {
            match self.token() {
                SyntaxKind::DotToken => {
                    self.next_token();
                    if !self.is_token(SyntaxKind::Identifier) {
                        return Err(self.error_at_current("expected attribute name"));
                    }
                    let name = self.arena.add_name(self.token_pos(), self.token_end());
                    self.next_token();
                    expression = self.arena.add_attribute(
                        syntax_kind_ext::ATTRIBUTE,
                        start,
                        self.node_end(),
                        AttributeData { expression, name },
                    );
                }
                SyntaxKind::OpenBracketToken => {
                    self.next_token();
                    let slice = self.parse_slices()?;
                    self.parse_expected(SyntaxKind::CloseBracketToken, "']'")?;
                    expression = self.arena.add_subscript(
                        syntax_kind_ext::SUBSCRIPT,
                        start,
                        self.node_end(),
                        SubscriptData { expression, slice },
                    );
                }
                SyntaxKind::OpenParenToken => {
                    let arguments = self.parse_argument_list()?;
                    expression = self.arena.add_call(
                        syntax_kind_ext::CALL,
                        start,
                        self.node_end(),
                        CallData {
                            expression,
                            arguments,
                        },
                    );
                }
                _ => return Ok(expression),
            }
        }
    }

    fn parse_atom(&mut self) -> ParseResult<NodeIndex> {
        let start = self.token_pos();
        let end = self.token_end();
        match self.token() {
            SyntaxKind::Identifier => {
                self.next_token();
                Ok(self.arena.add_name(start, end))
            }
            SyntaxKind::NoneKeyword | SyntaxKind::TrueKeyword | SyntaxKind::FalseKeyword => {
                self.next_token();
                Ok(self.arena.add_token(syntax_kind_ext::CONSTANT, start, end))
            }
            SyntaxKind::NumericLiteral => {
                self.next_token();
                Ok(self.arena.add_token(syntax_kind_ext::NUMBER, start, end))
            }
            SyntaxKind::DotDotDotToken => {
                self.next_token();
                Ok(self.arena.add_token(syntax_kind_ext::ELLIPSIS, start, end))
            }
            SyntaxKind::StringLiteral => Ok(self.parse_string()),
            SyntaxKind::OpenParenToken => self.parse_parenthesized(),
            SyntaxKind::OpenBracketToken => self.parse_list_display(),
            SyntaxKind::OpenBraceToken => self.parse_brace_display(),
            SyntaxKind::YieldKeyword => {
                Err(self.error_at_current("'yield' outside of parentheses or a statement"))
            }
            _ => Err(self.error_at_current("expected expression")),
        }
    }

    /// One or more adjacent string literals.
    fn parse_string(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let mut flags = 0u16;
        while self.is_token(SyntaxKind::StringLiteral) {
            let token_flags = self.scanner.token_flags();
            if token_flags.intersects(TokenFlags::FORMAT_STRING | TokenFlags::TEMPLATE_STRING) {
                flags |= node_flags::FORMAT_STRING;
            }
            if token_flags.contains(TokenFlags::BYTES) {
                flags |= node_flags::BYTES;
            }
            self.next_token();
        }
        let node = self
            .arena
            .add_token(syntax_kind_ext::STRING, start, self.node_end());
        self.arena.set_flags(node, flags);
        node
    }

    fn parse_parenthesized(&mut self) -> ParseResult<NodeIndex> {
        let start = self.token_pos();
        self.next_token();

        if self.parse_optional(SyntaxKind::CloseParenToken) {
            let tuple = self.arena.add_sequence(
                syntax_kind_ext::TUPLE,
                start,
                self.node_end(),
                SequenceData {
                    elements: super::base::NodeList::with_nodes(Vec::new(), start, start),
                },
            );
            self.arena.set_flags(tuple, node_flags::PARENTHESIZED);
            return Ok(tuple);
        }

        if self.is_token(SyntaxKind::YieldKeyword) {
            let expression = self.parse_yield_expression()?;
            self.parse_expected(SyntaxKind::CloseParenToken, "')'")?;
            return Ok(expression);
        }

        let first = self.parse_star_named_expression()?;
        self.reject_comprehension()?;
        if !self.is_token(SyntaxKind::CommaToken) {
            self.parse_expected(SyntaxKind::CloseParenToken, "')'")?;
            return Ok(first);
        }

        let mut elements = vec![first];
        let mut trailing_comma = false;
        while self.parse_optional(SyntaxKind::CommaToken) {
            if self.is_token(SyntaxKind::CloseParenToken) {
                trailing_comma = true;
                break;
            }
            elements.push(self.parse_star_named_expression()?);
        }
        self.parse_expected(SyntaxKind::CloseParenToken, "')'")?;
        let list = self.make_list(elements);
        let tuple = self.arena.add_sequence(
            syntax_kind_ext::TUPLE,
            start,
            self.node_end(),
            SequenceData { elements: list },
        );
        let mut flags = node_flags::PARENTHESIZED;
        if trailing_comma {
            flags |= node_flags::TRAILING_COMMA;
        }
        self.arena.set_flags(tuple, flags);
        Ok(tuple)
    }

    fn parse_list_display(&mut self) -> ParseResult<NodeIndex> {
        let start = self.token_pos();
        self.next_token();
        let mut elements = Vec::new();
        while !self.is_token(SyntaxKind::CloseBracketToken) {
            elements.push(self.parse_star_named_expression()?);
            self.reject_comprehension()?;
            if !self.parse_optional(SyntaxKind::CommaToken) {
                break;
            }
        }
        self.parse_expected(SyntaxKind::CloseBracketToken, "']'")?;
        let list = self.make_list(elements);
        Ok(self.arena.add_sequence(
            syntax_kind_ext::LIST,
            start,
            self.node_end(),
            SequenceData { elements: list },
        ))
    }

    fn parse_brace_display(&mut self) -> ParseResult<NodeIndex> {
        let start = self.token_pos();
        self.next_token();
        let mut keys = Vec::new();
        let mut values = Vec::new();
        let mut elements = Vec::new();
        let mut is_dict = self.is_token(SyntaxKind::CloseBraceToken);

        while !self.is_token(SyntaxKind::CloseBraceToken) {
            if self.is_token(SyntaxKind::AsteriskAsteriskToken) {
                self.next_token();
                is_dict = true;
                keys.push(NodeIndex::NONE);
                values.push(self.parse_binary_expression(1)?);
            } else {
                let element = self.parse_star_named_expression()?;
                if self.parse_optional(SyntaxKind::ColonToken) {
                    is_dict = true;
                    keys.push(element);
                    values.push(self.parse_expression()?);
                } else {
                    elements.push(element);
                }
            }
            self.reject_comprehension()?;
            if !self.parse_optional(SyntaxKind::CommaToken) {
                break;
            }
        }
        self.parse_expected(SyntaxKind::CloseBraceToken, "'}'")?;
        let end = self.node_end();

        if is_dict {
            if !elements.is_empty() {
                return Err(self.error_at(start, end - start, "invalid dictionary display"));
            }
            return Ok(self.arena.add_dict(
                syntax_kind_ext::DICT,
                start,
                end,
                DictData { keys, values },
            ));
        }
        let list = self.make_list(elements);
        Ok(self.arena.add_sequence(
            syntax_kind_ext::SET,
            start,
            end,
            SequenceData { elements: list },
        ))
    }

    fn reject_comprehension(&self) -> ParseResult<()> {
        if self.is_token(SyntaxKind::ForKeyword) || self.is_token(SyntaxKind::AsyncKeyword) {
            return Err(self.error_at_current("comprehensions are not supported in stubs"));
        }
        Ok(())
    }

    pub(crate) fn parse_yield_expression(&mut self) -> ParseResult<NodeIndex> {
        let start = self.token_pos();
        self.next_token();
        let mut flags = 0;
        let operand = if self.parse_optional(SyntaxKind::FromKeyword) {
            flags = node_flags::YIELD_FROM;
            self.parse_expression()?
        } else if can_start_expression(self.token()) {
            self.parse_star_expressions()?
        } else {
            NodeIndex::NONE
        };
        let node = self.arena.add_unary_expr(
            syntax_kind_ext::YIELD_EXPRESSION,
            start,
            self.node_end(),
            UnaryExprData {
                operator: SyntaxKind::YieldKeyword as u16,
                operand,
            },
        );
        self.arena.set_flags(node, flags);
        Ok(node)
    }

    // =========================================================================
    // Subscripts and arguments
    // =========================================================================

    /// Contents of `[...]`: a single slice, or an unparenthesized tuple of them.
    fn parse_slices(&mut self) -> ParseResult<NodeIndex> {
        let first = self.parse_slice()?;
        if !self.is_token(SyntaxKind::CommaToken) {
            return Ok(first);
        }
        let mut elements = vec![first];
        let mut trailing_comma = false;
        while self.parse_optional(SyntaxKind::CommaToken) {
            if self.is_token(SyntaxKind::CloseBracketToken) {
                trailing_comma = true;
                break;
            }
            elements.push(self.parse_slice()?);
        }
        Ok(self.finish_tuple(elements, trailing_comma))
    }

    fn parse_slice(&mut self) -> ParseResult<NodeIndex> {
        let start = self.token_pos();
        if self.is_token(SyntaxKind::AsteriskToken) {
            return self.parse_star_expression();
        }
        let lower = if self.is_token(SyntaxKind::ColonToken) {
            NodeIndex::NONE
        } else {
            let lower = self.parse_named_expression()?;
            if !self.is_token(SyntaxKind::ColonToken) {
                return Ok(lower);
            }
            lower
        };
        self.next_token();

        let ends_slice = |kind: SyntaxKind| {
            matches!(
                kind,
                SyntaxKind::ColonToken | SyntaxKind::CommaToken | SyntaxKind::CloseBracketToken
            )
        };
        let upper = if ends_slice(self.token()) {
            NodeIndex::NONE
        } else {
            self.parse_expression()?
        };
        let mut step = NodeIndex::NONE;
        if self.parse_optional(SyntaxKind::ColonToken) && !ends_slice(self.token()) {
            step = self.parse_expression()?;
        }
        Ok(self.arena.add_slice(
            syntax_kind_ext::SLICE,
            start,
            self.node_end(),
            SliceData { lower, upper, step },
        ))
    }

    /// `( args )` for calls and class definitions.
    pub(crate) fn parse_argument_list(&mut self) -> ParseResult<NodeIndex> {
        let start = self.token_pos();
        self.parse_expected(SyntaxKind::OpenParenToken, "'('")?;
        let mut arguments = Vec::new();
        while !self.is_token(SyntaxKind::CloseParenToken) {
            let argument_start = self.token_pos();
            let argument = match self.token() {
                SyntaxKind::AsteriskToken | SyntaxKind::AsteriskAsteriskToken => {
                    let kind = if self.is_token(SyntaxKind::AsteriskToken) {
                        syntax_kind_ext::STARRED
                    } else {
                        syntax_kind_ext::DOUBLE_STARRED
                    };
                    self.next_token();
                    let expression = self.parse_expression()?;
                    self.arena.add_starred(
                        kind,
                        argument_start,
                        self.node_end(),
                        StarredData { expression },
                    )
                }
                SyntaxKind::Identifier if self.peek_token() == SyntaxKind::EqualsToken => {
                    let name = self.arena.add_name(argument_start, self.token_end());
                    self.next_token();
                    self.next_token();
                    let value = self.parse_expression()?;
                    self.arena.add_keyword_argument(
                        syntax_kind_ext::KEYWORD_ARGUMENT,
                        argument_start,
                        self.node_end(),
                        KeywordArgumentData { name, value },
                    )
                }
                _ => {
                    let expression = self.parse_named_expression()?;
                    self.reject_comprehension()?;
                    expression
                }
            };
            arguments.push(argument);
            if !self.parse_optional(SyntaxKind::CommaToken) {
                break;
            }
        }
        self.parse_expected(SyntaxKind::CloseParenToken, "')'")?;
        let end = self.node_end();
        let mut list = self.make_list(arguments);
        if list.is_empty() {
            list.pos = start + 1;
            list.end = start + 1;
        }
        Ok(self.arena.add_argument_list(
            syntax_kind_ext::ARGUMENT_LIST,
            start,
            end,
            ArgumentListData { arguments: list },
        ))
    }
}
