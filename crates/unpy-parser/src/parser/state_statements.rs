//! Parser state - statement and declaration parsing methods

use super::base::{NodeIndex, NodeList};
use super::node::{
    AnnotatedAssignmentData, AssignmentData, AugmentedAssignmentData, BlockData, ClassData,
    DecoratorData, ExpressionStatementData, FunctionData, IfStatementData, ImportAliasData,
    ImportData, ImportFromData, KeywordStatementData, ModuleData, ParameterData, ParameterKind,
    ParameterListData, TypeAliasData, TypeParameterData, TypeParameterKind, TypeParameterListData,
};
use super::node_flags;
use super::state::{ParseDiagnostic, ParseResult, ParserState};
use super::syntax_kind_ext;
use tracing::{debug, trace};
use unpy_scanner::{SyntaxKind, token_is_augmented_assignment};

impl ParserState {
    // =========================================================================
    // Module
    // =========================================================================

    /// Parse the whole source text into a `MODULE` node.
    ///
    /// Parsing stops at the first error; diagnostics are available through
    /// `get_diagnostics()` and the returned module holds the statements read
    /// up to that point.
    pub fn parse_module(&mut self) -> NodeIndex {
        self.next_token();

        let mut statements = Vec::new();
        if let Err(diagnostic) = self.parse_module_statements(&mut statements) {
            debug!(
                file = %self.arena.file_name,
                start = diagnostic.start,
                message = %diagnostic.message,
                "parse error"
            );
            self.parse_diagnostics.push(diagnostic);
        }

        for diag in self.scanner.get_scanner_diagnostics() {
            self.parse_diagnostics.push(ParseDiagnostic {
                start: diag.pos,
                length: diag.length,
                message: diag.message.clone(),
            });
        }
        self.parse_diagnostics.sort_by_key(|d| d.start);

        let end = self.arena.source_text.len() as u32;
        let statements = NodeList::with_nodes(statements, 0, end);
        trace!(statements = statements.len(), nodes = self.arena.len(), "parsed module");
        self.arena.add_module(
            syntax_kind_ext::MODULE,
            0,
            end,
            ModuleData { statements },
        )
    }

    fn parse_module_statements(&mut self, statements: &mut Vec<NodeIndex>) -> ParseResult<()> {
        loop {
            match self.token() {
                SyntaxKind::EndOfFile => return Ok(()),
                SyntaxKind::NewLineToken => {
                    self.next_token();
                }
                SyntaxKind::IndentToken | SyntaxKind::DedentToken => {
                    return Err(self.error_at_current("invalid indentation"));
                }
                _ => self.parse_statement_into(statements)?,
            }
        }
    }

    // =========================================================================
    // Statements
    // =========================================================================

    /// Parse one line's worth of statements (a compound statement, or simple
    /// statements separated by `;`) and append them to `out`.
    pub(crate) fn parse_statement_into(&mut self, out: &mut Vec<NodeIndex>) -> ParseResult<()> {
        self.enter_recursion()?;
        let result = self.parse_statement_worker(out);
        self.exit_recursion();
        result
    }

    fn parse_statement_worker(&mut self, out: &mut Vec<NodeIndex>) -> ParseResult<()> {
        let statement = match self.token() {
            SyntaxKind::AtToken => self.parse_decorated()?,
            SyntaxKind::ClassKeyword => {
                let start = self.token_pos();
                self.parse_class_definition(start, NodeList::new())?
            }
            SyntaxKind::DefKeyword => {
                let start = self.token_pos();
                self.parse_function_definition(start, NodeList::new())?
            }
            SyntaxKind::AsyncKeyword => match self.peek_token() {
                SyntaxKind::DefKeyword => {
                    let start = self.token_pos();
                    self.parse_function_definition(start, NodeList::new())?
                }
                SyntaxKind::ForKeyword | SyntaxKind::WithKeyword => {
                    self.parse_compound_statement()?
                }
                _ => return Err(self.error_at_current("expected 'def', 'for' or 'with'")),
            },
            SyntaxKind::IfKeyword => self.parse_if_statement()?,
            SyntaxKind::TryKeyword
            | SyntaxKind::WithKeyword
            | SyntaxKind::ForKeyword
            | SyntaxKind::WhileKeyword => self.parse_compound_statement()?,
            SyntaxKind::Identifier if self.is_match_statement() => {
                self.parse_compound_statement()?
            }
            _ => return self.parse_simple_statements(out),
        };
        out.push(statement);
        Ok(())
    }

    /// `stmt (';' stmt)* NEWLINE`
    fn parse_simple_statements(&mut self, out: &mut Vec<NodeIndex>) -> ParseResult<()> {
        loop {
            let statement = self.parse_simple_statement()?;
            out.push(statement);
            if !self.parse_optional(SyntaxKind::SemicolonToken) {
                break;
            }
            if self.is_token(SyntaxKind::NewLineToken) || self.is_token(SyntaxKind::EndOfFile) {
                break;
            }
        }
        if self.is_token(SyntaxKind::EndOfFile) {
            return Ok(());
        }
        self.parse_expected(SyntaxKind::NewLineToken, "end of statement")
    }

    fn parse_simple_statement(&mut self) -> ParseResult<NodeIndex> {
        match self.token() {
            SyntaxKind::ImportKeyword => return self.parse_import_statement(),
            SyntaxKind::FromKeyword => return self.parse_import_from_statement(),
            SyntaxKind::PassKeyword
            | SyntaxKind::DelKeyword
            | SyntaxKind::ReturnKeyword
            | SyntaxKind::RaiseKeyword
            | SyntaxKind::AssertKeyword
            | SyntaxKind::GlobalKeyword
            | SyntaxKind::NonlocalKeyword
            | SyntaxKind::BreakKeyword
            | SyntaxKind::ContinueKeyword => return self.parse_keyword_statement(),
            SyntaxKind::Identifier if self.is_type_alias_statement() => {
                return self.parse_type_alias_statement();
            }
            _ => {}
        }

        let start = self.token_pos();
        let first = self.parse_assignment_value()?;

        if self.parse_optional(SyntaxKind::ColonToken) {
            let annotation = self.parse_expression()?;
            let value = if self.parse_optional(SyntaxKind::EqualsToken) {
                self.parse_assignment_value()?
            } else {
                NodeIndex::NONE
            };
            return Ok(self.arena.add_annotated_assignment(
                syntax_kind_ext::ANNOTATED_ASSIGNMENT,
                start,
                self.node_end(),
                AnnotatedAssignmentData {
                    target: first,
                    annotation,
                    value,
                },
            ));
        }

        if self.is_token(SyntaxKind::EqualsToken) {
            let mut targets = vec![first];
            let mut value;
            loop {
                self.next_token();
                value = self.parse_assignment_value()?;
                if !self.is_token(SyntaxKind::EqualsToken) {
                    break;
                }
                targets.push(value);
            }
            let targets = self.make_list(targets);
            return Ok(self.arena.add_assignment(
                syntax_kind_ext::ASSIGNMENT_STATEMENT,
                start,
                self.node_end(),
                AssignmentData { targets, value },
            ));
        }

        if token_is_augmented_assignment(self.token()) {
            let operator = self.token() as u16;
            self.next_token();
            let value = self.parse_assignment_value()?;
            return Ok(self.arena.add_augmented_assignment(
                syntax_kind_ext::AUGMENTED_ASSIGNMENT,
                start,
                self.node_end(),
                AugmentedAssignmentData {
                    target: first,
                    operator,
                    value,
                },
            ));
        }

        Ok(self.arena.add_expr_statement(
            syntax_kind_ext::EXPRESSION_STATEMENT,
            start,
            self.node_end(),
            ExpressionStatementData { expression: first },
        ))
    }

    fn parse_assignment_value(&mut self) -> ParseResult<NodeIndex> {
        if self.is_token(SyntaxKind::YieldKeyword) {
            self.parse_yield_expression()
        } else {
            self.parse_star_expressions()
        }
    }

    /// Simple keyword statements are kept as a keyword plus an opaque span.
    fn parse_keyword_statement(&mut self) -> ParseResult<NodeIndex> {
        let start = self.token_pos();
        let keyword = self.token() as u16;
        self.next_token();
        while !matches!(
            self.token(),
            SyntaxKind::NewLineToken | SyntaxKind::SemicolonToken | SyntaxKind::EndOfFile
        ) {
            self.next_token();
        }
        Ok(self.arena.add_keyword_statement(
            syntax_kind_ext::KEYWORD_STATEMENT,
            start,
            self.node_end(),
            KeywordStatementData { keyword },
        ))
    }

    /// `try`, `with`, `for`, `while` and `match` are read as opaque spans,
    /// including trailing `except`/`else`/`finally` clauses.
    fn parse_compound_statement(&mut self) -> ParseResult<NodeIndex> {
        let start = self.token_pos();
        if self.is_token(SyntaxKind::AsyncKeyword) {
            self.next_token();
        }
        let keyword = self.token() as u16;
        loop {
            while !matches!(
                self.token(),
                SyntaxKind::NewLineToken | SyntaxKind::EndOfFile
            ) {
                self.next_token();
            }
            self.parse_optional(SyntaxKind::NewLineToken);
            if self.is_token(SyntaxKind::IndentToken) {
                let mut depth = 0u32;
                loop {
                    match self.token() {
                        SyntaxKind::IndentToken => depth += 1,
                        SyntaxKind::DedentToken => depth = depth.saturating_sub(1),
                        SyntaxKind::EndOfFile => break,
                        _ => {}
                    }
                    self.next_token();
                    if depth == 0 {
                        break;
                    }
                }
            }
            if !matches!(
                self.token(),
                SyntaxKind::ExceptKeyword | SyntaxKind::ElseKeyword | SyntaxKind::FinallyKeyword
            ) {
                break;
            }
        }
        Ok(self.arena.add_keyword_statement(
            syntax_kind_ext::COMPOUND_STATEMENT,
            start,
            self.node_end(),
            KeywordStatementData { keyword },
        ))
    }

    /// `match` is a soft keyword: a statement starting with it is a match
    /// statement when its header line ends with `:`.
    fn is_match_statement(&self) -> bool {
        if !self.is_identifier_text("match") {
            return false;
        }
        self.look_ahead(|scanner| {
            let first = scanner.scan();
            if matches!(
                first,
                SyntaxKind::EqualsToken
                    | SyntaxKind::ColonToken
                    | SyntaxKind::DotToken
                    | SyntaxKind::CommaToken
                    | SyntaxKind::ColonEqualsToken
                    | SyntaxKind::NewLineToken
                    | SyntaxKind::EndOfFile
            ) || token_is_augmented_assignment(first)
            {
                return false;
            }
            let mut last = first;
            loop {
                let kind = scanner.scan();
                if matches!(kind, SyntaxKind::NewLineToken | SyntaxKind::EndOfFile) {
                    return last == SyntaxKind::ColonToken;
                }
                last = kind;
            }
        })
    }

    // =========================================================================
    // Blocks
    // =========================================================================

    /// The suite after a `:`. Either an indented block or simple statements on
    /// the same line.
    fn parse_block(&mut self) -> ParseResult<NodeIndex> {
        let mut statements = Vec::new();
        let mut flags = 0;
        if self.parse_optional(SyntaxKind::NewLineToken) {
            if !self.is_token(SyntaxKind::IndentToken) {
                return Err(self.error_at_current("expected an indented block"));
            }
            self.next_token();
            while !matches!(
                self.token(),
                SyntaxKind::DedentToken | SyntaxKind::EndOfFile
            ) {
                if self.parse_optional(SyntaxKind::NewLineToken) {
                    continue;
                }
                if self.is_token(SyntaxKind::IndentToken) {
                    return Err(self.error_at_current("invalid indentation"));
                }
                self.parse_statement_into(&mut statements)?;
            }
            self.parse_optional(SyntaxKind::DedentToken);
        } else {
            flags = node_flags::INLINE_BLOCK;
            self.parse_simple_statements(&mut statements)?;
        }
        let list = self.make_list(statements);
        let (pos, end) = (list.pos, list.end);
        let block = self.arena.add_block(
            syntax_kind_ext::BLOCK,
            pos,
            end,
            BlockData { statements: list },
        );
        self.arena.set_flags(block, flags);
        Ok(block)
    }

    // =========================================================================
    // Imports
    // =========================================================================

    fn parse_dotted_name_text(&mut self) -> ParseResult<String> {
        if !self.is_token(SyntaxKind::Identifier) {
            return Err(self.error_at_current("expected module name"));
        }
        let mut name = self.token_text().to_string();
        self.next_token();
        while self.parse_optional(SyntaxKind::DotToken) {
            if !self.is_token(SyntaxKind::Identifier) {
                return Err(self.error_at_current("expected name after '.'"));
            }
            name.push('.');
            name.push_str(self.token_text());
            self.next_token();
        }
        Ok(name)
    }

    fn parse_import_alias(&mut self, dotted: bool) -> ParseResult<NodeIndex> {
        let start = self.token_pos();
        let name = if dotted {
            self.parse_dotted_name_text()?
        } else {
            if !self.is_token(SyntaxKind::Identifier) {
                return Err(self.error_at_current("expected name to import"));
            }
            let name = self.token_text().to_string();
            self.next_token();
            name
        };
        let asname = if self.parse_optional(SyntaxKind::AsKeyword) {
            if !self.is_token(SyntaxKind::Identifier) {
                return Err(self.error_at_current("expected name after 'as'"));
            }
            let asname = self.token_text().to_string();
            self.next_token();
            Some(asname)
        } else {
            None
        };
        Ok(self.arena.add_import_alias(
            syntax_kind_ext::IMPORT_ALIAS,
            start,
            self.node_end(),
            ImportAliasData { name, asname },
        ))
    }

    /// `import a.b [as c], d`
    fn parse_import_statement(&mut self) -> ParseResult<NodeIndex> {
        let start = self.token_pos();
        self.next_token();
        let mut names = Vec::new();
        loop {
            names.push(self.parse_import_alias(true)?);
            if !self.parse_optional(SyntaxKind::CommaToken) {
                break;
            }
        }
        let names = self.make_list(names);
        Ok(self.arena.add_import(
            syntax_kind_ext::IMPORT_STATEMENT,
            start,
            self.node_end(),
            ImportData { names },
        ))
    }

    /// `from [.]*module import (names | '(' names ')' | '*')`
    fn parse_import_from_statement(&mut self) -> ParseResult<NodeIndex> {
        let start = self.token_pos();
        self.next_token();

        let mut level = 0u32;
        loop {
            match self.token() {
                SyntaxKind::DotToken => level += 1,
                SyntaxKind::DotDotDotToken => level += 3,
                _ => break,
            }
            self.next_token();
        }
        let module = if self.is_token(SyntaxKind::Identifier) {
            Some(self.parse_dotted_name_text()?)
        } else if level == 0 {
            return Err(self.error_at_current("expected module name"));
        } else {
            None
        };
        self.parse_expected(SyntaxKind::ImportKeyword, "'import'")?;

        let mut names = Vec::new();
        let mut is_star = false;
        let mut parenthesized = false;
        let names_pos = self.token_pos();
        if self.is_token(SyntaxKind::AsteriskToken) {
            is_star = true;
            self.next_token();
        } else if self.parse_optional(SyntaxKind::OpenParenToken) {
            parenthesized = true;
            while !self.is_token(SyntaxKind::CloseParenToken) {
                names.push(self.parse_import_alias(false)?);
                if !self.parse_optional(SyntaxKind::CommaToken) {
                    break;
                }
            }
            self.parse_expected(SyntaxKind::CloseParenToken, "')'")?;
            if names.is_empty() {
                return Err(self.error_at(start, self.node_end() - start, "empty import list"));
            }
        } else {
            loop {
                names.push(self.parse_import_alias(false)?);
                if !self.parse_optional(SyntaxKind::CommaToken) {
                    break;
                }
            }
        }
        let names_end = self.node_end();
        let names = self.make_list(names);
        Ok(self.arena.add_import_from(
            syntax_kind_ext::IMPORT_FROM_STATEMENT,
            start,
            names_end,
            ImportFromData {
                level,
                module,
                names,
                is_star,
                parenthesized,
                names_pos,
                names_end,
            },
        ))
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    fn parse_decorated(&mut self) -> ParseResult<NodeIndex> {
        let start = self.token_pos();
        let mut decorators = Vec::new();
        while self.is_token(SyntaxKind::AtToken) {
            let decorator_start = self.token_pos();
            self.next_token();
            let expression = self.parse_named_expression()?;
            let decorator = self.arena.add_decorator(
                syntax_kind_ext::DECORATOR,
                decorator_start,
                self.node_end(),
                DecoratorData { expression },
            );
            decorators.push(decorator);
            self.parse_expected(SyntaxKind::NewLineToken, "newline after decorator")?;
        }
        let decorators = self.make_list(decorators);
        match self.token() {
            SyntaxKind::ClassKeyword => self.parse_class_definition(start, decorators),
            SyntaxKind::DefKeyword => self.parse_function_definition(start, decorators),
            SyntaxKind::AsyncKeyword if self.peek_token() == SyntaxKind::DefKeyword => {
                self.parse_function_definition(start, decorators)
            }
            _ => Err(self.error_at_current("expected class or function definition")),
        }
    }

    fn parse_name(&mut self) -> ParseResult<NodeIndex> {
        if !self.is_token(SyntaxKind::Identifier) {
            return Err(self.error_at_current("expected name"));
        }
        let name = self.arena.add_name(self.token_pos(), self.token_end());
        self.next_token();
        Ok(name)
    }

    fn parse_class_definition(
        &mut self,
        start: u32,
        decorators: NodeList,
    ) -> ParseResult<NodeIndex> {
        self.parse_expected(SyntaxKind::ClassKeyword, "'class'")?;
        let name = self.parse_name()?;
        let type_parameters = if self.is_token(SyntaxKind::OpenBracketToken) {
            self.parse_type_parameter_list()?
        } else {
            NodeIndex::NONE
        };
        let arguments = if self.is_token(SyntaxKind::OpenParenToken) {
            self.parse_argument_list()?
        } else {
            NodeIndex::NONE
        };
        self.parse_expected(SyntaxKind::ColonToken, "':'")?;
        let body = self.parse_block()?;
        Ok(self.arena.add_class(
            syntax_kind_ext::CLASS_DEFINITION,
            start,
            self.node_end(),
            ClassData {
                decorators,
                name,
                type_parameters,
                arguments,
                body,
            },
        ))
    }

    fn parse_function_definition(
        &mut self,
        start: u32,
        decorators: NodeList,
    ) -> ParseResult<NodeIndex> {
        let is_async = self.parse_optional(SyntaxKind::AsyncKeyword);
        self.parse_expected(SyntaxKind::DefKeyword, "'def'")?;
        let name = self.parse_name()?;
        let type_parameters = if self.is_token(SyntaxKind::OpenBracketToken) {
            self.parse_type_parameter_list()?
        } else {
            NodeIndex::NONE
        };

        let parameters_start = self.token_pos();
        self.parse_expected(SyntaxKind::OpenParenToken, "'('")?;
        let entries = self.parse_parameter_nodes(SyntaxKind::CloseParenToken, true)?;
        self.parse_expected(SyntaxKind::CloseParenToken, "')'")?;
        let mut list = self.make_list(entries);
        if list.is_empty() {
            list.pos = parameters_start + 1;
            list.end = parameters_start + 1;
        }
        let parameters = self.arena.add_parameter_list(
            syntax_kind_ext::PARAMETER_LIST,
            parameters_start,
            self.node_end(),
            ParameterListData { parameters: list },
        );

        let returns = if self.parse_optional(SyntaxKind::MinusGreaterThanToken) {
            self.parse_expression()?
        } else {
            NodeIndex::NONE
        };
        self.parse_expected(SyntaxKind::ColonToken, "':'")?;
        let body = self.parse_block()?;
        Ok(self.arena.add_function(
            syntax_kind_ext::FUNCTION_DEFINITION,
            start,
            self.node_end(),
            FunctionData {
                decorators,
                is_async,
                name,
                type_parameters,
                parameters,
                returns,
                body,
            },
        ))
    }

    /// Unparenthesized parameter list of a lambda.
    pub(crate) fn parse_parameter_entries(
        &mut self,
        closing: SyntaxKind,
        allow_annotations: bool,
    ) -> ParseResult<NodeIndex> {
        let entries = self.parse_parameter_nodes(closing, allow_annotations)?;
        let list = self.make_list(entries);
        let (pos, end) = (list.pos, list.end);
        Ok(self.arena.add_parameter_list(
            syntax_kind_ext::PARAMETER_LIST,
            pos,
            end,
            ParameterListData { parameters: list },
        ))
    }

    fn parse_parameter_nodes(
        &mut self,
        closing: SyntaxKind,
        allow_annotations: bool,
    ) -> ParseResult<Vec<NodeIndex>> {
        let mut parameters = Vec::new();
        while !self.is_token(closing) {
            parameters.push(self.parse_parameter(allow_annotations)?);
            if !self.parse_optional(SyntaxKind::CommaToken) {
                break;
            }
        }
        Ok(parameters)
    }

    fn parse_parameter(&mut self, allow_annotations: bool) -> ParseResult<NodeIndex> {
        let start = self.token_pos();
        let kind = match self.token() {
            SyntaxKind::SlashToken => {
                self.next_token();
                ParameterKind::PositionalOnlyMarker
            }
            SyntaxKind::AsteriskToken => {
                self.next_token();
                if self.is_token(SyntaxKind::Identifier) {
                    ParameterKind::VarPositional
                } else {
                    ParameterKind::KeywordOnlyMarker
                }
            }
            SyntaxKind::AsteriskAsteriskToken => {
                self.next_token();
                ParameterKind::VarKeyword
            }
            _ => ParameterKind::Normal,
        };

        let mut name = NodeIndex::NONE;
        let mut annotation = NodeIndex::NONE;
        let mut default = NodeIndex::NONE;
        if !matches!(
            kind,
            ParameterKind::PositionalOnlyMarker | ParameterKind::KeywordOnlyMarker
        ) {
            name = self.parse_name()?;
            if allow_annotations && self.parse_optional(SyntaxKind::ColonToken) {
                annotation = if kind == ParameterKind::VarPositional
                    && self.is_token(SyntaxKind::AsteriskToken)
                {
                    self.parse_star_expression()?
                } else {
                    self.parse_expression()?
                };
            }
            if self.parse_optional(SyntaxKind::EqualsToken) {
                default = self.parse_expression()?;
            }
        }

        Ok(self.arena.add_parameter(
            syntax_kind_ext::PARAMETER,
            start,
            self.node_end(),
            ParameterData {
                kind,
                name,
                annotation,
                default,
            },
        ))
    }

    /// `[T, *Ts, **P, U: bound = default]`
    fn parse_type_parameter_list(&mut self) -> ParseResult<NodeIndex> {
        let start = self.token_pos();
        self.parse_expected(SyntaxKind::OpenBracketToken, "'['")?;
        let mut parameters = Vec::new();
        while !self.is_token(SyntaxKind::CloseBracketToken) {
            parameters.push(self.parse_type_parameter()?);
            if !self.parse_optional(SyntaxKind::CommaToken) {
                break;
            }
        }
        self.parse_expected(SyntaxKind::CloseBracketToken, "']'")?;
        let end = self.node_end();
        if parameters.is_empty() {
            return Err(self.error_at(start, end - start, "type parameter list cannot be empty"));
        }
        let list = self.make_list(parameters);
        Ok(self.arena.add_type_parameter_list(
            syntax_kind_ext::TYPE_PARAMETER_LIST,
            start,
            end,
            TypeParameterListData { parameters: list },
        ))
    }

    fn parse_type_parameter(&mut self) -> ParseResult<NodeIndex> {
        let start = self.token_pos();
        let kind = if self.parse_optional(SyntaxKind::AsteriskToken) {
            TypeParameterKind::TypeVarTuple
        } else if self.parse_optional(SyntaxKind::AsteriskAsteriskToken) {
            TypeParameterKind::ParamSpec
        } else {
            TypeParameterKind::TypeVar
        };
        let name = self.parse_name()?;

        let bound = if self.is_token(SyntaxKind::ColonToken) {
            if kind != TypeParameterKind::TypeVar {
                return Err(self.error_at_current("only plain type parameters can have a bound"));
            }
            self.next_token();
            self.parse_expression()?
        } else {
            NodeIndex::NONE
        };

        let default = if self.parse_optional(SyntaxKind::EqualsToken) {
            if kind == TypeParameterKind::TypeVarTuple && self.is_token(SyntaxKind::AsteriskToken)
            {
                self.parse_star_expression()?
            } else {
                self.parse_expression()?
            }
        } else {
            NodeIndex::NONE
        };

        Ok(self.arena.add_type_parameter(
            syntax_kind_ext::TYPE_PARAMETER,
            start,
            self.node_end(),
            TypeParameterData {
                kind,
                name,
                bound,
                default,
            },
        ))
    }

    /// `type` is a soft keyword: `type Name =` or `type Name[`.
    fn is_type_alias_statement(&self) -> bool {
        if !self.is_identifier_text("type") {
            return false;
        }
        self.look_ahead(|scanner| {
            scanner.scan() == SyntaxKind::Identifier
                && matches!(
                    scanner.scan(),
                    SyntaxKind::EqualsToken | SyntaxKind::OpenBracketToken
                )
        })
    }

    fn parse_type_alias_statement(&mut self) -> ParseResult<NodeIndex> {
        let start = self.token_pos();
        self.next_token();
        let name = self.parse_name()?;
        let type_parameters = if self.is_token(SyntaxKind::OpenBracketToken) {
            self.parse_type_parameter_list()?
        } else {
            NodeIndex::NONE
        };
        self.parse_expected(SyntaxKind::EqualsToken, "'='")?;
        let value = self.parse_expression()?;
        Ok(self.arena.add_type_alias(
            syntax_kind_ext::TYPE_ALIAS_STATEMENT,
            start,
            self.node_end(),
            TypeAliasData {
                name,
                type_parameters,
                value,
            },
        ))
    }

    /// `if cond: block (elif cond: block)* [else: block]`
    fn parse_if_statement(&mut self) -> ParseResult<NodeIndex> {
        let start = self.token_pos();
        self.next_token();
        let condition = self.parse_named_expression()?;
        self.parse_expected(SyntaxKind::ColonToken, "':'")?;
        let then_block = self.parse_block()?;
        let else_block = match self.token() {
            SyntaxKind::ElifKeyword => {
                self.enter_recursion()?;
                let elif = self.parse_if_statement();
                self.exit_recursion();
                elif?
            }
            SyntaxKind::ElseKeyword => {
                self.next_token();
                self.parse_expected(SyntaxKind::ColonToken, "':'")?;
                self.parse_block()?
            }
            _ => NodeIndex::NONE,
        };
        Ok(self.arena.add_if_statement(
            syntax_kind_ext::IF_STATEMENT,
            start,
            self.node_end(),
            IfStatementData {
                condition,
                then_block,
                else_block,
            },
        ))
    }
}
