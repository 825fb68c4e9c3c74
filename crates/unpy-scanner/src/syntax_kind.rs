//! Token kinds produced by the scanner.
//!
//! Node kinds for the AST live in `unpy_parser::parser::syntax_kind_ext` and
//! start above `SyntaxKind::LAST_TOKEN`.

use serde::Serialize;

#[repr(u16)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum SyntaxKind {
    Unknown = 0,
    EndOfFile,
    NewLineToken,
    IndentToken,
    DedentToken,

    // Literals and names
    Identifier,
    NumericLiteral,
    StringLiteral,

    // Punctuation
    OpenParenToken,
    CloseParenToken,
    OpenBracketToken,
    CloseBracketToken,
    OpenBraceToken,
    CloseBraceToken,
    CommaToken,
    ColonToken,
    SemicolonToken,
    DotToken,
    DotDotDotToken,
    AtToken,
    MinusGreaterThanToken,
    EqualsToken,
    ColonEqualsToken,

    // Operators
    PlusToken,
    MinusToken,
    AsteriskToken,
    AsteriskAsteriskToken,
    SlashToken,
    SlashSlashToken,
    PercentToken,
    BarToken,
    AmpersandToken,
    CaretToken,
    TildeToken,
    LessThanLessThanToken,
    GreaterThanGreaterThanToken,
    LessThanToken,
    GreaterThanToken,
    LessThanEqualsToken,
    GreaterThanEqualsToken,
    EqualsEqualsToken,
    ExclamationEqualsToken,

    // Augmented assignment
    PlusEqualsToken,
    MinusEqualsToken,
    AsteriskEqualsToken,
    AsteriskAsteriskEqualsToken,
    SlashEqualsToken,
    SlashSlashEqualsToken,
    PercentEqualsToken,
    BarEqualsToken,
    AmpersandEqualsToken,
    CaretEqualsToken,
    AtEqualsToken,
    LessThanLessThanEqualsToken,
    GreaterThanGreaterThanEqualsToken,

    // Keywords
    FalseKeyword,
    NoneKeyword,
    TrueKeyword,
    AndKeyword,
    AsKeyword,
    AssertKeyword,
    AsyncKeyword,
    AwaitKeyword,
    BreakKeyword,
    ClassKeyword,
    ContinueKeyword,
    DefKeyword,
    DelKeyword,
    ElifKeyword,
    ElseKeyword,
    ExceptKeyword,
    FinallyKeyword,
    ForKeyword,
    FromKeyword,
    GlobalKeyword,
    IfKeyword,
    ImportKeyword,
    InKeyword,
    IsKeyword,
    LambdaKeyword,
    NonlocalKeyword,
    NotKeyword,
    OrKeyword,
    PassKeyword,
    RaiseKeyword,
    ReturnKeyword,
    TryKeyword,
    WhileKeyword,
    WithKeyword,
    YieldKeyword,
}

impl SyntaxKind {
    pub const FIRST_KEYWORD: SyntaxKind = SyntaxKind::FalseKeyword;
    pub const LAST_KEYWORD: SyntaxKind = SyntaxKind::YieldKeyword;
    pub const LAST_TOKEN: SyntaxKind = SyntaxKind::YieldKeyword;
}

/// Map a word to its hard keyword kind, if it is one.
///
/// Soft keywords (`type`, `match`, `case`, `_`) scan as identifiers; the parser
/// recognizes them by text in statement position.
pub fn text_to_keyword(text: &str) -> Option<SyntaxKind> {
    let kind = match text {
        "False" => SyntaxKind::FalseKeyword,
        "None" => SyntaxKind::NoneKeyword,
        "True" => SyntaxKind::TrueKeyword,
        "and" => SyntaxKind::AndKeyword,
        "as" => SyntaxKind::AsKeyword,
        "assert" => SyntaxKind::AssertKeyword,
        "async" => SyntaxKind::AsyncKeyword,
        "await" => SyntaxKind::AwaitKeyword,
        "break" => SyntaxKind::BreakKeyword,
        "class" => SyntaxKind::ClassKeyword,
        "continue" => SyntaxKind::ContinueKeyword,
        "def" => SyntaxKind::DefKeyword,
        "del" => SyntaxKind::DelKeyword,
        "elif" => SyntaxKind::ElifKeyword,
        "else" => SyntaxKind::ElseKeyword,
        "except" => SyntaxKind::ExceptKeyword,
        "finally" => SyntaxKind::FinallyKeyword,
        "for" => SyntaxKind::ForKeyword,
        "from" => SyntaxKind::FromKeyword,
        "global" => SyntaxKind::GlobalKeyword,
        "if" => SyntaxKind::IfKeyword,
        "import" => SyntaxKind::ImportKeyword,
        "in" => SyntaxKind::InKeyword,
        "is" => SyntaxKind::IsKeyword,
        "lambda" => SyntaxKind::LambdaKeyword,
        "nonlocal" => SyntaxKind::NonlocalKeyword,
        "not" => SyntaxKind::NotKeyword,
        "or" => SyntaxKind::OrKeyword,
        "pass" => SyntaxKind::PassKeyword,
        "raise" => SyntaxKind::RaiseKeyword,
        "return" => SyntaxKind::ReturnKeyword,
        "try" => SyntaxKind::TryKeyword,
        "while" => SyntaxKind::WhileKeyword,
        "with" => SyntaxKind::WithKeyword,
        "yield" => SyntaxKind::YieldKeyword,
        _ => return None,
    };
    Some(kind)
}

pub fn keyword_to_text(kind: SyntaxKind) -> Option<&'static str> {
    let text = match kind {
        SyntaxKind::FalseKeyword => "False",
        SyntaxKind::NoneKeyword => "None",
        SyntaxKind::TrueKeyword => "True",
        SyntaxKind::AndKeyword => "and",
        SyntaxKind::AsKeyword => "as",
        SyntaxKind::AssertKeyword => "assert",
        SyntaxKind::AsyncKeyword => "async",
        SyntaxKind::AwaitKeyword => "await",
        SyntaxKind::BreakKeyword => "break",
        SyntaxKind::ClassKeyword => "class",
        SyntaxKind::ContinueKeyword => "continue",
        SyntaxKind::DefKeyword => "def",
        SyntaxKind::DelKeyword => "del",
        SyntaxKind::ElifKeyword => "elif",
        SyntaxKind::ElseKeyword => "else",
        SyntaxKind::ExceptKeyword => "except",
        SyntaxKind::FinallyKeyword => "finally",
        SyntaxKind::ForKeyword => "for",
        SyntaxKind::FromKeyword => "from",
        SyntaxKind::GlobalKeyword => "global",
        SyntaxKind::IfKeyword => "if",
        SyntaxKind::ImportKeyword => "import",
        SyntaxKind::InKeyword => "in",
        SyntaxKind::IsKeyword => "is",
        SyntaxKind::LambdaKeyword => "lambda",
        SyntaxKind::NonlocalKeyword => "nonlocal",
        SyntaxKind::NotKeyword => "not",
        SyntaxKind::OrKeyword => "or",
        SyntaxKind::PassKeyword => "pass",
        SyntaxKind::RaiseKeyword => "raise",
        SyntaxKind::ReturnKeyword => "return",
        SyntaxKind::TryKeyword => "try",
        SyntaxKind::WhileKeyword => "while",
        SyntaxKind::WithKeyword => "with",
        SyntaxKind::YieldKeyword => "yield",
        _ => return None,
    };
    Some(text)
}

#[inline]
pub fn token_is_keyword(kind: SyntaxKind) -> bool {
    kind >= SyntaxKind::FIRST_KEYWORD && kind <= SyntaxKind::LAST_KEYWORD
}

/// Identifiers and keywords both look like words; used when joining canonical text.
#[inline]
pub fn token_is_word(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::Identifier | SyntaxKind::NumericLiteral | SyntaxKind::StringLiteral
    ) || token_is_keyword(kind)
}

pub fn token_is_augmented_assignment(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::PlusEqualsToken
            | SyntaxKind::MinusEqualsToken
            | SyntaxKind::AsteriskEqualsToken
            | SyntaxKind::AsteriskAsteriskEqualsToken
            | SyntaxKind::SlashEqualsToken
            | SyntaxKind::SlashSlashEqualsToken
            | SyntaxKind::PercentEqualsToken
            | SyntaxKind::BarEqualsToken
            | SyntaxKind::AmpersandEqualsToken
            | SyntaxKind::CaretEqualsToken
            | SyntaxKind::AtEqualsToken
            | SyntaxKind::LessThanLessThanEqualsToken
            | SyntaxKind::GreaterThanGreaterThanEqualsToken
    )
}

pub fn token_is_comparison(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::LessThanToken
            | SyntaxKind::GreaterThanToken
            | SyntaxKind::LessThanEqualsToken
            | SyntaxKind::GreaterThanEqualsToken
            | SyntaxKind::EqualsEqualsToken
            | SyntaxKind::ExclamationEqualsToken
            | SyntaxKind::InKeyword
            | SyntaxKind::IsKeyword
    )
}

pub fn punctuation_to_text(kind: SyntaxKind) -> Option<&'static str> {
    let text = match kind {
        SyntaxKind::OpenParenToken => "(",
        SyntaxKind::CloseParenToken => ")",
        SyntaxKind::OpenBracketToken => "[",
        SyntaxKind::CloseBracketToken => "]",
        SyntaxKind::OpenBraceToken => "{",
        SyntaxKind::CloseBraceToken => "}",
        SyntaxKind::CommaToken => ",",
        SyntaxKind::ColonToken => ":",
        SyntaxKind::SemicolonToken => ";",
        SyntaxKind::DotToken => ".",
        SyntaxKind::DotDotDotToken => "...",
        SyntaxKind::AtToken => "@",
        SyntaxKind::MinusGreaterThanToken => "->",
        SyntaxKind::EqualsToken => "=",
        SyntaxKind::ColonEqualsToken => ":=",
        SyntaxKind::PlusToken => "+",
        SyntaxKind::MinusToken => "-",
        SyntaxKind::AsteriskToken => "*",
        SyntaxKind::AsteriskAsteriskToken => "**",
        SyntaxKind::SlashToken => "/",
        SyntaxKind::SlashSlashToken => "//",
        SyntaxKind::PercentToken => "%",
        SyntaxKind::BarToken => "|",
        SyntaxKind::AmpersandToken => "&",
        SyntaxKind::CaretToken => "^",
        SyntaxKind::TildeToken => "~",
        SyntaxKind::LessThanLessThanToken => "<<",
        SyntaxKind::GreaterThanGreaterThanToken => ">>",
        SyntaxKind::LessThanToken => "<",
        SyntaxKind::GreaterThanToken => ">",
        SyntaxKind::LessThanEqualsToken => "<=",
        SyntaxKind::GreaterThanEqualsToken => ">=",
        SyntaxKind::EqualsEqualsToken => "==",
        SyntaxKind::ExclamationEqualsToken => "!=",
        SyntaxKind::PlusEqualsToken => "+=",
        SyntaxKind::MinusEqualsToken => "-=",
        SyntaxKind::AsteriskEqualsToken => "*=",
        SyntaxKind::AsteriskAsteriskEqualsToken => "**=",
        SyntaxKind::SlashEqualsToken => "/=",
        SyntaxKind::SlashSlashEqualsToken => "//=",
        SyntaxKind::PercentEqualsToken => "%=",
        SyntaxKind::BarEqualsToken => "|=",
        SyntaxKind::AmpersandEqualsToken => "&=",
        SyntaxKind::CaretEqualsToken => "^=",
        SyntaxKind::AtEqualsToken => "@=",
        SyntaxKind::LessThanLessThanEqualsToken => "<<=",
        SyntaxKind::GreaterThanGreaterThanEqualsToken => ">>=",
        _ => return None,
    };
    Some(text)
}
