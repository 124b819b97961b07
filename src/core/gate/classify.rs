// statement lexing - splits on real separators and picks out keywords
// built on the sqlparser tokenizer so quotes and comments are understood

use std::collections::BTreeSet;

use sqlparser::dialect::{Dialect, GenericDialect, MySqlDialect, PostgreSqlDialect, SQLiteDialect};
use sqlparser::keywords::Keyword;
use sqlparser::tokenizer::{Token, Tokenizer, TokenizerError, Whitespace};

/// Which grammar the tokenizer follows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SqlDialect {
    #[default]
    Generic,
    Postgres,
    Mysql,
    Sqlite,
}

impl SqlDialect {
    pub(super) fn tokenizer_dialect(self) -> Box<dyn Dialect> {
        match self {
            Self::Generic => Box::new(GenericDialect {}),
            Self::Postgres => Box::new(PostgreSqlDialect {}),
            Self::Mysql => Box::new(MySqlDialect {}),
            Self::Sqlite => Box::new(SQLiteDialect {}),
        }
    }
}

/// Lexical category of one token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lexeme {
    Keyword,
    Identifier,
    Literal,
    Punctuation,
    Whitespace,
    Comment,
}

/// Structural judgment about a piece of sql text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    /// First significant token, lowercased, when it lexes as a keyword.
    pub leading_keyword: Option<String>,
    /// Every keyword token of the first statement, lowercased.
    pub keywords: BTreeSet<String>,
    /// Non-empty statements found between separators.
    pub statement_count: usize,
}

/// Lex `sql` and classify it.
///
/// `vocabulary` holds words the policy cares about. An unquoted word in it is
/// a keyword even when the dialect's own keyword table doesn't list it.
pub fn classify(
    sql: &str,
    dialect: SqlDialect,
    vocabulary: &BTreeSet<String>,
) -> Result<Classification, TokenizerError> {
    let dialect = dialect.tokenizer_dialect();
    let tokens = Tokenizer::new(dialect.as_ref(), sql).tokenize()?;

    let statements = split(&tokens);
    let mut classification = Classification {
        statement_count: statements.len(),
        ..Classification::default()
    };

    let Some(first) = statements.first() else {
        return Ok(classification);
    };

    let mut previous: Option<&Token> = None;
    for token in first.iter() {
        let lexeme = lexeme(token, previous, vocabulary);
        if matches!(lexeme, Lexeme::Whitespace | Lexeme::Comment) {
            continue;
        }

        if lexeme == Lexeme::Keyword
            && let Token::Word(word) = token
        {
            let value = word.value.to_lowercase();
            if previous.is_none() {
                classification.leading_keyword = Some(value.clone());
            }
            classification.keywords.insert(value);
        }

        previous = Some(token);
    }

    Ok(classification)
}

/// Category of `token`, given the significant token before it.
pub fn lexeme(token: &Token, previous: Option<&Token>, vocabulary: &BTreeSet<String>) -> Lexeme {
    match token {
        Token::Word(word) => {
            // quoted names and qualified name parts are always identifiers
            if word.quote_style.is_some() || matches!(previous, Some(Token::Period)) {
                return Lexeme::Identifier;
            }
            if word.keyword != Keyword::NoKeyword
                || vocabulary.contains(&word.value.to_lowercase())
            {
                Lexeme::Keyword
            } else {
                Lexeme::Identifier
            }
        }
        Token::Whitespace(Whitespace::SingleLineComment { .. } | Whitespace::MultiLineComment(_)) => {
            Lexeme::Comment
        }
        Token::Whitespace(_) | Token::EOF => Lexeme::Whitespace,
        Token::Number(..)
        | Token::SingleQuotedString(_)
        | Token::DoubleQuotedString(_)
        | Token::DollarQuotedString(_)
        | Token::NationalStringLiteral(_)
        | Token::EscapedStringLiteral(_)
        | Token::HexStringLiteral(_)
        | Token::Placeholder(_) => Lexeme::Literal,
        _ => Lexeme::Punctuation,
    }
}

// split on top level separators, dropping statements that are only
// whitespace or comments
fn split(tokens: &[Token]) -> Vec<&[Token]> {
    tokens
        .split(|token| matches!(token, Token::SemiColon))
        .filter(|statement| statement.iter().any(is_significant))
        .collect()
}

fn is_significant(token: &Token) -> bool {
    !matches!(token, Token::Whitespace(_) | Token::EOF)
}
