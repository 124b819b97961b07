// row ceiling - appends, rewrites or clamps LIMIT clauses
// clauses come from the token stream, so comments and literals never count

use std::sync::LazyLock;

use regex::Regex;
use sqlparser::keywords::Keyword;
use sqlparser::tokenizer::{Location, Token, Tokenizer, TokenizerError, Whitespace};

use super::SqlDialect;
use crate::config::{GateConfig, TopN};

static TOP_N: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\btop\s+([0-9]+)\b").expect("valid regex"));

/// The `N` of a "top N" request in the question, if there is one.
pub fn requested_top(question: &str) -> Option<u64> {
    let caps = TOP_N.captures(question)?;
    let n = caps[1].parse::<u64>().unwrap_or(u64::MAX);
    (n > 0).then_some(n)
}

/// Row count of the statement's own ceiling clause.
///
/// Only a clause outside every parenthesis bounds the statement. A LIMIT in a
/// subquery or CTE does not, and neither does `LIMIT ALL`.
pub fn ceiling(sql: &str, dialect: SqlDialect) -> Result<Option<u64>, TokenizerError> {
    let pieces = lex(sql, dialect)?;
    let clauses = clauses(&pieces);
    let rows = clauses
        .iter()
        .rfind(|clause| clause.depth == 0)
        .and_then(|clause| match clause.rows {
            Rows::Count(n) => Some(n),
            Rows::All => None,
        });
    Ok(rows)
}

/// Apply the row ceiling policy to a statement that already passed the gate.
///
/// Order of precedence: a "top N" in the question, then an existing ceiling
/// clause (clamped), then the aggregate exemption, then the default ceiling.
/// Every clause, nested ones included, ends up at or below `max_limit` unless
/// the top-N policy is uncapped. The result always ends in exactly one `;`.
pub fn enforce(
    statement: &str,
    question: &str,
    config: &GateConfig,
) -> Result<String, TokenizerError> {
    let statement = statement.trim();
    let pieces = lex(statement, config.dialect)?;
    let clauses = clauses(&pieces);
    let outer = clauses.iter().rposition(|clause| clause.depth == 0);

    let top = requested_top(question).map(|n| match config.top_n {
        TopN::Clamped => n.min(config.max_limit),
        TopN::Uncapped => n,
    });

    let mut replacements = clauses
        .iter()
        .enumerate()
        .filter_map(|(i, clause)| match top {
            Some(n) if Some(i) == outer => Some((clause, clause.with_rows(n))),
            _ => clause.clamped(config).map(|text| (clause, text)),
        })
        .peekable();

    let mut body = String::with_capacity(statement.len() + 16);
    let mut skip_to = 0;
    for piece in &pieces {
        if piece.start < skip_to || piece.token == Token::SemiColon {
            continue;
        }
        if let Some((clause, text)) = replacements.next_if(|(clause, _)| clause.start == piece.start) {
            body.push_str(&text);
            skip_to = clause.end;
            continue;
        }
        body.push_str(&statement[piece.start..piece.end]);
    }

    let mut shaped = body.trim_end().to_string();
    let appended = match (top, outer) {
        (_, Some(_)) => None,
        (Some(n), None) => Some(n),
        (None, None) if outer_count_call(&pieces) => None,
        (None, None) => Some(config.default_limit),
    };

    match appended {
        // new line so a trailing -- comment can't swallow the clause
        Some(rows) => shaped.push_str(&format!("\nLIMIT {rows}")),
        None if ends_in_line_comment(&pieces) => shaped.push('\n'),
        None => {}
    }
    shaped.push(';');

    Ok(shaped)
}

// one token with its byte range and parenthesis depth
struct Piece {
    token: Token,
    start: usize,
    end: usize,
    depth: usize,
}

#[derive(Debug, Clone, Copy)]
enum Rows {
    All,
    Count(u64),
}

// LIMIT n, LIMIT ALL or the mysql LIMIT offset, n
struct Clause {
    start: usize,
    end: usize,
    depth: usize,
    offset: Option<String>,
    rows: Rows,
}

impl Clause {
    fn with_rows(&self, rows: u64) -> String {
        match &self.offset {
            Some(offset) => format!("LIMIT {offset}, {rows}"),
            None => format!("LIMIT {rows}"),
        }
    }

    // never raises a value, LIMIT ALL is no ceiling at all
    fn clamped(&self, config: &GateConfig) -> Option<String> {
        match self.rows {
            Rows::All => Some(self.with_rows(config.default_limit)),
            Rows::Count(n) if n > config.max_limit => Some(self.with_rows(config.max_limit)),
            Rows::Count(_) => None,
        }
    }
}

fn lex(sql: &str, dialect: SqlDialect) -> Result<Vec<Piece>, TokenizerError> {
    let dialect = dialect.tokenizer_dialect();
    let tokens = Tokenizer::new(dialect.as_ref(), sql).tokenize_with_location()?;

    let lines: Vec<usize> = std::iter::once(0)
        .chain(sql.match_indices('\n').map(|(i, _)| i + 1))
        .collect();

    let mut depth = 0usize;
    let pieces = tokens
        .into_iter()
        .map(|spanned| {
            if spanned.token == Token::RParen {
                depth = depth.saturating_sub(1);
            }
            let piece = Piece {
                start: byte_offset(sql, &lines, spanned.span.start),
                end: byte_offset(sql, &lines, spanned.span.end),
                depth,
                token: spanned.token,
            };
            if piece.token == Token::LParen {
                depth += 1;
            }
            piece
        })
        .collect();

    Ok(pieces)
}

// locations are 1-based and count chars, not bytes
fn byte_offset(sql: &str, lines: &[usize], at: Location) -> usize {
    let Some(&line_start) = lines.get((at.line as usize).saturating_sub(1)) else {
        return sql.len();
    };
    sql[line_start..]
        .char_indices()
        .nth((at.column as usize).saturating_sub(1))
        .map_or(sql.len(), |(i, _)| line_start + i)
}

fn significant(pieces: &[Piece]) -> Vec<&Piece> {
    pieces
        .iter()
        .filter(|piece| !matches!(piece.token, Token::Whitespace(_)))
        .collect()
}

fn clauses(pieces: &[Piece]) -> Vec<Clause> {
    let tokens = significant(pieces);
    let mut clauses = Vec::new();

    for (i, piece) in tokens.iter().enumerate() {
        if !is_keyword(&piece.token, Keyword::LIMIT) {
            continue;
        }
        let Some(next) = tokens.get(i + 1) else {
            continue;
        };

        let clause = |end: usize, offset: Option<String>, rows: Rows| Clause {
            start: piece.start,
            end,
            depth: piece.depth,
            offset,
            rows,
        };

        if is_keyword(&next.token, Keyword::ALL) {
            clauses.push(clause(next.end, None, Rows::All));
            continue;
        }
        let Some(first) = row_count(&next.token) else {
            continue;
        };

        match (tokens.get(i + 2), tokens.get(i + 3)) {
            (Some(comma), Some(count)) if comma.token == Token::Comma => {
                if let (Token::Number(offset, _), Some(rows)) = (&next.token, row_count(&count.token)) {
                    clauses.push(clause(count.end, Some(offset.clone()), Rows::Count(rows)));
                }
            }
            _ => clauses.push(clause(next.end, None, Rows::Count(first))),
        }
    }

    clauses
}

// whole numbers only; one too big to parse is still over any ceiling
fn row_count(token: &Token) -> Option<u64> {
    match token {
        Token::Number(text, _) if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) => {
            Some(text.parse().unwrap_or(u64::MAX))
        }
        _ => None,
    }
}

fn is_keyword(token: &Token, keyword: Keyword) -> bool {
    matches!(token, Token::Word(word) if word.keyword == keyword && word.quote_style.is_none())
}

// a top level count(...) marks the statement as a pure aggregate
fn outer_count_call(pieces: &[Piece]) -> bool {
    significant(pieces).windows(2).any(|pair| {
        let [call, paren] = pair else {
            return false;
        };
        call.depth == 0
            && paren.token == Token::LParen
            && matches!(&call.token, Token::Word(word)
                if word.quote_style.is_none() && word.value.eq_ignore_ascii_case("count"))
    })
}

fn ends_in_line_comment(pieces: &[Piece]) -> bool {
    pieces
        .iter()
        .rev()
        .find(|piece| {
            !matches!(
                piece.token,
                Token::SemiColon
                    | Token::Whitespace(Whitespace::Space | Whitespace::Newline | Whitespace::Tab)
            )
        })
        .is_some_and(|piece| {
            matches!(
                piece.token,
                Token::Whitespace(Whitespace::SingleLineComment { .. })
            )
        })
}
