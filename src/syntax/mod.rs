//! Lexical layer: Java tokens, line index, cursor context.
//!
//! Everything in this crate that looks at source text goes through the
//! token stream produced here. The pruner in particular must respect
//! token boundaries — inserting a terminator inside a string literal or
//! comment would corrupt the buffer it is trying to keep parseable.

mod cursor;
mod lexer;
mod line_index;

pub use cursor::CursorContext;
pub use lexer::{Token, TokenKind, tokenize};
pub use line_index::LineIndex;
