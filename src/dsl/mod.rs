//! XAPI predicate language.
//!
//! Syntax:
//!   [key=value]             - tag has exactly this value
//!   [key=val1|val2]         - tag has any of the values
//!   [key1|key2=value]       - any of the keys has the value
//!   [key=*]                 - tag present with any value
//!   [@uid=n]                - last edited by user n
//!   [@changeset=n]          - last edited in changeset n
//!   [bbox=l,b,r,t]          - geometry intersects the box
//!
//! Consecutive groups are ANDed.

mod ast;
mod bbox;
mod lexer;
mod parser;

pub use ast::*;
pub use bbox::{BBox, BboxError};
pub use parser::{parse_id_list, parse_predicate};
