/// Query expression tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryNode {
    /// Text looked up as one AND-combined token set
    Term(String),
    /// Boolean AND (all must match)
    And(Vec<QueryNode>),
    /// Boolean OR (any can match)
    Or(Vec<QueryNode>),
    /// Boolean NOT (exclude matches)
    Not(Box<QueryNode>),
    /// Empty query
    Empty,
}

impl QueryNode {
    /// Check if the tree has nothing to look up
    pub fn is_empty(&self) -> bool {
        match self {
            QueryNode::Empty => true,
            QueryNode::Term(text) => text.trim().is_empty(),
            QueryNode::And(nodes) | QueryNode::Or(nodes) => nodes.iter().all(QueryNode::is_empty),
            QueryNode::Not(inner) => inner.is_empty(),
        }
    }

    /// Texts of all non-negated terms, in query order
    pub fn positive_terms(&self) -> Vec<&str> {
        let mut terms = Vec::new();
        self.collect_positive(&mut terms);
        terms
    }

    fn collect_positive<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            QueryNode::Term(text) => out.push(text),
            QueryNode::And(nodes) | QueryNode::Or(nodes) => {
                for node in nodes {
                    node.collect_positive(out);
                }
            }
            QueryNode::Not(_) | QueryNode::Empty => {}
        }
    }
}

/// Nesting beyond this depth is read as plain text
const MAX_DEPTH: usize = 32;

/// Parse a query string into a [`QueryNode`] tree.
///
/// Never fails: unbalanced parentheses and quotes are closed implicitly and a
/// stray `)` is skipped.
pub fn parse_query(input: &str) -> QueryNode {
    let mut parser = QueryParser::new(input);
    parser.parse()
}

/// Query parser
struct QueryParser<'a> {
    input: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> QueryParser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            depth: 0,
        }
    }

    fn parse(&mut self) -> QueryNode {
        let mut nodes = vec![self.parse_or()];

        // Unmatched ')' at top level
        while self.consume_char(')') {
            nodes.push(self.parse_or());
        }

        combine_and(nodes)
    }

    fn parse_or(&mut self) -> QueryNode {
        let mut nodes = vec![self.parse_and()];

        self.skip_whitespace();
        while self.consume_char('|') {
            self.skip_whitespace();
            nodes.push(self.parse_and());
            self.skip_whitespace();
        }

        nodes.retain(|n| *n != QueryNode::Empty);
        match nodes.len() {
            0 => QueryNode::Empty,
            1 => nodes.pop().unwrap_or(QueryNode::Empty),
            _ => QueryNode::Or(nodes),
        }
    }

    fn parse_and(&mut self) -> QueryNode {
        let mut nodes = Vec::new();

        loop {
            self.skip_whitespace();

            if self.is_eof() || self.peek_char() == Some(')') || self.peek_char() == Some('|') {
                break;
            }

            nodes.push(self.parse_unary());
        }

        combine_and(nodes)
    }

    fn parse_unary(&mut self) -> QueryNode {
        self.skip_whitespace();

        if self.consume_char('-') || self.consume_char('!') {
            let inner = self.parse_primary();
            return QueryNode::Not(Box::new(inner));
        }

        self.parse_primary()
    }

    fn parse_primary(&mut self) -> QueryNode {
        self.skip_whitespace();

        // Parenthesized expression
        if self.peek_char() == Some('(') {
            self.advance();
            if self.depth >= MAX_DEPTH {
                return self.parse_term();
            }
            self.depth += 1;
            let node = self.parse_or();
            self.depth -= 1;
            self.consume_char(')');
            return node;
        }

        // Quoted phrase
        if self.peek_char() == Some('"') {
            return self.parse_phrase();
        }

        self.parse_term()
    }

    fn parse_phrase(&mut self) -> QueryNode {
        self.consume_char('"');
        let start = self.pos;

        while !self.is_eof() && self.peek_char() != Some('"') {
            self.advance();
        }

        let phrase = self.input[start..self.pos].to_string();
        self.consume_char('"');

        if phrase.trim().is_empty() {
            QueryNode::Empty
        } else {
            QueryNode::Term(phrase)
        }
    }

    fn parse_term(&mut self) -> QueryNode {
        let start = self.pos;

        while let Some(ch) = self.peek_char() {
            if ch.is_whitespace() || matches!(ch, '|' | '(' | ')' | '"') {
                break;
            }
            self.advance();
        }

        let word = &self.input[start..self.pos];
        if word.is_empty() {
            QueryNode::Empty
        } else {
            QueryNode::Term(word.to_string())
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn consume_char(&mut self, expected: char) -> bool {
        if self.peek_char() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn advance(&mut self) {
        if let Some(ch) = self.peek_char() {
            self.pos += ch.len_utf8();
        }
    }
}

fn combine_and(mut nodes: Vec<QueryNode>) -> QueryNode {
    nodes.retain(|n| *n != QueryNode::Empty);
    match nodes.len() {
        0 => QueryNode::Empty,
        1 => nodes.pop().unwrap_or(QueryNode::Empty),
        _ => QueryNode::And(nodes),
    }
}
