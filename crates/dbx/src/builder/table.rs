use crate::ident::{split_alias, with_alias};
use std::fmt;

/// A table reference: name (optionally schema-qualified) and alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub name: String,
    pub alias: String,
}

impl Table {
    /// Parse `"users"`, `"users u"` or `"shop.users AS u"`.
    pub fn parse(input: &str) -> Self {
        let (name, alias) = split_alias(input);
        Self { name, alias }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }

    /// Quoted name with alias, ready for FROM / JOIN.
    pub fn to_sql(&self) -> String {
        with_alias(&self.name, &self.alias)
    }
}

/// A projected column: name and alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    pub name: String,
    pub alias: String,
}

impl ColumnRef {
    pub fn parse(input: &str) -> Self {
        let (name, alias) = split_alias(input);
        Self { name, alias }
    }

    pub fn to_sql(&self) -> String {
        with_alias(&self.name, &self.alias)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinKind {
    #[default]
    Inner,
    Left,
    Right,
    Cross,
    Outer,
    LeftOuter,
    RightOuter,
}

impl JoinKind {
    pub fn as_str(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER",
            JoinKind::Left => "LEFT",
            JoinKind::Right => "RIGHT",
            JoinKind::Cross => "CROSS",
            JoinKind::Outer => "OUTER",
            JoinKind::LeftOuter => "LEFT OUTER",
            JoinKind::RightOuter => "RIGHT OUTER",
        }
    }
}

impl fmt::Display for JoinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `<KIND> JOIN <table> ON <predicate>`; the predicate is raw SQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    pub table: Table,
    pub kind: JoinKind,
    pub on: String,
}

impl Join {
    pub fn to_sql(&self) -> String {
        format!("{} JOIN {} ON {}", self.kind, self.table.to_sql(), self.on)
    }
}

/// LIMIT clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    /// `LIMIT count`
    Count(u64),
    /// `LIMIT offset, count`
    Range { offset: u64, count: u64 },
}

impl Limit {
    /// Parse `"10"` or `"20, 10"`. Returns `None` for anything else.
    pub fn parse(input: &str) -> Option<Self> {
        let mut parts = input.split(',').map(str::trim);
        let first = parts.next().filter(|s| !s.is_empty())?;
        match parts.next() {
            None => {
                let count: u64 = first.parse().ok()?;
                (count > 0).then_some(Limit::Count(count))
            }
            Some(second) => {
                if parts.next().is_some() {
                    return None;
                }
                let offset: u64 = first.parse().ok()?;
                let count: u64 = second.parse().ok()?;
                (count > 0).then_some(Limit::Range { offset, count })
            }
        }
    }

    pub fn to_sql(self) -> String {
        match self {
            Limit::Count(count) => format!("LIMIT {count}"),
            Limit::Range { offset, count } => format!("LIMIT {offset}, {count}"),
        }
    }
}
