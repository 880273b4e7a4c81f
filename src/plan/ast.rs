//! Logical plan structures
//!
//! The plan is produced by an external SQL front end and arrives already
//! parsed. It is serde-deserializable so callers (and the CLI) can hand it
//! over as JSON. The engine only ever reads it.

use serde::{Deserialize, Serialize};

/// Comparison operators appearing in WHERE and HAVING
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    /// column = value
    Eq,
    /// column != value
    NotEq,
    /// column < value
    Lt,
    /// column <= value
    Lte,
    /// column > value
    Gt,
    /// column >= value
    Gte,
}

impl CompareOp {
    /// Returns the SQL symbol for this operator
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::NotEq => "!=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
        }
    }

    /// Returns true if this is an equality operation
    pub fn is_equality(&self) -> bool {
        matches!(self, CompareOp::Eq)
    }
}

/// Logical connective of a compound expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalOp::And => "AND",
            LogicalOp::Or => "OR",
        }
    }
}

/// Aggregate functions usable in select and having
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateFunction {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateFunction {
    pub fn name(&self) -> &'static str {
        match self {
            AggregateFunction::Count => "COUNT",
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Avg => "AVG",
            AggregateFunction::Min => "MIN",
            AggregateFunction::Max => "MAX",
        }
    }

    /// Renders the call the way it is labelled in output, e.g. `COUNT(*)`
    pub fn label(&self, column: Option<&str>) -> String {
        format!("{}({})", self.name(), column.unwrap_or("*"))
    }
}

/// Expression of one select item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectExpr {
    /// Bare column reference
    Column(String),
    /// `*`
    Star,
    /// Aggregate call; `column: None` means `*`
    Aggregate {
        function: AggregateFunction,
        #[serde(default)]
        column: Option<String>,
    },
}

/// One select list item, optionally aliased
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectItem {
    pub expr: SelectExpr,
    #[serde(default)]
    pub alias: Option<String>,
}

impl SelectItem {
    /// `column`
    pub fn column(name: impl Into<String>) -> Self {
        Self {
            expr: SelectExpr::Column(name.into()),
            alias: None,
        }
    }

    /// `column AS alias`
    pub fn aliased(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            expr: SelectExpr::Column(name.into()),
            alias: Some(alias.into()),
        }
    }

    /// `*`
    pub fn star() -> Self {
        Self {
            expr: SelectExpr::Star,
            alias: None,
        }
    }

    /// `FUNCTION(column)` or `FUNCTION(*)`
    pub fn aggregate(function: AggregateFunction, column: Option<&str>) -> Self {
        Self {
            expr: SelectExpr::Aggregate {
                function,
                column: column.map(str::to_string),
            },
            alias: None,
        }
    }

    /// Sets the alias
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Returns true if this item is an aggregate call
    pub fn is_aggregate(&self) -> bool {
        matches!(self.expr, SelectExpr::Aggregate { .. })
    }
}

/// Leaf filter: `column op literal`
///
/// `value` is the literal token exactly as the front end produced it,
/// including any surrounding quote characters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub column: String,
    pub op: CompareOp,
    pub value: String,
}

/// WHERE expression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterExpr {
    Comparison(Comparison),
    /// Well-formed nodes carry exactly two operands
    Logical {
        op: LogicalOp,
        operands: Vec<FilterExpr>,
    },
}

impl FilterExpr {
    /// `column = value`
    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self::compare(column, CompareOp::Eq, value)
    }

    /// `column op value`
    pub fn compare(column: impl Into<String>, op: CompareOp, value: impl Into<String>) -> Self {
        FilterExpr::Comparison(Comparison {
            column: column.into(),
            op,
            value: value.into(),
        })
    }

    /// `left AND right`
    pub fn and(left: FilterExpr, right: FilterExpr) -> Self {
        FilterExpr::Logical {
            op: LogicalOp::And,
            operands: vec![left, right],
        }
    }

    /// `left OR right`
    pub fn or(left: FilterExpr, right: FilterExpr) -> Self {
        FilterExpr::Logical {
            op: LogicalOp::Or,
            operands: vec![left, right],
        }
    }
}

/// Left-hand side of a HAVING comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HavingOperand {
    Column(String),
    Aggregate {
        function: AggregateFunction,
        #[serde(default)]
        column: Option<String>,
    },
}

/// HAVING expression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HavingExpr {
    Comparison {
        left: HavingOperand,
        op: CompareOp,
        value: String,
    },
    Logical {
        op: LogicalOp,
        operands: Vec<HavingExpr>,
    },
}

impl HavingExpr {
    /// `FUNCTION(column) op value`
    pub fn aggregate(
        function: AggregateFunction,
        column: Option<&str>,
        op: CompareOp,
        value: impl Into<String>,
    ) -> Self {
        HavingExpr::Comparison {
            left: HavingOperand::Aggregate {
                function,
                column: column.map(str::to_string),
            },
            op,
            value: value.into(),
        }
    }

    /// `column op value`
    pub fn column(column: impl Into<String>, op: CompareOp, value: impl Into<String>) -> Self {
        HavingExpr::Comparison {
            left: HavingOperand::Column(column.into()),
            op,
            value: value.into(),
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// One ORDER BY key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Column or alias to sort by
    pub column: String,
    /// Sort direction
    #[serde(default)]
    pub direction: SortDirection,
}

impl OrderItem {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Parsed query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicalPlan {
    /// Select list
    #[serde(default)]
    pub select: Vec<SelectItem>,
    /// Source table name
    #[serde(default)]
    pub from: Option<String>,
    /// WHERE expression
    #[serde(default)]
    pub filter: Option<FilterExpr>,
    /// GROUP BY columns
    #[serde(default)]
    pub group_by: Vec<String>,
    /// HAVING expression
    #[serde(default)]
    pub having: Option<HavingExpr>,
    /// ORDER BY items
    #[serde(default)]
    pub order_by: Vec<OrderItem>,
    /// LIMIT
    #[serde(default)]
    pub limit: Option<u64>,
}

impl LogicalPlan {
    /// Creates a plan selecting nothing yet from the given table
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            select: Vec::new(),
            from: Some(table.into()),
            filter: None,
            group_by: Vec::new(),
            having: None,
            order_by: Vec::new(),
            limit: None,
        }
    }

    /// Adds a select item
    pub fn with_select(mut self, item: SelectItem) -> Self {
        self.select.push(item);
        self
    }

    /// Sets the WHERE expression
    pub fn with_filter(mut self, filter: FilterExpr) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Adds a GROUP BY column
    pub fn with_group_by(mut self, column: impl Into<String>) -> Self {
        self.group_by.push(column.into());
        self
    }

    /// Sets the HAVING expression
    pub fn with_having(mut self, having: HavingExpr) -> Self {
        self.having = Some(having);
        self
    }

    /// Adds an ORDER BY item
    pub fn with_order(mut self, item: OrderItem) -> Self {
        self.order_by.push(item);
        self
    }

    /// Sets the limit
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns true if the query groups rows
    pub fn is_grouped(&self) -> bool {
        !self.group_by.is_empty()
    }
}
