//! Resolved statements and expressions.
//!
//! These are the bodies of functions, receivers and init blocks after the
//! front end resolved every name. The backend lowers them without type
//! checking, so the tree only carries what lowering needs.

/// Binary operators.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BinaryOp {
    // Arithmetic
    #[cfg_attr(feature = "serde", serde(rename = "+"))]
    Add,
    #[cfg_attr(feature = "serde", serde(rename = "-"))]
    Sub,
    #[cfg_attr(feature = "serde", serde(rename = "*"))]
    Mul,
    #[cfg_attr(feature = "serde", serde(rename = "/"))]
    Div,
    #[cfg_attr(feature = "serde", serde(rename = "%"))]
    Mod,

    // Comparison
    #[cfg_attr(feature = "serde", serde(rename = "=="))]
    Eq,
    #[cfg_attr(feature = "serde", serde(rename = "!="))]
    NotEq,
    #[cfg_attr(feature = "serde", serde(rename = "<"))]
    Lt,
    #[cfg_attr(feature = "serde", serde(rename = "<="))]
    LtEq,
    #[cfg_attr(feature = "serde", serde(rename = ">"))]
    Gt,
    #[cfg_attr(feature = "serde", serde(rename = ">="))]
    GtEq,

    // Logical
    #[cfg_attr(feature = "serde", serde(rename = "&&"))]
    And,
    #[cfg_attr(feature = "serde", serde(rename = "||"))]
    Or,

    // Bitwise
    #[cfg_attr(feature = "serde", serde(rename = "&"))]
    BitAnd,
    #[cfg_attr(feature = "serde", serde(rename = "|"))]
    BitOr,
    #[cfg_attr(feature = "serde", serde(rename = "<<"))]
    Shl,
    #[cfg_attr(feature = "serde", serde(rename = ">>"))]
    Shr,
}

impl BinaryOp {
    /// Returns the source-level symbol for this operator.
    pub const fn as_symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::And => "&&",
            Self::Or => "||",
            Self::BitAnd => "&",
            Self::BitOr => "|",
            Self::Shl => "<<",
            Self::Shr => ">>",
        }
    }

    /// Whether the operator produces a boolean.
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Eq
                | Self::NotEq
                | Self::Lt
                | Self::LtEq
                | Self::Gt
                | Self::GtEq
                | Self::And
                | Self::Or
        )
    }
}

/// Unary operators.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UnaryOp {
    #[cfg_attr(feature = "serde", serde(rename = "-"))]
    Neg,
    #[cfg_attr(feature = "serde", serde(rename = "!"))]
    Not,
    /// Non-null assertion (`x!!`).
    #[cfg_attr(feature = "serde", serde(rename = "!!"))]
    NotNull,
}

/// A `name: value` pair in a struct instance expression.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NewParameter {
    pub name: String,
    pub value: Expression,
}

/// Resolved expression.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum Expression {
    /// Integer literal, kept as written (257-bit range).
    Number { value: String },
    Boolean { value: bool },
    Null,
    String { value: String },
    Id { name: String },
    Binary {
        op: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expression>,
    },
    Field {
        source: Box<Expression>,
        name: String,
    },
    /// Method call on a value (`x.foo(args)`).
    Call {
        receiver: Box<Expression>,
        name: String,
        args: Vec<Expression>,
    },
    /// Free function call (`foo(args)`).
    StaticCall { name: String, args: Vec<Expression> },
    StructInstance {
        type_name: String,
        args: Vec<NewParameter>,
    },
    /// `initOf Contract(args)`.
    InitOf { contract: String, args: Vec<Expression> },
    Conditional {
        condition: Box<Expression>,
        then_branch: Box<Expression>,
        else_branch: Box<Expression>,
    },
}

impl Expression {
    pub fn number(value: impl ToString) -> Self {
        Self::Number {
            value: value.to_string(),
        }
    }

    pub fn boolean(value: bool) -> Self {
        Self::Boolean { value }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::String {
            value: value.into(),
        }
    }

    pub fn id(name: impl Into<String>) -> Self {
        Self::Id { name: name.into() }
    }

    pub fn binary(op: BinaryOp, left: Expression, right: Expression) -> Self {
        Self::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn unary(op: UnaryOp, operand: Expression) -> Self {
        Self::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn field(source: Expression, name: impl Into<String>) -> Self {
        Self::Field {
            source: Box::new(source),
            name: name.into(),
        }
    }

    pub fn call(receiver: Expression, name: impl Into<String>, args: Vec<Expression>) -> Self {
        Self::Call {
            receiver: Box::new(receiver),
            name: name.into(),
            args,
        }
    }

    pub fn static_call(name: impl Into<String>, args: Vec<Expression>) -> Self {
        Self::StaticCall {
            name: name.into(),
            args,
        }
    }

    pub fn struct_instance(type_name: impl Into<String>, args: Vec<(&str, Expression)>) -> Self {
        Self::StructInstance {
            type_name: type_name.into(),
            args: args
                .into_iter()
                .map(|(name, value)| NewParameter {
                    name: name.to_string(),
                    value,
                })
                .collect(),
        }
    }
}

/// Resolved statement.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum Statement {
    Let {
        name: String,
        #[cfg_attr(feature = "serde", serde(rename = "type"))]
        ty: crate::TypeRef,
        expression: Expression,
    },
    Return {
        #[cfg_attr(feature = "serde", serde(default))]
        expression: Option<Expression>,
    },
    Expression { expression: Expression },
    /// `a.b.c = value`; `path` is the chain of names starting at a local.
    Assign {
        path: Vec<String>,
        expression: Expression,
    },
    AugmentedAssign {
        path: Vec<String>,
        op: BinaryOp,
        expression: Expression,
    },
    Condition {
        condition: Expression,
        true_statements: Vec<Statement>,
        #[cfg_attr(feature = "serde", serde(default))]
        false_statements: Option<Vec<Statement>>,
    },
    While {
        condition: Expression,
        statements: Vec<Statement>,
    },
    Until {
        condition: Expression,
        statements: Vec<Statement>,
    },
    Repeat {
        iterations: Expression,
        statements: Vec<Statement>,
    },
}

impl Statement {
    pub fn assign(path: &[&str], expression: Expression) -> Self {
        Self::Assign {
            path: path.iter().map(ToString::to_string).collect(),
            expression,
        }
    }

    pub fn expression(expression: Expression) -> Self {
        Self::Expression { expression }
    }

    pub fn returns(expression: Expression) -> Self {
        Self::Return {
            expression: Some(expression),
        }
    }

    pub fn is_return(&self) -> bool {
        matches!(self, Self::Return { .. })
    }
}
