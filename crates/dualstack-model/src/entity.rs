use crate::error::ModelError;

/// Global optimization direction of a model
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sense {
    #[default]
    Maximize,
    Minimize,
}

impl Sense {
    /// The sense of the dual program
    pub fn opposite(self) -> Self {
        match self {
            Sense::Maximize => Sense::Minimize,
            Sense::Minimize => Sense::Maximize,
        }
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOp {
    /// Less than or equal (<=)
    Le,
    /// Greater than or equal (>=)
    Ge,
    /// Equal (=)
    Eq,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VariableKind {
    #[default]
    Continuous,
    /// Integer variables are used as {0,1} indicators throughout
    Integer,
}

/// Extra attributes carried by specialized variables
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum Extension {
    /// Enzyme concentration with its molecular weight in kDa
    Enzyme { mass_kda: Option<f64> },
}

/// A decision variable
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub id: String,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub objective_coefficient: f64,
    pub kind: VariableKind,
    /// Diagonal self-term of a quadratic objective
    pub quadratic_coefficient: Option<f64>,
    pub extension: Option<Extension>,
}

impl Variable {
    pub fn new(id: impl Into<String>, lower_bound: f64, upper_bound: f64) -> Self {
        Self {
            id: id.into(),
            lower_bound,
            upper_bound,
            objective_coefficient: 0.0,
            kind: VariableKind::Continuous,
            quadratic_coefficient: None,
            extension: None,
        }
    }

    /// Integer variable with bounds [0, 1]
    pub fn binary(id: impl Into<String>) -> Self {
        Self {
            kind: VariableKind::Integer,
            ..Self::new(id, 0.0, 1.0)
        }
    }

    pub fn with_objective(mut self, coefficient: f64) -> Self {
        self.objective_coefficient = coefficient;
        self
    }

    pub fn with_quadratic(mut self, coefficient: f64) -> Self {
        self.quadratic_coefficient = Some(coefficient);
        self
    }

    pub fn with_extension(mut self, extension: Extension) -> Self {
        self.extension = Some(extension);
        self
    }

    pub fn is_integer(&self) -> bool {
        self.kind == VariableKind::Integer
    }

    pub fn is_binary(&self) -> bool {
        self.is_integer() && self.lower_bound == 0.0 && self.upper_bound == 1.0
    }

    /// Molecular weight for enzyme variables
    pub fn mass(&self) -> Option<f64> {
        match &self.extension {
            Some(Extension::Enzyme { mass_kda }) => *mass_kda,
            None => None,
        }
    }
}

/// A linear relation over weighted variables
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub id: String,
    pub op: ConstraintOp,
    /// Right-hand side value
    pub bound: f64,
}

impl Constraint {
    pub fn new(id: impl Into<String>, op: ConstraintOp, bound: f64) -> Self {
        Self {
            id: id.into(),
            op,
            bound,
        }
    }

    pub fn le(id: impl Into<String>, bound: f64) -> Self {
        Self::new(id, ConstraintOp::Le, bound)
    }

    pub fn ge(id: impl Into<String>, bound: f64) -> Self {
        Self::new(id, ConstraintOp::Ge, bound)
    }

    pub fn eq(id: impl Into<String>, bound: f64) -> Self {
        Self::new(id, ConstraintOp::Eq, bound)
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Variable,
    Constraint,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Variable => write!(f, "variable"),
            EntityKind::Constraint => write!(f, "constraint"),
        }
    }
}

/// Either side of the bipartite incidence graph
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Variable(Variable),
    Constraint(Constraint),
}

impl Entity {
    pub fn id(&self) -> &str {
        match self {
            Entity::Variable(v) => &v.id,
            Entity::Constraint(c) => &c.id,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Variable(_) => EntityKind::Variable,
            Entity::Constraint(_) => EntityKind::Constraint,
        }
    }

    /// A copy of this entity under a different id
    pub fn renamed(&self, id: impl Into<String>) -> Self {
        let id = id.into();
        match self {
            Entity::Variable(v) => Entity::Variable(Variable { id, ..v.clone() }),
            Entity::Constraint(c) => Entity::Constraint(Constraint { id, ..c.clone() }),
        }
    }
}

impl From<Variable> for Entity {
    fn from(variable: Variable) -> Self {
        Entity::Variable(variable)
    }
}

impl From<Constraint> for Entity {
    fn from(constraint: Constraint) -> Self {
        Entity::Constraint(constraint)
    }
}

/// Copy every attribute except the id from `source` onto `target`.
pub fn clone_attributes(source: &Entity, target: &mut Entity) -> Result<(), ModelError> {
    match (source, target) {
        (Entity::Variable(src), Entity::Variable(dst)) => {
            let id = std::mem::take(&mut dst.id);
            *dst = Variable { id, ..src.clone() };
            Ok(())
        }
        (Entity::Constraint(src), Entity::Constraint(dst)) => {
            dst.op = src.op;
            dst.bound = src.bound;
            Ok(())
        }
        (src, dst) => Err(ModelError::InvalidKind {
            source_kind: src.kind(),
            target_kind: dst.kind(),
        }),
    }
}
