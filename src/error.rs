use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("shape model must have at least one edge")]
    NoEdges,

    #[error("edge {edge} references vertex {vertex}, but the model has {vertex_count} vertices")]
    VertexOutOfRange {
        edge: usize,
        vertex: usize,
        vertex_count: usize,
    },

    #[error("expected {expected} vertex parameter records (implied by edges), got {actual}")]
    VertexParamCount { expected: usize, actual: usize },

    #[error("edge pair ({first}, {second}) is invalid: {reason}")]
    InvalidEdgePair {
        first: usize,
        second: usize,
        reason: &'static str,
    },

    #[error("edge pair ({first}, {second}) is not constrained by the model")]
    UnconstrainedEdgePair { first: usize, second: usize },

    #[error("reference edge {edge} is out of range for {edge_count} edges")]
    ReferenceEdgeOutOfRange { edge: usize, edge_count: usize },

    #[error("invalid model parameter: {0}")]
    InvalidParameter(String),

    #[error("too many vertices for given model: expected {expected}")]
    TooManyVertices { expected: usize },

    #[error("too few vertices for given model: expected {expected}, got {actual}")]
    TooFewVertices { expected: usize, actual: usize },

    #[error("invalid circle radius {0}")]
    InvalidRadius(f64),

    #[error("invalid vertex constraints: {0}")]
    InvalidConstraints(String),

    #[error("constraints set has {actual} vertex constraints, model has {expected} vertices")]
    ConstraintCount { expected: usize, actual: usize },

    #[error("cannot split vertex {vertex} along {axis}: range holds a single value")]
    DegenerateSplit { vertex: usize, axis: &'static str },

    #[error("distance transform scale must be finite and positive, got ({0}, {1})")]
    InvalidScale(f64, f64),

    #[error("non-finite value in {0}")]
    NonFiniteBound(&'static str),

    #[error("size mismatch for {what}: expected {expected}, got {actual}")]
    SizeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("search queue exhausted without finding a solution")]
    Unresolved,

    #[error("image term provider failed: {0}")]
    ImageTerm(String),

    #[error("min-cut solver failed: {0}")]
    MinCut(String),
}

pub type Result<T> = std::result::Result<T, Error>;
