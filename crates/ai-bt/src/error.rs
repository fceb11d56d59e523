use thiserror::Error;

/// Construction mistakes. These abort setup; nothing at tick time produces them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    #[error("behavior tree has no root node")]
    NoRoot,

    #[error("a root node `{existing}` is already set; wrap siblings in a composite")]
    MultipleRoots { existing: String },

    #[error("decorator `{decorator}` already has a child")]
    DecoratorOccupied { decorator: String },

    #[error("node `{node}` cannot have children")]
    NotAParent { node: String },

    #[error("`end()` called with no open composite or decorator")]
    UnbalancedEnd,

    #[error("weighted selector `{node}` has {weights} weights for {children} children")]
    WeightCountMismatch {
        node: String,
        weights: usize,
        children: usize,
    },

    #[error("weighted selector `{node}` has invalid weight {weight} at index {index}")]
    InvalidWeight {
        node: String,
        index: usize,
        weight: f32,
    },
}
