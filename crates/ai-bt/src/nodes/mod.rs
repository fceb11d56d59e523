mod composite;
mod decorator;
mod leaf;

pub use composite::{Parallel, ParallelPolicy, RandomSelector, Selector, Sequence, WeightedSelector};
pub use decorator::{
    Conditional, Cooldown, Failer, Inverter, RepeatCount, Repeater, Retry, Succeeder, Timeout,
};
pub use leaf::{Action, ClearValue, Condition, Fixed, Log, LogLevel, SetValue, Wait};
