mod collector;
mod normalizer;
mod resolver;
mod types;

pub use collector::{PathSources, collect_paths, parse_delimiter, read_list_file};
pub use normalizer::{SegmentRename, TransformRules};
pub use resolver::{prepare_targets, resolve_target, split_container};
pub use types::{ResolutionError, ResolvedTarget};
