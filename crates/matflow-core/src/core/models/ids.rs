/// Identifier of a firework inside a workflow.
///
/// Fireworks that have not been stored yet carry negative ids (`-1`, `-2`, ...);
/// the launchpad reassigns positive ids when a workflow is added.
pub type FwId = i64;
